//! Seed list loading: one JSON object with a `url` field per line.

use std::path::Path;

use futures::TryStreamExt;
use serde::Deserialize;
use tokio::io::AsyncRead;

use crate::ndjson::{self, NdjsonError};

#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntry {
    pub url: String,
}

pub async fn read_seed_urls<R>(reader: R) -> Result<Vec<String>, NdjsonError>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    ndjson::from_reader::<_, SeedEntry>(reader)
        .map_ok(|entry| entry.url)
        .try_collect()
        .await
}

pub async fn load_seed_urls(path: &Path) -> Result<Vec<String>, NdjsonError> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| NdjsonError::Read(Box::new(e)))?;
    let urls = read_seed_urls(file).await?;
    log::info!("Loaded {} seed URLs from {}", urls.len(), path.display());
    Ok(urls)
}

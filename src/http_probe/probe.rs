use std::time::Duration;

use reqwest::{
    Client,
    header::{ACCEPT_ENCODING, CONTENT_ENCODING, RANGE},
    redirect,
};
use url::Url;

use super::report;
use super::result::{ProbeRecord, VariantResult};
use super::variant::Variant;

pub const RANGE_ALL: &str = "bytes=0-";

/// Builds the HTTP client shared by every probe.
///
/// Redirects are returned as-is and response decompression is turned off, so
/// the only `Accept-Encoding` a server ever sees is the one a variant sets.
pub fn build_client(user_agent: &str, timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .redirect(redirect::Policy::none())
        .no_gzip()
        .no_brotli()
        .no_deflate()
        .build()
}

#[derive(Debug, Clone)]
pub struct Prober {
    client: Client,
}

impl Prober {
    pub fn new(client: Client) -> Self {
        Prober { client }
    }

    /// Issues one ranged GET for `variant`. Never fails: transport errors and
    /// timeouts come back as [`VariantResult::Failed`].
    pub async fn probe_variant(&self, url: &Url, variant: Variant) -> VariantResult {
        let mut request = self.client.get(url.clone()).header(RANGE, RANGE_ALL);
        if let Some(value) = variant.accept_encoding() {
            request = request.header(ACCEPT_ENCODING, value);
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let encoding = response
                    .headers()
                    .get(CONTENT_ENCODING)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                // Dropping the unread body closes the connection.
                drop(response);
                VariantResult::Response { status, encoding }
            }
            Err(e) => {
                log::debug!("{url} [{variant}] failed: {}", report(&e));
                VariantResult::Failed
            }
        }
    }

    /// Runs all four variants against `url` concurrently and joins them into one record.
    pub async fn probe_url(&self, url: &str) -> ProbeRecord {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("Skipping malformed URL {url:?}: {e}");
                return ProbeRecord::all_failed(url);
            }
        };

        let (accept_none, accept_identity_long, accept_identity, accept_encoding) = tokio::join!(
            self.probe_variant(&parsed, Variant::AcceptNone),
            self.probe_variant(&parsed, Variant::AcceptIdentityLong),
            self.probe_variant(&parsed, Variant::AcceptIdentity),
            self.probe_variant(&parsed, Variant::AcceptEncoding),
        );

        ProbeRecord {
            url: url.to_string(),
            accept_none,
            accept_identity_long,
            accept_identity,
            accept_encoding,
        }
    }
}

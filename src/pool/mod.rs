//! Bounded worker pool that probes every seed URL exactly once.
//!
//! `K` workers share one work list and claim URLs from it until it is empty.
//! Claiming pops from the end of the list, so the last seed is probed first.
//! Each worker emits its record to the sink as soon as the probe finishes.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::{JoinError, JoinSet};

use crate::http_probe::prelude::*;
use crate::ndjson::{NdjsonError, SinkHandle};

pub const DEFAULT_CONCURRENCY: usize = 5;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to emit probe record: {0}")]
    Sink(#[from] NdjsonError),

    #[error("probe worker stopped unexpectedly: {0}")]
    Worker(#[from] JoinError),
}

/// Shared work list. Claim-and-remove happens under one lock acquisition.
#[derive(Clone)]
struct WorkList {
    items: Arc<Mutex<Vec<String>>>,
    remaining: Arc<AtomicUsize>,
}

impl WorkList {
    fn new(urls: Vec<String>) -> Self {
        let remaining = Arc::new(AtomicUsize::new(urls.len()));
        WorkList {
            items: Arc::new(Mutex::new(urls)),
            remaining,
        }
    }

    async fn claim(&self) -> Option<String> {
        self.items.lock().await.pop()
    }

    fn complete_one(&self) -> usize {
        self.remaining.fetch_sub(1, Ordering::SeqCst) - 1
    }
}

/// Probes every URL in `urls` with at most `concurrency` probes in flight,
/// emitting one record per URL to `sink`. Returns the number of records emitted.
///
/// `probe` is the per-URL prober; a URL is never retried, whatever its record says.
pub async fn run_pool<F, Fut>(
    urls: Vec<String>,
    concurrency: usize,
    probe: F,
    sink: SinkHandle,
) -> Result<usize, PoolError>
where
    F: Fn(String) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = ProbeRecord> + Send + 'static,
{
    let total = urls.len();
    let workers = concurrency.max(1).min(total);
    if workers == 0 {
        log::info!("No URLs to probe");
        return Ok(0);
    }

    log::info!("Probing {total} URLs with {workers} workers");
    let work = WorkList::new(urls);
    let mut join_set = JoinSet::new();

    for worker in 0..workers {
        let work = work.clone();
        let probe = probe.clone();
        let sink = sink.clone();
        join_set.spawn(async move {
            let mut emitted = 0usize;
            while let Some(url) = work.claim().await {
                let record = probe(url).await;
                sink.emit(&record).await?;
                emitted += 1;
                let remaining = work.complete_one();
                log::info!("{remaining} remaining");
            }
            log::debug!("Worker {worker} idle after {emitted} URLs");
            Ok::<_, NdjsonError>(emitted)
        });
    }
    drop(sink);

    let mut emitted = 0;
    while let Some(res) = join_set.join_next().await {
        emitted += res??;
    }

    log::info!("Probed {emitted} of {total} URLs");
    Ok(emitted)
}

/// Runs the pool with the HTTP [`Prober`].
pub async fn probe_all(
    prober: Prober,
    urls: Vec<String>,
    concurrency: usize,
    sink: SinkHandle,
) -> Result<usize, PoolError> {
    run_pool(
        urls,
        concurrency,
        move |url| {
            let prober = prober.clone();
            async move { prober.probe_url(&url).await }
        },
        sink,
    )
    .await
}

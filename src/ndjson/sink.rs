use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::NdjsonError;

const QUEUE_DEPTH: usize = 64;

/// Append-only NDJSON output owned by a single writer task.
///
/// Producers never touch the writer: they hand fully encoded lines to a
/// queue, so lines from concurrent producers cannot interleave.
pub struct NdjsonSink;

/// What the writer task hands back once every [`SinkHandle`] is dropped.
#[derive(Debug)]
pub struct SinkSummary<W> {
    pub lines: usize,
    pub writer: W,
}

/// Cloneable producer side of an [`NdjsonSink`].
#[derive(Debug, Clone)]
pub struct SinkHandle {
    tx: mpsc::Sender<String>,
}

impl NdjsonSink {
    /// Spawns the writer task. It drains the queue until all handles are
    /// dropped, flushes, and returns the writer.
    pub fn spawn<W>(writer: W) -> (SinkHandle, JoinHandle<Result<SinkSummary<W>, NdjsonError>>)
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let task = tokio::spawn(write_lines(rx, writer));
        (SinkHandle { tx }, task)
    }
}

async fn write_lines<W>(
    mut rx: mpsc::Receiver<String>,
    mut writer: W,
) -> Result<SinkSummary<W>, NdjsonError>
where
    W: AsyncWrite + Unpin,
{
    let mut lines = 0;
    while let Some(line) = rx.recv().await {
        writer.write_all(line.as_bytes()).await?;
        lines += 1;
    }
    writer.flush().await?;
    log::debug!("NDJSON sink wrote {lines} lines");
    Ok(SinkSummary { lines, writer })
}

/// Encodes `value` as a single NDJSON line, newline included.
pub fn encode_line<T: Serialize>(value: &T) -> Result<String, NdjsonError> {
    let mut line = serde_json::to_string(value).map_err(NdjsonError::Encode)?;
    line.push('\n');
    Ok(line)
}

impl SinkHandle {
    pub async fn emit<T: Serialize>(&self, value: &T) -> Result<(), NdjsonError> {
        let line = encode_line(value)?;
        self.tx
            .send(line)
            .await
            .map_err(|_| NdjsonError::SinkClosed)
    }
}

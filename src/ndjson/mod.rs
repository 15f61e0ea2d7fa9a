//! Newline-delimited JSON transport: a line-atomic sink for producers and a
//! lazy, order-preserving record stream for consumers.

pub mod sink;
pub mod source;

pub use sink::{NdjsonSink, SinkHandle, SinkSummary};
pub use source::{LineSplitter, RecordStream, Utf8Decoder, decode_ndjson, from_reader, from_response};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NdjsonError {
    #[error("failed to read ndjson input: {0}")]
    Read(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("line {line} is not valid JSON: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode record: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to write ndjson output: {0}")]
    Write(#[from] std::io::Error),

    #[error("ndjson sink is closed")]
    SinkClosed,
}

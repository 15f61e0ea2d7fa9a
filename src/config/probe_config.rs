use std::path::PathBuf;

use serde::Deserialize;

use crate::pool::DEFAULT_CONCURRENCY;

/// Identifies probes as a desktop Chrome, like the browsers whose behaviour is being compared.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_13_4) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/66.0.3359.181 Safari/537.36";

/// Configuration for a probe run. Every field has a default, so an empty
/// file (or no file at all) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeConfig {
    /// Number of URLs probed at the same time.
    pub concurrency: usize,

    /// Per-request timeout. A variant that takes longer is recorded as failed.
    pub timeout_seconds: u64,

    pub user_agent: String,

    /// Seed list, one `{"url": ...}` object per line.
    pub input: PathBuf,

    /// Where probe records are written as NDJSON.
    pub output: PathBuf,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            concurrency: DEFAULT_CONCURRENCY,
            timeout_seconds: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            input: PathBuf::from("data.json"),
            output: PathBuf::from("results/out.json"),
        }
    }
}

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::http_probe::prelude::*;

/// Named diagnostic filters over a probe result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Every record.
    None,
    /// Some variant got a 206, and the four slots are not all identical.
    Diff,
    /// A 206 without `Accept-Encoding` negotiation, but none once encodings are offered.
    EncNo206,
    /// A 206 once encodings are offered, but a non-206 for some identity form.
    NoEncNo206,
    /// The long and short identity forms got different statuses.
    ChromeVsSafari,
    /// An identity variant came back with a `Content-Encoding`.
    UnexpectedEncoding,
}

impl FilterMode {
    pub const ALL: [FilterMode; 6] = [
        FilterMode::None,
        FilterMode::Diff,
        FilterMode::EncNo206,
        FilterMode::NoEncNo206,
        FilterMode::ChromeVsSafari,
        FilterMode::UnexpectedEncoding,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FilterMode::None => "none",
            FilterMode::Diff => "diff",
            FilterMode::EncNo206 => "enc-no-206",
            FilterMode::NoEncNo206 => "no-enc-no-206",
            FilterMode::ChromeVsSafari => "chrome-vs-safari",
            FilterMode::UnexpectedEncoding => "unexpected-encoding",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            FilterMode::None => "All results",
            FilterMode::Diff => "Different results for URL",
            FilterMode::EncNo206 => "Missing 206 specifically when encoding allowed",
            FilterMode::NoEncNo206 => "Missing 206 specifically when encoding not allowed",
            FilterMode::ChromeVsSafari => {
                "Differences between the identity & longer identity forms (Safari vs Chrome)"
            }
            FilterMode::UnexpectedEncoding => "Unexpected encoding",
        }
    }

    pub fn matches(self, record: &ProbeRecord) -> bool {
        let none = &record.accept_none;
        let long = &record.accept_identity_long;
        let short = &record.accept_identity;
        let enc = &record.accept_encoding;

        match self {
            FilterMode::None => true,
            FilterMode::UnexpectedEncoding => {
                !long.encoding().is_empty() || !short.encoding().is_empty()
            }
            FilterMode::ChromeVsSafari => long.status() != short.status(),
            // The remaining modes only look at records where a range request worked at all.
            _ if !record.any_partial_content() => false,
            FilterMode::Diff => none != long || none != short || none != enc,
            FilterMode::EncNo206 => {
                (none.is_partial_content() || long.is_partial_content() || short.is_partial_content())
                    && !enc.is_partial_content()
            }
            FilterMode::NoEncNo206 => {
                (!none.is_partial_content() || !long.is_partial_content() || !short.is_partial_content())
                    && enc.is_partial_content()
            }
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown filter mode {0:?} (expected one of: none, diff, enc-no-206, no-enc-no-206, chrome-vs-safari, unexpected-encoding)")]
pub struct UnknownFilterMode(pub String);

impl FromStr for FilterMode {
    type Err = UnknownFilterMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterMode::ALL
            .into_iter()
            .find(|mode| mode.name() == s)
            .ok_or_else(|| UnknownFilterMode(s.to_string()))
    }
}

/// Returns the records matching `mode`, in input order. The input is not modified.
pub fn classify(records: &[ProbeRecord], mode: FilterMode) -> Vec<&ProbeRecord> {
    records.iter().filter(|r| mode.matches(r)).collect()
}

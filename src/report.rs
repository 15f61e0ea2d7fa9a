//! Plain-text rendering of a classified result set.

use std::fmt::{self, Write};

use unicode_truncate::{Alignment, UnicodeTruncateStr};
use url::Url;

use crate::http_probe::prelude::*;

pub const ORIGIN_WIDTH: usize = 40;
const CELL_WIDTH: usize = 20;

/// The "Showing X of Y (P%)" line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub shown: usize,
    pub total: usize,
}

impl Summary {
    /// Percentage with at most two fraction digits and no trailing zeros.
    /// Halves round away from zero.
    pub fn percent(&self) -> String {
        if self.total == 0 {
            return "0".to_string();
        }
        let (shown, total) = (self.shown as u128, self.total as u128);
        let hundredths = (shown * 10_000 * 2 + total) / (2 * total);
        let pct = format!("{}.{:02}", hundredths / 100, hundredths % 100);
        pct.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Showing {} of {} ({}%)",
            self.shown,
            self.total,
            self.percent()
        )
    }
}

/// Truncates or pads `input` to `width` display columns.
fn to_fixed_width(input: &str, width: usize) -> String {
    input.unicode_pad(width, Alignment::Left, true).into_owned()
}

/// The URL's origin, or the raw string when it does not parse.
fn origin(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.origin().ascii_serialization(),
        Err(_) => url.to_string(),
    }
}

/// One table cell. `!` marks what a reader should look at: a status other
/// than 206, or an identity variant that came back encoded.
fn cell(variant: Variant, result: &VariantResult) -> String {
    match result {
        VariantResult::Failed => "Err!".to_string(),
        VariantResult::Response { status, encoding } => {
            let mut s = status.to_string();
            if *status != 206 {
                s.push('!');
            }
            if !encoding.is_empty() {
                let _ = write!(s, " {encoding}");
                if variant.requests_identity() {
                    s.push('!');
                }
            }
            s
        }
    }
}

pub fn render_table<'a>(records: impl IntoIterator<Item = &'a ProbeRecord>) -> String {
    let mut out = to_fixed_width("origin", ORIGIN_WIDTH);
    for variant in Variant::ALL {
        let _ = write!(out, " {}", to_fixed_width(variant.key(), CELL_WIDTH));
    }
    out = out.trim_end().to_string();
    out.push('\n');

    for record in records {
        let mut row = to_fixed_width(&origin(&record.url), ORIGIN_WIDTH);
        for (variant, result) in record.slots() {
            let _ = write!(row, " {}", to_fixed_width(&cell(variant, result), CELL_WIDTH));
        }
        out.push_str(row.trim_end());
        out.push('\n');
    }
    out
}

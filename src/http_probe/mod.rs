pub mod probe;
pub mod result;
pub mod variant;

pub mod prelude {
    pub use super::probe::*;
    pub use super::result::*;
    pub use super::variant::*;
}

use std::fmt::Write;

/// Formats an error together with its whole `source()` chain.
pub fn report(mut err: &(dyn std::error::Error + 'static)) -> String {
    let mut s = format!("{}", err);
    while let Some(src) = err.source() {
        let _ = write!(s, "\n\nCaused by: {}", src);
        err = src;
    }
    s
}

//! Probes how origin servers handle HTTP range requests under four
//! `Accept-Encoding` presentations, streams the results as NDJSON and
//! classifies them into diagnostic categories.

pub mod classify;
pub mod config;
pub mod http_probe;
pub mod logging;
pub mod ndjson;
pub mod pool;
pub mod report;
pub mod seed;

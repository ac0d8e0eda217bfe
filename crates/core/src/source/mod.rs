//! Event source: where paths come from.
//!
//! Two producers feed one channel of [`WatchedPath`]s:
//! - the backlog scan, a one-time walk of the input tree at startup
//! - the live watcher, which turns filesystem notifications into arrivals
//!
//! The service runs the scan to completion and enqueues its results before
//! the watcher is attached, so files present at boot enter through the scan.

mod error;
mod live;
mod scan;
mod types;

pub use error::SourceError;
pub use live::{arrival_paths, LiveWatcher};
pub use scan::{expand_arrival, scan_backlog};
pub use types::{Origin, WatchedPath};

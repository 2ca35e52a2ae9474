//! Data source abstraction for receiving metric snapshots.
//!
//! Snapshots reach the report tool either through a portable-format file
//! written by a file output, or as newline-delimited JSON over TCP from a
//! TCP output.

mod file;
mod stream;

pub use file::FileSource;
pub use stream::StreamSource;

use std::fmt::Debug;

use islandwatch_types::MetricSnapshot;

/// Trait for receiving metric snapshots from various sources.
///
/// # Example
///
/// ```
/// use islandwatch::{DataSource, FileSource};
///
/// let mut source = FileSource::new("metrics.json");
/// if let Some(snapshot) = source.poll() {
///     println!("{}: {} islands", snapshot.page_name, snapshot.len());
/// }
/// ```
pub trait DataSource: Send + Debug {
    /// Poll for the latest snapshot.
    ///
    /// Returns `Some(snapshot)` if new data is available, `None` otherwise.
    /// This method should be non-blocking.
    fn poll(&mut self) -> Option<MetricSnapshot>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;

    /// The error from the last poll, if any.
    fn error(&self) -> Option<String>;

    /// Whether the source can never produce another snapshot.
    fn is_finished(&self) -> bool {
        false
    }
}

//! Portable export format for snapshots.
//!
//! The format is JSON with camelCase keys in a fixed order:
//!
//! ```text
//! {
//!   "pageName": "home",
//!   "timestamp": 1203.5,
//!   "firstContentfulPaint": 640.0,
//!   "largestContentfulPaint": null,
//!   "timeToInteractive": null,
//!   "bundleSizeBytes": 184320,
//!   "islandHydrations": [
//!     { "componentName": "task-list", "startTime": 45.0, "endTime": 90.0, "durationMs": 45.0 }
//!   ]
//! }
//! ```
//!
//! `null` marks a signal that has not fired; it is never written as `0`.
//! Serialization is deterministic: parsing an export and serializing it
//! again produces the same bytes.

use islandwatch_types::MetricSnapshot;
use thiserror::Error;

/// Errors raised while writing or reading the portable format.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to parse snapshot: {0}")]
    Parse(#[source] serde_json::Error),
}

/// Serialize a snapshot to compact portable JSON.
pub fn to_portable_format(snapshot: &MetricSnapshot) -> Result<String, ExportError> {
    serde_json::to_string(snapshot).map_err(ExportError::Serialize)
}

/// Serialize a snapshot to indented portable JSON, for files meant to be read.
pub fn to_portable_format_pretty(snapshot: &MetricSnapshot) -> Result<String, ExportError> {
    serde_json::to_string_pretty(snapshot).map_err(ExportError::Serialize)
}

/// Parse a snapshot from portable JSON (compact or indented).
///
/// The hydration list is re-sorted on the way in so a hand-edited payload
/// still yields a deterministic snapshot.
pub fn from_portable_format(payload: &str) -> Result<MetricSnapshot, ExportError> {
    let mut snapshot: MetricSnapshot = serde_json::from_str(payload).map_err(ExportError::Parse)?;
    islandwatch_types::sort_by_start(&mut snapshot.island_hydrations);
    Ok(snapshot)
}

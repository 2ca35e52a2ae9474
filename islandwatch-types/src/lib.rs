//! # islandwatch-types
//!
//! Core types for island hydration instrumentation. This crate defines the
//! data that flows between the instrumentation SDK, its outputs and any
//! consumer that renders or archives page-load metrics.
//!
//! ## Design Goals
//!
//! - **Value semantics**: a [`MetricSnapshot`] owns copies of every
//!   [`HydrationEvent`] it reports and is never mutated after construction
//! - **Deterministic ordering**: hydrations are always sorted by start time,
//!   ties broken by component name
//! - **Explicit absence**: signals that have not fired yet are `None`,
//!   never zero
//! - **Optional serialization**: enable `serde` and/or `minicbor` as needed
//!
//! ## Features
//!
//! - `serde`: JSON (and other formats) via serde, using camelCase keys
//! - `minicbor`: compact binary serialization via CBOR
//! - `all`: enable all serialization formats
//!
//! ## Example
//!
//! ```rust
//! use islandwatch_types::{metric, MetricSnapshot, Rating, ThresholdTable};
//!
//! let snapshot = MetricSnapshot::builder("home")
//!     .timestamp(1200.0)
//!     .first_contentful_paint(820.0)
//!     .island("search-box", 120.0, 150.0)
//!     .island("task-list", 45.0, 90.0)
//!     .build();
//!
//! // Islands come back ordered by start time, not insertion order.
//! assert_eq!(snapshot.island_hydrations[0].component_name, "task-list");
//!
//! let table = ThresholdTable::web_vitals();
//! assert_eq!(
//!     table.classify_optional(metric::FIRST_CONTENTFUL_PAINT, snapshot.first_contentful_paint),
//!     Rating::Good
//! );
//! assert_eq!(
//!     table.classify_optional(metric::TIME_TO_INTERACTIVE, snapshot.time_to_interactive),
//!     Rating::Unknown
//! );
//! ```

mod event;
mod snapshot;
mod thresholds;

pub use event::*;
pub use snapshot::*;
pub use thresholds::*;

/// Metric names used as threshold table keys.
///
/// These match the field names of the portable export format so a consumer
/// can look up a threshold directly from an exported key.
pub mod metric {
    /// Time until the first visible content is painted.
    pub const FIRST_CONTENTFUL_PAINT: &str = "firstContentfulPaint";
    /// Time until the largest visible content element has rendered.
    pub const LARGEST_CONTENTFUL_PAINT: &str = "largestContentfulPaint";
    /// Time until the page reliably responds to input.
    pub const TIME_TO_INTERACTIVE: &str = "timeToInteractive";
    /// Size of the shipped bundle, in bytes.
    pub const BUNDLE_SIZE_BYTES: &str = "bundleSizeBytes";
    /// Duration of a single island hydration.
    pub const ISLAND_HYDRATION: &str = "islandHydration";
}

//! Report models and rendering for metric snapshots.
//!
//! This module handles the transformation of portable-format snapshots into
//! rated reports suitable for display or export.
//!
//! ## Submodules
//!
//! - [`report`]: Rated report model ([`PageReport`], [`MetricRow`], [`IslandRow`])
//! - [`render`]: Plain-text table output
//!
//! ## Data Flow
//!
//! ```text
//! MetricSnapshot (portable JSON)
//!        │
//!        ▼
//! PageReport::from_snapshot()  ◀── ThresholdTable
//!        │
//!        ├──▶ render_text()      (terminal)
//!        │
//!        └──▶ to_export_json()   (--export)
//! ```

pub mod render;
pub mod report;

pub use render::{format_value, render_text};
pub use report::{IslandRow, MetricRow, PageReport, RatingCounts};

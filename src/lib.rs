//! # islandwatch
//!
//! A report tool and library for island hydration and page-load metrics.
//!
//! Pages instrumented with `islandwatch-sdk` emit [`MetricSnapshot`]s in a
//! portable JSON format. This crate reads those snapshots back, rates every
//! metric and island against a threshold table, and renders the result as
//! text or JSON.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  ┌─────────┐    ┌──────────┐    ┌──────────────────────┐ │
//! │  │ source  │───▶│   data   │───▶│ render_text / export │ │
//! │  │ (input) │    │ (rating) │    └──────────────────────┘ │
//! │  └─────────┘    └────▲─────┘                             │
//! │   FileSource         │                                   │
//! │   StreamSource   ┌───┴────┐                              │
//! │                  │ config │ thresholds: defaults ← file ← env
//! │                  └────────┘                              │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: Data source abstraction ([`DataSource`] trait) with
//!   implementations for file polling and TCP streams
//! - **[`data`]**: Rated report model ([`PageReport`]) and text rendering
//! - **[`config`]**: Threshold configuration loading
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Rate a snapshot written by a file output
//! islandwatch --file metrics.json
//!
//! # Keep re-reading it as the page refreshes
//! islandwatch --file metrics.json --watch
//!
//! # Follow a TCP output
//! islandwatch --connect localhost:9190
//!
//! # Write the rated report as JSON
//! islandwatch --file metrics.json --export report.json
//! ```
//!
//! ### As a library
//!
//! ```
//! use islandwatch::PageReport;
//! use islandwatch_types::{MetricSnapshot, Rating, ThresholdTable};
//!
//! let snapshot = MetricSnapshot::builder("home")
//!     .first_contentful_paint(640.0)
//!     .island("task-list", 45.0, 90.0)
//!     .build();
//!
//! let report = PageReport::from_snapshot(&snapshot, &ThresholdTable::web_vitals());
//! assert_eq!(report.health, Rating::Good);
//! ```

pub mod config;
pub mod data;
pub mod source;

// Re-export main types for convenience
pub use config::load_thresholds;
pub use data::{render_text, IslandRow, MetricRow, PageReport, RatingCounts};
pub use islandwatch_types::{MetricSnapshot, Rating, ThresholdTable};
pub use source::{DataSource, FileSource, StreamSource};

//! # islandwatch-sdk
//!
//! Instrumentation SDK for measuring island hydration and page load metrics.
//!
//! Pages built from independently hydrated islands report each island's
//! hydration window to a per-page registry. A collector combines those
//! windows with page-level timing signals into a [`MetricSnapshot`], and a
//! refresh scheduler re-collects on an interval so islands that hydrate late
//! are still captured.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use islandwatch_sdk::{Monitor, Output};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Create a monitor that emits snapshots every second
//!     let monitor = Monitor::builder()
//!         .page("home")
//!         .output(Output::file("metrics.json"))
//!         .interval(Duration::from_secs(1))
//!         .build();
//!
//!     // Start background collection (non-blocking)
//!     monitor.start();
//!
//!     // Each island announces its hydration window
//!     let island = monitor.island("task-list");
//!     island.mark_start();
//!     // ... attach handlers ...
//!     island.mark_end();
//!
//!     // ... the page keeps running ...
//! }
//! ```
//!
//! ## Features
//!
//! - **Simple API**: Just `mark_start()` and `mark_end()`
//! - **Multiple outputs**: File, TCP, or custom channel
//! - **Late hydration**: Periodic re-collection picks up lazy islands
//! - **Thread-safe**: Use from any thread or async task
//! - **Portable export**: Deterministic JSON with `null` for missing signals

mod collector;
mod export;
mod handle;
mod monitor;
mod output;
mod registry;
#[cfg(feature = "tokio")]
mod scheduler;
mod timing;

pub use collector::MetricCollector;
pub use export::{from_portable_format, to_portable_format, to_portable_format_pretty, ExportError};
pub use handle::{HydrationGuard, IslandHandle};
pub use monitor::{Monitor, MonitorBuilder};
pub use output::Output;
pub use registry::HydrationRegistry;
#[cfg(feature = "tokio")]
pub use scheduler::{RefreshScheduler, SchedulerHandle, SchedulerState, SnapshotCallback};
pub use timing::{
    Capabilities, Clock, ManualClock, MonotonicClock, NavigationEntry, PageTiming, PaintEntry,
    TimingSource,
};

// Re-export types for convenience
pub use islandwatch_types::{
    metric, HydrationEvent, MetricSnapshot, MetricSnapshotBuilder, Rating, ThresholdError,
    ThresholdTable, Thresholds,
};

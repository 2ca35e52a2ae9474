//! MetricSnapshot - a point-in-time view of a page's load and hydration metrics.

use crate::event::{sort_by_start, HydrationEvent};

/// A point-in-time capture of every currently known metric for one page.
///
/// Snapshots are produced fresh on every collection pass and superseded by
/// the next one; they are never merged or mutated. Each snapshot owns a copy
/// of the hydration events it reports, so later registry changes do not
/// affect a snapshot that was already handed out.
///
/// Paint and interactivity signals are `None` until the host has reported
/// them. `None` and `Some(0.0)` are different states and stay different
/// through serialization (`null` vs `0.0`).
///
/// # Example
///
/// ```rust
/// use islandwatch_types::MetricSnapshot;
///
/// let snapshot = MetricSnapshot::builder("home")
///     .timestamp(500.0)
///     .largest_contentful_paint(1800.0)
///     .bundle_size_bytes(120_000)
///     .island("task-form", 300.0, 340.0)
///     .build();
///
/// assert_eq!(snapshot.len(), 1);
/// assert!(snapshot.first_contentful_paint.is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[cfg_attr(feature = "minicbor", derive(minicbor::Encode, minicbor::Decode))]
pub struct MetricSnapshot {
    /// The page or view being measured.
    #[cfg_attr(feature = "minicbor", n(0))]
    pub page_name: String,

    /// Clock reading (ms since navigation start) when the snapshot was taken.
    #[cfg_attr(feature = "minicbor", n(1))]
    pub timestamp: f64,

    #[cfg_attr(feature = "minicbor", n(2))]
    pub first_contentful_paint: Option<f64>,

    /// Most recent largest-contentful-paint report at collection time.
    #[cfg_attr(feature = "minicbor", n(3))]
    pub largest_contentful_paint: Option<f64>,

    #[cfg_attr(feature = "minicbor", n(4))]
    pub time_to_interactive: Option<f64>,

    /// Supplied by the build; not derived from timing data.
    #[cfg_attr(feature = "minicbor", n(5))]
    pub bundle_size_bytes: Option<u64>,

    /// Finalized hydrations, sorted by start time then component name.
    #[cfg_attr(feature = "minicbor", n(6))]
    pub island_hydrations: Vec<HydrationEvent>,
}

impl MetricSnapshot {
    /// Create a builder for the given page.
    pub fn builder(page_name: impl Into<String>) -> MetricSnapshotBuilder {
        MetricSnapshotBuilder::new(page_name)
    }

    /// Check if no island has finished hydrating.
    pub fn is_empty(&self) -> bool {
        self.island_hydrations.is_empty()
    }

    /// Number of hydrated islands.
    pub fn len(&self) -> usize {
        self.island_hydrations.len()
    }

    /// Look up the hydration of a specific island.
    pub fn island(&self, component_name: &str) -> Option<&HydrationEvent> {
        self.island_hydrations
            .iter()
            .find(|e| e.component_name == component_name)
    }

    /// The island that took longest to hydrate.
    pub fn slowest_island(&self) -> Option<&HydrationEvent> {
        self.island_hydrations
            .iter()
            .max_by(|a, b| a.duration_ms.total_cmp(&b.duration_ms))
    }

    /// Sum of all island hydration durations.
    pub fn total_hydration_ms(&self) -> f64 {
        self.island_hydrations.iter().map(|e| e.duration_ms).sum()
    }

    /// Compare two snapshots ignoring the timestamp.
    ///
    /// Two collection passes with no new activity in between produce
    /// snapshots that are equal under this comparison.
    pub fn same_metrics(&self, other: &Self) -> bool {
        self.page_name == other.page_name
            && self.first_contentful_paint == other.first_contentful_paint
            && self.largest_contentful_paint == other.largest_contentful_paint
            && self.time_to_interactive == other.time_to_interactive
            && self.bundle_size_bytes == other.bundle_size_bytes
            && self.island_hydrations == other.island_hydrations
    }
}

/// Builder for constructing `MetricSnapshot` instances.
///
/// `build()` sorts the hydrations, so callers may add them in any order.
#[derive(Debug)]
pub struct MetricSnapshotBuilder {
    page_name: String,
    timestamp: f64,
    first_contentful_paint: Option<f64>,
    largest_contentful_paint: Option<f64>,
    time_to_interactive: Option<f64>,
    bundle_size_bytes: Option<u64>,
    island_hydrations: Vec<HydrationEvent>,
}

impl MetricSnapshotBuilder {
    /// Create a new builder for a page.
    pub fn new(page_name: impl Into<String>) -> Self {
        Self {
            page_name: page_name.into(),
            timestamp: 0.0,
            first_contentful_paint: None,
            largest_contentful_paint: None,
            time_to_interactive: None,
            bundle_size_bytes: None,
            island_hydrations: Vec::new(),
        }
    }

    /// Set the collection time.
    pub fn timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn first_contentful_paint(mut self, value: impl Into<Option<f64>>) -> Self {
        self.first_contentful_paint = value.into();
        self
    }

    pub fn largest_contentful_paint(mut self, value: impl Into<Option<f64>>) -> Self {
        self.largest_contentful_paint = value.into();
        self
    }

    pub fn time_to_interactive(mut self, value: impl Into<Option<f64>>) -> Self {
        self.time_to_interactive = value.into();
        self
    }

    pub fn bundle_size_bytes(mut self, value: impl Into<Option<u64>>) -> Self {
        self.bundle_size_bytes = value.into();
        self
    }

    /// Add a hydration from its start/end times.
    ///
    /// Spans rejected by [`HydrationEvent::new`] are skipped.
    pub fn island(mut self, component_name: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        if let Some(event) = HydrationEvent::new(component_name, start_time, end_time) {
            self.island_hydrations.push(event);
        }
        self
    }

    /// Add pre-built hydration events.
    pub fn hydrations(mut self, events: impl IntoIterator<Item = HydrationEvent>) -> Self {
        self.island_hydrations.extend(events);
        self
    }

    /// Build the snapshot.
    pub fn build(self) -> MetricSnapshot {
        let mut island_hydrations = self.island_hydrations;
        sort_by_start(&mut island_hydrations);

        MetricSnapshot {
            page_name: self.page_name,
            timestamp: self.timestamp,
            first_contentful_paint: self.first_contentful_paint,
            largest_contentful_paint: self.largest_contentful_paint,
            time_to_interactive: self.time_to_interactive,
            bundle_size_bytes: self.bundle_size_bytes,
            island_hydrations,
        }
    }
}

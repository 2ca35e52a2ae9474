//! Metric collector: one collection pass over the timing adapter and registry.

use std::sync::Arc;

use islandwatch_types::MetricSnapshot;

use crate::registry::HydrationRegistry;
use crate::timing::TimingSource;

/// Produces [`MetricSnapshot`]s from the current adapter and registry state.
///
/// Collection only reads. Two passes with no new hydration activity in
/// between yield snapshots that differ only in `timestamp`.
#[derive(Debug, Clone)]
pub struct MetricCollector {
    timing: Arc<dyn TimingSource>,
    registry: Arc<HydrationRegistry>,
    bundle_size_bytes: Option<u64>,
}

impl MetricCollector {
    pub fn new(timing: Arc<dyn TimingSource>, registry: Arc<HydrationRegistry>) -> Self {
        Self {
            timing,
            registry,
            bundle_size_bytes: None,
        }
    }

    /// Attach the bundle size measured by the build.
    pub fn with_bundle_size(mut self, bytes: Option<u64>) -> Self {
        self.bundle_size_bytes = bytes;
        self
    }

    pub fn registry(&self) -> &Arc<HydrationRegistry> {
        &self.registry
    }

    pub fn timing(&self) -> &Arc<dyn TimingSource> {
        &self.timing
    }

    pub fn bundle_size_bytes(&self) -> Option<u64> {
        self.bundle_size_bytes
    }

    /// Run one collection pass for `page_name`.
    pub fn collect(&self, page_name: &str) -> MetricSnapshot {
        MetricSnapshot::builder(page_name)
            .first_contentful_paint(self.timing.first_contentful_paint())
            .largest_contentful_paint(self.timing.largest_contentful_paint())
            .time_to_interactive(self.timing.time_to_interactive())
            .bundle_size_bytes(self.bundle_size_bytes)
            .hydrations(self.registry.list())
            .timestamp(self.timing.now())
            .build()
    }
}

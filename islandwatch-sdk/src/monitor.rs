//! The Monitor type: one page view's instrumentation, wired together.

use std::sync::Arc;
use std::time::Duration;

use islandwatch_types::MetricSnapshot;
use parking_lot::RwLock;

use crate::collector::MetricCollector;
use crate::export::{to_portable_format, ExportError};
use crate::handle::IslandHandle;
use crate::output::Output;
use crate::registry::HydrationRegistry;
#[cfg(feature = "tokio")]
use crate::scheduler::{RefreshScheduler, SchedulerHandle};
use crate::timing::{Clock, PageTiming, TimingSource};

const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// The main entry point for instrumenting a page.
///
/// A Monitor owns the hydration registry for one page view, collects
/// snapshots from it and the timing adapter, and periodically emits them to
/// configured outputs.
///
/// # Example
///
/// ```rust,no_run
/// use islandwatch_sdk::{Monitor, Output};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let monitor = Monitor::builder()
///         .page("home")
///         .output(Output::file("metrics.json"))
///         .interval(Duration::from_millis(500))
///         .bundle_size_bytes(184_320)
///         .build();
///
///     // Start background collection
///     let handle = monitor.start();
///
///     // Islands report as they hydrate
///     let island = monitor.island("task-list");
///     island.mark_start();
///     island.mark_end();
///
///     tokio::time::sleep(Duration::from_secs(2)).await;
///     handle.stop();
/// }
/// ```
#[derive(Debug)]
pub struct Monitor {
    page_name: String,
    timing: Arc<dyn TimingSource>,
    registry: Arc<HydrationRegistry>,
    collector: MetricCollector,
    outputs: Arc<Vec<Output>>,
    interval: Duration,
    latest: Arc<RwLock<Option<MetricSnapshot>>>,
    #[cfg(feature = "tokio")]
    scheduler: RefreshScheduler,
}

impl Monitor {
    /// Create a monitor for a page with default settings.
    ///
    /// Uses a wall-clock [`PageTiming`] anchored now, no outputs, and a one
    /// second refresh interval.
    pub fn new(page_name: impl Into<String>) -> Self {
        Self::builder().page(page_name).build()
    }

    /// Create a builder for configuring the monitor.
    pub fn builder() -> MonitorBuilder {
        MonitorBuilder::new()
    }

    pub fn page_name(&self) -> &str {
        &self.page_name
    }

    pub fn registry(&self) -> &Arc<HydrationRegistry> {
        &self.registry
    }

    pub fn timing(&self) -> &Arc<dyn TimingSource> {
        &self.timing
    }

    /// Get a handle for recording an island's hydration.
    ///
    /// Handles are cheap; asking twice for the same name records into the
    /// same registry slot.
    pub fn island(&self, name: &str) -> IslandHandle {
        IslandHandle {
            registry: self.registry.clone(),
            name: name.to_string(),
        }
    }

    /// Collect a snapshot of all current metrics.
    ///
    /// This is useful if you want to collect on your own schedule rather
    /// than using background collection.
    pub fn collect(&self) -> MetricSnapshot {
        let snapshot = self.collector.collect(&self.page_name);
        *self.latest.write() = Some(snapshot.clone());
        snapshot
    }

    /// The most recent snapshot, from either `collect()` or a background run.
    pub fn latest(&self) -> Option<MetricSnapshot> {
        self.latest.read().clone()
    }

    /// Serialize the most recent snapshot to the portable format.
    pub fn export_latest(&self) -> Result<Option<String>, ExportError> {
        self.latest
            .read()
            .as_ref()
            .map(to_portable_format)
            .transpose()
    }

    /// Start background collection and emission.
    ///
    /// Collects immediately and then every interval, sending each snapshot
    /// to every output from a separate task so slow outputs never delay
    /// collection. Calling this while already running returns the handle of
    /// the current run.
    #[cfg(feature = "tokio")]
    pub fn start(&self) -> SchedulerHandle {
        use tokio::sync::mpsc;

        if tokio::runtime::Handle::try_current().is_err() {
            tracing::warn!(page = %self.page_name, "monitor needs a tokio runtime, not starting");
            return self.scheduler.inert_handle();
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<MetricSnapshot>();
        let latest = self.latest.clone();

        let handle = self.scheduler.start(self.interval, move |snapshot| {
            *latest.write() = Some(snapshot.clone());
            let _ = tx.send(snapshot);
        });

        // Ends when the scheduler drops its callback (and with it `tx`).
        let outputs = self.outputs.clone();
        tokio::spawn(async move {
            while let Some(snapshot) = rx.recv().await {
                emit_all(&outputs, &snapshot).await;
            }
        });

        handle
    }

    /// Stop background collection. Safe to call repeatedly.
    #[cfg(feature = "tokio")]
    pub fn stop(&self) {
        self.scheduler.stop();
    }

    #[cfg(feature = "tokio")]
    pub fn is_running(&self) -> bool {
        self.scheduler.state() == crate::scheduler::SchedulerState::Running
    }

    /// Collect and emit a snapshot to all outputs immediately.
    #[cfg(feature = "tokio")]
    pub async fn emit_now(&self) -> MetricSnapshot {
        let snapshot = self.collect();
        emit_all(&self.outputs, &snapshot).await;
        snapshot
    }

    /// Tear down the page view: stop polling, forget every hydration and
    /// timing signal, and drop the latest snapshot.
    pub fn reset(&self) {
        #[cfg(feature = "tokio")]
        self.scheduler.stop();
        self.registry.clear();
        self.timing.reset();
        *self.latest.write() = None;
        tracing::debug!(page = %self.page_name, "monitor reset");
    }
}

#[cfg(feature = "tokio")]
async fn emit_all(outputs: &[Output], snapshot: &MetricSnapshot) {
    for output in outputs {
        if let Err(e) = output.emit(snapshot).await {
            tracing::warn!(output = %output.describe(), error = %e, "failed to emit snapshot");
        }
    }
}

/// Builder for configuring a Monitor.
#[derive(Debug, Default)]
pub struct MonitorBuilder {
    page_name: Option<String>,
    outputs: Vec<Output>,
    interval: Option<Duration>,
    bundle_size_bytes: Option<u64>,
    timing: Option<(Arc<dyn TimingSource>, Arc<dyn Clock>)>,
}

impl MonitorBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the page being measured. Defaults to `"page"`.
    pub fn page(mut self, name: impl Into<String>) -> Self {
        self.page_name = Some(name.into());
        self
    }

    /// Add an output destination.
    ///
    /// Multiple outputs can be added; snapshots will be emitted to all of them.
    pub fn output(mut self, output: Output) -> Self {
        self.outputs.push(output);
        self
    }

    /// Set the refresh interval.
    ///
    /// Defaults to 1 second if not specified.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Bundle size measured by the build step.
    pub fn bundle_size_bytes(mut self, bytes: u64) -> Self {
        self.bundle_size_bytes = Some(bytes);
        self
    }

    /// Use a specific timing adapter.
    ///
    /// The same adapter provides the clock for the hydration registry. Keep
    /// your own clone of the `Arc` to push observer reports into it.
    pub fn timing<T>(mut self, timing: Arc<T>) -> Self
    where
        T: TimingSource + Clock + 'static,
    {
        let clock: Arc<dyn Clock> = timing.clone();
        let source: Arc<dyn TimingSource> = timing;
        self.timing = Some((source, clock));
        self
    }

    /// Build the monitor.
    pub fn build(self) -> Monitor {
        let (timing, clock) = self.timing.unwrap_or_else(|| {
            let timing = Arc::new(PageTiming::start_now());
            let clock: Arc<dyn Clock> = timing.clone();
            let source: Arc<dyn TimingSource> = timing;
            (source, clock)
        });

        let page_name = self.page_name.unwrap_or_else(|| "page".to_string());
        let registry = Arc::new(HydrationRegistry::new(clock));
        let collector = MetricCollector::new(timing.clone(), registry.clone())
            .with_bundle_size(self.bundle_size_bytes);

        Monitor {
            #[cfg(feature = "tokio")]
            scheduler: RefreshScheduler::new(collector.clone(), page_name.clone()),
            page_name,
            timing,
            registry,
            collector,
            outputs: Arc::new(self.outputs),
            interval: self.interval.unwrap_or(DEFAULT_INTERVAL),
            latest: Arc::new(RwLock::new(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::from_portable_format;
    use crate::timing::{Capabilities, ManualClock, PaintEntry};

    fn manual_monitor() -> (ManualClock, Arc<PageTiming<ManualClock>>, MonitorBuilder) {
        let clock = ManualClock::new(0.0);
        let timing = Arc::new(PageTiming::new(clock.clone(), Capabilities::all()));
        let builder = Monitor::builder().page("home").timing(timing.clone());
        (clock, timing, builder)
    }

    #[test]
    fn test_monitor_new() {
        let monitor = Monitor::new("home");
        assert_eq!(monitor.page_name(), "home");
        let handle = monitor.island("task-list");
        assert_eq!(handle.name(), "task-list");
    }

    #[test]
    fn default_interval_is_one_second() {
        let monitor = Monitor::new("home");
        assert_eq!(monitor.interval, Duration::from_secs(1));
        assert!(monitor.outputs.is_empty());
    }

    #[test]
    fn test_builder() {
        let monitor = Monitor::builder()
            .page("tasks")
            .output(Output::file("metrics.json"))
            .output(Output::tcp("localhost:9190"))
            .interval(Duration::from_millis(250))
            .bundle_size_bytes(1024)
            .build();

        assert_eq!(monitor.page_name(), "tasks");
        assert_eq!(monitor.interval, Duration::from_millis(250));
        assert_eq!(monitor.outputs.len(), 2);
        assert_eq!(monitor.collect().bundle_size_bytes, Some(1024));
    }

    #[test]
    fn builder_default_page_name() {
        assert_eq!(Monitor::builder().build().page_name(), "page");
    }

    #[test]
    fn test_monitor_collect_scenario() {
        let (clock, _timing, builder) = manual_monitor();
        let monitor = builder.build();

        for (name, start, end) in [
            ("search-box", 120.0, 150.0),
            ("task-list", 45.0, 90.0),
            ("stats-chart", 300.0, 340.0),
        ] {
            let island = monitor.island(name);
            clock.set(start);
            island.mark_start();
            clock.set(end);
            island.mark_end();
        }

        let snapshot = monitor.collect();
        let got: Vec<(f64, f64)> = snapshot
            .island_hydrations
            .iter()
            .map(|e| (e.start_time, e.duration_ms))
            .collect();
        assert_eq!(got, vec![(45.0, 45.0), (120.0, 30.0), (300.0, 40.0)]);
    }

    #[test]
    fn same_island_name_shares_registry_slot() {
        let (clock, _timing, builder) = manual_monitor();
        let monitor = builder.build();

        monitor.island("a").mark_start();
        clock.advance(10.0);
        monitor.island("a").mark_end();

        assert_eq!(monitor.registry().len(), 1);
        assert_eq!(monitor.island("a").last_event().unwrap().duration_ms, 10.0);
    }

    #[test]
    fn export_latest_follows_collect() {
        let (_clock, timing, builder) = manual_monitor();
        let monitor = builder.build();
        assert!(monitor.export_latest().unwrap().is_none());

        timing.report_paint(PaintEntry::FirstContentfulPaint(640.0));
        let snapshot = monitor.collect();

        let json = monitor.export_latest().unwrap().unwrap();
        assert_eq!(from_portable_format(&json).unwrap(), snapshot);
    }

    #[test]
    fn reset_clears_page_state() {
        let (clock, timing, builder) = manual_monitor();
        let monitor = builder.build();

        timing.report_paint(PaintEntry::FirstContentfulPaint(640.0));
        monitor.island("a").mark_start();
        clock.advance(5.0);
        monitor.island("a").mark_end();
        monitor.island("b").mark_start();
        monitor.collect();

        monitor.reset();

        assert!(monitor.latest().is_none());
        assert!(monitor.registry().is_empty());
        assert_eq!(monitor.registry().pending_count(), 0);
        let snapshot = monitor.collect();
        assert_eq!(snapshot.first_contentful_paint, None);
        assert!(snapshot.is_empty());
    }

    #[cfg(feature = "tokio")]
    #[test]
    fn start_without_runtime_is_a_no_op() {
        let (output, mut rx) = Output::channel(4);
        let (_clock, _timing, builder) = manual_monitor();
        let monitor = builder.output(output).build();

        let handle = monitor.start();

        assert!(!handle.is_running());
        assert!(!monitor.is_running());
        assert!(monitor.latest().is_none());
        assert!(rx.try_recv().is_err());
    }

    #[cfg(feature = "tokio")]
    #[tokio::test(start_paused = true)]
    async fn start_emits_to_channel_output() {
        let (output, mut rx) = Output::channel(16);
        let (clock, _timing, builder) = manual_monitor();
        let monitor = builder
            .output(output)
            .interval(Duration::from_millis(100))
            .build();

        let handle = monitor.start();
        let first = rx.recv().await.unwrap();
        assert!(first.is_empty());

        clock.set(40.0);
        monitor.island("lazy").mark_start();
        clock.set(70.0);
        monitor.island("lazy").mark_end();

        let second = rx.recv().await.unwrap();
        assert_eq!(second.island("lazy").unwrap().duration_ms, 30.0);
        assert_eq!(monitor.latest().unwrap(), second);

        handle.stop();
        assert!(!monitor.is_running());
    }

    #[cfg(feature = "tokio")]
    #[tokio::test(start_paused = true)]
    async fn emitter_finishes_after_stop() {
        let (output, mut rx) = Output::channel(16);
        let (_clock, _timing, builder) = manual_monitor();
        let monitor = builder
            .output(output)
            .interval(Duration::from_millis(100))
            .build();

        monitor.start();
        assert!(rx.recv().await.is_some());
        monitor.stop();
        monitor.stop();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());
    }

    #[cfg(feature = "tokio")]
    #[tokio::test]
    async fn emit_now_writes_file_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        let (_clock, _timing, builder) = manual_monitor();
        let monitor = builder.output(Output::file(&path)).build();

        let snapshot = monitor.emit_now().await;

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(from_portable_format(&content).unwrap(), snapshot);
    }

    #[cfg(feature = "tokio")]
    #[tokio::test]
    async fn failing_output_does_not_stop_others() {
        let (output, mut rx) = Output::channel(4);
        let (_clock, _timing, builder) = manual_monitor();
        let monitor = builder
            .output(Output::file("/nonexistent-dir/metrics.json"))
            .output(output)
            .build();

        monitor.emit_now().await;
        assert!(rx.recv().await.is_some());
    }
}

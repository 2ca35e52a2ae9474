//! Refresh scheduler: re-collects snapshots at a fixed interval.
//!
//! Islands behind lazy boundaries can finish hydrating long after the first
//! collection pass, and nothing tells the page-level collector when that
//! happens. The scheduler reconciles late arrivals by polling: it collects
//! once on start and then every interval until stopped.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use islandwatch_types::MetricSnapshot;
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::collector::MetricCollector;

/// Callback invoked with every snapshot the scheduler collects.
pub type SnapshotCallback = Box<dyn FnMut(MetricSnapshot) + Send + 'static>;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Generation of a handle that never refers to a run.
const INERT_GENERATION: u64 = 0;

/// Lifecycle state of a [`RefreshScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

#[derive(Debug, Default)]
struct Status {
    /// Generation of the current run, if any.
    running: Option<u64>,
    next_generation: u64,
}

struct Shared {
    collector: MetricCollector,
    page_name: String,
    status: Mutex<Status>,
    // Lock order is always `sink` then `status`. The reentrant lock lets a
    // callback call `stop()` on its own scheduler without deadlocking.
    sink: ReentrantMutex<RefCell<Option<SnapshotCallback>>>,
    latest: RwLock<Option<MetricSnapshot>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Shared {
    fn is_running(&self, generation: u64) -> bool {
        self.status.lock().running == Some(generation)
    }

    /// Collect and deliver one snapshot. Returns whether the run continues.
    fn fire(&self, generation: u64) -> bool {
        let sink = self.sink.lock();
        if !self.is_running(generation) {
            return false;
        }

        let Ok(mut slot) = sink.try_borrow_mut() else {
            return false;
        };

        let snapshot = self.collector.collect(&self.page_name);
        *self.latest.write() = Some(snapshot.clone());

        if let Some(callback) = slot.as_mut() {
            callback(snapshot);
        }

        // The callback may have stopped the run; drop it here since `stop()`
        // could not while it was executing.
        let running = self.is_running(generation);
        if !running {
            slot.take();
        }
        running
    }

    fn stop(&self, generation: Option<u64>) -> bool {
        let sink = self.sink.lock();
        let stopped = {
            let mut status = self.status.lock();
            match (status.running, generation) {
                (Some(current), Some(wanted)) if current != wanted => None,
                (current, _) => {
                    status.running = None;
                    current
                }
            }
        };

        let Some(generation) = stopped else {
            return false;
        };

        if let Ok(mut slot) = sink.try_borrow_mut() {
            slot.take();
        }
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
        debug!(page = %self.page_name, generation, "refresh scheduler stopped");
        true
    }
}

/// Cooperative polling loop over a [`MetricCollector`].
///
/// `Idle → Running → Idle`. Starting while running keeps the existing timer.
/// Stopping is idempotent, and once `stop()` returns no further callback
/// fires.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use islandwatch_sdk::{HydrationRegistry, MetricCollector, PageTiming, RefreshScheduler};
///
/// #[tokio::main]
/// async fn main() {
///     let timing = Arc::new(PageTiming::start_now());
///     let registry = Arc::new(HydrationRegistry::new(timing.clone()));
///     let collector = MetricCollector::new(timing, registry);
///
///     let scheduler = RefreshScheduler::new(collector, "home");
///     let handle = scheduler.start(Duration::from_millis(500), |snapshot| {
///         println!("{} islands hydrated", snapshot.len());
///     });
///
///     tokio::time::sleep(Duration::from_secs(2)).await;
///     handle.stop();
/// }
/// ```
#[derive(Clone)]
pub struct RefreshScheduler {
    shared: Arc<Shared>,
}

impl RefreshScheduler {
    pub fn new(collector: MetricCollector, page_name: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Shared {
                collector,
                page_name: page_name.into(),
                status: Mutex::new(Status::default()),
                sink: ReentrantMutex::new(RefCell::new(None)),
                latest: RwLock::new(None),
                task: Mutex::new(None),
            }),
        }
    }

    pub fn page_name(&self) -> &str {
        &self.shared.page_name
    }

    pub fn collector(&self) -> &MetricCollector {
        &self.shared.collector
    }

    pub fn state(&self) -> SchedulerState {
        if self.shared.status.lock().running.is_some() {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    /// The most recent snapshot collected by any run.
    pub fn latest(&self) -> Option<MetricSnapshot> {
        self.shared.latest.read().clone()
    }

    /// Collect immediately, then every `interval`, until stopped.
    ///
    /// Must be called from within a tokio runtime. If the scheduler is
    /// already running, `on_snapshot` is dropped and the handle of the
    /// current run is returned.
    pub fn start<F>(&self, interval: Duration, on_snapshot: F) -> SchedulerHandle
    where
        F: FnMut(MetricSnapshot) + Send + 'static,
    {
        let interval = if interval < MIN_INTERVAL {
            warn!(?interval, "refresh interval too small, using {:?}", MIN_INTERVAL);
            MIN_INTERVAL
        } else {
            interval
        };

        if tokio::runtime::Handle::try_current().is_err() {
            warn!(page = %self.shared.page_name, "refresh scheduler needs a tokio runtime, not starting");
            return self.inert_handle();
        }

        let generation = {
            let sink = self.shared.sink.lock();
            let mut status = self.shared.status.lock();

            if let Some(current) = status.running {
                warn!(page = %self.shared.page_name, "refresh scheduler already running");
                return self.handle(current);
            }

            let Ok(mut slot) = sink.try_borrow_mut() else {
                warn!(page = %self.shared.page_name, "cannot restart from inside a snapshot callback");
                return self.inert_handle();
            };

            status.next_generation += 1;
            status.running = Some(status.next_generation);
            *slot = Some(Box::new(on_snapshot));
            status.next_generation
        };

        debug!(page = %self.shared.page_name, generation, ?interval, "refresh scheduler started");

        if !self.shared.fire(generation) {
            return self.handle(generation);
        }

        let shared = self.shared.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if !shared.fire(generation) {
                    break;
                }
            }
        });

        // A stop that raced the spawn has already cleared the run; the task
        // exits on its first tick in that case.
        if self.shared.is_running(generation) {
            *self.shared.task.lock() = Some(task);
        } else {
            task.abort();
        }

        self.handle(generation)
    }

    /// Stop the current run, if any. Safe to call repeatedly.
    pub fn stop(&self) {
        self.shared.stop(None);
    }

    /// A handle that reports not running and whose `stop()` does nothing.
    pub(crate) fn inert_handle(&self) -> SchedulerHandle {
        self.handle(INERT_GENERATION)
    }

    fn handle(&self, generation: u64) -> SchedulerHandle {
        SchedulerHandle {
            shared: self.shared.clone(),
            generation,
        }
    }
}

impl fmt::Debug for RefreshScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshScheduler")
            .field("page_name", &self.shared.page_name)
            .field("state", &self.state())
            .finish()
    }
}

/// Handle to one run of a [`RefreshScheduler`].
///
/// Stopping through a handle only affects the run it was issued for; a
/// stale handle cannot stop a later run.
#[derive(Clone)]
pub struct SchedulerHandle {
    shared: Arc<Shared>,
    generation: u64,
}

impl SchedulerHandle {
    /// Stop this run. Safe to call repeatedly.
    pub fn stop(&self) {
        self.shared.stop(Some(self.generation));
    }

    pub fn is_running(&self) -> bool {
        self.shared.is_running(self.generation)
    }
}

impl fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("generation", &self.generation)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::HydrationRegistry;
    use crate::timing::{Capabilities, ManualClock, PageTiming};

    struct Fixture {
        clock: ManualClock,
        registry: Arc<HydrationRegistry>,
        scheduler: RefreshScheduler,
        seen: Arc<Mutex<Vec<MetricSnapshot>>>,
    }

    fn fixture() -> Fixture {
        let clock = ManualClock::new(0.0);
        let timing = Arc::new(PageTiming::new(clock.clone(), Capabilities::all()));
        let registry = Arc::new(HydrationRegistry::new(timing.clone()));
        let collector = MetricCollector::new(timing, registry.clone());
        Fixture {
            clock,
            registry,
            scheduler: RefreshScheduler::new(collector, "home"),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    impl Fixture {
        fn recorder(&self) -> impl FnMut(MetricSnapshot) + Send + 'static {
            let seen = self.seen.clone();
            move |snapshot| seen.lock().push(snapshot)
        }

        fn count(&self) -> usize {
            self.seen.lock().len()
        }
    }

    #[test]
    fn start_without_runtime_stays_idle() {
        let fx = fixture();

        let handle = fx.scheduler.start(Duration::from_millis(10), fx.recorder());

        assert!(!handle.is_running());
        assert_eq!(fx.scheduler.state(), SchedulerState::Idle);
        assert_eq!(fx.count(), 0);
        assert!(fx.scheduler.latest().is_none());
        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn start_after_failed_start_runs() {
        let fx = fixture();
        let inert = std::thread::scope(|s| {
            s.spawn(|| fx.scheduler.start(Duration::from_millis(10), |_| {}))
                .join()
                .unwrap()
        });
        assert!(!inert.is_running());

        let handle = fx.scheduler.start(Duration::from_millis(100), fx.recorder());
        assert!(handle.is_running());
        assert_eq!(fx.count(), 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fx.count(), 2);

        inert.stop();
        assert!(handle.is_running());
        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn collects_immediately_on_start() {
        let f = fixture();
        let handle = f.scheduler.start(Duration::from_millis(100), f.recorder());

        assert_eq!(f.count(), 1);
        assert_eq!(f.scheduler.state(), SchedulerState::Running);
        assert!(handle.is_running());
        assert!(f.scheduler.latest().is_some());

        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn collects_every_interval() {
        let f = fixture();
        let handle = f.scheduler.start(Duration::from_millis(100), f.recorder());

        tokio::time::sleep(Duration::from_millis(350)).await;

        assert_eq!(f.count(), 4);
        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn picks_up_late_hydrations() {
        let f = fixture();
        let handle = f.scheduler.start(Duration::from_millis(100), f.recorder());
        assert!(f.seen.lock()[0].is_empty());

        f.clock.set(2500.0);
        f.registry.mark_start("lazy-comments");
        f.clock.set(2600.0);
        f.registry.mark_end("lazy-comments");

        tokio::time::sleep(Duration::from_millis(150)).await;

        let latest = f.scheduler.latest().unwrap();
        assert_eq!(latest.island("lazy-comments").unwrap().duration_ms, 100.0);
        assert_eq!(f.seen.lock().last().unwrap(), &latest);
        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn no_callbacks_after_stop() {
        let f = fixture();
        let handle = f.scheduler.start(Duration::from_millis(100), f.recorder());
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(f.count(), 2);

        handle.stop();
        tokio::time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(f.count(), 2);
        assert_eq!(f.scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent() {
        let f = fixture();
        let handle = f.scheduler.start(Duration::from_millis(100), f.recorder());

        f.scheduler.stop();
        f.scheduler.stop();
        handle.stop();

        assert_eq!(f.scheduler.state(), SchedulerState::Idle);
        assert!(!handle.is_running());
    }

    #[tokio::test]
    async fn stop_while_idle_is_a_no_op() {
        let f = fixture();
        f.scheduler.stop();
        f.scheduler.stop();
        assert_eq!(f.scheduler.state(), SchedulerState::Idle);
        assert!(f.scheduler.latest().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn start_while_running_keeps_existing_run() {
        let f = fixture();
        let first = f.scheduler.start(Duration::from_millis(100), f.recorder());

        let other_calls = Arc::new(Mutex::new(0usize));
        let counter = other_calls.clone();
        let second = f
            .scheduler
            .start(Duration::from_millis(10), move |_| *counter.lock() += 1);

        tokio::time::sleep(Duration::from_millis(250)).await;

        assert_eq!(*other_calls.lock(), 0);
        assert_eq!(f.count(), 3);

        second.stop();
        assert!(!first.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_stop() {
        let f = fixture();
        let first = f.scheduler.start(Duration::from_millis(100), f.recorder());
        first.stop();

        let second = f.scheduler.start(Duration::from_millis(100), f.recorder());
        assert_eq!(f.count(), 2);

        // A stale handle does not stop the new run.
        first.stop();
        assert!(second.is_running());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(f.count(), 3);
        second.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn callback_can_stop_its_own_scheduler() {
        let f = fixture();
        let scheduler = f.scheduler.clone();
        let seen = f.seen.clone();

        f.scheduler.start(Duration::from_millis(100), move |snapshot| {
            seen.lock().push(snapshot);
            scheduler.stop();
        });

        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(f.count(), 1);
        assert_eq!(f.scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_is_clamped() {
        let f = fixture();
        let handle = f.scheduler.start(Duration::ZERO, f.recorder());
        tokio::time::sleep(Duration::from_millis(3)).await;
        assert!(f.count() >= 2);
        handle.stop();
    }
}

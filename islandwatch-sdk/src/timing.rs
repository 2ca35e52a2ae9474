//! Clock and observer adapter over the host's timing primitives.
//!
//! The rest of the SDK only sees two traits: [`Clock`] for the monotonic
//! "now" used to stamp hydrations and snapshots, and [`TimingSource`] for
//! paint/navigation signals. Host bindings push observer reports into a
//! [`PageTiming`]; tests drive a [`ManualClock`] instead of real time.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

/// Monotonic time source, in milliseconds since navigation start.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> f64;
}

/// Page-load timing signals in a uniform shape.
///
/// Every getter returns `None` until the underlying signal has fired, and
/// keeps returning `None` forever if the host cannot produce it. Absence is
/// a valid, displayable state, not an error.
pub trait TimingSource: Send + Sync + Debug {
    /// Current monotonic time.
    fn now(&self) -> f64;

    /// First contentful paint, once painted.
    fn first_contentful_paint(&self) -> Option<f64>;

    /// The most recent largest-contentful-paint report.
    fn largest_contentful_paint(&self) -> Option<f64>;

    /// Heuristic time to interactive, once the load sequence has completed.
    fn time_to_interactive(&self) -> Option<f64>;

    /// Forget every signal observed so far (new page view).
    ///
    /// `Monitor::reset` relies on this to start a page view from scratch, so
    /// every implementation must clear its own state.
    fn reset(&self);
}

/// Wall-clock backed monotonic clock anchored at navigation start.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Anchor the clock at the current instant.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Anchor the clock at a known navigation start.
    pub fn with_origin(origin: Instant) -> Self {
        Self { origin }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Deterministic clock that only moves when told to.
///
/// Clones share the same reading, so a test can keep one clone and hand
/// another to the registry.
///
/// ```rust
/// use islandwatch_sdk::{Clock, ManualClock};
///
/// let clock = ManualClock::new(100.0);
/// let shared = clock.clone();
/// clock.advance(25.0);
/// assert_eq!(shared.now(), 125.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<f64>>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, now: f64) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, delta: f64) {
        *self.now.lock() += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.now.lock()
    }
}

/// Which timing signals the host environment can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub first_contentful_paint: bool,
    pub largest_contentful_paint: bool,
    pub navigation_timing: bool,
}

impl Capabilities {
    pub const fn all() -> Self {
        Self {
            first_contentful_paint: true,
            largest_contentful_paint: true,
            navigation_timing: true,
        }
    }

    pub const fn none() -> Self {
        Self {
            first_contentful_paint: false,
            largest_contentful_paint: false,
            navigation_timing: false,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::all()
    }
}

/// A paint observer report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaintEntry {
    FirstContentfulPaint(f64),
    /// May be reported several times as larger content appears.
    LargestContentfulPaint(f64),
}

/// A navigation timing report, in milliseconds since navigation start.
///
/// Hosts may report partially completed entries; `load_event_end` stays
/// `None` until the load event has finished.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NavigationEntry {
    pub dom_interactive: f64,
    pub dom_content_loaded_event_end: Option<f64>,
    pub load_event_end: Option<f64>,
}

#[derive(Debug, Default)]
struct Signals {
    first_contentful_paint: Option<f64>,
    largest_contentful_paint: Option<f64>,
    navigation: Option<NavigationEntry>,
}

/// Observer-fed timing adapter.
///
/// Host bindings call [`report_paint`](Self::report_paint) and
/// [`report_navigation`](Self::report_navigation) from their observer
/// callbacks; the collector reads whatever is known at collection time.
///
/// ```rust
/// use islandwatch_sdk::{Capabilities, ManualClock, PageTiming, PaintEntry, TimingSource};
///
/// let timing = PageTiming::new(ManualClock::new(0.0), Capabilities::all());
/// assert_eq!(timing.first_contentful_paint(), None);
///
/// timing.report_paint(PaintEntry::FirstContentfulPaint(640.0));
/// timing.report_paint(PaintEntry::LargestContentfulPaint(900.0));
/// timing.report_paint(PaintEntry::LargestContentfulPaint(1300.0));
///
/// assert_eq!(timing.first_contentful_paint(), Some(640.0));
/// assert_eq!(timing.largest_contentful_paint(), Some(1300.0));
/// ```
#[derive(Debug)]
pub struct PageTiming<C = MonotonicClock> {
    clock: C,
    capabilities: Capabilities,
    signals: RwLock<Signals>,
}

impl PageTiming<MonotonicClock> {
    /// Adapter anchored at the current instant, with every capability.
    pub fn start_now() -> Self {
        Self::new(MonotonicClock::new(), Capabilities::all())
    }
}

impl<C: Clock> PageTiming<C> {
    pub fn new(clock: C, capabilities: Capabilities) -> Self {
        Self {
            clock,
            capabilities,
            signals: RwLock::new(Signals::default()),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Record a paint observer report.
    pub fn report_paint(&self, entry: PaintEntry) {
        match entry {
            PaintEntry::FirstContentfulPaint(value) => {
                if !self.capabilities.first_contentful_paint || !valid_timestamp(value) {
                    debug!(value, "ignoring first-contentful-paint report");
                    return;
                }
                let mut signals = self.signals.write();
                // Only the first report counts.
                if signals.first_contentful_paint.is_none() {
                    signals.first_contentful_paint = Some(value);
                }
            }
            PaintEntry::LargestContentfulPaint(value) => {
                if !self.capabilities.largest_contentful_paint || !valid_timestamp(value) {
                    debug!(value, "ignoring largest-contentful-paint report");
                    return;
                }
                self.signals.write().largest_contentful_paint = Some(value);
            }
        }
    }

    /// Record a navigation timing report, replacing any earlier one.
    pub fn report_navigation(&self, entry: NavigationEntry) {
        if !self.capabilities.navigation_timing || !valid_timestamp(entry.dom_interactive) {
            debug!(?entry, "ignoring navigation timing report");
            return;
        }
        self.signals.write().navigation = Some(entry);
    }
}

fn valid_timestamp(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

impl<C: Clock> Clock for PageTiming<C> {
    fn now(&self) -> f64 {
        self.clock.now()
    }
}

impl<C: Clock> TimingSource for PageTiming<C> {
    fn now(&self) -> f64 {
        self.clock.now()
    }

    fn first_contentful_paint(&self) -> Option<f64> {
        self.signals.read().first_contentful_paint
    }

    fn largest_contentful_paint(&self) -> Option<f64> {
        self.signals.read().largest_contentful_paint
    }

    fn time_to_interactive(&self) -> Option<f64> {
        let nav = self.signals.read().navigation?;
        nav.load_event_end.map(|_| nav.dom_interactive)
    }

    fn reset(&self) {
        *self.signals.write() = Signals::default();
    }
}

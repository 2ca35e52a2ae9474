//! Hydration registry: per-page storage of island timings.

use std::collections::BTreeMap;
use std::sync::Arc;

use islandwatch_types::{sort_by_start, HydrationEvent};
use parking_lot::RwLock;
use tracing::warn;

use crate::handle::HydrationGuard;
use crate::timing::Clock;

#[derive(Debug, Default)]
struct RegistryState {
    /// Provisional start times of islands that have not finished yet.
    pending: BTreeMap<String, f64>,
    /// Finalized events, one per component name.
    events: BTreeMap<String, HydrationEvent>,
}

/// Store of island hydration timings for one page view.
///
/// Constructing a registry is its initialization; [`clear`](Self::clear)
/// tears it down on navigation. Nothing here ever panics or returns an
/// error to the caller: protocol misuse is logged as a warning and the
/// registry stays consistent.
///
/// A component that hydrates again under the same name replaces its
/// previous event (last write wins), so the registry never grows past one
/// entry per island.
#[derive(Debug)]
pub struct HydrationRegistry {
    clock: Arc<dyn Clock>,
    state: RwLock<RegistryState>,
}

impl HydrationRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Record the current time as the provisional start of `name`.
    ///
    /// Calling this again before [`mark_end`](Self::mark_end) replaces the
    /// earlier start.
    pub fn mark_start(&self, name: &str) {
        if name.is_empty() {
            warn!("hydration start ignored: empty component name");
            return;
        }

        let now = self.clock.now();
        let previous = self.state.write().pending.insert(name.to_string(), now);
        if let Some(previous) = previous {
            warn!(component = name, previous, now, "hydration start restarted before it ended");
        }
    }

    /// Finalize the hydration of `name` at the current time.
    ///
    /// Returns the stored event, or `None` when there was no matching start.
    pub fn mark_end(&self, name: &str) -> Option<HydrationEvent> {
        if name.is_empty() {
            warn!("hydration end ignored: empty component name");
            return None;
        }

        let now = self.clock.now();
        let mut state = self.state.write();

        let Some(start) = state.pending.remove(name) else {
            warn!(component = name, "hydration end without a matching start");
            return None;
        };

        let Some(event) = HydrationEvent::new(name, start, now) else {
            warn!(component = name, start, end = now, "hydration ended before it started");
            return None;
        };

        state.events.insert(name.to_string(), event.clone());
        Some(event)
    }

    /// Start hydrating `name` and return a guard that ends it when dropped.
    pub fn begin(self: &Arc<Self>, name: &str) -> HydrationGuard {
        self.mark_start(name);
        HydrationGuard::new(self.clone(), name)
    }

    /// Finalized events ordered by start time, ties broken by name.
    pub fn list(&self) -> Vec<HydrationEvent> {
        let mut events: Vec<HydrationEvent> = self.state.read().events.values().cloned().collect();
        sort_by_start(&mut events);
        events
    }

    /// Look up the finalized event for one island.
    pub fn get(&self, name: &str) -> Option<HydrationEvent> {
        self.state.read().events.get(name).cloned()
    }

    /// Drop all finalized and provisional state.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.pending.clear();
        state.events.clear();
    }

    /// Number of finalized events.
    pub fn len(&self) -> usize {
        self.state.read().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().events.is_empty()
    }

    /// Number of islands that started but have not ended.
    pub fn pending_count(&self) -> usize {
        self.state.read().pending.len()
    }

    /// Current reading of the registry's clock.
    pub fn now(&self) -> f64 {
        self.clock.now()
    }
}

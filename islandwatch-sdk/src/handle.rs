//! Island handle for recording hydration timings.

use std::sync::Arc;

use islandwatch_types::HydrationEvent;

use crate::registry::HydrationRegistry;

/// A handle for recording the hydration of one island.
///
/// This is the instrumentation contract with UI fragments: call
/// `mark_start()` before setup work and `mark_end()` once interactive.
/// Obtain a handle by calling `Monitor::island()`.
///
/// # Example
///
/// ```rust
/// use islandwatch_sdk::Monitor;
///
/// let monitor = Monitor::new("home");
/// let island = monitor.island("task-list");
///
/// island.mark_start();
/// // ... attach event handlers, fetch initial state ...
/// island.mark_end();
///
/// // Or let a guard end the hydration when setup returns
/// {
///     let _guard = monitor.island("search-box").begin();
///     // ... setup ...
/// }
///
/// assert_eq!(monitor.registry().len(), 2);
/// ```
#[derive(Clone)]
pub struct IslandHandle {
    pub(crate) registry: Arc<HydrationRegistry>,
    pub(crate) name: String,
}

impl IslandHandle {
    /// Announce that this island started hydrating.
    pub fn mark_start(&self) {
        self.registry.mark_start(&self.name);
    }

    /// Announce that this island is interactive.
    ///
    /// Returns the finalized event, or `None` if there was no matching start.
    pub fn mark_end(&self) -> Option<HydrationEvent> {
        self.registry.mark_end(&self.name)
    }

    /// Start hydrating and return a guard that ends it when dropped.
    pub fn begin(&self) -> HydrationGuard {
        self.registry.begin(&self.name)
    }

    /// The most recent finalized event for this island.
    pub fn last_event(&self) -> Option<HydrationEvent> {
        self.registry.get(&self.name)
    }

    /// Get the island name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for IslandHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IslandHandle")
            .field("name", &self.name)
            .finish()
    }
}

/// Guard that finalizes a hydration when dropped.
///
/// This implements RAII-style tracking of a hydration in progress.
pub struct HydrationGuard {
    registry: Arc<HydrationRegistry>,
    name: Option<String>,
}

impl HydrationGuard {
    pub(crate) fn new(registry: Arc<HydrationRegistry>, name: &str) -> Self {
        Self {
            registry,
            name: Some(name.to_string()),
        }
    }

    /// End the hydration now and return the finalized event.
    pub fn finish(mut self) -> Option<HydrationEvent> {
        let name = self.name.take()?;
        self.registry.mark_end(&name)
    }
}

impl std::fmt::Debug for HydrationGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HydrationGuard")
            .field("name", &self.name)
            .finish()
    }
}

impl Drop for HydrationGuard {
    fn drop(&mut self) {
        if let Some(name) = self.name.take() {
            self.registry.mark_end(&name);
        }
    }
}

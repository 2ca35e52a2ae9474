//! Hydration events - the timing record of one island becoming interactive.

use std::cmp::Ordering;

/// A finalized hydration timing for one island.
///
/// Timestamps are milliseconds since navigation start, as reported by the
/// monotonic clock of the page being measured. The duration is derived once
/// at construction and is never negative.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[cfg_attr(feature = "minicbor", derive(minicbor::Encode, minicbor::Decode))]
pub struct HydrationEvent {
    /// Identifier of the island, unique per page.
    #[cfg_attr(feature = "minicbor", n(0))]
    pub component_name: String,

    /// When the island announced the start of hydration.
    #[cfg_attr(feature = "minicbor", n(1))]
    pub start_time: f64,

    /// When the island announced it was interactive.
    #[cfg_attr(feature = "minicbor", n(2))]
    pub end_time: f64,

    /// `end_time - start_time`.
    #[cfg_attr(feature = "minicbor", n(3))]
    pub duration_ms: f64,
}

impl HydrationEvent {
    /// Finalize an event from a start/end pair.
    ///
    /// Returns `None` when the name is empty, either timestamp is not finite,
    /// or the end precedes the start. No event is ever fabricated from a
    /// span that does not make sense.
    pub fn new(component_name: impl Into<String>, start_time: f64, end_time: f64) -> Option<Self> {
        let component_name = component_name.into();
        if component_name.is_empty() || !start_time.is_finite() || !end_time.is_finite() {
            return None;
        }
        if end_time < start_time {
            return None;
        }

        Some(Self {
            component_name,
            start_time,
            end_time,
            duration_ms: end_time - start_time,
        })
    }

    /// Total order used for snapshot output: start time, then name.
    pub fn cmp_by_start(&self, other: &Self) -> Ordering {
        self.start_time
            .total_cmp(&other.start_time)
            .then_with(|| self.component_name.cmp(&other.component_name))
    }
}

/// Sort events by start time ascending, ties broken by component name.
pub fn sort_by_start(events: &mut [HydrationEvent]) {
    events.sort_by(HydrationEvent::cmp_by_start);
}

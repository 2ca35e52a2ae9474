//! Threshold table and three-state quality classification.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::metric;

/// Quality label for a single metric value.
///
/// Ordered so that `max()` over a set of ratings yields the worst one;
/// `Unknown` sorts lowest because "no opinion" never makes a page look worse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Rating {
    /// No threshold is configured for the metric, or there is no value.
    Unknown,
    Good,
    NeedsImprovement,
    Poor,
}

impl Rating {
    /// The label used in exports (`"needs-improvement"` etc).
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Unknown => "unknown",
            Rating::Good => "good",
            Rating::NeedsImprovement => "needs-improvement",
            Rating::Poor => "poor",
        }
    }

    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            Rating::Unknown => "--",
            Rating::Good => "OK",
            Rating::NeedsImprovement => "WARN",
            Rating::Poor => "POOR",
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while building a threshold table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    /// The "good" bound must be strictly below the "needs improvement" bound.
    #[error("threshold for {metric}: good ({good}) must be below needs-improvement ({needs_improvement})")]
    Inverted {
        metric: String,
        good: f64,
        needs_improvement: f64,
    },

    /// Bounds must be finite numbers.
    #[error("threshold for {metric} is not a finite number")]
    NotFinite { metric: String },

    #[error("metric name must not be empty")]
    EmptyMetric,
}

/// Upper bounds for the two better buckets of a lower-is-better metric.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Thresholds {
    /// Values at or below this are good.
    pub good: f64,
    /// Values above `good` and at or below this need improvement.
    pub needs_improvement: f64,
}

impl Thresholds {
    pub const fn new(good: f64, needs_improvement: f64) -> Self {
        Self {
            good,
            needs_improvement,
        }
    }

    fn validate(&self, metric: &str) -> Result<(), ThresholdError> {
        if metric.is_empty() {
            return Err(ThresholdError::EmptyMetric);
        }
        if !self.good.is_finite() || !self.needs_improvement.is_finite() {
            return Err(ThresholdError::NotFinite {
                metric: metric.to_string(),
            });
        }
        if self.good >= self.needs_improvement {
            return Err(ThresholdError::Inverted {
                metric: metric.to_string(),
                good: self.good,
                needs_improvement: self.needs_improvement,
            });
        }
        Ok(())
    }

    /// Rate a value. Boundaries belong to the better bucket.
    pub fn rate(&self, value: f64) -> Rating {
        if value.is_nan() {
            Rating::Unknown
        } else if value <= self.good {
            Rating::Good
        } else if value <= self.needs_improvement {
            Rating::NeedsImprovement
        } else {
            Rating::Poor
        }
    }
}

/// Fixed mapping from metric name to thresholds.
///
/// Treated as a deployment-time constant: build it once at startup, then
/// only read from it. Every entry satisfies `good < needs_improvement`.
///
/// # Example
///
/// ```rust
/// use islandwatch_types::{Rating, ThresholdTable, Thresholds};
///
/// let table = ThresholdTable::new()
///     .with("firstContentfulPaint", Thresholds::new(1500.0, 2500.0))
///     .unwrap();
///
/// assert_eq!(table.classify("firstContentfulPaint", 1500.0), Rating::Good);
/// assert_eq!(table.classify("firstContentfulPaint", 2500.01), Rating::Poor);
/// assert_eq!(table.classify("somethingElse", 1.0), Rating::Unknown);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "BTreeMap<String, Thresholds>", into = "BTreeMap<String, Thresholds>")
)]
pub struct ThresholdTable {
    entries: BTreeMap<String, Thresholds>,
}

impl ThresholdTable {
    /// Create an empty table. Every metric classifies as `Unknown`.
    pub fn new() -> Self {
        Self::default()
    }

    /// The default table, in milliseconds for timings and bytes for size.
    ///
    /// | metric                   | good    | needs improvement |
    /// |--------------------------|---------|-------------------|
    /// | `firstContentfulPaint`   | 1800    | 3000              |
    /// | `largestContentfulPaint` | 2500    | 4000              |
    /// | `timeToInteractive`      | 3800    | 7300              |
    /// | `islandHydration`        | 100     | 300               |
    /// | `bundleSizeBytes`        | 170000  | 350000            |
    pub fn web_vitals() -> Self {
        let entries = [
            (metric::FIRST_CONTENTFUL_PAINT, Thresholds::new(1800.0, 3000.0)),
            (metric::LARGEST_CONTENTFUL_PAINT, Thresholds::new(2500.0, 4000.0)),
            (metric::TIME_TO_INTERACTIVE, Thresholds::new(3800.0, 7300.0)),
            (metric::ISLAND_HYDRATION, Thresholds::new(100.0, 300.0)),
            (metric::BUNDLE_SIZE_BYTES, Thresholds::new(170_000.0, 350_000.0)),
        ];

        Self {
            entries: entries
                .into_iter()
                .map(|(name, t)| (name.to_string(), t))
                .collect(),
        }
    }

    /// Add or replace an entry, validating it.
    pub fn insert(&mut self, metric: impl Into<String>, thresholds: Thresholds) -> Result<(), ThresholdError> {
        let metric = metric.into();
        thresholds.validate(&metric)?;
        self.entries.insert(metric, thresholds);
        Ok(())
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with(mut self, metric: impl Into<String>, thresholds: Thresholds) -> Result<Self, ThresholdError> {
        self.insert(metric, thresholds)?;
        Ok(self)
    }

    pub fn get(&self, metric: &str) -> Option<&Thresholds> {
        self.entries.get(metric)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Thresholds)> {
        self.entries.iter()
    }

    /// Classify a value for a metric.
    ///
    /// Returns `Unknown` when the metric has no entry; an unconfigured metric
    /// is never reported as good.
    pub fn classify(&self, metric: &str, value: f64) -> Rating {
        self.entries
            .get(metric)
            .map_or(Rating::Unknown, |t| t.rate(value))
    }

    /// Classify a value that may not be available yet.
    pub fn classify_optional(&self, metric: &str, value: Option<f64>) -> Rating {
        value.map_or(Rating::Unknown, |v| self.classify(metric, v))
    }
}

impl TryFrom<BTreeMap<String, Thresholds>> for ThresholdTable {
    type Error = ThresholdError;

    fn try_from(entries: BTreeMap<String, Thresholds>) -> Result<Self, Self::Error> {
        let mut table = Self::new();
        for (metric, thresholds) in entries {
            table.insert(metric, thresholds)?;
        }
        Ok(table)
    }
}

impl From<ThresholdTable> for BTreeMap<String, Thresholds> {
    fn from(table: ThresholdTable) -> Self {
        table.entries
    }
}

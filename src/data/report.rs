//! Page report parsing and rating computation.
//!
//! This module turns a portable-format snapshot into a report where every
//! page metric and every island duration carries a [`Rating`] from the
//! threshold table.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use islandwatch_sdk::from_portable_format;
use islandwatch_types::{metric, MetricSnapshot, Rating, ThresholdTable};
use serde_json::json;

/// A rated page-level metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub name: &'static str,
    pub value: Option<f64>,
    pub rating: Rating,
}

/// A rated island hydration.
#[derive(Debug, Clone, PartialEq)]
pub struct IslandRow {
    pub name: String,
    pub start_time: f64,
    pub duration_ms: f64,
    pub rating: Rating,
}

/// Number of ratings of each kind in a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingCounts {
    pub good: usize,
    pub needs_improvement: usize,
    pub poor: usize,
    pub unknown: usize,
}

impl RatingCounts {
    fn add(&mut self, rating: Rating) {
        match rating {
            Rating::Good => self.good += 1,
            Rating::NeedsImprovement => self.needs_improvement += 1,
            Rating::Poor => self.poor += 1,
            Rating::Unknown => self.unknown += 1,
        }
    }
}

/// Complete rated report for one snapshot, ready for display or export.
#[derive(Debug, Clone)]
pub struct PageReport {
    pub page_name: String,
    pub timestamp: f64,
    pub metrics: Vec<MetricRow>,
    pub islands: Vec<IslandRow>,
    pub total_hydration_ms: f64,
    /// Worst rating across metrics and islands. `Unknown` only when
    /// nothing could be rated.
    pub health: Rating,
}

impl PageReport {
    /// Load and rate a snapshot from a portable-format file.
    pub fn load(path: &Path, thresholds: &ThresholdTable) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&content, thresholds)
    }

    /// Parse and rate a snapshot from a portable-format string.
    pub fn parse(content: &str, thresholds: &ThresholdTable) -> Result<Self> {
        let snapshot = from_portable_format(content)?;
        Ok(Self::from_snapshot(&snapshot, thresholds))
    }

    /// Rate a snapshot.
    ///
    /// This is the primary conversion method used by all data sources.
    pub fn from_snapshot(snapshot: &MetricSnapshot, thresholds: &ThresholdTable) -> Self {
        let values = [
            (metric::FIRST_CONTENTFUL_PAINT, snapshot.first_contentful_paint),
            (metric::LARGEST_CONTENTFUL_PAINT, snapshot.largest_contentful_paint),
            (metric::TIME_TO_INTERACTIVE, snapshot.time_to_interactive),
            (metric::BUNDLE_SIZE_BYTES, snapshot.bundle_size_bytes.map(|b| b as f64)),
        ];

        let metrics: Vec<MetricRow> = values
            .into_iter()
            .map(|(name, value)| MetricRow {
                name,
                value,
                rating: thresholds.classify_optional(name, value),
            })
            .collect();

        let mut islands: Vec<IslandRow> = snapshot
            .island_hydrations
            .iter()
            .map(|event| IslandRow {
                name: event.component_name.clone(),
                start_time: event.start_time,
                duration_ms: event.duration_ms,
                rating: thresholds.classify(metric::ISLAND_HYDRATION, event.duration_ms),
            })
            .collect();

        // Worst first, then in hydration order
        islands.sort_by(|a, b| {
            b.rating
                .cmp(&a.rating)
                .then_with(|| a.start_time.total_cmp(&b.start_time))
                .then_with(|| a.name.cmp(&b.name))
        });

        let health = metrics
            .iter()
            .map(|m| m.rating)
            .chain(islands.iter().map(|i| i.rating))
            .max()
            .unwrap_or(Rating::Unknown);

        Self {
            page_name: snapshot.page_name.clone(),
            timestamp: snapshot.timestamp,
            metrics,
            islands,
            total_hydration_ms: snapshot.total_hydration_ms(),
            health,
        }
    }

    /// Islands rated worse than good.
    pub fn slow_islands(&self) -> Vec<&IslandRow> {
        self.islands
            .iter()
            .filter(|i| i.rating > Rating::Good)
            .collect()
    }

    /// Count ratings across metrics and islands.
    pub fn counts(&self) -> RatingCounts {
        let mut counts = RatingCounts::default();
        for rating in self
            .metrics
            .iter()
            .map(|m| m.rating)
            .chain(self.islands.iter().map(|i| i.rating))
        {
            counts.add(rating);
        }
        counts
    }

    /// Build the JSON document written by `--export`.
    pub fn to_export_json(&self) -> serde_json::Value {
        let counts = self.counts();

        json!({
            "pageName": self.page_name,
            "timestamp": self.timestamp,
            "health": self.health.as_str(),
            "summary": {
                "metrics": self.metrics.len(),
                "islands": self.islands.len(),
                "good": counts.good,
                "needsImprovement": counts.needs_improvement,
                "poor": counts.poor,
                "unknown": counts.unknown,
                "totalHydrationMs": self.total_hydration_ms,
            },
            "metrics": self.metrics.iter().map(|m| json!({
                "name": m.name,
                "value": m.value,
                "rating": m.rating.as_str(),
            })).collect::<Vec<_>>(),
            "islands": self.islands.iter().map(|i| json!({
                "componentName": i.name,
                "startTime": i.start_time,
                "durationMs": i.duration_ms,
                "rating": i.rating.as_str(),
            })).collect::<Vec<_>>(),
            "slowIslands": self.slow_islands().iter().map(|i| i.name.as_str()).collect::<Vec<_>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MetricSnapshot {
        MetricSnapshot::builder("home")
            .timestamp(1203.5)
            .first_contentful_paint(640.0)
            .largest_contentful_paint(2600.0)
            .bundle_size_bytes(184_320)
            .island("search-box", 120.0, 150.0)
            .island("task-list", 45.0, 90.0)
            .island("stats-chart", 300.0, 740.0)
            .build()
    }

    fn rating_of(report: &PageReport, name: &str) -> Rating {
        report.metrics.iter().find(|m| m.name == name).unwrap().rating
    }

    #[test]
    fn rates_page_metrics() {
        let report = PageReport::from_snapshot(&sample(), &ThresholdTable::web_vitals());

        assert_eq!(rating_of(&report, metric::FIRST_CONTENTFUL_PAINT), Rating::Good);
        assert_eq!(
            rating_of(&report, metric::LARGEST_CONTENTFUL_PAINT),
            Rating::NeedsImprovement
        );
        assert_eq!(rating_of(&report, metric::TIME_TO_INTERACTIVE), Rating::Unknown);
        assert_eq!(
            rating_of(&report, metric::BUNDLE_SIZE_BYTES),
            Rating::NeedsImprovement
        );
    }

    #[test]
    fn islands_sorted_worst_first() {
        let report = PageReport::from_snapshot(&sample(), &ThresholdTable::web_vitals());

        let names: Vec<&str> = report.islands.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["stats-chart", "task-list", "search-box"]);
        assert_eq!(report.islands[0].rating, Rating::Poor);
        assert_eq!(report.slow_islands().len(), 1);
    }

    #[test]
    fn health_is_worst_rating() {
        let report = PageReport::from_snapshot(&sample(), &ThresholdTable::web_vitals());
        assert_eq!(report.health, Rating::Poor);
    }

    #[test]
    fn unknown_does_not_worsen_health() {
        let snapshot = MetricSnapshot::builder("home")
            .first_contentful_paint(640.0)
            .build();
        let report = PageReport::from_snapshot(&snapshot, &ThresholdTable::web_vitals());

        assert_eq!(report.counts().unknown, 3);
        assert_eq!(report.health, Rating::Good);
    }

    #[test]
    fn empty_table_rates_everything_unknown() {
        let report = PageReport::from_snapshot(&sample(), &ThresholdTable::new());
        assert_eq!(report.health, Rating::Unknown);
        assert!(report.slow_islands().is_empty());
    }

    #[test]
    fn counts_cover_metrics_and_islands() {
        let report = PageReport::from_snapshot(&sample(), &ThresholdTable::web_vitals());
        assert_eq!(
            report.counts(),
            RatingCounts {
                good: 3,
                needs_improvement: 2,
                poor: 1,
                unknown: 1,
            }
        );
    }

    #[test]
    fn export_json_shape() {
        let report = PageReport::from_snapshot(&sample(), &ThresholdTable::web_vitals());
        let export = report.to_export_json();

        assert_eq!(export["pageName"], "home");
        assert_eq!(export["health"], "poor");
        assert_eq!(export["summary"]["islands"], 3);
        assert_eq!(export["summary"]["totalHydrationMs"], 515.0);
        assert_eq!(export["metrics"][2]["value"], serde_json::Value::Null);
        assert_eq!(export["metrics"][2]["rating"], "unknown");
        assert_eq!(export["slowIslands"][0], "stats-chart");
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        std::fs::write(&path, islandwatch_sdk::to_portable_format(&sample()).unwrap()).unwrap();

        let report = PageReport::load(&path, &ThresholdTable::web_vitals()).unwrap();
        assert_eq!(report.page_name, "home");
        assert_eq!(report.islands.len(), 3);
    }

    #[test]
    fn load_missing_file_has_context() {
        let err = PageReport::load(Path::new("/nonexistent/metrics.json"), &ThresholdTable::new())
            .unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}

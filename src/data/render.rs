//! Plain-text rendering of a page report.

use std::fmt::Write;

use islandwatch_types::metric;

use super::report::PageReport;

/// Format a metric value with its unit; `-` when the signal never fired.
pub fn format_value(name: &str, value: Option<f64>) -> String {
    match value {
        None => "-".to_string(),
        Some(v) if name == metric::BUNDLE_SIZE_BYTES => format_bytes(v),
        Some(v) => format!("{:.1} ms", v),
    }
}

fn format_bytes(bytes: f64) -> String {
    if bytes >= 1024.0 * 1024.0 {
        format!("{:.1} MiB", bytes / (1024.0 * 1024.0))
    } else if bytes >= 1024.0 {
        format!("{:.1} KiB", bytes / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

/// Render the report as an aligned text table.
pub fn render_text(report: &PageReport) -> String {
    let mut out = String::new();
    let counts = report.counts();

    let _ = writeln!(
        out,
        "{} @ {:.1} ms  [{}] {}",
        report.page_name,
        report.timestamp,
        report.health.symbol(),
        report.health
    );
    let _ = writeln!(
        out,
        "  {} good, {} needs improvement, {} poor, {} unrated",
        counts.good, counts.needs_improvement, counts.poor, counts.unknown
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "{:<24} {:>12}  {}", "METRIC", "VALUE", "RATING");
    for row in &report.metrics {
        let _ = writeln!(
            out,
            "{:<24} {:>12}  {}",
            row.name,
            format_value(row.name, row.value),
            row.rating.symbol()
        );
    }

    let _ = writeln!(out);
    if report.islands.is_empty() {
        let _ = writeln!(out, "no islands hydrated");
        return out;
    }

    let _ = writeln!(
        out,
        "{:<24} {:>12} {:>12}  {}",
        "ISLAND", "START", "DURATION", "RATING"
    );
    for island in &report.islands {
        let _ = writeln!(
            out,
            "{:<24} {:>12} {:>12}  {}",
            island.name,
            format!("{:.1} ms", island.start_time),
            format!("{:.1} ms", island.duration_ms),
            island.rating.symbol()
        );
    }
    let _ = writeln!(
        out,
        "{:<24} {:>12} {:>12}",
        "total",
        "",
        format!("{:.1} ms", report.total_hydration_ms)
    );

    out
}

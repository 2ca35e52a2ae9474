//! Threshold configuration.
//!
//! Thresholds start from [`ThresholdTable::web_vitals`] and are overridden,
//! in order, by an optional config file and by `ISLANDWATCH_*` environment
//! variables. Any format the `config` crate understands works for the file:
//!
//! ```toml
//! [thresholds.largest_contentful_paint]
//! good = 2000
//! needs_improvement = 3500
//!
//! [thresholds.island_hydration]
//! good = 50
//! ```
//!
//! The same override from the environment:
//!
//! ```bash
//! ISLANDWATCH_THRESHOLDS__LARGEST_CONTENTFUL_PAINT__GOOD=2000
//! ```
//!
//! Keys are snake_case; metrics outside the built-in set keep their key as
//! the metric name and must give both bounds.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use config::{Config, Environment, File};
use islandwatch_types::{metric, ThresholdTable, Thresholds};
use serde::Deserialize;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "ISLANDWATCH";

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    thresholds: BTreeMap<String, ThresholdOverride>,
}

#[derive(Debug, Default, Deserialize)]
struct ThresholdOverride {
    good: Option<f64>,
    needs_improvement: Option<f64>,
}

/// Map a snake_case config key to its metric name.
pub fn metric_name(key: &str) -> &str {
    match key {
        "first_contentful_paint" | "fcp" => metric::FIRST_CONTENTFUL_PAINT,
        "largest_contentful_paint" | "lcp" => metric::LARGEST_CONTENTFUL_PAINT,
        "time_to_interactive" | "tti" => metric::TIME_TO_INTERACTIVE,
        "island_hydration" => metric::ISLAND_HYDRATION,
        "bundle_size_bytes" | "bundle_size" => metric::BUNDLE_SIZE_BYTES,
        other => other,
    }
}

/// Load thresholds from defaults, an optional file and the environment.
pub fn load_thresholds(path: Option<&Path>) -> Result<ThresholdTable> {
    let config = build_config(path, Environment::with_prefix(ENV_PREFIX))?;
    thresholds_from_config(&config)
}

fn build_config(path: Option<&Path>, env: Environment) -> Result<Config> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path));
    }
    builder
        .add_source(env.prefix_separator("_").separator("__").try_parsing(true))
        .build()
        .context("failed to load configuration")
}

/// Apply the `thresholds` section of a loaded config to the default table.
pub fn thresholds_from_config(config: &Config) -> Result<ThresholdTable> {
    let file: ConfigFile = config
        .clone()
        .try_deserialize()
        .context("invalid threshold configuration")?;

    let mut table = ThresholdTable::web_vitals();
    for (key, update) in file.thresholds {
        let name = metric_name(&key);
        let base = table.get(name).copied();

        let good = update
            .good
            .or(base.map(|t| t.good))
            .ok_or_else(|| anyhow!("threshold for {} is missing `good`", key))?;
        let needs_improvement = update
            .needs_improvement
            .or(base.map(|t| t.needs_improvement))
            .ok_or_else(|| anyhow!("threshold for {} is missing `needs_improvement`", key))?;

        table.insert(name, Thresholds::new(good, needs_improvement))?;
        tracing::debug!(metric = name, good, needs_improvement, "threshold override");
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_toml(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    fn isolated_env(prefix: &str) -> Environment {
        Environment::with_prefix(prefix)
    }

    #[test]
    fn defaults_without_file() {
        let config = build_config(None, isolated_env("ISLANDWATCH_TEST_NONE")).unwrap();
        let table = thresholds_from_config(&config).unwrap();

        assert_eq!(table.len(), 5);
        assert_eq!(
            table.get(metric::LARGEST_CONTENTFUL_PAINT),
            Some(&Thresholds::new(2500.0, 4000.0))
        );
    }

    #[test]
    fn file_overrides_defaults() {
        let file = write_toml(
            r#"
            [thresholds.largest_contentful_paint]
            good = 2000
            needs_improvement = 3500

            [thresholds.island_hydration]
            good = 50
            "#,
        );

        let config = build_config(Some(file.path()), isolated_env("ISLANDWATCH_TEST_FILE")).unwrap();
        let table = thresholds_from_config(&config).unwrap();

        assert_eq!(
            table.get(metric::LARGEST_CONTENTFUL_PAINT),
            Some(&Thresholds::new(2000.0, 3500.0))
        );
        // Partial override keeps the default upper bound
        assert_eq!(
            table.get(metric::ISLAND_HYDRATION),
            Some(&Thresholds::new(50.0, 300.0))
        );
    }

    #[test]
    fn environment_overrides_file() {
        let file = write_toml(
            r#"
            [thresholds.first_contentful_paint]
            good = 1000
            needs_improvement = 2000
            "#,
        );
        std::env::set_var("ISLANDWATCH_TEST_ENV_THRESHOLDS__FIRST_CONTENTFUL_PAINT__GOOD", "1500");

        let config = build_config(Some(file.path()), isolated_env("ISLANDWATCH_TEST_ENV")).unwrap();
        let table = thresholds_from_config(&config).unwrap();

        assert_eq!(
            table.get(metric::FIRST_CONTENTFUL_PAINT),
            Some(&Thresholds::new(1500.0, 2000.0))
        );
    }

    #[test]
    fn environment_alone_overrides_defaults() {
        std::env::set_var("ISLANDWATCH_TEST_ONLY_THRESHOLDS__LARGEST_CONTENTFUL_PAINT__GOOD", "2000");

        let config = build_config(None, isolated_env("ISLANDWATCH_TEST_ONLY")).unwrap();
        let table = thresholds_from_config(&config).unwrap();

        assert_eq!(
            table.get(metric::LARGEST_CONTENTFUL_PAINT),
            Some(&Thresholds::new(2000.0, 4000.0))
        );
    }

    #[test]
    fn custom_metric_needs_both_bounds() {
        let file = write_toml(
            r#"
            [thresholds.font_swap]
            good = 10
            "#,
        );

        let config = build_config(Some(file.path()), isolated_env("ISLANDWATCH_TEST_CUSTOM")).unwrap();
        let err = thresholds_from_config(&config).unwrap_err();
        assert!(err.to_string().contains("needs_improvement"));
    }

    #[test]
    fn custom_metric_keeps_its_key() {
        let file = write_toml(
            r#"
            [thresholds.font_swap]
            good = 10
            needs_improvement = 20
            "#,
        );

        let config = build_config(Some(file.path()), isolated_env("ISLANDWATCH_TEST_KEY")).unwrap();
        let table = thresholds_from_config(&config).unwrap();
        assert_eq!(table.get("font_swap"), Some(&Thresholds::new(10.0, 20.0)));
    }

    #[test]
    fn inverted_override_is_rejected() {
        let file = write_toml(
            r#"
            [thresholds.lcp]
            good = 5000
            "#,
        );

        let config = build_config(Some(file.path()), isolated_env("ISLANDWATCH_TEST_INVERTED")).unwrap();
        let err = thresholds_from_config(&config).unwrap_err();
        assert!(err.to_string().contains("must be below"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = build_config(
            Some(Path::new("/nonexistent/islandwatch.toml")),
            isolated_env("ISLANDWATCH_TEST_MISSING"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn metric_name_aliases() {
        assert_eq!(metric_name("lcp"), metric::LARGEST_CONTENTFUL_PAINT);
        assert_eq!(metric_name("bundle_size_bytes"), metric::BUNDLE_SIZE_BYTES);
        assert_eq!(metric_name("islandHydration"), "islandHydration");
    }
}

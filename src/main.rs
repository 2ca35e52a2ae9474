use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use islandwatch::{
    load_thresholds, render_text, DataSource, FileSource, MetricSnapshot, PageReport,
    StreamSource, ThresholdTable,
};

#[derive(Parser, Debug)]
#[command(name = "islandwatch")]
#[command(about = "Rate island hydration and page-load metrics against thresholds")]
struct Args {
    /// Path to a portable-format snapshot file
    #[arg(short, long, default_value = "metrics.json", conflicts_with = "connect")]
    file: PathBuf,

    /// Connect to a TCP endpoint for live snapshots (host:port)
    #[arg(short, long, conflicts_with_all = ["file", "export"])]
    connect: Option<String>,

    /// Keep polling the file and print a report whenever it changes
    #[arg(short, long, conflicts_with = "export")]
    watch: bool,

    /// Refresh interval in seconds (only used with --watch)
    #[arg(short, long, default_value = "1")]
    refresh: u64,

    /// Threshold config file (TOML, JSON or YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Export the rated report to a JSON file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let thresholds = load_thresholds(args.config.as_deref())?;

    // Handle export mode (non-interactive)
    if let Some(export_path) = args.export {
        return export_to_file(&args.file, &export_path, &thresholds);
    }

    // Handle TCP connection mode
    if let Some(ref addr) = args.connect {
        return run_with_tcp(addr, &thresholds).await;
    }

    if args.watch {
        let mut source = FileSource::new(&args.file);
        let refresh = Duration::from_secs(args.refresh.max(1));
        return follow(&mut source, &thresholds, refresh).await;
    }

    // Default: report once
    let report = PageReport::load(&args.file, &thresholds)?;
    print!("{}", render_text(&report));
    Ok(())
}

/// Run with a TCP stream data source
async fn run_with_tcp(addr: &str, thresholds: &ThresholdTable) -> Result<()> {
    use tokio::net::TcpStream;

    eprintln!("Connecting to {}...", addr);
    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("failed to connect to {}", addr))?;
    eprintln!("Connected!");

    let mut source = StreamSource::spawn(stream, addr);
    // For TCP, poll continuously; snapshots arrive as the monitor emits them
    follow(&mut source, thresholds, Duration::from_millis(100)).await
}

/// Print a report for every new snapshot until the source ends or Ctrl-C.
async fn follow(
    source: &mut dyn DataSource,
    thresholds: &ThresholdTable,
    interval: Duration,
) -> Result<()> {
    let mut last: Option<MetricSnapshot> = None;
    let mut last_error: Option<String> = None;

    loop {
        if let Some(snapshot) = source.poll() {
            let changed = last.as_ref().map_or(true, |prev| !prev.same_metrics(&snapshot));
            if changed {
                let report = PageReport::from_snapshot(&snapshot, thresholds);
                println!("── {} ──", source.description());
                print!("{}", render_text(&report));
                println!();
            }
            last = Some(snapshot);
        }

        let error = source.error();
        if error.is_some() && error != last_error {
            tracing::warn!(source = source.description(), error = ?error, "source error");
        }
        last_error = error;

        if source.is_finished() {
            return Ok(());
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

/// Export the rated report for a snapshot file to a JSON file
fn export_to_file(
    snapshot_path: &Path,
    export_path: &Path,
    thresholds: &ThresholdTable,
) -> Result<()> {
    let report = PageReport::load(snapshot_path, thresholds)?;

    let json = serde_json::to_string_pretty(&report.to_export_json())?;
    let mut file = std::fs::File::create(export_path)
        .with_context(|| format!("failed to create {}", export_path.display()))?;
    file.write_all(json.as_bytes())?;

    println!("Exported report to: {}", export_path.display());
    Ok(())
}

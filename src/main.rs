use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use tracing::Level;

use roadwatch::{Config, Frame, Monitoring, TrafficMeter};

/// Replays recorded detections through the tracker, line counter and
/// anomaly detector.
#[derive(Parser)]
#[clap(name = "roadwatch")]
struct Args {
    /// JSON lines file, one frame object per line
    input: PathBuf,
    /// JSON settings file, defaults are used when omitted
    #[clap(short, long)]
    config: Option<PathBuf>,
    #[clap(long, default_value = "default")]
    source: String,
    /// Only print the final statistics
    #[clap(long)]
    summary: bool,
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    let mut meter = TrafficMeter::new(config)?;

    let file = File::open(&args.input)
        .with_context(|| format!("opening detections {}", args.input.display()))?;
    let reader = BufReader::new(file);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut frames = 0u64;

    for (lineno, line) in reader.lines().enumerate() {
        let line = line.context("reading detections")?;
        if line.trim().is_empty() {
            continue;
        }

        let frame: Frame = match serde_json::from_str(&line) {
            Ok(f) => f,
            Err(err) => {
                tracing::warn!("line {}: wrong frame format: {}", lineno + 1, err);
                continue;
            }
        };
        frames += 1;

        for report in meter.update(vec![frame], &args.source) {
            if !args.summary && !report.is_quiet() {
                serde_json::to_writer(&mut out, &report)?;
                writeln!(out)?;
            }
        }
    }

    tracing::info!("processed {} frames", frames);

    if let Some(scene) = meter.scene(&args.source) {
        let summary = serde_json::json!({
            "statistics": scene.statistics(),
            "active_stops": scene.active_stops(),
        });
        serde_json::to_writer_pretty(&mut out, &summary)?;
        writeln!(out)?;
    }

    Ok(())
}

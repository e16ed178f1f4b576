//! leap_hands — interactive entry point.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use hand_sessions::TrackingConfig;
use leap_hands::app::{run, AppConfig, SourceKind};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "leap_hands", about = "LeapMotion hand session viewer")]
struct Cli {
    /// TOML tracking configuration (defaults apply to missing keys)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Thumb-index distance (m) below which a pinch starts
    #[arg(long)]
    start_pinch: Option<f32>,

    /// Thumb-index distance (m) above which a pinch ends
    #[arg(long)]
    stop_pinch: Option<f32>,

    /// Use a real LeapMotion controller instead of the keyboard simulation
    #[cfg(feature = "leap")]
    #[arg(long)]
    leap: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut tracking = match &cli.config {
        Some(path) => TrackingConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => TrackingConfig::default(),
    };
    if let Some(d) = cli.start_pinch {
        tracking = tracking.with_start_pinch_distance(d);
    }
    if let Some(d) = cli.stop_pinch {
        tracking = tracking.with_stop_pinch_distance(d);
    }
    tracking.validate().context("pinch thresholds")?;

    #[cfg(feature = "leap")]
    let source = if cli.leap { SourceKind::Leap } else { SourceKind::Simulation };
    #[cfg(not(feature = "leap"))]
    let source = SourceKind::Simulation;

    info!(
        ?source,
        start_pinch = tracking.pinch.start_distance,
        stop_pinch = tracking.pinch.stop_distance,
        "leap_hands v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    run(AppConfig { tracking, source, ..AppConfig::default() })
}

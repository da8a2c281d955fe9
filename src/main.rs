use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod pipeline;

use config::AppConfig;

/// Road defect detection over a live camera feed
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the persisted store
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Number of display ticks to run
    #[arg(long)]
    frames: Option<u64>,

    /// Start without connectivity
    #[arg(long)]
    offline: bool,

    /// Operator e-mail
    #[arg(long)]
    user: Option<String>,

    /// Save annotated frames for each detection
    #[arg(long)]
    overlay_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roadsense=info,roadsense_core=info,roadsense_cv=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(frames) = cli.frames {
        config.frames = frames;
    }
    if cli.offline {
        config.online = false;
    }
    if let Some(email) = cli.user {
        config.user_email = email;
    }
    if cli.overlay_dir.is_some() {
        config.overlay_dir = cli.overlay_dir;
    }

    tracing::info!("Starting RoadSense v{}", env!("CARGO_PKG_VERSION"));

    let summary = pipeline::run(&config)?;
    tracing::info!(?summary, "Run complete");
    Ok(())
}

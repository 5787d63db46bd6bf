//! smokex-monitor CLI
//!
//! Command-line interface for the Smoke X receiver telemetry monitor.

use std::path::PathBuf;

use clap::Parser;
use smokex_monitor::{load_config, Config};
use tracing::Level;

#[derive(Parser)]
#[command(name = "smokex-monitor")]
#[command(about = "Telemetry monitor for the Smoke X receiver")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Receiver base URL (overrides config file)
    #[arg(long, conflicts_with = "mock")]
    device_url: Option<String>,

    /// Serve canned fixture data instead of talking to a receiver
    #[arg(long)]
    mock: bool,

    /// Dashboard port (overrides config file)
    #[arg(long)]
    dashboard_port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, device_url={:?}, mock={}, dashboard_port={:?}, log_level={:?}",
        args.config,
        args.device_url,
        args.mock,
        args.dashboard_port,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if args.mock {
        config.device = config.device.into_mock();
    } else if let Some(url) = args.device_url {
        config.device = config.device.with_base_url(url);
    }

    if let Some(dashboard_port) = args.dashboard_port {
        config.dashboard.port = dashboard_port;
    }

    tracing::info!("Starting smokex-monitor");
    tracing::debug!("Device: {:?}", config.device);

    smokex_monitor::run(config).await?;

    Ok(())
}

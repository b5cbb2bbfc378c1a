//! pulse-monitor - Entry Point

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Live pulse stream monitor
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via PULSE_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Stream URL, overrides the config file and PULSE_WS_URL
    #[arg(short, long)]
    url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    pulse_telemetry::init_logging()?;

    info!("Starting pulse-monitor v{}", env!("CARGO_PKG_VERSION"));

    let explicit_path = args
        .config
        .or_else(|| std::env::var(pulse_monitor::config::CONFIG_ENV).ok());

    let mut config = pulse_monitor::AppConfig::load(explicit_path.as_deref())?;
    config.apply_url_override(
        args.url,
        std::env::var(pulse_monitor::config::URL_ENV).ok(),
    );
    info!(url = %config.stream.url, capacity = config.stream.window_capacity, "Configuration loaded");

    let app = pulse_monitor::Application::new(config)?;
    app.run().await?;

    Ok(())
}

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};

use hud_core::aggregator::Aggregator;
use hud_core::config::{HudConfig, ValidatedConfig, ZoneConfig};
use hud_core::scheduler::Scheduler;
use hud_core::sink::{ConsoleSink, SnapshotSlot};
use hud_core::snapshot::Snapshot;

#[derive(Parser, Debug)]
#[command(name = "server-hud")]
#[command(about = "Status HUD: server load, weather, board sensors and clocks")]
#[command(version)]
struct Cli {
    /// Remote stats endpoint (e.g., http://192.168.0.100:5000/stats)
    #[arg(long, env = "HUD_SERVER_URL", global = true)]
    server_url: Option<String>,

    /// Location name for the weather lookup
    #[arg(long, env = "HUD_LOCATION", global = true)]
    location: Option<String>,

    /// OpenWeatherMap API key
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true, global = true)]
    weather_api_key: Option<String>,

    /// Weather API endpoint
    #[arg(long, env = "HUD_WEATHER_URL", global = true)]
    weather_url: Option<String>,

    /// Clocks to show: "local" or IANA names, comma separated
    #[arg(long = "time-zone", env = "HUD_TIME_ZONES", value_delimiter = ',', global = true)]
    time_zones: Vec<String>,

    /// Seconds between the end of one poll and the start of the next
    #[arg(long, env = "HUD_INTERVAL_SECS", global = true)]
    interval_secs: Option<u64>,

    /// Per-source timeout in seconds
    #[arg(long, env = "HUD_TIMEOUT_SECS", global = true)]
    timeout_secs: Option<u64>,

    /// Sensor query command (e.g., "vcgencmd" or "ssh pi@rpi vcgencmd")
    #[arg(long, env = "HUD_HARDWARE_COMMAND", global = true)]
    hardware_command: Option<String>,

    /// Path to config file
    #[arg(long, env = "HUD_CONFIG_PATH", global = true)]
    config_path: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "HUD_LOG_LEVEL", global = true)]
    log_level: String,

    /// Poll once, print the snapshot as JSON and exit
    #[arg(long)]
    once: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the effective configuration (API key excluded) to the config path
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is the display
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!(
        "server-hud v{} starting (os={}, arch={})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH,
    );

    let config_path = cli
        .config_path
        .as_ref()
        .map(std::path::PathBuf::from)
        .unwrap_or_else(HudConfig::default_path);

    let mut config = if config_path.exists() {
        info!("loading config from {}", config_path.display());
        HudConfig::load(&config_path)?
    } else {
        info!("no config at {}, using defaults", config_path.display());
        HudConfig::default()
    };

    // CLI args override config file
    apply_overrides(&mut config, &cli);

    if let Some(Commands::InitConfig) = cli.command {
        config.save(&config_path)?;
        info!("config saved to {}", config_path.display());
        return Ok(());
    }

    let (validated, aggregator) = prepare(&config)?;

    if cli.once {
        let snapshot = poll_once(aggregator, validated.poll_interval).await?;
        println!("{}", serde_json::to_string_pretty(&*snapshot)?);
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, finishing current poll");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                warn!("failed to listen for Ctrl+C: {}", e);
                // keep the sender alive so the scheduler keeps running
                std::future::pending::<()>().await;
            }
        }
    });

    info!(
        "polling {} and weather for {} every {:?}",
        validated.server_url, validated.location, validated.poll_interval
    );

    let scheduler = Scheduler::new(aggregator, ConsoleSink::stdout(), validated.poll_interval);
    scheduler.run(shutdown_rx).await;

    info!("server-hud stopped");
    Ok(())
}

/// Validate the configuration and build the sources. Nothing is fetched
/// until the whole configuration checks out.
fn prepare(config: &HudConfig) -> Result<(ValidatedConfig, Aggregator)> {
    let validated = config.validate().context("invalid configuration")?;
    let aggregator = Aggregator::from_config(&validated)?;
    Ok((validated, aggregator))
}

/// Run the scheduler into a SnapshotSlot and stop it after the first tick.
async fn poll_once(aggregator: Aggregator, interval: Duration) -> Result<Arc<Snapshot>> {
    let slot = SnapshotSlot::new();
    let mut published = slot.subscribe();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let run = tokio::spawn(Scheduler::new(aggregator, slot, interval).run(shutdown_rx));
    // Err means the scheduler went away without publishing
    let first = published.changed().await;
    shutdown_tx.send_replace(true);
    let slot = run.await.context("scheduler task failed")?;
    first.context("scheduler stopped before the first snapshot")?;

    slot.latest().context("no snapshot captured")
}

fn apply_overrides(config: &mut HudConfig, cli: &Cli) {
    if let Some(url) = &cli.server_url {
        config.server_url = url.clone();
    }
    if let Some(location) = &cli.location {
        config.location = location.clone();
    }
    if let Some(key) = &cli.weather_api_key {
        config.weather_api_key = Some(key.clone());
    }
    if let Some(url) = &cli.weather_url {
        config.weather_url = url.clone();
    }
    if !cli.time_zones.is_empty() {
        config.time_zones = cli
            .time_zones
            .iter()
            .map(|zone| ZoneConfig {
                zone: zone.trim().to_string(),
                show_date: true,
            })
            .collect();
    }
    if let Some(secs) = cli.interval_secs {
        config.poll_interval_secs = secs;
    }
    if let Some(secs) = cli.timeout_secs {
        config.fetch_timeout_secs = secs;
    }
    if let Some(command) = &cli.hardware_command {
        config.hardware_command = command.split_whitespace().map(String::from).collect();
    }
}

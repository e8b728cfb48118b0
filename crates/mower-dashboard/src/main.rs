//! Mower dashboard - Entry Point
//!
//! `watch`: stream live telemetry and log snapshot summaries
//! `action` / `call`: send a command to the control endpoint

use anyhow::Result;
use clap::{Parser, Subcommand};
use mower_command::{parse_key_value, ArgValue, CommandDispatcher, CommandRequest};
use mower_dashboard::{
    channel_descriptors, send_and_notify, AppConfig, MowerAction, Notifier, TelemetryAggregator,
    TracingNotifier,
};
use mower_monitoring::Metrics;
use mower_stream::SseTransport;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Live telemetry dashboard and command console for OpenMower robots
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via MOWER_CONFIG env var)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream telemetry until Ctrl-C (or for a fixed duration)
    Watch {
        /// Stop after this many seconds
        #[arg(long)]
        duration_secs: Option<u64>,
        /// Print Prometheus metrics on exit
        #[arg(long)]
        metrics: bool,
    },
    /// Send a preset action
    Action {
        #[arg(value_enum)]
        preset: MowerAction,
    },
    /// Send an arbitrary action with key=value arguments
    Call {
        action: String,
        #[arg(long = "arg", value_parser = parse_key_value)]
        args: Vec<(String, ArgValue)>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    mower_monitoring::init_logging()?;

    info!("Starting mower dashboard v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > MOWER_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("MOWER_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = AppConfig::load(&config_path)?;
    info!(base_url = %config.base_url, channels = ?config.channels, "Configuration loaded");

    let dispatcher = CommandDispatcher::new(config.dispatcher_config())?;
    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);

    match args.command {
        Command::Watch {
            duration_secs,
            metrics,
        } => {
            watch(&config, dispatcher, notifier, duration_secs).await?;
            if metrics {
                println!("{}", Metrics::render()?);
            }
            Ok(())
        }
        Command::Action { preset } => {
            info!(preset = preset.label(), "Sending preset action");
            send(&dispatcher, notifier.as_ref(), preset.request()).await
        }
        Command::Call { action, args } => {
            let request = CommandRequest::checked(action)?.with_args(args.into_iter().collect());
            send(&dispatcher, notifier.as_ref(), request).await
        }
    }
}

async fn watch(
    config: &AppConfig,
    dispatcher: CommandDispatcher,
    notifier: Arc<dyn Notifier>,
    duration_secs: Option<u64>,
) -> Result<()> {
    let transport = SseTransport::new(config.sse_config())?;
    let channels = config.mower_channels()?;

    let mut aggregator = TelemetryAggregator::with_event_buffer(
        Arc::new(transport),
        dispatcher,
        notifier,
        config.stream.event_buffer,
    )
    .with_snapshot_log_interval(Duration::from_millis(config.snapshot_log_interval_ms));

    let shutdown = CancellationToken::new();

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl-C"),
            Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
        }
        ctrl_c.cancel();
    });

    if let Some(secs) = duration_secs {
        let deadline = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            info!(secs, "Watch duration elapsed");
            deadline.cancel();
        });
    }

    aggregator.attach(channel_descriptors(&channels, &config.subscribe_path));
    aggregator.run_until(shutdown).await;

    let snapshot = aggregator.snapshot();
    info!(summary = %snapshot.summary(), "Final snapshot");
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

/// Send one command; a failed command is a failed run.
async fn send(
    dispatcher: &CommandDispatcher,
    notifier: &dyn Notifier,
    request: CommandRequest,
) -> Result<()> {
    let outcome = send_and_notify(dispatcher, notifier, &request).await;
    match outcome.message() {
        None => Ok(()),
        Some(message) => anyhow::bail!("Command {} failed: {message}", request.action),
    }
}

//! MQTT publish/subscribe test client - Main Entry Point
//!
//! Exit status: 0 after SIGINT or SIGTERM, 1 for configuration errors,
//! 2 when connecting, subscribing or publishing fails.

use clap::Parser;
use mqtt_pubsub::cli::Cli;
use mqtt_pubsub::config::AppConfig;
use mqtt_pubsub::error::{AppError, AppResult, EXIT_CONFIG};
use mqtt_pubsub::observability::init_default_logging;
use mqtt_pubsub::publisher::PublishLoop;
use mqtt_pubsub::transport::mqtt::{LoggingHandler, MqttClient};
use std::process;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Stdout carries only the TOML here, so this runs before logging is set up
    if cli.show_config {
        show_config(&cli);
        return;
    }

    init_default_logging();

    info!("Starting mqtt-pubsub v{}", env!("CARGO_PKG_VERSION"));

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(EXIT_CONFIG);
        }
    };

    if let Err(e) = run(config).await {
        error!("{}", e);
        process::exit(e.exit_code());
    }

    info!("Application shutdown complete");
}

/// Print the resolved configuration as TOML, errors go to stderr
fn show_config(cli: &Cli) {
    match cli
        .resolve_config()
        .and_then(|config| config.to_redacted_toml())
    {
        Ok(rendered) => print!("{rendered}"),
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            process::exit(EXIT_CONFIG);
        }
    }
}

async fn run(config: AppConfig) -> AppResult<()> {
    info!(
        server = %config.mqtt.server,
        client_id = %config.mqtt.client_id,
        send_topic = %config.mqtt.send_topic,
        receive_topic = %config.mqtt.receive_topic,
        "Application starting"
    );

    let client = MqttClient::new(config.mqtt.clone())?;
    let mut publish_loop = PublishLoop::from_config(client, &config.publisher);

    publish_loop.start(Arc::new(LoggingHandler)).await?;

    // Registered after connect so a hung connect can still be interrupted
    let mut sigint = signal(SignalKind::interrupt()).map_err(AppError::Signal)?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(AppError::Signal)?;
    let shutdown = async move {
        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    };

    let published = publish_loop.run_until(shutdown).await?;
    info!(published, "Publish loop stopped");

    if let Err(e) = publish_loop.shutdown().await {
        warn!("Error during disconnect: {}", e);
    }

    Ok(())
}

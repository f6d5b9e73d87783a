//! Command-line interface
//!
//! Flags override values from the optional TOML file, which in turn override
//! the built-in defaults.

use crate::config::{AppConfig, ConfigError};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// MQTT publish/subscribe test client
#[derive(Debug, Parser)]
#[command(name = "mqtt-pubsub")]
#[command(about = "Publishes a test message every few seconds and logs what arrives on a topic filter")]
#[command(version)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Broker URL, e.g. tcp://localhost:1883 or ssl://broker:8883
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,

    /// Topic to publish on
    #[arg(long, value_name = "TOPIC")]
    pub sendtopic: Option<String>,

    /// Topic filter to subscribe to
    #[arg(long, value_name = "FILTER")]
    pub resvtopic: Option<String>,

    /// QoS for publish and subscribe (0, 1 or 2)
    #[arg(long)]
    pub qos: Option<u8>,

    /// Set the retained flag on published messages (`--retained=false` clears it)
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_name = "BOOL")]
    pub retained: Option<bool>,

    /// Client id, defaults to the host name plus the current second
    #[arg(long, value_name = "ID")]
    pub clientid: Option<String>,

    /// Username for broker authentication
    #[arg(long, env = "MQTT_USERNAME")]
    pub username: Option<String>,

    /// Password for broker authentication
    #[arg(long, env = "MQTT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Verify the broker certificate on TLS connections
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_name = "BOOL")]
    pub tls_verify: Option<bool>,

    /// Keep alive interval in seconds
    #[arg(long, value_name = "SECS")]
    pub keep_alive: Option<u64>,

    /// Seconds between two publishes
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Payload to publish
    #[arg(long)]
    pub message: Option<String>,

    /// Print the resolved configuration and exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Load the config file if one was given, apply flag overrides, validate
    pub fn resolve_config(&self) -> Result<AppConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Loading configuration from: {}", path.display());
                AppConfig::load_from_file(path)?
            }
            None => AppConfig::default(),
        };

        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Copy every flag that was given onto `config`
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        let mqtt = &mut config.mqtt;
        if let Some(server) = &self.server {
            mqtt.server = server.clone();
        }
        if let Some(topic) = &self.sendtopic {
            mqtt.send_topic = topic.clone();
        }
        if let Some(filter) = &self.resvtopic {
            mqtt.receive_topic = filter.clone();
        }
        if let Some(qos) = self.qos {
            mqtt.qos = qos;
        }
        if let Some(client_id) = &self.clientid {
            mqtt.client_id = client_id.clone();
        }
        if let Some(username) = &self.username {
            mqtt.username = username.clone();
        }
        if let Some(password) = &self.password {
            mqtt.password = password.clone();
        }
        if let Some(keep_alive) = self.keep_alive {
            mqtt.keep_alive_secs = keep_alive;
        }
        if let Some(retained) = self.retained {
            mqtt.retained = retained;
        }
        if let Some(tls_verify) = self.tls_verify {
            mqtt.tls_verify = tls_verify;
        }

        if let Some(interval) = self.interval {
            config.publisher.interval_secs = interval;
        }
        if let Some(message) = &self.message {
            config.publisher.message = message.clone();
        }
    }
}

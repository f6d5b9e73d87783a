//! Configuration system for the MQTT publish/subscribe client
//!
//! Every field has a default, so the client runs with no configuration at all.
//! A TOML file can provide values, and command-line flags override the file.

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use url::Url;

/// Main client configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub mqtt: MqttSection,
    #[serde(default)]
    pub publisher: PublisherSection,
}

/// MQTT section - broker, topics and session options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MqttSection {
    /// Full URL of the broker (scheme, host and port)
    #[serde(default = "default_server")]
    pub server: String,
    /// Topic the test message is published on
    #[serde(default = "default_send_topic")]
    pub send_topic: String,
    /// Topic filter to subscribe to (may contain `+` and `#`)
    #[serde(default = "default_receive_topic")]
    pub receive_topic: String,
    /// QoS used for both publish and subscribe (0, 1 or 2)
    #[serde(default)]
    pub qos: u8,
    /// Retained flag on outgoing publishes
    #[serde(default)]
    pub retained: bool,
    /// Session identifier, must be unique per broker
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Username for authentication (empty disables credentials)
    #[serde(default)]
    pub username: String,
    /// Password to match username
    #[serde(default)]
    pub password: String,
    /// Verify the broker certificate on TLS connections.
    /// Off by default: TLS sessions skip verification unless this is set.
    #[serde(default)]
    pub tls_verify: bool,
    /// Keep alive interval in seconds
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,
}

impl Default for MqttSection {
    fn default() -> Self {
        Self {
            server: default_server(),
            send_topic: default_send_topic(),
            receive_topic: default_receive_topic(),
            qos: 0,
            retained: false,
            client_id: default_client_id(),
            username: String::new(),
            password: String::new(),
            tls_verify: false,
            keep_alive_secs: default_keep_alive(),
        }
    }
}

/// Publisher section - what the driver loop sends and how often
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublisherSection {
    /// Seconds between two publishes
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    /// Payload of every publish
    #[serde(default = "default_message")]
    pub message: String,
}

impl Default for PublisherSection {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            message: default_message(),
        }
    }
}

pub const DEFAULT_SERVER: &str = "tcp://localhost:1883";
pub const DEFAULT_SEND_TOPIC: &str = "MQTT/Client/Update/TEST";
pub const DEFAULT_RECEIVE_TOPIC: &str = "MQTT/+/Update/#";
pub const DEFAULT_MESSAGE: &str = "test massage";

fn default_server() -> String {
    DEFAULT_SERVER.to_string()
}

fn default_send_topic() -> String {
    DEFAULT_SEND_TOPIC.to_string()
}

fn default_receive_topic() -> String {
    DEFAULT_RECEIVE_TOPIC.to_string()
}

fn default_keep_alive() -> u64 {
    30
}

fn default_interval() -> u64 {
    5
}

fn default_message() -> String {
    DEFAULT_MESSAGE.to_string()
}

/// Derive a client id from the host name and the current second of the minute.
///
/// Two clients started on the same host within the same second collide, so
/// this only reduces the chance of a broker kicking an older session.
pub fn default_client_id() -> String {
    client_id_from(&local_hostname(), chrono::Local::now().second())
}

/// Pure form of [`default_client_id`]
pub fn client_id_from(hostname: &str, second: u32) -> String {
    format!("{hostname}{second}")
}

/// Best-effort host name lookup
pub fn local_hostname() -> String {
    ["/proc/sys/kernel/hostname", "/etc/hostname"]
        .iter()
        .filter_map(|path| std::fs::read_to_string(path).ok())
        .map(|name| name.trim().to_string())
        .find(|name| !name.is_empty())
        .or_else(|| {
            std::env::var("HOSTNAME")
                .ok()
                .filter(|name| !name.trim().is_empty())
        })
        .unwrap_or_else(|| "mqtt-client".to_string())
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Failed to render TOML: {0}")]
    TomlRender(#[from] toml::ser::Error),
    #[error("Invalid broker URL: {0}")]
    InvalidBrokerUrl(String),
    #[error("Invalid QoS level {0}, expected 0, 1 or 2")]
    InvalidQos(u8),
    #[error("Invalid topic: {0}")]
    InvalidTopic(String),
    #[error("Invalid client id: {0:?}")]
    InvalidClientId(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AppConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field that the broker or the driver loop would reject later
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mqtt.validate()?;

        if self.publisher.interval_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "publish interval must be at least one second".to_string(),
            ));
        }

        Ok(())
    }

    /// Render as TOML with the password masked
    pub fn to_redacted_toml(&self) -> Result<String, ConfigError> {
        let mut shown = self.clone();
        if !shown.mqtt.password.is_empty() {
            shown.mqtt.password = "***".to_string();
        }
        Ok(toml::to_string_pretty(&shown)?)
    }
}

impl MqttSection {
    pub fn validate(&self) -> Result<(), ConfigError> {
        BrokerAddress::parse(&self.server)?;

        if self.qos > 2 {
            return Err(ConfigError::InvalidQos(self.qos));
        }

        validate_topic_name(&self.send_topic)?;
        validate_topic_filter(&self.receive_topic)?;
        validate_client_id(&self.client_id)?;

        Ok(())
    }

    /// Credentials to present, if any. A password without a username is ignored.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if self.username.is_empty() {
            None
        } else {
            Some((self.username.as_str(), self.password.as_str()))
        }
    }
}

/// Transport family selected by the broker URL scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerScheme {
    Tcp,
    Tls,
}

/// Broker URL broken into the parts rumqttc needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddress {
    pub scheme: BrokerScheme,
    pub host: String,
    pub port: u16,
}

impl BrokerAddress {
    /// Parse `scheme://host[:port]`. Plain schemes default to 1883, TLS schemes to 8883.
    pub fn parse(server: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(server).map_err(|_| ConfigError::InvalidBrokerUrl(server.to_string()))?;

        let scheme = match url.scheme() {
            "tcp" | "mqtt" => BrokerScheme::Tcp,
            "ssl" | "tls" | "tcps" | "mqtts" => BrokerScheme::Tls,
            other => {
                return Err(ConfigError::InvalidBrokerUrl(format!(
                    "{server} (unsupported scheme {other:?})"
                )))
            }
        };

        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| ConfigError::InvalidBrokerUrl(server.to_string()))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();

        let port = url.port().unwrap_or(match scheme {
            BrokerScheme::Tcp => 1883,
            BrokerScheme::Tls => 8883,
        });

        Ok(Self { scheme, host, port })
    }
}

/// Topic names used for publishing must not contain wildcards
pub fn validate_topic_name(topic: &str) -> Result<(), ConfigError> {
    if topic.is_empty() {
        return Err(ConfigError::InvalidTopic("publish topic is empty".to_string()));
    }
    if topic.contains(['+', '#']) {
        return Err(ConfigError::InvalidTopic(format!(
            "publish topic {topic:?} contains a wildcard"
        )));
    }
    Ok(())
}

/// Topic filters may use `+` and `#`, each occupying a whole level, `#` only last
pub fn validate_topic_filter(filter: &str) -> Result<(), ConfigError> {
    if filter.is_empty() {
        return Err(ConfigError::InvalidTopic("topic filter is empty".to_string()));
    }

    let levels: Vec<&str> = filter.split('/').collect();
    for (index, level) in levels.iter().enumerate() {
        let is_last = index == levels.len() - 1;
        if level.contains('#') && (*level != "#" || !is_last) {
            return Err(ConfigError::InvalidTopic(format!(
                "misplaced '#' in topic filter {filter:?}"
            )));
        }
        if level.contains('+') && *level != "+" {
            return Err(ConfigError::InvalidTopic(format!(
                "misplaced '+' in topic filter {filter:?}"
            )));
        }
    }

    Ok(())
}

/// rumqttc refuses empty ids and ids with a leading space
pub fn validate_client_id(client_id: &str) -> Result<(), ConfigError> {
    if client_id.is_empty() || client_id.starts_with(' ') {
        return Err(ConfigError::InvalidClientId(client_id.to_string()));
    }
    Ok(())
}

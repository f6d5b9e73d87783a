//! MQTT publish/subscribe test client
//!
//! Connects to an MQTT broker over TCP or TLS, logs every message arriving on
//! a topic filter and publishes a fixed test message at a regular interval.
//!
//! # Overview
//!
//! - [`config`] - TOML configuration with defaults and validation
//! - [`transport`] - MQTT connection handle built on rumqttc
//! - [`publisher`] - the connect, subscribe and publish cycle
//! - [`observability`] - structured logging to standard output
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use mqtt_pubsub::config::AppConfig;
//! use mqtt_pubsub::publisher::PublishLoop;
//! use mqtt_pubsub::transport::mqtt::{LoggingHandler, MqttClient};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! let client = MqttClient::new(config.mqtt.clone())?;
//!
//! let mut publish_loop = PublishLoop::from_config(client, &config.publisher);
//! publish_loop.start(Arc::new(LoggingHandler)).await?;
//! publish_loop
//!     .run_until(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod observability;
pub mod publisher;
pub mod testing;
pub mod transport;

pub use config::{AppConfig, ConfigError, MqttSection, PublisherSection};
pub use error::{AppError, AppResult};
pub use publisher::PublishLoop;
pub use transport::mqtt::{MqttClient, MqttError};

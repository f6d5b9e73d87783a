//! Pure connection state management for MQTT client
//!
//! This module contains pure functions for connection state management,
//! error types and translation of configuration into rumqttc options.

use super::tls::{self, TlsVerification};
use crate::config::{BrokerAddress, BrokerScheme, ConfigError, MqttSection};
use rumqttc::{MqttOptions, QoS};
use std::time::Duration;
use thiserror::Error;

/// Connection state for MQTT client
///
/// A client that never called `connect()` has no state at all.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    /// Event loop started, waiting for CONNACK
    Connecting,
    /// CONNACK received, ready for operations
    Connected,
    /// Session ended with reason. Terminal: the client never reconnects.
    Disconnected(String),
}

/// MQTT transport errors
#[derive(Debug, Error)]
pub enum MqttError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("Connection failed: {0}")]
    ConnectionFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Connection failed: {0}")]
    ConnectionFailedStr(String),
    #[error("Connection lost: {0}")]
    ConnectionLost(String),
    #[error("Already connected")]
    AlreadyConnected,
    #[error("Not connected - connect() has not succeeded")]
    NotConnected,
    #[error("Publishing failed: {0}")]
    PublishFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Subscription failed: {0}")]
    SubscriptionFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Subscription to {filter} rejected by broker")]
    SubscriptionRejected { filter: String },
}

/// Map a numeric QoS level onto rumqttc's enum
pub fn qos_from_level(level: u8) -> Result<QoS, MqttError> {
    match level {
        0 => Ok(QoS::AtMostOnce),
        1 => Ok(QoS::AtLeastOnce),
        2 => Ok(QoS::ExactlyOnce),
        other => Err(ConfigError::InvalidQos(other).into()),
    }
}

/// Pure function to configure MQTT options from config
pub fn configure_mqtt_options(config: &MqttSection) -> Result<MqttOptions, MqttError> {
    config.validate()?;
    let address = BrokerAddress::parse(&config.server)?;

    let mut mqtt_options = MqttOptions::new(&config.client_id, &address.host, address.port);
    mqtt_options.set_clean_session(true);
    mqtt_options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(1)));

    if let Some((username, password)) = config.credentials() {
        mqtt_options.set_credentials(username, password);
    }

    if address.scheme == BrokerScheme::Tls {
        let verification = TlsVerification::from_flag(config.tls_verify);
        mqtt_options.set_transport(tls::transport(verification));
    }

    Ok(mqtt_options)
}

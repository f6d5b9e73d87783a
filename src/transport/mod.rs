//! Transport layer for the publish/subscribe client
//!
//! This module provides the transport abstraction used by the publish loop
//! and its MQTT implementation.

use crate::transport::mqtt::MessageHandler;
use std::sync::Arc;

pub mod mqtt;

/// Transport trait for the publish loop
///
/// This trait provides an abstraction over the broker session to enable
/// dependency injection and testing.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Connect to the broker, waiting for its acknowledgement
    async fn connect(&mut self) -> Result<(), Self::Error>;

    /// Publish a message on the configured topic
    async fn publish(&self, message: &str) -> Result<(), Self::Error>;

    /// Install the inbound message handler and subscribe to the configured filter
    async fn set_subscribe(&self, handler: Arc<dyn MessageHandler>) -> Result<(), Self::Error>;

    /// Disconnect from the broker
    async fn disconnect(&mut self) -> Result<(), Self::Error>;

    /// Check if transport is currently connected
    fn is_connected(&self) -> bool;
}

/// Type alias for MQTT transport
pub type MqttTransport = mqtt::MqttClient;

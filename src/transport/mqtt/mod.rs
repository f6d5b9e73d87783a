//! MQTT client implementation
//!
//! The client is split into focused sub-modules that separate pure functions
//! from I/O operations:
//!
//! - [`connection`] - Connection state, errors and option building
//! - [`tls`] - TLS transport and certificate verification mode
//! - [`message_handler`] - Event routing and the inbound message handler seam
//! - [`ack_tracker`] - Pairing of requests with broker acknowledgements
//! - [`client`] - Impure I/O operations and coordination
//!
//! # Usage
//!
//! ```rust,no_run
//! use mqtt_pubsub::config::MqttSection;
//! use mqtt_pubsub::transport::mqtt::{LoggingHandler, MqttClient};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let config = MqttSection {
//!     server: "tcp://localhost:1883".to_string(),
//!     ..MqttSection::default()
//! };
//!
//! let mut client = MqttClient::new(config)?;
//! client.connect().await?;
//! client.set_subscribe(Arc::new(LoggingHandler)).await?;
//! client.publish("test massage").await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```

pub mod ack_tracker;
pub mod client;
pub mod connection;
pub mod message_handler;
pub mod tls;

// Re-export public types for convenience
pub use ack_tracker::AckTracker;
pub use client::MqttClient;
pub use connection::{ConnectionState, MqttError};
pub use message_handler::{
    EventRoute, EventRouter, LoggingHandler, MessageHandler, OutgoingPublish, ReceivedMessage,
};
pub use tls::TlsVerification;

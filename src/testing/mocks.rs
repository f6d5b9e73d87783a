//! Mock implementations for testing
//!
//! Provides a mock Transport that records what the publish loop asks of it,
//! so the loop can be tested without a broker.

use crate::transport::mqtt::{MessageHandler, ReceivedMessage};
use crate::transport::Transport;
use async_trait::async_trait;
use rumqttc::QoS;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Failures produced by [`MockTransport`]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MockError {
    #[error("Mock connection failure")]
    Connect,
    #[error("Mock subscribe failure")]
    Subscribe,
    #[error("Mock publish failure")]
    Publish,
    #[error("Mock transport not connected")]
    NotConnected,
}

/// Which operation of the mock should fail
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailureMode {
    #[default]
    None,
    Connect,
    Subscribe,
    /// Publishing succeeds this many times, then fails
    PublishAfter(usize),
}

/// Mock transport for testing
///
/// Clones share their recorded state, so a test can keep one clone while the
/// publish loop owns another.
#[derive(Clone, Default)]
pub struct MockTransport {
    pub published_messages: Arc<Mutex<Vec<String>>>,
    pub subscribe_calls: Arc<Mutex<usize>>,
    pub handler: Arc<Mutex<Option<Arc<dyn MessageHandler>>>>,
    pub failure: FailureMode,
    connected: Arc<AtomicBool>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure(failure: FailureMode) -> Self {
        Self {
            failure,
            ..Default::default()
        }
    }

    pub async fn get_published_messages(&self) -> Vec<String> {
        self.published_messages.lock().await.clone()
    }

    pub async fn subscribe_count(&self) -> usize {
        *self.subscribe_calls.lock().await
    }

    /// Hand `payload` to the installed handler as if the broker delivered it.
    /// Returns false when no handler is installed.
    pub async fn deliver(&self, topic: &str, payload: &str) -> bool {
        let Some(handler) = self.handler.lock().await.clone() else {
            return false;
        };

        handler.on_message(&ReceivedMessage {
            topic: topic.to_string(),
            payload: payload.as_bytes().to_vec(),
            qos: QoS::AtMostOnce,
            retain: false,
        });
        true
    }
}

#[async_trait]
impl Transport for MockTransport {
    type Error = MockError;

    async fn connect(&mut self) -> Result<(), Self::Error> {
        if self.failure == FailureMode::Connect {
            return Err(MockError::Connect);
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn publish(&self, message: &str) -> Result<(), Self::Error> {
        if !self.is_connected() {
            return Err(MockError::NotConnected);
        }

        let mut published = self.published_messages.lock().await;
        if let FailureMode::PublishAfter(limit) = self.failure {
            if published.len() >= limit {
                return Err(MockError::Publish);
            }
        }
        published.push(message.to_string());
        Ok(())
    }

    async fn set_subscribe(&self, handler: Arc<dyn MessageHandler>) -> Result<(), Self::Error> {
        if !self.is_connected() {
            return Err(MockError::NotConnected);
        }
        *self.subscribe_calls.lock().await += 1;
        if self.failure == FailureMode::Subscribe {
            return Err(MockError::Subscribe);
        }
        *self.handler.lock().await = Some(handler);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Self::Error> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

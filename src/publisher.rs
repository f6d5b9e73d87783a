//! Periodic publish loop
//!
//! Connects the transport, installs the inbound handler with a single
//! subscribe, then publishes the configured message once per interval until
//! shutdown is requested or a publish fails.

use crate::config::PublisherSection;
use crate::transport::mqtt::MessageHandler;
use crate::transport::Transport;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, Instrument};

/// Drives a [`Transport`] through connect, subscribe and the publish cycle
pub struct PublishLoop<T>
where
    T: Transport,
{
    transport: T,
    interval: Duration,
    message: String,
}

impl<T> PublishLoop<T>
where
    T: Transport,
{
    pub fn new(transport: T, interval: Duration, message: impl Into<String>) -> Self {
        Self {
            transport,
            interval,
            message: message.into(),
        }
    }

    /// Build from the `[publisher]` config section
    pub fn from_config(transport: T, config: &PublisherSection) -> Self {
        Self::new(
            transport,
            Duration::from_secs(config.interval_secs),
            config.message.clone(),
        )
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Connect and subscribe with `handler`
    pub async fn start(&mut self, handler: Arc<dyn MessageHandler>) -> Result<(), T::Error> {
        let span = crate::lifecycle_span!(phase = "start");
        async {
            self.transport.connect().await?;
            self.transport.set_subscribe(handler).await?;
            info!("Publish loop started");
            Ok::<(), T::Error>(())
        }
        .instrument(span)
        .await
    }

    /// Publish once per interval until `shutdown` completes.
    ///
    /// The first publish happens one interval after the call. Returns the
    /// number of messages published, or the first publish error.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<u64, T::Error>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut published: u64 = 0;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(published, "Shutdown requested, stopping publish loop");
                    return Ok(published);
                }
                _ = tokio::time::sleep(self.interval) => {
                    self.transport.publish(&self.message).await?;
                    published += 1;
                    debug!(published, "Publish cycle complete");
                }
            }
        }
    }

    /// Disconnect the transport
    pub async fn shutdown(&mut self) -> Result<(), T::Error> {
        let span = crate::lifecycle_span!(phase = "shutdown");
        self.transport.disconnect().instrument(span).await
    }

    pub fn into_transport(self) -> T {
        self.transport
    }
}

//! Impure I/O operations for MQTT client
//!
//! This module handles network communication, async coordination, and
//! integration with the rumqttc client. The rumqttc event loop runs on its own
//! task; `connect`, `publish` and `set_subscribe` block their caller until the
//! broker acknowledged the request.

use super::ack_tracker::{AckReceiver, AckTracker};
use super::connection::{configure_mqtt_options, qos_from_level, ConnectionState, MqttError};
use super::message_handler::{EventRoute, EventRouter, MessageHandler};
use crate::config::MqttSection;
use crate::transport::Transport;
use async_trait::async_trait;
use rumqttc::{AsyncClient, EventLoop};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};

type SharedHandler = Arc<RwLock<Option<Arc<dyn MessageHandler>>>>;

/// Capacity of the rumqttc request channel
const REQUEST_CHANNEL_CAPACITY: usize = 10;

/// MQTT connection handle: one broker session, one publish topic, one subscription
pub struct MqttClient {
    config: MqttSection,
    client: AsyncClient,
    // EventLoop is not Sync
    event_loop: Option<std::sync::Mutex<EventLoop>>,
    event_loop_handle: Option<JoinHandle<()>>,
    state_rx: Option<watch::Receiver<ConnectionState>>,
    state_tx: Option<watch::Sender<ConnectionState>>,
    acks: Arc<Mutex<AckTracker>>,
    handler: SharedHandler,
}

impl MqttClient {
    /// Validate `config` and prepare the session. No network I/O happens here.
    pub fn new(config: MqttSection) -> Result<Self, MqttError> {
        let mqtt_options = configure_mqtt_options(&config)?;
        let (client, event_loop) = AsyncClient::new(mqtt_options, REQUEST_CHANNEL_CAPACITY);

        Ok(MqttClient {
            config,
            client,
            event_loop: Some(std::sync::Mutex::new(event_loop)),
            event_loop_handle: None,
            state_rx: None,
            state_tx: None,
            acks: Arc::new(Mutex::new(AckTracker::new())),
            handler: Arc::new(RwLock::new(None)),
        })
    }

    /// Pre-configure the handler; `connect()` then subscribes right after CONNACK
    pub fn with_message_handler(mut self, handler: Arc<dyn MessageHandler>) -> Self {
        self.handler = Arc::new(RwLock::new(Some(handler)));
        self
    }

    pub fn config(&self) -> &MqttSection {
        &self.config
    }

    /// Create the connection state channel
    fn setup_state_channel() -> (
        watch::Sender<ConnectionState>,
        watch::Receiver<ConnectionState>,
    ) {
        watch::channel(ConnectionState::Connecting)
    }

    /// Wait for CONNACK. There is no timeout: a silent broker blocks the caller.
    async fn wait_for_connection_confirmation(
        mut state_rx: watch::Receiver<ConnectionState>,
    ) -> Result<(), MqttError> {
        loop {
            if state_rx.changed().await.is_err() {
                return Err(MqttError::ConnectionFailedStr(
                    "Event loop stopped before CONNACK".to_string(),
                ));
            }

            let state = state_rx.borrow_and_update().clone();
            match state {
                ConnectionState::Connected => return Ok(()),
                ConnectionState::Disconnected(reason) => {
                    return Err(MqttError::ConnectionFailedStr(reason));
                }
                ConnectionState::Connecting => continue,
            }
        }
    }

    /// Connect to the broker, then subscribe if a handler was pre-configured
    pub async fn connect(&mut self) -> Result<(), MqttError> {
        let event_loop = self
            .event_loop
            .take()
            .ok_or(MqttError::AlreadyConnected)?
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let (state_tx, state_rx) = Self::setup_state_channel();
        self.state_rx = Some(state_rx.clone());
        self.state_tx = Some(state_tx.clone());

        let span = crate::mqtt_span!(server = %self.config.server, client_id = %self.config.client_id);
        let handle = tokio::spawn(
            Self::run_event_loop(event_loop, state_tx, self.acks.clone(), self.handler.clone())
                .instrument(span),
        );
        self.event_loop_handle = Some(handle);

        Self::wait_for_connection_confirmation(state_rx).await?;

        if self.handler.read().await.is_some() {
            self.subscribe_receive_topic().await?;
        }

        info!(
            server = %self.config.server,
            client_id = %self.config.client_id,
            "Connected to broker"
        );
        Ok(())
    }

    /// Drive rumqttc until the session ends. The loop is never polled again
    /// after an error, because polling would make rumqttc reconnect.
    async fn run_event_loop(
        mut event_loop: EventLoop,
        state_tx: watch::Sender<ConnectionState>,
        acks: Arc<Mutex<AckTracker>>,
        handler: SharedHandler,
    ) {
        debug!("Starting MQTT event loop");

        loop {
            match event_loop.poll().await {
                Ok(event) => {
                    let route = EventRouter::route_mqtt_event(&event);
                    if !Self::process_event_route(route, &state_tx, &acks, &handler).await {
                        break;
                    }
                }
                Err(e) => {
                    let reason = e.to_string();
                    let closing = matches!(*state_tx.borrow(), ConnectionState::Disconnected(_));
                    if closing {
                        debug!("MQTT event loop closed: {}", reason);
                    } else {
                        error!("MQTT event loop error: {}", reason);
                        let _ = state_tx.send(ConnectionState::Disconnected(reason.clone()));
                    }
                    acks.lock().await.fail_all(&reason);
                    break;
                }
            }
        }

        debug!("MQTT event loop stopped");
    }

    /// Process routed MQTT event - extracted for testability
    /// Returns true to continue loop, false to break
    async fn process_event_route(
        route: EventRoute,
        state_tx: &watch::Sender<ConnectionState>,
        acks: &Arc<Mutex<AckTracker>>,
        handler: &SharedHandler,
    ) -> bool {
        match route {
            EventRoute::ConnectionAcknowledged => {
                let _ = state_tx.send(ConnectionState::Connected);
                true
            }
            EventRoute::ConnectionRefused(code) => {
                let reason = format!("Connection refused by broker: {code}");
                let _ = state_tx.send(ConnectionState::Disconnected(reason.clone()));
                acks.lock().await.fail_all(&reason);
                false
            }
            EventRoute::MessageReceived(message) => {
                debug!(topic = %message.topic, "Received MQTT message");
                let current = handler.read().await.clone();
                match current {
                    Some(handler) => handler.on_message(&message),
                    None => warn!(topic = %message.topic, "Message received with no handler installed"),
                }
                true
            }
            EventRoute::PublishSent { pkid } => {
                acks.lock().await.publish_sent(pkid);
                true
            }
            EventRoute::PublishConfirmed { pkid } => {
                acks.lock().await.publish_confirmed(pkid);
                true
            }
            EventRoute::SubscribeSent { pkid } => {
                acks.lock().await.subscribe_sent(pkid);
                true
            }
            EventRoute::SubscriptionConfirmed { pkid, return_codes } => {
                debug!("Subscription confirmed: {:?}", return_codes);
                let accepted = EventRouter::subscription_succeeded(&return_codes);
                acks.lock().await.subscription_confirmed(pkid, accepted);
                true
            }
            EventRoute::Disconnected => {
                let reason = "Broker closed the session".to_string();
                warn!("{}", reason);
                let _ = state_tx.send(ConnectionState::Disconnected(reason.clone()));
                acks.lock().await.fail_all(&reason);
                false
            }
            EventRoute::InfrastructureEvent(event) => {
                debug!("MQTT event: {}", event);
                true
            }
            EventRoute::OutgoingEvent => true,
        }
    }

    /// Current connection state, `None` before `connect()` was called
    pub fn connection_state(&self) -> Option<ConnectionState> {
        self.state_rx.as_ref().map(|rx| rx.borrow().clone())
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.connection_state(), Some(ConnectionState::Connected))
    }

    /// Check connection state before operations
    fn check_connection_state(&self) -> Result<(), MqttError> {
        match self.connection_state() {
            Some(ConnectionState::Connected) => Ok(()),
            Some(ConnectionState::Disconnected(reason)) => Err(MqttError::ConnectionLost(reason)),
            Some(ConnectionState::Connecting) | None => Err(MqttError::NotConnected),
        }
    }

    async fn await_ack(ack: AckReceiver) -> Result<(), MqttError> {
        ack.await
            .map_err(|_| MqttError::ConnectionLost("Event loop stopped".to_string()))?
    }

    /// Publish `message` on the send topic with the configured QoS and retained flag
    pub async fn publish(&self, message: &str) -> Result<(), MqttError> {
        self.check_connection_state()?;

        let outgoing = EventRouter::build_publish(&self.config, message)?;
        let ack = self.acks.lock().await.expect_publish(outgoing.qos);

        self.client
            .publish(
                outgoing.topic.as_str(),
                outgoing.qos,
                outgoing.retain,
                outgoing.payload,
            )
            .await
            .map_err(|e| MqttError::PublishFailed(Box::new(e)))?;
        Self::await_ack(ack).await?;

        info!(
            topic = %outgoing.topic,
            qos = ?outgoing.qos,
            retain = outgoing.retain,
            "Sent to topic"
        );
        Ok(())
    }

    /// Install `handler` and subscribe to the receive topic filter
    pub async fn set_subscribe(&self, handler: Arc<dyn MessageHandler>) -> Result<(), MqttError> {
        *self.handler.write().await = Some(handler);
        self.subscribe_receive_topic().await
    }

    async fn subscribe_receive_topic(&self) -> Result<(), MqttError> {
        self.check_connection_state()?;

        let filter = self.config.receive_topic.as_str();
        let qos = qos_from_level(self.config.qos)?;
        let ack = self.acks.lock().await.expect_subscribe(filter);

        self.client.subscribe(filter, qos).await.map_err(|e| {
            MqttError::SubscriptionFailed(format!("Failed to subscribe to {filter}: {e}").into())
        })?;
        Self::await_ack(ack).await?;

        info!(filter = %filter, qos = ?qos, "Subscribed to topic filter");
        Ok(())
    }

    /// Send DISCONNECT and stop the event loop. A no-op before `connect()`.
    pub async fn disconnect(&mut self) -> Result<(), MqttError> {
        let Some(state_tx) = &self.state_tx else {
            return Ok(());
        };
        let _ = state_tx.send(ConnectionState::Disconnected(
            "Client disconnected".to_string(),
        ));

        self.client
            .disconnect()
            .await
            .map_err(|e| MqttError::ConnectionFailed(Box::new(e)))?;

        if let Some(handle) = self.event_loop_handle.take() {
            let abort = handle.abort_handle();
            match tokio::time::timeout(Duration::from_secs(2), handle).await {
                Ok(Ok(())) => debug!("Event loop task shut down gracefully"),
                Ok(Err(e)) if !e.is_cancelled() => warn!("Event loop task ended with error: {}", e),
                Err(_) => {
                    warn!("Event loop task didn't shut down gracefully, aborting");
                    abort.abort();
                }
                _ => {}
            }
        }

        info!("MQTT client disconnected");
        Ok(())
    }
}

#[async_trait]
impl Transport for MqttClient {
    type Error = MqttError;

    async fn connect(&mut self) -> Result<(), Self::Error> {
        MqttClient::connect(self).await
    }

    async fn publish(&self, message: &str) -> Result<(), Self::Error> {
        MqttClient::publish(self, message).await
    }

    async fn set_subscribe(&self, handler: Arc<dyn MessageHandler>) -> Result<(), Self::Error> {
        MqttClient::set_subscribe(self, handler).await
    }

    async fn disconnect(&mut self) -> Result<(), Self::Error> {
        MqttClient::disconnect(self).await
    }

    fn is_connected(&self) -> bool {
        MqttClient::is_connected(self)
    }
}

impl Drop for MqttClient {
    fn drop(&mut self) {
        if let Some(handle) = self.event_loop_handle.take() {
            handle.abort();
        }
    }
}

//! Pure message routing and processing logic for MQTT events
//!
//! This module contains pure functions for classifying rumqttc events and
//! building outgoing publishes, plus the handler seam for inbound messages.

use crate::config::MqttSection;
use rumqttc::{ConnectReturnCode, Event, Outgoing, Packet, QoS, SubscribeReasonCode};
use std::borrow::Cow;
use tracing::info;

use super::connection::{qos_from_level, MqttError};

/// Inbound application message as delivered to a [`MessageHandler`]
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
    pub retain: bool,
}

impl ReceivedMessage {
    /// Payload as text, invalid UTF-8 replaced
    pub fn payload_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

/// Callback for inbound messages.
///
/// Runs on the event loop task, concurrently with publishing. Implementations
/// must not block for long: no other packet is processed while it runs.
pub trait MessageHandler: Send + Sync {
    fn on_message(&self, message: &ReceivedMessage);
}

impl<F> MessageHandler for F
where
    F: Fn(&ReceivedMessage) + Send + Sync,
{
    fn on_message(&self, message: &ReceivedMessage) {
        self(message)
    }
}

/// Logs topic and payload of every message and does nothing else
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl MessageHandler for LoggingHandler {
    fn on_message(&self, message: &ReceivedMessage) {
        info!(
            topic = %message.topic,
            payload = %message.payload_text(),
            "Received message"
        );
    }
}

/// Fully resolved publish request
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingPublish {
    pub topic: String,
    pub qos: QoS,
    pub retain: bool,
    pub payload: Vec<u8>,
}

/// Pure routing decisions based on MQTT events
pub struct EventRouter;

impl EventRouter {
    /// Route MQTT event to appropriate handler (pure routing decision)
    pub fn route_mqtt_event(event: &Event) -> EventRoute {
        match event {
            Event::Incoming(incoming) => match incoming {
                Packet::ConnAck(ack) if ack.code == ConnectReturnCode::Success => {
                    EventRoute::ConnectionAcknowledged
                }
                Packet::ConnAck(ack) => EventRoute::ConnectionRefused(format!("{:?}", ack.code)),
                Packet::Publish(publish) => EventRoute::MessageReceived(ReceivedMessage {
                    topic: publish.topic.clone(),
                    payload: publish.payload.to_vec(),
                    qos: publish.qos,
                    retain: publish.retain,
                }),
                Packet::PubAck(ack) => EventRoute::PublishConfirmed { pkid: ack.pkid },
                Packet::PubComp(comp) => EventRoute::PublishConfirmed { pkid: comp.pkid },
                Packet::SubAck(suback) => EventRoute::SubscriptionConfirmed {
                    pkid: suback.pkid,
                    return_codes: suback.return_codes.clone(),
                },
                Packet::Disconnect => EventRoute::Disconnected,
                other => EventRoute::InfrastructureEvent(format!("{other:?}")),
            },
            Event::Outgoing(Outgoing::Publish(pkid)) => EventRoute::PublishSent { pkid: *pkid },
            Event::Outgoing(Outgoing::Subscribe(pkid)) => {
                EventRoute::SubscribeSent { pkid: *pkid }
            }
            Event::Outgoing(_) => EventRoute::OutgoingEvent,
        }
    }

    /// Build the publish for `message` from config (pure function).
    /// Topic, QoS and retained flag are taken as configured.
    pub fn build_publish(config: &MqttSection, message: &str) -> Result<OutgoingPublish, MqttError> {
        Ok(OutgoingPublish {
            topic: config.send_topic.clone(),
            qos: qos_from_level(config.qos)?,
            retain: config.retained,
            payload: message.as_bytes().to_vec(),
        })
    }

    /// Validate subscription success from SubAck (pure function)
    pub fn subscription_succeeded(return_codes: &[SubscribeReasonCode]) -> bool {
        !return_codes.is_empty()
            && return_codes
                .iter()
                .all(|code| matches!(code, SubscribeReasonCode::Success(_)))
    }
}

/// Routing decisions for MQTT events
#[derive(Debug, Clone, PartialEq)]
pub enum EventRoute {
    /// Connection acknowledged - ready to publish/subscribe
    ConnectionAcknowledged,
    /// CONNACK with a failure return code
    ConnectionRefused(String),
    /// Message received on subscribed topic
    MessageReceived(ReceivedMessage),
    /// PUBLISH written to the socket
    PublishSent { pkid: u16 },
    /// PUBACK (QoS 1) or PUBCOMP (QoS 2)
    PublishConfirmed { pkid: u16 },
    /// SUBSCRIBE written to the socket
    SubscribeSent { pkid: u16 },
    /// Subscription confirmed with return codes
    SubscriptionConfirmed {
        pkid: u16,
        return_codes: Vec<SubscribeReasonCode>,
    },
    /// MQTT broker disconnected
    Disconnected,
    /// Infrastructure event (PingResp, PubRec, etc.)
    InfrastructureEvent(String),
    /// Other outgoing event (handled automatically)
    OutgoingEvent,
}

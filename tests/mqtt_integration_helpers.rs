//! MQTT Integration Test Helpers
//!
//! Provides helper utilities for integration tests with MQTT broker.
//! Broker-backed tests assume a broker at localhost:1883 and are ignored by default.

#![allow(dead_code)]

use mqtt_pubsub::config::MqttSection;

/// MQTT broker URL for broker-backed tests
pub const MQTT_BROKER_URL: &str = "tcp://localhost:1883";
pub const MQTT_BROKER_PORT: u16 = 1883;

/// Address where nothing listens, so connecting fails fast
pub const UNREACHABLE_BROKER_URL: &str = "tcp://127.0.0.1:1";

/// Create MQTT config pointing to localhost broker
pub fn mqtt_config(client_id: &str) -> MqttSection {
    MqttSection {
        server: MQTT_BROKER_URL.to_string(),
        client_id: client_id.to_string(),
        ..MqttSection::default()
    }
}

/// Create MQTT config with publish topic and subscribe filter under a unique prefix
pub fn mqtt_config_with_topics(client_id: &str, send_topic: &str, filter: &str) -> MqttSection {
    MqttSection {
        send_topic: send_topic.to_string(),
        receive_topic: filter.to_string(),
        ..mqtt_config(client_id)
    }
}

/// Topic prefix unique to this process, so parallel runs do not see each other
pub fn unique_prefix(test_name: &str) -> String {
    format!("MQTT-test-{}-{}", std::process::id(), test_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mqtt_config_uses_localhost() {
        let config = mqtt_config("helper-client");
        assert_eq!(config.server, "tcp://localhost:1883");
        assert_eq!(config.client_id, "helper-client");
    }

    #[test]
    fn test_mqtt_config_with_topics() {
        let config = mqtt_config_with_topics("helper-client", "a/b", "a/#");
        assert_eq!(config.send_topic, "a/b");
        assert_eq!(config.receive_topic, "a/#");
        assert_eq!(config.server, MQTT_BROKER_URL);
    }
}

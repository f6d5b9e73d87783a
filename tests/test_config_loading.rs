//! Configuration loading and validation tests
//!
//! Tests focus on BEHAVIOR of configuration loading, validation, and error handling.

use mqtt_pubsub::config::{
    validate_topic_filter, validate_topic_name, AppConfig, BrokerAddress, BrokerScheme,
    ConfigError,
};
use proptest::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "{contents}").unwrap();
    temp_file
}

#[test]
fn test_config_loads_successfully_from_valid_toml() {
    let temp_file = write_config(
        r#"
[mqtt]
server = "ssl://broker.example.com:8883"
send_topic = "MQTT/Gateway/Update/status"
receive_topic = "MQTT/+/Update/#"
qos = 1
retained = true
client_id = "gateway-1"
username = "operator"
password = "hunter2"
tls_verify = true
keep_alive_secs = 60

[publisher]
interval_secs = 10
message = "still here"
"#,
    );

    let config = AppConfig::load_from_file(temp_file.path()).unwrap();

    assert_eq!(config.mqtt.server, "ssl://broker.example.com:8883");
    assert_eq!(config.mqtt.send_topic, "MQTT/Gateway/Update/status");
    assert_eq!(config.mqtt.qos, 1);
    assert!(config.mqtt.retained);
    assert_eq!(config.mqtt.client_id, "gateway-1");
    assert_eq!(config.mqtt.credentials(), Some(("operator", "hunter2")));
    assert!(config.mqtt.tls_verify);
    assert_eq!(config.mqtt.keep_alive_secs, 60);
    assert_eq!(config.publisher.interval_secs, 10);
    assert_eq!(config.publisher.message, "still here");
}

#[test]
fn test_missing_fields_take_defaults() {
    let temp_file = write_config(
        r#"
[mqtt]
server = "tcp://10.1.2.3:1884"
"#,
    );

    let config = AppConfig::load_from_file(temp_file.path()).unwrap();

    assert_eq!(config.mqtt.server, "tcp://10.1.2.3:1884");
    assert_eq!(config.mqtt.send_topic, "MQTT/Client/Update/TEST");
    assert_eq!(config.mqtt.receive_topic, "MQTT/+/Update/#");
    assert_eq!(config.mqtt.qos, 0);
    assert!(!config.mqtt.client_id.is_empty());
    assert_eq!(config.mqtt.credentials(), None);
    assert_eq!(config.publisher.interval_secs, 5);
    assert_eq!(config.publisher.message, "test massage");
}

#[test]
fn test_empty_file_is_valid() {
    let temp_file = write_config("");
    let config = AppConfig::load_from_file(temp_file.path()).unwrap();
    assert_eq!(config.mqtt.server, "tcp://localhost:1883");
}

#[test]
fn test_missing_file_is_read_error() {
    let result = AppConfig::load_from_file(std::path::Path::new("/nonexistent/mqtt.toml"));
    assert!(matches!(result, Err(ConfigError::FileRead(_))));
}

#[test]
fn test_malformed_toml_is_parse_error() {
    let temp_file = write_config("[mqtt\nserver = ");
    let result = AppConfig::load_from_file(temp_file.path());
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_invalid_values_are_rejected_on_load() {
    let cases = [
        ("[mqtt]\nqos = 4\n", "qos"),
        ("[mqtt]\nserver = \"http://localhost\"\n", "scheme"),
        ("[mqtt]\nsend_topic = \"a/+/b\"\n", "publish wildcard"),
        ("[mqtt]\nreceive_topic = \"a/#/b\"\n", "filter"),
        ("[mqtt]\nclient_id = \"\"\n", "client id"),
        ("[publisher]\ninterval_secs = 0\n", "interval"),
    ];

    for (contents, case) in cases {
        let temp_file = write_config(contents);
        assert!(
            AppConfig::load_from_file(temp_file.path()).is_err(),
            "expected {case} to be rejected"
        );
    }
}

#[test]
fn test_password_without_username_sends_no_credentials() {
    let temp_file = write_config("[mqtt]\npassword = \"orphan\"\n");
    let config = AppConfig::load_from_file(temp_file.path()).unwrap();
    assert_eq!(config.mqtt.credentials(), None);
}

#[test]
fn test_redacted_toml_hides_password_and_round_trips() {
    let mut config = AppConfig::default();
    config.mqtt.username = "operator".to_string();
    config.mqtt.password = "hunter2".to_string();

    let rendered = config.to_redacted_toml().unwrap();
    assert!(!rendered.contains("hunter2"));
    assert!(rendered.contains("operator"));

    let reloaded: AppConfig = toml::from_str(&rendered).unwrap();
    assert_eq!(reloaded.mqtt.server, config.mqtt.server);
    assert_eq!(reloaded.mqtt.password, "***");
}

#[test]
fn test_ipv6_broker_host() {
    let address = BrokerAddress::parse("mqtt://[::1]:1883").unwrap();
    assert_eq!(address.scheme, BrokerScheme::Tcp);
    assert_eq!(address.host, "::1");
    assert_eq!(address.port, 1883);
}

proptest! {
    #[test]
    fn any_plain_level_path_is_valid_topic_and_filter(
        levels in prop::collection::vec("[A-Za-z0-9_-]{1,8}", 1..6)
    ) {
        let topic = levels.join("/");
        prop_assert!(validate_topic_name(&topic).is_ok());
        prop_assert!(validate_topic_filter(&topic).is_ok());

        let wildcard = format!("{topic}/#");
        prop_assert!(validate_topic_filter(&wildcard).is_ok());
        prop_assert!(validate_topic_name(&wildcard).is_err());
    }

    #[test]
    fn hash_before_last_level_is_rejected(
        head in "[a-z]{1,6}",
        tail in "[a-z]{1,6}"
    ) {
        let filter = format!("{head}/#/{tail}");
        prop_assert!(validate_topic_filter(&filter).is_err());
    }

    #[test]
    fn qos_above_two_is_rejected(qos in 3u8..=255) {
        let mut config = AppConfig::default();
        config.mqtt.qos = qos;
        prop_assert!(matches!(config.validate(), Err(ConfigError::InvalidQos(q)) if q == qos));
    }

    #[test]
    fn tcp_port_survives_parsing(port in 1u16..=65535) {
        let address = BrokerAddress::parse(&format!("tcp://broker.local:{port}")).unwrap();
        prop_assert_eq!(address.port, port);
    }
}

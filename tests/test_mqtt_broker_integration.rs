//! Integration Tests with Real MQTT Broker
//!
//! Requires a broker on localhost:1883, for example
//! `docker run -p 1883:1883 eclipse-mosquitto:2 mosquitto -c /mosquitto-no-auth.conf`.
//! Run with `cargo test -- --ignored`.
//!
//! These tests validate:
//! - Connection to real broker
//! - Message publishing and subscription
//! - QoS 1 and 2 acknowledgement waits

mod mqtt_integration_helpers;

use mqtt_integration_helpers::{mqtt_config, mqtt_config_with_topics, unique_prefix};
use mqtt_pubsub::publisher::PublishLoop;
use mqtt_pubsub::transport::mqtt::{MessageHandler, MqttClient, ReceivedMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

fn channel_handler() -> (Arc<dyn MessageHandler>, mpsc::UnboundedReceiver<ReceivedMessage>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handler: Arc<dyn MessageHandler> = Arc::new(move |message: &ReceivedMessage| {
        let _ = tx.send(message.clone());
    });
    (handler, rx)
}

#[tokio::test]
#[ignore = "requires MQTT broker on localhost:1883"]
async fn test_connect_to_real_broker() {
    let mut client = MqttClient::new(mqtt_config("it-connect")).expect("valid config");

    let result = client.connect().await;

    assert!(result.is_ok(), "Should connect to real broker: {result:?}");
    assert!(client.is_connected(), "Client should report connected");

    client.disconnect().await.expect("clean disconnect");
    assert!(!client.is_connected());
}

#[tokio::test]
#[ignore = "requires MQTT broker on localhost:1883"]
async fn test_publish_is_seen_by_external_subscriber() {
    let prefix = unique_prefix("external");
    let send_topic = format!("{prefix}/Client/Update/TEST");

    // Observer subscribes to the publisher's topic
    let (observer_handler, mut received) = channel_handler();
    let mut observer = MqttClient::new(mqtt_config_with_topics(
        "it-observer",
        &format!("{prefix}/observer"),
        &format!("{prefix}/#"),
    ))
    .unwrap();
    observer.connect().await.unwrap();
    observer.set_subscribe(observer_handler).await.unwrap();

    let mut publisher = MqttClient::new(mqtt_config_with_topics(
        "it-publisher",
        &send_topic,
        &format!("{prefix}/none"),
    ))
    .unwrap();
    publisher.connect().await.unwrap();
    publisher.publish("test massage").await.unwrap();

    let message = timeout(Duration::from_secs(5), received.recv())
        .await
        .expect("message within 5s")
        .expect("channel open");
    assert_eq!(message.topic, send_topic);
    assert_eq!(message.payload_text(), "test massage");

    let _ = publisher.disconnect().await;
    let _ = observer.disconnect().await;
}

#[tokio::test]
#[ignore = "requires MQTT broker on localhost:1883"]
async fn test_client_receives_its_own_publish_through_filter() {
    let prefix = unique_prefix("loopback");
    for qos in [0u8, 1, 2] {
        let mut config = mqtt_config_with_topics(
            &format!("it-loopback-{qos}"),
            &format!("{prefix}/Client/Update/q{qos}"),
            &format!("{prefix}/+/Update/#"),
        );
        config.qos = qos;

        let (handler, mut received) = channel_handler();
        let mut client = MqttClient::new(config).unwrap();
        client.connect().await.unwrap();
        client.set_subscribe(handler).await.unwrap();
        client.publish("test massage").await.unwrap();

        let message = timeout(Duration::from_secs(5), received.recv())
            .await
            .expect("message within 5s")
            .expect("channel open");
        assert_eq!(message.topic, format!("{prefix}/Client/Update/q{qos}"));
        assert_eq!(message.payload, b"test massage".to_vec());

        let _ = client.disconnect().await;
    }
}

#[tokio::test]
#[ignore = "requires MQTT broker on localhost:1883"]
async fn test_publish_loop_against_real_broker() {
    let prefix = unique_prefix("loop");
    let send_topic = format!("{prefix}/Client/Update/TEST");

    let (observer_handler, mut received) = channel_handler();
    let mut observer = MqttClient::new(mqtt_config_with_topics(
        "it-loop-observer",
        &format!("{prefix}/observer"),
        &send_topic,
    ))
    .unwrap();
    observer.connect().await.unwrap();
    observer.set_subscribe(observer_handler).await.unwrap();

    let client = MqttClient::new(mqtt_config_with_topics(
        "it-loop",
        &send_topic,
        &format!("{prefix}/+/Update/#"),
    ))
    .unwrap();
    let (handler, _own) = channel_handler();
    let mut publish_loop = PublishLoop::new(client, Duration::from_secs(1), "test massage");
    publish_loop.start(handler).await.unwrap();

    let published = publish_loop
        .run_until(tokio::time::sleep(Duration::from_millis(2500)))
        .await
        .unwrap();
    assert_eq!(published, 2);

    for _ in 0..2 {
        let message = timeout(Duration::from_secs(5), received.recv())
            .await
            .expect("message within 5s")
            .expect("channel open");
        assert_eq!(message.payload_text(), "test massage");
    }

    publish_loop.shutdown().await.unwrap();
    let _ = observer.disconnect().await;
}

// MIT License - Copyright (c) 2026 Peter Wright
// MQTT adapters for both sides of the reconciler

pub mod messages;
pub mod sink;
pub mod station;

use rumqttc::{AsyncClient, QoS};
use serde::Serialize;
use tracing::error;

use crate::error::{BridgeError, Result};

pub use sink::MqttPresentationSink;
pub use station::MqttStationClient;

/// Topic layout of the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    /// Base topic for presentation pushes and command acks
    pub publish: String,
    /// Front-end command topic
    pub subscribe: String,
    /// Base topic of the external station client
    pub station: String,
}

impl Topics {
    /// Where presentation updates for a station go.
    pub fn presentation(&self, serial: &str) -> String {
        format!("{}/{serial}", self.publish)
    }

    pub fn station_events(&self, serial: &str) -> String {
        format!("{}/{serial}/event", self.station)
    }

    pub fn station_set(&self, serial: &str) -> String {
        format!("{}/{serial}/set", self.station)
    }

    /// Wildcard filter covering all station event topics.
    pub fn station_events_filter(&self) -> String {
        format!("{}/+/event", self.station)
    }

    /// Extract the station serial from an event topic.
    pub fn serial_from_event_topic<'a>(&self, topic: &'a str) -> Option<&'a str> {
        let rest = topic.strip_prefix(self.station.as_str())?.strip_prefix('/')?;
        let serial = rest.strip_suffix("/event")?;
        if serial.is_empty() || serial.contains('/') {
            return None;
        }
        Some(serial)
    }
}

/// Serialize and publish, returning any failure.
pub async fn try_publish_json(
    client: &AsyncClient,
    topic: &str,
    payload: &impl Serialize,
    retain: bool,
) -> Result<()> {
    let json = serde_json::to_string(payload)?;
    client
        .publish(topic, QoS::AtLeastOnce, retain, json)
        .await
        .map_err(BridgeError::from)
}

/// Serialize and publish, logging any failure.
pub async fn publish_json(client: &AsyncClient, topic: &str, payload: &impl Serialize, retain: bool) {
    if let Err(e) = try_publish_json(client, topic, payload, retain).await {
        error!("Failed to publish to {topic}: {e}");
    }
}

/// Parse an MQTT URL like "mqtt://host:port" into (host, port).
pub fn parse_mqtt_url(url: &str) -> Option<(String, u16)> {
    let stripped = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    let (host, port_str) = stripped.rsplit_once(':')?;
    if host.is_empty() {
        return None;
    }
    let port: u16 = port_str.parse().ok()?;

    Some((host.to_string(), port))
}

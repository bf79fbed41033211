// MIT License - Copyright (c) 2026 Peter Wright
// Presentation sink publishing to MQTT

use rumqttc::AsyncClient;
use tracing::debug;

use crate::mode::PresentationValue;
use crate::mqtt::messages::{MqttFaultEvent, MqttStateUpdate};
use crate::mqtt::{publish_json, Topics};
use crate::sink::{PresentationSink, StatusFault};

/// Publishes a station's state pushes on `{publish_topic}/{serial}`.
#[derive(Clone)]
pub struct MqttPresentationSink {
    serial: String,
    topic: String,
    client: AsyncClient,
}

impl MqttPresentationSink {
    pub fn new(serial: impl Into<String>, client: AsyncClient, topics: &Topics) -> Self {
        let serial = serial.into();
        Self {
            topic: topics.presentation(&serial),
            serial,
            client,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl PresentationSink for MqttPresentationSink {
    async fn update_current_state(&self, value: PresentationValue) {
        debug!("{}: push current state {value}", self.serial);
        let msg = MqttStateUpdate::current(&self.serial, value);
        publish_json(&self.client, &self.topic, &msg, false).await;
    }

    async fn update_target_state(&self, value: PresentationValue) {
        debug!("{}: push target state {value}", self.serial);
        let msg = MqttStateUpdate::target(&self.serial, value);
        publish_json(&self.client, &self.topic, &msg, false).await;
    }

    async fn update_status_fault(&self, fault: StatusFault) {
        debug!("{}: push status fault {fault:?}", self.serial);
        let msg = MqttFaultEvent::new(&self.serial, fault);
        publish_json(&self.client, &self.topic, &msg, false).await;
    }
}

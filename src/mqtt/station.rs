// MIT License - Copyright (c) 2026 Peter Wright
// Station client reached through MQTT

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rumqttc::AsyncClient;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{BridgeError, Result};
use crate::event::{event_channel, EventReceiver, EventSender, StationEvent};
use crate::mode::GuardMode;
use crate::mqtt::messages::{parse_station_message, MqttGuardModeCommand, StationUpdate};
use crate::mqtt::{try_publish_json, Topics};
use crate::station::StationClient;

/// Talks to an external eufy client that mirrors a station onto MQTT.
///
/// Incoming messages are fed through [`ingest`](Self::ingest); the live guard
/// mode is whatever the station last reported as its current mode.
#[derive(Clone)]
pub struct MqttStationClient {
    serial: String,
    set_topic: String,
    client: AsyncClient,
    event_tx: EventSender,
    live_mode: Arc<RwLock<Option<GuardMode>>>,
    connected: Arc<AtomicBool>,
}

impl MqttStationClient {
    pub fn new(serial: impl Into<String>, client: AsyncClient, topics: &Topics) -> Self {
        let serial = serial.into();
        let (event_tx, _event_rx) = event_channel(256);
        Self {
            set_topic: topics.station_set(&serial),
            serial,
            client,
            event_tx,
            live_mode: Arc::new(RwLock::new(None)),
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Subscribe to station events.
    pub fn subscribe(&self) -> EventReceiver {
        self.event_tx.subscribe()
    }

    /// Hand an event to the reconciler. Fails when nothing is subscribed.
    fn forward(&self, event: StationEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .map(|_| ())
            .map_err(|_| BridgeError::ChannelClosed)
    }

    /// Handle a raw payload from the station's event topic.
    pub async fn ingest(&self, payload: &[u8]) {
        let update = match parse_station_message(payload) {
            Ok(update) => update,
            Err(e) => {
                warn!("{}: dropping station message: {e}", self.serial);
                return;
            }
        };

        match update {
            StationUpdate::Connected => {
                if !self.connected.swap(true, Ordering::SeqCst) {
                    info!("{}: station connected", self.serial);
                }
            }
            StationUpdate::Disconnected => {
                if self.connected.swap(false, Ordering::SeqCst) {
                    warn!("{}: station disconnected", self.serial);
                }
            }
            StationUpdate::Event(event) => {
                if let StationEvent::CurrentModeChanged { mode } = event {
                    *self.live_mode.write().await = Some(mode);
                }
                if let Err(e) = self.forward(event) {
                    debug!("{}: event not delivered: {e}", self.serial);
                }
            }
        }
    }
}

impl StationClient for MqttStationClient {
    async fn guard_mode(&self) -> Result<GuardMode> {
        let mode = *self.live_mode.read().await;
        mode.ok_or_else(|| BridgeError::NoReading {
            serial: self.serial.clone(),
        })
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn set_guard_mode(&self, mode: GuardMode) -> Result<()> {
        debug!("{}: publishing SET_GUARD_MODE {mode} to {}", self.serial, self.set_topic);
        try_publish_json(&self.client, &self.set_topic, &MqttGuardModeCommand::new(mode), false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rumqttc::MqttOptions;

    fn client() -> (MqttStationClient, rumqttc::EventLoop) {
        let topics = Topics {
            publish: "eufy".to_string(),
            subscribe: "eufy/cmd".to_string(),
            station: "eufy-station".to_string(),
        };
        let (client, eventloop) = AsyncClient::new(MqttOptions::new("test", "localhost", 1883), 10);
        (MqttStationClient::new("T8010", client, &topics), eventloop)
    }

    #[tokio::test]
    async fn test_no_reading_before_current_mode() {
        let (station, _eventloop) = client();
        assert!(matches!(
            station.guard_mode().await,
            Err(BridgeError::NoReading { .. })
        ));
    }

    #[tokio::test]
    async fn test_current_mode_updates_live_mode_and_forwards() {
        let (station, _eventloop) = client();
        let mut rx = station.subscribe();

        station.ingest(br#"{"op":"CURRENT_MODE","mode":0}"#).await;
        assert_eq!(station.guard_mode().await.unwrap(), GuardMode(0));
        assert_eq!(
            rx.recv().await.unwrap(),
            StationEvent::CurrentModeChanged { mode: GuardMode(0) }
        );

        // Target changes do not move the live mode
        station.ingest(br#"{"op":"GUARD_MODE","mode":63}"#).await;
        assert_eq!(station.guard_mode().await.unwrap(), GuardMode(0));
        assert_eq!(
            rx.recv().await.unwrap(),
            StationEvent::GuardModeChanged { mode: GuardMode(63) }
        );
    }

    #[tokio::test]
    async fn test_connectivity() {
        let (station, _eventloop) = client();
        assert!(!station.is_connected());
        station.ingest(br#"{"op":"CONNECTED"}"#).await;
        assert!(station.is_connected());
        station.ingest(br#"{"op":"DISCONNECTED"}"#).await;
        assert!(!station.is_connected());
    }

    #[tokio::test]
    async fn test_malformed_message_dropped() {
        let (station, _eventloop) = client();
        let mut rx = station.subscribe();
        station.ingest(b"{").await;
        station.ingest(br#"{"op":"ALARM_EVENT"}"#).await;
        station.ingest(br#"{"op":"ALARM_EVENT","code":8}"#).await;
        assert_eq!(rx.recv().await.unwrap(), StationEvent::AlarmEvent { code: 8 });
    }

    #[tokio::test]
    async fn test_forward_without_subscriber_is_channel_closed() {
        let (station, _eventloop) = client();
        assert!(matches!(
            station.forward(StationEvent::AlarmEvent { code: 8 }),
            Err(BridgeError::ChannelClosed)
        ));

        // Live mode still tracks the station with nobody listening
        station.ingest(br#"{"op":"CURRENT_MODE","mode":3}"#).await;
        assert_eq!(station.guard_mode().await.unwrap(), GuardMode(3));

        let mut rx = station.subscribe();
        assert!(station.forward(StationEvent::AlarmEvent { code: 16 }).is_ok());
        assert_eq!(rx.recv().await.unwrap(), StationEvent::AlarmEvent { code: 16 });
    }

    #[tokio::test]
    async fn test_set_guard_mode_queues_publish() {
        let (station, _eventloop) = client();
        assert!(station.set_guard_mode(GuardMode(3)).await.is_ok());
    }
}

// MIT License - Copyright (c) 2026 Peter Wright
//
//! # eufy-station-bridge
//!
//! Reconciles a eufy station's guard mode with a four-state security system
//! (Home / Away / Night / Disarmed, plus Alarm Triggered as a current state).
//!
//! The [`GuardModeReconciler`] sits between a [`StationClient`] that reports
//! guard mode changes and alarm events, and a [`PresentationSink`] that
//! displays state. The [`mqtt`] module provides both sides over MQTT.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use eufy_station_bridge::mqtt::{MqttPresentationSink, MqttStationClient, Topics};
//! use eufy_station_bridge::{GuardModeReconciler, SecurityState, StationConfig};
//! use rumqttc::{AsyncClient, MqttOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let topics = Topics {
//!         publish: "eufy".to_string(),
//!         subscribe: "eufy/cmd".to_string(),
//!         station: "eufy-station".to_string(),
//!     };
//!     let (client, _eventloop) = AsyncClient::new(MqttOptions::new("bridge", "localhost", 1883), 64);
//!
//!     let config = StationConfig::builder().serial("T8010P1234").name("HomeBase").build();
//!     let station = MqttStationClient::new("T8010P1234", client.clone(), &topics);
//!     let sink = MqttPresentationSink::new("T8010P1234", client, &topics);
//!
//!     let events = station.subscribe();
//!     let reconciler = Arc::new(GuardModeReconciler::new(config, station, sink));
//!     let runner = Arc::clone(&reconciler);
//!     tokio::spawn(async move { runner.run(events).await });
//!
//!     reconciler.set_target_state(SecurityState::Night.into()).await;
//!     Ok(())
//! }
//! ```

pub mod alarm;
pub mod config;
pub mod error;
pub mod event;
pub mod mode;
pub mod mqtt;
pub mod reconciler;
pub mod sink;
pub mod station;

// Re-exports for convenience
pub use alarm::{AlarmClear, AlarmEvent, AlarmTrigger};
pub use config::{GuardModeConfig, StationConfig, StationConfigBuilder, StationInfo};
pub use error::{BridgeError, Result};
pub use event::{EventReceiver, StationEvent};
pub use mode::{GuardMode, ModeMapping, PresentationValue, SecurityState};
pub use reconciler::{AlarmPhase, GuardModeReconciler, ReconcilerState};
pub use sink::{PresentationSink, StatusFault};
pub use station::StationClient;

// MIT License - Copyright (c) 2026 Peter Wright
// MQTT JSON types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::StationInfo;
use crate::error::{BridgeError, Result};
use crate::event::StationEvent;
use crate::mode::{GuardMode, PresentationValue};
use crate::sink::StatusFault;

pub fn now_epoch_ms() -> u64 {
    epoch_ms(Utc::now())
}

/// Milliseconds since the epoch; clocks set before 1970 read as 0.
fn epoch_ms(time: DateTime<Utc>) -> u64 {
    u64::try_from(time.timestamp_millis()).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Station side
// ---------------------------------------------------------------------------

/// Message published by the external station client on `{station_topic}/{serial}/event`.
#[derive(Debug, Deserialize)]
pub struct StationMessage {
    pub op: String,
    #[serde(default)]
    pub mode: Option<i32>,
    #[serde(default)]
    pub code: Option<i32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default, rename = "type")]
    pub property_type: Option<u32>,
    #[serde(default)]
    pub modified: Option<u64>,
}

/// What a station message means to the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum StationUpdate {
    Event(StationEvent),
    Connected,
    Disconnected,
}

fn missing(op: &str, field: &str) -> BridgeError {
    BridgeError::InvalidMessage {
        details: format!("{op}: missing {field}"),
    }
}

impl StationMessage {
    pub fn into_update(self) -> Result<StationUpdate> {
        let op = self.op.as_str();
        let update = match op {
            "GUARD_MODE" => {
                let mode = self.mode.ok_or_else(|| missing(op, "mode"))?;
                StationUpdate::Event(StationEvent::GuardModeChanged { mode: GuardMode(mode) })
            }
            "CURRENT_MODE" => {
                let mode = self.mode.ok_or_else(|| missing(op, "mode"))?;
                StationUpdate::Event(StationEvent::CurrentModeChanged { mode: GuardMode(mode) })
            }
            "ALARM_EVENT" => {
                let code = self.code.ok_or_else(|| missing(op, "code"))?;
                StationUpdate::Event(StationEvent::AlarmEvent { code })
            }
            "PROPERTY_CHANGED" => {
                let name = self.name.ok_or_else(|| missing(op, "name"))?;
                StationUpdate::Event(StationEvent::PropertyChanged {
                    name,
                    value: self.value.unwrap_or(serde_json::Value::Null),
                })
            }
            "RAW_PROPERTY_CHANGED" => {
                let property_type = self.property_type.ok_or_else(|| missing(op, "type"))?;
                let value = match self.value {
                    Some(serde_json::Value::String(s)) => s,
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                StationUpdate::Event(StationEvent::RawPropertyChanged {
                    property_type,
                    value,
                    modified: self.modified.unwrap_or(0),
                })
            }
            "CONNECTED" => StationUpdate::Connected,
            "DISCONNECTED" => StationUpdate::Disconnected,
            other => {
                return Err(BridgeError::InvalidMessage {
                    details: format!("unknown op: {other}"),
                });
            }
        };
        Ok(update)
    }
}

/// Parse a raw station payload.
pub fn parse_station_message(payload: &[u8]) -> Result<StationUpdate> {
    let msg: StationMessage = serde_json::from_slice(payload)?;
    msg.into_update()
}

/// Command sent to the external station client on `{station_topic}/{serial}/set`.
#[derive(Debug, Serialize)]
pub struct MqttGuardModeCommand {
    pub now: u64,
    pub op: String,
    pub mode: i32,
}

impl MqttGuardModeCommand {
    pub fn new(mode: GuardMode) -> Self {
        Self {
            now: now_epoch_ms(),
            op: "SET_GUARD_MODE".to_string(),
            mode: mode.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Presentation side
// ---------------------------------------------------------------------------

// Published messages share the {now, op, ...} flat structure

/// Current or target state push.
#[derive(Debug, Serialize)]
pub struct MqttStateUpdate {
    pub now: u64,
    pub op: String,
    pub station: String,
    pub state: i32,
    #[serde(skip_serializing_if = "Option::is_none", rename = "stateName")]
    pub state_name: Option<String>,
}

impl MqttStateUpdate {
    fn new(op: &str, station: &str, value: PresentationValue) -> Self {
        Self {
            now: now_epoch_ms(),
            op: op.to_string(),
            station: station.to_string(),
            state: value.code(),
            state_name: value.state().map(|s| s.name().to_string()),
        }
    }

    pub fn current(station: &str, value: PresentationValue) -> Self {
        Self::new("CURRENT_STATE", station, value)
    }

    pub fn target(station: &str, value: PresentationValue) -> Self {
        Self::new("TARGET_STATE", station, value)
    }
}

#[derive(Debug, Serialize)]
pub struct MqttFaultEvent {
    pub now: u64,
    pub op: String,
    pub station: String,
    pub fault: u8,
}

impl MqttFaultEvent {
    pub fn new(station: &str, fault: StatusFault) -> Self {
        Self {
            now: now_epoch_ms(),
            op: "STATUS_FAULT".to_string(),
            station: station.to_string(),
            fault: fault.code(),
        }
    }
}

/// Retained per-station snapshot.
#[derive(Debug, Serialize)]
pub struct MqttStationState {
    pub now: u64,
    pub op: String,
    pub station: String,
    pub name: String,
    pub manufacturer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware: Option<String>,
    /// `None` when the live read failed
    pub current: Option<i32>,
    pub target: i32,
    pub alarm: bool,
    pub fault: bool,
}

impl MqttStationState {
    pub fn new(
        info: &StationInfo,
        current: Option<PresentationValue>,
        target: PresentationValue,
        alarm: bool,
        fault: bool,
    ) -> Self {
        Self {
            now: now_epoch_ms(),
            op: "STATE".to_string(),
            station: info.serial.clone(),
            name: info.name.clone(),
            manufacturer: info.manufacturer.clone(),
            model: info.model.clone(),
            firmware: info.firmware.clone(),
            current: current.map(|v| v.code()),
            target: target.code(),
            alarm,
            fault,
        }
    }
}

// CMD_ACK response
#[derive(Debug, Serialize)]
pub struct MqttCmdAck {
    pub now: u64,
    pub op: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl MqttCmdAck {
    pub fn new(
        success: bool,
        src: Option<serde_json::Value>,
        data: Option<serde_json::Value>,
    ) -> Self {
        Self {
            now: now_epoch_ms(),
            op: "CMD_ACK".to_string(),
            success,
            src,
            data,
        }
    }
}

/// Inbound front-end command (subscribed).
#[derive(Debug, Deserialize)]
pub struct MqttCommand {
    pub op: String,
    #[serde(default)]
    pub op_id: Option<String>,
    #[serde(default)]
    pub station: Option<String>,
    #[serde(default)]
    pub state: Option<i32>,
}

// Schema validation tests for MQTT wire format
//
// Outbound messages are serialized from the library types; inbound ones are
// constructed as JSON directly and also fed through the library parser.

use eufy_station_bridge::mqtt::messages::{
    parse_station_message, MqttCmdAck, MqttFaultEvent, MqttGuardModeCommand, MqttStateUpdate,
    MqttStationState, StationUpdate,
};
use eufy_station_bridge::{
    GuardMode, PresentationValue, SecurityState, StationConfig, StationEvent, StatusFault,
};
use serde_json::json;

fn load_schema(name: &str) -> serde_json::Value {
    let path = format!("{}/schemas/mqtt/{name}", env!("CARGO_MANIFEST_DIR"));
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read schema {path}: {e}"));
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("Failed to parse schema {path}: {e}"))
}

fn build_validator(schema_name: &str) -> jsonschema::Validator {
    let schema = load_schema(schema_name);
    jsonschema::validator_for(&schema)
        .unwrap_or_else(|e| panic!("Failed to compile schema {schema_name}: {e}"))
}

fn validate(schema_name: &str, instance: &serde_json::Value) {
    let validator = build_validator(schema_name);
    let errors: Vec<_> = validator.iter_errors(instance).collect();
    if !errors.is_empty() {
        let msgs: Vec<String> = errors.iter().map(|e| format!("  - {e}")).collect();
        panic!(
            "Schema validation failed for {schema_name}:\n{}\nInstance: {}",
            msgs.join("\n"),
            serde_json::to_string_pretty(instance).unwrap()
        );
    }
}

fn validate_fails(schema_name: &str, instance: &serde_json::Value) {
    let validator = build_validator(schema_name);
    assert!(
        !validator.is_valid(instance),
        "Expected schema validation to fail for {schema_name}, but it passed.\nInstance: {}",
        serde_json::to_string_pretty(instance).unwrap()
    );
}

fn to_json(value: &impl serde::Serialize) -> serde_json::Value {
    serde_json::to_value(value).unwrap()
}

// =========================================================================
// State pushes
// =========================================================================

#[test]
fn current_state_valid() {
    for state in [
        SecurityState::Home,
        SecurityState::Away,
        SecurityState::Night,
        SecurityState::Disarmed,
        SecurityState::AlarmTriggered,
    ] {
        validate(
            "state_update.schema.json",
            &to_json(&MqttStateUpdate::current("T8010P1", state.into())),
        );
    }
}

#[test]
fn target_state_valid() {
    validate(
        "state_update.schema.json",
        &to_json(&MqttStateUpdate::target("T8010P1", SecurityState::Away.into())),
    );
}

#[test]
fn unmapped_state_valid_without_name() {
    let msg = to_json(&MqttStateUpdate::current("T8010P1", PresentationValue::Unmapped(47)));
    assert!(msg.get("stateName").is_none());
    validate("state_update.schema.json", &msg);
}

#[test]
fn target_state_cannot_be_alarm() {
    validate_fails(
        "state_update.schema.json",
        &json!({
            "now": 1738900000000_u64,
            "op": "TARGET_STATE",
            "station": "T8010P1",
            "state": 4,
            "stateName": "ALARM_TRIGGERED"
        }),
    );
}

#[test]
fn state_update_rejects_extra_fields() {
    validate_fails(
        "state_update.schema.json",
        &json!({
            "now": 1738900000000_u64,
            "op": "CURRENT_STATE",
            "station": "T8010P1",
            "state": 0,
            "mode": 1
        }),
    );
}

// =========================================================================
// Fault
// =========================================================================

#[test]
fn fault_event_valid() {
    validate(
        "fault_event.schema.json",
        &to_json(&MqttFaultEvent::new("T8010P1", StatusFault::GeneralFault)),
    );
    validate(
        "fault_event.schema.json",
        &to_json(&MqttFaultEvent::new("T8010P1", StatusFault::NoFault)),
    );
}

#[test]
fn fault_event_rejects_unknown_fault() {
    validate_fails(
        "fault_event.schema.json",
        &json!({ "now": 1738900000000_u64, "op": "STATUS_FAULT", "station": "T8010P1", "fault": 2 }),
    );
}

// =========================================================================
// Snapshot
// =========================================================================

#[test]
fn station_state_valid() {
    let config = StationConfig::builder()
        .serial("T8010P1")
        .name("HomeBase")
        .model(Some("T8010".to_string()))
        .firmware(Some("3.2.4.9".to_string()))
        .build();
    let msg = MqttStationState::new(
        &config.info,
        Some(SecurityState::Night.into()),
        SecurityState::Night.into(),
        false,
        false,
    );
    validate("station_state.schema.json", &to_json(&msg));
}

#[test]
fn station_state_with_failed_read_valid() {
    let config = StationConfig::builder().serial("T8010P1").build();
    let msg = MqttStationState::new(&config.info, None, SecurityState::Home.into(), true, true);
    let json = to_json(&msg);
    assert!(json["current"].is_null());
    assert!(json.get("model").is_none());
    validate("station_state.schema.json", &json);
}

// =========================================================================
// CMD_ACK
// =========================================================================

#[test]
fn cmd_ack_valid() {
    validate(
        "cmd_ack.schema.json",
        &to_json(&MqttCmdAck::new(
            true,
            Some(json!({ "op": "SET_TARGET", "station": "T8010P1", "state": 2 })),
            None,
        )),
    );
    validate("cmd_ack.schema.json", &to_json(&MqttCmdAck::new(false, None, None)));
}

#[test]
fn cmd_ack_with_state_data_valid() {
    let config = StationConfig::builder().serial("T8010P1").build();
    let state = MqttStationState::new(&config.info, None, SecurityState::Away.into(), false, false);
    let ack = MqttCmdAck::new(true, Some(json!({ "op": "GET_STATE" })), Some(to_json(&state)));
    validate("cmd_ack.schema.json", &to_json(&ack));
}

// =========================================================================
// Station client side
// =========================================================================

#[test]
fn guard_mode_command_valid() {
    validate(
        "guard_mode_command.schema.json",
        &to_json(&MqttGuardModeCommand::new(GuardMode(63))),
    );
}

#[test]
fn station_messages_valid_and_parse() {
    let cases = [
        (
            json!({ "op": "GUARD_MODE", "mode": 0 }),
            StationUpdate::Event(StationEvent::GuardModeChanged { mode: GuardMode(0) }),
        ),
        (
            json!({ "op": "CURRENT_MODE", "mode": 3 }),
            StationUpdate::Event(StationEvent::CurrentModeChanged { mode: GuardMode(3) }),
        ),
        (
            json!({ "op": "ALARM_EVENT", "code": 16 }),
            StationUpdate::Event(StationEvent::AlarmEvent { code: 16 }),
        ),
        (
            json!({ "op": "PROPERTY_CHANGED", "name": "guardMode", "value": 63 }),
            StationUpdate::Event(StationEvent::PropertyChanged {
                name: "guardMode".to_string(),
                value: json!(63),
            }),
        ),
        (json!({ "op": "CONNECTED" }), StationUpdate::Connected),
    ];

    for (msg, expected) in cases {
        validate("station_message.schema.json", &msg);
        let bytes = serde_json::to_vec(&msg).unwrap();
        assert_eq!(parse_station_message(&bytes).unwrap(), expected);
    }
}

#[test]
fn station_messages_invalid_are_rejected_by_both() {
    for msg in [
        json!({ "op": "ALARM_EVENT" }),
        json!({ "op": "CURRENT_MODE" }),
        json!({ "op": "REBOOT" }),
    ] {
        validate_fails("station_message.schema.json", &msg);
        let bytes = serde_json::to_vec(&msg).unwrap();
        assert!(parse_station_message(&bytes).is_err());
    }
}

// =========================================================================
// Front-end commands
// =========================================================================

#[test]
fn command_valid() {
    validate(
        "command.schema.json",
        &json!({ "op": "SET_TARGET", "station": "T8010P1", "state": 2, "op_id": "abc" }),
    );
    validate("command.schema.json", &json!({ "op": "GET_STATE" }));
    validate("command.schema.json", &json!({ "op": "PING" }));
}

#[test]
fn set_target_requires_state() {
    validate_fails("command.schema.json", &json!({ "op": "SET_TARGET", "station": "T8010P1" }));
}

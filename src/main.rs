// MIT License - Copyright (c) 2026 Peter Wright
// MQTT bridge

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde::Deserialize;
use tokio::signal::unix::{signal, SignalKind};
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};

use eufy_station_bridge::mqtt::messages::{MqttCmdAck, MqttCommand, MqttStationState};
use eufy_station_bridge::mqtt::{
    parse_mqtt_url, publish_json, MqttPresentationSink, MqttStationClient, Topics,
};
use eufy_station_bridge::{
    BridgeError, GuardModeConfig, GuardModeReconciler, PresentationValue, StationConfig,
};

type Reconciler = GuardModeReconciler<MqttStationClient, MqttPresentationSink>;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "eufy2mqtt")]
#[command(about = "Bridge between eufy station guard modes and a security system front end over MQTT")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Config {
    mqtt: MqttToml,
    #[serde(default)]
    bridge: BridgeToml,
    #[serde(default)]
    guard_modes: GuardModeConfig,
    #[serde(default)]
    stations: Vec<StationToml>,
}

#[derive(Debug, Default, Deserialize)]
struct BridgeToml {
    #[serde(default)]
    detailed_logging: bool,
    #[serde(default)]
    legacy_zero_suppression: bool,
}

#[derive(Debug, Deserialize)]
struct StationToml {
    serial: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    firmware: Option<String>,
    #[serde(default)]
    guard_modes: GuardModeConfig,
}

#[derive(Debug, Deserialize)]
struct MqttToml {
    url: String,
    #[serde(default = "default_client_id")]
    client_id: String,
    #[serde(default = "default_subscribe_topic")]
    subscribe_topic: String,
    #[serde(default = "default_publish_topic")]
    publish_topic: String,
    #[serde(default = "default_station_topic")]
    station_topic: String,
    #[serde(default = "default_snapshot_interval")]
    snapshot_interval_secs: u64,
}

fn default_client_id() -> String {
    "eufy-bridge".to_string()
}
fn default_subscribe_topic() -> String {
    "eufy/cmd".to_string()
}
fn default_publish_topic() -> String {
    "eufy".to_string()
}
fn default_station_topic() -> String {
    "eufy-station".to_string()
}
fn default_snapshot_interval() -> u64 {
    60
}

fn load_config(path: &str) -> Result<Config> {
    let config_text = std::fs::read_to_string(path).context("Failed to read config file")?;
    toml::from_str(&config_text).context("Failed to parse config file")
}

fn build_station_configs(config: &Config) -> Result<Vec<StationConfig>> {
    if config.stations.is_empty() {
        anyhow::bail!("No stations configured");
    }
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(config.stations.len());
    for station in &config.stations {
        if station.serial.is_empty() || station.serial.contains(['/', '+', '#']) {
            anyhow::bail!("Invalid station serial: {:?}", station.serial);
        }
        if !seen.insert(station.serial.as_str()) {
            anyhow::bail!("Duplicate station serial: {}", station.serial);
        }
        out.push(
            StationConfig::builder()
                .serial(&station.serial)
                .name(station.name.clone().unwrap_or_else(|| station.serial.clone()))
                .model(station.model.clone())
                .firmware(station.firmware.clone())
                .guard_modes(config.guard_modes.merged(&station.guard_modes))
                .detailed_logging(config.bridge.detailed_logging)
                .legacy_zero_suppression(config.bridge.legacy_zero_suppression)
                .build(),
        );
    }
    Ok(out)
}

fn build_topics(mqtt: &MqttToml) -> Topics {
    Topics {
        publish: mqtt.publish_topic.clone(),
        subscribe: mqtt.subscribe_topic.clone(),
        station: mqtt.station_topic.clone(),
    }
}

/// Everything needed to (re)start the bridge, validated up front.
struct Settings {
    mqtt_host: String,
    mqtt_port: u16,
    client_id: String,
    topics: Topics,
    snapshot_interval_secs: u64,
    stations: Vec<StationConfig>,
}

fn build_settings(config: Config) -> Result<Settings> {
    let (mqtt_host, mqtt_port) = parse_mqtt_url(&config.mqtt.url)
        .context("MQTT URL must be in format mqtt://host:port")?;
    let stations = build_station_configs(&config)?;
    Ok(Settings {
        mqtt_host,
        mqtt_port,
        client_id: config.mqtt.client_id.clone(),
        topics: build_topics(&config.mqtt),
        snapshot_interval_secs: config.mqtt.snapshot_interval_secs.max(1),
        stations,
    })
}

// ---------------------------------------------------------------------------
// Stations
// ---------------------------------------------------------------------------

struct StationHandle {
    client: MqttStationClient,
    reconciler: Arc<Reconciler>,
}

type Stations = Arc<HashMap<String, StationHandle>>;

/// Pick the station a command is addressed to. The station may be omitted
/// when only one is configured.
fn resolve_station<'a>(
    stations: &'a Stations,
    serial: Option<&str>,
) -> eufy_station_bridge::Result<&'a StationHandle> {
    match serial {
        Some(serial) => stations.get(serial).ok_or_else(|| BridgeError::UnknownStation {
            serial: serial.to_string(),
        }),
        None if stations.len() == 1 => stations.values().next().ok_or_else(|| {
            BridgeError::InvalidMessage {
                details: "no stations configured".to_string(),
            }
        }),
        None => Err(BridgeError::InvalidMessage {
            details: "station required when several are configured".to_string(),
        }),
    }
}

async fn build_station_state(reconciler: &Reconciler) -> MqttStationState {
    let current = reconciler.current_state().await;
    let target = reconciler.target_state().await;
    let state = reconciler.state().await;
    MqttStationState::new(
        reconciler.info(),
        current,
        target,
        state.alarm_triggered,
        state.fault_reported,
    )
}

async fn publish_snapshot(client: &AsyncClient, topics: &Topics, stations: &Stations) {
    for (serial, handle) in stations.iter() {
        let snapshot = build_station_state(&handle.reconciler).await;
        publish_json(client, &topics.presentation(serial), &snapshot, true).await;
    }
}

// ---------------------------------------------------------------------------
// MQTT command handler
// ---------------------------------------------------------------------------

async fn publish_cmd_ack(
    client: &AsyncClient,
    topic: &str,
    success: bool,
    src: Option<serde_json::Value>,
    data: Option<serde_json::Value>,
) {
    publish_json(client, topic, &MqttCmdAck::new(success, src, data), false).await;
}

async fn handle_command(
    payload_str: &str,
    cmd: MqttCommand,
    client: &AsyncClient,
    topics: &Topics,
    stations: &Stations,
) {
    // Parse the raw payload as a JSON value for the CMD_ACK src field
    let src_json = serde_json::from_str::<serde_json::Value>(payload_str).ok();
    let ack_topic = topics.publish.as_str();

    match cmd.op.as_str() {
        "PING" => {
            info!("Command: PING");
            publish_cmd_ack(client, ack_topic, true, src_json, None).await;
        }

        "SNAPSHOT" => {
            debug!("Command: SNAPSHOT");
            publish_snapshot(client, topics, stations).await;
            publish_cmd_ack(client, ack_topic, true, src_json, None).await;
        }

        "GET_STATE" => {
            let handle = match resolve_station(stations, cmd.station.as_deref()) {
                Ok(handle) => handle,
                Err(e) => {
                    warn!("GET_STATE: {e}");
                    publish_cmd_ack(client, ack_topic, false, src_json, None).await;
                    return;
                }
            };
            debug!("Command: GET_STATE {}", handle.reconciler.info().serial);
            let state = build_station_state(&handle.reconciler).await;
            let data = serde_json::to_value(&state).ok();
            publish_cmd_ack(client, ack_topic, true, src_json, data).await;
        }

        "SET_TARGET" => {
            let handle = match resolve_station(stations, cmd.station.as_deref()) {
                Ok(handle) => handle,
                Err(e) => {
                    warn!("SET_TARGET: {e}");
                    publish_cmd_ack(client, ack_topic, false, src_json, None).await;
                    return;
                }
            };
            let value = match cmd.state.map(PresentationValue::from_code) {
                Some(PresentationValue::Known(state)) if !state.is_target() => {
                    warn!("SET_TARGET: {state} is not a target state");
                    publish_cmd_ack(client, ack_topic, false, src_json, None).await;
                    return;
                }
                Some(value) => value,
                None => {
                    warn!("SET_TARGET: missing state");
                    publish_cmd_ack(client, ack_topic, false, src_json, None).await;
                    return;
                }
            };
            info!("Command: SET_TARGET {} -> {value}", handle.reconciler.info().serial);
            handle.reconciler.set_target_state(value).await;
            publish_cmd_ack(client, ack_topic, true, src_json, None).await;
        }

        other => {
            warn!("Unknown command: {other}");
            publish_cmd_ack(client, ack_topic, false, src_json, None).await;
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity (e.g. RUST_LOG=debug or RUST_LOG=eufy_station_bridge=trace).
    // Default: info.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // systemd journal already adds timestamps, so omit them when running under systemd
    if std::env::var_os("JOURNAL_STREAM").is_some() {
        tracing_subscriber::fmt().without_time().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let cli = Cli::parse();
    let mut settings = build_settings(load_config(&cli.config)?)?;

    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    loop {
        info!(
            "Connecting to MQTT broker at {}:{}",
            settings.mqtt_host, settings.mqtt_port
        );
        let mut mqtt_opts =
            MqttOptions::new(&settings.client_id, &settings.mqtt_host, settings.mqtt_port);
        mqtt_opts.set_keep_alive(Duration::from_secs(30));
        let (client, mut eventloop) = AsyncClient::new(mqtt_opts, 256);
        let topics = settings.topics.clone();

        // One reconciler task per station, each consuming its own event channel in order
        let mut handles = HashMap::new();
        let mut station_tasks = Vec::new();
        for station_config in &settings.stations {
            let serial = station_config.info.serial.clone();
            let station = MqttStationClient::new(&serial, client.clone(), &topics);
            let sink = MqttPresentationSink::new(&serial, client.clone(), &topics);
            let events = station.subscribe();
            let reconciler = Arc::new(GuardModeReconciler::new(
                station_config.clone(),
                station.clone(),
                sink,
            ));
            let runner = Arc::clone(&reconciler);
            station_tasks.push(tokio::spawn(async move { runner.run(events).await }));
            info!("Station {} ({}) registered", station_config.info.name, serial);
            handles.insert(serial, StationHandle { client: station, reconciler });
        }
        let stations: Stations = Arc::new(handles);

        // Task 1: MQTT event loop (station events in, front-end commands in)
        let client_mqtt = client.clone();
        let topics_mqtt = topics.clone();
        let stations_mqtt = Arc::clone(&stations);
        let mqtt_handle = tokio::spawn(async move {
            let station_filter = topics_mqtt.station_events_filter();
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        // rumqttc does not resubscribe after a broker reconnect
                        info!(
                            "MQTT: connected, subscribing to {} and {station_filter}",
                            topics_mqtt.subscribe
                        );
                        for filter in [topics_mqtt.subscribe.as_str(), station_filter.as_str()] {
                            if let Err(e) = client_mqtt.subscribe(filter, QoS::AtLeastOnce).await {
                                error!("Failed to subscribe to {filter}: {e}");
                            }
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(msg))) => {
                        if msg.topic == topics_mqtt.subscribe {
                            let payload = String::from_utf8_lossy(&msg.payload);
                            match serde_json::from_str::<MqttCommand>(&payload) {
                                Ok(cmd) => {
                                    if cmd.op == "SNAPSHOT" || cmd.op == "GET_STATE" {
                                        debug!("MQTT command received: {payload}");
                                    } else {
                                        info!("MQTT command received: {payload}");
                                    }
                                    handle_command(
                                        &payload,
                                        cmd,
                                        &client_mqtt,
                                        &topics_mqtt,
                                        &stations_mqtt,
                                    )
                                    .await;
                                }
                                Err(e) => {
                                    warn!("Failed to parse MQTT command: {e}");
                                }
                            }
                        } else if let Some(serial) = topics_mqtt.serial_from_event_topic(&msg.topic) {
                            match stations_mqtt.get(serial) {
                                Some(handle) => handle.client.ingest(&msg.payload).await,
                                None => debug!("Ignoring event for unconfigured station {serial}"),
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("MQTT event loop error: {e}");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        // Publish initial snapshot
        publish_snapshot(&client, &topics, &stations).await;

        // Task 2: Snapshot timer, pulling fresh state through each reconciler
        let client_snap = client.clone();
        let topics_snap = topics.clone();
        let stations_snap = Arc::clone(&stations);
        let snapshot_interval_secs = settings.snapshot_interval_secs;
        let snap_handle = tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(snapshot_interval_secs));
            // Skip the first immediate tick (we already published an initial snapshot)
            ticker.tick().await;
            loop {
                ticker.tick().await;
                publish_snapshot(&client_snap, &topics_snap, &stations_snap).await;
            }
        });

        // Wait for a signal
        info!("MQTT bridge running. Send SIGHUP to restart, SIGINT/SIGTERM to stop.");
        let restart = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, shutting down...");
                false
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                false
            }
            _ = sighup.recv() => {
                info!("Received SIGHUP, reloading config and restarting connections...");
                true
            }
        };

        // Abort tasks
        mqtt_handle.abort();
        snap_handle.abort();
        for task in station_tasks {
            task.abort();
        }

        if let Err(e) = client.disconnect().await {
            debug!("MQTT disconnect: {e}");
        }

        if !restart {
            break;
        }

        // Reload config from disk; keep previous config on failure
        info!("Reloading config from {}", cli.config);
        match load_config(&cli.config).and_then(build_settings) {
            Ok(new_settings) => {
                settings = new_settings;
                info!("Config reloaded successfully");
            }
            Err(e) => warn!("Failed to reload config, keeping previous: {e:#}"),
        }

        info!("Reconnecting...");
    }

    info!("Shutdown complete");
    Ok(())
}

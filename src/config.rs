// MIT License - Copyright (c) 2026 Peter Wright
// Station and mapping configuration

use serde::Deserialize;

pub const DEFAULT_HOME_MODE: i32 = 1;
pub const DEFAULT_AWAY_MODE: i32 = 0;
pub const DEFAULT_NIGHT_MODE: i32 = 3;
pub const DEFAULT_OFF_MODE: i32 = 63;

/// Optional guard mode overrides for the four target states.
///
/// Missing entries fall back to the eufy defaults (home=1, away=0, night=3, off=63).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuardModeConfig {
    #[serde(default)]
    pub home: Option<i32>,
    #[serde(default)]
    pub away: Option<i32>,
    #[serde(default)]
    pub night: Option<i32>,
    #[serde(default)]
    pub off: Option<i32>,
}

/// Guard mode codes with defaults applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedGuardModes {
    pub home: i32,
    pub away: i32,
    pub night: i32,
    pub off: i32,
}

impl GuardModeConfig {
    pub fn resolved(&self) -> ResolvedGuardModes {
        ResolvedGuardModes {
            home: self.home.unwrap_or(DEFAULT_HOME_MODE),
            away: self.away.unwrap_or(DEFAULT_AWAY_MODE),
            night: self.night.unwrap_or(DEFAULT_NIGHT_MODE),
            off: self.off.unwrap_or(DEFAULT_OFF_MODE),
        }
    }

    /// Layer `overrides` on top of `self`, field by field.
    pub fn merged(&self, overrides: &GuardModeConfig) -> GuardModeConfig {
        GuardModeConfig {
            home: overrides.home.or(self.home),
            away: overrides.away.or(self.away),
            night: overrides.night.or(self.night),
            off: overrides.off.or(self.off),
        }
    }
}

/// Accessory information for a station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationInfo {
    /// Station serial number; also the MQTT topic segment
    pub serial: String,
    /// Display name used in logs and published state
    pub name: String,
    pub manufacturer: String,
    pub model: Option<String>,
    pub firmware: Option<String>,
}

impl Default for StationInfo {
    fn default() -> Self {
        Self {
            serial: String::new(),
            name: "Station".to_string(),
            manufacturer: "Eufy".to_string(),
            model: None,
            firmware: None,
        }
    }
}

/// Configuration for a single station's reconciler.
#[derive(Debug, Clone, Default)]
pub struct StationConfig {
    pub info: StationInfo,
    /// Guard mode mapping overrides
    pub guard_modes: GuardModeConfig,
    /// Log diagnostic property events from the station
    pub detailed_logging: bool,
    /// Skip pushes whose wire value is 0, as older releases did
    pub legacy_zero_suppression: bool,
}

impl StationConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> StationConfigBuilder {
        StationConfigBuilder::default()
    }
}

/// Builder for StationConfig.
#[derive(Debug, Clone, Default)]
pub struct StationConfigBuilder {
    config: StationConfig,
}

impl StationConfigBuilder {
    pub fn serial(mut self, serial: impl Into<String>) -> Self {
        self.config.info.serial = serial.into();
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.info.name = name.into();
        self
    }

    pub fn model(mut self, model: Option<String>) -> Self {
        self.config.info.model = model;
        self
    }

    pub fn firmware(mut self, firmware: Option<String>) -> Self {
        self.config.info.firmware = firmware;
        self
    }

    pub fn guard_modes(mut self, guard_modes: GuardModeConfig) -> Self {
        self.config.guard_modes = guard_modes;
        self
    }

    pub fn detailed_logging(mut self, enabled: bool) -> Self {
        self.config.detailed_logging = enabled;
        self
    }

    pub fn legacy_zero_suppression(mut self, enabled: bool) -> Self {
        self.config.legacy_zero_suppression = enabled;
        self
    }

    pub fn build(self) -> StationConfig {
        self.config
    }
}

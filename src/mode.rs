// MIT License - Copyright (c) 2026 Peter Wright
// Guard mode <-> security system state translation

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::GuardModeConfig;

/// A vendor guard mode code as reported by the station.
///
/// Observed values include 0 (away), 1 (home), 3 (custom/night), 6, 47 (geofence)
/// and 63 (disarmed), but the code is opaque outside of the configured mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuardMode(pub i32);

impl fmt::Display for GuardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Security system state as seen by the front end.
///
/// The first four are valid target states. `AlarmTriggered` only ever appears
/// as a current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityState {
    Home,
    Away,
    Night,
    Disarmed,
    AlarmTriggered,
}

impl SecurityState {
    /// States a user can select as target, in mapping table order.
    pub const TARGETS: [SecurityState; 4] = [
        SecurityState::Home,
        SecurityState::Away,
        SecurityState::Night,
        SecurityState::Disarmed,
    ];

    /// Wire ordinal (0-4).
    pub fn ordinal(&self) -> i32 {
        match self {
            Self::Home => 0,
            Self::Away => 1,
            Self::Night => 2,
            Self::Disarmed => 3,
            Self::AlarmTriggered => 4,
        }
    }

    pub fn from_ordinal(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Home),
            1 => Some(Self::Away),
            2 => Some(Self::Night),
            3 => Some(Self::Disarmed),
            4 => Some(Self::AlarmTriggered),
            _ => None,
        }
    }

    /// Whether the state is selectable as a target.
    pub fn is_target(&self) -> bool {
        !matches!(self, Self::AlarmTriggered)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Home => "HOME",
            Self::Away => "AWAY",
            Self::Night => "NIGHT",
            Self::Disarmed => "DISARMED",
            Self::AlarmTriggered => "ALARM_TRIGGERED",
        }
    }
}

impl fmt::Display for SecurityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value exchanged with the front end.
///
/// Translation is total: codes the mapping table does not know surface
/// verbatim as `Unmapped` instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentationValue {
    Known(SecurityState),
    Unmapped(i32),
}

impl PresentationValue {
    /// Interpret a raw wire value from the front end.
    pub fn from_code(code: i32) -> Self {
        match SecurityState::from_ordinal(code) {
            Some(state) => Self::Known(state),
            None => Self::Unmapped(code),
        }
    }

    /// Wire code: the state's ordinal, or the raw passthrough code.
    pub fn code(&self) -> i32 {
        match self {
            Self::Known(state) => state.ordinal(),
            Self::Unmapped(code) => *code,
        }
    }

    pub fn state(&self) -> Option<SecurityState> {
        match self {
            Self::Known(state) => Some(*state),
            Self::Unmapped(_) => None,
        }
    }

    /// Whether this value came out of the mapping table.
    pub fn is_recognized(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

impl From<SecurityState> for PresentationValue {
    fn from(state: SecurityState) -> Self {
        Self::Known(state)
    }
}

impl fmt::Display for PresentationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(state) => write!(f, "{} ({})", state, state.ordinal()),
            Self::Unmapped(code) => write!(f, "unmapped ({code})"),
        }
    }
}

/// One row of the mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeEntry {
    pub state: SecurityState,
    pub guard_mode: GuardMode,
}

/// The four-entry table pairing target states with vendor guard modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeMapping {
    entries: [ModeEntry; 4],
}

impl Default for ModeMapping {
    fn default() -> Self {
        Self::from_config(&GuardModeConfig::default())
    }
}

impl ModeMapping {
    /// Resolve the table from configuration, falling back to the defaults
    /// Home=1, Away=0, Night=3, Disarmed=63.
    pub fn from_config(config: &GuardModeConfig) -> Self {
        let resolved = config.resolved();
        let codes = [resolved.home, resolved.away, resolved.night, resolved.off];
        Self {
            entries: std::array::from_fn(|i| ModeEntry {
                state: SecurityState::TARGETS[i],
                guard_mode: GuardMode(codes[i]),
            }),
        }
    }

    pub fn entries(&self) -> &[ModeEntry; 4] {
        &self.entries
    }

    /// Guard mode paired with Home; the initial mode before any read.
    pub fn home_mode(&self) -> GuardMode {
        self.entries[0].guard_mode
    }

    /// Translate a vendor guard mode for display.
    ///
    /// First matching entry wins when the table maps two states to one code.
    pub fn to_presentation(&self, mode: GuardMode) -> PresentationValue {
        self.entries
            .iter()
            .find(|e| e.guard_mode == mode)
            .map(|e| PresentationValue::Known(e.state))
            .unwrap_or(PresentationValue::Unmapped(mode.0))
    }

    /// Translate a requested front-end state into the guard mode to command.
    pub fn to_guard_mode(&self, value: PresentationValue) -> GuardMode {
        let found = value
            .state()
            .and_then(|state| self.entries.iter().find(|e| e.state == state));
        match found {
            Some(entry) => entry.guard_mode,
            None => GuardMode(value.code()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mapping() {
        let mapping = ModeMapping::default();
        assert_eq!(mapping.to_presentation(GuardMode(1)), SecurityState::Home.into());
        assert_eq!(mapping.to_presentation(GuardMode(0)), SecurityState::Away.into());
        assert_eq!(mapping.to_presentation(GuardMode(3)), SecurityState::Night.into());
        assert_eq!(mapping.to_presentation(GuardMode(63)), SecurityState::Disarmed.into());
        assert_eq!(mapping.home_mode(), GuardMode(1));
    }

    #[test]
    fn test_round_trip_over_table() {
        let mapping = ModeMapping::default();
        for state in SecurityState::TARGETS {
            let mode = mapping.to_guard_mode(state.into());
            assert_eq!(mapping.to_presentation(mode), PresentationValue::Known(state));
        }
    }

    #[test]
    fn test_round_trip_with_overrides() {
        let config = GuardModeConfig { night: Some(4), off: Some(6), ..Default::default() };
        let mapping = ModeMapping::from_config(&config);
        assert_eq!(mapping.to_guard_mode(SecurityState::Night.into()), GuardMode(4));
        assert_eq!(mapping.to_guard_mode(SecurityState::Disarmed.into()), GuardMode(6));
        for state in SecurityState::TARGETS {
            let mode = mapping.to_guard_mode(state.into());
            assert_eq!(mapping.to_presentation(mode).state(), Some(state));
        }
        // 3 and 63 are no longer in the table
        assert_eq!(mapping.to_presentation(GuardMode(3)), PresentationValue::Unmapped(3));
        assert_eq!(mapping.to_presentation(GuardMode(63)), PresentationValue::Unmapped(63));
    }

    #[test]
    fn test_unmapped_guard_mode_passes_through() {
        let mapping = ModeMapping::default();
        for code in [2, 4, 6, 47, -1, 1000] {
            let value = mapping.to_presentation(GuardMode(code));
            assert_eq!(value, PresentationValue::Unmapped(code));
            assert_eq!(value.code(), code);
            assert!(!value.is_recognized());
        }
    }

    #[test]
    fn test_unmapped_state_passes_through() {
        let mapping = ModeMapping::default();
        assert_eq!(mapping.to_guard_mode(PresentationValue::Unmapped(42)), GuardMode(42));
        // AlarmTriggered is never a table entry
        assert_eq!(mapping.to_guard_mode(SecurityState::AlarmTriggered.into()), GuardMode(4));
    }

    #[test]
    fn test_duplicate_codes_first_entry_wins() {
        let config = GuardModeConfig { night: Some(1), ..Default::default() };
        let mapping = ModeMapping::from_config(&config);
        assert_eq!(mapping.to_presentation(GuardMode(1)), SecurityState::Home.into());
        assert_eq!(mapping.to_guard_mode(SecurityState::Night.into()), GuardMode(1));
    }

    #[test]
    fn test_presentation_value_from_code() {
        assert_eq!(PresentationValue::from_code(2), SecurityState::Night.into());
        assert_eq!(PresentationValue::from_code(4), SecurityState::AlarmTriggered.into());
        assert_eq!(PresentationValue::from_code(9), PresentationValue::Unmapped(9));
        assert!(!SecurityState::AlarmTriggered.is_target());
        assert!(SecurityState::Away.is_target());
    }
}

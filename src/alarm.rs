// MIT License - Copyright (c) 2026 Peter Wright
// Station alarm event classification

use std::fmt;

/// Sensor sources that put the station into alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmTrigger {
    /// 2 - HomeBase G-sensor
    GSensor,
    /// 3 - PIR sensor
    Pir,
    /// 6 - Entry sensor
    Door,
    /// 7 - Camera PIR
    CameraPir,
    /// 8 - Motion sensor
    MotionSensor,
    /// 9 - Camera G-sensor
    CameraGSensor,
}

/// Ways an alarm gets switched off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmClear {
    /// 15 - Keypad
    Keypad,
    /// 16 - Eufy app
    App,
    /// 17 - HomeBase button
    HomeBaseButton,
}

/// An alarm event code reported by the station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmEvent {
    Triggered(AlarmTrigger),
    Cleared(AlarmClear),
    Unknown(i32),
}

impl AlarmEvent {
    pub fn from_code(code: i32) -> Self {
        match code {
            2 => Self::Triggered(AlarmTrigger::GSensor),
            3 => Self::Triggered(AlarmTrigger::Pir),
            6 => Self::Triggered(AlarmTrigger::Door),
            7 => Self::Triggered(AlarmTrigger::CameraPir),
            8 => Self::Triggered(AlarmTrigger::MotionSensor),
            9 => Self::Triggered(AlarmTrigger::CameraGSensor),
            15 => Self::Cleared(AlarmClear::Keypad),
            16 => Self::Cleared(AlarmClear::App),
            17 => Self::Cleared(AlarmClear::HomeBaseButton),
            other => Self::Unknown(other),
        }
    }

    /// The wire code.
    pub fn code(&self) -> i32 {
        match self {
            Self::Triggered(AlarmTrigger::GSensor) => 2,
            Self::Triggered(AlarmTrigger::Pir) => 3,
            Self::Triggered(AlarmTrigger::Door) => 6,
            Self::Triggered(AlarmTrigger::CameraPir) => 7,
            Self::Triggered(AlarmTrigger::MotionSensor) => 8,
            Self::Triggered(AlarmTrigger::CameraGSensor) => 9,
            Self::Cleared(AlarmClear::Keypad) => 15,
            Self::Cleared(AlarmClear::App) => 16,
            Self::Cleared(AlarmClear::HomeBaseButton) => 17,
            Self::Unknown(code) => *code,
        }
    }

    pub fn is_trigger(&self) -> bool {
        matches!(self, Self::Triggered(_))
    }

    pub fn is_clear(&self) -> bool {
        matches!(self, Self::Cleared(_))
    }

    /// Human-readable description of the event.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Triggered(AlarmTrigger::GSensor) => "Alarm triggered by G-sensor",
            Self::Triggered(AlarmTrigger::Pir) => "Alarm triggered by PIR",
            Self::Triggered(AlarmTrigger::Door) => "Alarm triggered by door sensor",
            Self::Triggered(AlarmTrigger::CameraPir) => "Alarm triggered by camera PIR",
            Self::Triggered(AlarmTrigger::MotionSensor) => "Alarm triggered by motion sensor",
            Self::Triggered(AlarmTrigger::CameraGSensor) => "Alarm triggered by camera G-sensor",
            Self::Cleared(AlarmClear::Keypad) => "Alarm off by keypad",
            Self::Cleared(AlarmClear::App) => "Alarm off by app",
            Self::Cleared(AlarmClear::HomeBaseButton) => "Alarm off by HomeBase button",
            Self::Unknown(_) => "Unknown alarm event",
        }
    }
}

impl fmt::Display for AlarmEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}

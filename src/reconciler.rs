// MIT License - Copyright (c) 2026 Peter Wright
// Guard mode reconciler

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::alarm::AlarmEvent;
use crate::config::{StationConfig, StationInfo};
use crate::event::{EventReceiver, StationEvent};
use crate::mode::{GuardMode, ModeMapping, PresentationValue, SecurityState};
use crate::sink::{PresentationSink, StatusFault};
use crate::station::StationClient;

/// Alarm phase of a station as far as display is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmPhase {
    Normal,
    AlarmTriggered,
    /// An unknown alarm event was reported. Reads behave as `Normal`.
    FaultReported,
}

/// Mutable per-station state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerState {
    pub alarm_triggered: bool,
    pub last_guard_mode: GuardMode,
    /// Set by an unknown alarm event, cleared by the next trigger or clear
    pub fault_reported: bool,
    /// Total unknown alarm events seen
    pub fault_count: u64,
}

impl ReconcilerState {
    pub fn new(initial_mode: GuardMode) -> Self {
        Self {
            alarm_triggered: false,
            last_guard_mode: initial_mode,
            fault_reported: false,
            fault_count: 0,
        }
    }

    pub fn phase(&self) -> AlarmPhase {
        if self.alarm_triggered {
            AlarmPhase::AlarmTriggered
        } else if self.fault_reported {
            AlarmPhase::FaultReported
        } else {
            AlarmPhase::Normal
        }
    }
}

/// Reconciles a station's guard mode with a four-state security system.
///
/// Station events come in through [`run`](Self::run) (or the `on_*` handlers
/// directly) and are pushed to the sink. The front end pulls through
/// [`current_state`](Self::current_state) and [`target_state`](Self::target_state)
/// and commands through [`set_target_state`](Self::set_target_state).
///
/// The state lock is never held across a call into the station or the sink.
/// Current-state pushes go out under a separate display lock, taken before the
/// state lock, so a push decided before an alarm cannot land after it.
pub struct GuardModeReconciler<C, S> {
    info: StationInfo,
    mapping: ModeMapping,
    detailed_logging: bool,
    legacy_zero_suppression: bool,
    station: C,
    sink: S,
    state: Mutex<ReconcilerState>,
    display: Mutex<()>,
}

impl<C: StationClient, S: PresentationSink> GuardModeReconciler<C, S> {
    pub fn new(config: StationConfig, station: C, sink: S) -> Self {
        let mapping = ModeMapping::from_config(&config.guard_modes);
        let state = ReconcilerState::new(mapping.home_mode());
        debug!("{}: constructed reconciler with mapping {:?}", config.info.name, mapping.entries());
        Self {
            info: config.info,
            mapping,
            detailed_logging: config.detailed_logging,
            legacy_zero_suppression: config.legacy_zero_suppression,
            station,
            sink,
            state: Mutex::new(state),
            display: Mutex::new(()),
        }
    }

    pub fn info(&self) -> &StationInfo {
        &self.info
    }

    pub fn mapping(&self) -> &ModeMapping {
        &self.mapping
    }

    pub fn station(&self) -> &C {
        &self.station
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Snapshot of the current state.
    pub async fn state(&self) -> ReconcilerState {
        self.state.lock().await.clone()
    }

    fn name(&self) -> &str {
        &self.info.name
    }

    /// Whether a translated push notification should reach the sink.
    fn should_push(&self, value: PresentationValue) -> bool {
        if self.legacy_zero_suppression {
            value.code() != 0
        } else {
            value.is_recognized()
        }
    }

    // --- Event stream ---

    /// Consume station events in order until the channel closes.
    pub async fn run(&self, mut rx: EventReceiver) {
        loop {
            match rx.recv().await {
                Ok(event) => self.handle_event(event).await,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!("{}: event receiver lagged, missed {n} events", self.name());
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    info!("{}: event channel closed", self.name());
                    break;
                }
            }
        }
    }

    /// Route one station event to its handler.
    pub async fn handle_event(&self, event: StationEvent) {
        match event {
            StationEvent::GuardModeChanged { mode } => self.on_guard_mode_changed(mode).await,
            StationEvent::CurrentModeChanged { mode } => self.on_current_mode_changed(mode).await,
            StationEvent::AlarmEvent { code } => self.on_alarm_event(code).await,
            StationEvent::RawPropertyChanged { property_type, value, modified } => {
                if self.detailed_logging {
                    debug!(
                        "{}: raw property changed: type={property_type} value={value} modified={modified}",
                        self.name()
                    );
                }
            }
            StationEvent::PropertyChanged { name, value } => {
                if self.detailed_logging {
                    debug!("{}: property changed: {name}={value}", self.name());
                }
            }
        }
    }

    /// The station's target guard mode changed.
    pub async fn on_guard_mode_changed(&self, mode: GuardMode) {
        debug!("{}: ON guard mode: {mode}", self.name());
        let value = self.mapping.to_presentation(mode);
        if self.should_push(value) {
            self.sink.update_target_state(value).await;
        } else {
            debug!("{}: not pushing target {value}", self.name());
        }
    }

    /// The station's current mode changed.
    pub async fn on_current_mode_changed(&self, mode: GuardMode) {
        debug!("{}: ON current mode: {mode}", self.name());
        let _display = self.display.lock().await;
        let alarm_triggered = {
            let mut state = self.state.lock().await;
            state.last_guard_mode = mode;
            state.alarm_triggered
        };
        if alarm_triggered {
            debug!("{}: alarm active, holding current state display", self.name());
            return;
        }
        let value = self.mapping.to_presentation(mode);
        if self.should_push(value) {
            self.sink.update_current_state(value).await;
        } else {
            debug!("{}: not pushing current {value}", self.name());
        }
    }

    /// An alarm event arrived from the station.
    pub async fn on_alarm_event(&self, code: i32) {
        let event = AlarmEvent::from_code(code);
        match event {
            AlarmEvent::Triggered(_) => {
                warn!("{}: ALARM TRIGGERED - alarm event {event}", self.name());
                let _display = self.display.lock().await;
                let had_fault = {
                    let mut state = self.state.lock().await;
                    state.alarm_triggered = true;
                    std::mem::replace(&mut state.fault_reported, false)
                };
                if had_fault {
                    self.sink.update_status_fault(StatusFault::NoFault).await;
                }
                self.sink
                    .update_current_state(SecurityState::AlarmTriggered.into())
                    .await;
            }
            AlarmEvent::Cleared(_) => {
                warn!("{}: ALARM OFF - alarm event {event}", self.name());
                let _display = self.display.lock().await;
                let (had_fault, last_mode) = {
                    let mut state = self.state.lock().await;
                    state.alarm_triggered = false;
                    (
                        std::mem::replace(&mut state.fault_reported, false),
                        state.last_guard_mode,
                    )
                };
                if had_fault {
                    self.sink.update_status_fault(StatusFault::NoFault).await;
                }
                let value = self.mapping.to_presentation(last_mode);
                self.sink.update_current_state(value).await;
            }
            AlarmEvent::Unknown(_) => {
                warn!("{}: ALARM UNKNOWN - alarm event {code}", self.name());
                {
                    let mut state = self.state.lock().await;
                    state.fault_reported = true;
                    state.fault_count += 1;
                }
                self.sink.update_status_fault(StatusFault::GeneralFault).await;
            }
        }
    }

    // --- Queries ---

    /// Current state for display.
    ///
    /// Returns `AlarmTriggered` while an alarm is active, otherwise reads the
    /// live guard mode from the station. A failed read yields `None`.
    pub async fn current_state(&self) -> Option<PresentationValue> {
        if self.state.lock().await.alarm_triggered {
            return Some(SecurityState::AlarmTriggered.into());
        }

        if !self.station.is_connected() {
            debug!("{}: station not connected, reading cached guard mode", self.name());
        }

        match self.station.guard_mode().await {
            Ok(mode) => {
                debug!("{}: GET current mode: {mode}", self.name());
                let alarm_triggered = {
                    let mut state = self.state.lock().await;
                    state.last_guard_mode = mode;
                    state.alarm_triggered
                };
                // An alarm may have fired while the read was in flight
                if alarm_triggered {
                    return Some(SecurityState::AlarmTriggered.into());
                }
                Some(self.mapping.to_presentation(mode))
            }
            Err(e) => {
                error!("{}: failed to read current guard mode: {e}", self.name());
                None
            }
        }
    }

    /// Target state for display: the last observed guard mode, no fresh read.
    pub async fn target_state(&self) -> PresentationValue {
        let last_mode = self.state.lock().await.last_guard_mode;
        self.mapping.to_presentation(last_mode)
    }

    // --- Commands ---

    /// Set the station's target state.
    ///
    /// The new state is stored and pushed as current before the station has
    /// confirmed it. A failed command is logged and not rolled back.
    pub async fn set_target_state(&self, value: PresentationValue) {
        let mode = self.mapping.to_guard_mode(value);
        debug!("{}: SET guard mode: {mode} (requested {value})", self.name());

        {
            let _display = self.display.lock().await;
            let alarm_triggered = {
                let mut state = self.state.lock().await;
                state.last_guard_mode = mode;
                state.alarm_triggered
            };

            if alarm_triggered {
                debug!("{}: alarm active, holding current state display", self.name());
            } else {
                self.sink.update_current_state(value).await;
            }
        }

        if let Err(e) = self.station.set_guard_mode(mode).await {
            error!("{}: error setting guard mode {mode}: {e}", self.name());
        }
    }
}

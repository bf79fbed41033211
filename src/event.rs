// MIT License - Copyright (c) 2026 Peter Wright
// Station events

use crate::mode::GuardMode;

/// Events emitted by a station client.
///
/// Each station has its own channel; the reconciler consumes it in order.
#[derive(Debug, Clone, PartialEq)]
pub enum StationEvent {
    /// Target guard mode changed (app, keypad or geofence initiated)
    GuardModeChanged { mode: GuardMode },
    /// The station's current mode changed
    CurrentModeChanged { mode: GuardMode },
    /// Alarm event code, see [`crate::alarm::AlarmEvent`]
    AlarmEvent { code: i32 },
    /// Raw vendor property update, diagnostic only
    RawPropertyChanged {
        property_type: u32,
        value: String,
        modified: u64,
    },
    /// Decoded property update, diagnostic only
    PropertyChanged {
        name: String,
        value: serde_json::Value,
    },
}

/// Type alias for the broadcast sender.
pub type EventSender = tokio::sync::broadcast::Sender<StationEvent>;

/// Type alias for the broadcast receiver.
pub type EventReceiver = tokio::sync::broadcast::Receiver<StationEvent>;

/// Create a new event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    tokio::sync::broadcast::channel(capacity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_channel_preserves_order() {
        let (tx, mut rx) = event_channel(8);
        tx.send(StationEvent::GuardModeChanged { mode: GuardMode(0) }).unwrap();
        tx.send(StationEvent::AlarmEvent { code: 8 }).unwrap();
        tx.send(StationEvent::AlarmEvent { code: 16 }).unwrap();

        assert_eq!(rx.recv().await.unwrap(), StationEvent::GuardModeChanged { mode: GuardMode(0) });
        assert_eq!(rx.recv().await.unwrap(), StationEvent::AlarmEvent { code: 8 });
        assert_eq!(rx.recv().await.unwrap(), StationEvent::AlarmEvent { code: 16 });
    }
}

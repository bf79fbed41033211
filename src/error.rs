// MIT License - Copyright (c) 2026 Peter Wright
// Bridge errors

/// All errors that can occur in the eufy-station-bridge library.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("MQTT client error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No guard mode reported yet by station {serial}")]
    NoReading { serial: String },

    #[error("Station disconnected: {serial}")]
    StationDisconnected { serial: String },

    #[error("Invalid station message: {details}")]
    InvalidMessage { details: String },

    #[error("Unknown station: {serial}")]
    UnknownStation { serial: String },

    #[error("Channel closed")]
    ChannelClosed,
}

impl BridgeError {
    /// Whether this error is transient and the operation may succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BridgeError::Mqtt(_)
                | BridgeError::NoReading { .. }
                | BridgeError::StationDisconnected { .. }
                | BridgeError::ChannelClosed
        )
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

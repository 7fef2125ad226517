//! Shared error type across mqttgauge crates.

use thiserror::Error;

/// Stable error codes, used as log fields and stats labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Payload did not split into exactly `name:value`.
    Malformed,
    /// Value is not a finite number.
    InvalidValue,
    /// Exporter refused the gauge.
    Rejected,
    /// Configuration could not be read or validated.
    Config,
    /// Unsupported config version.
    UnsupportedVersion,
    /// MQTT client failure.
    Transport,
    /// Invariant violation.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Malformed => "MALFORMED",
            ErrorCode::InvalidValue => "INVALID_VALUE",
            ErrorCode::Rejected => "REJECTED",
            ErrorCode::Config => "CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Transport => "TRANSPORT",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MqttGaugeError>;

/// Unified error type used by core and bridge.
#[derive(Debug, Error)]
pub enum MqttGaugeError {
    #[error("malformed message: {0}")]
    Malformed(String),
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("config: {0}")]
    Config(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("transport: {0}")]
    Transport(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl MqttGaugeError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            MqttGaugeError::Malformed(_) => ErrorCode::Malformed,
            MqttGaugeError::InvalidValue(_) => ErrorCode::InvalidValue,
            MqttGaugeError::Rejected(_) => ErrorCode::Rejected,
            MqttGaugeError::Config(_) => ErrorCode::Config,
            MqttGaugeError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            MqttGaugeError::Transport(_) => ErrorCode::Transport,
            MqttGaugeError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Input errors are dropped and logged; everything else is an operational fault.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            MqttGaugeError::Malformed(_) | MqttGaugeError::InvalidValue(_) | MqttGaugeError::Rejected(_)
        )
    }
}

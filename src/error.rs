//! # Error Types
//!
//! Custom error types for Balance Bridge using `thiserror`.

use thiserror::Error;

/// Main error type for Balance Bridge
#[derive(Debug, Error)]
pub enum BalanceBridgeError {
    /// Board could not be opened (not found, busy, or permission denied).
    /// Fatal to the session; the caller must trigger a new scan.
    #[error("connection error: {0}")]
    Connection(String),

    /// Factory calibration data was missing or malformed. Fatal.
    #[error("calibration error: {0}")]
    Calibration(String),

    /// No sensor samples were collected during the tare window.
    /// Recoverable: retry the tare without restarting the session.
    #[error("tare failed: no samples collected")]
    Tare,

    /// Unexpected transport failure while weighing. Terminates the session.
    #[error("session I/O error: {0}")]
    SessionIo(String),

    /// Virtual gamepad errors
    #[error("virtual gamepad error: {0}")]
    Sink(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Balance Bridge
pub type Result<T> = std::result::Result<T, BalanceBridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tare_error_display() {
        let err = BalanceBridgeError::Tare;
        assert_eq!(err.to_string(), "tare failed: no samples collected");
    }

    #[test]
    fn test_connection_error_carries_detail() {
        let err = BalanceBridgeError::Connection("device busy".to_string());
        assert!(err.to_string().contains("device busy"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: BalanceBridgeError = io.into();
        assert!(matches!(err, BalanceBridgeError::Io(_)));
    }
}

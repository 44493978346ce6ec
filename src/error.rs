//! SpeechBridge Error Types
//!
//! One variant per command-level failure class. Runtime decode failures are
//! not represented here; they travel on the error event stream instead.

use thiserror::Error;

/// Central error type for SpeechBridge commands
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("model error: {0}")]
    Model(String),

    #[error("recognizer error: {0}")]
    Recognizer(String),

    #[error("speech service error: {0}")]
    Service(String),
}

impl BridgeError {
    /// Stable machine-readable code for each failure class.
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::Model(_) => "MODEL_ERROR",
            BridgeError::Recognizer(_) => "RECOGNIZER_ERROR",
            BridgeError::Service(_) => "SERVICE_ERROR",
        }
    }
}

/// Result type alias for SpeechBridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(BridgeError::Model("x".into()).code(), "MODEL_ERROR");
        assert_eq!(
            BridgeError::Recognizer("x".into()).code(),
            "RECOGNIZER_ERROR"
        );
        assert_eq!(BridgeError::Service("x".into()).code(), "SERVICE_ERROR");
    }

    #[test]
    fn test_error_display_includes_message() {
        let err = BridgeError::Model("model not found at /tmp/nope".into());
        assert!(err.to_string().contains("/tmp/nope"));
    }
}

//! Error types and handling
//!
//! Capture errors cross role boundaries unchanged: whatever the capturer or
//! the permission host reports is what the requester ultimately sees.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced anywhere in the capture pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("a capture session is already in progress")]
    AlreadyRecording,

    #[error("no capture session is in progress")]
    NotRecording,

    #[error("capture permission denied: {0}")]
    PermissionDenied(String),

    #[error("capture stream unavailable: {0}")]
    StreamUnavailable(String),

    #[error("capture finished with no data")]
    EmptyCapture,

    #[error("analysis service unavailable: {0}")]
    DownstreamUnavailable(String),

    #[error("capture error: {0}")]
    Unknown(String),
}

impl CaptureError {
    /// Stable wire code for UI surfaces.
    pub fn code(&self) -> &'static str {
        match self {
            CaptureError::AlreadyRecording => "ALREADY_RECORDING",
            CaptureError::NotRecording => "NOT_RECORDING",
            CaptureError::PermissionDenied(_) => "PERMISSION_DENIED",
            CaptureError::StreamUnavailable(_) => "STREAM_UNAVAILABLE",
            CaptureError::EmptyCapture => "EMPTY_CAPTURE",
            CaptureError::DownstreamUnavailable(_) => "DOWNSTREAM_UNAVAILABLE",
            CaptureError::Unknown(_) => "UNKNOWN",
        }
    }
}

/// Error response for frontend surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<CaptureError> for ErrorResponse {
    fn from(error: CaptureError) -> Self {
        ErrorResponse {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

/// Result type alias using CaptureError
pub type CaptureResult<T> = Result<T, CaptureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_carries_code_and_message() {
        let response = ErrorResponse::from(CaptureError::PermissionDenied("tab 42".to_string()));
        assert_eq!(response.code, "PERMISSION_DENIED");
        assert!(response.message.contains("tab 42"));
    }

    #[test]
    fn test_every_variant_has_a_code() {
        let variants = [
            CaptureError::AlreadyRecording,
            CaptureError::NotRecording,
            CaptureError::PermissionDenied(String::new()),
            CaptureError::StreamUnavailable(String::new()),
            CaptureError::EmptyCapture,
            CaptureError::DownstreamUnavailable(String::new()),
            CaptureError::Unknown(String::new()),
        ];
        for variant in variants {
            assert!(!variant.code().is_empty());
        }
    }
}

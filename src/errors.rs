// SPDX-License-Identifier: MPL-2.0

//! Error types for the capture session and photo pipeline

use std::time::Duration;
use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Camera session errors
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),
    /// Photo capture errors
    #[error("Photo error: {0}")]
    Photo(#[from] PhotoError),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
    /// Storage/filesystem errors
    #[error("Storage error: {0}")]
    Storage(String),
    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

/// Errors raised while negotiating and attaching a camera stream.
///
/// These never escape the session as `Err` values: they are folded into the
/// `Error` / `PermissionDenied` states and the session's `last_error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    /// The user or the OS explicitly refused camera access
    #[error("Camera permission refused: {0}")]
    PermissionRefused(String),
    /// No camera hardware, or every quality tier was rejected
    #[error("Camera unavailable: {0}")]
    DeviceUnavailable(String),
    /// The preview surface was not mounted when negotiation completed
    #[error("Preview surface is not mounted")]
    SurfaceUnavailable,
    /// The preview surface did not decode a first frame in time
    #[error("Timed out after {}s waiting for the first frame", .0.as_secs_f32())]
    AttachTimeout(Duration),
    /// The preview surface reported a playback failure before the first frame
    #[error("Preview playback failed: {0}")]
    PlaybackFailed(String),
}

impl CameraError {
    /// Whether a direct retry may succeed.
    ///
    /// A refused permission needs the user to act outside the app first.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, CameraError::PermissionRefused(_))
    }
}

/// Photo capture errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhotoError {
    /// Capture requested while the session is not ready
    #[error("Camera is not ready")]
    NotReady,
    /// The preview surface had no decoded frame to draw
    #[error("No frame available for capture")]
    NoFrameAvailable,
    /// The encoder produced no output
    #[error("Encoding failed: {0}")]
    EncodeFailed(String),
    /// Writing the encoded still failed
    #[error("Save failed: {0}")]
    SaveFailed(String),
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for PhotoError {
    fn from(err: std::io::Error) -> Self {
        PhotoError::SaveFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_permission_is_terminal() {
        assert!(!CameraError::PermissionRefused("denied".into()).is_retryable());
        assert!(CameraError::DeviceUnavailable("gone".into()).is_retryable());
        assert!(CameraError::SurfaceUnavailable.is_retryable());
        assert!(CameraError::AttachTimeout(Duration::from_secs(10)).is_retryable());
    }

    #[test]
    fn test_timeout_message_mentions_seconds() {
        let msg = CameraError::AttachTimeout(Duration::from_secs(10)).to_string();
        assert!(msg.contains("10s"), "unexpected message: {}", msg);
    }

    #[test]
    fn test_app_error_wraps_photo_error() {
        let err: AppError = PhotoError::NotReady.into();
        assert_eq!(err.to_string(), "Photo error: Camera is not ready");
    }
}

// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::constants::QualityTier;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Which physical camera is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// User-facing (selfie) camera
    Front,
    /// Environment-facing camera
    #[default]
    Rear,
}

impl FacingMode {
    /// The other camera
    pub fn flipped(self) -> Self {
        match self {
            FacingMode::Front => FacingMode::Rear,
            FacingMode::Rear => FacingMode::Front,
        }
    }

    /// Whether previews and stills from this camera are shown mirrored
    pub fn is_mirrored(self) -> bool {
        self == FacingMode::Front
    }
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacingMode::Front => write!(f, "front"),
            FacingMode::Rear => write!(f, "rear"),
        }
    }
}

impl std::str::FromStr for FacingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "front" | "user" | "selfie" => Ok(FacingMode::Front),
            "rear" | "back" | "environment" => Ok(FacingMode::Rear),
            other => Err(format!("unknown facing mode: {}", other)),
        }
    }
}

/// Session status as observed by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionStatus {
    /// No stream, nothing in flight
    #[default]
    Idle,
    /// A stream is being requested or attached
    Negotiating,
    /// The preview is live; capture is allowed
    Ready,
    /// Negotiation failed; a retry may succeed
    Error,
    /// Camera access was refused; needs the user to grant it elsewhere
    PermissionDenied,
}

impl SessionStatus {
    /// Only a ready session may be captured from
    pub fn can_capture(self) -> bool {
        self == SessionStatus::Ready
    }

    /// Whether the UI should offer a direct retry
    pub fn is_retryable(self) -> bool {
        self == SessionStatus::Error
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Negotiating => "negotiating",
            SessionStatus::Ready => "ready",
            SessionStatus::Error => "error",
            SessionStatus::PermissionDenied => "permission denied",
        };
        f.write_str(name)
    }
}

/// Pixel dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether this resolution is at least as large as `other` in both axes
    pub fn covers(&self, other: Resolution) -> bool {
        self.width >= other.width && self.height >= other.height
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One negotiation request, fully specified per tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamConstraints {
    /// Tier these constraints were built from
    pub tier: QualityTier,
    pub facing: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub ideal_aspect_ratio: Option<f64>,
    pub ideal_frame_rate: Option<u32>,
    /// Ask the device not to resize or crop its native frames
    pub suppress_resize: bool,
}

impl StreamConstraints {
    /// Build the constraint set for a tier and facing mode
    pub fn for_tier(tier: QualityTier, facing: FacingMode) -> Self {
        let (ideal_width, ideal_height) = tier.ideal_resolution();
        Self {
            tier,
            facing,
            ideal_width,
            ideal_height,
            ideal_aspect_ratio: tier.ideal_aspect_ratio(),
            ideal_frame_rate: tier.ideal_frame_rate(),
            suppress_resize: tier.suppresses_resize(),
        }
    }

    pub fn ideal_resolution(&self) -> Resolution {
        Resolution::new(self.ideal_width, self.ideal_height)
    }
}

/// A video input device reported by the capture provider
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub id: String,
    /// Human readable label; may be empty before permission is granted
    pub label: String,
    /// Facing of the device when the provider knows it
    pub facing: Option<FacingMode>,
}

/// Kind of media track in a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackKind::Video => write!(f, "video"),
            TrackKind::Audio => write!(f, "audio"),
        }
    }
}

/// Lifecycle of a single media track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    Live,
    Ended,
}

/// Settings the device actually applied to a track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackSettings {
    pub width: u32,
    pub height: u32,
    pub frame_rate: Option<f64>,
    pub facing: Option<FacingMode>,
}

impl TrackSettings {
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }
}

/// One decoded video frame in tightly packed or strided RGBA
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// RGBA pixels, `stride` bytes per row
    pub data: Arc<[u8]>,
    pub stride: u32,
    /// When the frame was decoded
    pub captured_at: Instant,
}

impl VideoFrame {
    /// Wrap tightly packed RGBA pixels
    pub fn from_rgba(width: u32, height: u32, data: Arc<[u8]>) -> Self {
        Self {
            width,
            height,
            data,
            stride: width * 4,
            captured_at: Instant::now(),
        }
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }
}

/// Why a single stream request failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquireError {
    /// Explicit refusal by the user or OS; no other tier may be tried
    #[error("permission refused: {0}")]
    PermissionRefused(String),
    /// The device cannot satisfy the requested constraints
    #[error("constraints not satisfiable: {0}")]
    Unsatisfiable(String),
    /// Any other device failure (busy, disconnected, driver error)
    #[error("device error: {0}")]
    Device(String),
}

impl AcquireError {
    pub fn is_permission_refusal(&self) -> bool {
        matches!(self, AcquireError::PermissionRefused(_))
    }

    /// Diagnostic message without the category prefix
    pub fn message(&self) -> &str {
        match self {
            AcquireError::PermissionRefused(msg)
            | AcquireError::Unsatisfiable(msg)
            | AcquireError::Device(msg) => msg,
        }
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Backend is not available on this system
    #[error("Backend not available: {0}")]
    NotAvailable(String),
    /// Camera device not found
    #[error("Device not found: {0}")]
    DeviceNotFound(String),
    /// The preview surface could not play the stream
    #[error("Playback failed: {0}")]
    Playback(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_flip_round_trips() {
        assert_eq!(FacingMode::Front.flipped(), FacingMode::Rear);
        assert_eq!(FacingMode::Rear.flipped().flipped(), FacingMode::Rear);
        assert!(FacingMode::Front.is_mirrored());
        assert!(!FacingMode::Rear.is_mirrored());
    }

    #[test]
    fn test_facing_parses_browser_names() {
        assert_eq!("user".parse::<FacingMode>(), Ok(FacingMode::Front));
        assert_eq!("environment".parse::<FacingMode>(), Ok(FacingMode::Rear));
        assert!("sideways".parse::<FacingMode>().is_err());
    }

    #[test]
    fn test_high_tier_constraints() {
        let c = StreamConstraints::for_tier(QualityTier::High, FacingMode::Front);
        assert_eq!(c.ideal_resolution(), Resolution::new(4096, 2160));
        assert_eq!(c.ideal_frame_rate, Some(30));
        assert!(c.suppress_resize);
        assert_eq!(c.facing, FacingMode::Front);
    }

    #[test]
    fn test_base_tier_leaves_aspect_ratio_open() {
        let c = StreamConstraints::for_tier(QualityTier::Base, FacingMode::Rear);
        assert_eq!(c.ideal_resolution(), Resolution::new(1280, 720));
        assert_eq!(c.ideal_aspect_ratio, None);
        assert!(!c.suppress_resize);
    }

    #[test]
    fn test_only_ready_can_capture() {
        assert!(SessionStatus::Ready.can_capture());
        for status in [
            SessionStatus::Idle,
            SessionStatus::Negotiating,
            SessionStatus::Error,
            SessionStatus::PermissionDenied,
        ] {
            assert!(!status.can_capture());
        }
    }
}

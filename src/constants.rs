// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Stream quality tiers tried during negotiation
///
/// Each tier is one fixed constraint set. Negotiation walks them from the
/// highest to the lowest and stops at the first one the device accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    /// ~4K at 4:3, 30 fps, no device-side resize
    High,
    /// 1080p at 4:3, 30 fps
    Medium,
    /// 720p, aspect ratio left to the device
    Base,
}

impl QualityTier {
    /// Negotiation order, highest quality first
    pub const FALLBACK_ORDER: [QualityTier; 3] =
        [QualityTier::High, QualityTier::Medium, QualityTier::Base];

    /// Get display name for the tier
    pub fn display_name(&self) -> &'static str {
        match self {
            QualityTier::High => "High",
            QualityTier::Medium => "Medium",
            QualityTier::Base => "Base",
        }
    }

    /// Ideal (width, height) requested at this tier
    pub fn ideal_resolution(&self) -> (u32, u32) {
        match self {
            QualityTier::High => (negotiation::HIGH_WIDTH, negotiation::HIGH_HEIGHT),
            QualityTier::Medium => (negotiation::MEDIUM_WIDTH, negotiation::MEDIUM_HEIGHT),
            QualityTier::Base => (negotiation::BASE_WIDTH, negotiation::BASE_HEIGHT),
        }
    }

    /// Ideal aspect ratio, `None` when the device may pick
    pub fn ideal_aspect_ratio(&self) -> Option<f64> {
        match self {
            QualityTier::High | QualityTier::Medium => Some(negotiation::ASPECT_RATIO),
            QualityTier::Base => None,
        }
    }

    /// Ideal frame rate, `None` when the device may pick
    pub fn ideal_frame_rate(&self) -> Option<u32> {
        match self {
            QualityTier::High | QualityTier::Medium => Some(negotiation::FRAME_RATE),
            QualityTier::Base => None,
        }
    }

    /// Whether the device must deliver native frames without resizing or cropping
    pub fn suppresses_resize(&self) -> bool {
        matches!(self, QualityTier::High)
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (width, height) = self.ideal_resolution();
        write!(f, "{} ({}x{})", self.display_name(), width, height)
    }
}

/// Tier constraint values
pub mod negotiation {
    pub const HIGH_WIDTH: u32 = 4096;
    pub const HIGH_HEIGHT: u32 = 2160;

    pub const MEDIUM_WIDTH: u32 = 1920;
    pub const MEDIUM_HEIGHT: u32 = 1080;

    pub const BASE_WIDTH: u32 = 1280;
    pub const BASE_HEIGHT: u32 = 720;

    /// Aspect ratio requested by the high and medium tiers
    pub const ASPECT_RATIO: f64 = 4.0 / 3.0;

    /// Frame rate requested by the high and medium tiers
    pub const FRAME_RATE: u32 = 30;
}

/// Session timing
pub mod timing {
    use super::Duration;

    /// Upper bound on the wait for the preview's first decoded frame
    pub const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(10);

    /// How often the software preview surface polls its track for a frame
    pub const FRAME_POLL_INTERVAL: Duration = Duration::from_millis(16);
}

/// Still encoding
pub mod encoding {
    /// Quality factor handed to the drawing surface's encoder (0.0 - 1.0)
    pub const MAX_QUALITY: f32 = 1.0;

    /// Highest JPEG quality accepted by the encoder
    pub const JPEG_QUALITY_CEILING: u8 = 100;
}

/// Session event fan-out
pub mod events {
    /// Capacity of the session event broadcast channel
    pub const CHANNEL_CAPACITY: usize = 64;
}

/// File naming for saved stills
pub mod storage {
    /// Prefix of saved still file names
    pub const FILE_PREFIX: &str = "IMG";

    /// Directory name used under the user's pictures / config directories
    pub const APP_DIR: &str = "photobooth";

    /// Configuration file name
    pub const CONFIG_FILE: &str = "config.json";
}

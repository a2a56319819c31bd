// SPDX-License-Identifier: MPL-2.0

//! Still capture from a ready camera session
//!
//! Rasterizes the frame currently shown by the preview surface onto a scratch
//! canvas and encodes it, without interrupting the preview.

use super::canvas::{DrawingSurface, RasterCanvas, Transform};
use super::encoding::EncodingFormat;
use crate::backends::camera::types::FacingMode;
use crate::backends::camera::{CaptureSession, CaptureTarget};
use crate::constants::encoding::MAX_QUALITY;
use crate::errors::PhotoError;
use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One encoded still
///
/// Handed to the caller and not retained by the pipeline.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub id: Uuid,
    /// Natural width of the stream when the still was taken
    pub pixel_width: u32,
    /// Natural height of the stream when the still was taken
    pub pixel_height: u32,
    pub encoded_bytes: Arc<[u8]>,
    pub format: EncodingFormat,
    /// Whether the still was flipped to match a selfie preview
    pub mirrored: bool,
    pub facing: FacingMode,
    pub captured_at: DateTime<Local>,
}

impl CapturedImage {
    pub fn size_bytes(&self) -> usize {
        self.encoded_bytes.len()
    }

    /// Encoded size in megabytes
    pub fn size_mb(&self) -> f64 {
        self.encoded_bytes.len() as f64 / 1024.0 / 1024.0
    }
}

/// Frame capture pipeline
///
/// Owns one scratch drawing surface, reused across captures and resized to
/// the live frame before every draw. Overlapping captures wait for each other.
pub struct FrameCapturePipeline<D: DrawingSurface = RasterCanvas> {
    canvas: Mutex<D>,
}

impl FrameCapturePipeline<RasterCanvas> {
    /// Create a pipeline drawing on a CPU raster canvas
    pub fn new() -> Self {
        Self::with_canvas(RasterCanvas::new())
    }
}

impl Default for FrameCapturePipeline<RasterCanvas> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: DrawingSurface> FrameCapturePipeline<D> {
    /// Create a pipeline drawing on a custom surface
    pub fn with_canvas(canvas: D) -> Self {
        Self {
            canvas: Mutex::new(canvas),
        }
    }

    /// Capture one still from `session`.
    ///
    /// Fails with [`PhotoError::NotReady`] without touching anything unless
    /// the session is `Ready`. Never changes the session's status.
    pub async fn capture(&self, session: &CaptureSession) -> Result<CapturedImage, PhotoError> {
        let target = session.capture_target().ok_or_else(|| {
            debug!(status = %session.status(), "Capture requested while camera not ready");
            PhotoError::NotReady
        })?;
        self.capture_target(&target).await
    }

    /// Capture one still from an already resolved target
    pub async fn capture_target(&self, target: &CaptureTarget) -> Result<CapturedImage, PhotoError> {
        let surface = &target.surface;
        let natural = surface.natural_size().ok_or(PhotoError::NoFrameAvailable)?;
        let frame = surface.current_frame().ok_or(PhotoError::NoFrameAvailable)?;
        let mirrored = target.facing.is_mirrored();

        info!(
            resolution = %natural,
            facing = %target.facing,
            tier = %target.tier,
            "Taking photo"
        );

        let mut canvas = self.canvas.lock().await;
        canvas.resize(natural.width, natural.height);
        canvas.set_smoothing(false);
        if mirrored {
            canvas.set_transform(Transform::MirrorHorizontal);
        }
        canvas.draw_frame(&frame);
        canvas.reset_transform();

        let encoded = canvas
            .encode(EncodingFormat::Jpeg, MAX_QUALITY)
            .await
            .filter(|data| !data.is_empty())
            .ok_or_else(|| {
                warn!("Encoder produced no output");
                PhotoError::EncodeFailed("encoder produced no output".to_string())
            })?;
        drop(canvas);

        let image = CapturedImage {
            id: Uuid::new_v4(),
            pixel_width: natural.width,
            pixel_height: natural.height,
            encoded_bytes: Arc::from(encoded),
            format: EncodingFormat::Jpeg,
            mirrored,
            facing: target.facing,
            captured_at: Local::now(),
        };

        info!(
            id = %image.id,
            size_mb = image.size_mb(),
            mirrored,
            "Photo captured"
        );

        Ok(image)
    }
}

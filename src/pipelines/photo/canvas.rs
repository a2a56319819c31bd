// SPDX-License-Identifier: GPL-3.0-only

//! Off-screen drawing surface used to rasterize one preview frame
//!
//! Resizing a canvas resets its drawing state (transform and smoothing), the
//! way a 2D canvas element does when its dimensions are assigned.

use super::encoding::{EncodingFormat, encode_image};
use crate::backends::camera::types::{Resolution, VideoFrame};
use async_trait::async_trait;
use image::RgbaImage;
use image::imageops::FilterType;
use tracing::{debug, warn};

/// Transform applied while drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transform {
    #[default]
    Identity,
    /// Flip around the vertical axis (selfie orientation)
    MirrorHorizontal,
}

/// Drawing and encoding surface
#[async_trait]
pub trait DrawingSurface: Send {
    /// Set the surface dimensions, clearing it and resetting drawing state
    fn resize(&mut self, width: u32, height: u32);

    fn size(&self) -> Resolution;

    /// Enable or disable resampling when a frame is scaled onto the surface
    fn set_smoothing(&mut self, enabled: bool);

    fn set_transform(&mut self, transform: Transform);

    fn reset_transform(&mut self);

    /// Draw `frame` over the whole surface using the current transform
    fn draw_frame(&mut self, frame: &VideoFrame);

    /// Encode the surface, `None` when the encoder produced nothing
    async fn encode(&self, format: EncodingFormat, quality: f32) -> Option<Vec<u8>>;
}

/// CPU raster canvas backed by an RGBA image buffer
pub struct RasterCanvas {
    image: RgbaImage,
    smoothing: bool,
    transform: Transform,
}

impl RasterCanvas {
    pub fn new() -> Self {
        Self {
            image: RgbaImage::new(0, 0),
            smoothing: true,
            transform: Transform::Identity,
        }
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn smoothing(&self) -> bool {
        self.smoothing
    }

    /// Canvas pixels
    pub fn pixels(&self) -> &RgbaImage {
        &self.image
    }
}

impl Default for RasterCanvas {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy a (possibly strided) frame into a packed image buffer
fn frame_to_image(frame: &VideoFrame) -> Option<RgbaImage> {
    let row_bytes = frame.width as usize * 4;
    let stride = frame.stride as usize;
    let mut packed = Vec::with_capacity(row_bytes * frame.height as usize);
    for y in 0..frame.height as usize {
        let start = y * stride;
        packed.extend_from_slice(frame.data.get(start..start + row_bytes)?);
    }
    RgbaImage::from_raw(frame.width, frame.height, packed)
}

#[async_trait]
impl DrawingSurface for RasterCanvas {
    fn resize(&mut self, width: u32, height: u32) {
        if self.image.dimensions() == (width, height) {
            self.image.fill(0);
        } else {
            self.image = RgbaImage::new(width, height);
        }
        self.smoothing = true;
        self.transform = Transform::Identity;
    }

    fn size(&self) -> Resolution {
        let (width, height) = self.image.dimensions();
        Resolution::new(width, height)
    }

    fn set_smoothing(&mut self, enabled: bool) {
        self.smoothing = enabled;
    }

    fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    fn reset_transform(&mut self) {
        self.transform = Transform::Identity;
    }

    fn draw_frame(&mut self, frame: &VideoFrame) {
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 {
            return;
        }
        let Some(source) = frame_to_image(frame) else {
            warn!(
                width = frame.width,
                height = frame.height,
                bytes = frame.data.len(),
                "Frame buffer shorter than its dimensions, skipping draw"
            );
            return;
        };

        // Scale first so the copy below is always 1:1
        let source = if source.dimensions() == (width, height) {
            source
        } else {
            let filter = if self.smoothing {
                FilterType::Triangle
            } else {
                FilterType::Nearest
            };
            debug!(
                from = %frame.resolution(),
                to = %Resolution::new(width, height),
                smoothing = self.smoothing,
                "Scaling frame onto canvas"
            );
            image::imageops::resize(&source, width, height, filter)
        };

        match self.transform {
            Transform::Identity => self.image.copy_from_slice(source.as_raw()),
            Transform::MirrorHorizontal => {
                for (x, y, pixel) in source.enumerate_pixels() {
                    self.image.put_pixel(width - 1 - x, y, *pixel);
                }
            }
        }
    }

    async fn encode(&self, format: EncodingFormat, quality: f32) -> Option<Vec<u8>> {
        let image = self.image.clone();

        // Run encoding in background task (CPU-bound)
        let result = tokio::task::spawn_blocking(move || encode_image(&image, format, quality)).await;

        match result {
            Ok(Ok(data)) if !data.is_empty() => Some(data),
            Ok(Ok(_)) => None,
            Ok(Err(e)) => {
                warn!(error = %e, "Canvas encoding failed");
                None
            }
            Err(e) => {
                warn!(error = %e, "Encoding task error");
                None
            }
        }
    }
}

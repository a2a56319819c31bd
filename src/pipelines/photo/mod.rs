// SPDX-License-Identifier: MPL-2.0

//! Still photo capture pipeline
//!
//! ```text
//! Preview surface → Canvas (resize, mirror) → Encoding → CapturedImage
//!       ↓
//! Preview continues uninterrupted
//! ```
//!
//! # Pipeline Stages
//!
//! 1. **Capture**: Read the frame the preview is currently showing
//! 2. **Rasterize**: Draw it at natural size onto a scratch canvas, flipped for the front camera
//! 3. **Encoding**: JPEG at maximum quality on a blocking task
//!
//! Saving to disk is left to the caller (see [`crate::storage`]).

pub mod canvas;
pub mod capture;
pub mod encoding;

pub use canvas::{DrawingSurface, RasterCanvas, Transform};
pub use capture::{CapturedImage, FrameCapturePipeline};
pub use encoding::{EncodingFormat, encode_image, jpeg_quality};

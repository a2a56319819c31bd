// SPDX-License-Identifier: MPL-2.0

//! Photobooth - camera session lifecycle and still capture
//!
//! This library manages exclusive access to a camera for a photo-taking
//! screen: negotiating the best stream the hardware grants, attaching it to a
//! preview surface, switching cameras, and capturing stills from the preview.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Provider and surface abstractions, the capture session, and a software camera
//! - [`pipelines`]: Still capture and encoding
//! - [`config`]: User configuration handling
//! - [`storage`]: Saving captured photos
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use photobooth::backends::camera::{CaptureSession, SessionConfig};
//! use photobooth::backends::virtual_camera::{PreviewSurface, SyntheticCameraProvider};
//! use photobooth::pipelines::photo::FrameCapturePipeline;
//!
//! # async fn run() -> Result<(), photobooth::AppError> {
//! let session = CaptureSession::new(
//!     Arc::new(SyntheticCameraProvider::new()),
//!     Arc::new(PreviewSurface::new()),
//!     SessionConfig::default(),
//! );
//! session.start().await;
//! let photo = FrameCapturePipeline::new().capture(&session).await?;
//! println!("{}x{}", photo.pixel_width, photo.pixel_height);
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod storage;

// Re-export commonly used types
pub use backends::camera::{CaptureSession, FacingMode, SessionConfig, SessionEvent, SessionStatus};
pub use config::Config;
pub use constants::QualityTier;
pub use errors::{AppError, AppResult, CameraError, PhotoError};
pub use pipelines::photo::{CapturedImage, FrameCapturePipeline};

// SPDX-License-Identifier: GPL-3.0-only

//! Software camera backend
//!
//! Stands in for real hardware wherever no camera API is available: the
//! command-line front end and the integration tests run whole sessions
//! against it.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────┐
//! │ SyntheticCameraProvider│  ← front/rear devices, permission switch
//! └──────────┬─────────────┘
//!            │ SyntheticStream (one video track, color bars)
//!            ▼
//! ┌────────────────────────┐
//! │    PreviewSurface      │  ← polls the attached track for decoded frames
//! └────────────────────────┘
//! ```

mod pattern;
mod preview;
mod provider;

pub use pattern::color_bars;
pub use preview::PreviewSurface;
pub use provider::{SyntheticCameraProvider, SyntheticDevice, SyntheticStream, SyntheticTrack};

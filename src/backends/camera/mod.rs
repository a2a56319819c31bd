// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! This module defines the seams between the capture session and the outside
//! world, plus the session itself.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │   UI Layer (App)    │  observes status / facing / last error
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐       ┌──────────────────┐
//! │   CaptureSession    │ ────▶ │  RenderSurface   │  ← preview element
//! └──────────┬──────────┘       └──────────────────┘
//!            │ tier negotiation
//!            ▼
//! ┌───────────────────────────┐
//! │ CaptureDeviceProvider     │  ← hardware / OS camera API
//! └───────────────────────────┘
//! ```

pub mod manager;
pub mod negotiation;
pub mod types;

pub use manager::{CaptureSession, CaptureTarget, SessionConfig, SessionEvent, SessionSnapshot};
pub use negotiation::{NegotiatedStream, NegotiationError, TierNegotiator};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// One track of a live media stream
pub trait MediaTrack: Send + Sync {
    fn id(&self) -> &str;

    fn kind(&self) -> TrackKind;

    fn state(&self) -> TrackState;

    /// Settings the device applied to this track
    fn settings(&self) -> TrackSettings;

    /// Latest decoded frame, `None` before the first frame and after `stop`
    fn read_frame(&self) -> Option<VideoFrame>;

    /// Stop the track and release its share of the device.
    ///
    /// Must be safe to call more than once.
    fn stop(&self);
}

/// A live stream handed out by the capture provider
pub trait MediaStream: Send + Sync {
    fn id(&self) -> &str;

    fn tracks(&self) -> Vec<Arc<dyn MediaTrack>>;

    /// First video track, if any
    fn video_track(&self) -> Option<Arc<dyn MediaTrack>> {
        self.tracks()
            .into_iter()
            .find(|track| track.kind() == TrackKind::Video)
    }
}

/// Hardware capture device provider
///
/// The session treats each [`StreamConstraints`] as an opaque request and
/// only interprets the failure category of a rejection.
#[async_trait]
pub trait CaptureDeviceProvider: Send + Sync {
    /// Whether the platform exposes a capture API at all
    fn is_available(&self) -> bool;

    /// Enumerate video input devices
    async fn enumerate_devices(&self) -> BackendResult<Vec<DeviceInfo>>;

    /// Request a stream satisfying `constraints`
    async fn request_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Arc<dyn MediaStream>, AcquireError>;
}

/// Live preview element that decodes and displays a stream
///
/// Only the capture session changes the attached source; the UI layer only
/// renders what is attached.
#[async_trait]
pub trait RenderSurface: Send + Sync {
    /// Whether the element is currently mounted in the view tree
    fn is_mounted(&self) -> bool;

    /// Make `stream` the element's source, replacing any previous one
    fn attach(&self, stream: Arc<dyn MediaStream>);

    /// Clear the element's source
    fn detach(&self);

    /// Whether a source is currently attached
    fn has_source(&self) -> bool;

    /// Resolve once the attached source has decoded its first frame.
    ///
    /// Callers bound this with their own timeout.
    async fn first_frame(&self) -> BackendResult<()>;

    /// Natural pixel dimensions of the playing source
    fn natural_size(&self) -> Option<Resolution>;

    /// The frame currently on screen
    fn current_frame(&self) -> Option<VideoFrame>;
}

/// Stop every track of `stream` individually.
///
/// Tracks that already ended are stopped again, which providers treat as a
/// no-op, so partially started streams are fully released. Returns the number
/// of tracks that were still live.
pub fn stop_tracks(stream: &dyn MediaStream) -> usize {
    let mut stopped = 0;
    for track in stream.tracks() {
        let was_live = track.state() == TrackState::Live;
        track.stop();
        if was_live {
            stopped += 1;
        }
        tracing::debug!(stream = stream.id(), track = track.id(), kind = %track.kind(), "Stopped track");
    }
    stopped
}

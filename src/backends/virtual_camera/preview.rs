// SPDX-License-Identifier: GPL-3.0-only

//! Software preview surface
//!
//! Plays whatever stream the session attaches by reading the latest decoded
//! frame from its video track on demand.

use crate::backends::camera::types::*;
use crate::backends::camera::{MediaStream, MediaTrack, RenderSurface};
use crate::constants::timing;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Renderable surface backed by the attached stream's video track
pub struct PreviewSurface {
    mounted: AtomicBool,
    source: Mutex<Option<Arc<dyn MediaStream>>>,
    attach_count: AtomicUsize,
    poll_interval: Duration,
}

impl PreviewSurface {
    /// A mounted surface with no source
    pub fn new() -> Self {
        Self {
            mounted: AtomicBool::new(true),
            source: Mutex::new(None),
            attach_count: AtomicUsize::new(0),
            poll_interval: timing::FRAME_POLL_INTERVAL,
        }
    }

    /// Mount or unmount the element from the view tree
    pub fn set_mounted(&self, mounted: bool) {
        self.mounted.store(mounted, Ordering::Release);
    }

    /// How many times a source has been attached
    pub fn attach_count(&self) -> usize {
        self.attach_count.load(Ordering::Acquire)
    }

    /// Id of the attached stream
    pub fn source_id(&self) -> Option<String> {
        self.lock_source().as_ref().map(|stream| stream.id().to_string())
    }

    fn video_track(&self) -> Option<Arc<dyn MediaTrack>> {
        self.lock_source()
            .as_ref()
            .and_then(|stream| stream.video_track())
    }

    fn lock_source(&self) -> MutexGuard<'_, Option<Arc<dyn MediaStream>>> {
        self.source.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for PreviewSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RenderSurface for PreviewSurface {
    fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    fn attach(&self, stream: Arc<dyn MediaStream>) {
        debug!(stream = stream.id(), "Preview source attached");
        *self.lock_source() = Some(stream);
        self.attach_count.fetch_add(1, Ordering::AcqRel);
    }

    fn detach(&self) {
        if let Some(stream) = self.lock_source().take() {
            debug!(stream = stream.id(), "Preview source detached");
        }
    }

    fn has_source(&self) -> bool {
        self.lock_source().is_some()
    }

    async fn first_frame(&self) -> BackendResult<()> {
        let mut ticker = tokio::time::interval(self.poll_interval);
        loop {
            ticker.tick().await;

            let track = self
                .video_track()
                .ok_or_else(|| BackendError::Playback("no video source attached".to_string()))?;

            if track.state() == TrackState::Ended {
                return Err(BackendError::Playback(format!(
                    "track {} ended before its first frame",
                    track.id()
                )));
            }

            if let Some(frame) = track.read_frame() {
                debug!(resolution = %frame.resolution(), "Preview decoded first frame");
                return Ok(());
            }
        }
    }

    fn natural_size(&self) -> Option<Resolution> {
        self.current_frame().map(|frame| frame.resolution())
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        self.video_track().and_then(|track| track.read_frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::CaptureDeviceProvider;
    use crate::backends::virtual_camera::{SyntheticCameraProvider, SyntheticDevice};
    use crate::constants::QualityTier;

    fn small_provider() -> SyntheticCameraProvider {
        SyntheticCameraProvider::with_devices(vec![SyntheticDevice::new(
            FacingMode::Rear,
            Resolution::new(32, 24),
        )])
    }

    #[tokio::test]
    async fn test_first_frame_without_source_fails() {
        let surface = PreviewSurface::new();
        assert!(matches!(
            surface.first_frame().await,
            Err(BackendError::Playback(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_frame_resolves_and_reports_size() {
        let provider = small_provider();
        let constraints = StreamConstraints::for_tier(QualityTier::Base, FacingMode::Rear);
        let stream = provider.request_stream(&constraints).await.unwrap();

        let surface = PreviewSurface::new();
        surface.attach(stream);
        surface.first_frame().await.unwrap();

        assert_eq!(surface.natural_size(), Some(Resolution::new(32, 24)));
        assert_eq!(surface.attach_count(), 1);
    }

    #[tokio::test]
    async fn test_detach_clears_source() {
        let provider = small_provider();
        let constraints = StreamConstraints::for_tier(QualityTier::Base, FacingMode::Rear);
        let stream = provider.request_stream(&constraints).await.unwrap();

        let surface = PreviewSurface::new();
        surface.attach(stream);
        assert!(surface.has_source());
        surface.detach();
        surface.detach();
        assert!(!surface.has_source());
        assert!(surface.current_frame().is_none());
    }
}

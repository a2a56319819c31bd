// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic capture device provider
//!
//! Emulates how camera APIs answer tiered constraint requests: a constrained
//! tier is only granted when the device natively covers its resolution, the
//! unconstrained base tier is granted at whatever the device can do.

use super::pattern::color_bars;
use crate::backends::camera::types::*;
use crate::backends::camera::{CaptureDeviceProvider, MediaStream, MediaTrack};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// One emulated camera
#[derive(Debug, Clone)]
pub struct SyntheticDevice {
    pub id: String,
    pub label: String,
    pub facing: FacingMode,
    /// Largest native mode of the sensor
    pub max_resolution: Resolution,
    pub frame_rate: f64,
    /// Never decodes a frame (models a wedged driver)
    pub stalled: bool,
}

impl SyntheticDevice {
    pub fn new(facing: FacingMode, max_resolution: Resolution) -> Self {
        let label = match facing {
            FacingMode::Front => "Synthetic Front Camera",
            FacingMode::Rear => "Synthetic Rear Camera",
        };
        Self {
            id: format!("synthetic-{}", facing),
            label: label.to_string(),
            facing,
            max_resolution,
            frame_rate: 30.0,
            stalled: false,
        }
    }

    /// Make the device hand out streams that never produce a frame
    pub fn stalled(mut self) -> Self {
        self.stalled = true;
        self
    }
}

/// A track producing color bars at a fixed resolution
pub struct SyntheticTrack {
    id: String,
    settings: TrackSettings,
    live: AtomicBool,
    stalled: bool,
    started_at: Instant,
    frame_interval: Duration,
    /// Rendered lazily, dropped on stop
    pixels: Mutex<Option<Arc<[u8]>>>,
}

impl SyntheticTrack {
    fn new(id: String, settings: TrackSettings, stalled: bool) -> Self {
        let fps = settings.frame_rate.unwrap_or(30.0).max(1.0);
        Self {
            id,
            settings,
            live: AtomicBool::new(true),
            stalled,
            started_at: Instant::now(),
            frame_interval: Duration::from_secs_f64(1.0 / fps),
            pixels: Mutex::new(None),
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Bytes of frame data the track still holds
    pub fn retained_bytes(&self) -> usize {
        self.lock_pixels().as_ref().map_or(0, |pixels| pixels.len())
    }

    fn lock_pixels(&self) -> MutexGuard<'_, Option<Arc<[u8]>>> {
        self.pixels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MediaTrack for SyntheticTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TrackKind {
        TrackKind::Video
    }

    fn state(&self) -> TrackState {
        if self.is_live() {
            TrackState::Live
        } else {
            TrackState::Ended
        }
    }

    fn settings(&self) -> TrackSettings {
        self.settings
    }

    fn read_frame(&self) -> Option<VideoFrame> {
        if !self.is_live() || self.stalled {
            return None;
        }
        // The sensor needs one frame interval before the first frame lands
        if self.started_at.elapsed() < self.frame_interval {
            return None;
        }

        let (width, height) = (self.settings.width, self.settings.height);
        let mut pixels = self.lock_pixels();
        // Re-check under the lock so a concurrent stop cannot be undone
        if !self.is_live() {
            return None;
        }
        let pixels = pixels.get_or_insert_with(|| Arc::from(color_bars(width, height)));
        Some(VideoFrame::from_rgba(width, height, Arc::clone(pixels)))
    }

    fn stop(&self) {
        let was_live = self.live.swap(false, Ordering::AcqRel);
        let released = self.lock_pixels().take().map_or(0, |pixels| pixels.len());
        if was_live {
            debug!(track = %self.id, released_bytes = released, "Synthetic track stopped");
        }
    }
}

/// A single-track synthetic stream
pub struct SyntheticStream {
    id: String,
    track: Arc<SyntheticTrack>,
}

impl MediaStream for SyntheticStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        vec![Arc::clone(&self.track) as Arc<dyn MediaTrack>]
    }
}

/// Software capture device provider
pub struct SyntheticCameraProvider {
    devices: Vec<SyntheticDevice>,
    available: bool,
    permission_granted: AtomicBool,
    next_stream: AtomicU64,
    /// Tracks handed out and not yet seen stopped, to audit for leaks
    issued: Mutex<Vec<Arc<SyntheticTrack>>>,
    requests: Mutex<Vec<StreamConstraints>>,
}

impl SyntheticCameraProvider {
    /// A rear camera that tops out at UHD and a 720p front camera
    pub fn new() -> Self {
        Self::with_devices(vec![
            SyntheticDevice::new(FacingMode::Rear, Resolution::new(3840, 2160)),
            SyntheticDevice::new(FacingMode::Front, Resolution::new(1280, 720)),
        ])
    }

    pub fn with_devices(devices: Vec<SyntheticDevice>) -> Self {
        Self {
            devices,
            available: true,
            permission_granted: AtomicBool::new(true),
            next_stream: AtomicU64::new(1),
            issued: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Behave like a platform without any camera API
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Grant or refuse camera permission for later requests
    pub fn set_permission(&self, granted: bool) {
        self.permission_granted.store(granted, Ordering::Release);
    }

    pub fn devices(&self) -> &[SyntheticDevice] {
        &self.devices
    }

    /// Constraints of every request received so far
    pub fn requests(&self) -> Vec<StreamConstraints> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of handed-out tracks that were never stopped
    pub fn live_track_count(&self) -> usize {
        self.issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|track| track.is_live())
            .count()
    }

    /// Frame bytes still held by handed-out tracks
    pub fn retained_frame_bytes(&self) -> usize {
        self.issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|track| track.retained_bytes())
            .sum()
    }

    fn pick_device(&self, facing: FacingMode) -> Option<&SyntheticDevice> {
        // Facing is a preference: fall back to any camera
        self.devices
            .iter()
            .find(|device| device.facing == facing)
            .or_else(|| self.devices.first())
    }
}

impl Default for SyntheticCameraProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureDeviceProvider for SyntheticCameraProvider {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn enumerate_devices(&self) -> BackendResult<Vec<DeviceInfo>> {
        if !self.available {
            return Err(BackendError::NotAvailable(
                "no synthetic capture API".to_string(),
            ));
        }
        if self.devices.is_empty() {
            return Err(BackendError::DeviceNotFound(
                "no synthetic cameras configured".to_string(),
            ));
        }
        let granted = self.permission_granted.load(Ordering::Acquire);
        Ok(self
            .devices
            .iter()
            .map(|device| DeviceInfo {
                id: device.id.clone(),
                // Labels stay hidden until access is granted
                label: if granted {
                    device.label.clone()
                } else {
                    String::new()
                },
                facing: Some(device.facing),
            })
            .collect())
    }

    async fn request_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Arc<dyn MediaStream>, AcquireError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*constraints);

        if !self.permission_granted.load(Ordering::Acquire) {
            return Err(AcquireError::PermissionRefused(
                "NotAllowedError: Permission denied".to_string(),
            ));
        }

        let device = self.pick_device(constraints.facing).ok_or_else(|| {
            AcquireError::Device("NotFoundError: Requested device not found".to_string())
        })?;

        let requested = constraints.ideal_resolution();
        let constrained = constraints.suppress_resize || constraints.ideal_aspect_ratio.is_some();
        let resolution = if device.max_resolution.covers(requested) {
            requested
        } else if constrained {
            return Err(AcquireError::Unsatisfiable(format!(
                "OverconstrainedError: {} cannot deliver {}",
                device.label, requested
            )));
        } else {
            Resolution::new(
                requested.width.min(device.max_resolution.width),
                requested.height.min(device.max_resolution.height),
            )
        };

        let frame_rate = constraints
            .ideal_frame_rate
            .map(|fps| (fps as f64).min(device.frame_rate))
            .unwrap_or(device.frame_rate);

        let n = self.next_stream.fetch_add(1, Ordering::Relaxed);
        let track = Arc::new(SyntheticTrack::new(
            format!("{}-video-{}", device.id, n),
            TrackSettings {
                width: resolution.width,
                height: resolution.height,
                frame_rate: Some(frame_rate),
                facing: Some(device.facing),
            },
            device.stalled,
        ));

        {
            let mut issued = self.issued.lock().unwrap_or_else(PoisonError::into_inner);
            issued.retain(|earlier| earlier.is_live());
            issued.push(Arc::clone(&track));
        }

        info!(device = %device.label, resolution = %resolution, tier = %constraints.tier, "Synthetic stream opened");

        Ok(Arc::new(SyntheticStream {
            id: format!("stream-{}", n),
            track,
        }))
    }
}

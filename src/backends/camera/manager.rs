// SPDX-License-Identifier: GPL-3.0-only

//! Camera session lifecycle manager
//!
//! The session provides:
//! - Tier negotiation and attachment of one live stream to the preview surface
//! - Facing-mode switching
//! - Release of the stream on teardown, re-negotiation and drop
//!
//! Every negotiation gets a generation number. Starting a new negotiation,
//! switching cameras or tearing down bumps the generation, and a negotiation
//! whose generation is no longer current never touches session state again:
//! a late stream is stopped and discarded instead of attached.

use super::negotiation::{NegotiationError, TierNegotiator};
use super::types::*;
use super::{CaptureDeviceProvider, MediaStream, RenderSurface, stop_tracks};
use crate::constants::{QualityTier, events, timing};
use crate::errors::CameraError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

/// Session tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Camera requested by the first negotiation
    pub initial_facing: FacingMode,
    /// Upper bound on the wait for the preview's first decoded frame
    pub first_frame_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_facing: FacingMode::default(),
            first_frame_timeout: timing::FIRST_FRAME_TIMEOUT,
        }
    }
}

/// Notifications published by a session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Status or facing mode changed
    StatusChanged {
        status: SessionStatus,
        facing: FacingMode,
    },
    /// A tier was rejected during negotiation
    TierRejected { tier: QualityTier, reason: String },
    /// A stream was attached and decoded its first frame
    StreamAttached {
        tier: QualityTier,
        resolution: Option<Resolution>,
    },
    /// The owned stream was stopped and detached
    StreamReleased {
        stream_id: String,
        tracks_stopped: usize,
    },
    /// Negotiation ended in `Error` or `PermissionDenied`
    Failed { message: String, retryable: bool },
}

/// Point-in-time view of the session for the UI
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub facing: FacingMode,
    pub last_error: Option<String>,
    pub tier: Option<QualityTier>,
    pub settings: Option<TrackSettings>,
    pub has_stream: bool,
}

/// What the frame capture pipeline needs from a ready session
#[derive(Clone)]
pub struct CaptureTarget {
    pub facing: FacingMode,
    pub tier: QualityTier,
    pub surface: Arc<dyn RenderSurface>,
}

/// The owned stream and how it was obtained
struct ActiveStream {
    stream: Arc<dyn MediaStream>,
    tier: QualityTier,
    settings: Option<TrackSettings>,
}

/// Internal session state
struct SessionState {
    status: SessionStatus,
    facing: FacingMode,
    stream: Option<ActiveStream>,
    last_error: Option<String>,
    /// Facing mode carried by the last `StatusChanged` event
    announced_facing: FacingMode,
}

/// Outcome of waiting for the first decoded frame
enum FirstFrame {
    Decoded,
    Superseded,
    Failed(CameraError),
}

/// Camera capture session
///
/// Owns at most one live stream at a time. The owner keeps the session alive
/// for as long as the preview is shown; dropping it releases the stream.
pub struct CaptureSession {
    provider: Arc<dyn CaptureDeviceProvider>,
    surface: Arc<dyn RenderSurface>,
    config: SessionConfig,
    state: Mutex<SessionState>,
    /// Serializes hardware acquisitions
    negotiation_gate: tokio::sync::Mutex<()>,
    /// Current negotiation generation
    generation: watch::Sender<u64>,
    events: broadcast::Sender<SessionEvent>,
}

impl CaptureSession {
    /// Create an idle session
    ///
    /// # Arguments
    /// * `provider` - Source of camera streams
    /// * `surface` - Preview element the stream is attached to
    /// * `config` - Initial facing mode and first-frame timeout
    pub fn new(
        provider: Arc<dyn CaptureDeviceProvider>,
        surface: Arc<dyn RenderSurface>,
        config: SessionConfig,
    ) -> Self {
        info!(facing = %config.initial_facing, "Creating camera session");

        let (generation, _) = watch::channel(0u64);
        let (events, _) = broadcast::channel(events::CHANNEL_CAPACITY);

        Self {
            provider,
            surface,
            config,
            state: Mutex::new(SessionState {
                status: SessionStatus::Idle,
                facing: config.initial_facing,
                stream: None,
                last_error: None,
                announced_facing: config.initial_facing,
            }),
            negotiation_gate: tokio::sync::Mutex::new(()),
            generation,
            events,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.lock_state().status
    }

    pub fn facing_mode(&self) -> FacingMode {
        self.lock_state().facing
    }

    /// Diagnostic for the last failed negotiation
    pub fn last_error(&self) -> Option<String> {
        self.lock_state().last_error.clone()
    }

    /// Tier of the owned stream
    pub fn active_tier(&self) -> Option<QualityTier> {
        self.lock_state().stream.as_ref().map(|active| active.tier)
    }

    /// Settings the device applied to the owned stream's video track
    pub fn active_settings(&self) -> Option<TrackSettings> {
        self.lock_state()
            .stream
            .as_ref()
            .and_then(|active| active.settings)
    }

    pub fn has_active_stream(&self) -> bool {
        self.lock_state().stream.is_some()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock_state();
        SessionSnapshot {
            status: state.status,
            facing: state.facing,
            last_error: state.last_error.clone(),
            tier: state.stream.as_ref().map(|active| active.tier),
            settings: state.stream.as_ref().and_then(|active| active.settings),
            has_stream: state.stream.is_some(),
        }
    }

    /// The preview surface this session attaches to
    pub fn surface(&self) -> Arc<dyn RenderSurface> {
        Arc::clone(&self.surface)
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Capture target, only while `Ready`
    pub fn capture_target(&self) -> Option<CaptureTarget> {
        let state = self.lock_state();
        if !state.status.can_capture() {
            return None;
        }
        let active = state.stream.as_ref()?;
        Some(CaptureTarget {
            facing: state.facing,
            tier: active.tier,
            surface: Arc::clone(&self.surface),
        })
    }

    /// Negotiate a stream for the current facing mode.
    ///
    /// Valid from any state: a stream that is already owned is released
    /// first, and a negotiation still in flight is superseded. Failures are
    /// folded into the `Error` / `PermissionDenied` states.
    ///
    /// Returns the status once this negotiation settles. If it was superseded
    /// meanwhile, that is whatever status the newer operation left behind.
    pub async fn start(&self) -> SessionStatus {
        let (generation, facing) = self.begin_negotiation(false);
        self.negotiate(generation, facing).await
    }

    /// Re-enter negotiation from tier 1 after a failure
    pub async fn retry(&self) -> SessionStatus {
        info!(status = %self.status(), "Retrying camera negotiation");
        self.start().await
    }

    /// Release the current stream, flip the facing mode and negotiate again
    pub async fn switch_facing(&self) -> SessionStatus {
        info!(from = %self.facing_mode(), "Switching camera");
        let (generation, facing) = self.begin_negotiation(true);
        self.negotiate(generation, facing).await
    }

    /// Release the stream and return to `Idle`.
    ///
    /// Safe from any state and idempotent. Supersedes an in-flight
    /// negotiation.
    pub fn teardown(&self) {
        let mut state = self.lock_state();
        self.bump_generation();
        self.release_locked(&mut state);
        state.last_error = None;
        self.set_status_locked(&mut state, SessionStatus::Idle);
    }

    /// Synchronous half of every negotiation: supersede, release, flip
    fn begin_negotiation(&self, flip_facing: bool) -> (u64, FacingMode) {
        let mut state = self.lock_state();
        let generation = self.bump_generation();
        self.release_locked(&mut state);
        if flip_facing {
            state.facing = state.facing.flipped();
        }
        state.last_error = None;
        self.set_status_locked(&mut state, SessionStatus::Negotiating);
        (generation, state.facing)
    }

    async fn negotiate(&self, generation: u64, facing: FacingMode) -> SessionStatus {
        // Wait for any earlier acquisition to come back before asking the
        // device again. It will see it was superseded and stop its stream.
        let _gate = self.negotiation_gate.lock().await;
        if !self.is_current(generation) {
            return self.status();
        }

        if !self.provider.is_available() {
            return self.fail(
                generation,
                CameraError::DeviceUnavailable(
                    "camera access is not supported on this platform".to_string(),
                ),
            );
        }

        match self.provider.enumerate_devices().await {
            Ok(devices) => {
                info!(count = devices.len(), "Enumerated video input devices");
                for device in &devices {
                    debug!(id = %device.id, label = %device.label, facing = ?device.facing, "Video input");
                }
            }
            Err(e) => warn!(error = %e, "Failed to enumerate devices"),
        }

        let negotiator = TierNegotiator::new(self.provider.as_ref());
        let negotiated = negotiator
            .negotiate(
                facing,
                || self.is_current(generation),
                |tier, err| {
                    let _ = self.events.send(SessionEvent::TierRejected {
                        tier,
                        reason: err.to_string(),
                    });
                },
            )
            .await;

        let negotiated = match negotiated {
            Ok(negotiated) => negotiated,
            Err(NegotiationError::Superseded) => return self.status(),
            Err(e) => match e.into_camera_error() {
                Some(err) => return self.fail(generation, err),
                None => return self.status(),
            },
        };

        {
            let mut state = self.lock_state();
            if !self.is_current(generation) {
                stop_tracks(negotiated.stream.as_ref());
                return state.status;
            }

            if !self.surface.is_mounted() {
                drop(state);
                stop_tracks(negotiated.stream.as_ref());
                return self.fail(generation, CameraError::SurfaceUnavailable);
            }

            let settings = negotiated.stream.video_track().map(|track| track.settings());
            if let Some(settings) = settings {
                info!(
                    resolution = %settings.resolution(),
                    frame_rate = ?settings.frame_rate,
                    facing = ?settings.facing,
                    "Applied track settings"
                );
            }

            self.surface.attach(Arc::clone(&negotiated.stream));
            debug!(stream = negotiated.stream.id(), "Stream attached to preview surface");
            state.stream = Some(ActiveStream {
                stream: negotiated.stream,
                tier: negotiated.tier,
                settings,
            });
        }

        match self.await_first_frame(generation).await {
            FirstFrame::Decoded => {
                let mut state = self.lock_state();
                if !self.is_current(generation) {
                    return state.status;
                }
                let tier = negotiated.tier;
                let resolution = self.surface.natural_size();
                info!(tier = %tier, resolution = ?resolution, "Camera ready");
                let _ = self
                    .events
                    .send(SessionEvent::StreamAttached { tier, resolution });
                self.set_status_locked(&mut state, SessionStatus::Ready);
                state.status
            }
            FirstFrame::Superseded => self.status(),
            FirstFrame::Failed(err) => self.fail(generation, err),
        }
    }

    /// Wait for the first decoded frame, bounded by the configured timeout
    /// and cut short if the negotiation is superseded.
    async fn await_first_frame(&self, generation: u64) -> FirstFrame {
        let timeout = self.config.first_frame_timeout;
        let mut generation_rx = self.generation.subscribe();

        tokio::select! {
            result = tokio::time::timeout(timeout, self.surface.first_frame()) => match result {
                Ok(Ok(())) => FirstFrame::Decoded,
                Ok(Err(e)) => FirstFrame::Failed(CameraError::PlaybackFailed(e.to_string())),
                Err(_) => FirstFrame::Failed(CameraError::AttachTimeout(timeout)),
            },
            _ = generation_rx.wait_for(|current| *current != generation) => FirstFrame::Superseded,
        }
    }

    /// Settle a negotiation as failed, unless it was superseded
    fn fail(&self, generation: u64, err: CameraError) -> SessionStatus {
        let mut state = self.lock_state();
        if !self.is_current(generation) {
            return state.status;
        }

        self.release_locked(&mut state);

        let status = match err {
            CameraError::PermissionRefused(_) => SessionStatus::PermissionDenied,
            _ => SessionStatus::Error,
        };
        let message = err.to_string();
        error!(error = %message, status = %status, "Camera negotiation failed");

        state.last_error = Some(message.clone());
        let _ = self.events.send(SessionEvent::Failed {
            message,
            retryable: err.is_retryable(),
        });
        self.set_status_locked(&mut state, status);
        status
    }

    /// Stop every track of the owned stream and detach it from the surface
    fn release_locked(&self, state: &mut SessionState) {
        if let Some(active) = state.stream.take() {
            let stream_id = active.stream.id().to_string();
            let tracks_stopped = stop_tracks(active.stream.as_ref());
            info!(stream = %stream_id, tracks_stopped, "Released camera stream");
            let _ = self.events.send(SessionEvent::StreamReleased {
                stream_id,
                tracks_stopped,
            });
        }

        if self.surface.has_source() {
            self.surface.detach();
            debug!("Detached preview surface source");
        }
    }

    fn set_status_locked(&self, state: &mut SessionState, status: SessionStatus) {
        let changed = state.status != status || state.announced_facing != state.facing;
        state.status = status;
        state.announced_facing = state.facing;
        if changed {
            debug!(status = %status, facing = %state.facing, "Session status");
            let _ = self.events.send(SessionEvent::StatusChanged {
                status,
                facing: state.facing,
            });
        }
    }

    fn bump_generation(&self) -> u64 {
        let mut next = 0;
        self.generation.send_modify(|generation| {
            *generation += 1;
            next = *generation;
        });
        next
    }

    fn is_current(&self, generation: u64) -> bool {
        *self.generation.borrow() == generation
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        let mut state = self.lock_state();
        if state.stream.is_some() || state.status != SessionStatus::Idle {
            info!("Releasing camera session");
        }
        self.bump_generation();
        self.release_locked(&mut state);
        state.last_error = None;
        state.status = SessionStatus::Idle;
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock_state();
        f.debug_struct("CaptureSession")
            .field("status", &state.status)
            .field("facing", &state.facing)
            .field("has_stream", &state.stream.is_some())
            .field("generation", &*self.generation.borrow())
            .finish()
    }
}

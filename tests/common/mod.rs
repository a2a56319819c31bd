// SPDX-License-Identifier: MPL-2.0

//! Test doubles shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use photobooth::backends::camera::{
    AcquireError, BackendError, BackendResult, CaptureDeviceProvider, CaptureSession, DeviceInfo,
    FacingMode, MediaStream, MediaTrack, RenderSurface, Resolution, SessionConfig,
    SessionEvent, StreamConstraints, TrackKind, TrackSettings, TrackState, VideoFrame,
};
use photobooth::pipelines::photo::{DrawingSurface, EncodingFormat, Transform};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

/// How the provider answers one stream request
#[derive(Debug, Clone)]
pub enum Reply {
    Grant,
    /// Grant a stream whose audio track has already ended
    GrantPartial,
    /// Grant after a delay, to let a newer operation overtake the request
    GrantAfter(Duration),
    Refuse,
    Unsatisfiable,
    DeviceError,
}

/// Video frame with a red left half and a blue right half
pub fn split_frame(width: u32, height: u32) -> VideoFrame {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for _ in 0..height {
        for x in 0..width {
            if x < width / 2 {
                data.extend_from_slice(&[255, 0, 0, 255]);
            } else {
                data.extend_from_slice(&[0, 0, 255, 255]);
            }
        }
    }
    VideoFrame::from_rgba(width, height, Arc::from(data))
}

pub struct MockTrack {
    id: String,
    kind: TrackKind,
    settings: TrackSettings,
    frame: VideoFrame,
    live: AtomicBool,
    stop_calls: AtomicUsize,
}

impl MockTrack {
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    /// End the track on the device side, without a `stop` call
    pub fn end(&self) {
        self.live.store(false, Ordering::SeqCst);
    }
}

impl MediaTrack for MockTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TrackKind {
        self.kind
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
        (self.is_live() && self.kind == TrackKind::Video).then(|| self.frame.clone())
    }

    fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct MockStream {
    id: String,
    tracks: Vec<Arc<MockTrack>>,
}

impl MediaStream for MockStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        self.tracks
            .iter()
            .map(|track| Arc::clone(track) as Arc<dyn MediaTrack>)
            .collect()
    }
}

/// Provider answering requests from a script, granting once it runs out
pub struct ScriptedProvider {
    available: bool,
    frame_size: Resolution,
    script: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<StreamConstraints>>,
    tracks: Mutex<Vec<Arc<MockTrack>>>,
    next_stream: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Reply>) -> Self {
        Self {
            available: true,
            frame_size: Resolution::new(32, 16),
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            tracks: Mutex::new(Vec::new()),
            next_stream: AtomicUsize::new(1),
        }
    }

    pub fn granting() -> Self {
        Self::new(Vec::new())
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::granting()
        }
    }

    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_size = Resolution::new(width, height);
        self
    }

    pub fn requests(&self) -> Vec<StreamConstraints> {
        self.requests.lock().unwrap().clone()
    }

    /// Every track handed out so far
    pub fn tracks(&self) -> Vec<Arc<MockTrack>> {
        self.tracks.lock().unwrap().clone()
    }

    pub fn live_tracks(&self) -> usize {
        self.tracks().iter().filter(|t| t.is_live()).count()
    }

    pub fn streams_granted(&self) -> usize {
        self.next_stream.load(Ordering::SeqCst) - 1
    }

    fn grant(&self, constraints: &StreamConstraints) -> Arc<dyn MediaStream> {
        self.grant_with(constraints, false)
    }

    fn grant_with(&self, constraints: &StreamConstraints, audio_ended: bool) -> Arc<dyn MediaStream> {
        let n = self.next_stream.fetch_add(1, Ordering::SeqCst);
        let settings = TrackSettings {
            width: self.frame_size.width,
            height: self.frame_size.height,
            frame_rate: Some(30.0),
            facing: Some(constraints.facing),
        };
        let make_track = |kind: TrackKind| {
            Arc::new(MockTrack {
                id: format!("stream-{}-{}", n, kind),
                kind,
                settings,
                frame: split_frame(self.frame_size.width, self.frame_size.height),
                live: AtomicBool::new(true),
                stop_calls: AtomicUsize::new(0),
            })
        };
        let tracks = vec![make_track(TrackKind::Video), make_track(TrackKind::Audio)];
        if audio_ended {
            tracks[1].end();
        }
        self.tracks.lock().unwrap().extend(tracks.iter().cloned());
        Arc::new(MockStream {
            id: format!("stream-{}", n),
            tracks,
        })
    }
}

#[async_trait]
impl CaptureDeviceProvider for ScriptedProvider {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn enumerate_devices(&self) -> BackendResult<Vec<DeviceInfo>> {
        Ok(vec![DeviceInfo {
            id: "scripted".to_string(),
            label: "Scripted Camera".to_string(),
            facing: None,
        }])
    }

    async fn request_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Arc<dyn MediaStream>, AcquireError> {
        self.requests.lock().unwrap().push(*constraints);
        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Grant);
        match reply {
            Reply::Grant => Ok(self.grant(constraints)),
            Reply::GrantPartial => Ok(self.grant_with(constraints, true)),
            Reply::GrantAfter(delay) => {
                tokio::time::sleep(delay).await;
                Ok(self.grant(constraints))
            }
            Reply::Refuse => Err(AcquireError::PermissionRefused(
                "NotAllowedError: Permission denied".to_string(),
            )),
            Reply::Unsatisfiable => Err(AcquireError::Unsatisfiable(format!(
                "OverconstrainedError: {}x{}",
                constraints.ideal_width, constraints.ideal_height
            ))),
            Reply::DeviceError => Err(AcquireError::Device(
                "NotReadableError: device busy".to_string(),
            )),
        }
    }
}

/// How the surface answers the first-frame wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstFrameMode {
    Immediate,
    Never,
    Fail,
}

/// Render surface with scripted playback
pub struct ControllableSurface {
    mounted: AtomicBool,
    mode: Mutex<FirstFrameMode>,
    source: Mutex<Option<Arc<dyn MediaStream>>>,
    attached: Mutex<Vec<Arc<dyn MediaStream>>>,
    /// Live tracks of earlier sources seen at each attach
    leaks_at_attach: Mutex<Vec<usize>>,
}

impl ControllableSurface {
    pub fn new(mode: FirstFrameMode) -> Self {
        Self {
            mounted: AtomicBool::new(true),
            mode: Mutex::new(mode),
            source: Mutex::new(None),
            attached: Mutex::new(Vec::new()),
            leaks_at_attach: Mutex::new(Vec::new()),
        }
    }

    pub fn unmounted() -> Self {
        let surface = Self::new(FirstFrameMode::Immediate);
        surface.mounted.store(false, Ordering::SeqCst);
        surface
    }

    pub fn set_mode(&self, mode: FirstFrameMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn attach_count(&self) -> usize {
        self.attached.lock().unwrap().len()
    }

    pub fn leaks_at_attach(&self) -> Vec<usize> {
        self.leaks_at_attach.lock().unwrap().clone()
    }

    pub fn source_id(&self) -> Option<String> {
        self.source
            .lock()
            .unwrap()
            .as_ref()
            .map(|stream| stream.id().to_string())
    }
}

#[async_trait]
impl RenderSurface for ControllableSurface {
    fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    fn attach(&self, stream: Arc<dyn MediaStream>) {
        let mut attached = self.attached.lock().unwrap();
        let leaked = attached
            .iter()
            .flat_map(|earlier| earlier.tracks())
            .filter(|track| track.state() == TrackState::Live)
            .count();
        self.leaks_at_attach.lock().unwrap().push(leaked);
        attached.push(Arc::clone(&stream));
        *self.source.lock().unwrap() = Some(stream);
    }

    fn detach(&self) {
        self.source.lock().unwrap().take();
    }

    fn has_source(&self) -> bool {
        self.source.lock().unwrap().is_some()
    }

    async fn first_frame(&self) -> BackendResult<()> {
        let mode = *self.mode.lock().unwrap();
        match mode {
            FirstFrameMode::Immediate => {
                if self.has_source() {
                    Ok(())
                } else {
                    Err(BackendError::Playback("no source".to_string()))
                }
            }
            FirstFrameMode::Never => std::future::pending().await,
            FirstFrameMode::Fail => Err(BackendError::Playback("decoder error".to_string())),
        }
    }

    fn natural_size(&self) -> Option<Resolution> {
        self.current_frame().map(|frame| frame.resolution())
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        self.source
            .lock()
            .unwrap()
            .as_ref()
            .and_then(|stream| stream.video_track())
            .and_then(|track| track.read_frame())
    }
}

/// Drawing operations seen by [`RecordingCanvas`]
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasOp {
    Resize(u32, u32),
    Smoothing(bool),
    SetTransform(Transform),
    ResetTransform,
    Draw(Transform),
    Encode(f32),
}

/// Canvas that records every call, optionally failing to encode
pub struct RecordingCanvas {
    ops: Arc<Mutex<Vec<CanvasOp>>>,
    size: Resolution,
    transform: Transform,
    encode_output: Option<Vec<u8>>,
}

impl RecordingCanvas {
    pub fn new() -> (Self, Arc<Mutex<Vec<CanvasOp>>>) {
        let ops = Arc::new(Mutex::new(Vec::new()));
        let canvas = Self {
            ops: Arc::clone(&ops),
            size: Resolution::new(0, 0),
            transform: Transform::Identity,
            encode_output: Some(vec![0xFF, 0xD8, 0xFF, 0xD9]),
        };
        (canvas, ops)
    }

    /// A canvas whose encoder yields nothing
    pub fn failing() -> (Self, Arc<Mutex<Vec<CanvasOp>>>) {
        let (mut canvas, ops) = Self::new();
        canvas.encode_output = None;
        (canvas, ops)
    }

    fn record(&self, op: CanvasOp) {
        self.ops.lock().unwrap().push(op);
    }
}

#[async_trait]
impl DrawingSurface for RecordingCanvas {
    fn resize(&mut self, width: u32, height: u32) {
        self.size = Resolution::new(width, height);
        self.transform = Transform::Identity;
        self.record(CanvasOp::Resize(width, height));
    }

    fn size(&self) -> Resolution {
        self.size
    }

    fn set_smoothing(&mut self, enabled: bool) {
        self.record(CanvasOp::Smoothing(enabled));
    }

    fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.record(CanvasOp::SetTransform(transform));
    }

    fn reset_transform(&mut self) {
        self.transform = Transform::Identity;
        self.record(CanvasOp::ResetTransform);
    }

    fn draw_frame(&mut self, _frame: &VideoFrame) {
        self.record(CanvasOp::Draw(self.transform));
    }

    async fn encode(&self, _format: EncodingFormat, quality: f32) -> Option<Vec<u8>> {
        self.record(CanvasOp::Encode(quality));
        self.encode_output.clone()
    }
}

pub fn session_with(
    provider: &Arc<ScriptedProvider>,
    surface: &Arc<ControllableSurface>,
    facing: FacingMode,
) -> CaptureSession {
    CaptureSession::new(
        Arc::clone(provider) as Arc<dyn CaptureDeviceProvider>,
        Arc::clone(surface) as Arc<dyn RenderSurface>,
        SessionConfig {
            initial_facing: facing,
            ..SessionConfig::default()
        },
    )
}

/// Everything published so far
pub fn drain(events: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

/// Statuses in the order they were announced
pub fn statuses(events: &[SessionEvent]) -> Vec<photobooth::SessionStatus> {
    events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::StatusChanged { status, .. } => Some(*status),
            _ => None,
        })
        .collect()
}

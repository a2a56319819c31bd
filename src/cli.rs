// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Taking photos
//! - Watching a negotiation play out

use photobooth::backends::camera::{
    CaptureDeviceProvider, CaptureSession, FacingMode, Resolution, SessionEvent,
};
use photobooth::backends::virtual_camera::{
    PreviewSurface, SyntheticCameraProvider, SyntheticDevice,
};
use photobooth::pipelines::photo::FrameCapturePipeline;
use photobooth::{Config, SessionStatus, storage};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

/// List all available cameras
pub async fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let provider = SyntheticCameraProvider::new();
    let cameras = provider.enumerate_devices().await?;

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        let facing = camera
            .facing
            .map(|f| f.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!("  [{}] {} ({})", index, camera.label, facing);
        if let Some(device) = provider.devices().iter().find(|d| d.id == camera.id) {
            println!(
                "      Max: {}@{}fps",
                device.max_resolution, device.frame_rate as u32
            );
        }
        println!();
    }

    Ok(())
}

/// Take a photo with the requested camera and save it
pub async fn take_photo(
    config: &Config,
    facing: Option<FacingMode>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session_config = config.session_config();
    if let Some(facing) = facing {
        session_config.initial_facing = facing;
    }

    let session = CaptureSession::new(
        Arc::new(SyntheticCameraProvider::new()),
        Arc::new(PreviewSurface::new()),
        session_config,
    );

    println!("Opening {} camera...", session.facing_mode());
    let status = session.start().await;
    if status != SessionStatus::Ready {
        let message = session
            .last_error()
            .unwrap_or_else(|| format!("camera ended in state {}", status));
        return Err(message.into());
    }
    if let (Some(tier), Some(settings)) = (session.active_tier(), session.active_settings()) {
        println!("Streaming at {} (requested {})", settings.resolution(), tier);
    }

    let pipeline = FrameCapturePipeline::new();
    let photo = pipeline.capture(&session).await?;

    let output_dir = output.unwrap_or_else(|| config.photos_dir());
    let path = storage::save_captured_image(&photo, &output_dir).await?;

    println!(
        "Photo saved: {} ({}x{}, {:.2} MB{})",
        path.display(),
        photo.pixel_width,
        photo.pixel_height,
        photo.size_mb(),
        if photo.mirrored { ", mirrored" } else { "" }
    );

    session.teardown();
    Ok(())
}

/// Options for [`simulate`]
pub struct SimulateOptions {
    pub facing: FacingMode,
    pub deny_permission: bool,
    pub max_width: u32,
    pub max_height: u32,
    pub stall: bool,
}

/// Negotiate against one emulated device and print the session's events
pub async fn simulate(
    config: &Config,
    options: SimulateOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut device = SyntheticDevice::new(
        options.facing,
        Resolution::new(options.max_width, options.max_height),
    );
    if options.stall {
        device = device.stalled();
    }
    let provider = Arc::new(SyntheticCameraProvider::with_devices(vec![device]));
    provider.set_permission(!options.deny_permission);

    let mut session_config = config.session_config();
    session_config.initial_facing = options.facing;
    let session = CaptureSession::new(
        provider.clone(),
        Arc::new(PreviewSurface::new()),
        session_config,
    );

    let mut events = session.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(skipped)) => println!("  ... {} events skipped", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let status = session.start().await;
    let snapshot = session.snapshot();
    session.teardown();
    drop(session);
    printer.await?;

    println!();
    println!("Final status: {}", status);
    if let Some(tier) = snapshot.tier {
        println!("Tier:         {}", tier);
    }
    if let Some(settings) = snapshot.settings {
        println!("Settings:     {}", settings.resolution());
    }
    if let Some(error) = snapshot.last_error {
        println!("Error:        {}", error);
    }
    println!("Requests:     {}", provider.requests().len());
    println!("Leaked tracks: {}", provider.live_track_count());

    Ok(())
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::StatusChanged { status, facing } => {
            println!("status    {} ({})", status, facing)
        }
        SessionEvent::TierRejected { tier, reason } => {
            println!("rejected  {}: {}", tier, reason)
        }
        SessionEvent::StreamAttached { tier, resolution } => match resolution {
            Some(resolution) => println!("attached  {} at {}", tier, resolution),
            None => println!("attached  {}", tier),
        },
        SessionEvent::StreamReleased {
            stream_id,
            tracks_stopped,
        } => println!("released  {} ({} tracks stopped)", stream_id, tracks_stopped),
        SessionEvent::Failed { message, retryable } => {
            let hint = if *retryable { "retry available" } else { "no retry" };
            println!("failed    {} ({})", message, hint)
        }
    }
}

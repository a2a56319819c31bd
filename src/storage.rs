// SPDX-License-Identifier: MPL-2.0

//! Storage utilities for saving captured photos

use crate::constants::storage::{APP_DIR, FILE_PREFIX};
use crate::errors::PhotoError;
use crate::pipelines::photo::CapturedImage;
use std::path::{Path, PathBuf};
use tracing::info;

/// Get default photo directory
pub fn default_photos_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join(APP_DIR)
}

/// File name for a capture: `IMG_<timestamp>_<short id>.<ext>`
pub fn photo_file_name(image: &CapturedImage) -> String {
    let timestamp = image.captured_at.format("%Y%m%d_%H%M%S");
    let id = image.id.simple().to_string();
    format!(
        "{}_{}_{}.{}",
        FILE_PREFIX,
        timestamp,
        &id[..8],
        image.format.extension()
    )
}

/// Save a captured image into `output_dir`
///
/// Creates the directory if needed. Returns the path written.
pub async fn save_captured_image(
    image: &CapturedImage,
    output_dir: &Path,
) -> Result<PathBuf, PhotoError> {
    let filepath = output_dir.join(photo_file_name(image));
    info!(path = %filepath.display(), "Saving photo");

    // Write to disk in background task (I/O-bound)
    let dir = output_dir.to_path_buf();
    let target = filepath.clone();
    let data = image.encoded_bytes.clone();
    tokio::task::spawn_blocking(move || {
        std::fs::create_dir_all(&dir)?;
        std::fs::write(&target, &data)
    })
    .await
    .map_err(|e| PhotoError::SaveFailed(format!("save task error: {}", e)))??;

    info!(path = %filepath.display(), size = image.size_bytes(), "Photo saved successfully");
    Ok(filepath)
}

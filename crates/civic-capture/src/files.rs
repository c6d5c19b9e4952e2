//! Local file selection → image payload
use civic_core::{CivicError, DeviceError, ImagePayload};
use std::path::Path;
use tracing::debug;

/// Largest image a user may upload (10 MiB)
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// MIME type for a supported image extension
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Read an image file into a data-URI payload
pub async fn read_image_file(path: &Path, max_bytes: u64) -> Result<ImagePayload, CivicError> {
    let mime = mime_for_path(path).ok_or_else(|| {
        DeviceError::File(format!("{} is not a supported image type", path.display()))
    })?;

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| DeviceError::File(format!("{}: {}", path.display(), e)))?;
    if !metadata.is_file() {
        return Err(DeviceError::File(format!("{} is not a file", path.display())).into());
    }
    if metadata.len() > max_bytes {
        return Err(DeviceError::File(format!(
            "{} is {} bytes, the limit is {}",
            path.display(),
            metadata.len(),
            max_bytes
        ))
        .into());
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| DeviceError::File(format!("{}: {}", path.display(), e)))?;
    debug!(path = %path.display(), bytes = bytes.len(), mime, "image file read");
    ImagePayload::encode(mime, &bytes)
}

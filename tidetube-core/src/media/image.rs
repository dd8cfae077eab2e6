//! Base64 image transfer for federated thumbnails

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use super::{MediaError, MediaResult};

/// Decodes base64 image data and writes it as `output_dir/file_name`.
///
/// # Errors
/// - `MediaError::InvalidBase64` - Data is not valid base64
/// - `MediaError::IoErrorWithOperation` - Image could not be written
pub async fn decode_base64_image(
    data: &str,
    output_dir: &Path,
    file_name: &str,
) -> MediaResult<PathBuf> {
    let bytes = STANDARD.decode(data.trim())?;
    let path = output_dir.join(file_name);

    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|source| MediaError::IoErrorWithOperation {
            operation: format!("writing image {}", path.display()),
            source,
        })?;

    tracing::debug!("Decoded {} byte image into {}", bytes.len(), path.display());
    Ok(path)
}

/// Reads an image file and returns it base64 encoded.
///
/// # Errors
/// - `MediaError::IoErrorWithOperation` - Image could not be read
pub async fn read_base64_image(path: &Path) -> MediaResult<String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| MediaError::IoErrorWithOperation {
            operation: format!("reading image {}", path.display()),
            source,
        })?;
    Ok(STANDARD.encode(bytes))
}

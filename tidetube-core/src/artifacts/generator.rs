//! Individual artifact generation steps
//!
//! Each step takes owned arguments so the pipeline can run it as its own
//! task.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ThumbnailSize;
use crate::media::{FrameExtractor, FrameRequest, MediaResult, decode_base64_image};
use crate::torrent::{InfoHash, TorrentCreator, TorrentError, TorrentUrls};

/// Writes the torrent of `source` to `output`, naming its single file `file_name`.
///
/// # Errors
/// - `TorrentError::Io` - Source unreadable or torrent not writable
/// - `TorrentError::EmptySource` - Source has no content
/// - `TorrentError::InvalidTorrentFile` - Written torrent does not parse back
pub async fn generate_torrent(
    source: PathBuf,
    output: PathBuf,
    file_name: String,
    urls: TorrentUrls,
) -> Result<InfoHash, TorrentError> {
    TorrentCreator::new()
        .write_torrent_file(&source, &output, &file_name, &urls)
        .await
}

/// Extracts a thumbnail scaled to `size`.
///
/// # Errors
/// - `MediaError` - Extraction failed
pub async fn generate_thumbnail(
    extractor: Arc<dyn FrameExtractor>,
    source: PathBuf,
    output_dir: PathBuf,
    file_name: String,
    size: ThumbnailSize,
) -> MediaResult<PathBuf> {
    extractor
        .extract_frame(FrameRequest {
            source: &source,
            output_dir: &output_dir,
            file_name: &file_name,
            size: Some(size),
        })
        .await
}

/// Extracts a preview at the source resolution.
///
/// # Errors
/// - `MediaError` - Extraction failed
pub async fn generate_preview(
    extractor: Arc<dyn FrameExtractor>,
    source: PathBuf,
    output_dir: PathBuf,
    file_name: String,
) -> MediaResult<PathBuf> {
    extractor
        .extract_frame(FrameRequest {
            source: &source,
            output_dir: &output_dir,
            file_name: &file_name,
            size: None,
        })
        .await
}

/// Stores the thumbnail a peer sent along with a remote video.
///
/// # Errors
/// - `MediaError::InvalidBase64` - Thumbnail data is not base64
/// - `MediaError::IoErrorWithOperation` - Thumbnail could not be written
pub async fn persist_remote_thumbnail(
    thumbnail_base64: String,
    output_dir: PathBuf,
    file_name: String,
) -> MediaResult<PathBuf> {
    decode_base64_image(&thumbnail_base64, &output_dir, &file_name).await
}

//! Test fixtures for pipeline and library testing.
//!
//! Provides a frame extractor that needs no ffmpeg installation, plus
//! standard video details and media files.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::media::{FrameExtractor, FrameRequest, MediaError, MediaResult};
use crate::video::VideoDetails;

/// Smallest byte sequence recognised as a JPEG (SOI, APP0 marker, EOI).
pub const FAKE_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0xFF, 0xD9];

/// Frame extractor writing a fixed image and reporting a fixed duration.
#[derive(Debug, Default)]
pub struct StaticFrameExtractor {
    duration: u32,
    fail: bool,
    extract_calls: AtomicUsize,
}

impl StaticFrameExtractor {
    /// Succeeds on every call, reporting `duration` seconds.
    pub fn new(duration: u32) -> Self {
        Self {
            duration,
            ..Default::default()
        }
    }

    /// Fails every call as if ffmpeg had crashed.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// Number of `extract_frame` calls so far.
    pub fn extract_calls(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
    }

    fn failure() -> MediaError {
        MediaError::ToolFailed {
            binary: "ffmpeg",
            exit_code: Some(1),
            stderr: "simulated failure".to_string(),
        }
    }
}

#[async_trait]
impl FrameExtractor for StaticFrameExtractor {
    async fn extract_frame(&self, request: FrameRequest<'_>) -> MediaResult<PathBuf> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Self::failure());
        }

        let path = request.output_path();
        tokio::fs::write(&path, FAKE_JPEG)
            .await
            .map_err(|source| MediaError::IoErrorWithOperation {
                operation: format!("writing frame {}", path.display()),
                source,
            })?;
        Ok(path)
    }

    async fn probe_duration(&self, _source: &Path) -> MediaResult<u32> {
        if self.fail {
            return Err(Self::failure());
        }
        Ok(self.duration)
    }
}

/// Valid details for a video called `name`.
pub fn sample_details(name: &str) -> VideoDetails {
    VideoDetails {
        name: name.to_string(),
        description: "A short sample clip".to_string(),
        author: "alice".to_string(),
        duration: 10,
        tags: ["sample".to_string(), "clip".to_string()]
            .into_iter()
            .collect(),
    }
}

/// Writes `len` bytes of patterned media data to `dir/name`.
///
/// # Panics
///
/// Panics if the file cannot be written. Acceptable in fixtures where
/// failures indicate environment issues.
pub fn write_sample_media(dir: &Path, name: &str, len: usize) -> PathBuf {
    let path = dir.join(name);
    let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    std::fs::write(&path, data).unwrap();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_extractor_writes_image() {
        let temp_dir = tempfile::tempdir().unwrap();
        let extractor = StaticFrameExtractor::new(42);

        let path = extractor
            .extract_frame(FrameRequest {
                source: Path::new("unused.mp4"),
                output_dir: temp_dir.path(),
                file_name: "frame.jpg",
                size: None,
            })
            .await
            .unwrap();

        assert_eq!(std::fs::read(path).unwrap(), FAKE_JPEG);
        assert_eq!(extractor.probe_duration(Path::new("x")).await.unwrap(), 42);
        assert_eq!(extractor.extract_calls(), 1);
    }

    #[tokio::test]
    async fn test_failing_extractor() {
        let extractor = StaticFrameExtractor::failing();
        assert!(extractor.probe_duration(Path::new("x")).await.is_err());
    }
}

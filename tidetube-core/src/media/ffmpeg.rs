//! ffmpeg/ffprobe backed frame extraction and duration probing

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use super::{FrameExtractor, FrameRequest, MediaError, MediaResult};

/// Top-level ffprobe JSON output (`-print_format json -show_format`).
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
}

/// Format-level metadata from ffprobe.
#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Production extractor shelling out to the ffmpeg and ffprobe binaries
#[derive(Debug, Clone)]
pub struct FfmpegFrameExtractor {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
}

impl Default for FfmpegFrameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegFrameExtractor {
    /// Uses `ffmpeg` and `ffprobe` from `PATH`.
    pub fn new() -> Self {
        Self::with_binaries(PathBuf::from("ffmpeg"), PathBuf::from("ffprobe"))
    }

    /// Uses explicit binary locations.
    pub fn with_binaries(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
        }
    }

    /// Check if both binaries run.
    pub fn is_available(&self) -> bool {
        [&self.ffmpeg_path, &self.ffprobe_path].iter().all(|binary| {
            std::process::Command::new(binary)
                .arg("-version")
                .output()
                .map(|output| output.status.success())
                .unwrap_or(false)
        })
    }

    /// Duration in fractional seconds as reported by ffprobe
    async fn probe_seconds(&self, source: &Path) -> MediaResult<f64> {
        let output = tokio::process::Command::new(&self.ffprobe_path)
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(source)
            .output()
            .await
            .map_err(|source| MediaError::ToolUnavailable {
                binary: "ffprobe",
                source,
            })?;

        if !output.status.success() {
            return Err(MediaError::ToolFailed {
                binary: "ffprobe",
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        parse_probe_seconds(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Reads `format.duration` from ffprobe JSON output.
///
/// # Errors
/// - `MediaError::InvalidProbeOutput` - Malformed JSON, missing or negative duration
pub fn parse_probe_seconds(probe_json: &str) -> MediaResult<f64> {
    let probe: FfprobeOutput =
        serde_json::from_str(probe_json).map_err(|e| MediaError::InvalidProbeOutput {
            reason: e.to_string(),
        })?;

    let duration = probe
        .format
        .and_then(|format| format.duration)
        .ok_or_else(|| MediaError::InvalidProbeOutput {
            reason: "format.duration missing".to_string(),
        })?;

    let seconds: f64 = duration
        .trim()
        .parse()
        .map_err(|_| MediaError::InvalidProbeOutput {
            reason: format!("unparsable duration {duration:?}"),
        })?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(MediaError::InvalidProbeOutput {
            reason: format!("invalid duration {seconds}"),
        });
    }

    Ok(seconds)
}

/// Floors fractional seconds to whole seconds.
pub fn floor_seconds(seconds: f64) -> u32 {
    seconds.floor().min(f64::from(u32::MAX)) as u32
}

#[async_trait]
impl FrameExtractor for FfmpegFrameExtractor {
    async fn extract_frame(&self, request: FrameRequest<'_>) -> MediaResult<PathBuf> {
        let output_path = request.output_path();
        // Middle of the video, like a single timemark at 50%
        let timestamp = self.probe_seconds(request.source).await? / 2.0;

        let mut cmd = tokio::process::Command::new(&self.ffmpeg_path);
        cmd.arg("-y")
            .arg("-ss")
            .arg(format!("{timestamp:.3}"))
            .arg("-i")
            .arg(request.source)
            .arg("-frames:v")
            .arg("1");

        if let Some(size) = request.size {
            cmd.arg("-vf")
                .arg(format!("scale={}:{}", size.width, size.height));
        }

        cmd.arg("-q:v").arg("2").arg(&output_path);

        tracing::debug!("Executing FFmpeg command: {:?}", cmd);

        let output = cmd.output().await.map_err(|source| {
            tracing::error!("Failed to execute FFmpeg: {}", source);
            MediaError::ToolUnavailable {
                binary: "ffmpeg",
                source,
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            tracing::error!("FFmpeg failed with exit code {}: {}", output.status, stderr);
            return Err(MediaError::ToolFailed {
                binary: "ffmpeg",
                exit_code: output.status.code(),
                stderr,
            });
        }

        if !tokio::fs::try_exists(&output_path).await.unwrap_or(false) {
            return Err(MediaError::MissingOutput { path: output_path });
        }

        tracing::info!(
            "Extracted frame at {:.3}s of {} into {}",
            timestamp,
            request.source.display(),
            output_path.display()
        );

        Ok(output_path)
    }

    async fn probe_duration(&self, source: &Path) -> MediaResult<u32> {
        let seconds = self.probe_seconds(source).await?;
        Ok(floor_seconds(seconds))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::config::ThumbnailSize;

    #[test]
    fn test_probe_duration_floors() {
        let seconds = parse_probe_seconds(r#"{"format": {"duration": "10.900000"}}"#).unwrap();
        assert_eq!(floor_seconds(seconds), 10);
        assert_eq!(floor_seconds(0.99), 0);
        assert_eq!(floor_seconds(7.0), 7);
    }

    #[test]
    fn test_probe_output_without_duration() {
        let result = parse_probe_seconds(r#"{"format": {"format_name": "mov,mp4"}}"#);
        assert!(matches!(result, Err(MediaError::InvalidProbeOutput { .. })));

        let result = parse_probe_seconds(r#"{"streams": []}"#);
        assert!(matches!(result, Err(MediaError::InvalidProbeOutput { .. })));
    }

    #[test]
    fn test_probe_output_with_bad_duration() {
        for json in [
            r#"{"format": {"duration": "N/A"}}"#,
            r#"{"format": {"duration": "-3.0"}}"#,
            "not json",
        ] {
            assert!(parse_probe_seconds(json).is_err(), "accepted {json}");
        }
    }

    #[tokio::test]
    async fn test_missing_binary_reports_unavailable() {
        let extractor = FfmpegFrameExtractor::with_binaries(
            PathBuf::from("/nonexistent/ffmpeg"),
            PathBuf::from("/nonexistent/ffprobe"),
        );
        assert!(!extractor.is_available());

        let result = extractor.probe_duration(Path::new("clip.mp4")).await;
        assert!(matches!(
            result,
            Err(MediaError::ToolUnavailable {
                binary: "ffprobe",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_extract_and_probe_real_media() {
        let extractor = FfmpegFrameExtractor::new();
        if !extractor.is_available() {
            return;
        }

        let temp_dir = tempdir().unwrap();
        let source = temp_dir.path().join("sample.mp4");
        let status = tokio::process::Command::new("ffmpeg")
            .args([
                "-y",
                "-f",
                "lavfi",
                "-i",
                "testsrc=duration=10.9:size=320x240:rate=10",
                "-pix_fmt",
                "yuv420p",
            ])
            .arg(&source)
            .output()
            .await
            .unwrap();
        assert!(status.status.success());

        assert_eq!(extractor.probe_duration(&source).await.unwrap(), 10);

        let thumbnail = extractor
            .extract_frame(FrameRequest {
                source: &source,
                output_dir: temp_dir.path(),
                file_name: "thumb.jpg",
                size: Some(ThumbnailSize {
                    width: 200,
                    height: 110,
                }),
            })
            .await
            .unwrap();
        let preview = extractor
            .extract_frame(FrameRequest {
                source: &source,
                output_dir: temp_dir.path(),
                file_name: "preview.jpg",
                size: None,
            })
            .await
            .unwrap();

        assert!(thumbnail.exists());
        assert!(preview.exists());
        // Full resolution preview is larger than the scaled thumbnail
        assert!(
            std::fs::metadata(&preview).unwrap().len()
                > std::fs::metadata(&thumbnail).unwrap().len()
        );
    }
}

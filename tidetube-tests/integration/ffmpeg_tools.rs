//! Real ffmpeg/ffprobe runs; skipped when the tools are not installed

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use tidetube_core::artifacts::ArtifactPaths;
use tidetube_core::test_fixtures::sample_details;
use tidetube_core::{FfmpegFrameExtractor, FrameExtractor, VideoUpload};

use crate::common::{InstanceOptions, instance_with};

fn ffmpeg_available() -> bool {
    FfmpegFrameExtractor::new().is_available()
}

/// Renders a test pattern video of `seconds` length.
fn create_test_video(dir: &Path, seconds: f64) -> PathBuf {
    let path = dir.join("pattern.mp4");
    let status = Command::new("ffmpeg")
        .args([
            "-y",
            "-f",
            "lavfi",
            "-i",
            &format!("testsrc=duration={seconds}:size=640x360:rate=10"),
            "-pix_fmt",
            "yuv420p",
        ])
        .arg(&path)
        .output()
        .expect("Failed to run FFmpeg");
    assert!(status.status.success(), "FFmpeg should render the pattern");
    path
}

#[tokio::test]
async fn test_probe_floors_duration() {
    if !ffmpeg_available() {
        return;
    }

    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_test_video(temp_dir.path(), 10.9);

    let duration = FfmpegFrameExtractor::new()
        .probe_duration(&source)
        .await
        .unwrap();
    assert_eq!(duration, 10);
}

#[tokio::test]
async fn test_publish_with_ffmpeg() {
    if !ffmpeg_available() {
        return;
    }

    let extractor = Arc::new(FfmpegFrameExtractor::new());
    let node = instance_with(InstanceOptions::default(), extractor.clone());
    let source = create_test_video(node.dir.path(), 4.0);

    let mut details = sample_details("Pattern");
    details.duration = extractor.probe_duration(&source).await.unwrap();

    let video = node
        .library
        .publish(VideoUpload { source, details })
        .await
        .unwrap();

    let paths = ArtifactPaths::for_video(&video, &node.config.storage);
    let thumbnail = std::fs::read(&paths.thumbnail).unwrap();
    let preview = std::fs::read(&paths.preview).unwrap();

    // Both are JPEGs
    assert_eq!(&thumbnail[..2], &[0xFF, 0xD8]);
    assert_eq!(&preview[..2], &[0xFF, 0xD8]);
    // The preview keeps the source resolution
    assert!(preview.len() > thumbnail.len());
    assert_eq!(video.duration, 4);
}

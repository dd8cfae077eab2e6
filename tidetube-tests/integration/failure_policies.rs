//! Creation failures and deletion policies

use std::sync::Arc;
use std::time::Duration;

use tidetube_core::artifacts::{ArtifactKind, ArtifactPaths};
use tidetube_core::config::DeletionPolicy;
use tidetube_core::test_fixtures::{StaticFrameExtractor, sample_details, write_sample_media};
use tidetube_core::{ArtifactError, DeletionError, TidetubeError, VideoUpload};

use crate::common::{InstanceOptions, instance, instance_with};

#[tokio::test]
async fn test_failed_creation_stores_nothing() {
    let node = instance_with(
        InstanceOptions::default(),
        Arc::new(StaticFrameExtractor::failing()),
    );
    let source = write_sample_media(node.dir.path(), "clip.mp4", 4096);

    let result = node
        .library
        .publish(VideoUpload {
            source,
            details: sample_details("Clip"),
        })
        .await;

    assert!(matches!(
        result,
        Err(TidetubeError::Artifact(ArtifactError::Image { .. }))
    ));
    assert!(node.library.list().await.unwrap().is_empty());
    // Without cleanup the torrent task still finished its work
    assert_eq!(node.files_in(&node.config.storage.torrents_dir).len(), 1);
}

#[tokio::test]
async fn test_cleanup_on_failure_removes_everything() {
    let node = instance_with(
        InstanceOptions {
            cleanup_on_failure: true,
            ..Default::default()
        },
        Arc::new(StaticFrameExtractor::failing()),
    );
    let source = write_sample_media(node.dir.path(), "clip.mp4", 4096);

    let result = node
        .library
        .publish(VideoUpload {
            source,
            details: sample_details("Clip"),
        })
        .await;

    assert!(result.is_err());
    assert!(node.library.list().await.unwrap().is_empty());
    assert!(node.all_artifacts().is_empty());
}

#[tokio::test]
async fn test_empty_media_aborts_creation() {
    let node = instance(InstanceOptions::default());
    let source = write_sample_media(node.dir.path(), "empty.mp4", 0);

    let result = node
        .library
        .publish(VideoUpload {
            source,
            details: sample_details("Clip"),
        })
        .await;

    let err = result.unwrap_err();
    assert!(err.is_user_error());
    assert!(node.library.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_with_missing_artifacts_succeeds() {
    for policy in [DeletionPolicy::FailFast, DeletionPolicy::BestEffort] {
        let node = instance(InstanceOptions {
            deletion_policy: policy,
            ..Default::default()
        });
        let video = node.publish("Clip").await;
        let paths = ArtifactPaths::for_video(&video, &node.config.storage);
        std::fs::remove_file(&paths.preview).unwrap();
        std::fs::remove_file(&paths.torrent).unwrap();

        node.library.remove(video.id).await.unwrap();
        assert!(node.all_artifacts().is_empty());
    }
}

/// Replaces the preview with a non-empty directory so removing it fails.
fn block_preview_removal(paths: &ArtifactPaths) {
    std::fs::remove_file(&paths.preview).unwrap();
    std::fs::create_dir_all(paths.preview.join("locked")).unwrap();
}

#[tokio::test]
async fn test_best_effort_deletion_finishes_siblings() {
    let node = instance(InstanceOptions {
        deletion_policy: DeletionPolicy::BestEffort,
        ..Default::default()
    });
    let video = node.publish("Clip").await;
    let paths = ArtifactPaths::for_video(&video, &node.config.storage);
    block_preview_removal(&paths);

    let result = node.library.remove(video.id).await;

    assert!(matches!(
        result,
        Err(TidetubeError::Deletion(DeletionError::Io {
            kind: ArtifactKind::Preview,
            ..
        }))
    ));
    // Record stays, every other artifact is gone
    assert_eq!(node.library.get(video.id).await.unwrap(), video);
    assert!(!paths.source_file.exists());
    assert!(!paths.torrent.exists());
    assert!(!paths.thumbnail.exists());
}

#[tokio::test]
async fn test_fail_fast_deletion_reports_failure() {
    let node = instance(InstanceOptions {
        deletion_policy: DeletionPolicy::FailFast,
        ..Default::default()
    });
    let video = node.publish("Clip").await;
    let paths = ArtifactPaths::for_video(&video, &node.config.storage);
    block_preview_removal(&paths);

    let result = node.library.remove(video.id).await;

    assert!(matches!(result, Err(TidetubeError::Deletion(_))));
    assert!(node.library.get(video.id).await.is_ok());

    // Sibling removals were not cancelled by the early return
    let siblings_done = tokio::time::timeout(Duration::from_secs(5), async {
        while paths.torrent.exists() || paths.thumbnail.exists() || paths.source_file.exists() {
            tokio::task::yield_now().await;
        }
    })
    .await;
    assert!(siblings_done.is_ok(), "detached removals never finished");
    assert!(!paths.torrent.exists());
    assert!(!paths.thumbnail.exists());
    assert!(!paths.source_file.exists());
}

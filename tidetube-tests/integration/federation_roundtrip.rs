//! Export from one instance, import into another

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tidetube_core::artifacts::ArtifactPaths;
use tidetube_core::test_fixtures::FAKE_JPEG;
use tidetube_core::{ArtifactReadError, PeerVideoPayload, TidetubeError};

use crate::common::{InstanceOptions, instance};

#[tokio::test]
async fn test_exported_video_imports_as_remote() {
    let origin = instance(InstanceOptions {
        host: "origin.example",
        ..Default::default()
    });
    let mirror = instance(InstanceOptions {
        host: "mirror.example",
        ..Default::default()
    });

    let owned = origin.publish("Clip").await;
    let payload = origin.library.export(owned.id).await.unwrap();

    assert_eq!(payload.remote_id, owned.id.to_string());
    assert_eq!(payload.pod_url, "origin.example:9000");
    assert_eq!(STANDARD.decode(&payload.thumbnail_base64).unwrap(), FAKE_JPEG);

    // Payload travels as JSON
    let json = serde_json::to_string(&payload).unwrap();
    assert!(json.contains("\"thumbnailBase64\""));
    let received: PeerVideoPayload = serde_json::from_str(&json).unwrap();

    let remote = mirror.library.import_remote(received).await.unwrap();

    assert!(!remote.is_owned());
    assert_ne!(remote.id, owned.id);
    assert_eq!(remote.remote_id(), Some(owned.id.to_string().as_str()));
    assert_eq!(remote.info_hash, owned.info_hash);
    assert_eq!(remote.preview_name(), format!("{}.jpg", owned.id));
    assert_eq!(remote.torrent_name(), format!("{}.torrent", owned.id));
    assert_eq!(remote.thumbnail_name(), format!("{}.jpg", remote.id));

    let magnet = mirror.library.magnet(remote.id).await.unwrap();
    assert_eq!(
        magnet.exact_source,
        format!("http://origin.example:9000/static/torrents/{}.torrent", owned.id)
    );
    assert_eq!(magnet.announce, vec!["ws://origin.example:9000/tracker/socket"]);
    assert_eq!(
        magnet.url_list,
        vec![format!("http://origin.example:9000/static/webseed/{}.mp4", owned.id)]
    );

    // Only the thumbnail is stored for a remote video
    let storage = &mirror.config.storage;
    assert_eq!(
        mirror.files_in(&storage.thumbnails_dir),
        vec![remote.thumbnail_name()]
    );
    assert!(mirror.files_in(&storage.torrents_dir).is_empty());
    assert!(mirror.files_in(&storage.previews_dir).is_empty());
    assert!(mirror.files_in(&storage.videos_dir).is_empty());

    let client = mirror.library.client_view(remote.id).await.unwrap();
    assert_eq!(client.pod_url, "origin.example:9000");
    assert!(!client.is_local);
}

#[tokio::test]
async fn test_remote_video_is_not_reexported() {
    let origin = instance(InstanceOptions {
        host: "origin.example",
        ..Default::default()
    });
    let mirror = instance(InstanceOptions::default());

    let owned = origin.publish("Clip").await;
    let payload = origin.library.export(owned.id).await.unwrap();
    let remote = mirror.library.import_remote(payload).await.unwrap();

    let result = mirror.library.export(remote.id).await;
    assert!(matches!(
        result,
        Err(TidetubeError::ArtifactRead(ArtifactReadError::NotOwned { .. }))
    ));
}

#[tokio::test]
async fn test_removing_remote_video_keeps_origin_files() {
    let origin = instance(InstanceOptions {
        host: "origin.example",
        ..Default::default()
    });
    let mirror = instance(InstanceOptions::default());

    let owned = origin.publish("Clip").await;
    let payload = origin.library.export(owned.id).await.unwrap();
    let remote = mirror.library.import_remote(payload).await.unwrap();

    // A stray file named like the origin's preview must survive
    let stray_preview = mirror.config.storage.previews_dir.join(remote.preview_name());
    std::fs::create_dir_all(&mirror.config.storage.previews_dir).unwrap();
    std::fs::write(&stray_preview, FAKE_JPEG).unwrap();

    mirror.library.remove(remote.id).await.unwrap();

    let paths = ArtifactPaths::for_video(&remote, &mirror.config.storage);
    assert!(!paths.thumbnail.exists());
    assert!(stray_preview.exists());
    assert!(mirror.library.list().await.unwrap().is_empty());

    // The origin still has everything
    assert_eq!(origin.all_artifacts().len(), 4);
}

#[tokio::test]
async fn test_invalid_payload_is_rejected() {
    let origin = instance(InstanceOptions::default());
    let mirror = instance(InstanceOptions::default());

    let owned = origin.publish("Clip").await;
    let mut payload = origin.library.export(owned.id).await.unwrap();
    payload.thumbnail_base64 = "%%%".to_string();

    let result = mirror.library.import_remote(payload).await;
    assert!(matches!(result, Err(TidetubeError::Validation(_))));
    assert!(mirror.all_artifacts().is_empty());
}

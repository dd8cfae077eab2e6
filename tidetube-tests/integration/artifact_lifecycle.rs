//! Publish and remove owned videos end to end

use std::collections::HashSet;

use sha1::{Digest, Sha1};
use tidetube_core::artifacts::ArtifactPaths;
use tidetube_core::torrent::{BencodeParser, MagnetUri};

use crate::common::{InstanceOptions, instance};

#[tokio::test]
async fn test_publish_creates_every_artifact() {
    let node = instance(InstanceOptions {
        host: "peertube.example",
        ..Default::default()
    });
    let video = node.publish("Clip").await;
    let paths = ArtifactPaths::for_video(&video, &node.config.storage);

    assert!(video.is_owned());
    assert!(paths.source_file.exists());
    assert!(paths.torrent.exists());
    assert!(paths.thumbnail.exists());
    assert!(paths.preview.exists());
    assert_eq!(node.library.list().await.unwrap(), vec![video.clone()]);
}

#[tokio::test]
async fn test_info_hash_matches_written_torrent() {
    let node = instance(InstanceOptions {
        host: "peertube.example",
        ..Default::default()
    });
    let video = node.publish("Clip").await;
    let paths = ArtifactPaths::for_video(&video, &node.config.storage);

    let torrent = std::fs::read(&paths.torrent).unwrap();
    let span = BencodeParser::info_dictionary_span(&torrent).unwrap();
    let expected = hex::encode(Sha1::digest(&torrent[span]));
    assert_eq!(video.info_hash.as_deref(), Some(expected.as_str()));

    let metadata = BencodeParser::parse_torrent_file(&paths.torrent).await.unwrap();
    assert_eq!(metadata.name, video.video_filename());
    assert_eq!(metadata.total_length, 64 * 1024);
    assert_eq!(
        metadata.announce_urls,
        vec!["ws://peertube.example:9000/tracker/socket"]
    );
    assert_eq!(
        metadata.web_seeds,
        vec![format!(
            "http://peertube.example:9000/static/webseed/{}.mp4",
            video.id
        )]
    );
}

#[tokio::test]
async fn test_magnet_of_published_video() {
    let node = instance(InstanceOptions {
        host: "peertube.example",
        ..Default::default()
    });
    let video = node.publish("Clip").await;
    let info_hash = video.info_hash.clone().unwrap();

    let uri = node.library.magnet(video.id).await.unwrap().to_string();
    assert!(uri.starts_with(&format!("magnet:?xt=urn:btih:{info_hash}")));
    assert!(uri.contains("&dn=Clip"));
    assert!(uri.contains(&format!("{}.torrent", video.id)));
    assert!(magnet_url::Magnet::new(&uri).is_ok());

    let parsed = MagnetUri::parse(&uri).unwrap();
    assert_eq!(
        parsed.announce,
        vec!["ws://peertube.example:9000/tracker/socket"]
    );

    let client = node.library.client_view(video.id).await.unwrap();
    assert_eq!(client.magnet_uri, uri);
}

#[tokio::test]
async fn test_remove_deletes_artifacts_and_record() {
    let node = instance(InstanceOptions::default());
    let video = node.publish("Clip").await;

    node.library.remove(video.id).await.unwrap();

    assert!(node.all_artifacts().is_empty());
    assert!(node.library.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_publishes_never_share_files() {
    let node = instance(InstanceOptions::default());
    let names = ["First", "Second", "Third", "Fourth"];

    let videos = futures::future::join_all(names.iter().map(|name| node.publish(name))).await;

    let ids: HashSet<_> = videos.iter().map(|video| video.id).collect();
    assert_eq!(ids.len(), names.len());

    // Four artifacts per video, no overwrites
    assert_eq!(node.all_artifacts().len(), names.len() * 4);

    let mut seen = HashSet::new();
    for video in &videos {
        for name in [
            video.video_filename(),
            video.torrent_name(),
            video.thumbnail_name(),
        ] {
            assert!(seen.insert(name));
        }
    }
}

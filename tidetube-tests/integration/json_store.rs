//! Library backed by the JSON manifest store

use std::sync::Arc;

use tidetube_core::library::JsonFileStore;
use tidetube_core::test_fixtures::{StaticFrameExtractor, sample_details, write_sample_media};
use tidetube_core::{TidetubeConfig, VideoLibrary, VideoUpload};

async fn open_library(config: &Arc<TidetubeConfig>) -> VideoLibrary<JsonFileStore> {
    let store = JsonFileStore::open(
        &config.storage.manifest_path,
        config.storage.temp_file_suffix,
    )
    .await
    .unwrap();
    VideoLibrary::new(
        Arc::clone(config),
        Arc::new(StaticFrameExtractor::new(10)),
        store,
    )
}

#[tokio::test]
async fn test_published_video_survives_restart() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = Arc::new(TidetubeConfig::for_testing(&temp_dir.path().join("storage")));
    let source = write_sample_media(temp_dir.path(), "clip.webm", 8192);

    let video = {
        let library = open_library(&config).await;
        library
            .publish(VideoUpload {
                source,
                details: sample_details("Clip"),
            })
            .await
            .unwrap()
    };
    assert!(config.storage.manifest_path.exists());

    let library = open_library(&config).await;
    assert_eq!(library.get(video.id).await.unwrap(), video);
    assert_eq!(video.video_filename(), format!("{}.webm", video.id));

    library.remove(video.id).await.unwrap();

    let library = open_library(&config).await;
    assert!(library.list().await.unwrap().is_empty());
}

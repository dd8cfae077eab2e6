//! Shared setup for integration suites

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use tidetube_core::config::{DeletionPolicy, WebserverConfig};
use tidetube_core::library::MemoryVideoStore;
use tidetube_core::test_fixtures::{StaticFrameExtractor, sample_details, write_sample_media};
use tidetube_core::{FrameExtractor, TidetubeConfig, Video, VideoLibrary, VideoUpload};

/// An instance with its own storage root and public address.
pub struct TestInstance {
    pub dir: TempDir,
    pub config: Arc<TidetubeConfig>,
    pub library: VideoLibrary<MemoryVideoStore>,
}

/// Options for building a test instance.
pub struct InstanceOptions {
    pub host: &'static str,
    pub deletion_policy: DeletionPolicy,
    pub cleanup_on_failure: bool,
}

impl Default for InstanceOptions {
    fn default() -> Self {
        Self {
            host: "localhost",
            deletion_policy: DeletionPolicy::FailFast,
            cleanup_on_failure: false,
        }
    }
}

pub fn instance(options: InstanceOptions) -> TestInstance {
    instance_with(options, Arc::new(StaticFrameExtractor::new(10)))
}

pub fn instance_with(options: InstanceOptions, extractor: Arc<dyn FrameExtractor>) -> TestInstance {
    let dir = tempfile::tempdir().unwrap();
    let mut config = TidetubeConfig::for_testing(&dir.path().join("storage"));
    config.webserver = WebserverConfig {
        https: false,
        host: options.host.to_string(),
        port: 9000,
    };
    config.pipeline.deletion_policy = options.deletion_policy;
    config.pipeline.cleanup_on_failure = options.cleanup_on_failure;

    let config = Arc::new(config);
    let library = VideoLibrary::new(Arc::clone(&config), extractor, MemoryVideoStore::new());

    TestInstance {
        dir,
        config,
        library,
    }
}

impl TestInstance {
    /// Publishes a generated media file under `name`.
    pub async fn publish(&self, name: &str) -> Video {
        let source = write_sample_media(self.dir.path(), &format!("{name}.mp4"), 64 * 1024);
        self.library
            .publish(VideoUpload {
                source,
                details: sample_details(name),
            })
            .await
            .unwrap()
    }

    /// Files currently present in a storage directory.
    pub fn files_in(&self, dir: &Path) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Every file below the storage root.
    pub fn all_artifacts(&self) -> Vec<String> {
        let storage = &self.config.storage;
        [
            &storage.videos_dir,
            &storage.thumbnails_dir,
            &storage.previews_dir,
            &storage.torrents_dir,
        ]
        .into_iter()
        .flat_map(|dir| self.files_in(dir))
        .collect()
    }
}

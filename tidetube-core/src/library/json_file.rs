//! Video store persisted as a JSON manifest on disk
//!
//! The whole manifest is rewritten on every change: serialized to a
//! temporary sibling file, then renamed over the old one.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;

use super::{StoreError, VideoStore};
use crate::video::{Video, VideoId};

/// Video store backed by a single JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    manifest_path: PathBuf,
    temp_path: PathBuf,
    videos: Mutex<BTreeMap<VideoId, Video>>,
}

impl JsonFileStore {
    /// Opens the manifest at `manifest_path`, starting empty if it does not exist.
    ///
    /// # Errors
    ///
    /// - `StoreError::Io` - Manifest exists but cannot be read
    /// - `StoreError::Serialization` - Manifest is not a valid video list
    pub async fn open(manifest_path: &Path, temp_file_suffix: &str) -> Result<Self, StoreError> {
        let videos = match fs::read(manifest_path).await {
            Ok(bytes) => {
                let videos: Vec<Video> = serde_json::from_slice(&bytes)?;
                videos.into_iter().map(|video| (video.id, video)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => {
                return Err(StoreError::Io {
                    operation: format!("reading manifest {}", manifest_path.display()),
                    source,
                });
            }
        };

        tracing::debug!(
            "Opened manifest {} with {} videos",
            manifest_path.display(),
            videos.len()
        );

        let mut temp_name = manifest_path.as_os_str().to_owned();
        temp_name.push(temp_file_suffix);

        Ok(Self {
            manifest_path: manifest_path.to_path_buf(),
            temp_path: PathBuf::from(temp_name),
            videos: Mutex::new(videos),
        })
    }

    async fn persist(&self, videos: &BTreeMap<VideoId, Video>) -> Result<(), StoreError> {
        let mut records: Vec<&Video> = videos.values().collect();
        records.sort_by_key(|video| video.created_at);
        let bytes = serde_json::to_vec_pretty(&records)?;

        if let Some(parent) = self.manifest_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| self.io_error("creating manifest directory", source))?;
        }

        fs::write(&self.temp_path, &bytes)
            .await
            .map_err(|source| self.io_error("writing temporary manifest", source))?;
        fs::rename(&self.temp_path, &self.manifest_path)
            .await
            .map_err(|source| self.io_error("replacing manifest", source))?;

        Ok(())
    }

    fn io_error(&self, operation: &str, source: std::io::Error) -> StoreError {
        StoreError::Io {
            operation: format!("{operation} for {}", self.manifest_path.display()),
            source,
        }
    }
}

#[async_trait]
impl VideoStore for JsonFileStore {
    async fn insert(&self, video: Video) -> Result<(), StoreError> {
        let mut videos = self.videos.lock().await;
        if videos.contains_key(&video.id) {
            return Err(StoreError::DuplicateId { id: video.id });
        }

        let id = video.id;
        videos.insert(id, video);
        if let Err(e) = self.persist(&videos).await {
            videos.remove(&id);
            return Err(e);
        }
        Ok(())
    }

    async fn get(&self, id: VideoId) -> Result<Option<Video>, StoreError> {
        Ok(self.videos.lock().await.get(&id).cloned())
    }

    async fn remove(&self, id: VideoId) -> Result<Option<Video>, StoreError> {
        let mut videos = self.videos.lock().await;
        let Some(video) = videos.remove(&id) else {
            return Ok(None);
        };

        if let Err(e) = self.persist(&videos).await {
            videos.insert(id, video);
            return Err(e);
        }
        Ok(Some(video))
    }

    async fn list(&self) -> Result<Vec<Video>, StoreError> {
        let mut videos: Vec<Video> = self.videos.lock().await.values().cloned().collect();
        videos.sort_by_key(|video| video.created_at);
        Ok(videos)
    }
}

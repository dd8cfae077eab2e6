//! In-memory video store

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{StoreError, VideoStore};
use crate::video::{Video, VideoId};

/// Video store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryVideoStore {
    videos: RwLock<BTreeMap<VideoId, Video>>,
}

impl MemoryVideoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoStore for MemoryVideoStore {
    async fn insert(&self, video: Video) -> Result<(), StoreError> {
        let mut videos = self.videos.write();
        if videos.contains_key(&video.id) {
            return Err(StoreError::DuplicateId { id: video.id });
        }
        videos.insert(video.id, video);
        Ok(())
    }

    async fn get(&self, id: VideoId) -> Result<Option<Video>, StoreError> {
        Ok(self.videos.read().get(&id).cloned())
    }

    async fn remove(&self, id: VideoId) -> Result<Option<Video>, StoreError> {
        Ok(self.videos.write().remove(&id))
    }

    async fn list(&self) -> Result<Vec<Video>, StoreError> {
        let mut videos: Vec<Video> = self.videos.read().values().cloned().collect();
        videos.sort_by_key(|video| video.created_at);
        Ok(videos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::sample_details;
    use crate::video::VideoExtension;

    #[tokio::test]
    async fn test_insert_get_remove() {
        let store = MemoryVideoStore::new();
        let video = Video::owned(VideoExtension::Mp4, sample_details("Clip"));

        store.insert(video.clone()).await.unwrap();
        assert_eq!(store.get(video.id).await.unwrap(), Some(video.clone()));
        assert!(matches!(
            store.insert(video.clone()).await,
            Err(StoreError::DuplicateId { .. })
        ));

        assert_eq!(store.remove(video.id).await.unwrap(), Some(video.clone()));
        assert_eq!(store.get(video.id).await.unwrap(), None);
        assert_eq!(store.remove(video.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_orders_by_creation() {
        let store = MemoryVideoStore::new();
        let first = Video::owned(VideoExtension::Mp4, sample_details("First"));
        let mut second = Video::owned(VideoExtension::Mp4, sample_details("Second"));
        second.created_at = first.created_at + chrono::Duration::seconds(5);

        store.insert(second.clone()).await.unwrap();
        store.insert(first.clone()).await.unwrap();

        let names: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|video| video.name)
            .collect();
        assert_eq!(names, vec!["First", "Second"]);
    }
}

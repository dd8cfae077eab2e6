//! Deterministic artifact names.
//!
//! Every name is a pure function of persisted fields, so artifacts can be
//! located at any time without extra bookkeeping.

use super::{Origin, Video};

/// Thumbnail and preview image extension.
pub const IMAGE_EXTENSION: &str = ".jpg";

/// Torrent file extension.
pub const TORRENT_EXTENSION: &str = ".torrent";

impl Video {
    /// Identity used to name the video file, preview and torrent.
    ///
    /// Local id for owned videos, remote id for remote ones.
    pub fn identity(&self) -> String {
        match &self.origin {
            Origin::Owned => self.id.to_string(),
            Origin::Remote { remote_id, .. } => remote_id.clone(),
        }
    }

    /// `<identity><extension>`, the media file name.
    pub fn video_filename(&self) -> String {
        format!("{}{}", self.identity(), self.extension)
    }

    /// `<local id>.jpg` for both variants.
    ///
    /// Unlike the other names this always uses the local id, so remote
    /// thumbnails share the owned namespace. Preview and torrent switch to the
    /// remote id.
    pub fn thumbnail_name(&self) -> String {
        format!("{}{IMAGE_EXTENSION}", self.id)
    }

    /// `<identity>.jpg`
    pub fn preview_name(&self) -> String {
        format!("{}{IMAGE_EXTENSION}", self.identity())
    }

    /// `<identity>.torrent`
    pub fn torrent_name(&self) -> String {
        format!("{}{TORRENT_EXTENSION}", self.identity())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use proptest::prelude::*;

    use super::*;
    use crate::test_fixtures::sample_details;
    use crate::video::VideoExtension;

    fn remote_video(remote_id: &str) -> Video {
        Video::remote(
            remote_id.to_string(),
            "peer.example:9000".to_string(),
            VideoExtension::Webm,
            sample_details("Clip"),
            Utc::now(),
            "00".repeat(20),
        )
    }

    #[test]
    fn test_owned_names_use_local_id() {
        let video = Video::owned(VideoExtension::Mp4, sample_details("Clip"));
        let id = video.id.to_string();

        assert_eq!(video.video_filename(), format!("{id}.mp4"));
        assert_eq!(video.thumbnail_name(), format!("{id}.jpg"));
        assert_eq!(video.preview_name(), format!("{id}.jpg"));
        assert_eq!(video.torrent_name(), format!("{id}.torrent"));
    }

    #[test]
    fn test_remote_names_use_remote_id_except_thumbnail() {
        let video = remote_video("peer-video-7");
        let local_id = video.id.to_string();

        assert_eq!(video.video_filename(), "peer-video-7.webm");
        assert_eq!(video.preview_name(), "peer-video-7.jpg");
        assert_eq!(video.torrent_name(), "peer-video-7.torrent");
        assert_eq!(video.thumbnail_name(), format!("{local_id}.jpg"));
    }

    #[test]
    fn test_names_are_stable() {
        let video = Video::owned(VideoExtension::Ogv, sample_details("Clip"));
        assert_eq!(video.video_filename(), video.video_filename());
        assert_eq!(video.thumbnail_name(), video.thumbnail_name());
        assert_eq!(video.preview_name(), video.preview_name());
        assert_eq!(video.torrent_name(), video.torrent_name());
    }

    #[test]
    fn test_identical_details_do_not_collide() {
        let first = Video::owned(VideoExtension::Mp4, sample_details("Same"));
        let second = Video::owned(VideoExtension::Mp4, sample_details("Same"));

        assert_ne!(first.video_filename(), second.video_filename());
        assert_ne!(first.thumbnail_name(), second.thumbnail_name());
        assert_ne!(first.preview_name(), second.preview_name());
        assert_ne!(first.torrent_name(), second.torrent_name());
    }

    proptest! {
        #[test]
        fn prop_distinct_remote_ids_never_collide(
            a in "[a-z0-9-]{1,36}",
            b in "[a-z0-9-]{1,36}",
        ) {
            prop_assume!(a != b);
            let first = remote_video(&a);
            let second = remote_video(&b);

            prop_assert_ne!(first.video_filename(), second.video_filename());
            prop_assert_ne!(first.preview_name(), second.preview_name());
            prop_assert_ne!(first.torrent_name(), second.torrent_name());
            prop_assert_ne!(first.thumbnail_name(), second.thumbnail_name());
        }

        #[test]
        fn prop_ownership_iff_remote_id_absent(remote_id in proptest::option::of("[a-z0-9]{1,12}")) {
            let video = match &remote_id {
                Some(id) => remote_video(id),
                None => Video::owned(VideoExtension::Mp4, sample_details("Clip")),
            };
            prop_assert_eq!(video.is_owned(), remote_id.is_none());
            prop_assert_eq!(video.remote_id().map(str::to_string), remote_id);
        }
    }
}

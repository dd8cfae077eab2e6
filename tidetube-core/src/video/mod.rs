//! Video entity and its owned/remote identity.
//!
//! A video is either owned by this instance or mirrored from a federation
//! peer. The variant decides which artifacts exist and how they are named.

pub mod naming;
pub mod validation;

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use validation::{VideoValidator, ValidationError};

/// Local database key of a video.
///
/// Every video has one, owned or remote. For owned videos it is also the
/// identity used for artifact naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(Uuid);

impl VideoId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_hyphenated())
    }
}

impl std::str::FromStr for VideoId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Where a video originates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Origin {
    /// Uploaded to and hosted by this instance
    Owned,
    /// Mirrored from a federation peer
    Remote {
        /// Id of the video on the origin pod
        remote_id: String,
        /// `host:port` of the origin pod
        origin_host: String,
    },
}

/// Container formats accepted for video files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoExtension {
    #[serde(rename = ".mp4")]
    Mp4,
    #[serde(rename = ".webm")]
    Webm,
    #[serde(rename = ".ogv")]
    Ogv,
}

impl VideoExtension {
    /// Extension including the leading dot.
    pub fn as_str(self) -> &'static str {
        match self {
            VideoExtension::Mp4 => ".mp4",
            VideoExtension::Webm => ".webm",
            VideoExtension::Ogv => ".ogv",
        }
    }

    /// Detects the container from a file path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl fmt::Display for VideoExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VideoExtension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('.').to_lowercase().as_str() {
            "mp4" => Ok(VideoExtension::Mp4),
            "webm" => Ok(VideoExtension::Webm),
            "ogv" => Ok(VideoExtension::Ogv),
            _ => Err(format!("Unsupported video extension: {s}")),
        }
    }
}

/// User-facing attributes shared by owned and remote videos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDetails {
    pub name: String,
    pub description: String,
    pub author: String,
    /// Whole seconds, floored
    pub duration: u32,
    pub tags: BTreeSet<String>,
}

/// A video record.
///
/// Values are immutable once artifacts exist: a changed video is a new
/// instance built from the old one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: VideoId,
    pub origin: Origin,
    pub extension: VideoExtension,
    pub name: String,
    pub description: String,
    pub author: String,
    pub duration: u32,
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    /// Hex info hash of the torrent, known once artifacts exist
    pub info_hash: Option<String>,
}

impl Video {
    /// Creates a transient owned video with a fresh id.
    pub fn owned(extension: VideoExtension, details: VideoDetails) -> Self {
        Self::from_parts(
            VideoId::generate(),
            Origin::Owned,
            extension,
            details,
            Utc::now(),
            None,
        )
    }

    /// Creates a transient remote video mirrored from `origin_host`.
    pub fn remote(
        remote_id: String,
        origin_host: String,
        extension: VideoExtension,
        details: VideoDetails,
        created_at: DateTime<Utc>,
        info_hash: String,
    ) -> Self {
        Self::from_parts(
            VideoId::generate(),
            Origin::Remote {
                remote_id,
                origin_host,
            },
            extension,
            details,
            created_at,
            Some(info_hash),
        )
    }

    fn from_parts(
        id: VideoId,
        origin: Origin,
        extension: VideoExtension,
        details: VideoDetails,
        created_at: DateTime<Utc>,
        info_hash: Option<String>,
    ) -> Self {
        let VideoDetails {
            name,
            description,
            author,
            duration,
            tags,
        } = details;

        Self {
            id,
            origin,
            extension,
            name,
            description,
            author,
            duration,
            tags,
            created_at,
            info_hash,
        }
    }

    /// True iff the video has no remote id.
    pub fn is_owned(&self) -> bool {
        matches!(self.origin, Origin::Owned)
    }

    /// Remote id, absent for owned videos.
    pub fn remote_id(&self) -> Option<&str> {
        match &self.origin {
            Origin::Owned => None,
            Origin::Remote { remote_id, .. } => Some(remote_id),
        }
    }

    /// Origin pod of a remote video.
    pub fn origin_host(&self) -> Option<&str> {
        match &self.origin {
            Origin::Owned => None,
            Origin::Remote { origin_host, .. } => Some(origin_host),
        }
    }

    /// Returns a new instance carrying the given info hash.
    pub fn with_info_hash(self, info_hash: String) -> Self {
        Self {
            info_hash: Some(info_hash),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::sample_details;

    #[test]
    fn test_owned_video_has_no_remote_id() {
        let video = Video::owned(VideoExtension::Mp4, sample_details("Clip"));
        assert!(video.is_owned());
        assert_eq!(video.remote_id(), None);
        assert_eq!(video.origin_host(), None);
        assert_eq!(video.info_hash, None);
    }

    #[test]
    fn test_remote_video_is_not_owned() {
        let video = Video::remote(
            "5d2c1a1e-0c83-4b2f-a0a3-9d1e0f8a7b6c".to_string(),
            "peer.example:9000".to_string(),
            VideoExtension::Webm,
            sample_details("Clip"),
            Utc::now(),
            "0123456789abcdef0123456789abcdef01234567".to_string(),
        );
        assert!(!video.is_owned());
        assert_eq!(
            video.remote_id(),
            Some("5d2c1a1e-0c83-4b2f-a0a3-9d1e0f8a7b6c")
        );
        assert_eq!(video.origin_host(), Some("peer.example:9000"));
    }

    #[test]
    fn test_with_info_hash_keeps_identity() {
        let video = Video::owned(VideoExtension::Mp4, sample_details("Clip"));
        let id = video.id;
        let hashed = video.with_info_hash("ab".repeat(20));
        assert_eq!(hashed.id, id);
        assert_eq!(hashed.info_hash.as_deref(), Some("ab".repeat(20).as_str()));
    }

    #[test]
    fn test_extension_parsing() {
        assert_eq!("mp4".parse::<VideoExtension>(), Ok(VideoExtension::Mp4));
        assert_eq!(".WEBM".parse::<VideoExtension>(), Ok(VideoExtension::Webm));
        assert!("avi".parse::<VideoExtension>().is_err());
        assert_eq!(
            VideoExtension::from_path(Path::new("/tmp/clip.ogv")),
            Some(VideoExtension::Ogv)
        );
        assert_eq!(VideoExtension::from_path(Path::new("/tmp/clip")), None);
    }

    #[test]
    fn test_video_serde_roundtrip_keeps_origin() {
        let video = Video::remote(
            "r-1".to_string(),
            "peer.example:9000".to_string(),
            VideoExtension::Mp4,
            sample_details("Clip"),
            Utc::now(),
            "00".repeat(20),
        );
        let json = serde_json::to_string(&video).unwrap();
        assert!(json.contains("\"kind\":\"remote\""));
        assert!(json.contains("\".mp4\""));
        let decoded: Video = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, video);
    }
}

//! Centralized configuration for Tidetube.
//!
//! All storage locations, public URLs and pipeline policies are defined here
//! to avoid hard-coded values scattered throughout the codebase.

use std::path::{Path, PathBuf};

use crate::video::VideoExtension;

/// Central configuration for all Tidetube components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct TidetubeConfig {
    pub webserver: WebserverConfig,
    pub storage: StorageConfig,
    pub static_paths: StaticPaths,
    pub media: MediaConfig,
    pub pipeline: PipelineConfig,
}

/// Public address of this instance.
///
/// Used to build tracker, web-seed and torrent URLs for owned videos.
#[derive(Debug, Clone)]
pub struct WebserverConfig {
    /// Serve over https/wss instead of http/ws
    pub https: bool,
    pub host: String,
    pub port: u16,
}

impl Default for WebserverConfig {
    fn default() -> Self {
        Self {
            https: false,
            host: "localhost".to_string(),
            port: 9000,
        }
    }
}

impl WebserverConfig {
    /// Returns `host:port`, the form peers store as the origin host.
    pub fn host_with_port(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL for HTTP resources, e.g. `http://localhost:9000`.
    pub fn http_url(&self) -> String {
        let scheme = if self.https { "https" } else { "http" };
        format!("{scheme}://{}", self.host_with_port())
    }

    /// Base URL for websocket resources, e.g. `ws://localhost:9000`.
    pub fn ws_url(&self) -> String {
        let scheme = if self.https { "wss" } else { "ws" };
        format!("{scheme}://{}", self.host_with_port())
    }

    /// Websocket tracker endpoint announced in every owned torrent.
    pub fn tracker_url(&self) -> String {
        format!("{}{TRACKER_SOCKET_PATH}", self.ws_url())
    }
}

/// Path of the websocket tracker on every instance.
pub const TRACKER_SOCKET_PATH: &str = "/tracker/socket";

/// On-disk locations of media and derived artifacts.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub videos_dir: PathBuf,
    pub thumbnails_dir: PathBuf,
    pub previews_dir: PathBuf,
    pub torrents_dir: PathBuf,
    /// Video records manifest used by the JSON file store
    pub manifest_path: PathBuf,
    /// Temporary file suffix
    pub temp_file_suffix: &'static str,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::rooted_at(Path::new("storage"))
    }
}

impl StorageConfig {
    /// Lays out every storage directory below a single root.
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            videos_dir: root.join("videos"),
            thumbnails_dir: root.join("thumbnails"),
            previews_dir: root.join("previews"),
            torrents_dir: root.join("torrents"),
            manifest_path: root.join("videos.json"),
            temp_file_suffix: ".tmp",
        }
    }

    /// Creates all storage directories if missing.
    ///
    /// # Errors
    ///
    /// - `std::io::Error` - If a directory cannot be created
    pub async fn ensure_directories(&self) -> std::io::Result<()> {
        for dir in [
            &self.videos_dir,
            &self.thumbnails_dir,
            &self.previews_dir,
            &self.torrents_dir,
        ] {
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(())
    }
}

/// Static URL prefixes under which artifacts are served.
#[derive(Debug, Clone)]
pub struct StaticPaths {
    pub thumbnails: &'static str,
    pub torrents: &'static str,
    pub webseed: &'static str,
}

impl Default for StaticPaths {
    fn default() -> Self {
        Self {
            thumbnails: "/static/thumbnails/",
            torrents: "/static/torrents/",
            webseed: "/static/webseed/",
        }
    }
}

/// Target resolution for extracted thumbnails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSize {
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for ThumbnailSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl std::str::FromStr for ThumbnailSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (width, height) = s
            .split_once('x')
            .ok_or_else(|| format!("Invalid thumbnail size: {s}"))?;
        Ok(Self {
            width: width
                .parse()
                .map_err(|_| format!("Invalid thumbnail width: {width}"))?,
            height: height
                .parse()
                .map_err(|_| format!("Invalid thumbnail height: {height}"))?,
        })
    }
}

/// Media handling settings.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Size of thumbnails; previews keep the source resolution
    pub thumbnail_size: ThumbnailSize,
    /// Containers accepted for owned uploads
    pub allowed_extensions: Vec<VideoExtension>,
    /// Scheme used to reach remote pods over HTTP
    pub remote_http_scheme: &'static str,
    /// Scheme used to reach remote trackers
    pub remote_ws_scheme: &'static str,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            thumbnail_size: ThumbnailSize {
                width: 200,
                height: 110,
            },
            allowed_extensions: vec![
                VideoExtension::Mp4,
                VideoExtension::Webm,
                VideoExtension::Ogv,
            ],
            remote_http_scheme: "http",
            remote_ws_scheme: "ws",
        }
    }
}

/// How concurrent artifact deletions report failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletionPolicy {
    /// Return the first failure as soon as it completes; siblings keep running
    #[default]
    FailFast,
    /// Wait for every deletion, then return the first failure
    BestEffort,
}

impl std::str::FromStr for DeletionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail-fast" | "failfast" => Ok(DeletionPolicy::FailFast),
            "best-effort" | "besteffort" => Ok(DeletionPolicy::BestEffort),
            _ => Err(format!("Invalid deletion policy: {s}")),
        }
    }
}

/// Artifact pipeline policies.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub deletion_policy: DeletionPolicy,
    /// Remove artifacts written by siblings of a failed creation
    pub cleanup_on_failure: bool,
}

impl TidetubeConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Allows runtime configuration via environment variables while
    /// maintaining sensible defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(root) = std::env::var("TIDETUBE_STORAGE_ROOT") {
            config.storage = StorageConfig::rooted_at(Path::new(&root));
        }

        if let Ok(host) = std::env::var("TIDETUBE_WEBSERVER_HOST") {
            config.webserver.host = host;
        }

        if let Ok(port) = std::env::var("TIDETUBE_WEBSERVER_PORT")
            && let Ok(port) = port.parse::<u16>()
        {
            config.webserver.port = port;
        }

        if let Ok(https) = std::env::var("TIDETUBE_WEBSERVER_HTTPS") {
            config.webserver.https = https.parse().unwrap_or(false);
        }

        if let Ok(size) = std::env::var("TIDETUBE_THUMBNAIL_SIZE") {
            match size.parse() {
                Ok(size) => config.media.thumbnail_size = size,
                Err(e) => tracing::warn!("Ignoring TIDETUBE_THUMBNAIL_SIZE: {}", e),
            }
        }

        if let Ok(policy) = std::env::var("TIDETUBE_DELETION_POLICY") {
            match policy.parse() {
                Ok(policy) => config.pipeline.deletion_policy = policy,
                Err(e) => tracing::warn!("Ignoring TIDETUBE_DELETION_POLICY: {}", e),
            }
        }

        if let Ok(cleanup) = std::env::var("TIDETUBE_CLEANUP_ON_FAILURE") {
            config.pipeline.cleanup_on_failure = cleanup.parse().unwrap_or(false);
        }

        config
    }

    /// Creates a configuration with all storage below `root`.
    pub fn for_testing(root: &Path) -> Self {
        Self {
            storage: StorageConfig::rooted_at(root),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = TidetubeConfig::default();

        assert_eq!(config.webserver.http_url(), "http://localhost:9000");
        assert_eq!(config.webserver.ws_url(), "ws://localhost:9000");
        assert_eq!(
            config.webserver.tracker_url(),
            "ws://localhost:9000/tracker/socket"
        );
        assert_eq!(config.media.thumbnail_size.to_string(), "200x110");
        assert_eq!(config.media.allowed_extensions.len(), 3);
        assert_eq!(config.pipeline.deletion_policy, DeletionPolicy::FailFast);
        assert!(!config.pipeline.cleanup_on_failure);
    }

    #[test]
    fn test_https_switches_both_schemes() {
        let webserver = WebserverConfig {
            https: true,
            host: "tube.example".to_string(),
            port: 443,
        };
        assert_eq!(webserver.http_url(), "https://tube.example:443");
        assert_eq!(webserver.ws_url(), "wss://tube.example:443");
    }

    #[test]
    fn test_storage_rooted_layout() {
        let storage = StorageConfig::rooted_at(Path::new("/srv/tube"));
        assert_eq!(storage.videos_dir, PathBuf::from("/srv/tube/videos"));
        assert_eq!(storage.torrents_dir, PathBuf::from("/srv/tube/torrents"));
        assert_eq!(storage.manifest_path, PathBuf::from("/srv/tube/videos.json"));
    }

    #[test]
    fn test_static_prefixes_end_with_slash() {
        let paths = StaticPaths::default();
        for prefix in [paths.thumbnails, paths.torrents, paths.webseed] {
            assert!(prefix.starts_with("/static/"), "{prefix}");
            assert!(prefix.ends_with('/'), "{prefix}");
        }
    }

    #[test]
    fn test_thumbnail_size_parsing() {
        let size: ThumbnailSize = "320x180".parse().unwrap();
        assert_eq!(size.width, 320);
        assert_eq!(size.height, 180);
        assert!("320".parse::<ThumbnailSize>().is_err());
        assert!("axb".parse::<ThumbnailSize>().is_err());
    }

    #[test]
    fn test_deletion_policy_parsing() {
        assert_eq!(
            "best-effort".parse::<DeletionPolicy>(),
            Ok(DeletionPolicy::BestEffort)
        );
        assert_eq!(
            "FailFast".parse::<DeletionPolicy>(),
            Ok(DeletionPolicy::FailFast)
        );
        assert!("sometimes".parse::<DeletionPolicy>().is_err());
    }

    #[test]
    fn test_env_override() {
        unsafe {
            std::env::set_var("TIDETUBE_WEBSERVER_HOST", "peertube.example");
            std::env::set_var("TIDETUBE_WEBSERVER_PORT", "9001");
            std::env::set_var("TIDETUBE_DELETION_POLICY", "best-effort");
            std::env::set_var("TIDETUBE_CLEANUP_ON_FAILURE", "true");
        }

        let config = TidetubeConfig::from_env();

        assert_eq!(config.webserver.host_with_port(), "peertube.example:9001");
        assert_eq!(config.pipeline.deletion_policy, DeletionPolicy::BestEffort);
        assert!(config.pipeline.cleanup_on_failure);

        // Cleanup
        unsafe {
            std::env::remove_var("TIDETUBE_WEBSERVER_HOST");
            std::env::remove_var("TIDETUBE_WEBSERVER_PORT");
            std::env::remove_var("TIDETUBE_DELETION_POLICY");
            std::env::remove_var("TIDETUBE_CLEANUP_ON_FAILURE");
        }
    }
}

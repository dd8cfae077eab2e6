//! Magnet link building and parsing

use std::fmt;

use super::{InfoHash, TorrentError};
use crate::config::{TRACKER_SOCKET_PATH, TidetubeConfig};
use crate::video::{Origin, Video};

const BTIH_PREFIX: &str = "urn:btih:";

/// Magnet link components for a video.
///
/// Built from entity state and configuration only, so the same video and
/// config always yield the same link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagnetUri {
    /// Hex info hash (`xt=urn:btih:`)
    pub info_hash: String,
    /// Display name (`dn`)
    pub display_name: String,
    /// URL of the .torrent file (`xs`)
    pub exact_source: String,
    /// Tracker URLs (`tr`)
    pub announce: Vec<String>,
    /// HTTP web seeds (`ws`)
    pub url_list: Vec<String>,
}

impl MagnetUri {
    /// Builds the magnet link of a video.
    ///
    /// Owned videos point at this instance; remote videos point at their
    /// origin host using the configured remote schemes.
    pub fn build(video: &Video, config: &TidetubeConfig) -> Self {
        let (http_base, ws_base) = match &video.origin {
            Origin::Owned => (config.webserver.http_url(), config.webserver.ws_url()),
            Origin::Remote { origin_host, .. } => (
                format!("{}://{origin_host}", config.media.remote_http_scheme),
                format!("{}://{origin_host}", config.media.remote_ws_scheme),
            ),
        };

        Self {
            info_hash: video.info_hash.clone().unwrap_or_default(),
            display_name: video.name.clone(),
            exact_source: format!(
                "{http_base}{}{}",
                config.static_paths.torrents,
                video.torrent_name()
            ),
            announce: vec![format!("{ws_base}{TRACKER_SOCKET_PATH}")],
            url_list: vec![format!(
                "{http_base}{}{}",
                config.static_paths.webseed,
                video.video_filename()
            )],
        }
    }

    /// Parses a magnet link.
    ///
    /// # Errors
    /// - `TorrentError::InvalidMagnetLink` - Malformed URI or missing `xt=urn:btih:`
    pub fn parse(magnet_url: &str) -> Result<Self, TorrentError> {
        magnet_url::Magnet::new(magnet_url).map_err(|e| TorrentError::InvalidMagnetLink {
            reason: format!("{e}"),
        })?;

        let url = url::Url::parse(magnet_url).map_err(|e| TorrentError::InvalidMagnetLink {
            reason: e.to_string(),
        })?;

        let mut magnet = Self {
            info_hash: String::new(),
            display_name: String::new(),
            exact_source: String::new(),
            announce: Vec::new(),
            url_list: Vec::new(),
        };

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "xt" => {
                    if let Some(hash) = value.strip_prefix(BTIH_PREFIX) {
                        magnet.info_hash = hash.to_string();
                    }
                }
                "dn" => magnet.display_name = value.into_owned(),
                "xs" => magnet.exact_source = value.into_owned(),
                "tr" => magnet.announce.push(value.into_owned()),
                "ws" => magnet.url_list.push(value.into_owned()),
                _ => {}
            }
        }

        if magnet.info_hash.is_empty() {
            return Err(TorrentError::InvalidMagnetLink {
                reason: format!("Missing or invalid info hash in magnet link: {magnet_url}"),
            });
        }

        // Reject malformed hashes up front
        magnet.parsed_info_hash()?;

        Ok(magnet)
    }

    /// Decodes the hex info hash.
    ///
    /// # Errors
    /// - `TorrentError::InvalidInfoHash` - Not a 40 character hex string
    pub fn parsed_info_hash(&self) -> Result<InfoHash, TorrentError> {
        InfoHash::from_hex(&self.info_hash)
    }
}

impl fmt::Display for MagnetUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "magnet:?xt={BTIH_PREFIX}{}", self.info_hash)?;
        write!(
            f,
            "&dn={}",
            urlencoding::encode(&self.display_name).replace("%20", "+")
        )?;
        write!(f, "&xs={}", urlencoding::encode(&self.exact_source))?;
        for tracker in &self.announce {
            write!(f, "&tr={}", urlencoding::encode(tracker))?;
        }
        for web_seed in &self.url_list {
            write!(f, "&ws={}", urlencoding::encode(web_seed))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::config::WebserverConfig;
    use crate::test_fixtures::sample_details;
    use crate::video::VideoExtension;

    const HASH: &str = "ABCDEF0123456789ABCDEF0123456789ABCDEF01";

    fn peertube_config() -> TidetubeConfig {
        TidetubeConfig {
            webserver: WebserverConfig {
                https: false,
                host: "peertube.example".to_string(),
                port: 9000,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_owned_magnet_points_at_this_instance() {
        let video = Video::owned(VideoExtension::Mp4, sample_details("Clip"))
            .with_info_hash(HASH.to_string());
        let magnet = MagnetUri::build(&video, &peertube_config());
        let id = video.id;

        assert_eq!(magnet.info_hash, HASH);
        assert_eq!(magnet.display_name, "Clip");
        assert_eq!(
            magnet.exact_source,
            format!("http://peertube.example:9000/static/torrents/{id}.torrent")
        );
        assert_eq!(
            magnet.announce,
            vec!["ws://peertube.example:9000/tracker/socket"]
        );
        assert_eq!(
            magnet.url_list,
            vec![format!("http://peertube.example:9000/static/webseed/{id}.mp4")]
        );

        let uri = magnet.to_string();
        assert!(uri.starts_with(&format!("magnet:?xt=urn:btih:{HASH}")));
        assert!(uri.contains("&dn=Clip"));
        assert!(uri.contains(&format!("{id}.torrent")));
        assert!(uri.contains("&xs=http%3A%2F%2Fpeertube.example%3A9000%2Fstatic%2Ftorrents%2F"));
        assert!(uri.contains("&tr=ws%3A%2F%2Fpeertube.example%3A9000%2Ftracker%2Fsocket"));
    }

    #[test]
    fn test_remote_magnet_uses_origin_host() {
        let video = Video::remote(
            "5d2c1a1e-0c83-4b2f-a0a3-9d1e0f8a7b6c".to_string(),
            "origin.example:9001".to_string(),
            VideoExtension::Webm,
            sample_details("Clip"),
            Utc::now(),
            HASH.to_string(),
        );
        let magnet = MagnetUri::build(&video, &peertube_config());

        assert_eq!(
            magnet.exact_source,
            "http://origin.example:9001/static/torrents/5d2c1a1e-0c83-4b2f-a0a3-9d1e0f8a7b6c.torrent"
        );
        assert_eq!(magnet.announce, vec!["ws://origin.example:9001/tracker/socket"]);
        assert_eq!(
            magnet.url_list,
            vec!["http://origin.example:9001/static/webseed/5d2c1a1e-0c83-4b2f-a0a3-9d1e0f8a7b6c.webm"]
        );
    }

    #[test]
    fn test_build_is_reproducible() {
        let video = Video::owned(VideoExtension::Mp4, sample_details("Clip"))
            .with_info_hash(HASH.to_string());
        let config = peertube_config();
        assert_eq!(
            MagnetUri::build(&video, &config).to_string(),
            MagnetUri::build(&video, &config).to_string()
        );
    }

    #[test]
    fn test_display_name_is_percent_encoded() {
        let video = Video::owned(VideoExtension::Mp4, sample_details("Cats & dogs"))
            .with_info_hash(HASH.to_string());
        let uri = MagnetUri::build(&video, &peertube_config()).to_string();
        assert!(uri.contains("&dn=Cats+%26+dogs&"));
    }

    #[test]
    fn test_parse_roundtrip() {
        let video = Video::owned(VideoExtension::Mp4, sample_details("Cats & dogs"))
            .with_info_hash(HASH.to_string());
        let magnet = MagnetUri::build(&video, &peertube_config());

        let parsed = MagnetUri::parse(&magnet.to_string()).unwrap();
        assert_eq!(parsed, magnet);
        assert_eq!(
            parsed.parsed_info_hash().unwrap().to_string(),
            HASH.to_lowercase()
        );
    }

    #[test]
    fn test_invalid_magnet_link() {
        assert!(MagnetUri::parse("invalid://not-a-magnet").is_err());
    }

    #[test]
    fn test_magnet_link_without_info_hash() {
        let result = MagnetUri::parse("magnet:?dn=Test&tr=ws%3A%2F%2Ftracker.example%2Fsocket");
        assert!(result.is_err());
    }
}

//! Field constraints checked before a video enters the artifact pipeline.

use std::ops::RangeInclusive;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use super::{VideoDetails, VideoExtension};
use crate::serializer::PeerVideoPayload;
use crate::torrent::MagnetUri;

const NAME_LENGTH: RangeInclusive<usize> = 3..=50;
const DESCRIPTION_LENGTH: RangeInclusive<usize> = 3..=250;
const AUTHOR_LENGTH: RangeInclusive<usize> = 3..=20;
const DURATION_SECONDS: RangeInclusive<u32> = 1..=7200;
const TAG_COUNT: RangeInclusive<usize> = 1..=3;
const TAG_LENGTH: RangeInclusive<usize> = 2..=10;
const THUMBNAIL_BASE64_MAX: usize = 20_000;
const INFO_HASH_LENGTH: usize = 40;

/// A field rejected by the validator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Validates uploads and peer payloads against the instance's constraints.
#[derive(Debug, Clone)]
pub struct VideoValidator {
    allowed_extensions: Vec<VideoExtension>,
}

impl VideoValidator {
    /// Creates a validator accepting the given containers.
    pub fn new(allowed_extensions: Vec<VideoExtension>) -> Self {
        Self { allowed_extensions }
    }

    /// Checks a local upload.
    ///
    /// # Errors
    ///
    /// - `ValidationError` - First field violating its constraint
    pub fn validate_upload(
        &self,
        extension: VideoExtension,
        details: &VideoDetails,
    ) -> Result<(), ValidationError> {
        self.validate_extension(extension)?;
        validate_details(details)
    }

    /// Checks a payload received from a federation peer.
    ///
    /// # Errors
    ///
    /// - `ValidationError` - First field violating its constraint
    pub fn validate_peer_payload(&self, payload: &PeerVideoPayload) -> Result<(), ValidationError> {
        validate_details(&payload.details())?;

        let extension = payload
            .extname
            .parse::<VideoExtension>()
            .map_err(|e| ValidationError::new("extname", e))?;
        self.validate_extension(extension)?;

        if uuid::Uuid::parse_str(&payload.remote_id).is_err() {
            return Err(ValidationError::new("remoteId", "must be a UUID"));
        }

        if payload.pod_url.trim().is_empty() {
            return Err(ValidationError::new("podUrl", "must not be empty"));
        }

        let magnet = MagnetUri::parse(&payload.magnet_uri)
            .map_err(|e| ValidationError::new("magnetUri", e.to_string()))?;
        validate_info_hash(&magnet.info_hash)?;

        validate_thumbnail_base64(&payload.thumbnail_base64)
    }

    fn validate_extension(&self, extension: VideoExtension) -> Result<(), ValidationError> {
        if self.allowed_extensions.contains(&extension) {
            Ok(())
        } else {
            Err(ValidationError::new(
                "extname",
                format!("{extension} is not an allowed container"),
            ))
        }
    }
}

fn validate_details(details: &VideoDetails) -> Result<(), ValidationError> {
    check_length("name", &details.name, NAME_LENGTH)?;
    check_length("description", &details.description, DESCRIPTION_LENGTH)?;
    check_length("author", &details.author, AUTHOR_LENGTH)?;

    if !DURATION_SECONDS.contains(&details.duration) {
        return Err(ValidationError::new(
            "duration",
            format!(
                "{} seconds is outside {}..={}",
                details.duration,
                DURATION_SECONDS.start(),
                DURATION_SECONDS.end()
            ),
        ));
    }

    if !TAG_COUNT.contains(&details.tags.len()) {
        return Err(ValidationError::new(
            "tags",
            format!("expected 1 to 3 tags, got {}", details.tags.len()),
        ));
    }

    for tag in &details.tags {
        if !TAG_LENGTH.contains(&tag.chars().count())
            || !tag.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(ValidationError::new(
                "tags",
                format!("tag {tag:?} must be 2 to 10 alphanumeric characters"),
            ));
        }
    }

    Ok(())
}

fn check_length(
    field: &'static str,
    value: &str,
    bounds: RangeInclusive<usize>,
) -> Result<(), ValidationError> {
    let length = value.chars().count();
    if bounds.contains(&length) {
        Ok(())
    } else {
        Err(ValidationError::new(
            field,
            format!(
                "length {length} is outside {}..={}",
                bounds.start(),
                bounds.end()
            ),
        ))
    }
}

/// Checks a hex info hash as carried in magnet links.
///
/// # Errors
///
/// - `ValidationError` - Wrong length or non-hex characters
pub fn validate_info_hash(info_hash: &str) -> Result<(), ValidationError> {
    if info_hash.len() == INFO_HASH_LENGTH && info_hash.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(ValidationError::new(
            "infoHash",
            "must be 40 hexadecimal characters",
        ))
    }
}

fn validate_thumbnail_base64(data: &str) -> Result<(), ValidationError> {
    if data.is_empty() || data.len() > THUMBNAIL_BASE64_MAX {
        return Err(ValidationError::new(
            "thumbnailBase64",
            format!("length must be 1..={THUMBNAIL_BASE64_MAX}"),
        ));
    }

    STANDARD
        .decode(data)
        .map(|_| ())
        .map_err(|e| ValidationError::new("thumbnailBase64", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::sample_details;

    fn validator() -> VideoValidator {
        VideoValidator::new(vec![VideoExtension::Mp4, VideoExtension::Webm])
    }

    #[test]
    fn test_sample_upload_is_valid() {
        assert!(
            validator()
                .validate_upload(VideoExtension::Mp4, &sample_details("Clip"))
                .is_ok()
        );
    }

    #[test]
    fn test_disallowed_extension_rejected() {
        let err = validator()
            .validate_upload(VideoExtension::Ogv, &sample_details("Clip"))
            .unwrap_err();
        assert_eq!(err.field, "extname");
    }

    #[test]
    fn test_short_name_rejected() {
        let err = validator()
            .validate_upload(VideoExtension::Mp4, &sample_details("ab"))
            .unwrap_err();
        assert_eq!(err.field, "name");
    }

    #[test]
    fn test_duration_bounds() {
        let mut details = sample_details("Clip");
        details.duration = 0;
        let err = validate_details(&details).unwrap_err();
        assert_eq!(err.field, "duration");

        details.duration = 7200;
        assert!(validate_details(&details).is_ok());
    }

    #[test]
    fn test_tag_rules() {
        let mut details = sample_details("Clip");
        details.tags = ["a".to_string()].into_iter().collect();
        assert_eq!(validate_details(&details).unwrap_err().field, "tags");

        details.tags = ["has space".to_string()].into_iter().collect();
        assert_eq!(validate_details(&details).unwrap_err().field, "tags");

        details.tags = ["one", "two", "three", "four"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(validate_details(&details).unwrap_err().field, "tags");

        details.tags = Default::default();
        assert_eq!(validate_details(&details).unwrap_err().field, "tags");
    }

    #[test]
    fn test_info_hash_format() {
        assert!(validate_info_hash(&"ab".repeat(20)).is_ok());
        assert!(validate_info_hash("abc").is_err());
        assert!(validate_info_hash(&"zz".repeat(20)).is_err());
    }

    #[test]
    fn test_thumbnail_base64_rules() {
        assert!(validate_thumbnail_base64("aGVsbG8=").is_ok());
        assert!(validate_thumbnail_base64("").is_err());
        assert!(validate_thumbnail_base64("not base64!").is_err());
        assert!(validate_thumbnail_base64(&"A".repeat(THUMBNAIL_BASE64_MAX + 4)).is_err());
    }

    fn peer_payload() -> PeerVideoPayload {
        PeerVideoPayload {
            name: "Clip".to_string(),
            description: "A short sample clip".to_string(),
            magnet_uri: format!("magnet:?xt=urn:btih:{}&dn=Clip", "ab".repeat(20)),
            pod_url: "peer.example:9000".to_string(),
            remote_id: "5d2c1a1e-0c83-4b2f-a0a3-9d1e0f8a7b6c".to_string(),
            author: "alice".to_string(),
            duration: 10,
            thumbnail_base64: "/9j/4AAQ".to_string(),
            tags: vec!["sample".to_string()],
            created_date: chrono::Utc::now(),
            extname: ".mp4".to_string(),
        }
    }

    #[test]
    fn test_peer_payload_rules() {
        assert!(validator().validate_peer_payload(&peer_payload()).is_ok());

        let mut payload = peer_payload();
        payload.remote_id = "not-a-uuid".to_string();
        assert_eq!(
            validator().validate_peer_payload(&payload).unwrap_err().field,
            "remoteId"
        );

        let mut payload = peer_payload();
        payload.magnet_uri = "magnet:?dn=Clip".to_string();
        assert_eq!(
            validator().validate_peer_payload(&payload).unwrap_err().field,
            "magnetUri"
        );

        let mut payload = peer_payload();
        payload.extname = ".ogv".to_string();
        assert_eq!(
            validator().validate_peer_payload(&payload).unwrap_err().field,
            "extname"
        );
    }
}

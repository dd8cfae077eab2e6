//! Bencode encoding, torrent parsing and info hash calculation

use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;

use sha1::{Digest, Sha1};

use super::types::TorrentMetadata;
use super::{InfoHash, TorrentError};

// Type aliases for complex bencode types
pub(super) type BencodeDict<'a> = std::collections::HashMap<&'a [u8], bencode_rs::Value<'a>>;
pub(super) type ParseResult<T> = Result<T, TorrentError>;
pub(super) type BytesResult<'a> = Result<&'a [u8], TorrentError>;

/// Owned bencode value used to build torrent files.
///
/// Dictionaries are kept in a `BTreeMap` so keys are emitted in the sorted
/// byte order the encoding requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BencodeValue {
    Integer(i64),
    Bytes(Vec<u8>),
    List(Vec<BencodeValue>),
    Dictionary(BTreeMap<Vec<u8>, BencodeValue>),
}

impl BencodeValue {
    /// Byte string value from UTF-8 text.
    pub fn string(value: &str) -> Self {
        BencodeValue::Bytes(value.as_bytes().to_vec())
    }

    /// Dictionary from `(key, value)` pairs.
    pub fn dictionary<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, BencodeValue)>,
    {
        BencodeValue::Dictionary(
            entries
                .into_iter()
                .map(|(key, value)| (key.as_bytes().to_vec(), value))
                .collect(),
        )
    }

    /// Serializes the value to its canonical bencode form.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            BencodeValue::Integer(value) => {
                out.push(b'i');
                out.extend_from_slice(value.to_string().as_bytes());
                out.push(b'e');
            }
            BencodeValue::Bytes(bytes) => encode_bytes(bytes, out),
            BencodeValue::List(items) => {
                out.push(b'l');
                for item in items {
                    item.encode_into(out);
                }
                out.push(b'e');
            }
            BencodeValue::Dictionary(entries) => {
                out.push(b'd');
                for (key, value) in entries {
                    encode_bytes(key, out);
                    value.encode_into(out);
                }
                out.push(b'e');
            }
        }
    }
}

fn encode_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(bytes.len().to_string().as_bytes());
    out.push(b':');
    out.extend_from_slice(bytes);
}

/// Bencode parsing utilities for torrent metadata extraction.
pub struct BencodeParser;

impl BencodeParser {
    /// Reads and parses a torrent file from disk.
    ///
    /// # Errors
    ///
    /// - `TorrentError::Io` - If the file cannot be read
    /// - `TorrentError::InvalidTorrentFile` - If parsing failed
    pub async fn parse_torrent_file(path: &Path) -> Result<TorrentMetadata, TorrentError> {
        let torrent_bytes = tokio::fs::read(path).await?;
        Self::parse_bencode_data(&torrent_bytes)
    }

    /// Parse bencode data and extract torrent metadata
    ///
    /// # Errors
    ///
    /// - `TorrentError::InvalidTorrentFile` - If bencode parsing or metadata extraction failed
    pub fn parse_bencode_data(torrent_bytes: &[u8]) -> Result<TorrentMetadata, TorrentError> {
        let parsed = bencode_rs::Value::parse(torrent_bytes).map_err(|e| {
            TorrentError::InvalidTorrentFile {
                reason: format!("Bencode parsing failed: {e:?}"),
            }
        })?;

        if parsed.is_empty() {
            return Err(TorrentError::InvalidTorrentFile {
                reason: "Empty bencode data".to_string(),
            });
        }

        let root = &parsed[0];
        if let bencode_rs::Value::Dictionary(dict) = root {
            Self::extract_metadata_from_dict(dict, torrent_bytes)
        } else {
            Err(TorrentError::InvalidTorrentFile {
                reason: "Root element must be dictionary".to_string(),
            })
        }
    }

    /// Extract torrent metadata from bencode dictionary
    fn extract_metadata_from_dict(
        dict: &BencodeDict<'_>,
        original_data: &[u8],
    ) -> ParseResult<TorrentMetadata> {
        let Some(bencode_rs::Value::Dictionary(info_dict)) = dict.get(b"info".as_slice()) else {
            return Err(TorrentError::InvalidTorrentFile {
                reason: "Missing 'info' field".to_string(),
            });
        };

        let info_hash = Self::calculate_info_hash(original_data)?;

        let name = Self::extract_bytes_as_string(info_dict, b"name")?;
        let piece_length = Self::extract_integer(info_dict, b"piece length")?;
        let piece_length = u32::try_from(piece_length)
            .ok()
            .filter(|length| *length > 0)
            .ok_or_else(|| TorrentError::InvalidTorrentFile {
                reason: format!("Invalid piece length: {piece_length}"),
            })?;

        let pieces_bytes = Self::extract_bytes(info_dict, b"pieces")?;
        if pieces_bytes.len() % 20 != 0 {
            return Err(TorrentError::InvalidTorrentFile {
                reason: "Invalid pieces length".to_string(),
            });
        }

        let piece_hashes: Vec<[u8; 20]> = pieces_bytes
            .chunks(20)
            .map(|chunk| {
                let mut hash = [0u8; 20];
                hash.copy_from_slice(chunk);
                hash
            })
            .collect();

        let total_length = Self::extract_integer(info_dict, b"length")?;
        let total_length =
            u64::try_from(total_length).map_err(|_| TorrentError::InvalidTorrentFile {
                reason: format!("Invalid length: {total_length}"),
            })?;

        Ok(TorrentMetadata {
            info_hash,
            name,
            piece_length,
            piece_hashes,
            total_length,
            announce_urls: Self::extract_announce_urls(dict),
            web_seeds: Self::extract_web_seeds(dict),
        })
    }

    /// SHA-1 of the info dictionary exactly as it appears in the data.
    ///
    /// # Errors
    ///
    /// - `TorrentError::InvalidTorrentFile` - If the info dictionary cannot be located
    pub fn calculate_info_hash(original_data: &[u8]) -> Result<InfoHash, TorrentError> {
        let span = Self::info_dictionary_span(original_data)?;

        let mut hasher = Sha1::new();
        hasher.update(&original_data[span]);
        let hash_result = hasher.finalize();
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&hash_result);

        Ok(InfoHash::new(hash))
    }

    /// Byte range of the top-level `info` value.
    ///
    /// Walks the root dictionary key by key, so an `info` key nested in
    /// another value or a `4:info` byte sequence inside a string never matches.
    ///
    /// # Errors
    ///
    /// - `TorrentError::InvalidTorrentFile` - If the data is malformed or has no `info` key
    pub fn info_dictionary_span(data: &[u8]) -> Result<Range<usize>, TorrentError> {
        if data.first() != Some(&b'd') {
            return Err(TorrentError::InvalidTorrentFile {
                reason: "Expected dictionary start".to_string(),
            });
        }

        let mut pos = 1;
        while pos < data.len() && data[pos] != b'e' {
            let key_end = Self::find_value_end(data, pos)?;
            let key = Self::string_contents(data, pos..key_end)?;
            let value_end = Self::find_value_end(data, key_end)?;

            if key == b"info" {
                if data[key_end] != b'd' {
                    return Err(TorrentError::InvalidTorrentFile {
                        reason: "Info field must be dictionary".to_string(),
                    });
                }
                return Ok(key_end..value_end);
            }

            pos = value_end;
        }

        Err(TorrentError::InvalidTorrentFile {
            reason: "Could not find info dictionary in data".to_string(),
        })
    }

    /// Find the end position (exclusive) of the bencode value starting at `start`
    ///
    /// # Errors
    ///
    /// - `TorrentError::InvalidTorrentFile` - If the value is truncated or malformed
    pub fn find_value_end(data: &[u8], start: usize) -> Result<usize, TorrentError> {
        match data.get(start) {
            Some(b'i') => data[start + 1..]
                .iter()
                .position(|&byte| byte == b'e')
                .map(|offset| start + 1 + offset + 1)
                .ok_or_else(|| TorrentError::InvalidTorrentFile {
                    reason: "Unterminated integer".to_string(),
                }),
            Some(b'l') | Some(b'd') => {
                let mut pos = start + 1;
                loop {
                    match data.get(pos) {
                        Some(b'e') => return Ok(pos + 1),
                        Some(_) => pos = Self::find_value_end(data, pos)?,
                        None => {
                            return Err(TorrentError::InvalidTorrentFile {
                                reason: "Incomplete bencode container".to_string(),
                            });
                        }
                    }
                }
            }
            Some(b'0'..=b'9') => {
                let colon = data[start..]
                    .iter()
                    .position(|&byte| byte == b':')
                    .map(|offset| start + offset)
                    .ok_or_else(|| TorrentError::InvalidTorrentFile {
                        reason: "Invalid string format".to_string(),
                    })?;

                let length: usize = std::str::from_utf8(&data[start..colon])
                    .ok()
                    .and_then(|length_str| length_str.parse().ok())
                    .ok_or_else(|| TorrentError::InvalidTorrentFile {
                        reason: "Invalid string length".to_string(),
                    })?;

                colon
                    .checked_add(1)
                    .and_then(|body| body.checked_add(length))
                    .filter(|&end| end <= data.len())
                    .ok_or_else(|| TorrentError::InvalidTorrentFile {
                        reason: "String extends past end of data".to_string(),
                    })
            }
            _ => Err(TorrentError::InvalidTorrentFile {
                reason: "Invalid bencode character".to_string(),
            }),
        }
    }

    fn string_contents(data: &[u8], span: Range<usize>) -> BytesResult<'_> {
        let raw = &data[span];
        let colon = raw
            .iter()
            .position(|&byte| byte == b':')
            .ok_or_else(|| TorrentError::InvalidTorrentFile {
                reason: "Dictionary key must be a string".to_string(),
            })?;
        Ok(&raw[colon + 1..])
    }

    /// Extract string from bencode dictionary
    fn extract_bytes_as_string(dict: &BencodeDict<'_>, key: &[u8]) -> ParseResult<String> {
        let bytes = Self::extract_bytes(dict, key)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| TorrentError::InvalidTorrentFile {
            reason: format!("Invalid UTF-8 in field: {:?}", String::from_utf8_lossy(key)),
        })
    }

    /// Extract bytes from bencode dictionary
    fn extract_bytes<'a>(dict: &'a BencodeDict<'_>, key: &[u8]) -> BytesResult<'a> {
        match dict.get(key) {
            Some(bencode_rs::Value::Bytes(bytes)) => Ok(bytes),
            _ => Err(TorrentError::InvalidTorrentFile {
                reason: format!(
                    "Missing or invalid field: {:?}",
                    String::from_utf8_lossy(key)
                ),
            }),
        }
    }

    /// Extract integer from bencode dictionary
    fn extract_integer(dict: &BencodeDict<'_>, key: &[u8]) -> ParseResult<i64> {
        match dict.get(key) {
            Some(bencode_rs::Value::Integer(value)) => Ok(*value),
            _ => Err(TorrentError::InvalidTorrentFile {
                reason: format!(
                    "Missing or invalid integer field: {:?}",
                    String::from_utf8_lossy(key)
                ),
            }),
        }
    }

    /// Primary announce URL followed by every announce-list tier entry not already seen
    fn extract_announce_urls(dict: &BencodeDict<'_>) -> Vec<String> {
        let mut announce_urls = Vec::new();

        if let Ok(announce) = Self::extract_bytes_as_string(dict, b"announce") {
            announce_urls.push(announce);
        }

        if let Some(bencode_rs::Value::List(announce_list)) = dict.get(b"announce-list".as_slice())
        {
            for tier in announce_list {
                if let bencode_rs::Value::List(tier_urls) = tier {
                    for url_value in tier_urls {
                        if let bencode_rs::Value::Bytes(url_bytes) = url_value
                            && let Ok(url) = String::from_utf8(url_bytes.to_vec())
                            && !announce_urls.contains(&url)
                        {
                            announce_urls.push(url);
                        }
                    }
                }
            }
        }

        announce_urls
    }

    /// `url-list` may be a single string or a list of strings
    fn extract_web_seeds(dict: &BencodeDict<'_>) -> Vec<String> {
        match dict.get(b"url-list".as_slice()) {
            Some(bencode_rs::Value::Bytes(url_bytes)) => String::from_utf8(url_bytes.to_vec())
                .map(|url| vec![url])
                .unwrap_or_default(),
            Some(bencode_rs::Value::List(urls)) => urls
                .iter()
                .filter_map(|url_value| match url_value {
                    bencode_rs::Value::Bytes(url_bytes) => String::from_utf8(url_bytes.to_vec()).ok(),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TORRENT: &[u8] = b"d8:announce28:ws://localhost:9000/tracker/4:infod6:lengthi1000e4:name8:test.mp412:piece lengthi32768e6:pieces20:12345678901234567890e8:url-listl30:http://localhost:9000/seed.mp4ee";

    #[test]
    fn test_encode_sorts_dictionary_keys() {
        let value = BencodeValue::dictionary([
            ("name", BencodeValue::string("a")),
            ("length", BencodeValue::Integer(3)),
        ]);
        assert_eq!(value.encode(), b"d6:lengthi3e4:name1:ae");
    }

    #[test]
    fn test_encode_nested_values() {
        let value = BencodeValue::List(vec![
            BencodeValue::Integer(-4),
            BencodeValue::List(vec![BencodeValue::string("spam")]),
        ]);
        assert_eq!(value.encode(), b"li-4el4:spamee");
    }

    #[test]
    fn test_parse_single_file_torrent() {
        let metadata = BencodeParser::parse_bencode_data(SAMPLE_TORRENT).unwrap();

        assert_eq!(metadata.name, "test.mp4");
        assert_eq!(metadata.piece_length, 32768);
        assert_eq!(metadata.total_length, 1000);
        assert_eq!(metadata.piece_hashes.len(), 1);
        assert_eq!(metadata.announce_urls, vec!["ws://localhost:9000/tracker/"]);
        assert_eq!(metadata.web_seeds, vec!["http://localhost:9000/seed.mp4"]);
    }

    #[test]
    fn test_info_hash_covers_exact_info_bytes() {
        let info_start = SAMPLE_TORRENT
            .windows(6)
            .position(|window| window == b"4:info")
            .unwrap()
            + 6;
        let span = BencodeParser::info_dictionary_span(SAMPLE_TORRENT).unwrap();
        assert_eq!(span.start, info_start);
        assert_eq!(SAMPLE_TORRENT[span.end - 1], b'e');
        assert!(SAMPLE_TORRENT[span.end..].starts_with(b"8:url-list"));

        let expected = Sha1::digest(&SAMPLE_TORRENT[span]);
        let info_hash = BencodeParser::calculate_info_hash(SAMPLE_TORRENT).unwrap();
        assert_eq!(info_hash.as_bytes().as_slice(), expected.as_slice());
    }

    #[test]
    fn test_info_marker_inside_string_is_ignored() {
        let data = b"d7:comment6:4:info4:infod6:lengthi1e4:name1:a12:piece lengthi16384e6:pieces0:ee";
        let span = BencodeParser::info_dictionary_span(data).unwrap();
        assert_eq!(&data[span], b"d6:lengthi1e4:name1:a12:piece lengthi16384e6:pieces0:e");
    }

    #[test]
    fn test_missing_info_field() {
        let result = BencodeParser::parse_bencode_data(b"d8:announce9:test:8080e");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Missing 'info' field")
        );
    }

    #[test]
    fn test_invalid_pieces_length() {
        let data = b"d4:infod6:lengthi1000e4:name8:test.mp412:piece lengthi32768e6:pieces19:1234567890123456789ee";
        let result = BencodeParser::parse_bencode_data(data);
        assert!(result.unwrap_err().to_string().contains("Invalid pieces length"));
    }

    #[test]
    fn test_truncated_data_rejected() {
        assert!(BencodeParser::info_dictionary_span(b"d4:infod6:lengthi1").is_err());
        assert!(BencodeParser::info_dictionary_span(b"l4:infoe").is_err());
        assert!(BencodeParser::find_value_end(b"10:short", 0).is_err());
    }

    #[test]
    fn test_oversized_string_length_rejected() {
        let data = format!("d{}:xe", usize::MAX);
        assert!(BencodeParser::find_value_end(data.as_bytes(), 1).is_err());
        assert!(BencodeParser::info_dictionary_span(data.as_bytes()).is_err());
        assert!(BencodeParser::calculate_info_hash(data.as_bytes()).is_err());
    }

    #[tokio::test]
    async fn test_parse_torrent_file_from_disk() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("sample.torrent");
        tokio::fs::write(&path, SAMPLE_TORRENT).await.unwrap();

        let metadata = BencodeParser::parse_torrent_file(&path).await.unwrap();
        assert_eq!(metadata.name, "test.mp4");

        let missing = BencodeParser::parse_torrent_file(&temp_dir.path().join("none")).await;
        assert!(matches!(missing, Err(TorrentError::Io(_))));
    }
}

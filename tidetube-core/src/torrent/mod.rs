//! BitTorrent metadata for video artifacts
//!
//! Torrent file creation, parsing and magnet link handling for videos served
//! over WebTorrent with an HTTP web seed.

pub mod bencode;
pub mod creation;
pub mod magnet;
pub mod types;

use std::fmt;

pub use bencode::{BencodeParser, BencodeValue};
pub use creation::{MIN_PIECE_SIZE, TorrentCreator, TorrentUrls};
pub use magnet::MagnetUri;
pub use types::TorrentMetadata;

/// SHA-1 hash identifying a unique torrent.
///
/// 20-byte SHA-1 hash of the info dictionary from a torrent file.
/// Used to uniquely identify torrents across the BitTorrent network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InfoHash([u8; 20]);

impl InfoHash {
    /// Creates InfoHash from 20-byte SHA-1 hash.
    pub fn new(hash: [u8; 20]) -> Self {
        Self(hash)
    }

    /// Parses a 40 character hex string, either case.
    ///
    /// # Errors
    /// - `TorrentError::InvalidInfoHash` - Wrong length or non-hex characters
    pub fn from_hex(hex_str: &str) -> Result<Self, TorrentError> {
        let bytes = hex::decode(hex_str).map_err(|_| TorrentError::InvalidInfoHash {
            value: hex_str.to_string(),
        })?;
        let hash: [u8; 20] = bytes
            .try_into()
            .map_err(|_| TorrentError::InvalidInfoHash {
                value: hex_str.to_string(),
            })?;
        Ok(Self(hash))
    }

    /// Returns reference to underlying 20-byte hash.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Errors that can occur during torrent operations.
#[derive(Debug, thiserror::Error)]
pub enum TorrentError {
    #[error("Failed to parse torrent file: {reason}")]
    InvalidTorrentFile { reason: String },

    #[error("Cannot create torrent from empty file: {path}")]
    EmptySource { path: String },

    #[error("Invalid info hash: {value}")]
    InvalidInfoHash { value: String },

    #[error("Invalid magnet link: {reason}")]
    InvalidMagnetLink { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_hash_display() {
        let hash = [
            0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef, 0x01, 0x23, 0x45, 0x67, 0x89, 0xab,
            0xcd, 0xef, 0x01, 0x23, 0x45, 0x67,
        ];
        let info_hash = InfoHash::new(hash);
        assert_eq!(
            info_hash.to_string(),
            "0123456789abcdef0123456789abcdef01234567"
        );
    }

    #[test]
    fn test_info_hash_from_hex_accepts_uppercase() {
        let info_hash = InfoHash::from_hex("0123456789ABCDEF0123456789ABCDEF01234567").unwrap();
        assert_eq!(
            info_hash.to_string(),
            "0123456789abcdef0123456789abcdef01234567"
        );
    }

    #[test]
    fn test_info_hash_from_hex_rejects_bad_input() {
        assert!(InfoHash::from_hex("tooshort").is_err());
        assert!(InfoHash::from_hex(&"zz".repeat(20)).is_err());
        assert!(InfoHash::from_hex(&"ab".repeat(21)).is_err());
    }
}

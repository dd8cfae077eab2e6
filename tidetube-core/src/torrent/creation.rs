//! Torrent creation from local media files with piece splitting and hashing
//!
//! Builds single-file torrents that announce to the instance's websocket
//! tracker and list the HTTP web seed of the video.

use std::path::Path;

use sha1::{Digest, Sha1};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use super::bencode::{BencodeParser, BencodeValue};
use super::{InfoHash, TorrentError};

/// Smallest piece length used for new torrents (16 KiB)
pub const MIN_PIECE_SIZE: u32 = 16_384;

/// Largest piece length used for new torrents (16 MiB)
pub const MAX_PIECE_SIZE: u32 = 16 * 1024 * 1024;

/// Adaptive piece sizing aims for roughly this many pieces
const TARGET_PIECE_COUNT: u64 = 1024;

/// Value of the `created by` field
const CREATED_BY: &str = concat!("tidetube/", env!("CARGO_PKG_VERSION"));

/// Tracker and web seed advertised by a torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentUrls {
    /// Websocket tracker, e.g. `ws://host:port/tracker/socket`
    pub announce: String,
    /// HTTP URL serving the same file
    pub web_seed: String,
}

/// Torrent creator for converting local files to torrent format
#[derive(Debug, Clone, Default)]
pub struct TorrentCreator {
    /// Fixed piece size; `None` picks one from the file size
    piece_size: Option<u32>,
}

impl TorrentCreator {
    /// Creates torrent creator with adaptive piece size
    pub fn new() -> Self {
        Self { piece_size: None }
    }

    /// Creates torrent creator with custom piece size
    pub fn with_piece_size(piece_size: u32) -> Self {
        Self {
            piece_size: Some(piece_size.max(1)),
        }
    }

    /// Power of two piece length giving about 1024 pieces, clamped to 16 KiB..=16 MiB.
    pub fn adaptive_piece_size(file_size: u64) -> u32 {
        let target = (file_size / TARGET_PIECE_COUNT).max(1).next_power_of_two();
        target.clamp(MIN_PIECE_SIZE as u64, MAX_PIECE_SIZE as u64) as u32
    }

    /// Writes a torrent for `source` to `output` and returns its info hash.
    ///
    /// The info hash is computed by parsing the file just written, so it is
    /// the hash any client derives from the same bytes.
    ///
    /// # Errors
    /// - `TorrentError::Io` - Source unreadable or output not writable
    /// - `TorrentError::EmptySource` - Source has no content
    /// - `TorrentError::InvalidTorrentFile` - Written file does not parse back
    pub async fn write_torrent_file(
        &self,
        source: &Path,
        output: &Path,
        name: &str,
        urls: &TorrentUrls,
    ) -> Result<InfoHash, TorrentError> {
        let torrent_bytes = self.create_torrent_bytes(source, name, urls).await?;
        tokio::fs::write(output, &torrent_bytes).await?;

        let written = tokio::fs::read(output).await?;
        let metadata = BencodeParser::parse_bencode_data(&written)?;

        tracing::info!(
            "Wrote torrent {} ({} pieces of {} bytes) with info hash {}",
            output.display(),
            metadata.piece_hashes.len(),
            metadata.piece_length,
            metadata.info_hash
        );

        Ok(metadata.info_hash)
    }

    /// Builds the bencoded torrent for a single file.
    ///
    /// # Errors
    /// - `TorrentError::Io` - File read error or access denied
    /// - `TorrentError::EmptySource` - File has no content
    pub async fn create_torrent_bytes(
        &self,
        source: &Path,
        name: &str,
        urls: &TorrentUrls,
    ) -> Result<Vec<u8>, TorrentError> {
        let mut file = File::open(source).await?;
        let file_size = file.metadata().await?.len();

        if file_size == 0 {
            return Err(TorrentError::EmptySource {
                path: source.display().to_string(),
            });
        }

        let piece_size = self
            .piece_size
            .unwrap_or_else(|| Self::adaptive_piece_size(file_size));
        let pieces = Self::calculate_piece_hashes(&mut file, file_size, piece_size).await?;

        tracing::debug!(
            "Hashed {} into {} pieces of {} bytes",
            source.display(),
            pieces.len() / 20,
            piece_size
        );

        let info = BencodeValue::dictionary([
            ("length", BencodeValue::Integer(file_size as i64)),
            ("name", BencodeValue::string(name)),
            ("piece length", BencodeValue::Integer(i64::from(piece_size))),
            ("pieces", BencodeValue::Bytes(pieces)),
        ]);

        let torrent = BencodeValue::dictionary([
            ("announce", BencodeValue::string(&urls.announce)),
            (
                "announce-list",
                BencodeValue::List(vec![BencodeValue::List(vec![BencodeValue::string(
                    &urls.announce,
                )])]),
            ),
            ("created by", BencodeValue::string(CREATED_BY)),
            (
                "creation date",
                BencodeValue::Integer(chrono::Utc::now().timestamp()),
            ),
            ("info", info),
            (
                "url-list",
                BencodeValue::List(vec![BencodeValue::string(&urls.web_seed)]),
            ),
        ]);

        Ok(torrent.encode())
    }

    /// Concatenated SHA-1 hashes of every piece, final piece possibly short
    async fn calculate_piece_hashes(
        file: &mut File,
        file_size: u64,
        piece_size: u32,
    ) -> Result<Vec<u8>, TorrentError> {
        let piece_count = file_size.div_ceil(u64::from(piece_size));
        let mut pieces = Vec::with_capacity(piece_count as usize * 20);
        let mut buffer = vec![0u8; piece_size as usize];
        let mut position = 0u64;

        while position < file_size {
            let remaining = file_size - position;
            let read_size = (remaining as usize).min(piece_size as usize);

            file.read_exact(&mut buffer[..read_size]).await?;

            let mut hasher = Sha1::new();
            hasher.update(&buffer[..read_size]);
            pieces.extend_from_slice(&hasher.finalize());

            position += read_size as u64;
        }

        Ok(pieces)
    }
}

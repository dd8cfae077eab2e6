//! Parsed torrent metadata

use super::InfoHash;

/// Metadata read back from a single-file torrent.
///
/// Contains the info hash computed over the raw info dictionary along with
/// the piece layout, tracker URLs and HTTP web seeds.
#[derive(Debug, Clone, PartialEq)]
pub struct TorrentMetadata {
    pub info_hash: InfoHash,
    pub name: String,
    pub piece_length: u32,
    pub piece_hashes: Vec<[u8; 20]>,
    pub total_length: u64,
    pub announce_urls: Vec<String>,
    pub web_seeds: Vec<String>,
}

//! Data models for the chart catalog database.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A performing artist. Names are unique across the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: i64,
    pub name: String,
}

/// A chart song as persisted in the catalog.
///
/// The title is the deduplication key: a second song with the same title is
/// ignored even when it belongs to a different artist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongRecord {
    pub title: String,
    pub external_id: String,
    pub artist_id: i64,
    pub popularity: i64,
    pub valence: f64,
    pub danceability: f64,
    pub energy: f64,
    pub play_count: u64,
}

/// Result of a duplicate-safe insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    /// A row with the same key already existed; nothing was written.
    DuplicateIgnored,
}

/// Per-song scalars read back for aggregation and plotting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SongFeatures {
    pub popularity: i64,
    pub valence: f64,
    pub danceability: f64,
    pub energy: f64,
}

/// One leaderboard row: how many stored songs belong to an artist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistSongCount {
    pub artist_id: i64,
    pub artist_name: String,
    pub song_count: usize,
}

/// Errors the catalog store raises on top of plain database failures.
#[derive(Debug, Error)]
pub enum CatalogStoreError {
    #[error("Song '{title}' references unknown artist id {artist_id}")]
    UnknownArtist { artist_id: i64, title: String },
}

//! CatalogStore trait definition.

use super::models::{Artist, ArtistSongCount, SongFeatures, SongRecord, UpsertOutcome};
use anyhow::Result;

/// Duplicate-safe write operations, available both directly on a store and
/// inside a [`CatalogStore::write_batch`] transaction.
pub trait CatalogWriter {
    /// Insert the artist if its name is new. Returns the id of the new or
    /// pre-existing row.
    fn upsert_artist(&self, name: &str) -> Result<i64>;

    /// Insert the song unless a song with the same title exists.
    ///
    /// Fails with [`super::CatalogStoreError::UnknownArtist`] when
    /// `song.artist_id` does not name a stored artist.
    fn upsert_song(&self, song: &SongRecord) -> Result<UpsertOutcome>;
}

/// Trait for chart catalog storage backends.
pub trait CatalogStore: Send + Sync {
    // =========================================================================
    // Schema
    // =========================================================================

    /// Create the Artist and Song tables if absent. Safe to call on every start.
    fn ensure_schema(&self) -> Result<()>;

    // =========================================================================
    // Writes
    // =========================================================================

    /// See [`CatalogWriter::upsert_artist`]. Commits immediately.
    fn upsert_artist(&self, name: &str) -> Result<i64>;

    /// See [`CatalogWriter::upsert_song`]. Commits immediately.
    fn upsert_song(&self, song: &SongRecord) -> Result<UpsertOutcome>;

    /// Run `batch` inside a single transaction. Everything it wrote is
    /// committed together when it returns `Ok`, and rolled back otherwise.
    fn write_batch(&self, batch: &mut dyn FnMut(&dyn CatalogWriter) -> Result<()>) -> Result<()>;

    // =========================================================================
    // Counts
    // =========================================================================

    /// Number of stored songs.
    fn current_song_count(&self) -> Result<usize>;

    /// Number of stored artists.
    fn artist_count(&self) -> Result<usize>;

    // =========================================================================
    // Lookups
    // =========================================================================

    fn find_artist_by_name(&self, name: &str) -> Result<Option<Artist>>;

    fn get_song(&self, title: &str) -> Result<Option<SongRecord>>;

    /// All artists ordered by id.
    fn list_artists(&self) -> Result<Vec<Artist>>;

    // =========================================================================
    // Aggregation support
    // =========================================================================

    /// Popularity and audio character of every song, in insertion order.
    fn song_features(&self) -> Result<Vec<SongFeatures>>;

    /// Listening count of every song, in insertion order.
    fn play_counts(&self) -> Result<Vec<u64>>;

    /// Artists ranked by number of stored songs, descending, ties broken by
    /// artist id ascending. At most `limit` rows.
    fn top_artists(&self, limit: usize) -> Result<Vec<ArtistSongCount>>;
}

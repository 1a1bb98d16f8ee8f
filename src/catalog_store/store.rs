//! SQLite-backed catalog store implementation.
//!
//! A single connection sits behind a mutex, so an upsert's insert and its
//! follow-up id lookup can never interleave with another caller in this
//! process.

use super::models::{
    Artist, ArtistSongCount, CatalogStoreError, SongFeatures, SongRecord, UpsertOutcome,
};
use super::schema::CATALOG_VERSIONED_SCHEMAS;
use super::trait_def::{CatalogStore, CatalogWriter};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// SQLite-backed chart catalog store.
#[derive(Clone)]
pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
}

fn ensure_schema_on(conn: &Connection) -> Result<()> {
    let latest_schema = CATALOG_VERSIONED_SCHEMAS
        .last()
        .context("No catalog schema declared")?;
    let created = latest_schema
        .ensure(conn)
        .context("Catalog database does not match the expected schema")?;
    if !created.is_empty() {
        info!(
            "Created catalog tables {:?} at schema version {}",
            created, latest_schema.version
        );
    }
    Ok(())
}

fn upsert_artist_on(conn: &Connection, name: &str) -> Result<i64> {
    let inserted = conn
        .prepare_cached("INSERT OR IGNORE INTO Artist (name) VALUES (?1)")?
        .execute(params![name])?;
    let id: i64 = conn
        .prepare_cached("SELECT id FROM Artist WHERE name = ?1")?
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Artist '{}' missing after upsert", name))?;
    if inserted > 0 {
        debug!("Added artist '{}' with id {}", name, id);
    }
    Ok(id)
}

fn upsert_song_on(conn: &Connection, song: &SongRecord) -> Result<UpsertOutcome> {
    let artist_exists = conn
        .prepare_cached("SELECT 1 FROM Artist WHERE id = ?1")?
        .query_row(params![song.artist_id], |_| Ok(()))
        .optional()?
        .is_some();
    if !artist_exists {
        return Err(CatalogStoreError::UnknownArtist {
            artist_id: song.artist_id,
            title: song.title.clone(),
        }
        .into());
    }

    let inserted = conn
        .prepare_cached(
            "INSERT OR IGNORE INTO Song
             (title, external_id, artist_id, popularity, valence, danceability, energy, play_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?
        .execute(params![
            song.title,
            song.external_id,
            song.artist_id,
            song.popularity,
            song.valence,
            song.danceability,
            song.energy,
            song.play_count,
        ])?;

    if inserted > 0 {
        Ok(UpsertOutcome::Inserted)
    } else {
        debug!("Song '{}' already stored, ignoring", song.title);
        Ok(UpsertOutcome::DuplicateIgnored)
    }
}

/// Writer handed to [`CatalogStore::write_batch`] callbacks; every statement
/// runs inside the surrounding transaction.
struct TransactionWriter<'a> {
    conn: &'a Connection,
}

impl CatalogWriter for TransactionWriter<'_> {
    fn upsert_artist(&self, name: &str) -> Result<i64> {
        upsert_artist_on(self.conn, name)
    }

    fn upsert_song(&self, song: &SongRecord) -> Result<UpsertOutcome> {
        upsert_song_on(self.conn, song)
    }
}

impl SqliteCatalogStore {
    /// Open (or create) the catalog database at `db_path` and make sure the
    /// schema is in place.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path_ref = db_path.as_ref();
        let conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open catalog database at {:?}", db_path_ref))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .context("Failed to set WAL mode on catalog connection")?;

        Self::from_connection(conn)
    }

    /// In-memory catalog, mostly useful for tests.
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        ensure_schema_on(&conn)?;

        let artists: usize = conn.query_row("SELECT COUNT(*) FROM Artist", [], |r| r.get(0))?;
        let songs: usize = conn.query_row("SELECT COUNT(*) FROM Song", [], |r| r.get(0))?;
        info!("Catalog store ready: {} artists, {} songs", artists, songs);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn ensure_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        ensure_schema_on(&conn)
    }

    fn upsert_artist(&self, name: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        upsert_artist_on(&conn, name)
    }

    fn upsert_song(&self, song: &SongRecord) -> Result<UpsertOutcome> {
        let conn = self.conn.lock().unwrap();
        upsert_song_on(&conn, song)
    }

    fn write_batch(&self, batch: &mut dyn FnMut(&dyn CatalogWriter) -> Result<()>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let tx = conn.unchecked_transaction()?;
        {
            let writer = TransactionWriter { conn: &tx };
            // Dropping the transaction on error rolls the whole batch back.
            batch(&writer)?;
        }
        tx.commit().context("Failed to commit catalog batch")?;
        Ok(())
    }

    fn current_song_count(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        Ok(conn.query_row("SELECT COUNT(*) FROM Song", [], |r| r.get(0))?)
    }

    fn artist_count(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        Ok(conn.query_row("SELECT COUNT(*) FROM Artist", [], |r| r.get(0))?)
    }

    fn find_artist_by_name(&self, name: &str) -> Result<Option<Artist>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached("SELECT id, name FROM Artist WHERE name = ?1")?;
        let artist = stmt
            .query_row(params![name], |row| {
                Ok(Artist {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .optional()?;
        Ok(artist)
    }

    fn get_song(&self, title: &str) -> Result<Option<SongRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT title, external_id, artist_id, popularity, valence, danceability, energy, play_count
             FROM Song WHERE title = ?1",
        )?;
        let song = stmt
            .query_row(params![title], |row| {
                Ok(SongRecord {
                    title: row.get(0)?,
                    external_id: row.get(1)?,
                    artist_id: row.get(2)?,
                    popularity: row.get(3)?,
                    valence: row.get(4)?,
                    danceability: row.get(5)?,
                    energy: row.get(6)?,
                    play_count: row.get(7)?,
                })
            })
            .optional()?;
        Ok(song)
    }

    fn list_artists(&self) -> Result<Vec<Artist>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached("SELECT id, name FROM Artist ORDER BY id")?;
        let artists = stmt
            .query_map([], |row| {
                Ok(Artist {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(artists)
    }

    fn song_features(&self) -> Result<Vec<SongFeatures>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT popularity, valence, danceability, energy FROM Song ORDER BY rowid",
        )?;
        let features = stmt
            .query_map([], |row| {
                Ok(SongFeatures {
                    popularity: row.get(0)?,
                    valence: row.get(1)?,
                    danceability: row.get(2)?,
                    energy: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(features)
    }

    fn play_counts(&self) -> Result<Vec<u64>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached("SELECT play_count FROM Song ORDER BY rowid")?;
        let counts = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<u64>>>()?;
        Ok(counts)
    }

    fn top_artists(&self, limit: usize) -> Result<Vec<ArtistSongCount>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT Artist.id, Artist.name, COUNT(Song.title) AS song_count
             FROM Song
             JOIN Artist ON Song.artist_id = Artist.id
             GROUP BY Artist.id
             ORDER BY song_count DESC, Artist.id ASC
             LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(ArtistSongCount {
                    artist_id: row.get(0)?,
                    artist_name: row.get(1)?,
                    song_count: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

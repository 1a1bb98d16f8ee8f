//! Fake upstream services and catalog fixtures.

#![allow(dead_code)]

use super::constants::*;
use anyhow::{bail, Result};
use chart_ingest::catalog_store::SqliteCatalogStore;
use chart_ingest::config::CATALOG_DB_FILE_NAME;
use chart_ingest::ingestion::IngestionCoordinator;
use chart_ingest::upstream::{
    AudioCharacter, CatalogClient, ChartEntry, ChartSnapshot, ChartTrack, PopularityClient,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// A single chart entry with the given energy. Valence and danceability
/// follow the energy so fixtures stay easy to reason about.
pub fn track(title: &str, artist: &str, energy: f64) -> ChartEntry {
    ChartEntry {
        track: ChartTrack {
            title: title.to_string(),
            external_id: format!("spotify:{}", title.to_lowercase().replace(' ', "-")),
            popularity: 60,
            artists: vec![artist.to_string()],
        },
        audio: AudioCharacter {
            valence: 1.0 - energy,
            danceability: energy,
            energy,
        },
    }
}

/// A chart of `len` distinct titles spread over seven artists, with energies
/// cycling through 0.05..0.95.
pub fn chart(len: usize) -> ChartSnapshot {
    ChartSnapshot {
        entries: (0..len)
            .map(|i| {
                track(
                    &format!("Song {:03}", i),
                    &format!("Artist {}", i % 7),
                    (i % 10) as f64 / 10.0 + 0.05,
                )
            })
            .collect(),
    }
}

/// A chart with explicit `(title, artist)` pairs, all of medium energy.
pub fn chart_with_artists(tracks: &[(&str, &str)]) -> ChartSnapshot {
    ChartSnapshot {
        entries: tracks
            .iter()
            .map(|(title, artist)| track(title, artist, 0.5))
            .collect(),
    }
}

/// Catalog service returning a fixed chart, optionally failing every fetch.
pub struct FakeCatalogClient {
    snapshot: Mutex<ChartSnapshot>,
    unavailable: AtomicBool,
    fetches: AtomicUsize,
}

impl FakeCatalogClient {
    pub fn new(snapshot: ChartSnapshot) -> Arc<Self> {
        Arc::new(Self {
            snapshot: Mutex::new(snapshot),
            unavailable: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn set_chart(&self, snapshot: ChartSnapshot) {
        *self.snapshot.lock().unwrap() = snapshot;
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl CatalogClient for FakeCatalogClient {
    fn fetch_chart(&self) -> Result<ChartSnapshot> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            bail!("catalog service returned 503");
        }
        Ok(self.snapshot.lock().unwrap().clone())
    }
}

/// Popularity service reporting [`DEFAULT_PLAY_COUNT`] for every track,
/// except for artists configured to fail or to have no data.
pub struct FakePopularityClient {
    failing: HashSet<String>,
    missing: HashSet<String>,
    calls: AtomicUsize,
}

impl FakePopularityClient {
    pub fn healthy() -> Arc<Self> {
        Self::with(&[], &[])
    }

    pub fn failing_for(artists: &[&str]) -> Arc<Self> {
        Self::with(artists, &[])
    }

    pub fn missing_for(artists: &[&str]) -> Arc<Self> {
        Self::with(&[], artists)
    }

    fn with(failing: &[&str], missing: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            failing: failing.iter().map(|s| s.to_string()).collect(),
            missing: missing.iter().map(|s| s.to_string()).collect(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PopularityClient for FakePopularityClient {
    fn listening_count(&self, _track_title: &str, artist_name: &str) -> Result<Option<u64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(artist_name) {
            bail!("listening service timed out");
        }
        if self.missing.contains(artist_name) {
            return Ok(None);
        }
        Ok(Some(DEFAULT_PLAY_COUNT))
    }
}

/// File-backed catalog in a temporary directory.
pub struct TestCatalog {
    _dir: TempDir,
    pub db_path: PathBuf,
    pub store: Arc<SqliteCatalogStore>,
}

impl TestCatalog {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join(CATALOG_DB_FILE_NAME);
        let store = Arc::new(SqliteCatalogStore::new(&db_path).unwrap());
        Self {
            _dir: dir,
            db_path,
            store,
        }
    }

    /// Close the store and open the same database again, as a new process would.
    pub fn reopen(&mut self) {
        self.store = Arc::new(SqliteCatalogStore::new(&self.db_path).unwrap());
    }

    pub fn coordinator(
        &self,
        catalog: Arc<FakeCatalogClient>,
        popularity: Arc<FakePopularityClient>,
    ) -> IngestionCoordinator {
        IngestionCoordinator::new(self.store.clone(), catalog, popularity)
    }
}

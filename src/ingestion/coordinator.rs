use super::watermark::{SongCountWatermark, WatermarkProvider};
use crate::catalog_store::{CatalogStore, CatalogStoreError, SongRecord, UpsertOutcome};
use crate::upstream::{CatalogClient, ChartEntry, PopularityClient};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Tracks ingested per cycle unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 25;

/// Errors that abort an ingestion cycle.
///
/// Enrichment failures are not in here: they degrade to a zero play count.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("Catalog service unavailable: {0:#}")]
    UpstreamUnavailable(anyhow::Error),

    #[error("Song '{title}' references unknown artist id {artist_id}")]
    Referential { artist_id: i64, title: String },

    #[error("Store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl IngestionError {
    fn from_store(err: anyhow::Error) -> Self {
        match err.downcast_ref::<CatalogStoreError>() {
            Some(CatalogStoreError::UnknownArtist { artist_id, title }) => {
                IngestionError::Referential {
                    artist_id: *artist_id,
                    title: title.clone(),
                }
            }
            None => IngestionError::Store(err),
        }
    }
}

/// What a single cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Chart length at fetch time.
    pub fetched: usize,
    /// Half-open window `[start, end)` of chart indices processed.
    pub start: usize,
    pub end: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub skipped_without_artist: usize,
    /// Popularity lookups that errored and fell back to zero.
    pub enrichment_failures: usize,
    /// Popularity lookups that returned no data.
    pub enrichment_missing: usize,
}

impl CycleReport {
    pub fn window_len(&self) -> usize {
        self.end - self.start
    }

    /// True once the window has reached the end of the chart.
    pub fn reached_chart_end(&self) -> bool {
        self.end >= self.fetched
    }
}

struct PendingSong<'a> {
    entry: &'a ChartEntry,
    artist: &'a str,
    play_count: u64,
}

/// Drives ingestion cycles against one catalog store.
pub struct IngestionCoordinator {
    store: Arc<dyn CatalogStore>,
    catalog: Arc<dyn CatalogClient>,
    popularity: Arc<dyn PopularityClient>,
    watermark: Arc<dyn WatermarkProvider>,
}

impl IngestionCoordinator {
    /// Coordinator resuming from the store's song count.
    pub fn new(
        store: Arc<dyn CatalogStore>,
        catalog: Arc<dyn CatalogClient>,
        popularity: Arc<dyn PopularityClient>,
    ) -> Self {
        let watermark = Arc::new(SongCountWatermark::new(Arc::clone(&store)));
        Self {
            store,
            catalog,
            popularity,
            watermark,
        }
    }

    /// Replace the resumption point provider.
    pub fn with_watermark(mut self, watermark: Arc<dyn WatermarkProvider>) -> Self {
        self.watermark = watermark;
        self
    }

    /// Ingest at most `batch_size` tracks starting at the current watermark.
    ///
    /// The batch is committed as one transaction. An empty window (chart
    /// fully ingested, or shrunk below the watermark) is a no-op.
    pub fn run_cycle(&self, batch_size: usize) -> Result<CycleReport, IngestionError> {
        let snapshot = self
            .catalog
            .fetch_chart()
            .map_err(IngestionError::UpstreamUnavailable)?;

        let start = self.watermark.current_watermark()?;
        let end = start.saturating_add(batch_size).min(snapshot.len()).max(start);

        let mut report = CycleReport {
            fetched: snapshot.len(),
            start,
            end,
            ..Default::default()
        };

        if start == end {
            info!(
                "Nothing to ingest: watermark {} with {} chart tracks",
                start,
                snapshot.len()
            );
            return Ok(report);
        }

        info!(
            "Ingesting chart tracks [{}, {}) of {}",
            start,
            end,
            snapshot.len()
        );

        // Enrichment happens before the write transaction is opened, so no
        // lock is held across network calls.
        let mut pending = Vec::with_capacity(end - start);
        for entry in &snapshot.entries[start..end] {
            let Some(artist) = entry.track.primary_artist() else {
                warn!("Track '{}' has no artist, skipping", entry.track.title);
                report.skipped_without_artist += 1;
                continue;
            };

            let play_count = match self.popularity.listening_count(&entry.track.title, artist) {
                Ok(Some(count)) if i64::try_from(count).is_ok() => count,
                Ok(Some(count)) => {
                    warn!(
                        "Listening count {} for '{}' by '{}' is out of range",
                        count, entry.track.title, artist
                    );
                    report.enrichment_failures += 1;
                    0
                }
                Ok(None) => {
                    debug!("No listening data for '{}' by '{}'", entry.track.title, artist);
                    report.enrichment_missing += 1;
                    0
                }
                Err(e) => {
                    warn!(
                        "Listening count lookup failed for '{}' by '{}': {}",
                        entry.track.title, artist, e
                    );
                    report.enrichment_failures += 1;
                    0
                }
            };

            pending.push(PendingSong {
                entry,
                artist,
                play_count,
            });
        }

        let mut inserted = 0;
        let mut duplicates = 0;
        self.store
            .write_batch(&mut |writer| {
                for song in &pending {
                    let artist_id = writer.upsert_artist(song.artist)?;
                    let track = &song.entry.track;
                    let audio = &song.entry.audio;
                    let record = SongRecord {
                        title: track.title.clone(),
                        external_id: track.external_id.clone(),
                        artist_id,
                        popularity: track.popularity,
                        valence: audio.valence,
                        danceability: audio.danceability,
                        energy: audio.energy,
                        play_count: song.play_count,
                    };
                    match writer.upsert_song(&record)? {
                        UpsertOutcome::Inserted => inserted += 1,
                        UpsertOutcome::DuplicateIgnored => duplicates += 1,
                    }
                }
                Ok(())
            })
            .map_err(IngestionError::from_store)?;

        report.inserted = inserted;
        report.duplicates = duplicates;

        info!(
            "Cycle complete: {} inserted, {} duplicates, {} enrichment failures",
            report.inserted, report.duplicates, report.enrichment_failures
        );
        Ok(report)
    }

    /// Run cycles until the chart is fully ingested, a cycle makes no
    /// progress, `max_cycles` is reached or `stop` is raised.
    ///
    /// A cycle can make no progress before the chart end when the chart lists
    /// the same title twice: the watermark then never catches up.
    pub fn run_until_complete(
        &self,
        batch_size: usize,
        max_cycles: Option<usize>,
        stop: &AtomicBool,
    ) -> Result<Vec<CycleReport>, IngestionError> {
        let mut reports = Vec::new();
        loop {
            if stop.load(Ordering::SeqCst) {
                info!("Stop requested, ending ingestion after {} cycles", reports.len());
                break;
            }
            if max_cycles.is_some_and(|max| reports.len() >= max) {
                break;
            }

            let report = self.run_cycle(batch_size)?;
            let done = report.reached_chart_end() || report.inserted == 0;
            reports.push(report);
            if done {
                break;
            }
        }
        Ok(reports)
    }
}

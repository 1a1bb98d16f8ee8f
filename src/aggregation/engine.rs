use super::stats::{mean, sample_std_dev, EnergyBand, EnergyBandCounts};
use crate::catalog_store::{ArtistSongCount, CatalogStore};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Leaderboard length used by the report and the plots.
pub const DEFAULT_TOP_ARTISTS: usize = 15;

/// Default name of the text report artifact.
pub const REPORT_FILE_NAME: &str = "calculations_results.txt";

/// Headline numbers over the whole catalog.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub generated_at: DateTime<Utc>,
    pub song_count: usize,
    pub artist_count: usize,
    pub valence_std_dev: f64,
    pub mean_valence: f64,
    pub mean_listening_count: f64,
    pub energy_bands: EnergyBandCounts,
}

impl fmt::Display for SummaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "The valence standard deviation for the songs in the Billboard Top 100 is {}",
            self.valence_std_dev
        )?;
        writeln!(
            f,
            "The average valence of songs in the Billboard Top 100 is {}",
            self.mean_valence
        )?;
        writeln!(
            f,
            "The average play count of songs in the Billboard Top 100 is {}",
            self.mean_listening_count
        )?;
        writeln!(
            f,
            "Songs: {}, artists: {}",
            self.song_count, self.artist_count
        )?;
        for band in EnergyBand::ALL {
            writeln!(f, "{}: {}", band.label(), self.energy_bands.get(band))?;
        }
        writeln!(f, "Generated at {}", self.generated_at.to_rfc3339())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PopularityValencePoint {
    pub popularity: i64,
    pub valence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergyDanceabilityPoint {
    pub energy: f64,
    pub danceability: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnergyBandRow {
    pub band: EnergyBand,
    pub label: &'static str,
    pub count: usize,
}

/// Row sets consumed by chart rendering.
#[derive(Debug, Clone, Serialize)]
pub struct PresentationData {
    pub popularity_valence: Vec<PopularityValencePoint>,
    pub energy_danceability: Vec<EnergyDanceabilityPoint>,
    pub top_artists: Vec<ArtistSongCount>,
    pub energy_bands: Vec<EnergyBandRow>,
}

/// Read-only statistics over a catalog store. Every query copes with an
/// empty catalog.
pub struct AggregationEngine {
    store: Arc<dyn CatalogStore>,
}

impl AggregationEngine {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    fn valences(&self) -> Result<Vec<f64>> {
        Ok(self
            .store
            .song_features()?
            .into_iter()
            .map(|f| f.valence)
            .collect())
    }

    pub fn mean_valence(&self) -> Result<f64> {
        Ok(mean(&self.valences()?))
    }

    pub fn valence_dispersion(&self) -> Result<f64> {
        Ok(sample_std_dev(&self.valences()?))
    }

    pub fn mean_listening_count(&self) -> Result<f64> {
        let counts: Vec<f64> = self
            .store
            .play_counts()?
            .into_iter()
            .map(|c| c as f64)
            .collect();
        Ok(mean(&counts))
    }

    pub fn energy_bands(&self) -> Result<EnergyBandCounts> {
        let features = self.store.song_features()?;
        Ok(EnergyBandCounts::from_energies(
            features.into_iter().map(|f| f.energy),
        ))
    }

    /// Artists with the most songs, ties broken by artist id.
    pub fn top_artists(&self, n: usize) -> Result<Vec<ArtistSongCount>> {
        self.store.top_artists(n)
    }

    pub fn summary(&self) -> Result<SummaryReport> {
        let features = self.store.song_features()?;
        let valences: Vec<f64> = features.iter().map(|f| f.valence).collect();

        Ok(SummaryReport {
            generated_at: Utc::now(),
            song_count: features.len(),
            artist_count: self.store.artist_count()?,
            valence_std_dev: sample_std_dev(&valences),
            mean_valence: mean(&valences),
            mean_listening_count: self.mean_listening_count()?,
            energy_bands: EnergyBandCounts::from_energies(features.iter().map(|f| f.energy)),
        })
    }

    /// Compute the summary and write it as text to `path`.
    pub fn write_report(&self, path: &Path) -> Result<SummaryReport> {
        let report = self.summary()?;
        std::fs::write(path, report.to_string())
            .with_context(|| format!("Failed to write report to {:?}", path))?;
        info!("Wrote summary of {} songs to {:?}", report.song_count, path);
        Ok(report)
    }

    pub fn presentation_data(&self, top_n: usize) -> Result<PresentationData> {
        let features = self.store.song_features()?;
        let bands = EnergyBandCounts::from_energies(features.iter().map(|f| f.energy));

        Ok(PresentationData {
            popularity_valence: features
                .iter()
                .map(|f| PopularityValencePoint {
                    popularity: f.popularity,
                    valence: f.valence,
                })
                .collect(),
            energy_danceability: features
                .iter()
                .map(|f| EnergyDanceabilityPoint {
                    energy: f.energy,
                    danceability: f.danceability,
                })
                .collect(),
            top_artists: self.store.top_artists(top_n)?,
            energy_bands: EnergyBand::ALL
                .into_iter()
                .map(|band| EnergyBandRow {
                    band,
                    label: band.label(),
                    count: bands.get(band),
                })
                .collect(),
        })
    }
}

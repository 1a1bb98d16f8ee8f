//! Chart Ingest Library
//!
//! Incremental ingestion of a streaming chart playlist into SQLite, enriched
//! with listening counts, plus the statistics computed over it.

pub mod aggregation;
pub mod catalog_store;
pub mod config;
pub mod ingestion;
pub mod sqlite_persistence;
pub mod upstream;

// Re-export commonly used types for convenience
pub use aggregation::{AggregationEngine, EnergyBand, EnergyBandCounts, SummaryReport};
pub use catalog_store::{CatalogStore, SqliteCatalogStore};
pub use ingestion::{CycleReport, IngestionCoordinator, IngestionError};
pub use upstream::{CatalogClient, LastFmClient, PopularityClient, SpotifyClient};

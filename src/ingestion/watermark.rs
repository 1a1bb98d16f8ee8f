use crate::catalog_store::CatalogStore;
use anyhow::Result;
use std::sync::Arc;

/// Where the next ingestion cycle resumes, as an index into the chart.
pub trait WatermarkProvider: Send + Sync {
    fn current_watermark(&self) -> Result<usize>;
}

/// Watermark derived from the number of stored songs. Nothing is persisted:
/// progress is whatever the store already holds.
pub struct SongCountWatermark {
    store: Arc<dyn CatalogStore>,
}

impl SongCountWatermark {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }
}

impl WatermarkProvider for SongCountWatermark {
    fn current_watermark(&self) -> Result<usize> {
        self.store.current_song_count()
    }
}

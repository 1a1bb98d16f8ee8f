//! Incremental chart ingestion.
//!
//! Each cycle fetches the whole chart, resumes at the watermark (the number
//! of songs already stored) and ingests at most one batch of tracks:
//!
//! ```text
//! chart[start..min(start + batch, len)] → Last.fm play count → Artist upsert → Song upsert
//! ```
//!
//! Upserts are duplicate-safe, so re-running a cycle over rows that are
//! already stored only produces no-ops.

mod coordinator;
mod watermark;

pub use coordinator::{CycleReport, IngestionCoordinator, IngestionError, DEFAULT_BATCH_SIZE};
pub use watermark::{SongCountWatermark, WatermarkProvider};

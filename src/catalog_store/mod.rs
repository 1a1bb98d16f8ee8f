mod models;
mod schema;
mod store;
mod trait_def;

pub use models::{
    Artist, ArtistSongCount, CatalogStoreError, SongFeatures, SongRecord, UpsertOutcome,
};
pub use store::SqliteCatalogStore;
pub use trait_def::{CatalogStore, CatalogWriter};

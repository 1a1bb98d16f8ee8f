//! Clients for the two upstream services.
//!
//! - Catalog: the chart playlist with per-track audio character (Spotify)
//! - Popularity: listening counts per track or artist (Last.fm)

pub mod catalog;
pub mod models;
pub mod popularity;

pub use catalog::{CatalogClient, SpotifyClient};
pub use models::{AudioCharacter, ChartEntry, ChartSnapshot, ChartTrack};
pub use popularity::{LastFmClient, PopularityClient};

mod file_config;

pub use file_config::{FileConfig, LastFmConfig, SpotifyConfig};

use crate::aggregation::{DEFAULT_TOP_ARTISTS, REPORT_FILE_NAME};
use crate::ingestion::DEFAULT_BATCH_SIZE;
use anyhow::{bail, Result};
use std::path::PathBuf;

/// Billboard Hot 100 playlist.
pub const DEFAULT_PLAYLIST_ID: &str = "6UeSakyzhiEt4NB3UAd6NQ";

/// Name of the catalog database inside `db_dir`.
pub const CATALOG_DB_FILE_NAME: &str = "billboard_hot_100.db";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub playlist_id: Option<String>,
    pub batch_size: Option<usize>,
    pub top_artists_limit: Option<usize>,
    pub report_path: Option<PathBuf>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub lastfm_api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub playlist_id: String,
    pub batch_size: usize,
    pub top_artists_limit: usize,
    pub report_path: PathBuf,
    pub spotify: Option<SpotifyCredentials>,
    pub lastfm_api_key: Option<String>,
}

#[derive(Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for SpotifyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        // TOML overrides CLI for each field
        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let playlist_id = file
            .playlist_id
            .or_else(|| cli.playlist_id.clone())
            .unwrap_or_else(|| DEFAULT_PLAYLIST_ID.to_string());

        let batch_size = file
            .batch_size
            .or(cli.batch_size)
            .unwrap_or(DEFAULT_BATCH_SIZE);
        if batch_size == 0 {
            bail!("batch_size must be greater than zero");
        }

        let top_artists_limit = file
            .top_artists_limit
            .or(cli.top_artists_limit)
            .unwrap_or(DEFAULT_TOP_ARTISTS);

        let report_path = file
            .report_path
            .map(PathBuf::from)
            .or_else(|| cli.report_path.clone())
            .unwrap_or_else(|| db_dir.join(REPORT_FILE_NAME));

        // Spotify credentials - [spotify] section takes precedence per field
        let spotify_file = file.spotify.unwrap_or_default();
        let client_id = spotify_file
            .client_id
            .or_else(|| cli.spotify_client_id.clone());
        let client_secret = spotify_file
            .client_secret
            .or_else(|| cli.spotify_client_secret.clone());
        let spotify = match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => Some(SpotifyCredentials {
                client_id,
                client_secret,
            }),
            (None, None) => None,
            _ => bail!("Both Spotify client id and client secret must be provided together"),
        };

        let lastfm_api_key = file
            .lastfm
            .and_then(|l| l.api_key)
            .or_else(|| cli.lastfm_api_key.clone());

        Ok(Self {
            db_dir,
            playlist_id,
            batch_size,
            top_artists_limit,
            report_path,
            spotify,
            lastfm_api_key,
        })
    }

    pub fn catalog_db_path(&self) -> PathBuf {
        self.db_dir.join(CATALOG_DB_FILE_NAME)
    }

    pub fn spotify_credentials(&self) -> Result<&SpotifyCredentials> {
        self.spotify.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "Spotify credentials missing: set SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET or the [spotify] config section"
            )
        })
    }

    pub fn lastfm_api_key(&self) -> Result<&str> {
        self.lastfm_api_key.as_deref().ok_or_else(|| {
            anyhow::anyhow!("Last.fm API key missing: set LASTFM_API_KEY or [lastfm] api_key")
        })
    }
}

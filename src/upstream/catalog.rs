//! Spotify Web API client for the chart playlist and its audio features.
//!
//! Uses the client-credentials flow; the access token is cached until shortly
//! before it expires.

use super::models::{AudioCharacter, ChartEntry, ChartSnapshot, ChartTrack};
use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const SPOTIFY_ACCOUNTS_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";
const PLAYLIST_PAGE_SIZE: usize = 100;
const AUDIO_FEATURES_MAX_IDS: usize = 100;
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Source of the chart: ordered tracks plus their audio character.
#[cfg_attr(test, mockall::automock)]
pub trait CatalogClient: Send + Sync {
    /// Fetch the full chart in one go. Any failure invalidates the whole
    /// snapshot.
    fn fetch_chart(&self) -> Result<ChartSnapshot>;
}

pub struct SpotifyClient {
    client: Client,
    client_id: String,
    client_secret: String,
    playlist_id: String,
    token: Mutex<Option<(String, Instant)>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct PlaylistTracksPage {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next: Option<String>,
}

#[derive(Deserialize)]
struct PlaylistItem {
    track: Option<SpotifyTrack>,
}

#[derive(Deserialize)]
struct SpotifyTrack {
    id: Option<String>,
    name: String,
    #[serde(default)]
    popularity: i64,
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
}

#[derive(Deserialize)]
struct SpotifyArtist {
    name: String,
}

#[derive(Deserialize)]
struct AudioFeaturesResponse {
    #[serde(default)]
    audio_features: Vec<Option<SpotifyAudioFeatures>>,
}

#[derive(Deserialize)]
struct SpotifyAudioFeatures {
    id: String,
    valence: f64,
    danceability: f64,
    energy: f64,
}

/// Keeps playable tracks in playlist order. Local files and removed tracks
/// come back without an id and cannot be enriched.
fn tracks_from_page(page: PlaylistTracksPage) -> Vec<ChartTrack> {
    page.items
        .into_iter()
        .filter_map(|item| {
            let track = item.track?;
            let Some(id) = track.id else {
                warn!("Skipping playlist entry '{}' without a track id", track.name);
                return None;
            };
            Some(ChartTrack {
                title: track.name,
                external_id: id,
                popularity: track.popularity,
                artists: track.artists.into_iter().map(|a| a.name).collect(),
            })
        })
        .collect()
}

/// Pairs every track with its audio character. A missing entry fails the
/// whole chart.
fn join_audio_features(
    tracks: Vec<ChartTrack>,
    features: HashMap<String, AudioCharacter>,
) -> Result<ChartSnapshot> {
    let mut entries = Vec::with_capacity(tracks.len());
    for track in tracks {
        let Some(audio) = features.get(&track.external_id).copied() else {
            bail!(
                "No audio features for track '{}' ({})",
                track.title,
                track.external_id
            );
        };
        entries.push(ChartEntry { track, audio });
    }
    Ok(ChartSnapshot { entries })
}

impl SpotifyClient {
    pub fn new(client_id: &str, client_secret: &str, playlist_id: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            playlist_id: playlist_id.to_string(),
            token: Mutex::new(None),
        })
    }

    fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().unwrap();
        if let Some((token, expires_at)) = cached.as_ref() {
            if Instant::now() + TOKEN_EXPIRY_MARGIN < *expires_at {
                return Ok(token.clone());
            }
        }

        let credentials = BASE64.encode(format!("{}:{}", self.client_id, self.client_secret));
        let response = self
            .client
            .post(SPOTIFY_ACCOUNTS_TOKEN_URL)
            .header("Authorization", format!("Basic {}", credentials))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .context("Spotify token request failed")?;

        if !response.status().is_success() {
            bail!("Spotify token request failed with status {}", response.status());
        }

        let body: TokenResponse = response.json()?;
        let expires_at = Instant::now() + Duration::from_secs(body.expires_in);
        *cached = Some((body.access_token.clone(), expires_at));
        debug!("Obtained Spotify access token valid for {}s", body.expires_in);
        Ok(body.access_token)
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let token = self.access_token()?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .with_context(|| format!("Spotify request to {} failed", url))?;

        if !response.status().is_success() {
            bail!("Spotify API failed with status {} for {}", response.status(), url);
        }
        Ok(response.json()?)
    }

    fn fetch_playlist_tracks(&self) -> Result<Vec<ChartTrack>> {
        let mut tracks = Vec::new();
        let mut next_url = Some(format!(
            "{}/playlists/{}/tracks?limit={}&fields={}",
            SPOTIFY_API_BASE,
            self.playlist_id,
            PLAYLIST_PAGE_SIZE,
            urlencoding::encode("items(track(name,id,popularity,artists(name))),next")
        ));

        while let Some(url) = next_url {
            let page: PlaylistTracksPage = self.get_json(&url)?;
            next_url = page.next.clone();
            tracks.extend(tracks_from_page(page));
        }
        Ok(tracks)
    }

    fn fetch_audio_features(&self, ids: &[String]) -> Result<HashMap<String, AudioCharacter>> {
        let mut features = HashMap::with_capacity(ids.len());
        for chunk in ids.chunks(AUDIO_FEATURES_MAX_IDS) {
            let url = format!("{}/audio-features?ids={}", SPOTIFY_API_BASE, chunk.join(","));
            let body: AudioFeaturesResponse = self.get_json(&url)?;
            for f in body.audio_features.into_iter().flatten() {
                features.insert(
                    f.id,
                    AudioCharacter {
                        valence: f.valence,
                        danceability: f.danceability,
                        energy: f.energy,
                    },
                );
            }
        }
        Ok(features)
    }
}

impl CatalogClient for SpotifyClient {
    fn fetch_chart(&self) -> Result<ChartSnapshot> {
        let tracks = self.fetch_playlist_tracks()?;
        let ids: Vec<String> = tracks.iter().map(|t| t.external_id.clone()).collect();
        let features = self.fetch_audio_features(&ids)?;
        let snapshot = join_audio_features(tracks, features)?;
        info!(
            "Fetched {} chart tracks from playlist {}",
            snapshot.len(),
            self.playlist_id
        );
        Ok(snapshot)
    }
}

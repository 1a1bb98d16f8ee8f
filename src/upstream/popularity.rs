//! Last.fm API client for listening counts.
//!
//! Rate limited to 5 requests per second per Last.fm API guidelines.

use anyhow::{bail, Result};
use reqwest::blocking::Client;
use serde_json::Value as JsonValue;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

const LASTFM_API_BASE: &str = "https://ws.audioscrobbler.com/2.0/";
const RATE_LIMIT_INTERVAL: Duration = Duration::from_millis(200); // 5 req/sec

/// Source of listening counts used to enrich chart songs.
#[cfg_attr(test, mockall::automock)]
pub trait PopularityClient: Send + Sync {
    /// Listening count for a track by the given artist. `Ok(None)` means the
    /// service has no data for it.
    fn listening_count(&self, track_title: &str, artist_name: &str) -> Result<Option<u64>>;
}

pub struct LastFmClient {
    client: Client,
    api_key: String,
    last_request: Mutex<Instant>,
}

/// Reads a Last.fm counter, which the API usually encodes as a string.
fn playcount_at(body: &JsonValue, pointer: &str) -> Option<u64> {
    match body.pointer(pointer)? {
        JsonValue::String(s) => s.trim().parse().ok(),
        JsonValue::Number(n) => n.as_u64(),
        _ => None,
    }
}

impl LastFmClient {
    pub fn new(api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            last_request: Mutex::new(Instant::now() - RATE_LIMIT_INTERVAL),
        })
    }

    fn rate_limit(&self) {
        let mut last = self.last_request.lock().unwrap();
        let elapsed = last.elapsed();
        if elapsed < RATE_LIMIT_INTERVAL {
            std::thread::sleep(RATE_LIMIT_INTERVAL - elapsed);
        }
        *last = Instant::now();
    }

    fn request_url(&self, method: &str, query: &[(&str, &str)]) -> String {
        let mut url = format!(
            "{}?method={}&api_key={}&format=json&autocorrect=1",
            LASTFM_API_BASE,
            method,
            urlencoding::encode(&self.api_key)
        );
        for (key, value) in query {
            url.push_str(&format!("&{}={}", key, urlencoding::encode(value)));
        }
        url
    }

    fn call(&self, method: &str, query: &[(&str, &str)]) -> Result<JsonValue> {
        self.rate_limit();

        let url = self.request_url(method, query);
        let response = self.client.get(&url).send()?;
        if !response.status().is_success() {
            bail!("Last.fm {} failed with status {}", method, response.status());
        }
        Ok(response.json()?)
    }

    /// Playcount of a single track.
    pub fn track_playcount(&self, track_title: &str, artist_name: &str) -> Result<Option<u64>> {
        let body = self.call(
            "track.getInfo",
            &[("track", track_title), ("artist", artist_name)],
        )?;
        Ok(playcount_at(&body, "/track/playcount"))
    }

    /// Total playcount of an artist.
    pub fn artist_playcount(&self, artist_name: &str) -> Result<Option<u64>> {
        let body = self.call("artist.getinfo", &[("artist", artist_name)])?;
        Ok(playcount_at(&body, "/artist/stats/playcount"))
    }
}

impl PopularityClient for LastFmClient {
    fn listening_count(&self, track_title: &str, artist_name: &str) -> Result<Option<u64>> {
        if let Some(count) = self.track_playcount(track_title, artist_name)? {
            return Ok(Some(count));
        }
        debug!(
            "No track playcount for '{}' by '{}', falling back to artist stats",
            track_title, artist_name
        );
        self.artist_playcount(artist_name)
    }
}

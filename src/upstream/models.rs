use serde::{Deserialize, Serialize};

/// Track descriptor as listed in the chart playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartTrack {
    pub title: String,
    pub external_id: String,
    pub popularity: i64,
    /// Credited artists, primary artist first.
    pub artists: Vec<String>,
}

impl ChartTrack {
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(String::as_str)
    }
}

/// Perceptual scores of a track, each in [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioCharacter {
    pub valence: f64,
    pub danceability: f64,
    pub energy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartEntry {
    pub track: ChartTrack,
    pub audio: AudioCharacter,
}

/// The whole chart in playlist order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSnapshot {
    pub entries: Vec<ChartEntry>,
}

impl ChartSnapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

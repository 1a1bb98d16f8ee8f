//! Shared constants for end-to-end tests

/// Length of the default fake chart.
pub const CHART_LENGTH: usize = 30;

/// Artist credited on every track of the shared-artist chart.
pub const SHARED_ARTIST: &str = "Artist X";

/// Listening count the fake popularity service reports for healthy artists.
pub const DEFAULT_PLAY_COUNT: u64 = 1_000;

/// Artist for which the fake popularity service always fails.
pub const FLAKY_ARTIST: &str = "Flaky Artist";

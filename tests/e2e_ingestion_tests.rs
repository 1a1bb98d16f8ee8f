//! End-to-end tests for incremental chart ingestion
//!
//! Runs the coordinator against a file-backed catalog with fake upstream
//! services.

mod common;

use chart_ingest::catalog_store::CatalogStore;
use chart_ingest::ingestion::{IngestionError, DEFAULT_BATCH_SIZE};
use common::{
    chart, chart_with_artists, FakeCatalogClient, FakePopularityClient, TestCatalog, CHART_LENGTH,
    DEFAULT_PLAY_COUNT, FLAKY_ARTIST, SHARED_ARTIST,
};
use std::sync::atomic::AtomicBool;

// =============================================================================
// Batching and resumption
// =============================================================================

#[test]
fn test_thirty_track_chart_fills_in_two_cycles() {
    let catalog = TestCatalog::new();
    let coordinator = catalog.coordinator(
        FakeCatalogClient::new(chart(CHART_LENGTH)),
        FakePopularityClient::healthy(),
    );

    let first = coordinator.run_cycle(DEFAULT_BATCH_SIZE).unwrap();
    assert_eq!((first.start, first.end), (0, 25));
    assert_eq!(first.inserted, 25);
    assert_eq!(catalog.store.current_song_count().unwrap(), 25);

    let second = coordinator.run_cycle(DEFAULT_BATCH_SIZE).unwrap();
    assert_eq!((second.start, second.end), (25, 30));
    assert_eq!(second.inserted, 5);
    assert_eq!(catalog.store.current_song_count().unwrap(), 30);

    let third = coordinator.run_cycle(DEFAULT_BATCH_SIZE).unwrap();
    assert_eq!(third.window_len(), 0);
    assert_eq!(third.inserted, 0);
    assert_eq!(catalog.store.current_song_count().unwrap(), 30);
}

#[test]
fn test_resumes_from_stored_count_after_reopen() {
    let mut catalog = TestCatalog::new();
    let upstream = FakeCatalogClient::new(chart(CHART_LENGTH));
    catalog
        .coordinator(upstream.clone(), FakePopularityClient::healthy())
        .run_cycle(DEFAULT_BATCH_SIZE)
        .unwrap();

    catalog.reopen();
    let report = catalog
        .coordinator(upstream, FakePopularityClient::healthy())
        .run_cycle(DEFAULT_BATCH_SIZE)
        .unwrap();

    assert_eq!(report.start, 25);
    assert_eq!(report.inserted, 5);
    assert!(catalog.store.get_song("Song 029").unwrap().is_some());
}

#[test]
fn test_remaining_tracks_take_ceil_cycles() {
    let catalog = TestCatalog::new();
    let upstream = FakeCatalogClient::new(chart(CHART_LENGTH));
    let popularity = FakePopularityClient::healthy();
    catalog
        .coordinator(upstream.clone(), popularity.clone())
        .run_cycle(7)
        .unwrap();

    // 23 tracks left in batches of 4
    let reports = catalog
        .coordinator(upstream, popularity)
        .run_until_complete(4, None, &AtomicBool::new(false))
        .unwrap();

    assert_eq!(reports.len(), 6);
    assert!(reports.last().unwrap().reached_chart_end());
    assert_eq!(catalog.store.current_song_count().unwrap(), CHART_LENGTH);
}

#[test]
fn test_final_state_independent_of_batch_size() {
    let small = TestCatalog::new();
    let coordinator = small.coordinator(
        FakeCatalogClient::new(chart(50)),
        FakePopularityClient::healthy(),
    );
    coordinator.run_cycle(25).unwrap();
    coordinator.run_cycle(25).unwrap();

    let large = TestCatalog::new();
    large
        .coordinator(FakeCatalogClient::new(chart(50)), FakePopularityClient::healthy())
        .run_cycle(50)
        .unwrap();

    assert_eq!(
        small.store.current_song_count().unwrap(),
        large.store.current_song_count().unwrap()
    );
    assert_eq!(
        small.store.list_artists().unwrap(),
        large.store.list_artists().unwrap()
    );
    assert_eq!(
        small.store.song_features().unwrap(),
        large.store.song_features().unwrap()
    );
    assert_eq!(
        small.store.top_artists(100).unwrap(),
        large.store.top_artists(100).unwrap()
    );
}

#[test]
fn test_shrunken_chart_is_noop() {
    let catalog = TestCatalog::new();
    let upstream = FakeCatalogClient::new(chart(CHART_LENGTH));
    let coordinator = catalog.coordinator(upstream.clone(), FakePopularityClient::healthy());
    coordinator.run_cycle(DEFAULT_BATCH_SIZE).unwrap();

    upstream.set_chart(chart(10));
    let report = coordinator.run_cycle(DEFAULT_BATCH_SIZE).unwrap();

    assert_eq!(report.fetched, 10);
    assert_eq!(report.window_len(), 0);
    assert_eq!(catalog.store.current_song_count().unwrap(), 25);
}

// =============================================================================
// Deduplication
// =============================================================================

#[test]
fn test_shared_artist_stored_once() {
    let catalog = TestCatalog::new();
    let tracks: Vec<String> = (0..5).map(|i| format!("Track {}", i)).collect();
    let pairs: Vec<(&str, &str)> = tracks.iter().map(|t| (t.as_str(), SHARED_ARTIST)).collect();

    catalog
        .coordinator(
            FakeCatalogClient::new(chart_with_artists(&pairs)),
            FakePopularityClient::healthy(),
        )
        .run_cycle(DEFAULT_BATCH_SIZE)
        .unwrap();

    assert_eq!(catalog.store.artist_count().unwrap(), 1);
    let artist = catalog
        .store
        .find_artist_by_name(SHARED_ARTIST)
        .unwrap()
        .unwrap();
    for title in &tracks {
        let song = catalog.store.get_song(title).unwrap().unwrap();
        assert_eq!(song.artist_id, artist.id);
    }
    let top = catalog.store.top_artists(15).unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].song_count, 5);
}

#[test]
fn test_duplicate_title_keeps_first_song() {
    let catalog = TestCatalog::new();
    let report = catalog
        .coordinator(
            FakeCatalogClient::new(chart_with_artists(&[
                ("Same Name", "First Artist"),
                ("Same Name", "Second Artist"),
            ])),
            FakePopularityClient::healthy(),
        )
        .run_cycle(DEFAULT_BATCH_SIZE)
        .unwrap();

    assert_eq!(report.inserted, 1);
    assert_eq!(report.duplicates, 1);
    let song = catalog.store.get_song("Same Name").unwrap().unwrap();
    let first = catalog
        .store
        .find_artist_by_name("First Artist")
        .unwrap()
        .unwrap();
    assert_eq!(song.artist_id, first.id);
}

// =============================================================================
// Upstream failures
// =============================================================================

#[test]
fn test_enrichment_failure_stores_zero_play_count() {
    let catalog = TestCatalog::new();
    let popularity = FakePopularityClient::failing_for(&[FLAKY_ARTIST]);
    let report = catalog
        .coordinator(
            FakeCatalogClient::new(chart_with_artists(&[
                ("Steady", "Reliable Artist"),
                ("Wobbly", FLAKY_ARTIST),
                ("Also Steady", "Reliable Artist"),
            ])),
            popularity.clone(),
        )
        .run_cycle(DEFAULT_BATCH_SIZE)
        .unwrap();

    assert_eq!(report.inserted, 3);
    assert_eq!(report.enrichment_failures, 1);
    assert_eq!(popularity.call_count(), 3);
    assert_eq!(catalog.store.get_song("Wobbly").unwrap().unwrap().play_count, 0);
    assert_eq!(
        catalog.store.get_song("Steady").unwrap().unwrap().play_count,
        DEFAULT_PLAY_COUNT
    );
}

#[test]
fn test_missing_listening_data_stores_zero() {
    let catalog = TestCatalog::new();
    let report = catalog
        .coordinator(
            FakeCatalogClient::new(chart_with_artists(&[("Obscure", "Unknown Artist")])),
            FakePopularityClient::missing_for(&["Unknown Artist"]),
        )
        .run_cycle(DEFAULT_BATCH_SIZE)
        .unwrap();

    assert_eq!(report.enrichment_missing, 1);
    assert_eq!(catalog.store.get_song("Obscure").unwrap().unwrap().play_count, 0);
}

#[test]
fn test_catalog_outage_is_fatal_and_recoverable() {
    let catalog = TestCatalog::new();
    let upstream = FakeCatalogClient::new(chart(CHART_LENGTH));
    let popularity = FakePopularityClient::healthy();
    let coordinator = catalog.coordinator(upstream.clone(), popularity.clone());

    upstream.set_unavailable(true);
    let err = coordinator.run_cycle(DEFAULT_BATCH_SIZE).unwrap_err();
    assert!(matches!(err, IngestionError::UpstreamUnavailable(_)));
    assert_eq!(catalog.store.current_song_count().unwrap(), 0);
    assert_eq!(popularity.call_count(), 0);

    upstream.set_unavailable(false);
    let report = coordinator.run_cycle(DEFAULT_BATCH_SIZE).unwrap();
    assert_eq!(report.start, 0);
    assert_eq!(report.inserted, 25);
    assert_eq!(upstream.fetch_count(), 2);
}

#[test]
fn test_until_complete_propagates_outage() {
    let catalog = TestCatalog::new();
    let upstream = FakeCatalogClient::new(chart(CHART_LENGTH));
    upstream.set_unavailable(true);

    let result = catalog
        .coordinator(upstream, FakePopularityClient::healthy())
        .run_until_complete(DEFAULT_BATCH_SIZE, None, &AtomicBool::new(false));

    assert!(matches!(result, Err(IngestionError::UpstreamUnavailable(_))));
}

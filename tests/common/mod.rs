//! Common test infrastructure
//!
//! Fake upstream services and catalog fixtures shared by the end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{chart, FakeCatalogClient, FakePopularityClient, TestCatalog};
//!
//! #[test]
//! fn test_first_cycle() {
//!     let catalog = TestCatalog::new();
//!     let coordinator = catalog.coordinator(
//!         FakeCatalogClient::new(chart(30)),
//!         FakePopularityClient::healthy(),
//!     );
//!     coordinator.run_cycle(25).unwrap();
//! }
//! ```

mod constants;
mod fixtures;

pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::{
    chart, chart_with_artists, track, FakeCatalogClient, FakePopularityClient, TestCatalog,
};

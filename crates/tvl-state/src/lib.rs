//! tvl-state — embedded record store for hourly and daily TVL buckets.
//!
//! Backed by [redb](https://docs.rs/redb). Records are JSON-serialized into
//! `&[u8]` value columns under composite `(partition, timestamp)` keys, so
//! every partition (`hourlyTvl#<id>`, `dailyTvl#<id>`) is a contiguous,
//! timestamp-ordered range and "closest record" lookups are range scans.
//!
//! Ingestion code talks to the store through the [`TvlStore`] trait;
//! [`StateStore`] is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and is meant to be opened once per process and shared.

pub mod client;
pub mod error;
pub mod store;
pub mod tables;

pub use client::TvlStore;
pub use error::{StateError, StateResult};
pub use store::{StateStore, pick_closest};

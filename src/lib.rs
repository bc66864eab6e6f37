//! Event-aggregation core for the JuiceSwap indexer: idempotent ingestion
//! of decoded chain events into SQLite-backed windowed stats, campaign task
//! state, and launchpad token lifecycle, plus the sync gate that withholds
//! reads until the indexer has caught up.

pub mod config;
pub mod curve;
pub mod events;
pub mod ids;
pub mod ingest;
pub mod store;
pub mod sync_gate;
pub mod timeframe;

//! SQLite persistence for the aggregation core
//!
//! One writer connection behind a mutex; every event is applied in a single
//! short transaction so aggregates are never partially updated. All fact
//! tables key on deterministic ids (see `crate::ids`) and rely on conflict
//! clauses for at-least-once redelivery.
//!
//! Module organization:
//! - `db` - connection setup, pragmas, schema, `u256_add` SQL function
//! - `stats` - windowed token/pool counters (atomic insert-or-increment)
//! - `swaps` - write-once swap records
//! - `campaign` - task completions, per-wallet progress, incremental rollups
//! - `launchpad` - bonding-curve tokens, trades, graduated pools
//! - `sync` - per-chain indexing progress

pub mod campaign;
pub mod db;
pub mod launchpad;
pub mod stats;
pub mod swaps;
pub mod sync;

pub use db::Store;

#[derive(Debug)]
pub enum StoreError {
    Database(rusqlite::Error),
    Io(std::io::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "database error: {}", e),
            StoreError::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

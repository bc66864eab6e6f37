//! Connection setup and schema
//!
//! Amount columns hold U256 values as decimal TEXT; the registered
//! `u256_add` scalar function lets counter upserts increment them inside a
//! single `INSERT .. ON CONFLICT DO UPDATE` statement, with no
//! read-then-write pair in application code.

use super::StoreError;
use alloy_primitives::U256;
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS swap (
    id                   TEXT PRIMARY KEY,
    tx_hash              TEXT NOT NULL,
    chain_id             INTEGER NOT NULL,
    block_number         INTEGER NOT NULL,
    block_timestamp      INTEGER NOT NULL,
    from_address         TEXT NOT NULL,
    to_address           TEXT NOT NULL,
    token_in             TEXT NOT NULL,
    token_out            TEXT NOT NULL,
    amount_in            TEXT NOT NULL,
    amount_out           TEXT NOT NULL,
    router               TEXT NOT NULL,
    method_signature     TEXT NOT NULL,
    is_campaign_relevant INTEGER NOT NULL,
    campaign_task_id     INTEGER
);
CREATE INDEX IF NOT EXISTS idx_swap_chain_ts ON swap(chain_id, block_timestamp DESC);
CREATE INDEX IF NOT EXISTS idx_swap_to ON swap(to_address, block_timestamp DESC);

CREATE TABLE IF NOT EXISTS token_transfer (
    id              TEXT PRIMARY KEY,
    tx_hash         TEXT NOT NULL,
    chain_id        INTEGER NOT NULL,
    block_number    INTEGER NOT NULL,
    block_timestamp INTEGER NOT NULL,
    token_address   TEXT NOT NULL,
    from_address    TEXT NOT NULL,
    to_address      TEXT NOT NULL,
    amount          TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_transfer_token ON token_transfer(token_address, block_timestamp DESC);

CREATE TABLE IF NOT EXISTS token_stat (
    id           TEXT PRIMARY KEY,
    chain_id     INTEGER NOT NULL,
    address      TEXT NOT NULL,
    window       TEXT NOT NULL,
    bucket_start INTEGER NOT NULL,
    tx_count     INTEGER NOT NULL,
    volume       TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_token_stat_addr ON token_stat(address, window, bucket_start DESC);

CREATE TABLE IF NOT EXISTS pool_stat (
    id           TEXT PRIMARY KEY,
    chain_id     INTEGER NOT NULL,
    pool_address TEXT NOT NULL,
    window       TEXT NOT NULL,
    bucket_start INTEGER NOT NULL,
    tx_count     INTEGER NOT NULL,
    volume0      TEXT NOT NULL,
    volume1      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_pool_stat_addr ON pool_stat(pool_address, window, bucket_start DESC);

CREATE TABLE IF NOT EXISTS v2_pool_stat (
    id           TEXT PRIMARY KEY,
    chain_id     INTEGER NOT NULL,
    pool_address TEXT NOT NULL,
    window       TEXT NOT NULL,
    bucket_start INTEGER NOT NULL,
    tx_count     INTEGER NOT NULL,
    volume0      TEXT NOT NULL,
    volume1      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_v2_pool_stat_addr ON v2_pool_stat(pool_address, window, bucket_start DESC);

CREATE TABLE IF NOT EXISTS task_completion (
    id             TEXT PRIMARY KEY,
    wallet_address TEXT NOT NULL,
    chain_id       INTEGER NOT NULL,
    task_id        INTEGER NOT NULL,
    tx_hash        TEXT NOT NULL,
    completed_at   INTEGER NOT NULL,
    swap_amount    TEXT NOT NULL,
    input_token    TEXT NOT NULL,
    output_token   TEXT NOT NULL,
    block_number   INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_completion_wallet ON task_completion(chain_id, wallet_address);

CREATE TABLE IF NOT EXISTS campaign_progress (
    id             TEXT PRIMARY KEY,
    wallet_address TEXT NOT NULL,
    chain_id       INTEGER NOT NULL,
    created_at     INTEGER NOT NULL,
    updated_at     INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS campaign_stats (
    chain_id          INTEGER PRIMARY KEY,
    total_users       INTEGER NOT NULL,
    total_swaps       INTEGER NOT NULL,
    total_volume      TEXT NOT NULL,
    task1_completions INTEGER NOT NULL,
    task2_completions INTEGER NOT NULL,
    task3_completions INTEGER NOT NULL,
    last_updated      INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS launchpad_token (
    address           TEXT PRIMARY KEY,
    chain_id          INTEGER NOT NULL,
    name              TEXT NOT NULL,
    symbol            TEXT NOT NULL,
    creator           TEXT NOT NULL,
    base_asset        TEXT NOT NULL,
    created_at        INTEGER NOT NULL,
    created_at_block  INTEGER NOT NULL,
    tx_hash           TEXT NOT NULL,
    graduated         INTEGER NOT NULL DEFAULT 0,
    can_graduate      INTEGER NOT NULL DEFAULT 0,
    v2_pair           TEXT,
    graduated_at      INTEGER,
    total_buys        INTEGER NOT NULL DEFAULT 0,
    total_sells       INTEGER NOT NULL DEFAULT 0,
    total_volume_base TEXT NOT NULL DEFAULT '0',
    last_trade_at     INTEGER,
    progress          INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS launchpad_trade (
    id            TEXT PRIMARY KEY,
    token_address TEXT NOT NULL,
    chain_id      INTEGER NOT NULL,
    trader        TEXT NOT NULL,
    is_buy        INTEGER NOT NULL,
    base_amount   TEXT NOT NULL,
    token_amount  TEXT NOT NULL,
    timestamp     INTEGER NOT NULL,
    block_number  INTEGER NOT NULL,
    tx_hash       TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_trade_token ON launchpad_trade(token_address, timestamp DESC);

CREATE TABLE IF NOT EXISTS graduated_v2_pool (
    pair_address            TEXT PRIMARY KEY,
    chain_id                INTEGER NOT NULL,
    token0                  TEXT NOT NULL,
    token1                  TEXT NOT NULL,
    launchpad_token_address TEXT NOT NULL,
    created_at              INTEGER NOT NULL,
    created_at_block        INTEGER NOT NULL,
    tx_hash                 TEXT NOT NULL,
    total_swaps             INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS sync_progress (
    chain_id     INTEGER PRIMARY KEY,
    latest_block INTEGER NOT NULL,
    last_updated INTEGER NOT NULL
);
"#;

/// Handle to the indexer database. Cheap to clone; all clones share one
/// serialized writer connection.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (or create) the database at `db_path` and prepare it: WAL mode,
    /// schema, and the `u256_add` function.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        Self::prepare(&conn)?;

        log::info!("✅ SQLite database initialized with WAL mode");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::prepare(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn prepare(conn: &Connection) -> Result<(), StoreError> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        register_u256_add(conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Run `f` inside one transaction. Used by the ingestion path so that
    /// every window update and counter bump for an event commits atomically,
    /// or not at all.
    pub fn with_tx<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, StoreError>,
    {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    /// Read access outside a transaction (gate queries, tests).
    pub fn read<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self.conn.lock().unwrap();
        f(&conn)
    }

    #[cfg(test)]
    pub(crate) fn raw(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }
}

fn register_u256_add(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "u256_add",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let a: String = ctx.get(0)?;
            let b: String = ctx.get(1)?;
            let a = parse_u256_fn(&a)?;
            let b = parse_u256_fn(&b)?;
            Ok(a.saturating_add(b).to_string())
        },
    )
}

fn parse_u256_fn(s: &str) -> rusqlite::Result<U256> {
    U256::from_str_radix(s, 10).map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))
}

/// Parse a decimal TEXT column back into a U256.
pub(crate) fn column_u256(s: &str) -> rusqlite::Result<U256> {
    U256::from_str_radix(s, 10).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

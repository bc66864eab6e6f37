//! Windowed token/pool counters
//!
//! Every bump is a single atomic `INSERT .. ON CONFLICT DO UPDATE`: the row
//! is created at the event's contribution or incremented in place, so
//! concurrent streams mutating the same (entity, window, bucket) serialize
//! at the storage layer without lost updates. Callers apply all three
//! windows for one event inside one transaction.

use super::db::column_u256;
use super::StoreError;
use crate::ids::stat_id;
use crate::timeframe::{bucket_start, Window};
use alloy_primitives::{Address, U256};
use rusqlite::{params, Connection, OptionalExtension};

/// Which pool-stat table a bump targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKind {
    V3,
    V2,
}

impl PoolKind {
    fn table(&self) -> &'static str {
        match self {
            PoolKind::V3 => "pool_stat",
            PoolKind::V2 => "v2_pool_stat",
        }
    }
}

/// Snapshot of one stat row, for reads and assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatRow {
    pub tx_count: i64,
    pub volume0: U256,
    pub volume1: U256,
}

/// Increment the token stat for all windows: tx_count += 1, volume += amount.
///
/// Must not be called twice for the same logical event; the ingestion
/// handler guards this with the swap-record insert.
pub fn bump_token_stat(
    conn: &Connection,
    chain_id: u64,
    token: &Address,
    timestamp: i64,
    amount: U256,
) -> Result<(), StoreError> {
    for window in Window::all() {
        conn.execute(
            "INSERT INTO token_stat (id, chain_id, address, window, bucket_start, tx_count, volume)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
             ON CONFLICT(id) DO UPDATE SET
                 tx_count = tx_count + 1,
                 volume = u256_add(volume, excluded.volume)",
            params![
                stat_id(token, window, timestamp),
                chain_id,
                token.to_checksum(None),
                window.as_str(),
                bucket_start(window, timestamp),
                amount.to_string(),
            ],
        )?;
    }
    Ok(())
}

/// Increment a pool stat for all windows with per-leg volumes.
pub fn bump_pool_stat(
    conn: &Connection,
    kind: PoolKind,
    chain_id: u64,
    pool: &Address,
    timestamp: i64,
    volume0: U256,
    volume1: U256,
) -> Result<(), StoreError> {
    let sql = format!(
        "INSERT INTO {} (id, chain_id, pool_address, window, bucket_start, tx_count, volume0, volume1)
         VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
             tx_count = tx_count + 1,
             volume0 = u256_add(volume0, excluded.volume0),
             volume1 = u256_add(volume1, excluded.volume1)",
        kind.table()
    );
    for window in Window::all() {
        conn.execute(
            &sql,
            params![
                stat_id(pool, window, timestamp),
                chain_id,
                pool.to_checksum(None),
                window.as_str(),
                bucket_start(window, timestamp),
                volume0.to_string(),
                volume1.to_string(),
            ],
        )?;
    }
    Ok(())
}

/// Read back one token stat bucket. `volume1` is always zero for tokens.
pub fn get_token_stat(
    conn: &Connection,
    token: &Address,
    window: Window,
    timestamp: i64,
) -> Result<Option<StatRow>, StoreError> {
    let row = conn
        .query_row(
            "SELECT tx_count, volume FROM token_stat WHERE id = ?1",
            [stat_id(token, window, timestamp)],
            |row| {
                let volume: String = row.get(1)?;
                Ok(StatRow {
                    tx_count: row.get(0)?,
                    volume0: column_u256(&volume)?,
                    volume1: U256::ZERO,
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// Read back one pool stat bucket.
pub fn get_pool_stat(
    conn: &Connection,
    kind: PoolKind,
    pool: &Address,
    window: Window,
    timestamp: i64,
) -> Result<Option<StatRow>, StoreError> {
    let sql = format!(
        "SELECT tx_count, volume0, volume1 FROM {} WHERE id = ?1",
        kind.table()
    );
    let row = conn
        .query_row(&sql, [stat_id(pool, window, timestamp)], |row| {
            let v0: String = row.get(1)?;
            let v1: String = row.get(2)?;
            Ok(StatRow {
                tx_count: row.get(0)?,
                volume0: column_u256(&v0)?,
                volume1: column_u256(&v1)?,
            })
        })
        .optional()?;
    Ok(row)
}

//! Per-chain indexing progress

use super::StoreError;
use rusqlite::{params, Connection, OptionalExtension};

/// Record that `block` has been processed. The stored height is monotone:
/// backfill batches replaying old blocks never move it backward.
pub fn record_progress(
    conn: &Connection,
    chain_id: u64,
    block: u64,
    now: i64,
) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO sync_progress (chain_id, latest_block, last_updated)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(chain_id) DO UPDATE SET
             latest_block = MAX(latest_block, excluded.latest_block),
             last_updated = excluded.last_updated",
        params![chain_id, block, now],
    )?;
    Ok(())
}

pub fn latest_indexed_block(conn: &Connection, chain_id: u64) -> Result<Option<u64>, StoreError> {
    let row = conn
        .query_row(
            "SELECT latest_block FROM sync_progress WHERE chain_id = ?1",
            [chain_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(row)
}

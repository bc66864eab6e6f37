//! Campaign persistence: completions, per-wallet progress, rollup stats
//!
//! The rollup row is never rebuilt by scanning completions; callers hand in
//! the delta earned by one event and it is applied with a single atomic
//! upsert, keyed to the same inserts that produced the delta.

use super::db::column_u256;
use super::StoreError;
use crate::ids::{completion_id, progress_id};
use alloy_primitives::{Address, B256, U256};
use rusqlite::{params, Connection, OptionalExtension};

/// Immutable record of a wallet's first qualifying swap for a task.
#[derive(Debug, Clone)]
pub struct TaskCompletion {
    pub chain_id: u64,
    pub wallet: Address,
    pub task_id: u8,
    pub tx_hash: B256,
    pub completed_at: i64,
    pub swap_amount: U256,
    pub input_token: Address,
    pub output_token: Address,
    pub block_number: u64,
}

/// Increment set for one event, applied to `campaign_stats` in one statement.
#[derive(Debug, Clone, Default)]
pub struct StatsDelta {
    pub users: u64,
    pub swaps: u64,
    pub volume: U256,
    pub task_completions: [u64; 3],
}

impl StatsDelta {
    pub fn is_empty(&self) -> bool {
        self.users == 0
            && self.swaps == 0
            && self.volume.is_zero()
            && self.task_completions.iter().all(|c| *c == 0)
    }

    pub fn record_completion(&mut self, task_id: u8) {
        if (1..=3).contains(&task_id) {
            self.task_completions[(task_id - 1) as usize] += 1;
        }
    }
}

/// Rollup snapshot, one row per chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignStats {
    pub chain_id: u64,
    pub total_users: i64,
    pub total_swaps: i64,
    pub total_volume: U256,
    pub task_completions: [i64; 3],
    pub last_updated: i64,
}

/// Ensure the wallet's progress row exists; bump `updated_at` on every
/// qualifying swap. Returns `true` when the row was newly created, i.e.
/// this is the wallet's first-ever campaign activity.
pub fn upsert_progress(
    conn: &Connection,
    chain_id: u64,
    wallet: &Address,
    timestamp: i64,
) -> Result<bool, StoreError> {
    let id = progress_id(chain_id, wallet);
    let created = conn.execute(
        "INSERT INTO campaign_progress (id, wallet_address, chain_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)
         ON CONFLICT(id) DO NOTHING",
        params![id, wallet.to_checksum(None), chain_id, timestamp],
    )?;
    if created == 0 {
        conn.execute(
            "UPDATE campaign_progress SET updated_at = ?2 WHERE id = ?1",
            params![id, timestamp],
        )?;
    }
    Ok(created > 0)
}

/// Record a task completion. First writer wins: a second qualifying swap for
/// the same (chain, wallet, task) is a no-op and the original row is never
/// refreshed. Returns `true` when the completion is new.
pub fn insert_completion(conn: &Connection, completion: &TaskCompletion) -> Result<bool, StoreError> {
    let changed = conn.execute(
        "INSERT INTO task_completion (id, wallet_address, chain_id, task_id, tx_hash,
                                      completed_at, swap_amount, input_token, output_token,
                                      block_number)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(id) DO NOTHING",
        params![
            completion_id(completion.chain_id, &completion.wallet, completion.task_id),
            completion.wallet.to_checksum(None),
            completion.chain_id,
            completion.task_id,
            format!("{:#x}", completion.tx_hash),
            completion.completed_at,
            completion.swap_amount.to_string(),
            completion.input_token.to_checksum(None),
            completion.output_token.to_checksum(None),
            completion.block_number,
        ],
    )?;
    Ok(changed > 0)
}

/// Apply a delta to the per-chain rollup row (create-at-zero then add).
pub fn bump_stats(
    conn: &Connection,
    chain_id: u64,
    delta: &StatsDelta,
    now: i64,
) -> Result<(), StoreError> {
    if delta.is_empty() {
        return Ok(());
    }
    conn.execute(
        "INSERT INTO campaign_stats (chain_id, total_users, total_swaps, total_volume,
                                     task1_completions, task2_completions, task3_completions,
                                     last_updated)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(chain_id) DO UPDATE SET
             total_users = total_users + excluded.total_users,
             total_swaps = total_swaps + excluded.total_swaps,
             total_volume = u256_add(total_volume, excluded.total_volume),
             task1_completions = task1_completions + excluded.task1_completions,
             task2_completions = task2_completions + excluded.task2_completions,
             task3_completions = task3_completions + excluded.task3_completions,
             last_updated = excluded.last_updated",
        params![
            chain_id,
            delta.users,
            delta.swaps,
            delta.volume.to_string(),
            delta.task_completions[0],
            delta.task_completions[1],
            delta.task_completions[2],
            now,
        ],
    )?;
    Ok(())
}

/// Look up a completion by its natural key.
pub fn get_completion(
    conn: &Connection,
    chain_id: u64,
    wallet: &Address,
    task_id: u8,
) -> Result<Option<(String, u64)>, StoreError> {
    let row = conn
        .query_row(
            "SELECT tx_hash, block_number FROM task_completion WHERE id = ?1",
            [completion_id(chain_id, wallet, task_id)],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    Ok(row)
}

pub fn get_stats(conn: &Connection, chain_id: u64) -> Result<Option<CampaignStats>, StoreError> {
    let row = conn
        .query_row(
            "SELECT total_users, total_swaps, total_volume,
                    task1_completions, task2_completions, task3_completions, last_updated
             FROM campaign_stats WHERE chain_id = ?1",
            [chain_id],
            |row| {
                let volume: String = row.get(2)?;
                Ok(CampaignStats {
                    chain_id,
                    total_users: row.get(0)?,
                    total_swaps: row.get(1)?,
                    total_volume: column_u256(&volume)?,
                    task_completions: [row.get(3)?, row.get(4)?, row.get(5)?],
                    last_updated: row.get(6)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

pub fn get_progress(
    conn: &Connection,
    chain_id: u64,
    wallet: &Address,
) -> Result<Option<(i64, i64)>, StoreError> {
    let row = conn
        .query_row(
            "SELECT created_at, updated_at FROM campaign_progress WHERE id = ?1",
            [progress_id(chain_id, wallet)],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    Ok(row)
}

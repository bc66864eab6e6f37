//! Deterministic record identifiers
//!
//! Every table written by the ingestion path is keyed by an id derived from
//! event coordinates (or a semantic composite for derived rows). Redelivered
//! events produce the same id, so inserts can rely on conflict clauses
//! instead of in-memory dedup sets.

use crate::timeframe::{bucket_start, Window};
use alloy_primitives::{Address, B256};

/// Id for a raw on-chain log: `{txHash}-{logIndex}`.
pub fn event_id(tx_hash: &B256, log_index: u64) -> String {
    format!("{tx_hash}-{log_index}")
}

/// Id for a task completion: `{chainId}:{wallet}:{taskId}` (wallet lowercased).
pub fn completion_id(chain_id: u64, wallet: &Address, task_id: u8) -> String {
    format!("{chain_id}:{wallet:#x}:{task_id}")
}

/// Id for a per-wallet campaign progress row: `{chainId}:{wallet}` (lowercased).
pub fn progress_id(chain_id: u64, wallet: &Address) -> String {
    format!("{chain_id}:{wallet:#x}")
}

/// Id for a windowed stat row.
///
/// "1h" and "24h" buckets append the bucket start; "all-time" is keyed by the
/// checksummed address alone (one bucket per entity, never closes).
pub fn stat_id(address: &Address, window: Window, timestamp: i64) -> String {
    match window {
        Window::AllTime => address.to_checksum(None),
        _ => format!(
            "{}-{}-{}",
            address.to_checksum(None),
            window.as_str(),
            bucket_start(window, timestamp)
        ),
    }
}

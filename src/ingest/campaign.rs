//! Campaign task state machine
//!
//! Each monitored pool maps to one task. A wallet's state per task is
//! `NotStarted -> Completed` and nothing else: the first qualifying swap
//! writes the completion, every later one is ignored.

use crate::events::EventContext;
use crate::store::campaign::{self, StatsDelta, TaskCompletion};
use crate::store::StoreError;
use alloy_primitives::{address, Address, U256};
use rusqlite::Connection;
use std::collections::HashMap;

/// Pool-to-task mapping for one chain's campaign.
#[derive(Debug, Clone)]
pub struct CampaignConfig {
    chain_id: u64,
    pools: HashMap<Address, CampaignPool>,
}

#[derive(Debug, Clone)]
pub struct CampaignPool {
    pub task_id: u8,
    pub symbol: &'static str,
}

impl CampaignConfig {
    pub fn new(chain_id: u64, pools: impl IntoIterator<Item = (Address, CampaignPool)>) -> Self {
        Self {
            chain_id,
            pools: pools.into_iter().collect(),
        }
    }

    /// Citrea testnet bApps campaign: three UniswapV3 pools, one per task.
    pub fn citrea_testnet() -> Self {
        Self::new(
            5115,
            [
                (
                    address!("6006797369E2A595D31Df4ab3691044038AAa7FE"),
                    CampaignPool { task_id: 1, symbol: "CBTC/NUSD" },
                ),
                (
                    address!("A69De906B9A830Deb64edB97B2eb0848139306d2"),
                    CampaignPool { task_id: 2, symbol: "CBTC/cUSD" },
                ),
                (
                    address!("D8C7604176475eB8D350bC1EE452dA4442637C09"),
                    CampaignPool { task_id: 3, symbol: "CBTC/USDC" },
                ),
            ],
        )
    }

    /// No monitored pools; campaign handling becomes a no-op.
    pub fn disabled(chain_id: u64) -> Self {
        Self::new(chain_id, [])
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn task_for_pool(&self, chain_id: u64, pool: &Address) -> Option<&CampaignPool> {
        if chain_id != self.chain_id {
            return None;
        }
        self.pools.get(pool)
    }
}

/// Fold one newly-recorded qualifying swap into the campaign tables.
///
/// The caller has already deduplicated the event via the swap-record insert,
/// so every invocation is a distinct on-chain swap. Volume and swap counts
/// accrue for each such swap; `total_users` and the per-task counters move
/// only when the progress/completion inserts actually create rows.
pub(crate) fn try_complete(
    conn: &Connection,
    ctx: &EventContext,
    wallet: &Address,
    task_id: u8,
    amount: U256,
    input_token: &Address,
    output_token: &Address,
) -> Result<(), StoreError> {
    let mut delta = StatsDelta {
        swaps: 1,
        volume: amount,
        ..Default::default()
    };

    if campaign::upsert_progress(conn, ctx.chain_id, wallet, ctx.block_timestamp)? {
        delta.users = 1;
    }

    let completion = TaskCompletion {
        chain_id: ctx.chain_id,
        wallet: *wallet,
        task_id,
        tx_hash: ctx.tx_hash,
        completed_at: ctx.block_timestamp,
        swap_amount: amount,
        input_token: *input_token,
        output_token: *output_token,
        block_number: ctx.block_number,
    };
    if campaign::insert_completion(conn, &completion)? {
        delta.record_completion(task_id);
        log::info!(
            "✅ Task {} completed by {} (tx {:#x})",
            task_id,
            wallet.to_checksum(None),
            ctx.tx_hash
        );
    }

    campaign::bump_stats(conn, ctx.chain_id, &delta, ctx.block_timestamp)
}

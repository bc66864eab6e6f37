//! Swap and transfer ingestion
//!
//! Pool swaps arrive with UniswapV3-style signed deltas: a positive amount
//! is a token entering the pool (the trader's input), a negative one a token
//! leaving it. The swap-record insert is the idempotency guard for every
//! downstream aggregate; a redelivered event stops there.

use super::campaign::{self, CampaignConfig};
use crate::events::EventContext;
use crate::ids::event_id;
use crate::store::stats::{bump_pool_stat, bump_token_stat, PoolKind};
use crate::store::swaps::{insert_swap, insert_transfer, SwapRecord, TransferRecord};
use crate::store::StoreError;
use alloy_primitives::{Address, I256, U256};
use rusqlite::Connection;

#[allow(clippy::too_many_arguments)]
pub(crate) fn handle_pool_swap(
    conn: &Connection,
    config: &CampaignConfig,
    ctx: &EventContext,
    pool: &Address,
    sender: &Address,
    recipient: &Address,
    amount0: I256,
    amount1: I256,
    token0: Option<Address>,
    token1: Option<Address>,
    router: Option<Address>,
    method_signature: &str,
) -> Result<(), StoreError> {
    let (token_in, amount_in, token_out, amount_out) = if amount0.is_negative() {
        (token1, amount1.unsigned_abs(), token0, amount0.unsigned_abs())
    } else {
        (token0, amount0.unsigned_abs(), token1, amount1.unsigned_abs())
    };

    let campaign_pool = config.task_for_pool(ctx.chain_id, pool);
    let record = SwapRecord {
        id: event_id(&ctx.tx_hash, ctx.log_index),
        tx_hash: ctx.tx_hash,
        chain_id: ctx.chain_id,
        block_number: ctx.block_number,
        block_timestamp: ctx.block_timestamp,
        from: *sender,
        to: *recipient,
        // Pool address stands in when constituents are unknown
        token_in: token_in.unwrap_or(*pool),
        token_out: token_out.unwrap_or(*pool),
        amount_in,
        amount_out,
        router: router.unwrap_or(Address::ZERO),
        method_signature: method_signature.to_string(),
        is_campaign_relevant: campaign_pool.is_some(),
        campaign_task_id: campaign_pool.map(|p| p.task_id),
    };
    if !insert_swap(conn, &record)? {
        log::debug!("Swap {} already recorded, skipping", record.id);
        return Ok(());
    }

    bump_pool_stat(
        conn,
        PoolKind::V3,
        ctx.chain_id,
        pool,
        ctx.block_timestamp,
        amount0.unsigned_abs(),
        amount1.unsigned_abs(),
    )?;
    if let Some(token) = token_in {
        bump_token_stat(conn, ctx.chain_id, &token, ctx.block_timestamp, amount_in)?;
    }
    if let Some(token) = token_out {
        bump_token_stat(conn, ctx.chain_id, &token, ctx.block_timestamp, amount_out)?;
    }

    if let Some(pool_info) = campaign_pool {
        campaign::try_complete(
            conn,
            ctx,
            recipient,
            pool_info.task_id,
            amount_out,
            &record.token_in,
            &record.token_out,
        )?;
    }
    Ok(())
}

/// Transfers feed the per-token activity counters, gated on their own
/// write-once fact row so a redelivered transfer cannot double-count.
pub(crate) fn handle_transfer(
    conn: &Connection,
    ctx: &EventContext,
    token: &Address,
    from: &Address,
    to: &Address,
    amount: U256,
) -> Result<(), StoreError> {
    let record = TransferRecord {
        id: event_id(&ctx.tx_hash, ctx.log_index),
        tx_hash: ctx.tx_hash,
        chain_id: ctx.chain_id,
        block_number: ctx.block_number,
        block_timestamp: ctx.block_timestamp,
        token: *token,
        from: *from,
        to: *to,
        amount,
    };
    if !insert_transfer(conn, &record)? {
        log::debug!("Transfer {} already recorded, skipping", record.id);
        return Ok(());
    }
    bump_token_stat(conn, ctx.chain_id, token, ctx.block_timestamp, amount)
}

//! Launchpad lifecycle ingestion: curve trades, graduation, V2 activity
//!
//! Curve progress is recomputed from the virtual-reserve figure each trade
//! event carries, never from a locally-tracked balance, so a missed event
//! self-corrects on the next one.

use crate::curve::progress_bps;
use crate::events::EventContext;
use crate::ids::event_id;
use crate::store::launchpad::{
    self, GraduatedPool, LaunchpadToken, LaunchpadTrade,
};
use crate::store::stats::{bump_pool_stat, PoolKind};
use crate::store::swaps::{insert_swap, SwapRecord};
use crate::store::StoreError;
use alloy_primitives::{Address, U256};
use rusqlite::Connection;

pub(crate) fn handle_token_created(
    conn: &Connection,
    ctx: &EventContext,
    token: &Address,
    name: &str,
    symbol: &str,
    creator: &Address,
    base_asset: &Address,
) -> Result<(), StoreError> {
    let created = launchpad::insert_token(
        conn,
        &LaunchpadToken {
            address: *token,
            chain_id: ctx.chain_id,
            name: name.to_string(),
            symbol: symbol.to_string(),
            creator: *creator,
            base_asset: *base_asset,
            created_at: ctx.block_timestamp,
            created_at_block: ctx.block_number,
            tx_hash: ctx.tx_hash,
        },
    )?;
    if created {
        log::info!("🚀 New curve token {} ({})", symbol, token.to_checksum(None));
    }
    Ok(())
}

/// Shared path for CurveBuy and CurveSell.
#[allow(clippy::too_many_arguments)]
pub(crate) fn handle_curve_trade(
    conn: &Connection,
    ctx: &EventContext,
    token: &Address,
    trader: &Address,
    is_buy: bool,
    base_amount: U256,
    token_amount: U256,
    virtual_token_reserves: U256,
) -> Result<(), StoreError> {
    let trade = LaunchpadTrade {
        id: event_id(&ctx.tx_hash, ctx.log_index),
        token: *token,
        chain_id: ctx.chain_id,
        trader: *trader,
        is_buy,
        base_amount,
        token_amount,
        timestamp: ctx.block_timestamp,
        block_number: ctx.block_number,
        tx_hash: ctx.tx_hash,
    };
    if !launchpad::insert_trade(conn, &trade)? {
        log::debug!("Curve trade {} already recorded, skipping", trade.id);
        return Ok(());
    }
    launchpad::apply_trade(
        conn,
        token,
        is_buy,
        base_amount,
        ctx.block_timestamp,
        progress_bps(virtual_token_reserves),
    )
}

pub(crate) fn handle_ready_for_graduation(
    conn: &Connection,
    token: &Address,
) -> Result<(), StoreError> {
    launchpad::mark_can_graduate(conn, token)
}

pub(crate) fn handle_graduated(
    conn: &Connection,
    ctx: &EventContext,
    token: &Address,
    pair: &Address,
) -> Result<(), StoreError> {
    if launchpad::mark_graduated(conn, token, pair, ctx.block_timestamp)? {
        log::info!(
            "🎓 Token {} graduated to pair {}",
            token.to_checksum(None),
            pair.to_checksum(None)
        );
    }
    Ok(())
}

pub(crate) fn handle_pair_created(
    conn: &Connection,
    ctx: &EventContext,
    pair: &Address,
    token0: &Address,
    token1: &Address,
    launchpad_token: &Address,
) -> Result<(), StoreError> {
    launchpad::insert_graduated_pool(
        conn,
        &GraduatedPool {
            pair: *pair,
            chain_id: ctx.chain_id,
            token0: *token0,
            token1: *token1,
            launchpad_token: *launchpad_token,
            created_at: ctx.block_timestamp,
            created_at_block: ctx.block_number,
            tx_hash: ctx.tx_hash,
        },
    )?;
    Ok(())
}

/// Swap on a graduated V2 pair. Recorded as a swap row first (the
/// idempotency guard), then folded into the V2 pool stats and the pair's
/// lifetime swap counter.
pub(crate) fn handle_v2_swap(
    conn: &Connection,
    ctx: &EventContext,
    pair: &Address,
    amount0_in: U256,
    amount1_in: U256,
    amount0_out: U256,
    amount1_out: U256,
) -> Result<(), StoreError> {
    let tokens = launchpad::get_pool_tokens(conn, pair)?;
    let (token_in, token_out) = match tokens {
        Some((token0, token1)) => {
            if amount0_in > amount1_in {
                (token0, token1)
            } else {
                (token1, token0)
            }
        }
        None => (*pair, *pair),
    };

    let record = SwapRecord {
        id: event_id(&ctx.tx_hash, ctx.log_index),
        tx_hash: ctx.tx_hash,
        chain_id: ctx.chain_id,
        block_number: ctx.block_number,
        block_timestamp: ctx.block_timestamp,
        from: *pair,
        to: *pair,
        token_in,
        token_out,
        amount_in: amount0_in.saturating_add(amount1_in),
        amount_out: amount0_out.saturating_add(amount1_out),
        router: Address::ZERO,
        method_signature: "v2:swap".to_string(),
        is_campaign_relevant: false,
        campaign_task_id: None,
    };
    if !insert_swap(conn, &record)? {
        log::debug!("V2 swap {} already recorded, skipping", record.id);
        return Ok(());
    }

    bump_pool_stat(
        conn,
        PoolKind::V2,
        ctx.chain_id,
        pair,
        ctx.block_timestamp,
        amount0_in.saturating_add(amount0_out),
        amount1_in.saturating_add(amount1_out),
    )?;
    launchpad::bump_pool_swaps(conn, pair)
}

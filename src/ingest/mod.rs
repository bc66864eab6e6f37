//! Event ingestion
//!
//! One validated event at a time is applied to the store in a single
//! transaction: fact row, window counters, campaign state, and sync
//! progress commit together or not at all.

pub mod backoff;
pub mod campaign;
pub mod launchpad;
pub mod runner;
pub mod swap;

pub use campaign::CampaignConfig;
pub use runner::run_ingestion;

use crate::events::{ChainEvent, EventKind};
use crate::store::{sync, Store, StoreError};

pub struct Indexer {
    store: Store,
    campaign: CampaignConfig,
}

impl Indexer {
    pub fn new(store: Store, campaign: CampaignConfig) -> Self {
        Self { store, campaign }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Apply one event atomically. Safe to call again with the same event:
    /// every handler is guarded by its fact-row insert.
    pub fn apply(&self, event: &ChainEvent) -> Result<(), StoreError> {
        let ctx = &event.ctx;
        self.store.with_tx(|tx| {
            match &event.kind {
                EventKind::PoolSwap {
                    pool,
                    sender,
                    recipient,
                    amount0,
                    amount1,
                    token0,
                    token1,
                    router,
                    method_signature,
                } => swap::handle_pool_swap(
                    tx,
                    &self.campaign,
                    ctx,
                    pool,
                    sender,
                    recipient,
                    *amount0,
                    *amount1,
                    *token0,
                    *token1,
                    *router,
                    method_signature,
                )?,
                EventKind::TokenTransfer {
                    token,
                    from,
                    to,
                    amount,
                } => swap::handle_transfer(tx, ctx, token, from, to, *amount)?,
                EventKind::TokenCreated {
                    token,
                    name,
                    symbol,
                    creator,
                    base_asset,
                } => launchpad::handle_token_created(
                    tx, ctx, token, name, symbol, creator, base_asset,
                )?,
                EventKind::CurveBuy {
                    token,
                    trader,
                    base_in,
                    tokens_out,
                    virtual_token_reserves,
                } => launchpad::handle_curve_trade(
                    tx,
                    ctx,
                    token,
                    trader,
                    true,
                    *base_in,
                    *tokens_out,
                    *virtual_token_reserves,
                )?,
                EventKind::CurveSell {
                    token,
                    trader,
                    base_out,
                    tokens_in,
                    virtual_token_reserves,
                } => launchpad::handle_curve_trade(
                    tx,
                    ctx,
                    token,
                    trader,
                    false,
                    *base_out,
                    *tokens_in,
                    *virtual_token_reserves,
                )?,
                EventKind::ReadyForGraduation { token } => {
                    launchpad::handle_ready_for_graduation(tx, token)?
                }
                EventKind::Graduated { token, pair } => {
                    launchpad::handle_graduated(tx, ctx, token, pair)?
                }
                EventKind::PairCreated {
                    pair,
                    token0,
                    token1,
                    launchpad_token,
                } => launchpad::handle_pair_created(tx, ctx, pair, token0, token1, launchpad_token)?,
                EventKind::V2Swap {
                    pair,
                    amount0_in,
                    amount1_in,
                    amount0_out,
                    amount1_out,
                } => launchpad::handle_v2_swap(
                    tx,
                    ctx,
                    pair,
                    *amount0_in,
                    *amount1_in,
                    *amount0_out,
                    *amount1_out,
                )?,
                EventKind::BlockTick => {}
            }

            sync::record_progress(
                tx,
                ctx.chain_id,
                ctx.block_number,
                chrono::Utc::now().timestamp(),
            )
        })
    }
}

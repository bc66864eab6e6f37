//! Inbound chain event model
//!
//! Events arrive from the delivery layer already decoded, as a closed set of
//! tagged variants. The raw envelope (`RawEvent`) tolerates missing block or
//! transaction context; promotion to `ChainEvent` validates once at the
//! boundary so handlers never touch optional fields.

use alloy_primitives::{Address, B256, I256, U256};
use serde::{Deserialize, Serialize};

/// Block/transaction coordinates every validated event carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventContext {
    pub chain_id: u64,
    pub block_number: u64,
    pub block_timestamp: i64,
    pub tx_hash: B256,
    pub log_index: u64,
}

/// Decoded payload for one monitored contract event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// UniswapV3-style pool swap with signed deltas: negative = token leaving
    /// the pool, positive = token entering.
    PoolSwap {
        pool: Address,
        sender: Address,
        recipient: Address,
        amount0: I256,
        amount1: I256,
        /// Pool constituents, when the delivery layer knows the pool.
        token0: Option<Address>,
        token1: Option<Address>,
        router: Option<Address>,
        method_signature: String,
    },
    TokenTransfer {
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    },
    TokenCreated {
        token: Address,
        name: String,
        symbol: String,
        creator: Address,
        base_asset: Address,
    },
    CurveBuy {
        token: Address,
        trader: Address,
        base_in: U256,
        tokens_out: U256,
        virtual_token_reserves: U256,
    },
    CurveSell {
        token: Address,
        trader: Address,
        base_out: U256,
        tokens_in: U256,
        virtual_token_reserves: U256,
    },
    ReadyForGraduation {
        token: Address,
    },
    Graduated {
        token: Address,
        pair: Address,
    },
    PairCreated {
        pair: Address,
        token0: Address,
        token1: Address,
        launchpad_token: Address,
    },
    /// Swap on a graduated V2 pair (unsigned in/out amounts).
    V2Swap {
        pair: Address,
        amount0_in: U256,
        amount1_in: U256,
        amount0_out: U256,
        amount1_out: U256,
    },
    /// Bare block notification; drives sync progress only.
    BlockTick,
}

/// Validated event, ready for the ingestion handlers.
#[derive(Debug, Clone)]
pub struct ChainEvent {
    pub ctx: EventContext,
    pub kind: EventKind,
}

/// Undecoded envelope as handed over by the delivery layer. Block and
/// transaction context may be absent on malformed payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    pub chain_id: u64,
    pub block_number: Option<u64>,
    pub block_timestamp: Option<i64>,
    pub tx_hash: Option<B256>,
    pub log_index: Option<u64>,
    pub kind: EventKind,
}

#[derive(Debug)]
pub enum EventError {
    MissingField(&'static str),
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventError::MissingField(field) => {
                write!(f, "event is missing required field: {}", field)
            }
        }
    }
}

impl std::error::Error for EventError {}

impl TryFrom<RawEvent> for ChainEvent {
    type Error = EventError;

    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        let block_number = raw
            .block_number
            .ok_or(EventError::MissingField("block_number"))?;
        let block_timestamp = raw
            .block_timestamp
            .ok_or(EventError::MissingField("block_timestamp"))?;

        // Block ticks carry no transaction context
        let (tx_hash, log_index) = if matches!(raw.kind, EventKind::BlockTick) {
            (
                raw.tx_hash.unwrap_or(B256::ZERO),
                raw.log_index.unwrap_or(0),
            )
        } else {
            (
                raw.tx_hash.ok_or(EventError::MissingField("tx_hash"))?,
                raw.log_index.ok_or(EventError::MissingField("log_index"))?,
            )
        };

        Ok(ChainEvent {
            ctx: EventContext {
                chain_id: raw.chain_id,
                block_number,
                block_timestamp,
                tx_hash,
                log_index,
            },
            kind: raw.kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn raw_transfer() -> RawEvent {
        RawEvent {
            chain_id: 5115,
            block_number: Some(100),
            block_timestamp: Some(1700000000),
            tx_hash: Some(B256::repeat_byte(0xab)),
            log_index: Some(2),
            kind: EventKind::TokenTransfer {
                token: address!("4370e27f7d91d9341bff232d7ee8bdfe3a9933a0"),
                from: Address::ZERO,
                to: address!("9b28b690550522608890c3c7e63c0b4a7ebab9aa"),
                amount: U256::from(1000u64),
            },
        }
    }

    #[test]
    fn test_valid_event_promotes() {
        let event = ChainEvent::try_from(raw_transfer()).unwrap();
        assert_eq!(event.ctx.block_number, 100);
        assert_eq!(event.ctx.log_index, 2);
    }

    #[test]
    fn test_missing_transaction_context_rejected() {
        let mut raw = raw_transfer();
        raw.tx_hash = None;
        let err = ChainEvent::try_from(raw).unwrap_err();
        assert!(err.to_string().contains("tx_hash"));
    }

    #[test]
    fn test_missing_block_context_rejected() {
        let mut raw = raw_transfer();
        raw.block_number = None;
        assert!(ChainEvent::try_from(raw).is_err());
    }

    #[test]
    fn test_block_tick_needs_no_transaction() {
        let raw = RawEvent {
            chain_id: 5115,
            block_number: Some(500),
            block_timestamp: Some(1700000000),
            tx_hash: None,
            log_index: None,
            kind: EventKind::BlockTick,
        };
        let event = ChainEvent::try_from(raw).unwrap();
        assert_eq!(event.ctx.tx_hash, B256::ZERO);
    }

    #[test]
    fn test_event_json_round_trip() {
        let raw = raw_transfer();
        let json = serde_json::to_string(&raw).unwrap();
        let back: RawEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.block_number, raw.block_number);
        assert!(matches!(back.kind, EventKind::TokenTransfer { .. }));
    }
}

//! End-to-end ingestion tests against a real database file

use alloy_primitives::{address, Address, B256, I256, U256};
use juiceflow::curve::{e18, initial_virtual_token_reserves};
use juiceflow::events::{ChainEvent, EventContext, EventKind};
use juiceflow::ids::event_id;
use juiceflow::ingest::{CampaignConfig, Indexer};
use juiceflow::store::campaign::{get_completion, get_stats};
use juiceflow::store::launchpad::get_token;
use juiceflow::store::stats::{get_pool_stat, get_token_stat, PoolKind};
use juiceflow::store::swaps::get_swap;
use juiceflow::store::sync::latest_indexed_block;
use juiceflow::store::Store;
use juiceflow::timeframe::Window;
use tempfile::tempdir;

const TASK2_POOL: Address = address!("A69De906B9A830Deb64edB97B2eb0848139306d2");
const CBTC: Address = address!("4370e27f7d91d9341bff232d7ee8bdfe3a9933a0");
const CUSD: Address = address!("2ffc18ac99d367b70dd922771df8c2074af4ace0");
const WALLET: Address = address!("9b28b690550522608890c3c7e63c0b4a7ebab9aa");
const CURVE_TOKEN: Address = address!("131a8656275bDd1130E0213414F3DA47C8C2a402");
const V2_PAIR: Address = address!("36c16eac6b0ba6c50f494914ff015fca95b7835f");

const TS: i64 = 1700000000;

fn ctx(tx_byte: u8, block: u64, log_index: u64) -> EventContext {
    EventContext {
        chain_id: 5115,
        block_number: block,
        block_timestamp: TS,
        tx_hash: B256::repeat_byte(tx_byte),
        log_index,
    }
}

fn campaign_swap(tx_byte: u8, block: u64, amount_out: i64) -> ChainEvent {
    ChainEvent {
        ctx: ctx(tx_byte, block, 3),
        kind: EventKind::PoolSwap {
            pool: TASK2_POOL,
            sender: WALLET,
            recipient: WALLET,
            amount0: I256::try_from(amount_out * 3).unwrap(),
            amount1: I256::try_from(-amount_out).unwrap(),
            token0: Some(CBTC),
            token1: Some(CUSD),
            router: None,
            method_signature: "0x414bf389".to_string(),
        },
    }
}

fn open_indexer() -> (tempfile::TempDir, Indexer) {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path().join("indexer.db")).unwrap();
    (dir, Indexer::new(store, CampaignConfig::citrea_testnet()))
}

#[test]
fn test_campaign_swap_feeds_every_table() {
    let (_dir, indexer) = open_indexer();
    let event = campaign_swap(0xaa, 100, 500);
    indexer.apply(&event).unwrap();

    let store = indexer.store().clone();
    store
        .read(|conn| {
            let id = event_id(&B256::repeat_byte(0xaa), 3);
            let swap = get_swap(conn, &id)?.unwrap();
            assert!(swap.is_campaign_relevant);
            assert_eq!(swap.campaign_task_id, Some(2));
            assert_eq!(swap.amount_out, U256::from(500u64));

            for window in Window::all() {
                let token = get_token_stat(conn, &CUSD, window, TS)?.unwrap();
                assert_eq!(token.tx_count, 1);
                assert_eq!(token.volume0, U256::from(500u64));

                let pool = get_pool_stat(conn, PoolKind::V3, &TASK2_POOL, window, TS)?.unwrap();
                assert_eq!(pool.volume0, U256::from(1500u64));
                assert_eq!(pool.volume1, U256::from(500u64));
            }

            let (tx_hash, block) = get_completion(conn, 5115, &WALLET, 2)?.unwrap();
            assert_eq!(tx_hash, format!("{:#x}", B256::repeat_byte(0xaa)));
            assert_eq!(block, 100);

            let stats = get_stats(conn, 5115)?.unwrap();
            assert_eq!(stats.total_users, 1);
            assert_eq!(stats.total_swaps, 1);
            assert_eq!(stats.total_volume, U256::from(500u64));
            assert_eq!(stats.task_completions, [0, 1, 0]);

            assert_eq!(latest_indexed_block(conn, 5115)?, Some(100));
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_replayed_event_is_fully_idempotent() {
    let (_dir, indexer) = open_indexer();
    let event = campaign_swap(0xaa, 100, 500);

    indexer.apply(&event).unwrap();
    indexer.apply(&event).unwrap();

    indexer
        .store()
        .read(|conn| {
            let stats = get_stats(conn, 5115)?.unwrap();
            assert_eq!(stats.total_swaps, 1);
            assert_eq!(stats.total_volume, U256::from(500u64));
            assert_eq!(stats.task_completions, [0, 1, 0]);

            let token = get_token_stat(conn, &CUSD, Window::AllTime, TS)?.unwrap();
            assert_eq!(token.tx_count, 1);
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_replayed_transfer_is_fully_idempotent() {
    let (_dir, indexer) = open_indexer();
    let event = ChainEvent {
        ctx: ctx(0xcc, 101, 5),
        kind: EventKind::TokenTransfer {
            token: CBTC,
            from: WALLET,
            to: WALLET,
            amount: U256::from(1000u64),
        },
    };

    indexer.apply(&event).unwrap();
    indexer.apply(&event).unwrap();

    indexer
        .store()
        .read(|conn| {
            for window in Window::all() {
                let stat = get_token_stat(conn, &CBTC, window, TS)?.unwrap();
                assert_eq!(stat.tx_count, 1);
                assert_eq!(stat.volume0, U256::from(1000u64));
            }
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_second_qualifying_swap_does_not_refresh_completion() {
    let (_dir, indexer) = open_indexer();

    indexer.apply(&campaign_swap(0xaa, 100, 500)).unwrap();
    indexer.apply(&campaign_swap(0xbb, 120, 900)).unwrap();

    indexer
        .store()
        .read(|conn| {
            let (tx_hash, block) = get_completion(conn, 5115, &WALLET, 2)?.unwrap();
            assert_eq!(tx_hash, format!("{:#x}", B256::repeat_byte(0xaa)));
            assert_eq!(block, 100);

            let stats = get_stats(conn, 5115)?.unwrap();
            assert_eq!(stats.total_users, 1);
            assert_eq!(stats.total_swaps, 2);
            assert_eq!(stats.total_volume, U256::from(1400u64));
            assert_eq!(stats.task_completions, [0, 1, 0]);
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_launchpad_lifecycle() {
    let (_dir, indexer) = open_indexer();

    indexer
        .apply(&ChainEvent {
            ctx: ctx(0x01, 10, 0),
            kind: EventKind::TokenCreated {
                token: CURVE_TOKEN,
                name: "Juice".to_string(),
                symbol: "JUICE".to_string(),
                creator: WALLET,
                base_asset: CBTC,
            },
        })
        .unwrap();

    // Buy takes virtual reserves from the initial 1,073,000,000e18 down to
    // 973,000,000e18
    indexer
        .apply(&ChainEvent {
            ctx: ctx(0x02, 11, 0),
            kind: EventKind::CurveBuy {
                token: CURVE_TOKEN,
                trader: WALLET,
                base_in: U256::from(1_000u64),
                tokens_out: e18(100_000_000),
                virtual_token_reserves: initial_virtual_token_reserves() - e18(100_000_000),
            },
        })
        .unwrap();

    indexer
        .apply(&ChainEvent {
            ctx: ctx(0x03, 12, 0),
            kind: EventKind::ReadyForGraduation { token: CURVE_TOKEN },
        })
        .unwrap();
    indexer
        .apply(&ChainEvent {
            ctx: ctx(0x04, 13, 0),
            kind: EventKind::Graduated {
                token: CURVE_TOKEN,
                pair: V2_PAIR,
            },
        })
        .unwrap();
    indexer
        .apply(&ChainEvent {
            ctx: ctx(0x04, 13, 1),
            kind: EventKind::PairCreated {
                pair: V2_PAIR,
                token0: CURVE_TOKEN,
                token1: CBTC,
                launchpad_token: CURVE_TOKEN,
            },
        })
        .unwrap();

    indexer
        .store()
        .read(|conn| {
            let token = get_token(conn, &CURVE_TOKEN)?.unwrap();
            assert!(token.graduated);
            assert_eq!(token.v2_pair, Some(V2_PAIR));
            assert_eq!(token.total_buys, 1);
            assert_eq!(token.total_volume_base, U256::from(1_000u64));
            // Frozen at full once graduated, even though the last computed
            // figure was 1260
            assert_eq!(token.progress, 10000);

            assert_eq!(latest_indexed_block(conn, 5115)?, Some(13));
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_progress_snapshot_before_graduation() {
    let (_dir, indexer) = open_indexer();

    indexer
        .apply(&ChainEvent {
            ctx: ctx(0x01, 10, 0),
            kind: EventKind::TokenCreated {
                token: CURVE_TOKEN,
                name: "Juice".to_string(),
                symbol: "JUICE".to_string(),
                creator: WALLET,
                base_asset: CBTC,
            },
        })
        .unwrap();
    indexer
        .apply(&ChainEvent {
            ctx: ctx(0x02, 11, 0),
            kind: EventKind::CurveBuy {
                token: CURVE_TOKEN,
                trader: WALLET,
                base_in: U256::from(1_000u64),
                tokens_out: e18(100_000_000),
                virtual_token_reserves: initial_virtual_token_reserves() - e18(100_000_000),
            },
        })
        .unwrap();

    indexer
        .store()
        .read(|conn| {
            assert_eq!(get_token(conn, &CURVE_TOKEN)?.unwrap().progress, 1260);
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_v2_swap_after_graduation() {
    let (_dir, indexer) = open_indexer();

    indexer
        .apply(&ChainEvent {
            ctx: ctx(0x04, 13, 1),
            kind: EventKind::PairCreated {
                pair: V2_PAIR,
                token0: CURVE_TOKEN,
                token1: CBTC,
                launchpad_token: CURVE_TOKEN,
            },
        })
        .unwrap();

    let swap = ChainEvent {
        ctx: ctx(0x05, 14, 2),
        kind: EventKind::V2Swap {
            pair: V2_PAIR,
            amount0_in: U256::from(100u64),
            amount1_in: U256::ZERO,
            amount0_out: U256::ZERO,
            amount1_out: U256::from(40u64),
        },
    };
    indexer.apply(&swap).unwrap();
    indexer.apply(&swap).unwrap();

    indexer
        .store()
        .read(|conn| {
            let stat = get_pool_stat(conn, PoolKind::V2, &V2_PAIR, Window::AllTime, TS)?.unwrap();
            assert_eq!(stat.tx_count, 1);
            assert_eq!(stat.volume0, U256::from(100u64));
            assert_eq!(stat.volume1, U256::from(40u64));
            Ok(())
        })
        .unwrap();
}

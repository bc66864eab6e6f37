//! Bonding-curve tokens, trades, and graduated V2 pools
//!
//! Token lifecycle flags only move forward: `can_graduate` and `graduated`
//! are set with `WHERE graduated = 0` guards so a redelivered or late event
//! can never un-graduate a token or rewrite its frozen progress.

use super::db::column_u256;
use super::StoreError;
use alloy_primitives::{Address, B256, U256};
use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct LaunchpadToken {
    pub address: Address,
    pub chain_id: u64,
    pub name: String,
    pub symbol: String,
    pub creator: Address,
    pub base_asset: Address,
    pub created_at: i64,
    pub created_at_block: u64,
    pub tx_hash: B256,
}

/// Read-side snapshot of a launchpad token row.
#[derive(Debug, Clone)]
pub struct TokenState {
    pub address: Address,
    pub graduated: bool,
    pub can_graduate: bool,
    pub v2_pair: Option<Address>,
    pub graduated_at: Option<i64>,
    pub total_buys: i64,
    pub total_sells: i64,
    pub total_volume_base: U256,
    pub last_trade_at: Option<i64>,
    pub progress: u32,
}

#[derive(Debug, Clone)]
pub struct LaunchpadTrade {
    pub id: String,
    pub token: Address,
    pub chain_id: u64,
    pub trader: Address,
    pub is_buy: bool,
    pub base_amount: U256,
    pub token_amount: U256,
    pub timestamp: i64,
    pub block_number: u64,
    pub tx_hash: B256,
}

#[derive(Debug, Clone)]
pub struct GraduatedPool {
    pub pair: Address,
    pub chain_id: u64,
    pub token0: Address,
    pub token1: Address,
    pub launchpad_token: Address,
    pub created_at: i64,
    pub created_at_block: u64,
    pub tx_hash: B256,
}

/// Register a freshly created curve token. Returns `false` on redelivery.
pub fn insert_token(conn: &Connection, token: &LaunchpadToken) -> Result<bool, StoreError> {
    let changed = conn.execute(
        "INSERT INTO launchpad_token (address, chain_id, name, symbol, creator, base_asset,
                                      created_at, created_at_block, tx_hash,
                                      graduated, can_graduate, total_buys, total_sells,
                                      total_volume_base, progress)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, 0, 0, 0, '0', 0)
         ON CONFLICT(address) DO NOTHING",
        params![
            token.address.to_checksum(None),
            token.chain_id,
            token.name,
            token.symbol,
            token.creator.to_checksum(None),
            token.base_asset.to_checksum(None),
            token.created_at,
            token.created_at_block,
            format!("{:#x}", token.tx_hash),
        ],
    )?;
    Ok(changed > 0)
}

/// Append one trade row. Returns `false` on redelivery; the caller must
/// then skip `apply_trade`.
pub fn insert_trade(conn: &Connection, trade: &LaunchpadTrade) -> Result<bool, StoreError> {
    let changed = conn.execute(
        "INSERT INTO launchpad_trade (id, token_address, chain_id, trader, is_buy,
                                      base_amount, token_amount, timestamp, block_number, tx_hash)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(id) DO NOTHING",
        params![
            trade.id,
            trade.token.to_checksum(None),
            trade.chain_id,
            trade.trader.to_checksum(None),
            trade.is_buy,
            trade.base_amount.to_string(),
            trade.token_amount.to_string(),
            trade.timestamp,
            trade.block_number,
            format!("{:#x}", trade.tx_hash),
        ],
    )?;
    Ok(changed > 0)
}

/// Fold one (newly recorded) trade into the token's counters and set the
/// fresh curve progress. Progress is frozen once the token graduated.
pub fn apply_trade(
    conn: &Connection,
    token: &Address,
    is_buy: bool,
    base_amount: U256,
    timestamp: i64,
    progress_bps: u32,
) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE launchpad_token SET
             total_buys = total_buys + ?2,
             total_sells = total_sells + ?3,
             total_volume_base = u256_add(total_volume_base, ?4),
             last_trade_at = ?5,
             progress = CASE WHEN graduated = 0 THEN ?6 ELSE progress END
         WHERE address = ?1",
        params![
            token.to_checksum(None),
            is_buy as i64,
            (!is_buy) as i64,
            base_amount.to_string(),
            timestamp,
            progress_bps,
        ],
    )?;
    Ok(())
}

/// Flag the curve as full. Idempotent, ignored after graduation. Progress
/// is left alone; it only ever comes from event-carried virtual reserves
/// (or the terminal graduation).
pub fn mark_can_graduate(conn: &Connection, token: &Address) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE launchpad_token SET can_graduate = 1
         WHERE address = ?1 AND graduated = 0",
        [token.to_checksum(None)],
    )?;
    Ok(())
}

/// Move the token to its terminal graduated state. Returns `true` only for
/// the transition itself; a redelivered graduation changes nothing.
pub fn mark_graduated(
    conn: &Connection,
    token: &Address,
    pair: &Address,
    timestamp: i64,
) -> Result<bool, StoreError> {
    let changed = conn.execute(
        "UPDATE launchpad_token SET
             graduated = 1, can_graduate = 0, progress = 10000,
             v2_pair = ?2, graduated_at = ?3
         WHERE address = ?1 AND graduated = 0",
        params![token.to_checksum(None), pair.to_checksum(None), timestamp],
    )?;
    Ok(changed > 0)
}

pub fn insert_graduated_pool(conn: &Connection, pool: &GraduatedPool) -> Result<bool, StoreError> {
    let changed = conn.execute(
        "INSERT INTO graduated_v2_pool (pair_address, chain_id, token0, token1,
                                        launchpad_token_address, created_at,
                                        created_at_block, tx_hash, total_swaps)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0)
         ON CONFLICT(pair_address) DO NOTHING",
        params![
            pool.pair.to_checksum(None),
            pool.chain_id,
            pool.token0.to_checksum(None),
            pool.token1.to_checksum(None),
            pool.launchpad_token.to_checksum(None),
            pool.created_at,
            pool.created_at_block,
            format!("{:#x}", pool.tx_hash),
        ],
    )?;
    Ok(changed > 0)
}

/// Count a V2 swap against a graduated pool. Matching zero rows is fine:
/// not every V2 pair came out of the launchpad.
pub fn bump_pool_swaps(conn: &Connection, pair: &Address) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE graduated_v2_pool SET total_swaps = total_swaps + 1 WHERE pair_address = ?1",
        [pair.to_checksum(None)],
    )?;
    Ok(())
}

pub fn get_token(conn: &Connection, token: &Address) -> Result<Option<TokenState>, StoreError> {
    let row = conn
        .query_row(
            "SELECT graduated, can_graduate, v2_pair, graduated_at,
                    total_buys, total_sells, total_volume_base, last_trade_at, progress
             FROM launchpad_token WHERE address = ?1",
            [token.to_checksum(None)],
            |row| {
                let v2_pair: Option<String> = row.get(2)?;
                let volume: String = row.get(6)?;
                Ok(TokenState {
                    address: *token,
                    graduated: row.get(0)?,
                    can_graduate: row.get(1)?,
                    v2_pair: v2_pair
                        .map(|s| Address::from_str(&s).map_err(bad_column))
                        .transpose()?,
                    graduated_at: row.get(3)?,
                    total_buys: row.get(4)?,
                    total_sells: row.get(5)?,
                    total_volume_base: column_u256(&volume)?,
                    last_trade_at: row.get(7)?,
                    progress: row.get(8)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// Constituents of a graduated pair, when the pair is one of ours.
pub fn get_pool_tokens(
    conn: &Connection,
    pair: &Address,
) -> Result<Option<(Address, Address)>, StoreError> {
    let row = conn
        .query_row(
            "SELECT token0, token1 FROM graduated_v2_pool WHERE pair_address = ?1",
            [pair.to_checksum(None)],
            |row| {
                let token0: String = row.get(0)?;
                let token1: String = row.get(1)?;
                Ok((
                    Address::from_str(&token0).map_err(bad_column)?,
                    Address::from_str(&token1).map_err(bad_column)?,
                ))
            },
        )
        .optional()?;
    Ok(row)
}

pub fn get_pool_swaps(conn: &Connection, pair: &Address) -> Result<Option<i64>, StoreError> {
    let row = conn
        .query_row(
            "SELECT total_swaps FROM graduated_v2_pool WHERE pair_address = ?1",
            [pair.to_checksum(None)],
            |row| row.get(0),
        )
        .optional()?;
    Ok(row)
}

fn bad_column<E>(e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use alloy_primitives::address;

    const TOKEN: Address = address!("4370e27f7d91d9341bff232d7ee8bdfe3a9933a0");
    const PAIR: Address = address!("2ffc18ac99d367b70dd922771df8c2074af4ace0");
    const TRADER: Address = address!("9b28b690550522608890c3c7e63c0b4a7ebab9aa");

    fn token() -> LaunchpadToken {
        LaunchpadToken {
            address: TOKEN,
            chain_id: 5115,
            name: "Juice".to_string(),
            symbol: "JUICE".to_string(),
            creator: TRADER,
            base_asset: address!("36c16eac6b0ba6c50f494914ff015fca95b7835f"),
            created_at: 1700000000,
            created_at_block: 10,
            tx_hash: B256::repeat_byte(0x01),
        }
    }

    fn trade(id: &str, is_buy: bool, base: u64) -> LaunchpadTrade {
        LaunchpadTrade {
            id: id.to_string(),
            token: TOKEN,
            chain_id: 5115,
            trader: TRADER,
            is_buy,
            base_amount: U256::from(base),
            token_amount: U256::from(base * 1000),
            timestamp: 1700000100,
            block_number: 11,
            tx_hash: B256::repeat_byte(0x02),
        }
    }

    #[test]
    fn test_trade_rollup() {
        let store = Store::open_in_memory().unwrap();
        let conn = store.raw();

        assert!(insert_token(&conn, &token()).unwrap());
        assert!(insert_trade(&conn, &trade("t1", true, 100)).unwrap());
        apply_trade(&conn, &TOKEN, true, U256::from(100u64), 1700000100, 1260).unwrap();
        assert!(insert_trade(&conn, &trade("t2", false, 40)).unwrap());
        apply_trade(&conn, &TOKEN, false, U256::from(40u64), 1700000200, 900).unwrap();

        let state = get_token(&conn, &TOKEN).unwrap().unwrap();
        assert_eq!(state.total_buys, 1);
        assert_eq!(state.total_sells, 1);
        assert_eq!(state.total_volume_base, U256::from(140u64));
        assert_eq!(state.last_trade_at, Some(1700000200));
        // Sells can walk progress back down before graduation
        assert_eq!(state.progress, 900);
    }

    #[test]
    fn test_redelivered_trade_not_applied() {
        let store = Store::open_in_memory().unwrap();
        let conn = store.raw();

        insert_token(&conn, &token()).unwrap();
        assert!(insert_trade(&conn, &trade("t1", true, 100)).unwrap());
        assert!(!insert_trade(&conn, &trade("t1", true, 100)).unwrap());
    }

    #[test]
    fn test_can_graduate_flag_leaves_progress_alone() {
        let store = Store::open_in_memory().unwrap();
        let conn = store.raw();

        insert_token(&conn, &token()).unwrap();
        apply_trade(&conn, &TOKEN, true, U256::from(100u64), 1700000100, 9950).unwrap();
        mark_can_graduate(&conn, &TOKEN).unwrap();

        let state = get_token(&conn, &TOKEN).unwrap().unwrap();
        assert!(state.can_graduate);
        // Progress still reflects the last event-carried reserve figure
        assert_eq!(state.progress, 9950);
    }

    #[test]
    fn test_graduation_exactly_once() {
        let store = Store::open_in_memory().unwrap();
        let conn = store.raw();

        insert_token(&conn, &token()).unwrap();
        mark_can_graduate(&conn, &TOKEN).unwrap();

        assert!(mark_graduated(&conn, &TOKEN, &PAIR, 1700001000).unwrap());
        assert!(!mark_graduated(&conn, &TOKEN, &PAIR, 1700002000).unwrap());

        let state = get_token(&conn, &TOKEN).unwrap().unwrap();
        assert!(state.graduated);
        assert!(!state.can_graduate);
        assert_eq!(state.v2_pair, Some(PAIR));
        assert_eq!(state.graduated_at, Some(1700001000));
        assert_eq!(state.progress, 10000);
    }

    #[test]
    fn test_progress_frozen_after_graduation() {
        let store = Store::open_in_memory().unwrap();
        let conn = store.raw();

        insert_token(&conn, &token()).unwrap();
        mark_graduated(&conn, &TOKEN, &PAIR, 1700001000).unwrap();

        // Late curve trade lands after graduation; counters move, progress stays
        apply_trade(&conn, &TOKEN, false, U256::from(5u64), 1700001100, 42).unwrap();
        mark_can_graduate(&conn, &TOKEN).unwrap();

        let state = get_token(&conn, &TOKEN).unwrap().unwrap();
        assert_eq!(state.progress, 10000);
        assert!(!state.can_graduate);
        assert_eq!(state.total_sells, 1);
    }

    #[test]
    fn test_graduated_pool_and_swap_counter() {
        let store = Store::open_in_memory().unwrap();
        let conn = store.raw();

        let pool = GraduatedPool {
            pair: PAIR,
            chain_id: 5115,
            token0: TOKEN,
            token1: address!("36c16eac6b0ba6c50f494914ff015fca95b7835f"),
            launchpad_token: TOKEN,
            created_at: 1700001000,
            created_at_block: 20,
            tx_hash: B256::repeat_byte(0x03),
        };
        assert!(insert_graduated_pool(&conn, &pool).unwrap());
        assert!(!insert_graduated_pool(&conn, &pool).unwrap());

        bump_pool_swaps(&conn, &PAIR).unwrap();
        bump_pool_swaps(&conn, &PAIR).unwrap();
        assert_eq!(get_pool_swaps(&conn, &PAIR).unwrap(), Some(2));

        // Unknown pair is a silent no-op
        bump_pool_swaps(&conn, &TOKEN).unwrap();
        assert_eq!(get_pool_swaps(&conn, &TOKEN).unwrap(), None);
    }
}

//! Write-once swap and transfer fact rows

use super::db::column_u256;
use super::StoreError;
use alloy_primitives::{Address, B256, U256};
use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct SwapRecord {
    pub id: String,
    pub tx_hash: B256,
    pub chain_id: u64,
    pub block_number: u64,
    pub block_timestamp: i64,
    pub from: Address,
    pub to: Address,
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: U256,
    pub amount_out: U256,
    pub router: Address,
    pub method_signature: String,
    pub is_campaign_relevant: bool,
    pub campaign_task_id: Option<u8>,
}

/// Insert a swap record, doing nothing on conflict.
///
/// Returns `true` when the row is new. A `false` return is the redelivery
/// signal: the caller must skip every downstream aggregate update for this
/// event.
pub fn insert_swap(conn: &Connection, record: &SwapRecord) -> Result<bool, StoreError> {
    let changed = conn.execute(
        "INSERT INTO swap (id, tx_hash, chain_id, block_number, block_timestamp,
                           from_address, to_address, token_in, token_out,
                           amount_in, amount_out, router, method_signature,
                           is_campaign_relevant, campaign_task_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
         ON CONFLICT(id) DO NOTHING",
        params![
            record.id,
            format!("{:#x}", record.tx_hash),
            record.chain_id,
            record.block_number,
            record.block_timestamp,
            record.from.to_checksum(None),
            record.to.to_checksum(None),
            record.token_in.to_checksum(None),
            record.token_out.to_checksum(None),
            record.amount_in.to_string(),
            record.amount_out.to_string(),
            record.router.to_checksum(None),
            record.method_signature,
            record.is_campaign_relevant,
            record.campaign_task_id,
        ],
    )?;
    Ok(changed > 0)
}

#[derive(Debug, Clone)]
pub struct TransferRecord {
    pub id: String,
    pub tx_hash: B256,
    pub chain_id: u64,
    pub block_number: u64,
    pub block_timestamp: i64,
    pub token: Address,
    pub from: Address,
    pub to: Address,
    pub amount: U256,
}

/// Insert a transfer record, doing nothing on conflict. Same contract as
/// [`insert_swap`]: `false` means redelivery, skip the stat bump.
pub fn insert_transfer(conn: &Connection, record: &TransferRecord) -> Result<bool, StoreError> {
    let changed = conn.execute(
        "INSERT INTO token_transfer (id, tx_hash, chain_id, block_number, block_timestamp,
                                     token_address, from_address, to_address, amount)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(id) DO NOTHING",
        params![
            record.id,
            format!("{:#x}", record.tx_hash),
            record.chain_id,
            record.block_number,
            record.block_timestamp,
            record.token.to_checksum(None),
            record.from.to_checksum(None),
            record.to.to_checksum(None),
            record.amount.to_string(),
        ],
    )?;
    Ok(changed > 0)
}

/// Fetch a swap record by id.
pub fn get_swap(conn: &Connection, id: &str) -> Result<Option<SwapRecord>, StoreError> {
    let row = conn
        .query_row(
            "SELECT id, tx_hash, chain_id, block_number, block_timestamp,
                    from_address, to_address, token_in, token_out,
                    amount_in, amount_out, router, method_signature,
                    is_campaign_relevant, campaign_task_id
             FROM swap WHERE id = ?1",
            [id],
            |row| {
                let tx_hash: String = row.get(1)?;
                let from: String = row.get(5)?;
                let to: String = row.get(6)?;
                let token_in: String = row.get(7)?;
                let token_out: String = row.get(8)?;
                let amount_in: String = row.get(9)?;
                let amount_out: String = row.get(10)?;
                let router: String = row.get(11)?;
                Ok(SwapRecord {
                    id: row.get(0)?,
                    tx_hash: B256::from_str(&tx_hash).map_err(bad_column)?,
                    chain_id: row.get(2)?,
                    block_number: row.get(3)?,
                    block_timestamp: row.get(4)?,
                    from: Address::from_str(&from).map_err(bad_column)?,
                    to: Address::from_str(&to).map_err(bad_column)?,
                    token_in: Address::from_str(&token_in).map_err(bad_column)?,
                    token_out: Address::from_str(&token_out).map_err(bad_column)?,
                    amount_in: column_u256(&amount_in)?,
                    amount_out: column_u256(&amount_out)?,
                    router: Address::from_str(&router).map_err(bad_column)?,
                    method_signature: row.get(12)?,
                    is_campaign_relevant: row.get(13)?,
                    campaign_task_id: row.get(14)?,
                })
            },
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

    fn record(id: &str) -> SwapRecord {
        SwapRecord {
            id: id.to_string(),
            tx_hash: B256::repeat_byte(0x11),
            chain_id: 5115,
            block_number: 42,
            block_timestamp: 1700000000,
            from: address!("9b28b690550522608890c3c7e63c0b4a7ebab9aa"),
            to: address!("2ffc18ac99d367b70dd922771df8c2074af4ace0"),
            token_in: address!("6006797369E2A595D31Df4ab3691044038AAa7FE"),
            token_out: address!("6006797369E2A595D31Df4ab3691044038AAa7FE"),
            amount_in: U256::from(1500u64),
            amount_out: U256::from(500u64),
            router: address!("36c16eac6b0ba6c50f494914ff015fca95b7835f"),
            method_signature: "0x414bf389".to_string(),
            is_campaign_relevant: true,
            campaign_task_id: Some(2),
        }
    }

    #[test]
    fn test_insert_and_read_back() {
        let store = Store::open_in_memory().unwrap();
        let conn = store.raw();

        assert!(insert_swap(&conn, &record("swap-1")).unwrap());

        let row = get_swap(&conn, "swap-1").unwrap().unwrap();
        assert_eq!(row.amount_out, U256::from(500u64));
        assert_eq!(row.campaign_task_id, Some(2));
        assert!(row.is_campaign_relevant);
    }

    #[test]
    fn test_duplicate_transfer_insert_is_noop() {
        let store = Store::open_in_memory().unwrap();
        let conn = store.raw();

        let transfer = TransferRecord {
            id: "xfer-1".to_string(),
            tx_hash: B256::repeat_byte(0x22),
            chain_id: 5115,
            block_number: 50,
            block_timestamp: 1700000000,
            token: address!("4370e27f7d91d9341bff232d7ee8bdfe3a9933a0"),
            from: Address::ZERO,
            to: address!("9b28b690550522608890c3c7e63c0b4a7ebab9aa"),
            amount: U256::from(1000u64),
        };
        assert!(insert_transfer(&conn, &transfer).unwrap());
        assert!(!insert_transfer(&conn, &transfer).unwrap());

        let amount: String = conn
            .query_row(
                "SELECT amount FROM token_transfer WHERE id = 'xfer-1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(amount, "1000");
    }

    #[test]
    fn test_duplicate_insert_is_noop() {
        let store = Store::open_in_memory().unwrap();
        let conn = store.raw();

        assert!(insert_swap(&conn, &record("swap-dup")).unwrap());

        // Redelivered with different mutable-looking fields; original row wins
        let mut replay = record("swap-dup");
        replay.amount_out = U256::from(999u64);
        assert!(!insert_swap(&conn, &replay).unwrap());

        let row = get_swap(&conn, "swap-dup").unwrap().unwrap();
        assert_eq!(row.amount_out, U256::from(500u64));
    }
}

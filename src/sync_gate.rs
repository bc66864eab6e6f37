//! Sync status gate
//!
//! Reads are only trustworthy once the indexer has caught up to the chain
//! tip. The gate compares the latest indexed block against the current
//! chain height (cached for a few seconds) and fails toward unavailability:
//! a broken RPC or store read reports "not synced" rather than serving
//! data of unknown freshness.

use crate::store::{sync, Store};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Operational paths that must stay reachable while catching up.
const GATE_ALLOWLIST: [&str; 4] = [
    "/api/sync-status",
    "/api/info",
    "/campaign/health",
    "/graphql",
];

pub fn bypasses_gate(path: &str) -> bool {
    GATE_ALLOWLIST.iter().any(|allowed| path == *allowed)
}

#[derive(Debug)]
pub enum HeightError {
    Http(reqwest::Error),
    Rpc(String),
}

impl std::fmt::Display for HeightError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeightError::Http(e) => write!(f, "height request failed: {}", e),
            HeightError::Rpc(msg) => write!(f, "bad height response: {}", msg),
        }
    }
}

impl std::error::Error for HeightError {}

impl From<reqwest::Error> for HeightError {
    fn from(e: reqwest::Error) -> Self {
        HeightError::Http(e)
    }
}

/// Source of the current chain tip height.
#[async_trait]
pub trait ChainHeightProvider: Send + Sync {
    async fn latest_height(&self) -> Result<u64, HeightError>;
}

/// JSON-RPC `eth_blockNumber` lookup.
pub struct RpcHeightProvider {
    client: reqwest::Client,
    url: String,
}

impl RpcHeightProvider {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl ChainHeightProvider for RpcHeightProvider {
    async fn latest_height(&self) -> Result<u64, HeightError> {
        let response: serde_json::Value = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({
                "jsonrpc": "2.0",
                "method": "eth_blockNumber",
                "params": [],
                "id": 1,
            }))
            .send()
            .await?
            .json()
            .await?;

        let hex = response
            .get("result")
            .and_then(|v| v.as_str())
            .ok_or_else(|| HeightError::Rpc(format!("no result field in {}", response)))?;
        u64::from_str_radix(hex.trim_start_matches("0x"), 16)
            .map_err(|e| HeightError::Rpc(format!("{} ({})", e, hex)))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub synced: bool,
    pub latest_indexed_block: Option<u64>,
    pub chain_height: Option<u64>,
    pub blocks_behind: Option<u64>,
    pub sync_percent: Option<f64>,
}

impl SyncStatus {
    fn unavailable(latest_indexed_block: Option<u64>) -> Self {
        Self {
            synced: false,
            latest_indexed_block,
            chain_height: None,
            blocks_behind: None,
            sync_percent: None,
        }
    }
}

pub struct SyncGate {
    store: Store,
    provider: Box<dyn ChainHeightProvider>,
    chain_id: u64,
    threshold: u64,
    ttl: Duration,
    cache: Mutex<Option<(Instant, SyncStatus)>>,
}

impl SyncGate {
    pub fn new(
        store: Store,
        provider: Box<dyn ChainHeightProvider>,
        chain_id: u64,
        threshold: u64,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            provider,
            chain_id,
            threshold,
            ttl,
            cache: Mutex::new(None),
        }
    }

    pub async fn is_synced(&self) -> bool {
        self.status().await.synced
    }

    /// Current sync status, at most `ttl` stale. Concurrent misses may race
    /// to refresh; the duplicate height lookup is accepted because the TTL
    /// keeps the window small.
    pub async fn status(&self) -> SyncStatus {
        if let Some(cached) = self.cached() {
            return cached;
        }
        let status = self.compute().await;
        *self.cache.lock().unwrap() = Some((Instant::now(), status.clone()));
        status
    }

    fn cached(&self) -> Option<SyncStatus> {
        let cache = self.cache.lock().unwrap();
        match cache.as_ref() {
            Some((at, status)) if at.elapsed() < self.ttl => Some(status.clone()),
            _ => None,
        }
    }

    async fn compute(&self) -> SyncStatus {
        let indexed = match self
            .store
            .read(|conn| sync::latest_indexed_block(conn, self.chain_id))
        {
            Ok(indexed) => indexed,
            Err(e) => {
                log::error!("❌ Sync check could not read indexed height: {}", e);
                return SyncStatus::unavailable(None);
            }
        };

        let height = match self.provider.latest_height().await {
            Ok(height) => height,
            Err(e) => {
                log::warn!("⚠️ Chain height lookup failed, reporting not synced: {}", e);
                return SyncStatus::unavailable(indexed);
            }
        };

        let indexed_block = indexed.unwrap_or(0);
        let blocks_behind = height.saturating_sub(indexed_block);
        let sync_percent = if height == 0 {
            100.0
        } else {
            (indexed_block as f64 / height as f64) * 100.0
        };

        SyncStatus {
            synced: blocks_behind <= self.threshold,
            latest_indexed_block: indexed,
            chain_height: Some(height),
            blocks_behind: Some(blocks_behind),
            sync_percent: Some(sync_percent),
        }
    }
}

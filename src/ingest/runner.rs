//! Ingestion loop - drains the event channel into the store
//!
//! Malformed events are logged and dropped; the stream never halts on one
//! bad payload. Store failures are retried with backoff for the whole
//! event, so an aggregate is never left half-applied.

use super::backoff::ExponentialBackoff;
use super::Indexer;
use crate::events::{ChainEvent, RawEvent};
use crate::store::StoreError;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};

pub async fn run_ingestion(mut rx: mpsc::Receiver<RawEvent>, indexer: Indexer) {
    log::info!("🚀 Starting event ingestion");

    let mut stats_timer = interval(Duration::from_secs(10));
    let mut applied = 0u64;
    let mut skipped = 0u64;

    loop {
        tokio::select! {
            received = rx.recv() => {
                let raw = match received {
                    Some(raw) => raw,
                    None => {
                        log::warn!("⚠️ Event channel closed, stopping ingestion");
                        break;
                    }
                };
                let event = match ChainEvent::try_from(raw) {
                    Ok(event) => event,
                    Err(e) => {
                        log::warn!("⚠️ Skipping malformed event: {}", e);
                        skipped += 1;
                        continue;
                    }
                };
                match apply_with_retry(&indexer, &event).await {
                    Ok(()) => applied += 1,
                    Err(e) => {
                        log::error!(
                            "❌ Giving up on event at block {} (tx {:#x}): {}",
                            event.ctx.block_number,
                            event.ctx.tx_hash,
                            e
                        );
                        skipped += 1;
                    }
                }
            }

            _ = stats_timer.tick() => {
                if applied > 0 || skipped > 0 {
                    log::info!("📊 Ingestion: {} applied, {} skipped (last 10s)", applied, skipped);
                    applied = 0;
                    skipped = 0;
                }
            }
        }
    }

    log::info!("✅ Event ingestion stopped");
}

async fn apply_with_retry(indexer: &Indexer, event: &ChainEvent) -> Result<(), StoreError> {
    let mut backoff = ExponentialBackoff::new(100, 5_000, 5);
    loop {
        match indexer.apply(event) {
            Ok(()) => return Ok(()),
            Err(e) => {
                log::warn!("⚠️ Store rejected event, will retry: {}", e);
                if backoff.sleep().await.is_err() {
                    return Err(e);
                }
            }
        }
    }
}

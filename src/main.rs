use juiceflow::config::Config;
use juiceflow::events::RawEvent;
use juiceflow::ingest::{run_ingestion, CampaignConfig, Indexer};
use juiceflow::store::Store;
use juiceflow::sync_gate::{RpcHeightProvider, SyncGate};
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = Config::from_env()?;
    log::info!("🚀 Starting JuiceFlow indexer...");
    log::info!("📊 Configuration:");
    log::info!("   Database: {}", config.database_path);
    log::info!("   Chain id: {}", config.chain_id);
    log::info!("   RPC: {}", config.rpc_url);
    log::info!("   Sync threshold: {} blocks", config.sync_threshold);

    let store = Store::open(&config.database_path)?;

    let campaign = if config.chain_id == 5115 {
        CampaignConfig::citrea_testnet()
    } else {
        log::warn!("⚠️ No campaign pools configured for chain {}", config.chain_id);
        CampaignConfig::disabled(config.chain_id)
    };
    let indexer = Indexer::new(store.clone(), campaign);

    let (tx, rx) = mpsc::channel::<RawEvent>(config.channel_capacity);
    let ingestion = tokio::spawn(run_ingestion(rx, indexer));

    // Periodic sync status report against the chain tip
    let gate = SyncGate::new(
        store,
        Box::new(RpcHeightProvider::new(&config.rpc_url)),
        config.chain_id,
        config.sync_threshold,
        Duration::from_secs(config.sync_cache_ttl_secs),
    );
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(Duration::from_secs(30));
        loop {
            timer.tick().await;
            let status = gate.status().await;
            match (status.blocks_behind, status.sync_percent) {
                (Some(behind), Some(percent)) => log::info!(
                    "📊 Sync: {} blocks behind ({:.2}%), synced={}",
                    behind,
                    percent,
                    status.synced
                ),
                _ => log::warn!("⚠️ Sync: chain height unavailable, not synced"),
            }
        }
    });

    // Decoded chain events arrive as JSON lines on stdin, one per event
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<RawEvent>(&line) {
            Ok(raw) => {
                if tx.send(raw).await.is_err() {
                    log::error!("❌ Ingestion task gone, stopping reader");
                    break;
                }
            }
            Err(e) => log::warn!("⚠️ Undecodable event payload: {}", e),
        }
    }

    // Close the channel and let ingestion drain whatever is queued
    drop(tx);
    ingestion.await?;
    log::info!("✅ Shutdown complete");
    Ok(())
}

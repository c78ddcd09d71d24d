use chrono::Utc;
use eyre::{eyre, Result};
use flash_loan_detector::rpc::ChainClient;
use flash_loan_detector::{Finding, FlashLoanDetector, TransactionEvent};
use futures_util::{stream, StreamExt};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

use crate::{config::Config, db};

const MIN_RETRY_SECS: u64 = 10;
const MAX_RETRY_SECS: u64 = 120;

/// Walks confirmed blocks in order and runs every transaction through the
/// detector. A block is only considered done once every transaction in it
/// evaluated without a lookup failure; otherwise it is retried next round.
pub async fn run(
    cfg: Config,
    client: ChainClient,
    detector: Arc<FlashLoanDetector>,
    conn: Arc<Mutex<Connection>>,
) -> Result<()> {
    let mut retry_delay = MIN_RETRY_SECS;
    let mut next_block = cfg.start_block;

    info!(
        "Feed started (confirmations = {}, concurrency = {})",
        cfg.confirmations, cfg.max_concurrency
    );

    loop {
        let target_block = match client.latest_block().await {
            Ok(latest) => latest.saturating_sub(cfg.confirmations),
            Err(e) => {
                warn!("RPC failed this round: {:?}", e);
                retry_delay = (retry_delay * 2).min(MAX_RETRY_SECS);
                sleep(Duration::from_secs(retry_delay)).await;
                continue;
            }
        };

        let mut block = *next_block.get_or_insert(target_block);
        let mut failed = false;

        while block <= target_block {
            match process_block(&cfg, &client, &detector, &conn, block).await {
                Ok(count) => {
                    info!("Scanned block {} → {} finding(s)", block, count);
                    block += 1;
                    next_block = Some(block);
                }
                Err(e) => {
                    error!("Block {} failed, will retry: {:?}", block, e);
                    failed = true;
                    break;
                }
            }
        }

        if failed {
            retry_delay = (retry_delay * 2).min(MAX_RETRY_SECS);
            sleep(Duration::from_secs(retry_delay)).await;
        } else {
            retry_delay = MIN_RETRY_SECS;
            sleep(cfg.poll_interval).await;
        }
    }
}

async fn process_block(
    cfg: &Config,
    client: &ChainClient,
    detector: &FlashLoanDetector,
    conn: &Arc<Mutex<Connection>>,
    block_number: u64,
) -> Result<usize> {
    let txs = client
        .block_transactions(block_number)
        .await?
        .ok_or_else(|| eyre!("block {} not available yet", block_number))?;

    debug!("Block {}: evaluating {} transactions", block_number, txs.len());

    // Collected up front so the stream type carries no higher-ranked closure
    // (keeps the spawned feed future `Send`); futures are lazy, so behavior
    // is unchanged.
    let pending: Vec<_> = txs
        .iter()
        .map(|tx| async move { (tx, detector.handle_transaction(tx).await) })
        .collect();
    let results: Vec<_> = stream::iter(pending)
        .buffered(cfg.max_concurrency)
        .collect()
        .await;

    let mut hits: Vec<(&TransactionEvent, Finding)> = Vec::new();
    for (tx, result) in results {
        for finding in result? {
            hits.push((tx, finding));
        }
    }

    if !hits.is_empty() {
        store(conn, block_number, &hits)?;
    }

    Ok(hits.len())
}

fn store(
    conn: &Arc<Mutex<Connection>>,
    block_number: u64,
    hits: &[(&TransactionEvent, Finding)],
) -> Result<()> {
    let mut db = conn
        .lock()
        .map_err(|_| eyre!("database mutex poisoned"))?;
    let detected_at = Utc::now();

    // batch writes
    let tx = db.transaction()?;
    for (event, finding) in hits {
        info!(
            "Finding in block {}: {}",
            block_number,
            serde_json::to_string(finding)?
        );
        db::record_finding(
            &tx,
            &event.hash.to_string(),
            block_number as i64,
            finding,
            detected_at,
        )?;
    }
    tx.commit()?;

    Ok(())
}

mod api;
mod config;
mod db;
mod feed;

use alloy::transports::http::reqwest::Url;
use eyre::WrapErr;
use flash_loan_detector::constants::FLASH_LOAN_EVENT;
use flash_loan_detector::rpc::ChainClient;
use flash_loan_detector::{DetectorConfig, FlashLoanDetector};
use std::sync::{Arc, Mutex};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Flash loan detector starting...");

    let cfg = config::load()?;
    let detector_cfg = DetectorConfig::default();
    info!("  Lending protocol: {}", detector_cfg.lending_protocol);
    info!("  Watching: {}", FLASH_LOAN_EVENT);
    info!("  Monitored protocols: {:?}", detector_cfg.monitored_protocols);
    info!("  Gas threshold: {}", detector_cfg.gas_threshold);
    info!("  Loss threshold (wei): {}", detector_cfg.balance_loss_threshold);

    // Run DB migrations once at startup
    {
        let conn = db::connect(&cfg.db_path)?;
        db::run_migrations(&conn)?;
    }

    let shared_conn = Arc::new(Mutex::new(db::connect(&cfg.db_path)?));

    let rpc_url: Url = cfg
        .rpc_http_url
        .parse()
        .wrap_err_with(|| format!("invalid RPC_HTTP_URL: {}", cfg.rpc_http_url))?;
    let client = ChainClient::connect_http(rpc_url, cfg.rpc_timeout);
    let chain = Arc::new(client.clone());
    let detector = Arc::new(FlashLoanDetector::new(detector_cfg, chain.clone(), chain));

    let api_handle = tokio::spawn({
        let cfg = cfg.clone();
        let conn = Arc::clone(&shared_conn);
        async move { api::serve(cfg, conn).await }
    });

    let feed_handle = tokio::spawn({
        let cfg = cfg.clone();
        let conn = Arc::clone(&shared_conn);
        async move { feed::run(cfg, client, detector, conn).await }
    });

    tokio::select! {
        res = api_handle => match res {
            Ok(Ok(_)) => info!("API exited cleanly"),
            Ok(Err(e)) => error!("API error: {:?}", e),
            Err(e) => error!("API task panicked: {:?}", e),
        },
        res = feed_handle => match res {
            Ok(Ok(_)) => info!("Feed exited cleanly"),
            Ok(Err(e)) => error!("Feed error: {:?}", e),
            Err(e) => error!("Feed task panicked: {:?}", e),
        },
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received, stopping...");
        }
    }

    info!("Flash loan detector stopped.");
    Ok(())
}

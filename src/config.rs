use dotenvy::dotenv;
use eyre::{Result, WrapErr};
use std::{env, str::FromStr, time::Duration};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub rpc_http_url: String,
    pub db_path: String,
    pub confirmations: u64,
    pub start_block: Option<u64>,
    pub port: u16,
    pub poll_interval: Duration,
    pub rpc_timeout: Duration,
    pub max_concurrency: usize,
}

pub fn load() -> Result<Config> {
    dotenv().ok(); // .env is optional

    let cfg = from_lookup(|key| env::var(key).ok())?;
    info!("Loaded config: {:?}", cfg);
    Ok(cfg)
}

/// Builds the config from any key lookup; `load` feeds it the process env.
pub fn from_lookup<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let rpc_http_url = lookup("RPC_HTTP_URL")
        .or_else(|| lookup("ETH_RPC")) // alias support
        .unwrap_or_else(|| "https://eth.llamarpc.com".to_string());

    let db_path = lookup("DATABASE_URL").unwrap_or_else(|| "findings.db".to_string());

    let confirmations = parse_or(&lookup, "CONFIRMATIONS", 2)?;
    let start_block = lookup("START_BLOCK")
        .map(|raw| raw.trim().parse::<u64>())
        .transpose()
        .wrap_err("START_BLOCK must be a block number")?;
    let port = parse_or(&lookup, "PORT", 8080)?;
    let poll_interval = Duration::from_secs(parse_or(&lookup, "POLL_INTERVAL_SECS", 12)?);
    let rpc_timeout = Duration::from_secs(parse_or(&lookup, "RPC_TIMEOUT_SECS", 10)?);
    let max_concurrency = parse_or::<usize, _>(&lookup, "MAX_CONCURRENCY", 8)?.max(1);

    Ok(Config {
        rpc_http_url,
        db_path,
        confirmations,
        start_block,
        port,
        poll_interval,
        rpc_timeout,
        max_concurrency,
    })
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .wrap_err_with(|| format!("invalid value for {key}: {raw}")),
        None => Ok(default),
    }
}

//! # Shard Node
//!
//! Starts one shard node on an in-process network and produces a block
//! every round until Ctrl+C.
//!
//! ## Environment
//!
//! | Variable | Meaning |
//! |---|---|
//! | `SN_NODE_NAME` | Peer id |
//! | `SN_NUM_SHARDS` | Number of regular shards |
//! | `SN_SELF_SHARD` | Shard of this node |
//! | `SN_ROUND_DURATION_MS` | Round length |
//! | `SN_SCR_WAIT_MS` | Wait for missing results while processing |
//! | `SN_BROADCAST_QUEUE` | Outbound queue capacity |
//! | `SN_GENESIS_TIME` | Unix time of round 0 (defaults to now) |
//! | `SN_GENESIS_ACCOUNTS` | `hexaddr=balance` pairs, comma separated |
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::str::FromStr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use node_runtime::{GenesisConfig, NodeConfig, NodeRuntime};
use primitive_types::U256;
use sn_06_fork_detection::SystemRounder;
use sn_07_resolvers::MemoryNetwork;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Parse `name` into `target` if it is set and well formed.
fn override_from_env<T: FromStr>(name: &str, target: &mut T) {
    if let Ok(raw) = std::env::var(name) {
        match raw.parse() {
            Ok(value) => *target = value,
            Err(_) => warn!("Ignoring malformed {}={}", name, raw),
        }
    }
}

/// Load configuration from defaults and the environment.
fn load_config() -> NodeConfig {
    let mut config = NodeConfig::default();

    override_from_env("SN_NODE_NAME", &mut config.node_name);
    override_from_env("SN_NUM_SHARDS", &mut config.sharding.number_of_shards);
    override_from_env("SN_SELF_SHARD", &mut config.sharding.self_shard_id);
    override_from_env("SN_ROUND_DURATION_MS", &mut config.chronology.round_duration_ms);
    override_from_env("SN_SCR_WAIT_MS", &mut config.processing.scr_wait_ms);
    override_from_env("SN_BROADCAST_QUEUE", &mut config.network.broadcast_queue_capacity);

    config.chronology.genesis_unix_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    override_from_env("SN_GENESIS_TIME", &mut config.chronology.genesis_unix_secs);

    config
}

/// Initial balances from `SN_GENESIS_ACCOUNTS`.
fn load_genesis(config: &NodeConfig) -> Result<GenesisConfig> {
    let mut genesis = GenesisConfig {
        timestamp: config.chronology.genesis_unix_secs,
        initial_balances: Vec::new(),
    };

    let Ok(raw) = std::env::var("SN_GENESIS_ACCOUNTS") else {
        return Ok(genesis);
    };
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (address, balance) = entry
            .split_once('=')
            .with_context(|| format!("Genesis account {} is not hexaddr=balance", entry))?;
        let address = hex::decode(address)
            .with_context(|| format!("Genesis address {} is not hex", address))?;
        let balance = U256::from_dec_str(balance)
            .map_err(|e| anyhow::anyhow!("Genesis balance {}: {:?}", balance, e))?;
        genesis.initial_balances.push((address, balance));
    }
    Ok(genesis)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let config = load_config();
    let genesis = load_genesis(&config)?;
    let rounder = Arc::new(SystemRounder::new(
        config.chronology.genesis_unix_secs,
        config.chronology.round_duration(),
    ));

    info!("===========================================");
    info!("  Shard Node v{}", node_runtime::VERSION);
    info!("===========================================");

    let network = MemoryNetwork::new();
    let runtime = NodeRuntime::new(config, genesis, &network, rounder)
        .context("Failed to initialize node")?;
    runtime.start()?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}

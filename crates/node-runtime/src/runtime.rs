//! # Node Runtime
//!
//! Owns the tasks of a running shard node.
//!
//! ## Startup Sequence
//!
//! 1. Build components in dependency order (Level 0 → Level 4)
//! 2. Spawn the broadcast worker draining the outbound queue
//! 3. Spawn the round loop
//!
//! Shutdown flips a watch channel both tasks select on, then waits for
//! them with a timeout.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use parking_lot::Mutex;
use sn_06_fork_detection::Rounder;
use sn_07_resolvers::{run_broadcast_worker, MemoryNetwork, Messenger, OutboundMessage};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::container::{NodeComponents, NodeConfig};
use crate::genesis::GenesisConfig;
use crate::wiring::{run_round_loop, RoundDriver};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// A shard node and its background tasks.
pub struct NodeRuntime {
    components: Arc<NodeComponents>,
    driver: Arc<RoundDriver>,
    outbound: Mutex<Option<mpsc::Receiver<OutboundMessage>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl NodeRuntime {
    /// Build a node attached to `network`.
    pub fn new(
        config: NodeConfig,
        genesis: GenesisConfig,
        network: &Arc<MemoryNetwork>,
        rounder: Arc<dyn Rounder>,
    ) -> Result<Self> {
        info!("Creating shard node runtime");
        let (components, outbound) = NodeComponents::build(config, genesis, network, rounder)?;
        let components = Arc::new(components);
        let driver = Arc::new(RoundDriver::new(Arc::clone(&components)));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            components,
            driver,
            outbound: Mutex::new(Some(outbound)),
            tasks: Mutex::new(Vec::new()),
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Spawn the broadcast worker and the round loop.
    pub fn start(&self) -> Result<()> {
        let Some(outbound) = self.outbound.lock().take() else {
            bail!("Node runtime already started");
        };

        let messenger: Arc<dyn Messenger> = self.components.messenger.clone();
        let mut worker_shutdown = self.shutdown_rx.clone();
        let worker = tokio::spawn(async move {
            tokio::select! {
                _ = run_broadcast_worker(outbound, messenger) => {}
                _ = worker_shutdown.changed() => {
                    info!("[sn-07] Shutdown signal received");
                }
            }
        });

        let rounds = tokio::spawn(run_round_loop(
            Arc::clone(&self.driver),
            self.shutdown_rx.clone(),
        ));

        self.tasks.lock().extend([worker, rounds]);
        info!(
            "Node {} running in shard {}",
            self.components.config.node_name, self.components.config.sharding.self_shard_id
        );
        Ok(())
    }

    /// Stop every task and wait for them to finish.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("Node task failed: {}", e),
                Err(_) => warn!("Node task did not stop within {:?}", SHUTDOWN_TIMEOUT),
            }
        }
        info!("Shutdown complete");
    }

    /// The node's components.
    pub fn components(&self) -> Arc<NodeComponents> {
        Arc::clone(&self.components)
    }

    /// The node's round driver.
    pub fn driver(&self) -> Arc<RoundDriver> {
        Arc::clone(&self.driver)
    }
}

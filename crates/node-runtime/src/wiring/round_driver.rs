//! # Round Driver
//!
//! Produces one block per round for a single-validator shard.
//!
//! ```text
//! create body ──→ create header ──→ sign ──→ revert ledger
//!                                               │
//!       broadcast ←── commit ←── process block ─┘
//! ```
//!
//! The node is the only validator of its shard, so the header is signed
//! locally instead of by a consensus group, then executed through the same
//! path a received block would take.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use shared_types::{Header, ShardId, META_BLOCK_FINALITY, METACHAIN_SHARD_ID};
use sn_05_block_processing::{BlockResult, BroadcastData};
use sn_06_fork_detection::ForkDetector;
use sn_07_resolvers::domain::topics::{shard_topic, TRANSACTIONS_TOPIC, UNSIGNED_TRANSACTIONS_TOPIC};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::container::NodeComponents;

/// Drives block production for one node.
pub struct RoundDriver {
    components: Arc<NodeComponents>,
    last_round: Mutex<Option<u64>>,
}

impl RoundDriver {
    /// Create a driver over built components.
    pub fn new(components: Arc<NodeComponents>) -> Self {
        Self {
            components,
            last_round: Mutex::new(None),
        }
    }

    /// Components the driver works on.
    pub fn components(&self) -> &Arc<NodeComponents> {
        &self.components
    }

    /// Produce, execute, commit and broadcast the block of `round`.
    ///
    /// Returns the committed header. On failure the ledger holds no
    /// uncommitted change.
    pub async fn run_round(&self, round: u64, timestamp: u64) -> BlockResult<Header> {
        let c = &self.components;
        let round_duration = c.config.chronology.round_duration();
        let scr_wait = c.config.processing.scr_wait();
        let build_deadline = Instant::now() + round_duration.saturating_sub(scr_wait);

        let body = c
            .processor
            .create_block_body(round, &|| Instant::now() < build_deadline)?;
        let mut header = match c.processor.create_block_header(&c.chain, &body, round, timestamp) {
            Ok(header) => header,
            Err(err) => {
                c.processor.revert_account_state();
                return Err(err);
            }
        };
        self.sign(&mut header);
        c.processor.revert_account_state();

        let process_deadline = Instant::now() + scr_wait;
        c.processor
            .process_block(&c.chain, &header, &body, || {
                process_deadline.saturating_duration_since(Instant::now())
            })
            .await?;
        c.processor.commit_block(&c.chain, &header, &body)?;

        info!(
            "Produced block nonce {} in round {} with {} txs",
            header.nonce(),
            round,
            body.mini_blocks.iter().map(|mb| mb.tx_hashes.len()).sum::<usize>()
        );

        self.broadcast(&header, &body);
        self.notarize_meta_headers();
        c.fork_detector.reset_probable_highest_nonce_if_needed();
        Ok(header)
    }

    /// Ask peers for own-shard headers between the chain tip and the
    /// highest nonce the fork detector has seen. Returns the number asked.
    pub fn request_missing_headers(&self) -> usize {
        let c = &self.components;
        let next = c
            .chain
            .current_header()
            .map_or(0, |header| header.nonce().saturating_add(1));
        // The fork detector never registers nonce 0, so 0 means nothing seen
        let probable = c.fork_detector.probable_highest_nonce();
        if probable == 0 || probable < next {
            return 0;
        }

        let asked = c.request_handler.request_headers_by_nonce_range(
            c.shard_coordinator.self_id(),
            next..probable.saturating_add(1),
        );
        debug!("Behind by {} headers, requested {}", probable - next + 1, asked);
        asked
    }

    /// Advance the notarized metachain history over pooled meta headers
    /// that reached finality. Returns the last notarized meta nonce.
    pub fn notarize_meta_headers(&self) -> Option<u64> {
        let pool = &self.components.pools.meta_blocks;
        let candidates: Vec<Header> = pool.keys().iter().filter_map(|key| pool.get(key)).collect();
        if candidates.is_empty() {
            return None;
        }

        match self.components.validator.notarize_final_headers(
            METACHAIN_SHARD_ID,
            &candidates,
            META_BLOCK_FINALITY,
        ) {
            Ok(nonce) => Some(nonce),
            Err(err) => {
                warn!("Notarizing metachain headers failed: {}", err);
                None
            }
        }
    }

    /// Run `round` unless it was already handled.
    pub async fn tick(&self, round: i64) -> Option<BlockResult<Header>> {
        let Ok(round) = u64::try_from(round) else {
            debug!("Round {} precedes genesis, waiting", round);
            return None;
        };
        {
            let mut last = self.last_round.lock();
            if last.is_some_and(|last| round <= last) {
                return None;
            }
            *last = Some(round);
        }
        self.request_missing_headers();
        Some(self.run_round(round, unix_now()).await)
    }

    fn sign(&self, header: &mut Header) {
        if let Header::Shard(shard_header) = header {
            shard_header.pub_keys_bitmap = vec![1];
            let mut payload = self.components.config.node_name.as_bytes().to_vec();
            payload.extend_from_slice(&shard_header.rand_seed);
            shard_header.signature = self.components.hasher.compute(&payload);
        }
    }

    fn broadcast(&self, header: &Header, body: &shared_types::Body) {
        let c = &self.components;
        if let Err(err) = c.chain_messenger.broadcast_block(body, header) {
            warn!("Broadcasting block nonce {} failed: {}", header.nonce(), err);
        }
        if let Err(err) = c.chain_messenger.broadcast_header(header) {
            warn!("Broadcasting header for metachain failed: {}", err);
        }

        let data = match c.processor.marshalized_data_to_broadcast(body) {
            Ok(data) => data,
            Err(err) => {
                warn!("Collecting cross-shard data failed: {}", err);
                return;
            }
        };
        if let Err(err) = c.chain_messenger.broadcast_mini_blocks(&data.mini_blocks) {
            warn!("Broadcasting mini-blocks failed: {}", err);
        }
        if let Err(err) = c.chain_messenger.broadcast_transactions(&self.by_topic(&data)) {
            warn!("Broadcasting transactions failed: {}", err);
        }
    }

    fn by_topic(&self, data: &BroadcastData) -> BTreeMap<String, Vec<Vec<u8>>> {
        let coordinator = self.components.shard_coordinator.as_ref();
        let mut topics = BTreeMap::new();
        let sections: [(&str, &BTreeMap<ShardId, Vec<Vec<u8>>>); 2] = [
            (TRANSACTIONS_TOPIC, &data.transactions),
            (UNSIGNED_TRANSACTIONS_TOPIC, &data.results),
        ];
        for (base, items) in sections {
            for (shard_id, buffers) in items {
                if buffers.is_empty() {
                    continue;
                }
                topics.insert(shard_topic(coordinator, base, *shard_id), buffers.clone());
            }
        }
        topics
    }
}

/// Tick the driver once per round until `shutdown` flips.
///
/// Rounds run inline on this task, one at a time.
pub async fn run_round_loop(driver: Arc<RoundDriver>, mut shutdown: watch::Receiver<bool>) {
    let round_duration = driver.components.config.chronology.round_duration();
    let rounder = Arc::clone(&driver.components.rounder);
    let mut interval = tokio::time::interval(round_duration / 4);
    info!("Round loop started ({:?} rounds)", round_duration);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match driver.tick(rounder.index()).await {
                    Some(Ok(_)) | None => {}
                    Some(Err(err)) => warn!("Round failed: {}", err),
                }
            }
            _ = shutdown.changed() => {
                info!("Round loop received shutdown signal");
                break;
            }
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

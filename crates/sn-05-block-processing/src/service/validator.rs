//! # Block Validator and Notarization Tracker
//!
//! Checks a proposed block against the local chain tip and keeps, per
//! shard, the history of headers this node considers notarized.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use shared_types::{
    calculate_hash, BincodeMarshalizer, Body, Hash, Header, Hasher, Marshalizer, ShardId,
    METACHAIN_SHARD_ID,
};
use sn_02_sharding::ShardCoordinator;
use tracing::debug;

use crate::algorithms::{check_header_finality, is_hdr_construction_valid};
use crate::domain::{BlockChain, BlockError, BlockResult};

/// Validator for the local chain plus notarized header bookkeeping.
pub struct BlockValidator<M: Marshalizer = BincodeMarshalizer> {
    hasher: Arc<dyn Hasher>,
    marshalizer: M,
    shard_coordinator: Arc<dyn ShardCoordinator>,
    notarized_hdrs: Mutex<Option<HashMap<ShardId, Vec<Header>>>>,
}

impl<M: Marshalizer> BlockValidator<M> {
    /// Create a validator. Notarized bookkeeping starts uninitialized.
    pub fn new(
        hasher: Arc<dyn Hasher>,
        marshalizer: M,
        shard_coordinator: Arc<dyn ShardCoordinator>,
    ) -> Self {
        Self {
            hasher,
            marshalizer,
            shard_coordinator,
            notarized_hdrs: Mutex::new(None),
        }
    }

    /// Marshal the header and hash the encoding.
    pub fn compute_header_hash(&self, header: &Header) -> BlockResult<Hash> {
        Ok(calculate_hash(&self.marshalizer, self.hasher.as_ref(), header)?)
    }

    /// Check that `header` and `body` may extend `chain`.
    ///
    /// Checks run in order and stop at the first failure: body integrity,
    /// then round, nonce, random seed and previous hash.
    pub fn check_block_validity(
        &self,
        chain: &BlockChain,
        header: Option<&Header>,
        body: Option<&Body>,
    ) -> BlockResult<()> {
        let header = header.ok_or(BlockError::NilHeader)?;
        let body = body.ok_or(BlockError::NilBody)?;
        body.integrity_and_validity()?;

        let Some(current) = chain.current_header() else {
            if header.nonce() != 0 {
                return Err(BlockError::WrongNonceInBlock {
                    expected: 0,
                    got: header.nonce(),
                });
            }
            if header.prev_hash() != chain.genesis_header_hash().as_slice() {
                return Err(BlockError::BlockHashDoesNotMatch);
            }
            return Ok(());
        };

        if header.round() <= current.round() {
            return Err(BlockError::LowerRoundInBlock {
                round: header.round(),
                current_round: current.round(),
            });
        }
        if header.nonce() != current.nonce() + 1 {
            return Err(BlockError::WrongNonceInBlock {
                expected: current.nonce() + 1,
                got: header.nonce(),
            });
        }
        if header.prev_rand_seed() != current.rand_seed() {
            return Err(BlockError::RandSeedMismatch);
        }
        let current_hash = self.compute_header_hash(&current)?;
        if header.prev_hash() != current_hash.as_slice() {
            return Err(BlockError::BlockHashDoesNotMatch);
        }
        Ok(())
    }

    /// Check that `current` directly follows `previous`.
    pub fn is_hdr_construction_valid(&self, current: &Header, previous: &Header) -> BlockResult<()> {
        is_hdr_construction_valid(current, previous, &self.marshalizer, self.hasher.as_ref())
    }

    /// Check that `finality` candidates chain on top of `header`.
    pub fn check_header_finality(
        &self,
        header: &Header,
        sorted_candidates: &[Header],
        finality: u64,
    ) -> BlockResult<()> {
        check_header_finality(
            header,
            sorted_candidates,
            finality,
            &self.marshalizer,
            self.hasher.as_ref(),
        )
    }

    /// Seed the notarized history with one header per shard plus the
    /// metachain. Shard entries must be shard headers and the metachain
    /// entry a meta header.
    pub fn set_last_notarized_headers(&self, headers: &HashMap<ShardId, Header>) -> BlockResult<()> {
        if headers.is_empty() {
            return Err(BlockError::NotarizedHdrsSliceIsNil);
        }

        let mut notarized = HashMap::new();
        for shard_id in self.tracked_shards() {
            let header = headers.get(&shard_id).ok_or(BlockError::WrongTypeAssertion)?;
            check_header_type(shard_id, header)?;
            notarized.insert(shard_id, vec![header.clone()]);
        }

        *self.notarized_hdrs.lock() = Some(notarized);
        Ok(())
    }

    /// Record headers processed for `shard_id` and make the highest one the
    /// shard's last notarized header. Each header must be of the shard's
    /// variant and chain from the previous one. Nothing is recorded on error.
    pub fn save_last_notarized_header(&self, shard_id: ShardId, processed: &[Header]) -> BlockResult<()> {
        let mut guard = self.notarized_hdrs.lock();
        let notarized = guard.as_mut().ok_or(BlockError::NotarizedHdrsSliceIsNil)?;

        if shard_id >= self.shard_coordinator.number_of_shards() && shard_id != METACHAIN_SHARD_ID {
            return Err(BlockError::ShardIdMissmatch(shard_id));
        }

        let mut last = notarized
            .get(&shard_id)
            .and_then(|history| history.last())
            .cloned()
            .ok_or(BlockError::WrongTypeAssertion)?;
        check_header_type(shard_id, &last)?;

        let mut sorted: Vec<&Header> = processed.iter().collect();
        sorted.sort_by_key(|header| header.nonce());

        for header in sorted {
            check_header_type(shard_id, header)?;
            if header.nonce() <= last.nonce() {
                continue;
            }
            self.is_hdr_construction_valid(header, &last)?;
            last = header.clone();
        }

        debug!(
            "[sn-05] Last notarized header for shard {} is now nonce {}",
            shard_id,
            last.nonce()
        );
        notarized.entry(shard_id).or_default().push(last);
        Ok(())
    }

    /// Notarize the candidates of `shard_id` that extend its last notarized
    /// header and already have `finality` linked successors among the
    /// candidates. Stops at the first header that is not final yet.
    ///
    /// Returns the nonce of the shard's last notarized header afterwards.
    pub fn notarize_final_headers(
        &self,
        shard_id: ShardId,
        candidates: &[Header],
        finality: u64,
    ) -> BlockResult<u64> {
        let mut tip = self
            .last_notarized_hdr_for_shard(shard_id)
            .ok_or(BlockError::NotarizedHdrsSliceIsNil)?;

        let mut sorted: Vec<Header> = candidates
            .iter()
            .filter(|header| header.nonce() > tip.nonce())
            .cloned()
            .collect();
        sorted.sort_by_key(|header| header.nonce());

        let mut finals = Vec::new();
        for (index, header) in sorted.iter().enumerate() {
            if self.is_hdr_construction_valid(header, &tip).is_err() {
                continue;
            }
            if self
                .check_header_finality(header, &sorted[index + 1..], finality)
                .is_err()
            {
                break;
            }
            finals.push(header.clone());
            tip = header.clone();
        }

        if !finals.is_empty() {
            self.save_last_notarized_header(shard_id, &finals)?;
        }
        Ok(tip.nonce())
    }

    /// Newest notarized header for a shard.
    pub fn last_notarized_hdr_for_shard(&self, shard_id: ShardId) -> Option<Header> {
        self.notarized_hdrs
            .lock()
            .as_ref()
            .and_then(|notarized| notarized.get(&shard_id))
            .and_then(|history| history.last())
            .cloned()
    }

    /// Notarized history for a shard, oldest first.
    pub fn notarized_hdrs(&self, shard_id: ShardId) -> Vec<Header> {
        self.notarized_hdrs
            .lock()
            .as_ref()
            .and_then(|notarized| notarized.get(&shard_id))
            .cloned()
            .unwrap_or_default()
    }

    /// Drop the newest notarized entry of every shard, keeping the seed.
    pub fn remove_last_notarized(&self) {
        if let Some(notarized) = self.notarized_hdrs.lock().as_mut() {
            for history in notarized.values_mut() {
                if history.len() > 1 {
                    history.pop();
                }
            }
        }
    }

    /// Rewind every shard's history to its seed entry.
    pub fn restore_last_notarized(&self) {
        if let Some(notarized) = self.notarized_hdrs.lock().as_mut() {
            for history in notarized.values_mut() {
                history.truncate(1);
            }
        }
    }

    fn tracked_shards(&self) -> impl Iterator<Item = ShardId> {
        (0..self.shard_coordinator.number_of_shards()).chain(std::iter::once(METACHAIN_SHARD_ID))
    }
}

fn check_header_type(shard_id: ShardId, header: &Header) -> BlockResult<()> {
    let expected_meta = shard_id == METACHAIN_SHARD_ID;
    if header.is_meta() != expected_meta {
        return Err(BlockError::WrongTypeAssertion);
    }
    Ok(())
}

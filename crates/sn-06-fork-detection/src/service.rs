//! # Basic Fork Detector
//!
//! Registry of headers per nonce, fed by the block processor and the
//! interceptors. It tracks two checkpoints:
//!
//! - the **last checkpoint**, the most recently processed header
//! - the **final checkpoint**, the newest processed header followed by
//!   `fork_block_finality` consecutive processed headers, or the newest final
//!   header reported with a processed one
//!
//! Validity checks run against the final checkpoint. Pruning of headers that
//! cannot be reached in the rounds elapsed runs against whichever checkpoint
//! is higher.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use shared_types::{Hash, Header, HeaderState, FORK_BLOCK_FINALITY, MAX_ROUNDS_TO_WAIT};
use tracing::{debug, info};

use crate::domain::{Checkpoint, ForkCheck, ForkDetectorError, ForkResult, HeaderInfo};
use crate::ports::{ForkDetector, Rounder};

/// Fork detector tuning.
#[derive(Debug, Clone)]
pub struct ForkDetectorConfig {
    /// Consecutive processed headers needed to make a checkpoint final.
    pub fork_block_finality: u64,
    /// Quiet rounds after which the probable highest nonce falls back.
    pub max_rounds_to_wait: i64,
}

impl Default for ForkDetectorConfig {
    fn default() -> Self {
        Self {
            fork_block_finality: FORK_BLOCK_FINALITY,
            max_rounds_to_wait: MAX_ROUNDS_TO_WAIT,
        }
    }
}

struct DetectorState {
    headers: BTreeMap<u64, Vec<HeaderInfo>>,
    checkpoints: Vec<Checkpoint>,
    final_checkpoint: Checkpoint,
    probable_highest_nonce: u64,
    last_block_round: i64,
}

impl DetectorState {
    fn new() -> Self {
        Self {
            headers: BTreeMap::new(),
            checkpoints: vec![Checkpoint::default()],
            final_checkpoint: Checkpoint::default(),
            probable_highest_nonce: 0,
            last_block_round: 0,
        }
    }

    fn last_checkpoint(&self) -> Checkpoint {
        self.checkpoints.last().copied().unwrap_or_default()
    }

    /// The higher of the last and final checkpoints.
    fn checkpoint(&self) -> Checkpoint {
        let last = self.last_checkpoint();
        if self.final_checkpoint.nonce > last.nonce {
            self.final_checkpoint
        } else {
            last
        }
    }

    fn raise_final_checkpoint(&mut self, candidate: Checkpoint) {
        if candidate.nonce > self.final_checkpoint.nonce {
            debug!(
                "[sn-06] Final checkpoint moved to nonce {} round {}",
                candidate.nonce, candidate.round
            );
            self.final_checkpoint = candidate;
        }
    }

    fn add_final_headers(&mut self, final_headers: &[Header], final_hashes: &[Hash]) {
        for (header, hash) in final_headers.iter().zip(final_hashes) {
            self.raise_final_checkpoint(Checkpoint::new(header.nonce(), header.round()));
            self.append(HeaderInfo::new(header.clone(), hash.clone(), HeaderState::Notarized));
        }
    }

    fn add_checkpoint(&mut self, checkpoint: Checkpoint, finality: u64) {
        while self
            .checkpoints
            .last()
            .is_some_and(|last| last.nonce >= checkpoint.nonce)
        {
            self.checkpoints.pop();
        }
        self.checkpoints.push(checkpoint);

        if let [.., previous, current] = self.checkpoints.as_slice() {
            if previous.is_followed_by(current, finality) {
                let previous = *previous;
                self.raise_final_checkpoint(previous);
            }
        }

        let final_nonce = self.final_checkpoint.nonce;
        self.checkpoints.retain(|cp| cp.nonce >= final_nonce);
    }

    fn append(&mut self, info: HeaderInfo) {
        let entries = self.headers.entry(info.nonce()).or_default();
        match entries.iter_mut().find(|stored| stored.hash == info.hash) {
            Some(stored) => {
                stored.state = info.state;
                stored.header = info.header;
            }
            None => entries.push(info),
        }
    }

    fn remove_past_headers(&mut self) {
        let final_nonce = self.final_checkpoint.nonce;
        self.headers.retain(|nonce, _| *nonce >= final_nonce);
    }

    /// Drop received headers whose nonce is not reachable from the checkpoint
    /// in the rounds between them. Entries at the checkpoint nonce are fork
    /// candidates and are left to `check_fork`.
    fn remove_invalid_headers(&mut self) {
        let checkpoint = self.checkpoint();
        self.headers.retain(|nonce, entries| {
            if *nonce != checkpoint.nonce {
                entries.retain(|info| {
                    if info.state != HeaderState::Received {
                        return true;
                    }
                    let round_diff = i128::from(info.round()) - i128::from(checkpoint.round);
                    let nonce_diff = i128::from(info.nonce()) - i128::from(checkpoint.nonce);
                    round_diff >= nonce_diff
                });
            }
            !entries.is_empty()
        });
    }

    fn compute_probable_highest_nonce(&self) -> u64 {
        self.headers
            .values()
            .flatten()
            .filter(|info| info.state != HeaderState::Proposed)
            .map(HeaderInfo::nonce)
            .max()
            .unwrap_or(0)
    }
}

/// Fork detector over an in-memory header registry.
pub struct BasicForkDetector {
    config: ForkDetectorConfig,
    rounder: Arc<dyn Rounder>,
    state: Mutex<DetectorState>,
}

impl BasicForkDetector {
    /// Create a detector with the default configuration.
    pub fn new(rounder: Arc<dyn Rounder>) -> Self {
        Self::with_config(rounder, ForkDetectorConfig::default())
    }

    /// Create a detector with a custom configuration.
    pub fn with_config(rounder: Arc<dyn Rounder>, config: ForkDetectorConfig) -> Self {
        Self {
            config,
            rounder,
            state: Mutex::new(DetectorState::new()),
        }
    }

    /// Check a header against the final checkpoint and the round clock.
    pub fn check_block_validity(&self, header: &Header, state: HeaderState) -> ForkResult<()> {
        let current_round = self.rounder.index();
        let inner = self.state.lock();
        self.validate(&inner, header, state, current_round)
    }

    fn validate(
        &self,
        inner: &DetectorState,
        header: &Header,
        state: HeaderState,
        current_round: i64,
    ) -> ForkResult<()> {
        match state {
            HeaderState::Proposed => {
                if header.rand_seed().is_empty() || header.prev_rand_seed().is_empty() {
                    return Err(ForkDetectorError::RandomSeedNotValid);
                }
            }
            _ => {
                if !header.is_signed() {
                    return Err(ForkDetectorError::BlockIsNotSigned);
                }
            }
        }

        let checkpoint = inner.final_checkpoint;
        let (nonce, round) = (header.nonce(), header.round());

        if round <= checkpoint.round {
            return Err(ForkDetectorError::LowerRoundInBlock {
                round,
                checkpoint_round: checkpoint.round,
            });
        }
        // A negative clock means genesis has not started; nothing is reachable
        let next_round = u64::try_from(current_round.saturating_add(1)).unwrap_or(0);
        if round > next_round {
            return Err(ForkDetectorError::HigherRoundInBlock {
                round,
                current_round,
            });
        }
        let late =
            round.saturating_add(self.config.fork_block_finality) < next_round.saturating_sub(1);
        if state == HeaderState::Received && late {
            return Err(ForkDetectorError::LowerRoundInBlock {
                round,
                checkpoint_round: checkpoint.round,
            });
        }
        if nonce <= checkpoint.nonce {
            return Err(ForkDetectorError::LowerNonceInBlock {
                nonce,
                checkpoint_nonce: checkpoint.nonce,
            });
        }
        let max_nonce = checkpoint.nonce.saturating_add(round - checkpoint.round);
        if nonce > max_nonce {
            return Err(ForkDetectorError::HigherNonceInBlock { nonce, max_nonce });
        }
        Ok(())
    }

    /// Entries registered at `nonce`.
    pub fn get_headers(&self, nonce: u64) -> Option<Vec<HeaderInfo>> {
        self.state.lock().headers.get(&nonce).cloned()
    }

    /// Drop every nonce below the final checkpoint.
    pub fn remove_past_headers(&self) {
        self.state.lock().remove_past_headers();
    }

    /// Drop headers that cannot follow the current checkpoint.
    pub fn remove_invalid_headers(&self) {
        self.state.lock().remove_invalid_headers();
    }

    /// Highest non-proposed nonce in the registry.
    pub fn compute_probable_highest_nonce(&self) -> u64 {
        self.state.lock().compute_probable_highest_nonce()
    }

    /// The stored probable highest nonce raised by the non-proposed `infos`.
    pub fn probable_highest_nonce_of(&self, infos: &[HeaderInfo]) -> u64 {
        let stored = self.state.lock().probable_highest_nonce;
        infos
            .iter()
            .filter(|info| info.state != HeaderState::Proposed)
            .map(HeaderInfo::nonce)
            .fold(stored, u64::max)
    }

    /// Force the final checkpoint.
    pub fn set_final_checkpoint(&self, nonce: u64, round: u64) {
        self.state.lock().final_checkpoint = Checkpoint::new(nonce, round);
    }

    /// Nonce of the current checkpoint.
    pub fn last_checkpoint_nonce(&self) -> u64 {
        self.state.lock().checkpoint().nonce
    }

    /// Round of the current checkpoint.
    pub fn last_checkpoint_round(&self) -> u64 {
        self.state.lock().checkpoint().round
    }
}

impl ForkDetector for BasicForkDetector {
    fn add_header(
        &self,
        header: &Header,
        hash: &[u8],
        state: HeaderState,
        final_headers: &[Header],
        final_hashes: &[Hash],
    ) -> ForkResult<()> {
        if hash.is_empty() {
            return Err(ForkDetectorError::NilHash);
        }

        let current_round = self.rounder.index();
        let mut inner = self.state.lock();
        self.validate(&inner, header, state, current_round)?;

        if state == HeaderState::Processed {
            inner.add_final_headers(final_headers, final_hashes);
            inner.add_checkpoint(
                Checkpoint::new(header.nonce(), header.round()),
                self.config.fork_block_finality,
            );
            inner.remove_past_headers();
            inner.remove_invalid_headers();
        }

        inner.append(HeaderInfo::new(header.clone(), hash.to_vec(), state));
        inner.probable_highest_nonce = inner.compute_probable_highest_nonce();
        inner.last_block_round = current_round;

        debug!(
            "[sn-06] Added {:?} header nonce {} round {}, probable highest nonce {}",
            state,
            header.nonce(),
            header.round(),
            inner.probable_highest_nonce
        );
        Ok(())
    }

    fn remove_headers(&self, nonce: u64, hash: &[u8]) {
        let mut inner = self.state.lock();

        inner.checkpoints.retain(|cp| cp.nonce != nonce);
        if inner.checkpoints.is_empty() {
            inner.checkpoints.push(Checkpoint::default());
        }

        if let Some(entries) = inner.headers.get_mut(&nonce) {
            entries.retain(|info| info.hash != hash);
            if entries.is_empty() {
                inner.headers.remove(&nonce);
            }
        }
    }

    fn check_fork(&self) -> ForkCheck {
        let mut inner = self.state.lock();
        let mut fork = ForkCheck::none();

        for (nonce, entries) in inner.headers.iter_mut() {
            if entries.len() < 2 {
                continue;
            }
            let Some(local) = entries.iter().find(|info| info.is_local()).cloned() else {
                continue;
            };

            let candidate = entries
                .iter()
                .filter(|info| info.state == HeaderState::Received)
                .min_by_key(|info| info.round());

            match candidate {
                Some(candidate) if candidate.round() < local.round() => {
                    if !fork.detected {
                        fork = ForkCheck::at(*nonce, candidate.hash.clone());
                    }
                }
                _ => *entries = vec![local],
            }
        }

        if fork.detected {
            info!("[sn-06] Fork detected at nonce {}", fork.nonce);
        }
        fork
    }

    fn get_highest_final_block_nonce(&self) -> u64 {
        self.state.lock().final_checkpoint.nonce
    }

    fn probable_highest_nonce(&self) -> u64 {
        self.state.lock().probable_highest_nonce
    }

    fn reset_probable_highest_nonce_if_needed(&self) {
        let current_round = self.rounder.index();
        let mut inner = self.state.lock();

        if current_round.saturating_sub(inner.last_block_round) <= self.config.max_rounds_to_wait {
            return;
        }
        let checkpoint_nonce = inner.checkpoint().nonce;
        if inner.probable_highest_nonce > checkpoint_nonce {
            debug!(
                "[sn-06] No header for {} rounds, probable highest nonce reset to {}",
                current_round - inner.last_block_round,
                checkpoint_nonce
            );
            inner.probable_highest_nonce = checkpoint_nonce;
        }
    }
}

//! # Header Chaining Rules
//!
//! Linkage checks between consecutive headers of another chain (shard
//! headers seen by the metachain, meta headers seen by a shard) and the
//! finality rule built on top of them.

use shared_types::{calculate_hash, Header, Hasher, Marshalizer};

use crate::domain::{BlockError, BlockResult};

/// Check that `current` directly follows `previous`.
///
/// Two genesis headers may follow each other only while the first carries
/// no state.
pub fn is_hdr_construction_valid<M: Marshalizer>(
    current: &Header,
    previous: &Header,
    marshalizer: &M,
    hasher: &dyn Hasher,
) -> BlockResult<()> {
    if current.nonce() == 0 {
        if previous.nonce() != 0 {
            return Err(BlockError::WrongNonceInOtherChainBlock);
        }
        if !previous.root_hash().is_empty() {
            return Err(BlockError::RootStateMissmatch);
        }
        return Ok(());
    }

    if previous.round() >= current.round() {
        return Err(BlockError::LowerRoundInOtherChainBlock);
    }
    if previous.nonce().checked_add(1) != Some(current.nonce()) {
        return Err(BlockError::WrongNonceInOtherChainBlock);
    }
    let previous_hash = calculate_hash(marshalizer, hasher, previous)?;
    if current.prev_hash() != previous_hash.as_slice() {
        return Err(BlockError::HashDoesNotMatchInOtherChainBlock);
    }
    if current.prev_rand_seed() != previous.rand_seed() {
        return Err(BlockError::RandSeedMismatch);
    }
    Ok(())
}

/// Check that at least `finality` headers from `sorted_candidates` chain on
/// top of `header`. Candidates must be sorted by nonce; candidates that do
/// not link are skipped.
pub fn check_header_finality<M: Marshalizer>(
    header: &Header,
    sorted_candidates: &[Header],
    finality: u64,
    marshalizer: &M,
    hasher: &dyn Hasher,
) -> BlockResult<()> {
    let mut last_verified = header;
    let mut verified = 0;

    for candidate in sorted_candidates {
        if verified >= finality {
            break;
        }
        if last_verified.nonce().checked_add(1) != Some(candidate.nonce()) {
            continue;
        }
        if is_hdr_construction_valid(candidate, last_verified, marshalizer, hasher).is_err() {
            continue;
        }
        last_verified = candidate;
        verified += 1;
    }

    if verified < finality {
        return Err(BlockError::HeaderNotFinal {
            nonce: header.nonce(),
        });
    }
    Ok(())
}

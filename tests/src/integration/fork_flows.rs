//! # Fork Flows
//!
//! Chain extension checks by the block validator and competing headers
//! resolved by the fork detector.
//!
//! A fork is reported when a received header at a committed nonce was
//! proposed in an earlier round than the local one.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use shared_types::{BincodeMarshalizer, Body, Hasher, Header, HeaderState, Keccak256Hasher, ShardHeader};
    use sn_02_sharding::MultiShardCoordinator;
    use sn_05_block_processing::{BlockChain, BlockError, BlockValidator};
    use sn_06_fork_detection::{BasicForkDetector, ForkDetector, MockRounder};

    fn header(nonce: u64, round: u64, seed: u8) -> Header {
        Header::Shard(ShardHeader {
            nonce,
            round,
            prev_rand_seed: vec![seed.wrapping_sub(1)],
            rand_seed: vec![seed],
            signature: vec![0xAA],
            pub_keys_bitmap: vec![1],
            ..Default::default()
        })
    }

    fn with_prev_hash(header: Header, prev_hash: Vec<u8>) -> Header {
        match header {
            Header::Shard(mut inner) => {
                inner.prev_hash = prev_hash;
                Header::Shard(inner)
            }
            other => other,
        }
    }

    // =========================================================================
    // FORK DETECTION
    // =========================================================================

    #[test]
    fn test_earlier_received_header_signals_fork() {
        let detector = BasicForkDetector::new(Arc::new(MockRounder::new(5)));

        detector
            .add_header(&header(1, 5, 1), &[0x01], HeaderState::Processed, &[], &[])
            .unwrap();
        detector
            .add_header(&header(1, 4, 2), &[0x02], HeaderState::Received, &[], &[])
            .unwrap();

        let fork = detector.check_fork();
        assert!(fork.detected);
        assert_eq!(fork.nonce, 1);
        assert_eq!(fork.hash, Some(vec![0x02]));

        // The node rolls back its header and adopts the candidate
        detector.remove_headers(1, &[0x01]);
        assert!(!detector.check_fork().detected);
    }

    #[test]
    fn test_later_received_header_is_discarded() {
        let detector = BasicForkDetector::new(Arc::new(MockRounder::new(5)));

        detector
            .add_header(&header(1, 4, 1), &[0x01], HeaderState::Processed, &[], &[])
            .unwrap();
        detector
            .add_header(&header(1, 5, 2), &[0x02], HeaderState::Received, &[], &[])
            .unwrap();

        assert!(!detector.check_fork().detected);
        let kept = detector.get_headers(1).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].hash, vec![0x01]);
    }

    #[test]
    fn test_late_and_unsigned_headers_are_rejected() {
        let rounder = Arc::new(MockRounder::new(10));
        let detector = BasicForkDetector::new(rounder.clone());

        assert!(detector
            .add_header(&header(1, 4, 1), &[0x01], HeaderState::Received, &[], &[])
            .is_err());

        let unsigned = match header(1, 10, 1) {
            Header::Shard(mut inner) => {
                inner.pub_keys_bitmap.clear();
                Header::Shard(inner)
            }
            other => other,
        };
        assert!(detector
            .add_header(&unsigned, &[0x02], HeaderState::Received, &[], &[])
            .is_err());
        assert!(detector.get_headers(1).is_none());
    }

    #[test]
    fn test_probable_highest_nonce_follows_received_headers() {
        let rounder = Arc::new(MockRounder::new(3));
        let detector = BasicForkDetector::new(rounder.clone());

        detector
            .add_header(&header(3, 3, 1), &[0x03], HeaderState::Received, &[], &[])
            .unwrap();
        assert_eq!(detector.probable_highest_nonce(), 3);
        assert_eq!(detector.get_highest_final_block_nonce(), 0);
    }

    // =========================================================================
    // CHAIN EXTENSION
    // =========================================================================

    fn validator() -> BlockValidator {
        let coordinator = MultiShardCoordinator::new(1, 0).unwrap();
        BlockValidator::new(Arc::new(Keccak256Hasher), BincodeMarshalizer, Arc::new(coordinator))
    }

    #[test]
    fn test_validator_walks_chain_from_genesis() {
        let validator = validator();
        let genesis = header(0, 0, 1);
        let genesis_hash = validator.compute_header_hash(&genesis).unwrap();
        let chain = BlockChain::with_genesis(genesis, genesis_hash.clone());
        let body = Body::default();

        let first = with_prev_hash(header(0, 1, 2), genesis_hash);
        validator
            .check_block_validity(&chain, Some(&first), Some(&body))
            .unwrap();
        let first_hash = validator.compute_header_hash(&first).unwrap();
        chain.set_current(first.clone(), first_hash.clone(), body.clone());

        let second = with_prev_hash(header(1, 2, 3), first_hash.clone());
        validator
            .check_block_validity(&chain, Some(&second), Some(&body))
            .unwrap();
        validator.is_hdr_construction_valid(&second, &first).unwrap();

        let mut wrong_seed = header(1, 2, 9);
        wrong_seed = with_prev_hash(wrong_seed, first_hash);
        assert!(matches!(
            validator.check_block_validity(&chain, Some(&wrong_seed), Some(&body)),
            Err(BlockError::RandSeedMismatch)
        ));
    }

    #[test]
    fn test_validator_rejects_stale_round_and_foreign_parent() {
        let validator = validator();
        let chain = BlockChain::with_genesis(header(0, 0, 1), Keccak256Hasher.compute(b"genesis"));
        let body = Body::default();

        let orphan = with_prev_hash(header(0, 1, 2), vec![0xFF; 32]);
        assert!(matches!(
            validator.check_block_validity(&chain, Some(&orphan), Some(&body)),
            Err(BlockError::BlockHashDoesNotMatch)
        ));

        let first = with_prev_hash(header(0, 3, 2), chain.genesis_header_hash());
        let first_hash = validator.compute_header_hash(&first).unwrap();
        chain.set_current(first, first_hash.clone(), body.clone());

        let stale = with_prev_hash(header(1, 3, 3), first_hash);
        assert!(matches!(
            validator.check_block_validity(&chain, Some(&stale), Some(&body)),
            Err(BlockError::LowerRoundInBlock { .. })
        ));
        assert!(matches!(
            validator.check_block_validity(&chain, None, Some(&body)),
            Err(BlockError::NilHeader)
        ));
    }
}

//! # Sharded Node Core Benchmarks
//!
//! Hot paths on every block:
//!
//! | Crate | Path | Per block |
//! |-------|------|-----------|
//! | sn-02 Sharding | address to shard mapping | once per transaction |
//! | sn-07 Resolvers | size-bounded packing | once per response |
//! | sn-05 Block Processing | header hashing | once per header seen |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use shared_types::{BincodeMarshalizer, Header, Keccak256Hasher, MiniBlockHeader, ShardHeader};
use sn_02_sharding::{compute_masks, map_address_to_shard, MultiShardCoordinator};
use sn_05_block_processing::BlockValidator;
use sn_07_resolvers::SizeDataPacker;
use std::sync::Arc;

// ============================================================================
// SN-02: Shard Mapping
// ============================================================================

fn bench_shard_mapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("sn-02-shard-mapping");
    let mut rng = rand::thread_rng();
    let addresses: Vec<[u8; 32]> = (0..1_000).map(|_| rng.gen()).collect();

    for shards in [2u32, 5, 16] {
        let masks = compute_masks(shards);
        group.throughput(Throughput::Elements(addresses.len() as u64));
        group.bench_with_input(BenchmarkId::new("map_1000", shards), &shards, |b, &shards| {
            b.iter(|| {
                addresses
                    .iter()
                    .map(|address| map_address_to_shard(black_box(address), shards, masks))
                    .sum::<u32>()
            })
        });
    }

    group.finish();
}

// ============================================================================
// SN-07: Data Packing
// ============================================================================

fn bench_data_packing(c: &mut Criterion) {
    let mut group = c.benchmark_group("sn-07-data-packing");
    let packer = SizeDataPacker::new(BincodeMarshalizer);
    let mut rng = rand::thread_rng();

    for count in [10usize, 100, 1_000] {
        let items: Vec<Vec<u8>> = (0..count)
            .map(|_| (0..rng.gen_range(100..400)).map(|_| rng.gen()).collect())
            .collect();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("pack_64k", count), &items, |b, items| {
            b.iter(|| black_box(packer.pack_data_in_chunks(items, 64 * 1024).map(|c| c.len())))
        });
    }

    group.finish();
}

// ============================================================================
// SN-05: Header Hashing
// ============================================================================

fn bench_header_hashing(c: &mut Criterion) {
    let mut group = c.benchmark_group("sn-05-header-hashing");
    let coordinator = MultiShardCoordinator::new(2, 0).expect("valid layout");
    let validator = BlockValidator::new(Arc::new(Keccak256Hasher), BincodeMarshalizer, Arc::new(coordinator));

    for mini_blocks in [0usize, 4, 32] {
        let header = Header::Shard(ShardHeader {
            nonce: 42,
            round: 43,
            prev_hash: vec![1; 32],
            rand_seed: vec![2; 32],
            root_hash: vec![3; 32],
            mini_block_headers: (0..mini_blocks)
                .map(|i| MiniBlockHeader {
                    hash: vec![i as u8; 32],
                    tx_count: 100,
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        });

        group.bench_with_input(BenchmarkId::new("compute_hash", mini_blocks), &header, |b, header| {
            b.iter(|| black_box(validator.compute_header_hash(header).map(|h| h.len())))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_shard_mapping,
    bench_data_packing,
    bench_header_hashing
);
criterion_main!(benches);

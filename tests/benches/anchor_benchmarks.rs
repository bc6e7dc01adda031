//! # LedgerAnchor Benchmarks
//!
//! Performance checks for the hashing core:
//!
//! | Operation | Claim | Target |
//! |-----------|-------|--------|
//! | Leaf hashing | O(1) per record | < 10us |
//! | Tree build | O(n) | < 50ms at 8k leaves |
//! | Proof extraction | O(log n) array walk | < 10us |
//! | Verification fold | O(log n) hashes | < 10us |

use anchor_merkle::{leaf_hash, verify_inclusion, MerkleTree};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use shared_types::{Amount, Hash, NaiveDate, OwnerId, TransactionRecord};

fn random_leaves(count: usize) -> Vec<Hash> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| rng.gen::<[u8; 32]>()).collect()
}

fn bench_leaf_hashing(c: &mut Criterion) {
    let record = TransactionRecord::new(
        OwnerId::new(),
        Amount::from_minor_units(-1_234_500),
        NaiveDate::from_ymd_opt(2025, 2, 14).unwrap(),
        "Corner Grocery Downtown Branch",
        "groceries",
    );

    c.bench_function("leaf_hash_single_record", |b| {
        b.iter(|| black_box(leaf_hash(black_box(&record))))
    });
}

fn bench_tree_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("merkle_tree_build");

    for size in [16usize, 128, 1024, 8192] {
        let leaves = random_leaves(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &leaves, |b, leaves| {
            b.iter(|| black_box(MerkleTree::build(black_box(leaves)).unwrap()))
        });
    }
    group.finish();
}

fn bench_proof_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("merkle_proof_path");

    for size in [128usize, 8192] {
        let leaves = random_leaves(size);
        let tree = MerkleTree::build(&leaves).unwrap();
        let middle = size / 2;
        group.bench_with_input(BenchmarkId::from_parameter(size), &tree, |b, tree| {
            b.iter(|| black_box(tree.proof_path(black_box(middle)).unwrap()))
        });
    }
    group.finish();
}

fn bench_verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("merkle_verify_inclusion");

    for size in [128usize, 8192] {
        let leaves = random_leaves(size);
        let tree = MerkleTree::build(&leaves).unwrap();
        let root = tree.root();
        let middle = size / 2;
        let path = tree.proof_path(middle).unwrap();
        let leaf = leaves[middle];

        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &(leaf, path, root),
            |b, (leaf, path, root)| b.iter(|| black_box(verify_inclusion(leaf, path, root))),
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_leaf_hashing,
    bench_tree_build,
    bench_proof_extraction,
    bench_verification
);
criterion_main!(benches);

//! Performance benchmarks for fswalk

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use fswalk::test_utils::TestTree;
use fswalk::{AsyncWalk, Walk, WalkConfig, get_hash, get_size};

/// Build a tree with `width` files per directory, nested `depth` deep.
fn build_tree(width: usize, depth: usize) -> TestTree {
    let tree = TestTree::new();
    let mut prefix = String::new();
    for level in 0..depth {
        for index in 0..width {
            tree.add_file(
                &format!("{prefix}file_{level}_{index}.txt"),
                "some file content for benchmarking",
            );
        }
        prefix.push_str(&format!("level_{level}/"));
    }
    tree
}

fn bench_walk(c: &mut Criterion) {
    let tree = build_tree(20, 5);

    c.bench_function("walk_sync_100_files", |b| {
        b.iter(|| {
            let config = WalkConfig::new();
            let count = Walk::new(tree.path(), &config)
                .unwrap()
                .filter_map(|e| e.ok())
                .count();
            black_box(count)
        })
    });

    c.bench_function("walk_sync_depth_1", |b| {
        b.iter(|| {
            let config = WalkConfig {
                depth: Some(1),
                ..WalkConfig::new()
            };
            let count = Walk::new(tree.path(), &config)
                .unwrap()
                .filter_map(|e| e.ok())
                .count();
            black_box(count)
        })
    });

    let runtime = tokio::runtime::Runtime::new().unwrap();
    c.bench_function("walk_async_100_files", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let config = WalkConfig::new();
                let entries = AsyncWalk::new(tree.path(), &config)
                    .await
                    .unwrap()
                    .collect_entries()
                    .await
                    .unwrap();
                black_box(entries.len())
            })
        })
    });
}

fn bench_hash(c: &mut Criterion) {
    let tree = build_tree(10, 3);

    c.bench_function("hash_directory", |b| {
        b.iter(|| black_box(get_hash(tree.path()).unwrap()))
    });

    let big = TestTree::new();
    let payload = "x".repeat(1024 * 1024);
    let big_file = big.add_file("big.bin", &payload);
    c.bench_function("hash_1mb_file", |b| {
        b.iter(|| black_box(get_hash(&big_file).unwrap()))
    });
}

fn bench_size(c: &mut Criterion) {
    let tree = build_tree(20, 4);

    c.bench_function("size_directory", |b| {
        b.iter(|| black_box(get_size(tree.path()).unwrap()))
    });
}

criterion_group!(benches, bench_walk, bench_hash, bench_size);
criterion_main!(benches);

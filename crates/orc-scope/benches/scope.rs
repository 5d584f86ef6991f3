//! Benchmarks for the hot paths exercised on every gated tool call:
//! glob compilation/matching and content hashing.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use orc_scope::{compute_content_hash, is_in_scope, CompiledGlob};

fn bench_glob_compile_and_match(c: &mut Criterion) {
    c.bench_function("compile_and_match_double_star", |b| {
        b.iter(|| {
            let glob = CompiledGlob::compile("src/core/hooks/**").unwrap();
            black_box(glob.is_match("src/core/hooks/deep/nested/module.rs"))
        })
    });
}

fn bench_is_in_scope(c: &mut Criterion) {
    let patterns = vec![
        "src/core/hooks/**".to_string(),
        "src/api/**".to_string(),
        "docs/**".to_string(),
        "tests/**".to_string(),
    ];
    c.bench_function("is_in_scope_four_patterns", |b| {
        b.iter(|| black_box(is_in_scope("src/api/weather/client.ts", &patterns)))
    });
}

fn bench_content_hash(c: &mut Criterion) {
    let bytes = vec![0u8; 64 * 1024];
    c.bench_function("compute_content_hash_64kb", |b| {
        b.iter(|| black_box(compute_content_hash(&bytes)))
    });
}

criterion_group!(benches, bench_glob_compile_and_match, bench_is_in_scope, bench_content_hash);
criterion_main!(benches);

use contextly::embeddings::chunking::{ChunkingConfig, chunk_text, truncate_to_trailing_bytes};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn synthetic_document(words: usize) -> String {
    (0..words)
        .map(|i| format!("word{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let document = synthetic_document(20_000);
    let config = ChunkingConfig::default();

    c.bench_function("chunking", |b| {
        b.iter(|| chunk_text(black_box(&document), black_box(&config)))
    });

    c.bench_function("truncation", |b| {
        b.iter(|| truncate_to_trailing_bytes(black_box(&document), black_box(36_000)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

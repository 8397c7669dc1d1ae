//! Benchmark suite for lexis-algo
//!
//! Run with: cargo bench

use criterion::{criterion_group, criterion_main, Criterion};
use lexis_algo::gamification::GamificationEngine;
use lexis_algo::{generate_questions, rng_from_seed, VocabularyEntry};

fn library(n: i64) -> Vec<VocabularyEntry> {
    (1..=n)
        .map(|i| {
            VocabularyEntry::new(i, format!("term{i}"), format!("meaning {i}"))
                .with_example(format!("A sentence using term{i} twice: Term{i}."))
        })
        .collect()
}

fn bench_generate_questions(c: &mut Criterion) {
    let words = library(500);
    let mut rng = rng_from_seed(Some(1));
    c.bench_function("generate_questions/500", |b| {
        b.iter(|| generate_questions(&words, &mut rng))
    });
}

fn bench_check_achievements(c: &mut Criterion) {
    let mut engine = GamificationEngine::new();
    c.bench_function("GamificationEngine::check_achievements", |b| {
        b.iter(|| engine.check_achievements(chrono::Utc::now()))
    });
}

criterion_group!(benches, bench_generate_questions, bench_check_achievements);
criterion_main!(benches);

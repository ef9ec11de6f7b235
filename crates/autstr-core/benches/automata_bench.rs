//! # Automata Benchmarks
//!
//! Performance benchmarks for autstr-core presentation building, term
//! compilation and enumeration.
//!
//! Run with: `cargo bench -p autstr-core`

use autstr_core::{Arithmetic, Limits, Term, integer_arithmetic, natural_arithmetic};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_presentation_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("presentation_build");
    group.sample_size(10);

    group.bench_function("naturals", |b| {
        b.iter(|| black_box(natural_arithmetic(Limits::default()).expect("naturals")));
    });
    group.bench_function("integers", |b| {
        b.iter(|| black_box(integer_arithmetic(Limits::default()).expect("integers")));
    });

    group.finish();
}

fn bench_scaled_comparison(c: &mut Criterion) {
    let arithmetic = Arithmetic::integers(Limits::default()).expect("integers");
    let mut group = c.benchmark_group("scaled_comparison");
    group.sample_size(10);

    for k in [3i64, 17, 255, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(k), k, |b, &k| {
            b.iter(|| {
                let r = arithmetic
                    .lt(&(Term::var("x") * k), &Term::var("y"))
                    .expect("relation");
                black_box(r)
            });
        });
    }

    group.finish();
}

fn bench_enumeration(c: &mut Criterion) {
    let arithmetic = Arithmetic::integers(Limits::default()).expect("integers");
    let powers = arithmetic
        .weakly_divides(&Term::var("x"), &Term::var("x"))
        .expect("powers of two");
    let mut group = c.benchmark_group("enumeration");

    for count in [10usize, 40, 128].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let tuples = powers.tuples().expect("enumeration");
            b.iter(|| black_box(tuples.iter().take(count).count()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_presentation_build,
    bench_scaled_comparison,
    bench_enumeration
);
criterion_main!(benches);

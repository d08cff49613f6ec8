//! Benchmarks for registry resolution, document generation and diffing.

use binsbom::diff::DiffEngine;
use binsbom::generate::{GeneratorConfig, OutputFormat, SbomGenerator};
use binsbom::model::{Component, Registry};
use binsbom::parsers::parse_bom_str;
use chrono::{TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

/// `n` libraries in a chain, each also needing a library outside the set.
fn synthetic_registry(n: usize) -> Registry {
    let mut registry = Registry::new();
    let refs: Vec<_> = (0..n)
        .map(|i| {
            let component = Component::new(format!("lib{i}.so.1"))
                .with_version(format!("1.{i}.0"))
                .with_checksum(format!("{i:064x}"));
            registry
                .register_component(component)
                .expect("synthetic component registers")
        })
        .collect();
    for (i, from) in refs.iter().enumerate() {
        if i + 1 < n {
            registry
                .add_dependency_by_name(from, &format!("lib{}.so.1", i + 1))
                .expect("source is registered");
        }
        registry
            .add_dependency_by_name(from, "libc.so.6")
            .expect("source is registered");
    }
    registry
}

fn config() -> GeneratorConfig {
    GeneratorConfig::default()
        .with_timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
}

fn benchmark_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_edges");
    for size in [100, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || synthetic_registry(size),
                |mut registry| black_box(registry.resolve_edges()),
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn benchmark_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    for format in OutputFormat::all() {
        group.bench_with_input(
            BenchmarkId::new(format.to_string(), 1_000),
            &format,
            |b, &format| {
                b.iter_batched(
                    || synthetic_registry(1_000),
                    |registry| black_box(SbomGenerator::generate(registry, config(), format)),
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }
    group.finish();
}

fn benchmark_diff(c: &mut Criterion) {
    let render = |n| {
        SbomGenerator::generate(synthetic_registry(n), config(), OutputFormat::default())
            .expect("synthetic registry generates")
    };
    let old = parse_bom_str(&render(1_000)).expect("generated document parses");
    let new = parse_bom_str(&render(900)).expect("generated document parses");
    let engine = DiffEngine::new();

    c.bench_function("diff_1000_vs_900", |b| {
        b.iter(|| black_box(engine.diff(&old, &new)));
    });
}

criterion_group!(benches, benchmark_resolve, benchmark_generate, benchmark_diff);
criterion_main!(benches);

//! Benchmarks for indispensability tables.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_arp::meter::MeterModel;

/// Bar lengths from common to unusual
const METERS: &[u32] = &[4, 7, 12, 15];

pub fn bench_recompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("meter/recompute");

    for &beats in METERS {
        // Fresh model every time so the cache never hits
        group.bench_with_input(BenchmarkId::new("cold", beats), &beats, |b, &beats| {
            b.iter(|| MeterModel::new(black_box(&[beats])))
        });

        // Cached meter: a pointer swap
        let mut model = MeterModel::new(&[beats]).unwrap();
        model.prewarm(&[3]).unwrap();
        group.bench_with_input(BenchmarkId::new("cached", beats), &beats, |b, &beats| {
            b.iter(|| {
                model.recompute(black_box(&[3])).unwrap();
                model.recompute(black_box(&[beats])).unwrap();
            })
        });
    }

    group.finish();
}

pub fn bench_pulse_weight(c: &mut Criterion) {
    let mut group = c.benchmark_group("meter/pulse_weight");

    // One bar of 7/8 stepped in triplets
    let positions: Vec<f64> = (0..21).map(|i| i as f64 / 3.0).collect();
    let mut model = MeterModel::new(&[7]).unwrap();
    group.bench_function("bar_7_triplets", |b| {
        b.iter(|| {
            for &position in &positions {
                black_box(model.pulse_weight(black_box(position)).unwrap());
            }
        })
    });

    group.finish();
}

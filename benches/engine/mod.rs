//! Benchmarks for block processing.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use saavy_arp::io::host::ConstantTempo;
use saavy_arp::io::midi::MidiMessage;
use saavy_arp::sequencing::TimeSignature;
use saavy_arp::{ArpConfig, ArpEngine, PatternMode};

use crate::BLOCK_SIZES;

pub fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/process");
    let host = ConstantTempo::new(140.0, 48_000.0, TimeSignature::SEVEN_EIGHT);
    let chord = [
        MidiMessage::note_on(0, 0, 60, 100),
        MidiMessage::note_on(0, 0, 63, 100),
        MidiMessage::note_on(0, 0, 67, 100),
    ];

    for &size in BLOCK_SIZES {
        let config = ArpConfig::default()
            .with_division(4)
            .with_octaves(2, 1)
            .with_mode(PatternMode::UpDownInclusive)
            .with_probability(0.5, 1.0);
        let mut engine = ArpEngine::with_rng(config, StdRng::seed_from_u64(1));
        engine.prewarm([TimeSignature::SEVEN_EIGHT]).unwrap();

        let mut out = Vec::with_capacity(16);
        engine.process(&host.block(0, size as u32, true), &host, &chord, &mut out);

        let mut position = size as i64;
        group.bench_with_input(BenchmarkId::new("held_chord", size), &size, |b, &size| {
            b.iter(|| {
                out.clear();
                let block = host.block(position, size as u32, true);
                engine.process(black_box(&block), &host, &[], &mut out);
                position += size as i64;
                black_box(&out);
            })
        });
    }

    group.finish();
}

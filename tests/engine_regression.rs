use rand::rngs::StdRng;
use rand::SeedableRng;
use saavy_arp::io::host::ConstantTempo;
use saavy_arp::io::midi::{MidiEvent, MidiMessage};
use saavy_arp::sequencing::TimeSignature;
use saavy_arp::{ArpConfig, ArpEngine, PatternMode};

const SAMPLE_RATE: f64 = 48_000.0;
const BPM: f64 = 120.0;
const SAMPLES_PER_BEAT: i64 = 24_000;

/// A note-on as (absolute sample, pitch, velocity)
type Hit = (i64, u8, u8);

struct Session {
    engine: ArpEngine<StdRng>,
    host: ConstantTempo,
    position: i64,
}

impl Session {
    fn new(config: ArpConfig, time_signature: TimeSignature) -> Self {
        Self::with_host(config, ConstantTempo::new(BPM, SAMPLE_RATE, time_signature))
    }

    fn with_host(config: ArpConfig, host: ConstantTempo) -> Self {
        Self {
            engine: ArpEngine::with_rng(config, StdRng::seed_from_u64(2024)),
            host,
            position: 0,
        }
    }

    /// Render until `end` in blocks of `frames`, feeding `input` to the first block
    fn run_until(&mut self, end: i64, frames: u32, input: &[MidiMessage]) -> Vec<(i64, MidiMessage)> {
        let mut output = Vec::new();
        let mut pending = input;
        while self.position < end {
            let frames = frames.min((end - self.position) as u32);
            let block = self.host.block(self.position, frames, true);
            let mut out = Vec::new();
            self.engine.process(&block, &self.host, pending, &mut out);
            pending = &[];
            output.extend(out.into_iter().map(|m| (self.position + m.offset as i64, m)));
            self.position += frames as i64;
        }
        output
    }
}

fn hits(output: &[(i64, MidiMessage)]) -> Vec<Hit> {
    output
        .iter()
        .filter_map(|&(sample, message)| match message.event() {
            Some(MidiEvent::NoteOn { key, velocity, .. }) => Some((sample, key, velocity)),
            _ => None,
        })
        .collect()
}

fn velocities(output: &[(i64, MidiMessage)]) -> Vec<u8> {
    hits(output).into_iter().map(|(_, _, velocity)| velocity).collect()
}

fn chord(pitches: &[u8]) -> Vec<MidiMessage> {
    pitches
        .iter()
        .map(|&pitch| MidiMessage::note_on(0, 0, pitch, 100))
        .collect()
}

#[test]
fn quarter_notes_follow_barlow_four_four() {
    let config = ArpConfig::default().with_velocity(40, 100);
    let mut session = Session::new(config, TimeSignature::FOUR_FOUR);
    let output = session.run_until(4 * SAMPLES_PER_BEAT, 512, &chord(&[60]));

    let hits = hits(&output);
    assert_eq!(hits.len(), 4);
    for (k, &(sample, pitch, _)) in hits.iter().enumerate() {
        assert!((sample - k as i64 * SAMPLES_PER_BEAT).abs() <= 1, "note {k} at {sample}");
        assert_eq!(pitch, 60);
    }
    // Strongest downbeat, weakest second beat, then beat 3 over beat 4
    assert_eq!(velocities(&output), vec![100, 40, 80, 60]);
}

#[test]
fn velocity_is_monotonic_in_weight() {
    let config = ArpConfig::default().with_velocity(1, 127);
    let mut session = Session::new(config, TimeSignature::FOUR_FOUR);
    let output = session.run_until(4 * SAMPLES_PER_BEAT, 256, &chord(&[60]));

    let v = velocities(&output);
    // 4/4 ranks: 3 0 2 1
    assert!(v[0] > v[2] && v[2] > v[3] && v[3] > v[1]);
}

#[test]
fn eighths_stick_to_the_finer_grid() {
    let config = ArpConfig::default().with_division(2).with_velocity(0, 70);
    let mut session = Session::new(config, TimeSignature::FOUR_FOUR);
    let output = session.run_until(4 * SAMPLES_PER_BEAT, 512, &chord(&[60]));

    // Ranks 7 0 4 2 6 1 5 3 out of 7; the zero weight is a rest
    assert_eq!(velocities(&output), vec![70, 40, 20, 60, 10, 50, 30]);
    let samples: Vec<i64> = hits(&output).iter().map(|&(s, _, _)| s).collect();
    assert_eq!(samples[1], 24_000);
}

#[test]
fn compound_meter_groups_in_threes() {
    let config = ArpConfig::default().with_velocity(10, 110);
    let mut session = Session::new(config, TimeSignature::SIX_EIGHT);
    // One 6/8 bar is three quarters
    let output = session.run_until(3 * SAMPLES_PER_BEAT, 512, &chord(&[60]));

    // [2, 3] ranks: 5 0 2 4 1 3
    assert_eq!(velocities(&output), vec![110, 10, 50, 90, 30, 70]);
    let samples: Vec<i64> = hits(&output).iter().map(|&(s, _, _)| s).collect();
    assert_eq!(samples, vec![0, 12_000, 24_000, 36_000, 48_000, 60_000]);
}

#[test]
fn block_size_does_not_move_notes() {
    let config = ArpConfig::default()
        .with_division(3)
        .with_mode(PatternMode::UpDownInclusive)
        .with_octaves(1, 0);
    let input = chord(&[60, 64, 67]);

    let render = |frames: u32| {
        let mut session = Session::new(config, TimeSignature::FOUR_FOUR);
        hits(&session.run_until(8 * SAMPLES_PER_BEAT, frames, &input))
    };

    let reference = render(512);
    assert_eq!(reference.len(), 24);
    assert_eq!(render(64), reference);
    assert_eq!(render(1000), reference);
    assert_eq!(render(37), reference);
}

#[test]
fn octave_range_and_order_mode() {
    let config = ArpConfig::default()
        .with_mode(PatternMode::Order)
        .with_octaves(1, 0)
        .with_division(2);
    let mut session = Session::new(config, TimeSignature::FOUR_FOUR);
    let output = session.run_until(3 * SAMPLES_PER_BEAT, 512, &chord(&[67, 60, 64]));

    let pitches: Vec<u8> = hits(&output).iter().map(|&(_, p, _)| p).collect();
    // Weight 0 still sounds at the default minimum velocity
    assert_eq!(pitches, vec![67, 60, 64, 79, 72, 76]);
}

#[test]
fn latched_chord_keeps_playing_until_replaced() {
    let config = ArpConfig::default().with_latch(true);
    let mut session = Session::new(config, TimeSignature::FOUR_FOUR);
    session.run_until(SAMPLES_PER_BEAT / 2, 512, &chord(&[60, 64]));

    let release = [MidiMessage::note_off(0, 0, 60), MidiMessage::note_off(0, 0, 64)];
    let output = session.run_until(4 * SAMPLES_PER_BEAT, 512, &release);
    let pitches: Vec<u8> = hits(&output).iter().map(|&(_, p, _)| p).collect();
    assert_eq!(pitches, vec![64, 60, 64]);

    // A fresh chord drops the latched notes
    let output = session.run_until(6 * SAMPLES_PER_BEAT, 512, &chord(&[72]));
    let pitches: Vec<u8> = hits(&output).iter().map(|&(_, p, _)| p).collect();
    assert_eq!(pitches, vec![72, 72]);
    assert_eq!(session.engine.pattern().notes(), &[72]);
}

#[test]
fn meter_change_swaps_prewarmed_tables() {
    let host = ConstantTempo::new(BPM, SAMPLE_RATE, TimeSignature::FOUR_FOUR)
        .with_meter_change(2, TimeSignature::SEVEN_EIGHT);
    let config = ArpConfig::default().with_velocity(0, 120);
    let mut session = Session::with_host(config, host.clone());
    session.engine.prewarm(host.time_signatures()).unwrap();
    assert!(session.engine.meter().is_cached(&[7]));

    // Bar 1: four quarters; bar 2: seven eighths (3.5 quarters)
    let end = 4 * SAMPLES_PER_BEAT + 7 * SAMPLES_PER_BEAT / 2;
    let output = session.run_until(end, 512, &chord(&[60]));

    // 4/4 ranks 3 0 2 1, then 7 ranks 6 0 4 2 5 1 3; zero weights rest
    assert_eq!(velocities(&output), vec![120, 80, 40, 120, 80, 40, 100, 20, 60]);

    let samples: Vec<i64> = hits(&output).iter().map(|&(s, _, _)| s).collect();
    let second_bar: Vec<i64> = samples[3..].to_vec();
    assert_eq!(second_bar, vec![96_000, 120_000, 132_000, 144_000, 156_000, 168_000]);
    assert_eq!(session.engine.meter().levels(), &[7]);
}

#[test]
fn transport_restart_silences_monitored_notes() {
    let mut session = Session::new(ArpConfig::default(), TimeSignature::FOUR_FOUR);

    // Monitor while stopped
    let block = session.host.block(0, 512, false);
    let mut out = Vec::new();
    let input = chord(&[60]);
    session.engine.process(&block, &session.host, &input, &mut out);
    assert_eq!(out, input);

    let output = session.run_until(512, 512, &[]);
    assert!(matches!(
        output[0].1.event(),
        Some(MidiEvent::ControlChange { controller: 123, value: 0, .. })
    ));
    assert_eq!(hits(&output), vec![(0, 60, 100)]);
}

//! Host-side timing: the per-block transport snapshot, the tempo map query
//! the engine needs, and a constant-tempo host used by tests, benches and the
//! terminal app.

use crate::sequencing::TimeSignature;

/// Tick resolution of one meter beat in BBT positions
pub const DEFAULT_TICKS_PER_BEAT: u32 = 1920;

/// Transport state for one processing block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockContext {
    /// Transport is rolling
    pub rolling: bool,
    /// Quarter-note beat at the first sample of the block
    pub beat_start: f64,
    /// Quarter-note beat one past the last sample of the block
    pub beat_end: f64,
    /// Absolute position of the first sample
    pub sample_start: i64,
    /// Absolute position one past the last sample
    pub sample_end: i64,
    /// Time signature denominator at the block start
    pub denominator: u32,
}

impl BlockContext {
    /// Number of samples in the block
    pub fn frames(&self) -> u32 {
        (self.sample_end - self.sample_start).clamp(0, u32::MAX as i64) as u32
    }
}

/// Bar/beat/tick position in the meter that is active at that position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bbt {
    /// 1-based bar
    pub bars: u32,
    /// 1-based meter beat within the bar
    pub beats: u32,
    pub ticks: u32,
    /// Meter numerator at this position
    pub divisions_per_bar: u32,
}

impl Bbt {
    /// Position within the bar in meter beats (0-based, fractional)
    pub fn beat_in_bar(&self, ticks_per_beat: u32) -> f64 {
        self.beats.saturating_sub(1) as f64 + self.ticks as f64 / ticks_per_beat.max(1) as f64
    }
}

/// Meter and position lookup provided by the host
pub trait TempoMap {
    fn ticks_per_beat(&self) -> u32 {
        DEFAULT_TICKS_PER_BEAT
    }

    /// Position of quarter-note beat `beat`, counted from the session start
    fn bbt_at(&self, beat: f64) -> Bbt;
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Section {
    /// 0-based first bar
    bar: u32,
    /// Quarter-note beat the section starts at
    beat: f64,
    time_signature: TimeSignature,
}

/// Fixed tempo host with optional time signature changes at bar lines
#[derive(Debug, Clone)]
pub struct ConstantTempo {
    bpm: f64,
    sample_rate: f64,
    sections: Vec<Section>,
}

impl ConstantTempo {
    pub fn new(bpm: f64, sample_rate: f64, time_signature: TimeSignature) -> Self {
        Self {
            bpm: bpm.max(1.0),
            sample_rate: sample_rate.max(1.0),
            sections: vec![Section {
                bar: 0,
                beat: 0.0,
                time_signature,
            }],
        }
    }

    /// Switch to `time_signature` from 1-based `bar` on.
    ///
    /// Changes must be added in ascending bar order; a change at or before
    /// the last one replaces (same bar) or is ignored (earlier bar).
    pub fn with_meter_change(mut self, bar: u32, time_signature: TimeSignature) -> Self {
        let bar = bar.saturating_sub(1);
        let Some(last) = self.sections.last_mut() else {
            return self;
        };

        if bar == last.bar {
            last.time_signature = time_signature;
        } else if bar > last.bar {
            let beat = last.beat + (bar - last.bar) as f64 * last.time_signature.bar_quarters();
            self.sections.push(Section {
                bar,
                beat,
                time_signature,
            });
        }
        self
    }

    fn section_at(&self, beat: f64) -> &Section {
        self.sections
            .iter()
            .rev()
            .find(|section| section.beat <= beat)
            .unwrap_or(&self.sections[0])
    }

    pub fn time_signature_at(&self, beat: f64) -> TimeSignature {
        self.section_at(beat).time_signature
    }

    /// Every time signature of the session, in order
    pub fn time_signatures(&self) -> impl Iterator<Item = TimeSignature> + '_ {
        self.sections.iter().map(|section| section.time_signature)
    }

    /// Samples per quarter note
    pub fn samples_per_beat(&self) -> f64 {
        self.sample_rate * 60.0 / self.bpm
    }

    pub fn beat_at_sample(&self, sample: i64) -> f64 {
        sample as f64 / self.samples_per_beat()
    }

    /// Transport snapshot for `frames` samples starting at `sample_start`
    pub fn block(&self, sample_start: i64, frames: u32, rolling: bool) -> BlockContext {
        let sample_end = sample_start + frames as i64;
        let beat_start = self.beat_at_sample(sample_start);
        BlockContext {
            rolling,
            beat_start,
            beat_end: self.beat_at_sample(sample_end),
            sample_start,
            sample_end,
            denominator: self.time_signature_at(beat_start).denominator as u32,
        }
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}

impl TempoMap for ConstantTempo {
    fn bbt_at(&self, beat: f64) -> Bbt {
        let beat = beat.max(0.0);
        let section = self.section_at(beat);
        let ts = section.time_signature;
        let per_bar = ts.numerator.max(1) as u32;
        let ticks_per_beat = self.ticks_per_beat();

        let divisions = (beat - section.beat) * ts.beats_per_quarter();
        let total_ticks = (divisions * ticks_per_beat as f64).round() as u64;

        let whole_beats = total_ticks / ticks_per_beat as u64;
        let ticks = (total_ticks % ticks_per_beat as u64) as u32;
        let bar = whole_beats / per_bar as u64;
        let beats = (whole_beats % per_bar as u64) as u32;

        Bbt {
            bars: section.bar + bar as u32 + 1,
            beats: beats + 1,
            ticks,
            divisions_per_bar: per_bar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_context() {
        let host = ConstantTempo::new(120.0, 48_000.0, TimeSignature::FOUR_FOUR);
        assert_eq!(host.samples_per_beat(), 24_000.0);

        let block = host.block(12_000, 12_000, true);
        assert_eq!(block.beat_start, 0.5);
        assert_eq!(block.beat_end, 1.0);
        assert_eq!(block.frames(), 12_000);
        assert_eq!(block.denominator, 4);
    }

    #[test]
    fn test_bbt_four_four() {
        let host = ConstantTempo::new(120.0, 48_000.0, TimeSignature::FOUR_FOUR);
        let bbt = host.bbt_at(5.5);
        assert_eq!(
            bbt,
            Bbt {
                bars: 2,
                beats: 2,
                ticks: 960,
                divisions_per_bar: 4
            }
        );
        assert_eq!(bbt.beat_in_bar(DEFAULT_TICKS_PER_BEAT), 1.5);
    }

    #[test]
    fn test_bbt_six_eight() {
        let host = ConstantTempo::new(120.0, 48_000.0, TimeSignature::SIX_EIGHT);
        // One quarter = two eighths; bar = 3 quarters
        let bbt = host.bbt_at(4.0);
        assert_eq!((bbt.bars, bbt.beats, bbt.ticks), (2, 3, 0));
        assert_eq!(bbt.divisions_per_bar, 6);
    }

    #[test]
    fn test_ticks_rounding_carries_into_next_beat() {
        let host = ConstantTempo::new(120.0, 48_000.0, TimeSignature::FOUR_FOUR);
        let bbt = host.bbt_at(3.999_999_9);
        assert_eq!((bbt.bars, bbt.beats, bbt.ticks), (2, 1, 0));
    }

    #[test]
    fn test_meter_change() {
        let host = ConstantTempo::new(120.0, 48_000.0, TimeSignature::FOUR_FOUR)
            .with_meter_change(3, TimeSignature::THREE_FOUR);

        // Bars 1-2 are 4/4 (8 quarters), bar 3 starts at beat 8
        assert_eq!(host.bbt_at(7.0).divisions_per_bar, 4);
        let bbt = host.bbt_at(8.0);
        assert_eq!((bbt.bars, bbt.beats, bbt.divisions_per_bar), (3, 1, 3));
        let bbt = host.bbt_at(11.0);
        assert_eq!((bbt.bars, bbt.beats), (4, 1));

        let signatures: Vec<_> = host.time_signatures().collect();
        assert_eq!(signatures, vec![TimeSignature::FOUR_FOUR, TimeSignature::THREE_FOUR]);
    }

    #[test]
    fn test_meter_change_denominator() {
        let host = ConstantTempo::new(60.0, 1_000.0, TimeSignature::FOUR_FOUR)
            .with_meter_change(2, TimeSignature::SEVEN_EIGHT);
        assert_eq!(host.block(3_000, 100, true).denominator, 4);
        assert_eq!(host.block(4_000, 100, true).denominator, 8);
    }
}

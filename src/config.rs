#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::meter::MAX_SUBDIVISION;
use crate::sequencing::{OctaveRange, PatternMode};

/// Largest octave range added above or below the chord
pub const MAX_OCTAVES: u8 = 5;

/// Largest whole-pattern transposition in octaves (either direction)
pub const MAX_OCTAVE_SHIFT: i8 = 2;

/// Control inputs of the arpeggiator. Any field may change between blocks.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArpConfig {
    /// Pulses per meter beat, 1..=7
    pub division: u32,
    pub octaves_up: u8,
    pub octaves_down: u8,
    pub octave_shift: i8,
    pub mode: PatternMode,
    pub min_velocity: u8,
    pub max_velocity: u8,
    /// Pulses with a normalized weight outside `min_weight..=max_weight` are
    /// skipped
    pub min_weight: f32,
    pub max_weight: f32,
    /// Firing chance of the weakest pulse
    pub min_probability: f32,
    /// Firing chance of the strongest pulse
    pub max_probability: f32,
    /// Fraction of the pulse a note stays on; 1 holds until the next pulse
    pub gate: f32,
    pub latch: bool,
    pub bypass: bool,
}

impl Default for ArpConfig {
    fn default() -> Self {
        Self {
            division: 1,
            octaves_up: 0,
            octaves_down: 0,
            octave_shift: 0,
            mode: PatternMode::Up,
            min_velocity: 60,
            max_velocity: 100,
            min_weight: 0.0,
            max_weight: 1.0,
            min_probability: 1.0,
            max_probability: 1.0,
            gate: 1.0,
            latch: false,
            bypass: false,
        }
    }
}

fn unit(value: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn ordered<T: PartialOrd>(a: T, b: T) -> (T, T) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

impl ArpConfig {
    pub fn with_division(mut self, division: u32) -> Self {
        self.division = division;
        self
    }

    pub fn with_octaves(mut self, up: u8, down: u8) -> Self {
        self.octaves_up = up;
        self.octaves_down = down;
        self
    }

    pub fn with_octave_shift(mut self, shift: i8) -> Self {
        self.octave_shift = shift;
        self
    }

    pub fn with_mode(mut self, mode: PatternMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_velocity(mut self, min: u8, max: u8) -> Self {
        self.min_velocity = min;
        self.max_velocity = max;
        self
    }

    pub fn with_weight(mut self, min: f32, max: f32) -> Self {
        self.min_weight = min;
        self.max_weight = max;
        self
    }

    pub fn with_probability(mut self, min: f32, max: f32) -> Self {
        self.min_probability = min;
        self.max_probability = max;
        self
    }

    pub fn with_gate(mut self, gate: f32) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_latch(mut self, latch: bool) -> Self {
        self.latch = latch;
        self
    }

    pub fn with_bypass(mut self, bypass: bool) -> Self {
        self.bypass = bypass;
        self
    }

    /// Copy with every field clamped into its valid range and min/max pairs
    /// put in order. NaN falls back to the default.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let (min_velocity, max_velocity) =
            ordered(self.min_velocity.min(127), self.max_velocity.min(127));
        let (min_weight, max_weight) = ordered(
            unit(self.min_weight, defaults.min_weight),
            unit(self.max_weight, defaults.max_weight),
        );
        let (min_probability, max_probability) = ordered(
            unit(self.min_probability, defaults.min_probability),
            unit(self.max_probability, defaults.max_probability),
        );

        Self {
            division: self.division.clamp(1, MAX_SUBDIVISION),
            octaves_up: self.octaves_up.min(MAX_OCTAVES),
            octaves_down: self.octaves_down.min(MAX_OCTAVES),
            octave_shift: self.octave_shift.clamp(-MAX_OCTAVE_SHIFT, MAX_OCTAVE_SHIFT),
            mode: self.mode,
            min_velocity,
            max_velocity,
            min_weight,
            max_weight,
            min_probability,
            max_probability,
            gate: unit(self.gate, defaults.gate),
            latch: self.latch,
            bypass: self.bypass,
        }
    }

    /// Octave expansion of the pattern
    pub fn octaves(&self) -> OctaveRange {
        OctaveRange::new(self.octaves_up, self.octaves_down).with_shift(self.octave_shift)
    }

    /// Whether switching from `other` to `self` needs a pattern rebuild
    pub fn reshapes_pattern(&self, other: &ArpConfig) -> bool {
        self.mode != other.mode || self.octaves() != other.octaves()
    }
}

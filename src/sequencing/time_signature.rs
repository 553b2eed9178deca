/// Time signature as reported by a host tempo map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSignature {
    /// Divisions per bar (numerator)
    pub numerator: u8,
    /// Note value of one division (denominator: 4 = quarter, 8 = eighth)
    pub denominator: u8,
}

impl TimeSignature {
    /// Standard 4/4 time
    pub const FOUR_FOUR: TimeSignature = TimeSignature::new(4, 4);

    /// 3/4 time (waltz)
    pub const THREE_FOUR: TimeSignature = TimeSignature::new(3, 4);

    /// 5/4 time
    pub const FIVE_FOUR: TimeSignature = TimeSignature::new(5, 4);

    /// 6/8 time (compound duple)
    pub const SIX_EIGHT: TimeSignature = TimeSignature::new(6, 8);

    /// 7/8 time
    pub const SEVEN_EIGHT: TimeSignature = TimeSignature::new(7, 8);

    /// 2/2 time (cut time)
    pub const TWO_TWO: TimeSignature = TimeSignature::new(2, 2);

    pub const fn new(numerator: u8, denominator: u8) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Levels handed to the meter model: one level holding the bar's divisions.
    ///
    /// The primes of the numerator carry the grouping, so 6/8 stratifies as
    /// [2, 3] and 3/4 as [3].
    pub fn meter_levels(&self) -> [u32; 1] {
        [self.numerator as u32]
    }

    /// Divisions (meter beats) per quarter note
    pub fn beats_per_quarter(&self) -> f64 {
        self.denominator as f64 / 4.0
    }

    /// Length of one bar in quarter notes
    pub fn bar_quarters(&self) -> f64 {
        self.numerator as f64 / self.beats_per_quarter()
    }

}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::FOUR_FOUR
    }
}

impl std::fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

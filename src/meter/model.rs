//! Meter model - cached indispensability tables and pulse weights.
//!
//! A meter is a list of levels (typically just the bar's divisions, `[4]` for
//! 4/4). For every subdivision `q` in `1..=max_subdivision` the model keeps the
//! indispensability table of the levels' primes followed by the primes of `q`,
//! so a pulse at any rational position up to that resolution can be ranked by a
//! table lookup.

use std::collections::HashMap;
use std::sync::Arc;

use super::factor::{factor, factor_into};
use super::indispensability::indispensability;

/// Finest subdivision of a beat that pulse positions are matched against.
pub const MAX_SUBDIVISION: u32 = 7;

/// Largest meter (product of all levels) the model will build tables for.
pub const MAX_BEATS: u32 = 4096;

/// Errors raised by [`MeterModel`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeterError {
    /// Meter without any levels
    #[error("meter has no levels")]
    Empty,
    /// A level of zero was given
    #[error("meter level {index} is zero, levels must be positive")]
    ZeroLevel { index: usize },
    /// Product of all levels exceeds [`MAX_BEATS`]
    #[error("meter of {beats} beats exceeds the limit of {MAX_BEATS}")]
    TooLarge { beats: u64 },
    /// Pulse position is negative, NaN or infinite
    #[error("pulse position {0} is not a finite non-negative number")]
    InvalidPulse(f64),
}

/// Weight of one pulse together with the resolution it was matched at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseWeight {
    /// Indispensability rank, `0..resolution`
    pub weight: u32,
    /// Number of pulses in one cycle at the matched subdivision
    pub resolution: u32,
}

impl PulseWeight {
    /// Weight scaled into `0.0..=1.0`.
    ///
    /// A single-pulse meter has nothing to rank against and counts as fully
    /// accented.
    pub fn normalized(&self) -> f32 {
        if self.resolution <= 1 {
            return 1.0;
        }
        self.weight as f32 / (self.resolution - 1) as f32
    }
}

/// Best rational approximation `pulse / subdivision` of a phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Subdivision {
    pub pulse: u32,
    pub subdivision: u32,
    /// Absolute distance between the phase and `pulse / subdivision`
    pub error: f64,
}

/// Find the subdivision `q <= max_subdivision` and pulse `p <= q` so that `p/q`
/// is closest to `phase` (in `0..1`).
///
/// Candidates are scanned in ascending `q`, so on exact ties the coarser
/// subdivision wins.
pub fn best_subdivision(phase: f64, max_subdivision: u32) -> Subdivision {
    let mut best = Subdivision {
        pulse: 0,
        subdivision: 1,
        error: 1.0,
    };

    for q in 1..=max_subdivision.max(1) {
        let p = (phase * q as f64 + 0.5).floor();
        let error = (phase - p / q as f64).abs();
        if error < best.error {
            best = Subdivision {
                pulse: p as u32,
                subdivision: q,
                error,
            };
        }
    }

    best
}

/// Indispensability tables of one meter for subdivisions `1..=max`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeterTables {
    levels: Vec<u32>,
    beats: u32,
    tables: Vec<Vec<u32>>,
}

impl MeterTables {
    fn build(levels: &[u32], beats: u32, max_subdivision: u32) -> Self {
        let mut strata = Vec::new();
        for &level in levels {
            factor_into(level, &mut strata);
        }

        let tables = (1..=max_subdivision)
            .map(|q| {
                let mut meter = strata.clone();
                meter.extend(factor(q));
                indispensability(&meter)
            })
            .collect();

        Self {
            levels: levels.to_vec(),
            beats,
            tables,
        }
    }

    /// Levels this meter was built from
    pub fn levels(&self) -> &[u32] {
        &self.levels
    }

    /// Product of all levels
    pub fn beats(&self) -> u32 {
        self.beats
    }

    /// Table for subdivision `q` (`beats * q` entries)
    pub fn table(&self, q: u32) -> Option<&[u32]> {
        let index = q.checked_sub(1)? as usize;
        self.tables.get(index).map(Vec::as_slice)
    }
}

fn validate(levels: &[u32]) -> Result<u32, MeterError> {
    if levels.is_empty() {
        return Err(MeterError::Empty);
    }

    let mut beats = 1u64;
    for (index, &level) in levels.iter().enumerate() {
        if level == 0 {
            return Err(MeterError::ZeroLevel { index });
        }
        beats = beats.saturating_mul(level as u64);
    }

    if beats > MAX_BEATS as u64 {
        return Err(MeterError::TooLarge { beats });
    }

    Ok(beats as u32)
}

/// Meter with per-signature cached tables and sticky subdivision matching.
#[derive(Debug, Clone)]
pub struct MeterModel {
    max_subdivision: u32,
    current: Arc<MeterTables>,
    cache: HashMap<Vec<u32>, Arc<MeterTables>>,
    /// Subdivision of the previous match; see [`MeterModel::pulse_weight`]
    last_subdivision: Option<u32>,
}

impl MeterModel {
    /// Create a model for `levels` matching up to [`MAX_SUBDIVISION`]
    pub fn new(levels: &[u32]) -> Result<Self, MeterError> {
        Self::with_max_subdivision(levels, MAX_SUBDIVISION)
    }

    /// Create a model with a custom subdivision bound (at least 1)
    pub fn with_max_subdivision(levels: &[u32], max_subdivision: u32) -> Result<Self, MeterError> {
        let max_subdivision = max_subdivision.max(1);
        let beats = validate(levels)?;
        let current = Arc::new(MeterTables::build(levels, beats, max_subdivision));

        let mut cache = HashMap::new();
        cache.insert(levels.to_vec(), current.clone());

        Ok(Self {
            max_subdivision,
            current,
            cache,
            last_subdivision: None,
        })
    }

    /// Switch to `levels`, building its tables unless they are cached.
    ///
    /// Invalid levels are rejected and the active meter stays in place. Always
    /// clears the sticky subdivision on success.
    pub fn recompute(&mut self, levels: &[u32]) -> Result<(), MeterError> {
        self.current = self.tables_for(levels)?;
        self.last_subdivision = None;
        log::debug!(
            "meter {:?}: {} beats, subdivisions 1..={}",
            levels,
            self.current.beats,
            self.max_subdivision
        );
        Ok(())
    }

    /// Build and cache the tables of `levels` without making them active.
    ///
    /// Meant to run before playback so that `recompute` inside the audio
    /// callback only swaps a pointer.
    pub fn prewarm(&mut self, levels: &[u32]) -> Result<(), MeterError> {
        self.tables_for(levels).map(|_| ())
    }

    fn tables_for(&mut self, levels: &[u32]) -> Result<Arc<MeterTables>, MeterError> {
        if let Some(tables) = self.cache.get(levels) {
            return Ok(tables.clone());
        }

        let beats = validate(levels)?;
        let tables = Arc::new(MeterTables::build(levels, beats, self.max_subdivision));
        self.cache.insert(levels.to_vec(), tables.clone());
        Ok(tables)
    }

    /// Whether tables for `levels` are already built
    pub fn is_cached(&self, levels: &[u32]) -> bool {
        self.cache.contains_key(levels)
    }

    /// Weight of the pulse at `position`, measured in beats from the start of
    /// the cycle.
    ///
    /// The whole part selects the beat (wrapped to the meter), the fractional
    /// part is matched to the nearest `p/q`. If the previous match used a
    /// subdivision that the new `q` divides, the match is rescaled to the
    /// previous subdivision so the resolution doesn't fall back to the bare
    /// beat on every downbeat. This stickiness only ends when a finer or
    /// incompatible subdivision shows up or the meter is recomputed.
    pub fn pulse_weight(&mut self, position: f64) -> Result<PulseWeight, MeterError> {
        if !position.is_finite() || position < 0.0 {
            return Err(MeterError::InvalidPulse(position));
        }

        let beats = self.current.beats;
        let whole = position.floor();
        let phase = position - whole;
        let mut beat = (whole % beats as f64) as u32;

        let Subdivision {
            mut pulse,
            mut subdivision,
            ..
        } = best_subdivision(phase, self.max_subdivision);

        if let Some(previous) = self.last_subdivision {
            if previous % subdivision == 0 {
                let scale = previous / subdivision;
                pulse *= scale;
                subdivision = previous;
            }
        }
        self.last_subdivision = Some(subdivision);

        // Phase rounded up onto the next beat
        if pulse == subdivision {
            pulse = 0;
            beat = (beat + 1) % beats;
        }

        let weight = self
            .current
            .table(subdivision)
            .and_then(|table| table.get((beat * subdivision + pulse) as usize))
            .copied()
            .unwrap_or(0);

        Ok(PulseWeight {
            weight,
            resolution: beats * subdivision,
        })
    }

    /// Subdivision used by the last match
    pub fn last_subdivision(&self) -> Option<u32> {
        self.last_subdivision
    }

    /// Active tables
    pub fn tables(&self) -> &MeterTables {
        &self.current
    }

    /// Levels of the active meter
    pub fn levels(&self) -> &[u32] {
        &self.current.levels
    }

    /// Product of the active meter's levels
    pub fn beats(&self) -> u32 {
        self.current.beats
    }

    pub fn max_subdivision(&self) -> u32 {
        self.max_subdivision
    }
}

impl Default for MeterModel {
    /// 4/4
    fn default() -> Self {
        let current = Arc::new(MeterTables::build(&[4], 4, MAX_SUBDIVISION));
        let mut cache = HashMap::new();
        cache.insert(vec![4], current.clone());
        Self {
            max_subdivision: MAX_SUBDIVISION,
            current,
            cache,
            last_subdivision: None,
        }
    }
}

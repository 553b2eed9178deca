/*
Pulse Scheduling
================

Positions are measured in pulses: quarter-note beats scaled by the meter
denominator and the division setting,

  pulse = denominator / 4 * division * beat

so a 6/8 bar at division 1 has six pulses and a 4/4 bar at division 3 has
twelve. Each block asks one question: does a pulse start inside it, and at
which sample?

  immediate   the block opens on a whole pulse, or the last pulse we fired is
              not the one the block starts in (transport start, loop, seek)
              -> fire at offset 0
  mid-block   a pulse boundary lies strictly inside the block
              -> fire at the interpolated sample, never at offset 0
  neither     nothing due

A boundary that coincides with the block end is not mid-block: the next block
opens on it and fires it at offset 0. At most one pulse is fired per block.

When the denominator or the division changes, the last fired pulse is
re-expressed in the new scale from its beat, so a meter change on a bar line
doesn't count as a discontinuity.
*/

use crate::io::host::BlockContext;

/// Pulse that is due in the current block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuePulse {
    /// Whole pulse number (scaled beat)
    pub pulse: i64,
    /// Quarter-note beat at the firing sample
    pub beat: f64,
    /// Offset of the firing sample within the block
    pub offset: u32,
    /// Absolute position of the firing sample
    pub sample: i64,
    /// Samples per pulse at the block's tempo
    pub spacing: f64,
}

/// Pull positions within rounding noise of a whole pulse onto it
fn snap(position: f64) -> f64 {
    let whole = position.round();
    if (position - whole).abs() < 1e-9 {
        whole
    } else {
        position
    }
}

#[derive(Debug, Clone, Copy)]
struct Fired {
    pulse: i64,
    beat: f64,
    scale: f64,
}

/// Tracks the last fired pulse across blocks
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    last: Option<Fired>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Last fired pulse in units of `scale`
    fn last_pulse_at(&self, scale: f64) -> Option<i64> {
        self.last.map(|fired| {
            if fired.scale == scale {
                fired.pulse
            } else {
                (fired.beat * scale + 1e-9).floor() as i64
            }
        })
    }

    /// Find the pulse due in `block`, if any, and remember it as fired.
    ///
    /// `subdivision` is the division setting (pulses per meter beat).
    pub fn next_pulse(&mut self, block: &BlockContext, subdivision: u32) -> Option<DuePulse> {
        let frames = block.frames();
        if frames == 0 || block.denominator == 0 {
            return None;
        }

        let scale = block.denominator as f64 / 4.0 * subdivision.max(1) as f64;
        let b1 = snap(scale * block.beat_start);
        let b2 = snap(scale * block.beat_end);
        let p1 = b1.floor();
        let p2 = b2.floor();
        let spacing = if b2 > b1 { frames as f64 / (b2 - b1) } else { 0.0 };

        if self.last_pulse_at(scale) != Some(p1 as i64) || b1 == p1 {
            self.last = Some(Fired {
                pulse: p1 as i64,
                beat: block.beat_start,
                scale,
            });
            return Some(DuePulse {
                pulse: p1 as i64,
                beat: block.beat_start,
                offset: 0,
                sample: block.sample_start,
                spacing,
            });
        }

        if p2 > p1 && b2 != p2 && frames > 1 {
            let boundary = p1 + 1.0;
            let fraction = (boundary - b1) / (b2 - b1);
            let offset = ((fraction * frames as f64) - 1e-9).ceil() as i64;
            let offset = offset.clamp(1, frames as i64 - 1) as u32;

            let beat = boundary / scale;
            self.last = Some(Fired {
                pulse: boundary as i64,
                beat,
                scale,
            });
            return Some(DuePulse {
                pulse: boundary as i64,
                beat,
                offset,
                sample: block.sample_start + offset as i64,
                spacing,
            });
        }

        None
    }

    /// Forget the last fired pulse so the next block fires immediately
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn last_pulse(&self) -> Option<i64> {
        self.last.map(|fired| fired.pulse)
    }
}

/*
Arpeggio Patterns
=================

A pattern is the ordered list of pitches the arpeggiator steps through, one
per accepted pulse. It is rebuilt from the chord whenever the chord or the
pattern parameters change, and its cursor starts over on every rebuild.

Expansion
---------

Every chord note contributes itself, then its copies `down` octaves below and
`up` octaves above (copies that leave 0..=127 are dropped):

  chord [60, 64], up 1, down 0  ->  60 72 64 76  (before ordering)

Modes
-----

  up         ascending pitch                      60 64 67
  down       descending pitch                     67 64 60
  exclusive  up, then back down without the ends  60 64 67 64
  inclusive  up, then back down to the bottom     60 64 67 64 60
  order      order the notes were struck in       (struck 67, 60, 64) 67 60 64
  random     ascending pitches, shuffled

In `order` mode every octave copy carries its source note's chord index
shifted by `i * (counter + 1)`, `counter` being the tracker's next chord index.
That keeps the copies of one octave together and in struck order:

  struck 67, 60, 64 with up 1  ->  67 60 64 79 72 76
*/

use rand::seq::SliceRandom;
use rand::Rng;

/// Ordering policy for the expanded chord
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PatternMode {
    #[default]
    Up,
    Down,
    UpDownExclusive,
    UpDownInclusive,
    Order,
    Random,
}

impl PatternMode {
    pub const ALL: [PatternMode; 6] = [
        PatternMode::Up,
        PatternMode::Down,
        PatternMode::UpDownExclusive,
        PatternMode::UpDownInclusive,
        PatternMode::Order,
        PatternMode::Random,
    ];

    /// Mode for a zero-based host scale point, clamped to the last mode
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Next mode, wrapping around
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            PatternMode::Up => "up",
            PatternMode::Down => "down",
            PatternMode::UpDownExclusive => "exclusive",
            PatternMode::UpDownInclusive => "inclusive",
            PatternMode::Order => "order",
            PatternMode::Random => "random",
        }
    }
}

/// Octave copies added around each chord note, plus a transposition of the
/// whole pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OctaveRange {
    pub up: u8,
    pub down: u8,
    /// Whole-pattern shift in octaves
    pub shift: i8,
}

impl OctaveRange {
    pub fn new(up: u8, down: u8) -> Self {
        Self { up, down, shift: 0 }
    }

    pub fn with_shift(mut self, shift: i8) -> Self {
        self.shift = shift;
        self
    }
}

/// Ordered pitches with a cursor
#[derive(Debug, Clone)]
pub struct Pattern {
    notes: Vec<u8>,
    /// Scratch for (pitch, order key) during rebuilds
    expanded: Vec<(u8, i64)>,
    /// Index of the last played note, `None` before the first step
    cursor: Option<usize>,
}

impl Pattern {
    pub fn new() -> Self {
        Self {
            notes: Vec::with_capacity(128),
            expanded: Vec::with_capacity(128),
            cursor: None,
        }
    }

    /// Rebuild from `(pitch, chord index)` pairs and rewind the cursor.
    ///
    /// `counter` is the tracker's next chord index, used to space octave
    /// copies in [`PatternMode::Order`]. `rng` is only drawn from in
    /// [`PatternMode::Random`].
    pub fn rebuild<R: Rng + ?Sized>(
        &mut self,
        chord: impl IntoIterator<Item = (u8, u32)>,
        octaves: OctaveRange,
        mode: PatternMode,
        counter: u32,
        rng: &mut R,
    ) {
        self.expand(chord, octaves, counter);
        self.notes.clear();
        self.cursor = None;

        match mode {
            PatternMode::Order => {
                self.expanded.sort_by_key(|&(_, key)| key);
            }
            PatternMode::Down => {
                self.expanded.sort_by(|a, b| b.0.cmp(&a.0));
            }
            _ => {
                self.expanded.sort_by_key(|&(pitch, _)| pitch);
            }
        }
        self.notes.extend(self.expanded.iter().map(|&(pitch, _)| pitch));

        let n = self.notes.len();
        match mode {
            PatternMode::UpDownExclusive if n > 2 => {
                for i in (1..n - 1).rev() {
                    self.notes.push(self.notes[i]);
                }
            }
            PatternMode::UpDownInclusive if n > 1 => {
                for i in (0..n - 1).rev() {
                    self.notes.push(self.notes[i]);
                }
            }
            PatternMode::Random => {
                self.notes.shuffle(rng);
            }
            _ => {}
        }

        if octaves.shift != 0 {
            let offset = 12 * octaves.shift as i16;
            self.notes
                .retain(|&pitch| (0..=127).contains(&(pitch as i16 + offset)));
            for pitch in &mut self.notes {
                *pitch = (*pitch as i16 + offset) as u8;
            }
        }
    }

    fn expand(&mut self, chord: impl IntoIterator<Item = (u8, u32)>, octaves: OctaveRange, counter: u32) {
        self.expanded.clear();
        let spacing = counter as i64 + 1;

        for (pitch, index) in chord {
            let index = index as i64;
            self.expanded.push((pitch, index));

            for i in 1..=octaves.down as i64 {
                let lower = pitch as i64 - 12 * i;
                if lower >= 0 {
                    self.expanded.push((lower as u8, index - i * spacing));
                }
            }
            for i in 1..=octaves.up as i64 {
                let upper = pitch as i64 + 12 * i;
                if upper <= 127 {
                    self.expanded.push((upper as u8, index + i * spacing));
                }
            }
        }
    }

    /// Step to the next note, wrapping at the end
    pub fn advance(&mut self) -> Option<u8> {
        if self.notes.is_empty() {
            return None;
        }
        let next = match self.cursor {
            Some(index) => (index + 1) % self.notes.len(),
            None => 0,
        };
        self.cursor = Some(next);
        Some(self.notes[next])
    }

    pub fn notes(&self) -> &[u8] {
        &self.notes
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self::new()
    }
}

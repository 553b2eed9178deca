//! Chord tracker - held and latched notes with insertion order.
//!
//! Allocation-free: both note sets are fixed 128-entry tables indexed by
//! pitch, each entry holding the chord index the note was struck with.

const NOTE_COUNT: usize = 128;

/// Held and latched notes of the arpeggiator input
#[derive(Debug, Clone)]
pub struct ChordTracker {
    held: [Option<u32>; NOTE_COUNT],
    latched: [Option<u32>; NOTE_COUNT],
    held_count: usize,
    latched_count: usize,
    /// Chord index handed to the next note-on
    next_index: u32,
    latch: bool,
    channel: u8,
    changed: bool,
}

impl ChordTracker {
    pub fn new() -> Self {
        Self {
            held: [None; NOTE_COUNT],
            latched: [None; NOTE_COUNT],
            held_count: 0,
            latched_count: 0,
            next_index: 0,
            latch: false,
            channel: 0,
            changed: false,
        }
    }

    /// Register a struck note.
    ///
    /// With latch on, the first note of a new chord drops the previously
    /// latched notes. `channel` becomes the output channel. Out of range
    /// pitches are ignored.
    pub fn note_on(&mut self, pitch: u8, channel: u8) {
        let was_held = match self.held.get(pitch as usize) {
            Some(slot) => slot.is_some(),
            None => return,
        };

        if self.latch && self.held_count == 0 {
            self.clear_latched();
        }

        if !was_held {
            self.held_count += 1;
        }
        if self.latched[pitch as usize].take().is_some() {
            self.latched_count -= 1;
        }

        self.held[pitch as usize] = Some(self.next_index);
        self.next_index += 1;
        self.channel = channel & 0x0F;
        self.changed = true;
    }

    /// Register a released note.
    ///
    /// With latch on the note moves to the latched set keeping its chord
    /// index, which leaves the pattern as it is.
    pub fn note_off(&mut self, pitch: u8) {
        let Some(index) = self.held.get_mut(pitch as usize).and_then(Option::take) else {
            return;
        };
        self.held_count -= 1;

        if self.latch {
            if self.latched[pitch as usize].replace(index).is_none() {
                self.latched_count += 1;
            }
        } else {
            self.changed = true;
        }
    }

    /// Toggle latch mode. Turning it off releases all latched notes.
    pub fn set_latch(&mut self, enabled: bool) {
        if !enabled && self.latched_count > 0 {
            self.clear_latched();
            self.changed = true;
        }
        self.latch = enabled;
    }

    fn clear_latched(&mut self) {
        self.latched = [None; NOTE_COUNT];
        self.latched_count = 0;
    }

    /// Return and reset the changed flag
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    /// Mark the chord as changed (parameter edits that need a rebuild)
    pub fn mark_changed(&mut self) {
        self.changed = true;
    }

    /// Restart chord indices from zero
    pub fn reset_index(&mut self) {
        self.next_index = 0;
    }

    /// Held notes followed by latched notes as `(pitch, chord index)`, each
    /// group in ascending pitch
    pub fn notes(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        let held = self.held.iter().enumerate();
        let latched = self.latched.iter().enumerate();
        held.chain(latched)
            .filter_map(|(pitch, &index)| index.map(|index| (pitch as u8, index)))
    }

    pub fn is_held(&self, pitch: u8) -> bool {
        matches!(self.held.get(pitch as usize), Some(Some(_)))
    }

    pub fn is_latched(&self, pitch: u8) -> bool {
        matches!(self.latched.get(pitch as usize), Some(Some(_)))
    }

    pub fn held_count(&self) -> usize {
        self.held_count
    }

    pub fn latched_count(&self) -> usize {
        self.latched_count
    }

    /// No held and no latched notes
    pub fn is_empty(&self) -> bool {
        self.held_count == 0 && self.latched_count == 0
    }

    /// Chord index the next note-on will get
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    pub fn latch(&self) -> bool {
        self.latch
    }

    /// Channel of the most recent note-on
    pub fn channel(&self) -> u8 {
        self.channel
    }
}

impl Default for ChordTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pitches(chord: &ChordTracker) -> Vec<u8> {
        chord.notes().map(|(p, _)| p).collect()
    }

    #[test]
    fn test_note_on_assigns_increasing_indices() {
        let mut chord = ChordTracker::new();
        chord.note_on(67, 0);
        chord.note_on(60, 0);
        chord.note_on(64, 0);

        let notes: Vec<_> = chord.notes().collect();
        assert_eq!(notes, vec![(60, 1), (64, 2), (67, 0)]);
        assert_eq!(chord.next_index(), 3);
        assert!(chord.take_changed());
        assert!(!chord.take_changed());
    }

    #[test]
    fn test_note_off_without_latch() {
        let mut chord = ChordTracker::new();
        chord.note_on(60, 0);
        chord.take_changed();

        chord.note_off(60);
        assert!(chord.take_changed());
        assert!(chord.is_empty());
    }

    #[test]
    fn test_latch_keeps_released_notes() {
        let mut chord = ChordTracker::new();
        chord.set_latch(true);
        chord.note_on(60, 0);
        chord.note_on(64, 0);
        chord.take_changed();

        chord.note_off(60);
        chord.note_off(64);
        assert!(!chord.take_changed());
        assert_eq!(pitches(&chord), vec![60, 64]);
        assert!(chord.is_latched(60));
        assert!(!chord.is_held(60));
        assert_eq!(chord.latched_count(), 2);
    }

    #[test]
    fn test_new_chord_replaces_latched() {
        let mut chord = ChordTracker::new();
        chord.set_latch(true);
        chord.note_on(60, 0);
        chord.note_off(60);

        chord.note_on(62, 0);
        assert_eq!(pitches(&chord), vec![62]);

        // Second note while 62 is still held joins the chord
        chord.note_on(65, 0);
        assert_eq!(pitches(&chord), vec![62, 65]);
    }

    #[test]
    fn test_restruck_note_is_not_duplicated() {
        let mut chord = ChordTracker::new();
        chord.set_latch(true);
        chord.note_on(60, 0);
        chord.note_on(64, 0);
        chord.note_off(60);

        // 64 is still held, so 60 is no fresh chord: it moves back to held
        chord.note_on(60, 0);
        assert_eq!(pitches(&chord), vec![60, 64]);
        assert!(chord.is_held(60));
        assert!(!chord.is_latched(60));
        assert_eq!(chord.held_count(), 2);
        assert_eq!(chord.latched_count(), 0);
    }

    #[test]
    fn test_latch_off_releases_latched() {
        let mut chord = ChordTracker::new();
        chord.set_latch(true);
        chord.note_on(60, 0);
        chord.note_off(60);
        chord.take_changed();

        chord.set_latch(false);
        assert!(chord.take_changed());
        assert!(chord.is_empty());

        // Nothing latched: toggling is not a change
        chord.set_latch(true);
        chord.set_latch(false);
        assert!(!chord.take_changed());
    }

    #[test]
    fn test_latched_index_preserved() {
        let mut chord = ChordTracker::new();
        chord.set_latch(true);
        chord.note_on(64, 0);
        chord.note_on(60, 0);
        chord.note_off(64);
        let notes: Vec<_> = chord.notes().collect();
        // Held first, then latched
        assert_eq!(notes, vec![(60, 1), (64, 0)]);
    }

    #[test]
    fn test_channel_follows_last_note_on() {
        let mut chord = ChordTracker::new();
        chord.note_on(60, 3);
        assert_eq!(chord.channel(), 3);
        chord.note_on(64, 9);
        assert_eq!(chord.channel(), 9);
    }

    #[test]
    fn test_out_of_range_ignored() {
        let mut chord = ChordTracker::new();
        chord.note_on(200, 0);
        chord.note_off(200);
        assert!(chord.is_empty());
        assert!(!chord.take_changed());
    }

    #[test]
    fn test_unknown_note_off_ignored() {
        let mut chord = ChordTracker::new();
        chord.note_off(60);
        assert!(!chord.take_changed());
    }

    #[test]
    fn test_reset_index() {
        let mut chord = ChordTracker::new();
        chord.note_on(60, 0);
        chord.note_off(60);
        chord.reset_index();
        assert_eq!(chord.next_index(), 0);
    }
}

use super::converter;

/// Decoded channel message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    PitchBend { channel: u8, value: i16 },
    ProgramChange { channel: u8, program: u8 },
}

/// Controller number of the "all notes off" channel mode message
pub const ALL_NOTES_OFF: u8 = 123;

/// Raw three-byte message positioned inside a processing block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MidiMessage {
    /// Sample offset from the start of the block
    pub offset: u32,
    pub status: u8,
    pub data1: u8,
    pub data2: u8,
}

impl MidiMessage {
    pub const fn new(offset: u32, status: u8, data1: u8, data2: u8) -> Self {
        Self {
            offset,
            status,
            data1,
            data2,
        }
    }

    pub const fn note_on(offset: u32, channel: u8, key: u8, velocity: u8) -> Self {
        Self::new(offset, 0x90 | (channel & 0x0F), key & 0x7F, velocity & 0x7F)
    }

    pub const fn note_off(offset: u32, channel: u8, key: u8) -> Self {
        Self::new(offset, 0x80 | (channel & 0x0F), key & 0x7F, 0)
    }

    pub const fn all_notes_off(offset: u32, channel: u8) -> Self {
        Self::new(offset, 0xB0 | (channel & 0x0F), ALL_NOTES_OFF, 0)
    }

    pub const fn channel(&self) -> u8 {
        self.status & 0x0F
    }

    /// Note-on or note-off (including note-on with velocity 0)
    pub const fn is_note(&self) -> bool {
        matches!(self.status >> 4, 0x8 | 0x9)
    }

    /// Note-on with a non-zero velocity
    pub const fn is_note_on(&self) -> bool {
        self.status >> 4 == 0x9 && self.data2 > 0
    }

    pub fn event(&self) -> Option<MidiEvent> {
        converter::decode(self)
    }
}

use super::midi::{MidiEvent, MidiMessage};

/// Decode a raw message. Note-on with velocity 0 becomes a note-off; system
/// and aftertouch messages yield `None`.
pub fn decode(message: &MidiMessage) -> Option<MidiEvent> {
    let channel = message.status & 0x0F;
    let data1 = message.data1 & 0x7F;
    let data2 = message.data2 & 0x7F;

    match message.status >> 4 {
        0x8 => Some(MidiEvent::NoteOff {
            channel,
            key: data1,
            velocity: data2,
        }),
        0x9 if data2 == 0 => Some(MidiEvent::NoteOff {
            channel,
            key: data1,
            velocity: 0,
        }),
        0x9 => Some(MidiEvent::NoteOn {
            channel,
            key: data1,
            velocity: data2,
        }),
        0xB => Some(MidiEvent::ControlChange {
            channel,
            controller: data1,
            value: data2,
        }),
        0xC => Some(MidiEvent::ProgramChange {
            channel,
            program: data1,
        }),
        0xE => Some(MidiEvent::PitchBend {
            channel,
            value: (((data2 as i16) << 7) | data1 as i16) - 8192,
        }),
        _ => None,
    }
}

pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

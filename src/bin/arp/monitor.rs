//! Monitor voice - a mono sine so the arp output can be heard

use std::f32::consts::TAU;

use saavy_arp::io::{
    converter::midi_note_to_freq,
    midi::{MidiEvent, MidiMessage, ALL_NOTES_OFF},
};

const ATTACK_SECONDS: f32 = 0.004;
const RELEASE_SECONDS: f32 = 0.06;
const GAIN: f32 = 0.25;

pub struct Monitor {
    sample_rate: f32,
    phase: f32,
    freq: f32,
    key: Option<u8>,
    level: f32,
    target: f32,
    attack_step: f32,
    release_step: f32,
}

impl Monitor {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            phase: 0.0,
            freq: 440.0,
            key: None,
            level: 0.0,
            target: 0.0,
            attack_step: GAIN / (ATTACK_SECONDS * sample_rate),
            release_step: GAIN / (RELEASE_SECONDS * sample_rate),
        }
    }

    fn handle(&mut self, message: &MidiMessage) {
        match message.event() {
            Some(MidiEvent::NoteOn { key, velocity, .. }) => {
                self.key = Some(key);
                self.freq = midi_note_to_freq(key);
                self.target = velocity as f32 / 127.0 * GAIN;
            }
            Some(MidiEvent::NoteOff { key, .. }) if self.key == Some(key) => {
                self.key = None;
                self.target = 0.0;
            }
            Some(MidiEvent::ControlChange {
                controller: ALL_NOTES_OFF,
                ..
            }) => {
                self.key = None;
                self.target = 0.0;
            }
            _ => {}
        }
    }

    /// Render into `out`, applying `events` at their block offsets
    pub fn render(&mut self, out: &mut [f32], events: &[MidiMessage]) {
        let mut events = events.iter().peekable();

        for (i, sample) in out.iter_mut().enumerate() {
            while let Some(message) = events.next_if(|m| m.offset as usize <= i) {
                self.handle(message);
            }

            if self.level < self.target {
                self.level = (self.level + self.attack_step).min(self.target);
            } else if self.level > self.target {
                self.level = (self.level - self.release_step).max(self.target);
            }

            *sample = self.level * (self.phase * TAU).sin();
            self.phase = (self.phase + self.freq / self.sample_rate).fract();
        }

        for message in events {
            self.handle(message);
        }
    }
}

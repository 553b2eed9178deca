//! Shared state types for UI communication
//!
//! Everything crossing the rings is `Copy` so the audio thread never
//! allocates.

use saavy_arp::{engine::Step, ArpConfig};

/// Longest pattern snapshot sent to the UI
pub const PATTERN_CAPACITY: usize = 64;

/// Commands sent from the UI thread to the audio thread
#[derive(Clone, Copy, Debug)]
pub enum ControlMessage {
    /// Start or stop the transport
    SetRolling(bool),
    /// Replace the arpeggiator controls
    Config(ArpConfig),
    /// Chord key pressed
    NoteOn(u8),
    /// Chord key released
    NoteOff(u8),
}

/// Dynamic state update sent from the audio thread (allocation-free, Copy)
#[derive(Clone, Copy, Debug)]
pub struct UiStateUpdate {
    pub rolling: bool,
    /// Quarter-note beat at the end of the last block
    pub beat: f64,
    /// 1-based bar and meter beat
    pub bar: u32,
    pub beat_in_bar: u32,
    pub divisions_per_bar: u32,
    pub denominator: u32,
    /// Snapshot of the pattern, `pattern_len` entries valid
    pub pattern: [u8; PATTERN_CAPACITY],
    pub pattern_len: u8,
    pub cursor: Option<u8>,
    pub last_step: Option<Step>,
    /// Output events lost to full queues so far
    pub dropped: u64,
}

impl UiStateUpdate {
    pub fn new() -> Self {
        Self {
            rolling: false,
            beat: 0.0,
            bar: 1,
            beat_in_bar: 1,
            divisions_per_bar: 4,
            denominator: 4,
            pattern: [0; PATTERN_CAPACITY],
            pattern_len: 0,
            cursor: None,
            last_step: None,
            dropped: 0,
        }
    }

    pub fn pattern(&self) -> &[u8] {
        &self.pattern[..self.pattern_len as usize]
    }
}

impl Default for UiStateUpdate {
    fn default() -> Self {
        Self::new()
    }
}

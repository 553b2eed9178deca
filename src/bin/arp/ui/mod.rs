//! TUI module for arp
//!
//! Shows transport, the pattern being stepped and the accent profile of the
//! current meter. Keys edit the arpeggiator controls and toggle chord notes.

mod meter;
mod pattern;
pub mod state;
mod transport;

use std::collections::VecDeque;
use std::time::Duration;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, Producer};
use saavy_arp::{io::midi::MidiMessage, sequencing::TimeSignature, ArpConfig};

pub use state::{ControlMessage, UiStateUpdate, PATTERN_CAPACITY};

use meter::render_meter;
use pattern::{render_output, render_pattern};
use transport::render_transport;

/// White keys from C4 toggled with 1..8
pub const CHORD_KEYS: [u8; 8] = [60, 62, 64, 65, 67, 69, 71, 72];

/// Output messages kept for the log panel
const OUTPUT_HISTORY: usize = 8;

/// UI application state
pub struct UiApp {
    control_tx: Producer<ControlMessage>,
    state_rx: Consumer<UiStateUpdate>,
    midi_rx: Consumer<MidiMessage>,
    /// Latest state from the audio thread
    current_state: UiStateUpdate,
    config: ArpConfig,
    rolling: bool,
    bpm: f64,
    chord: [bool; CHORD_KEYS.len()],
    output: VecDeque<MidiMessage>,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        control_tx: Producer<ControlMessage>,
        state_rx: Consumer<UiStateUpdate>,
        midi_rx: Consumer<MidiMessage>,
        config: ArpConfig,
        bpm: f64,
        time_signature: TimeSignature,
    ) -> Self {
        let mut current_state = UiStateUpdate::new();
        current_state.divisions_per_bar = time_signature.numerator as u32;
        current_state.denominator = time_signature.denominator as u32;

        Self {
            control_tx,
            state_rx,
            midi_rx,
            current_state,
            config: config.sanitized(),
            rolling: false,
            bpm,
            chord: [false; CHORD_KEYS.len()],
            output: VecDeque::with_capacity(OUTPUT_HISTORY),
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, mut terminal: DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_state();
            self.poll_output();

            terminal.draw(|frame| self.render(frame))?;

            // Handle keyboard input (non-blocking, ~60fps)
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        log::info!("arp quitting");
        Ok(())
    }

    fn poll_state(&mut self) {
        // Keep only the latest state
        while let Ok(state) = self.state_rx.pop() {
            self.current_state = state;
        }
    }

    fn poll_output(&mut self) {
        while let Ok(message) = self.midi_rx.pop() {
            if !message.is_note_on() {
                continue;
            }
            if self.output.len() == OUTPUT_HISTORY {
                self.output.pop_front();
            }
            self.output.push_back(message);
        }
    }

    fn send(&mut self, message: ControlMessage) {
        if self.control_tx.push(message).is_err() {
            log::warn!("control queue full, dropped {:?}", message);
        }
    }

    fn update_config(&mut self, edit: impl FnOnce(&mut ArpConfig)) {
        let mut config = self.config;
        edit(&mut config);
        self.config = config.sanitized();
        self.send(ControlMessage::Config(self.config));
    }

    fn toggle_chord_key(&mut self, index: usize) {
        let Some(&key) = CHORD_KEYS.get(index) else {
            return;
        };
        self.chord[index] = !self.chord[index];
        if self.chord[index] {
            self.send(ControlMessage::NoteOn(key));
        } else {
            self.send(ControlMessage::NoteOff(key));
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char(' ') => {
                self.rolling = !self.rolling;
                self.send(ControlMessage::SetRolling(self.rolling));
            }
            KeyCode::Char('m') => self.update_config(|c| c.mode = c.mode.next()),
            KeyCode::Char('+') | KeyCode::Char('=') => self.update_config(|c| c.division += 1),
            KeyCode::Char('-') => self.update_config(|c| c.division = c.division.saturating_sub(1)),
            KeyCode::Char('u') => self.update_config(|c| c.octaves_up += 1),
            KeyCode::Char('U') => self.update_config(|c| c.octaves_up = c.octaves_up.saturating_sub(1)),
            KeyCode::Char('d') => self.update_config(|c| c.octaves_down += 1),
            KeyCode::Char('D') => {
                self.update_config(|c| c.octaves_down = c.octaves_down.saturating_sub(1))
            }
            KeyCode::Char('<') => self.update_config(|c| c.octave_shift -= 1),
            KeyCode::Char('>') => self.update_config(|c| c.octave_shift += 1),
            KeyCode::Char('g') => self.update_config(|c| c.gate -= 0.1),
            KeyCode::Char('G') => self.update_config(|c| c.gate += 0.1),
            KeyCode::Char('l') => self.update_config(|c| c.latch = !c.latch),
            KeyCode::Char('b') => self.update_config(|c| c.bypass = !c.bypass),
            KeyCode::Char(digit @ '1'..='8') => {
                self.toggle_chord_key(digit as usize - '1' as usize);
            }
            _ => {}
        }
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Transport bar
                Constraint::Length(6), // Pattern and chord
                Constraint::Min(8),    // Accent profile
                Constraint::Length(3), // Output log
                Constraint::Length(1), // Help bar
            ])
            .split(area);

        render_transport(frame, chunks[0], &self.current_state, &self.config, self.bpm);
        render_pattern(frame, chunks[1], &self.current_state, &self.chord);
        render_meter(frame, chunks[2], &self.current_state, &self.config);
        render_output(frame, chunks[3], &self.output);

        let help = Paragraph::new(
            " [Space] Play/Stop  [1-8] Chord  [M] Mode  [+/-] Division  [u/U d/D] Octaves  [</>] Shift  [g/G] Gate  [L] Latch  [B] Bypass  [Q] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[4]);
    }
}

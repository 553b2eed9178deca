//! Arp - application builder, audio callback and host simulation

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Consumer, Producer, RingBuffer};

use saavy_arp::{
    io::{
        host::{ConstantTempo, TempoMap},
        midi::MidiMessage,
        EventSink,
    },
    sequencing::TimeSignature,
    ArpConfig, ArpEngine, MAX_BLOCK_SIZE,
};

use super::monitor::Monitor;
use super::ui::{ControlMessage, UiApp, UiStateUpdate, PATTERN_CAPACITY};

/// Bars per section when alternating meters
const ALTERNATE_BARS: u32 = 4;
/// Number of alternating sections laid out ahead of playback
const ALTERNATE_SECTIONS: u32 = 256;
/// Chord keys the UI can queue between two callbacks
const INPUT_CAPACITY: usize = 64;

/// Main application builder
pub struct Arp {
    bpm: f64,
    time_signature: TimeSignature,
    alternate: Option<TimeSignature>,
    config: ArpConfig,
}

impl Arp {
    pub fn new() -> Self {
        Self {
            bpm: 120.0,
            time_signature: TimeSignature::FOUR_FOUR,
            alternate: None,
            config: ArpConfig::default(),
        }
    }

    /// Set the tempo in beats per minute
    pub fn bpm(mut self, bpm: f64) -> Self {
        self.bpm = bpm;
        self
    }

    pub fn meter(mut self, time_signature: TimeSignature) -> Self {
        self.time_signature = time_signature;
        self
    }

    /// Switch between the main meter and `time_signature` every few bars
    pub fn alternate_with(mut self, time_signature: TimeSignature) -> Self {
        self.alternate = Some(time_signature);
        self
    }

    fn tempo(&self, sample_rate: f64) -> ConstantTempo {
        let mut tempo = ConstantTempo::new(self.bpm, sample_rate, self.time_signature);
        if let Some(alternate) = self.alternate {
            for section in 1..ALTERNATE_SECTIONS {
                let signature = if section % 2 == 1 {
                    alternate
                } else {
                    self.time_signature
                };
                tempo = tempo.with_meter_change(1 + section * ALTERNATE_BARS, signature);
            }
        }
        tempo
    }

    /// Run the application (takes over the terminal, plays audio)
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;
        log::info!("output: {} Hz, {} channels", sample_rate, channels);

        let tempo = self.tempo(sample_rate as f64);
        let mut engine = ArpEngine::new(self.config);
        engine
            .prewarm(tempo.time_signatures())
            .wrap_err("failed to prepare meter tables")?;

        let (control_tx, control_rx) = RingBuffer::<ControlMessage>::new(64);
        let (state_tx, state_rx) = RingBuffer::<UiStateUpdate>::new(32);
        let (midi_tx, midi_rx) = RingBuffer::<MidiMessage>::new(256);

        let mut audio = AudioState {
            engine,
            tempo,
            monitor: Monitor::new(sample_rate),
            control_rx,
            state_tx,
            midi_tx,
            midi_dropped: 0,
            rolling: false,
            sample_position: 0,
            input: Vec::with_capacity(INPUT_CAPACITY),
            output: Vec::with_capacity(INPUT_CAPACITY + 8),
            render_buf: vec![0.0; MAX_BLOCK_SIZE],
        };

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| audio.render(data, channels),
            |err| log::error!("audio error: {}", err),
            None,
        )?;
        stream.play()?;

        let terminal = ratatui::init();
        let mut ui = UiApp::new(
            control_tx,
            state_rx,
            midi_rx,
            self.config,
            self.bpm,
            self.time_signature,
        );
        let result = ui.run(terminal);
        ratatui::restore();
        result
    }
}

impl Default for Arp {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the audio callback owns
struct AudioState {
    engine: ArpEngine,
    tempo: ConstantTempo,
    monitor: Monitor,
    control_rx: Consumer<ControlMessage>,
    state_tx: Producer<UiStateUpdate>,
    midi_tx: Producer<MidiMessage>,
    /// Output events the UI ring had no room for
    midi_dropped: u64,
    rolling: bool,
    sample_position: i64,
    input: Vec<MidiMessage>,
    output: Vec<MidiMessage>,
    render_buf: Vec<f32>,
}

impl AudioState {
    fn poll_controls(&mut self) {
        while let Ok(message) = self.control_rx.pop() {
            match message {
                ControlMessage::SetRolling(rolling) => self.rolling = rolling,
                ControlMessage::Config(config) => self.engine.set_config(config),
                ControlMessage::NoteOn(key) => self.queue(MidiMessage::note_on(0, 0, key, 100)),
                ControlMessage::NoteOff(key) => self.queue(MidiMessage::note_off(0, 0, key)),
            }
        }
    }

    fn queue(&mut self, message: MidiMessage) {
        if self.input.len() < INPUT_CAPACITY {
            self.input.push(message);
        }
    }

    fn render(&mut self, data: &mut [f32], channels: usize) {
        self.poll_controls();

        let total_frames = data.len() / channels;
        let mut frames_written = 0;

        while frames_written < total_frames {
            let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
            let block = self
                .tempo
                .block(self.sample_position, frames as u32, self.rolling);

            self.output.clear();
            self.engine
                .process(&block, &self.tempo, &self.input, &mut self.output);
            self.input.clear();

            let buf = &mut self.render_buf[..frames];
            self.monitor.render(buf, &self.output);
            for message in &self.output {
                if !self.midi_tx.send(*message) {
                    self.midi_dropped += 1;
                }
            }

            // Mono to all channels
            let out_off = frames_written * channels;
            for (i, &sample) in buf.iter().enumerate() {
                for ch in 0..channels {
                    data[out_off + i * channels + ch] = sample;
                }
            }

            if self.rolling {
                self.sample_position += frames as i64;
            }
            frames_written += frames;
        }

        self.publish();
    }

    fn publish(&mut self) {
        let beat = self.tempo.beat_at_sample(self.sample_position);
        let bbt = self.tempo.bbt_at(beat);

        let mut update = UiStateUpdate::new();
        update.rolling = self.rolling;
        update.beat = beat;
        update.bar = bbt.bars;
        update.beat_in_bar = bbt.beats;
        update.divisions_per_bar = bbt.divisions_per_bar;
        update.denominator = self.tempo.time_signature_at(beat).denominator as u32;

        let pattern = self.engine.pattern();
        let len = pattern.len().min(PATTERN_CAPACITY);
        update.pattern[..len].copy_from_slice(&pattern.notes()[..len]);
        update.pattern_len = len as u8;
        update.cursor = pattern.cursor().and_then(|cursor| u8::try_from(cursor).ok());
        update.last_step = self.engine.last_step().copied();
        update.dropped = self.midi_dropped + self.engine.dropped_events();

        // A full ring means the UI is behind; it only needs the latest state
        let _ = self.state_tx.push(update);
    }
}

/*
Arpeggiator Engine
==================

One `ArpEngine` per track. The host calls `process` once per block with the
transport snapshot, its tempo map, the block's MIDI input and a sink for the
output. Nothing in `process` allocates once the meter cache is warm.

Transport
---------

  Stopped  input passes through untouched so the player can monitor the
           chord; no stepping
  Rolling  note input only feeds the chord; one step per due pulse

Stopped -> Rolling sends all-notes-off on the chord channel first, silencing
anything that was monitored. Lifting bypass while rolling does the same. Rolling -> Stopped only forgets the scheduler
position, the host silences its own output on stop.

Per pulse
---------

  1  release the sounding note (pending gate or previous step)
  2  look up the meter position of the pulse; a new bar length recomputes the
     meter model
  3  weight -> normalized w; skip outside the weight window, then roll the
     probability filter
  4  velocity = min + w * (max - min); step the pattern and send the note-on

Velocity 0 is a rest: the pattern still steps but no note is sent.
*/

pub mod accent;
pub mod scheduler;

pub use self::scheduler::{DuePulse, Scheduler};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::ArpConfig;
use crate::io::host::{BlockContext, TempoMap};
use crate::io::midi::MidiMessage;
use crate::io::EventSink;
use crate::meter::{MeterError, MeterModel, PulseWeight};
use crate::sequencing::{ChordTracker, Pattern, TimeSignature};

/// Transport state as last seen by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    #[default]
    Stopped,
    Rolling,
}

/// The last note the engine sent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub pitch: u8,
    pub velocity: u8,
    pub weight: PulseWeight,
    /// `weight` scaled into `0..=1`
    pub normalized: f32,
    /// Scaled pulse number the step fired on
    pub pulse: i64,
    /// Position in the bar in meter beats
    pub position: f64,
    /// Absolute sample of the note-on
    pub sample: i64,
}

#[derive(Debug, Clone, Copy)]
struct Sounding {
    pitch: u8,
    channel: u8,
    /// Absolute sample of a gated note-off, `None` holds until the next pulse
    release_at: Option<i64>,
}

pub struct ArpEngine<R = StdRng> {
    config: ArpConfig,
    chord: ChordTracker,
    pattern: Pattern,
    meter: MeterModel,
    scheduler: Scheduler,
    transport: Transport,
    rng: R,
    sounding: Option<Sounding>,
    /// Bar length the meter model was last computed for
    divisions_per_bar: u32,
    last_step: Option<Step>,
    /// Events generated in the current block, in offset order
    generated: Vec<MidiMessage>,
    /// Output events the sink refused
    dropped: u64,
    /// Bypass was switched off; notes monitored during bypass still ring
    bypass_lifted: bool,
}

impl ArpEngine<StdRng> {
    pub fn new(config: ArpConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }
}

impl Default for ArpEngine<StdRng> {
    fn default() -> Self {
        Self::new(ArpConfig::default())
    }
}

impl<R: Rng> ArpEngine<R> {
    /// Create an engine drawing pattern shuffles and pulse probabilities from `rng`
    pub fn with_rng(config: ArpConfig, rng: R) -> Self {
        let config = config.sanitized();
        let mut chord = ChordTracker::new();
        chord.set_latch(config.latch);

        Self {
            config,
            chord,
            pattern: Pattern::new(),
            meter: MeterModel::default(),
            scheduler: Scheduler::new(),
            transport: Transport::Stopped,
            rng,
            sounding: None,
            divisions_per_bar: TimeSignature::FOUR_FOUR.numerator as u32,
            last_step: None,
            generated: Vec::with_capacity(8),
            dropped: 0,
            bypass_lifted: false,
        }
    }

    /// Apply new control values. Mode and octave changes rebuild the pattern
    /// before the next step.
    pub fn set_config(&mut self, config: ArpConfig) {
        let config = config.sanitized();
        if config.reshapes_pattern(&self.config) {
            self.chord.mark_changed();
        }
        if self.config.bypass && !config.bypass {
            self.bypass_lifted = true;
        }
        if config.latch != self.config.latch {
            self.chord.set_latch(config.latch);
        }
        self.config = config;
    }

    /// Build meter tables for every signature the session will play, so meter
    /// changes during playback don't compute tables in the audio callback.
    pub fn prewarm<I>(&mut self, time_signatures: I) -> Result<(), MeterError>
    where
        I: IntoIterator<Item = TimeSignature>,
    {
        for time_signature in time_signatures {
            self.meter.prewarm(&time_signature.meter_levels())?;
        }
        Ok(())
    }

    /// Process one block
    pub fn process<T, S>(&mut self, block: &BlockContext, tempo: &T, input: &[MidiMessage], out: &mut S)
    where
        T: TempoMap + ?Sized,
        S: EventSink + ?Sized,
    {
        self.generated.clear();
        self.update_transport(block);

        for message in input {
            self.track(message);
        }

        let monitoring = self.transport == Transport::Stopped || self.config.bypass;
        if self.transport == Transport::Rolling {
            if std::mem::take(&mut self.bypass_lifted) && !self.config.bypass {
                log::debug!("bypass lifted at sample {}", block.sample_start);
                self.generated.push(MidiMessage::all_notes_off(0, self.chord.channel()));
            }
            if self.config.bypass {
                self.release_for_bypass();
            } else {
                self.step(block, tempo);
            }
        }

        self.merge_into(input, monitoring, out);
    }

    fn update_transport(&mut self, block: &BlockContext) {
        match (self.transport, block.rolling) {
            (Transport::Stopped, true) => {
                log::debug!("transport rolling at sample {}", block.sample_start);
                self.transport = Transport::Rolling;
                self.scheduler.reset();
                self.bypass_lifted = false;
                self.generated.push(MidiMessage::all_notes_off(0, self.chord.channel()));
            }
            (Transport::Rolling, false) => {
                log::debug!("transport stopped at sample {}", block.sample_start);
                self.transport = Transport::Stopped;
                self.scheduler.reset();
                self.sounding = None;
            }
            _ => {}
        }
    }

    fn track(&mut self, message: &MidiMessage) {
        if !message.is_note() {
            return;
        }
        if message.is_note_on() {
            self.chord.note_on(message.data1, message.channel());
        } else {
            self.chord.note_off(message.data1);
        }
    }

    fn release_for_bypass(&mut self) {
        if let Some(sounding) = self.sounding.take() {
            self.generated
                .push(MidiMessage::note_off(0, sounding.channel, sounding.pitch));
        }
        // Resume on a fresh pulse once bypass is lifted
        self.scheduler.reset();
    }

    fn step<T: TempoMap + ?Sized>(&mut self, block: &BlockContext, tempo: &T) {
        if self.chord.take_changed() {
            self.rebuild_pattern();
        }

        let due = self.scheduler.next_pulse(block, self.config.division);
        let horizon = due.map_or(block.sample_end, |due| due.sample);
        self.release_gated(block, horizon);

        let Some(due) = due else {
            return;
        };

        if let Some(sounding) = self.sounding.take() {
            self.generated
                .push(MidiMessage::note_off(due.offset, sounding.channel, sounding.pitch));
        }

        if !self.pattern.is_empty() {
            self.fire(&due, tempo);
            self.release_gated(block, block.sample_end);
        }
    }

    fn rebuild_pattern(&mut self) {
        self.pattern.rebuild(
            self.chord.notes(),
            self.config.octaves(),
            self.config.mode,
            self.chord.next_index(),
            &mut self.rng,
        );
        if self.pattern.is_empty() {
            self.chord.reset_index();
        }
        log::trace!("pattern rebuilt: {:?}", self.pattern.notes());
    }

    /// Send a gated note-off that falls before `horizon`
    fn release_gated(&mut self, block: &BlockContext, horizon: i64) {
        let Some(Sounding {
            pitch,
            channel,
            release_at: Some(release_at),
        }) = self.sounding
        else {
            return;
        };
        if release_at >= horizon {
            return;
        }

        let last = block.frames().saturating_sub(1) as i64;
        let offset = (release_at - block.sample_start).clamp(0, last) as u32;
        self.generated.push(MidiMessage::note_off(offset, channel, pitch));
        self.sounding = None;
    }

    fn fire<T: TempoMap + ?Sized>(&mut self, due: &DuePulse, tempo: &T) {
        let bbt = tempo.bbt_at(due.beat);
        if bbt.divisions_per_bar != self.divisions_per_bar {
            self.divisions_per_bar = bbt.divisions_per_bar;
            if let Err(err) = self.meter.recompute(&[bbt.divisions_per_bar]) {
                log::warn!("keeping meter {:?}: {}", self.meter.levels(), err);
            }
        }

        let position = bbt.beat_in_bar(tempo.ticks_per_beat());
        let weight = match self.meter.pulse_weight(position) {
            Ok(weight) => weight,
            Err(err) => {
                log::warn!("skipping pulse {}: {}", due.pulse, err);
                return;
            }
        };

        let normalized = weight.normalized();
        if !accent::passes_weight(normalized, &self.config) {
            return;
        }
        if !accent::roll(normalized, &self.config, &mut self.rng) {
            return;
        }

        let velocity = accent::velocity(normalized, self.config.min_velocity, self.config.max_velocity);
        let Some(pitch) = self.pattern.advance() else {
            return;
        };
        if velocity == 0 {
            return;
        }

        let channel = self.chord.channel();
        self.generated
            .push(MidiMessage::note_on(due.offset, channel, pitch, velocity));

        let release_at = (self.config.gate < 1.0)
            .then(|| due.sample + ((self.config.gate as f64 * due.spacing).round() as i64).max(1));
        self.sounding = Some(Sounding {
            pitch,
            channel,
            release_at,
        });

        log::trace!(
            "pulse {} at {:.3}: pitch {} velocity {} weight {}/{}",
            due.pulse,
            position,
            pitch,
            velocity,
            weight.weight,
            weight.resolution
        );

        self.last_step = Some(Step {
            pitch,
            velocity,
            weight,
            normalized,
            pulse: due.pulse,
            position,
            sample: due.sample,
        });
    }

    /// Write generated events merged with passed-through input, in offset
    /// order with generated events first on equal offsets
    fn merge_into<S: EventSink + ?Sized>(&mut self, input: &[MidiMessage], monitoring: bool, out: &mut S) {
        let mut passed = input
            .iter()
            .filter(|message| monitoring || !message.is_note())
            .peekable();

        let mut refused = 0;
        for generated in &self.generated {
            while let Some(message) = passed.next_if(|message| message.offset < generated.offset) {
                refused += u64::from(!out.send(*message));
            }
            refused += u64::from(!out.send(*generated));
        }
        for message in passed {
            refused += u64::from(!out.send(*message));
        }
        self.dropped += refused;
    }

    pub fn config(&self) -> &ArpConfig {
        &self.config
    }

    pub fn chord(&self) -> &ChordTracker {
        &self.chord
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn meter(&self) -> &MeterModel {
        &self.meter
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn last_step(&self) -> Option<&Step> {
        self.last_step.as_ref()
    }

    /// Output events lost to a full sink since the engine was created
    pub fn dropped_events(&self) -> u64 {
        self.dropped
    }

    /// Whether an arp note is currently on
    pub fn is_sounding(&self) -> bool {
        self.sounding.is_some()
    }
}

// Purpose - external interfaces, format conversions

pub mod converter;
pub mod host;
pub mod midi;

#[cfg(feature = "rtrb")]
use rtrb::Producer;

use self::midi::MidiMessage;

/// Destination for the engine's output events.
///
/// Events arrive in nondecreasing block offset order. `send` returns `false`
/// when the sink had no room and the event was lost.
pub trait EventSink {
    fn send(&mut self, message: MidiMessage) -> bool;
}

impl EventSink for Vec<MidiMessage> {
    fn send(&mut self, message: MidiMessage) -> bool {
        self.push(message);
        true
    }
}

#[cfg(feature = "rtrb")]
impl EventSink for Producer<MidiMessage> {
    fn send(&mut self, message: MidiMessage) -> bool {
        // Never block the audio thread on a full queue
        Producer::push(self, message).is_ok()
    }
}

#[cfg(all(test, feature = "rtrb"))]
mod tests {
    use super::*;
    use rtrb::RingBuffer;

    #[test]
    fn test_full_ring_reports_lost_event() {
        let (mut tx, mut rx) = RingBuffer::<MidiMessage>::new(1);
        assert!(tx.send(MidiMessage::note_on(0, 0, 60, 100)));
        assert!(!tx.send(MidiMessage::note_off(10, 0, 60)));

        assert_eq!(rx.pop().ok(), Some(MidiMessage::note_on(0, 0, 60, 100)));
        assert!(rx.pop().is_err());
    }
}

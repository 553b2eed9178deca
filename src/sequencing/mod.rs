pub mod chord;
pub mod pattern;
pub mod time_signature;

pub use chord::ChordTracker;
pub use pattern::{OctaveRange, Pattern, PatternMode};
pub use time_signature::TimeSignature;

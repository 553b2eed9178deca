pub mod config; // Arpeggiator controls
pub mod engine; // Per-block arpeggiator and pulse scheduling
pub mod io;
pub mod meter; // Barlow indispensability and meter tables
pub mod sequencing; // Chords, patterns and time signatures

pub use config::ArpConfig;
pub use engine::ArpEngine;
pub use sequencing::PatternMode;

pub const MAX_BLOCK_SIZE: usize = 2048;

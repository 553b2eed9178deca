//! Metrical weighting: prime factorization, Barlow indispensability and the
//! cached meter model used by the engine.

pub mod factor;
pub mod indispensability;
pub mod model;

pub use factor::factor;
pub use indispensability::{indispensability, prime_indispensability};
pub use model::{
    best_subdivision, MeterError, MeterModel, MeterTables, PulseWeight, Subdivision, MAX_BEATS,
    MAX_SUBDIVISION,
};

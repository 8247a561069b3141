//! Synthetic price paths for offline testing and replay.
//!
//! Generates (reference, oracle) point sequences where the oracle observes a
//! lagged, noisy copy of the reference path. Feeds the same pipeline as a
//! live tick source.

pub mod params;
pub mod simulator;

pub use params::SimulationParams;
pub use simulator::{simulate, Simulator};

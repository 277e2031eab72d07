// src/signal/mod.rs

pub mod engine;
pub mod phase;

pub use engine::{SignalCycleEngine, TickOutcome};
pub use phase::{Phase, PhaseTable};

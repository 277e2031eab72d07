// src/lib.rs
//
// Control loops for a simulated intersection signal and adaptive
// streetlight, sharing one guarded blackboard.

pub mod config;
pub mod console;
pub mod error;
pub mod metrics;
pub mod sessions;
pub mod shared_state;
pub mod signal;
pub mod status;
pub mod streetlight;
pub mod types;

pub use error::ControlError;
pub use shared_state::SharedControlState;
pub use status::StatusFacade;

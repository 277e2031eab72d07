// src/shared_state.rs
//
// Single blackboard for every device. One guard over everything: write
// rates are low and each critical section is O(1).
//
// Access only goes through closures, so the guard can never be held
// across an `.await`.

use crate::types::{
    EvRouteStatus, Frame, IncidentStatus, SignalConfig, SignalState, StreetlightState,
};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ControlState {
    pub signal: SignalState,
    pub ev_route: EvRouteStatus,
    pub incident: IncidentStatus,
    pub streetlight: StreetlightState,
    pub latest_frame: Option<Frame>,
}

impl ControlState {
    pub fn new(signal_config: &SignalConfig) -> Self {
        Self {
            signal: SignalState::new(signal_config.green_secs),
            ev_route: EvRouteStatus::default(),
            incident: IncidentStatus::default(),
            streetlight: StreetlightState::default(),
            latest_frame: None,
        }
    }
}

#[derive(Debug)]
pub struct SharedControlState {
    inner: Mutex<ControlState>,
}

impl SharedControlState {
    pub fn new(signal_config: &SignalConfig) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(ControlState::new(signal_config)),
        })
    }

    /// Read-modify-write under the guard.
    pub fn with<R>(&self, f: impl FnOnce(&mut ControlState) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    /// Read-only view under the guard.
    pub fn read<R>(&self, f: impl FnOnce(&ControlState) -> R) -> R {
        let guard = self.inner.lock();
        f(&guard)
    }

    /// Copy of the most recent camera frame; readers never alias the buffer.
    pub fn latest_frame(&self) -> Option<Frame> {
        self.read(|s| s.latest_frame.clone())
    }
}

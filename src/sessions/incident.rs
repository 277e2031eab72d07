// src/sessions/incident.rs
//
// Incident Session Manager. Same shape as the EV coordinator but with two
// timed stages: the incident clears (score bonus), then the bonus settles.

use super::timer::{resolve_runtime, SessionTimer};
use crate::error::ControlError;
use crate::metrics::ControlMetrics;
use crate::shared_state::SharedControlState;
use crate::types::{Ack, SessionConfig};
use rand::Rng;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{info, warn};

pub const INCIDENT_LOCATION: &str = "Main St & 1st Ave";
pub const INCIDENT_MESSAGE: &str = "Stalled Vehicle Detected";
pub const CLEARED_MESSAGE: &str = "Incident Cleared";
pub const ACTIVE_IMPACT: i32 = -30;
pub const CLEARED_IMPACT: RangeInclusive<i32> = 10..=20;

#[derive(Clone)]
pub struct IncidentManager {
    state: Arc<SharedControlState>,
    clear_after: Duration,
    settle_after: Duration,
    metrics: ControlMetrics,
    runtime: Option<Handle>,
}

impl IncidentManager {
    pub fn new(
        state: Arc<SharedControlState>,
        config: &SessionConfig,
        metrics: ControlMetrics,
    ) -> Self {
        Self {
            state,
            clear_after: Duration::from_secs(config.incident_clear_secs),
            settle_after: Duration::from_secs(config.incident_settle_secs),
            metrics,
            runtime: Handle::try_current().ok(),
        }
    }

    /// Schedule expiry timers on `runtime` instead of the one `new` ran in.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn trigger(&self) -> Result<Ack, ControlError> {
        let Some(runtime) = resolve_runtime(self.runtime.as_ref()) else {
            warn!("Incident trigger refused: no runtime for the session timers");
            return Err(ControlError::RuntimeUnavailable("Incident"));
        };

        let accepted = self.state.with(|s| {
            if s.incident.active {
                return false;
            }
            s.incident.active = true;
            s.incident.location = Some(INCIDENT_LOCATION.to_string());
            s.incident.message = Some(INCIDENT_MESSAGE.to_string());
            s.incident.optimization_impact = ACTIVE_IMPACT;
            true
        });

        if !accepted {
            self.metrics.inc(&self.metrics.rejected_triggers);
            warn!("Incident trigger rejected: incident already active");
            return Err(ControlError::AlreadyActive("Incident"));
        }

        self.metrics.inc(&self.metrics.incident_triggers);
        info!("⚠️  INCIDENT TRIGGERED at {}", INCIDENT_LOCATION);

        let clear_state = Arc::clone(&self.state);
        let settle_state = Arc::clone(&self.state);
        SessionTimer::new("incident")
            .then_after(self.clear_after, move || {
                let bonus = rand::thread_rng().gen_range(CLEARED_IMPACT);
                clear_state.with(|s| {
                    s.incident.active = false;
                    s.incident.location = None;
                    s.incident.message = Some(CLEARED_MESSAGE.to_string());
                    s.incident.optimization_impact = bonus;
                });
                info!("✓ Incident cleared, traffic flow optimized (+{})", bonus);
            })
            .then_after(self.settle_after, move || {
                settle_state.with(|s| {
                    // a newer incident started after the clear stage owns these fields now
                    if !s.incident.active {
                        s.incident.optimization_impact = 0;
                        s.incident.message = None;
                    }
                });
            })
            .spawn(&runtime);

        Ok(Ack::success("Incident triggered."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IncidentStatus, SignalConfig};

    fn manager() -> (Arc<SharedControlState>, IncidentManager) {
        let state = SharedControlState::new(&SignalConfig::default());
        let manager = IncidentManager::new(
            Arc::clone(&state),
            &SessionConfig::default(),
            ControlMetrics::new(),
        );
        (state, manager)
    }

    fn incident(state: &SharedControlState) -> IncidentStatus {
        state.read(|s| s.incident.clone())
    }

    #[tokio::test(start_paused = true)]
    async fn test_incident_timeline() {
        let (state, manager) = manager();
        manager.trigger().unwrap();

        let at_start = incident(&state);
        assert!(at_start.active);
        assert_eq!(at_start.optimization_impact, -30);
        assert_eq!(at_start.location.as_deref(), Some(INCIDENT_LOCATION));
        assert_eq!(at_start.message.as_deref(), Some(INCIDENT_MESSAGE));

        tokio::time::sleep(Duration::from_millis(15_100)).await;
        let cleared = incident(&state);
        assert!(!cleared.active);
        assert!(cleared.location.is_none());
        assert_eq!(cleared.message.as_deref(), Some(CLEARED_MESSAGE));
        assert!(CLEARED_IMPACT.contains(&cleared.optimization_impact));

        tokio::time::sleep(Duration::from_secs(10)).await;
        let settled = incident(&state);
        assert_eq!(settled.optimization_impact, 0);
        assert!(settled.message.is_none());
        assert!(!settled.active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_rejected_while_active() {
        let (state, manager) = manager();
        manager.trigger().unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(manager.trigger(), Err(ControlError::AlreadyActive("Incident")));
        assert_eq!(incident(&state).optimization_impact, -30);

        // After the clear stage a new incident may start
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(manager.trigger().is_ok());
        assert_eq!(incident(&state).optimization_impact, -30);

        // The first session's settle stage (t=25s) leaves the new incident alone
        tokio::time::sleep(Duration::from_secs(10)).await;
        let current = incident(&state);
        assert!(current.active);
        assert_eq!(current.optimization_impact, -30);
        assert_eq!(current.message.as_deref(), Some(INCIDENT_MESSAGE));
    }

    #[test]
    fn test_trigger_from_plain_thread_runs_both_stages() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();
        let state = SharedControlState::new(&SignalConfig::default());
        let manager = IncidentManager::new(
            Arc::clone(&state),
            &SessionConfig::default(),
            ControlMetrics::new(),
        )
        .with_runtime(rt.handle().clone());

        let caller = manager.clone();
        assert!(std::thread::spawn(move || caller.trigger()).join().unwrap().is_ok());
        assert!(incident(&state).active);

        rt.block_on(async { tokio::time::sleep(Duration::from_secs(26)).await });
        let settled = incident(&state);
        assert!(!settled.active);
        assert_eq!(settled.optimization_impact, 0);

        // a fresh incident is accepted once the session has run its course
        assert!(std::thread::spawn(move || manager.trigger()).join().unwrap().is_ok());
    }

    #[test]
    fn test_trigger_without_runtime_leaves_state_untouched() {
        let (state, manager) = manager();
        assert_eq!(
            manager.trigger(),
            Err(ControlError::RuntimeUnavailable("Incident"))
        );
        assert_eq!(incident(&state), IncidentStatus::default());
    }
}

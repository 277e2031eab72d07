// src/sessions/ev_route.rs
//
// EV Override Coordinator. Trigger raises `ev_route.active`; the session's
// own expiry is the only writer that lowers it.

use super::timer::{resolve_runtime, SessionTimer};
use crate::error::ControlError;
use crate::metrics::ControlMetrics;
use crate::shared_state::SharedControlState;
use crate::types::{Ack, SessionConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{info, warn};

#[derive(Clone)]
pub struct EvRouteCoordinator {
    state: Arc<SharedControlState>,
    duration: Duration,
    metrics: ControlMetrics,
    runtime: Option<Handle>,
}

impl EvRouteCoordinator {
    pub fn new(
        state: Arc<SharedControlState>,
        config: &SessionConfig,
        metrics: ControlMetrics,
    ) -> Self {
        Self {
            state,
            duration: Duration::from_secs(config.ev_route_secs),
            metrics,
            runtime: Handle::try_current().ok(),
        }
    }

    /// Schedule expiry timers on `runtime` instead of the one `new` ran in.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Start an EV priority session. Rejected, not queued, while one runs.
    pub fn trigger(&self) -> Result<Ack, ControlError> {
        // no runtime means no expiry, so refuse before raising the flag
        let Some(runtime) = resolve_runtime(self.runtime.as_ref()) else {
            warn!("EV route trigger refused: no runtime for the expiry timer");
            return Err(ControlError::RuntimeUnavailable("EV Route"));
        };

        let route = self.state.with(|s| {
            if s.ev_route.active {
                None
            } else {
                s.ev_route.active = true;
                Some(s.ev_route.route_name.clone())
            }
        });

        let Some(route) = route else {
            self.metrics.inc(&self.metrics.rejected_triggers);
            warn!("EV route trigger rejected: session already active");
            return Err(ControlError::AlreadyActive("EV Route"));
        };

        self.metrics.inc(&self.metrics.ev_triggers);
        info!(
            "🚑 EV PRIORITY ROUTE TRIGGERED: {} ({}s)",
            route,
            self.duration.as_secs()
        );

        let state = Arc::clone(&self.state);
        SessionTimer::new("ev-route")
            .then_after(self.duration, move || {
                state.with(|s| s.ev_route.active = false);
                info!("🚑 EV route cleared, resuming normal operation");
            })
            .spawn(&runtime);

        Ok(Ack::success("EV Route triggered."))
    }

    pub fn is_active(&self) -> bool {
        self.state.read(|s| s.ev_route.active)
    }
}

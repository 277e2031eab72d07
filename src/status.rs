// src/status.rs
//
// Status Query Facade: the only surface a transport layer needs. Snapshots
// are copied under the guard and returned after it is released.

use crate::error::ControlError;
use crate::metrics::{ControlMetrics, MetricsSummary};
use crate::sessions::{EvRouteCoordinator, IncidentManager};
use crate::shared_state::SharedControlState;
use crate::streetlight::{FrameStream, StreetlightController};
use crate::types::{
    Ack, Brightness, EvRouteStatus, IncidentStatus, SignalState, StreetlightMode,
    StreetlightState,
};
use anyhow::{Context, Result};
use rand::Rng;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

pub const BASE_SCORE: RangeInclusive<i32> = 60..=80;

#[derive(Debug, Clone, Serialize)]
pub struct SignalSnapshot {
    pub signal_state: SignalState,
    pub ev_route: EvRouteStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub optimization_score: u32,
    pub incident: IncidentStatus,
    pub ev_route: EvRouteStatus,
}

/// `max(0, base + impact)` with base drawn from [`BASE_SCORE`].
pub fn optimization_score(impact: i32, rng: &mut impl Rng) -> u32 {
    let base = rng.gen_range(BASE_SCORE);
    (base + impact).max(0) as u32
}

#[derive(Clone)]
pub struct StatusFacade {
    state: Arc<SharedControlState>,
    ev_route: EvRouteCoordinator,
    incident: IncidentManager,
    streetlight: StreetlightController,
    metrics: ControlMetrics,
}

impl StatusFacade {
    pub fn new(
        state: Arc<SharedControlState>,
        ev_route: EvRouteCoordinator,
        incident: IncidentManager,
        streetlight: StreetlightController,
        metrics: ControlMetrics,
    ) -> Self {
        Self {
            state,
            ev_route,
            incident,
            streetlight,
            metrics,
        }
    }

    pub fn signal_snapshot(&self) -> SignalSnapshot {
        self.state.read(|s| SignalSnapshot {
            signal_state: s.signal,
            ev_route: s.ev_route.clone(),
        })
    }

    pub fn streetlight_snapshot(&self) -> StreetlightState {
        self.state.read(|s| s.streetlight)
    }

    pub fn dashboard_snapshot(&self) -> DashboardSnapshot {
        let (incident, ev_route) = self
            .state
            .read(|s| (s.incident.clone(), s.ev_route.clone()));
        DashboardSnapshot {
            optimization_score: optimization_score(
                incident.optimization_impact,
                &mut rand::thread_rng(),
            ),
            incident,
            ev_route,
        }
    }

    pub fn metrics(&self) -> MetricsSummary {
        self.metrics.summary()
    }

    pub fn trigger_incident(&self) -> Result<Ack, ControlError> {
        self.incident.trigger()
    }

    pub fn trigger_ev_route(&self) -> Result<Ack, ControlError> {
        self.ev_route.trigger()
    }

    pub fn set_streetlight_mode(&self, mode: &str) -> Result<StreetlightMode, ControlError> {
        self.streetlight.set_mode(mode)
    }

    pub fn set_brightness(&self, channel: &str, value: i64) -> Result<Brightness, ControlError> {
        self.streetlight.set_brightness(channel, value)
    }

    pub fn stream_frames(&self) -> FrameStream {
        FrameStream::new(Arc::clone(&self.state))
    }
}

// ============================================================================
// PERIODIC REPORTER
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub signal: SignalSnapshot,
    pub streetlight: StreetlightState,
    pub dashboard: DashboardSnapshot,
    pub metrics: MetricsSummary,
}

impl StatusFacade {
    pub fn report(&self) -> StatusReport {
        StatusReport {
            signal: self.signal_snapshot(),
            streetlight: self.streetlight_snapshot(),
            dashboard: self.dashboard_snapshot(),
            metrics: self.metrics(),
        }
    }
}

/// Logs a [`StatusReport`] every `interval`, appending each one to a JSONL
/// file when configured.
pub struct StatusReporter {
    facade: StatusFacade,
    interval: Duration,
    log: Option<File>,
}

impl StatusReporter {
    pub fn new(facade: StatusFacade, interval: Duration, log_path: Option<&Path>) -> Result<Self> {
        let log = match log_path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create {}", parent.display()))?;
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("Failed to open status log {}", path.display()))?;
                info!("💾 Status reports will be appended to: {}", path.display());
                Some(file)
            }
            None => None,
        };
        Ok(Self {
            facade,
            interval,
            log,
        })
    }

    pub fn report_once(&mut self) -> StatusReport {
        let report = self.facade.report();
        let signal = &report.signal.signal_state;
        info!(
            "📊 signal ns={:?} ew={:?} timer={} ev={} | light {} a={} b={} motion={} | score={} incident={} | fps={:.1}",
            signal.ns,
            signal.ew,
            signal.timer,
            report.signal.ev_route.active,
            report.streetlight.mode.as_str(),
            report.streetlight.brightness.channel_a,
            report.streetlight.brightness.channel_b,
            report.streetlight.motion_detected,
            report.dashboard.optimization_score,
            report.dashboard.incident.active,
            report.metrics.camera_fps,
        );

        if let Some(file) = self.log.as_mut() {
            let written = serde_json::to_string(&report)
                .map_err(anyhow::Error::from)
                .and_then(|line| writeln!(file, "{}", line).map_err(anyhow::Error::from));
            if let Err(e) = written {
                warn!("Failed to append status report: {}", e);
            }
        }
        report
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.report_once();
                }
                _ = shutdown.changed() => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{Phase, SignalCycleEngine};
    use crate::streetlight::{FrameDiffClassifier, NullLightSink};
    use crate::types::{Config, SignalColor};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    struct Stack {
        facade: StatusFacade,
        engine: SignalCycleEngine,
    }

    fn stack() -> Stack {
        let config = Config::default();
        let metrics = ControlMetrics::new();
        let state = SharedControlState::new(&config.signal);
        let streetlight = StreetlightController::new(
            Arc::clone(&state),
            &config.streetlight,
            Box::new(NullLightSink),
            Arc::new(FrameDiffClassifier::new(config.streetlight.motion_threshold)),
            metrics.clone(),
        );
        let facade = StatusFacade::new(
            Arc::clone(&state),
            EvRouteCoordinator::new(Arc::clone(&state), &config.sessions, metrics.clone()),
            IncidentManager::new(Arc::clone(&state), &config.sessions, metrics.clone()),
            streetlight,
            metrics.clone(),
        );
        let engine = SignalCycleEngine::new(state, &config.signal, metrics);
        Stack { facade, engine }
    }

    #[test]
    fn test_score_clamped_at_zero() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let score = optimization_score(-30, &mut rng);
            assert!((30..=50).contains(&score));
            assert_eq!(optimization_score(-500, &mut rng), 0);
            let boosted = optimization_score(20, &mut rng);
            assert!((80..=100).contains(&boosted));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ev_session_through_facade() {
        let stack = stack();
        stack.engine.tick();

        stack.facade.trigger_ev_route().unwrap();
        assert!(stack.facade.trigger_ev_route().unwrap_err().is_conflict());

        stack.engine.tick();
        let snapshot = stack.facade.signal_snapshot();
        assert!(snapshot.ev_route.active);
        assert_eq!(snapshot.signal_state.ns, SignalColor::Green);
        assert_eq!(snapshot.signal_state.timer, 99);

        tokio::time::sleep(Duration::from_millis(30_100)).await;
        stack.engine.tick();
        let snapshot = stack.facade.signal_snapshot();
        assert!(!snapshot.ev_route.active);
        assert_eq!(snapshot.signal_state.phase, Phase::NsGreen);
        assert_eq!(snapshot.signal_state.timer, 15);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dashboard_reflects_incident() {
        let stack = stack();
        let ack = stack.facade.trigger_incident().unwrap();
        assert_eq!(ack.status, "success");

        let dashboard = stack.facade.dashboard_snapshot();
        assert!(dashboard.incident.active);
        assert!((30..=50).contains(&dashboard.optimization_score));

        tokio::time::sleep(Duration::from_secs(26)).await;
        let dashboard = stack.facade.dashboard_snapshot();
        assert_eq!(dashboard.incident.optimization_impact, 0);
        assert!((60..=80).contains(&dashboard.optimization_score));
    }

    #[test]
    fn test_streetlight_controls_through_facade() {
        let stack = stack();
        assert_eq!(
            stack.facade.set_brightness("a", 10),
            Err(ControlError::ModeConflict)
        );
        assert!(stack.facade.set_streetlight_mode("sideways").unwrap_err().is_validation());

        stack.facade.set_streetlight_mode("manual").unwrap();
        stack.facade.set_brightness("b", 200).unwrap();

        let light = stack.facade.streetlight_snapshot();
        assert_eq!(light.mode, StreetlightMode::Manual);
        assert_eq!(light.brightness, Brightness::new(0, 200));
    }

    #[test]
    fn test_snapshots_serialize_for_transport() {
        let stack = stack();
        let json = serde_json::to_value(stack.facade.signal_snapshot()).unwrap();
        assert_eq!(json["signal_state"]["ns"], "green");
        assert_eq!(json["signal_state"]["ew"], "red");
        assert_eq!(json["signal_state"]["timer"], 15);
        assert_eq!(json["ev_route"]["route_name"], "City Hospital Route");

        let json = serde_json::to_value(stack.facade.streetlight_snapshot()).unwrap();
        assert_eq!(json["mode"], "auto");
        assert_eq!(json["brightness"]["channel_a"], 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reporter_appends_jsonl() {
        let stack = stack();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("status.jsonl");

        let mut reporter =
            StatusReporter::new(stack.facade.clone(), Duration::from_secs(5), Some(&path)).unwrap();
        reporter.report_once();
        stack.facade.trigger_incident().unwrap();
        reporter.report_once();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["dashboard"]["incident"]["active"], false);
        assert_eq!(lines[1]["dashboard"]["incident"]["active"], true);
        assert_eq!(lines[1]["metrics"]["incident_triggers"], 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reporter_stops_on_shutdown() {
        let stack = stack();
        let reporter = StatusReporter::new(stack.facade, Duration::from_secs(5), None).unwrap();
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(reporter.run(rx));

        tokio::time::sleep(Duration::from_secs(12)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}

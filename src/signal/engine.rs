// src/signal/engine.rs
//
// Signal Cycle Engine: one tick per second over the phase table, with
// EV priority checked first on every tick.
//
// When an EV route ends the cycle restarts at NS-Green with a full green
// countdown. NS is already green during the override, so the hand-back
// never shows a green→red jump without yellow.

use super::phase::{Phase, PhaseTable};
use crate::metrics::ControlMetrics;
use crate::shared_state::SharedControlState;
use crate::types::{SignalConfig, SignalState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer decremented within the current phase
    Countdown,
    Advanced { from: Phase, to: Phase },
    PreemptStarted,
    Preempted,
    /// First tick after the EV route cleared
    Resumed,
}

/// Pure transition for one tick.
pub fn step(
    signal: &mut SignalState,
    ev_active: bool,
    table: &PhaseTable,
    preempt_timer: u32,
) -> TickOutcome {
    if ev_active {
        let already = signal.preempted;
        signal.enter(Phase::NsGreen, preempt_timer);
        signal.preempted = true;
        return if already {
            TickOutcome::Preempted
        } else {
            TickOutcome::PreemptStarted
        };
    }

    if signal.preempted {
        signal.preempted = false;
        signal.enter(Phase::NsGreen, table.duration(Phase::NsGreen));
        return TickOutcome::Resumed;
    }

    if signal.timer > 0 {
        signal.timer -= 1;
        return TickOutcome::Countdown;
    }

    let from = signal.phase;
    let (to, duration) = table.advance(from);
    signal.enter(to, duration);
    TickOutcome::Advanced { from, to }
}

pub struct SignalCycleEngine {
    state: Arc<SharedControlState>,
    table: PhaseTable,
    preempt_timer: u32,
    tick_interval: Duration,
    metrics: ControlMetrics,
}

impl SignalCycleEngine {
    pub fn new(
        state: Arc<SharedControlState>,
        config: &SignalConfig,
        metrics: ControlMetrics,
    ) -> Self {
        Self {
            state,
            table: PhaseTable::from_config(config),
            preempt_timer: config.preempt_timer,
            tick_interval: Duration::from_millis(config.tick_interval_ms.max(1)),
            metrics,
        }
    }

    /// Run one tick under the guard, then log outside it.
    pub fn tick(&self) -> TickOutcome {
        let (outcome, snapshot) = self.state.with(|s| {
            let ev_active = s.ev_route.active;
            let outcome = step(&mut s.signal, ev_active, &self.table, self.preempt_timer);
            (outcome, s.signal)
        });

        self.metrics.inc(&self.metrics.signal_ticks);
        match outcome {
            TickOutcome::Countdown => {}
            TickOutcome::Advanced { from, to } => {
                self.metrics.inc(&self.metrics.phase_changes);
                debug!(
                    "🚦 {} -> {} ({}s)",
                    from.as_str(),
                    to.as_str(),
                    snapshot.timer
                );
            }
            TickOutcome::PreemptStarted => {
                self.metrics.inc(&self.metrics.preempted_ticks);
                info!("🚑 EV priority: NS forced green");
            }
            TickOutcome::Preempted => {
                self.metrics.inc(&self.metrics.preempted_ticks);
            }
            TickOutcome::Resumed => {
                info!("🚦 EV priority released, cycle restarts at NS-GREEN");
            }
        }
        outcome
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval fires immediately; the first transition belongs one period later
        ticker.tick().await;

        info!(
            "✓ Signal cycle engine started ({}ms tick)",
            self.tick_interval.as_millis()
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Signal cycle engine stopped");
    }
}

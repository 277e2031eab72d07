// src/metrics.rs
//
// Counters for every control loop. Cheap to clone; all clones share the
// same atomics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct ControlMetrics {
    pub signal_ticks: Arc<AtomicU64>,
    pub phase_changes: Arc<AtomicU64>,
    pub preempted_ticks: Arc<AtomicU64>,
    pub ev_triggers: Arc<AtomicU64>,
    pub incident_triggers: Arc<AtomicU64>,
    pub rejected_triggers: Arc<AtomicU64>,
    pub frames_captured: Arc<AtomicU64>,
    pub camera_misses: Arc<AtomicU64>,
    pub motion_cycles: Arc<AtomicU64>,
    pub sink_failures: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl ControlMetrics {
    pub fn new() -> Self {
        Self {
            signal_ticks: Arc::new(AtomicU64::new(0)),
            phase_changes: Arc::new(AtomicU64::new(0)),
            preempted_ticks: Arc::new(AtomicU64::new(0)),
            ev_triggers: Arc::new(AtomicU64::new(0)),
            incident_triggers: Arc::new(AtomicU64::new(0)),
            rejected_triggers: Arc::new(AtomicU64::new(0)),
            frames_captured: Arc::new(AtomicU64::new(0)),
            camera_misses: Arc::new(AtomicU64::new(0)),
            motion_cycles: Arc::new(AtomicU64::new(0)),
            sink_failures: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }

    pub fn camera_fps(&self) -> f64 {
        let frames = self.frames_captured.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            signal_ticks: self.signal_ticks.load(Ordering::Relaxed),
            phase_changes: self.phase_changes.load(Ordering::Relaxed),
            preempted_ticks: self.preempted_ticks.load(Ordering::Relaxed),
            ev_triggers: self.ev_triggers.load(Ordering::Relaxed),
            incident_triggers: self.incident_triggers.load(Ordering::Relaxed),
            rejected_triggers: self.rejected_triggers.load(Ordering::Relaxed),
            frames_captured: self.frames_captured.load(Ordering::Relaxed),
            camera_misses: self.camera_misses.load(Ordering::Relaxed),
            motion_cycles: self.motion_cycles.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
            camera_fps: self.camera_fps(),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

impl Default for ControlMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub signal_ticks: u64,
    pub phase_changes: u64,
    pub preempted_ticks: u64,
    pub ev_triggers: u64,
    pub incident_triggers: u64,
    pub rejected_triggers: u64,
    pub frames_captured: u64,
    pub camera_misses: u64,
    pub motion_cycles: u64,
    pub sink_failures: u64,
    pub camera_fps: f64,
    pub elapsed_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_counters() {
        let metrics = ControlMetrics::new();
        let clone = metrics.clone();
        clone.inc(&clone.signal_ticks);
        clone.inc(&clone.signal_ticks);
        metrics.inc(&metrics.sink_failures);

        let summary = metrics.summary();
        assert_eq!(summary.signal_ticks, 2);
        assert_eq!(summary.sink_failures, 1);
        assert_eq!(summary.ev_triggers, 0);
    }
}

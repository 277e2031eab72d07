// src/streetlight/controller.rs
//
// Streetlight Adaptive Controller. Owns the light sink; every brightness
// change, automatic or manual, reaches the hardware through here.
//
// Auto:   motion -> ramp toward full, no motion -> ramp toward dim
// Manual: brightness only changes through `set_brightness`

use super::camera::FrameSource;
use super::fade::fade_step;
use super::hardware::LightSink;
use super::motion::MotionClassifier;
use crate::error::ControlError;
use crate::metrics::ControlMetrics;
use crate::shared_state::SharedControlState;
use crate::types::{Brightness, Channel, Frame, StreetlightConfig, StreetlightMode};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct FadeSettings {
    pub step: u8,
    pub dim: Brightness,
    pub motion: Brightness,
}

impl FadeSettings {
    pub fn from_config(config: &StreetlightConfig) -> Self {
        Self {
            step: config.fade_step,
            dim: Brightness::uniform(config.dim_brightness),
            motion: Brightness::uniform(config.motion_brightness),
        }
    }

    pub fn target(&self, motion: bool) -> Brightness {
        if motion {
            self.motion
        } else {
            self.dim
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    CameraUnavailable,
    /// First frame after start; nothing to compare against yet
    Primed,
    Manual,
    Faded { motion: bool, brightness: Brightness },
}

#[derive(Clone)]
pub struct StreetlightController {
    state: Arc<SharedControlState>,
    sink: Arc<Mutex<Box<dyn LightSink>>>,
    classifier: Arc<dyn MotionClassifier>,
    settings: FadeSettings,
    tick_interval: Duration,
    camera_retry: Duration,
    metrics: ControlMetrics,
}

impl StreetlightController {
    pub fn new(
        state: Arc<SharedControlState>,
        config: &StreetlightConfig,
        sink: Box<dyn LightSink>,
        classifier: Arc<dyn MotionClassifier>,
        metrics: ControlMetrics,
    ) -> Self {
        Self {
            state,
            sink: Arc::new(Mutex::new(sink)),
            classifier,
            settings: FadeSettings::from_config(config),
            tick_interval: Duration::from_millis(config.tick_interval_ms.max(1)),
            camera_retry: Duration::from_millis(config.camera_retry_ms),
            metrics,
        }
    }

    /// One control cycle. `prev` carries the previous frame between cycles.
    pub fn cycle(&self, source: &mut dyn FrameSource, prev: &mut Option<Frame>) -> CycleOutcome {
        let Some(frame) = source.capture() else {
            self.metrics.inc(&self.metrics.camera_misses);
            return CycleOutcome::CameraUnavailable;
        };
        self.metrics.inc(&self.metrics.frames_captured);

        let mode = self.state.with(|s| {
            s.latest_frame = Some(frame.clone());
            s.streetlight.mode
        });

        let outcome = match (mode, prev.as_ref()) {
            (StreetlightMode::Manual, _) => CycleOutcome::Manual,
            (StreetlightMode::Auto, None) => CycleOutcome::Primed,
            (StreetlightMode::Auto, Some(previous)) => {
                // classification runs outside the guard
                let motion = self.classifier.has_motion(previous, &frame);
                self.apply_auto(motion)
            }
        };

        *prev = Some(frame);
        outcome
    }

    fn apply_auto(&self, motion: bool) -> CycleOutcome {
        match self.fade_to(self.settings.target(motion), motion) {
            Ok(brightness) => {
                if motion {
                    self.metrics.inc(&self.metrics.motion_cycles);
                }
                CycleOutcome::Faded { motion, brightness }
            }
            // mode flipped while classifying
            Err(_) => CycleOutcome::Manual,
        }
    }

    /// One ramp step toward `target`, persisted and sent to the sink.
    /// Only valid in auto mode; manual brightness goes through `set_brightness`.
    pub fn fade_to(&self, target: Brightness, motion: bool) -> Result<Brightness, ControlError> {
        let step = self.settings.step;
        // sink before state, so hardware writes land in state order
        let mut sink = self.sink.lock();
        let next = self.state.with(|s| {
            if s.streetlight.mode != StreetlightMode::Auto {
                return Err(ControlError::ModeConflict);
            }
            s.streetlight.motion_detected = motion;
            let next = fade_step(s.streetlight.brightness, target, step);
            s.streetlight.brightness = next;
            Ok(next)
        })?;
        self.write_locked(&mut **sink, next);
        Ok(next)
    }

    pub fn set_mode(&self, mode: &str) -> Result<StreetlightMode, ControlError> {
        let mode: StreetlightMode = mode.parse()?;
        self.state.with(|s| s.streetlight.mode = mode);
        info!("💡 Streetlight mode changed to: {}", mode.as_str());
        Ok(mode)
    }

    /// Manual override of one channel, applied immediately without the ramp.
    pub fn set_brightness(&self, channel: &str, value: i64) -> Result<Brightness, ControlError> {
        let mut sink = self.sink.lock();
        let result = self.state.with(|s| {
            if s.streetlight.mode != StreetlightMode::Manual {
                return Err(ControlError::ModeConflict);
            }
            let level = u8::try_from(value).map_err(|_| ControlError::InvalidValue(value))?;
            let channel: Channel = channel.parse()?;
            let next = s.streetlight.brightness.with_channel(channel, level);
            s.streetlight.brightness = next;
            Ok(next)
        });

        let brightness = result.inspect_err(|e| debug!("Brightness request rejected: {}", e))?;
        self.write_locked(&mut **sink, brightness);
        drop(sink);
        info!(
            "💡 Manual brightness: A={} B={}",
            brightness.channel_a, brightness.channel_b
        );
        Ok(brightness)
    }

    /// Best effort: failures are logged, in-memory state is already updated.
    fn write_locked(&self, sink: &mut dyn LightSink, brightness: Brightness) {
        if let Err(e) = sink.write_channels(brightness.channel_a, brightness.channel_b) {
            self.metrics.inc(&self.metrics.sink_failures);
            warn!("Streetlight write error: {:#}", e);
        }
    }

    pub async fn run(self, mut source: Box<dyn FrameSource>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut prev: Option<Frame> = None;
        let mut camera_down = false;

        info!(
            "✓ Streetlight controller started ({}ms tick)",
            self.tick_interval.as_millis()
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.cycle(source.as_mut(), &mut prev) {
                        CycleOutcome::CameraUnavailable => {
                            if !camera_down {
                                warn!("⚠️  Camera unavailable, retrying");
                                camera_down = true;
                            }
                            tokio::select! {
                                _ = tokio::time::sleep(self.camera_retry) => {}
                                _ = shutdown.changed() => break,
                            }
                        }
                        _ if camera_down => {
                            info!("✓ Camera recovered");
                            camera_down = false;
                        }
                        _ => {}
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Streetlight controller stopped");
    }
}

use crate::error::ControlError;
use crate::signal::Phase;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub signal: SignalConfig,
    pub sessions: SessionConfig,
    pub streetlight: StreetlightConfig,
    pub camera: CameraConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub tick_interval_ms: u64,
    pub green_secs: u32,
    pub yellow_secs: u32,
    pub all_red_secs: u32,
    /// Timer value displayed while an EV route holds the intersection
    pub preempt_timer: u32,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            green_secs: 15,
            yellow_secs: 3,
            all_red_secs: 2,
            preempt_timer: 99,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub ev_route_secs: u64,
    pub incident_clear_secs: u64,
    pub incident_settle_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ev_route_secs: 30,
            incident_clear_secs: 15,
            incident_settle_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreetlightConfig {
    pub tick_interval_ms: u64,
    pub camera_retry_ms: u64,
    pub fade_step: u8,
    pub dim_brightness: u8,
    pub motion_brightness: u8,
    /// Changed-pixel count above which a frame pair counts as motion
    pub motion_threshold: usize,
    pub serial_port: Option<String>,
}

impl Default for StreetlightConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 50,
            camera_retry_ms: 500,
            fade_step: 5,
            dim_brightness: 50,
            motion_brightness: 255,
            motion_threshold: 5000,
            serial_port: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraSourceKind {
    Synthetic,
    Directory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub source: CameraSourceKind,
    pub directory: String,
    pub width: usize,
    pub height: usize,
    /// Synthetic camera: frames per quiet/traffic cycle (traffic fills the second half)
    pub synthetic_period_frames: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            source: CameraSourceKind::Synthetic,
            directory: "frames".to_string(),
            width: 320,
            height: 240,
            synthetic_period_frames: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub status_log: Option<String>,
    pub status_interval_secs: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            status_log: None,
            status_interval_secs: 5,
        }
    }
}

// ============================================================================
// FRAMES
// ============================================================================

/// Raw RGB frame, row-major, 3 bytes per pixel.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub timestamp_ms: f64,
}

impl Frame {
    pub fn is_well_formed(&self) -> bool {
        self.width > 0 && self.height > 0 && self.data.len() == self.width * self.height * 3
    }

    pub fn same_shape(&self, other: &Frame) -> bool {
        self.width == other.width && self.height == other.height
    }
}

// ============================================================================
// SIGNAL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalColor {
    Green,
    Yellow,
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignalState {
    /// North/South axis
    pub ns: SignalColor,
    /// East/West axis
    pub ew: SignalColor,
    /// Seconds left in the current phase
    pub timer: u32,
    pub phase: Phase,
    /// Set while an EV route holds NS green
    pub preempted: bool,
}

impl SignalState {
    pub fn new(green_secs: u32) -> Self {
        let (ns, ew) = Phase::NsGreen.colors();
        Self {
            ns,
            ew,
            timer: green_secs,
            phase: Phase::NsGreen,
            preempted: false,
        }
    }

    /// Enter `phase` with a fresh countdown.
    pub fn enter(&mut self, phase: Phase, timer: u32) {
        let (ns, ew) = phase.colors();
        self.ns = ns;
        self.ew = ew;
        self.phase = phase;
        self.timer = timer;
    }

    /// Conflicting greens never coexist, and at most one axis is lit.
    pub fn is_consistent(&self) -> bool {
        let ns_lit = self.ns != SignalColor::Red;
        let ew_lit = self.ew != SignalColor::Red;
        !(ns_lit && ew_lit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvRouteStatus {
    pub active: bool,
    pub route_name: String,
    pub affected_lights: Vec<String>,
    pub message: String,
}

impl Default for EvRouteStatus {
    fn default() -> Self {
        Self {
            active: false,
            route_name: "City Hospital Route".to_string(),
            affected_lights: vec!["Main St NS".to_string()],
            message: "Ambulance en route on Main St".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IncidentStatus {
    pub active: bool,
    pub location: Option<String>,
    pub message: Option<String>,
    pub optimization_impact: i32,
}

// ============================================================================
// STREETLIGHT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreetlightMode {
    Auto,
    Manual,
}

impl StreetlightMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreetlightMode::Auto => "auto",
            StreetlightMode::Manual => "manual",
        }
    }
}

impl FromStr for StreetlightMode {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(StreetlightMode::Auto),
            "manual" => Ok(StreetlightMode::Manual),
            _ => Err(ControlError::InvalidMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Channel {
    A,
    B,
}

impl FromStr for Channel {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" | "LED1" => Ok(Channel::A),
            "B" | "LED2" => Ok(Channel::B),
            _ => Err(ControlError::InvalidChannel(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Brightness {
    pub channel_a: u8,
    pub channel_b: u8,
}

impl Brightness {
    pub const fn new(channel_a: u8, channel_b: u8) -> Self {
        Self {
            channel_a,
            channel_b,
        }
    }

    pub const fn uniform(level: u8) -> Self {
        Self::new(level, level)
    }

    pub fn with_channel(self, channel: Channel, value: u8) -> Self {
        match channel {
            Channel::A => Self::new(value, self.channel_b),
            Channel::B => Self::new(self.channel_a, value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreetlightState {
    pub mode: StreetlightMode,
    pub motion_detected: bool,
    pub brightness: Brightness,
}

impl Default for StreetlightState {
    fn default() -> Self {
        Self {
            mode: StreetlightMode::Auto,
            motion_detected: false,
            brightness: Brightness::default(),
        }
    }
}

/// Acknowledgement returned by session triggers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub status: &'static str,
    pub message: String,
}

impl Ack {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
        }
    }
}

// src/streetlight/mod.rs

pub mod camera;
pub mod controller;
pub mod fade;
pub mod hardware;
pub mod motion;
pub mod stream;

pub use camera::{open_source, DirectoryCamera, FrameSource, SyntheticCamera};
pub use controller::{CycleOutcome, FadeSettings, StreetlightController};
pub use hardware::{open_sink, LightSink, NullLightSink, SerialLightSink};
pub use motion::{FrameDiffClassifier, MotionClassifier};
pub use stream::FrameStream;

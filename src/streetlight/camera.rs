// src/streetlight/camera.rs
//
// Frame sources for the streetlight loop. `None` from `capture` means the
// camera is unavailable for this cycle; the controller skips and retries.

use crate::types::{CameraConfig, CameraSourceKind, Frame};
use anyhow::{Context, Result};
use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};
use walkdir::WalkDir;

pub trait FrameSource: Send {
    fn capture(&mut self) -> Option<Frame>;
}

pub fn open_source(config: &CameraConfig) -> Result<Box<dyn FrameSource>> {
    match config.source {
        CameraSourceKind::Synthetic => {
            info!(
                "✓ Synthetic camera {}x{} (period {} frames)",
                config.width, config.height, config.synthetic_period_frames
            );
            Ok(Box::new(SyntheticCamera::new(
                config.width,
                config.height,
                config.synthetic_period_frames,
            )))
        }
        CameraSourceKind::Directory => {
            let camera = DirectoryCamera::open(&config.directory, config.width, config.height)?;
            Ok(Box::new(camera))
        }
    }
}

// ============================================================================
// SYNTHETIC CAMERA
// ============================================================================

const BACKGROUND_LEVEL: u8 = 40;
const VEHICLE_LEVEL: u8 = 230;
const VEHICLE_SIZE: usize = 96;
const VEHICLE_SPEED_PX: usize = 32;

/// Empty road for the first half of each period, a vehicle crossing the
/// frame for the second half.
pub struct SyntheticCamera {
    width: usize,
    height: usize,
    period: u64,
    frame_index: u64,
    started_at: Instant,
}

impl SyntheticCamera {
    pub fn new(width: usize, height: usize, period: u64) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            period: period.max(2),
            frame_index: 0,
            started_at: Instant::now(),
        }
    }

    fn traffic_at(&self, index: u64) -> bool {
        index % self.period >= self.period / 2
    }

    fn render(&self, index: u64) -> Vec<u8> {
        let mut data = vec![BACKGROUND_LEVEL; self.width * self.height * 3];
        if !self.traffic_at(index) {
            return data;
        }

        let x0 = (index as usize * VEHICLE_SPEED_PX) % self.width;
        let y0 = self.height.saturating_sub(VEHICLE_SIZE) / 2;
        for y in y0..(y0 + VEHICLE_SIZE).min(self.height) {
            for x in x0..(x0 + VEHICLE_SIZE).min(self.width) {
                let idx = (y * self.width + x) * 3;
                data[idx..idx + 3].fill(VEHICLE_LEVEL);
            }
        }
        data
    }
}

impl FrameSource for SyntheticCamera {
    fn capture(&mut self) -> Option<Frame> {
        let index = self.frame_index;
        self.frame_index += 1;
        Some(Frame {
            data: self.render(index),
            width: self.width,
            height: self.height,
            timestamp_ms: self.started_at.elapsed().as_secs_f64() * 1000.0,
        })
    }
}

// ============================================================================
// DIRECTORY CAMERA
// ============================================================================

/// Replays still images from a directory in name order, looping forever.
pub struct DirectoryCamera {
    files: Vec<PathBuf>,
    cursor: usize,
    width: usize,
    height: usize,
    started_at: Instant,
}

impl DirectoryCamera {
    pub fn open(dir: &str, width: usize, height: usize) -> Result<Self> {
        let files = find_image_files(Path::new(dir));
        if files.is_empty() {
            anyhow::bail!("No image files found in {}", dir);
        }
        info!("✓ Directory camera: {} frame(s) from {}", files.len(), dir);

        Ok(Self {
            files,
            cursor: 0,
            width: width.max(1),
            height: height.max(1),
            started_at: Instant::now(),
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn load(&self, path: &Path) -> Result<Frame> {
        let img = image::open(path)
            .with_context(|| format!("Failed to decode {}", path.display()))?
            .resize_exact(self.width as u32, self.height as u32, FilterType::Triangle)
            .to_rgb8();

        Ok(Frame {
            data: img.into_raw(),
            width: self.width,
            height: self.height,
            timestamp_ms: self.started_at.elapsed().as_secs_f64() * 1000.0,
        })
    }
}

impl FrameSource for DirectoryCamera {
    fn capture(&mut self) -> Option<Frame> {
        let path = self.files[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.files.len();

        match self.load(&path) {
            Ok(frame) => Some(frame),
            Err(e) => {
                warn!("Camera read failed: {:#}", e);
                None
            }
        }
    }
}

fn find_image_files(dir: &Path) -> Vec<PathBuf> {
    let extensions = ["png", "jpg", "jpeg", "bmp"];

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| extensions.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

// src/streetlight/motion.rs
//
// Frame-difference motion classifier:
//   |prev - curr| -> grayscale -> 5x5 blur -> threshold -> count
// Motion when the changed-pixel count exceeds the configured threshold.

use crate::types::Frame;

const BLUR_RADIUS: usize = 2;
const DIFF_THRESHOLD: f32 = 20.0;

/// Decides whether two consecutive frames contain motion.
pub trait MotionClassifier: Send + Sync {
    fn has_motion(&self, prev: &Frame, curr: &Frame) -> bool;
}

pub struct FrameDiffClassifier {
    min_changed_pixels: usize,
}

impl FrameDiffClassifier {
    pub fn new(min_changed_pixels: usize) -> Self {
        Self { min_changed_pixels }
    }

    /// Pixels whose blurred gray difference exceeds the binary threshold.
    pub fn changed_pixels(&self, prev: &Frame, curr: &Frame) -> usize {
        if !prev.is_well_formed() || !curr.is_well_formed() || !prev.same_shape(curr) {
            return 0;
        }
        let gray = gray_difference(prev, curr);
        let blurred = box_blur(&gray, curr.width, curr.height);
        blurred.iter().filter(|&&v| v > DIFF_THRESHOLD).count()
    }
}

impl MotionClassifier for FrameDiffClassifier {
    fn has_motion(&self, prev: &Frame, curr: &Frame) -> bool {
        self.changed_pixels(prev, curr) > self.min_changed_pixels
    }
}

/// Per-channel absolute difference collapsed to luma.
fn gray_difference(prev: &Frame, curr: &Frame) -> Vec<f32> {
    prev.data
        .chunks_exact(3)
        .zip(curr.data.chunks_exact(3))
        .map(|(a, b)| {
            let dr = a[0].abs_diff(b[0]) as f32;
            let dg = a[1].abs_diff(b[1]) as f32;
            let db = a[2].abs_diff(b[2]) as f32;
            0.299 * dr + 0.587 * dg + 0.114 * db
        })
        .collect()
}

/// Separable box blur, edges clamped.
fn box_blur(src: &[f32], width: usize, height: usize) -> Vec<f32> {
    let window = (2 * BLUR_RADIUS + 1) as f32;
    let mut horizontal = vec![0.0f32; src.len()];

    for y in 0..height {
        let row = y * width;
        for x in 0..width {
            let mut sum = 0.0;
            for k in 0..=2 * BLUR_RADIUS {
                let sx = (x + k).saturating_sub(BLUR_RADIUS).min(width - 1);
                sum += src[row + sx];
            }
            horizontal[row + x] = sum / window;
        }
    }

    let mut out = vec![0.0f32; src.len()];
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0;
            for k in 0..=2 * BLUR_RADIUS {
                let sy = (y + k).saturating_sub(BLUR_RADIUS).min(height - 1);
                sum += horizontal[sy * width + x];
            }
            out[y * width + x] = sum / window;
        }
    }

    out
}

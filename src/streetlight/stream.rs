// src/streetlight/stream.rs
//
// Per-subscriber MJPEG stream over the most recent camera frame. Each
// subscriber copies the frame under the guard and encodes outside it.

use crate::shared_state::SharedControlState;
use crate::types::Frame;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

const FRAME_PACE: Duration = Duration::from_millis(40);
const NO_FRAME_POLL: Duration = Duration::from_millis(100);
const JPEG_QUALITY: u8 = 80;

pub const MULTIPART_BOUNDARY: &str = "frame";

pub struct FrameStream {
    state: Arc<SharedControlState>,
    started: bool,
}

impl FrameStream {
    pub fn new(state: Arc<SharedControlState>) -> Self {
        Self {
            state,
            started: false,
        }
    }

    /// Next encoded frame; waits until the camera has produced one.
    pub async fn next_jpeg(&mut self) -> Vec<u8> {
        if self.started {
            tokio::time::sleep(FRAME_PACE).await;
        }
        self.started = true;

        loop {
            let Some(frame) = self.state.latest_frame() else {
                tokio::time::sleep(NO_FRAME_POLL).await;
                continue;
            };
            match encode_jpeg(&frame) {
                Some(bytes) => return bytes,
                None => {
                    warn!(
                        "JPEG encoding failed for {}x{} frame, skipping",
                        frame.width, frame.height
                    );
                    tokio::time::sleep(FRAME_PACE).await;
                }
            }
        }
    }

    /// Next multipart/x-mixed-replace chunk.
    pub async fn next_chunk(&mut self) -> Vec<u8> {
        multipart_chunk(&self.next_jpeg().await)
    }
}

pub fn multipart_chunk(jpeg: &[u8]) -> Vec<u8> {
    let header = format!(
        "--{}\r\nContent-Type: image/jpeg\r\n\r\n",
        MULTIPART_BOUNDARY
    );
    let mut chunk = Vec::with_capacity(header.len() + jpeg.len() + 2);
    chunk.extend_from_slice(header.as_bytes());
    chunk.extend_from_slice(jpeg);
    chunk.extend_from_slice(b"\r\n");
    chunk
}

/// Encode raw RGB bytes into a JPEG. Returns None on failure.
pub fn encode_jpeg(frame: &Frame) -> Option<Vec<u8>> {
    use image::{ImageBuffer, RgbImage};

    let img: RgbImage =
        ImageBuffer::from_raw(frame.width as u32, frame.height as u32, frame.data.clone())?;

    let mut buf = std::io::Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
    img.write_with_encoder(encoder).ok()?;

    Some(buf.into_inner())
}

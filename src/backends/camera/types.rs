// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera backends

use std::time::{Duration, Instant};

/// A single camera frame
///
/// Pixels stay with the detector, so the engine only needs the frame
/// geometry and its place in the stream.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// When the frame was captured
    pub captured_at: Instant,
    /// Offset of this frame from the start of the stream
    pub timestamp: Duration,
    /// Monotonic frame counter within the stream
    pub sequence: u64,
}

impl CameraFrame {
    pub fn new(width: u32, height: u32, timestamp: Duration, sequence: u64) -> Self {
        Self {
            width,
            height,
            captured_at: Instant::now(),
            timestamp,
            sequence,
        }
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Scripted camera source
//!
//! Plays a [`DetectionScript`] back in real time. Frames carry no pixels,
//! only the stream offset the scripted detector keys its answers on.

use super::CameraBackend;
use super::types::CameraFrame;
use crate::errors::CameraError;
use crate::script::DetectionScript;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub struct ReplayCamera {
    script: Arc<DetectionScript>,
    /// Restart from the beginning after the last frame
    looping: bool,
    started_at: Option<Instant>,
    sequence: u64,
}

impl ReplayCamera {
    pub fn new(script: Arc<DetectionScript>, looping: bool) -> Self {
        Self {
            script,
            looping,
            started_at: None,
            sequence: 0,
        }
    }

    /// Stream offset at `now`, or `None` when stopped or past the end
    fn offset_at(&self, now: Instant) -> Option<Duration> {
        let elapsed = now.saturating_duration_since(self.started_at?);
        let duration = self.script.duration();

        if elapsed <= duration {
            return Some(elapsed);
        }
        if !self.looping {
            return None;
        }
        if duration.is_zero() {
            return Some(Duration::ZERO);
        }
        let wrapped = elapsed.as_millis() % (duration.as_millis() + 1);
        Some(Duration::from_millis(wrapped as u64))
    }

    /// Start with an explicit stream origin
    ///
    /// Offline replays pass a synthetic clock so runs are reproducible.
    pub fn start_at(&mut self, now: Instant) -> Result<(), CameraError> {
        if self.script.deny_camera {
            return Err(CameraError::PermissionDenied(
                "camera access was declined".to_string(),
            ));
        }
        if self.started_at.is_some() {
            debug!("Replay camera already running");
            return Ok(());
        }

        self.started_at = Some(now);
        self.sequence = 0;
        info!(
            width = self.script.frame_width,
            height = self.script.frame_height,
            looping = self.looping,
            "Replay camera started"
        );
        Ok(())
    }

    /// Whether the last frame lies behind `now`
    pub fn is_exhausted_at(&self, now: Instant) -> bool {
        self.started_at.is_some() && self.offset_at(now).is_none()
    }

    /// Frame as of `now`
    pub fn frame_at(&mut self, now: Instant) -> Option<Arc<CameraFrame>> {
        let offset = self.offset_at(now)?;
        self.sequence += 1;

        let mut frame = CameraFrame::new(
            self.script.frame_width,
            self.script.frame_height,
            offset,
            self.sequence,
        );
        frame.captured_at = now;
        Some(Arc::new(frame))
    }
}

impl CameraBackend for ReplayCamera {
    fn start(&mut self) -> Result<(), CameraError> {
        self.start_at(Instant::now())
    }

    fn stop(&mut self) {
        if self.started_at.take().is_some() {
            info!(frames = self.sequence, "Replay camera stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    fn latest_frame(&mut self) -> Option<Arc<CameraFrame>> {
        self.frame_at(Instant::now())
    }

    fn is_exhausted(&self) -> bool {
        self.is_exhausted_at(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(json: &str) -> Arc<DetectionScript> {
        Arc::new(DetectionScript::from_json(json).unwrap())
    }

    const TWO_FRAMES: &str = r#"{ "frame_width": 320, "frame_height": 240,
                                  "frames": [ { "t_ms": 0 }, { "t_ms": 1000 } ] }"#;

    #[test]
    fn test_no_frames_before_start() {
        let mut camera = ReplayCamera::new(script(TWO_FRAMES), false);
        assert!(camera.frame_at(Instant::now()).is_none());
        assert!(!camera.is_running());
    }

    #[test]
    fn test_frames_carry_offset_and_size() {
        let mut camera = ReplayCamera::new(script(TWO_FRAMES), false);
        camera.start().unwrap();
        let base = camera.started_at.unwrap();

        let frame = camera.frame_at(base + Duration::from_millis(400)).unwrap();
        assert_eq!(frame.timestamp, Duration::from_millis(400));
        assert_eq!(frame.captured_at, base + Duration::from_millis(400));
        assert_eq!((frame.width, frame.height), (320, 240));
        assert_eq!(frame.sequence, 1);

        assert!(camera.frame_at(base + Duration::from_millis(1500)).is_none());
    }

    #[test]
    fn test_looping_wraps_offset() {
        let mut camera = ReplayCamera::new(script(TWO_FRAMES), true);
        camera.start().unwrap();
        let base = camera.started_at.unwrap();

        let frame = camera.frame_at(base + Duration::from_millis(1101)).unwrap();
        assert_eq!(frame.timestamp, Duration::from_millis(100));
    }

    #[test]
    fn test_denied_camera_and_idempotent_stop() {
        let denied = script(
            r#"{ "frame_width": 2, "frame_height": 2, "deny_camera": true,
                 "frames": [ { "t_ms": 0 } ] }"#,
        );
        let mut camera = ReplayCamera::new(denied, false);
        assert!(matches!(camera.start(), Err(CameraError::PermissionDenied(_))));

        camera.stop();
        camera.stop();
        assert!(!camera.is_running());
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Detection scripts
//!
//! A detection script is a recorded (or hand-written) feed of detector output
//! keyed by time offset. It stands in for the camera and the model when
//! replaying sessions offline or driving the live preview without hardware.
//!
//! ```json
//! {
//!   "frame_width": 640,
//!   "frame_height": 480,
//!   "latency_ms": 40,
//!   "frames": [
//!     { "t_ms": 0, "faces": [ { "bounds": { "x": 200, "y": 120, "width": 160, "height": 160 },
//!                               "expressions": { "surprised": 0.97, "neutral": 0.02 } } ] },
//!     { "t_ms": 5200, "faces": [] },
//!     { "t_ms": 5300, "error": "inference timed out" }
//!   ]
//! }
//! ```

use crate::app::frame_processor::FaceDetection;
use crate::errors::ScriptError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// One scripted detector answer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScriptFrame {
    /// Offset from stream start in milliseconds
    pub t_ms: u64,
    #[serde(default)]
    pub faces: Vec<FaceDetection>,
    /// When set, inference at this point fails with this message
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionScript {
    pub frame_width: u32,
    pub frame_height: u32,
    /// Simulated inference latency
    #[serde(default)]
    pub latency_ms: u64,
    /// Simulate a model that fails to load
    #[serde(default)]
    pub fail_load: bool,
    /// Simulate a camera that refuses access
    #[serde(default)]
    pub deny_camera: bool,
    pub frames: Vec<ScriptFrame>,
}

impl DetectionScript {
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ScriptError::Read(format!("{}: {}", path.display(), e)))?;
        let script = Self::from_json(&contents)?;
        debug!(
            path = %path.display(),
            frames = script.frames.len(),
            duration_ms = script.duration().as_millis(),
            "Loaded detection script"
        );
        Ok(script)
    }

    /// Parse, validate and time-sort a script
    pub fn from_json(contents: &str) -> Result<Self, ScriptError> {
        let mut script: Self =
            serde_json::from_str(contents).map_err(|e| ScriptError::Parse(e.to_string()))?;

        if script.frame_width == 0 || script.frame_height == 0 {
            return Err(ScriptError::Invalid(format!(
                "frame size {}x{} is empty",
                script.frame_width, script.frame_height
            )));
        }
        if script.frames.is_empty() {
            return Err(ScriptError::Invalid("script has no frames".to_string()));
        }

        script.frames.sort_by_key(|frame| frame.t_ms);
        Ok(script)
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    /// Offset of the last scripted frame
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.frames.last().map(|f| f.t_ms).unwrap_or(0))
    }

    /// The frame in effect at `offset`: the last one at or before it
    pub fn frame_at(&self, offset: Duration) -> Option<&ScriptFrame> {
        let offset_ms = offset.as_millis() as u64;
        let idx = self.frames.partition_point(|frame| frame.t_ms <= offset_ms);
        idx.checked_sub(1).map(|i| &self.frames[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"{
        "frame_width": 640,
        "frame_height": 480,
        "frames": [
            { "t_ms": 200, "faces": [] },
            { "t_ms": 0, "faces": [ { "bounds": { "x": 10, "y": 10, "width": 80, "height": 80 },
                                      "expressions": { "happy": 0.9 } } ] },
            { "t_ms": 300, "error": "timeout" }
        ]
    }"#;

    #[test]
    fn test_frames_are_sorted_and_looked_up_by_offset() {
        let script = DetectionScript::from_json(SCRIPT).unwrap();
        assert_eq!(script.frames[0].t_ms, 0);
        assert_eq!(script.duration(), Duration::from_millis(300));

        let early = script.frame_at(Duration::from_millis(150)).unwrap();
        assert_eq!(early.faces.len(), 1);

        let empty = script.frame_at(Duration::from_millis(200)).unwrap();
        assert!(empty.faces.is_empty());

        let failing = script.frame_at(Duration::from_millis(900)).unwrap();
        assert_eq!(failing.error.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_offset_before_first_frame() {
        let script = DetectionScript::from_json(
            r#"{ "frame_width": 2, "frame_height": 2, "frames": [ { "t_ms": 50 } ] }"#,
        )
        .unwrap();
        assert!(script.frame_at(Duration::from_millis(10)).is_none());
    }

    #[test]
    fn test_null_expression_keeps_script_loadable() {
        let script = DetectionScript::from_json(
            r#"{ "frame_width": 640, "frame_height": 480, "frames": [
                { "t_ms": 0, "faces": [ { "bounds": { "x": 1, "y": 1, "width": 9, "height": 9 },
                                          "expressions": { "happy": null, "neutral": 0.4 } } ] }
            ] }"#,
        )
        .unwrap();
        let face = &script.frames[0].faces[0];
        assert_eq!(face.expressions.get("happy"), 0.0);
        assert_eq!(face.expressions.get("neutral"), 0.4);
    }

    #[test]
    fn test_rejects_empty_script() {
        let err =
            DetectionScript::from_json(r#"{ "frame_width": 2, "frame_height": 2, "frames": [] }"#)
                .unwrap_err();
        assert!(matches!(err, ScriptError::Invalid(_)));
    }
}

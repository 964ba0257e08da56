// SPDX-License-Identifier: GPL-3.0-only

//! Scripted expression detector
//!
//! Answers detection requests from a [`DetectionScript`] instead of running a
//! model. The frame's stream offset selects the scripted answer, so the same
//! script drives both offline replays and the real-time preview.

use super::{DetectionFuture, ExpressionDetector};
use crate::app::frame_processor::types::FaceDetection;
use crate::backends::camera::types::CameraFrame;
use crate::config::DetectorConfig;
use crate::errors::DetectorError;
use crate::script::DetectionScript;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace};

pub struct ScriptedDetector {
    script: Arc<DetectionScript>,
    config: DetectorConfig,
}

impl ScriptedDetector {
    /// "Load the model"
    ///
    /// Fails with [`DetectorError::ModelLoad`] when the script asks for a
    /// load failure, mirroring a missing or corrupt model asset.
    pub fn load(
        script: Arc<DetectionScript>,
        config: DetectorConfig,
    ) -> Result<Self, DetectorError> {
        if script.fail_load {
            return Err(DetectorError::ModelLoad(
                "scripted model asset could not be loaded".to_string(),
            ));
        }

        info!(
            input_size = config.input_size,
            score_threshold = config.score_threshold,
            latency_ms = script.latency_ms,
            "Scripted detector ready"
        );
        Ok(Self { script, config })
    }

    /// Detections in effect at a stream offset, without simulated latency
    pub fn detect_at(&self, offset: Duration) -> Result<Vec<FaceDetection>, DetectorError> {
        let Some(frame) = self.script.frame_at(offset) else {
            trace!(offset_ms = offset.as_millis(), "No scripted frame yet");
            return Ok(Vec::new());
        };

        if let Some(message) = &frame.error {
            return Err(DetectorError::Inference(message.clone()));
        }

        let threshold = self.config.score_threshold;
        let faces: Vec<FaceDetection> = frame
            .faces
            .iter()
            .filter(|face| face.score.is_none_or(|score| score >= threshold))
            .cloned()
            .collect();

        debug!(
            offset_ms = offset.as_millis(),
            scripted = frame.faces.len(),
            kept = faces.len(),
            "Scripted detections"
        );
        Ok(faces)
    }
}

impl ExpressionDetector for ScriptedDetector {
    fn name(&self) -> &str {
        "scripted"
    }

    fn detect(&self, frame: Arc<CameraFrame>) -> DetectionFuture {
        let result = self.detect_at(frame.timestamp);
        let latency = self.script.latency();

        async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            result
        }
        .boxed()
    }
}

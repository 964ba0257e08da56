// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing tasks
//!
//! This module contains the detector abstraction and its implementations.

pub mod scripted_detector;

pub use scripted_detector::ScriptedDetector;

use crate::app::frame_processor::types::FaceDetection;
use crate::backends::camera::types::CameraFrame;
use crate::errors::DetectorError;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Future returned by a detection call
pub type DetectionFuture = BoxFuture<'static, Result<Vec<FaceDetection>, DetectorError>>;

/// Face + expression detector
///
/// Implementations receive a shared frame and resolve to the faces found in
/// it, with boxes in source-frame pixels. Ordering is not required; the
/// orchestrator sorts detections itself.
pub trait ExpressionDetector: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Run inference on a frame
    fn detect(&self, frame: Arc<CameraFrame>) -> DetectionFuture;
}

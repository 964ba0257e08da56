// SPDX-License-Identifier: MPL-2.0

//! Frame processor module for async frame analysis
//!
//! This module provides the detector abstraction the overlay samples frames
//! through, plus the result types shared by smoothing, placement and the
//! trigger machine.

pub mod tasks;
pub mod types;

pub use tasks::{DetectionFuture, ExpressionDetector, ScriptedDetector};
pub use types::{ExpressionDistribution, FaceBox, FaceDetection, sort_left_to_right};

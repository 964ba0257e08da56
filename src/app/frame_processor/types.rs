// SPDX-License-Identifier: MPL-2.0

//! Core types for frame processing results
//!
//! These types represent the output of the expression detector and are used
//! throughout the overlay engine for smoothing, placement and trigger evaluation.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A face bounding box in source-frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceBox {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl FaceBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Mapping from expression label to probability
///
/// Values are not guaranteed to sum to 1. Missing or non-finite entries read
/// as 0 so a malformed detection never fails a tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ExpressionDistribution(BTreeMap<String, f64>);

/// Entries that are null, non-numeric or non-finite are dropped on load
impl<'de> Deserialize<'de> for ExpressionDistribution {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .filter_map(|(label, value)| {
                value
                    .as_f64()
                    .filter(|v| v.is_finite())
                    .map(|v| (label, v))
            })
            .collect())
    }
}

impl ExpressionDistribution {
    /// Probability for a label, 0 when absent
    pub fn get(&self, label: &str) -> f64 {
        self.0
            .get(label)
            .copied()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    pub fn set(&mut self, label: impl Into<String>, value: f64) {
        self.0.insert(label.into(), value);
    }

    /// Iterate labels in lexical order with sanitized values
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.0
            .iter()
            .map(|(label, value)| (label.as_str(), if value.is_finite() { *value } else { 0.0 }))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }

    pub fn sum(&self) -> f64 {
        self.iter().map(|(_, v)| v).sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Labels sorted by descending probability (ties by label)
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }

    /// Most probable label
    pub fn dominant(&self) -> Option<(&str, f64)> {
        self.ranked().into_iter().next()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for ExpressionDistribution {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<const N: usize> From<[(&str, f64); N]> for ExpressionDistribution {
    fn from(entries: [(&str, f64); N]) -> Self {
        entries.into_iter().collect()
    }
}

/// A detected face with its location and raw expression scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
    /// Bounding box in source-frame pixels
    pub bounds: FaceBox,
    /// Raw classifier output
    #[serde(default)]
    pub expressions: ExpressionDistribution,
    /// Detection confidence (0.0 to 1.0) if available
    #[serde(default)]
    pub score: Option<f32>,
}

impl FaceDetection {
    pub fn new(bounds: FaceBox, expressions: ExpressionDistribution) -> Self {
        Self {
            bounds,
            expressions,
            score: None,
        }
    }
}

/// Order detections left-to-right by box x, the track slot order
pub fn sort_left_to_right(detections: &mut [FaceDetection]) {
    detections.sort_by(|a, b| a.bounds.x.total_cmp(&b.bounds.x));
}

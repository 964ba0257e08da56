// SPDX-License-Identifier: GPL-3.0-only

//! Hidden trigger
//!
//! Watches raw expression values over time and decides when the overlay
//! switches into its surprise mode. Two policies exist, picked by
//! configuration:
//!
//! - [`SequenceTrigger`]: hold a surprised face, drop out of frame briefly,
//!   then show happy and angry within the follow-up window
//! - [`ComboTrigger`]: a face showing happy and angry together has a small
//!   chance per tick of firing
//!
//! State is process-wide, not per face, and is evaluated once per inference
//! tick with a single timestamp.

pub mod combo;
pub mod sequence;

pub use combo::ComboTrigger;
pub use sequence::SequenceTrigger;

use crate::app::frame_processor::FaceDetection;
use crate::config::TriggerConfig;
use crate::constants::expressions::{ANGRY, HAPPY, SURPRISED};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Which trigger policy drives the surprise mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerPolicy {
    #[default]
    Sequence,
    Combo,
}

impl TriggerPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequence => "sequence",
            Self::Combo => "combo",
        }
    }
}

impl fmt::Display for TriggerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable trigger stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPhase {
    #[default]
    Idle,
    HoldingSurprise,
    Golden,
    Followup,
    /// Combo window open
    Combo,
    Triggered,
}

impl TriggerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::HoldingSurprise => "holding_surprise",
            Self::Golden => "golden",
            Self::Followup => "followup",
            Self::Combo => "combo",
            Self::Triggered => "triggered",
        }
    }

    pub fn mode(&self) -> OverlayMode {
        if *self == Self::Triggered {
            OverlayMode::Surprise
        } else {
            OverlayMode::Normal
        }
    }
}

/// Rendering mode of the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayMode {
    #[default]
    Normal,
    Surprise,
}

/// Transient visual marker requested by the trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PulseKind {
    /// Golden window opened
    GoldenEntered,
    /// No-face glitch satisfied inside the golden window
    Glitch,
    /// Golden window expired without the glitch
    GoldenClosed,
}

impl PulseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GoldenEntered => "golden_entered",
            Self::Glitch => "glitch",
            Self::GoldenClosed => "golden_closed",
        }
    }
}

/// Result of one trigger evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriggerOutput {
    pub phase: TriggerPhase,
    pub pulse: Option<PulseKind>,
}

impl TriggerOutput {
    pub fn new(phase: TriggerPhase) -> Self {
        Self { phase, pulse: None }
    }

    pub fn with_pulse(phase: TriggerPhase, pulse: PulseKind) -> Self {
        Self {
            phase,
            pulse: Some(pulse),
        }
    }

    pub fn mode(&self) -> OverlayMode {
        self.phase.mode()
    }
}

/// Maximum of each trigger expression across all faces of a tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExpressionPeaks {
    pub face_count: usize,
    pub surprised: f64,
    pub happy: f64,
    pub angry: f64,
}

impl ExpressionPeaks {
    pub fn from_detections(detections: &[FaceDetection]) -> Self {
        detections.iter().fold(
            Self {
                face_count: detections.len(),
                ..Self::default()
            },
            |peaks, face| Self {
                surprised: peaks.surprised.max(face.expressions.get(SURPRISED)),
                happy: peaks.happy.max(face.expressions.get(HAPPY)),
                angry: peaks.angry.max(face.expressions.get(ANGRY)),
                ..peaks
            },
        )
    }
}

/// The configured trigger policy
pub enum TriggerMachine {
    Sequence(SequenceTrigger),
    Combo(ComboTrigger),
}

impl TriggerMachine {
    pub fn from_config(config: &TriggerConfig) -> Self {
        match config.policy {
            TriggerPolicy::Sequence => Self::Sequence(SequenceTrigger::new(*config)),
            TriggerPolicy::Combo => Self::Combo(ComboTrigger::new(*config)),
        }
    }

    pub fn policy(&self) -> TriggerPolicy {
        match self {
            Self::Sequence(_) => TriggerPolicy::Sequence,
            Self::Combo(_) => TriggerPolicy::Combo,
        }
    }

    /// Evaluate one tick from raw (unsmoothed) detections
    pub fn tick(&mut self, now: Instant, detections: &[FaceDetection]) -> TriggerOutput {
        match self {
            Self::Sequence(machine) => {
                machine.tick(now, &ExpressionPeaks::from_detections(detections))
            }
            Self::Combo(machine) => machine.tick(now, detections),
        }
    }

    /// Phase as of the last tick
    pub fn phase(&self) -> TriggerPhase {
        match self {
            Self::Sequence(machine) => machine.phase(),
            Self::Combo(machine) => machine.phase(),
        }
    }

    /// Forget all progress (camera stop/start)
    pub fn reset(&mut self) {
        match self {
            Self::Sequence(machine) => machine.reset(),
            Self::Combo(machine) => machine.reset(),
        }
    }
}

impl fmt::Debug for TriggerMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerMachine")
            .field("policy", &self.policy())
            .field("phase", &self.phase())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::frame_processor::{ExpressionDistribution, FaceBox};

    fn face(x: f32, entries: &[(&str, f64)]) -> FaceDetection {
        FaceDetection::new(
            FaceBox::new(x, 0.0, 10.0, 10.0),
            entries.iter().map(|(l, v)| (*l, *v)).collect::<ExpressionDistribution>(),
        )
    }

    #[test]
    fn test_peaks_take_maximum_across_faces() {
        let faces = vec![
            face(0.0, &[("surprised", 0.2), ("happy", 0.9)]),
            face(50.0, &[("surprised", 0.97), ("angry", 0.4)]),
        ];
        let peaks = ExpressionPeaks::from_detections(&faces);
        assert_eq!(peaks.face_count, 2);
        assert_eq!(peaks.surprised, 0.97);
        assert_eq!(peaks.happy, 0.9);
        assert_eq!(peaks.angry, 0.4);
    }

    #[test]
    fn test_peaks_without_faces_are_zero() {
        assert_eq!(ExpressionPeaks::from_detections(&[]), ExpressionPeaks::default());
    }

    #[test]
    fn test_machine_follows_configured_policy() {
        let mut config = TriggerConfig::default();
        assert_eq!(TriggerMachine::from_config(&config).policy(), TriggerPolicy::Sequence);

        config.policy = TriggerPolicy::Combo;
        let machine = TriggerMachine::from_config(&config);
        assert_eq!(machine.policy(), TriggerPolicy::Combo);
        assert_eq!(machine.phase(), TriggerPhase::Idle);
    }

    #[test]
    fn test_only_triggered_phase_uses_surprise_mode() {
        assert_eq!(TriggerPhase::Triggered.mode(), OverlayMode::Surprise);
        assert_eq!(TriggerPhase::Golden.mode(), OverlayMode::Normal);
        assert_eq!(TriggerOutput::default().mode(), OverlayMode::Normal);
    }
}

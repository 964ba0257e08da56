// SPDX-License-Identifier: GPL-3.0-only

//! Offline replay
//!
//! Steps a detection script through the orchestrator on a synthetic clock.
//! The render loop, throttle, busy flag and detector latency are simulated
//! exactly, so the same script and config always produce the same ticks.

use crate::app::expression_overlay::RecordingSurface;
use crate::app::expression_overlay::surface::Size;
use crate::app::frame_processor::{FaceDetection, ScriptedDetector};
use crate::app::orchestrator::{FrameOrchestrator, InferenceTicket, SessionStatus, TickReport};
use crate::backends::camera::ReplayCamera;
use crate::config::Config;
use crate::errors::DetectorError;
use crate::script::DetectionScript;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Everything a replay produced
#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    /// Status the session ended in (or failed to start with)
    pub status: SessionStatus,
    pub reports: Vec<TickReport>,
    /// Surface as left by the last applied tick
    pub surface: RecordingSurface,
}

struct PendingInference {
    ticket: InferenceTicket,
    ready_at: Instant,
    result: Result<Vec<FaceDetection>, DetectorError>,
}

/// Replay `script` from start to end
pub fn replay_script(
    config: &Config,
    script: Arc<DetectionScript>,
    viewport: Size,
) -> ReplayOutcome {
    let mut orchestrator = FrameOrchestrator::new(config.clone());
    let mut surface = RecordingSurface::new(viewport.width, viewport.height);
    let mut reports = Vec::new();

    let detector = match ScriptedDetector::load(Arc::clone(&script), config.detector) {
        Ok(detector) => detector,
        Err(err) => {
            orchestrator.fail_model(&err);
            return ReplayOutcome {
                status: orchestrator.status().clone(),
                reports,
                surface,
            };
        }
    };

    let base = Instant::now();
    let mut camera = ReplayCamera::new(Arc::clone(&script), false);
    if let Err(err) = camera.start_at(base) {
        orchestrator.camera_failed(&err);
        return ReplayOutcome {
            status: orchestrator.status().clone(),
            reports,
            surface,
        };
    }
    orchestrator.start(base);

    let step = config.session.render_interval();
    let latency = script.latency();
    let mut pending: Option<PendingInference> = None;
    let mut now = base;

    loop {
        if let Some(inference) = pending.take_if(|inference| now >= inference.ready_at)
            && let Some(report) = orchestrator.complete_inference(
                inference.ticket,
                now,
                inference.result,
                &mut surface,
            )
        {
            reports.push(report);
        }

        if pending.is_none() && camera.is_exhausted_at(now) {
            break;
        }

        if let Some(frame) = camera.frame_at(now)
            && let Some(ticket) = orchestrator.begin_inference(now, &frame)
        {
            debug!(offset_ms = frame.timestamp.as_millis(), "Replaying inference");
            pending = Some(PendingInference {
                ticket,
                ready_at: now + latency,
                result: detector.detect_at(frame.timestamp),
            });
        }

        now += step;
    }

    let status = orchestrator.status().clone();
    orchestrator.stop_with_camera(&mut camera);
    info!(
        ticks = reports.len(),
        duration_ms = script.duration().as_millis(),
        "Replay finished"
    );

    ReplayOutcome {
        status,
        reports,
        surface,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::trigger::TriggerPhase;

    fn script(json: &str) -> Arc<DetectionScript> {
        Arc::new(DetectionScript::from_json(json).unwrap())
    }

    #[test]
    fn test_replay_is_reproducible() {
        let script = script(
            r#"{ "frame_width": 640, "frame_height": 480, "latency_ms": 30, "frames": [
                { "t_ms": 0, "faces": [ { "bounds": { "x": 100, "y": 100, "width": 80, "height": 80 },
                                          "expressions": { "happy": 0.6, "neutral": 0.4 } } ] },
                { "t_ms": 1000 }
            ] }"#,
        );
        let viewport = Size::new(640.0, 480.0);
        let first = replay_script(&Config::default(), Arc::clone(&script), viewport);
        let second = replay_script(&Config::default(), script, viewport);

        assert!(!first.reports.is_empty());
        assert_eq!(first.reports, second.reports);
        assert!(first.reports.iter().all(|r| r.phase == TriggerPhase::Idle));
    }

    #[test]
    fn test_model_failure_produces_no_ticks() {
        let script = script(
            r#"{ "frame_width": 64, "frame_height": 48, "fail_load": true,
                 "frames": [ { "t_ms": 0 } ] }"#,
        );
        let outcome = replay_script(&Config::default(), script, Size::new(64.0, 48.0));
        assert!(matches!(outcome.status, SessionStatus::ModelFailed(_)));
        assert!(outcome.reports.is_empty());
    }

    #[test]
    fn test_scripted_errors_skip_ticks() {
        let script = script(
            r#"{ "frame_width": 64, "frame_height": 48, "frames": [
                { "t_ms": 0, "error": "backend hiccup" },
                { "t_ms": 500 }
            ] }"#,
        );
        let outcome = replay_script(&Config::default(), script, Size::new(64.0, 48.0));
        assert_eq!(outcome.status, SessionStatus::Running);
        // Only ticks from 500ms on are applied
        assert!(outcome.reports.iter().all(|r| r.elapsed_ms >= 500));
        assert!(!outcome.reports.is_empty());
    }
}

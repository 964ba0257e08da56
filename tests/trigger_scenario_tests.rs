// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end trigger scenarios through the orchestrator

use moodcam::app::expression_overlay::surface::{DrawCommand, Size};
use moodcam::app::expression_overlay::RecordingSurface;
use moodcam::app::trigger::PulseKind;
use moodcam::app::{FrameOrchestrator, OverlayMode, TriggerPhase, TriggerPolicy, replay_script};
use moodcam::constants::overlay::{PULSE_BORDER_WIDTH, SURPRISE_BANNER};
use moodcam::script::DetectionScript;
use moodcam::{Config, ExpressionDistribution, FaceBox, FaceDetection, TickReport};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Scenario {
    base: Instant,
    orchestrator: FrameOrchestrator,
    surface: RecordingSurface,
}

impl Scenario {
    fn new(config: Config) -> Self {
        let base = Instant::now();
        let mut orchestrator = FrameOrchestrator::new(config);
        orchestrator.start(base);
        Self {
            base,
            orchestrator,
            surface: RecordingSurface::new(640.0, 480.0),
        }
    }

    fn tick(&mut self, ms: u64, faces: Vec<FaceDetection>) -> TickReport {
        self.orchestrator.apply_tick(
            self.base + Duration::from_millis(ms),
            faces,
            640,
            480,
            &mut self.surface,
        )
    }

    fn pulse_border_drawn(&self) -> bool {
        self.surface.commands().iter().any(|cmd| {
            matches!(
                cmd,
                DrawCommand::StrokeRect { line_width, .. } if *line_width == PULSE_BORDER_WIDTH
            )
        })
    }
}

fn face(entries: &[(&str, f64)]) -> FaceDetection {
    FaceDetection::new(
        FaceBox::new(240.0, 160.0, 160.0, 160.0),
        entries
            .iter()
            .map(|(label, value)| (*label, *value))
            .collect::<ExpressionDistribution>(),
    )
}

#[test]
fn test_sequence_scenario_with_exact_timings() {
    let mut s = Scenario::new(Config::default());

    // Surprised from 0ms; the hold completes at exactly 5000ms
    for ms in (0..5000).step_by(100) {
        let report = s.tick(ms, vec![face(&[("surprised", 0.97), ("neutral", 0.03)])]);
        assert_eq!(report.phase, TriggerPhase::HoldingSurprise, "at {ms}ms");
        assert_eq!(report.pulse, None);
    }
    let report = s.tick(5000, vec![face(&[("surprised", 0.97)])]);
    assert_eq!(report.phase, TriggerPhase::Golden);
    assert_eq!(report.pulse, Some(PulseKind::GoldenEntered));
    assert!(s.pulse_border_drawn(), "golden pulse should frame the viewport");

    // Face leaves the frame; the pulse fades after 600ms
    for ms in (5100..6100).step_by(100) {
        let report = s.tick(ms, vec![]);
        assert_eq!(report.phase, TriggerPhase::Golden, "at {ms}ms");
        assert_eq!(report.pulse, None, "at {ms}ms");
        assert_eq!(s.pulse_border_drawn(), ms < 5600, "border at {ms}ms");
    }

    // 1100ms since the last face was seen
    let report = s.tick(6100, vec![]);
    assert_eq!(report.pulse, Some(PulseKind::Glitch));
    assert_eq!(report.phase, TriggerPhase::Golden);

    // Face returns happy, then angry on the next tick
    let report = s.tick(6200, vec![face(&[("happy", 0.5), ("neutral", 0.5)])]);
    assert_eq!(report.phase, TriggerPhase::Followup);
    let report = s.tick(6300, vec![face(&[("angry", 0.5), ("neutral", 0.5)])]);
    assert_eq!(report.phase, TriggerPhase::Triggered);
    assert_eq!(report.mode, OverlayMode::Surprise);
    assert_eq!(s.surface.texts()[0], SURPRISE_BANNER);

    // Triggered for exactly 4000ms
    for ms in (6400..10300).step_by(100) {
        let report = s.tick(ms, vec![face(&[("neutral", 1.0)])]);
        assert_eq!(report.phase, TriggerPhase::Triggered, "at {ms}ms");
    }
    let report = s.tick(10300, vec![face(&[("neutral", 1.0)])]);
    assert_eq!(report.phase, TriggerPhase::Idle);
    assert_eq!(report.mode, OverlayMode::Normal);
}

#[test]
fn test_banner_replaces_no_face_text_while_triggered() {
    let mut config = Config::default();
    config.trigger.policy = TriggerPolicy::Combo;
    config.trigger.combo_chance = 1.0;
    config.trigger.seed = Some(1);
    let mut s = Scenario::new(config);

    let report = s.tick(0, vec![face(&[("happy", 0.4), ("angry", 0.4)])]);
    assert_eq!(report.phase, TriggerPhase::Triggered);

    let report = s.tick(100, vec![]);
    assert_eq!(report.mode, OverlayMode::Surprise);
    assert_eq!(s.surface.texts(), vec![SURPRISE_BANNER]);
    assert!(s.orchestrator.tracks().is_empty());
}

#[test]
fn test_restart_resets_trigger_progress() {
    let mut s = Scenario::new(Config::default());
    for ms in (0..=5000).step_by(100) {
        s.tick(ms, vec![face(&[("surprised", 0.99)])]);
    }
    assert_eq!(s.orchestrator.phase(), TriggerPhase::Golden);

    s.orchestrator.stop();
    s.orchestrator.stop();
    s.orchestrator.start(s.base + Duration::from_millis(5100));
    assert_eq!(s.orchestrator.phase(), TriggerPhase::Idle);

    let report = s.tick(5200, vec![]);
    assert_eq!(report.phase, TriggerPhase::Idle);
    assert_eq!(report.pulse, None);
}

#[test]
fn test_replayed_script_reaches_surprise_mode() {
    let script = DetectionScript::from_json(
        r#"{
            "frame_width": 640, "frame_height": 480,
            "frames": [
                { "t_ms": 0, "faces": [ { "bounds": { "x": 240, "y": 160, "width": 160, "height": 160 },
                                          "expressions": { "surprised": 0.98, "neutral": 0.02 } } ] },
                { "t_ms": 5100, "faces": [] },
                { "t_ms": 6400, "faces": [ { "bounds": { "x": 240, "y": 160, "width": 160, "height": 160 },
                                             "expressions": { "happy": 0.5, "angry": 0.45, "neutral": 0.05 } } ] },
                { "t_ms": 8000, "faces": [ { "bounds": { "x": 240, "y": 160, "width": 160, "height": 160 },
                                             "expressions": { "neutral": 0.9, "sad": 0.1 } } ] },
                { "t_ms": 12000 }
            ]
        }"#,
    )
    .expect("scenario script should parse");

    let outcome = replay_script(&Config::default(), Arc::new(script), Size::new(640.0, 480.0));
    let pulses: Vec<PulseKind> = outcome.reports.iter().filter_map(|r| r.pulse).collect();
    assert_eq!(pulses, vec![PulseKind::GoldenEntered, PulseKind::Glitch]);

    let first_triggered = outcome
        .reports
        .iter()
        .position(|r| r.phase == TriggerPhase::Triggered)
        .expect("the sequence should trigger");
    let triggered_ticks = outcome.reports[first_triggered..]
        .iter()
        .take_while(|r| r.phase == TriggerPhase::Triggered)
        .count();
    assert!(triggered_ticks > 1, "surprise mode should last several ticks");

    let last = outcome.reports.last().expect("replay should produce ticks");
    assert_eq!(last.phase, TriggerPhase::Idle);
}

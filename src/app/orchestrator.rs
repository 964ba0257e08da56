// SPDX-License-Identifier: GPL-3.0-only

//! Frame orchestrator
//!
//! Owns all per-session state and turns detector results into draw calls.
//! The caller drives it in two steps per inference:
//!
//! 1. [`FrameOrchestrator::begin_inference`] hands out a ticket when the
//!    session is active, no inference is in flight and the throttle interval
//!    has passed.
//! 2. [`FrameOrchestrator::complete_inference`] takes the detector result
//!    back with its ticket, releases the busy flag and draws the tick.
//!
//! Tickets carry the session generation. A result whose session was stopped
//! or restarted after the ticket was issued is dropped without touching state.

use crate::app::expression_overlay::placement::{Anchor, AnchorSide, decide_anchor_with};
use crate::app::expression_overlay::surface::DrawSurface;
use crate::app::expression_overlay::{
    ExpressionSmoother, FaceLabel, calculate_video_bounds, draw_face, draw_no_face,
    draw_pulse_border, label_lines, transform_box_to_screen,
};
use crate::app::frame_processor::{ExpressionDistribution, FaceDetection, sort_left_to_right};
use crate::app::trigger::{OverlayMode, PulseKind, TriggerMachine, TriggerOutput, TriggerPhase};
use crate::backends::camera::{CameraBackend, CameraFrame};
use crate::config::Config;
use crate::errors::{CameraError, DetectorError};
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

/// Session state shown in the UI chrome
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Stopped,
    Running,
    /// Camera refused or missing; the overlay never started
    CameraUnavailable(String),
    /// Model failed to load; terminal for this process
    ModelFailed(String),
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Stopped => write!(f, "Stopped"),
            SessionStatus::Running => write!(f, "Running"),
            SessionStatus::CameraUnavailable(msg) => write!(f, "Camera unavailable: {}", msg),
            SessionStatus::ModelFailed(msg) => write!(f, "Model failed to load: {}", msg),
        }
    }
}

/// Permission to run one inference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceTicket {
    pub generation: u64,
    pub frame_width: u32,
    pub frame_height: u32,
}

/// Positional track slot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceTrack {
    /// Last display distribution
    pub smoothed: Option<ExpressionDistribution>,
    /// Last label anchor
    pub anchor: Option<Anchor>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ActivePulse {
    kind: PulseKind,
    until: Instant,
}

/// What one face looked like after a tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceSummary {
    pub side: AnchorSide,
    pub label_x: f32,
    pub label_y: f32,
    /// Most likely display expression and its weight
    pub dominant: Option<(String, f64)>,
}

/// Outcome of an applied tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    /// Milliseconds since the session started
    pub elapsed_ms: u64,
    pub phase: TriggerPhase,
    pub mode: OverlayMode,
    pub pulse: Option<PulseKind>,
    pub faces: Vec<FaceSummary>,
}

pub struct FrameOrchestrator {
    config: Config,
    smoother: ExpressionSmoother,
    session_id: Option<Uuid>,
    started_at: Option<Instant>,
    active: bool,
    generation: u64,
    /// An inference is in flight
    busy: bool,
    last_inference: Option<Instant>,
    tracks: Vec<FaceTrack>,
    trigger: TriggerMachine,
    pulse: Option<ActivePulse>,
    last_output: TriggerOutput,
    status: SessionStatus,
}

impl FrameOrchestrator {
    pub fn new(config: Config) -> Self {
        Self {
            smoother: ExpressionSmoother::new(config.smoothing),
            trigger: TriggerMachine::from_config(&config.trigger),
            config,
            session_id: None,
            started_at: None,
            active: false,
            generation: 0,
            busy: false,
            last_inference: None,
            tracks: Vec::new(),
            pulse: None,
            last_output: TriggerOutput::default(),
            status: SessionStatus::Stopped,
        }
    }

    /// Reset everything and begin a new session
    pub fn start(&mut self, now: Instant) {
        if let SessionStatus::ModelFailed(reason) = &self.status {
            warn!(reason = %reason, "Not starting: model failed to load");
            return;
        }

        self.reset_session_state();
        self.generation += 1;
        self.active = true;
        self.started_at = Some(now);
        self.status = SessionStatus::Running;

        let session_id = Uuid::new_v4();
        self.session_id = Some(session_id);
        info!(
            session = %session_id,
            generation = self.generation,
            policy = %self.trigger.policy(),
            "Overlay session started"
        );
    }

    /// Start the camera, then the session
    ///
    /// A camera failure leaves the session stopped with
    /// [`SessionStatus::CameraUnavailable`].
    pub fn start_with_camera(
        &mut self,
        camera: &mut dyn CameraBackend,
        now: Instant,
    ) -> Result<(), CameraError> {
        if let Err(err) = camera.start() {
            self.camera_failed(&err);
            return Err(err);
        }
        self.start(now);
        Ok(())
    }

    /// Record a camera that refused to start
    pub fn camera_failed(&mut self, err: &CameraError) {
        error!(error = %err, "Failed to start camera");
        self.stop();
        self.status = SessionStatus::CameraUnavailable(err.to_string());
    }

    /// End the session; calling it again is a no-op
    pub fn stop(&mut self) {
        if !self.active {
            debug!("Overlay session already stopped");
            return;
        }

        self.reset_session_state();
        self.active = false;
        self.started_at = None;
        self.status = SessionStatus::Stopped;
        info!(
            session = ?self.session_id,
            generation = self.generation,
            "Overlay session stopped"
        );
    }

    /// Stop the session and release the camera
    pub fn stop_with_camera(&mut self, camera: &mut dyn CameraBackend) {
        self.stop();
        camera.stop();
    }

    /// Record a model load failure; the session will not start again
    pub fn fail_model(&mut self, err: &DetectorError) {
        error!(error = %err, "Expression model unavailable");
        self.stop();
        self.status = SessionStatus::ModelFailed(err.to_string());
    }

    fn reset_session_state(&mut self) {
        self.tracks.clear();
        self.trigger.reset();
        self.busy = false;
        self.last_inference = None;
        self.pulse = None;
        self.last_output = TriggerOutput::default();
    }

    /// Ask for an inference on `frame`
    ///
    /// Returns `None` (skip, never queue) when stopped, busy, or within the
    /// throttle interval of the previous inference.
    pub fn begin_inference(
        &mut self,
        now: Instant,
        frame: &CameraFrame,
    ) -> Option<InferenceTicket> {
        if !self.active || self.busy {
            return None;
        }
        if let Some(last) = self.last_inference
            && now.saturating_duration_since(last) < self.config.session.inference_interval()
        {
            return None;
        }

        self.busy = true;
        self.last_inference = Some(now);
        trace!(
            generation = self.generation,
            sequence = frame.sequence,
            "Inference dispatched"
        );
        Some(InferenceTicket {
            generation: self.generation,
            frame_width: frame.width,
            frame_height: frame.height,
        })
    }

    /// Take an inference result back
    ///
    /// Always releases the busy flag of the ticket's generation. Returns the
    /// tick report when the result was applied.
    pub fn complete_inference(
        &mut self,
        ticket: InferenceTicket,
        now: Instant,
        result: Result<Vec<FaceDetection>, DetectorError>,
        surface: &mut dyn DrawSurface,
    ) -> Option<TickReport> {
        if ticket.generation == self.generation {
            self.busy = false;
        }

        if !self.active || ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                active = self.active,
                "Dropping stale inference result"
            );
            return None;
        }

        match result {
            Ok(detections) => Some(self.apply_tick(
                now,
                detections,
                ticket.frame_width,
                ticket.frame_height,
                surface,
            )),
            Err(err @ DetectorError::ModelLoad(_)) => {
                self.fail_model(&err);
                None
            }
            Err(err) => {
                warn!(error = %err, "Inference failed, skipping tick");
                None
            }
        }
    }

    /// Run one tick: trigger, smoothing, placement and drawing
    pub fn apply_tick(
        &mut self,
        now: Instant,
        mut detections: Vec<FaceDetection>,
        frame_width: u32,
        frame_height: u32,
        surface: &mut dyn DrawSurface,
    ) -> TickReport {
        sort_left_to_right(&mut detections);

        let output = self.trigger.tick(now, &detections);
        if output.phase != self.last_output.phase {
            debug!(
                from = self.last_output.phase.as_str(),
                to = output.phase.as_str(),
                "Trigger phase changed"
            );
        }
        self.last_output = output;
        if let Some(kind) = output.pulse {
            self.pulse = Some(ActivePulse {
                kind,
                until: now + self.config.session.pulse_duration(),
            });
        }

        let mode = output.mode();
        surface.clear();

        let mut faces = Vec::with_capacity(detections.len());
        if detections.is_empty() {
            self.tracks.clear();
            draw_no_face(surface, mode);
        } else {
            self.tracks.resize_with(detections.len(), FaceTrack::default);

            let viewport = surface.size();
            let video_bounds = calculate_video_bounds(
                viewport.width,
                viewport.height,
                frame_width,
                frame_height,
                self.config.overlay.content_fit,
            );

            for (track, face) in self.tracks.iter_mut().zip(&detections) {
                let smoothed = self
                    .smoother
                    .smooth(track.smoothed.as_ref(), &face.expressions);
                let label = FaceLabel::measure(
                    label_lines(&smoothed, self.config.overlay.max_label_lines, mode),
                    &*surface,
                );
                let rect = transform_box_to_screen(
                    &face.bounds,
                    frame_width,
                    frame_height,
                    video_bounds,
                    self.config.overlay.mirrored,
                );
                let anchor = decide_anchor_with(
                    &self.config.placement,
                    track.anchor.as_ref(),
                    &rect,
                    label.size,
                    viewport,
                );

                draw_face(surface, rect, &label, &anchor, mode);

                faces.push(FaceSummary {
                    side: anchor.side,
                    label_x: anchor.x,
                    label_y: anchor.y,
                    dominant: smoothed
                        .dominant()
                        .map(|(label, value)| (label.to_string(), value)),
                });
                track.smoothed = Some(smoothed);
                track.anchor = Some(anchor);
            }
        }

        if let Some(kind) = self.active_pulse(now) {
            draw_pulse_border(surface, kind);
        }

        let elapsed = self
            .started_at
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or(Duration::ZERO);
        TickReport {
            elapsed_ms: elapsed.as_millis() as u64,
            phase: output.phase,
            mode,
            pulse: output.pulse,
            faces,
        }
    }

    /// Pulse still showing at `now`; expired markers are dropped
    pub fn active_pulse(&mut self, now: Instant) -> Option<PulseKind> {
        match self.pulse {
            Some(pulse) if now < pulse.until => Some(pulse.kind),
            Some(pulse) => {
                trace!(kind = pulse.kind.as_str(), "Pulse expired");
                self.pulse = None;
                None
            }
            None => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn tracks(&self) -> &[FaceTrack] {
        &self.tracks
    }

    pub fn phase(&self) -> TriggerPhase {
        self.trigger.phase()
    }

    pub fn mode(&self) -> OverlayMode {
        self.last_output.mode()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

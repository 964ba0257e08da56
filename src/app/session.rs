// SPDX-License-Identifier: GPL-3.0-only

//! Async session runner
//!
//! Drives a [`FrameOrchestrator`] on tokio. The render loop ticks at display
//! rate; when the orchestrator grants an inference ticket the detector future
//! is spawned and its result comes back over an mpsc channel tagged with the
//! ticket. All orchestrator state is touched from the loop only.

use crate::app::expression_overlay::surface::DrawSurface;
use crate::app::frame_processor::{ExpressionDetector, FaceDetection};
use crate::app::orchestrator::{FrameOrchestrator, InferenceTicket, TickReport};
use crate::app::trigger::OverlayMode;
use crate::backends::camera::{CameraBackend, CameraFrame};
use crate::config::Config;
use crate::constants::timing::COMPLETION_CHANNEL_CAPACITY;
use crate::errors::{CameraError, DetectorError};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// A finished inference on its way back to the loop
#[derive(Debug)]
struct Completion {
    ticket: InferenceTicket,
    result: Result<Vec<FaceDetection>, DetectorError>,
}

/// Totals for one `run`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks applied
    pub ticks: u64,
    /// Applied ticks rendered in surprise mode
    pub surprise_ticks: u64,
}

pub struct SessionRunner {
    orchestrator: FrameOrchestrator,
    detector: Arc<dyn ExpressionDetector>,
    completion_tx: mpsc::Sender<Completion>,
    completion_rx: mpsc::Receiver<Completion>,
}

impl SessionRunner {
    pub fn new(config: Config, detector: Arc<dyn ExpressionDetector>) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel(COMPLETION_CHANNEL_CAPACITY);
        Self {
            orchestrator: FrameOrchestrator::new(config),
            detector,
            completion_tx,
            completion_rx,
        }
    }

    pub fn orchestrator(&self) -> &FrameOrchestrator {
        &self.orchestrator
    }

    pub fn start(&mut self, camera: &mut dyn CameraBackend) -> Result<(), CameraError> {
        info!(detector = self.detector.name(), "Starting overlay session");
        self.orchestrator.start_with_camera(camera, Instant::now())
    }

    pub fn stop(&mut self, camera: &mut dyn CameraBackend) {
        self.orchestrator.stop_with_camera(camera);
    }

    /// One render-loop iteration
    ///
    /// Applies finished inferences, then dispatches a new one if the
    /// orchestrator allows it. Must be called from within a tokio runtime.
    pub fn tick(
        &mut self,
        now: Instant,
        camera: &mut dyn CameraBackend,
        surface: &mut dyn DrawSurface,
    ) -> Vec<TickReport> {
        let mut reports = Vec::new();
        while let Ok(completion) = self.completion_rx.try_recv() {
            if let Some(report) = self.orchestrator.complete_inference(
                completion.ticket,
                now,
                completion.result,
                surface,
            ) {
                reports.push(report);
            }
        }

        if let Some(frame) = camera.latest_frame()
            && let Some(ticket) = self.orchestrator.begin_inference(now, &frame)
        {
            self.dispatch(ticket, frame);
        }

        reports
    }

    fn dispatch(&self, ticket: InferenceTicket, frame: Arc<CameraFrame>) {
        let detection = self.detector.detect(frame);
        let tx = self.completion_tx.clone();

        tokio::spawn(async move {
            // Inner task so a panicking detector still reports back and
            // releases the busy flag
            let result = match tokio::spawn(detection).await {
                Ok(result) => result,
                Err(err) => Err(DetectorError::Inference(format!(
                    "detector task failed: {}",
                    err
                ))),
            };

            if tx.send(Completion { ticket, result }).await.is_err() {
                debug!(generation = ticket.generation, "Session gone, result dropped");
            }
        });
    }

    /// Run until `shutdown` flips to true or a finite source runs out
    ///
    /// The camera is stopped on return.
    pub async fn run(
        &mut self,
        camera: &mut dyn CameraBackend,
        surface: &mut dyn DrawSurface,
        mut shutdown: watch::Receiver<bool>,
        mut on_report: impl FnMut(&TickReport),
    ) -> RunSummary {
        let mut summary = RunSummary::default();
        let render_interval = self.orchestrator.config().session.render_interval();
        let mut interval = tokio::time::interval(render_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !*shutdown.borrow() && self.orchestrator.is_active() {
            tokio::select! {
                _ = interval.tick() => {
                    for report in self.tick(Instant::now(), camera, surface) {
                        summary.ticks += 1;
                        if report.mode == OverlayMode::Surprise {
                            summary.surprise_ticks += 1;
                        }
                        on_report(&report);
                    }

                    if camera.is_exhausted() && !self.orchestrator.is_busy() {
                        info!("Camera source exhausted");
                        break;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        warn!("Shutdown sender dropped, stopping session");
                        break;
                    }
                }
            }
        }

        self.stop(camera);
        info!(
            ticks = summary.ticks,
            surprise_ticks = summary.surprise_ticks,
            "Overlay session finished"
        );
        summary
    }
}

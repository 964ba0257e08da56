// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for overlay sessions
//!
//! This module provides command-line functionality for:
//! - Replaying detection scripts offline
//! - Watching a script play back in real time
//! - Printing the effective configuration

use moodcam::app::expression_overlay::RecordingSurface;
use moodcam::app::expression_overlay::surface::Size;
use moodcam::app::frame_processor::ScriptedDetector;
use moodcam::app::{SessionRunner, SessionStatus, TickReport, TriggerPhase, replay_script};
use moodcam::backends::camera::ReplayCamera;
use moodcam::config::Config;
use moodcam::errors::{AppError, AppResult};
use moodcam::script::DetectionScript;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Load a detection script from disk
pub fn load_script(path: &Path) -> AppResult<Arc<DetectionScript>> {
    Ok(Arc::new(DetectionScript::load(path)?))
}

/// Replay a script on a synthetic clock and print every tick
pub fn replay(
    config: &Config,
    script_path: &Path,
    json: bool,
    width: f32,
    height: f32,
) -> AppResult<()> {
    let script = load_script(script_path)?;
    let outcome = replay_script(config, script, Size::new(width, height));

    if let SessionStatus::CameraUnavailable(_) | SessionStatus::ModelFailed(_) = outcome.status {
        return Err(outcome.status.to_string().into());
    }

    let mut surprise_ticks = 0;
    for report in &outcome.reports {
        if report.phase == TriggerPhase::Triggered {
            surprise_ticks += 1;
        }
        if json {
            let line =
                serde_json::to_string(report).map_err(|e| AppError::Other(e.to_string()))?;
            println!("{}", line);
        } else {
            println!("{}", format_report(report));
        }
    }

    if !json {
        println!();
        println!(
            "{} ticks, {} in surprise mode (policy: {})",
            outcome.reports.len(),
            surprise_ticks,
            config.trigger.policy
        );
    }
    Ok(())
}

/// Play a script back in real time until it ends or Ctrl+C
pub fn watch(config: Config, script_path: &Path, looping: bool) -> AppResult<()> {
    let script = load_script(script_path)?;
    let detector = ScriptedDetector::load(Arc::clone(&script), config.detector)?;
    let viewport = Size::new(script.frame_width as f32, script.frame_height as f32);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let mut runner = SessionRunner::new(config, Arc::new(detector));
        let mut camera = ReplayCamera::new(script, looping);
        let mut surface = RecordingSurface::new(viewport.width, viewport.height);

        // Set up Ctrl+C handler
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
        ctrlc::set_handler(move || {
            let _ = shutdown_tx.send(true);
        })
        .map_err(|e| AppError::Other(format!("Failed to set Ctrl+C handler: {}", e)))?;

        runner.start(&mut camera)?;
        println!("Watching... (press Ctrl+C to stop)");

        let mut last_phase = TriggerPhase::Idle;
        let summary = runner
            .run(&mut camera, &mut surface, shutdown_rx, |report| {
                if report.phase != last_phase || report.pulse.is_some() {
                    println!("{}", format_report(report));
                    last_phase = report.phase;
                }
            })
            .await;

        info!(ticks = summary.ticks, "Watch finished");
        println!();
        println!(
            "{} ticks, {} in surprise mode",
            summary.ticks, summary.surprise_ticks
        );
        Ok::<(), AppError>(())
    })
}

/// Print the configuration as JSON
pub fn print_config(config: &Config) -> AppResult<()> {
    if let Some(path) = Config::default_path() {
        eprintln!("Default config path: {}", path.display());
    }
    println!("{}", config.to_json_pretty()?);
    Ok(())
}

fn format_report(report: &TickReport) -> String {
    let mut line = format!(
        "[{:>6}ms] {:<16} faces={}",
        report.elapsed_ms,
        report.phase.as_str(),
        report.faces.len()
    );
    if let Some(pulse) = report.pulse {
        line.push_str(&format!(" pulse={}", pulse.as_str()));
    }
    for (slot, face) in report.faces.iter().enumerate() {
        let dominant = face
            .dominant
            .as_ref()
            .map(|(label, value)| format!("{} {:.0}%", label, value * 100.0))
            .unwrap_or_else(|| "-".to_string());
        line.push_str(&format!(
            " | #{} {} @{} ({:.0},{:.0})",
            slot,
            dominant,
            face.side.as_str(),
            face.label_x,
            face.label_y
        ));
    }
    line
}

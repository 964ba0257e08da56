// SPDX-License-Identifier: MPL-2.0

//! moodcam - Real-time facial expression overlay engine
//!
//! This library draws expression probabilities next to detected faces on a
//! camera feed. It smooths the classifier output over time, places labels
//! around faces without covering them and runs a small hidden trigger that
//! switches the overlay into a surprise mode.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Overlay engine (smoothing, placement, trigger, orchestration)
//! - [`backends`]: Camera backend abstraction
//! - [`config`]: User configuration handling
//! - [`script`]: Detection scripts for replay and preview
//! - [`terminal`]: Live preview rendered in the terminal
//!
//! # Example
//!
//! ```ignore
//! // Replay a recorded session and print each tick:
//! // moodcam replay session.json --json
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod script;
pub mod terminal;

// Re-export commonly used types
pub use app::frame_processor::{ExpressionDistribution, FaceBox, FaceDetection};
pub use app::{FrameOrchestrator, SessionRunner, SessionStatus, TickReport};
pub use config::Config;
pub use errors::{AppError, AppResult};

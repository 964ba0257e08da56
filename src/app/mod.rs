// SPDX-License-Identifier: MPL-2.0

//! Overlay engine
//!
//! # Architecture
//!
//! - `frame_processor`: Detector trait and detection types
//! - `expression_overlay`: Smoothing, label placement and drawing
//! - `trigger`: Hidden trigger policies
//! - `orchestrator`: Per-session state, one tick at a time
//! - `session`: Async render loop around the orchestrator
//! - `replay`: Deterministic offline replay of a detection script
//!
//! # Main Types
//!
//! - `FrameOrchestrator`: Owns tracks, trigger state and the busy flag
//! - `SessionRunner`: Drives an orchestrator from a camera on tokio
//! - `TickReport`: What a single applied tick produced

pub mod expression_overlay;
pub mod frame_processor;
pub mod orchestrator;
pub mod replay;
pub mod session;
pub mod trigger;

pub use orchestrator::{FrameOrchestrator, InferenceTicket, SessionStatus, TickReport};
pub use replay::{ReplayOutcome, replay_script};
pub use session::{RunSummary, SessionRunner};
pub use trigger::{OverlayMode, TriggerPhase, TriggerPolicy};

// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for frame sources
//!
//! The overlay engine never talks to a device directly. It pulls frames from
//! a [`camera::CameraBackend`], so live devices and scripted replays look the
//! same to the session runner:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          Session runner / Orchestrator      │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              CameraBackend trait            │
//! │           ┌────────────────────┐            │
//! │           │    ReplayCamera    │            │
//! │           │ (detection script) │            │
//! │           └────────────────────┘            │
//! └─────────────────────────────────────────────┘
//! ```

pub mod camera;

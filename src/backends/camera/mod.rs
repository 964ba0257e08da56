// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! A backend owns the device (or its stand-in) between `start` and `stop`
//! and hands out the most recent frame on demand.

pub mod replay;
pub mod types;

pub use replay::ReplayCamera;
pub use types::*;

use crate::errors::CameraError;
use std::sync::Arc;

/// Frame source trait
pub trait CameraBackend: Send {
    /// Acquire the device and begin streaming
    ///
    /// # Returns
    /// * `Ok(())` - Streaming started
    /// * `Err(CameraError)` - Permission denied or no device available
    fn start(&mut self) -> Result<(), CameraError>;

    /// Release every acquired resource
    ///
    /// Calling `stop` on a stopped backend is a no-op.
    fn stop(&mut self);

    /// Check if the backend is currently streaming
    fn is_running(&self) -> bool;

    /// Most recent frame, if one is available
    fn latest_frame(&mut self) -> Option<Arc<CameraFrame>>;

    /// True once a finite source has delivered its last frame
    fn is_exhausted(&self) -> bool {
        false
    }
}

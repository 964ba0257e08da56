// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Expression labels produced by the detector model
pub mod expressions {
    pub const NEUTRAL: &str = "neutral";
    pub const HAPPY: &str = "happy";
    pub const SAD: &str = "sad";
    pub const ANGRY: &str = "angry";
    pub const FEARFUL: &str = "fearful";
    pub const DISGUSTED: &str = "disgusted";
    pub const SURPRISED: &str = "surprised";

    /// All labels the bundled model emits
    pub const ALL: [&str; 7] = [NEUTRAL, HAPPY, SAD, ANGRY, FEARFUL, DISGUSTED, SURPRISED];
}

/// Display reweighting and temporal smoothing
pub mod smoothing {
    /// Multiplier applied to every non-neutral expression
    pub const EXPRESSION_BOOST: f64 = 1.25;

    /// Multiplier applied to the neutral expression
    pub const NEUTRAL_DAMPING: f64 = 0.6;

    /// Weight of the newest observation in the moving average
    pub const BLEND_ALPHA: f64 = 0.25;
}

/// Label placement geometry (pixels)
pub mod placement {
    /// Gap between the face box and its label
    pub const LABEL_PADDING: f32 = 10.0;

    /// Viewport margin a previous anchor must keep to be reused
    pub const STICKY_MARGIN: f32 = 8.0;

    /// Viewport margin for fresh left/right candidates
    pub const HORIZONTAL_MARGIN: f32 = 24.0;

    /// Viewport margin for fresh top/bottom candidates
    pub const VERTICAL_MARGIN: f32 = 16.0;
}

/// Hidden trigger thresholds and windows
pub mod trigger {
    use super::Duration;

    /// Surprised probability that starts the hold timer
    pub const SURPRISED_THRESHOLD: f64 = 0.95;

    /// Happy probability counted during the follow-up and combo windows
    pub const HAPPY_THRESHOLD: f64 = 0.30;

    /// Angry probability counted during the follow-up and combo windows
    pub const ANGRY_THRESHOLD: f64 = 0.30;

    /// Continuous surprise needed to open the golden window
    pub const HOLD_DURATION: Duration = Duration::from_millis(5000);

    /// Length of the golden window
    pub const GOLDEN_WINDOW: Duration = Duration::from_millis(4000);

    /// Continuous absence of faces that satisfies the glitch step
    pub const GLITCH_DURATION: Duration = Duration::from_millis(1000);

    /// Length of the follow-up window
    pub const FOLLOWUP_WINDOW: Duration = Duration::from_millis(4000);

    /// How long surprise mode stays on once triggered
    pub const COOLDOWN: Duration = Duration::from_millis(4000);

    /// Length of the combo window (combo policy)
    pub const COMBO_WINDOW: Duration = Duration::from_millis(2000);

    /// Per-tick probability of triggering inside the combo window
    pub const COMBO_CHANCE: f64 = 0.2;
}

/// Session timing
pub mod timing {
    use super::Duration;

    /// Minimum spacing between inference starts
    pub const INFERENCE_INTERVAL: Duration = Duration::from_millis(100);

    /// Render loop period (~60fps)
    pub const RENDER_INTERVAL: Duration = Duration::from_millis(16);

    /// How long a trigger pulse marker stays visible
    pub const PULSE_DURATION: Duration = Duration::from_millis(600);

    /// Depth of the inference completion channel
    pub const COMPLETION_CHANNEL_CAPACITY: usize = 4;
}

/// Detector defaults
pub mod detector {
    /// Model input resolution (square)
    pub const INPUT_SIZE: u32 = 416;

    /// Minimum detection confidence
    pub const SCORE_THRESHOLD: f32 = 0.5;
}

/// Overlay rendering
pub mod overlay {
    /// Height of one label text line
    pub const LINE_HEIGHT: f32 = 18.0;

    /// Padding between label background edge and text
    pub const LABEL_INNER_PADDING: f32 = 6.0;

    /// Stroke width of the face box
    pub const BOX_LINE_WIDTH: f32 = 2.0;

    /// Stroke width of the viewport pulse border
    pub const PULSE_BORDER_WIDTH: f32 = 8.0;

    /// Number of expressions listed per label
    pub const MAX_LABEL_LINES: usize = 4;

    /// Indicator text shown when no face is detected
    pub const NO_FACE_TEXT: &str = "No face detected";

    /// Banner shown while surprise mode is active
    pub const SURPRISE_BANNER: &str = "!! SURPRISE !!";
}

/// Application information utilities
pub mod app_info {
    /// Application name used for config directories and logs
    pub const APP_NAME: &str = "moodcam";

    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}

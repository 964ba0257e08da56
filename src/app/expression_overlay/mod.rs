// SPDX-License-Identifier: MPL-2.0

//! Expression overlay
//!
//! Everything drawn on top of the camera preview:
//!
//! - Boxes around detected faces
//! - A label beside each face listing its most likely expressions
//! - A "no face" indicator, or the surprise banner while the trigger fires
//! - A coloured viewport border while a trigger pulse is active
//!
//! # Coordinate System
//!
//! Detections use source-frame pixel coordinates. They are mapped to viewport
//! pixels at draw time, accounting for video scaling, letterboxing and selfie
//! mirroring.

pub mod placement;
pub mod smoothing;
pub mod surface;

use crate::app::frame_processor::{ExpressionDistribution, FaceBox};
use crate::app::trigger::{OverlayMode, PulseKind};
use crate::constants::overlay::{
    BOX_LINE_WIDTH, LABEL_INNER_PADDING, LINE_HEIGHT, NO_FACE_TEXT, PULSE_BORDER_WIDTH,
    SURPRISE_BANNER,
};
use placement::Anchor;
use serde::{Deserialize, Serialize};
use surface::{Color, DrawSurface, ScreenRect, Size};

pub use placement::{AnchorSide, decide_anchor, decide_anchor_with};
pub use smoothing::{ExpressionSmoother, blend, reweight};
pub use surface::{DrawCommand, RecordingSurface};

/// How the video is fitted into the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoContentFit {
    /// Whole frame visible, letterboxed
    #[default]
    Contain,
    /// Viewport filled, frame cropped
    Cover,
}

/// Calculate the video content bounds within a container
///
/// Returns (offset_x, offset_y, video_width, video_height) for the actual
/// video content area within the container. With `Cover` the offsets are
/// negative on the cropped axis.
pub fn calculate_video_bounds(
    container_width: f32,
    container_height: f32,
    frame_width: u32,
    frame_height: u32,
    content_fit: VideoContentFit,
) -> (f32, f32, f32, f32) {
    if frame_width == 0 || frame_height == 0 || container_height <= 0.0 {
        return (0.0, 0.0, container_width, container_height);
    }

    let frame_aspect = frame_width as f32 / frame_height as f32;
    let container_aspect = container_width / container_height;

    // Contain fits the wider side, cover fits the narrower one
    let fit_to_width = match content_fit {
        VideoContentFit::Contain => frame_aspect > container_aspect,
        VideoContentFit::Cover => frame_aspect <= container_aspect,
    };

    let (video_width, video_height) = if fit_to_width {
        (container_width, container_width / frame_aspect)
    } else {
        (container_height * frame_aspect, container_height)
    };

    let offset_x = (container_width - video_width) / 2.0;
    let offset_y = (container_height - video_height) / 2.0;

    (offset_x, offset_y, video_width, video_height)
}

/// Transform a face box from frame pixels to viewport pixels
pub fn transform_box_to_screen(
    bounds: &FaceBox,
    frame_width: u32,
    frame_height: u32,
    video_bounds: (f32, f32, f32, f32),
    mirrored: bool,
) -> ScreenRect {
    let (offset_x, offset_y, video_width, video_height) = video_bounds;
    let scale_x = video_width / frame_width.max(1) as f32;
    let scale_y = video_height / frame_height.max(1) as f32;

    let mut x = bounds.x * scale_x;
    let y = bounds.y * scale_y;
    let width = bounds.width * scale_x;
    let height = bounds.height * scale_y;

    // Front camera preview is shown as a mirror image
    if mirrored {
        x = video_width - x - width;
    }

    ScreenRect::new(x + offset_x, y + offset_y, width, height)
}

/// Box stroke colour for the current mode
pub fn box_color(mode: OverlayMode) -> Color {
    match mode {
        OverlayMode::Normal => Color::from_rgb(0.30, 0.69, 0.31),
        OverlayMode::Surprise => Color::from_rgb(0.91, 0.12, 0.39),
    }
}

/// Label background colour for the current mode
pub fn label_background(mode: OverlayMode) -> Color {
    match mode {
        OverlayMode::Normal => Color::from_rgba(0.0, 0.0, 0.0, 0.65),
        OverlayMode::Surprise => Color::from_rgba(0.35, 0.02, 0.20, 0.80),
    }
}

const TEXT_COLOR: Color = Color::from_rgb(1.0, 1.0, 1.0);

/// Border colour for a trigger pulse
pub fn pulse_color(kind: PulseKind) -> Color {
    match kind {
        PulseKind::GoldenEntered => Color::from_rgb(1.00, 0.76, 0.03),
        PulseKind::Glitch => Color::from_rgb(0.00, 0.90, 0.95),
        PulseKind::GoldenClosed => Color::from_rgb(0.62, 0.62, 0.62),
    }
}

/// Text lines shown beside a face
///
/// The most likely expressions first, as whole percentages. The surprise
/// mode puts the banner above them.
pub fn label_lines(
    display: &ExpressionDistribution,
    max_lines: usize,
    mode: OverlayMode,
) -> Vec<String> {
    let mut lines = Vec::with_capacity(max_lines + 1);
    if mode == OverlayMode::Surprise {
        lines.push(SURPRISE_BANNER.to_string());
    }
    lines.extend(
        display
            .ranked()
            .into_iter()
            .take(max_lines)
            .map(|(label, value)| format!("{label}: {:.0}%", value * 100.0)),
    );
    if lines.is_empty() {
        lines.push("?".to_string());
    }
    lines
}

/// Lines of a face label together with its measured size
#[derive(Debug, Clone, PartialEq)]
pub struct FaceLabel {
    pub lines: Vec<String>,
    pub size: Size,
}

impl FaceLabel {
    /// Measure lines on a surface
    pub fn measure(lines: Vec<String>, surface: &dyn DrawSurface) -> Self {
        let text_width = lines
            .iter()
            .map(|line| surface.measure_text(line))
            .fold(0.0_f32, f32::max);
        let size = Size::new(
            text_width + 2.0 * LABEL_INNER_PADDING,
            lines.len() as f32 * LINE_HEIGHT + 2.0 * LABEL_INNER_PADDING,
        );
        Self { lines, size }
    }
}

/// Draw a face box and its label at `anchor`
pub fn draw_face(
    surface: &mut dyn DrawSurface,
    face: ScreenRect,
    label: &FaceLabel,
    anchor: &Anchor,
    mode: OverlayMode,
) {
    surface.stroke_rect(face, box_color(mode), BOX_LINE_WIDTH);
    surface.fill_rect(
        ScreenRect::new(anchor.x, anchor.y, label.size.width, label.size.height),
        label_background(mode),
    );

    for (index, line) in label.lines.iter().enumerate() {
        surface.fill_text(
            line,
            anchor.x + LABEL_INNER_PADDING,
            anchor.y + LABEL_INNER_PADDING + index as f32 * LINE_HEIGHT,
            TEXT_COLOR,
        );
    }
}

/// Centered indicator for a tick without faces
pub fn draw_no_face(surface: &mut dyn DrawSurface, mode: OverlayMode) {
    let text = match mode {
        OverlayMode::Normal => NO_FACE_TEXT,
        OverlayMode::Surprise => SURPRISE_BANNER,
    };
    let viewport = surface.size();
    let width = surface.measure_text(text);
    let x = ((viewport.width - width) / 2.0).max(0.0);
    let y = ((viewport.height - LINE_HEIGHT) / 2.0).max(0.0);

    surface.fill_rect(
        ScreenRect::new(
            (x - LABEL_INNER_PADDING).max(0.0),
            (y - LABEL_INNER_PADDING).max(0.0),
            width + 2.0 * LABEL_INNER_PADDING,
            LINE_HEIGHT + 2.0 * LABEL_INNER_PADDING,
        ),
        label_background(mode),
    );
    surface.fill_text(text, x, y, TEXT_COLOR);
}

/// Coloured border around the whole viewport
pub fn draw_pulse_border(surface: &mut dyn DrawSurface, kind: PulseKind) {
    let viewport = surface.size();
    let inset = PULSE_BORDER_WIDTH / 2.0;
    surface.stroke_rect(
        ScreenRect::new(
            inset,
            inset,
            (viewport.width - PULSE_BORDER_WIDTH).max(0.0),
            (viewport.height - PULSE_BORDER_WIDTH).max(0.0),
        ),
        pulse_color(kind),
        PULSE_BORDER_WIDTH,
    );
}

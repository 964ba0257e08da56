// SPDX-License-Identifier: GPL-3.0-only

//! Label placement
//!
//! Chooses where a face's label goes: beside, below or above the face box,
//! never over it when avoidable and never outside the viewport. A label keeps
//! its previous side while that side still fits loosely, which stops it from
//! flipping back and forth as the box jitters.

use super::surface::{ScreenRect, Size};
use crate::config::PlacementConfig;
use serde::{Deserialize, Serialize};

/// Side of the face box a label sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorSide {
    Right,
    Left,
    Top,
    Bottom,
}

impl AnchorSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Right => "right",
            Self::Left => "left",
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

/// Chosen label position (top-left corner) and side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub side: AnchorSide,
    pub x: f32,
    pub y: f32,
}

/// Decide with the default geometry
pub fn decide_anchor(
    previous: Option<&Anchor>,
    face: &ScreenRect,
    label: Size,
    viewport: Size,
) -> Anchor {
    decide_anchor_with(&PlacementConfig::default(), previous, face, label, viewport)
}

/// Pick a label anchor for a face
///
/// Order of preference:
/// 1. the previous side, if it still fits within the sticky margin
/// 2. right, left (horizontal margin), bottom, top (vertical margin)
/// 3. right, clamped into the viewport
///
/// The returned corner is always clamped to `[0, viewport - label]`.
pub fn decide_anchor_with(
    config: &PlacementConfig,
    previous: Option<&Anchor>,
    face: &ScreenRect,
    label: Size,
    viewport: Size,
) -> Anchor {
    if let Some(previous) = previous {
        let (x, y) = position_for(previous.side, face, label, config.padding);
        if fits(x, y, label, viewport, config.sticky_margin) {
            return clamped(previous.side, x, y, label, viewport);
        }
    }

    let candidates = [
        (AnchorSide::Right, config.horizontal_margin),
        (AnchorSide::Left, config.horizontal_margin),
        (AnchorSide::Bottom, config.vertical_margin),
        (AnchorSide::Top, config.vertical_margin),
    ];

    for (side, margin) in candidates {
        let (x, y) = position_for(side, face, label, config.padding);
        if fits(x, y, label, viewport, margin) {
            return clamped(side, x, y, label, viewport);
        }
    }

    let (x, y) = position_for(AnchorSide::Right, face, label, config.padding);
    clamped(AnchorSide::Right, x, y, label, viewport)
}

/// Label corner for a side, before any clamping
fn position_for(side: AnchorSide, face: &ScreenRect, label: Size, padding: f32) -> (f32, f32) {
    match side {
        AnchorSide::Right => (face.x + face.width + padding, face.y),
        AnchorSide::Left => (face.x - label.width - padding, face.y),
        AnchorSide::Top => (face.x, face.y - label.height - padding),
        AnchorSide::Bottom => (face.x, face.y + face.height + padding),
    }
}

fn fits(x: f32, y: f32, label: Size, viewport: Size, margin: f32) -> bool {
    x >= margin
        && y >= margin
        && x + label.width <= viewport.width - margin
        && y + label.height <= viewport.height - margin
}

fn clamped(side: AnchorSide, x: f32, y: f32, label: Size, viewport: Size) -> Anchor {
    // max(0) last: a label wider than the viewport pins to the origin
    let max_x = viewport.width - label.width;
    let max_y = viewport.height - label.height;
    Anchor {
        side,
        x: x.min(max_x).max(0.0),
        y: y.min(max_y).max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Size = Size::new(640.0, 480.0);
    const LABEL: Size = Size::new(120.0, 60.0);

    #[test]
    fn test_prefers_right_side() {
        let face = ScreenRect::new(200.0, 150.0, 100.0, 100.0);
        let anchor = decide_anchor(None, &face, LABEL, VIEWPORT);
        assert_eq!(anchor.side, AnchorSide::Right);
        assert_eq!((anchor.x, anchor.y), (310.0, 150.0));
    }

    #[test]
    fn test_falls_back_to_left_near_right_edge() {
        let face = ScreenRect::new(480.0, 150.0, 100.0, 100.0);
        let anchor = decide_anchor(None, &face, LABEL, VIEWPORT);
        assert_eq!(anchor.side, AnchorSide::Left);
        assert_eq!((anchor.x, anchor.y), (350.0, 150.0));
    }

    #[test]
    fn test_below_when_face_spans_width() {
        let face = ScreenRect::new(30.0, 40.0, 580.0, 200.0);
        let anchor = decide_anchor(None, &face, LABEL, VIEWPORT);
        assert_eq!(anchor.side, AnchorSide::Bottom);
        assert_eq!((anchor.x, anchor.y), (30.0, 250.0));
    }

    #[test]
    fn test_above_when_face_fills_lower_area() {
        let face = ScreenRect::new(30.0, 200.0, 580.0, 270.0);
        let anchor = decide_anchor(None, &face, LABEL, VIEWPORT);
        assert_eq!(anchor.side, AnchorSide::Top);
        assert_eq!((anchor.x, anchor.y), (30.0, 130.0));
    }

    #[test]
    fn test_sticky_side_survives_small_shift() {
        // Left fits loosely here but right would be preferred when fresh
        let face = ScreenRect::new(200.0, 150.0, 100.0, 100.0);
        let previous = Anchor {
            side: AnchorSide::Left,
            x: 70.0,
            y: 150.0,
        };
        let shifted = ScreenRect::new(204.0, 153.0, 100.0, 100.0);

        let anchor = decide_anchor(Some(&previous), &shifted, LABEL, VIEWPORT);
        assert_eq!(anchor.side, AnchorSide::Left);
        assert_eq!((anchor.x, anchor.y), (74.0, 153.0));
        assert!(!anchor_overlaps(&anchor, &shifted));

        let fresh = decide_anchor(None, &face, LABEL, VIEWPORT);
        assert_eq!(fresh.side, AnchorSide::Right);
    }

    #[test]
    fn test_sticky_margin_is_looser_than_fresh_margin() {
        // Right edge lands at 620: inside the 8px sticky margin,
        // outside the 24px fresh margin
        let face = ScreenRect::new(390.0, 150.0, 100.0, 100.0);
        let previous = Anchor {
            side: AnchorSide::Right,
            x: 500.0,
            y: 150.0,
        };

        let kept = decide_anchor(Some(&previous), &face, LABEL, VIEWPORT);
        assert_eq!(kept.side, AnchorSide::Right);

        let fresh = decide_anchor(None, &face, LABEL, VIEWPORT);
        assert_eq!(fresh.side, AnchorSide::Left);
    }

    #[test]
    fn test_oversized_label_falls_back_to_clamped_right() {
        let viewport = Size::new(100.0, 80.0);
        let label = Size::new(150.0, 120.0);
        let face = ScreenRect::new(20.0, 20.0, 40.0, 40.0);

        let anchor = decide_anchor(None, &face, label, viewport);
        assert_eq!(anchor.side, AnchorSide::Right);
        assert_eq!((anchor.x, anchor.y), (0.0, 0.0));
    }

    #[test]
    fn test_fallback_clamps_inside_viewport() {
        // No side fits, label still smaller than viewport
        let viewport = Size::new(200.0, 120.0);
        let face = ScreenRect::new(10.0, 10.0, 180.0, 100.0);
        let label = Size::new(90.0, 50.0);

        let anchor = decide_anchor(None, &face, label, viewport);
        assert_eq!(anchor.side, AnchorSide::Right);
        assert_eq!(anchor.x, viewport.width - label.width);
        assert_eq!(anchor.y, 10.0);
    }

    fn anchor_overlaps(anchor: &Anchor, face: &ScreenRect) -> bool {
        ScreenRect::new(anchor.x, anchor.y, LABEL.width, LABEL.height).intersects(face)
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Drawing surface abstraction
//!
//! The overlay only needs rectangles, text and text measurement, so any
//! canvas-like target can host it. [`RecordingSurface`] keeps the issued
//! commands in memory for headless runs and tests.

/// RGBA color with components in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn from_rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn from_rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// 8-bit RGB triple, alpha dropped
    pub fn to_rgb8(self) -> (u8, u8, u8) {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        (channel(self.r), channel(self.g), channel(self.b))
    }
}

/// Width and height in viewport pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in viewport pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn intersects(&self, other: &ScreenRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Canvas-like render target
pub trait DrawSurface {
    /// Current viewport size
    fn size(&self) -> Size;

    /// Erase everything drawn for the previous tick
    fn clear(&mut self);

    fn fill_rect(&mut self, rect: ScreenRect, color: Color);

    fn stroke_rect(&mut self, rect: ScreenRect, color: Color, line_width: f32);

    /// Draw text with its top-left corner at (x, y)
    fn fill_text(&mut self, text: &str, x: f32, y: f32, color: Color);

    /// Width the text would occupy when drawn
    fn measure_text(&self, text: &str) -> f32;
}

/// A recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    FillRect {
        rect: ScreenRect,
        color: Color,
    },
    StrokeRect {
        rect: ScreenRect,
        color: Color,
        line_width: f32,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        color: Color,
    },
}

/// In-memory surface with fixed-advance text metrics
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    size: Size,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    /// Default glyph advance, roughly a 14px sans-serif
    pub const DEFAULT_CHAR_WIDTH: f32 = 8.0;

    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Size::new(width, height),
            commands: Vec::new(),
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.size = Size::new(width, height);
    }

    /// Commands issued since the last clear
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Text drawn since the last clear
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl DrawSurface for RecordingSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
    }

    fn fill_rect(&mut self, rect: ScreenRect, color: Color) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn stroke_rect(&mut self, rect: ScreenRect, color: Color, line_width: f32) {
        self.commands.push(DrawCommand::StrokeRect {
            rect,
            color,
            line_width,
        });
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, color: Color) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            x,
            y,
            color,
        });
    }

    fn measure_text(&self, text: &str) -> f32 {
        text.chars().count() as f32 * Self::DEFAULT_CHAR_WIDTH
    }
}

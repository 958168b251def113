//! Tool and style settings for the editing session.
//!
//! Not part of the document: they are seeded from `ToolDefaults` when a
//! session starts and never saved with the canvas.

use sk_core::model::Brush;
use sk_core::{Color, ToolDefaults};

/// The active tool determines how pointer events are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    Select,
    #[default]
    Pencil,
    Marker,
    Brush,
    Pen,
    Rectangle,
    Circle,
    Triangle,
    LineShape,
    Arrow,
    Eraser,
    Text,
}

impl ToolKind {
    /// The brush a freehand tool draws with; `None` for other tools.
    pub fn brush(self) -> Option<Brush> {
        match self {
            ToolKind::Pencil => Some(Brush::Pencil),
            ToolKind::Marker => Some(Brush::Marker),
            ToolKind::Brush => Some(Brush::Brush),
            ToolKind::Pen => Some(Brush::Pen),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolSettings {
    pub tool: ToolKind,
    pub color: Color,
    pub stroke_width: f32,
    pub fill_enabled: bool,
    pub fill_color: Color,
    /// Opacity given to new elements, `[0, 1]`.
    pub opacity: f32,
    pub font_family: String,
    pub font_size: f32,
    pub lock_aspect: bool,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self::from_defaults(&ToolDefaults::default())
    }
}

impl ToolSettings {
    pub fn from_defaults(defaults: &ToolDefaults) -> Self {
        Self {
            tool: ToolKind::default(),
            color: defaults.color,
            stroke_width: defaults.stroke_width,
            fill_enabled: defaults.fill_enabled,
            fill_color: defaults.fill_color,
            opacity: defaults.opacity.clamp(0.0, 1.0),
            font_family: defaults.font_family.clone(),
            font_size: defaults.font_size,
            lock_aspect: defaults.lock_aspect,
        }
    }

    /// Fill for new closed shapes.
    pub fn fill(&self) -> Option<Color> {
        self.fill_enabled.then_some(self.fill_color)
    }
}

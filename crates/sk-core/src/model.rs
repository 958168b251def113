//! Canvas data model: colors, layers, and the closed set of drawable elements.
//!
//! Every element is an `Element` (common fields) wrapping an `ElementKind`
//! (variant geometry). The JSON shape matches the backend's canvas resource:
//! a flat object discriminated by `"type"`, with camelCase fields.

use crate::geometry::Bounds;
use crate::id::{ElementId, LayerId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Write as _;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color, 8 bits per channel. Serialized as a hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA` (leading `#` optional),
    /// or the keyword `transparent`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.eq_ignore_ascii_case("transparent") {
            return Some(Self::TRANSPARENT);
        }
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let short = |i: usize| hex_val(bytes[i]).map(|v| v * 17);
        let long = |i: usize| Some(hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?);

        match bytes.len() {
            3 => Some(Self::rgb(short(0)?, short(1)?, short(2)?)),
            4 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, short(3)?)),
            6 => Some(Self::rgb(long(0)?, long(2)?, long(4)?)),
            8 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, long(6)?)),
            _ => None,
        }
    }

    /// `#RRGGBB` when opaque, `#RRGGBBAA` otherwise.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(9);
        let _ = write!(out, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b);
        if self.a != 255 {
            let _ = write!(out, "{:02X}", self.a);
        }
        out
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color `{s}`")))
    }
}

// ─── Layers ──────────────────────────────────────────────────────────────

/// An independently visible, lockable, opacity-scaled bucket of elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

impl Layer {
    pub fn new(id: LayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            visible: true,
            locked: false,
            opacity: 1.0,
        }
    }

    /// Whether mutating interactions may touch this layer's elements.
    pub fn is_editable(&self) -> bool {
        self.visible && !self.locked
    }
}

fn default_true() -> bool {
    true
}

fn default_opacity() -> f32 {
    1.0
}

// ─── Element payloads ────────────────────────────────────────────────────

/// Which freehand tool drew a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Brush {
    #[default]
    Pencil,
    Marker,
    Brush,
    Pen,
}

/// Freehand stroke. `points` is flat `[x0, y0, x1, y1, ...]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Freehand {
    pub points: Vec<f32>,
    pub stroke: Color,
    pub stroke_width: f32,
    #[serde(default)]
    pub brush: Brush,
}

/// Straight polyline (line shape, arrow).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Polyline {
    pub points: Vec<f32>,
    pub stroke: Color,
    pub stroke_width: f32,
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxShape {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub stroke: Color,
    pub stroke_width: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
}

/// Shape described by a center and a radius (circle, regular triangle).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadialShape {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub stroke: Color,
    pub stroke_width: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub font_size: f32,
    pub font_family: String,
    pub fill: Color,
    /// Measured box, when the renderer has reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
}

impl TextBlock {
    /// Width/height used for pointer purposes: the measured box when known,
    /// else `len * font_size / 2` by `font_size`.
    pub fn estimated_size(&self) -> (f32, f32) {
        let width = self
            .width
            .unwrap_or(self.text.chars().count() as f32 * self.font_size / 2.0);
        let height = self.height.unwrap_or(self.font_size);
        (width, height)
    }
}

/// Placed bitmap. `original_*` keep the decoded pixel size so the aspect
/// ratio survives free-form resizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub original_width: f32,
    pub original_height: f32,
    /// Pixel source (URL or data URL) handed over by the upload collaborator.
    pub src: String,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default = "default_scale")]
    pub scale_x: f32,
    #[serde(default = "default_scale")]
    pub scale_y: f32,
    #[serde(default)]
    pub offset_x: f32,
    #[serde(default)]
    pub offset_y: f32,
}

fn default_scale() -> f32 {
    1.0
}

impl ImageData {
    /// `original_width / original_height`, or 1 for degenerate sources.
    pub fn aspect_ratio(&self) -> f32 {
        if self.original_width > 0.0 && self.original_height > 0.0 {
            self.original_width / self.original_height
        } else {
            1.0
        }
    }
}

// ─── Elements ────────────────────────────────────────────────────────────

/// Variant geometry of a drawable element. Adding a variant here makes every
/// exhaustive `match` in the workspace fail to compile until it is handled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ElementKind {
    Line(Freehand),
    #[serde(alias = "rect")]
    Rectangle(BoxShape),
    Circle(RadialShape),
    Triangle(RadialShape),
    LineShape(Polyline),
    Arrow(Polyline),
    Text(TextBlock),
    Image(ImageData),
}

impl ElementKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ElementKind::Line(_) => "line",
            ElementKind::Rectangle(_) => "rectangle",
            ElementKind::Circle(_) => "circle",
            ElementKind::Triangle(_) => "triangle",
            ElementKind::LineShape(_) => "line-shape",
            ElementKind::Arrow(_) => "arrow",
            ElementKind::Text(_) => "text",
            ElementKind::Image(_) => "image",
        }
    }

    /// Flat point list for line-like variants.
    pub fn points(&self) -> Option<&[f32]> {
        match self {
            ElementKind::Line(f) => Some(&f.points),
            ElementKind::LineShape(p) | ElementKind::Arrow(p) => Some(&p.points),
            _ => None,
        }
    }

    pub fn points_mut(&mut self) -> Option<&mut Vec<f32>> {
        match self {
            ElementKind::Line(f) => Some(&mut f.points),
            ElementKind::LineShape(p) | ElementKind::Arrow(p) => Some(&mut p.points),
            _ => None,
        }
    }
}

/// A drawable primitive belonging to exactly one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    pub layer_id: LayerId,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl Element {
    pub fn new(id: ElementId, layer_id: LayerId, opacity: f32, kind: ElementKind) -> Self {
        Self {
            id,
            layer_id,
            opacity,
            kind,
        }
    }

    /// Axis-aligned bounding box in canvas space (stroke width not included).
    pub fn bounds(&self) -> Bounds {
        match &self.kind {
            ElementKind::Line(Freehand { points, .. })
            | ElementKind::LineShape(Polyline { points, .. })
            | ElementKind::Arrow(Polyline { points, .. }) => {
                Bounds::from_points(points).unwrap_or_default()
            }
            ElementKind::Rectangle(r) => Bounds::new(r.x, r.y, r.width, r.height),
            ElementKind::Circle(c) | ElementKind::Triangle(c) => Bounds::new(
                c.x - c.radius,
                c.y - c.radius,
                c.radius * 2.0,
                c.radius * 2.0,
            ),
            ElementKind::Text(t) => {
                let (w, h) = t.estimated_size();
                Bounds::new(t.x, t.y, w, h)
            }
            ElementKind::Image(i) => Bounds::new(i.x, i.y, i.width, i.height),
        }
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        match &mut self.kind {
            ElementKind::Line(Freehand { points, .. })
            | ElementKind::LineShape(Polyline { points, .. })
            | ElementKind::Arrow(Polyline { points, .. }) => {
                for pair in points.chunks_exact_mut(2) {
                    pair[0] += dx;
                    pair[1] += dy;
                }
            }
            ElementKind::Rectangle(BoxShape { x, y, .. })
            | ElementKind::Circle(RadialShape { x, y, .. })
            | ElementKind::Triangle(RadialShape { x, y, .. })
            | ElementKind::Text(TextBlock { x, y, .. })
            | ElementKind::Image(ImageData { x, y, .. }) => {
                *x += dx;
                *y += dy;
            }
        }
    }

    /// Fit the element's geometry into `target`.
    ///
    /// Boxes take the new position and size; radial shapes are recentered
    /// with a radius of half the smaller side; polylines are rescaled point
    /// by point; flipped images keep their offsets anchored to the new size.
    pub fn set_bounds(&mut self, target: Bounds) {
        let current = self.bounds();
        match &mut self.kind {
            ElementKind::Line(Freehand { points, .. })
            | ElementKind::LineShape(Polyline { points, .. })
            | ElementKind::Arrow(Polyline { points, .. }) => {
                let sx = if current.width > 0.0 {
                    target.width / current.width
                } else {
                    1.0
                };
                let sy = if current.height > 0.0 {
                    target.height / current.height
                } else {
                    1.0
                };
                for pair in points.chunks_exact_mut(2) {
                    pair[0] = target.x + (pair[0] - current.x) * sx;
                    pair[1] = target.y + (pair[1] - current.y) * sy;
                }
            }
            ElementKind::Rectangle(r) => {
                r.x = target.x;
                r.y = target.y;
                r.width = target.width;
                r.height = target.height;
            }
            ElementKind::Circle(c) | ElementKind::Triangle(c) => {
                let (cx, cy) = target.center();
                c.x = cx;
                c.y = cy;
                c.radius = target.width.min(target.height) / 2.0;
            }
            ElementKind::Text(t) => {
                t.x = target.x;
                t.y = target.y;
                t.width = Some(target.width);
                t.height = Some(target.height);
            }
            ElementKind::Image(i) => {
                i.x = target.x;
                i.y = target.y;
                i.width = target.width;
                i.height = target.height;
                if i.scale_x < 0.0 {
                    i.offset_x = i.width;
                }
                if i.scale_y < 0.0 {
                    i.offset_y = i.height;
                }
            }
        }
    }

    pub fn as_image(&self) -> Option<&ImageData> {
        match &self.kind {
            ElementKind::Image(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut ImageData> {
        match &mut self.kind {
            ElementKind::Image(i) => Some(i),
            _ => None,
        }
    }
}

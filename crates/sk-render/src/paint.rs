//! Document → display list.
//!
//! Walks visible layers bottom to top and emits one `Drawable` per element,
//! keyed by element id. Geometry is in canvas units; `view_transform` maps
//! canvas to screen for the backend. Text shaping and image decoding are the
//! backend's job: text and images are passed through as descriptors.

use kurbo::{Affine, BezPath, Cap, Circle, Join, Point, Rect, Shape, Stroke};
use peniko::Color;
use sk_core::model::{self as m, ElementKind};
use sk_core::{Document, Element, ElementId, LayerId, Viewport};
use std::f64::consts::{FRAC_PI_2, TAU};

/// Flattening tolerance for curves converted to paths.
const PATH_TOLERANCE: f64 = 0.1;

const ARROW_HEAD_LENGTH: f64 = 10.0;
const ARROW_HEAD_WIDTH: f64 = 10.0;

#[derive(Debug, Clone, Copy)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f64,
    pub cap: Cap,
    pub join: Join,
}

impl StrokeStyle {
    fn solid(color: m::Color, width: f32) -> Self {
        Self {
            color: to_peniko(color),
            width: width as f64,
            cap: Cap::Butt,
            join: Join::Miter,
        }
    }

    fn rounded(color: m::Color, width: f32) -> Self {
        Self {
            cap: Cap::Round,
            join: Join::Round,
            ..Self::solid(color, width)
        }
    }

    pub fn to_kurbo(&self) -> Stroke {
        Stroke {
            width: self.width,
            join: self.join,
            start_cap: self.cap,
            end_cap: self.cap,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub enum Geometry {
    Path(BezPath),
    /// Laid out by the backend; `origin` is the top-left of the text box.
    Text {
        origin: Point,
        text: String,
        font_size: f64,
        font_family: String,
    },
    /// Unit-space image box `(0, 0, width, height)`, placed by the drawable's
    /// transform.
    Image { size: (f64, f64), src: String },
}

/// One node of the display list.
#[derive(Debug, Clone)]
pub struct Drawable {
    pub id: ElementId,
    pub layer_id: LayerId,
    pub geometry: Geometry,
    pub transform: Affine,
    pub stroke: Option<StrokeStyle>,
    pub fill: Option<Color>,
    /// Layer opacity × element opacity.
    pub opacity: f32,
}

/// Build the display list: visible layers bottom first, paint order within a
/// layer. `preview`, the element being drawn but not yet committed, goes last.
pub fn build_scene(doc: &Document, preview: Option<&Element>) -> Vec<Drawable> {
    let mut out = Vec::with_capacity(doc.element_count() + 1);
    for layer in doc.layers().iter().filter(|l| l.visible) {
        for el in doc.elements(layer.id) {
            out.push(drawable(el, layer.opacity));
        }
    }
    if let Some(el) = preview {
        let layer_opacity = doc.layer(el.layer_id).map_or(1.0, |l| l.opacity);
        out.push(drawable(el, layer_opacity));
    }
    log::trace!("scene: {} drawables", out.len());
    out
}

/// Canvas → screen affine for a viewport.
pub fn view_transform(viewport: &Viewport) -> Affine {
    Affine::translate((viewport.offset_x as f64, viewport.offset_y as f64))
        * Affine::scale(viewport.scale as f64)
}

fn drawable(el: &Element, layer_opacity: f32) -> Drawable {
    let mut d = Drawable {
        id: el.id,
        layer_id: el.layer_id,
        geometry: Geometry::Path(BezPath::new()),
        transform: Affine::IDENTITY,
        stroke: None,
        fill: None,
        opacity: layer_opacity * el.opacity,
    };
    match &el.kind {
        ElementKind::Line(f) => {
            d.geometry = Geometry::Path(polyline_path(&f.points));
            d.stroke = Some(StrokeStyle::rounded(f.stroke, f.stroke_width));
        }
        ElementKind::LineShape(p) => {
            d.geometry = Geometry::Path(polyline_path(&p.points));
            d.stroke = Some(StrokeStyle::rounded(p.stroke, p.stroke_width));
        }
        ElementKind::Arrow(p) => {
            let mut path = polyline_path(&p.points);
            append_arrow_head(&mut path, &p.points);
            d.geometry = Geometry::Path(path);
            d.stroke = Some(StrokeStyle::rounded(p.stroke, p.stroke_width));
        }
        ElementKind::Rectangle(r) => {
            let rect = Rect::new(
                r.x as f64,
                r.y as f64,
                (r.x + r.width) as f64,
                (r.y + r.height) as f64,
            );
            d.geometry = Geometry::Path(rect.to_path(PATH_TOLERANCE));
            d.stroke = Some(StrokeStyle::solid(r.stroke, r.stroke_width));
            d.fill = r.fill.map(to_peniko);
        }
        ElementKind::Circle(c) => {
            let circle = Circle::new((c.x as f64, c.y as f64), c.radius as f64);
            d.geometry = Geometry::Path(circle.to_path(PATH_TOLERANCE));
            d.stroke = Some(StrokeStyle::solid(c.stroke, c.stroke_width));
            d.fill = c.fill.map(to_peniko);
        }
        ElementKind::Triangle(t) => {
            d.geometry = Geometry::Path(regular_polygon(t.x as f64, t.y as f64, t.radius as f64, 3));
            d.stroke = Some(StrokeStyle::solid(t.stroke, t.stroke_width));
            d.fill = t.fill.map(to_peniko);
        }
        ElementKind::Text(t) => {
            d.geometry = Geometry::Text {
                origin: Point::new(t.x as f64, t.y as f64),
                text: t.text.clone(),
                font_size: t.font_size as f64,
                font_family: t.font_family.clone(),
            };
            d.fill = Some(to_peniko(t.fill));
        }
        ElementKind::Image(i) => {
            d.geometry = Geometry::Image {
                size: (i.width as f64, i.height as f64),
                src: i.src.clone(),
            };
            d.transform = image_transform(i);
        }
    }
    d
}

// ─── Geometry helpers ────────────────────────────────────────────────────

fn polyline_path(points: &[f32]) -> BezPath {
    let mut path = BezPath::new();
    let mut pairs = points.chunks_exact(2);
    if let Some(first) = pairs.next() {
        path.move_to((first[0] as f64, first[1] as f64));
        for p in pairs {
            path.line_to((p[0] as f64, p[1] as f64));
        }
    }
    path
}

/// Open chevron at the last point, pointing along the last segment.
fn append_arrow_head(path: &mut BezPath, points: &[f32]) {
    let n = points.len() / 2;
    if n < 2 {
        return;
    }
    let tip = Point::new(points[2 * n - 2] as f64, points[2 * n - 1] as f64);
    let prev = Point::new(points[2 * n - 4] as f64, points[2 * n - 3] as f64);
    let dir = tip - prev;
    let len = dir.hypot();
    if len == 0.0 {
        return;
    }
    let unit = dir / len;
    let normal = kurbo::Vec2::new(-unit.y, unit.x);
    let base = tip - unit * ARROW_HEAD_LENGTH;
    let half = ARROW_HEAD_WIDTH / 2.0;
    path.move_to(base + normal * half);
    path.line_to(tip);
    path.line_to(base - normal * half);
}

/// Regular polygon inscribed in a circle, first vertex straight up.
fn regular_polygon(cx: f64, cy: f64, radius: f64, sides: usize) -> BezPath {
    let mut path = BezPath::new();
    for k in 0..sides {
        let angle = TAU * k as f64 / sides as f64 - FRAC_PI_2;
        let p = (cx + radius * angle.cos(), cy + radius * angle.sin());
        if k == 0 {
            path.move_to(p);
        } else {
            path.line_to(p);
        }
    }
    path.close_path();
    path
}

/// translate(x, y) · rotate · scale · translate(-offset). A flipped image
/// keeps its visual box at `(x, y, width, height)` because its offset equals
/// the flipped extent.
fn image_transform(i: &m::ImageData) -> Affine {
    Affine::translate((i.x as f64, i.y as f64))
        * Affine::rotate((i.rotation as f64).to_radians())
        * Affine::scale_non_uniform(i.scale_x as f64, i.scale_y as f64)
        * Affine::translate((-i.offset_x as f64, -i.offset_y as f64))
}

fn to_peniko(c: m::Color) -> Color {
    Color::from_rgba8(c.r, c.g, c.b, c.a)
}

//! Hit testing: canvas point → element lookup.
//!
//! One predicate per element variant, plus document-level queries that walk
//! layers top-down (last layer, last element first) so the first hit is the
//! element painted on top.

use sk_core::geometry::distance_to_polyline;
use sk_core::model::*;
use sk_core::{Bounds, Document, ElementId};

/// Max distance, in canvas units, at which a point still hits a line.
/// The boundary is inclusive.
pub const LINE_HIT_TOLERANCE: f32 = 5.0;

/// Text boxes are grown by this much so short labels stay clickable.
pub const TEXT_HIT_PADDING: f32 = 10.0;

/// Which layers a query looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerScope {
    /// Every visible layer, locked or not.
    Visible,
    /// Visible and unlocked layers only.
    Editable,
}

impl LayerScope {
    pub fn admits(self, layer: &Layer) -> bool {
        match self {
            LayerScope::Visible => layer.visible,
            LayerScope::Editable => layer.is_editable(),
        }
    }
}

// ─── Per-variant predicates ──────────────────────────────────────────────

pub fn hit_box(x: f32, y: f32, width: f32, height: f32, px: f32, py: f32) -> bool {
    Bounds::new(x, y, width, height).contains(px, py)
}

/// Circles and triangles: inside the bounding circle.
pub fn hit_radial(shape: &RadialShape, px: f32, py: f32) -> bool {
    let dx = px - shape.x;
    let dy = py - shape.y;
    (dx * dx + dy * dy).sqrt() <= shape.radius
}

pub fn hit_polyline(points: &[f32], px: f32, py: f32) -> bool {
    distance_to_polyline(px, py, points) <= LINE_HIT_TOLERANCE
}

pub fn hit_text(text: &TextBlock, px: f32, py: f32) -> bool {
    let (w, h) = text.estimated_size();
    Bounds::new(text.x, text.y, w, h)
        .expand(TEXT_HIT_PADDING)
        .contains(px, py)
}

/// Whether `(px, py)` counts as on `el` for pointer purposes.
pub fn hit_element(el: &Element, px: f32, py: f32) -> bool {
    match &el.kind {
        ElementKind::Rectangle(r) => hit_box(r.x, r.y, r.width, r.height, px, py),
        ElementKind::Image(i) => hit_box(i.x, i.y, i.width, i.height, px, py),
        ElementKind::Circle(c) | ElementKind::Triangle(c) => hit_radial(c, px, py),
        ElementKind::Line(f) => hit_polyline(&f.points, px, py),
        ElementKind::LineShape(p) | ElementKind::Arrow(p) => hit_polyline(&p.points, px, py),
        ElementKind::Text(t) => hit_text(t, px, py),
    }
}

// ─── Document queries ────────────────────────────────────────────────────

/// Topmost element at `(px, py)` among layers admitted by `scope`.
pub fn element_at(doc: &Document, px: f32, py: f32, scope: LayerScope) -> Option<&Element> {
    let hit = doc
        .layers()
        .iter()
        .rev()
        .filter(|l| scope.admits(l))
        .find_map(|l| {
            doc.elements(l.id)
                .iter()
                .rev()
                .map(|e| &**e)
                .find(|e| hit_element(e, px, py))
        });
    if let Some(el) = hit {
        log::trace!("hit {} ({}) at ({px}, {py})", el.id, el.kind.type_name());
    }
    hit
}

/// Ids of every element whose bounds intersect `rect`, bottom layer first.
/// Used for marquee selection.
pub fn elements_in_rect(doc: &Document, rect: Bounds, scope: LayerScope) -> Vec<ElementId> {
    doc.layers()
        .iter()
        .filter(|l| scope.admits(l))
        .flat_map(|l| doc.elements(l.id).iter())
        .filter(|e| e.bounds().intersects(&rect))
        .map(|e| e.id)
        .collect()
}

//! Tool controller: the pointer/keyboard state machine.
//!
//! Pointer events arrive in canvas units. Each interaction runs from
//! pointer-down to pointer-up and ends in at most one history commit:
//! intermediate frames either touch only transient state (a preview element,
//! a marquee) or edit the document live with a snapshot of the state before
//! the gesture, so Escape or blur can put it back exactly.
//!
//! ## Modifier behaviors
//!
//! | Modifier | Select | Rectangle | Line / Arrow | Resize |
//! |----------|--------|-----------|--------------|--------|
//! | **Shift** | toggle on click, axis-constrain drag, add to marquee | square | horizontal / vertical | aspect lock |

use crate::history::History;
use crate::settings::{ToolKind, ToolSettings};
use sk_core::model::*;
use sk_core::{Bounds, DocumentState, EditorConfig, ElementId, LayerId, Selection, Snapshot};
use sk_render::hit::{LayerScope, element_at, elements_in_rect};
use smallvec::SmallVec;

/// Everything a tool may read or change while handling one event.
pub struct ToolContext<'a> {
    pub state: &'a mut DocumentState,
    pub history: &'a mut History,
    pub settings: &'a ToolSettings,
    pub config: &'a EditorConfig,
    /// Grab radius of resize handles, in canvas units.
    pub handle_radius: f32,
}

/// What handling an event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing changed.
    Ignored,
    /// Transient or live state changed; redraw.
    Updated,
    /// The document changed and one history record was added.
    Committed(&'static str),
    /// An interaction was abandoned; the document is as it was before it.
    Cancelled,
}

// ─── Resize handles ──────────────────────────────────────────────────────

/// Named grip on the selection box. Corners move two edges, the others one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::TopLeft,
        ResizeHandle::Top,
        ResizeHandle::TopRight,
        ResizeHandle::Right,
        ResizeHandle::BottomRight,
        ResizeHandle::Bottom,
        ResizeHandle::BottomLeft,
        ResizeHandle::Left,
    ];

    fn moves_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::Left | Self::BottomLeft)
    }

    fn moves_right(self) -> bool {
        matches!(self, Self::TopRight | Self::Right | Self::BottomRight)
    }

    fn moves_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::Top | Self::TopRight)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, Self::BottomLeft | Self::Bottom | Self::BottomRight)
    }

    pub fn is_corner(self) -> bool {
        (self.moves_left() || self.moves_right()) && (self.moves_top() || self.moves_bottom())
    }

    /// Where this handle sits on `b`.
    pub fn position(self, b: &Bounds) -> (f32, f32) {
        let x = if self.moves_left() {
            b.x
        } else if self.moves_right() {
            b.right()
        } else {
            b.x + b.width / 2.0
        };
        let y = if self.moves_top() {
            b.y
        } else if self.moves_bottom() {
            b.bottom()
        } else {
            b.y + b.height / 2.0
        };
        (x, y)
    }

    /// The handle of `b` within `radius` of `(x, y)`, corners first.
    pub fn at(b: &Bounds, x: f32, y: f32, radius: f32) -> Option<Self> {
        let mut handles = Self::ALL;
        handles.sort_by_key(|h| !h.is_corner());
        handles.into_iter().find(|h| {
            let (hx, hy) = h.position(b);
            (hx - x).abs() <= radius && (hy - y).abs() <= radius
        })
    }
}

/// New box for a drag of `handle` to `(px, py)`. The opposite edges stay
/// put; neither side drops below `min`. With `ratio`, the axis the handle
/// does not lead is derived from it (`width / height`).
pub fn resize_bounds(
    origin: Bounds,
    handle: ResizeHandle,
    px: f32,
    py: f32,
    ratio: Option<f32>,
    min: f32,
) -> Bounds {
    let (mut left, mut top) = (origin.x, origin.y);
    let (mut right, mut bottom) = (origin.right(), origin.bottom());
    if handle.moves_left() {
        left = px.min(right - min);
    }
    if handle.moves_right() {
        right = px.max(left + min);
    }
    if handle.moves_top() {
        top = py.min(bottom - min);
    }
    if handle.moves_bottom() {
        bottom = py.max(top + min);
    }
    let mut w = right - left;
    let mut h = bottom - top;

    if let Some(ratio) = ratio.filter(|r| r.is_finite() && *r > 0.0) {
        let horizontal = handle.moves_left() || handle.moves_right();
        let vertical = handle.moves_top() || handle.moves_bottom();
        let width_leads = match (horizontal, vertical) {
            (true, false) => true,
            (false, true) => false,
            _ => {
                let rw = (w / origin.width.max(f32::EPSILON) - 1.0).abs();
                let rh = (h / origin.height.max(f32::EPSILON) - 1.0).abs();
                rw >= rh
            }
        };
        if width_leads {
            h = w / ratio;
        } else {
            w = h * ratio;
        }
        if w < min {
            w = min;
            h = w / ratio;
        }
        if h < min {
            h = min;
            w = h * ratio;
        }
    }

    let x = if handle.moves_left() { origin.right() - w } else { origin.x };
    let y = if handle.moves_top() { origin.bottom() - h } else { origin.y };
    Bounds::new(x, y, w, h)
}

// ─── Interaction state ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub enum Interaction {
    #[default]
    Idle,
    /// Freehand stroke or shape being drawn; not yet in the document.
    Drawing { element: Element, anchor: (f32, f32) },
    /// Marquee drag. `base` is the selection the marquee adds to.
    Selecting {
        start: (f32, f32),
        rect: Bounds,
        base: Selection,
    },
    /// Selected elements follow the pointer, edited live.
    MovingSelection {
        before: Snapshot,
        origin: (f32, f32),
        applied: (f32, f32),
    },
    Resizing {
        id: ElementId,
        handle: ResizeHandle,
        origin: Bounds,
        /// Aspect ratio held when the lock is on.
        ratio: f32,
        before: Snapshot,
    },
    Erasing { before: Snapshot },
    /// Text element placed and receiving input; not yet in the document.
    EditingText { element: Element },
}

impl Interaction {
    pub fn name(&self) -> &'static str {
        match self {
            Interaction::Idle => "idle",
            Interaction::Drawing { .. } => "drawing",
            Interaction::Selecting { .. } => "selecting",
            Interaction::MovingSelection { .. } => "moving-selection",
            Interaction::Resizing { .. } => "resizing",
            Interaction::Erasing { .. } => "erasing",
            Interaction::EditingText { .. } => "editing-text",
        }
    }
}

#[derive(Debug, Default)]
pub struct ToolController {
    interaction: Interaction,
}

impl ToolController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.interaction, Interaction::Idle)
    }

    pub fn is_editing_text(&self) -> bool {
        matches!(self.interaction, Interaction::EditingText { .. })
    }

    /// The uncommitted element to draw on top of the document, if any.
    pub fn preview(&self) -> Option<&Element> {
        match &self.interaction {
            Interaction::Drawing { element, .. } | Interaction::EditingText { element } => {
                Some(element)
            }
            _ => None,
        }
    }

    pub fn marquee(&self) -> Option<Bounds> {
        match &self.interaction {
            Interaction::Selecting { rect, .. } => Some(*rect),
            _ => None,
        }
    }

    /// Forget any interaction without touching the document (document load).
    pub fn reset(&mut self) {
        self.interaction = Interaction::Idle;
    }

    // ─── Pointer events ──────────────────────────────────────────────────

    pub fn pointer_down(&mut self, cx: &mut ToolContext<'_>, x: f32, y: f32, shift: bool) -> Outcome {
        log::trace!("pointer down ({x}, {y}) in {}", self.interaction.name());
        // Clicking away finishes the text being typed
        if self.is_editing_text() {
            return self.commit_text(cx);
        }
        if !self.is_idle() {
            return Outcome::Ignored;
        }

        let tool = cx.settings.tool;
        if let Some(brush) = tool.brush() {
            return self.begin_freehand(cx, x, y, brush);
        }
        match tool {
            ToolKind::Select => self.select_down(cx, x, y, shift),
            ToolKind::Eraser => self.begin_erase(cx, x, y),
            ToolKind::Text => self.begin_text(cx, x, y),
            _ => self.begin_shape(cx, x, y),
        }
    }

    pub fn pointer_move(&mut self, cx: &mut ToolContext<'_>, x: f32, y: f32, shift: bool) -> Outcome {
        match &mut self.interaction {
            Interaction::Idle | Interaction::EditingText { .. } => Outcome::Ignored,
            Interaction::Drawing { element, anchor } => {
                match &mut element.kind {
                    ElementKind::Line(f) => f.points.extend_from_slice(&[x, y]),
                    kind => reshape(kind, *anchor, x, y, shift),
                }
                Outcome::Updated
            }
            Interaction::Selecting { start, rect, .. } => {
                *rect = Bounds::from_corners(start.0, start.1, x, y);
                Outcome::Updated
            }
            Interaction::MovingSelection {
                origin, applied, ..
            } => {
                drag_selection(cx, *origin, applied, x, y, shift);
                Outcome::Updated
            }
            Interaction::Resizing {
                id,
                handle,
                origin,
                ratio,
                ..
            } => {
                let lock = (cx.settings.lock_aspect || shift).then_some(*ratio);
                let target = resize_bounds(*origin, *handle, x, y, lock, cx.config.min_element_size);
                let id = *id;
                cx.state
                    .update_elements(None, |e| e.id == id, |e| e.set_bounds(target));
                Outcome::Updated
            }
            Interaction::Erasing { .. } => {
                if erase_at(cx, x, y) {
                    Outcome::Updated
                } else {
                    Outcome::Ignored
                }
            }
        }
    }

    pub fn pointer_up(&mut self, cx: &mut ToolContext<'_>, x: f32, y: f32, shift: bool) -> Outcome {
        log::trace!("pointer up ({x}, {y}) in {}", self.interaction.name());
        if matches!(self.interaction, Interaction::Idle | Interaction::EditingText { .. }) {
            return Outcome::Ignored;
        }
        // Final position counts like any other move; freehand strokes end at
        // their last move.
        if !matches!(
            &self.interaction,
            Interaction::Drawing { element, .. } if matches!(element.kind, ElementKind::Line(_))
        ) {
            self.pointer_move(cx, x, y, shift);
        }

        match std::mem::take(&mut self.interaction) {
            Interaction::Drawing { element, .. } => finish_drawing(cx, element),
            Interaction::Selecting { rect, base, .. } => {
                let picked = if rect.width == 0.0 && rect.height == 0.0 {
                    Vec::new()
                } else {
                    elements_in_rect(cx.state.document(), rect, LayerScope::Editable)
                };
                cx.state.set_selection(base.iter().chain(picked));
                Outcome::Updated
            }
            Interaction::MovingSelection { before, .. } => commit_if_changed(cx, &before, "move"),
            Interaction::Resizing { before, .. } => commit_if_changed(cx, &before, "resize"),
            Interaction::Erasing { before } => commit_if_changed(cx, &before, "erase"),
            other @ (Interaction::Idle | Interaction::EditingText { .. }) => {
                self.interaction = other;
                Outcome::Ignored
            }
        }
    }

    // ─── Text ────────────────────────────────────────────────────────────

    /// Replace the content of the text being edited.
    pub fn text_input(&mut self, text: &str) -> Outcome {
        match &mut self.interaction {
            Interaction::EditingText { element } => {
                if let ElementKind::Text(t) = &mut element.kind {
                    t.text = text.to_string();
                }
                Outcome::Updated
            }
            _ => Outcome::Ignored,
        }
    }

    /// Add the edited text to the document. Blank text is discarded.
    pub fn commit_text(&mut self, cx: &mut ToolContext<'_>) -> Outcome {
        if !self.is_editing_text() {
            return Outcome::Ignored;
        }
        let Interaction::EditingText { element } = std::mem::take(&mut self.interaction) else {
            return Outcome::Ignored;
        };
        let blank = match &element.kind {
            ElementKind::Text(t) => t.text.trim().is_empty(),
            _ => true,
        };
        if blank {
            log::debug!("text: empty text discarded");
            return Outcome::Cancelled;
        }
        match cx.state.add_element(element) {
            Some(_) => commit(cx, "text"),
            None => Outcome::Cancelled,
        }
    }

    // ─── Cancellation ────────────────────────────────────────────────────

    /// Abandon the interaction in progress. Live edits are rolled back to
    /// the state before the gesture; nothing is committed.
    pub fn cancel(&mut self, cx: &mut ToolContext<'_>) -> Outcome {
        let interaction = std::mem::take(&mut self.interaction);
        log::debug!("cancel {}", interaction.name());
        match interaction {
            Interaction::Idle => Outcome::Ignored,
            Interaction::Drawing { .. } | Interaction::EditingText { .. } => Outcome::Cancelled,
            Interaction::Selecting { base, .. } => {
                cx.state.set_selection(base.iter());
                Outcome::Cancelled
            }
            Interaction::MovingSelection { before, .. }
            | Interaction::Resizing { before, .. }
            | Interaction::Erasing { before } => {
                cx.state.restore(&before);
                Outcome::Cancelled
            }
        }
    }

    /// Focus lost: text being edited is kept, anything else is cancelled.
    pub fn blur(&mut self, cx: &mut ToolContext<'_>) -> Outcome {
        if self.is_editing_text() {
            self.commit_text(cx)
        } else {
            self.cancel(cx)
        }
    }

    // ─── Resize ──────────────────────────────────────────────────────────

    /// Start dragging `handle` of element `id`. Rejected while another
    /// interaction runs, or when the element is missing or its layer is
    /// locked or hidden.
    pub fn begin_resize(&mut self, cx: &mut ToolContext<'_>, id: ElementId, handle: ResizeHandle) -> bool {
        if !self.is_idle() {
            return false;
        }
        let doc = cx.state.document();
        let Some(el) = doc.find_element(id) else {
            log::debug!("resize: unknown element {id}");
            return false;
        };
        if !doc.layer(el.layer_id).is_some_and(Layer::is_editable) {
            log::debug!("resize: {id} is on locked or hidden layer {}", el.layer_id);
            return false;
        }
        let origin = el.bounds();
        let ratio = match el.as_image() {
            Some(img) => img.aspect_ratio(),
            None if origin.width > 0.0 && origin.height > 0.0 => origin.width / origin.height,
            None => 1.0,
        };
        self.interaction = Interaction::Resizing {
            id,
            handle,
            origin,
            ratio,
            before: cx.state.snapshot(),
        };
        true
    }

    // ─── Per-tool starts ─────────────────────────────────────────────────

    fn select_down(&mut self, cx: &mut ToolContext<'_>, x: f32, y: f32, shift: bool) -> Outcome {
        // A handle of the single selected element wins over what lies below it
        let grab = match cx.state.selection().as_slice() {
            [only] => cx
                .state
                .document()
                .find_element(*only)
                .and_then(|el| ResizeHandle::at(&el.bounds(), x, y, cx.handle_radius))
                .map(|h| (*only, h)),
            _ => None,
        };
        if let Some((id, handle)) = grab {
            return if self.begin_resize(cx, id, handle) {
                Outcome::Updated
            } else {
                Outcome::Ignored
            };
        }

        match element_at(cx.state.document(), x, y, LayerScope::Editable).map(|e| e.id) {
            Some(id) => {
                if shift {
                    cx.state.toggle_selected(id);
                    if !cx.state.selection().contains(id) {
                        return Outcome::Updated;
                    }
                } else if !cx.state.selection().contains(id) {
                    cx.state.set_selection([id]);
                }
                self.interaction = Interaction::MovingSelection {
                    before: cx.state.snapshot(),
                    origin: (x, y),
                    applied: (0.0, 0.0),
                };
                Outcome::Updated
            }
            None => {
                let base = if shift {
                    cx.state.selection().clone()
                } else {
                    cx.state.clear_selection();
                    Selection::new()
                };
                self.interaction = Interaction::Selecting {
                    start: (x, y),
                    rect: Bounds::new(x, y, 0.0, 0.0),
                    base,
                };
                Outcome::Updated
            }
        }
    }

    fn begin_freehand(&mut self, cx: &mut ToolContext<'_>, x: f32, y: f32, brush: Brush) -> Outcome {
        let Some(layer) = target_layer(cx) else {
            return Outcome::Ignored;
        };
        let s = cx.settings;
        let kind = ElementKind::Line(Freehand {
            points: vec![x, y],
            stroke: s.color,
            stroke_width: s.stroke_width,
            brush,
        });
        self.interaction = Interaction::Drawing {
            element: new_element(cx, layer, kind),
            anchor: (x, y),
        };
        Outcome::Updated
    }

    fn begin_shape(&mut self, cx: &mut ToolContext<'_>, x: f32, y: f32) -> Outcome {
        let Some(layer) = target_layer(cx) else {
            return Outcome::Ignored;
        };
        let s = cx.settings;
        let radial = RadialShape {
            x,
            y,
            radius: 0.0,
            stroke: s.color,
            stroke_width: s.stroke_width,
            fill: s.fill(),
        };
        let segment = Polyline {
            points: vec![x, y, x, y],
            stroke: s.color,
            stroke_width: s.stroke_width,
        };
        let kind = match s.tool {
            ToolKind::Rectangle => ElementKind::Rectangle(BoxShape {
                x,
                y,
                width: 0.0,
                height: 0.0,
                stroke: s.color,
                stroke_width: s.stroke_width,
                fill: s.fill(),
            }),
            ToolKind::Circle => ElementKind::Circle(radial),
            ToolKind::Triangle => ElementKind::Triangle(radial),
            ToolKind::LineShape => ElementKind::LineShape(segment),
            ToolKind::Arrow => ElementKind::Arrow(segment),
            other => {
                log::debug!("{other:?} does not draw shapes");
                return Outcome::Ignored;
            }
        };
        self.interaction = Interaction::Drawing {
            element: new_element(cx, layer, kind),
            anchor: (x, y),
        };
        Outcome::Updated
    }

    fn begin_erase(&mut self, cx: &mut ToolContext<'_>, x: f32, y: f32) -> Outcome {
        self.interaction = Interaction::Erasing {
            before: cx.state.snapshot(),
        };
        erase_at(cx, x, y);
        Outcome::Updated
    }

    fn begin_text(&mut self, cx: &mut ToolContext<'_>, x: f32, y: f32) -> Outcome {
        let Some(layer) = target_layer(cx) else {
            return Outcome::Ignored;
        };
        let s = cx.settings;
        let kind = ElementKind::Text(TextBlock {
            x,
            y,
            text: String::new(),
            font_size: s.font_size,
            font_family: s.font_family.clone(),
            fill: s.color,
            width: None,
            height: None,
        });
        self.interaction = Interaction::EditingText {
            element: new_element(cx, layer, kind),
        };
        Outcome::Updated
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────

/// The active layer, if new elements may go there.
fn target_layer(cx: &ToolContext<'_>) -> Option<LayerId> {
    let Some(id) = cx.state.active_layer() else {
        log::debug!("draw: no active layer");
        return None;
    };
    let editable = cx.state.document().layer(id).is_some_and(Layer::is_editable);
    if !editable {
        log::debug!("draw: active layer {id} is locked or hidden");
        return None;
    }
    Some(id)
}

fn new_element(cx: &ToolContext<'_>, layer: LayerId, kind: ElementKind) -> Element {
    Element::new(
        cx.state.document().fresh_element_id(),
        layer,
        cx.settings.opacity,
        kind,
    )
}

/// Size a shape being drawn from its anchor to the pointer.
fn reshape(kind: &mut ElementKind, anchor: (f32, f32), x: f32, y: f32, constrain: bool) {
    let (ax, ay) = anchor;
    let (mut dx, mut dy) = (x - ax, y - ay);
    match kind {
        ElementKind::Rectangle(r) => {
            if constrain {
                let side = dx.abs().max(dy.abs());
                dx = side.copysign(dx);
                dy = side.copysign(dy);
            }
            let b = Bounds::from_corners(ax, ay, ax + dx, ay + dy);
            r.x = b.x;
            r.y = b.y;
            r.width = b.width;
            r.height = b.height;
        }
        ElementKind::Circle(c) | ElementKind::Triangle(c) => {
            c.radius = dx.hypot(dy);
        }
        ElementKind::LineShape(p) | ElementKind::Arrow(p) => {
            if constrain {
                if dx.abs() > dy.abs() {
                    dy = 0.0;
                } else {
                    dx = 0.0;
                }
            }
            p.points = vec![ax, ay, ax + dx, ay + dy];
        }
        ElementKind::Line(_) | ElementKind::Text(_) | ElementKind::Image(_) => {}
    }
}

fn finish_drawing(cx: &mut ToolContext<'_>, element: Element) -> Outcome {
    let label = match element.kind {
        ElementKind::Line(_) => "stroke",
        ref kind => {
            let b = element.bounds();
            if b.width == 0.0 && b.height == 0.0 {
                log::debug!("draw: zero-size {} discarded", kind.type_name());
                return Outcome::Cancelled;
            }
            kind.type_name()
        }
    };
    match cx.state.add_element(element) {
        Some(_) => commit(cx, label),
        None => Outcome::Cancelled,
    }
}

fn drag_selection(
    cx: &mut ToolContext<'_>,
    origin: (f32, f32),
    applied: &mut (f32, f32),
    x: f32,
    y: f32,
    shift: bool,
) {
    let (mut tx, mut ty) = (x - origin.0, y - origin.1);
    if shift {
        if tx.abs() > ty.abs() {
            ty = 0.0;
        } else {
            tx = 0.0;
        }
    }
    let (dx, dy) = (tx - applied.0, ty - applied.1);
    if dx == 0.0 && dy == 0.0 {
        return;
    }
    let ids: SmallVec<[ElementId; 4]> = cx.state.selection().iter().collect();
    cx.state
        .update_elements(None, |e| ids.contains(&e.id), |e| e.translate(dx, dy));
    *applied = (tx, ty);
}

/// Remove the topmost visible element under the point. An element on a
/// locked layer shields what lies below it.
fn erase_at(cx: &mut ToolContext<'_>, x: f32, y: f32) -> bool {
    let doc = cx.state.document();
    let Some(el) = element_at(doc, x, y, LayerScope::Visible) else {
        return false;
    };
    let (id, layer) = (el.id, el.layer_id);
    if !doc.layer(layer).is_some_and(Layer::is_editable) {
        log::debug!("erase: {id} is on locked layer {layer}");
        return false;
    }
    cx.state.remove_elements(&[id]) > 0
}

fn commit(cx: &mut ToolContext<'_>, label: &'static str) -> Outcome {
    cx.history.commit(label, cx.state.snapshot());
    Outcome::Committed(label)
}

fn commit_if_changed(cx: &mut ToolContext<'_>, before: &Snapshot, label: &'static str) -> Outcome {
    if cx.state.snapshot() == *before {
        Outcome::Ignored
    } else {
        commit(cx, label)
    }
}

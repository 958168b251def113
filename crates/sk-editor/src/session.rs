//! Editor session: one open document and everything needed to edit it.
//!
//! The session owns the document state, the history, the tool controller,
//! the tool settings and the viewport. Hosts feed it `InputEvent`s in screen
//! pixels and call the panel operations (layers, image transforms, save)
//! directly; after any call they redraw from `scene()`.
//!
//! Every panel operation first settles the running interaction (text being
//! typed is committed, anything else is cancelled), so a live drag never
//! mixes with a second edit in one history record.

use crate::error::{EditorError, Result};
use crate::history::History;
use crate::input::{InputEvent, Modifiers};
use crate::insert::{decode_dimensions, fit_within};
use crate::settings::{ToolKind, ToolSettings};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tools::{Outcome, ResizeHandle, ToolContext, ToolController};
use sk_core::model::{Color, Element, ElementKind, ImageData};
use sk_core::persist::{CanvasPayload, SaveRequest, load_document, save_request};
use sk_core::{
    Bounds, Document, DocumentState, EditorConfig, ElementId, LayerId, LocalDraft, Viewport, ZOrder,
    transform,
};
use sk_render::{Drawable, build_scene};

/// Grab radius of resize handles, in screen pixels.
pub const HANDLE_RADIUS: f32 = 8.0;

const ZOOM_STEP: f32 = 1.25;

pub struct EditorSession {
    state: DocumentState,
    history: History,
    controller: ToolController,
    settings: ToolSettings,
    viewport: Viewport,
    config: EditorConfig,
    /// Payload the backend last acknowledged; `None` until the first save.
    last_saved: Option<CanvasPayload>,
}

impl EditorSession {
    /// Blank document.
    pub fn new(config: EditorConfig) -> Self {
        let document = sk_core::state::blank_document(&config);
        Self::with_document(document, config)
    }

    pub fn with_document(document: Document, config: EditorConfig) -> Self {
        let state = DocumentState::new(document);
        let history = History::new(state.snapshot(), config.history_limit);
        let last_saved = state
            .document()
            .id
            .is_some()
            .then(|| CanvasPayload::from_document(state.document()));
        Self {
            state,
            history,
            controller: ToolController::new(),
            settings: ToolSettings::from_defaults(&config.tools),
            viewport: Viewport::IDENTITY,
            config,
            last_saved,
        }
    }

    /// Open a canvas by route id and fetched body; see `load_document`.
    pub fn open(id: Option<&str>, body: Option<&str>, config: EditorConfig) -> Self {
        let document = load_document(id, body, &config);
        Self::with_document(document, config)
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    pub fn document(&self) -> &Document {
        self.state.document()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn controller(&self) -> &ToolController {
        &self.controller
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    /// Style settings for new elements. Switching tools goes through
    /// `set_tool`.
    pub fn settings_mut(&mut self) -> &mut ToolSettings {
        &mut self.settings
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ─── Input ───────────────────────────────────────────────────────────

    pub fn handle(&mut self, event: InputEvent) -> Outcome {
        match event {
            InputEvent::PointerDown { x, y, modifiers } => {
                let (px, py) = self.viewport.screen_to_canvas(x, y);
                self.with_controller(|c, cx| c.pointer_down(cx, px, py, modifiers.shift))
            }
            InputEvent::PointerMove { x, y, modifiers } => {
                let (px, py) = self.viewport.screen_to_canvas(x, y);
                self.with_controller(|c, cx| c.pointer_move(cx, px, py, modifiers.shift))
            }
            InputEvent::PointerUp { x, y, modifiers } => {
                let (px, py) = self.viewport.screen_to_canvas(x, y);
                self.with_controller(|c, cx| c.pointer_up(cx, px, py, modifiers.shift))
            }
            InputEvent::Scroll { x, y, dx, dy, zoom } => {
                if zoom != 1.0 {
                    self.zoom_at(x, y, zoom);
                } else {
                    self.viewport.pan_by(-dx, -dy);
                }
                Outcome::Updated
            }
            InputEvent::Key { key, modifiers } => self.handle_key(&key, modifiers),
            InputEvent::TextInput { text } => self.controller.text_input(&text),
            InputEvent::Blur => self.with_controller(|c, cx| c.blur(cx)),
        }
    }

    fn handle_key(&mut self, key: &str, modifiers: Modifiers) -> Outcome {
        // The text field owns the keyboard while text is edited
        if self.controller.is_editing_text() {
            return match key {
                "Escape" => self.with_controller(|c, cx| c.cancel(cx)),
                "Enter" if !modifiers.shift => self.with_controller(|c, cx| c.commit_text(cx)),
                _ => Outcome::Ignored,
            };
        }
        match ShortcutMap::resolve(key, modifiers) {
            Some(action) => self.apply_shortcut(action),
            None => Outcome::Ignored,
        }
    }

    pub fn apply_shortcut(&mut self, action: ShortcutAction) -> Outcome {
        log::trace!("shortcut {action:?}");
        match action {
            ShortcutAction::Tool(kind) => {
                self.set_tool(kind);
                Outcome::Updated
            }
            ShortcutAction::Undo => self.undo().map_or(Outcome::Ignored, |_| Outcome::Updated),
            ShortcutAction::Redo => self.redo().map_or(Outcome::Ignored, |_| Outcome::Updated),
            ShortcutAction::Delete => self.delete_selection(),
            ShortcutAction::SelectAll => {
                self.settle();
                self.state.select_all();
                Outcome::Updated
            }
            ShortcutAction::Escape => {
                if !self.controller.is_idle() {
                    self.with_controller(|c, cx| c.cancel(cx))
                } else if !self.state.selection().is_empty() {
                    self.state.clear_selection();
                    Outcome::Updated
                } else {
                    Outcome::Ignored
                }
            }
            ShortcutAction::Commit => self.with_controller(|c, cx| c.commit_text(cx)),
            ShortcutAction::ZoomIn => self.zoom_centered(ZOOM_STEP),
            ShortcutAction::ZoomOut => self.zoom_centered(1.0 / ZOOM_STEP),
            ShortcutAction::ZoomReset => {
                self.viewport = Viewport::IDENTITY;
                Outcome::Updated
            }
            ShortcutAction::SendBackward => self.reorder_selection(ZOrder::SendBackward),
            ShortcutAction::BringForward => self.reorder_selection(ZOrder::BringForward),
            ShortcutAction::SendToBack => self.reorder_selection(ZOrder::SendToBack),
            ShortcutAction::BringToFront => self.reorder_selection(ZOrder::BringToFront),
        }
    }

    /// Switch tools. The running interaction is settled first.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if self.settings.tool == tool {
            return;
        }
        self.settle();
        log::debug!("tool {:?} -> {tool:?}", self.settings.tool);
        self.settings.tool = tool;
    }

    /// Start a resize from a handle picked in the host's own UI.
    pub fn begin_resize(&mut self, id: ElementId, handle: ResizeHandle) -> bool {
        self.with_controller(|c, cx| c.begin_resize(cx, id, handle))
    }

    fn with_controller<R>(
        &mut self,
        f: impl FnOnce(&mut ToolController, &mut ToolContext<'_>) -> R,
    ) -> R {
        let mut cx = ToolContext {
            state: &mut self.state,
            history: &mut self.history,
            settings: &self.settings,
            config: &self.config,
            handle_radius: HANDLE_RADIUS / self.viewport.scale,
        };
        f(&mut self.controller, &mut cx)
    }

    fn settle(&mut self) {
        if self.controller.is_idle() {
            return;
        }
        self.with_controller(|c, cx| {
            if c.is_editing_text() {
                c.commit_text(cx)
            } else {
                c.cancel(cx)
            }
        });
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    fn zoom_at(&mut self, sx: f32, sy: f32, factor: f32) {
        let (min, max) = (self.config.min_zoom, self.config.max_zoom);
        self.viewport.zoom_at(sx, sy, factor, min, max);
    }

    /// Zoom around the middle of the canvas.
    fn zoom_centered(&mut self, factor: f32) -> Outcome {
        let doc = self.state.document();
        let (cx, cy) = (doc.width as f32 / 2.0, doc.height as f32 / 2.0);
        let (sx, sy) = self.viewport.canvas_to_screen(cx, cy);
        self.zoom_at(sx, sy, factor);
        Outcome::Updated
    }

    // ─── History ─────────────────────────────────────────────────────────

    /// Step back. Returns the label of the action undone.
    pub fn undo(&mut self) -> Option<String> {
        self.with_controller(|c, cx| c.cancel(cx));
        let label = self.history.undo_label()?.to_string();
        let record = self.history.undo()?;
        self.state.restore(&record.snapshot);
        log::debug!("undo {label}");
        Some(label)
    }

    /// Step forward. Returns the label of the action redone.
    pub fn redo(&mut self) -> Option<String> {
        self.with_controller(|c, cx| c.cancel(cx));
        let record = self.history.redo()?;
        let label = record.label.clone();
        self.state.restore(&record.snapshot);
        log::debug!("redo {label}");
        Some(label)
    }

    fn commit(&mut self, label: &'static str) -> Outcome {
        self.history.commit(label, self.state.snapshot());
        Outcome::Committed(label)
    }

    fn commit_if(&mut self, changed: bool, label: &'static str) -> bool {
        if changed {
            self.commit(label);
        }
        changed
    }

    // ─── Elements ────────────────────────────────────────────────────────

    /// Remove every selected element that sits on an editable layer.
    pub fn delete_selection(&mut self) -> Outcome {
        self.settle();
        let ids: Vec<ElementId> = self.state.selection().iter().collect();
        if ids.is_empty() {
            return Outcome::Ignored;
        }
        if self.state.remove_elements(&ids) == 0 {
            return Outcome::Ignored;
        }
        self.commit("delete")
    }

    fn reorder_selection(&mut self, order: ZOrder) -> Outcome {
        self.settle();
        let ids: Vec<ElementId> = self.state.selection().iter().collect();
        let mut moved = false;
        for id in ids {
            moved |= self.state.reorder_element(id, order);
        }
        if moved {
            self.commit("reorder")
        } else {
            Outcome::Ignored
        }
    }

    pub fn set_background(&mut self, color: Color) -> bool {
        self.settle();
        let changed = self.state.set_background(color);
        self.commit_if(changed, "background")
    }

    pub fn select(&mut self, ids: impl IntoIterator<Item = ElementId>) {
        self.settle();
        self.state.set_selection(ids);
    }

    /// Bounding box of the selection, in canvas units.
    pub fn selection_bounds(&self) -> Option<Bounds> {
        self.document().bounds_of(self.state.selection().as_slice())
    }

    /// Resize handles of the single selected element, in screen pixels.
    pub fn resize_handles(&self) -> Vec<(ResizeHandle, (f32, f32))> {
        let [only] = self.state.selection().as_slice() else {
            return Vec::new();
        };
        let Some(el) = self.document().find_element(*only) else {
            return Vec::new();
        };
        let b = el.bounds();
        ResizeHandle::ALL
            .into_iter()
            .map(|h| {
                let (x, y) = h.position(&b);
                (h, self.viewport.canvas_to_screen(x, y))
            })
            .collect()
    }

    // ─── Layers ──────────────────────────────────────────────────────────

    pub fn create_layer(&mut self, name: impl Into<String>) -> LayerId {
        self.settle();
        let id = self.state.create_layer(name);
        self.commit("add layer");
        id
    }

    pub fn delete_layer(&mut self, id: LayerId) -> bool {
        self.settle();
        let changed = self.state.delete_layer(id);
        self.commit_if(changed, "delete layer")
    }

    pub fn rename_layer(&mut self, id: LayerId, name: impl Into<String>) -> bool {
        self.settle();
        let changed = self.state.rename_layer(id, name);
        self.commit_if(changed, "rename layer")
    }

    pub fn set_layer_visible(&mut self, id: LayerId, visible: bool) -> bool {
        self.settle();
        let changed = self.state.set_layer_visible(id, visible);
        self.commit_if(changed, "layer visibility")
    }

    pub fn set_layer_locked(&mut self, id: LayerId, locked: bool) -> bool {
        self.settle();
        let changed = self.state.set_layer_locked(id, locked);
        self.commit_if(changed, "layer lock")
    }

    pub fn set_layer_opacity(&mut self, id: LayerId, opacity: f32) -> bool {
        self.settle();
        let changed = self.state.set_layer_opacity(id, opacity);
        self.commit_if(changed, "layer opacity")
    }

    pub fn move_layer(&mut self, id: LayerId, to_index: usize) -> bool {
        self.settle();
        let changed = self.state.move_layer(id, to_index);
        self.commit_if(changed, "move layer")
    }

    /// Not an edit: no history record.
    pub fn set_active_layer(&mut self, id: LayerId) -> bool {
        self.settle();
        self.state.set_active_layer(id)
    }

    // ─── Images ──────────────────────────────────────────────────────────

    pub fn flip_horizontal(&mut self, id: ElementId) -> bool {
        self.transform_image(id, "flip", |d| transform::flip_horizontal(d, id))
    }

    pub fn flip_vertical(&mut self, id: ElementId) -> bool {
        self.transform_image(id, "flip", |d| transform::flip_vertical(d, id))
    }

    pub fn reset_transform(&mut self, id: ElementId) -> bool {
        self.transform_image(id, "reset transform", |d| transform::reset_transform(d, id))
    }

    pub fn scale_image(&mut self, id: ElementId, scale_x: f32, scale_y: f32) -> bool {
        self.transform_image(id, "scale", |d| transform::scale(d, id, scale_x, scale_y))
    }

    pub fn rotate_image(&mut self, id: ElementId, degrees: f32) -> bool {
        self.transform_image(id, "rotate", |d| transform::rotate_to(d, id, degrees))
    }

    fn transform_image(
        &mut self,
        id: ElementId,
        label: &'static str,
        pass: impl FnOnce(&mut Document) -> bool,
    ) -> bool {
        self.settle();
        log::trace!("{label} {id}");
        let applied = self.state.edit_document(pass);
        self.commit_if(applied, label)
    }

    /// Decode `bytes` for their pixel size and place them as an image whose
    /// pixels live at `src`.
    ///
    /// # Errors
    /// Decode failures, and an active layer that is missing or not editable.
    pub fn insert_image(&mut self, bytes: &[u8], src: impl Into<String>) -> Result<ElementId> {
        let (w, h) = decode_dimensions(bytes)?;
        self.place_image(w, h, src)
    }

    /// Place an image of known pixel size, fit inside the configured box
    /// at the configured offset, and select it.
    ///
    /// # Errors
    /// `NoActiveLayer` or `LayerNotEditable`.
    pub fn place_image(&mut self, width: u32, height: u32, src: impl Into<String>) -> Result<ElementId> {
        if width == 0 || height == 0 {
            return Err(EditorError::EmptyImage);
        }
        self.settle();
        let layer = self.state.active_layer().ok_or(EditorError::NoActiveLayer)?;
        let editable = self
            .document()
            .layer(layer)
            .is_some_and(|l| l.is_editable());
        if !editable {
            return Err(EditorError::LayerNotEditable(layer.to_string()));
        }

        let (ow, oh) = (width as f32, height as f32);
        let (fw, fh) = fit_within(ow, oh, self.config.image_max_side);
        let (x, y) = self.config.image_offset;
        let element = Element::new(
            self.document().fresh_element_id(),
            layer,
            self.settings.opacity,
            ElementKind::Image(ImageData {
                x,
                y,
                width: fw,
                height: fh,
                original_width: ow,
                original_height: oh,
                src: src.into(),
                rotation: 0.0,
                scale_x: 1.0,
                scale_y: 1.0,
                offset_x: 0.0,
                offset_y: 0.0,
            }),
        );
        let id = self
            .state
            .add_element(element)
            .ok_or_else(|| EditorError::LayerNotEditable(layer.to_string()))?;
        self.commit("image");
        self.state.set_selection([id]);
        Ok(id)
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// What to send to the backend for the current document.
    pub fn save_request(&self) -> SaveRequest {
        save_request(self.document(), self.last_saved.as_ref())
    }

    /// Record a successful save. `created_id` is the id the backend
    /// assigned on create.
    pub fn mark_saved(&mut self, created_id: Option<&str>) {
        if let Some(id) = created_id {
            self.state.set_document_id(id);
        }
        self.last_saved = Some(CanvasPayload::from_document(self.document()));
        log::debug!("saved {:?}", self.document().id);
    }

    pub fn has_unsaved_changes(&self) -> bool {
        match &self.last_saved {
            Some(saved) => *saved != CanvasPayload::from_document(self.document()),
            None => self.history.can_undo() || self.history.can_redo(),
        }
    }

    pub fn rename_document(&mut self, name: impl Into<String>) {
        self.state.rename_document(name);
    }

    /// Replace the open document. History restarts with it as the seed.
    pub fn load(&mut self, document: Document) {
        self.controller.reset();
        self.last_saved = document
            .id
            .is_some()
            .then(|| CanvasPayload::from_document(&document));
        self.state.replace_document(document);
        self.history.reset(self.state.snapshot());
        log::debug!("loaded {:?}", self.document().id);
    }

    /// Persist the current document as the local draft.
    ///
    /// # Errors
    /// I/O or serialization failures from the draft store.
    pub fn store_draft(&self, draft: &LocalDraft) -> Result<()> {
        draft.store(self.document())?;
        Ok(())
    }

    /// Load the local draft if there is one. The file stays until a save of
    /// the restored document is acknowledged through `mark_saved_with_draft`.
    /// Returns whether a draft was loaded.
    ///
    /// # Errors
    /// I/O failures, or a draft that does not parse.
    pub fn restore_draft(&mut self, draft: &LocalDraft) -> Result<bool> {
        match draft.load(&self.config)? {
            Some(document) => {
                self.load(document);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// `mark_saved`, then clear the local draft now that the backend holds
    /// the document.
    ///
    /// # Errors
    /// The draft file could not be removed; the save is still recorded.
    pub fn mark_saved_with_draft(
        &mut self,
        created_id: Option<&str>,
        draft: &LocalDraft,
    ) -> Result<()> {
        self.mark_saved(created_id);
        draft.clear()?;
        Ok(())
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    /// Display list for the current frame, the uncommitted element last.
    pub fn scene(&self) -> Vec<Drawable> {
        build_scene(self.document(), self.controller.preview())
    }

    pub fn marquee(&self) -> Option<Bounds> {
        self.controller.marquee()
    }
}

//! Live document state: the canvas plus the active layer and selection.
//!
//! All operations here are synchronous and either apply fully or leave the
//! state untouched. Rejected operations (locked/hidden layer, unknown id)
//! return `false`/`None` and log at debug level; they are never surfaced as
//! errors.

use crate::config::EditorConfig;
use crate::document::{Document, Snapshot, ZOrder};
use crate::id::{ElementId, LayerId};
use crate::model::{Color, Element, Layer};
use crate::selection::Selection;

#[derive(Debug, Clone)]
pub struct DocumentState {
    document: Document,
    active_layer: Option<LayerId>,
    selection: Selection,
}

impl DocumentState {
    /// Wrap a document. The topmost layer becomes active.
    pub fn new(document: Document) -> Self {
        let active_layer = document.layers().last().map(|l| l.id);
        Self {
            document,
            active_layer,
            selection: Selection::new(),
        }
    }

    /// Empty document with one default layer, sized per `config`.
    pub fn blank(config: &EditorConfig) -> Self {
        Self::new(blank_document(config))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn active_layer(&self) -> Option<LayerId> {
        self.active_layer
    }

    pub fn set_active_layer(&mut self, id: LayerId) -> bool {
        if self.document.layer(id).is_none() {
            log::debug!("set_active_layer: unknown layer {id}");
            return false;
        }
        self.active_layer = Some(id);
        true
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    // ─── Layers ──────────────────────────────────────────────────────────

    /// Append a visible, unlocked, fully opaque layer and make it active.
    pub fn create_layer(&mut self, name: impl Into<String>) -> LayerId {
        let id = self.document.fresh_layer_id();
        self.document.push_layer(Layer::new(id, name));
        self.active_layer = Some(id);
        id
    }

    /// Remove a layer and its elements. If it was active, the layer below it
    /// (or the new bottom layer) becomes active, or none if no layers remain.
    pub fn delete_layer(&mut self, id: LayerId) -> bool {
        let Some(idx) = self.document.layer_index(id) else {
            log::debug!("delete_layer: unknown layer {id}");
            return false;
        };
        let Some((_, dropped)) = self.document.remove_layer(id) else {
            return false;
        };
        self.selection.retain(|sel| !dropped.iter().any(|e| e.id == sel));
        if self.active_layer == Some(id) {
            let layers = self.document.layers();
            self.active_layer = layers
                .get(idx.saturating_sub(1))
                .or_else(|| layers.first())
                .map(|l| l.id);
        }
        true
    }

    // Layer setters return whether the layer actually changed.

    pub fn rename_layer(&mut self, id: LayerId, name: impl Into<String>) -> bool {
        let name = name.into();
        self.patch_layer(id, |l| {
            if l.name == name {
                return false;
            }
            l.name = name;
            true
        })
    }

    pub fn set_layer_visible(&mut self, id: LayerId, visible: bool) -> bool {
        self.patch_layer(id, |l| {
            let changed = l.visible != visible;
            l.visible = visible;
            changed
        })
    }

    pub fn set_layer_locked(&mut self, id: LayerId, locked: bool) -> bool {
        self.patch_layer(id, |l| {
            let changed = l.locked != locked;
            l.locked = locked;
            changed
        })
    }

    /// Opacity is clamped to `[0, 1]`; a non-finite value is rejected.
    pub fn set_layer_opacity(&mut self, id: LayerId, opacity: f32) -> bool {
        if !opacity.is_finite() {
            log::debug!("set_layer_opacity: rejected {opacity}");
            return false;
        }
        let opacity = opacity.clamp(0.0, 1.0);
        self.patch_layer(id, |l| {
            let changed = l.opacity != opacity;
            l.opacity = opacity;
            changed
        })
    }

    pub fn move_layer(&mut self, id: LayerId, to_index: usize) -> bool {
        self.document.move_layer(id, to_index)
    }

    fn patch_layer(&mut self, id: LayerId, patch: impl FnOnce(&mut Layer) -> bool) -> bool {
        match self.document.layer_mut(id) {
            Some(layer) => patch(layer),
            None => {
                log::debug!("layer update: unknown layer {id}");
                false
            }
        }
    }

    // ─── Elements ────────────────────────────────────────────────────────

    /// Append `element` to the active layer, re-keying it onto that layer.
    /// A colliding id is replaced by a fresh one. Returns the stored id, or
    /// `None` when there is no active layer or it is locked/hidden.
    pub fn add_element(&mut self, mut element: Element) -> Option<ElementId> {
        let Some(layer) = self.active_layer else {
            log::debug!("add_element: no active layer");
            return None;
        };
        element.layer_id = layer;
        if self.document.contains_element(element.id) {
            element.id = self.document.fresh_element_id();
        }
        let id = element.id;
        self.document.push_element(element).then_some(id)
    }

    /// Partial update over one layer or, with `None`, all layers.
    pub fn update_elements(
        &mut self,
        layer: Option<LayerId>,
        pred: impl FnMut(&Element) -> bool,
        patch: impl FnMut(&mut Element),
    ) -> usize {
        self.document.update_elements(layer, pred, patch)
    }

    /// Delete elements wherever they live. Only removed ids leave the
    /// selection; ids on locked or hidden layers stay selected.
    pub fn remove_elements(&mut self, ids: &[ElementId]) -> usize {
        let removed = self.document.remove_elements(ids);
        self.selection.retain(|sel| !removed.contains(&sel));
        removed.len()
    }

    pub fn reorder_element(&mut self, id: ElementId, order: ZOrder) -> bool {
        self.document.reorder_element(id, order)
    }

    /// Run a document-level pass (such as an image transform), then
    /// revalidate the selection and the active layer.
    pub fn edit_document<R>(&mut self, edit: impl FnOnce(&mut Document) -> R) -> R {
        let out = edit(&mut self.document);
        self.revalidate();
        out
    }

    /// Record the backend id after a successful create.
    pub fn set_document_id(&mut self, id: impl Into<String>) {
        self.document.id = Some(id.into());
    }

    pub fn rename_document(&mut self, name: impl Into<String>) {
        self.document.name = name.into();
    }

    pub fn set_background(&mut self, color: Color) -> bool {
        if self.document.background == color {
            return false;
        }
        self.document.background = color;
        true
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Replace the selection; ids that do not exist are dropped.
    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = ElementId>) {
        let doc = &self.document;
        self.selection = ids.into_iter().filter(|id| doc.contains_element(*id)).collect();
    }

    /// Add one existing element to the selection.
    pub fn select(&mut self, id: ElementId) -> bool {
        self.document.contains_element(id) && self.selection.insert(id)
    }

    pub fn toggle_selected(&mut self, id: ElementId) {
        if self.document.contains_element(id) {
            self.selection.toggle(id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Select every element on visible, unlocked layers.
    pub fn select_all(&mut self) {
        let doc = &self.document;
        self.selection = doc
            .layers()
            .iter()
            .filter(|l| l.is_editable())
            .flat_map(|l| doc.elements(l.id).iter().map(|e| e.id))
            .collect();
    }

    // ─── Snapshots ───────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Snapshot {
        self.document.snapshot()
    }

    /// Restore a snapshot, then prune the selection and revalidate the
    /// active layer against the restored layers.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.document.restore(snapshot);
        self.revalidate();
    }

    /// Swap in a whole new document (load). Selection is cleared.
    pub fn replace_document(&mut self, document: Document) {
        *self = Self::new(document);
    }

    fn revalidate(&mut self) {
        let doc = &self.document;
        self.selection.retain(|id| doc.contains_element(id));
        if self.active_layer.is_none_or(|id| doc.layer(id).is_none()) {
            self.active_layer = doc.layers().last().map(|l| l.id);
        }
    }
}

/// A fresh document with one default layer.
pub fn blank_document(config: &EditorConfig) -> Document {
    let mut doc = Document::new(
        config.default_document_name.clone(),
        config.canvas_width,
        config.canvas_height,
        config.background,
    );
    let layer = doc.fresh_layer_id();
    doc.push_layer(Layer::new(layer, config.default_layer_name.clone()));
    doc
}

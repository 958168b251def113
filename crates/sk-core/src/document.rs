//! The canvas document: ordered layers plus one element bucket per layer.
//!
//! Element payloads are held behind `Arc`, so cloning a document (or taking
//! a `Snapshot` for history) copies only the per-layer pointer lists.
//! Mutations go through `Arc::make_mut`, which clones a payload only when a
//! snapshot still shares it. A captured snapshot is therefore never changed
//! by later edits.
//!
//! Element-level mutations refuse to touch layers that are locked or hidden.

use crate::geometry::Bounds;
use crate::id::{ElementId, LayerId};
use crate::model::{Color, Element, Layer};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-layer element lists, keyed by layer id. Order inside a list is paint
/// order (later = on top).
pub type ElementBuckets = HashMap<LayerId, Vec<Arc<Element>>>;

/// Immutable history snapshot: everything undo/redo restores.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub layers: Vec<Layer>,
    pub elements_by_layer: ElementBuckets,
    pub background: Color,
}

/// Where to move an element inside its layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZOrder {
    BringToFront,
    SendToBack,
    BringForward,
    SendBackward,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Backend id; `None` for documents that were never saved.
    pub id: Option<String>,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub background: Color,
    /// Index 0 is the bottom layer.
    layers: Vec<Layer>,
    buckets: ElementBuckets,
}

impl Document {
    /// An empty document without layers.
    pub fn new(name: impl Into<String>, width: u32, height: u32, background: Color) -> Self {
        Self {
            id: None,
            name: name.into(),
            width,
            height,
            background,
            layers: Vec::new(),
            buckets: HashMap::new(),
        }
    }

    // ─── Lookup ──────────────────────────────────────────────────────────

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn layer_index(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    /// Elements of one layer in paint order. Unknown layers yield an empty slice.
    pub fn elements(&self, layer: LayerId) -> &[Arc<Element>] {
        self.buckets.get(&layer).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All elements, bottom layer first, paint order within each layer.
    pub fn iter_elements(&self) -> impl DoubleEndedIterator<Item = &Element> + '_ {
        self.layers
            .iter()
            .flat_map(|l| self.elements(l.id).iter().map(|e| &**e))
    }

    pub fn element_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn find_element(&self, id: ElementId) -> Option<&Element> {
        self.iter_elements().find(|e| e.id == id)
    }

    pub fn contains_element(&self, id: ElementId) -> bool {
        self.find_element(id).is_some()
    }

    /// Layer currently holding `id`.
    pub fn layer_of(&self, id: ElementId) -> Option<LayerId> {
        self.layers
            .iter()
            .find(|l| self.elements(l.id).iter().any(|e| e.id == id))
            .map(|l| l.id)
    }

    /// Union of the bounds of the given elements.
    pub fn bounds_of(&self, ids: &[ElementId]) -> Option<Bounds> {
        let mut acc: Option<(f32, f32, f32, f32)> = None;
        for el in self.iter_elements().filter(|e| ids.contains(&e.id)) {
            let b = el.bounds();
            acc = Some(match acc {
                None => (b.x, b.y, b.right(), b.bottom()),
                Some((x0, y0, x1, y1)) => {
                    (x0.min(b.x), y0.min(b.y), x1.max(b.right()), y1.max(b.bottom()))
                }
            });
        }
        acc.map(|(x0, y0, x1, y1)| Bounds::from_corners(x0, y0, x1, y1))
    }

    /// A generated element id not yet used anywhere in this document.
    pub fn fresh_element_id(&self) -> ElementId {
        loop {
            let id = ElementId::generate();
            if !self.contains_element(id) {
                return id;
            }
        }
    }

    pub fn fresh_layer_id(&self) -> LayerId {
        loop {
            let id = LayerId::generate();
            if self.layer(id).is_none() {
                return id;
            }
        }
    }

    // ─── Layer mutations ─────────────────────────────────────────────────

    /// Append a layer on top with an empty bucket. Duplicate ids are ignored.
    pub fn push_layer(&mut self, layer: Layer) -> bool {
        if self.layer(layer.id).is_some() {
            log::debug!("push_layer: {} already exists", layer.id);
            return false;
        }
        self.buckets.entry(layer.id).or_default();
        self.layers.push(layer);
        true
    }

    /// Remove a layer together with its element bucket.
    pub fn remove_layer(&mut self, id: LayerId) -> Option<(Layer, Vec<Arc<Element>>)> {
        let idx = self.layer_index(id)?;
        let layer = self.layers.remove(idx);
        let elements = self.buckets.remove(&id).unwrap_or_default();
        Some((layer, elements))
    }

    /// Mutable access to layer metadata (name, flags, opacity).
    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    /// Move a layer to `to_index` (clamped) in z-order.
    pub fn move_layer(&mut self, id: LayerId, to_index: usize) -> bool {
        let Some(from) = self.layer_index(id) else {
            return false;
        };
        let layer = self.layers.remove(from);
        let to = to_index.min(self.layers.len());
        self.layers.insert(to, layer);
        from != to
    }

    // ─── Element mutations ───────────────────────────────────────────────

    fn editable(&self, layer: LayerId) -> bool {
        self.layer(layer).is_some_and(Layer::is_editable)
    }

    /// Append `element` to the bucket named by its `layer_id`.
    /// Rejected when the layer is missing, locked, or hidden.
    pub fn push_element(&mut self, element: Element) -> bool {
        if !self.editable(element.layer_id) {
            log::debug!(
                "push_element: layer {} missing or not editable, dropping {}",
                element.layer_id,
                element.id
            );
            return false;
        }
        self.buckets
            .entry(element.layer_id)
            .or_default()
            .push(Arc::new(element));
        true
    }

    /// Apply `patch` to every element matching `pred`, in one layer or (with
    /// `None`) across all layers. Returns the number of patched elements.
    pub fn update_elements(
        &mut self,
        layer: Option<LayerId>,
        mut pred: impl FnMut(&Element) -> bool,
        mut patch: impl FnMut(&mut Element),
    ) -> usize {
        let targets: Vec<LayerId> = match layer {
            Some(id) => vec![id],
            None => self.layers.iter().map(|l| l.id).collect(),
        };
        let mut count = 0;
        for layer_id in targets {
            let editable = self.editable(layer_id);
            let Some(bucket) = self.buckets.get_mut(&layer_id) else {
                continue;
            };
            for el in bucket.iter_mut() {
                if !pred(el) {
                    continue;
                }
                if !editable {
                    log::debug!("update_elements: layer {layer_id} not editable, skipping {}", el.id);
                    continue;
                }
                patch(Arc::make_mut(el));
                count += 1;
            }
        }
        count
    }

    /// Delete elements by id from whichever layer holds them.
    /// Returns the ids actually removed.
    pub fn remove_elements(&mut self, ids: &[ElementId]) -> Vec<ElementId> {
        let mut removed = Vec::new();
        for layer in &self.layers {
            let editable = layer.is_editable();
            let Some(bucket) = self.buckets.get_mut(&layer.id) else {
                continue;
            };
            bucket.retain(|el| {
                if !ids.contains(&el.id) {
                    return true;
                }
                if !editable {
                    log::debug!("remove_elements: layer {} not editable, keeping {}", layer.id, el.id);
                    return true;
                }
                removed.push(el.id);
                false
            });
        }
        removed
    }

    /// Change an element's paint order inside its layer.
    pub fn reorder_element(&mut self, id: ElementId, order: ZOrder) -> bool {
        let Some(layer_id) = self.layer_of(id) else {
            return false;
        };
        if !self.editable(layer_id) {
            return false;
        }
        let Some(bucket) = self.buckets.get_mut(&layer_id) else {
            return false;
        };
        let Some(from) = bucket.iter().position(|e| e.id == id) else {
            return false;
        };
        let last = bucket.len() - 1;
        let to = match order {
            ZOrder::BringToFront => last,
            ZOrder::SendToBack => 0,
            ZOrder::BringForward => (from + 1).min(last),
            ZOrder::SendBackward => from.saturating_sub(1),
        };
        if from == to {
            return false;
        }
        let el = bucket.remove(from);
        bucket.insert(to, el);
        true
    }

    // ─── Snapshots ───────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            layers: self.layers.clone(),
            elements_by_layer: self.buckets.clone(),
            background: self.background,
        }
    }

    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.layers = snapshot.layers.clone();
        self.buckets = snapshot.elements_by_layer.clone();
        self.background = snapshot.background;
    }

    /// Rebuild from raw parts. The caller guarantees one bucket per layer.
    pub(crate) fn from_parts(mut doc: Document, layers: Vec<Layer>, buckets: ElementBuckets) -> Self {
        doc.layers = layers;
        doc.buckets = buckets;
        doc
    }
}

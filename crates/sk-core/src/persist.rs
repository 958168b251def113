//! Mapping between `Document` and the backend's canvas JSON resource.
//!
//! Shape on the wire:
//!
//! ```json
//! { "name": "...", "width": 800, "height": 600, "backgroundColor": "#FFFFFF",
//!   "layers": [ { "id": "...", "name": "...", "visible": true, "locked": false, "opacity": 1 } ],
//!   "elementsByLayer": { "<layerId>": [ { "id": "...", "type": "line", ... } ] } }
//! ```
//!
//! Loading is forgiving: structurally valid payloads are normalized so the
//! document invariants hold, and anything unreadable falls back to a blank
//! document instead of failing the editor. The fallback carries no backend
//! id, so saving it creates a new canvas and never patches the unreadable
//! one with blank content.

use crate::config::EditorConfig;
use crate::document::{Document, ElementBuckets};
use crate::error::{CoreError, Result};
use crate::id::{ElementId, LayerId};
use crate::model::{Color, Element, Layer};
use crate::state::blank_document;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Full canvas object, as created or fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub background_color: Color,
    pub layers: Vec<Layer>,
    pub elements_by_layer: BTreeMap<String, Vec<Element>>,
}

impl CanvasPayload {
    pub fn from_document(doc: &Document) -> Self {
        let elements_by_layer = doc
            .layers()
            .iter()
            .map(|l| {
                let elements = doc.elements(l.id).iter().map(|e| (**e).clone()).collect();
                (l.id.as_str().to_string(), elements)
            })
            .collect();
        Self {
            id: doc.id.clone(),
            name: doc.name.clone(),
            width: doc.width,
            height: doc.height,
            background_color: doc.background,
            layers: doc.layers().to_vec(),
            elements_by_layer,
        }
    }

    /// Build a document, repairing what can be repaired:
    /// duplicate layers are dropped, every layer gets a bucket, orphan
    /// buckets are discarded, elements are re-keyed onto their bucket's
    /// layer, odd trailing coordinates are dropped, duplicate element ids
    /// are re-rolled, and opacities are clamped. An empty layer list gets
    /// the default layer.
    pub fn into_document(mut self, config: &EditorConfig) -> Result<Document> {
        if self.width == 0 || self.height == 0 {
            return Err(CoreError::Malformed(format!(
                "canvas size {}x{}",
                self.width, self.height
            )));
        }

        let mut doc = Document::new(self.name, self.width, self.height, self.background_color);
        doc.id = self.id;

        let mut seen_layers = HashSet::new();
        let mut layers: Vec<Layer> = Vec::with_capacity(self.layers.len());
        for mut layer in self.layers {
            if !seen_layers.insert(layer.id) {
                log::warn!("load: duplicate layer {} dropped", layer.id);
                continue;
            }
            layer.opacity = layer.opacity.clamp(0.0, 1.0);
            layers.push(layer);
        }
        if layers.is_empty() {
            log::warn!("load: document has no layers, adding `{}`", config.default_layer_name);
            layers.push(Layer::new(doc.fresh_layer_id(), config.default_layer_name.clone()));
        }

        let mut taken: HashSet<ElementId> = self
            .elements_by_layer
            .values()
            .flatten()
            .map(|e| e.id)
            .collect();
        let mut unique: HashSet<ElementId> = HashSet::new();

        let mut buckets = ElementBuckets::new();
        for layer in &layers {
            let raw = self
                .elements_by_layer
                .remove(layer.id.as_str())
                .unwrap_or_default();
            let bucket = raw
                .into_iter()
                .map(|el| repair_element(el, layer.id, &mut taken, &mut unique))
                .map(Arc::new)
                .collect();
            buckets.insert(layer.id, bucket);
        }
        for orphan in self.elements_by_layer.keys() {
            log::warn!("load: elements for unknown layer `{orphan}` dropped");
        }

        Ok(Document::from_parts(doc, layers, buckets))
    }
}

fn repair_element(
    mut el: Element,
    layer: LayerId,
    taken: &mut HashSet<ElementId>,
    unique: &mut HashSet<ElementId>,
) -> Element {
    if el.layer_id != layer {
        log::warn!("load: {} claims layer {}, stored under {layer}", el.id, el.layer_id);
        el.layer_id = layer;
    }
    if let Some(points) = el.kind.points_mut()
        && points.len() % 2 == 1
    {
        log::warn!("load: {} has an odd coordinate count, trimming", el.id);
        points.pop();
    }
    el.opacity = el.opacity.clamp(0.0, 1.0);
    if !unique.insert(el.id) {
        let fresh = loop {
            let candidate = ElementId::generate();
            if !taken.contains(&candidate) {
                break candidate;
            }
        };
        log::warn!("load: duplicate element id {} re-keyed to {fresh}", el.id);
        taken.insert(fresh);
        unique.insert(fresh);
        el.id = fresh;
    }
    el
}

/// Strictly parse a canvas body.
///
/// # Errors
/// `CoreError::Json` when the body is not a canvas object (including
/// missing `layers` or `elementsByLayer`), `CoreError::Malformed` for a
/// zero-sized canvas.
pub fn parse_document(json: &str, config: &EditorConfig) -> Result<Document> {
    let payload: CanvasPayload = serde_json::from_str(json)?;
    payload.into_document(config)
}

/// Open a canvas for editing.
///
/// `None` or `"new"` yields a blank document. A body that cannot be read
/// is logged and also yields a blank document without an id: the stored
/// canvas is left alone and the first save is a create.
pub fn load_document(id: Option<&str>, body: Option<&str>, config: &EditorConfig) -> Document {
    let Some(id) = id.filter(|id| *id != "new") else {
        return blank_document(config);
    };
    let Some(body) = body else {
        log::warn!("load: no body for canvas {id}, starting blank");
        return blank_document(config);
    };
    match parse_document(body, config) {
        Ok(mut doc) => {
            doc.id = Some(id.to_string());
            doc
        }
        Err(err) => {
            log::warn!("load: canvas {id} unreadable ({err}), starting blank");
            blank_document(config)
        }
    }
}

/// Serialize the full canvas object.
pub fn to_json(doc: &Document) -> Result<String> {
    Ok(serde_json::to_string(&CanvasPayload::from_document(doc))?)
}

// ─── Saving ──────────────────────────────────────────────────────────────

/// Changed fields only; omitted fields are left as they are server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<Layer>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elements_by_layer: Option<BTreeMap<String, Vec<Element>>>,
}

impl CanvasPatch {
    /// Fields of `current` that differ from `saved`.
    pub fn between(saved: &CanvasPayload, current: &CanvasPayload) -> Self {
        fn changed<T: PartialEq + Clone>(old: &T, new: &T) -> Option<T> {
            (old != new).then(|| new.clone())
        }
        Self {
            name: changed(&saved.name, &current.name),
            width: changed(&saved.width, &current.width),
            height: changed(&saved.height, &current.height),
            background_color: changed(&saved.background_color, &current.background_color),
            layers: changed(&saved.layers, &current.layers),
            elements_by_layer: changed(&saved.elements_by_layer, &current.elements_by_layer),
        }
    }

    /// Every field set.
    pub fn full(current: &CanvasPayload) -> Self {
        Self {
            name: Some(current.name.clone()),
            width: Some(current.width),
            height: Some(current.height),
            background_color: Some(current.background_color),
            layers: Some(current.layers.clone()),
            elements_by_layer: Some(current.elements_by_layer.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveRequest {
    /// First save of a local document: the full object.
    Create(CanvasPayload),
    /// Partial update of an existing canvas.
    Update { id: String, patch: CanvasPatch },
}

/// Decide how to persist `doc`, given the payload last acknowledged by the
/// backend (if any).
pub fn save_request(doc: &Document, last_saved: Option<&CanvasPayload>) -> SaveRequest {
    let current = CanvasPayload::from_document(doc);
    match &doc.id {
        None => SaveRequest::Create(current),
        Some(id) => SaveRequest::Update {
            id: id.clone(),
            patch: match last_saved {
                Some(saved) => CanvasPatch::between(saved, &current),
                None => CanvasPatch::full(&current),
            },
        },
    }
}

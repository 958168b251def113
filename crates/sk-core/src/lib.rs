pub mod config;
pub mod document;
pub mod draft;
pub mod error;
pub mod geometry;
pub mod id;
pub mod model;
pub mod persist;
pub mod selection;
pub mod state;
pub mod transform;

pub use config::{EditorConfig, ToolDefaults};
pub use document::{Document, Snapshot, ZOrder};
pub use draft::LocalDraft;
pub use error::CoreError;
pub use geometry::{Bounds, Viewport};
pub use id::{ElementId, LayerId};
pub use model::*;
pub use persist::{CanvasPatch, CanvasPayload, SaveRequest, load_document, parse_document};
pub use selection::Selection;
pub use state::DocumentState;

//! Hit testing and the render adapter for Sketchboard documents.
//!
//! `hit` answers "what is under this canvas point" and is the single source
//! of truth for pointer lookups. `paint` turns a document into a flat display
//! list keyed by element id, for whichever 2D backend draws it.

pub mod hit;
pub mod paint;

pub use hit::{LINE_HIT_TOLERANCE, LayerScope, TEXT_HIT_PADDING, element_at, elements_in_rect, hit_element};
pub use paint::{Drawable, Geometry, StrokeStyle, build_scene, view_transform};

//! Image transform passes.
//!
//! Each pass resolves its target by element id across every layer, since
//! callers do not track which layer holds an image. Non-image targets,
//! unknown ids, and images on locked or hidden layers are left alone and
//! reported with `false`. Committing the result to history is the
//! caller's job.

use crate::document::Document;
use crate::id::ElementId;
use crate::model::{Element, ImageData};

fn patch_image(doc: &mut Document, id: ElementId, mut patch: impl FnMut(&mut ImageData)) -> bool {
    let applied = doc.update_elements(
        None,
        |e: &Element| e.id == id && e.as_image().is_some(),
        |e| {
            if let Some(img) = e.as_image_mut() {
                patch(img);
            }
        },
    );
    if applied == 0 {
        log::debug!("image transform: {id} is not an editable image");
    }
    applied > 0
}

/// Mirror horizontally. Flipping to a negative scale anchors the visual box
/// with `offset_x = width`; flipping back resets the offset.
pub fn flip_horizontal(doc: &mut Document, id: ElementId) -> bool {
    patch_image(doc, id, |img| {
        img.scale_x = -img.scale_x;
        img.offset_x = if img.scale_x < 0.0 { img.width } else { 0.0 };
    })
}

/// Mirror vertically; see `flip_horizontal`.
pub fn flip_vertical(doc: &mut Document, id: ElementId) -> bool {
    patch_image(doc, id, |img| {
        img.scale_y = -img.scale_y;
        img.offset_y = if img.scale_y < 0.0 { img.height } else { 0.0 };
    })
}

/// Back to identity: no rotation, unit scale, zero offsets.
pub fn reset_transform(doc: &mut Document, id: ElementId) -> bool {
    patch_image(doc, id, |img| {
        img.rotation = 0.0;
        img.scale_x = 1.0;
        img.scale_y = 1.0;
        img.offset_x = 0.0;
        img.offset_y = 0.0;
    })
}

/// Set the scale factors directly.
pub fn scale(doc: &mut Document, id: ElementId, scale_x: f32, scale_y: f32) -> bool {
    patch_image(doc, id, |img| {
        img.scale_x = scale_x;
        img.scale_y = scale_y;
    })
}

/// Set the rotation in degrees, normalized into `[0, 360)`.
pub fn rotate_to(doc: &mut Document, id: ElementId, degrees: f32) -> bool {
    patch_image(doc, id, |img| img.rotation = degrees.rem_euclid(360.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::LayerId;
    use crate::model::{BoxShape, Color, ElementKind, Layer};

    fn image(id: &str, layer: LayerId) -> Element {
        Element::new(
            ElementId::intern(id),
            layer,
            1.0,
            ElementKind::Image(ImageData {
                x: 50.0,
                y: 50.0,
                width: 300.0,
                height: 150.0,
                original_width: 1200.0,
                original_height: 600.0,
                src: "photo.png".into(),
                rotation: 0.0,
                scale_x: 1.0,
                scale_y: 1.0,
                offset_x: 0.0,
                offset_y: 0.0,
            }),
        )
    }

    fn doc_with_two_layers() -> (Document, LayerId, LayerId) {
        let mut doc = Document::new("t", 800, 600, Color::WHITE);
        let a = LayerId::intern("xf-bottom");
        let b = LayerId::intern("xf-top");
        doc.push_layer(Layer::new(a, "bottom"));
        doc.push_layer(Layer::new(b, "top"));
        (doc, a, b)
    }

    fn img<'a>(doc: &'a Document, id: &str) -> &'a ImageData {
        doc.find_element(ElementId::intern(id))
            .and_then(Element::as_image)
            .unwrap()
    }

    #[test]
    fn flip_horizontal_twice_is_identity() {
        let (mut doc, _, top) = doc_with_two_layers();
        doc.push_element(image("xf-flip", top));

        assert!(flip_horizontal(&mut doc, ElementId::intern("xf-flip")));
        assert_eq!(img(&doc, "xf-flip").scale_x, -1.0);
        assert_eq!(img(&doc, "xf-flip").offset_x, 300.0);

        assert!(flip_horizontal(&mut doc, ElementId::intern("xf-flip")));
        assert_eq!(img(&doc, "xf-flip").scale_x, 1.0);
        assert_eq!(img(&doc, "xf-flip").offset_x, 0.0);
    }

    #[test]
    fn flip_vertical_uses_height() {
        let (mut doc, bottom, _) = doc_with_two_layers();
        doc.push_element(image("xf-vflip", bottom));
        assert!(flip_vertical(&mut doc, ElementId::intern("xf-vflip")));
        assert_eq!(img(&doc, "xf-vflip").scale_y, -1.0);
        assert_eq!(img(&doc, "xf-vflip").offset_y, 150.0);
    }

    #[test]
    fn reset_restores_identity() {
        let (mut doc, bottom, _) = doc_with_two_layers();
        doc.push_element(image("xf-reset", bottom));
        let id = ElementId::intern("xf-reset");
        flip_horizontal(&mut doc, id);
        scale(&mut doc, id, 2.0, 3.0);
        rotate_to(&mut doc, id, -90.0);
        assert_eq!(img(&doc, "xf-reset").rotation, 270.0);

        assert!(reset_transform(&mut doc, id));
        let i = img(&doc, "xf-reset");
        assert_eq!(
            (i.rotation, i.scale_x, i.scale_y, i.offset_x, i.offset_y),
            (0.0, 1.0, 1.0, 0.0, 0.0)
        );
    }

    #[test]
    fn non_image_and_unknown_targets_are_ignored() {
        let (mut doc, bottom, _) = doc_with_two_layers();
        doc.push_element(Element::new(
            ElementId::intern("xf-rect"),
            bottom,
            1.0,
            ElementKind::Rectangle(BoxShape {
                x: 0.0,
                y: 0.0,
                width: 1.0,
                height: 1.0,
                stroke: Color::BLACK,
                stroke_width: 1.0,
                fill: None,
            }),
        ));
        assert!(!flip_horizontal(&mut doc, ElementId::intern("xf-rect")));
        assert!(!flip_horizontal(&mut doc, ElementId::intern("xf-missing")));
    }

    #[test]
    fn locked_layer_image_is_untouched() {
        let (mut doc, bottom, _) = doc_with_two_layers();
        doc.push_element(image("xf-locked", bottom));
        doc.layer_mut(bottom).unwrap().locked = true;
        assert!(!flip_horizontal(&mut doc, ElementId::intern("xf-locked")));
        assert_eq!(img(&doc, "xf-locked").scale_x, 1.0);
    }

    #[test]
    fn snapshot_keeps_pre_transform_values() {
        let (mut doc, bottom, _) = doc_with_two_layers();
        doc.push_element(image("xf-snap", bottom));
        let before = doc.snapshot();
        flip_horizontal(&mut doc, ElementId::intern("xf-snap"));
        let kept = before.elements_by_layer[&bottom][0].as_image().unwrap();
        assert_eq!(kept.scale_x, 1.0);
    }
}

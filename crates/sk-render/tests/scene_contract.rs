//! Display list and hit testing agree on the same document.

use pretty_assertions::assert_eq;
use sk_core::*;
use sk_render::{LayerScope, build_scene, element_at, elements_in_rect};

fn boxed(id: &str, layer: LayerId, x: f32, y: f32, w: f32, h: f32) -> Element {
    Element::new(
        ElementId::intern(id),
        layer,
        1.0,
        ElementKind::Rectangle(BoxShape {
            x,
            y,
            width: w,
            height: h,
            stroke: Color::BLACK,
            stroke_width: 1.0,
            fill: Some(Color::WHITE),
        }),
    )
}

fn stroke(id: &str, layer: LayerId, points: Vec<f32>) -> Element {
    Element::new(
        ElementId::intern(id),
        layer,
        1.0,
        ElementKind::Line(Freehand {
            points,
            stroke: Color::BLACK,
            stroke_width: 3.0,
            brush: Brush::Marker,
        }),
    )
}

/// Three layers: paper (locked), ink, notes (hidden).
fn document() -> Document {
    let paper = LayerId::intern("sc-paper");
    let ink = LayerId::intern("sc-ink");
    let notes = LayerId::intern("sc-notes");
    let mut doc = Document::new("contract", 400, 300, Color::WHITE);
    doc.push_layer(Layer::new(paper, "Paper"));
    doc.push_layer(Layer::new(ink, "Ink"));
    doc.push_layer(Layer::new(notes, "Notes"));

    doc.push_element(boxed("sc-sheet", paper, 0.0, 0.0, 400.0, 300.0));
    doc.push_element(boxed("sc-a", ink, 0.0, 0.0, 10.0, 10.0));
    doc.push_element(boxed("sc-b", ink, 50.0, 50.0, 10.0, 10.0));
    doc.push_element(stroke("sc-line", ink, vec![0.0, 100.0, 200.0, 100.0]));
    doc.push_element(boxed("sc-note", notes, 0.0, 0.0, 400.0, 300.0));

    doc.layer_mut(paper).unwrap().locked = true;
    doc.layer_mut(notes).unwrap().visible = false;
    doc
}

#[test]
fn one_drawable_per_visible_element_in_paint_order() {
    let doc = document();
    let scene = build_scene(&doc, None);
    let ids: Vec<&str> = scene.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, ["sc-sheet", "sc-a", "sc-b", "sc-line"]);
}

#[test]
fn topmost_hit_is_the_last_drawable_under_the_point() {
    let doc = document();
    let scene = build_scene(&doc, None);
    for (x, y) in [(5.0, 5.0), (55.0, 55.0), (100.0, 102.0), (300.0, 250.0)] {
        let hit = element_at(&doc, x, y, LayerScope::Visible).map(|e| e.id);
        let last_drawn = scene
            .iter()
            .rev()
            .map(|d| d.id)
            .find(|id| doc.find_element(*id).is_some_and(|e| sk_render::hit_element(e, x, y)));
        assert_eq!(hit, last_drawn, "at ({x}, {y})");
    }
}

#[test]
fn editable_scope_skips_locked_paper() {
    let doc = document();
    assert_eq!(element_at(&doc, 300.0, 250.0, LayerScope::Editable), None);
    assert_eq!(
        element_at(&doc, 300.0, 250.0, LayerScope::Visible).map(|e| e.id.as_str()),
        Some("sc-sheet")
    );
}

#[test]
fn marquee_from_origin_selects_only_the_first_box() {
    let doc = document();
    let picked = elements_in_rect(&doc, Bounds::from_corners(0.0, 0.0, 20.0, 20.0), LayerScope::Editable);
    assert_eq!(picked, [ElementId::intern("sc-a")]);
}

//! End-to-end editing scenarios driven through `EditorSession::handle`.

use pretty_assertions::assert_eq;
use sk_core::{Bounds, EditorConfig, Element, ElementId, ElementKind};
use sk_editor::tools::Outcome;
use sk_editor::{EditorError, EditorSession, InputEvent, Modifiers, ResizeHandle, ToolKind};
use std::io::Cursor;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn session() -> EditorSession {
    init_logger();
    EditorSession::new(EditorConfig::default())
}

fn drag(s: &mut EditorSession, from: (f32, f32), to: (f32, f32)) -> Outcome {
    s.handle(InputEvent::pointer_down(from.0, from.1));
    s.handle(InputEvent::pointer_move(to.0, to.1));
    s.handle(InputEvent::pointer_up(to.0, to.1))
}

fn rect(s: &mut EditorSession, from: (f32, f32), to: (f32, f32)) -> ElementId {
    s.set_tool(ToolKind::Rectangle);
    assert_eq!(drag(s, from, to), Outcome::Committed("rectangle"));
    s.document().iter_elements().last().map(|e| e.id).unwrap()
}

fn element(s: &EditorSession, id: ElementId) -> &Element {
    s.document().find_element(id).unwrap()
}

// ─── Drawing ─────────────────────────────────────────────────────────────

#[test]
fn freehand_stroke() {
    let mut s = session();
    assert_eq!(s.settings().tool, ToolKind::Pencil);
    let layer = s.state().active_layer().unwrap();

    s.handle(InputEvent::pointer_down(10.0, 10.0));
    s.handle(InputEvent::pointer_move(20.0, 10.0));
    s.handle(InputEvent::pointer_move(20.0, 20.0));
    assert_eq!(s.history().len(), 1);
    assert_eq!(s.document().element_count(), 0);
    assert_eq!(s.scene().len(), 1);
    assert_eq!(
        s.handle(InputEvent::pointer_up(20.0, 20.0)),
        Outcome::Committed("stroke")
    );

    let elements = s.document().elements(layer);
    assert_eq!(elements.len(), 1);
    assert_eq!(elements[0].kind.type_name(), "line");
    assert_eq!(
        elements[0].kind.points().unwrap(),
        &[10.0, 10.0, 20.0, 10.0, 20.0, 20.0]
    );
    assert_eq!(s.history().len(), 2);
}

#[test]
fn shapes_take_tool_settings() {
    let mut s = session();
    s.settings_mut().fill_enabled = true;
    s.settings_mut().stroke_width = 4.0;

    s.set_tool(ToolKind::Circle);
    drag(&mut s, (100.0, 100.0), (103.0, 104.0));
    let circle = s.document().iter_elements().last().unwrap();
    match &circle.kind {
        ElementKind::Circle(c) => {
            assert_eq!((c.x, c.y, c.radius), (100.0, 100.0, 5.0));
            assert_eq!(c.stroke_width, 4.0);
            assert!(c.fill.is_some());
        }
        other => panic!("expected circle, got {other:?}"),
    }
}

#[test]
fn shift_draws_square_and_straight_arrow() {
    let mut s = session();
    s.set_tool(ToolKind::Rectangle);
    s.handle(InputEvent::pointer_down(0.0, 0.0));
    s.handle(InputEvent::pointer_move(30.0, 10.0).with_modifiers(Modifiers::SHIFT));
    s.handle(InputEvent::pointer_up(30.0, 10.0).with_modifiers(Modifiers::SHIFT));
    let square = s.document().iter_elements().last().unwrap();
    assert_eq!(square.bounds(), Bounds::new(0.0, 0.0, 30.0, 30.0));

    s.set_tool(ToolKind::Arrow);
    s.handle(InputEvent::pointer_down(100.0, 100.0));
    s.handle(InputEvent::pointer_up(104.0, 150.0).with_modifiers(Modifiers::SHIFT));
    let arrow = s.document().iter_elements().last().unwrap();
    assert_eq!(arrow.kind.points().unwrap(), &[100.0, 100.0, 100.0, 150.0]);
}

#[test]
fn click_without_drag_draws_nothing() {
    let mut s = session();
    s.set_tool(ToolKind::Rectangle);
    s.handle(InputEvent::pointer_down(50.0, 50.0));
    assert_eq!(s.handle(InputEvent::pointer_up(50.0, 50.0)), Outcome::Cancelled);
    assert_eq!(s.document().element_count(), 0);
    assert_eq!(s.history().len(), 1);
}

// ─── Selection ───────────────────────────────────────────────────────────

#[test]
fn marquee_selects_intersecting_elements() {
    let mut s = session();
    let first = rect(&mut s, (0.0, 0.0), (10.0, 10.0));
    rect(&mut s, (50.0, 50.0), (60.0, 60.0));
    let history = s.history().len();

    s.set_tool(ToolKind::Select);
    s.handle(InputEvent::pointer_down(20.0, 20.0));
    s.handle(InputEvent::pointer_move(0.0, 0.0));
    assert_eq!(s.marquee(), Some(Bounds::new(0.0, 0.0, 20.0, 20.0)));
    s.handle(InputEvent::pointer_up(0.0, 0.0));

    assert_eq!(s.state().selection().as_slice(), &[first]);
    assert_eq!(s.marquee(), None);
    assert_eq!(s.history().len(), history);
}

#[test]
fn shift_click_toggles_selection() {
    let mut s = session();
    let a = rect(&mut s, (0.0, 0.0), (10.0, 10.0));
    let b = rect(&mut s, (50.0, 50.0), (60.0, 60.0));
    s.set_tool(ToolKind::Select);

    s.handle(InputEvent::pointer_down(5.0, 5.0));
    s.handle(InputEvent::pointer_up(5.0, 5.0));
    let shift_click = |s: &mut EditorSession, x, y| {
        s.handle(InputEvent::pointer_down(x, y).with_modifiers(Modifiers::SHIFT));
        s.handle(InputEvent::pointer_up(x, y).with_modifiers(Modifiers::SHIFT));
    };
    shift_click(&mut s, 55.0, 55.0);
    assert_eq!(s.state().selection().as_slice(), &[a, b]);
    shift_click(&mut s, 5.0, 5.0);
    assert_eq!(s.state().selection().as_slice(), &[b]);
    // A click is not an edit
    assert_eq!(s.history().undo_label(), Some("rectangle"));
}

#[test]
fn dragging_moves_selection_with_one_commit() {
    let mut s = session();
    let a = rect(&mut s, (0.0, 0.0), (10.0, 10.0));
    let history = s.history().len();
    s.set_tool(ToolKind::Select);

    s.handle(InputEvent::pointer_down(5.0, 5.0));
    for step in 1..=5 {
        s.handle(InputEvent::pointer_move(5.0 + step as f32 * 4.0, 5.0 + step as f32));
    }
    assert_eq!(element(&s, a).bounds(), Bounds::new(20.0, 5.0, 10.0, 10.0));
    assert_eq!(
        s.handle(InputEvent::pointer_up(25.0, 8.0).with_modifiers(Modifiers::SHIFT)),
        Outcome::Committed("move")
    );

    // Shift on release pins the drag to its dominant axis
    assert_eq!(element(&s, a).bounds(), Bounds::new(20.0, 0.0, 10.0, 10.0));
    assert_eq!(s.history().len(), history + 1);
    s.undo();
    assert_eq!(element(&s, a).bounds(), Bounds::new(0.0, 0.0, 10.0, 10.0));
}

// ─── Layers ──────────────────────────────────────────────────────────────

#[test]
fn erase_on_locked_layer_is_rejected() {
    let mut s = session();
    let id = rect(&mut s, (0.0, 0.0), (10.0, 10.0));
    let layer = s.state().active_layer().unwrap();
    assert!(s.set_layer_locked(layer, true));
    let history = s.history().len();

    s.set_tool(ToolKind::Eraser);
    s.handle(InputEvent::pointer_down(5.0, 5.0));
    assert_eq!(s.handle(InputEvent::pointer_up(5.0, 5.0)), Outcome::Ignored);

    assert!(s.document().contains_element(id));
    assert_eq!(s.history().len(), history);
}

#[test]
fn locked_element_shields_what_lies_below() {
    let mut s = session();
    let below = rect(&mut s, (0.0, 0.0), (20.0, 20.0));
    let top = s.create_layer("Stencil");
    rect(&mut s, (5.0, 5.0), (15.0, 15.0));
    s.set_layer_locked(top, true);

    s.set_tool(ToolKind::Eraser);
    drag(&mut s, (10.0, 10.0), (10.0, 10.0));
    assert!(s.document().contains_element(below));

    // Off the locked shape, the element below is erased
    assert_eq!(drag(&mut s, (18.0, 18.0), (18.0, 18.0)), Outcome::Committed("erase"));
    assert!(!s.document().contains_element(below));
}

#[test]
fn eraser_sweep_removes_each_hit_in_one_commit() {
    let mut s = session();
    rect(&mut s, (0.0, 0.0), (10.0, 10.0));
    rect(&mut s, (30.0, 0.0), (40.0, 10.0));
    rect(&mut s, (100.0, 100.0), (110.0, 110.0));
    let history = s.history().len();

    s.set_tool(ToolKind::Eraser);
    s.handle(InputEvent::pointer_down(5.0, 5.0));
    s.handle(InputEvent::pointer_move(20.0, 5.0));
    s.handle(InputEvent::pointer_move(35.0, 5.0));
    assert_eq!(s.handle(InputEvent::pointer_up(35.0, 5.0)), Outcome::Committed("erase"));
    assert_eq!(s.document().element_count(), 1);
    assert_eq!(s.history().len(), history + 1);
}

#[test]
fn locked_layer_blocks_every_edit() {
    let mut s = session();
    let id = rect(&mut s, (0.0, 0.0), (10.0, 10.0));
    let layer = s.state().active_layer().unwrap();
    s.set_layer_locked(layer, true);
    let before = s.state().snapshot();

    // Draw
    s.set_tool(ToolKind::Pencil);
    assert_eq!(s.handle(InputEvent::pointer_down(50.0, 50.0)), Outcome::Ignored);
    s.handle(InputEvent::pointer_up(60.0, 60.0));

    // Move
    s.set_tool(ToolKind::Select);
    drag(&mut s, (5.0, 5.0), (30.0, 30.0));
    assert!(s.state().selection().is_empty());

    // Resize
    assert!(!s.begin_resize(id, ResizeHandle::BottomRight));

    // Delete
    s.select([id]);
    assert_eq!(s.handle(InputEvent::key("Delete")), Outcome::Ignored);
    assert!(s.state().selection().contains(id));

    assert_eq!(s.state().snapshot(), before);
    assert_eq!(s.history().undo_label(), Some("layer lock"));
}

#[test]
fn hidden_layer_is_neither_hit_nor_painted() {
    let mut s = session();
    rect(&mut s, (0.0, 0.0), (10.0, 10.0));
    let layer = s.state().active_layer().unwrap();
    s.set_layer_visible(layer, false);
    assert!(s.scene().is_empty());

    s.set_tool(ToolKind::Select);
    s.handle(InputEvent::pointer_down(5.0, 5.0));
    assert_eq!(s.marquee(), Some(Bounds::new(5.0, 5.0, 0.0, 0.0)));
}

// ─── Cancellation ────────────────────────────────────────────────────────

#[test]
fn escape_abandons_a_shape_in_progress() {
    let mut s = session();
    s.set_tool(ToolKind::Rectangle);
    s.handle(InputEvent::pointer_down(0.0, 0.0));
    s.handle(InputEvent::pointer_move(40.0, 40.0));
    assert_eq!(s.handle(InputEvent::key("Escape")), Outcome::Cancelled);
    s.handle(InputEvent::pointer_up(40.0, 40.0));

    assert_eq!(s.document().element_count(), 0);
    assert_eq!(s.history().len(), 1);
    assert!(s.scene().is_empty());
}

#[test]
fn blur_rolls_back_a_live_move() {
    let mut s = session();
    let a = rect(&mut s, (0.0, 0.0), (10.0, 10.0));
    let history = s.history().len();
    s.set_tool(ToolKind::Select);
    s.handle(InputEvent::pointer_down(5.0, 5.0));
    s.handle(InputEvent::pointer_move(55.0, 55.0));
    assert_eq!(element(&s, a).bounds().x, 50.0);

    assert_eq!(s.handle(InputEvent::Blur), Outcome::Cancelled);
    assert_eq!(element(&s, a).bounds(), Bounds::new(0.0, 0.0, 10.0, 10.0));
    assert_eq!(s.history().len(), history);
    assert!(s.controller().is_idle());
}

#[test]
fn escape_restores_selection_before_marquee() {
    let mut s = session();
    let a = rect(&mut s, (0.0, 0.0), (10.0, 10.0));
    s.set_tool(ToolKind::Select);
    s.select([a]);
    s.handle(InputEvent::pointer_down(100.0, 100.0).with_modifiers(Modifiers::SHIFT));
    s.handle(InputEvent::pointer_move(200.0, 200.0));
    s.handle(InputEvent::key("Escape"));
    assert_eq!(s.state().selection().as_slice(), &[a]);
}

// ─── Text ────────────────────────────────────────────────────────────────

#[test]
fn text_commits_on_enter_and_blur() {
    let mut s = session();
    s.set_tool(ToolKind::Text);

    s.handle(InputEvent::pointer_down(10.0, 10.0));
    s.handle(InputEvent::TextInput { text: "Hello".into() });
    assert_eq!(s.handle(InputEvent::key("Enter")), Outcome::Committed("text"));

    s.handle(InputEvent::pointer_down(10.0, 100.0));
    s.handle(InputEvent::TextInput { text: "World".into() });
    assert_eq!(s.handle(InputEvent::Blur), Outcome::Committed("text"));

    let texts: Vec<&str> = s
        .document()
        .iter_elements()
        .filter_map(|e| match &e.kind {
            ElementKind::Text(t) => Some(t.text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(texts, ["Hello", "World"]);
    assert_eq!(s.history().len(), 3);
}

#[test]
fn blank_text_is_discarded() {
    let mut s = session();
    s.set_tool(ToolKind::Text);
    s.handle(InputEvent::pointer_down(10.0, 10.0));
    s.handle(InputEvent::TextInput { text: "   ".into() });
    assert_eq!(s.handle(InputEvent::key("Enter")), Outcome::Cancelled);
    assert_eq!(s.document().element_count(), 0);
    assert_eq!(s.history().len(), 1);
}

#[test]
fn escape_drops_text_being_typed() {
    let mut s = session();
    s.set_tool(ToolKind::Text);
    s.handle(InputEvent::pointer_down(10.0, 10.0));
    s.handle(InputEvent::TextInput { text: "draft".into() });
    assert_eq!(s.handle(InputEvent::key("Escape")), Outcome::Cancelled);
    assert_eq!(s.document().element_count(), 0);
}

#[test]
fn clicking_away_commits_text() {
    let mut s = session();
    s.set_tool(ToolKind::Text);
    s.handle(InputEvent::pointer_down(10.0, 10.0));
    s.handle(InputEvent::TextInput { text: "one".into() });
    assert_eq!(
        s.handle(InputEvent::pointer_down(300.0, 300.0)),
        Outcome::Committed("text")
    );
    assert!(s.controller().is_idle());
    assert_eq!(s.document().element_count(), 1);
}

// ─── Images ──────────────────────────────────────────────────────────────

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    image::RgbaImage::new(width, height)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn inserted_image_is_fit_and_selected() {
    let mut s = session();
    let id = s.insert_image(&png(600, 200), "blob:photo").unwrap();
    let el = element(&s, id);
    assert_eq!(el.bounds(), Bounds::new(50.0, 50.0, 300.0, 100.0));
    let img = el.as_image().unwrap();
    assert_eq!((img.original_width, img.original_height), (600.0, 200.0));
    assert_eq!(s.state().selection().as_slice(), &[id]);
    assert_eq!(s.history().undo_label(), Some("image"));
}

#[test]
fn undecodable_image_is_an_error() {
    let mut s = session();
    assert!(matches!(
        s.insert_image(b"not an image", "blob:x"),
        Err(EditorError::ImageDecode(_))
    ));
    assert_eq!(s.document().element_count(), 0);
}

#[test]
fn image_on_locked_layer_is_refused() {
    let mut s = session();
    let layer = s.state().active_layer().unwrap();
    s.set_layer_locked(layer, true);
    assert!(matches!(
        s.place_image(10, 10, "blob:y"),
        Err(EditorError::LayerNotEditable(_))
    ));
}

#[test]
fn double_flip_restores_image() {
    let mut s = session();
    let id = s.place_image(1200, 600, "blob:z").unwrap();
    let original = element(&s, id).clone();

    assert!(s.flip_horizontal(id));
    let flipped = element(&s, id).as_image().unwrap().clone();
    assert_eq!((flipped.scale_x, flipped.offset_x), (-1.0, 300.0));

    assert!(s.flip_horizontal(id));
    assert_eq!(*element(&s, id), original);
    assert_eq!(s.history().undo_label(), Some("flip"));
    assert_eq!(s.history().len(), 4);
}

#[test]
fn resize_image_keeps_aspect_ratio() {
    let mut s = session();
    let id = s.place_image(400, 200, "blob:r").unwrap();
    assert_eq!(element(&s, id).bounds(), Bounds::new(50.0, 50.0, 300.0, 150.0));
    s.set_tool(ToolKind::Select);

    // Grab the bottom-right handle of the selected image
    s.handle(InputEvent::pointer_down(350.0, 200.0));
    s.handle(InputEvent::pointer_move(380.0, 203.0));
    s.handle(InputEvent::pointer_move(410.0, 205.0));
    assert_eq!(
        s.handle(InputEvent::pointer_up(410.0, 205.0)),
        Outcome::Committed("resize")
    );
    assert_eq!(element(&s, id).bounds(), Bounds::new(50.0, 50.0, 360.0, 180.0));
}

#[test]
fn free_resize_without_aspect_lock() {
    let mut s = session();
    s.settings_mut().lock_aspect = false;
    let id = rect(&mut s, (10.0, 10.0), (110.0, 60.0));
    s.set_tool(ToolKind::Select);
    s.select([id]);

    assert!(s.begin_resize(id, ResizeHandle::Left));
    s.handle(InputEvent::pointer_move(0.0, 999.0));
    s.handle(InputEvent::pointer_up(0.0, 999.0));
    assert_eq!(element(&s, id).bounds(), Bounds::new(0.0, 10.0, 110.0, 50.0));
}

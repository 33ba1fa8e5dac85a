//! End-to-end pointer scenarios driven through the editor.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use kurbo::{Point, Rect, Vec2};
use penboard_core::{
    Anchor, Editor, EditorEvent, EditorOptions, HistoryKind, HistoryRecord, HotkeyType, LockState, ManualClock,
    Modifiers, MouseButton, Painter, Pen, PenId, PrevNextType, RenderOutcome, Scene, ScreenPoint,
};

type Events = Rc<RefCell<Vec<EditorEvent>>>;
type History = Rc<RefCell<Vec<HistoryRecord>>>;

fn editor() -> (Editor, Events, History) {
    let events = Events::default();
    let history = History::default();
    let editor = Editor::new(EditorOptions::default())
        .with_events(events.clone())
        .with_history(history.clone())
        .with_clock(ManualClock::default());
    (editor, events, history)
}

fn pt(x: f64, y: f64) -> ScreenPoint {
    ScreenPoint::new(x, y)
}

fn click(editor: &mut Editor, x: f64, y: f64) {
    editor.on_pointer_down(pt(x, y), MouseButton::Left, Modifiers::default());
    editor.on_pointer_up(pt(x, y), MouseButton::Left);
}

fn drag(editor: &mut Editor, from: (f64, f64), to: (f64, f64)) {
    editor.on_pointer_down(pt(from.0, from.1), MouseButton::Left, Modifiers::default());
    editor.on_pointer_move(pt(to.0, to.1));
    editor.on_pointer_up(pt(to.0, to.1), MouseButton::Left);
}

fn world_rect(editor: &Editor, id: PenId) -> Rect {
    editor.pen(id).unwrap().calculative.world_rect
}

fn close(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6
}

fn rect_close(a: Rect, b: Rect) -> bool {
    close(Point::new(a.x0, a.y0), Point::new(b.x0, b.y0)) && close(Point::new(a.x1, a.y1), Point::new(b.x1, b.y1))
}

fn count(events: &Events, pred: impl Fn(&EditorEvent) -> bool) -> usize {
    events.borrow().iter().filter(|e| pred(e)).count()
}

#[test]
fn test_click_selects_and_drag_translates() {
    let (mut editor, events, history) = editor();
    let id = editor.add_pen(Pen::node(Rect::new(100.0, 100.0, 200.0, 200.0)));

    drag(&mut editor, (150.0, 150.0), (170.0, 160.0));

    assert_eq!(editor.active(), &[id]);
    assert_eq!(world_rect(&editor, id), Rect::new(120.0, 110.0, 220.0, 210.0));
    assert_eq!(count(&events, |e| matches!(e, EditorEvent::Active { .. })), 1);
    let history = history.borrow();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, HistoryKind::Update);
    assert_eq!(history[0].initial[0].rect, Rect::new(100.0, 100.0, 200.0, 200.0));
    assert!(editor.gesture().is_none());
}

#[test]
fn test_click_without_move_records_nothing() {
    let (mut editor, _events, history) = editor();
    editor.add_pen(Pen::node(Rect::new(100.0, 100.0, 200.0, 200.0)));
    click(&mut editor, 150.0, 150.0);
    assert!(history.borrow().is_empty());
}

#[test]
fn test_ctrl_toggles_membership() {
    let (mut editor, _events, _history) = editor();
    let a = editor.add_pen(Pen::node(Rect::new(0.0, 0.0, 50.0, 50.0)));
    let b = editor.add_pen(Pen::node(Rect::new(100.0, 0.0, 150.0, 50.0)));
    let ctrl = Modifiers {
        ctrl: true,
        ..Modifiers::default()
    };

    click(&mut editor, 20.0, 20.0);
    editor.on_pointer_down(pt(120.0, 20.0), MouseButton::Left, ctrl);
    editor.on_pointer_up(pt(120.0, 20.0), MouseButton::Left);
    assert_eq!(editor.active(), &[a, b]);

    editor.on_pointer_down(pt(20.0, 20.0), MouseButton::Left, ctrl);
    editor.on_pointer_up(pt(20.0, 20.0), MouseButton::Left);
    assert_eq!(editor.active(), &[b]);
}

#[test]
fn test_click_on_empty_canvas_clears_selection() {
    let (mut editor, events, _history) = editor();
    let id = editor.add_pen(Pen::node(Rect::new(0.0, 0.0, 50.0, 50.0)));
    editor.select(vec![id]);
    click(&mut editor, 400.0, 400.0);
    assert!(editor.active().is_empty());
    assert!(events.borrow().contains(&EditorEvent::Inactive { pens: vec![id] }));
}

#[test]
fn test_resize_bottom_right_keeps_top_left() {
    let (mut editor, _events, history) = editor();
    let id = editor.add_pen(Pen::node(Rect::new(0.0, 0.0, 100.0, 100.0)));
    editor.select(vec![id]);

    drag(&mut editor, (100.0, 100.0), (130.0, 120.0));

    assert!(rect_close(world_rect(&editor, id), Rect::new(0.0, 0.0, 130.0, 120.0)));
    assert_eq!(history.borrow().len(), 1);
}

#[test]
fn test_resize_top_left_keeps_bottom_right() {
    let (mut editor, _events, _history) = editor();
    let id = editor.add_pen(Pen::node(Rect::new(0.0, 0.0, 100.0, 100.0)));
    editor.select(vec![id]);

    drag(&mut editor, (0.0, 0.0), (-20.0, 10.0));

    assert!(rect_close(world_rect(&editor, id), Rect::new(-20.0, 10.0, 100.0, 100.0)));
}

#[test]
fn test_edge_resize_needs_gate() {
    let (mut editor, _events, _history) = editor();
    let id = editor.add_pen(Pen::node(Rect::new(0.0, 0.0, 100.0, 100.0)));
    editor.select(vec![id]);

    editor.on_key_down("Shift");
    assert_eq!(editor.gate(), HotkeyType::Resize);
    drag(&mut editor, (100.0, 50.0), (140.0, 80.0));
    editor.on_key_up("Shift");

    assert!(rect_close(world_rect(&editor, id), Rect::new(0.0, 0.0, 140.0, 100.0)));
    assert_eq!(editor.gate(), HotkeyType::None);
}

#[test]
fn test_rotate_handle_turns_pen() {
    let (mut editor, _events, history) = editor();
    let id = editor.add_pen(Pen::node(Rect::new(0.0, 0.0, 100.0, 100.0)));
    editor.select(vec![id]);

    drag(&mut editor, (50.0, -30.0), (130.0, 50.0));

    let pen = editor.pen(id).unwrap();
    assert!((pen.calculative.world_rotate - 90.0).abs() < 1e-6);
    assert!((editor.active_rect().unwrap().rotate - 90.0).abs() < 1e-6);
    assert_eq!(history.borrow().len(), 1);
}

#[test]
fn test_locked_edit_blocks_resize() {
    let (mut editor, _events, history) = editor();
    let id = editor.add_pen(Pen::node(Rect::new(0.0, 0.0, 100.0, 100.0)));
    editor.select(vec![id]);
    editor.set_locked(LockState::DisableEdit);

    // Within reach of the corner handle, but handles are off while edits are locked.
    drag(&mut editor, (95.0, 95.0), (125.0, 125.0));

    assert_eq!(world_rect(&editor, id).size(), kurbo::Size::new(100.0, 100.0));
    assert_eq!(history.borrow().len(), 1);
}

#[test]
fn test_fully_locked_document_pans() {
    let (mut editor, events, _history) = editor();
    editor.add_pen(Pen::node(Rect::new(100.0, 100.0, 200.0, 200.0)));
    editor.set_locked(LockState::Disable);

    drag(&mut editor, (150.0, 150.0), (170.0, 150.0));

    assert!(editor.active().is_empty());
    assert_eq!(editor.calibrator().pan, Vec2::new(20.0, 0.0));
    assert_eq!(
        events.borrow().as_slice(),
        &[EditorEvent::Translate {
            offset: Vec2::new(20.0, 0.0)
        }]
    );
}

#[test]
fn test_right_click_emits_context_menu() {
    let (mut editor, events, _history) = editor();
    editor.on_pointer_down(pt(10.0, 20.0), MouseButton::Right, Modifiers::default());
    editor.on_pointer_up(pt(10.0, 20.0), MouseButton::Right);
    assert_eq!(
        count(&events, |e| *e == EditorEvent::ContextMenu {
            point: Point::new(10.0, 20.0)
        }),
        1
    );
}

#[test]
fn test_marquee_selects_enclosed_pens() {
    let (mut editor, _events, _history) = editor();
    let a = editor.add_pen(Pen::node(Rect::new(0.0, 0.0, 50.0, 50.0)));
    let b = editor.add_pen(Pen::node(Rect::new(100.0, 100.0, 150.0, 150.0)));
    editor.add_pen(Pen::node(Rect::new(300.0, 300.0, 400.0, 400.0)));

    editor.on_pointer_down(pt(-20.0, -20.0), MouseButton::Left, Modifiers::default());
    editor.on_pointer_move(pt(200.0, 200.0));
    assert!(editor.marquee().is_some());
    editor.on_pointer_up(pt(200.0, 200.0), MouseButton::Left);

    let mut active = editor.active().to_vec();
    active.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(active, expected);
    assert!(editor.marquee().is_none());
}

#[test]
fn test_drag_from_anchor_connects_two_nodes() {
    let (mut editor, events, history) = editor();
    let a = editor.add_pen(Pen::node(Rect::new(0.0, 0.0, 100.0, 100.0)));
    let b = editor.add_pen(Pen::node(Rect::new(300.0, 0.0, 400.0, 100.0)));

    drag(&mut editor, (100.0, 50.0), (300.0, 50.0));

    assert!(editor.drawing().is_none());
    assert_eq!(count(&events, |e| matches!(e, EditorEvent::AddPen { .. })), 1);
    assert_eq!(history.borrow().len(), 1);
    assert_eq!(history.borrow()[0].kind, HistoryKind::Add);

    let line_id = history.borrow()[0].pens[0].id;
    let line = editor.pen(line_id).unwrap();
    assert!(line.is_line());
    assert_eq!(line.from_anchor().unwrap().connect_to, Some(a));
    assert_eq!(line.to_anchor().unwrap().connect_to, Some(b));
    assert!(close(line.to_anchor().unwrap().point(), Point::new(300.0, 50.0)));
    assert_eq!(editor.pen(a).unwrap().connected_lines.len(), 1);
    assert_eq!(editor.active(), &[line_id]);

    // Moving the node drags the bound terminal with it.
    drag(&mut editor, (50.0, 20.0), (50.0, 70.0));
    let line = editor.pen(line_id).unwrap();
    assert!(close(line.from_anchor().unwrap().point(), Point::new(100.0, 100.0)));
    assert!(close(line.to_anchor().unwrap().point(), Point::new(300.0, 50.0)));
}

#[test]
fn test_click_to_draw_polyline() {
    let (mut editor, events, history) = editor();
    editor.set_drawing_line(Some("line")).unwrap();

    click(&mut editor, 0.0, 0.0);
    assert!(editor.drawing().is_some());
    editor.on_pointer_move(pt(100.0, 0.0));
    click(&mut editor, 100.0, 0.0);
    editor.on_pointer_move(pt(100.0, 100.0));
    click(&mut editor, 100.0, 100.0);
    editor.on_pointer_move(pt(300.0, 300.0));
    editor.on_key_down("Escape");

    assert!(editor.drawing().is_none());
    assert_eq!(count(&events, |e| matches!(e, EditorEvent::AddPen { .. })), 1);
    let history = history.borrow();
    assert_eq!(history.len(), 1);
    let anchors: Vec<Point> = history[0].pens[0].anchors.iter().map(Anchor::point).collect();
    assert_eq!(
        anchors,
        vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0), Point::new(100.0, 100.0)]
    );
}

#[test]
fn test_line_with_nothing_committed_is_discarded() {
    let (mut editor, events, history) = editor();
    editor.set_drawing_line(Some("curve")).unwrap();

    click(&mut editor, 10.0, 10.0);
    editor.on_pointer_move(pt(200.0, 80.0));
    editor.on_pointer_down(pt(200.0, 80.0), MouseButton::Right, Modifiers::default());
    editor.on_pointer_up(pt(200.0, 80.0), MouseButton::Right);

    assert!(editor.drawing().is_none());
    assert!(editor.store().is_empty());
    assert_eq!(count(&events, |e| matches!(e, EditorEvent::AddPen { .. })), 0);
    assert!(history.borrow().is_empty());
}

#[test]
fn test_unknown_line_style_is_rejected() {
    let (mut editor, _events, _history) = editor();
    assert!(editor.set_drawing_line(Some("zigzag")).is_err());
    click(&mut editor, 10.0, 10.0);
    assert!(editor.drawing().is_none());
}

#[test]
fn test_mirror_handle_drag() {
    let (mut editor, _events, history) = editor();
    let mut mid = Anchor::new(100.0, 0.0);
    mid.prev = Some(Point::new(80.0, 0.0));
    mid.next = Some(Point::new(120.0, 0.0));
    let mid_id = mid.id;
    let line = editor.add_pen(Pen::line(vec![Anchor::new(0.0, 0.0), mid, Anchor::new(200.0, 0.0)]));
    editor.select(vec![line]);

    drag(&mut editor, (120.0, 0.0), (120.0, 20.0));

    let anchor = editor.pen(line).unwrap().anchor(mid_id).unwrap();
    assert!(close(anchor.next.unwrap(), Point::new(120.0, 20.0)));
    assert!(close(anchor.prev.unwrap(), Point::new(80.0, -20.0)));
    assert!(close(anchor.point(), Point::new(100.0, 0.0)));
    assert_eq!(history.borrow().len(), 1);
}

#[test]
fn test_line_endpoint_drag_moves_anchor() {
    let (mut editor, _events, _history) = editor();
    let line = editor.add_pen(Pen::line(vec![Anchor::new(0.0, 0.0), Anchor::new(200.0, 0.0)]));

    drag(&mut editor, (200.0, 0.0), (220.0, 40.0));

    let pen = editor.pen(line).unwrap();
    assert!(close(pen.to_anchor().unwrap().point(), Point::new(220.0, 40.0)));
    assert_eq!(pen.rect, Rect::new(0.0, 0.0, 220.0, 40.0));
}

#[test]
fn test_add_anchor_gate_inserts_then_removes() {
    let (mut editor, _events, history) = editor();
    let line = editor.add_pen(Pen::line(vec![Anchor::new(0.0, 0.0), Anchor::new(200.0, 0.0)]));

    editor.on_key_down("a");
    click(&mut editor, 100.0, 3.0);
    assert_eq!(editor.pen(line).unwrap().anchors.len(), 3);
    assert!(close(editor.pen(line).unwrap().anchors[1].point(), Point::new(100.0, 0.0)));

    click(&mut editor, 100.0, 0.0);
    assert_eq!(editor.pen(line).unwrap().anchors.len(), 2);
    assert_eq!(history.borrow().len(), 2);
    assert!(history.borrow().iter().all(|r| r.kind == HistoryKind::Update));
}

#[test]
fn test_wheel_zooms_about_pointer() {
    let (mut editor, events, _history) = editor();
    let id = editor.add_pen(Pen::node(Rect::new(0.0, 0.0, 100.0, 100.0)));

    editor.on_wheel(pt(0.0, 0.0), -120.0);

    assert!((editor.store().data.scale - 1.1).abs() < 1e-9);
    assert!(rect_close(world_rect(&editor, id), Rect::new(0.0, 0.0, 110.0, 110.0)));
    assert_eq!(count(&events, |e| matches!(e, EditorEvent::Scale { .. })), 1);
}

#[test]
fn test_zoom_is_clamped() {
    let (mut editor, events, _history) = editor();
    editor.scale_to(50.0, penboard_core::WorldPoint::new(0.0, 0.0));
    assert!((editor.store().data.scale - 10.0).abs() < 1e-9);
    editor.scale_to(10.0, penboard_core::WorldPoint::new(0.0, 0.0));
    assert_eq!(count(&events, |e| matches!(e, EditorEvent::Scale { .. })), 1);
}

#[test]
fn test_pinch_scales_about_midpoint() {
    let (mut editor, _events, _history) = editor();
    let id = editor.add_pen(Pen::node(Rect::new(0.0, 0.0, 100.0, 100.0)));

    editor.on_touch_start(&[pt(0.0, 200.0), pt(100.0, 200.0)]);
    editor.on_touch_move(&[pt(-50.0, 200.0), pt(150.0, 200.0)]);
    editor.on_touch_end(&[]);

    assert!((editor.store().data.scale - 2.0).abs() < 1e-9);
    assert!(rect_close(world_rect(&editor, id), Rect::new(-50.0, -200.0, 150.0, 0.0)));
}

#[test]
fn test_single_touch_drags_like_a_pointer() {
    let (mut editor, _events, history) = editor();
    let id = editor.add_pen(Pen::node(Rect::new(100.0, 100.0, 200.0, 200.0)));

    editor.on_touch_start(&[pt(150.0, 150.0)]);
    editor.on_touch_move(&[pt(160.0, 150.0)]);
    editor.on_touch_end(&[]);

    assert_eq!(world_rect(&editor, id), Rect::new(110.0, 100.0, 210.0, 200.0));
    assert_eq!(history.borrow().len(), 1);
}

#[test]
fn test_blur_drops_pending_gesture() {
    let (mut editor, _events, history) = editor();
    editor.add_pen(Pen::node(Rect::new(100.0, 100.0, 200.0, 200.0)));

    editor.on_pointer_down(pt(150.0, 150.0), MouseButton::Left, Modifiers::default());
    editor.on_pointer_move(pt(170.0, 150.0));
    editor.on_blur();
    assert!(editor.gesture().is_none());
    editor.on_pointer_up(pt(190.0, 150.0), MouseButton::Left);

    assert!(history.borrow().is_empty());
}

#[test]
fn test_drop_payload() {
    let (mut editor, events, history) = editor();
    let json = serde_json::to_string(&vec![Pen::node(Rect::new(0.0, 0.0, 100.0, 100.0))]).unwrap();

    let ids = editor.drop_pens(&json, pt(500.0, 500.0));

    assert_eq!(ids.len(), 1);
    assert!(rect_close(world_rect(&editor, ids[0]), Rect::new(450.0, 450.0, 550.0, 550.0)));
    assert_eq!(count(&events, |e| matches!(e, EditorEvent::AddPen { .. })), 1);
    assert_eq!(history.borrow().len(), 1);
    assert_eq!(editor.active(), ids.as_slice());

    // Dropping the same pens again adds nothing.
    assert!(editor.drop_pens(&json, pt(0.0, 0.0)).is_empty());
}

#[test]
fn test_malformed_drop_is_discarded() {
    let (mut editor, events, history) = editor();
    assert!(editor.drop_pens("{not json", pt(0.0, 0.0)).is_empty());
    assert!(events.borrow().is_empty());
    assert!(history.borrow().is_empty());
}

#[test]
fn test_hover_enter_and_leave_once() {
    let (mut editor, events, _history) = editor();
    let id = editor.add_pen(Pen::node(Rect::new(0.0, 0.0, 100.0, 100.0)));

    editor.on_pointer_move(pt(30.0, 30.0));
    editor.on_pointer_move(pt(40.0, 30.0));
    editor.on_pointer_move(pt(300.0, 300.0));

    assert_eq!(
        events.borrow().as_slice(),
        &[EditorEvent::Enter { pen: id }, EditorEvent::Leave { pen: id }]
    );
}

struct CountingPainter {
    painted: Rc<Cell<usize>>,
    invalidated: Rc<Cell<usize>>,
}

impl Painter for CountingPainter {
    fn paint_offscreen(&mut self, _scene: &Scene<'_>) {
        self.painted.set(self.painted.get() + 1);
    }

    fn present(&mut self) {}

    fn invalidate(&mut self, _pen: &Pen) {
        self.invalidated.set(self.invalidated.get() + 1);
    }
}

#[test]
fn test_drag_renders_are_throttled() {
    let painted = Rc::new(Cell::new(0));
    let invalidated = Rc::new(Cell::new(0));
    let clock = ManualClock::default();
    let mut editor = Editor::new(EditorOptions::default())
        .with_clock(clock.clone())
        .with_painter(CountingPainter {
            painted: painted.clone(),
            invalidated: invalidated.clone(),
        });
    editor.add_pen(Pen::node(Rect::new(100.0, 100.0, 200.0, 200.0)));

    editor.on_pointer_down(pt(150.0, 150.0), MouseButton::Left, Modifiers::default());
    assert_eq!(painted.get(), 1);
    assert_eq!(invalidated.get(), 1);

    editor.on_pointer_move(pt(160.0, 150.0));
    assert_eq!(painted.get(), 1);
    assert!(editor.scheduler().frame_pending());
    assert_eq!(editor.frame_tick(), RenderOutcome::Rendered);
    assert_eq!(painted.get(), 2);

    clock.advance(50.0);
    editor.on_pointer_move(pt(170.0, 150.0));
    assert_eq!(painted.get(), 3);
    assert_eq!(editor.frame_tick(), RenderOutcome::Skipped);
}

#[test]
fn test_viewport_resize_is_debounced() {
    let (mut editor, _events, _history) = editor();
    editor.request_resize(kurbo::Size::new(800.0, 600.0), 0.0);
    editor.request_resize(kurbo::Size::new(1024.0, 768.0), 50.0);
    assert!(!editor.poll(120.0));
    assert!(editor.poll(150.0));
    assert_eq!(editor.viewport(), kurbo::Size::new(1024.0, 768.0));
    assert!(!editor.poll(400.0));
}

#[test]
fn test_group_resize_scales_members_proportionally() {
    let (mut editor, _events, history) = editor();
    let a = editor.add_pen(Pen::node(Rect::new(0.0, 0.0, 100.0, 100.0)));
    let b = editor.add_pen(Pen::node(Rect::new(100.0, 100.0, 200.0, 200.0)));
    editor.select(vec![a, b]);
    assert_eq!(editor.active_rect().unwrap().rect, Rect::new(0.0, 0.0, 200.0, 200.0));

    drag(&mut editor, (200.0, 200.0), (400.0, 400.0));

    assert!(rect_close(world_rect(&editor, a), Rect::new(0.0, 0.0, 200.0, 200.0)));
    assert!(rect_close(world_rect(&editor, b), Rect::new(200.0, 200.0, 400.0, 400.0)));
    assert!(rect_close(editor.active_rect().unwrap().rect, Rect::new(0.0, 0.0, 400.0, 400.0)));
    let history = history.borrow();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].pens.len(), 2);
}

#[test]
fn test_group_rotation_revolves_members() {
    let (mut editor, _events, history) = editor();
    let a = editor.add_pen(Pen::node(Rect::new(0.0, 0.0, 100.0, 100.0)));
    let b = editor.add_pen(Pen::node(Rect::new(200.0, 0.0, 300.0, 100.0)));
    editor.select(vec![a, b]);

    // The rotate handle sits above the middle of the group; drag it a quarter turn.
    drag(&mut editor, (150.0, -30.0), (230.0, 50.0));

    assert!(close(world_rect(&editor, a).center(), Point::new(150.0, -50.0)));
    assert!(close(world_rect(&editor, b).center(), Point::new(150.0, 150.0)));
    assert!((editor.pen(a).unwrap().rotate - 90.0).abs() < 1e-6);
    assert!((editor.pen(b).unwrap().rotate - 90.0).abs() < 1e-6);
    assert_eq!(history.borrow().len(), 1);
}

#[test]
fn test_bilateral_handle_drag_keeps_opposite_length() {
    let (mut editor, _events, history) = editor();
    let mut mid = Anchor::new(100.0, 0.0);
    mid.prev_next_type = PrevNextType::Bilateral;
    mid.prev = Some(Point::new(70.0, 0.0));
    mid.next = Some(Point::new(120.0, 0.0));
    let mid_id = mid.id;
    let line = editor.add_pen(Pen::line(vec![Anchor::new(0.0, 0.0), mid, Anchor::new(200.0, 0.0)]));
    editor.select(vec![line]);

    drag(&mut editor, (120.0, 0.0), (100.0, 20.0));

    let anchor = editor.pen(line).unwrap().anchor(mid_id).unwrap();
    assert!(close(anchor.next.unwrap(), Point::new(100.0, 20.0)));
    assert!(close(anchor.prev.unwrap(), Point::new(100.0, -30.0)));
    assert_eq!(history.borrow().len(), 1);
}

#[test]
fn test_image_loaded_invalidates_cached_path() {
    let painted = Rc::new(Cell::new(0));
    let invalidated = Rc::new(Cell::new(0));
    let mut editor = Editor::new(EditorOptions::default())
        .with_clock(ManualClock::default())
        .with_painter(CountingPainter {
            painted: painted.clone(),
            invalidated: invalidated.clone(),
        });
    let id = editor.add_pen(Pen::node(Rect::new(0.0, 0.0, 100.0, 100.0)));
    editor.frame_tick();
    assert_eq!(invalidated.get(), 1);

    editor.image_loaded(id);
    assert_eq!(invalidated.get(), 2);

    let unknown = Pen::node(Rect::new(0.0, 0.0, 1.0, 1.0)).id;
    editor.image_loaded(unknown);
    assert_eq!(invalidated.get(), 2);
}

#[test]
fn test_child_selection_cannot_be_resized() {
    let (mut editor, _events, history) = editor();
    let parent = editor.add_pen(Pen::node(Rect::new(0.0, 0.0, 200.0, 200.0)));
    let mut child = Pen::node(Rect::new(0.5, 0.5, 1.0, 1.0));
    child.parent_id = Some(parent);
    let child = editor.add_pen(child);
    editor.select(vec![child]);

    // Within reach of the child's top-left corner handle.
    drag(&mut editor, (102.0, 102.0), (80.0, 80.0));

    assert_eq!(world_rect(&editor, child), Rect::new(100.0, 100.0, 200.0, 200.0));
    assert_eq!(editor.active_rect().unwrap().rect, world_rect(&editor, child));
    assert!(history.borrow().is_empty());
}

#[test]
fn test_discarded_line_leaves_target_line_untouched() {
    let (mut editor, events, history) = editor();
    let target = editor.add_pen(Pen::line(vec![Anchor::new(0.0, 0.0), Anchor::new(200.0, 0.0)]));
    editor.set_drawing_line(Some("line")).unwrap();

    click(&mut editor, 100.0, 0.0);
    assert!(editor.drawing().is_some());
    editor.on_pointer_move(pt(100.0, 80.0));
    editor.on_key_down("Escape");

    assert!(editor.drawing().is_none());
    assert_eq!(editor.pen(target).unwrap().anchors.len(), 2);
    assert_eq!(editor.store().len(), 1);
    assert_eq!(count(&events, |e| matches!(e, EditorEvent::AddPen { .. })), 0);
    assert!(history.borrow().is_empty());
}

#[test]
fn test_line_ending_on_line_body_inserts_anchor() {
    let (mut editor, events, history) = editor();
    let target = editor.add_pen(Pen::line(vec![Anchor::new(0.0, 100.0), Anchor::new(200.0, 100.0)]));
    editor.set_drawing_line(Some("line")).unwrap();

    click(&mut editor, 100.0, 0.0);
    editor.on_pointer_move(pt(100.0, 100.0));
    click(&mut editor, 100.0, 100.0);

    assert!(editor.drawing().is_none());
    let pen = editor.pen(target).unwrap();
    assert_eq!(pen.anchors.len(), 3);
    let inserted = pen.anchors[1].id;
    assert!(close(pen.anchors[1].point(), Point::new(100.0, 100.0)));
    assert_eq!(pen.connected_lines.len(), 1);
    assert_eq!(count(&events, |e| matches!(e, EditorEvent::AddPen { .. })), 1);

    let history = history.borrow();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].kind, HistoryKind::Update);
    assert_eq!(history[0].initial[0].anchors.len(), 2);
    assert_eq!(history[0].pens[0].anchors.len(), 3);
    assert_eq!(history[1].kind, HistoryKind::Add);
    let line = editor.pen(history[1].pens[0].id).unwrap();
    assert_eq!(line.to_anchor().unwrap().connect_to, Some(target));
    assert_eq!(line.to_anchor().unwrap().anchor_id, Some(inserted));
}

#[test]
fn test_click_on_origin_anchor_discards_line() {
    let (mut editor, events, history) = editor();
    editor.add_pen(Pen::node(Rect::new(0.0, 0.0, 100.0, 100.0)));

    click(&mut editor, 100.0, 50.0);
    assert!(editor.drawing().is_some());
    click(&mut editor, 100.0, 50.0);

    assert!(editor.drawing().is_none());
    assert_eq!(editor.store().len(), 1);
    assert_eq!(count(&events, |e| matches!(e, EditorEvent::AddPen { .. })), 0);
    assert!(history.borrow().is_empty());
}

#[test]
fn test_cyclic_drop_payload_is_rejected() {
    let (mut editor, events, history) = editor();
    let mut a = Pen::node(Rect::new(0.0, 0.0, 100.0, 100.0));
    let mut b = Pen::node(Rect::new(0.0, 0.0, 0.5, 0.5));
    a.parent_id = Some(b.id);
    a.children = vec![b.id];
    b.parent_id = Some(a.id);
    b.children = vec![a.id];
    let plain = Pen::node(Rect::new(0.0, 0.0, 50.0, 50.0));
    let json = serde_json::to_string(&vec![a, b, plain.clone()]).unwrap();

    let ids = editor.drop_pens(&json, pt(300.0, 300.0));

    assert_eq!(ids, vec![plain.id]);
    assert_eq!(editor.store().len(), 1);
    assert!(rect_close(world_rect(&editor, plain.id), Rect::new(275.0, 275.0, 325.0, 325.0)));
    assert_eq!(count(&events, |e| matches!(e, EditorEvent::AddPen { .. })), 1);
    assert_eq!(history.borrow().len(), 1);
}

#[test]
fn test_drop_rebuilds_children_from_parent_ids() {
    let (mut editor, _events, _history) = editor();
    let parent = Pen::node(Rect::new(0.0, 0.0, 100.0, 100.0));
    let mut child = Pen::node(Rect::new(0.0, 0.0, 0.5, 0.5));
    child.parent_id = Some(parent.id);
    // The parent does not list its child, and the child lists a pen outside the payload.
    child.children = vec![Pen::node(Rect::ZERO).id];
    let json = serde_json::to_string(&vec![child.clone(), parent.clone()]).unwrap();

    editor.drop_pens(&json, pt(50.0, 50.0));

    assert_eq!(editor.pen(parent.id).unwrap().children, vec![child.id]);
    assert!(editor.pen(child.id).unwrap().children.is_empty());
    assert_eq!(editor.store().top_level(), &[parent.id]);
    assert_eq!(editor.active(), &[parent.id]);
}

#[test]
fn test_inverted_zoom_bounds_do_not_panic() {
    let options = EditorOptions {
        min_scale: 5.0,
        max_scale: 1.0,
        ..EditorOptions::default()
    };
    let mut editor = Editor::new(options).with_clock(ManualClock::default());
    editor.on_wheel(pt(0.0, 0.0), -120.0);
    editor.on_wheel(pt(0.0, 0.0), 120.0);
    assert!((editor.store().data.scale - 1.0).abs() < 1e-9);
}

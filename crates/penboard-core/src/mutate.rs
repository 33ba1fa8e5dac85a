//! Pen and line mutation helpers.
//!
//! Every helper that touches logical geometry re-derives the affected pens'
//! world geometry before returning, so `calculative` is never stale after a
//! mutation. Translation during a drag shifts world geometry incrementally and
//! leaves the full re-derivation to the final step.

use kurbo::{Affine, Point, Rect, Vec2};

use crate::geometry::{normalize_degrees, rotate_point};
use crate::pen::{
    Anchor, AnchorId, AnchorRef, HandleSide, HandleSnapshot, LockState, Pen, PenId, PenKind, WorldAnchor,
    drag_handle,
};
use crate::store::PenStore;

/// Anchors closer than this are considered coincident.
const EPSILON: f64 = 1e-9;

/// Resolve a pen's world geometry from its logical geometry and ancestry.
fn resolve(pen: &Pen, parent: Option<(Rect, f64)>) -> (Rect, f64, Vec<WorldAnchor>) {
    match pen.kind {
        PenKind::Line => {
            let anchors = pen
                .anchors
                .iter()
                .map(|a| WorldAnchor {
                    id: a.id,
                    point: a.point(),
                    prev: a.prev,
                    next: a.next,
                })
                .collect();
            (pen.rect, 0.0, anchors)
        }
        PenKind::Node => {
            let (rect, rotate) = match parent {
                Some((outer, outer_rotate)) => {
                    let local = Rect::new(
                        outer.x0 + pen.rect.x0 * outer.width(),
                        outer.y0 + pen.rect.y0 * outer.height(),
                        outer.x0 + pen.rect.x1 * outer.width(),
                        outer.y0 + pen.rect.y1 * outer.height(),
                    );
                    let center = rotate_point(local.center(), outer_rotate, outer.center());
                    (Rect::from_center_size(center, local.size()), pen.rotate + outer_rotate)
                }
                None => (pen.rect, pen.rotate),
            };
            let center = rect.center();
            let place = |x: f64, y: f64| {
                rotate_point(
                    Point::new(rect.x0 + x * rect.width(), rect.y0 + y * rect.height()),
                    rotate,
                    center,
                )
            };
            let anchors = pen
                .anchors
                .iter()
                .map(|a| WorldAnchor {
                    id: a.id,
                    point: place(a.x, a.y),
                    prev: a.prev.map(|p| place(p.x, p.y)),
                    next: a.next.map(|p| place(p.x, p.y)),
                })
                .collect();
            (rect, rotate, anchors)
        }
    }
}

/// Re-derive world geometry for a pen, its descendants and the lines bound to them.
pub fn update_world(store: &mut PenStore, id: PenId) {
    let Some(pen) = store.get(id) else {
        return;
    };
    let parent = pen
        .parent_id
        .and_then(|p| store.get(p))
        .map(|p| (p.calculative.world_rect, p.calculative.world_rotate));
    let (world_rect, world_rotate, world_anchors) = resolve(pen, parent);
    let children = pen.children.clone();
    if let Some(pen) = store.get_mut(id) {
        pen.calculative.world_rect = world_rect;
        pen.calculative.world_rotate = world_rotate;
        pen.calculative.world_anchors = world_anchors;
        pen.calculative.dirty = true;
    }
    for child in children {
        update_world(store, child);
    }
    follow_connections(store, id);
}

/// Shift a pen's and its descendants' world geometry without re-deriving it.
fn shift_world(store: &mut PenStore, id: PenId, delta: Vec2) {
    let Some(pen) = store.get_mut(id) else {
        return;
    };
    let calc = &mut pen.calculative;
    calc.world_rect = calc.world_rect + delta;
    for anchor in &mut calc.world_anchors {
        anchor.point += delta;
        anchor.prev = anchor.prev.map(|p| p + delta);
        anchor.next = anchor.next.map(|p| p + delta);
    }
    calc.dirty = true;
    let children = pen.children.clone();
    for child in children {
        shift_world(store, child, delta);
    }
    follow_connections(store, id);
}

/// Move every line terminal bound to `id` onto the anchor it is bound to.
pub fn follow_connections(store: &mut PenStore, id: PenId) {
    let Some(pen) = store.get(id) else {
        return;
    };
    let moves: Vec<(PenId, AnchorId, Point)> = pen
        .connected_lines
        .iter()
        .filter_map(|c| {
            let target = pen.calculative.world_anchor(c.anchor)?;
            Some((c.line, c.line_anchor, target.point))
        })
        .collect();
    for (line, anchor, to) in moves {
        let Some(pen) = store.get_mut(line) else {
            continue;
        };
        let Some(anchor) = pen.anchor_mut(anchor) else {
            continue;
        };
        let delta = to - anchor.point();
        if delta.hypot() < EPSILON {
            continue;
        }
        anchor.translate(delta.x, delta.y);
        pen.fit_line_rect();
        update_world(store, line);
    }
}

/// Whether a pen may be dragged as part of a selection.
pub fn can_translate(pen: &Pen) -> bool {
    pen.locked < LockState::DisableMove
        && pen.parent_id.is_none()
        && !(pen.is_line() && pen.has_connected_terminal())
}

/// Whether a pen's geometry may be edited.
pub fn can_edit(pen: &Pen) -> bool {
    pen.locked < LockState::DisableEdit && pen.parent_id.is_none()
}

/// Translate every movable pen in `ids` by `delta`. Returns the pens moved.
///
/// While `doing` is set only world geometry is shifted; the final step of a
/// drag passes `doing = false` to re-derive everything from logical geometry.
pub fn translate_pens(store: &mut PenStore, ids: &[PenId], delta: Vec2, doing: bool) -> Vec<PenId> {
    let movable: Vec<PenId> = ids
        .iter()
        .copied()
        .filter(|id| store.get(*id).is_some_and(can_translate))
        .collect();
    for id in &movable {
        let Some(pen) = store.get_mut(*id) else {
            continue;
        };
        match pen.kind {
            PenKind::Node => pen.rect = pen.rect + delta,
            PenKind::Line => {
                for anchor in &mut pen.anchors {
                    anchor.translate(delta.x, delta.y);
                }
                pen.rect = pen.rect + delta;
            }
        }
        if doing {
            shift_world(store, *id, delta);
        } else {
            update_world(store, *id);
        }
    }
    movable
}

/// Map `point` from one rect onto another, proportionally.
fn map_point(point: Point, from: Rect, to: Rect) -> Point {
    let fx = if from.width() > 0.0 { (point.x - from.x0) / from.width() } else { 0.0 };
    let fy = if from.height() > 0.0 { (point.y - from.y0) / from.height() } else { 0.0 };
    Point::new(to.x0 + fx * to.width(), to.y0 + fy * to.height())
}

/// Re-place pens captured before a resize so they keep their fractional
/// position inside the selection as it goes from `from` to `to`.
pub fn resize_pens(store: &mut PenStore, snapshots: &[Pen], from: Rect, to: Rect) {
    for snap in snapshots {
        if !can_edit(snap) {
            continue;
        }
        let Some(pen) = store.get_mut(snap.id) else {
            continue;
        };
        match snap.kind {
            PenKind::Node => {
                let world = snap.calculative.world_rect;
                let p0 = map_point(Point::new(world.x0, world.y0), from, to);
                let p1 = map_point(Point::new(world.x1, world.y1), from, to);
                pen.rect = Rect::from_points(p0, p1);
            }
            PenKind::Line => {
                for (anchor, before) in pen.anchors.iter_mut().zip(&snap.anchors) {
                    let p = map_point(before.point(), from, to);
                    anchor.x = p.x;
                    anchor.y = p.y;
                    anchor.prev = before.prev.map(|h| map_point(h, from, to));
                    anchor.next = before.next.map(|h| map_point(h, from, to));
                }
                pen.fit_line_rect();
            }
        }
        update_world(store, snap.id);
    }
}

/// Set a node's world rotation.
pub fn rotate_pen_to(store: &mut PenStore, id: PenId, degrees: f64) {
    let Some(pen) = store.get(id) else {
        return;
    };
    if !pen.is_node() || pen.locked >= LockState::DisableEdit {
        return;
    }
    let inherited = pen.calculative.world_rotate - pen.rotate;
    if let Some(pen) = store.get_mut(id) {
        pen.rotate = normalize_degrees(degrees - inherited);
    }
    update_world(store, id);
}

/// Turn each editable pen by `delta` degrees and revolve it about `center`.
pub fn rotate_pens_by(store: &mut PenStore, ids: &[PenId], delta: f64, center: Point) {
    for id in ids {
        let Some(pen) = store.get_mut(*id) else {
            continue;
        };
        if !can_edit(pen) {
            continue;
        }
        match pen.kind {
            PenKind::Node => {
                let moved = rotate_point(pen.rect.center(), delta, center);
                pen.rect = Rect::from_center_size(moved, pen.rect.size());
                pen.rotate = normalize_degrees(pen.rotate + delta);
            }
            PenKind::Line => {
                pen.transform(Affine::rotate_about(delta.to_radians(), center));
            }
        }
        update_world(store, *id);
    }
}

/// Move a line anchor (with its handles) to `to`.
pub fn move_line_anchor(store: &mut PenStore, anchor: AnchorRef, to: Point) {
    let Some(pen) = store.get_mut(anchor.pen) else {
        return;
    };
    if !pen.is_line() {
        return;
    }
    let Some(target) = pen.anchor_mut(anchor.anchor) else {
        return;
    };
    let delta = to - target.point();
    target.translate(delta.x, delta.y);
    pen.fit_line_rect();
    update_world(store, anchor.pen);
}

/// Drag one bezier handle of a line anchor, pairing the other per its type.
pub fn drag_line_handle(
    store: &mut PenStore,
    anchor: AnchorRef,
    side: HandleSide,
    to: Point,
    snapshot: &HandleSnapshot,
) {
    let Some(pen) = store.get_mut(anchor.pen) else {
        return;
    };
    if !pen.is_line() {
        return;
    }
    let Some(target) = pen.anchor_mut(anchor.anchor) else {
        return;
    };
    drag_handle(target, side, to, snapshot);
    pen.fit_line_rect();
    update_world(store, anchor.pen);
}

/// Insert a free anchor into a line at `index`.
pub fn insert_line_anchor(store: &mut PenStore, id: PenId, index: usize, point: Point) -> Option<AnchorId> {
    insert_anchor(store, id, index, Anchor::at(point))
}

/// Insert a prepared anchor into a line at `index`.
pub fn insert_anchor(store: &mut PenStore, id: PenId, index: usize, anchor: Anchor) -> Option<AnchorId> {
    let pen = store.get_mut(id)?;
    if !pen.is_line() {
        return None;
    }
    let anchor_id = anchor.id;
    let index = index.min(pen.anchors.len());
    pen.anchors.insert(index, anchor);
    pen.fit_line_rect();
    update_world(store, id);
    Some(anchor_id)
}

/// Add an anchor to a node at a world position.
pub fn add_node_anchor(store: &mut PenStore, id: PenId, point: Point) -> Option<AnchorId> {
    let pen = store.get_mut(id)?;
    if !pen.is_node() {
        return None;
    }
    let rect = pen.calculative.world_rect;
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return None;
    }
    let local = rotate_point(point, -pen.calculative.world_rotate, rect.center());
    let anchor = Anchor::new(
        (local.x - rect.x0) / rect.width(),
        (local.y - rect.y0) / rect.height(),
    );
    let anchor_id = anchor.id;
    pen.anchors.push(anchor);
    update_world(store, id);
    Some(anchor_id)
}

/// Remove an anchor. A line keeps at least two anchors; lines bound to the
/// removed anchor are released.
pub fn remove_anchor(store: &mut PenStore, anchor: AnchorRef) -> bool {
    let Some(pen) = store.get(anchor.pen) else {
        return false;
    };
    let Some(index) = pen.anchors.iter().position(|a| a.id == anchor.anchor) else {
        return false;
    };
    if pen.is_line() && pen.anchors.len() <= 2 {
        return false;
    }
    let bound: Vec<AnchorRef> = pen
        .connected_lines
        .iter()
        .filter(|c| c.anchor == anchor.anchor)
        .map(|c| AnchorRef {
            pen: c.line,
            anchor: c.line_anchor,
        })
        .collect();
    for line in bound {
        store.disconnect(line);
    }
    store.disconnect(anchor);
    if let Some(pen) = store.get_mut(anchor.pen) {
        pen.anchors.remove(index);
        pen.fit_line_rect();
    }
    update_world(store, anchor.pen);
    true
}

/// Id of the world anchor of `pen` closest to `point`.
pub fn nearest_anchor(pen: &Pen, point: Point) -> Option<AnchorId> {
    pen.calculative
        .world_anchors
        .iter()
        .min_by(|a, b| {
            let da = (a.point - point).hypot2();
            let db = (b.point - point).hypot2();
            da.total_cmp(&db)
        })
        .map(|a| a.id)
}

/// Scale the whole document about `center`.
pub fn scale_pens(store: &mut PenStore, factor: f64, center: Point) {
    let affine = Affine::translate(center.to_vec2()) * Affine::scale(factor) * Affine::translate(-center.to_vec2());
    let top: Vec<PenId> = store.top_level().to_vec();
    for id in &top {
        if let Some(pen) = store.get_mut(*id) {
            pen.transform(affine);
        }
    }
    for id in &top {
        update_world(store, *id);
    }
}

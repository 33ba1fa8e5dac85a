//! Line drawing and single-shot anchor edits.

use kurbo::Point;

use super::Editor;
use crate::calibrate::WorldPoint;
use crate::drawing::{DrawingLine, LineInsert};
use crate::events::{EditorEvent, HistoryRecord};
use crate::hit::{HitTestResult, HoverType};
use crate::mutate;
use crate::pen::{Anchor, AnchorRef, LockState, Pen, PenId};

fn bound_anchor(at: Point, target: AnchorRef) -> Anchor {
    let mut anchor = Anchor::at(at);
    anchor.connect_to = Some(target.pen);
    anchor.anchor_id = Some(target.anchor);
    anchor
}

/// Where a drawn line's anchor lands.
struct Binding {
    anchor: Anchor,
    bound: bool,
    insert: Option<LineInsert>,
}

impl Binding {
    fn free(at: Point) -> Self {
        Self {
            anchor: Anchor::at(at),
            bound: false,
            insert: None,
        }
    }

    fn to(at: Point, target: AnchorRef) -> Self {
        Self {
            anchor: bound_anchor(at, target),
            bound: true,
            insert: None,
        }
    }
}

impl Editor {
    /// Anchor for a click on `hit`, bound to the target when there is one.
    ///
    /// Anchors bind directly. A node body binds to its nearest anchor when
    /// auto-anchoring is on. A line body binds to a new anchor at the hit
    /// point, inserted only once the drawn line is finished.
    fn bind_anchor(&self, hit: &HitTestResult, point: Point) -> Binding {
        match hit.mode {
            HoverType::NodeAnchor | HoverType::LineAnchor => {
                let Some(target) = hit.anchor else {
                    return Binding::free(point);
                };
                match self.world_anchor_point(target.pen, target.anchor) {
                    Some(at) => Binding::to(at, target),
                    None => Binding::free(point),
                }
            }
            HoverType::Node if self.store.options.auto_anchor => {
                let Some(pen) = hit.hover.and_then(|id| self.store.get(id)) else {
                    return Binding::free(point);
                };
                let Some(anchor) = mutate::nearest_anchor(pen, point) else {
                    return Binding::free(point);
                };
                let target = AnchorRef { pen: pen.id, anchor };
                match self.world_anchor_point(target.pen, target.anchor) {
                    Some(at) => Binding::to(at, target),
                    None => Binding::free(point),
                }
            }
            HoverType::Line => {
                let (Some(line), Some(at), Some(index)) = (hit.hover, hit.point_at, hit.point_index) else {
                    return Binding::free(point);
                };
                if self.store.get(line).is_none_or(|p| p.locked >= LockState::DisableEdit) {
                    return Binding::free(point);
                }
                let anchor = Anchor::at(at);
                let target = AnchorRef { pen: line, anchor: anchor.id };
                Binding {
                    insert: Some(LineInsert {
                        line,
                        index: index + 1,
                        anchor,
                    }),
                    ..Binding::to(at, target)
                }
            }
            _ => Binding::free(point),
        }
    }

    pub(super) fn start_drawing(&mut self, hit: &HitTestResult, point: Point, style: String) {
        if !self.line_styles.contains(&style) {
            log::warn!("Unknown line style: {style}");
            return;
        }
        self.select(Vec::new());
        let binding = self.bind_anchor(hit, point);
        log::debug!("drawing {style} line from {:?}", binding.anchor.point());
        let mut drawing = DrawingLine::new(binding.anchor, style);
        drawing.inserts.extend(binding.insert);
        self.drawing = Some(drawing);
        self.scheduler.mark_dirty();
    }

    /// Start a line from the node anchor under `hit`.
    pub(super) fn start_drawing_from_anchor(&mut self, hit: &HitTestResult) -> bool {
        let style = self.store.options.drawing_line_name.clone();
        let point = hit
            .anchor
            .and_then(|a| self.world_anchor_point(a.pen, a.anchor))
            .unwrap_or_default();
        self.start_drawing(hit, point, style);
        self.drawing.is_some()
    }

    /// Where the preview should end: snapped onto a hovered anchor.
    pub(super) fn preview_target(&self, hit: &HitTestResult, point: Point) -> Point {
        if !hit.mode.is_anchor() {
            return point;
        }
        hit.anchor
            .and_then(|a| self.world_anchor_point(a.pen, a.anchor))
            .unwrap_or(point)
    }

    pub(super) fn advance_drawing(&mut self, target: Point) {
        let Some(drawing) = self.drawing.as_mut() else {
            return;
        };
        match self.line_styles.get(&drawing.style) {
            Ok(style) => drawing.advance(style, target),
            Err(err) => log::warn!("{err}"),
        }
        self.scheduler.mark_dirty();
    }

    /// Commit the segment up to a click; a click that binds ends the line.
    ///
    /// Clicking the origin anchor before anything is committed discards the line.
    pub(super) fn drawing_click(&mut self, world: WorldPoint) {
        let hit = self.resolve_hover(world);
        let Some(drawing) = self.drawing.as_ref() else {
            return;
        };
        if drawing.is_empty() && hit.mode.is_anchor() && hit.anchor.is_some() && hit.anchor == drawing.origin_ref() {
            log::debug!("discarded line closed on its origin");
            self.drawing = None;
            self.scheduler.mark_dirty();
            return;
        }
        let binding = self.bind_anchor(&hit, world.point());
        self.advance_drawing(binding.anchor.point());
        if let Some(drawing) = self.drawing.as_mut() {
            if let Some(last) = drawing.preview.last_mut() {
                last.connect_to = binding.anchor.connect_to;
                last.anchor_id = binding.anchor.anchor_id;
            }
            drawing.commit_preview();
            drawing.inserts.extend(binding.insert);
        }
        if binding.bound {
            self.finish_drawing();
        }
    }

    /// End the line in progress without its preview.
    ///
    /// A line with nothing committed beyond its origin is discarded silently.
    pub fn finish_drawing(&mut self) {
        let Some(mut drawing) = self.drawing.take() else {
            return;
        };
        self.scheduler.mark_dirty();
        if drawing.is_empty() {
            log::debug!("discarded empty line");
            return;
        }
        let edited = self.apply_line_inserts(&mut drawing);
        self.push_update(edited);
        let id = self.store.add_pen(drawing.into_pen());
        let added = self.snapshot(&[id]);
        self.events.emit(&EditorEvent::AddPen { pens: vec![id] });
        self.history.push(HistoryRecord::add(added));
        self.select(vec![id]);
        log::debug!("added line {id}");
    }

    /// Add the anchors a finished line binds to on other lines' bodies.
    ///
    /// Returns the edited lines as they were before. An insert whose target
    /// is gone leaves the drawn anchor unbound.
    fn apply_line_inserts(&mut self, drawing: &mut DrawingLine) -> Vec<Pen> {
        let mut inserts = std::mem::take(&mut drawing.inserts);
        let mut targets: Vec<PenId> = Vec::new();
        for insert in &inserts {
            if !targets.contains(&insert.line) {
                targets.push(insert.line);
            }
        }
        let before = self.snapshot(&targets);
        // Later positions first so earlier indices stay valid.
        inserts.sort_by(|a, b| b.index.cmp(&a.index));
        for insert in inserts {
            let anchor = insert.anchor.id;
            if mutate::insert_anchor(&mut self.store, insert.line, insert.index, insert.anchor).is_none() {
                drawing.unbind(anchor);
            }
        }
        if !before.is_empty() {
            self.refresh_active_rect();
        }
        before
    }

    /// Pointer released after pressing on a node anchor.
    ///
    /// Releasing on another anchor connects and ends the line; releasing
    /// elsewhere after a drag ends it at that point; a plain click keeps the
    /// line open for click-to-draw.
    pub(super) fn release_drawn_line(&mut self, origin: AnchorRef, world: WorldPoint, moved: bool) {
        if self.drawing.is_none() {
            return;
        }
        let hit = self.resolve_hover(world);
        if hit.mode.is_anchor() && hit.anchor == Some(origin) {
            if moved {
                self.drawing = None;
                self.scheduler.mark_dirty();
            }
            return;
        }
        if hit.mode.is_anchor() || moved {
            self.drawing_click(world);
            self.finish_drawing();
        }
    }

    /// Remove the anchor under the pointer, or add one on the body under it.
    pub(super) fn toggle_anchor(&mut self, hit: &HitTestResult, point: Point) {
        let Some(pen) = hit.hover else {
            return;
        };
        if self.store.get(pen).is_none_or(|p| p.locked >= LockState::DisableEdit) {
            return;
        }
        let before = self.snapshot(&[pen]);
        let changed = match hit.mode {
            HoverType::NodeAnchor | HoverType::LineAnchor => {
                hit.anchor.is_some_and(|a| mutate::remove_anchor(&mut self.store, a))
            }
            HoverType::Line => match (hit.point_at, hit.point_index) {
                (Some(at), Some(index)) => mutate::insert_line_anchor(&mut self.store, pen, index + 1, at).is_some(),
                _ => false,
            },
            HoverType::Node => mutate::add_node_anchor(&mut self.store, pen, point).is_some(),
            _ => false,
        };
        if changed {
            log::debug!("edited anchors of {pen}");
            self.refresh_active_rect();
            self.refresh_hover();
            self.push_update(before);
        }
    }
}

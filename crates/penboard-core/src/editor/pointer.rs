//! Pointer down, move and up.

use kurbo::{Point, Rect, Vec2};

use super::Editor;
use crate::calibrate::{ScreenPoint, WorldPoint};
use crate::events::EditorEvent;
use crate::geometry::{calc_rotate, rect_from_corners, rect_in_rect, points_to_rect, rotated_corners};
use crate::hit::{HitContext, HoverType, hit_test};
use crate::input::{HotkeyType, Modifiers, MouseButton};
use crate::mutate;
use crate::pen::{AnchorRef, HandleSide, HandleSnapshot, LockState, Pen, PenId};
use crate::scheduler::RenderRequest;
use crate::selection::{ActiveRect, resize_rect};

/// Gesture committed by a pointer-down.
#[derive(Debug, Clone)]
pub enum Gesture {
    /// Nothing to do until the pointer is released.
    Idle,
    Translate {
        /// Offset already applied since the down.
        last_offset: Vec2,
        before: Vec<Pen>,
    },
    Resize {
        index: usize,
        initial: ActiveRect,
        before: Vec<Pen>,
    },
    Rotate {
        center: Point,
        last_angle: f64,
        before: Vec<Pen>,
    },
    LineAnchor {
        anchor: AnchorRef,
        detached: bool,
        before: Vec<Pen>,
    },
    Handle {
        anchor: AnchorRef,
        side: HandleSide,
        snapshot: HandleSnapshot,
        before: Vec<Pen>,
    },
    /// Dragging a new line out of a node anchor.
    DrawLine { origin: AnchorRef },
    Marquee,
    Pan {
        last: Point,
        total: Vec2,
        context_menu: bool,
    },
}

impl Gesture {
    pub fn name(&self) -> &'static str {
        match self {
            Gesture::Idle => "idle",
            Gesture::Translate { .. } => "translate",
            Gesture::Resize { .. } => "resize",
            Gesture::Rotate { .. } => "rotate",
            Gesture::LineAnchor { .. } => "line-anchor",
            Gesture::Handle { .. } => "handle",
            Gesture::DrawLine { .. } => "draw-line",
            Gesture::Marquee => "marquee",
            Gesture::Pan { .. } => "pan",
        }
    }
}

/// The pending pointer-down record.
#[derive(Debug, Clone)]
pub(super) struct PointerDown {
    pub screen: ScreenPoint,
    pub world: Point,
    pub moved: bool,
    pub gesture: Gesture,
}

impl Editor {
    pub fn on_pointer_down(&mut self, screen: ScreenPoint, button: MouseButton, modifiers: Modifiers) {
        if self.pinch.is_some() {
            return;
        }
        let world = self.calibrator.calibrate(screen);
        self.pointer = Some(world);
        let gesture = self.begin_gesture(screen, world, button, modifiers);
        log::debug!("pointer down: {}", gesture.name());
        self.down = Some(PointerDown {
            screen,
            world: world.point(),
            moved: false,
            gesture,
        });
        self.render(RenderRequest::Force);
    }

    pub fn on_pointer_move(&mut self, screen: ScreenPoint) {
        if self.pinch.is_some() {
            return;
        }
        let world = self.calibrator.calibrate(screen);
        self.pointer = Some(world);
        let Some(mut down) = self.down.take() else {
            let hit = self.resolve_hover(world);
            if self.drawing.is_some() {
                let target = self.preview_target(&hit, world.point());
                self.advance_drawing(target);
            }
            self.render(RenderRequest::Normal);
            return;
        };
        if screen != down.screen {
            down.moved = true;
        }
        self.drag(&mut down, screen, world);
        self.down = Some(down);
        self.render(RenderRequest::Normal);
    }

    pub fn on_pointer_up(&mut self, screen: ScreenPoint, _button: MouseButton) {
        if self.pinch.is_some() {
            return;
        }
        let Some(mut down) = self.down.take() else {
            return;
        };
        let world = self.calibrator.calibrate(screen);
        self.pointer = Some(world);
        if screen != down.screen {
            down.moved = true;
            self.drag(&mut down, screen, world);
        }
        // Panning moved the calibration; re-derive the release point.
        let world = self.calibrator.calibrate(screen);
        self.pointer = Some(world);
        self.finish_gesture(down, world);
        self.resolve_hover(world);
        self.render(RenderRequest::Force);
    }

    fn begin_gesture(
        &mut self,
        screen: ScreenPoint,
        world: WorldPoint,
        button: MouseButton,
        modifiers: Modifiers,
    ) -> Gesture {
        let pan = Gesture::Pan {
            last: self.calibrator.local(screen),
            total: Vec2::ZERO,
            context_menu: button == MouseButton::Right,
        };
        let locked = self.store.data.locked;
        if locked >= LockState::Disable {
            return pan;
        }
        match button {
            MouseButton::Right if self.drawing.is_some() => {
                self.finish_drawing();
                return Gesture::Idle;
            }
            MouseButton::Right | MouseButton::Middle => return pan,
            MouseButton::Left => {}
        }
        if self.gate == HotkeyType::Translate {
            return pan;
        }
        if self.drawing.is_some() {
            self.drawing_click(world);
            return Gesture::Idle;
        }

        let hit = self.resolve_hover(world);
        let editable = locked < LockState::DisableEdit;
        if self.gate == HotkeyType::AddAnchor {
            if editable {
                self.toggle_anchor(&hit, world.point());
            }
            return Gesture::Idle;
        }
        if let Some(style) = self.drawing_line_name.clone().filter(|_| editable) {
            self.start_drawing(&hit, world.point(), style);
            return Gesture::Idle;
        }

        let active = self.store.active().to_vec();
        match hit.mode {
            HoverType::None => {
                self.select(Vec::new());
                self.marquee = Some(Rect::from_points(world.point(), world.point()));
                Gesture::Marquee
            }
            HoverType::Resize => match (hit.resize_index, self.active_rect) {
                (Some(index), Some(initial)) if editable => Gesture::Resize {
                    index,
                    initial,
                    before: self.snapshot(&active),
                },
                _ => Gesture::Idle,
            },
            HoverType::Rotate => match self.active_rect {
                Some(rect) if editable => Gesture::Rotate {
                    center: rect.center(),
                    last_angle: calc_rotate(world.point(), rect.center()),
                    before: self.snapshot(&active),
                },
                _ => Gesture::Idle,
            },
            HoverType::NodeAnchor if editable => {
                let Some(origin) = hit.anchor else {
                    return Gesture::Idle;
                };
                if self.start_drawing_from_anchor(&hit) {
                    Gesture::DrawLine { origin }
                } else {
                    Gesture::Idle
                }
            }
            HoverType::LineAnchor if editable => {
                let Some(anchor) = hit.anchor else {
                    return Gesture::Idle;
                };
                self.select_on_down(anchor.pen, modifiers);
                if let Some(pen) = self.store.get_mut(anchor.pen) {
                    pen.calculative.active_anchor = Some(anchor.anchor);
                }
                Gesture::LineAnchor {
                    anchor,
                    detached: false,
                    before: self.snapshot(&[anchor.pen]),
                }
            }
            HoverType::LineAnchorPrev | HoverType::LineAnchorNext if editable => {
                let (Some(anchor), Some(side)) = (hit.anchor, hit.mode.handle_side()) else {
                    return Gesture::Idle;
                };
                let Some(current) = self.store.get(anchor.pen).and_then(|p| p.anchor(anchor.anchor)) else {
                    return Gesture::Idle;
                };
                let snapshot = HandleSnapshot::of(current);
                if let Some(pen) = self.store.get_mut(anchor.pen) {
                    pen.calculative.active_anchor = Some(anchor.anchor);
                }
                Gesture::Handle {
                    anchor,
                    side,
                    snapshot,
                    before: self.snapshot(&[anchor.pen]),
                }
            }
            _ => {
                // Bodies, and anchors of a document whose edits are locked.
                if let Some(pen) = hit.hover {
                    self.select_on_down(pen, modifiers);
                    if !self.store.is_active(pen) {
                        return Gesture::Idle;
                    }
                }
                if self.store.active().is_empty() || locked >= LockState::DisableMove {
                    return Gesture::Idle;
                }
                Gesture::Translate {
                    last_offset: Vec2::ZERO,
                    before: self.snapshot(self.store.active()),
                }
            }
        }
    }

    /// Update the selection for a down on `id`.
    ///
    /// Toggle (ctrl, meta or the Select gate) flips membership; alt replaces
    /// the selection unless `id` is already its sole member; shift adds; a
    /// plain down selects `id` alone unless it is already selected.
    fn select_on_down(&mut self, id: PenId, modifiers: Modifiers) {
        let mut next = self.store.active().to_vec();
        let selected = next.contains(&id);
        if modifiers.toggle() || self.gate == HotkeyType::Select {
            if selected {
                next.retain(|p| *p != id);
            } else {
                next.push(id);
            }
        } else if modifiers.alt {
            if next != [id] {
                next = vec![id];
            }
        } else if modifiers.shift {
            if !selected {
                next.push(id);
            }
        } else if !selected {
            next = vec![id];
        }
        self.select(next);
    }

    fn drag(&mut self, down: &mut PointerDown, screen: ScreenPoint, world: WorldPoint) {
        let pt = world.point();
        match &mut down.gesture {
            Gesture::Idle => {}
            Gesture::Translate { last_offset, .. } => {
                let total = pt - down.world;
                let step = total - *last_offset;
                *last_offset = total;
                let ids = self.store.active().to_vec();
                let moved = mutate::translate_pens(&mut self.store, &ids, step, true);
                if let Some(mut rect) = self.active_rect.filter(|_| !moved.is_empty()) {
                    rect.translate(step);
                    self.set_active_rect(rect);
                }
            }
            Gesture::Resize { index, initial, before } => {
                let Some(rect) = resize_rect(initial, *index, down.world, pt) else {
                    return;
                };
                mutate::resize_pens(&mut self.store, before, initial.rect, rect);
                self.set_active_rect(ActiveRect {
                    rect,
                    rotate: initial.rotate,
                });
            }
            Gesture::Rotate { center, last_angle, .. } => {
                let angle = calc_rotate(pt, *center);
                let ids = self.store.active().to_vec();
                if let [id] = ids.as_slice() {
                    mutate::rotate_pen_to(&mut self.store, *id, angle);
                    self.refresh_active_rect();
                } else {
                    let delta = angle - *last_angle;
                    mutate::rotate_pens_by(&mut self.store, &ids, delta, *center);
                    if let Some(mut rect) = self.active_rect {
                        rect.rotate += delta;
                        self.set_active_rect(rect);
                    }
                }
                *last_angle = angle;
            }
            Gesture::LineAnchor { anchor, detached, .. } => {
                if !*detached {
                    *detached = true;
                    self.store.disconnect(*anchor);
                }
                mutate::move_line_anchor(&mut self.store, *anchor, pt);
            }
            Gesture::Handle {
                anchor, side, snapshot, ..
            } => {
                mutate::drag_line_handle(&mut self.store, *anchor, *side, pt, snapshot);
            }
            Gesture::DrawLine { .. } => {
                let hit = self.resolve_hover(world);
                let target = self.preview_target(&hit, pt);
                self.advance_drawing(target);
            }
            Gesture::Marquee => {
                self.marquee = Some(rect_from_corners(down.world, pt));
                self.scheduler.mark_dirty();
            }
            Gesture::Pan { last, total, .. } => {
                let local = self.calibrator.local(screen);
                let delta = local - *last;
                *last = local;
                *total += delta;
                self.calibrator.pan_by(delta);
                self.scheduler.mark_dirty();
            }
        }
    }

    fn finish_gesture(&mut self, down: PointerDown, world: WorldPoint) {
        let moved = down.moved;
        match down.gesture {
            Gesture::Translate { mut before, .. } if moved => {
                let ids: Vec<PenId> = before.iter().map(|p| p.id).collect();
                let moved = mutate::translate_pens(&mut self.store, &ids, Vec2::ZERO, false);
                self.refresh_active_rect();
                log::debug!("translated {} pens", moved.len());
                before.retain(|p| moved.contains(&p.id));
                self.push_update(before);
            }
            Gesture::Resize { before, .. } | Gesture::Rotate { before, .. } if moved => {
                self.refresh_active_rect();
                self.push_update(before);
            }
            Gesture::LineAnchor { anchor, before, .. } if moved => {
                self.reconnect(anchor, world);
                self.refresh_active_rect();
                self.push_update(before);
            }
            Gesture::Handle { before, .. } if moved => {
                self.refresh_active_rect();
                self.push_update(before);
            }
            Gesture::DrawLine { origin } => self.release_drawn_line(origin, world, moved),
            Gesture::Marquee => {
                self.marquee = None;
                if moved {
                    let rect = rect_from_corners(down.world, world.point());
                    let inside = self.pens_inside(rect);
                    self.select(inside);
                }
                self.scheduler.mark_dirty();
            }
            Gesture::Pan { total, context_menu, .. } => {
                if moved {
                    self.events.emit(&EditorEvent::Translate { offset: total });
                } else if context_menu {
                    self.events.emit(&EditorEvent::ContextMenu { point: world.point() });
                }
            }
            _ => {}
        }
    }

    /// Bind a dragged line terminal to the anchor it was released on.
    fn reconnect(&mut self, anchor: AnchorRef, world: WorldPoint) {
        if !self.store.get(anchor.pen).is_some_and(|p| p.is_terminal(anchor.anchor)) {
            return;
        }
        let ctx = HitContext {
            exclude: Some(anchor.pen),
            ..self.hit_context()
        };
        let hit = hit_test(&ctx, world);
        let Some(target) = hit.anchor.filter(|_| hit.mode.is_anchor()) else {
            return;
        };
        let Some(point) = self.world_anchor_point(target.pen, target.anchor) else {
            return;
        };
        mutate::move_line_anchor(&mut self.store, anchor, point);
        self.store.connect(anchor, target);
        log::debug!("reconnected line {} to pen {}", anchor.pen, target.pen);
    }

    /// Top-level pens whose bounds lie entirely inside `rect`.
    fn pens_inside(&self, rect: Rect) -> Vec<PenId> {
        self.store
            .top_level()
            .iter()
            .filter_map(|id| self.store.get(*id))
            .filter(|pen| pen.visible && pen.locked < LockState::Disable)
            .filter(|pen| {
                let calc = &pen.calculative;
                points_to_rect(&rotated_corners(calc.world_rect, calc.world_rotate))
                    .is_some_and(|bounds| rect_in_rect(bounds, rect))
            })
            .map(|pen| pen.id)
            .collect()
    }

    /// Cancel the gesture in progress, settling any incremental geometry.
    pub fn cancel_gesture(&mut self) {
        if self.down.take().is_some() {
            self.marquee = None;
            self.settle_active();
            self.scheduler.mark_dirty();
        }
    }
}

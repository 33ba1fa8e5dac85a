//! Zoom, touch, keyboard and host-driven events.

use std::collections::{HashMap, HashSet};

use kurbo::{Affine, Point, Rect, Size, Vec2};

use super::Editor;
use crate::calibrate::{ScreenPoint, WorldPoint};
use crate::events::{EditorEvent, HistoryRecord};
use crate::input::{HotkeyType, InputEvent, Modifiers, MouseButton};
use crate::mutate;
use crate::pen::{Pen, PenId};
use crate::scheduler::RenderRequest;

/// A two-finger gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Pinch {
    /// Finger distance when the pinch began.
    pub distance: f64,
    /// Document scale when the pinch began.
    pub scale: f64,
}

fn touch_span(touches: &[ScreenPoint]) -> Option<(f64, ScreenPoint)> {
    match touches {
        [a, b, ..] => Some((a.0.distance(b.0), ScreenPoint(a.0.midpoint(b.0)))),
        _ => None,
    }
}

/// Make a dropped hierarchy self-contained and acyclic.
///
/// Parents outside the payload are forgotten, children are rebuilt from
/// `parent_id`, and pens whose ancestor chain loops are rejected.
fn sanitize_hierarchy(mut pens: Vec<Pen>) -> Vec<Pen> {
    let ids: HashSet<PenId> = pens.iter().map(|p| p.id).collect();
    for pen in &mut pens {
        let id = pen.id;
        pen.parent_id = pen.parent_id.filter(|p| *p != id && ids.contains(p));
    }
    let parents: HashMap<PenId, PenId> = pens.iter().filter_map(|p| Some((p.id, p.parent_id?))).collect();
    let loops = |id: PenId| {
        let mut current = Some(id);
        for _ in 0..=parents.len() {
            match current {
                Some(c) => current = parents.get(&c).copied(),
                None => return false,
            }
        }
        true
    };
    let before = pens.len();
    pens.retain(|p| !loops(p.id));
    if pens.len() < before {
        log::warn!("Rejected {} dropped pens with a cyclic parent chain", before - pens.len());
    }

    let mut children: HashMap<PenId, Vec<PenId>> = HashMap::new();
    for pen in &pens {
        if let Some(parent) = pen.parent_id {
            children.entry(parent).or_default().push(pen.id);
        }
    }
    for pen in &mut pens {
        pen.children = children.remove(&pen.id).unwrap_or_default();
    }
    pens
}

impl Editor {
    pub fn on_wheel(&mut self, screen: ScreenPoint, delta_y: f64) {
        if delta_y == 0.0 {
            return;
        }
        let step = self.store.options.scale_step;
        let scale = self.store.data.scale;
        let next = if delta_y < 0.0 { scale + step } else { scale - step };
        let center = self.calibrator.calibrate(screen);
        self.scale_to(next, center);
    }

    /// Zoom the document to `scale` about `center`, clamped to the zoom bounds.
    pub fn scale_to(&mut self, scale: f64, center: WorldPoint) {
        let scale = self.store.options.clamp_scale(scale);
        let current = self.store.data.scale;
        if (scale - current).abs() < 1e-9 || current <= 0.0 {
            return;
        }
        mutate::scale_pens(&mut self.store, scale / current, center.point());
        self.store.data.scale = scale;
        self.refresh_active_rect();
        self.refresh_hover();
        self.events.emit(&EditorEvent::Scale { scale });
        log::debug!("scale {current} -> {scale}");
        self.render(RenderRequest::Normal);
    }

    pub fn on_touch_start(&mut self, touches: &[ScreenPoint]) {
        if let Some((distance, _)) = touch_span(touches) {
            self.cancel_gesture();
            self.touch = None;
            self.pinch = Some(Pinch {
                distance,
                scale: self.store.data.scale,
            });
            return;
        }
        if let [touch] = touches {
            self.touch = Some(*touch);
            self.on_pointer_down(*touch, MouseButton::Left, Modifiers::default());
        }
    }

    pub fn on_touch_move(&mut self, touches: &[ScreenPoint]) {
        if let Some(pinch) = self.pinch {
            let Some((distance, mid)) = touch_span(touches) else {
                return;
            };
            if pinch.distance <= 0.0 {
                return;
            }
            let center = self.calibrator.calibrate(mid);
            self.scale_to(pinch.scale * distance / pinch.distance, center);
            return;
        }
        if let [touch] = touches {
            self.touch = Some(*touch);
            self.on_pointer_move(*touch);
        }
    }

    /// `touches` lists the fingers still down.
    pub fn on_touch_end(&mut self, touches: &[ScreenPoint]) {
        if self.pinch.is_some() {
            if touches.is_empty() {
                self.pinch = None;
            }
            return;
        }
        if touches.is_empty() {
            if let Some(touch) = self.touch.take() {
                self.on_pointer_up(touch, MouseButton::Left);
            }
        }
    }

    pub fn on_key_down(&mut self, key: &str) {
        if key == "Escape" {
            self.finish_drawing();
            self.cancel_gesture();
            self.render(RenderRequest::Force);
            return;
        }
        if let Some(gate) = HotkeyType::from_key(key) {
            self.set_gate(gate);
            self.render(RenderRequest::Normal);
        }
    }

    pub fn on_key_up(&mut self, key: &str) {
        if HotkeyType::from_key(key) == Some(self.gate) {
            self.set_gate(HotkeyType::None);
            self.render(RenderRequest::Normal);
        }
    }

    /// The window lost focus: drop the pending pointer-down and any gate.
    pub fn on_blur(&mut self) {
        self.cancel_gesture();
        self.pinch = None;
        self.touch = None;
        self.set_gate(HotkeyType::None);
        self.render(RenderRequest::Normal);
    }

    /// Schedule a viewport resize; only the latest request in the window applies.
    pub fn request_resize(&mut self, size: Size, now: f64) {
        self.resize_debounce.schedule(size, now);
    }

    /// Apply a due viewport resize. Returns whether one was applied.
    pub fn poll(&mut self, now: f64) -> bool {
        let Some(size) = self.resize_debounce.poll(now) else {
            return false;
        };
        log::debug!("viewport resized to {}x{}", size.width, size.height);
        self.viewport = size;
        self.render(RenderRequest::Force);
        true
    }

    /// Add pens from a JSON drop payload, centered on the drop point.
    ///
    /// Pens whose ids already exist are skipped. A malformed payload is
    /// logged and discarded, as are pens whose parent chain loops.
    pub fn drop_pens(&mut self, json: &str, at: ScreenPoint) -> Vec<PenId> {
        let pens: Vec<Pen> = match serde_json::from_str(json) {
            Ok(pens) => pens,
            Err(err) => {
                log::warn!("Discarding malformed drop payload: {err}");
                return Vec::new();
            }
        };
        let pens: Vec<Pen> = pens.into_iter().filter(|p| !self.store.contains(p.id)).collect();
        let mut pens = sanitize_hierarchy(pens);
        if pens.is_empty() {
            return Vec::new();
        }

        let bounds = pens
            .iter()
            .filter(|p| p.parent_id.is_none())
            .map(|p| p.rect)
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::ZERO);
        let target: Point = self.calibrator.calibrate(at).point();
        let offset: Vec2 = target - bounds.center();
        for pen in &mut pens {
            pen.connected_lines.clear();
            if pen.parent_id.is_none() {
                pen.transform(Affine::translate(offset));
            }
        }
        // Nodes first so line terminals find the anchors they bind to.
        pens.sort_by_key(|p| (p.is_line(), p.parent_id.is_some()));

        let ids: Vec<PenId> = pens.into_iter().map(|pen| self.store.add_pen(pen)).collect();
        let added = self.snapshot(&ids);
        self.events.emit(&EditorEvent::AddPen { pens: ids.clone() });
        self.history.push(HistoryRecord::add(added));
        let top: Vec<PenId> = ids
            .iter()
            .copied()
            .filter(|id| self.store.get(*id).is_some_and(|p| p.parent_id.is_none()))
            .collect();
        self.select(top);
        log::debug!("dropped {} pens", ids.len());
        self.render(RenderRequest::Normal);
        ids
    }

    /// An asset for `pen` finished loading.
    pub fn image_loaded(&mut self, pen: PenId) {
        let Some(pen) = self.store.get_mut(pen) else {
            return;
        };
        pen.calculative.dirty = true;
        self.render(RenderRequest::Normal);
    }

    /// Dispatch a host input event.
    pub fn handle(&mut self, event: &InputEvent) {
        match event {
            InputEvent::PointerDown {
                position,
                button,
                modifiers,
            } => self.on_pointer_down(*position, *button, *modifiers),
            InputEvent::PointerMove { position } => self.on_pointer_move(*position),
            InputEvent::PointerUp { position, button } => self.on_pointer_up(*position, *button),
            InputEvent::Wheel { position, delta_y } => self.on_wheel(*position, *delta_y),
            InputEvent::TouchStart { touches } => self.on_touch_start(touches),
            InputEvent::TouchMove { touches } => self.on_touch_move(touches),
            InputEvent::TouchEnd { touches } => self.on_touch_end(touches),
            InputEvent::KeyDown { key } => self.on_key_down(key),
            InputEvent::KeyUp { key } => self.on_key_up(key),
            InputEvent::Blur => self.on_blur(),
        }
    }
}

//! The interactive editor: pointer state machine over a pen store.
//!
//! Input arrives in screen coordinates and is calibrated once on entry. Every
//! handler mutates state, marks the scheduler dirty and then asks it to render.

mod drawing;
mod pointer;
mod view;

use kurbo::{Point, Rect, Size};

use crate::calibrate::{Calibrator, ScreenPoint, WorldPoint};
use crate::drawing::{DrawingLine, LineStyleRegistry};
use crate::error::{EditorError, EditorResult};
use crate::events::{EditorEvent, EventSink, HistoryRecord, HistorySink};
use crate::hit::{HitContext, HitTestResult, hit_test};
use crate::input::HotkeyType;
use crate::mutate;
use crate::options::EditorOptions;
use crate::pen::{AnchorId, LockState, Pen, PenId};
use crate::scheduler::{Clock, Debounce, Painter, RenderOutcome, RenderRequest, RenderScheduler, Scene, SystemClock};
use crate::selection::{ActiveRect, Cursor, SizeControlPoints, compute_active_rect, compute_size_control_points};
use crate::store::PenStore;

pub use pointer::Gesture;
use pointer::PointerDown;
use view::Pinch;

/// Pointer interaction state machine and its collaborators.
pub struct Editor {
    store: PenStore,
    calibrator: Calibrator,
    gate: HotkeyType,
    hover: HitTestResult,
    active_rect: Option<ActiveRect>,
    size_cps: Option<SizeControlPoints>,
    /// The pending pointer-down record; `None` outside a gesture.
    down: Option<PointerDown>,
    drawing: Option<DrawingLine>,
    /// Line tool selected by the host.
    drawing_line_name: Option<String>,
    line_styles: LineStyleRegistry,
    marquee: Option<Rect>,
    pointer: Option<WorldPoint>,
    pinch: Option<Pinch>,
    /// Last single-touch position, replayed as the pointer-up.
    touch: Option<ScreenPoint>,
    viewport: Size,
    resize_debounce: Debounce<Size>,
    scheduler: RenderScheduler,
    events: Box<dyn EventSink>,
    history: Box<dyn HistorySink>,
    painter: Box<dyn Painter>,
    clock: Box<dyn Clock>,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("pens", &self.store.len())
            .field("active", &self.store.active())
            .field("gate", &self.gate)
            .field("drawing", &self.drawing.is_some())
            .field("gesture", &self.down.as_ref().map(|d| d.gesture.name()))
            .finish()
    }
}

impl Editor {
    pub fn new(options: EditorOptions) -> Self {
        let interval = options.interval;
        let debounce = options.resize_debounce_ms;
        Self {
            store: PenStore::new(options),
            calibrator: Calibrator::new(),
            gate: HotkeyType::None,
            hover: HitTestResult::default(),
            active_rect: None,
            size_cps: None,
            down: None,
            drawing: None,
            drawing_line_name: None,
            line_styles: LineStyleRegistry::default(),
            marquee: None,
            pointer: None,
            pinch: None,
            touch: None,
            viewport: Size::ZERO,
            resize_debounce: Debounce::new(debounce),
            scheduler: RenderScheduler::new(interval),
            events: Box::new(()),
            history: Box::new(()),
            painter: Box::new(()),
            clock: Box::new(SystemClock::default()),
        }
    }

    pub fn with_events(mut self, events: impl EventSink + 'static) -> Self {
        self.events = Box::new(events);
        self
    }

    pub fn with_history(mut self, history: impl HistorySink + 'static) -> Self {
        self.history = Box::new(history);
        self
    }

    pub fn with_painter(mut self, painter: impl Painter + 'static) -> Self {
        self.painter = Box::new(painter);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn store(&self) -> &PenStore {
        &self.store
    }

    pub fn options(&self) -> &EditorOptions {
        &self.store.options
    }

    pub fn calibrator(&self) -> &Calibrator {
        &self.calibrator
    }

    /// Update the element origin, scroll or device pixel ratio.
    pub fn calibrator_mut(&mut self) -> &mut Calibrator {
        &mut self.calibrator
    }

    pub fn pen(&self, id: PenId) -> Option<&Pen> {
        self.store.get(id)
    }

    pub fn active(&self) -> &[PenId] {
        self.store.active()
    }

    pub fn active_rect(&self) -> Option<&ActiveRect> {
        self.active_rect.as_ref()
    }

    pub fn size_control_points(&self) -> Option<&SizeControlPoints> {
        self.size_cps.as_ref()
    }

    /// Result of the latest hover resolution.
    pub fn hover(&self) -> &HitTestResult {
        &self.hover
    }

    pub fn cursor(&self) -> Cursor {
        self.hover.cursor
    }

    pub fn gate(&self) -> HotkeyType {
        self.gate
    }

    pub fn drawing(&self) -> Option<&DrawingLine> {
        self.drawing.as_ref()
    }

    pub fn marquee(&self) -> Option<Rect> {
        self.marquee
    }

    /// Name of the gesture in progress, if a pointer is down.
    pub fn gesture(&self) -> Option<&'static str> {
        self.down.as_ref().map(|d| d.gesture.name())
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    pub fn line_styles_mut(&mut self) -> &mut LineStyleRegistry {
        &mut self.line_styles
    }

    /// Add a pen without notifying sinks, as when loading a document.
    pub fn add_pen(&mut self, pen: Pen) -> PenId {
        let id = self.store.add_pen(pen);
        self.scheduler.mark_dirty();
        id
    }

    pub fn set_locked(&mut self, locked: LockState) {
        self.store.data.locked = locked;
        self.refresh_active_rect();
        self.scheduler.mark_dirty();
    }

    /// Set the hotkey gate directly.
    pub fn set_gate(&mut self, gate: HotkeyType) {
        if self.gate == gate {
            return;
        }
        self.gate = gate;
        self.refresh_hover();
    }

    /// Select the line tool, or clear it with `None`.
    pub fn set_drawing_line(&mut self, name: Option<&str>) -> EditorResult<()> {
        match name {
            Some(name) => {
                if !self.line_styles.contains(name) {
                    log::warn!("Unknown line style: {name}");
                    return Err(EditorError::UnknownLineStyle(name.to_string()));
                }
                self.drawing_line_name = Some(name.to_string());
            }
            None => {
                self.drawing_line_name = None;
                self.finish_drawing();
            }
        }
        Ok(())
    }

    /// Replace the selection, notifying sinks of what changed.
    pub fn select(&mut self, ids: Vec<PenId>) {
        let (added, removed) = self.store.set_active(ids);
        if !removed.is_empty() {
            self.events.emit(&EditorEvent::Inactive { pens: removed.clone() });
        }
        if !added.is_empty() {
            self.events.emit(&EditorEvent::Active {
                pens: self.store.active().to_vec(),
            });
        }
        if !added.is_empty() || !removed.is_empty() {
            self.refresh_active_rect();
            self.scheduler.mark_dirty();
        }
    }

    /// Recompute the selection bounds and handle positions.
    fn refresh_active_rect(&mut self) {
        self.active_rect = compute_active_rect(&self.store, self.store.active());
        self.size_cps = self
            .active_rect
            .as_ref()
            .map(|r| compute_size_control_points(r, self.store.options.rotate_handle_offset));
    }

    fn set_active_rect(&mut self, rect: ActiveRect) {
        self.size_cps = Some(compute_size_control_points(&rect, self.store.options.rotate_handle_offset));
        self.active_rect = Some(rect);
    }

    fn hit_context(&self) -> HitContext<'_> {
        HitContext {
            store: &self.store,
            active_rect: self.active_rect.as_ref(),
            size_cps: self.size_cps.as_ref(),
            gate: self.gate,
            drawing: self.drawing.is_some(),
            exclude: None,
        }
    }

    /// Hit test without touching hover state.
    pub fn hit_test(&self, point: WorldPoint) -> HitTestResult {
        hit_test(&self.hit_context(), point)
    }

    /// Resolve hover at `point`, emitting enter/leave once per change of pen.
    fn resolve_hover(&mut self, point: WorldPoint) -> HitTestResult {
        let hit = self.hit_test(point);
        let previous = self.hover.hover;
        if hit.hover != previous {
            if let Some(old) = previous {
                if let Some(pen) = self.store.get_mut(old) {
                    pen.calculative.hover = false;
                }
                self.events.emit(&EditorEvent::Leave { pen: old });
            }
            if let Some(new) = hit.hover {
                if let Some(pen) = self.store.get_mut(new) {
                    pen.calculative.hover = true;
                }
                self.events.emit(&EditorEvent::Enter { pen: new });
            }
            self.scheduler.mark_dirty();
        } else if hit.anchor != self.hover.anchor || hit.mode != self.hover.mode {
            self.scheduler.mark_dirty();
        }
        self.hover = hit;
        hit
    }

    /// Re-resolve hover at the last known pointer position.
    fn refresh_hover(&mut self) {
        if let Some(point) = self.pointer {
            self.resolve_hover(point);
        }
    }

    fn snapshot(&self, ids: &[PenId]) -> Vec<Pen> {
        ids.iter().filter_map(|id| self.store.get(*id)).cloned().collect()
    }

    /// Record an update of the pens captured in `before`.
    fn push_update(&mut self, before: Vec<Pen>) {
        if before.is_empty() {
            return;
        }
        let ids: Vec<PenId> = before.iter().map(|p| p.id).collect();
        let after = self.snapshot(&ids);
        self.history.push(HistoryRecord::update(before, after));
    }

    /// Re-derive world geometry of the selection, dropping any incremental state.
    fn settle_active(&mut self) {
        let ids = self.store.active().to_vec();
        for id in ids {
            mutate::update_world(&mut self.store, id);
        }
        self.refresh_active_rect();
    }

    /// Hand changed pens to the painter's cache and mark the frame dirty.
    fn flush_dirty_pens(&mut self) {
        let mut any = false;
        for pen in self.store.pens_mut() {
            if pen.calculative.dirty {
                self.painter.invalidate(pen);
                pen.calculative.dirty = false;
                any = true;
            }
        }
        if any {
            self.scheduler.mark_dirty();
        }
    }

    /// Ask the scheduler to draw the current state.
    pub fn render(&mut self, request: RenderRequest) -> RenderOutcome {
        self.flush_dirty_pens();
        let now = self.clock.now_ms();
        let scene = Scene {
            store: &self.store,
            pan: self.calibrator.pan,
            active_rect: self.active_rect.as_ref(),
            size_cps: self.size_cps.as_ref(),
            drawing: self.drawing.as_ref(),
            marquee: self.marquee,
            hover: self.hover.hover,
            hover_anchor: self.hover.anchor,
        };
        self.scheduler.request(request, now, self.painter.as_mut(), &scene)
    }

    /// Animation frame callback: completes deferred renders.
    pub fn frame_tick(&mut self) -> RenderOutcome {
        self.flush_dirty_pens();
        let now = self.clock.now_ms();
        let scene = Scene {
            store: &self.store,
            pan: self.calibrator.pan,
            active_rect: self.active_rect.as_ref(),
            size_cps: self.size_cps.as_ref(),
            drawing: self.drawing.as_ref(),
            marquee: self.marquee,
            hover: self.hover.hover,
            hover_anchor: self.hover.anchor,
        };
        self.scheduler.frame_tick(now, self.painter.as_mut(), &scene)
    }

    /// Keep presenting every frame, as while an animation plays.
    pub fn set_animating(&mut self, animating: bool) {
        self.scheduler.set_animating(animating);
    }

    fn world_anchor_point(&self, pen: PenId, anchor: AnchorId) -> Option<Point> {
        self.store
            .get(pen)?
            .calculative
            .world_anchor(anchor)
            .map(|a| a.point)
    }
}

//! Render scheduling: dirty tracking, interval throttling and double buffering.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

use kurbo::{Rect, Vec2};

use crate::drawing::DrawingLine;
use crate::pen::{AnchorRef, Pen, PenId};
use crate::selection::{ActiveRect, SizeControlPoints};
use crate::store::PenStore;

/// What the painter needs to draw one frame.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub store: &'a PenStore,
    /// Pan offset applied when drawing world geometry.
    pub pan: Vec2,
    pub active_rect: Option<&'a ActiveRect>,
    pub size_cps: Option<&'a SizeControlPoints>,
    pub drawing: Option<&'a DrawingLine>,
    /// Marquee selection rect in world space.
    pub marquee: Option<Rect>,
    pub hover: Option<PenId>,
    pub hover_anchor: Option<AnchorRef>,
}

impl<'a> Scene<'a> {
    /// A scene with nothing but the document.
    pub fn new(store: &'a PenStore) -> Self {
        Self {
            store,
            pan: Vec2::ZERO,
            active_rect: None,
            size_cps: None,
            drawing: None,
            marquee: None,
            hover: None,
            hover_anchor: None,
        }
    }
}

/// Paints scenes into an offscreen buffer and presents it.
pub trait Painter {
    /// Render the whole scene into the offscreen buffer.
    fn paint_offscreen(&mut self, scene: &Scene<'_>);

    /// Copy the offscreen buffer to the visible surface.
    fn present(&mut self);

    /// Drop anything cached for `pen`; its geometry changed.
    fn invalidate(&mut self, _pen: &Pen) {}
}

/// A painter that draws nothing.
impl Painter for () {
    fn paint_offscreen(&mut self, _scene: &Scene<'_>) {}

    fn present(&mut self) {}
}

/// Shared painter; the host keeps a handle to read the surface back.
impl<P: Painter> Painter for Rc<RefCell<P>> {
    fn paint_offscreen(&mut self, scene: &Scene<'_>) {
        self.borrow_mut().paint_offscreen(scene);
    }

    fn present(&mut self) {
        self.borrow_mut().present();
    }

    fn invalidate(&mut self, pen: &Pen) {
        self.borrow_mut().invalidate(pen);
    }
}

/// Milliseconds since an arbitrary origin.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// A clock advanced by hand. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Rc<Cell<f64>>);

impl ManualClock {
    pub fn set(&self, ms: f64) {
        self.0.set(ms);
    }

    pub fn advance(&self, ms: f64) {
        self.0.set(self.0.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.0.get()
    }
}

/// Kind of render request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderRequest {
    /// Throttled by the render interval.
    Normal,
    /// Marks dirty and renders now.
    Force,
}

/// What a request or frame tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Painted offscreen and presented.
    Rendered,
    /// Presented the existing offscreen buffer only.
    Blitted,
    /// Postponed to the next frame tick.
    Deferred,
    Skipped,
}

/// Decides when the painter runs.
#[derive(Debug, Clone)]
pub struct RenderScheduler {
    /// Minimum milliseconds between two synchronous renders.
    pub interval: f64,
    last_render: Option<f64>,
    dirty: bool,
    frame_pending: bool,
    animating: bool,
}

impl RenderScheduler {
    pub fn new(interval: f64) -> Self {
        Self {
            interval,
            last_render: None,
            dirty: false,
            frame_pending: false,
            animating: false,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// A deferred render is waiting for the next frame tick.
    pub fn frame_pending(&self) -> bool {
        self.frame_pending
    }

    /// While set, every frame tick presents the offscreen buffer.
    pub fn set_animating(&mut self, animating: bool) {
        self.animating = animating;
    }

    /// Render now if allowed, otherwise defer to the next frame tick.
    pub fn request(
        &mut self,
        request: RenderRequest,
        now: f64,
        painter: &mut dyn Painter,
        scene: &Scene<'_>,
    ) -> RenderOutcome {
        if request == RenderRequest::Force {
            self.dirty = true;
            return self.render(now, painter, scene);
        }
        if !self.dirty {
            return RenderOutcome::Skipped;
        }
        if self.last_render.is_some_and(|last| now - last < self.interval) {
            log::trace!("render deferred to next frame");
            self.frame_pending = true;
            return RenderOutcome::Deferred;
        }
        self.render(now, painter, scene)
    }

    /// Animation frame callback.
    pub fn frame_tick(&mut self, now: f64, painter: &mut dyn Painter, scene: &Scene<'_>) -> RenderOutcome {
        self.frame_pending = false;
        if self.dirty {
            return self.render(now, painter, scene);
        }
        if self.animating {
            painter.present();
            return RenderOutcome::Blitted;
        }
        RenderOutcome::Skipped
    }

    fn render(&mut self, now: f64, painter: &mut dyn Painter, scene: &Scene<'_>) -> RenderOutcome {
        painter.paint_offscreen(scene);
        painter.present();
        self.dirty = false;
        self.frame_pending = false;
        self.last_render = Some(now);
        RenderOutcome::Rendered
    }
}

/// Cancel-and-restart timer: only the latest value scheduled within the
/// window is delivered.
#[derive(Debug, Clone)]
pub struct Debounce<T> {
    window: f64,
    pending: Option<(T, f64)>,
}

impl<T> Debounce<T> {
    pub fn new(window: f64) -> Self {
        Self { window, pending: None }
    }

    /// Schedule `value`, replacing anything pending.
    pub fn schedule(&mut self, value: T, now: f64) {
        self.pending = Some((value, now + self.window));
    }

    /// Take the pending value once its window has elapsed.
    pub fn poll(&mut self, now: f64) -> Option<T> {
        match &self.pending {
            Some((_, due)) if now >= *due => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

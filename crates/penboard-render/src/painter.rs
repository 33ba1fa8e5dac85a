//! Double-buffered painter over a [`Surface`].

use kurbo::{Affine, BezPath, Line, Point, Rect, Shape};
use penboard_core::geometry::rotated_corners;
use penboard_core::{Painter, Pen, Scene};

use crate::path::{PathBuilder, PathCache, StandardPathBuilder, anchor_path, pen_path};
use crate::renderer::{PaintStyle, PenRenderer, StrokeRenderer, Surface};

fn polygon(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    if let Some((first, rest)) = points.split_first() {
        path.move_to(*first);
        for p in rest {
            path.line_to(*p);
        }
        path.close_path();
    }
    path
}

/// Paints the document offscreen and blits it on present.
///
/// Pen outlines come from a [`PathCache`] that the editor invalidates
/// whenever a pen's geometry changes.
pub struct BufferedPainter<S, R = StrokeRenderer, B = StandardPathBuilder> {
    surface: S,
    renderer: R,
    cache: PathCache<B>,
    frames: usize,
}

impl<S: Surface> BufferedPainter<S> {
    pub fn new(surface: S) -> Self {
        Self::with_parts(surface, StrokeRenderer, StandardPathBuilder)
    }
}

impl<S: Surface, R: PenRenderer, B: PathBuilder> BufferedPainter<S, R, B> {
    pub fn with_parts(surface: S, renderer: R, builder: B) -> Self {
        Self {
            surface,
            renderer,
            cache: PathCache::new(builder),
            frames: 0,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn cache(&self) -> &PathCache<B> {
        &self.cache
    }

    /// Frames painted offscreen so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    fn paint_anchors(&mut self, pen: &Pen, transform: Affine, style: &PaintStyle) {
        let radius = style.anchor_radius;
        for anchor in &pen.calculative.world_anchors {
            if pen.is_line() && pen.calculative.active {
                for handle in [anchor.prev, anchor.next].into_iter().flatten() {
                    let arm = Line::new(anchor.point, handle).to_path(0.1);
                    self.surface.stroke(&(transform * arm), style.line_width, style.anchor_color);
                    self.surface.fill(&(transform * anchor_path(handle, radius / 2.0)), style.anchor_color);
                }
            }
            self.surface.fill(&(transform * anchor_path(anchor.point, radius)), style.anchor_color);
        }
    }

    fn paint_selection(&mut self, scene: &Scene<'_>, transform: Affine, style: &PaintStyle) {
        if let Some(active) = scene.active_rect {
            let outline = polygon(&rotated_corners(active.rect, active.rotate));
            self.surface.stroke(&(transform * outline), style.line_width, style.active_color);
        }
        if let Some(cps) = scene.size_cps {
            for point in cps.corners().iter().chain([cps.rotate_handle()].iter()) {
                let handle = Rect::from_center_size(*point, (style.anchor_radius * 2.0, style.anchor_radius * 2.0));
                let path = transform * handle.to_path(0.1);
                self.surface.fill(&path, style.background);
                self.surface.stroke(&path, style.line_width, style.active_color);
            }
        }
    }
}

impl<S: Surface, R: PenRenderer, B: PathBuilder> Painter for BufferedPainter<S, R, B> {
    fn paint_offscreen(&mut self, scene: &Scene<'_>) {
        let style = PaintStyle::from_options(&scene.store.options);
        let transform = Affine::translate(scene.pan);
        self.surface.clear(style.background);

        for pen in scene.store.ordered().filter(|p| p.visible) {
            let path = self.cache.get_or_build(pen);
            self.renderer.render_pen(&mut self.surface, pen, path, transform, &style);
        }
        for pen in scene.store.ordered().filter(|p| p.visible) {
            if pen.calculative.active || pen.calculative.hover {
                self.paint_anchors(pen, transform, &style);
            }
        }
        if let Some(anchor) = scene.hover_anchor {
            let point = scene
                .store
                .get(anchor.pen)
                .and_then(|p| p.calculative.world_anchor(anchor.anchor))
                .map(|a| a.point);
            if let Some(point) = point {
                let dot = transform * anchor_path(point, style.anchor_radius * 1.5);
                self.surface.fill(&dot, style.hover_color);
            }
        }
        self.paint_selection(scene, transform, &style);
        if let Some(drawing) = scene.drawing {
            let preview = pen_path(&drawing.to_preview_pen());
            self.surface.stroke(&(transform * preview), style.line_width, style.drag_color);
        }
        if let Some(marquee) = scene.marquee {
            let outline = transform * marquee.to_path(0.1);
            self.surface.stroke(&outline, style.line_width, style.active_color);
        }
        self.frames += 1;
    }

    fn present(&mut self) {
        if let Err(err) = self.surface.present() {
            log::warn!("Failed to present frame: {err}");
        }
    }

    fn invalidate(&mut self, pen: &Pen) {
        self.cache.invalidate(pen.id);
    }
}

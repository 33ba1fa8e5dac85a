//! Drawing surfaces and pen renderers.

use kurbo::{Affine, BezPath};
use peniko::Color;
use penboard_core::{EditorOptions, Pen};
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Surface error: {0}")]
    Surface(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// A drawing target with an offscreen buffer and a visible one.
///
/// Drawing calls go to the offscreen buffer; [`Surface::present`] copies it
/// to the visible buffer.
pub trait Surface {
    fn clear(&mut self, color: Color);
    fn fill(&mut self, path: &BezPath, color: Color);
    fn stroke(&mut self, path: &BezPath, width: f64, color: Color);
    fn present(&mut self) -> RenderResult<()>;
}

/// One recorded drawing call.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    Clear(Color),
    Fill { path: BezPath, color: Color },
    Stroke { path: BezPath, width: f64, color: Color },
}

/// A surface that records drawing calls as display lists.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    back: Vec<DrawCommand>,
    front: Vec<DrawCommand>,
    presents: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands drawn since the last clear, not yet presented.
    pub fn offscreen(&self) -> &[DrawCommand] {
        &self.back
    }

    /// Commands of the last presented frame.
    pub fn visible(&self) -> &[DrawCommand] {
        &self.front
    }

    pub fn presents(&self) -> usize {
        self.presents
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self, color: Color) {
        self.back.clear();
        self.back.push(DrawCommand::Clear(color));
    }

    fn fill(&mut self, path: &BezPath, color: Color) {
        self.back.push(DrawCommand::Fill {
            path: path.clone(),
            color,
        });
    }

    fn stroke(&mut self, path: &BezPath, width: f64, color: Color) {
        self.back.push(DrawCommand::Stroke {
            path: path.clone(),
            width,
            color,
        });
    }

    fn present(&mut self) -> RenderResult<()> {
        self.front.clone_from(&self.back);
        self.presents += 1;
        Ok(())
    }
}

/// Colors and sizes used to paint a frame.
#[derive(Debug, Clone, Copy)]
pub struct PaintStyle {
    pub background: Color,
    pub color: Color,
    pub active_color: Color,
    pub hover_color: Color,
    pub anchor_color: Color,
    pub drag_color: Color,
    pub anchor_radius: f64,
    pub line_width: f64,
}

impl PaintStyle {
    pub fn from_options(options: &EditorOptions) -> Self {
        Self {
            background: Color::from_rgba8(255, 255, 255, 255),
            color: options.color.into(),
            active_color: options.active_color.into(),
            hover_color: options.hover_color.into(),
            anchor_color: options.anchor_color.into(),
            drag_color: options.drag_color.into(),
            anchor_radius: options.anchor_radius,
            line_width: 1.0,
        }
    }

    /// Stroke color for a pen in its current state.
    pub fn pen_color(&self, pen: &Pen) -> Color {
        if pen.calculative.active {
            self.active_color
        } else if pen.calculative.hover {
            self.hover_color
        } else {
            self.color
        }
    }
}

/// Paints one pen's outline onto a surface.
pub trait PenRenderer {
    fn render_pen(&mut self, surface: &mut dyn Surface, pen: &Pen, path: &BezPath, transform: Affine, style: &PaintStyle);
}

/// Strokes the outline in the pen's state color.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrokeRenderer;

impl PenRenderer for StrokeRenderer {
    fn render_pen(&mut self, surface: &mut dyn Surface, pen: &Pen, path: &BezPath, transform: Affine, style: &PaintStyle) {
        surface.stroke(&(transform * path.clone()), style.line_width, style.pen_color(pen));
    }
}

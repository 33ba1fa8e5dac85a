//! Penboard Render Library
//!
//! Path generation, caching and a double-buffered painter for the penboard
//! editor. Drawing backends plug in through the [`Surface`] trait.

mod painter;
mod path;
mod renderer;

pub use painter::BufferedPainter;
pub use path::{PathBuilder, PathCache, StandardPathBuilder, anchor_path, pen_path};
pub use renderer::{
    DrawCommand, PaintStyle, PenRenderer, RecordingSurface, RenderResult, RendererError, StrokeRenderer, Surface,
};

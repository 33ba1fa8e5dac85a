//! Pen outlines and their cache.

use std::collections::HashMap;

use kurbo::{BezPath, Circle, Point, Shape};
use penboard_core::geometry::{Segment, rotated_corners};
use penboard_core::{Anchor, Pen, PenId, PenKind};

/// Flattening tolerance for circles.
const TOLERANCE: f64 = 0.1;

/// Builds the outline of a pen in world space.
pub trait PathBuilder {
    fn build(&self, pen: &Pen) -> BezPath;
}

/// Nodes as their rotated rect, lines through their anchors.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPathBuilder;

impl PathBuilder for StandardPathBuilder {
    fn build(&self, pen: &Pen) -> BezPath {
        pen_path(pen)
    }
}

/// Outline of `pen` from its resolved world geometry.
///
/// Line anchors are already in world space, so a line that was never added
/// to a store (the line being drawn) still gets its full outline.
pub fn pen_path(pen: &Pen) -> BezPath {
    match pen.kind {
        PenKind::Node => {
            let calc = &pen.calculative;
            let corners = rotated_corners(calc.world_rect, calc.world_rotate);
            let mut path = BezPath::new();
            path.move_to(corners[0]);
            for corner in &corners[1..] {
                path.line_to(*corner);
            }
            path.close_path();
            path
        }
        PenKind::Line => line_path(&pen.anchors),
    }
}

fn line_path(anchors: &[Anchor]) -> BezPath {
    let mut path = BezPath::new();
    let Some(first) = anchors.first() else {
        return path;
    };
    path.move_to(first.point());
    for pair in anchors.windows(2) {
        match Segment::between(pair[0].point(), pair[0].next, pair[1].prev, pair[1].point()) {
            Segment::Straight(line) => path.line_to(line.p1),
            Segment::Curve(cubic) => path.curve_to(cubic.p1, cubic.p2, cubic.p3),
        }
    }
    path
}

/// A dot marking an anchor or handle.
pub fn anchor_path(center: Point, radius: f64) -> BezPath {
    Circle::new(center, radius).to_path(TOLERANCE)
}

/// Cached pen outlines, rebuilt lazily after invalidation.
pub struct PathCache<B = StandardPathBuilder> {
    builder: B,
    paths: HashMap<PenId, BezPath>,
}

impl Default for PathCache {
    fn default() -> Self {
        Self::new(StandardPathBuilder)
    }
}

impl<B: PathBuilder> PathCache<B> {
    pub fn new(builder: B) -> Self {
        Self {
            builder,
            paths: HashMap::new(),
        }
    }

    /// The cached outline of `pen`, building it on a miss.
    pub fn get_or_build(&mut self, pen: &Pen) -> &BezPath {
        self.paths.entry(pen.id).or_insert_with(|| self.builder.build(pen))
    }

    pub fn invalidate(&mut self, id: PenId) {
        self.paths.remove(&id);
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    pub fn contains(&self, id: PenId) -> bool {
        self.paths.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

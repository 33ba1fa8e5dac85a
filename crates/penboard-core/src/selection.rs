//! Selection bounds, size control points and resize geometry.

use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

use crate::geometry::{points_to_rect, rect_to_points, rotate_point, rotated_corners};
use crate::pen::PenId;
use crate::store::PenStore;

/// Index of the rotate handle in [`SizeControlPoints`].
pub const ROTATE_HANDLE: usize = 8;

/// Resize handles are ignored if a step would shrink the selection below this.
pub const MIN_RESIZE: f64 = 1.0;

/// Bounding rectangle of the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveRect {
    /// Unrotated rect.
    pub rect: Rect,
    /// Rotation about the rect's center, degrees.
    pub rotate: f64,
}

impl ActiveRect {
    pub fn center(&self) -> Point {
        self.rect.center()
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.rect = self.rect + delta;
    }
}

/// Bounds of a selection.
///
/// A single pen yields its own world rect and rotation. Several pens yield the
/// axis-aligned union of their rotated bounds with rotation 0.
pub fn compute_active_rect(store: &PenStore, selection: &[PenId]) -> Option<ActiveRect> {
    match selection {
        [] => None,
        [id] => {
            let pen = store.get(*id)?;
            Some(ActiveRect {
                rect: pen.calculative.world_rect,
                rotate: pen.calculative.world_rotate,
            })
        }
        ids => {
            let corners: Vec<Point> = ids
                .iter()
                .filter_map(|id| store.get(*id))
                .flat_map(|pen| rotated_corners(pen.calculative.world_rect, pen.calculative.world_rotate))
                .collect();
            Some(ActiveRect {
                rect: points_to_rect(&corners)?,
                rotate: 0.0,
            })
        }
    }
}

/// Handle positions around an [`ActiveRect`].
///
/// `[0..4]` are the corners top-left, top-right, bottom-right, bottom-left;
/// `[4..8]` the top, right, bottom and left edge midpoints; `[8]` the rotate
/// handle above the top edge. All are rotated with the rect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeControlPoints(pub [Point; 9]);

impl SizeControlPoints {
    pub fn corners(&self) -> &[Point] {
        &self.0[0..4]
    }

    pub fn edges(&self) -> &[Point] {
        &self.0[4..8]
    }

    pub fn rotate_handle(&self) -> Point {
        self.0[ROTATE_HANDLE]
    }
}

pub fn compute_size_control_points(active: &ActiveRect, rotate_offset: f64) -> SizeControlPoints {
    let rect = active.rect;
    let center = rect.center();
    let [tl, tr, br, bl] = rect_to_points(rect);
    let points = [
        tl,
        tr,
        br,
        bl,
        tl.midpoint(tr),
        tr.midpoint(br),
        br.midpoint(bl),
        bl.midpoint(tl),
        Point::new(center.x, rect.y0 - rotate_offset),
    ];
    SizeControlPoints(points.map(|p| rotate_point(p, active.rotate, center)))
}

/// Compass direction of a resize cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResizeDirection {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

const DIRECTION_RING: [ResizeDirection; 8] = [
    ResizeDirection::N,
    ResizeDirection::NE,
    ResizeDirection::E,
    ResizeDirection::SE,
    ResizeDirection::S,
    ResizeDirection::SW,
    ResizeDirection::W,
    ResizeDirection::NW,
];

/// Ring position of each size control point, indexed like [`SizeControlPoints`].
const HANDLE_DIRECTION: [usize; 8] = [7, 1, 3, 5, 0, 2, 4, 6];

/// Cursor glyph hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cursor {
    #[default]
    Default,
    Crosshair,
    Move,
    Pointer,
    Rotate,
    Resize(ResizeDirection),
}

/// Cursor for the resize handle `index`, turned with the selection.
pub fn resize_cursor(index: usize, rotate: f64) -> Cursor {
    let base = HANDLE_DIRECTION[index % 8] as i64;
    let steps = (rotate / 45.0).round() as i64;
    let slot = (base + steps).rem_euclid(8) as usize;
    Cursor::Resize(DIRECTION_RING[slot])
}

/// New unrotated rect after dragging handle `index` from `down` to `current`.
///
/// Both pointer positions are taken into the rect's unrotated frame first, so
/// the handle follows the pointer under rotation. The handle opposite the
/// dragged one stays fixed in world space. Returns `None` if the result would
/// be narrower or shorter than [`MIN_RESIZE`].
pub fn resize_rect(initial: &ActiveRect, index: usize, down: Point, current: Point) -> Option<Rect> {
    let center = initial.center();
    let p1 = rotate_point(down, -initial.rotate, center);
    let p2 = rotate_point(current, -initial.rotate, center);
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let Rect { x0, y0, x1, y1 } = initial.rect;
    let local = match index {
        0 => Rect::new(x0 + dx, y0 + dy, x1, y1),
        1 => Rect::new(x0, y0 + dy, x1 + dx, y1),
        2 => Rect::new(x0, y0, x1 + dx, y1 + dy),
        3 => Rect::new(x0 + dx, y0, x1, y1 + dy),
        4 => Rect::new(x0, y0 + dy, x1, y1),
        5 => Rect::new(x0, y0, x1 + dx, y1),
        6 => Rect::new(x0, y0, x1, y1 + dy),
        7 => Rect::new(x0 + dx, y0, x1, y1),
        _ => return None,
    };
    if local.width() < MIN_RESIZE || local.height() < MIN_RESIZE {
        return None;
    }
    let world_center = rotate_point(local.center(), initial.rotate, center);
    Some(Rect::from_center_size(world_center, Size::new(local.width(), local.height())))
}

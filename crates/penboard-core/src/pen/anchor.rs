//! Anchors and bezier control handle policies.

use crate::geometry::rotate_point;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PenId;

/// Unique identifier for anchors.
pub type AnchorId = Uuid;

/// How moving one control handle affects the opposite one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PrevNextType {
    /// The opposite handle is the dragged one reflected through the anchor.
    #[default]
    Mirror,
    /// Handles move independently.
    Free,
    /// The opposite handle keeps its length but turns by the same angle.
    Bilateral,
}

/// Which control handle of an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleSide {
    Prev,
    Next,
}

impl HandleSide {
    pub fn opposite(self) -> Self {
        match self {
            HandleSide::Prev => HandleSide::Next,
            HandleSide::Next => HandleSide::Prev,
        }
    }
}

/// A point attached to a pen.
///
/// Node anchors are normalized to the node rect (0..1). Line anchors are in world
/// coordinates, and so are their `prev`/`next` control points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub id: AnchorId,
    pub x: f64,
    pub y: f64,
    /// Incoming bezier control point.
    #[serde(default)]
    pub prev: Option<Point>,
    /// Outgoing bezier control point.
    #[serde(default)]
    pub next: Option<Point>,
    #[serde(default)]
    pub prev_next_type: PrevNextType,
    /// Pen this anchor is bound to (line terminals only).
    #[serde(default)]
    pub connect_to: Option<PenId>,
    /// Anchor on `connect_to` this anchor is bound to.
    #[serde(default)]
    pub anchor_id: Option<AnchorId>,
}

impl Anchor {
    /// Create an unbound anchor without handles.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            x,
            y,
            prev: None,
            next: None,
            prev_next_type: PrevNextType::default(),
            connect_to: None,
            anchor_id: None,
        }
    }

    /// Create an anchor at a point.
    pub fn at(point: Point) -> Self {
        Self::new(point.x, point.y)
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn handle(&self, side: HandleSide) -> Option<Point> {
        match side {
            HandleSide::Prev => self.prev,
            HandleSide::Next => self.next,
        }
    }

    pub fn set_handle(&mut self, side: HandleSide, value: Option<Point>) {
        match side {
            HandleSide::Prev => self.prev = value,
            HandleSide::Next => self.next = value,
        }
    }

    /// Whether this anchor is bound to another pen.
    pub fn is_connected(&self) -> bool {
        self.connect_to.is_some()
    }

    pub fn disconnect(&mut self) {
        self.connect_to = None;
        self.anchor_id = None;
    }

    /// Move the anchor and both of its handles by a delta.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
        let shift = kurbo::Vec2::new(dx, dy);
        self.prev = self.prev.map(|p| p + shift);
        self.next = self.next.map(|p| p + shift);
    }
}

/// Identifies an anchor on a specific pen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnchorRef {
    pub pen: PenId,
    pub anchor: AnchorId,
}

/// Handle positions captured when a handle drag begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleSnapshot {
    pub prev: Option<Point>,
    pub next: Option<Point>,
}

impl HandleSnapshot {
    pub fn of(anchor: &Anchor) -> Self {
        Self {
            prev: anchor.prev,
            next: anchor.next,
        }
    }

    fn get(&self, side: HandleSide) -> Option<Point> {
        match side {
            HandleSide::Prev => self.prev,
            HandleSide::Next => self.next,
        }
    }
}

/// Move one control handle of `anchor` to `target` and update the opposite handle
/// according to the anchor's [`PrevNextType`].
///
/// `snapshot` holds both handles as they were when the drag started; bilateral
/// pairing measures the angle turned since then, not since the last sample.
pub fn drag_handle(anchor: &mut Anchor, side: HandleSide, target: Point, snapshot: &HandleSnapshot) {
    let center = anchor.point();
    anchor.set_handle(side, Some(target));
    let opposite = side.opposite();
    match anchor.prev_next_type {
        PrevNextType::Mirror => {
            let mirrored = Point::new(2.0 * center.x - target.x, 2.0 * center.y - target.y);
            anchor.set_handle(opposite, Some(mirrored));
        }
        PrevNextType::Bilateral => {
            let (Some(start), Some(other)) = (snapshot.get(side), snapshot.get(opposite)) else {
                return;
            };
            let before = (start - center).atan2();
            let after = (target - center).atan2();
            let delta = (after - before).to_degrees();
            anchor.set_handle(opposite, Some(rotate_point(other, delta, center)));
        }
        PrevNextType::Free => {}
    }
}

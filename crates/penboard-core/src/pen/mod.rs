//! Pen definitions: nodes and lines.

mod anchor;

pub use anchor::{Anchor, AnchorId, AnchorRef, HandleSide, HandleSnapshot, PrevNextType, drag_handle};

use crate::geometry::{Segment, points_to_rect};
use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for pens.
pub type PenId = Uuid;

/// Lock levels, ordered from least to most restrictive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash, Serialize, Deserialize)]
pub enum LockState {
    #[default]
    None,
    /// No resize, rotate, anchor edits or line drawing.
    DisableEdit,
    /// Additionally no translation.
    DisableMove,
    /// Additionally no selection.
    Disable,
}

/// Whether a pen is a rectangular node or an anchor sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PenKind {
    Node,
    Line,
}

/// A line bound to one of a node's anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedLine {
    /// The bound line.
    pub line: PenId,
    /// The line's terminal anchor.
    pub line_anchor: AnchorId,
    /// The anchor on this pen it is bound to.
    pub anchor: AnchorId,
}

/// An anchor resolved into world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldAnchor {
    pub id: AnchorId,
    pub point: Point,
    pub prev: Option<Point>,
    pub next: Option<Point>,
}

/// Transient render-time state, recomputed from the logical geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Calculative {
    /// Unrotated world rect.
    pub world_rect: Rect,
    /// Rotation in world space (own plus ancestors), degrees.
    pub world_rotate: f64,
    pub world_anchors: Vec<WorldAnchor>,
    pub active: bool,
    pub hover: bool,
    pub active_anchor: Option<AnchorId>,
    /// Geometry changed since the render path was last built.
    pub dirty: bool,
}

impl Calculative {
    pub fn world_anchor(&self, id: AnchorId) -> Option<&WorldAnchor> {
        self.world_anchors.iter().find(|a| a.id == id)
    }
}

/// A visual element on the canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pen {
    pub id: PenId,
    pub kind: PenKind,
    /// Logical rect. World units for top-level nodes, normalized 0..1 of the
    /// parent's world rect for children. Derived from anchors for lines.
    pub rect: Rect,
    /// Rotation in degrees (nodes only).
    #[serde(default)]
    pub rotate: f64,
    #[serde(default)]
    pub locked: LockState,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub parent_id: Option<PenId>,
    #[serde(default)]
    pub children: Vec<PenId>,
    #[serde(default)]
    pub anchors: Vec<Anchor>,
    #[serde(default)]
    pub connected_lines: Vec<ConnectedLine>,
    /// Drawing style tag for lines (see the line style registry).
    #[serde(default)]
    pub line_style: Option<String>,
    #[serde(skip)]
    pub calculative: Calculative,
}

fn default_visible() -> bool {
    true
}

impl Pen {
    /// Create a node with the four default edge-midpoint anchors.
    pub fn node(rect: Rect) -> Self {
        let anchors = [(0.5, 0.0), (1.0, 0.5), (0.5, 1.0), (0.0, 0.5)]
            .into_iter()
            .map(|(x, y)| Anchor::new(x, y))
            .collect();
        Self {
            id: Uuid::new_v4(),
            kind: PenKind::Node,
            rect,
            rotate: 0.0,
            locked: LockState::None,
            visible: true,
            parent_id: None,
            children: Vec::new(),
            anchors,
            connected_lines: Vec::new(),
            line_style: None,
            calculative: Calculative::default(),
        }
    }

    /// Create a line through the given world anchors.
    pub fn line(anchors: Vec<Anchor>) -> Self {
        let mut pen = Self {
            id: Uuid::new_v4(),
            kind: PenKind::Line,
            rect: Rect::ZERO,
            rotate: 0.0,
            locked: LockState::None,
            visible: true,
            parent_id: None,
            children: Vec::new(),
            anchors,
            connected_lines: Vec::new(),
            line_style: None,
            calculative: Calculative::default(),
        };
        pen.fit_line_rect();
        pen
    }

    pub fn is_line(&self) -> bool {
        self.kind == PenKind::Line
    }

    pub fn is_node(&self) -> bool {
        self.kind == PenKind::Node
    }

    /// The "from" terminal of a line.
    pub fn from_anchor(&self) -> Option<&Anchor> {
        if self.is_line() { self.anchors.first() } else { None }
    }

    /// The "to" terminal of a line.
    pub fn to_anchor(&self) -> Option<&Anchor> {
        if self.is_line() && self.anchors.len() > 1 { self.anchors.last() } else { None }
    }

    /// Whether `id` is the first or last anchor of this line.
    pub fn is_terminal(&self, id: AnchorId) -> bool {
        self.from_anchor().is_some_and(|a| a.id == id) || self.to_anchor().is_some_and(|a| a.id == id)
    }

    /// Whether either terminal of this line is bound to another pen.
    pub fn has_connected_terminal(&self) -> bool {
        self.from_anchor().is_some_and(Anchor::is_connected) || self.to_anchor().is_some_and(Anchor::is_connected)
    }

    pub fn anchor(&self, id: AnchorId) -> Option<&Anchor> {
        self.anchors.iter().find(|a| a.id == id)
    }

    pub fn anchor_mut(&mut self, id: AnchorId) -> Option<&mut Anchor> {
        self.anchors.iter_mut().find(|a| a.id == id)
    }

    /// Recompute a line's logical rect from its anchors and handles.
    pub fn fit_line_rect(&mut self) {
        if !self.is_line() {
            return;
        }
        let points: Vec<Point> = self
            .anchors
            .iter()
            .flat_map(|a| std::iter::once(a.point()).chain(a.prev).chain(a.next))
            .collect();
        if let Some(rect) = points_to_rect(&points) {
            self.rect = rect;
        }
    }

    /// Drawable segments of a line, from its world anchors.
    pub fn segments(&self) -> Vec<Segment> {
        self.calculative
            .world_anchors
            .windows(2)
            .map(|w| Segment::between(w[0].point, w[0].next, w[1].prev, w[1].point))
            .collect()
    }

    /// Apply a transform to a top-level pen's logical geometry.
    ///
    /// Children are normalized to their parent and follow automatically.
    pub fn transform(&mut self, affine: Affine) {
        match self.kind {
            PenKind::Node => {
                if self.parent_id.is_none() {
                    let center = affine * self.rect.center();
                    let coeffs = affine.as_coeffs();
                    let sx = (coeffs[0] * coeffs[0] + coeffs[1] * coeffs[1]).sqrt();
                    let sy = (coeffs[2] * coeffs[2] + coeffs[3] * coeffs[3]).sqrt();
                    let size = kurbo::Size::new(self.rect.width() * sx, self.rect.height() * sy);
                    self.rect = Rect::from_center_size(center, size);
                }
            }
            PenKind::Line => {
                for anchor in &mut self.anchors {
                    let p = affine * anchor.point();
                    anchor.x = p.x;
                    anchor.y = p.y;
                    anchor.prev = anchor.prev.map(|h| affine * h);
                    anchor.next = anchor.next.map(|h| affine * h);
                }
                self.fit_line_rect();
            }
        }
    }
}

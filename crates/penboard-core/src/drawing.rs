//! Line drawing: style strategies and the line under construction.

use std::collections::HashMap;

use kurbo::Point;

use crate::error::{EditorError, EditorResult};
use crate::pen::{Anchor, AnchorId, AnchorRef, Pen, PenId};

/// How a line under construction advances toward the pointer.
pub trait LineStyle {
    /// Preview anchors leading from `last` to `to`, ending at `to`.
    ///
    /// May adjust the outgoing handle of `last`.
    fn advance(&self, last: &mut Anchor, to: Point) -> Vec<Anchor>;
}

/// Straight segments.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightStyle;

impl LineStyle for StraightStyle {
    fn advance(&self, last: &mut Anchor, to: Point) -> Vec<Anchor> {
        last.next = None;
        vec![Anchor::at(to)]
    }
}

/// Orthogonal segments with one elbow.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolylineStyle;

impl LineStyle for PolylineStyle {
    fn advance(&self, last: &mut Anchor, to: Point) -> Vec<Anchor> {
        last.next = None;
        let from = last.point();
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        if dx == 0.0 || dy == 0.0 {
            return vec![Anchor::at(to)];
        }
        let elbow = if dx.abs() >= dy.abs() {
            Point::new(to.x, from.y)
        } else {
            Point::new(from.x, to.y)
        };
        vec![Anchor::at(elbow), Anchor::at(to)]
    }
}

/// Cubic segments whose tangents follow the dominant axis.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurveStyle;

impl LineStyle for CurveStyle {
    fn advance(&self, last: &mut Anchor, to: Point) -> Vec<Anchor> {
        let from = last.point();
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let mut end = Anchor::at(to);
        if dx.abs() >= dy.abs() {
            last.next = Some(Point::new(from.x + dx / 2.0, from.y));
            end.prev = Some(Point::new(to.x - dx / 2.0, to.y));
        } else {
            last.next = Some(Point::new(from.x, from.y + dy / 2.0));
            end.prev = Some(Point::new(to.x, to.y - dy / 2.0));
        }
        vec![end]
    }
}

/// Line styles by tag.
pub struct LineStyleRegistry {
    styles: HashMap<String, Box<dyn LineStyle>>,
}

impl Default for LineStyleRegistry {
    fn default() -> Self {
        let mut registry = Self { styles: HashMap::new() };
        registry.register("line", StraightStyle);
        registry.register("polyline", PolylineStyle);
        registry.register("curve", CurveStyle);
        registry
    }
}

impl std::fmt::Debug for LineStyleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.styles.keys().collect();
        names.sort();
        f.debug_struct("LineStyleRegistry").field("styles", &names).finish()
    }
}

impl LineStyleRegistry {
    pub fn register(&mut self, name: impl Into<String>, style: impl LineStyle + 'static) {
        self.styles.insert(name.into(), Box::new(style));
    }

    pub fn get(&self, name: &str) -> EditorResult<&dyn LineStyle> {
        self.styles
            .get(name)
            .map(|s| s.as_ref())
            .ok_or_else(|| EditorError::UnknownLineStyle(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.styles.contains_key(name)
    }
}

/// A line under construction.
///
/// The origin is where drawing started; `committed` anchors were fixed by
/// clicks; `preview` follows the pointer and is replaced on every move.
#[derive(Debug, Clone)]
pub struct DrawingLine {
    pub id: PenId,
    pub style: String,
    pub origin: Anchor,
    pub committed: Vec<Anchor>,
    pub preview: Vec<Anchor>,
    /// Anchors to add to other lines if this one is kept.
    pub inserts: Vec<LineInsert>,
}

/// An anchor the drawn line binds to on another line's body.
///
/// It is only inserted into the target when the drawn line is finished.
#[derive(Debug, Clone, PartialEq)]
pub struct LineInsert {
    pub line: PenId,
    /// Position in the target's anchor list as it was when hit.
    pub index: usize,
    pub anchor: Anchor,
}

impl DrawingLine {
    pub fn new(origin: Anchor, style: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            style: style.into(),
            origin,
            committed: Vec::new(),
            preview: Vec::new(),
            inserts: Vec::new(),
        }
    }

    /// The anchor the line starts on, when it starts bound.
    pub fn origin_ref(&self) -> Option<AnchorRef> {
        Some(AnchorRef {
            pen: self.origin.connect_to?,
            anchor: self.origin.anchor_id?,
        })
    }

    /// Release every anchor bound to `target`.
    pub fn unbind(&mut self, target: AnchorId) {
        for anchor in std::iter::once(&mut self.origin).chain(&mut self.committed) {
            if anchor.anchor_id == Some(target) {
                anchor.disconnect();
            }
        }
    }

    /// The anchor the next segment starts from.
    pub fn last_mut(&mut self) -> &mut Anchor {
        self.committed.last_mut().unwrap_or(&mut self.origin)
    }

    pub fn last_point(&self) -> Point {
        self.committed.last().unwrap_or(&self.origin).point()
    }

    /// Recompute the preview toward `to`.
    pub fn advance(&mut self, style: &dyn LineStyle, to: Point) {
        let preview = style.advance(self.last_mut(), to);
        self.preview = preview;
    }

    /// Fix the preview as committed anchors.
    pub fn commit_preview(&mut self) {
        self.committed.append(&mut self.preview);
    }

    /// Whether anything beyond the origin has been committed.
    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    /// All anchors, origin through preview.
    pub fn anchors(&self) -> impl Iterator<Item = &Anchor> {
        std::iter::once(&self.origin).chain(&self.committed).chain(&self.preview)
    }

    /// A pen for painting the line in progress, preview included.
    pub fn to_preview_pen(&self) -> Pen {
        let mut pen = Pen::line(self.anchors().cloned().collect());
        pen.id = self.id;
        pen.line_style = Some(self.style.clone());
        pen
    }

    /// The finished pen: origin and committed anchors only.
    pub fn into_pen(self) -> Pen {
        let mut anchors = Vec::with_capacity(self.committed.len() + 1);
        anchors.push(self.origin);
        anchors.extend(self.committed);
        if let Some(last) = anchors.last_mut() {
            last.next = None;
        }
        let mut pen = Pen::line(anchors);
        pen.id = self.id;
        pen.line_style = Some(self.style);
        pen
    }
}

//! Hit-test resolver: what is under the pointer.

use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::calibrate::WorldPoint;
use crate::geometry::{hit_point, point_in_line, point_in_rect};
use crate::input::HotkeyType;
use crate::mutate::can_edit;
use crate::pen::{AnchorId, AnchorRef, HandleSide, LockState, Pen, PenId};
use crate::selection::{ActiveRect, Cursor, SizeControlPoints, resize_cursor};
use crate::store::PenStore;

/// Classification of the target under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HoverType {
    #[default]
    None,
    Line,
    Node,
    NodeAnchor,
    LineAnchor,
    LineAnchorPrev,
    LineAnchorNext,
    Resize,
    Rotate,
}

impl HoverType {
    /// The bezier handle this hover refers to, if any.
    pub fn handle_side(self) -> Option<HandleSide> {
        match self {
            HoverType::LineAnchorPrev => Some(HandleSide::Prev),
            HoverType::LineAnchorNext => Some(HandleSide::Next),
            _ => None,
        }
    }

    pub fn is_anchor(self) -> bool {
        matches!(self, HoverType::NodeAnchor | HoverType::LineAnchor)
    }
}

/// Outcome of one hit test.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HitTestResult {
    pub mode: HoverType,
    /// Pen under the pointer. `None` for handles and the selection fallback.
    pub hover: Option<PenId>,
    /// Anchor under the pointer, for anchor and handle hits.
    pub anchor: Option<AnchorRef>,
    /// Nearest point on a hit line.
    pub point_at: Option<Point>,
    /// Segment index of `point_at`; an inserted anchor goes at `point_index + 1`.
    pub point_index: Option<usize>,
    /// Size control point index for `Resize` hits.
    pub resize_index: Option<usize>,
    pub cursor: Cursor,
}

/// Everything the resolver reads.
#[derive(Debug, Clone, Copy)]
pub struct HitContext<'a> {
    pub store: &'a PenStore,
    pub active_rect: Option<&'a ActiveRect>,
    pub size_cps: Option<&'a SizeControlPoints>,
    pub gate: HotkeyType,
    /// A line is being drawn.
    pub drawing: bool,
    /// Pen to ignore, such as a line whose own terminal is being dragged.
    pub exclude: Option<PenId>,
}

impl<'a> HitContext<'a> {
    pub fn new(store: &'a PenStore) -> Self {
        Self {
            store,
            active_rect: None,
            size_cps: None,
            gate: HotkeyType::None,
            drawing: false,
            exclude: None,
        }
    }
}

/// Resolve the topmost eligible target at `point`.
///
/// Priority: rotate handle, corner handles, edge handles (Resize gate only),
/// anchors of every pen topmost first, pen bodies topmost first, then the
/// inside of the selection.
pub fn hit_test(ctx: &HitContext<'_>, point: WorldPoint) -> HitTestResult {
    let pt = point.point();
    let store = ctx.store;
    if store.data.locked >= LockState::Disable {
        return HitTestResult::default();
    }
    let size = store.options.point_size;
    let active_line = store.single_active().is_some_and(Pen::is_line);

    if let (Some(active), Some(cps)) = (ctx.active_rect, ctx.size_cps) {
        let eligible = !ctx.drawing
            && !active_line
            && ctx.gate != HotkeyType::AddAnchor
            && store.data.locked == LockState::None
            && store.active_lock() < LockState::DisableEdit
            && store.active().iter().filter_map(|id| store.get(*id)).any(can_edit);
        if eligible {
            if !store.options.disable_rotate && ctx.gate == HotkeyType::None && hit_point(pt, cps.rotate_handle(), size) {
                return HitTestResult {
                    mode: HoverType::Rotate,
                    cursor: Cursor::Rotate,
                    ..HitTestResult::default()
                };
            }
            let corners = matches!(ctx.gate, HotkeyType::None | HotkeyType::Resize);
            let edges = ctx.gate == HotkeyType::Resize;
            let indices = (0..4).filter(|_| corners).chain((4..8).filter(|_| edges));
            for i in indices {
                if hit_point(pt, cps.0[i], size) {
                    return HitTestResult {
                        mode: HoverType::Resize,
                        resize_index: Some(i),
                        cursor: resize_cursor(i, active.rotate),
                        ..HitTestResult::default()
                    };
                }
            }
        }
    }

    let order: Vec<&Pen> = store
        .draw_order()
        .into_iter()
        .rev()
        .filter(|id| Some(*id) != ctx.exclude)
        .filter_map(|id| store.get(id))
        .filter(|pen| pen.visible && pen.locked < LockState::Disable)
        .collect();

    for pen in &order {
        if let Some(hit) = hit_anchors(pen, pt, size) {
            return hit;
        }
    }
    for pen in &order {
        if let Some(hit) = hit_body(pen, pt, size, store.options.hover_cursor) {
            return hit;
        }
    }

    let in_selection = ctx
        .active_rect
        .is_some_and(|active| !active_line && point_in_rect(pt, active.rect, active.rotate));
    if in_selection {
        return HitTestResult {
            mode: HoverType::Node,
            cursor: Cursor::Move,
            ..HitTestResult::default()
        };
    }

    let cursor = if ctx.drawing {
        Cursor::Crosshair
    } else if ctx.gate == HotkeyType::AddAnchor {
        Cursor::Pointer
    } else {
        Cursor::Default
    };
    HitTestResult {
        cursor,
        ..HitTestResult::default()
    }
}

fn anchor_hit(pen: &Pen, anchor: AnchorId, mode: HoverType, cursor: Cursor) -> HitTestResult {
    HitTestResult {
        mode,
        hover: Some(pen.id),
        anchor: Some(AnchorRef { pen: pen.id, anchor }),
        cursor,
        ..HitTestResult::default()
    }
}

fn hit_anchors(pen: &Pen, pt: Point, size: f64) -> Option<HitTestResult> {
    if pen.locked >= LockState::DisableEdit {
        return None;
    }
    let anchors = &pen.calculative.world_anchors;
    if pen.is_node() {
        return anchors
            .iter()
            .find(|a| hit_point(pt, a.point, size))
            .map(|a| anchor_hit(pen, a.id, HoverType::NodeAnchor, Cursor::Crosshair));
    }
    if pen.calculative.active {
        for a in anchors {
            if a.prev.is_some_and(|p| hit_point(pt, p, size)) {
                return Some(anchor_hit(pen, a.id, HoverType::LineAnchorPrev, Cursor::Pointer));
            }
            if a.next.is_some_and(|p| hit_point(pt, p, size)) {
                return Some(anchor_hit(pen, a.id, HoverType::LineAnchorNext, Cursor::Pointer));
            }
        }
    }
    // Terminals first, then the anchors in between.
    let count = anchors.len();
    let terminals = anchors.first().into_iter().chain(anchors.last().filter(|_| count > 1));
    let middle = anchors.iter().take(count.saturating_sub(1)).skip(1);
    terminals
        .chain(middle)
        .find(|a| hit_point(pt, a.point, size))
        .map(|a| anchor_hit(pen, a.id, HoverType::LineAnchor, Cursor::Pointer))
}

fn hit_body(pen: &Pen, pt: Point, size: f64, hover_cursor: Cursor) -> Option<HitTestResult> {
    if pen.is_line() {
        let hit = point_in_line(pt, &pen.segments(), size)?;
        return Some(HitTestResult {
            mode: HoverType::Line,
            hover: Some(pen.id),
            point_at: Some(hit.point),
            point_index: Some(hit.index),
            cursor: hover_cursor,
            ..HitTestResult::default()
        });
    }
    let calc = &pen.calculative;
    point_in_rect(pt, calc.world_rect, calc.world_rotate).then(|| HitTestResult {
        mode: HoverType::Node,
        hover: Some(pen.id),
        cursor: hover_cursor,
        ..HitTestResult::default()
    })
}

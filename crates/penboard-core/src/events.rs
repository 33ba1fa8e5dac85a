//! Notifications and history records emitted by the editor.

use std::cell::RefCell;
use std::rc::Rc;

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

use crate::pen::{Pen, PenId};

/// Named editor notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum EditorEvent {
    /// Pens became part of the selection.
    Active { pens: Vec<PenId> },
    /// Pens left the selection.
    Inactive { pens: Vec<PenId> },
    /// The pointer entered a pen.
    Enter { pen: PenId },
    /// The pointer left a pen.
    Leave { pen: PenId },
    /// Pens were added to the document.
    AddPen { pens: Vec<PenId> },
    /// The view was panned by `offset`.
    Translate { offset: Vec2 },
    /// The view scale changed.
    Scale { scale: f64 },
    /// A secondary click without a drag, in world coordinates.
    ContextMenu { point: Point },
}

/// Receives editor notifications.
pub trait EventSink {
    fn emit(&mut self, event: &EditorEvent);
}

impl EventSink for () {
    fn emit(&mut self, _event: &EditorEvent) {}
}

impl EventSink for Vec<EditorEvent> {
    fn emit(&mut self, event: &EditorEvent) {
        self.push(event.clone());
    }
}

impl<S: EventSink> EventSink for Rc<RefCell<S>> {
    fn emit(&mut self, event: &EditorEvent) {
        self.borrow_mut().emit(event);
    }
}

/// Kind of a committed edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryKind {
    Add,
    Update,
}

/// One committed structural edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub kind: HistoryKind,
    /// Pens after the edit.
    pub pens: Vec<Pen>,
    /// Pens before the edit (`Update` only).
    #[serde(default)]
    pub initial: Vec<Pen>,
}

impl HistoryRecord {
    pub fn add(pens: Vec<Pen>) -> Self {
        Self {
            kind: HistoryKind::Add,
            pens,
            initial: Vec::new(),
        }
    }

    pub fn update(initial: Vec<Pen>, pens: Vec<Pen>) -> Self {
        Self {
            kind: HistoryKind::Update,
            pens,
            initial,
        }
    }
}

/// Append-only log of committed edits.
pub trait HistorySink {
    fn push(&mut self, record: HistoryRecord);
}

impl HistorySink for () {
    fn push(&mut self, _record: HistoryRecord) {}
}

impl HistorySink for Vec<HistoryRecord> {
    fn push(&mut self, record: HistoryRecord) {
        Vec::push(self, record);
    }
}

impl<S: HistorySink> HistorySink for Rc<RefCell<S>> {
    fn push(&mut self, record: HistoryRecord) {
        self.borrow_mut().push(record);
    }
}

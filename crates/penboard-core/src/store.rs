//! The pen store: arena of pens, z-order, selection and document data.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::mutate;
use crate::options::EditorOptions;
use crate::pen::{AnchorRef, ConnectedLine, LockState, Pen, PenId};

/// Document-wide state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocumentData {
    /// Current zoom, baked into world geometry.
    pub scale: f64,
    /// Document lock level.
    pub locked: LockState,
}

impl Default for DocumentData {
    fn default() -> Self {
        Self {
            scale: 1.0,
            locked: LockState::None,
        }
    }
}

/// Owning collection of pens.
///
/// Top-level pens are kept in `z_order` (back to front); children are listed
/// by their parent and drawn right after it.
#[derive(Debug, Clone, Default)]
pub struct PenStore {
    pens: HashMap<PenId, Pen>,
    z_order: Vec<PenId>,
    active: Vec<PenId>,
    pub data: DocumentData,
    pub options: EditorOptions,
}

impl PenStore {
    pub fn new(options: EditorOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Add a pen, register its terminal connections and resolve its world geometry.
    ///
    /// A pen naming an unknown parent is added at the top level.
    pub fn add_pen(&mut self, mut pen: Pen) -> PenId {
        let id = pen.id;
        let parent = pen.parent_id.filter(|p| self.pens.contains_key(p));
        pen.parent_id = parent;
        pen.calculative.dirty = true;
        match parent.and_then(|p| self.pens.get_mut(&p)) {
            Some(parent) => {
                if !parent.children.contains(&id) {
                    parent.children.push(id);
                }
            }
            None => self.z_order.push(id),
        }
        let terminals: Vec<(AnchorRef, AnchorRef)> = pen
            .from_anchor()
            .into_iter()
            .chain(pen.to_anchor())
            .filter_map(|a| {
                let target = AnchorRef {
                    pen: a.connect_to?,
                    anchor: a.anchor_id?,
                };
                Some((AnchorRef { pen: id, anchor: a.id }, target))
            })
            .collect();
        // Children listed by a pen that has not been added yet are re-linked as they arrive.
        pen.children.retain(|c| self.can_adopt(*c, id, parent));
        let children = pen.children.clone();
        self.pens.insert(id, pen);
        for child in children {
            self.z_order.retain(|c| *c != child);
            if let Some(child) = self.pens.get_mut(&child) {
                child.parent_id = Some(id);
            }
        }
        for (line, target) in terminals {
            self.connect(line, target);
        }
        mutate::update_world(self, id);
        id
    }

    /// Whether the pen being added as `id` under `parent` may take `child`.
    ///
    /// The child must exist, have no other parent and not be an ancestor of `id`.
    fn can_adopt(&self, child: PenId, id: PenId, parent: Option<PenId>) -> bool {
        child != id
            && self
                .pens
                .get(&child)
                .is_some_and(|c| c.parent_id.is_none_or(|p| p == id))
            && !self.is_ancestor(child, parent)
    }

    /// Whether `ancestor` is `start` or one of its ancestors.
    fn is_ancestor(&self, ancestor: PenId, start: Option<PenId>) -> bool {
        let mut current = start;
        for _ in 0..=self.pens.len() {
            match current {
                Some(id) if id == ancestor => return true,
                Some(id) => current = self.pens.get(&id).and_then(|p| p.parent_id),
                None => return false,
            }
        }
        true
    }

    /// Remove a pen and its children, dropping every connection that involves them.
    pub fn remove_pen(&mut self, id: PenId) -> Option<Pen> {
        let children = self.pens.get(&id)?.children.clone();
        for child in children {
            self.remove_pen(child);
        }
        let pen = self.pens.remove(&id)?;
        self.z_order.retain(|p| *p != id);
        self.active.retain(|p| *p != id);
        if let Some(parent) = pen.parent_id.and_then(|p| self.pens.get_mut(&p)) {
            parent.children.retain(|c| *c != id);
        }
        for anchor in &pen.anchors {
            if let Some(target) = anchor.connect_to.and_then(|t| self.pens.get_mut(&t)) {
                target.connected_lines.retain(|c| !(c.line == id && c.line_anchor == anchor.id));
            }
        }
        for connected in &pen.connected_lines {
            let anchor = self
                .pens
                .get_mut(&connected.line)
                .and_then(|line| line.anchor_mut(connected.line_anchor));
            if let Some(anchor) = anchor {
                anchor.disconnect();
            }
        }
        Some(pen)
    }

    pub fn get(&self, id: PenId) -> Option<&Pen> {
        self.pens.get(&id)
    }

    pub fn get_mut(&mut self, id: PenId) -> Option<&mut Pen> {
        self.pens.get_mut(&id)
    }

    pub fn contains(&self, id: PenId) -> bool {
        self.pens.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.pens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pens.is_empty()
    }

    /// All pens, in no particular order.
    pub fn pens(&self) -> impl Iterator<Item = &Pen> {
        self.pens.values()
    }

    pub(crate) fn pens_mut(&mut self) -> impl Iterator<Item = &mut Pen> {
        self.pens.values_mut()
    }

    /// Top-level pens, back to front.
    pub fn top_level(&self) -> &[PenId] {
        &self.z_order
    }

    /// Every pen in paint order: each parent followed by its subtree.
    pub fn draw_order(&self) -> Vec<PenId> {
        let mut out = Vec::with_capacity(self.pens.len());
        for id in &self.z_order {
            self.collect_subtree(*id, &mut out);
        }
        out
    }

    fn collect_subtree(&self, id: PenId, out: &mut Vec<PenId>) {
        let Some(pen) = self.pens.get(&id) else {
            return;
        };
        out.push(id);
        for child in &pen.children {
            self.collect_subtree(*child, out);
        }
    }

    /// Pens in paint order, back to front.
    pub fn ordered(&self) -> impl Iterator<Item = &Pen> {
        self.draw_order().into_iter().filter_map(|id| self.pens.get(&id))
    }

    /// The current selection.
    pub fn active(&self) -> &[PenId] {
        &self.active
    }

    pub fn is_active(&self, id: PenId) -> bool {
        self.active.contains(&id)
    }

    /// Replace the selection. Returns the pens that were added and removed.
    pub fn set_active(&mut self, ids: Vec<PenId>) -> (Vec<PenId>, Vec<PenId>) {
        let mut next: Vec<PenId> = Vec::with_capacity(ids.len());
        for id in ids {
            if self.pens.contains_key(&id) && !next.contains(&id) {
                next.push(id);
            }
        }
        let removed: Vec<PenId> = self.active.iter().copied().filter(|id| !next.contains(id)).collect();
        let added: Vec<PenId> = next.iter().copied().filter(|id| !self.active.contains(id)).collect();
        for id in &removed {
            if let Some(pen) = self.pens.get_mut(id) {
                pen.calculative.active = false;
                pen.calculative.active_anchor = None;
            }
        }
        for id in &added {
            if let Some(pen) = self.pens.get_mut(id) {
                pen.calculative.active = true;
            }
        }
        self.active = next;
        (added, removed)
    }

    /// Most restrictive lock among the selection.
    pub fn active_lock(&self) -> LockState {
        self.active
            .iter()
            .filter_map(|id| self.pens.get(id))
            .map(|p| p.locked)
            .max()
            .unwrap_or_default()
    }

    /// The single selected pen, if exactly one is selected.
    pub fn single_active(&self) -> Option<&Pen> {
        match self.active.as_slice() {
            [id] => self.pens.get(id),
            _ => None,
        }
    }

    /// Bind a line terminal to an anchor of another pen.
    pub fn connect(&mut self, line: AnchorRef, target: AnchorRef) {
        if line.pen == target.pen || !self.pens.contains_key(&target.pen) {
            return;
        }
        let Some(anchor) = self.pens.get_mut(&line.pen).and_then(|p| p.anchor_mut(line.anchor)) else {
            return;
        };
        anchor.connect_to = Some(target.pen);
        anchor.anchor_id = Some(target.anchor);
        if let Some(pen) = self.pens.get_mut(&target.pen) {
            let record = ConnectedLine {
                line: line.pen,
                line_anchor: line.anchor,
                anchor: target.anchor,
            };
            if !pen.connected_lines.contains(&record) {
                pen.connected_lines.push(record);
            }
        }
    }

    /// Release a line terminal from whatever it is bound to.
    pub fn disconnect(&mut self, line: AnchorRef) {
        let Some(anchor) = self.pens.get_mut(&line.pen).and_then(|p| p.anchor_mut(line.anchor)) else {
            return;
        };
        let target = anchor.connect_to;
        anchor.disconnect();
        if let Some(pen) = target.and_then(|t| self.pens.get_mut(&t)) {
            pen.connected_lines
                .retain(|c| !(c.line == line.pen && c.line_anchor == line.anchor));
        }
    }
}

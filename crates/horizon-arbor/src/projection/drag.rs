//! Drag and drop state machine.
//!
//! A drag session tracks the dragged node, the insertion caret and the
//! drop-into target. Hovering a folder arms a highlight timer; once it fires
//! the folder becomes the drop-into target, and a collapsed folder arms a
//! second timer that expands it. Both timers live in single-entry
//! [`DebounceSlot`](horizon_arbor_core::DebounceSlot)s so retargeting always
//! supersedes the pending ones.

use std::time::Instant;

use horizon_arbor_core::logging::targets;
use horizon_arbor_core::{arbor_warn, TimerId};

use super::ListProjection;
use crate::error::{Error, Result};
use crate::store::{NodeId, TreeStore};
use crate::view_state::{CollapseState, InteractionState};

/// Where a dropped node lands relative to the target row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsertDirection {
    /// Before the target, as its sibling.
    Up,
    /// After the target, as its sibling. On an expanded folder with children
    /// this becomes the folder's first child.
    Down,
    /// Inside the target folder, as its first child.
    Into,
}

/// Pointer position reported while dragging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragMove {
    /// Pointer offset from the top of the hovered row.
    pub y: f32,
    /// Visible index of the hovered row. Indices at or past the visible
    /// count mean the pointer is below the last row.
    pub insert_index_hint: usize,
}

impl DragMove {
    pub fn new(y: f32, insert_index_hint: usize) -> Self {
        Self { y, insert_index_hint }
    }
}

/// The insertion caret currently drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caret {
    pub node_id: NodeId,
    pub direction: InsertDirection,
    pub past_last_row: bool,
}

/// A row the pointer is hovering, as armed in the highlight slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverTarget {
    /// Backing index at the time the pointer arrived.
    pub index: usize,
    pub node_id: NodeId,
    pub visible_index: usize,
}

/// Result of a completed drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropOutcome {
    pub node_id: NodeId,
    pub parent_id: NodeId,
    pub child_index: usize,
}

#[derive(Debug, Clone)]
pub(super) struct DragSession {
    pub(super) dragged: NodeId,
    original_parent: NodeId,
    entered: bool,
    caret: Option<Caret>,
    hover: Option<HoverTarget>,
    highlighted: Option<NodeId>,
}

impl ListProjection {
    /// Starts a drag of `id`.
    ///
    /// Returns `false` if a drag is already active or the node is unknown.
    pub fn begin_drag(&mut self, store: &TreeStore, id: NodeId) -> bool {
        if let Some(session) = &self.drag {
            arbor_warn!(
                active = %session.dragged,
                ignored = %id,
                "drag already in progress, ignoring drag start"
            );
            return false;
        }
        let Some(node) = store.get(id).filter(|_| !id.is_root()) else {
            return false;
        };
        self.drag = Some(DragSession {
            dragged: id,
            original_parent: node.parent_id().unwrap_or(NodeId::ROOT),
            entered: false,
            caret: None,
            hover: None,
            highlighted: None,
        });
        tracing::debug!(target: targets::DRAG, node = %id, "drag started");
        true
    }

    /// Whether a drag session is active.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// The node being dragged and its parent when the drag began.
    pub fn dragged(&self) -> Option<(NodeId, NodeId)> {
        self.drag.as_ref().map(|s| (s.dragged, s.original_parent))
    }

    /// The insertion caret currently drawn.
    pub fn caret(&self) -> Option<Caret> {
        self.drag.as_ref().and_then(|s| s.caret)
    }

    /// The current drop-into target.
    pub fn highlighted(&self) -> Option<NodeId> {
        self.drag.as_ref().and_then(|s| s.highlighted)
    }

    /// The pointer entered the droppable area.
    pub fn drag_enter(&mut self) {
        if let Some(session) = &mut self.drag {
            session.entered = true;
            tracing::trace!(target: targets::DRAG, node = %session.dragged, "drag entered");
        }
    }

    /// Tracks the pointer during a drag.
    #[tracing::instrument(skip(self, store), target = "horizon_arbor::drag", level = "trace")]
    pub fn drag_move(&mut self, store: &TreeStore, now: Instant, mv: DragMove) {
        let Some(session) = &mut self.drag else {
            return;
        };
        session.entered = true;

        let count = self.visible_count();
        if count == 0 {
            return;
        }
        let (visible_index, direction, past_last) = if mv.insert_index_hint >= count {
            (count - 1, InsertDirection::Down, true)
        } else if mv.y < self.row_height / 2.0 {
            (mv.insert_index_hint, InsertDirection::Up, false)
        } else {
            (mv.insert_index_hint, InsertDirection::Down, false)
        };
        self.hover_at(store, now, visible_index, direction, past_last);
    }

    /// Points the session at the visible row `visible_index`.
    fn hover_at(
        &mut self,
        store: &TreeStore,
        now: Instant,
        visible_index: usize,
        direction: InsertDirection,
        past_last: bool,
    ) {
        let Some(dragged) = self.drag.as_ref().map(|s| s.dragged) else {
            return;
        };
        let Some(index) = self.backing_index(visible_index) else {
            return;
        };
        let (node_id, is_folder) = (self.rows[index].id, self.rows[index].is_folder);

        let droppable_into =
            is_folder && !past_last && node_id != dragged && !store.is_ancestor(dragged, node_id);
        if droppable_into {
            self.delayed_highlight_and_expand(
                now,
                HoverTarget {
                    index,
                    node_id,
                    visible_index,
                },
            );
        } else {
            self.clear_hover_target();
        }

        if self.highlighted() == Some(node_id) {
            self.clear_caret();
        } else {
            self.update_insertion_line(direction, visible_index, past_last);
        }
    }

    /// Moves the insertion caret to the visible row `hover_index`.
    ///
    /// Past the last row the direction is forced to `Down` and the row is
    /// flagged instead of getting a caret.
    pub fn update_insertion_line(
        &mut self,
        direction: InsertDirection,
        hover_index: usize,
        is_past_last_row: bool,
    ) {
        self.clear_caret();
        let Some(index) = self.backing_index(hover_index) else {
            return;
        };
        let direction = if is_past_last_row { InsertDirection::Down } else { direction };

        let row = &mut self.rows[index];
        match (is_past_last_row, direction) {
            (true, _) => row.view.is_past_last_row = true,
            (false, InsertDirection::Up) => row.view.can_show_insert_line_above = true,
            (false, InsertDirection::Down) => row.view.can_show_insert_line_below = true,
            (false, InsertDirection::Into) => {}
        }
        let caret = Caret {
            node_id: row.id,
            direction,
            past_last_row: is_past_last_row,
        };
        if let Some(session) = &mut self.drag {
            session.caret = Some(caret);
        }
    }

    fn clear_caret(&mut self) {
        let Some(caret) = self.drag.as_mut().and_then(|s| s.caret.take()) else {
            return;
        };
        if let Some(row) = self.row_mut(caret.node_id) {
            row.view.clear_caret();
        }
    }

    /// Retargets the hover debounce to `target`.
    ///
    /// Hovering the same row again is a no-op. A different row cancels both
    /// pending timers, drops the current highlight and arms a new highlight
    /// timer.
    pub fn delayed_highlight_and_expand(&mut self, now: Instant, target: HoverTarget) {
        let Some(session) = &self.drag else {
            return;
        };
        if session.hover.is_some_and(|hover| hover.node_id == target.node_id) {
            return;
        }
        self.clear_hover_target();
        self.highlight_slot
            .arm(&mut self.timers, now, self.highlight_delay, target);
        if let Some(session) = &mut self.drag {
            session.hover = Some(target);
        }
        tracing::trace!(target: targets::DRAG, node = %target.node_id, "highlight armed");
    }

    /// Cancels both timers and removes the drop-into highlight.
    fn clear_hover_target(&mut self) {
        self.highlight_slot.cancel(&mut self.timers);
        self.expand_slot.cancel(&mut self.timers);
        let Some(session) = &mut self.drag else {
            return;
        };
        session.hover = None;
        if let Some(id) = session.highlighted.take() {
            self.set_highlight(id, false);
        }
    }

    fn set_highlight(&mut self, id: NodeId, highlighted: bool) {
        if let Some(row) = self.row_mut(id) {
            row.view.is_highlighted = highlighted;
            row.view.interaction = if highlighted {
                InteractionState::DragInsertTarget
            } else if row.view.is_selected {
                InteractionState::Selected
            } else {
                InteractionState::Normal
            };
        }
    }

    /// Fires due timers. Returns `true` if any view state changed.
    pub fn tick(&mut self, store: &TreeStore, now: Instant) -> bool {
        let mut changed = false;
        for id in self.timers.process_expired(now) {
            changed |= self.on_timer(store, now, id);
        }
        changed
    }

    fn on_timer(&mut self, store: &TreeStore, now: Instant, id: TimerId) -> bool {
        if let Some(target) = self.highlight_slot.take_if_fired(id) {
            return self.highlight_fired(now, target);
        }
        if let Some(folder) = self.expand_slot.take_if_fired(id) {
            return self.expand_fired(store, now, folder);
        }
        false
    }

    fn highlight_fired(&mut self, now: Instant, target: HoverTarget) -> bool {
        let Some(session) = &mut self.drag else {
            return false;
        };
        if session.hover.map(|h| h.node_id) != Some(target.node_id) {
            return false;
        }
        session.highlighted = Some(target.node_id);
        self.set_highlight(target.node_id, true);
        self.clear_caret();

        if self.collapse_state(target.node_id) == CollapseState::Collapsed {
            self.expand_slot
                .arm(&mut self.timers, now, self.expand_delay, target.node_id);
        }
        tracing::debug!(target: targets::DRAG, node = %target.node_id, "drop target highlighted");
        true
    }

    fn expand_fired(&mut self, store: &TreeStore, now: Instant, folder: NodeId) -> bool {
        if self.highlighted() != Some(folder) || self.collapse_state(folder).is_expanded() {
            return false;
        }
        self.set_expanded(store, folder, true);
        tracing::debug!(target: targets::DRAG, node = %folder, "auto-expanded drop target");

        let first_child = store.children(folder).first().copied();
        if let Some(child) = first_child
            && let Some(visible_index) = self.visible_index_of(child)
        {
            self.hover_at(store, now, visible_index, InsertDirection::Up, false);
        }
        true
    }

    /// Cancels the drag, rolling back caret, highlight and timers.
    ///
    /// Returns `false` if no drag was active.
    pub fn drag_leave(&mut self) -> bool {
        if self.drag.is_none() {
            return false;
        }
        self.clear_caret();
        self.clear_hover_target();
        if let Some(session) = self.drag.take() {
            tracing::debug!(target: targets::DRAG, node = %session.dragged, "drag cancelled");
        }
        true
    }

    /// Finishes the drag at the current caret or highlight.
    ///
    /// A final pointer position may be supplied. Returns `Ok(None)` when no
    /// drag was active, the pointer never entered the list, nothing was
    /// targeted or the target lies inside the dragged subtree. In every case
    /// the session ends and its transient state is rolled back.
    pub fn on_drop(
        &mut self,
        store: &mut TreeStore,
        now: Instant,
        mv: Option<DragMove>,
    ) -> Result<Option<DropOutcome>> {
        if let Some(mv) = mv {
            self.drag_move(store, now, mv);
        }
        let Some(session) = self.drag.clone() else {
            return Ok(None);
        };
        let target = match (session.highlighted, session.caret) {
            (Some(folder), _) => Some((folder, InsertDirection::Into)),
            (None, Some(caret)) => Some((caret.node_id, caret.direction)),
            (None, None) => None,
        };
        self.drag_leave();

        let Some((target, direction)) = target.filter(|_| session.entered) else {
            return Ok(None);
        };
        let target_parent = store.parent_of(target).unwrap_or(NodeId::ROOT);
        let outcome = match self.drop(store, session.dragged, target, target_parent, direction) {
            Ok(outcome) => outcome,
            // Letting go over the dragged row or inside its subtree aborts the gesture.
            Err(Error::SelfDescendantDrop { .. }) => return Ok(None),
            Err(error) => return Err(error),
        };
        if direction == InsertDirection::Into
            && let Some(row) = self.row_mut(target)
        {
            row.view.interaction = InteractionState::FinishedDragInsertTarget;
        }
        Ok(Some(outcome))
    }

    /// Moves `dragged` with its subtree next to or into `target`.
    ///
    /// Dropping a node onto itself or into its own subtree fails with
    /// [`Error::SelfDescendantDrop`] and leaves the tree untouched. On success
    /// the projection is rebuilt.
    #[tracing::instrument(skip(self, store), target = "horizon_arbor::drag", level = "debug")]
    pub fn drop(
        &mut self,
        store: &mut TreeStore,
        dragged: NodeId,
        target: NodeId,
        target_parent: NodeId,
        direction: InsertDirection,
    ) -> Result<DropOutcome> {
        if dragged == target || store.is_ancestor(dragged, target) {
            arbor_warn!(%dragged, drop_target = %target, "rejected drop into own subtree");
            self.drag_leave();
            return Err(Error::SelfDescendantDrop { dragged, target });
        }
        if !store.contains(dragged) || dragged.is_root() {
            return Err(Error::NodeNotFound { node_id: dragged });
        }
        let target_node = store
            .get(target)
            .ok_or(Error::NodeNotFound { node_id: target })?;

        let into_folder = target_node.is_folder()
            && match direction {
                InsertDirection::Into => true,
                InsertDirection::Down => {
                    target_node.child_info().has_children
                        && self.collapse_state(target).is_expanded()
                }
                InsertDirection::Up => false,
            };

        let (new_parent, index) = if into_folder {
            (target, 0)
        } else {
            let position = store
                .child_position(target_parent, target)
                .ok_or(Error::NodeNotFound { node_id: target })?;
            let mut index = match direction {
                InsertDirection::Up => position,
                InsertDirection::Down | InsertDirection::Into => position + 1,
            };
            if store.parent_of(dragged) == Some(target_parent)
                && store
                    .child_position(target_parent, dragged)
                    .is_some_and(|old| old < position)
            {
                index -= 1;
            }
            (target_parent, index)
        };

        let moved = store
            .get(dragged)
            .map_or(0, |node| node.child_info().total_descendant_count + 1);
        store.move_subtree(dragged, new_parent, index)?;
        if into_folder {
            self.collapse_state_by_id.insert(new_parent, CollapseState::Expanded);
        }
        self.rebuild(store);

        let child_index = store.child_position(new_parent, dragged).unwrap_or(index);
        tracing::debug!(
            target: targets::DRAG,
            node = %dragged,
            parent = %new_parent,
            child_index,
            moved,
            "dropped subtree"
        );
        Ok(DropOutcome {
            node_id: dragged,
            parent_id: new_parent,
            child_index,
        })
    }
}

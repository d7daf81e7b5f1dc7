//! Flattened visible-list projection of a [`TreeStore`].
//!
//! [`ListProjection`] keeps one backing row per node, in pre-order, together
//! with the row's [`NodeViewState`]. Only visible rows (every ancestor folder
//! expanded) are exposed to the renderer through [`ListProjection::visible_count`]
//! and [`ListProjection::visible_at`].
//!
//! The mapping from visible index to backing row is a derived cache. Every
//! operation that can change visibility drops it, and the next
//! `visible_count()` recomputes it in one pass.
//!
//! # Example
//!
//! ```
//! use horizon_arbor::{ListProjection, NodeId, NodePayload, TreeConfig, TreeStore};
//!
//! let mut store = TreeStore::new();
//! store.add_node(NodeId::ROOT, NodeId(1), NodePayload::folder("docs")).unwrap();
//! store.add_node(NodeId(1), NodeId(2), NodePayload::leaf("a.txt")).unwrap();
//!
//! let mut projection = ListProjection::new(&TreeConfig::default());
//! projection.rebuild(&store);
//! assert_eq!(projection.visible_count(), 1);
//!
//! projection.toggle_expand(&store, 0);
//! assert_eq!(projection.visible_count(), 2);
//! ```

mod drag;
mod edit;

use std::collections::HashMap;
use std::time::Duration;

use horizon_arbor_core::logging::targets;
use horizon_arbor_core::{DebounceSlot, PerfSpan, TimerManager};

use crate::config::TreeConfig;
use crate::store::{ChildInfo, NodeId, NodePayload, TreeStore};
use crate::view_state::{CollapseState, InteractionEvent, InteractionState, NodeViewState};

pub use drag::{Caret, DropOutcome, DragMove, HoverTarget, InsertDirection};
pub use edit::{CommitOutcome, TitleChange};

/// One backing row.
#[derive(Debug, Clone)]
struct Row {
    id: NodeId,
    parent_id: NodeId,
    level: i32,
    is_folder: bool,
    view: NodeViewState,
}

/// Derived mapping between visible indices and backing rows.
#[derive(Debug, Clone, Default)]
struct VisibleIndex {
    /// Backing index of each visible row.
    order: Vec<usize>,
    /// Visible index of each visible node.
    by_id: HashMap<NodeId, usize>,
}

/// A visible row as handed to the renderer.
#[derive(Debug, Clone, Copy)]
pub struct NodeView<'a> {
    pub id: NodeId,
    pub parent_id: NodeId,
    pub level: i32,
    /// Position among visible rows.
    pub visible_index: usize,
    /// `Some` for folders.
    pub collapse_state: Option<CollapseState>,
    pub child_info: ChildInfo,
    pub payload: &'a NodePayload,
    pub view: &'a NodeViewState,
}

/// Side effects of a discrete event that the owner has to publish.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventEffects {
    /// The row was clicked.
    pub clicked: Option<NodeId>,
    /// Outcome of committing a pending edit as a consequence of the event.
    pub commit: Option<CommitOutcome>,
    /// A drag session started.
    pub drag_started: bool,
}

/// Visible-list projection with its interaction state machines.
#[derive(Debug)]
pub struct ListProjection {
    rows: Vec<Row>,
    position_by_id: HashMap<NodeId, usize>,
    visible: Option<VisibleIndex>,
    collapse_state_by_id: HashMap<NodeId, CollapseState>,

    row_height: f32,
    focused_border_width: f32,
    highlight_delay: Duration,
    expand_delay: Duration,

    timers: TimerManager,
    highlight_slot: DebounceSlot<HoverTarget>,
    expand_slot: DebounceSlot<NodeId>,
    drag: Option<drag::DragSession>,

    editing: Option<NodeId>,
    clicked: Option<NodeId>,
    selected: Option<NodeId>,
    focus_request: Option<NodeId>,
}

impl ListProjection {
    /// Creates an empty projection. Call [`rebuild`](Self::rebuild) to populate it.
    pub fn new(config: &TreeConfig) -> Self {
        Self {
            rows: Vec::new(),
            position_by_id: HashMap::new(),
            visible: None,
            collapse_state_by_id: HashMap::new(),
            row_height: config.row_height,
            focused_border_width: config.focused_border_width,
            highlight_delay: config.highlight_delay_duration(),
            expand_delay: config.expand_delay_duration(),
            timers: TimerManager::new(),
            highlight_slot: DebounceSlot::new(),
            expand_slot: DebounceSlot::new(),
            drag: None,
            editing: None,
            clicked: None,
            selected: None,
            focus_request: None,
        }
    }

    /// Recomputes every backing row from `store` in one pre-order walk.
    ///
    /// Selection, edit state, edit text and tooltips survive by id. Drag
    /// carets and highlights are transient and are not carried over.
    pub fn rebuild(&mut self, store: &TreeStore) {
        let _perf = PerfSpan::new("projection_rebuild");

        let mut previous: HashMap<NodeId, NodeViewState> = self
            .rows
            .drain(..)
            .map(|row| (row.id, row.view))
            .collect();
        self.position_by_id.clear();
        self.rows.reserve(store.len());

        self.collapse_state_by_id
            .retain(|id, _| store.get(*id).is_some_and(|n| n.is_folder()));

        for node in store.iter_preorder(NodeId::ROOT).skip(1) {
            let parent_id = node.parent_id().unwrap_or(NodeId::ROOT);
            let visible = self.children_shown(parent_id);

            if node.is_folder() {
                self.collapse_state_by_id.entry(node.id()).or_default();
            }

            let mut view = NodeViewState::new(visible, self.row_height);
            if let Some(prev) = previous.remove(&node.id()) {
                view.carry_over(&prev);
            }

            self.position_by_id.insert(node.id(), self.rows.len());
            self.rows.push(Row {
                id: node.id(),
                parent_id,
                level: node.level(),
                is_folder: node.is_folder(),
                view,
            });
        }

        self.forget_dangling();
        self.invalidate();
        tracing::debug!(target: targets::PROJECTION, rows = self.rows.len(), "rebuilt projection");
    }

    /// Whether rows under `parent_id` are visible, judging from rows already
    /// built. Non-folder parents never hide their children.
    fn children_shown(&self, parent_id: NodeId) -> bool {
        if parent_id.is_root() {
            return true;
        }
        let Some(&pos) = self.position_by_id.get(&parent_id) else {
            return false;
        };
        let parent = &self.rows[pos];
        parent.view.is_visible
            && (!parent.is_folder || self.collapse_state(parent_id).is_expanded())
    }

    /// Clears references to nodes that no longer have a row.
    fn forget_dangling(&mut self) {
        let live = |id: &Option<NodeId>, rows: &HashMap<NodeId, usize>| {
            id.is_some_and(|id| rows.contains_key(&id))
        };
        if !live(&self.editing, &self.position_by_id) {
            self.editing = None;
        }
        if !live(&self.clicked, &self.position_by_id) {
            self.clicked = None;
        }
        if !live(&self.selected, &self.position_by_id) {
            self.selected = None;
        }
        if !live(&self.focus_request, &self.position_by_id) {
            self.focus_request = None;
        }
    }

    /// Drops all state held for removed nodes.
    pub fn forget(&mut self, removed: &[NodeId]) {
        for id in removed {
            self.collapse_state_by_id.remove(id);
            if self.editing == Some(*id) {
                self.editing = None;
            }
            if self.clicked == Some(*id) {
                self.clicked = None;
            }
            if self.selected == Some(*id) {
                self.selected = None;
            }
            if self.focus_request == Some(*id) {
                self.focus_request = None;
            }
        }
        if let Some(session) = &self.drag
            && removed.contains(&session.dragged)
        {
            self.drag_leave();
        }
    }

    /// Marks the visible index stale.
    fn invalidate(&mut self) {
        self.visible = None;
    }

    /// Recomputes the visible index if it is stale.
    fn ensure_visible_index(&mut self) -> &VisibleIndex {
        let rows = &self.rows;
        self.visible.get_or_insert_with(|| {
            let mut index = VisibleIndex::default();
            for (pos, row) in rows.iter().enumerate() {
                if row.view.is_visible {
                    index.by_id.insert(row.id, index.order.len());
                    index.order.push(pos);
                }
            }
            tracing::trace!(
                target: targets::PROJECTION,
                visible = index.order.len(),
                "visible index recomputed"
            );
            index
        })
    }

    /// Number of visible rows. Recomputes the visible index when stale.
    pub fn visible_count(&mut self) -> usize {
        self.ensure_visible_index().order.len()
    }

    /// Ids of the visible rows, in display order.
    pub fn visible_ids(&mut self) -> Vec<NodeId> {
        let order = self.ensure_visible_index().order.clone();
        order.into_iter().map(|pos| self.rows[pos].id).collect()
    }

    /// Visible index of `id`, if the row is visible.
    pub fn visible_index_of(&mut self, id: NodeId) -> Option<usize> {
        self.ensure_visible_index().by_id.get(&id).copied()
    }

    /// The visible row at `index`.
    ///
    /// Uses the visible index when it is current and falls back to a scan
    /// otherwise.
    pub fn visible_at<'a>(&'a self, store: &'a TreeStore, index: usize) -> Option<NodeView<'a>> {
        let pos = match &self.visible {
            Some(visible) => *visible.order.get(index)?,
            None => self
                .rows
                .iter()
                .enumerate()
                .filter(|(_, row)| row.view.is_visible)
                .nth(index)
                .map(|(pos, _)| pos)?,
        };
        let row = &self.rows[pos];
        let node = store.get(row.id)?;
        Some(NodeView {
            id: row.id,
            parent_id: row.parent_id,
            level: row.level,
            visible_index: index,
            collapse_state: row.is_folder.then(|| self.collapse_state(row.id)),
            child_info: node.child_info(),
            payload: node.payload(),
            view: &row.view,
        })
    }

    /// Backing index of the visible row at `index`.
    pub fn backing_index(&mut self, visible_index: usize) -> Option<usize> {
        self.ensure_visible_index().order.get(visible_index).copied()
    }

    /// Number of backing rows, visible or not.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Backing index of `id`.
    pub fn position_of(&self, id: NodeId) -> Option<usize> {
        self.position_by_id.get(&id).copied()
    }

    /// The view state of `id`.
    pub fn view(&self, id: NodeId) -> Option<&NodeViewState> {
        self.row(id).map(|row| &row.view)
    }

    fn row(&self, id: NodeId) -> Option<&Row> {
        self.position_by_id.get(&id).map(|&pos| &self.rows[pos])
    }

    fn row_mut(&mut self, id: NodeId) -> Option<&mut Row> {
        self.position_by_id.get(&id).map(|&pos| &mut self.rows[pos])
    }

    /// The collapse state of `id`; non-folders report `Collapsed`.
    pub fn collapse_state(&self, id: NodeId) -> CollapseState {
        self.collapse_state_by_id.get(&id).copied().unwrap_or_default()
    }

    /// Flips the collapse state of the folder at backing index `index`.
    ///
    /// Expanding reveals each child row and recurses into children that are
    /// themselves expanded. Collapsing hides the whole descendant block. When
    /// the folder row is hidden only its state changes. Returns the new state,
    /// or `None` if the row is not a folder.
    #[tracing::instrument(skip(self, store), target = "horizon_arbor::projection", level = "trace")]
    pub fn toggle_expand(&mut self, store: &TreeStore, index: usize) -> Option<CollapseState> {
        let row = self.rows.get(index)?;
        if !row.is_folder {
            return None;
        }
        let (id, row_visible) = (row.id, row.view.is_visible);
        let state = self.collapse_state(id).toggled();
        self.collapse_state_by_id.insert(id, state);

        if row_visible {
            match state {
                CollapseState::Expanded => self.reveal_children(store, id, index),
                CollapseState::Collapsed => {
                    let total = store
                        .get(id)
                        .map_or(0, |node| node.child_info().total_descendant_count);
                    let end = (index + total).min(self.rows.len() - 1);
                    for row in &mut self.rows[index + 1..=end] {
                        row.view.set_visible(false, self.row_height);
                    }
                }
            }
            self.invalidate();
        }

        tracing::debug!(target: targets::PROJECTION, node = %id, ?state, "toggled folder");
        Some(state)
    }

    /// Sets the collapse state of a folder by id.
    pub fn set_expanded(&mut self, store: &TreeStore, id: NodeId, expanded: bool) {
        if self.collapse_state(id).is_expanded() != expanded
            && let Some(pos) = self.position_of(id)
        {
            self.toggle_expand(store, pos);
        }
    }

    /// Shows every direct child of the folder at `index`, recursing into
    /// children whose own children are shown.
    fn reveal_children(&mut self, store: &TreeStore, id: NodeId, index: usize) {
        let mut start = index + 1;
        for &child in store.children(id) {
            let Some(node) = store.get(child) else {
                continue;
            };
            if let Some(row) = self.rows.get_mut(start) {
                debug_assert_eq!(row.id, child, "backing rows out of sync with the store");
                row.view.set_visible(true, self.row_height);
            }
            if !node.is_folder() || self.collapse_state(child).is_expanded() {
                self.reveal_children(store, child, start);
            }
            start += node.child_info().total_descendant_count + 1;
        }
    }

    /// The selected node.
    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// The last clicked node.
    pub fn clicked(&self) -> Option<NodeId> {
        self.clicked
    }

    /// The node in edit mode.
    pub fn editing(&self) -> Option<NodeId> {
        self.editing
    }

    /// Selects `id`, or clears the selection with `None`.
    pub fn select(&mut self, id: Option<NodeId>) {
        if let Some(prev) = self.selected.take()
            && let Some(row) = self.row_mut(prev)
        {
            row.view.is_selected = false;
            if row.view.interaction == InteractionState::Selected {
                row.view.interaction = InteractionState::Normal;
            }
        }
        if let Some(id) = id
            && let Some(row) = self.row_mut(id)
        {
            row.view.is_selected = true;
            if !row.view.interaction.is_editing() {
                row.view.interaction = InteractionState::Selected;
            }
            self.selected = Some(id);
        }
    }

    /// Records `id` as the clicked node.
    pub fn set_clicked(&mut self, id: Option<NodeId>) {
        self.clicked = id;
    }

    /// Asks the host to move keyboard focus to `id`.
    pub fn request_focus(&mut self, id: NodeId) {
        self.focus_request = Some(id);
    }

    /// Takes the pending focus request.
    pub fn take_focus_request(&mut self) -> Option<NodeId> {
        self.focus_request.take()
    }

    /// Applies a pointer or focus event to the row of `id`.
    #[tracing::instrument(skip(self, store), target = "horizon_arbor::projection", level = "trace")]
    pub fn handle_event(
        &mut self,
        store: &mut TreeStore,
        id: NodeId,
        event: InteractionEvent,
    ) -> EventEffects {
        let mut effects = EventEffects::default();
        if self.row(id).is_none() {
            return effects;
        }

        match event {
            InteractionEvent::TouchDown => {
                self.select(Some(id));
                self.clicked = Some(id);
                effects.clicked = Some(id);
            }
            InteractionEvent::RightClick => {
                if self.editing.is_some_and(|editing| editing != id) {
                    effects.commit = self.auto_commit(store);
                }
                self.select(Some(id));
                self.clicked = Some(id);
            }
            InteractionEvent::Hover => {
                if let Some(title) = store.get(id).map(|n| n.payload().title.clone())
                    && let Some(row) = self.row_mut(id)
                {
                    row.view.show_hint(title);
                }
            }
            InteractionEvent::HoverExit => {
                if let Some(row) = self.row_mut(id) {
                    row.view.clear_hint();
                }
            }
            InteractionEvent::Focus => {
                let width = self.focused_border_width;
                if let Some(row) = self.row_mut(id) {
                    row.view.border_width = width;
                }
            }
            InteractionEvent::Blur => {
                if self.editing == Some(id) {
                    effects.commit = self.auto_commit(store);
                }
                let rejected = self.editing == Some(id);
                if let Some(row) = self.row_mut(id) {
                    row.view.border_width = 0.0;
                    if !rejected {
                        row.view.clear_tooltip();
                    }
                }
            }
            InteractionEvent::DragStart => {
                effects.drag_started = self.begin_drag(store, id);
            }
            InteractionEvent::TouchUp => {}
        }

        // A rejected commit on blur leaves the row in edit mode.
        let keep_editing = event == InteractionEvent::Blur && self.editing == Some(id);
        if !keep_editing && let Some(row) = self.row_mut(id) {
            row.view.interaction = row.view.interaction.on_event(event);
        }
        effects
    }
}

static_assertions::assert_impl_all!(ListProjection: Send, Sync);

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// -1
    /// ├── 1 folder
    /// │   ├── 2
    /// │   └── 3 folder
    /// │       └── 4
    /// └── 5
    pub(crate) fn sample() -> (TreeStore, ListProjection) {
        let mut store = TreeStore::new();
        store.add_node(NodeId::ROOT, NodeId(1), NodePayload::folder("docs")).unwrap();
        store.add_node(NodeId(1), NodeId(2), NodePayload::leaf("a.txt")).unwrap();
        store.add_node(NodeId(1), NodeId(3), NodePayload::folder("src")).unwrap();
        store.add_node(NodeId(3), NodeId(4), NodePayload::leaf("main.rs")).unwrap();
        store.add_node(NodeId::ROOT, NodeId(5), NodePayload::leaf("notes")).unwrap();
        let mut projection = ListProjection::new(&TreeConfig::default());
        projection.rebuild(&store);
        (store, projection)
    }

    pub(crate) fn ids(projection: &mut ListProjection) -> Vec<i64> {
        projection.visible_ids().into_iter().map(|id| id.0).collect()
    }

    #[test]
    fn test_folders_start_collapsed() {
        let (_store, mut projection) = sample();
        assert_eq!(projection.row_count(), 5);
        assert_eq!(ids(&mut projection), vec![1, 5]);
        assert_eq!(projection.collapse_state(NodeId(1)), CollapseState::Collapsed);
        assert_eq!(projection.view(NodeId(2)).unwrap().row_height, 0.0);
    }

    #[test]
    fn test_expand_recurses_into_expanded_children() {
        let (store, mut projection) = sample();
        projection.toggle_expand(&store, 0);
        assert_eq!(ids(&mut projection), vec![1, 2, 3, 5]);

        let pos = projection.position_of(NodeId(3)).unwrap();
        projection.toggle_expand(&store, pos);
        assert_eq!(ids(&mut projection), vec![1, 2, 3, 4, 5]);

        // Collapsing the outer folder hides the whole block.
        projection.toggle_expand(&store, 0);
        assert_eq!(ids(&mut projection), vec![1, 5]);

        // Re-expanding brings the inner expanded folder's rows back.
        projection.toggle_expand(&store, 0);
        assert_eq!(ids(&mut projection), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_toggle_hidden_folder_only_flips_state() {
        let (store, mut projection) = sample();
        let pos = projection.position_of(NodeId(3)).unwrap();
        assert_eq!(projection.toggle_expand(&store, pos), Some(CollapseState::Expanded));
        assert_eq!(ids(&mut projection), vec![1, 5]);
        assert!(!projection.view(NodeId(4)).unwrap().is_visible);
    }

    #[test]
    fn test_toggle_leaf_is_rejected() {
        let (store, mut projection) = sample();
        let pos = projection.position_of(NodeId(5)).unwrap();
        assert_eq!(projection.toggle_expand(&store, pos), None);
    }

    #[test]
    fn test_visible_at_without_fresh_index() {
        let (store, mut projection) = sample();
        projection.toggle_expand(&store, 0);
        // The index is stale here; visible_at falls back to scanning.
        let view = projection.visible_at(&store, 2).unwrap();
        assert_eq!(view.id, NodeId(3));
        assert_eq!(view.level, 1);
        assert_eq!(view.collapse_state, Some(CollapseState::Collapsed));
        assert_eq!(projection.visible_count(), 4);
        assert_eq!(projection.visible_at(&store, 3).unwrap().payload.title, "notes");
        assert!(projection.visible_at(&store, 4).is_none());
    }

    #[test]
    fn test_rebuild_keeps_selection_and_collapse_state() {
        let (mut store, mut projection) = sample();
        projection.toggle_expand(&store, 0);
        projection.select(Some(NodeId(2)));
        store.add_node(NodeId(1), NodeId(6), NodePayload::leaf("b.txt")).unwrap();
        projection.rebuild(&store);
        assert_eq!(ids(&mut projection), vec![1, 2, 3, 6, 5]);
        assert!(projection.view(NodeId(2)).unwrap().is_selected);
        assert_eq!(projection.selected(), Some(NodeId(2)));
    }

    #[test]
    fn test_forget_drops_collapse_entries() {
        let (mut store, mut projection) = sample();
        projection.toggle_expand(&store, 0);
        projection.select(Some(NodeId(3)));
        let removed = store.remove_node(NodeId(1), NodeId::ROOT).unwrap();
        projection.forget(&removed);
        projection.rebuild(&store);
        assert_eq!(projection.selected(), None);
        assert!(!projection.collapse_state_by_id.contains_key(&NodeId(1)));
        assert!(!projection.collapse_state_by_id.contains_key(&NodeId(3)));
        assert_eq!(ids(&mut projection), vec![5]);
    }

    #[test]
    fn test_touch_down_selects_and_clicks() {
        let (mut store, mut projection) = sample();
        let effects = projection.handle_event(&mut store, NodeId(5), InteractionEvent::TouchDown);
        assert_eq!(effects.clicked, Some(NodeId(5)));
        assert_eq!(projection.clicked(), Some(NodeId(5)));
        assert_eq!(
            projection.view(NodeId(5)).unwrap().interaction,
            InteractionState::Selected
        );

        projection.handle_event(&mut store, NodeId(1), InteractionEvent::TouchDown);
        assert!(!projection.view(NodeId(5)).unwrap().is_selected);
        assert_eq!(projection.view(NodeId(5)).unwrap().interaction, InteractionState::Normal);
    }

    #[test]
    fn test_hover_hint_and_focus_border() {
        use crate::view_state::Tooltip;

        let (mut store, mut projection) = sample();
        projection.handle_event(&mut store, NodeId(5), InteractionEvent::Hover);
        assert_eq!(projection.view(NodeId(5)).unwrap().tooltip, Tooltip::Hint("notes".into()));
        projection.handle_event(&mut store, NodeId(5), InteractionEvent::Focus);
        assert_eq!(projection.view(NodeId(5)).unwrap().border_width, 2.0);
        projection.handle_event(&mut store, NodeId(5), InteractionEvent::Blur);
        let view = projection.view(NodeId(5)).unwrap();
        assert_eq!(view.tooltip, Tooltip::None);
        assert_eq!(view.border_width, 0.0);
    }
}

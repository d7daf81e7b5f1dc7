//! Public façade combining the store, the projection and the event bus.
//!
//! [`TreeController`] is what a host talks to. It validates requests, keeps
//! the projection in sync with every structural change and publishes the
//! resulting notifications on its [`TreeEventBus`].
//!
//! # Lifecycle
//!
//! 1. Populate the tree with [`add_node`](TreeController::add_node).
//! 2. Call [`build_done`](TreeController::build_done) once.
//! 3. Drive it from the host: pull rows with `visible_count` / `visible_at`,
//!    push pointer, key and drag events in, and call `tick` with the current
//!    time so delayed highlight and auto-expand can fire.
//!
//! Operations that need the projection fail with [`Error::BuildPending`] until
//! `build_done` has run.

use std::time::Instant;

use horizon_arbor_core::logging::targets;

use crate::config::TreeConfig;
use crate::error::{Error, Result};
use crate::events::{NodeAdd, NodeClick, NodeDelete, NodeModify, NodeMove, TreeEvent, TreeEventBus};
use crate::projection::{
    CommitOutcome, DragMove, DropOutcome, EventEffects, InsertDirection, ListProjection, NodeView,
    TitleChange,
};
use crate::store::{ChildInfo, NodeId, NodePayload, TreeStore};
use crate::validate::{TitleError, validate_title};
use crate::view_state::{CollapseState, InteractionEvent, Key};

/// Request to create a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub id: NodeId,
    pub parent_id: NodeId,
    pub payload: NodePayload,
}

impl NodeSpec {
    pub fn new(id: impl Into<NodeId>, parent_id: NodeId, payload: NodePayload) -> Self {
        Self {
            id: id.into(),
            parent_id,
            payload,
        }
    }

    /// A folder with a title and icon.
    pub fn folder(id: impl Into<NodeId>, parent_id: NodeId, title: &str, icon: &str) -> Self {
        Self::new(id, parent_id, NodePayload::folder(title).with_icon(icon))
    }

    /// A leaf with a title and icon.
    pub fn leaf(id: impl Into<NodeId>, parent_id: NodeId, title: &str, icon: &str) -> Self {
        Self::new(id, parent_id, NodePayload::leaf(title).with_icon(icon))
    }
}

/// Summary of one child of the clicked node.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildNodeInfo {
    pub node_id: NodeId,
    pub title: String,
    pub is_folder: bool,
    pub child_info: ChildInfo,
}

/// The tree-view engine.
#[derive(Debug)]
pub struct TreeController {
    store: TreeStore,
    projection: ListProjection,
    events: TreeEventBus,
    config: TreeConfig,
    /// Ids handed out so far; sorted by `build_done`.
    registry: Vec<NodeId>,
    built: bool,
}

impl Default for TreeController {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeController {
    /// Creates an empty tree with the default configuration.
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    /// Creates an empty tree with `config`.
    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            store: TreeStore::with_max_level(config.max_level),
            projection: ListProjection::new(&config),
            events: TreeEventBus::new(),
            config,
            registry: Vec::new(),
            built: false,
        }
    }

    /// The notification topics.
    pub fn events(&self) -> &TreeEventBus {
        &self.events
    }

    pub fn store(&self) -> &TreeStore {
        &self.store
    }

    pub fn projection(&self) -> &ListProjection {
        &self.projection
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Whether `build_done` has run.
    pub fn is_built(&self) -> bool {
        self.built
    }

    fn ensure_built(&self) -> Result<()> {
        if self.built { Ok(()) } else { Err(Error::BuildPending) }
    }

    fn parent_or_root(&self, id: NodeId) -> NodeId {
        self.store.parent_of(id).unwrap_or(NodeId::ROOT)
    }

    fn check_spec(spec: &NodeSpec) -> Result<()> {
        if spec.id.is_root() {
            return Err(Error::ReservedId);
        }
        if spec.payload.title.is_empty() {
            return Err(Error::InvalidSpec("missing title"));
        }
        validate_title(&spec.payload.title)?;
        if spec.payload.icon.is_none() {
            return Err(Error::InvalidSpec("missing icon"));
        }
        Ok(())
    }

    /// Appends a node described by `spec`.
    #[tracing::instrument(skip(self), target = "horizon_arbor::controller", level = "trace")]
    pub fn add_node(&mut self, spec: NodeSpec) -> Result<()> {
        Self::check_spec(&spec)?;
        self.store.add_node(spec.parent_id, spec.id, spec.payload)?;
        self.after_insert(spec.id, spec.parent_id);
        Ok(())
    }

    /// Inserts a node next to `after_sibling`, before it unless `insert_after`.
    pub fn add_at(
        &mut self,
        spec: NodeSpec,
        after_sibling: NodeId,
        insert_after: bool,
    ) -> Result<()> {
        Self::check_spec(&spec)?;
        self.store
            .add_at(spec.parent_id, spec.id, after_sibling, insert_after, spec.payload)?;
        self.after_insert(spec.id, spec.parent_id);
        Ok(())
    }

    fn after_insert(&mut self, id: NodeId, parent_id: NodeId) {
        self.registry.push(id);
        if self.built {
            self.projection.rebuild(&self.store);
        }
        self.events.publish(TreeEvent::Add(NodeAdd {
            current_node_id: id,
            parent_node_id: parent_id,
        }));
    }

    /// Creates a default-named folder under the selected folder and starts
    /// editing it.
    ///
    /// Returns `Ok(None)` when nothing is selected or the selection is not a
    /// folder.
    pub fn add(&mut self) -> Result<Option<NodeId>> {
        self.ensure_built()?;
        let Some(parent_id) = self
            .projection
            .selected()
            .filter(|&id| self.store.get(id).is_some_and(|n| n.is_folder()))
        else {
            tracing::debug!(target: targets::CONTROLLER, "add ignored, selection is not a folder");
            return Ok(None);
        };

        let id = self.next_id();
        let payload = NodePayload::folder(self.config.default_node_title.as_str())
            .with_icon(self.config.default_node_icon.as_str());
        self.store.add_node(parent_id, id, payload)?;
        self.registry.push(id);

        self.projection.rebuild(&self.store);
        self.projection.set_expanded(&self.store, parent_id, true);
        let previous = self.projection.begin_edit(&mut self.store, id)?;
        self.publish_commit(previous.as_ref());
        self.projection.request_focus(id);

        self.events.publish(TreeEvent::Add(NodeAdd {
            current_node_id: id,
            parent_node_id: parent_id,
        }));
        tracing::debug!(
            target: targets::CONTROLLER,
            node = %id,
            parent = %parent_id,
            "added default node"
        );
        Ok(Some(id))
    }

    /// One more than the largest live id.
    fn next_id(&self) -> NodeId {
        let max = self.registry.iter().map(|id| id.0).max().unwrap_or(-1);
        NodeId(max + 1)
    }

    /// Removes the clicked node and its subtree.
    ///
    /// Returns the freed ids in pre-order.
    pub fn remove_node(&mut self) -> Result<Vec<NodeId>> {
        self.ensure_built()?;
        let id = self.projection.clicked().ok_or(Error::NoClickedNode)?;
        self.remove_by_id(id)
    }

    /// Removes `id` and its subtree.
    pub fn remove_by_id(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        if id.is_root() {
            return Err(Error::ReservedId);
        }
        let parent_id = self.parent_or_root(id);
        let removed = self.store.remove_node(id, parent_id)?;

        self.projection.forget(&removed);
        self.registry.retain(|n| !removed.contains(n));
        if self.built {
            self.projection.rebuild(&self.store);
        }
        self.events.publish(TreeEvent::Delete(NodeDelete {
            current_node_id: id,
            parent_node_id: parent_id,
        }));
        Ok(removed)
    }

    /// Puts the clicked node into edit mode.
    pub fn modify_node(&mut self) -> Result<()> {
        self.ensure_built()?;
        let id = self.projection.clicked().ok_or(Error::NoClickedNode)?;
        let previous = self.projection.begin_edit(&mut self.store, id)?;
        self.publish_commit(previous.as_ref());
        self.projection.request_focus(id);
        Ok(())
    }

    /// Commits `title` for the node in edit mode.
    ///
    /// An invalid title is reported as [`CommitOutcome::Rejected`], with the
    /// sanitized text left in the editor and a warning shown.
    pub fn commit_edit(&mut self, id: NodeId, title: &str) -> Result<CommitOutcome> {
        self.ensure_built()?;
        let outcome = self.projection.commit(&mut self.store, id, title)?;
        if let CommitOutcome::Committed(change) = &outcome {
            self.publish_modify(Some(change.clone()));
        }
        Ok(outcome)
    }

    /// Live validation of the text being edited.
    pub fn text_change(&mut self, id: NodeId, text: &str) -> Result<Option<TitleError>> {
        self.ensure_built()?;
        self.projection.text_change(id, text)
    }

    fn publish_commit(&self, outcome: Option<&CommitOutcome>) {
        self.publish_modify(outcome.and_then(CommitOutcome::change).cloned());
    }

    fn publish_modify(&self, change: Option<TitleChange>) {
        if let Some(change) = change {
            self.events.publish(TreeEvent::Modify(NodeModify {
                current_node_id: change.node_id,
                parent_node_id: self.parent_or_root(change.node_id),
            }));
        }
    }

    /// Direct children of the clicked node.
    pub fn get_children_id(&self) -> Result<Vec<NodeId>> {
        self.ensure_built()?;
        let id = self.projection.clicked().ok_or(Error::NoClickedNode)?;
        Ok(self.store.children(id).to_vec())
    }

    /// Title, kind and counts of each child of the clicked node.
    pub fn get_click_node_children_info(&self) -> Result<Vec<ChildNodeInfo>> {
        self.ensure_built()?;
        let id = self.projection.clicked().ok_or(Error::NoClickedNode)?;
        Ok(self
            .store
            .children(id)
            .iter()
            .filter_map(|&child| self.store.get(child))
            .map(|node| ChildNodeInfo {
                node_id: node.id(),
                title: node.payload().title.clone(),
                is_folder: node.is_folder(),
                child_info: node.child_info(),
            })
            .collect())
    }

    /// Replaces the secondary title of `id` if it still reads `old_subtitle`.
    ///
    /// Returns `true` if the subtitle changed.
    pub fn refresh_node(
        &mut self,
        id: NodeId,
        old_subtitle: &str,
        new_subtitle: &str,
    ) -> Result<bool> {
        let payload = self
            .store
            .payload_mut(id)
            .filter(|_| !id.is_root())
            .ok_or(Error::NodeNotFound { node_id: id })?;
        if payload.secondary_title.as_deref().unwrap_or_default() != old_subtitle {
            return Ok(false);
        }
        payload.secondary_title = Some(new_subtitle.to_string());
        self.events.publish(TreeEvent::Modify(NodeModify {
            current_node_id: id,
            parent_node_id: self.parent_or_root(id),
        }));
        Ok(true)
    }

    /// Finishes initial population: builds the projection and sorts the id
    /// registry.
    pub fn build_done(&mut self) {
        self.registry.sort_unstable();
        self.registry.dedup();
        self.projection.rebuild(&self.store);
        self.built = true;
        tracing::debug!(target: targets::CONTROLLER, nodes = self.store.len(), "build done");
    }

    /// Number of visible rows; zero before `build_done`.
    pub fn visible_count(&mut self) -> usize {
        if !self.built {
            return 0;
        }
        self.projection.visible_count()
    }

    /// The visible row at `index`.
    pub fn visible_at(&self, index: usize) -> Option<NodeView<'_>> {
        if !self.built {
            return None;
        }
        self.projection.visible_at(&self.store, index)
    }

    /// Expands or collapses the folder at visible row `index`.
    pub fn toggle_expand(&mut self, index: usize) -> Result<Option<CollapseState>> {
        self.ensure_built()?;
        let Some(pos) = self.projection.backing_index(index) else {
            return Ok(None);
        };
        Ok(self.projection.toggle_expand(&self.store, pos))
    }

    /// Delivers a pointer or focus event to the row of `id`.
    pub fn handle_event(&mut self, id: NodeId, event: InteractionEvent) -> Result<EventEffects> {
        self.ensure_built()?;
        let effects = self.projection.handle_event(&mut self.store, id, event);
        self.publish_commit(effects.commit.as_ref());
        if let Some(clicked) = effects.clicked {
            self.events.publish(TreeEvent::Click(NodeClick {
                current_node_id: clicked,
            }));
        }
        Ok(effects)
    }

    /// Keyboard navigation and edit shortcuts.
    pub fn key_down(&mut self, key: Key) -> Result<()> {
        self.ensure_built()?;
        let committed = self.projection.key_down(&mut self.store, key);
        self.publish_modify(committed);
        Ok(())
    }

    /// Starts dragging `id`. Returns `false` if a drag is already active.
    pub fn on_drag_start(&mut self, id: NodeId) -> Result<bool> {
        self.ensure_built()?;
        Ok(self.projection.begin_drag(&self.store, id))
    }

    pub fn on_drag_enter(&mut self) {
        self.projection.drag_enter();
    }

    pub fn on_drag_move(&mut self, mv: DragMove, now: Instant) -> Result<()> {
        self.ensure_built()?;
        self.projection.drag_move(&self.store, now, mv);
        Ok(())
    }

    /// Cancels the drag. Returns `false` if none was active.
    pub fn on_drag_leave(&mut self) -> bool {
        self.projection.drag_leave()
    }

    /// Completes the drag at the current caret or drop-into target.
    pub fn on_drop(&mut self, mv: Option<DragMove>, now: Instant) -> Result<Option<NodeMove>> {
        self.ensure_built()?;
        let outcome = self.projection.on_drop(&mut self.store, now, mv)?;
        Ok(outcome.map(|outcome| self.publish_move(outcome)))
    }

    /// Moves `dragged` relative to `target` without a pointer session.
    pub fn drop_node(
        &mut self,
        dragged: NodeId,
        target: NodeId,
        target_parent: NodeId,
        direction: InsertDirection,
    ) -> Result<NodeMove> {
        self.ensure_built()?;
        let outcome = self
            .projection
            .drop(&mut self.store, dragged, target, target_parent, direction)?;
        Ok(self.publish_move(outcome))
    }

    fn publish_move(&self, outcome: DropOutcome) -> NodeMove {
        let event = NodeMove {
            current_node_id: outcome.node_id,
            parent_node_id: outcome.parent_id,
            child_index: outcome.child_index,
        };
        self.events.publish(TreeEvent::Move(event));
        event
    }

    /// Fires due highlight and auto-expand timers.
    ///
    /// Returns `true` if any row changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.built && self.projection.tick(&self.store, now)
    }

    /// Takes the node the host should focus, set by `add` and `modify_node`.
    pub fn take_focus_request(&mut self) -> Option<NodeId> {
        self.projection.take_focus_request()
    }
}

static_assertions::assert_impl_all!(TreeController: Send, Sync);

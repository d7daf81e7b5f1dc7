//! Hierarchical node store.
//!
//! [`TreeStore`] keeps every node in an id-keyed arena. Parent and child links
//! are stored as [`NodeId`] lists, never as references, so relocating a
//! subtree is a pure id operation.
//!
//! Every node carries a [`ChildInfo`] aggregate that is kept consistent on each
//! insert, remove and move by walking the ancestor chain up to the synthetic
//! root.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::ops::ControlFlow;

use crate::error::{Error, Result};

/// Maximum nesting level of a node. Children of the root are level 0.
pub const MAX_LEVEL: i32 = 50;

/// Identifier of a tree node.
///
/// Ids are chosen by the caller and must be unique across the live tree.
/// [`NodeId::ROOT`] (`-1`) is reserved for the synthetic root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub i64);

impl NodeId {
    /// The synthetic root every top-level node hangs from.
    pub const ROOT: NodeId = NodeId(-1);

    /// Returns `true` for the synthetic root.
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for NodeId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<i32> for NodeId {
    fn from(id: i32) -> Self {
        Self(i64::from(id))
    }
}

/// Opaque handle to a host-side container or menu attached to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerRef(pub u64);

/// Caller data carried by a node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePayload {
    /// Primary title shown on the row.
    pub title: String,
    /// Optional secondary line.
    pub secondary_title: Option<String>,
    /// Icon resource name.
    pub icon: Option<String>,
    /// Icon shown while the row is selected.
    pub selected_icon: Option<String>,
    /// Icon shown while the row is being edited.
    pub edit_icon: Option<String>,
    /// Folders can be expanded, collapsed and dropped into.
    pub is_folder: bool,
    /// Host container or menu attached to the node.
    pub container: Option<ContainerRef>,
}

impl NodePayload {
    /// A folder payload with the given title.
    pub fn folder(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            is_folder: true,
            ..Default::default()
        }
    }

    /// A leaf payload with the given title.
    pub fn leaf(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Sets the icon resource.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Sets the selected and edit icons.
    pub fn with_state_icons(
        mut self,
        selected: impl Into<String>,
        edit: impl Into<String>,
    ) -> Self {
        self.selected_icon = Some(selected.into());
        self.edit_icon = Some(edit.into());
        self
    }

    /// Sets the secondary title.
    pub fn with_secondary_title(mut self, secondary: impl Into<String>) -> Self {
        self.secondary_title = Some(secondary.into());
        self
    }

    /// Attaches a host container.
    pub fn with_container(mut self, container: ContainerRef) -> Self {
        self.container = Some(container);
        self
    }
}

/// Aggregate child counts of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChildInfo {
    /// Whether the node has at least one child.
    pub has_children: bool,
    /// Number of direct children.
    pub child_count: usize,
    /// Number of strict descendants.
    pub total_descendant_count: usize,
}

/// A node in the tree structure.
#[derive(Debug, Clone)]
pub struct TreeNode {
    id: NodeId,
    parent_id: Option<NodeId>,
    level: i32,
    children: Vec<NodeId>,
    payload: NodePayload,
    child_info: ChildInfo,
}

impl TreeNode {
    fn new(id: NodeId, parent_id: Option<NodeId>, level: i32, payload: NodePayload) -> Self {
        Self {
            id,
            parent_id,
            level,
            children: Vec::new(),
            payload,
            child_info: ChildInfo::default(),
        }
    }

    /// The node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The parent id; `None` only for the root.
    pub fn parent_id(&self) -> Option<NodeId> {
        self.parent_id
    }

    /// Nesting level; the root is `-1`.
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Ordered child ids.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The caller payload.
    pub fn payload(&self) -> &NodePayload {
        &self.payload
    }

    /// Aggregate child counts.
    pub fn child_info(&self) -> ChildInfo {
        self.child_info
    }

    /// Shorthand for `payload().is_folder`.
    pub fn is_folder(&self) -> bool {
        self.payload.is_folder
    }
}

/// One node of a captured subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedNode {
    /// The node's id.
    pub id: NodeId,
    /// The node's parent at capture time.
    pub parent_id: NodeId,
    /// Depth relative to the capture root (the root itself is 0).
    pub depth: usize,
    /// The node's payload.
    pub payload: NodePayload,
}

/// Visitor for tree walks.
///
/// Returning [`ControlFlow::Break`] stops the walk. Any `FnMut(&TreeNode) ->
/// ControlFlow<()>` is a visitor.
pub trait NodeVisitor {
    /// Visits one node.
    fn visit(&mut self, node: &TreeNode) -> ControlFlow<()>;
}

impl<F> NodeVisitor for F
where
    F: FnMut(&TreeNode) -> ControlFlow<()>,
{
    fn visit(&mut self, node: &TreeNode) -> ControlFlow<()> {
        self(node)
    }
}

/// Pre-order (depth-first) iterator over a subtree.
#[derive(Debug)]
pub struct PreOrder<'a> {
    store: &'a TreeStore,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.store.nodes.get(&id)?;
        self.stack.extend(node.children.iter().rev().copied());
        Some(node)
    }
}

/// Level-order (breadth-first) iterator over a subtree.
#[derive(Debug)]
pub struct LevelOrder<'a> {
    store: &'a TreeStore,
    queue: VecDeque<NodeId>,
}

impl<'a> Iterator for LevelOrder<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.queue.pop_front()?;
        let node = self.store.nodes.get(&id)?;
        self.queue.extend(node.children.iter().copied());
        Some(node)
    }
}

/// Id-keyed arena holding the whole tree.
#[derive(Debug, Clone)]
pub struct TreeStore {
    nodes: HashMap<NodeId, TreeNode>,
    max_level: i32,
}

impl Default for TreeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeStore {
    /// Creates a store containing only the synthetic root.
    pub fn new() -> Self {
        Self::with_max_level(MAX_LEVEL)
    }

    /// Creates a store with a custom nesting limit.
    pub fn with_max_level(max_level: i32) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            NodeId::ROOT,
            TreeNode::new(NodeId::ROOT, None, -1, NodePayload::folder("")),
        );
        Self { nodes, max_level }
    }

    /// The nesting limit.
    pub fn max_level(&self) -> i32 {
        self.max_level
    }

    /// Number of nodes, excluding the root.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Returns `true` when only the root exists.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks a node up by id.
    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(&id)
    }

    /// Returns `true` if a node with `id` is live.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// The synthetic root.
    pub fn root(&self) -> &TreeNode {
        &self.nodes[&NodeId::ROOT]
    }

    /// Ordered children of `id`, empty if the node does not exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// The parent of `id`.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent_id)
    }

    /// Position of `child` among `parent`'s children.
    pub fn child_position(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).iter().position(|&c| c == child)
    }

    /// Replaces a node's payload, returning the previous one.
    pub fn set_payload(&mut self, id: NodeId, payload: NodePayload) -> Result<NodePayload> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(Error::NodeNotFound { node_id: id })?;
        Ok(std::mem::replace(&mut node.payload, payload))
    }

    /// Mutable access to a node's payload.
    pub fn payload_mut(&mut self, id: NodeId) -> Option<&mut NodePayload> {
        self.nodes.get_mut(&id).map(|n| &mut n.payload)
    }

    /// Appends a new child to `parent_id`.
    pub fn add_node(
        &mut self,
        parent_id: NodeId,
        new_id: NodeId,
        payload: NodePayload,
    ) -> Result<()> {
        self.check_insert(parent_id, new_id)?;
        let index = self.children(parent_id).len();
        self.insert_child(parent_id, new_id, payload, index);
        Ok(())
    }

    /// Inserts a new child next to `after_sibling_id`.
    ///
    /// With `insert_after` the node lands right after the sibling, otherwise
    /// right before it. An unknown sibling appends at the end.
    pub fn add_at(
        &mut self,
        parent_id: NodeId,
        new_id: NodeId,
        after_sibling_id: NodeId,
        insert_after: bool,
        payload: NodePayload,
    ) -> Result<()> {
        self.check_insert(parent_id, new_id)?;
        let children = self.children(parent_id);
        let index = match children.iter().position(|&c| c == after_sibling_id) {
            Some(pos) if insert_after => pos + 1,
            Some(pos) => pos,
            None => children.len(),
        };
        self.insert_child(parent_id, new_id, payload, index);
        Ok(())
    }

    /// Removes `child_id` and its whole subtree from `parent_id`.
    ///
    /// Returns the removed ids in pre-order, starting with `child_id`.
    pub fn remove_node(&mut self, child_id: NodeId, parent_id: NodeId) -> Result<Vec<NodeId>> {
        let parent = self
            .nodes
            .get(&parent_id)
            .ok_or(Error::ParentNotFound { parent_id })?;
        let position = parent
            .children
            .iter()
            .position(|&c| c == child_id)
            .ok_or(Error::NodeNotFound { node_id: child_id })?;

        let removed = self.subtree_ids(child_id);
        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent.children.remove(position);
        }
        for id in &removed {
            self.nodes.remove(id);
        }
        self.refresh_child_info(parent_id);
        self.adjust_ancestor_totals(parent_id, -(removed.len() as isize));

        tracing::debug!(
            target: "horizon_arbor::store",
            node = %child_id,
            parent = %parent_id,
            freed = removed.len(),
            "removed subtree"
        );
        Ok(removed)
    }

    /// Moves `node_id` with its subtree under `new_parent` at `index`.
    ///
    /// `index` is clamped to the new parent's child count after the node has
    /// been detached. Levels of the whole subtree are rewritten.
    pub fn move_subtree(
        &mut self,
        node_id: NodeId,
        new_parent: NodeId,
        index: usize,
    ) -> Result<()> {
        if node_id.is_root() {
            return Err(Error::ReservedId);
        }
        let node = self
            .nodes
            .get(&node_id)
            .ok_or(Error::NodeNotFound { node_id })?;
        let old_parent = node.parent_id.unwrap_or(NodeId::ROOT);
        let old_level = node.level;
        let moved = node.child_info.total_descendant_count + 1;

        let target = self
            .nodes
            .get(&new_parent)
            .ok_or(Error::ParentNotFound {
                parent_id: new_parent,
            })?;
        if new_parent == node_id || self.is_ancestor(node_id, new_parent) {
            return Err(Error::SelfDescendantDrop {
                dragged: node_id,
                target: new_parent,
            });
        }
        let height = self.subtree_height(node_id);
        if target.level + height as i32 >= self.max_level {
            return Err(Error::DepthExceeded {
                parent_id: new_parent,
                level: target.level,
            });
        }
        let new_level = target.level + 1;

        // Detach.
        if let Some(parent) = self.nodes.get_mut(&old_parent) {
            parent.children.retain(|&c| c != node_id);
        }
        self.refresh_child_info(old_parent);
        self.adjust_ancestor_totals(old_parent, -(moved as isize));

        // Attach.
        if let Some(parent) = self.nodes.get_mut(&new_parent) {
            let index = index.min(parent.children.len());
            parent.children.insert(index, node_id);
        }
        if let Some(node) = self.nodes.get_mut(&node_id) {
            node.parent_id = Some(new_parent);
        }
        self.refresh_child_info(new_parent);
        self.adjust_ancestor_totals(new_parent, moved as isize);

        let delta = new_level - old_level;
        if delta != 0 {
            for id in self.subtree_ids(node_id) {
                if let Some(n) = self.nodes.get_mut(&id) {
                    n.level += delta;
                }
            }
        }

        tracing::debug!(
            target: "horizon_arbor::store",
            node = %node_id,
            from = %old_parent,
            to = %new_parent,
            index,
            moved,
            "moved subtree"
        );
        Ok(())
    }

    /// Walks the subtree rooted at `start` in pre-order.
    ///
    /// Returns `Break` if the visitor stopped the walk.
    pub fn traverse_df<V: NodeVisitor>(&self, start: NodeId, mut visitor: V) -> ControlFlow<()> {
        for node in self.iter_preorder(start) {
            if visitor.visit(node).is_break() {
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Walks the whole tree, root included, in level order.
    pub fn traverse_bf<V: NodeVisitor>(&self, mut visitor: V) -> ControlFlow<()> {
        for node in self.iter_level_order(NodeId::ROOT) {
            if visitor.visit(node).is_break() {
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Pre-order iterator starting at `start` (inclusive).
    pub fn iter_preorder(&self, start: NodeId) -> PreOrder<'_> {
        let stack = if self.contains(start) { vec![start] } else { Vec::new() };
        PreOrder { store: self, stack }
    }

    /// Level-order iterator starting at `start` (inclusive).
    pub fn iter_level_order(&self, start: NodeId) -> LevelOrder<'_> {
        let mut queue = VecDeque::new();
        if self.contains(start) {
            queue.push_back(start);
        }
        LevelOrder { store: self, queue }
    }

    /// Finds a node by walking the tree from the root, stopping at the first
    /// match.
    pub fn find_by_id(&self, id: NodeId) -> Option<&TreeNode> {
        self.iter_preorder(NodeId::ROOT).find(|n| n.id == id)
    }

    /// Ids of the subtree rooted at `id` in pre-order, `id` first.
    pub fn subtree_ids(&self, id: NodeId) -> Vec<NodeId> {
        self.iter_preorder(id).map(|n| n.id).collect()
    }

    /// Captures the subtree rooted at `id` in pre-order.
    pub fn capture_subtree(&self, id: NodeId) -> Vec<CapturedNode> {
        let Some(root) = self.get(id) else {
            return Vec::new();
        };
        let base = root.level;
        self.iter_preorder(id)
            .map(|n| CapturedNode {
                id: n.id,
                parent_id: n.parent_id.unwrap_or(NodeId::ROOT),
                depth: (n.level - base) as usize,
                payload: n.payload.clone(),
            })
            .collect()
    }

    /// Deepest relative depth below `id` (0 for a leaf).
    pub fn subtree_height(&self, id: NodeId) -> usize {
        let Some(root) = self.get(id) else {
            return 0;
        };
        let base = root.level;
        self.iter_preorder(id)
            .map(|n| (n.level - base) as usize)
            .max()
            .unwrap_or(0)
    }

    /// Returns `true` if `ancestor` is a strict ancestor of `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent_of(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent_of(id);
        }
        false
    }

    /// All live ids except the root, in no particular order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied().filter(|id| !id.is_root())
    }

    fn check_insert(&self, parent_id: NodeId, new_id: NodeId) -> Result<()> {
        let parent = self
            .nodes
            .get(&parent_id)
            .ok_or(Error::ParentNotFound { parent_id })?;
        if parent.level >= self.max_level {
            return Err(Error::DepthExceeded {
                parent_id,
                level: parent.level,
            });
        }
        if self.nodes.contains_key(&new_id) {
            return Err(Error::DuplicateId { node_id: new_id });
        }
        Ok(())
    }

    fn insert_child(
        &mut self,
        parent_id: NodeId,
        new_id: NodeId,
        payload: NodePayload,
        index: usize,
    ) {
        let level = self.nodes[&parent_id].level + 1;
        self.nodes
            .insert(new_id, TreeNode::new(new_id, Some(parent_id), level, payload));
        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent.children.insert(index, new_id);
        }
        self.refresh_child_info(parent_id);
        self.adjust_ancestor_totals(parent_id, 1);
        tracing::trace!(
            target: "horizon_arbor::store",
            node = %new_id,
            parent = %parent_id,
            index,
            "inserted node"
        );
    }

    fn refresh_child_info(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.child_info.child_count = node.children.len();
            node.child_info.has_children = !node.children.is_empty();
        }
    }

    /// Applies `delta` to the descendant totals of `start` and every ancestor.
    fn adjust_ancestor_totals(&mut self, start: NodeId, delta: isize) {
        let mut current = Some(start);
        while let Some(id) = current {
            let Some(node) = self.nodes.get_mut(&id) else {
                break;
            };
            let total = node.child_info.total_descendant_count as isize + delta;
            debug_assert!(total >= 0, "descendant count underflow at {id}");
            node.child_info.total_descendant_count = total.max(0) as usize;
            current = node.parent_id;
        }
    }
}

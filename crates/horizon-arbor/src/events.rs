//! Structural change notifications.
//!
//! [`TreeEventBus`] holds one [`Signal`] per topic. The controller owns the
//! bus and publishes after each mutation has fully completed, so slots always
//! observe a consistent tree.
//!
//! ```
//! use horizon_arbor::{NodeId, NodeSpec, TreeController};
//!
//! let mut tree = TreeController::new();
//! tree.events().node_add.connect(|event| {
//!     println!("node {} added under {}", event.current_node_id, event.parent_node_id);
//! });
//! tree.add_node(NodeSpec::folder(1, NodeId::ROOT, "docs", "folder")).unwrap();
//! ```

use std::sync::Arc;

use horizon_arbor_core::logging::targets;
use horizon_arbor_core::{ConnectionId, Signal};
use parking_lot::Mutex;

use crate::store::NodeId;

/// A node was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeAdd {
    pub current_node_id: NodeId,
    pub parent_node_id: NodeId,
}

/// A subtree was removed. Only its root is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeDelete {
    pub current_node_id: NodeId,
    pub parent_node_id: NodeId,
}

/// A node's payload changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeModify {
    pub current_node_id: NodeId,
    pub parent_node_id: NodeId,
}

/// A subtree was relocated by a drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeMove {
    pub current_node_id: NodeId,
    pub parent_node_id: NodeId,
    /// Position among the new parent's children.
    pub child_index: usize,
}

/// A row was clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeClick {
    pub current_node_id: NodeId,
}

/// Any event published on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEvent {
    Add(NodeAdd),
    Delete(NodeDelete),
    Modify(NodeModify),
    Move(NodeMove),
    Click(NodeClick),
}

/// Topic signals for tree changes.
#[derive(Debug, Default)]
pub struct TreeEventBus {
    pub node_add: Signal<NodeAdd>,
    pub node_delete: Signal<NodeDelete>,
    pub node_modify: Signal<NodeModify>,
    pub node_move: Signal<NodeMove>,
    pub node_click: Signal<NodeClick>,
}

impl TreeEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `event` on its topic.
    pub fn publish(&self, event: TreeEvent) {
        tracing::trace!(target: targets::CONTROLLER, ?event, "publishing");
        match event {
            TreeEvent::Add(e) => self.node_add.emit(e),
            TreeEvent::Delete(e) => self.node_delete.emit(e),
            TreeEvent::Modify(e) => self.node_modify.emit(e),
            TreeEvent::Move(e) => self.node_move.emit(e),
            TreeEvent::Click(e) => self.node_click.emit(e),
        }
    }

    /// Blocks or unblocks every topic.
    pub fn set_blocked(&self, blocked: bool) {
        self.node_add.set_blocked(blocked);
        self.node_delete.set_blocked(blocked);
        self.node_modify.set_blocked(blocked);
        self.node_move.set_blocked(blocked);
        self.node_click.set_blocked(blocked);
    }
}

/// Collects every event published on a bus, in order.
///
/// Useful for hosts that batch notifications, and for tests.
#[derive(Debug)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<TreeEvent>>>,
    connections: [ConnectionId; 5],
}

impl EventRecorder {
    /// Connects to every topic of `bus`.
    pub fn attach(bus: &TreeEventBus) -> Self {
        let events: Arc<Mutex<Vec<TreeEvent>>> = Arc::default();
        let connections = [
            bus.node_add.connect(sink_for(&events, |e: &NodeAdd| TreeEvent::Add(*e))),
            bus.node_delete.connect(sink_for(&events, |e: &NodeDelete| TreeEvent::Delete(*e))),
            bus.node_modify.connect(sink_for(&events, |e: &NodeModify| TreeEvent::Modify(*e))),
            bus.node_move.connect(sink_for(&events, |e: &NodeMove| TreeEvent::Move(*e))),
            bus.node_click.connect(sink_for(&events, |e: &NodeClick| TreeEvent::Click(*e))),
        ];
        Self { events, connections }
    }

    /// Disconnects from `bus`.
    pub fn detach(self, bus: &TreeEventBus) {
        let [add, delete, modify, moved, click] = self.connections;
        bus.node_add.disconnect(add);
        bus.node_delete.disconnect(delete);
        bus.node_modify.disconnect(modify);
        bus.node_move.disconnect(moved);
        bus.node_click.disconnect(click);
    }

    /// A copy of the events recorded so far.
    pub fn snapshot(&self) -> Vec<TreeEvent> {
        self.events.lock().clone()
    }

    /// Drains the recorded events.
    pub fn take(&self) -> Vec<TreeEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn sink_for<T: 'static>(
    events: &Arc<Mutex<Vec<TreeEvent>>>,
    wrap: impl Fn(&T) -> TreeEvent + Send + Sync + 'static,
) -> impl Fn(&T) + Send + Sync + 'static {
    let events = Arc::clone(events);
    move |e: &T| events.lock().push(wrap(e))
}

static_assertions::assert_impl_all!(TreeEventBus: Send, Sync);
static_assertions::assert_impl_all!(EventRecorder: Send, Sync);

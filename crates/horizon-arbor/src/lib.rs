//! Horizon Arbor - tree-to-list projection and drag-reordering engine.
//!
//! The crate backs a virtualized tree view:
//!
//! - [`TreeStore`]: id-keyed hierarchical node store with aggregate counts
//! - [`ListProjection`]: the flattened list of visible rows together with the
//!   expand/collapse, drag-and-drop and inline edit state machines
//! - [`TreeEventBus`]: add/delete/modify/move/click notifications
//! - [`TreeController`]: the façade a host drives
//!
//! Rendering is left to the host, which pulls rows through
//! [`TreeController::visible_count`] and [`TreeController::visible_at`].
//!
//! # Example
//!
//! ```
//! use horizon_arbor::{InteractionEvent, NodeId, NodeSpec, TreeController};
//!
//! let mut tree = TreeController::new();
//! tree.add_node(NodeSpec::folder(1, NodeId::ROOT, "Projects", "folder")).unwrap();
//! tree.add_node(NodeSpec::leaf(2, NodeId(1), "plan.md", "file")).unwrap();
//! tree.build_done();
//!
//! assert_eq!(tree.visible_count(), 1);
//! tree.toggle_expand(0).unwrap();
//! assert_eq!(tree.visible_count(), 2);
//!
//! tree.handle_event(NodeId(2), InteractionEvent::TouchDown).unwrap();
//! assert!(tree.get_children_id().unwrap().is_empty());
//! ```

pub mod config;
pub mod controller;
pub mod debug;
pub mod error;
pub mod events;
pub mod projection;
pub mod store;
pub mod validate;
pub mod view_state;

pub use config::TreeConfig;
pub use controller::{ChildNodeInfo, NodeSpec, TreeController};
pub use error::{Error, Result};
pub use events::{
    EventRecorder, NodeAdd, NodeClick, NodeDelete, NodeModify, NodeMove, TreeEvent, TreeEventBus,
};
pub use projection::{
    Caret, CommitOutcome, DragMove, DropOutcome, EventEffects, HoverTarget, InsertDirection,
    ListProjection, NodeView, TitleChange,
};
pub use store::{
    CapturedNode, ChildInfo, ContainerRef, MAX_LEVEL, NodeId, NodePayload, NodeVisitor, TreeNode,
    TreeStore,
};
pub use validate::{TitleError, sanitize_title, validate_title};
pub use view_state::{
    CollapseState, InteractionEvent, InteractionState, Key, MenuOperation, NodeViewState, Tooltip,
};

pub use horizon_arbor_core::logging;

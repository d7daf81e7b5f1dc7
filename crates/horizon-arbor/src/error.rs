//! Error types for the tree engine.

use crate::store::NodeId;
use crate::validate::TitleError;

/// Result type alias for tree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the tree engine.
///
/// Structural errors (`ParentNotFound`, `NodeNotFound`, `DepthExceeded`,
/// `DuplicateId`) indicate a mistake in the request and should not be retried
/// unchanged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested parent does not exist.
    #[error("parent node {parent_id} not found")]
    ParentNotFound { parent_id: NodeId },

    /// The node does not exist, or is not where the request expects it.
    #[error("node {node_id} not found")]
    NodeNotFound { node_id: NodeId },

    /// Inserting below the parent would exceed the nesting limit.
    #[error("node {parent_id} at level {level} cannot take children")]
    DepthExceeded { parent_id: NodeId, level: i32 },

    /// A live node already uses the id.
    #[error("node id {node_id} is already in use")]
    DuplicateId { node_id: NodeId },

    /// The root sentinel id was used where a real node is required.
    #[error("node id -1 is reserved for the root")]
    ReservedId,

    /// A node specification is missing required data.
    #[error("invalid node specification: {0}")]
    InvalidSpec(&'static str),

    /// A title failed validation.
    #[error("invalid title: {0}")]
    InvalidTitle(#[from] TitleError),

    /// A node was dropped onto itself or one of its descendants.
    #[error("cannot drop node {dragged} into its own subtree at {target}")]
    SelfDescendantDrop { dragged: NodeId, target: NodeId },

    /// The node is not in edit mode.
    #[error("node {node_id} is not being edited")]
    NotEditing { node_id: NodeId },

    /// The operation needs the projection, but `build_done` has not run.
    #[error("tree build has not been completed")]
    BuildPending,

    /// The operation acts on the clicked node, but none is recorded.
    #[error("no node has been clicked")]
    NoClickedNode,

    /// Configuration could not be parsed.
    #[error("failed to parse tree configuration: {0}")]
    Config(#[from] toml::de::Error),
}

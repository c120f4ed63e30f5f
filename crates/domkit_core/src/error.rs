//! Error types for domkit_core

use thiserror::Error;

use crate::NodeId;

/// Structural errors raised by the document model
///
/// These are programming errors (asking the tree to do something it cannot),
/// not expected absences. Expected absences surface as `Option` or `false`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The node id does not resolve to a live node
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    /// Inserting the node would make it its own ancestor
    #[error("cannot insert {child:?} under its own descendant {parent:?}")]
    Cycle { parent: NodeId, child: NodeId },

    /// Text nodes cannot have children
    #[error("node {0:?} cannot contain children")]
    NotAContainer(NodeId),

    /// The node is not a child of the given parent
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },

    /// The document node and its skeleton cannot be moved or released
    #[error("node {0:?} is part of the document skeleton")]
    Skeleton(NodeId),

    /// Releasing a node that is still attached to a parent
    #[error("node {0:?} is still attached")]
    StillAttached(NodeId),
}

/// Result type for domkit_core operations
pub type Result<T> = std::result::Result<T, DomError>;

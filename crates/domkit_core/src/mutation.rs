//! Child-list mutation notifications
//!
//! Observers register against a target node and receive one
//! [`MutationRecord`] per structural change. Delivery is synchronous: every
//! interested callback has run before the mutating call returns.

use std::fmt;
use std::rc::Rc;

use slotmap::new_key_type;

use crate::{Document, NodeId};

new_key_type! {
    /// Handle for a registered mutation observer
    pub struct ObserverId;
}

/// Callback invoked with each mutation record
pub type MutationCallback = Rc<dyn Fn(&mut Document, &MutationRecord)>;

/// Mutation observer options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationObserverInit {
    /// Report children added to or removed from the target
    pub child_list: bool,
    /// Also report changes anywhere below the target
    pub subtree: bool,
}

impl MutationObserverInit {
    /// Child-list changes for the whole subtree
    pub fn subtree() -> Self {
        Self {
            child_list: true,
            subtree: true,
        }
    }
}

/// A single structural change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// The parent whose child list changed
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
}

impl MutationRecord {
    pub(crate) fn added(target: NodeId, nodes: Vec<NodeId>) -> Self {
        Self {
            target,
            added_nodes: nodes,
            removed_nodes: Vec::new(),
        }
    }

    pub(crate) fn removed(target: NodeId, nodes: Vec<NodeId>) -> Self {
        Self {
            target,
            added_nodes: Vec::new(),
            removed_nodes: nodes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty() && self.removed_nodes.is_empty()
    }
}

pub(crate) struct Registration {
    pub target: NodeId,
    pub init: MutationObserverInit,
    pub callback: MutationCallback,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("target", &self.target)
            .field("init", &self.init)
            .finish_non_exhaustive()
    }
}

//! Removal observer
//!
//! Subscribes once to the document's child-list notifications and, for every
//! node that leaves the observed subtree, unbinds everything the registry
//! holds for it and its descendants. Reclamation runs inside the mutation
//! callback, so it has finished before the removing call returns.

use std::rc::Rc;

use domkit_core::{
    Document, MutationCallback, MutationObserverInit, MutationRecord, NodeId, ObserverId,
};
use tracing::debug;

use crate::Registry;

/// Installed removal observer
#[derive(Debug)]
pub struct Observer {
    id: ObserverId,
    root: NodeId,
}

impl Observer {
    /// Watch `root` and its subtree, reclaiming removed nodes recursively
    pub fn install(doc: &mut Document, registry: &Registry, root: NodeId) -> Self {
        Self::install_with(doc, registry, root, true)
    }

    /// Watch `root`; with `recursive` off only the removed nodes themselves are
    /// reclaimed, not their descendants
    pub fn install_with(
        doc: &mut Document,
        registry: &Registry,
        root: NodeId,
        recursive: bool,
    ) -> Self {
        let registry = registry.clone();
        let on_mutation = move |doc: &mut Document, record: &MutationRecord| {
            if record.removed_nodes.is_empty() {
                return;
            }
            let reclaimed = reclaim(doc, &registry, &record.removed_nodes, recursive);
            if reclaimed > 0 {
                debug!(
                    removed = record.removed_nodes.len(),
                    reclaimed, "reclaimed bindings of removed nodes"
                );
            }
        };

        let callback: MutationCallback = Rc::new(on_mutation);
        let id = doc.observe(root, MutationObserverInit::subtree(), callback);
        Self { id, root }
    }

    /// The node being watched
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Stop watching
    pub fn disconnect(self, doc: &mut Document) -> bool {
        doc.disconnect(self.id)
    }
}

/// Unbind every binding of `nodes` (and, if `recursive`, their descendants)
///
/// Text nodes are skipped. Returns the number of bindings removed.
pub fn reclaim(
    doc: &mut Document,
    registry: &Registry,
    nodes: &[NodeId],
    recursive: bool,
) -> usize {
    let before = registry.len();
    for &node in nodes {
        reclaim_node(doc, registry, node, recursive);
    }
    before - registry.len()
}

fn reclaim_node(doc: &mut Document, registry: &Registry, node: NodeId, recursive: bool) {
    if doc.is_text(node) {
        return;
    }
    registry.unbind_all(doc, node);
    if recursive {
        let children = doc.children(node).to_vec();
        for child in children {
            reclaim_node(doc, registry, child, recursive);
        }
    }
}

//! Document tree (arena-based)
//!
//! Nodes live in a slotmap keyed by [`NodeId`]. Removing a node from its
//! parent only detaches it; the slot stays alive until [`Document::release`]
//! frees the detached subtree, so ids held by callers never alias a new node.

use indexmap::IndexMap;
use slotmap::{new_key_type, Key, SlotMap};
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::error::{DomError, Result};
use crate::event::{Event, EventPhase, Handler, NativeListener};
use crate::geometry::Rect;
use crate::mutation::{
    MutationCallback, MutationObserverInit, MutationRecord, ObserverId, Registration,
};

new_key_type! {
    pub struct NodeId;
}

impl NodeId {
    /// Convert to a raw u64 representation
    ///
    /// Used to stash node ids in attributes and other type-erased places.
    pub fn to_raw(self) -> u64 {
        self.data().as_ffi()
    }

    /// Create from a raw u64 produced by `to_raw()`
    pub fn from_raw(raw: u64) -> Self {
        Self::from(slotmap::KeyData::from_ffi(raw))
    }
}

/// What a node is
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// The document itself
    Document,
    /// An element with a lowercase tag name
    Element(String),
    /// A text node
    Text(String),
}

/// A node in the arena
#[derive(Debug)]
pub struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: IndexMap<String, String>,
    style: IndexMap<String, String>,
    rect: Rect,
    listeners: SmallVec<[NativeListener; 2]>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            attributes: IndexMap::new(),
            style: IndexMap::new(),
            rect: Rect::default(),
            listeners: SmallVec::new(),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element(_))
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_))
    }

    /// Tag name if this is an element
    pub fn tag_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element(tag) => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    pub fn style(&self) -> &IndexMap<String, String> {
        &self.style
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn listeners(&self) -> &[NativeListener] {
        &self.listeners
    }
}

/// The document: node arena, skeleton and mutation observers
#[derive(Debug)]
pub struct Document {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
    html: NodeId,
    head: NodeId,
    body: NodeId,
    observers: SlotMap<ObserverId, Registration>,
    cookies: IndexMap<String, String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with an `<html>`, `<head>` and `<body>` skeleton
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new(NodeKind::Document));
        let html = nodes.insert(Node::new(NodeKind::Element("html".into())));
        let head = nodes.insert(Node::new(NodeKind::Element("head".into())));
        let body = nodes.insert(Node::new(NodeKind::Element("body".into())));

        nodes[root].children.push(html);
        nodes[html].parent = Some(root);
        nodes[html].children.extend([head, body]);
        nodes[head].parent = Some(html);
        nodes[body].parent = Some(html);

        Self {
            nodes,
            root,
            html,
            head,
            body,
            observers: SlotMap::with_key(),
            cookies: IndexMap::new(),
        }
    }

    /// The document node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The `<html>` element
    pub fn document_element(&self) -> NodeId {
        self.html
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    // =========================================================================
    // Node access
    // =========================================================================

    /// Get a node by id
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Check if the id resolves to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live nodes, attached or not
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn get(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id).ok_or(DomError::UnknownNode(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id).ok_or(DomError::UnknownNode(id))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Children of a node (empty for unknown ids)
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id).and_then(|n| n.tag_name())
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.nodes.get(id).map(|n| n.is_text()).unwrap_or(false)
    }

    /// Ancestors from the immediate parent up to the document node
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = self.parent(id);
        while let Some(node) = current {
            result.push(node);
            current = self.parent(node);
        }
        result
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Whether the node is attached to the document
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(id) && self.is_inclusive_ancestor(self.root, id)
    }

    /// All descendants in depth-first pre-order (excluding `id`)
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            result.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        result
    }

    fn is_skeleton(&self, id: NodeId) -> bool {
        id == self.root || id == self.html || id == self.head || id == self.body
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes
            .insert(Node::new(NodeKind::Element(tag.to_ascii_lowercase())))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.nodes.insert(Node::new(NodeKind::Text(text.into())))
    }

    // =========================================================================
    // Structure
    // =========================================================================

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let parent_node = self.get(parent)?;
        self.get(child)?;
        if parent_node.is_text() {
            return Err(DomError::NotAContainer(parent));
        }
        if self.is_skeleton(child) {
            return Err(DomError::Skeleton(child));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::Cycle { parent, child });
        }
        Ok(())
    }

    /// Append a child, moving it from its current parent if needed
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert a child before `reference` (or at the end when `None`)
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        self.check_insert(parent, child)?;
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(DomError::NotAChild {
                    parent,
                    child: reference,
                });
            }
        }

        if let Some(old_parent) = self.parent(child) {
            self.remove_child(old_parent, child)?;
        }

        let index = match reference {
            Some(reference) => self.nodes[parent]
                .children
                .iter()
                .position(|&c| c == reference)
                .unwrap_or(self.nodes[parent].children.len()),
            None => self.nodes[parent].children.len(),
        };
        self.nodes[parent].children.insert(index, child);
        self.nodes[child].parent = Some(parent);

        self.notify(MutationRecord::added(parent, vec![child]));
        Ok(())
    }

    /// Detach a child from its parent
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId> {
        self.get(parent)?;
        if self.get(child)?.parent != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        if self.is_skeleton(child) {
            return Err(DomError::Skeleton(child));
        }

        self.nodes[parent].children.retain(|&c| c != child);
        self.nodes[child].parent = None;

        self.notify(MutationRecord::removed(parent, vec![child]));
        Ok(child)
    }

    /// Detach a node from whatever parent it has
    ///
    /// Detached nodes are left alone.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        match self.get(id)?.parent {
            Some(parent) => self.remove_child(parent, id).map(|_| ()),
            None => Ok(()),
        }
    }

    /// Detach every child of `parent` as a single mutation
    pub fn clear_children(&mut self, parent: NodeId) -> Result<Vec<NodeId>> {
        self.replace_children(parent, &[])
    }

    /// Replace all children of `parent` as a single mutation
    pub fn replace_children(&mut self, parent: NodeId, children: &[NodeId]) -> Result<Vec<NodeId>> {
        for &child in children {
            self.check_insert(parent, child)?;
        }
        if let Some(&pinned) = self
            .children(parent)
            .iter()
            .find(|&&c| self.is_skeleton(c) && !children.contains(&c))
        {
            return Err(DomError::Skeleton(pinned));
        }

        // Moving nodes out of other parents is reported separately
        for &child in children {
            if let Some(old_parent) = self.parent(child) {
                if old_parent != parent {
                    self.remove_child(old_parent, child)?;
                }
            }
        }

        let previous = std::mem::take(&mut self.nodes[parent].children);
        let removed: Vec<NodeId> = previous
            .iter()
            .copied()
            .filter(|c| !children.contains(c))
            .collect();
        let added: Vec<NodeId> = children
            .iter()
            .copied()
            .filter(|c| !previous.contains(c))
            .collect();
        for &old in &removed {
            self.nodes[old].parent = None;
        }
        for &child in children {
            self.nodes[child].parent = Some(parent);
        }
        self.nodes[parent].children = children.to_vec();

        let record = MutationRecord {
            target: parent,
            added_nodes: added,
            removed_nodes: removed.clone(),
        };
        if !record.is_empty() {
            self.notify(record);
        }
        Ok(removed)
    }

    /// Free a detached subtree from the arena
    ///
    /// Listeners attached to the released nodes are dropped with them.
    pub fn release(&mut self, id: NodeId) -> Result<usize> {
        if self.is_skeleton(id) {
            return Err(DomError::Skeleton(id));
        }
        if self.get(id)?.parent.is_some() {
            return Err(DomError::StillAttached(id));
        }

        let mut doomed = self.descendants(id);
        doomed.push(id);
        for node in &doomed {
            self.nodes.remove(*node);
        }
        trace!("released {} nodes", doomed.len());
        Ok(doomed.len())
    }

    // =========================================================================
    // Attributes and text
    // =========================================================================

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(id)
            .and_then(|n| n.attributes.get(name))
            .map(String::as_str)
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> Result<()> {
        let node = self.get_mut(id)?;
        if !node.is_element() {
            return Err(DomError::NotAContainer(id));
        }
        node.attributes.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Remove an attribute, returning its old value
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.nodes
            .get_mut(id)
            .and_then(|n| n.attributes.shift_remove(name))
    }

    /// Class names from the `class` attribute
    pub fn class_list(&self, id: NodeId) -> Vec<&str> {
        self.attribute(id, "class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.class_list(id).contains(&class)
    }

    /// Add a class name if not already present
    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<()> {
        if self.has_class(id, class) {
            return Ok(());
        }
        let mut classes: Vec<String> = self.class_list(id).into_iter().map(String::from).collect();
        classes.push(class.to_string());
        self.set_attribute(id, "class", classes.join(" "))
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> Result<()> {
        if !self.has_class(id, class) {
            return Ok(());
        }
        let classes: Vec<String> = self
            .class_list(id)
            .into_iter()
            .filter(|c| *c != class)
            .map(String::from)
            .collect();
        self.set_attribute(id, "class", classes.join(" "))
    }

    /// Text of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Concatenated text of the node and its descendants
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// Replace the contents of a text node in place
    pub fn set_text_data(&mut self, id: NodeId, text: impl Into<String>) -> Result<()> {
        match &mut self.get_mut(id)?.kind {
            NodeKind::Text(content) => {
                *content = text.into();
                Ok(())
            }
            _ => Err(DomError::NotAContainer(id)),
        }
    }

    /// Replace all children of an element with a single text node
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<NodeId> {
        let text_node = self.create_text(text);
        self.replace_children(id, &[text_node])?;
        Ok(text_node)
    }

    // =========================================================================
    // Inline style and geometry
    // =========================================================================

    pub fn style_property(&self, id: NodeId, property: &str) -> Option<&str> {
        self.nodes
            .get(id)
            .and_then(|n| n.style.get(property))
            .map(String::as_str)
    }

    /// Set an inline style property; an empty value removes it
    pub fn set_style_property(&mut self, id: NodeId, property: &str, value: &str) -> Result<()> {
        let node = self.get_mut(id)?;
        if value.is_empty() {
            node.style.shift_remove(property);
        } else {
            node.style.insert(property.to_string(), value.to_string());
        }
        Ok(())
    }

    pub fn set_rect(&mut self, id: NodeId, rect: Rect) -> Result<()> {
        self.get_mut(id)?.rect = rect;
        Ok(())
    }

    /// Bounding box of a node (empty for unknown ids)
    pub fn bounding_rect(&self, id: NodeId) -> Rect {
        self.nodes.get(id).map(|n| n.rect).unwrap_or_default()
    }

    // =========================================================================
    // Cookies
    // =========================================================================

    /// Apply a `Set-Cookie` style string, as the `document.cookie` setter does
    ///
    /// A non-positive `max-age` deletes the cookie.
    pub fn write_cookie(&mut self, header: &str) {
        let mut parts = header.split(';').map(str::trim);
        let Some((name, value)) = parts.next().and_then(|p| p.split_once('=')) else {
            return;
        };
        let expired = parts.any(|attr| {
            attr.split_once('=')
                .filter(|(k, _)| k.trim().eq_ignore_ascii_case("max-age"))
                .and_then(|(_, v)| v.trim().parse::<i64>().ok())
                .map(|age| age <= 0)
                .unwrap_or(false)
        });

        if expired {
            self.cookies.shift_remove(name.trim());
        } else {
            self.cookies
                .insert(name.trim().to_string(), value.trim().to_string());
        }
    }

    /// The cookie string, `name=value` pairs joined by `; `
    pub fn cookie(&self) -> String {
        self.cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    // =========================================================================
    // Native listeners
    // =========================================================================

    /// Attach a native listener; returns false for unknown nodes
    pub fn add_event_listener(
        &mut self,
        id: NodeId,
        event: &str,
        handler: Handler,
        capture: bool,
    ) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        node.listeners.push(NativeListener {
            event: event.to_string(),
            handler,
            capture,
        });
        true
    }

    /// Detach one native listener matching name, handler and capture flag
    pub fn remove_event_listener(
        &mut self,
        id: NodeId,
        event: &str,
        handler: &Handler,
        capture: bool,
    ) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        match node
            .listeners
            .iter()
            .position(|l| l.matches(event, handler, capture))
        {
            Some(index) => {
                node.listeners.remove(index);
                true
            }
            None => false,
        }
    }

    /// Number of native listeners on a node, optionally for one event name
    pub fn listener_count(&self, id: NodeId, event: Option<&str>) -> usize {
        self.nodes
            .get(id)
            .map(|n| {
                n.listeners
                    .iter()
                    .filter(|l| event.map_or(true, |e| l.event == e))
                    .count()
            })
            .unwrap_or(0)
    }

    fn has_listener(&self, id: NodeId, listener: &NativeListener) -> bool {
        self.nodes
            .get(id)
            .map(|n| {
                n.listeners
                    .iter()
                    .any(|l| l.matches(&listener.event, &listener.handler, listener.capture))
            })
            .unwrap_or(false)
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Dispatch an event to `target`
    ///
    /// Returns `false` if a listener prevented the default action.
    pub fn dispatch_event(&mut self, target: NodeId, mut event: Event) -> bool {
        if !self.contains(target) {
            return true;
        }
        event.begin(target);
        trace!(event = event.name(), ?target, "dispatch");

        let path = self.ancestors(target);

        for &node in path.iter().rev() {
            if event.is_propagation_stopped() {
                break;
            }
            self.invoke(node, &mut event, EventPhase::Capturing);
        }

        if !event.is_propagation_stopped() {
            self.invoke(target, &mut event, EventPhase::AtTarget);
        }

        if event.bubbles() {
            for &node in &path {
                if event.is_propagation_stopped() {
                    break;
                }
                self.invoke(node, &mut event, EventPhase::Bubbling);
            }
        }

        event.finish();
        !event.is_default_prevented()
    }

    fn invoke(&mut self, node: NodeId, event: &mut Event, phase: EventPhase) {
        // Snapshot so listeners may add or remove listeners while running
        let snapshot: SmallVec<[NativeListener; 4]> = match self.nodes.get(node) {
            Some(n) => n
                .listeners
                .iter()
                .filter(|l| l.event == event.name())
                .filter(|l| match phase {
                    EventPhase::Capturing => l.capture,
                    EventPhase::Bubbling => !l.capture,
                    _ => true,
                })
                .cloned()
                .collect(),
            None => return,
        };

        let snapshot = if phase == EventPhase::AtTarget {
            // Capture listeners run first at the target
            type Listeners = SmallVec<[NativeListener; 4]>;
            let (mut capture, bubble): (Listeners, Listeners) =
                snapshot.into_iter().partition(|l| l.capture);
            capture.extend(bubble);
            capture
        } else {
            snapshot
        };

        event.enter(node, phase);
        for listener in snapshot {
            if event.is_immediate_propagation_stopped() {
                break;
            }
            // Skip listeners removed by an earlier listener in this pass
            if !self.has_listener(node, &listener) {
                continue;
            }
            listener.handler.call(self, event);
        }
    }

    // =========================================================================
    // Mutation observers
    // =========================================================================

    /// Register a mutation callback for `target`
    pub fn observe(
        &mut self,
        target: NodeId,
        init: MutationObserverInit,
        callback: MutationCallback,
    ) -> ObserverId {
        debug!(?target, ?init, "observe");
        self.observers.insert(Registration {
            target,
            init,
            callback,
        })
    }

    /// Stop delivering records to an observer
    pub fn disconnect(&mut self, id: ObserverId) -> bool {
        self.observers.remove(id).is_some()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn notify(&mut self, record: MutationRecord) {
        let interested: Vec<MutationCallback> = self
            .observers
            .values()
            .filter(|r| r.init.child_list)
            .filter(|r| {
                r.target == record.target
                    || (r.init.subtree && self.is_inclusive_ancestor(r.target, record.target))
            })
            .map(|r| r.callback.clone())
            .collect();

        for callback in interested {
            callback(self, &record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn counter() -> (Rc<Cell<u32>>, Handler) {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        (count, Handler::new(move |_, _| c.set(c.get() + 1)))
    }

    #[test]
    fn test_skeleton() {
        let doc = Document::new();
        assert_eq!(doc.tag_name(doc.body()), Some("body"));
        assert_eq!(doc.parent(doc.body()), Some(doc.document_element()));
        assert!(doc.is_connected(doc.body()));
    }

    #[test]
    fn test_append_and_remove() {
        let mut doc = Document::new();
        let div = doc.create_element("DIV");
        assert_eq!(doc.tag_name(div), Some("div"));
        assert!(!doc.is_connected(div));

        doc.append_child(doc.body(), div).unwrap();
        assert!(doc.is_connected(div));
        assert_eq!(doc.children(doc.body()), &[div]);

        doc.remove(div).unwrap();
        assert!(!doc.is_connected(div));
        assert!(doc.contains(div));
    }

    #[test]
    fn test_insert_before() {
        let mut doc = Document::new();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        doc.append_child(doc.body(), b).unwrap();
        doc.insert_before(doc.body(), a, Some(b)).unwrap();
        assert_eq!(doc.children(doc.body()), &[a, b]);
    }

    #[test]
    fn test_cycle_rejected() {
        let mut doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        doc.append_child(outer, inner).unwrap();

        let err = doc.append_child(inner, outer).unwrap_err();
        assert_eq!(
            err,
            DomError::Cycle {
                parent: inner,
                child: outer
            }
        );
    }

    #[test]
    fn test_text_cannot_have_children() {
        let mut doc = Document::new();
        let text = doc.create_text("hi");
        let span = doc.create_element("span");
        assert_eq!(
            doc.append_child(text, span),
            Err(DomError::NotAContainer(text))
        );
    }

    #[test]
    fn test_release_requires_detached() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        let child = doc.create_element("span");
        doc.append_child(div, child).unwrap();
        doc.append_child(doc.body(), div).unwrap();

        assert_eq!(doc.release(div), Err(DomError::StillAttached(div)));
        doc.remove(div).unwrap();
        assert_eq!(doc.release(div), Ok(2));
        assert!(!doc.contains(child));
    }

    #[test]
    fn test_classes() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        doc.add_class(div, "a").unwrap();
        doc.add_class(div, "b").unwrap();
        doc.add_class(div, "a").unwrap();
        assert_eq!(doc.attribute(div, "class"), Some("a b"));
        doc.remove_class(div, "a").unwrap();
        assert_eq!(doc.class_list(div), vec!["b"]);
    }

    #[test]
    fn test_text_content() {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        let t1 = doc.create_text("Hello, ");
        let b = doc.create_element("b");
        let t2 = doc.create_text("world");
        doc.append_child(p, t1).unwrap();
        doc.append_child(p, b).unwrap();
        doc.append_child(b, t2).unwrap();
        assert_eq!(doc.text_content(p), "Hello, world");

        doc.set_text(p, "replaced").unwrap();
        assert_eq!(doc.text_content(p), "replaced");
        assert_eq!(doc.children(p).len(), 1);
    }

    #[test]
    fn test_bubbling_and_capture_order() {
        let mut doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("span");
        doc.append_child(doc.body(), outer).unwrap();
        doc.append_child(outer, inner).unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        for (node, capture, label) in [
            (outer, true, "outer-capture"),
            (inner, false, "inner"),
            (outer, false, "outer-bubble"),
        ] {
            let log = Rc::clone(&log);
            doc.add_event_listener(
                node,
                "click",
                Handler::new(move |_, _| log.borrow_mut().push(label)),
                capture,
            );
        }

        doc.dispatch_event(inner, Event::new("click"));
        assert_eq!(
            *log.borrow(),
            vec!["outer-capture", "inner", "outer-bubble"]
        );
    }

    #[test]
    fn test_stop_propagation() {
        let mut doc = Document::new();
        let inner = doc.create_element("span");
        doc.append_child(doc.body(), inner).unwrap();

        let (count, outer_handler) = counter();
        doc.add_event_listener(doc.root(), "click", outer_handler, false);
        doc.add_event_listener(
            inner,
            "click",
            Handler::new(|_, e| e.stop_propagation()),
            false,
        );

        doc.dispatch_event(inner, Event::new("click"));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_non_bubbling_event() {
        let mut doc = Document::new();
        let inner = doc.create_element("span");
        doc.append_child(doc.body(), inner).unwrap();

        let (count, handler) = counter();
        doc.add_event_listener(doc.body(), "focus", handler, false);
        doc.dispatch_event(inner, Event::new("focus").with_bubbles(false));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_listener_added_during_dispatch_does_not_run() {
        let mut doc = Document::new();
        let (count, late) = counter();
        let root = doc.root();
        doc.add_event_listener(
            root,
            "click",
            Handler::new(move |doc, _| {
                doc.add_event_listener(root, "click", late.clone(), false);
            }),
            false,
        );

        doc.dispatch_event(doc.body(), Event::new("click"));
        assert_eq!(count.get(), 0);
        assert_eq!(doc.listener_count(root, Some("click")), 2);
    }

    #[test]
    fn test_remove_event_listener_removes_one() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        let (_, handler) = counter();
        doc.add_event_listener(div, "click", handler.clone(), false);
        doc.add_event_listener(div, "click", handler.clone(), false);
        doc.add_event_listener(div, "click", handler.clone(), true);

        assert!(doc.remove_event_listener(div, "click", &handler, false));
        assert_eq!(doc.listener_count(div, Some("click")), 2);
        assert!(!doc.remove_event_listener(div, "keydown", &handler, false));
    }

    #[test]
    fn test_mutation_records() {
        let mut doc = Document::new();
        let records = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&records);
        let id = doc.observe(
            doc.body(),
            MutationObserverInit::subtree(),
            Rc::new(move |_: &mut Document, record: &MutationRecord| {
                sink.borrow_mut().push(record.clone())
            }),
        );

        let list = doc.create_element("ul");
        let item = doc.create_element("li");
        doc.append_child(list, item).unwrap();
        doc.append_child(doc.body(), list).unwrap();
        doc.remove_child(list, item).unwrap();

        {
            let records = records.borrow();
            assert_eq!(records.len(), 2);
            assert_eq!(records[0].added_nodes, vec![list]);
            assert_eq!(records[1].target, list);
            assert_eq!(records[1].removed_nodes, vec![item]);
        }

        assert!(doc.disconnect(id));
        doc.remove(list).unwrap();
        assert_eq!(records.borrow().len(), 2);
    }

    #[test]
    fn test_clear_children_is_one_batch() {
        let mut doc = Document::new();
        let list = doc.create_element("ul");
        doc.append_child(doc.body(), list).unwrap();
        for _ in 0..3 {
            let li = doc.create_element("li");
            doc.append_child(list, li).unwrap();
        }

        let batches = Rc::new(Cell::new(0));
        let b = Rc::clone(&batches);
        doc.observe(
            list,
            MutationObserverInit {
                child_list: true,
                subtree: false,
            },
            Rc::new(move |_: &mut Document, record: &MutationRecord| {
                assert_eq!(record.removed_nodes.len(), 3);
                b.set(b.get() + 1);
            }),
        );

        let removed = doc.clear_children(list).unwrap();
        assert_eq!(removed.len(), 3);
        assert_eq!(batches.get(), 1);
    }

    #[test]
    fn test_cookies() {
        let mut doc = Document::new();
        doc.write_cookie("theme=dark; path=/");
        doc.write_cookie("lang=en");
        assert_eq!(doc.cookie(), "theme=dark; lang=en");

        doc.write_cookie("theme=; max-age=0");
        assert_eq!(doc.cookie(), "lang=en");
    }

    #[test]
    fn test_raw_roundtrip() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        assert_eq!(NodeId::from_raw(div.to_raw()), div);
    }
}

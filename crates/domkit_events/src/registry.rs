//! Event binding registry
//!
//! Records every listener attached through domkit so it can be detached
//! again without the caller holding on to the node, the event name and the
//! handler.
//!
//! # Architecture
//!
//! ```text
//! Registry::bind(node, "click", handler)
//!     ├─ Document::add_event_listener      (native listener on the node)
//!     └─ sets["click"].push(Binding)       (record)
//!
//! Registry::unbind(node, event?, handler?)
//!     ├─ sets[..].remove(matching)         (record)
//!     └─ Document::remove_event_listener   (on the binding's own node)
//! ```
//!
//! Every record is backed by exactly one native listener. The registry never
//! holds its internal borrow while calling into the document.
//!
//! # Example
//!
//! ```rust
//! use domkit_core::{Document, Event};
//! use domkit_events::Registry;
//!
//! let mut doc = Document::new();
//! let registry = Registry::new();
//! let button = doc.create_element("button");
//! doc.append_child(doc.body(), button).unwrap();
//!
//! let handler = registry.on(&mut doc, button, "click", |_, _| println!("clicked"));
//! assert_eq!(registry.count(Some(button)), 1);
//!
//! assert!(registry.unbind(&mut doc, button, Some("click"), Some(&handler)));
//! assert_eq!(doc.listener_count(button, None), 0);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use domkit_core::{Document, Event, Handler, NodeId};
use indexmap::IndexMap;
use tracing::{debug, trace};

/// A recorded listener
#[derive(Clone, Debug)]
pub struct Binding {
    pub node: NodeId,
    pub event: String,
    pub handler: Handler,
    pub capture: bool,
}

impl Binding {
    fn matches(&self, node: NodeId, handler: Option<&Handler>) -> bool {
        self.node == node && handler.map_or(true, |h| self.handler.ptr_eq(h))
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    /// Bindings grouped by event name, in order of first registration
    sets: IndexMap<String, Vec<Binding>>,
}

impl RegistryInner {
    /// Remove matching records without touching the document
    ///
    /// With a handler filter the first match ends the scan, even when several
    /// event sets are searched.
    fn take_matching(
        &mut self,
        node: NodeId,
        event: Option<&str>,
        handler: Option<&Handler>,
    ) -> Vec<Binding> {
        let names: Vec<String> = match event {
            Some(event) => vec![event.to_string()],
            None => self.sets.keys().cloned().collect(),
        };

        let mut removed = Vec::new();
        for name in names {
            let Some(set) = self.sets.get_mut(&name) else {
                continue;
            };

            let mut index = 0;
            let mut done = false;
            while index < set.len() {
                if set[index].matches(node, handler) {
                    removed.push(set.remove(index));
                    if handler.is_some() {
                        done = true;
                        break;
                    }
                } else {
                    index += 1;
                }
            }

            if set.is_empty() {
                self.sets.shift_remove(&name);
            }
            if done {
                break;
            }
        }
        removed
    }
}

/// Shared handle to the binding registry
///
/// Cloning is cheap and yields a handle to the same registry. Construct one
/// per document and pass it to everything that binds events.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl Registry {
    /// Create a new, empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `handler` to `node` and record the binding
    ///
    /// No-op (returns `false`) when `node` is not a live node. Binding the
    /// same triple twice yields two listeners and two records.
    pub fn bind(
        &self,
        doc: &mut Document,
        node: NodeId,
        event: &str,
        handler: Handler,
        capture: bool,
    ) -> bool {
        if !doc.contains(node) {
            trace!(?node, event, "bind skipped: absent node");
            return false;
        }

        doc.add_event_listener(node, event, handler.clone(), capture);
        self.inner
            .borrow_mut()
            .sets
            .entry(event.to_string())
            .or_default()
            .push(Binding {
                node,
                event: event.to_string(),
                handler,
                capture,
            });
        trace!(?node, event, capture, "bind");
        true
    }

    /// Bind a closure for the bubble phase, returning its handler for later unbinding
    pub fn on<F>(&self, doc: &mut Document, node: NodeId, event: &str, f: F) -> Handler
    where
        F: Fn(&mut Document, &mut Event) + 'static,
    {
        let handler = Handler::new(f);
        self.bind(doc, node, event, handler.clone(), false);
        handler
    }

    /// Detach bindings of `node`
    ///
    /// - `event`: only search that event's set (all sets when `None`)
    /// - `handler`: only remove bindings of that handler, and only the first
    ///   one found (every binding of the node when `None`)
    ///
    /// Native listeners are removed from the node recorded in each binding.
    /// Returns `false` when nothing matched.
    pub fn unbind(
        &self,
        doc: &mut Document,
        node: NodeId,
        event: Option<&str>,
        handler: Option<&Handler>,
    ) -> bool {
        let removed = self.inner.borrow_mut().take_matching(node, event, handler);
        if removed.is_empty() {
            return false;
        }

        for binding in &removed {
            let detached = doc.remove_event_listener(
                binding.node,
                &binding.event,
                &binding.handler,
                binding.capture,
            );
            if !detached {
                // The node was released with its listeners still attached
                debug!(
                    node = ?binding.node,
                    event = %binding.event,
                    "no native listener to detach"
                );
            }
        }
        trace!(?node, ?event, count = removed.len(), "unbind");
        true
    }

    /// Detach every binding of `node`, for every event and handler
    pub fn unbind_all(&self, doc: &mut Document, node: NodeId) -> bool {
        self.unbind(doc, node, None, None)
    }

    /// Drop records whose node no longer exists in the document
    ///
    /// Released nodes take their native listeners with them, so only the
    /// records are left to clean up.
    pub fn prune(&self, doc: &Document) -> usize {
        let mut inner = self.inner.borrow_mut();
        let mut pruned = 0;
        for set in inner.sets.values_mut() {
            let before = set.len();
            set.retain(|b| doc.contains(b.node));
            pruned += before - set.len();
        }
        inner.sets.retain(|_, set| !set.is_empty());
        if pruned > 0 {
            debug!(pruned, "pruned bindings of released nodes");
        }
        pruned
    }

    /// Number of bindings, optionally restricted to one node
    pub fn count(&self, node: Option<NodeId>) -> usize {
        self.inner
            .borrow()
            .sets
            .values()
            .flatten()
            .filter(|b| node.map_or(true, |n| b.node == n))
            .count()
    }

    /// Total number of bindings
    pub fn len(&self) -> usize {
        self.count(None)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().sets.is_empty()
    }

    /// Snapshot of the bindings of one node
    pub fn bindings_for(&self, node: NodeId) -> Vec<Binding> {
        self.inner
            .borrow()
            .sets
            .values()
            .flatten()
            .filter(|b| b.node == node)
            .cloned()
            .collect()
    }

    /// Event names that currently have bindings
    pub fn events(&self) -> Vec<String> {
        self.inner.borrow().sets.keys().cloned().collect()
    }

    /// Whether `handler` is bound to `node` for `event`
    pub fn is_bound(&self, node: NodeId, event: &str, handler: &Handler) -> bool {
        self.inner
            .borrow()
            .sets
            .get(event)
            .map(|set| set.iter().any(|b| b.matches(node, Some(handler))))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn setup() -> (Document, Registry, NodeId) {
        let mut doc = Document::new();
        let node = doc.create_element("div");
        doc.append_child(doc.body(), node).unwrap();
        (doc, Registry::new(), node)
    }

    fn counting_handler() -> (Rc<Cell<u32>>, Handler) {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        (count, Handler::new(move |_, _| c.set(c.get() + 1)))
    }

    #[test]
    fn test_bind_attaches_native_listener() {
        let (mut doc, registry, node) = setup();
        let (count, handler) = counting_handler();

        assert!(registry.bind(&mut doc, node, "click", handler, false));
        assert_eq!(doc.listener_count(node, Some("click")), 1);
        assert_eq!(registry.count(Some(node)), 1);

        doc.dispatch_event(node, Event::new("click"));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_bind_absent_node_is_noop() {
        let (mut doc, registry, node) = setup();
        doc.remove(node).unwrap();
        doc.release(node).unwrap();

        let (_, handler) = counting_handler();
        assert!(!registry.bind(&mut doc, node, "click", handler, false));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_bind_yields_two_listeners() {
        let (mut doc, registry, node) = setup();
        let (count, handler) = counting_handler();

        registry.bind(&mut doc, node, "click", handler.clone(), false);
        registry.bind(&mut doc, node, "click", handler, false);
        assert_eq!(registry.count(Some(node)), 2);
        assert_eq!(doc.listener_count(node, Some("click")), 2);

        doc.dispatch_event(node, Event::new("click"));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_unbind_event_clears_every_capture_setting() {
        let (mut doc, registry, node) = setup();
        let (_, a) = counting_handler();
        let (_, b) = counting_handler();
        let (_, keep) = counting_handler();

        registry.bind(&mut doc, node, "click", a, false);
        registry.bind(&mut doc, node, "click", b, true);
        registry.bind(&mut doc, node, "keydown", keep, false);

        assert!(registry.unbind(&mut doc, node, Some("click"), None));
        assert_eq!(doc.listener_count(node, Some("click")), 0);
        assert_eq!(doc.listener_count(node, Some("keydown")), 1);
        assert_eq!(registry.count(Some(node)), 1);
    }

    #[test]
    fn test_unbind_handler_is_single_shot() {
        let (mut doc, registry, node) = setup();
        let (_, handler) = counting_handler();

        registry.bind(&mut doc, node, "click", handler.clone(), false);
        registry.bind(&mut doc, node, "mouseup", handler.clone(), false);
        registry.bind(&mut doc, node, "click", handler.clone(), false);

        // No event: the first match across all sets ends the scan
        assert!(registry.unbind(&mut doc, node, None, Some(&handler)));
        assert_eq!(registry.count(Some(node)), 2);

        // With an event: still one binding per call
        assert!(registry.unbind(&mut doc, node, Some("click"), Some(&handler)));
        assert_eq!(registry.count(Some(node)), 1);
        assert_eq!(doc.listener_count(node, None), 1);
    }

    #[test]
    fn test_unbind_keeps_binding_order() {
        let (mut doc, registry, node) = setup();
        let handlers: Vec<Handler> = (0..4).map(|_| counting_handler().1).collect();
        for handler in &handlers {
            registry.bind(&mut doc, node, "click", handler.clone(), false);
        }

        assert!(registry.unbind(&mut doc, node, Some("click"), Some(&handlers[0])));
        let remaining: Vec<Handler> = registry
            .bindings_for(node)
            .into_iter()
            .map(|b| b.handler)
            .collect();
        assert_eq!(remaining.len(), 3);
        for (bound, expected) in remaining.iter().zip(&handlers[1..]) {
            assert!(bound.ptr_eq(expected));
        }
    }

    #[test]
    fn test_unbind_only_touches_the_given_node() {
        let (mut doc, registry, node) = setup();
        let other = doc.create_element("span");
        doc.append_child(doc.body(), other).unwrap();
        let (_, handler) = counting_handler();

        registry.bind(&mut doc, node, "click", handler.clone(), false);
        registry.bind(&mut doc, other, "click", handler.clone(), false);

        assert!(registry.unbind(&mut doc, other, Some("click"), Some(&handler)));
        assert!(registry.is_bound(node, "click", &handler));
        assert_eq!(doc.listener_count(node, Some("click")), 1);
        assert_eq!(doc.listener_count(other, Some("click")), 0);
    }

    #[test]
    fn test_unbind_without_match_returns_false() {
        let (mut doc, registry, node) = setup();
        assert!(!registry.unbind(&mut doc, node, Some("click"), None));

        let (_, handler) = counting_handler();
        let (_, stranger) = counting_handler();
        registry.bind(&mut doc, node, "click", handler, false);
        assert!(!registry.unbind(&mut doc, node, Some("click"), Some(&stranger)));
        assert!(!registry.unbind(&mut doc, node, Some("keydown"), None));
    }

    #[test]
    fn test_unbind_all_is_idempotent() {
        let (mut doc, registry, node) = setup();
        registry.on(&mut doc, node, "click", |_, _| {});
        registry.on(&mut doc, node, "focus", |_, _| {});

        assert!(registry.unbind_all(&mut doc, node));
        assert_eq!(doc.listener_count(node, None), 0);
        assert!(registry.is_empty());

        assert!(!registry.unbind_all(&mut doc, node));
        assert!(registry.events().is_empty());
    }

    #[test]
    fn test_prune_released_nodes() {
        let (mut doc, registry, node) = setup();
        registry.on(&mut doc, node, "click", |_, _| {});
        doc.remove(node).unwrap();
        doc.release(node).unwrap();

        assert_eq!(registry.prune(&doc), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_handler_may_unbind_itself() {
        let (mut doc, registry, node) = setup();
        let count = Rc::new(Cell::new(0));

        let slot: Rc<RefCell<Option<Handler>>> = Rc::new(RefCell::new(None));
        let handler = {
            let registry = registry.clone();
            let slot = Rc::clone(&slot);
            let count = Rc::clone(&count);
            Handler::new(move |doc, event| {
                count.set(count.get() + 1);
                let (Some(me), Some(node)) = (slot.borrow().clone(), event.current_target()) else {
                    return;
                };
                registry.unbind(doc, node, Some("click"), Some(&me));
            })
        };
        *slot.borrow_mut() = Some(handler.clone());
        registry.bind(&mut doc, node, "click", handler, false);

        doc.dispatch_event(node, Event::new("click"));
        doc.dispatch_event(node, Event::new("click"));
        assert_eq!(count.get(), 1);
        assert!(registry.is_empty());
    }
}

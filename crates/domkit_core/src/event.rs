//! Native event listeners and the event object
//!
//! Listeners live on the node they are attached to. Dispatch walks the
//! ancestor chain in three phases:
//!
//! ```text
//! capture:  document → ... → parent      (capture listeners only)
//! target:   target                       (all listeners)
//! bubble:   parent → ... → document      (non-capture, only if the event bubbles)
//! ```
//!
//! # Example
//!
//! ```rust
//! use domkit_core::{Document, Event, Handler};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let mut doc = Document::new();
//! let button = doc.create_element("button");
//! doc.append_child(doc.body(), button).unwrap();
//!
//! let clicks = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&clicks);
//! let handler = Handler::new(move |_, _| counter.set(counter.get() + 1));
//! doc.add_event_listener(button, "click", handler, false);
//!
//! doc.dispatch_event(button, Event::new("click"));
//! assert_eq!(clicks.get(), 1);
//! ```

use std::fmt;
use std::rc::Rc;

use crate::{Document, NodeId};

/// Callback signature for native listeners
///
/// Uses Rc since the document is single-threaded.
pub type ListenerFn = dyn Fn(&mut Document, &mut Event);

/// A shared event callback
///
/// Identity is the identity of the shared allocation: clones of a handler
/// compare equal, two separately created handlers never do.
#[derive(Clone)]
pub struct Handler(Rc<ListenerFn>);

impl Handler {
    /// Wrap a closure as a handler
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Document, &mut Event) + 'static,
    {
        Self(Rc::new(f))
    }

    /// Invoke the handler
    pub fn call(&self, doc: &mut Document, event: &mut Event) {
        (self.0)(doc, event)
    }

    /// Reference identity
    pub fn ptr_eq(&self, other: &Handler) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.0) as *const (),
            Rc::as_ptr(&other.0) as *const (),
        )
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// A listener attached to a node
#[derive(Clone, Debug)]
pub struct NativeListener {
    /// Event name, e.g. `click`
    pub event: String,
    pub handler: Handler,
    /// Whether the listener runs in the capture phase
    pub capture: bool,
}

impl NativeListener {
    pub(crate) fn matches(&self, event: &str, handler: &Handler, capture: bool) -> bool {
        self.event == event && self.capture == capture && self.handler.ptr_eq(handler)
    }
}

/// Dispatch phase
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EventPhase {
    #[default]
    None,
    Capturing,
    AtTarget,
    Bubbling,
}

/// An event travelling through the tree
#[derive(Clone, Debug)]
pub struct Event {
    name: String,
    target: Option<NodeId>,
    current_target: Option<NodeId>,
    phase: EventPhase,
    bubbles: bool,
    cancelable: bool,
    default_prevented: bool,
    propagation_stopped: bool,
    immediate_propagation_stopped: bool,
    /// Payload of custom events
    pub detail: Option<String>,
    /// Pointer position for mouse events
    pub client_x: f32,
    pub client_y: f32,
}

impl Event {
    /// Create a bubbling, cancelable event
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: None,
            current_target: None,
            phase: EventPhase::None,
            bubbles: true,
            cancelable: true,
            default_prevented: false,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
            detail: None,
            client_x: 0.0,
            client_y: 0.0,
        }
    }

    /// Create a custom event carrying a detail payload
    pub fn custom(name: impl Into<String>, detail: impl Into<String>) -> Self {
        let mut event = Self::new(name);
        event.detail = Some(detail.into());
        event
    }

    /// Create a mouse event at the given pointer position
    pub fn mouse(name: impl Into<String>, x: f32, y: f32) -> Self {
        Self::new(name).with_position(x, y)
    }

    /// Set whether the event bubbles
    pub fn with_bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    /// Set whether the event can be cancelled
    pub fn with_cancelable(mut self, cancelable: bool) -> Self {
        self.cancelable = cancelable;
        self
    }

    /// Set the pointer position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.client_x = x;
        self.client_y = y;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The node the event was dispatched to
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    /// The node whose listeners are currently running
    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target
    }

    pub fn phase(&self) -> EventPhase {
        self.phase
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// Prevent the default action (only for cancelable events)
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Stop the event from reaching further nodes
    ///
    /// Remaining listeners on the current node still run.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Stop the event, including the remaining listeners on the current node
    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_propagation_stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub(crate) fn is_immediate_propagation_stopped(&self) -> bool {
        self.immediate_propagation_stopped
    }

    pub(crate) fn begin(&mut self, target: NodeId) {
        self.target = Some(target);
        self.propagation_stopped = false;
        self.immediate_propagation_stopped = false;
    }

    pub(crate) fn enter(&mut self, node: NodeId, phase: EventPhase) {
        self.current_target = Some(node);
        self.phase = phase;
    }

    pub(crate) fn finish(&mut self) {
        self.current_target = None;
        self.phase = EventPhase::None;
    }
}

/// Dispatch a custom bubbling event carrying `detail` to `node`
///
/// Returns `false` if a listener prevented the default action.
pub fn fire(doc: &mut Document, node: NodeId, name: &str, detail: impl Into<String>) -> bool {
    doc.dispatch_event(node, Event::custom(name, detail))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_identity() {
        let a = Handler::new(|_, _| {});
        let b = Handler::new(|_, _| {});
        let a2 = a.clone();

        assert_eq!(a, a2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_prevent_default_requires_cancelable() {
        let mut event = Event::new("submit").with_cancelable(false);
        event.prevent_default();
        assert!(!event.is_default_prevented());

        let mut event = Event::new("submit");
        event.prevent_default();
        assert!(event.is_default_prevented());
    }

    #[test]
    fn test_fire_reaches_ancestors() {
        use std::cell::RefCell;

        let mut doc = Document::new();
        let input = doc.create_element("input");
        doc.append_child(doc.body(), input).unwrap();

        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        doc.add_event_listener(
            doc.body(),
            "date-picked",
            Handler::new(move |_, e| *sink.borrow_mut() = e.detail.clone()),
            false,
        );

        assert!(fire(&mut doc, input, "date-picked", "2024-02-14"));
        assert_eq!(seen.borrow().as_deref(), Some("2024-02-14"));
    }

    #[test]
    fn test_custom_event_detail() {
        let event = Event::custom("picked", "2024-02-14");
        assert_eq!(event.name(), "picked");
        assert_eq!(event.detail.as_deref(), Some("2024-02-14"));
        assert!(event.bubbles());
    }
}

//! Drag-to-move
//!
//! `mousedown` on the handle records the pointer and the node's `left`/`top`,
//! then binds `mousemove` and `mouseup` on the document root so the drag
//! continues when the pointer leaves the node. `mouseup` unbinds both.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{trace, warn};

use domkit_core::style::{set_styles, style};
use domkit_core::{Document, Event, Handler, NodeId};
use domkit_events::Registry;

#[derive(Clone, Copy, Debug, PartialEq)]
struct DragOrigin {
    /// Pointer position at drag start
    start_x: f32,
    start_y: f32,
    /// Node offset at drag start
    left: f32,
    top: f32,
}

struct DragSession {
    origin: DragOrigin,
    on_move: Handler,
    on_up: Handler,
}

struct DragInner {
    node: NodeId,
    handle: NodeId,
    registry: Registry,
    on_down: RefCell<Option<Handler>>,
    session: RefCell<Option<DragSession>>,
}

/// Makes a node movable by dragging it (or a handle inside it)
///
/// Listeners only act while a `Draggable` for them is alive.
#[derive(Clone)]
pub struct Draggable {
    inner: Rc<DragInner>,
}

impl Draggable {
    /// Start listening for drags on `handle` (the node itself when `None`)
    ///
    /// Returns `None` when either node is absent.
    pub fn attach(
        doc: &mut Document,
        registry: &Registry,
        node: NodeId,
        handle: Option<NodeId>,
    ) -> Option<Self> {
        let handle = handle.unwrap_or(node);
        if !doc.contains(node) || !doc.contains(handle) {
            return None;
        }
        if let Err(err) = set_styles(doc, node, [("position", "absolute")]) {
            warn!(?node, "draggable: {err}");
        }

        let inner = Rc::new(DragInner {
            node,
            handle,
            registry: registry.clone(),
            on_down: RefCell::new(None),
            session: RefCell::new(None),
        });
        let weak = Rc::downgrade(&inner);
        let on_down = Handler::new(move |doc: &mut Document, event: &mut Event| {
            if let Some(inner) = weak.upgrade() {
                begin(&inner, doc, event);
            }
        });
        registry.bind(doc, handle, "mousedown", on_down.clone(), false);
        *inner.on_down.borrow_mut() = Some(on_down);
        Some(Self { inner })
    }

    pub fn node(&self) -> NodeId {
        self.inner.node
    }

    pub fn is_dragging(&self) -> bool {
        self.inner.session.borrow().is_some()
    }

    /// Stop listening, ending any drag in progress
    pub fn detach(&self, doc: &mut Document) {
        end(&self.inner, doc);
        let on_down = self.inner.on_down.borrow_mut().take();
        if let Some(on_down) = on_down {
            self.inner
                .registry
                .unbind(doc, self.inner.handle, Some("mousedown"), Some(&on_down));
        }
    }
}

fn offset(doc: &Document, node: NodeId, property: &str, fallback: f32) -> f32 {
    style(doc, node, property)
        .and_then(|v| v.trim_end_matches("px").trim().parse().ok())
        .unwrap_or(fallback)
}

fn begin(inner: &Rc<DragInner>, doc: &mut Document, event: &mut Event) {
    if inner.session.borrow().is_some() {
        return;
    }
    event.prevent_default();
    let rect = doc.bounding_rect(inner.node);
    let origin = DragOrigin {
        start_x: event.client_x,
        start_y: event.client_y,
        left: offset(doc, inner.node, "left", rect.left()),
        top: offset(doc, inner.node, "top", rect.top()),
    };

    let weak = Rc::downgrade(inner);
    let on_move = Handler::new(move |doc: &mut Document, event: &mut Event| {
        if let Some(inner) = weak.upgrade() {
            drag_to(&inner, doc, event.client_x, event.client_y);
        }
    });
    let weak: Weak<DragInner> = Rc::downgrade(inner);
    let on_up = Handler::new(move |doc: &mut Document, _: &mut Event| {
        if let Some(inner) = weak.upgrade() {
            end(&inner, doc);
        }
    });

    let root = doc.root();
    inner.registry.bind(doc, root, "mousemove", on_move.clone(), false);
    inner.registry.bind(doc, root, "mouseup", on_up.clone(), false);
    *inner.session.borrow_mut() = Some(DragSession {
        origin,
        on_move,
        on_up,
    });
    trace!(node = ?inner.node, ?origin, "drag start");
}

fn drag_to(inner: &DragInner, doc: &mut Document, x: f32, y: f32) {
    let Some(origin) = inner.session.borrow().as_ref().map(|s| s.origin) else {
        return;
    };
    let left = format!("{}px", origin.left + x - origin.start_x);
    let top = format!("{}px", origin.top + y - origin.start_y);
    let position = [("left", left.as_str()), ("top", top.as_str())];
    if let Err(err) = set_styles(doc, inner.node, position) {
        warn!(node = ?inner.node, "drag: {err}");
    }
}

fn end(inner: &DragInner, doc: &mut Document) {
    let Some(session) = inner.session.borrow_mut().take() else {
        return;
    };
    let root = doc.root();
    inner
        .registry
        .unbind(doc, root, Some("mousemove"), Some(&session.on_move));
    inner
        .registry
        .unbind(doc, root, Some("mouseup"), Some(&session.on_up));
    trace!(node = ?inner.node, "drag end");
}

#[cfg(test)]
mod tests {
    use super::*;
    use domkit_core::Rect;

    fn setup() -> (Document, Registry, NodeId) {
        let mut doc = Document::new();
        let panel = doc.create_element("div");
        doc.append_child(doc.body(), panel).unwrap();
        doc.set_rect(panel, Rect::new(10.0, 20.0, 100.0, 50.0)).unwrap();
        (doc, Registry::new(), panel)
    }

    #[test]
    fn test_drag_moves_node() {
        let (mut doc, registry, panel) = setup();
        let drag = Draggable::attach(&mut doc, &registry, panel, None).unwrap();

        doc.dispatch_event(panel, Event::mouse("mousedown", 50.0, 50.0));
        assert!(drag.is_dragging());
        doc.dispatch_event(panel, Event::mouse("mousemove", 65.0, 40.0));
        assert_eq!(doc.style_property(panel, "left"), Some("25px"));
        assert_eq!(doc.style_property(panel, "top"), Some("10px"));

        doc.dispatch_event(panel, Event::mouse("mouseup", 65.0, 40.0));
        assert!(!drag.is_dragging());
        let root = doc.root();
        assert_eq!(doc.listener_count(root, None), 0);

        doc.dispatch_event(panel, Event::mouse("mousemove", 500.0, 500.0));
        assert_eq!(doc.style_property(panel, "left"), Some("25px"));
    }

    #[test]
    fn test_second_drag_starts_from_moved_offset() {
        let (mut doc, registry, panel) = setup();
        let _drag = Draggable::attach(&mut doc, &registry, panel, None).unwrap();

        for (from, to) in [((0.0, 0.0), (5.0, 5.0)), ((5.0, 5.0), (10.0, 10.0))] {
            doc.dispatch_event(panel, Event::mouse("mousedown", from.0, from.1));
            doc.dispatch_event(panel, Event::mouse("mousemove", to.0, to.1));
            doc.dispatch_event(panel, Event::mouse("mouseup", to.0, to.1));
        }
        assert_eq!(doc.style_property(panel, "left"), Some("20px"));
        assert_eq!(doc.style_property(panel, "top"), Some("30px"));
    }

    #[test]
    fn test_handle_restricts_drag_start() {
        let (mut doc, registry, panel) = setup();
        let title = doc.create_element("header");
        let body = doc.create_element("section");
        doc.append_child(panel, title).unwrap();
        doc.append_child(panel, body).unwrap();
        let drag = Draggable::attach(&mut doc, &registry, panel, Some(title)).unwrap();

        doc.dispatch_event(body, Event::mouse("mousedown", 0.0, 0.0));
        assert!(!drag.is_dragging());
        doc.dispatch_event(title, Event::mouse("mousedown", 0.0, 0.0));
        assert!(drag.is_dragging());
    }

    #[test]
    fn test_detach_unbinds_everything() {
        let (mut doc, registry, panel) = setup();
        let drag = Draggable::attach(&mut doc, &registry, panel, None).unwrap();
        doc.dispatch_event(panel, Event::mouse("mousedown", 0.0, 0.0));

        drag.detach(&mut doc);
        assert!(registry.is_empty());
        assert!(!drag.is_dragging());
        doc.dispatch_event(panel, Event::mouse("mousedown", 0.0, 0.0));
        assert!(!drag.is_dragging());
    }
}

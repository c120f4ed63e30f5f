//! domkit Core
//!
//! The document model the rest of domkit is built on:
//!
//! - **Tree**: arena of nodes keyed by generational [`NodeId`]s
//! - **Events**: native listeners and three-phase dispatch
//! - **Mutations**: synchronous child-list notifications
//! - **Helpers**: element factory, inline styles, cookies, selectors,
//!   text highlighting
//!
//! Everything is single-threaded; callbacks are `Rc` and receive the document
//! mutably, so a listener may restructure the tree it was dispatched in.
//!
//! # Example
//!
//! ```rust
//! use domkit_core::factory::{create, Attributes};
//! use domkit_core::{Document, Event, Handler};
//!
//! let mut doc = Document::new();
//! let button = create(&mut doc, "button", Attributes::new().class("primary").text("Save"));
//! doc.append_child(doc.body(), button).unwrap();
//!
//! doc.add_event_listener(
//!     button,
//!     "click",
//!     Handler::new(|doc, event| {
//!         if let Some(target) = event.target() {
//!             let _ = doc.add_class(target, "pressed");
//!         }
//!     }),
//!     false,
//! );
//! doc.dispatch_event(button, Event::new("click"));
//! assert!(doc.has_class(button, "pressed"));
//! ```

pub mod cookie;
pub mod error;
pub mod event;
pub mod factory;
pub mod geometry;
pub mod highlight;
pub mod mutation;
pub mod query;
pub mod strings;
pub mod style;
pub mod tree;

pub use error::{DomError, Result};
pub use event::{fire, Event, EventPhase, Handler, NativeListener};
pub use geometry::Rect;
pub use mutation::{MutationCallback, MutationObserverInit, MutationRecord, ObserverId};
pub use tree::{Document, Node, NodeId, NodeKind};

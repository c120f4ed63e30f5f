//! domkit Events
//!
//! Event binding for domkit documents:
//!
//! - [`Registry`] - records every listener bound through domkit so it can be
//!   detached by node, event name or handler
//! - [`Observer`] - watches the tree and detaches everything bound to nodes
//!   that are removed from it
//!
//! # Example
//!
//! ```rust
//! use domkit_core::Document;
//! use domkit_events::{Observer, Registry};
//!
//! let mut doc = Document::new();
//! let registry = Registry::new();
//! let root = doc.root();
//! let _observer = Observer::install(&mut doc, &registry, root);
//!
//! let button = doc.create_element("button");
//! doc.append_child(doc.body(), button).unwrap();
//! registry.on(&mut doc, button, "click", |_, _| {});
//!
//! doc.remove(button).unwrap();
//! assert!(registry.is_empty());
//! ```

pub mod observer;
pub mod registry;

pub use observer::{reclaim, Observer};
pub use registry::{Binding, Registry};

//! Element factory
//!
//! Builds a node from a declarative attribute map.
//!
//! ```rust
//! use domkit_core::factory::{create, Attributes};
//! use domkit_core::Document;
//!
//! let mut doc = Document::new();
//! let cell = create(
//!     &mut doc,
//!     "td",
//!     Attributes::new()
//!         .class("day today")
//!         .attr("data-timestamp", "0")
//!         .text("1"),
//! );
//! assert!(doc.has_class(cell, "today"));
//! assert_eq!(doc.text_content(cell), "1");
//! ```

use indexmap::IndexMap;

use crate::strings::camel_to_dash;
use crate::{Document, NodeId};

/// Class names given either as a space-delimited string or a list
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassNames(Vec<String>);

impl ClassNames {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<&str> for ClassNames {
    fn from(value: &str) -> Self {
        Self(value.split_whitespace().map(String::from).collect())
    }
}

impl From<String> for ClassNames {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Vec<String>> for ClassNames {
    fn from(value: Vec<String>) -> Self {
        Self(value.iter().flat_map(|c| c.split_whitespace()).map(String::from).collect())
    }
}

impl From<&[&str]> for ClassNames {
    fn from(value: &[&str]) -> Self {
        Self(value.iter().flat_map(|c| c.split_whitespace()).map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ClassNames {
    fn from(value: [&str; N]) -> Self {
        Self::from(&value[..])
    }
}

/// Declarative attributes for [`create`]
#[derive(Clone, Debug, Default)]
pub struct Attributes {
    classes: ClassNames,
    attrs: IndexMap<String, String>,
    style: IndexMap<String, String>,
    text: Option<String>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add class names
    pub fn class(mut self, classes: impl Into<ClassNames>) -> Self {
        self.classes.0.extend(classes.into().0);
        self
    }

    /// Set an attribute
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Set an inline style property (camelCase or dash-case)
    pub fn style(mut self, property: &str, value: impl Into<String>) -> Self {
        self.style.insert(camel_to_dash(property), value.into());
        self
    }

    /// Set the text content
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Create a detached element with the given attributes
pub fn create(doc: &mut Document, tag: &str, attributes: Attributes) -> NodeId {
    let node = doc.create_element(tag);
    let Attributes {
        classes,
        attrs,
        style,
        text,
    } = attributes;

    // The node was just created, so the setters below cannot fail
    for (name, value) in attrs {
        let _ = doc.set_attribute(node, &name, value);
    }
    for class in classes.iter() {
        let _ = doc.add_class(node, class);
    }
    for (property, value) in style {
        let _ = doc.set_style_property(node, &property, &value);
    }
    if let Some(text) = text {
        let text_node = doc.create_text(text);
        let _ = doc.append_child(node, text_node);
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_string_and_list() {
        let mut doc = Document::new();
        let a = create(&mut doc, "div", Attributes::new().class("one  two"));
        let b = create(&mut doc, "div", Attributes::new().class(["one", "two"]));
        assert_eq!(doc.attribute(a, "class"), Some("one two"));
        assert_eq!(doc.attribute(b, "class"), Some("one two"));
    }

    #[test]
    fn test_attributes_and_style() {
        let mut doc = Document::new();
        let input = create(
            &mut doc,
            "input",
            Attributes::new()
                .attr("type", "text")
                .attr("name", "when")
                .style("marginTop", "4px"),
        );
        assert_eq!(doc.attribute(input, "type"), Some("text"));
        assert_eq!(doc.style_property(input, "margin-top"), Some("4px"));
        assert!(doc.children(input).is_empty());
    }
}

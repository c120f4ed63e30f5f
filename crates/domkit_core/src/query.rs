//! Selector matching, ancestor lookup and visibility queries
//!
//! Supports compound selectors (`td.day[data-timestamp]`, `#picker`,
//! `input[type=date]`) and comma-separated lists of them. Combinators are not
//! supported; callers walk the tree with [`closest`] instead.

use crate::geometry::Rect;
use crate::{Document, NodeId};

#[derive(Clone, Debug, PartialEq, Eq)]
enum AttrTest {
    Exists(String),
    Equals(String, String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

/// A parsed selector list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Compound>,
}

fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(input: &str) -> (&str, &str) {
    let end = input.find(|c: char| !is_ident(c)).unwrap_or(input.len());
    input.split_at(end)
}

fn parse_compound(mut input: &str) -> Option<Compound> {
    let mut compound = Compound::default();

    if input.starts_with('*') {
        input = &input[1..];
    } else {
        let (tag, rest) = take_ident(input);
        if !tag.is_empty() {
            compound.tag = Some(tag.to_ascii_lowercase());
        }
        input = rest;
    }

    while let Some(c) = input.chars().next() {
        match c {
            '#' | '.' => {
                let (name, rest) = take_ident(&input[1..]);
                if name.is_empty() {
                    return None;
                }
                if c == '#' {
                    compound.id = Some(name.to_string());
                } else {
                    compound.classes.push(name.to_string());
                }
                input = rest;
            }
            '[' => {
                let end = input.find(']')?;
                let body = &input[1..end];
                let test = match body.split_once('=') {
                    Some((name, value)) => AttrTest::Equals(
                        name.trim().to_string(),
                        value.trim().trim_matches(|c: char| c == '"' || c == '\'').to_string(),
                    ),
                    None => AttrTest::Exists(body.trim().to_string()),
                };
                compound.attrs.push(test);
                input = &input[end + 1..];
            }
            _ => return None,
        }
    }
    Some(compound)
}

impl Selector {
    /// Parse a selector; returns `None` for unsupported syntax
    pub fn parse(input: &str) -> Option<Self> {
        let alternatives = input
            .split(',')
            .map(str::trim)
            .map(|part| {
                if part.is_empty() {
                    None
                } else {
                    parse_compound(part)
                }
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Self { alternatives })
    }

    /// Whether the node matches any alternative
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(tag) = doc.tag_name(node) else {
            return false;
        };
        self.alternatives.iter().any(|compound| {
            compound.tag.as_deref().map_or(true, |t| t == tag)
                && compound
                    .id
                    .as_deref()
                    .map_or(true, |id| doc.attribute(node, "id") == Some(id))
                && compound.classes.iter().all(|c| doc.has_class(node, c))
                && compound.attrs.iter().all(|test| match test {
                    AttrTest::Exists(name) => doc.has_attribute(node, name),
                    AttrTest::Equals(name, value) => {
                        doc.attribute(node, name) == Some(value.as_str())
                    }
                })
        })
    }
}

/// Whether the node matches the selector string
pub fn matches(doc: &Document, node: NodeId, selector: &str) -> bool {
    Selector::parse(selector).map_or(false, |s| s.matches(doc, node))
}

/// Nearest inclusive ancestor matching the selector
///
/// Abstains (returns `None`) when no selector is given.
pub fn closest(doc: &Document, node: NodeId, selector: Option<&Selector>) -> Option<NodeId> {
    let selector = selector?;
    std::iter::once(node)
        .chain(doc.ancestors(node))
        .find(|&n| selector.matches(doc, n))
}

/// First descendant matching the selector, in document order
pub fn query(doc: &Document, root: NodeId, selector: &Selector) -> Option<NodeId> {
    doc.descendants(root)
        .into_iter()
        .find(|&n| selector.matches(doc, n))
}

/// All descendants matching the selector, in document order
pub fn query_all(doc: &Document, root: NodeId, selector: &Selector) -> Vec<NodeId> {
    doc.descendants(root)
        .into_iter()
        .filter(|&n| selector.matches(doc, n))
        .collect()
}

/// Whether the node is rendered: attached, not hidden by inline style, with a
/// non-empty box
pub fn is_visible(doc: &Document, node: NodeId) -> bool {
    if !doc.is_connected(node) || doc.bounding_rect(node).is_empty() {
        return false;
    }
    !std::iter::once(node).chain(doc.ancestors(node)).any(|n| {
        doc.style_property(n, "display") == Some("none")
            || doc.style_property(n, "visibility") == Some("hidden")
    })
}

/// Width and height of the node's box
pub fn size(doc: &Document, node: NodeId) -> (f32, f32) {
    let Rect { width, height, .. } = doc.bounding_rect(node);
    (width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{create, Attributes};

    fn sample() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let form = create(&mut doc, "form", Attributes::new().attr("id", "signup"));
        let input = create(
            &mut doc,
            "input",
            Attributes::new()
                .class("field date")
                .attr("type", "date")
                .attr("data-calendar", ""),
        );
        doc.append_child(doc.body(), form).unwrap();
        doc.append_child(form, input).unwrap();
        (doc, form, input)
    }

    #[test]
    fn test_parse_rejects_combinators() {
        assert!(Selector::parse("div > span").is_none());
        assert!(Selector::parse("").is_none());
        assert!(Selector::parse("a,").is_none());
        assert!(Selector::parse("input.field, #signup").is_some());
    }

    #[test]
    fn test_matches() {
        let (doc, form, input) = sample();
        assert!(matches(&doc, input, "input.field.date"));
        assert!(matches(&doc, input, "[type=date]"));
        assert!(matches(&doc, input, "[type=\"date\"][data-calendar]"));
        assert!(!matches(&doc, input, "input.other"));
        assert!(matches(&doc, form, "#signup"));
        assert!(matches(&doc, form, "*"));
    }

    #[test]
    fn test_closest() {
        let (doc, form, input) = sample();
        let selector = Selector::parse("form").unwrap();
        assert_eq!(closest(&doc, input, Some(&selector)), Some(form));
        assert_eq!(closest(&doc, input, None), None);

        let itself = Selector::parse("input").unwrap();
        assert_eq!(closest(&doc, input, Some(&itself)), Some(input));
    }

    #[test]
    fn test_query_all() {
        let (doc, _, input) = sample();
        let selector = Selector::parse("input, form").unwrap();
        assert_eq!(query_all(&doc, doc.body(), &selector).len(), 2);
        assert_eq!(
            query(&doc, doc.body(), &Selector::parse(".date").unwrap()),
            Some(input)
        );
    }

    #[test]
    fn test_visibility() {
        let (mut doc, form, input) = sample();
        assert!(!is_visible(&doc, input));

        doc.set_rect(input, Rect::new(0.0, 0.0, 120.0, 24.0)).unwrap();
        assert!(is_visible(&doc, input));
        assert_eq!(size(&doc, input), (120.0, 24.0));

        doc.set_style_property(form, "display", "none").unwrap();
        assert!(!is_visible(&doc, input));
    }
}

//! Inline CSS setters

use crate::error::Result;
use crate::strings::camel_to_dash;
use crate::{Document, NodeId};

/// Set one inline style property; camelCase names are accepted
pub fn set_style(doc: &mut Document, node: NodeId, property: &str, value: &str) -> Result<()> {
    doc.set_style_property(node, &camel_to_dash(property), value)
}

/// Set several inline style properties at once
pub fn set_styles<'a, I>(doc: &mut Document, node: NodeId, properties: I) -> Result<()>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    for (property, value) in properties {
        set_style(doc, node, property, value)?;
    }
    Ok(())
}

/// Read an inline style property
pub fn style<'d>(doc: &'d Document, node: NodeId, property: &str) -> Option<&'d str> {
    doc.style_property(node, &camel_to_dash(property))
}

/// Serialize the inline style as a `style` attribute value
pub fn style_text(doc: &Document, node: NodeId) -> String {
    doc.node(node)
        .map(|n| {
            n.style()
                .iter()
                .map(|(k, v)| format!("{k}: {v};"))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_styles() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        set_styles(&mut doc, div, [("top", "10px"), ("zIndex", "3")]).unwrap();

        assert_eq!(style(&doc, div, "z-index"), Some("3"));
        assert_eq!(style(&doc, div, "zIndex"), Some("3"));
        assert_eq!(style_text(&doc, div), "top: 10px; z-index: 3;");

        set_style(&mut doc, div, "top", "").unwrap();
        assert_eq!(style(&doc, div, "top"), None);
    }
}

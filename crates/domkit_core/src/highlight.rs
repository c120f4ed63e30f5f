//! Text search highlighting
//!
//! `highlight` wraps every case-insensitive occurrence of a term inside text
//! nodes with `<mark class="highlight">`; `unhighlight` puts the text back and
//! merges the split text nodes.

use tracing::debug;

use crate::error::Result;
use crate::factory::{create, Attributes};
use crate::{Document, NodeId};

/// Class carried by highlight marks
pub const HIGHLIGHT_CLASS: &str = "highlight";

fn is_mark(doc: &Document, node: NodeId) -> bool {
    doc.tag_name(node) == Some("mark") && doc.has_class(node, HIGHLIGHT_CLASS)
}

/// Highlight `term` below `root`, returning the number of marks inserted
pub fn highlight(doc: &mut Document, root: NodeId, term: &str) -> Result<usize> {
    if term.is_empty() {
        return Ok(0);
    }
    let needle = term.to_ascii_lowercase();

    let texts: Vec<NodeId> = doc
        .descendants(root)
        .into_iter()
        .filter(|&n| doc.is_text(n))
        .filter(|&n| doc.parent(n).map_or(true, |p| !is_mark(doc, p)))
        .collect();

    let mut marks = 0;
    for text_node in texts {
        let Some(content) = doc.text(text_node).map(String::from) else {
            continue;
        };
        let haystack = content.to_ascii_lowercase();
        if !haystack.contains(&needle) {
            continue;
        }
        let Some(parent) = doc.parent(text_node) else {
            continue;
        };

        let mut cursor = 0;
        for (start, _) in haystack.match_indices(&needle) {
            if start > cursor {
                let before = doc.create_text(&content[cursor..start]);
                doc.insert_before(parent, before, Some(text_node))?;
            }
            let end = start + needle.len();
            let mark = create(
                doc,
                "mark",
                Attributes::new()
                    .class(HIGHLIGHT_CLASS)
                    .text(&content[start..end]),
            );
            doc.insert_before(parent, mark, Some(text_node))?;
            marks += 1;
            cursor = end;
        }

        if cursor < content.len() {
            doc.set_text_data(text_node, &content[cursor..])?;
        } else {
            doc.remove_child(parent, text_node)?;
            doc.release(text_node)?;
        }
    }

    debug!(term, marks, "highlight");
    Ok(marks)
}

/// Remove highlight marks below `root`, returning how many were removed
pub fn unhighlight(doc: &mut Document, root: NodeId) -> Result<usize> {
    let marks: Vec<NodeId> = doc
        .descendants(root)
        .into_iter()
        .filter(|&n| is_mark(doc, n))
        .collect();

    let mut parents = Vec::new();
    for &mark in &marks {
        let Some(parent) = doc.parent(mark) else {
            continue;
        };
        let content = doc.text_content(mark);
        let text = doc.create_text(content);
        doc.insert_before(parent, text, Some(mark))?;
        doc.remove_child(parent, mark)?;
        doc.release(mark)?;
        if !parents.contains(&parent) {
            parents.push(parent);
        }
    }

    for parent in parents {
        normalize(doc, parent)?;
    }
    Ok(marks.len())
}

/// Merge adjacent text children of `parent`
pub fn normalize(doc: &mut Document, parent: NodeId) -> Result<()> {
    let children = doc.children(parent).to_vec();
    let mut previous: Option<NodeId> = None;
    for child in children {
        match (previous, doc.text(child).map(String::from)) {
            (Some(prev), Some(text)) => {
                let merged = format!("{}{}", doc.text(prev).unwrap_or_default(), text);
                doc.set_text_data(prev, merged)?;
                doc.remove_child(parent, child)?;
                doc.release(child)?;
            }
            (_, Some(_)) => previous = Some(child),
            (_, None) => previous = None,
        }
    }
    Ok(())
}

//! Plain-text rendering of an open calendar popup
//!
//! Reads the popup back out of the document, so what is printed is what the
//! widget built.

use domkit_core::query::{query, query_all, Selector};
use domkit_core::{Document, NodeId};
use domkit_widgets::CalendarHandle;

const CELL_WIDTH: usize = 4;

/// Render the popup of `handle`; `None` when it is closed
pub fn render_popup(
    doc: &Document,
    handle: &CalendarHandle,
    month_names: &[String],
) -> Option<String> {
    let grid = handle.grid()?;
    let reference = handle.reference_date();
    let title = format!(
        "{} {}",
        month_names
            .get(reference.month0() as usize)
            .map(String::as_str)
            .unwrap_or(""),
        reference.year()
    );

    let mut out = String::new();
    let width = CELL_WIDTH * 7;
    out.push_str(&format!("{title:^width$}\n"));

    let th = Selector::parse("th")?;
    for label in query_all(doc, grid, &th) {
        out.push_str(&format!("{:>CELL_WIDTH$}", doc.text_content(label)));
    }
    out.push('\n');

    let tbody = query(doc, grid, &Selector::parse("tbody")?)?;
    for &row in doc.children(tbody) {
        for &cell in doc.children(row) {
            out.push_str(&render_cell(doc, cell));
        }
        out.push('\n');
    }
    Some(out)
}

/// `[n]` marks the selection, `*n` today, and days of other months are dimmed to `·`
fn render_cell(doc: &Document, cell: NodeId) -> String {
    let text = doc.text_content(cell);
    let label = if !doc.has_class(cell, "day") {
        "·".to_string()
    } else if doc.has_class(cell, "current") {
        format!("[{text}]")
    } else if doc.has_class(cell, "today") {
        format!("*{text}")
    } else {
        text
    };
    format!("{label:>CELL_WIDTH$}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use domkit_events::Registry;
    use domkit_widgets::{CalendarDate, CalendarOptions, Calendars, FixedClock};

    #[test]
    fn test_render_february_2024() {
        let mut doc = Document::new();
        let today = CalendarDate::new(2024, 2, 20).unwrap();
        let options = CalendarOptions::default();
        let month_names = options.month_names.clone();
        let calendars = Calendars::new(Registry::new(), options).with_clock(FixedClock(today));

        let host = doc.create_element("input");
        doc.append_child(doc.body(), host).unwrap();
        let handle = calendars.attach(&doc, host).unwrap();
        handle.select(&mut doc, CalendarDate::new(2024, 2, 14).unwrap());
        assert!(render_popup(&doc, &handle, &month_names).is_none());

        handle.show(&mut doc, None);
        let text = render_popup(&doc, &handle, &month_names).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0].trim(), "February 2024");
        assert_eq!(lines[1], "  Su  Mo  Tu  We  Th  Fr  Sa");
        assert_eq!(lines[2], "   ·   ·   ·   ·   1   2   3");
        assert!(lines[3].contains("[14]") || lines[4].contains("[14]"));
        assert!(text.contains("*20"));
    }
}

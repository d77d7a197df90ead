//! Reading the user's selection through the DOM Selection API.

use annotate_core::text::utf16_to_char;
use annotate_core::SelectionSnapshot;
use web_sys::{Node, Selection};

/// Viewport rectangle of a selection, for positioning the host's tooltip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelectionRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

fn window_selection() -> Option<Selection> {
    web_sys::window()?.get_selection().ok().flatten()
}

/// Offset inside a text node, converted from UTF-16 code units to chars.
/// Offsets into element nodes count children and pass through unchanged.
fn char_offset(node: &Node, utf16_offset: u32) -> usize {
    if node.node_type() != Node::TEXT_NODE {
        return utf16_offset as usize;
    }
    let data = node.node_value().unwrap_or_default();
    utf16_to_char(&data, utf16_offset as usize)
}

/// Snapshot of the current selection, or `None` when nothing is selected.
pub fn current_selection() -> Option<SelectionSnapshot<Node>> {
    let selection = window_selection()?;
    if selection.is_collapsed() {
        return None;
    }
    let anchor_node = selection.anchor_node()?;
    let focus_node = selection.focus_node()?;
    let text: js_sys::JsString = selection.to_string();
    let text = String::from(text);

    tracing::trace!(
        target: "annotate::selection",
        anchor_offset = selection.anchor_offset(),
        focus_offset = selection.focus_offset(),
        text = %text,
        "read selection"
    );

    Some(SelectionSnapshot {
        anchor_offset: char_offset(&anchor_node, selection.anchor_offset()),
        focus_offset: char_offset(&focus_node, selection.focus_offset()),
        anchor_node,
        focus_node,
        text,
    })
}

/// Bounding rectangle of the current selection.
pub fn selection_rect() -> Option<SelectionRect> {
    let selection = window_selection()?;
    if selection.range_count() == 0 {
        return None;
    }
    let rect = selection.get_range_at(0).ok()?.get_bounding_client_rect();
    Some(SelectionRect {
        x: rect.x(),
        y: rect.y(),
        width: rect.width(),
        height: rect.height(),
    })
}

/// Drop the current selection, e.g. after the highlight was committed.
pub fn clear_selection() {
    if let Some(selection) = window_selection() {
        let _ = selection.remove_all_ranges();
    }
}

use crate::browser::Point;
use crate::resolver::document::{DomEvent, DomEventKind, Editability, ElementHandle, PageDocument};

/// Pointer/mouse sequence of a synthesized click, in dispatch order.
/// Focus is applied between `mousedown` and `mouseup`.
pub const CLICK_SEQUENCE: [DomEventKind; 9] = [
    DomEventKind::PointerOver,
    DomEventKind::MouseOver,
    DomEventKind::PointerMove,
    DomEventKind::MouseMove,
    DomEventKind::PointerDown,
    DomEventKind::MouseDown,
    DomEventKind::MouseUp,
    DomEventKind::PointerUp,
    DomEventKind::Click,
];

/// Scroll the element into view and play a full hover/press/release/click
/// sequence on it. Returns the geometry used for the events.
pub fn synthesize_click<D>(doc: &D, element: ElementHandle, recorded: Option<Point>) -> Point
where
    D: PageDocument + ?Sized,
{
    let point = recorded
        .or_else(|| doc.bounding_rect(element).map(|rect| rect.center()))
        .unwrap_or(Point::new(0.0, 0.0));

    doc.scroll_into_view(element);
    for kind in CLICK_SEQUENCE {
        if kind == DomEventKind::MouseUp {
            doc.focus(element);
        }
        doc.dispatch(element, DomEvent::pointer(kind, point));
    }
    point
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotEditable;

/// Replace the element's text and notify page logic through `input` and
/// `change` events.
pub fn apply_input<D>(doc: &D, element: ElementHandle, value: &str) -> Result<(), NotEditable>
where
    D: PageDocument + ?Sized,
{
    let editability = doc.editability(element);
    if editability == Editability::NotEditable {
        return Err(NotEditable);
    }

    doc.scroll_into_view(element);
    doc.focus(element);
    if editability == Editability::ContentEditable {
        doc.set_text_content(element, value);
    } else {
        doc.set_value(element, value);
        if !doc.set_caret(element, value.chars().count()) {
            tracing::trace!(element = element.0, "Field has no selection API");
        }
    }

    doc.dispatch(element, DomEvent::input(value));
    doc.dispatch(element, DomEvent::change());
    Ok(())
}

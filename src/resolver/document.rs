use serde::{Deserialize, Serialize};

use crate::browser::{Point, Rect};

/// Opaque reference to a live element of one document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementHandle(pub u64);

/// Element lookups over a live, mutable document.
///
/// Every lookup reflects the document at call time; callers poll when an
/// element is expected to appear later.
pub trait ElementResolver: Send + Sync {
    /// All elements whose id equals `id`
    fn by_id(&self, id: &str) -> Vec<ElementHandle>;

    /// All elements carrying every class of the space-separated `class_name`
    fn by_class(&self, class_name: &str) -> Vec<ElementHandle>;

    /// All elements matched by `xpath`; an invalid expression matches nothing
    fn by_xpath(&self, xpath: &str) -> Vec<ElementHandle>;

    /// Topmost element under the viewport point
    fn at_point(&self, point: Point) -> Option<ElementHandle>;

    /// Whether this document is the top-level frame of its context
    fn is_top_frame(&self) -> bool;
}

/// How an element accepts text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Editability {
    /// Free-text editable region; text content is replaced
    ContentEditable,
    /// `input` / `textarea`; the value is replaced
    ValueField,
    NotEditable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomEventKind {
    PointerOver,
    MouseOver,
    PointerMove,
    MouseMove,
    PointerDown,
    MouseDown,
    MouseUp,
    PointerUp,
    Click,
    Input,
    Change,
}

/// A synthesized DOM event. Events bubble and are cancelable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomEvent {
    pub kind: DomEventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<Point>,
    /// Inserted text, for `input` events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl DomEvent {
    pub fn pointer(kind: DomEventKind, point: Point) -> Self {
        Self {
            kind,
            point: Some(point),
            data: None,
        }
    }

    pub fn input(data: impl Into<String>) -> Self {
        Self {
            kind: DomEventKind::Input,
            point: None,
            data: Some(data.into()),
        }
    }

    pub fn change() -> Self {
        Self {
            kind: DomEventKind::Change,
            point: None,
            data: None,
        }
    }
}

/// Element interaction surface of a document, on top of lookups.
pub trait PageDocument: ElementResolver {
    fn bounding_rect(&self, element: ElementHandle) -> Option<Rect>;

    fn scroll_into_view(&self, element: ElementHandle);

    fn dispatch(&self, element: ElementHandle, event: DomEvent);

    /// Focus the element; elements that cannot take focus ignore it
    fn focus(&self, element: ElementHandle);

    fn editability(&self, element: ElementHandle) -> Editability;

    fn set_text_content(&self, element: ElementHandle, text: &str);

    fn set_value(&self, element: ElementHandle, value: &str);

    /// Collapse the selection to `offset`; `false` when the field has no
    /// selection API (e.g. `type="number"`)
    fn set_caret(&self, element: ElementHandle, offset: usize) -> bool;
}

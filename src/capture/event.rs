use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::browser::{ContextId, FrameId, Point, Rect, WindowId};
use crate::capture::field::FieldDescriptor;

/// Kind of a captured interaction.
///
/// Wire names follow the exported log format; the engine-level names are
/// accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "tab_created", alias = "context_created")]
    ContextCreated,
    #[serde(rename = "tab_url_changed", alias = "url_changed")]
    UrlChanged,
    #[serde(rename = "tab_activated", alias = "context_activated")]
    ContextActivated,
    #[serde(rename = "window_focus", alias = "window_focused")]
    WindowFocused,
    #[serde(rename = "click")]
    Click,
    #[serde(rename = "text_input")]
    TextInput,
    /// Recorder lifecycle markers
    #[serde(rename = "system")]
    System,
    #[serde(rename = "unknown", other)]
    Unknown,
}

impl EventKind {
    pub const REPLAYABLE: [EventKind; 6] = [
        EventKind::ContextCreated,
        EventKind::UrlChanged,
        EventKind::ContextActivated,
        EventKind::WindowFocused,
        EventKind::Click,
        EventKind::TextInput,
    ];

    pub fn is_replayable(&self) -> bool {
        Self::REPLAYABLE.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ContextCreated => "tab_created",
            EventKind::UrlChanged => "tab_url_changed",
            EventKind::ContextActivated => "tab_activated",
            EventKind::WindowFocused => "window_focus",
            EventKind::Click => "click",
            EventKind::TextInput => "text_input",
            EventKind::System => "system",
            EventKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded interaction. Immutable once appended to a log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedEvent {
    /// Monotonic within a window, in log order
    pub id: u64,
    /// Capture instant in milliseconds
    #[serde(rename = "ts")]
    pub timestamp: u64,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(rename = "windowId", default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,
    /// Context the user acted in; `None` for window-level events
    #[serde(rename = "tabId", default)]
    pub source_context: Option<ContextId>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl CapturedEvent {
    pub fn new(
        id: u64,
        timestamp: u64,
        kind: EventKind,
        source_context: Option<ContextId>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id,
            timestamp,
            kind,
            window_id: None,
            source_context,
            payload,
        }
    }

    pub fn with_window(mut self, window: WindowId) -> Self {
        self.window_id = Some(window);
        self
    }

    /// Decode the payload into its typed form.
    ///
    /// Recorded payloads are loosely shaped; a missing or malformed payload
    /// decodes to the type's defaults instead of failing.
    pub fn decode_payload<T>(&self) -> T
    where
        T: DeserializeOwned + Default,
    {
        if self.payload.is_null() {
            return T::default();
        }
        match serde_json::from_value(self.payload.clone()) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::debug!(
                    event_id = self.id,
                    kind = %self.kind,
                    error = %err,
                    "Malformed capture payload, using defaults"
                );
                T::default()
            }
        }
    }
}

/// Identifying fields recorded for an element, used to find it again.
///
/// Not unique by construction; see [`crate::resolver::resolve_once`] for the
/// priority and uniqueness rules.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LocatorDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xpath: Option<String>,
    /// Viewport coordinates, click only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<Point>,
}

impl LocatorDescriptor {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: non_empty(id.into()),
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = non_empty(class_name.into());
        self
    }

    pub fn with_xpath(mut self, xpath: impl Into<String>) -> Self {
        self.xpath = non_empty(xpath.into());
        self
    }

    pub fn with_point(mut self, point: Point) -> Self {
        self.point = Some(point);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.class_name.is_none() && self.xpath.is_none() && self.point.is_none()
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickPayload {
    pub id: String,
    pub class_name: String,
    pub xpath: String,
    pub x: Option<f64>,
    pub y: Option<f64>,
    #[serde(rename = "pageX")]
    pub page_x: Option<f64>,
    #[serde(rename = "pageY")]
    pub page_y: Option<f64>,
    #[serde(rename = "frameId")]
    pub frame_id: Option<FrameId>,
    pub tag: String,
    pub text: String,
    pub rect: Option<Rect>,
    pub url: String,
    pub title: String,
}

impl ClickPayload {
    pub fn locator(&self) -> LocatorDescriptor {
        let mut locator = LocatorDescriptor::by_id(self.id.clone())
            .with_class(self.class_name.clone())
            .with_xpath(self.xpath.clone());
        if let (Some(x), Some(y)) = (self.x, self.y) {
            locator = locator.with_point(Point::new(x, y));
        }
        locator
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextInputPayload {
    pub id: String,
    pub class_name: String,
    pub xpath: String,
    pub field: Option<FieldDescriptor>,
    /// Final value when the edit completed
    pub value: String,
    /// Value when the field gained focus
    pub initial: String,
    /// `blur` or `submit`
    pub reason: String,
    #[serde(rename = "frameId")]
    pub frame_id: Option<FrameId>,
    pub url: String,
    pub title: String,
}

impl TextInputPayload {
    /// Text inputs never carry coordinates into resolution.
    pub fn locator(&self) -> LocatorDescriptor {
        LocatorDescriptor::by_id(self.id.clone())
            .with_class(self.class_name.clone())
            .with_xpath(self.xpath.clone())
    }
}

/// Payload of `tab_created` / `tab_url_changed`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationPayload {
    pub to: Option<String>,
    pub url: Option<String>,
    pub title: String,
}

impl NavigationPayload {
    pub fn target_url(&self) -> Option<&str> {
        self.to
            .as_deref()
            .filter(|u| !u.is_empty())
            .or_else(|| self.url.as_deref().filter(|u| !u.is_empty()))
    }
}

/// URL + title snapshot taken on activation and focus changes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextSnapshot {
    pub url: String,
    pub title: String,
}

//! Capture-side text field filtering.
//!
//! Only plain text-bearing fields are ever recorded. Secrets (`password`),
//! invisible state (`hidden`) and file pickers never reach the log, so replay
//! can never type into them.

use serde::{Deserialize, Serialize};

const RECORDABLE_INPUT_TYPES: &[&str] = &["text", "search", "email", "url", "tel", "number"];

/// Description of the edited field, as captured alongside a text input
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDescriptor {
    /// Upper-case tag name (`INPUT`, `TEXTAREA`, `DIV`, ...)
    pub tag: String,
    pub id: String,
    pub class_name: String,
    pub name: String,
    /// Input type for `INPUT`, `contenteditable` for editable regions,
    /// lower-case tag name otherwise
    #[serde(rename = "type")]
    pub field_type: String,
    pub placeholder: String,
    #[serde(rename = "ariaLabel")]
    pub aria_label: String,
}

impl FieldDescriptor {
    pub fn input(field_type: impl Into<String>) -> Self {
        Self {
            tag: "INPUT".into(),
            field_type: field_type.into(),
            ..Self::default()
        }
    }

    pub fn textarea() -> Self {
        Self {
            tag: "TEXTAREA".into(),
            field_type: "textarea".into(),
            ..Self::default()
        }
    }

    pub fn content_editable(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            field_type: "contenteditable".into(),
            ..Self::default()
        }
    }

    /// Whether the capture-side listener is allowed to record edits of this field
    pub fn is_recordable(&self) -> bool {
        if self.tag.eq_ignore_ascii_case("textarea") {
            return true;
        }
        if self.field_type.eq_ignore_ascii_case("contenteditable") {
            return true;
        }
        if self.tag.eq_ignore_ascii_case("input") {
            let kind = self.field_type.trim().to_ascii_lowercase();
            let kind = if kind.is_empty() { "text" } else { kind.as_str() };
            return RECORDABLE_INPUT_TYPES.contains(&kind);
        }
        false
    }
}

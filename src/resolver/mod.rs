//! In-page resolution agent.
//!
//! Turns a [`crate::capture::LocatorDescriptor`] into exactly one live element
//! and performs a click or text input on it. Lookups and interactions go
//! through [`ElementResolver`] / [`PageDocument`], so the policy here is
//! independent of any real rendering surface.

pub mod actions;
pub mod agent;
pub mod document;
pub mod locate;

pub use actions::{apply_input, synthesize_click, NotEditable, CLICK_SEQUENCE};
pub use agent::{
    ResolutionAgent, DEFAULT_CLICK_TIMEOUT, DEFAULT_INPUT_TIMEOUT, DEFAULT_POLL_INTERVAL,
    ELEMENT_NOT_EDITABLE, ELEMENT_NOT_FOUND,
};
pub use document::{
    DomEvent, DomEventKind, Editability, ElementHandle, ElementResolver, PageDocument,
};
pub use locate::{resolve_once, Resolution, ResolutionPath};

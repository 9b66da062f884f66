//! Scriptable in-memory browser for tests and the `simulate` command.

pub mod browser;
pub mod document;

pub use browser::{MockBrowser, MockFrame, MockPage, SurfaceCall};
pub use document::{ElementKind, JournalEntry, MockDocument, MockElement};

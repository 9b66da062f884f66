//! Browser-side facilities the replay engine drives.
//!
//! The engine never talks to a concrete browser directly. Everything it needs
//! (window focus, context creation and navigation, agent installation and
//! point-to-point action delivery) goes through [`BrowserSurface`], so the
//! session logic can run against the in-process [`crate::mock::MockBrowser`]
//! as easily as against a real automation backend.

pub mod error;
pub mod protocol;
pub mod surface;

pub use error::SurfaceError;
pub use protocol::{deliver, ActionKind, ActionRequest, ActionResponse, Delivery, Point, Rect};
pub use surface::{BrowserSurface, ContextId, FrameId, LoadState, WindowId};

use thiserror::Error;

use crate::browser::surface::{ContextId, FrameId, WindowId};

/// Failures reported by a [`crate::browser::BrowserSurface`] implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("window {0} does not exist")]
    WindowNotFound(WindowId),

    #[error("context {0} does not exist")]
    ContextNotFound(ContextId),

    /// Nothing is listening in the target context/frame (agent not installed,
    /// frame gone, page mid-navigation).
    #[error("no receiving end in context {context} (frame {frame:?})")]
    NoReceiver {
        context: ContextId,
        frame: Option<FrameId>,
    },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("browser backend error: {0}")]
    Backend(String),
}

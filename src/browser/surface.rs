use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::browser::error::SurfaceError;
use crate::browser::protocol::{ActionRequest, ActionResponse};

/// Browser window identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub i64);

/// Execution context (tab) identifier, either recorded or live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(pub i64);

/// Frame identifier inside an execution context. Frame `0` is the top-level document.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FrameId(pub i64);

impl FrameId {
    pub const TOP: FrameId = FrameId(0);

    pub fn is_top(&self) -> bool {
        *self == Self::TOP
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Load progress of an execution context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    Loading,
    Complete,
}

/// Window and context management plus agent messaging for one browser.
///
/// Implementations must be cheap to call concurrently from several window
/// sessions; each session only ever mutates contexts of its own window.
#[async_trait]
pub trait BrowserSurface: Send + Sync {
    /// Bring the window to the foreground
    async fn focus_window(&self, window: WindowId) -> Result<(), SurfaceError>;

    /// Open a new, active context in `window` and start loading `url`
    async fn create_context(&self, window: WindowId, url: &str)
        -> Result<ContextId, SurfaceError>;

    /// Navigate an existing context
    async fn navigate(&self, context: ContextId, url: &str) -> Result<(), SurfaceError>;

    /// Make the context the active one of its window
    async fn activate_context(&self, context: ContextId) -> Result<(), SurfaceError>;

    /// Currently active context of the window, if any
    async fn active_context(&self, window: WindowId) -> Result<Option<ContextId>, SurfaceError>;

    /// Current load progress of the context
    async fn load_state(&self, context: ContextId) -> Result<LoadState, SurfaceError>;

    /// (Re-)install the resolution agent into every frame of the context.
    ///
    /// Installation is idempotent; the agent does not survive navigations.
    async fn install_agent(&self, context: ContextId) -> Result<(), SurfaceError>;

    /// Deliver one action request to the agent in `context` (top frame when
    /// `frame` is `None`) and wait for its single response.
    ///
    /// Callers bound this with [`crate::browser::deliver`]; implementations may
    /// take arbitrarily long.
    async fn send_action(
        &self,
        context: ContextId,
        frame: Option<FrameId>,
        request: ActionRequest,
    ) -> Result<ActionResponse, SurfaceError>;
}

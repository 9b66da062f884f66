//! Wire shapes exchanged between the orchestrator and the in-page agent.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::browser::error::SurfaceError;
use crate::browser::surface::{BrowserSurface, ContextId, FrameId};
use crate::capture::LocatorDescriptor;
use crate::resolver::ResolutionPath;

/// Viewport coordinates, in CSS pixels relative to the frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Element bounding box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Click,
    Input,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Click => "click",
            ActionKind::Input => "input",
        }
    }
}

/// One replay step handed to the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionRequest {
    Click {
        locator: LocatorDescriptor,
        /// Agent-side resolution budget
        timeout_ms: u64,
    },
    Input {
        locator: LocatorDescriptor,
        value: String,
        timeout_ms: u64,
    },
}

impl ActionRequest {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionRequest::Click { .. } => ActionKind::Click,
            ActionRequest::Input { .. } => ActionKind::Input,
        }
    }

    pub fn locator(&self) -> &LocatorDescriptor {
        match self {
            ActionRequest::Click { locator, .. } | ActionRequest::Input { locator, .. } => locator,
        }
    }

    pub fn timeout(&self) -> Duration {
        match self {
            ActionRequest::Click { timeout_ms, .. } | ActionRequest::Input { timeout_ms, .. } => {
                Duration::from_millis(*timeout_ms)
            }
        }
    }
}

/// The agent's single structured reply
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Event geometry used for a click
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<Point>,
    /// Which locator tier produced the element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<ResolutionPath>,
}

impl ActionResponse {
    pub fn success(resolved_by: ResolutionPath) -> Self {
        Self {
            ok: true,
            resolved_by: Some(resolved_by),
            ..Self::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn with_point(mut self, point: Point) -> Self {
        self.point = Some(point);
        self
    }
}

/// Outcome of a bounded round trip to the agent
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Ok(ActionResponse),
    Timeout,
    Error(SurfaceError),
}

/// Send `request` and wait at most `deadline` for the agent's answer.
///
/// The deadline is independent of the agent's own resolution timeout; when it
/// expires the agent may still be working, but its late answer is dropped.
pub async fn deliver(
    surface: &dyn BrowserSurface,
    context: ContextId,
    frame: Option<FrameId>,
    request: ActionRequest,
    deadline: Duration,
) -> Delivery {
    match tokio::time::timeout(deadline, surface.send_action(context, frame, request)).await {
        Ok(Ok(response)) => Delivery::Ok(response),
        Ok(Err(err)) => Delivery::Error(err),
        Err(_) => Delivery::Timeout,
    }
}

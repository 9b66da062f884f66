use std::time::Duration;

use tokio::time::Instant;

use crate::browser::{ActionRequest, ActionResponse};
use crate::capture::LocatorDescriptor;
use crate::resolver::actions::{apply_input, synthesize_click};
use crate::resolver::document::{ElementResolver, PageDocument};
use crate::resolver::locate::{resolve_once, Resolution};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(120);
pub const DEFAULT_CLICK_TIMEOUT: Duration = Duration::from_millis(5000);
pub const DEFAULT_INPUT_TIMEOUT: Duration = Duration::from_millis(6000);

/// Error code when no unique element resolved before the timeout
pub const ELEMENT_NOT_FOUND: &str = "element_not_found";
/// Error code when an input target cannot take text
pub const ELEMENT_NOT_EDITABLE: &str = "element_not_editable";

/// The in-page half of the replay protocol.
///
/// Holds no per-step state: every request is resolved from scratch against
/// the document as it is when the request arrives.
#[derive(Debug, Clone)]
pub struct ResolutionAgent {
    poll_interval: Duration,
}

impl ResolutionAgent {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Poll until a tier resolves uniquely or `timeout` elapses. At least one
    /// attempt is always made.
    pub async fn find_with_retries<R>(
        &self,
        doc: &R,
        locator: &LocatorDescriptor,
        timeout: Duration,
        allow_coordinates: bool,
    ) -> Option<Resolution>
    where
        R: ElementResolver + ?Sized,
    {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(hit) = resolve_once(doc, locator, allow_coordinates) {
                return Some(hit);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    /// Resolve the request's target and perform the action on it.
    pub async fn handle<D>(&self, doc: &D, request: &ActionRequest) -> ActionResponse
    where
        D: PageDocument + ?Sized,
    {
        match request {
            ActionRequest::Click { locator, .. } => {
                let Some(hit) = self
                    .find_with_retries(doc, locator, request.timeout(), true)
                    .await
                else {
                    return ActionResponse::failure(ELEMENT_NOT_FOUND);
                };
                let point = synthesize_click(doc, hit.element, locator.point);
                ActionResponse::success(hit.path).with_point(point)
            }
            ActionRequest::Input { locator, value, .. } => {
                // Coordinates would risk typing into an arbitrary field.
                let Some(hit) = self
                    .find_with_retries(doc, locator, request.timeout(), false)
                    .await
                else {
                    return ActionResponse::failure(ELEMENT_NOT_FOUND);
                };
                match apply_input(doc, hit.element, value) {
                    Ok(()) => ActionResponse::success(hit.path),
                    Err(_) => ActionResponse::failure(ELEMENT_NOT_EDITABLE),
                }
            }
        }
    }
}

impl Default for ResolutionAgent {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

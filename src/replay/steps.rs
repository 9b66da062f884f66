use crate::browser::{ContextId, FrameId};
use crate::capture::{
    CapturedEvent, ClickPayload, EventKind, LocatorDescriptor, NavigationPayload, TextInputPayload,
};

/// URL used for a recorded context whose creation carried no URL
pub const BLANK_URL: &str = "about:blank";

/// What replaying one step does
#[derive(Debug, Clone, PartialEq)]
pub enum StepAction {
    CreateContext {
        url: String,
    },
    ChangeUrl {
        url: Option<String>,
    },
    ActivateContext,
    FocusWindow,
    Click {
        locator: LocatorDescriptor,
        /// `None` targets the top-level document
        frame: Option<FrameId>,
    },
    Input {
        locator: LocatorDescriptor,
        value: String,
        frame: Option<FrameId>,
    },
}

/// A replayable event decoded from the capture log
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayStep {
    pub id: u64,
    pub timestamp: u64,
    pub kind: EventKind,
    pub source_context: Option<ContextId>,
    pub action: StepAction,
}

fn nested_frame(frame: Option<FrameId>) -> Option<FrameId> {
    frame.filter(|frame| !frame.is_top())
}

impl ReplayStep {
    /// Decode a captured event. Returns `None` for kinds that are not
    /// replayed and for text inputs on fields that must never be recorded.
    pub fn from_event(event: &CapturedEvent) -> Option<Self> {
        let action = match event.kind {
            EventKind::ContextCreated => {
                let nav: NavigationPayload = event.decode_payload();
                StepAction::CreateContext {
                    url: nav.target_url().unwrap_or(BLANK_URL).to_string(),
                }
            }
            EventKind::UrlChanged => {
                let nav: NavigationPayload = event.decode_payload();
                StepAction::ChangeUrl {
                    url: nav.target_url().map(str::to_string),
                }
            }
            EventKind::ContextActivated => StepAction::ActivateContext,
            EventKind::WindowFocused => StepAction::FocusWindow,
            EventKind::Click => {
                let click: ClickPayload = event.decode_payload();
                StepAction::Click {
                    locator: click.locator(),
                    frame: nested_frame(click.frame_id),
                }
            }
            EventKind::TextInput => {
                let input: TextInputPayload = event.decode_payload();
                if input.field.as_ref().is_some_and(|field| !field.is_recordable()) {
                    tracing::debug!(event_id = event.id, "Dropping text input on unrecordable field");
                    return None;
                }
                StepAction::Input {
                    locator: input.locator(),
                    frame: nested_frame(input.frame_id),
                    value: input.value,
                }
            }
            EventKind::System | EventKind::Unknown => return None,
        };

        Some(Self {
            id: event.id,
            timestamp: event.timestamp,
            kind: event.kind,
            source_context: event.source_context,
            action,
        })
    }

    /// URL at which a context is created for this step when its recorded
    /// context has no live counterpart yet
    pub fn navigable_url(&self) -> Option<&str> {
        match &self.action {
            StepAction::CreateContext { url } => Some(url),
            StepAction::ChangeUrl { url } => url.as_deref(),
            _ => None,
        }
    }
}

/// The replayable subsequence of a window log: replayable kinds only,
/// ordered by timestamp with log order kept for equal timestamps.
pub fn replayable_steps(events: &[CapturedEvent]) -> Vec<ReplayStep> {
    let mut steps: Vec<ReplayStep> = events.iter().filter_map(ReplayStep::from_event).collect();
    steps.sort_by_key(|step| step.timestamp);
    steps
}

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::browser::WindowId;
use crate::capture::EventKind;
use crate::replay::options::StartOptions;

pub const DEFAULT_STATUS_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Start,
    Done,
    Timeout,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayState {
    pub running: bool,
    pub paused: bool,
    /// Only set on natural completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
}

impl ReplayState {
    pub fn running() -> Self {
        Self {
            running: true,
            paused: false,
            done: None,
        }
    }

    pub fn paused() -> Self {
        Self {
            running: true,
            paused: true,
            done: None,
        }
    }

    pub fn stopped() -> Self {
        Self {
            running: false,
            paused: false,
            done: None,
        }
    }

    pub fn finished() -> Self {
        Self {
            done: Some(true),
            ..Self::stopped()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepProgress {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub status: ProgressStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Notification emitted by a replay session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ReplayNotification {
    #[serde(rename = "replay_state")]
    State(ReplayState),
    #[serde(rename = "replay_progress")]
    Progress(StepProgress),
}

/// A notification together with the window it concerns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusEvent {
    #[serde(rename = "windowId")]
    pub window_id: WindowId,
    #[serde(flatten)]
    pub notification: ReplayNotification,
}

/// Commands accepted by the replayer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ReplayCommand {
    Start {
        #[serde(rename = "windowId")]
        window_id: WindowId,
        #[serde(default)]
        options: StartOptions,
    },
    Pause {
        #[serde(rename = "windowId")]
        window_id: WindowId,
    },
    Resume {
        #[serde(rename = "windowId")]
        window_id: WindowId,
    },
    Stop {
        #[serde(rename = "windowId")]
        window_id: WindowId,
    },
}

/// Fan-out of status events to any number of subscribers
#[derive(Debug, Clone)]
pub struct StatusHub {
    tx: broadcast::Sender<StatusEvent>,
}

impl StatusHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, window_id: WindowId, notification: ReplayNotification) {
        if self
            .tx
            .send(StatusEvent {
                window_id,
                notification,
            })
            .is_err()
        {
            tracing::trace!(%window_id, "No active subscribers for replay status");
        }
    }

    pub fn state(&self, window_id: WindowId, state: ReplayState) {
        self.emit(window_id, ReplayNotification::State(state));
    }

    pub fn progress(
        &self,
        window_id: WindowId,
        id: u64,
        kind: EventKind,
        status: ProgressStatus,
        message: Option<String>,
    ) {
        self.emit(
            window_id,
            ReplayNotification::Progress(StepProgress {
                id,
                kind,
                status,
                message,
            }),
        );
    }
}

impl Default for StatusHub {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_CAPACITY)
    }
}

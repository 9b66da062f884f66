use std::time::Duration;

use thiserror::Error;

use crate::browser::{ActionResponse, SurfaceError, WindowId};
use crate::replay::status::ProgressStatus;
use crate::resolver::{ELEMENT_NOT_EDITABLE, ELEMENT_NOT_FOUND};

/// Why a single step failed. Step failures never end a session.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StepError {
    #[error("element_not_found")]
    ElementNotFound,

    #[error("element_not_editable")]
    ElementNotEditable,

    #[error("timeout: no response within {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("navigation_timeout: {url} did not finish loading")]
    NavigationTimeout { url: String },

    #[error("no live context in window {0}")]
    NoContext(WindowId),

    /// The agent answered with an error code this engine does not classify
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ElementNotFound,
    ElementNotEditable,
    Timeout,
    NavigationTimeout,
    Error,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ElementNotFound => "element_not_found",
            ErrorKind::ElementNotEditable => "element_not_editable",
            ErrorKind::Timeout => "timeout",
            ErrorKind::NavigationTimeout => "navigation_timeout",
            ErrorKind::Error => "error",
        }
    }
}

impl StepError {
    /// Classify a failed agent response
    pub fn from_response(response: ActionResponse) -> Self {
        match response.error.as_deref() {
            Some(ELEMENT_NOT_FOUND) => StepError::ElementNotFound,
            Some(ELEMENT_NOT_EDITABLE) => StepError::ElementNotEditable,
            Some(other) => StepError::Rejected(other.to_string()),
            None => StepError::Rejected("action failed".to_string()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StepError::ElementNotFound => ErrorKind::ElementNotFound,
            StepError::ElementNotEditable => ErrorKind::ElementNotEditable,
            StepError::Timeout(_) => ErrorKind::Timeout,
            StepError::NavigationTimeout { .. } => ErrorKind::NavigationTimeout,
            StepError::NoContext(_) | StepError::Rejected(_) | StepError::Surface(_) => {
                ErrorKind::Error
            }
        }
    }

    /// Progress status reported for this failure
    pub fn status(&self) -> ProgressStatus {
        match self.kind() {
            ErrorKind::Timeout | ErrorKind::NavigationTimeout => ProgressStatus::Timeout,
            _ => ProgressStatus::Error,
        }
    }
}

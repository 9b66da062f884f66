//! Orchestrator side of replay: per-window sessions, pacing, context
//! remapping and status reporting.

pub mod context_map;
pub mod control;
pub mod error;
pub mod options;
pub mod pacing;
pub mod replayer;
pub mod session;
pub mod status;
pub mod steps;

pub use context_map::{ContextMapper, MappedContext};
pub use control::SessionControl;
pub use error::{ErrorKind, StepError};
pub use options::{
    EngineTimings, ReplayOptions, StartOptions, DEFAULT_CLICK_ROUND_TRIP, DEFAULT_INPUT_ROUND_TRIP,
    DEFAULT_LOAD_POLL, DEFAULT_MAX_STEP_DELAY, DEFAULT_NAVIGATION_TIMEOUT, DEFAULT_PAUSE_POLL,
    DEFAULT_SPEED,
};
pub use pacing::{plan, step_delay, PlannedStep};
pub use replayer::Replayer;
pub use session::{ReplayOutcome, ReplayReport, ReplaySession};
pub use status::{
    ProgressStatus, ReplayCommand, ReplayNotification, ReplayState, StatusEvent, StatusHub,
    StepProgress, DEFAULT_STATUS_CAPACITY,
};
pub use steps::{replayable_steps, ReplayStep, StepAction, BLANK_URL};

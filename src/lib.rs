pub mod browser;
pub mod capture;
pub mod cli;
pub mod config;
pub mod mock;
pub mod replay;
pub mod resolver;
pub mod util;

pub use browser::{
    deliver, ActionRequest, ActionResponse, BrowserSurface, ContextId, Delivery, FrameId,
    LoadState, SurfaceError, WindowId,
};
pub use capture::{CaptureLog, CaptureSource, CapturedEvent, EventKind, EventRecorder, LogExport};
pub use config::Config;
pub use replay::{
    ReplayCommand, ReplayNotification, ReplayOptions, ReplayReport, ReplaySession, Replayer,
    StatusEvent, StepError,
};
pub use resolver::{ElementResolver, PageDocument, ResolutionAgent, ResolutionPath};

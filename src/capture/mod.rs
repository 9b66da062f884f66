//! Captured interaction records and the in-memory per-window log.

pub mod event;
pub mod export;
pub mod field;
pub mod log;

pub use event::{
    CapturedEvent, ClickPayload, ContextSnapshot, EventKind, LocatorDescriptor, NavigationPayload,
    TextInputPayload,
};
pub use export::{ExportMeta, LogExport};
pub use field::FieldDescriptor;
pub use log::{CaptureError, CaptureLog, CaptureSource, EventRecorder, DEFAULT_LOG_CAPACITY};

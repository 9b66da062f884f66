use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::browser::{ContextId, WindowId};
use crate::capture::event::{CapturedEvent, EventKind, TextInputPayload};

/// Maximum number of events kept per window; older entries are evicted first.
pub const DEFAULT_LOG_CAPACITY: usize = 2000;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("text input on a `{0}` field is never recorded")]
    UnrecordableField(String),

    #[error("invalid capture log: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("capture log I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Read-only access to a window's ordered capture log.
pub trait CaptureSource: Send + Sync {
    /// Owned copy of the window's events in log order. Later appends do not
    /// affect a snapshot already taken.
    fn snapshot(&self, window: WindowId) -> Vec<CapturedEvent>;
}

/// In-memory, per-window, bounded capture log
pub struct CaptureLog {
    capacity: usize,
    windows: Mutex<HashMap<WindowId, VecDeque<CapturedEvent>>>,
}

impl CaptureLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn append(&self, window: WindowId, event: CapturedEvent) {
        let mut windows = self.windows.lock();
        let entries = windows.entry(window).or_default();
        entries.push_back(event);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    pub fn extend(&self, window: WindowId, events: impl IntoIterator<Item = CapturedEvent>) {
        for event in events {
            self.append(window, event);
        }
    }

    pub fn len(&self, window: WindowId) -> usize {
        self.windows.lock().get(&window).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self, window: WindowId) -> bool {
        self.len(window) == 0
    }

    pub fn clear(&self, window: WindowId) {
        self.windows.lock().remove(&window);
    }

    pub fn windows(&self) -> Vec<WindowId> {
        let mut ids: Vec<_> = self.windows.lock().keys().copied().collect();
        ids.sort();
        ids
    }
}

impl Default for CaptureLog {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSource for CaptureLog {
    fn snapshot(&self, window: WindowId) -> Vec<CapturedEvent> {
        self.windows
            .lock()
            .get(&window)
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Turns normalized capture records into log entries: assigns ids and
/// timestamps and applies the capture-side field filter.
pub struct EventRecorder {
    log: Arc<CaptureLog>,
    seq: AtomicU64,
    last_ts: Mutex<HashMap<WindowId, u64>>,
}

impl EventRecorder {
    pub fn new(log: Arc<CaptureLog>) -> Self {
        Self {
            log,
            seq: AtomicU64::new(1),
            last_ts: Mutex::new(HashMap::new()),
        }
    }

    pub fn log(&self) -> &Arc<CaptureLog> {
        &self.log
    }

    /// Record an interaction observed now
    pub fn record(
        &self,
        window: WindowId,
        kind: EventKind,
        source_context: Option<ContextId>,
        payload: serde_json::Value,
    ) -> Result<CapturedEvent, CaptureError> {
        let now = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default();
        self.record_at(window, now, kind, source_context, payload)
    }

    /// Record an interaction with an explicit capture instant.
    ///
    /// Timestamps never go backwards within a window: an instant earlier than
    /// the window's last entry is raised to it.
    pub fn record_at(
        &self,
        window: WindowId,
        timestamp: u64,
        kind: EventKind,
        source_context: Option<ContextId>,
        payload: serde_json::Value,
    ) -> Result<CapturedEvent, CaptureError> {
        if kind == EventKind::TextInput {
            let text = TextInputPayload::deserialize_lenient(&payload);
            if let Some(field) = text.field.filter(|f| !f.is_recordable()) {
                tracing::debug!(
                    window_id = %window,
                    field_type = %field.field_type,
                    "Dropping text input on non-recordable field"
                );
                return Err(CaptureError::UnrecordableField(field.field_type));
            }
        }

        let timestamp = {
            let mut last = self.last_ts.lock();
            let slot = last.entry(window).or_insert(0);
            *slot = (*slot).max(timestamp);
            *slot
        };

        let event = CapturedEvent::new(
            self.seq.fetch_add(1, Ordering::SeqCst),
            timestamp,
            kind,
            source_context,
            payload,
        )
        .with_window(window);
        self.log.append(window, event.clone());
        Ok(event)
    }
}

impl TextInputPayload {
    fn deserialize_lenient(payload: &serde_json::Value) -> Self {
        serde_json::from_value(payload.clone()).unwrap_or_default()
    }
}

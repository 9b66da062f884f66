use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::browser::{BrowserSurface, WindowId};
use crate::capture::CaptureSource;
use crate::replay::control::SessionControl;
use crate::replay::options::{EngineTimings, ReplayOptions, StartOptions};
use crate::replay::session::{ReplayReport, ReplaySession};
use crate::replay::status::{ReplayCommand, ReplayState, StatusEvent, StatusHub};

/// Owns the per-window session table and routes commands to it.
///
/// At most one session runs per window. A session stays registered until its
/// task has returned, so a window cannot be restarted while a stopped
/// session is still finishing its in-flight step.
pub struct Replayer {
    surface: Arc<dyn BrowserSurface>,
    source: Arc<dyn CaptureSource>,
    defaults: ReplayOptions,
    timings: EngineTimings,
    status: StatusHub,
    sessions: Arc<Mutex<HashMap<WindowId, Arc<SessionControl>>>>,
}

impl Replayer {
    pub fn new(surface: Arc<dyn BrowserSurface>, source: Arc<dyn CaptureSource>) -> Self {
        Self {
            surface,
            source,
            defaults: ReplayOptions::default(),
            timings: EngineTimings::default(),
            status: StatusHub::default(),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_defaults(mut self, defaults: ReplayOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_timings(mut self, timings: EngineTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_status(mut self, status: StatusHub) -> Self {
        self.status = status;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.status.subscribe()
    }

    /// Start replaying `window`'s log.
    ///
    /// Returns `None` without side effects when a session is already running
    /// for the window or the log holds no replayable steps.
    pub fn start(&self, window: WindowId, options: StartOptions) -> Option<JoinHandle<ReplayReport>> {
        let mut sessions = self.sessions.lock();
        if sessions.contains_key(&window) {
            tracing::debug!(window_id = %window, "Replay already running; ignoring start");
            return None;
        }

        let session = ReplaySession::new(
            window,
            self.source.as_ref(),
            self.surface.clone(),
            self.status.clone(),
            self.defaults.with_overrides(&options),
            self.timings,
        );
        if session.is_empty() {
            tracing::debug!(window_id = %window, "Nothing to replay");
            return None;
        }

        let control = session.control();
        sessions.insert(window, control.clone());
        // Emitted under the table lock so no pause or stop can precede it.
        self.status.state(window, ReplayState::running());
        drop(sessions);

        let table = self.sessions.clone();
        Some(tokio::spawn(async move {
            let report = session.run_announced().await;
            let mut sessions = table.lock();
            if sessions
                .get(&window)
                .is_some_and(|current| Arc::ptr_eq(current, &control))
            {
                sessions.remove(&window);
            }
            report
        }))
    }

    pub fn pause(&self, window: WindowId) {
        if self.control(window).is_some_and(|control| control.pause()) {
            self.status.state(window, ReplayState::paused());
        }
    }

    pub fn resume(&self, window: WindowId) {
        if self.control(window).is_some_and(|control| control.resume()) {
            self.status.state(window, ReplayState::running());
        }
    }

    /// Request a cooperative stop. The step in flight, if any, completes.
    pub fn stop(&self, window: WindowId) {
        if self.control(window).is_some_and(|control| control.stop()) {
            tracing::info!(window_id = %window, "Replay stop requested");
            self.status.state(window, ReplayState::stopped());
        }
    }

    pub fn handle(&self, command: ReplayCommand) -> Option<JoinHandle<ReplayReport>> {
        match command {
            ReplayCommand::Start { window_id, options } => return self.start(window_id, options),
            ReplayCommand::Pause { window_id } => self.pause(window_id),
            ReplayCommand::Resume { window_id } => self.resume(window_id),
            ReplayCommand::Stop { window_id } => self.stop(window_id),
        }
        None
    }

    /// Steps completed by the window's current session
    pub fn cursor(&self, window: WindowId) -> Option<usize> {
        self.control(window).map(|control| control.cursor())
    }

    pub fn is_running(&self, window: WindowId) -> bool {
        self.control(window)
            .is_some_and(|control| !control.is_stopped())
    }

    pub fn is_paused(&self, window: WindowId) -> bool {
        self.control(window).is_some_and(|control| control.is_paused())
    }

    fn control(&self, window: WindowId) -> Option<Arc<SessionControl>> {
        self.sessions.lock().get(&window).cloned()
    }
}

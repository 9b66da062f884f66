//! Capture records and a ready-to-run replay harness

use std::sync::Arc;

use serde_json::json;
use tokio::sync::broadcast;

use replayer::browser::{ContextId, WindowId};
use replayer::capture::{CaptureLog, CapturedEvent, EventKind, FieldDescriptor};
use replayer::mock::{MockBrowser, MockElement, MockPage};
use replayer::replay::{
    EngineTimings, ProgressStatus, ReplayNotification, ReplayOptions, ReplayReport, ReplayState,
    Replayer, StartOptions, StatusEvent,
};

pub const WINDOW: WindowId = WindowId(1);
/// Context id the events were recorded in
pub const RECORDED: ContextId = ContextId(501);
pub const FORM_URL: &str = "https://form.test/";
/// Arbitrary capture epoch so timestamps look like real wall-clock millis
pub const T0: u64 = 1_700_000_000_000;

pub fn click(id: u64, ts: u64, element: &str) -> CapturedEvent {
    CapturedEvent::new(
        id,
        T0 + ts,
        EventKind::Click,
        Some(RECORDED),
        json!({"id": element, "tag": "BUTTON", "url": FORM_URL}),
    )
}

pub fn text_input(id: u64, ts: u64, element: &str, value: &str) -> CapturedEvent {
    CapturedEvent::new(
        id,
        T0 + ts,
        EventKind::TextInput,
        Some(RECORDED),
        json!({
            "id": element,
            "value": value,
            "reason": "blur",
            "field": FieldDescriptor::input("text"),
        }),
    )
}

pub fn context_created(id: u64, ts: u64, context: ContextId, url: &str) -> CapturedEvent {
    CapturedEvent::new(id, T0 + ts, EventKind::ContextCreated, Some(context), json!({"url": url}))
}

pub fn url_changed(id: u64, ts: u64, context: ContextId, url: &str) -> CapturedEvent {
    CapturedEvent::new(id, T0 + ts, EventKind::UrlChanged, Some(context), json!({"to": url}))
}

pub fn context_activated(id: u64, ts: u64, context: ContextId) -> CapturedEvent {
    CapturedEvent::new(
        id,
        T0 + ts,
        EventKind::ContextActivated,
        Some(context),
        json!({"url": FORM_URL}),
    )
}

pub fn window_focused(id: u64, ts: u64) -> CapturedEvent {
    CapturedEvent::new(id, T0 + ts, EventKind::WindowFocused, None, json!({"url": FORM_URL}))
}

/// The standard form page: a submit button and a text field
pub fn form_page() -> MockPage {
    MockPage::new(
        FORM_URL,
        vec![MockElement::button("btn"), MockElement::text_field("field")],
    )
}

pub struct Harness {
    pub browser: Arc<MockBrowser>,
    pub log: Arc<CaptureLog>,
    pub replayer: Replayer,
    /// Context open in the window before replay starts
    pub live: ContextId,
}

impl Harness {
    pub fn new(browser: MockBrowser, events: Vec<CapturedEvent>) -> Self {
        Self::with_timings(browser, events, EngineTimings::default())
    }

    pub fn with_timings(
        browser: MockBrowser,
        events: Vec<CapturedEvent>,
        timings: EngineTimings,
    ) -> Self {
        let browser = Arc::new(browser);
        let live = browser.open_window(WINDOW, FORM_URL);
        let log = Arc::new(CaptureLog::new());
        log.extend(WINDOW, events);
        let replayer = Replayer::new(browser.clone(), log.clone())
            .with_defaults(ReplayOptions::default())
            .with_timings(timings);
        Self {
            browser,
            log,
            replayer,
            live,
        }
    }

    /// Run the window's replay to the end and return everything it emitted
    pub async fn run(&self, options: StartOptions) -> (ReplayReport, Vec<ReplayNotification>) {
        let mut rx = self.replayer.subscribe();
        let task = self
            .replayer
            .start(WINDOW, options)
            .expect("replay should start");
        let report = task.await.expect("replay task panicked");
        (report, drain(&mut rx))
    }
}

pub fn drain(rx: &mut broadcast::Receiver<StatusEvent>) -> Vec<ReplayNotification> {
    std::iter::from_fn(|| rx.try_recv().ok())
        .map(|event| event.notification)
        .collect()
}

/// `(step id, status)` pairs in emission order
pub fn progress(notifications: &[ReplayNotification]) -> Vec<(u64, ProgressStatus)> {
    notifications
        .iter()
        .filter_map(|n| match n {
            ReplayNotification::Progress(p) => Some((p.id, p.status)),
            _ => None,
        })
        .collect()
}

pub fn states(notifications: &[ReplayNotification]) -> Vec<ReplayState> {
    notifications
        .iter()
        .filter_map(|n| match n {
            ReplayNotification::State(state) => Some(*state),
            _ => None,
        })
        .collect()
}

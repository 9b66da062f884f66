//! End-to-end replay scenarios
//!
//! Each test records a small log, replays it against the mock browser with
//! tokio's clock paused, and checks notifications, timing and page effects.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;

use replayer::browser::{ContextId, FrameId, Rect, WindowId};
use replayer::capture::{
    CaptureError, CaptureLog, CapturedEvent, EventKind, EventRecorder, FieldDescriptor,
};
use replayer::mock::{MockBrowser, MockElement, MockPage, SurfaceCall};
use replayer::replay::{
    EngineTimings, ProgressStatus, ReplayNotification, ReplayOutcome, ReplayState, Replayer,
    StartOptions, StepProgress,
};

use super::common::fixtures::{
    click, context_activated, context_created, drain, form_page, progress, states, text_input,
    url_changed, window_focused, Harness, FORM_URL, RECORDED, T0, WINDOW,
};

use ProgressStatus::{Done, Error, Start, Timeout};

/// Click then type: the second step waits the recorded 500ms
#[tokio::test(start_paused = true)]
async fn test_click_then_input_reproduces_recorded_gap() {
    let harness = Harness::new(
        MockBrowser::new().with_page(form_page()),
        vec![click(1, 0, "btn"), text_input(2, 500, "field", "hello")],
    );

    let (report, notifications) = harness.run(StartOptions::default()).await;

    assert_eq!(report.outcome, ReplayOutcome::Finished);
    assert_eq!(progress(&notifications), vec![(1, Start), (1, Done), (2, Start), (2, Done)]);
    assert_eq!(
        states(&notifications),
        vec![ReplayState::running(), ReplayState::finished()]
    );

    let sent = harness.browser.action_times();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1] - sent[0], Duration::from_millis(500));

    let doc = harness.browser.document(harness.live, FrameId::TOP).unwrap();
    assert_eq!(doc.clicks_on("btn"), 1);
    assert_eq!(doc.value_of("field").as_deref(), Some("hello"));
}

/// A 10s recorded gap is clamped to the configured maximum
#[tokio::test(start_paused = true)]
async fn test_long_gap_is_clamped_to_max_step_delay() {
    let harness = Harness::new(
        MockBrowser::new().with_page(form_page()),
        vec![click(1, 0, "btn"), click(2, 10_000, "btn")],
    );

    let options = StartOptions {
        speed: None,
        max_step_delay_ms: Some(1000),
    };
    harness.run(options).await;

    let sent = harness.browser.action_times();
    assert_eq!(sent[1] - sent[0], Duration::from_millis(1000));
}

/// Speed divides recorded gaps
#[tokio::test(start_paused = true)]
async fn test_speed_factor_shortens_waits() {
    let harness = Harness::new(
        MockBrowser::new().with_page(form_page()),
        vec![click(1, 0, "btn"), click(2, 2000, "btn")],
    );

    let options = StartOptions {
        speed: Some(4.0),
        max_step_delay_ms: None,
    };
    harness.run(options).await;

    let sent = harness.browser.action_times();
    assert_eq!(sent[1] - sent[0], Duration::from_millis(500));
}

/// No answer within the round trip: the step times out and the next one runs
#[tokio::test(start_paused = true)]
async fn test_round_trip_timeout_does_not_stop_replay() {
    // The agent would keep searching past the orchestrator's deadline.
    let timings = EngineTimings {
        click_timeout: Duration::from_secs(30),
        ..EngineTimings::default()
    };
    let harness = Harness::with_timings(
        MockBrowser::new().with_page(form_page()),
        vec![
            click(1, 0, "ghost"),
            text_input(2, 100, "field", "still typed"),
        ],
        timings,
    );
    let started = Instant::now();

    let (report, notifications) = harness.run(StartOptions::default()).await;

    assert_eq!(progress(&notifications), vec![(1, Start), (1, Timeout), (2, Start), (2, Done)]);
    assert_eq!(report.failed, 1);
    assert_eq!(report.completed, 2);
    assert!(started.elapsed() >= timings.click_round_trip);

    let doc = harness.browser.document(harness.live, FrameId::TOP).unwrap();
    assert_eq!(doc.value_of("field").as_deref(), Some("still typed"));
}

/// With default budgets the agent gives up first and reports the element missing
#[tokio::test(start_paused = true)]
async fn test_missing_element_is_reported_as_error() {
    let harness = Harness::new(
        MockBrowser::new().with_page(form_page()),
        vec![click(1, 0, "ghost"), click(2, 100, "btn")],
    );

    let (_, notifications) = harness.run(StartOptions::default()).await;

    let failure = notifications
        .iter()
        .find_map(|n| match n {
            ReplayNotification::Progress(p) if p.id == 1 && p.status != Start => Some(p.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(failure.status, Error);
    assert_eq!(failure.message.as_deref(), Some("element_not_found"));
    assert_eq!(progress(&notifications)[3], (2, Done));
}

/// Unresponsive page: every round trip expires and is classified as timeout
#[tokio::test(start_paused = true)]
async fn test_unresponsive_agent_times_out() {
    let harness = Harness::new(
        MockBrowser::new().with_page(form_page().unresponsive()),
        vec![click(1, 0, "btn")],
    );

    let (_, notifications) = harness.run(StartOptions::default()).await;

    assert_eq!(progress(&notifications), vec![(1, Start), (1, Timeout)]);
}

/// A second start while running is ignored
#[tokio::test(start_paused = true)]
async fn test_double_start_creates_one_loop() {
    let harness = Harness::new(
        MockBrowser::new().with_page(form_page()),
        vec![click(1, 0, "btn"), click(2, 300, "btn")],
    );
    let mut rx = harness.replayer.subscribe();

    let first = harness.replayer.start(WINDOW, StartOptions::default());
    let second = harness.replayer.start(WINDOW, StartOptions::default());
    assert!(first.is_some());
    assert!(second.is_none());
    first.unwrap().await.unwrap();

    let notifications = drain(&mut rx);
    let starts: Vec<u64> = progress(&notifications)
        .into_iter()
        .filter(|(_, status)| *status == Start)
        .map(|(id, _)| id)
        .collect();
    assert_eq!(starts, vec![1, 2]);
    let doc = harness.browser.document(harness.live, FrameId::TOP).unwrap();
    assert_eq!(doc.clicks_on("btn"), 2);
}

/// Stop lets the in-flight step finish, then ends the session without `done`
#[tokio::test(start_paused = true)]
async fn test_stop_waits_for_in_flight_step() {
    let harness = Harness::new(
        MockBrowser::new()
            .with_page(form_page())
            .with_action_latency(Duration::from_secs(2)),
        vec![click(1, 0, "btn"), click(2, 100, "btn"), click(3, 200, "btn")],
    );
    let mut rx = harness.replayer.subscribe();
    let task = harness.replayer.start(WINDOW, StartOptions::default()).unwrap();

    loop {
        let event = rx.recv().await.unwrap();
        if matches!(event.notification, ReplayNotification::Progress(ref p) if p.status == Start) {
            break;
        }
    }
    harness.replayer.stop(WINDOW);
    assert!(!harness.replayer.is_running(WINDOW));

    let report = task.await.unwrap();
    assert_eq!(report.outcome, ReplayOutcome::Stopped);
    assert_eq!(report.completed, 1);

    let rest = drain(&mut rx);
    assert_eq!(
        rest,
        vec![
            ReplayNotification::State(ReplayState::stopped()),
            ReplayNotification::Progress(StepProgress {
                id: 1,
                kind: EventKind::Click,
                status: Done,
                message: None,
            }),
        ]
    );
    let doc = harness.browser.document(harness.live, FrameId::TOP).unwrap();
    assert_eq!(doc.clicks_on("btn"), 1);
}

/// Unique id wins even when class, xpath and coordinates point elsewhere
#[tokio::test(start_paused = true)]
async fn test_unique_id_beats_other_locators() {
    let page = MockPage::new(
        FORM_URL,
        vec![
            MockElement::button("save")
                .with_class("btn")
                .with_rect(Rect::new(0.0, 0.0, 40.0, 20.0)),
            MockElement::button("other")
                .with_class("btn")
                .with_xpath("/html[1]/body[1]/button[2]")
                .with_rect(Rect::new(100.0, 0.0, 40.0, 20.0)),
        ],
    );
    let event = CapturedEvent::new(
        1,
        T0,
        EventKind::Click,
        Some(RECORDED),
        json!({
            "id": "save",
            "class_name": "btn",
            "xpath": "/html[1]/body[1]/button[2]",
            "x": 110.0,
            "y": 10.0,
        }),
    );
    let harness = Harness::new(MockBrowser::new().with_page(page), vec![event]);

    let (report, _) = harness.run(StartOptions::default()).await;

    assert_eq!(report.failed, 0);
    let doc = harness.browser.document(harness.live, FrameId::TOP).unwrap();
    assert_eq!(doc.clicks_on("save"), 1);
    assert_eq!(doc.clicks_on("other"), 0);
}

/// Password edits are rejected at capture time and so never replayed
#[tokio::test(start_paused = true)]
async fn test_password_input_is_never_replayed() {
    let browser = Arc::new(MockBrowser::new().with_page(MockPage::new(
        FORM_URL,
        vec![MockElement::text_field("user"), MockElement::text_field("pass")],
    )));
    let live = browser.open_window(WINDOW, FORM_URL);
    let log = Arc::new(CaptureLog::new());
    let recorder = EventRecorder::new(log.clone());

    recorder
        .record_at(
            WINDOW,
            T0,
            EventKind::TextInput,
            Some(RECORDED),
            json!({"id": "user", "value": "alice", "field": FieldDescriptor::input("email")}),
        )
        .unwrap();
    let rejected = recorder.record_at(
        WINDOW,
        T0 + 100,
        EventKind::TextInput,
        Some(RECORDED),
        json!({"id": "pass", "value": "hunter2", "field": FieldDescriptor::input("password")}),
    );
    assert!(matches!(rejected, Err(CaptureError::UnrecordableField(_))));

    let replayer = Replayer::new(browser.clone(), log);
    replayer
        .start(WINDOW, StartOptions::default())
        .unwrap()
        .await
        .unwrap();

    let doc = browser.document(live, FrameId::TOP).unwrap();
    assert_eq!(doc.value_of("user").as_deref(), Some("alice"));
    assert_eq!(doc.value_of("pass").as_deref(), Some(""));
    let inputs = browser
        .calls()
        .into_iter()
        .filter(|call| matches!(call, SurfaceCall::SendAction { .. }))
        .count();
    assert_eq!(inputs, 1);
}

/// Cursor never goes backwards and ends at the number of steps
#[tokio::test(start_paused = true)]
async fn test_cursor_is_monotonic_and_reaches_step_count() {
    let events = (1..=5).map(|i| click(i, i * 400, "btn")).collect();
    let harness = Harness::new(MockBrowser::new().with_page(form_page()), events);
    let task = harness.replayer.start(WINDOW, StartOptions::default()).unwrap();

    let mut seen = Vec::new();
    while !task.is_finished() {
        if let Some(cursor) = harness.replayer.cursor(WINDOW) {
            seen.push(cursor);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let report = task.await.unwrap();

    assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]), "{seen:?}");
    assert_eq!(report.completed, 5);
    assert_eq!(report.total, 5);
}

/// New recorded context: created at its URL, later steps go to it
#[tokio::test(start_paused = true)]
async fn test_created_context_receives_later_steps() {
    let recorded_tab = ContextId(77);
    let browser = MockBrowser::new()
        .with_page(form_page())
        .with_page(
            MockPage::new("https://shop.test/", vec![MockElement::button("buy")])
                .with_load_delay(Duration::from_millis(800)),
        );
    let mut buy = click(2, 100, "buy");
    buy.source_context = Some(recorded_tab);
    let harness = Harness::new(
        browser,
        vec![context_created(1, 0, recorded_tab, "https://shop.test/"), buy],
    );

    let (report, _) = harness.run(StartOptions::default()).await;

    assert_eq!(report.failed, 0);
    let contexts = harness.browser.contexts_of(WINDOW);
    assert_eq!(contexts.len(), 2);
    let created = contexts[1];
    assert_eq!(harness.browser.context_url(created).as_deref(), Some("https://shop.test/"));
    let doc = harness.browser.document(created, FrameId::TOP).unwrap();
    assert_eq!(doc.clicks_on("buy"), 1);
}

/// Navigation in a mapped context reloads it and re-installs the agent
#[tokio::test(start_paused = true)]
async fn test_url_change_navigates_mapped_context() {
    let browser = MockBrowser::new()
        .with_page(form_page())
        .with_page(MockPage::new("https://form.test/thanks", vec![MockElement::button("home")]));
    let harness = Harness::new(
        browser,
        vec![
            click(1, 0, "btn"),
            url_changed(2, 50, RECORDED, "https://form.test/thanks"),
            click(3, 100, "home"),
        ],
    );

    let (report, notifications) = harness.run(StartOptions::default()).await;

    assert_eq!(report.failed, 0, "{notifications:?}");
    assert_eq!(harness.browser.contexts_of(WINDOW), vec![harness.live]);
    assert!(harness.browser.calls().contains(&SurfaceCall::Navigate {
        context: harness.live,
        url: "https://form.test/thanks".into(),
    }));
    let doc = harness.browser.document(harness.live, FrameId::TOP).unwrap();
    assert_eq!(doc.clicks_on("home"), 1);
}

/// A page that never loads fails its step as timeout; replay continues
#[tokio::test(start_paused = true)]
async fn test_navigation_timeout_is_reported_and_skipped() {
    let stuck_tab = ContextId(90);
    let browser = MockBrowser::new()
        .with_page(form_page())
        .with_page(MockPage::new("https://slow.test/", vec![]).never_loading());
    let harness = Harness::new(
        browser,
        vec![
            click(1, 0, "btn"),
            context_created(2, 50, stuck_tab, "https://slow.test/"),
            click(3, 100, "btn"),
        ],
    );

    let (_, notifications) = harness.run(StartOptions::default()).await;

    assert_eq!(
        progress(&notifications),
        vec![(1, Start), (1, Done), (2, Start), (2, Timeout), (3, Start), (3, Done)]
    );
    let contexts = harness.browser.contexts_of(WINDOW);
    assert_eq!(contexts.len(), 2);
    assert_eq!(harness.browser.context_url(contexts[1]).as_deref(), Some("https://slow.test/"));
}

/// Windows replay independently and concurrently
#[tokio::test(start_paused = true)]
async fn test_windows_replay_concurrently() {
    let other = WindowId(2);
    let browser = Arc::new(MockBrowser::new().with_page(form_page()));
    let live_a = browser.open_window(WINDOW, FORM_URL);
    let live_b = browser.open_window(other, FORM_URL);
    let log = Arc::new(CaptureLog::new());
    log.extend(WINDOW, vec![click(1, 0, "btn"), click(2, 2000, "btn")]);
    log.extend(other, vec![click(1, 0, "btn"), click(2, 2000, "btn")]);
    let replayer = Replayer::new(browser.clone(), log);
    let started = Instant::now();

    let tasks = [WINDOW, other]
        .map(|window| replayer.start(window, StartOptions::default()).unwrap());
    replayer.pause(other);
    replayer.resume(other);
    let reports = futures::future::join_all(tasks).await;

    for report in reports {
        assert_eq!(report.unwrap().completed, 2);
    }
    assert!(started.elapsed() < Duration::from_millis(2500));
    for live in [live_a, live_b] {
        let doc = browser.document(live, FrameId::TOP).unwrap();
        assert_eq!(doc.clicks_on("btn"), 2);
    }
}

/// Starting a replay brings its window to the foreground first
#[tokio::test(start_paused = true)]
async fn test_start_focuses_window() {
    let browser = MockBrowser::new().with_page(form_page());
    browser.open_window(WindowId(9), FORM_URL);
    let harness = Harness::new(browser, vec![click(1, 0, "btn")]);
    assert_eq!(harness.browser.focused_window(), Some(WindowId(9)));

    let (report, _) = harness.run(StartOptions::default()).await;

    assert_eq!(report.failed, 0);
    assert_eq!(harness.browser.calls()[0], SurfaceCall::FocusWindow(WINDOW));
    assert_eq!(harness.browser.focused_window(), Some(WINDOW));
}

/// A click on a background context activates it before the action is sent
#[tokio::test(start_paused = true)]
async fn test_click_activates_mapped_context() {
    let harness = Harness::new(
        MockBrowser::new().with_page(form_page()),
        vec![
            click(1, 0, "btn"),
            context_created(2, 50, ContextId(78), FORM_URL),
            click(3, 100, "btn"),
        ],
    );

    let (report, _) = harness.run(StartOptions::default()).await;

    assert_eq!(report.failed, 0);
    assert_eq!(harness.browser.active(WINDOW), Some(harness.live));
    let calls = harness.browser.calls();
    let tail = &calls[calls.len() - 3..];
    assert_eq!(tail[0], SurfaceCall::FocusWindow(WINDOW));
    assert_eq!(tail[1], SurfaceCall::Activate(harness.live));
    assert!(matches!(
        tail[2],
        SurfaceCall::SendAction { context, .. } if context == harness.live
    ));
    let doc = harness.browser.document(harness.live, FrameId::TOP).unwrap();
    assert_eq!(doc.clicks_on("btn"), 2);
}

/// `window_focus` focuses the window and `tab_activated` activates the mapped context
#[tokio::test(start_paused = true)]
async fn test_focus_and_activation_steps_drive_the_browser() {
    let browser = MockBrowser::new().with_page(form_page());
    browser.open_window(WindowId(9), FORM_URL);
    let harness = Harness::new(
        browser,
        vec![
            click(1, 0, "btn"),
            context_created(2, 50, ContextId(78), FORM_URL),
            window_focused(3, 100),
            context_activated(4, 150, RECORDED),
        ],
    );

    let (report, notifications) = harness.run(StartOptions::default()).await;

    assert_eq!(report.failed, 0, "{notifications:?}");
    let created = harness.browser.contexts_of(WINDOW)[1];
    let calls = harness.browser.calls();
    let after_create = calls
        .iter()
        .position(|call| matches!(call, SurfaceCall::CreateContext { .. }))
        .unwrap();
    assert_eq!(
        &calls[after_create + 1..],
        &[
            SurfaceCall::InstallAgent(created),
            SurfaceCall::FocusWindow(WINDOW),
            SurfaceCall::InstallAgent(harness.live),
            SurfaceCall::Activate(harness.live),
        ]
    );
    assert_eq!(harness.browser.focused_window(), Some(WINDOW));
    assert_eq!(harness.browser.active(WINDOW), Some(harness.live));
}

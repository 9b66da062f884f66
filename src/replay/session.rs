//! One replay pass over a window's captured steps.
//!
//! A [`ReplaySession`] snapshots the replayable subsequence when it is built
//! and then drives every step, in order, through the context mapper and the
//! in-page agent. Per-step failures are classified and reported on the
//! status hub; the pass only ends on completion or when stopped.

use std::sync::Arc;

use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::browser::{deliver, ActionRequest, BrowserSurface, ContextId, Delivery, WindowId};
use crate::capture::CaptureSource;
use crate::replay::context_map::ContextMapper;
use crate::replay::control::SessionControl;
use crate::replay::error::StepError;
use crate::replay::options::{EngineTimings, ReplayOptions};
use crate::replay::pacing::step_delay;
use crate::replay::status::{ProgressStatus, ReplayState, StatusHub};
use crate::replay::steps::{replayable_steps, ReplayStep, StepAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayOutcome {
    /// Every step was attempted
    Finished,
    Stopped,
}

/// Summary of a finished pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    pub run_id: Uuid,
    pub window_id: WindowId,
    pub outcome: ReplayOutcome,
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
}

pub struct ReplaySession {
    window: WindowId,
    run_id: Uuid,
    steps: Vec<ReplayStep>,
    options: ReplayOptions,
    timings: EngineTimings,
    surface: Arc<dyn BrowserSurface>,
    status: StatusHub,
    control: Arc<SessionControl>,
    contexts: ContextMapper,
}

impl ReplaySession {
    /// Build a session over the current contents of `source` for `window`
    pub fn new(
        window: WindowId,
        source: &dyn CaptureSource,
        surface: Arc<dyn BrowserSurface>,
        status: StatusHub,
        options: ReplayOptions,
        timings: EngineTimings,
    ) -> Self {
        let steps = replayable_steps(&source.snapshot(window));
        Self::from_steps(window, steps, surface, status, options, timings)
    }

    pub fn from_steps(
        window: WindowId,
        steps: Vec<ReplayStep>,
        surface: Arc<dyn BrowserSurface>,
        status: StatusHub,
        options: ReplayOptions,
        timings: EngineTimings,
    ) -> Self {
        Self {
            window,
            run_id: Uuid::new_v4(),
            steps,
            options,
            timings,
            surface,
            status,
            control: Arc::new(SessionControl::new()),
            contexts: ContextMapper::new(window, timings.load_poll, timings.navigation_timeout),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn control(&self) -> Arc<SessionControl> {
        self.control.clone()
    }

    pub fn steps(&self) -> &[ReplayStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Drive all steps. Returns once every step was attempted or the
    /// session was stopped.
    pub async fn run(self) -> ReplayReport {
        self.run_with(true).await
    }

    /// Like [`Self::run`], for callers that already emitted the `running`
    /// state before handing the session to a task.
    pub(crate) async fn run_announced(self) -> ReplayReport {
        self.run_with(false).await
    }

    async fn run_with(mut self, announce: bool) -> ReplayReport {
        let span = tracing::info_span!("replay", window_id = %self.window, run_id = %self.run_id);
        async move { self.drive(announce).await }.instrument(span).await
    }

    async fn drive(&mut self, announce: bool) -> ReplayReport {
        let steps = std::mem::take(&mut self.steps);
        let mut report = ReplayReport {
            run_id: self.run_id,
            window_id: self.window,
            outcome: ReplayOutcome::Finished,
            total: steps.len(),
            completed: 0,
            failed: 0,
        };
        if steps.is_empty() {
            return report;
        }

        if let Err(error) = self.surface.focus_window(self.window).await {
            tracing::debug!(error = %error, "Window focus failed");
        }
        tracing::info!(steps = steps.len(), speed = self.options.speed, "Replay started");
        if announce {
            self.status.state(self.window, ReplayState::running());
        }

        let mut previous = None;
        for step in &steps {
            if self.control.is_stopped()
                || !self.control.wait_while_paused(self.timings.pause_poll).await
            {
                report.outcome = ReplayOutcome::Stopped;
                break;
            }

            self.status
                .progress(self.window, step.id, step.kind, ProgressStatus::Start, None);
            let wait = step_delay(previous, step.timestamp, &self.options);
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }

            match self.execute(step).await {
                Ok(()) => {
                    self.status
                        .progress(self.window, step.id, step.kind, ProgressStatus::Done, None);
                }
                Err(error) => {
                    tracing::warn!(
                        step_id = step.id,
                        kind = %step.kind,
                        error = %error,
                        "Replay step failed"
                    );
                    report.failed += 1;
                    self.status.progress(
                        self.window,
                        step.id,
                        step.kind,
                        error.status(),
                        Some(error.to_string()),
                    );
                }
            }

            report.completed = self.control.advance();
            previous = Some(step.timestamp);
        }

        if report.outcome == ReplayOutcome::Finished {
            self.status.state(self.window, ReplayState::finished());
        }
        tracing::info!(
            outcome = ?report.outcome,
            completed = report.completed,
            failed = report.failed,
            "Replay ended"
        );
        report
    }

    /// Focus the window and activate `context` so page focus changes take
    /// effect. Both calls are best-effort.
    async fn bring_forward(&self, context: ContextId) {
        if let Err(error) = self.surface.focus_window(self.window).await {
            tracing::debug!(error = %error, "Window focus failed");
        }
        if let Err(error) = self.surface.activate_context(context).await {
            tracing::debug!(context_id = %context, error = %error, "Context activation failed");
        }
    }

    async fn execute(&mut self, step: &ReplayStep) -> Result<(), StepError> {
        let surface = self.surface.clone();
        match &step.action {
            StepAction::FocusWindow => {
                if let Err(error) = surface.focus_window(self.window).await {
                    tracing::debug!(step_id = step.id, error = %error, "Window focus failed");
                }
                Ok(())
            }
            StepAction::CreateContext { .. } => {
                self.contexts.resolve(surface.as_ref(), step).await?;
                Ok(())
            }
            StepAction::ChangeUrl { url } => {
                let mapped = self.contexts.resolve(surface.as_ref(), step).await?;
                match url {
                    Some(url) if !mapped.created => {
                        self.contexts
                            .navigate(surface.as_ref(), mapped.context, url)
                            .await
                    }
                    _ => Ok(()),
                }
            }
            StepAction::ActivateContext => {
                let mapped = self.contexts.resolve(surface.as_ref(), step).await?;
                if let Err(error) = surface.activate_context(mapped.context).await {
                    tracing::debug!(context_id = %mapped.context, error = %error, "Context activation failed");
                }
                Ok(())
            }
            StepAction::Click { locator, frame } => {
                let mapped = self.contexts.resolve(surface.as_ref(), step).await?;
                self.bring_forward(mapped.context).await;
                let request = ActionRequest::Click {
                    locator: locator.clone(),
                    timeout_ms: self.timings.click_timeout.as_millis() as u64,
                };
                let deadline = self.timings.click_round_trip;
                settle(
                    deliver(surface.as_ref(), mapped.context, *frame, request, deadline).await,
                    deadline,
                )
            }
            StepAction::Input {
                locator,
                value,
                frame,
            } => {
                let mapped = self.contexts.resolve(surface.as_ref(), step).await?;
                self.bring_forward(mapped.context).await;
                let request = ActionRequest::Input {
                    locator: locator.clone(),
                    value: value.clone(),
                    timeout_ms: self.timings.input_timeout.as_millis() as u64,
                };
                let deadline = self.timings.input_round_trip;
                settle(
                    deliver(surface.as_ref(), mapped.context, *frame, request, deadline).await,
                    deadline,
                )
            }
        }
    }
}

fn settle(delivery: Delivery, deadline: std::time::Duration) -> Result<(), StepError> {
    match delivery {
        Delivery::Ok(response) if response.ok => Ok(()),
        Delivery::Ok(response) => Err(StepError::from_response(response)),
        Delivery::Timeout => Err(StepError::Timeout(deadline)),
        Delivery::Error(error) => Err(error.into()),
    }
}

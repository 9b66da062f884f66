use std::time::Duration;

use serde::Serialize;

use crate::capture::EventKind;
use crate::replay::options::ReplayOptions;
use crate::replay::steps::ReplayStep;

/// Wait before a step recorded at `timestamp` when the previous step was
/// recorded at `previous`: the recorded gap divided by the speed, clamped to
/// `[0, max_step_delay]`. The first step never waits.
pub fn step_delay(previous: Option<u64>, timestamp: u64, options: &ReplayOptions) -> Duration {
    let Some(previous) = previous else {
        return Duration::ZERO;
    };
    let gap_ms = timestamp.saturating_sub(previous) as f64 / options.speed;
    Duration::try_from_secs_f64(gap_ms / 1000.0)
        .map_or(options.max_step_delay, |wait| wait.min(options.max_step_delay))
}

/// A step with the wait that precedes it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedStep {
    pub id: u64,
    pub timestamp: u64,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(rename = "waitMs")]
    pub wait_ms: u64,
}

/// Waits for an ordered step list, as a run would apply them.
pub fn plan(steps: &[ReplayStep], options: &ReplayOptions) -> Vec<PlannedStep> {
    let mut previous = None;
    steps
        .iter()
        .map(|step| {
            let wait = step_delay(previous, step.timestamp, options);
            previous = Some(step.timestamp);
            PlannedStep {
                id: step.id,
                timestamp: step.timestamp,
                kind: step.kind,
                wait_ms: wait.as_millis() as u64,
            }
        })
        .collect()
}

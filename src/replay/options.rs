use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::resolver::{DEFAULT_CLICK_TIMEOUT, DEFAULT_INPUT_TIMEOUT};

pub const DEFAULT_SPEED: f64 = 1.0;
pub const DEFAULT_MAX_STEP_DELAY: Duration = Duration::from_millis(3000);
pub const DEFAULT_PAUSE_POLL: Duration = Duration::from_millis(100);
pub const DEFAULT_LOAD_POLL: Duration = Duration::from_millis(250);
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_millis(15000);
pub const DEFAULT_CLICK_ROUND_TRIP: Duration = Duration::from_millis(6000);
pub const DEFAULT_INPUT_ROUND_TRIP: Duration = Duration::from_millis(8000);

/// Per-run pacing parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayOptions {
    /// Playback speed multiplier, always > 0
    pub speed: f64,
    /// Upper bound on any single inter-step wait
    pub max_step_delay: Duration,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            max_step_delay: DEFAULT_MAX_STEP_DELAY,
        }
    }
}

impl ReplayOptions {
    /// Apply the overrides of a start command. A non-positive or non-finite
    /// speed is ignored.
    pub fn with_overrides(self, start: &StartOptions) -> Self {
        Self {
            speed: start
                .speed
                .filter(|speed| speed.is_finite() && *speed > 0.0)
                .unwrap_or(self.speed),
            max_step_delay: start
                .max_step_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(self.max_step_delay),
        }
    }
}

/// Optional parameters carried by a start command
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StartOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(rename = "maxStepDelay", default, skip_serializing_if = "Option::is_none")]
    pub max_step_delay_ms: Option<u64>,
}

/// Engine-wide waits and deadlines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineTimings {
    pub pause_poll: Duration,
    pub load_poll: Duration,
    pub navigation_timeout: Duration,
    /// Agent-side resolution budget for clicks
    pub click_timeout: Duration,
    pub input_timeout: Duration,
    /// Orchestrator-side deadline for a click round trip
    pub click_round_trip: Duration,
    pub input_round_trip: Duration,
}

impl Default for EngineTimings {
    fn default() -> Self {
        Self {
            pause_poll: DEFAULT_PAUSE_POLL,
            load_poll: DEFAULT_LOAD_POLL,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            click_timeout: DEFAULT_CLICK_TIMEOUT,
            input_timeout: DEFAULT_INPUT_TIMEOUT,
            click_round_trip: DEFAULT_CLICK_ROUND_TRIP,
            input_round_trip: DEFAULT_INPUT_ROUND_TRIP,
        }
    }
}

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::browser::{BrowserSurface, ContextId, LoadState, SurfaceError, WindowId};
use crate::replay::error::StepError;
use crate::replay::steps::ReplayStep;

/// A live context resolved for a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedContext {
    pub context: ContextId,
    /// Created (and already navigated) for this very step
    pub created: bool,
}

/// Maps recorded context ids to live ones for a single session.
///
/// Window-level events have no recorded context; they share the `None` key.
#[derive(Debug)]
pub struct ContextMapper {
    window: WindowId,
    load_poll: Duration,
    navigation_timeout: Duration,
    map: HashMap<Option<ContextId>, ContextId>,
}

impl ContextMapper {
    pub fn new(window: WindowId, load_poll: Duration, navigation_timeout: Duration) -> Self {
        Self {
            window,
            load_poll: load_poll.max(Duration::from_millis(1)),
            navigation_timeout,
            map: HashMap::new(),
        }
    }

    pub fn get(&self, recorded: Option<ContextId>) -> Option<ContextId> {
        self.map.get(&recorded).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Find or create the live context for `step` and make sure the agent is
    /// installed in it.
    ///
    /// A step with a navigable URL and no mapping gets a fresh context. If
    /// that context does not finish loading in time the mapping is kept but
    /// the step fails with a navigation timeout.
    pub async fn resolve(
        &mut self,
        surface: &dyn BrowserSurface,
        step: &ReplayStep,
    ) -> Result<MappedContext, StepError> {
        if let Some(context) = self.get(step.source_context) {
            install_agent(surface, context).await;
            return Ok(MappedContext {
                context,
                created: false,
            });
        }

        if let Some(url) = step.navigable_url() {
            let context = surface.create_context(self.window, url).await?;
            self.map.insert(step.source_context, context);
            tracing::debug!(
                window_id = %self.window,
                recorded = ?step.source_context,
                context_id = %context,
                url,
                "Created replay context"
            );
            if !self.wait_for_load(surface, context).await? {
                return Err(StepError::NavigationTimeout {
                    url: url.to_string(),
                });
            }
            install_agent(surface, context).await;
            return Ok(MappedContext {
                context,
                created: true,
            });
        }

        let context = surface
            .active_context(self.window)
            .await?
            .ok_or(StepError::NoContext(self.window))?;
        self.map.insert(step.source_context, context);
        install_agent(surface, context).await;
        Ok(MappedContext {
            context,
            created: false,
        })
    }

    /// Navigate an already mapped context and wait for the new page
    pub async fn navigate(
        &self,
        surface: &dyn BrowserSurface,
        context: ContextId,
        url: &str,
    ) -> Result<(), StepError> {
        surface.navigate(context, url).await?;
        if !self.wait_for_load(surface, context).await? {
            return Err(StepError::NavigationTimeout {
                url: url.to_string(),
            });
        }
        install_agent(surface, context).await;
        Ok(())
    }

    /// Poll until the context reports `complete`. Returns `false` when the
    /// navigation timeout expires first.
    async fn wait_for_load(
        &self,
        surface: &dyn BrowserSurface,
        context: ContextId,
    ) -> Result<bool, SurfaceError> {
        let deadline = Instant::now() + self.navigation_timeout;
        loop {
            if surface.load_state(context).await? == LoadState::Complete {
                return Ok(true);
            }
            let now = Instant::now();
            if now >= deadline {
                tracing::debug!(context_id = %context, "Context did not finish loading");
                return Ok(false);
            }
            tokio::time::sleep(self.load_poll.min(deadline - now)).await;
        }
    }
}

/// Installation failures are not step failures; a missing agent shows up as
/// a failed delivery instead.
async fn install_agent(surface: &dyn BrowserSurface, context: ContextId) {
    if let Err(error) = surface.install_agent(context).await {
        tracing::debug!(context_id = %context, error = %error, "Agent installation failed");
    }
}

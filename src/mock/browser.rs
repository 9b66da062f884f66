//! In-memory [`BrowserSurface`] backed by [`MockDocument`]s.
//!
//! Pages are registered by URL; navigating a context to a URL builds fresh
//! documents from the registered fixture (or an empty page). The agent runs
//! in-process through a [`ResolutionAgent`], so replay timing behaves as it
//! would against a live page, including agent polling. Every surface call is
//! journaled with the (tokio) instant it happened at.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::browser::{
    ActionRequest, ActionResponse, BrowserSurface, ContextId, FrameId, LoadState, SurfaceError,
    WindowId,
};
use crate::mock::document::{MockDocument, MockElement};
use crate::resolver::ResolutionAgent;

/// Page fixture keyed by URL
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MockPage {
    pub url: String,
    pub elements: Vec<MockElement>,
    pub frames: Vec<MockFrame>,
    /// Overrides the browser-wide load delay
    pub load_ms: Option<u64>,
    /// Page stays in `loading` forever
    pub never_loads: bool,
    /// Agent accepts messages but never answers
    pub unresponsive: bool,
}

impl MockPage {
    pub fn new(url: &str, elements: Vec<MockElement>) -> Self {
        Self {
            url: url.to_string(),
            elements,
            ..Self::default()
        }
    }

    pub fn with_frame(mut self, frame: FrameId, elements: Vec<MockElement>) -> Self {
        self.frames.push(MockFrame { id: frame, elements });
        self
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_ms = Some(delay.as_millis() as u64);
        self
    }

    pub fn never_loading(mut self) -> Self {
        self.never_loads = true;
        self
    }

    pub fn unresponsive(mut self) -> Self {
        self.unresponsive = true;
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockFrame {
    pub id: FrameId,
    #[serde(default)]
    pub elements: Vec<MockElement>,
}

/// A surface operation as observed by the mock
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    FocusWindow(WindowId),
    CreateContext { window: WindowId, url: String },
    Navigate { context: ContextId, url: String },
    Activate(ContextId),
    InstallAgent(ContextId),
    SendAction {
        context: ContextId,
        frame: Option<FrameId>,
        request: ActionRequest,
    },
}

#[derive(Default)]
struct WindowState {
    contexts: Vec<ContextId>,
    active: Option<ContextId>,
}

struct ContextState {
    window: WindowId,
    url: String,
    ready_at: Option<Instant>,
    agent_installed: bool,
    unresponsive: bool,
    documents: HashMap<FrameId, Arc<MockDocument>>,
}

struct BrowserState {
    next_context: i64,
    windows: HashMap<WindowId, WindowState>,
    contexts: HashMap<ContextId, ContextState>,
    pages: HashMap<String, MockPage>,
    focused: Option<WindowId>,
    calls: Vec<(Instant, SurfaceCall)>,
}

impl Default for BrowserState {
    fn default() -> Self {
        Self {
            next_context: 1000,
            windows: HashMap::new(),
            contexts: HashMap::new(),
            pages: HashMap::new(),
            focused: None,
            calls: Vec::new(),
        }
    }
}

pub struct MockBrowser {
    agent: ResolutionAgent,
    load_delay: Duration,
    action_latency: Duration,
    state: Mutex<BrowserState>,
}

impl Default for MockBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBrowser {
    pub fn new() -> Self {
        Self {
            agent: ResolutionAgent::default(),
            load_delay: Duration::ZERO,
            action_latency: Duration::ZERO,
            state: Mutex::new(BrowserState::default()),
        }
    }

    pub fn with_agent(mut self, agent: ResolutionAgent) -> Self {
        self.agent = agent;
        self
    }

    /// Default time between navigation and `complete`
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    /// Transport delay added before the agent sees a request
    pub fn with_action_latency(mut self, latency: Duration) -> Self {
        self.action_latency = latency;
        self
    }

    pub fn with_page(self, page: MockPage) -> Self {
        self.add_page(page);
        self
    }

    pub fn add_page(&self, page: MockPage) {
        self.state.lock().pages.insert(page.url.clone(), page);
    }

    /// Open a window holding one loaded, active context at `url`.
    pub fn open_window(&self, window: WindowId, url: &str) -> ContextId {
        let mut state = self.state.lock();
        let context = Self::spawn_context(&mut state, window, url, Duration::ZERO, Instant::now());
        state.focused.get_or_insert(window);
        context
    }

    fn spawn_context(
        state: &mut BrowserState,
        window: WindowId,
        url: &str,
        load_delay: Duration,
        now: Instant,
    ) -> ContextId {
        state.next_context += 1;
        let context = ContextId(state.next_context);
        let mut ctx = ContextState {
            window,
            url: String::new(),
            ready_at: None,
            agent_installed: false,
            unresponsive: false,
            documents: HashMap::new(),
        };
        Self::load(&state.pages, &mut ctx, url, load_delay, now);
        state.contexts.insert(context, ctx);
        let win = state.windows.entry(window).or_default();
        win.contexts.push(context);
        win.active = Some(context);
        context
    }

    fn load(
        pages: &HashMap<String, MockPage>,
        ctx: &mut ContextState,
        url: &str,
        default_delay: Duration,
        now: Instant,
    ) {
        let page = pages.get(url).cloned().unwrap_or_else(|| MockPage::new(url, Vec::new()));
        let mut documents = HashMap::new();
        documents.insert(FrameId::TOP, Arc::new(MockDocument::top(page.elements)));
        for frame in page.frames {
            documents.insert(frame.id, Arc::new(MockDocument::frame(frame.elements)));
        }

        let delay = page.load_ms.map(Duration::from_millis).unwrap_or(default_delay);
        ctx.url = url.to_string();
        ctx.ready_at = (!page.never_loads).then(|| now + delay);
        ctx.agent_installed = false;
        ctx.unresponsive = page.unresponsive;
        ctx.documents = documents;
    }

    fn record(&self, call: SurfaceCall) {
        self.state.lock().calls.push((Instant::now(), call));
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.state.lock().calls.iter().map(|(_, call)| call.clone()).collect()
    }

    /// Instants at which action requests were sent, in order
    pub fn action_times(&self) -> Vec<Instant> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|(_, call)| matches!(call, SurfaceCall::SendAction { .. }))
            .map(|(at, _)| *at)
            .collect()
    }

    pub fn document(&self, context: ContextId, frame: FrameId) -> Option<Arc<MockDocument>> {
        self.state
            .lock()
            .contexts
            .get(&context)
            .and_then(|ctx| ctx.documents.get(&frame).cloned())
    }

    pub fn context_url(&self, context: ContextId) -> Option<String> {
        self.state.lock().contexts.get(&context).map(|ctx| ctx.url.clone())
    }

    pub fn contexts_of(&self, window: WindowId) -> Vec<ContextId> {
        self.state
            .lock()
            .windows
            .get(&window)
            .map(|win| win.contexts.clone())
            .unwrap_or_default()
    }

    pub fn active(&self, window: WindowId) -> Option<ContextId> {
        self.state.lock().windows.get(&window).and_then(|win| win.active)
    }

    pub fn focused_window(&self) -> Option<WindowId> {
        self.state.lock().focused
    }

    pub fn agent_installed(&self, context: ContextId) -> bool {
        self.state
            .lock()
            .contexts
            .get(&context)
            .is_some_and(|ctx| ctx.agent_installed)
    }
}

#[async_trait]
impl BrowserSurface for MockBrowser {
    async fn focus_window(&self, window: WindowId) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::FocusWindow(window));
        let mut state = self.state.lock();
        if !state.windows.contains_key(&window) {
            return Err(SurfaceError::WindowNotFound(window));
        }
        state.focused = Some(window);
        Ok(())
    }

    async fn create_context(&self, window: WindowId, url: &str) -> Result<ContextId, SurfaceError> {
        self.record(SurfaceCall::CreateContext {
            window,
            url: url.to_string(),
        });
        let mut state = self.state.lock();
        if !state.windows.contains_key(&window) {
            return Err(SurfaceError::WindowNotFound(window));
        }
        Ok(Self::spawn_context(&mut state, window, url, self.load_delay, Instant::now()))
    }

    async fn navigate(&self, context: ContextId, url: &str) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::Navigate {
            context,
            url: url.to_string(),
        });
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let ctx = state
            .contexts
            .get_mut(&context)
            .ok_or(SurfaceError::ContextNotFound(context))?;
        Self::load(&state.pages, ctx, url, self.load_delay, Instant::now());
        Ok(())
    }

    async fn activate_context(&self, context: ContextId) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::Activate(context));
        let mut state = self.state.lock();
        let window = state
            .contexts
            .get(&context)
            .map(|ctx| ctx.window)
            .ok_or(SurfaceError::ContextNotFound(context))?;
        state.windows.entry(window).or_default().active = Some(context);
        Ok(())
    }

    async fn active_context(&self, window: WindowId) -> Result<Option<ContextId>, SurfaceError> {
        let state = self.state.lock();
        state
            .windows
            .get(&window)
            .map(|win| win.active)
            .ok_or(SurfaceError::WindowNotFound(window))
    }

    async fn load_state(&self, context: ContextId) -> Result<LoadState, SurfaceError> {
        let state = self.state.lock();
        let ctx = state
            .contexts
            .get(&context)
            .ok_or(SurfaceError::ContextNotFound(context))?;
        Ok(match ctx.ready_at {
            Some(at) if Instant::now() >= at => LoadState::Complete,
            _ => LoadState::Loading,
        })
    }

    async fn install_agent(&self, context: ContextId) -> Result<(), SurfaceError> {
        self.record(SurfaceCall::InstallAgent(context));
        let mut state = self.state.lock();
        let ctx = state
            .contexts
            .get_mut(&context)
            .ok_or(SurfaceError::ContextNotFound(context))?;
        ctx.agent_installed = true;
        Ok(())
    }

    async fn send_action(
        &self,
        context: ContextId,
        frame: Option<FrameId>,
        request: ActionRequest,
    ) -> Result<ActionResponse, SurfaceError> {
        self.record(SurfaceCall::SendAction {
            context,
            frame,
            request: request.clone(),
        });

        let (document, unresponsive) = {
            let state = self.state.lock();
            let ctx = state
                .contexts
                .get(&context)
                .ok_or(SurfaceError::ContextNotFound(context))?;
            let no_receiver = SurfaceError::NoReceiver { context, frame };
            if !ctx.agent_installed {
                return Err(no_receiver);
            }
            let document = ctx
                .documents
                .get(&frame.unwrap_or(FrameId::TOP))
                .cloned()
                .ok_or(no_receiver)?;
            (document, ctx.unresponsive)
        };

        if unresponsive {
            std::future::pending::<()>().await;
        }
        if !self.action_latency.is_zero() {
            tokio::time::sleep(self.action_latency).await;
        }
        Ok(self.agent.handle(document.as_ref(), &request).await)
    }
}

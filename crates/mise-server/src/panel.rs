//! Single-panel lifecycle: `Closed → Open → Closed`.
//!
//! At most one panel is live. Opening while open reveals the existing panel;
//! a failed initial render disposes the new panel and leaves the manager
//! closed. Disposal drops the panel's [`Session`].

use crate::context::{HostContext, Session};
use crate::host::{HostError, Panel, PanelChannel, PanelEvent};
use crate::router::MessageRouter;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

/// Static panel markup. Styling and markdown rendering belong to the
/// webview bundle, not the host.
pub const PANEL_HTML: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>mise-en-place</title></head>
<body>
  <main id="app" data-events="/api/panel/events" data-messages="/api/panel/message">
    <h1>mise-en-place</h1>
    <p>Describe a product idea to generate a PRD, context cards and diagrams.</p>
  </main>
</body>
</html>
"#;

enum PanelState {
    Closed,
    Open(OpenPanel),
}

#[derive(Clone)]
struct OpenPanel {
    panel: Arc<dyn Panel>,
    channel: Arc<dyn PanelChannel>,
    session: Arc<Session>,
}

/// Result of [`PanelManager::create_and_show`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelOpened {
    pub id: String,
    /// `false` when an existing panel was revealed.
    pub created: bool,
}

pub struct PanelManager {
    ctx: Arc<HostContext>,
    router: Arc<MessageRouter>,
    state: Arc<Mutex<PanelState>>,
}

impl PanelManager {
    pub fn new(ctx: Arc<HostContext>, router: Arc<MessageRouter>) -> Self {
        Self {
            ctx,
            router,
            state: Arc::new(Mutex::new(PanelState::Closed)),
        }
    }

    pub fn context(&self) -> &Arc<HostContext> {
        &self.ctx
    }

    /// Reveal the live panel, or create, render and wire a new one.
    pub async fn create_and_show(&self) -> Result<PanelOpened, HostError> {
        let mut state = self.state.lock().await;

        if let PanelState::Open(open) = &*state {
            open.panel.reveal();
            debug!(panel = open.panel.id(), "revealed existing panel");
            return Ok(PanelOpened {
                id: open.panel.id().to_string(),
                created: false,
            });
        }

        let handle = self.ctx.host.create_panel().await?;
        if let Err(e) = handle.panel.render(PANEL_HTML).await {
            handle.panel.dispose();
            return Err(e);
        }

        let open = OpenPanel {
            panel: handle.panel,
            channel: handle.channel,
            session: Arc::new(Session::new()),
        };
        let id = open.panel.id().to_string();
        self.spawn_event_loop(open.clone(), handle.events);
        *state = PanelState::Open(open);
        info!(panel = %id, "panel opened");

        Ok(PanelOpened { id, created: true })
    }

    /// Dispose the live panel, if any. Returns whether one was open.
    pub async fn close(&self) -> bool {
        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, PanelState::Closed) {
            PanelState::Open(open) => {
                open.panel.dispose();
                info!(panel = open.panel.id(), "panel closed");
                true
            }
            PanelState::Closed => false,
        }
    }

    pub async fn is_open(&self) -> bool {
        matches!(*self.state.lock().await, PanelState::Open(_))
    }

    /// Id of the live panel.
    pub async fn current_id(&self) -> Option<String> {
        match &*self.state.lock().await {
            PanelState::Open(open) => Some(open.panel.id().to_string()),
            PanelState::Closed => None,
        }
    }

    /// Session of the live panel.
    pub async fn session(&self) -> Option<Arc<Session>> {
        match &*self.state.lock().await {
            PanelState::Open(open) => Some(open.session.clone()),
            PanelState::Closed => None,
        }
    }

    fn spawn_event_loop(&self, open: OpenPanel, mut events: mpsc::UnboundedReceiver<PanelEvent>) {
        let state = self.state.clone();
        let ctx = self.ctx.clone();
        let router = self.router.clone();

        tokio::spawn(async move {
            let id = open.panel.id().to_string();
            while let Some(event) = events.recv().await {
                match event {
                    PanelEvent::Message(message) => {
                        // Handlers run concurrently; a slow one does not hold
                        // up later messages.
                        let (ctx, router) = (ctx.clone(), router.clone());
                        let (session, channel) = (open.session.clone(), open.channel.clone());
                        tokio::spawn(async move {
                            router
                                .route(message, &ctx, &session, channel.as_ref())
                                .await;
                        });
                    }
                    PanelEvent::Disposed => break,
                }
            }

            let mut state = state.lock().await;
            if let PanelState::Open(current) = &*state {
                if current.panel.id() == id {
                    *state = PanelState::Closed;
                    info!(panel = %id, "panel disposed");
                }
            }
        });
    }
}

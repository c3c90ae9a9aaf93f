//! Browser-backed [`Host`]: the panel is a page served by `mise ui`.
//!
//! Host → webview messages go out on a broadcast channel consumed by the SSE
//! route; webview → host messages arrive through [`WebHost::deliver`].

use crate::host::{Host, HostError, Panel, PanelChannel, PanelEvent, PanelHandle};
use crate::protocol::HostMessage;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

struct LivePanel {
    id: String,
    events: mpsc::UnboundedSender<PanelEvent>,
}

#[derive(Default)]
struct WebShared {
    live: Mutex<Option<LivePanel>>,
    html: Mutex<Option<String>>,
}

impl WebShared {
    fn live(&self) -> std::sync::MutexGuard<'_, Option<LivePanel>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone)]
pub struct WebHost {
    roots: Vec<PathBuf>,
    outbound: broadcast::Sender<String>,
    shared: Arc<WebShared>,
}

impl WebHost {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        let (outbound, _) = broadcast::channel(256);
        Self {
            roots,
            outbound,
            shared: Arc::new(WebShared::default()),
        }
    }

    /// Subscribe to serialised host → webview messages.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.outbound.subscribe()
    }

    /// Forward a webview message to the live panel. Returns `false` when no
    /// panel is open.
    pub fn deliver(&self, message: Value) -> bool {
        match &*self.shared.live() {
            Some(live) => live.events.send(PanelEvent::Message(message)).is_ok(),
            None => false,
        }
    }

    /// Markup rendered into the live panel.
    pub fn html(&self) -> Option<String> {
        self.shared
            .html
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn channel(&self) -> WebChannel {
        WebChannel {
            outbound: self.outbound.clone(),
        }
    }
}

#[async_trait]
impl Host for WebHost {
    fn workspace_roots(&self) -> Vec<PathBuf> {
        self.roots.clone()
    }

    async fn create_panel(&self) -> Result<PanelHandle, HostError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = uuid::Uuid::new_v4().to_string();
        *self.shared.live() = Some(LivePanel {
            id: id.clone(),
            events: tx,
        });
        debug!(panel = %id, "web panel created");

        Ok(PanelHandle {
            panel: Arc::new(WebPanel {
                id,
                shared: self.shared.clone(),
            }),
            channel: Arc::new(self.channel()),
            events: rx,
        })
    }

    fn show_info(&self, text: &str) {
        info!("{text}");
    }

    fn show_warning(&self, text: &str) {
        warn!("{text}");
    }

    fn show_error(&self, text: &str) {
        error!("{text}");
    }

    /// No native picker; candidates arrive newest first.
    async fn pick_file(&self, title: &str, candidates: &[PathBuf]) -> Option<PathBuf> {
        debug!(title, count = candidates.len(), "picking newest candidate");
        candidates.first().cloned()
    }

    async fn open_artifact(
        &self,
        view: &str,
        path: &Path,
        channel: &dyn PanelChannel,
    ) -> Result<(), HostError> {
        let content = tokio::fs::read_to_string(path).await?;
        channel.post(HostMessage::OpenArtifact {
            view: view.to_string(),
            path: path.to_path_buf(),
            content,
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// WebPanel / WebChannel
// ---------------------------------------------------------------------------

pub struct WebPanel {
    id: String,
    shared: Arc<WebShared>,
}

#[async_trait]
impl Panel for WebPanel {
    fn id(&self) -> &str {
        &self.id
    }

    fn reveal(&self) {
        debug!(panel = %self.id, "reveal requested");
    }

    async fn render(&self, html: &str) -> Result<(), HostError> {
        *self
            .shared
            .html
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(html.to_string());
        Ok(())
    }

    fn dispose(&self) {
        let mut live = self.shared.live();
        if live.as_ref().is_some_and(|l| l.id == self.id) {
            if let Some(l) = live.take() {
                let _ = l.events.send(PanelEvent::Disposed);
            }
        }
    }
}

pub struct WebChannel {
    outbound: broadcast::Sender<String>,
}

impl PanelChannel for WebChannel {
    fn post(&self, message: HostMessage) -> bool {
        match serde_json::to_string(&message) {
            Ok(json) => self.outbound.send(json).is_ok(),
            Err(e) => {
                error!(error = %e, "failed to serialise host message");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn channel_posts_json_to_subscribers() {
        let host = WebHost::new(vec![]);
        let mut rx = host.subscribe();
        let handle = host.create_panel().await.unwrap();
        assert!(handle.channel.post(HostMessage::info("hello")));
        let json: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({ "command": "info", "text": "hello" }));
    }

    #[tokio::test]
    async fn deliver_reaches_the_live_panel_until_disposed() {
        let host = WebHost::new(vec![]);
        assert!(!host.deliver(serde_json::json!({ "command": "webviewReady" })));

        let mut handle = host.create_panel().await.unwrap();
        assert!(host.deliver(serde_json::json!({ "command": "webviewReady" })));
        assert!(matches!(
            handle.events.recv().await,
            Some(PanelEvent::Message(_))
        ));

        handle.panel.dispose();
        assert_eq!(handle.events.recv().await, Some(PanelEvent::Disposed));
        assert!(!host.deliver(serde_json::json!({ "command": "webviewReady" })));
    }

    #[tokio::test]
    async fn stale_panel_dispose_leaves_newer_panel_live() {
        let host = WebHost::new(vec![]);
        let old = host.create_panel().await.unwrap();
        let _new = host.create_panel().await.unwrap();
        old.panel.dispose();
        assert!(host.deliver(serde_json::json!({ "command": "webviewReady" })));
    }

    #[tokio::test]
    async fn open_artifact_posts_file_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.md");
        std::fs::write(&path, "# A").unwrap();

        let host = WebHost::new(vec![]);
        let mut rx = host.subscribe();
        let handle = host.create_panel().await.unwrap();
        host.open_artifact("view-prd", &path, handle.channel.as_ref())
            .await
            .unwrap();

        let json: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(json["command"], "openArtifact");
        assert_eq!(json["view"], "view-prd");
        assert_eq!(json["content"], "# A");
    }

    #[tokio::test]
    async fn pick_file_takes_the_first_candidate() {
        let host = WebHost::new(vec![]);
        let picked = host
            .pick_file("t", &[PathBuf::from("new.md"), PathBuf::from("old.md")])
            .await;
        assert_eq!(picked, Some(PathBuf::from("new.md")));
    }
}

//! Narrow interfaces onto the embedding host: workspace, panels,
//! notifications and file pickers.

use crate::protocol::HostMessage;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("could not create panel: {0}")]
    PanelCreation(String),

    #[error("could not render panel: {0}")]
    Render(String),

    #[error("{0} is not supported by this host")]
    Unsupported(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Events flowing from a live panel to its manager.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    /// A raw message posted by the webview.
    Message(Value),
    /// The user closed the panel.
    Disposed,
}

/// Outbound half of a panel.
pub trait PanelChannel: Send + Sync {
    /// Returns `false` if nothing received the message.
    fn post(&self, message: HostMessage) -> bool;
}

#[async_trait]
pub trait Panel: Send + Sync {
    fn id(&self) -> &str;
    /// Bring the existing panel to the foreground.
    fn reveal(&self);
    async fn render(&self, html: &str) -> Result<(), HostError>;
    fn dispose(&self);
}

/// Everything a host hands back for a freshly created panel.
pub struct PanelHandle {
    pub panel: Arc<dyn Panel>,
    pub channel: Arc<dyn PanelChannel>,
    pub events: mpsc::UnboundedReceiver<PanelEvent>,
}

#[async_trait]
pub trait Host: Send + Sync {
    /// Open workspace roots; the first one is used for output.
    fn workspace_roots(&self) -> Vec<PathBuf>;

    async fn create_panel(&self) -> Result<PanelHandle, HostError>;

    fn show_info(&self, text: &str);
    fn show_warning(&self, text: &str);
    fn show_error(&self, text: &str);

    /// Let the user choose among existing artifacts. `None` if dismissed.
    async fn pick_file(&self, title: &str, candidates: &[PathBuf]) -> Option<PathBuf>;

    /// Present a generated artifact. `view` is the view command that asked
    /// for it.
    async fn open_artifact(
        &self,
        view: &str,
        path: &Path,
        channel: &dyn PanelChannel,
    ) -> Result<(), HostError>;
}

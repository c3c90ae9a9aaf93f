//! Terminal host for one-shot commands.
//!
//! Results go to stdout, progress and warnings to stderr. Errors are
//! collected so the command can fail with a non-zero exit status.

use async_trait::async_trait;
use mise_server::host::{Host, HostError, PanelChannel, PanelHandle};
use mise_server::protocol::HostMessage;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct ConsoleHost {
    root: PathBuf,
    open_with_system: bool,
}

impl ConsoleHost {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            open_with_system: false,
        }
    }

    /// Launch opened artifacts with the system viewer instead of printing
    /// their path.
    pub fn opening_with_system(mut self, yes: bool) -> Self {
        self.open_with_system = yes;
        self
    }
}

#[async_trait]
impl Host for ConsoleHost {
    fn workspace_roots(&self) -> Vec<PathBuf> {
        vec![self.root.clone()]
    }

    async fn create_panel(&self) -> Result<PanelHandle, HostError> {
        Err(HostError::Unsupported("panels"))
    }

    fn show_info(&self, text: &str) {
        tracing::info!("{text}");
    }

    fn show_warning(&self, text: &str) {
        tracing::warn!("{text}");
    }

    // Failures are reported once, through the command's exit status.
    fn show_error(&self, text: &str) {
        tracing::debug!("{text}");
    }

    async fn pick_file(&self, title: &str, candidates: &[PathBuf]) -> Option<PathBuf> {
        let newest = candidates.first()?;
        eprintln!(
            "{title}: {} candidates, using the newest ({}). Pass --file to choose another.",
            candidates.len(),
            newest.display()
        );
        Some(newest.clone())
    }

    async fn open_artifact(
        &self,
        _view: &str,
        path: &Path,
        _channel: &dyn PanelChannel,
    ) -> Result<(), HostError> {
        if self.open_with_system {
            open::that(path)?;
        }
        println!("{}", path.display());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ConsoleChannel
// ---------------------------------------------------------------------------

pub struct ConsoleChannel {
    json: bool,
    errors: Mutex<Vec<String>>,
}

impl ConsoleChannel {
    pub fn new(json: bool) -> Self {
        Self {
            json,
            errors: Mutex::new(Vec::new()),
        }
    }

    /// The last error message posted, if any.
    pub fn last_error(&self) -> Option<String> {
        self.errors
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .last()
            .cloned()
    }

    fn render(message: &HostMessage) -> Option<String> {
        let text = match message {
            HostMessage::ApiKeyStatus { present: true, hint } => {
                format!("API key: set ({})", hint.as_deref().unwrap_or("••••"))
            }
            HostMessage::ApiKeyStatus { present: false, .. } => "API key: not set".to_string(),
            HostMessage::Info { text } | HostMessage::Success { text } => text.clone(),
            HostMessage::PrdGenerated { title, paths, .. } => {
                let mut out = format!(
                    "PRD \"{title}\"\n  markdown: {}",
                    paths.primary_output_path.display()
                );
                if let Some(graph) = &paths.secondary_output_path {
                    out.push_str(&format!("\n  graph:    {}", graph.display()));
                }
                out
            }
            HostMessage::ContextCardsGenerated {
                generated,
                failed,
                cancelled,
            } => {
                let suffix = if *cancelled { " (cancelled)" } else { "" };
                format!("Context cards: {generated} generated, {failed} failed{suffix}")
            }
            HostMessage::DiagramGenerated { kind, path, .. } => {
                format!("{}: {}", kind.title(), path.display())
            }
            HostMessage::OpenArtifact { content, .. } => content.clone(),
            HostMessage::Progress { .. }
            | HostMessage::Warning { .. }
            | HostMessage::Error { .. } => return None,
        };
        Some(text)
    }
}

impl PanelChannel for ConsoleChannel {
    fn post(&self, message: HostMessage) -> bool {
        if let HostMessage::Error { text } = &message {
            self.errors
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(text.clone());
        }

        if self.json {
            if let Ok(line) = serde_json::to_string(&message) {
                println!("{line}");
            }
            return true;
        }

        match &message {
            HostMessage::Progress {
                operation,
                percent,
                message,
            } => eprintln!("[{percent:>3}%] {operation}: {message}"),
            HostMessage::Warning { text, .. } => eprintln!("warning: {text}"),
            other => {
                if let Some(text) = Self::render(other) {
                    println!("{text}");
                }
            }
        }
        true
    }
}

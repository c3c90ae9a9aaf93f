//! In-memory host, panel, channel and AI fakes for unit tests.

use crate::context::HostContext;
use crate::host::{Host, HostError, Panel, PanelChannel, PanelEvent, PanelHandle};
use crate::protocol::HostMessage;
use crate::secrets::{MemorySecretStore, SecretStore, API_KEY_SECRET};
use async_trait::async_trait;
use mise_agent::{AgentError, AiService, GenerateRequest, Generation};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub const TEST_KEY: &str = "sk-test-0123456789abcdef";

// ---------------------------------------------------------------------------
// RecordingChannel
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingChannel {
    messages: Mutex<Vec<HostMessage>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<HostMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub fn of_tag(&self, tag: &str) -> Vec<HostMessage> {
        self.messages()
            .into_iter()
            .filter(|m| m.tag() == tag)
            .collect()
    }

    pub fn error_texts(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                HostMessage::Error { text } => Some(text),
                _ => None,
            })
            .collect()
    }
}

impl PanelChannel for RecordingChannel {
    fn post(&self, message: HostMessage) -> bool {
        self.messages.lock().unwrap().push(message);
        true
    }
}

// ---------------------------------------------------------------------------
// FakePanel / FakeHost
// ---------------------------------------------------------------------------

pub struct FakePanel {
    id: String,
    reveals: AtomicUsize,
    disposed: AtomicBool,
    fail_render: bool,
    events: mpsc::UnboundedSender<PanelEvent>,
    pub channel: Arc<RecordingChannel>,
}

impl FakePanel {
    pub fn reveals(&self) -> usize {
        self.reveals.load(Ordering::SeqCst)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Simulate the webview posting a message.
    pub fn send(&self, message: serde_json::Value) {
        let _ = self.events.send(PanelEvent::Message(message));
    }

    /// Simulate the user closing the panel.
    pub fn close_by_user(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        let _ = self.events.send(PanelEvent::Disposed);
    }
}

#[async_trait]
impl Panel for FakePanel {
    fn id(&self) -> &str {
        &self.id
    }

    fn reveal(&self) {
        self.reveals.fetch_add(1, Ordering::SeqCst);
    }

    async fn render(&self, _html: &str) -> Result<(), HostError> {
        if self.fail_render {
            Err(HostError::Render("template exploded".into()))
        } else {
            Ok(())
        }
    }

    fn dispose(&self) {
        self.close_by_user();
    }
}

#[derive(Default)]
pub struct FakeHost {
    roots: Vec<PathBuf>,
    pub fail_render: AtomicBool,
    pub panels: Mutex<Vec<Arc<FakePanel>>>,
    pub infos: Mutex<Vec<String>>,
    pub warnings: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
    pub picks: Mutex<Vec<Vec<PathBuf>>>,
    /// Index the picker chooses; `None` dismisses it.
    pub pick_index: Mutex<Option<usize>>,
    pub opened: Mutex<Vec<(String, PathBuf)>>,
}

impl FakeHost {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            pick_index: Mutex::new(Some(0)),
            ..Self::default()
        }
    }

    pub fn created(&self) -> usize {
        self.panels.lock().unwrap().len()
    }

    pub fn panel(&self, index: usize) -> Arc<FakePanel> {
        self.panels.lock().unwrap()[index].clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().unwrap().clone()
    }

    pub fn opened(&self) -> Vec<(String, PathBuf)> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl Host for FakeHost {
    fn workspace_roots(&self) -> Vec<PathBuf> {
        self.roots.clone()
    }

    async fn create_panel(&self) -> Result<PanelHandle, HostError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut panels = self.panels.lock().unwrap();
        let panel = Arc::new(FakePanel {
            id: format!("panel-{}", panels.len() + 1),
            reveals: AtomicUsize::new(0),
            disposed: AtomicBool::new(false),
            fail_render: self.fail_render.load(Ordering::SeqCst),
            events: tx,
            channel: Arc::new(RecordingChannel::new()),
        });
        panels.push(panel.clone());
        Ok(PanelHandle {
            channel: panel.channel.clone(),
            panel,
            events: rx,
        })
    }

    fn show_info(&self, text: &str) {
        self.infos.lock().unwrap().push(text.to_string());
    }

    fn show_warning(&self, text: &str) {
        self.warnings.lock().unwrap().push(text.to_string());
    }

    fn show_error(&self, text: &str) {
        self.errors.lock().unwrap().push(text.to_string());
    }

    async fn pick_file(&self, _title: &str, candidates: &[PathBuf]) -> Option<PathBuf> {
        self.picks.lock().unwrap().push(candidates.to_vec());
        let index = (*self.pick_index.lock().unwrap())?;
        candidates.get(index).cloned()
    }

    async fn open_artifact(
        &self,
        view: &str,
        path: &Path,
        _channel: &dyn PanelChannel,
    ) -> Result<(), HostError> {
        self.opened
            .lock()
            .unwrap()
            .push((view.to_string(), path.to_path_buf()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeAi
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub enum Reply {
    Text(String),
    Fail(String),
    Hang,
}

/// Scripted AI: replies are consumed in order, the last one repeats.
pub struct FakeAi {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
    pub requests: Mutex<Vec<GenerateRequest>>,
}

impl FakeAi {
    pub fn sequence(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn text(text: &str) -> Self {
        Self::sequence(vec![Reply::Text(text.to_string())])
    }

    pub fn json(value: serde_json::Value) -> Self {
        Self::text(&value.to_string())
    }

    pub fn failing(message: &str) -> Self {
        Self::sequence(vec![Reply::Fail(message.to_string())])
    }

    pub fn hanging() -> Self {
        Self::sequence(vec![Reply::Hang])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Reply {
        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.pop_front().unwrap()
        } else {
            replies.front().cloned().unwrap_or(Reply::Hang)
        }
    }
}

#[async_trait]
impl AiService for FakeAi {
    async fn generate(&self, request: GenerateRequest) -> mise_agent::Result<Generation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        match self.next_reply() {
            Reply::Text(text) => Ok(Generation::from_text(text)),
            Reply::Fail(body) => Err(AgentError::Status { status: 500, body }),
            Reply::Hang => {
                std::future::pending::<()>().await;
                Err(AgentError::EmptyResponse)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Context builders
// ---------------------------------------------------------------------------

pub struct Harness {
    pub host: Arc<FakeHost>,
    pub ai: Arc<FakeAi>,
    pub secrets: Arc<MemorySecretStore>,
    pub ctx: Arc<HostContext>,
}

impl Harness {
    pub fn new(roots: Vec<PathBuf>, ai: FakeAi, api_key: Option<&str>) -> Self {
        let host = Arc::new(FakeHost::new(roots));
        let ai = Arc::new(ai);
        let secrets = Arc::new(match api_key {
            Some(k) => MemorySecretStore::with(API_KEY_SECRET, k),
            None => MemorySecretStore::new(),
        });
        let ctx = Arc::new(HostContext::new(
            host.clone(),
            secrets.clone() as Arc<dyn SecretStore>,
            ai.clone(),
        ));
        Self {
            host,
            ai,
            secrets,
            ctx,
        }
    }

    /// Workspace at `root` with a stored key.
    pub fn with_key(root: &Path, ai: FakeAi) -> Self {
        Self::new(vec![root.to_path_buf()], ai, Some(TEST_KEY))
    }
}

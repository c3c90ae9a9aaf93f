//! Shared host context handed to every command handler, plus the
//! panel-scoped [`Session`].

use crate::error::HandlerError;
use crate::host::{Host, PanelChannel};
use crate::protocol::{HostMessage, Workflow};
use crate::secrets::{SecretStore, API_KEY_SECRET};
use mise_agent::{AiService, GenerateRequest, Generation};
use mise_core::artifact::GeneratedPaths;
use mise_core::config::Config;
use mise_core::diagram::DiagramKind;
use mise_core::manifest::{self, ArtifactRecord, ManifestUpdate};
use mise_core::prompt::Prompt;
use mise_core::{paths, MiseError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Workspace
// ---------------------------------------------------------------------------

/// The first workspace root with its loaded configuration.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub config: Config,
    pub output_root: PathBuf,
}

// ---------------------------------------------------------------------------
// HostContext
// ---------------------------------------------------------------------------

pub struct HostContext {
    pub host: Arc<dyn Host>,
    pub secrets: Arc<dyn SecretStore>,
    pub ai: Arc<dyn AiService>,
    manifest_lock: tokio::sync::Mutex<()>,
    in_flight: Mutex<HashMap<Workflow, CancellationToken>>,
}

impl HostContext {
    pub fn new(
        host: Arc<dyn Host>,
        secrets: Arc<dyn SecretStore>,
        ai: Arc<dyn AiService>,
    ) -> Self {
        Self {
            host,
            secrets,
            ai,
            manifest_lock: tokio::sync::Mutex::new(()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub async fn workspace(&self) -> Result<Workspace, HandlerError> {
        let root = self
            .host
            .workspace_roots()
            .into_iter()
            .next()
            .ok_or(MiseError::NoWorkspace)?;
        let config_root = root.clone();
        let config = tokio::task::spawn_blocking(move || Config::load(&config_root)).await??;
        let output_root = config.output_root(&root);
        Ok(Workspace {
            root,
            config,
            output_root,
        })
    }

    /// The stored API key, if any. Blank values count as absent.
    pub async fn api_key(&self) -> Result<Option<String>, HandlerError> {
        let key = self.secrets.get(API_KEY_SECRET).await?;
        Ok(key.filter(|k| !k.trim().is_empty()))
    }

    pub async fn require_api_key(&self) -> Result<String, HandlerError> {
        self.api_key()
            .await?
            .ok_or_else(|| MiseError::MissingApiKey.into())
    }

    // -----------------------------------------------------------------------
    // In-flight registry
    // -----------------------------------------------------------------------

    /// Mark `workflow` as running. Fails if it already is; the returned
    /// guard releases the slot when dropped.
    pub fn begin(&self, workflow: Workflow) -> Result<InFlight<'_>, HandlerError> {
        let mut running = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if running.contains_key(&workflow) {
            return Err(MiseError::AlreadyRunning(workflow.label().to_string()).into());
        }
        let token = CancellationToken::new();
        running.insert(workflow, token.clone());
        debug!(workflow = %workflow, "workflow started");
        Ok(InFlight {
            ctx: self,
            workflow,
            token,
        })
    }

    pub fn is_running(&self, workflow: Workflow) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&workflow)
    }

    /// Cancel one running workflow, or all of them. Returns what was
    /// signalled, in a stable order.
    pub fn cancel(&self, workflow: Option<Workflow>) -> Vec<Workflow> {
        let running = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        let mut cancelled: Vec<Workflow> = running
            .iter()
            .filter(|(w, _)| workflow.is_none_or(|target| target == **w))
            .map(|(w, token)| {
                token.cancel();
                *w
            })
            .collect();
        cancelled.sort();
        cancelled
    }

    // -----------------------------------------------------------------------
    // AI
    // -----------------------------------------------------------------------

    /// Run one AI call, abandoning it if `token` fires first.
    pub async fn generate(
        &self,
        prompt: Prompt,
        api_key: &str,
        token: &CancellationToken,
        what: &str,
    ) -> Result<Generation, HandlerError> {
        let request = GenerateRequest {
            api_key: api_key.to_string(),
            system: prompt.system,
            prompt: prompt.user,
            json_mode: prompt.json,
        };
        tokio::select! {
            _ = token.cancelled() => Err(MiseError::Cancelled(what.to_string()).into()),
            result = self.ai.generate(request) => Ok(result?),
        }
    }

    // -----------------------------------------------------------------------
    // Manifest
    // -----------------------------------------------------------------------

    /// Append to the artifact ledger. Writers in this process are serialised;
    /// a replaced corrupt ledger is reported on `channel`.
    pub async fn update_manifest(
        &self,
        output_root: &Path,
        record: ArtifactRecord,
        channel: &dyn PanelChannel,
    ) -> Result<ManifestUpdate, HandlerError> {
        let _guard = self.manifest_lock.lock().await;
        let root = output_root.to_path_buf();
        let update = tokio::task::spawn_blocking(move || manifest::record(&root, record)).await??;

        if let Some(reason) = &update.recovered_from {
            let backup = paths::corrupt_manifest_path(output_root);
            warn!(
                path = %update.path.display(),
                backup = %backup.display(),
                reason = %reason,
                "manifest was unreadable and has been rebuilt"
            );
            channel.post(HostMessage::warning(
                format!(
                    "The artifact manifest could not be read and was rebuilt. \
                     The previous file was kept at {}.",
                    backup.display()
                ),
                Some(update.path.display().to_string()),
            ));
        }
        Ok(update)
    }
}

/// Running-workflow registration; see [`HostContext::begin`].
pub struct InFlight<'a> {
    ctx: &'a HostContext,
    workflow: Workflow,
    token: CancellationToken,
}

impl InFlight<'_> {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn workflow(&self) -> Workflow {
        self.workflow
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.ctx
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.workflow);
        debug!(workflow = %self.workflow, "workflow finished");
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone)]
struct LastGenerated {
    prd: Option<GeneratedPaths>,
    diagrams: HashMap<DiagramKind, PathBuf>,
}

/// Panel-scoped state: the most recent outputs, so later view and diagram
/// commands need not name a file. Dropped with the panel.
#[derive(Debug, Default)]
pub struct Session {
    last: Mutex<LastGenerated>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_prd(&self, paths: GeneratedPaths) {
        self.lock().prd = Some(paths);
    }

    pub fn prd(&self) -> Option<GeneratedPaths> {
        self.lock().prd.clone()
    }

    pub fn set_diagram(&self, kind: DiagramKind, path: PathBuf) {
        self.lock().diagrams.insert(kind, path);
    }

    pub fn diagram(&self, kind: DiagramKind) -> Option<PathBuf> {
        self.lock().diagrams.get(&kind).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LastGenerated> {
        self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Posts `progress` messages for one operation.
pub struct Progress<'a> {
    channel: &'a dyn PanelChannel,
    operation: &'static str,
}

impl<'a> Progress<'a> {
    pub fn new(channel: &'a dyn PanelChannel, operation: &'static str) -> Self {
        Self { channel, operation }
    }

    pub fn report(&self, percent: u8, message: impl Into<String>) {
        self.channel.post(HostMessage::Progress {
            operation: self.operation.to_string(),
            percent: percent.min(100),
            message: message.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeAi, FakeHost, RecordingChannel};
    use crate::secrets::MemorySecretStore;
    use std::time::Duration;

    fn ctx_with(ai: FakeAi) -> HostContext {
        HostContext::new(
            Arc::new(FakeHost::new(vec![])),
            Arc::new(MemorySecretStore::new()),
            Arc::new(ai),
        )
    }

    #[test]
    fn second_begin_is_rejected_until_first_drops() {
        let ctx = ctx_with(FakeAi::text("x"));
        let first = ctx.begin(Workflow::Prd).unwrap();
        let err = ctx.begin(Workflow::Prd).err().unwrap();
        assert_eq!(err.to_string(), "PRD generation is already running");
        assert!(ctx.begin(Workflow::ContextCards).is_ok());
        drop(first);
        assert!(!ctx.is_running(Workflow::Prd));
        assert!(ctx.begin(Workflow::Prd).is_ok());
    }

    #[test]
    fn cancel_targets_named_or_all() {
        let ctx = ctx_with(FakeAi::text("x"));
        let prd = ctx.begin(Workflow::Prd).unwrap();
        let cards = ctx.begin(Workflow::ContextCards).unwrap();

        assert_eq!(ctx.cancel(Some(Workflow::ContextCards)), vec![Workflow::ContextCards]);
        assert!(cards.token().is_cancelled());
        assert!(!prd.token().is_cancelled());

        assert_eq!(ctx.cancel(None), vec![Workflow::Prd, Workflow::ContextCards]);
        assert!(prd.token().is_cancelled());
        assert!(ctx.cancel(Some(Workflow::DataFlowDiagram)).is_empty());
    }

    #[tokio::test]
    async fn generate_returns_cancelled_when_token_fires() {
        let ctx = ctx_with(FakeAi::hanging());
        let guard = ctx.begin(Workflow::Prd).unwrap();
        let token = guard.token().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });
        let err = ctx
            .generate(Prompt::text("s", "u"), "sk", guard.token(), "PRD generation")
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn corrupt_manifest_is_reported_on_channel() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("prd")).unwrap();
        std::fs::write(dir.path().join("prd/manifest.json"), "not json").unwrap();

        let ctx = ctx_with(FakeAi::text("x"));
        let channel = RecordingChannel::new();
        let update = ctx
            .update_manifest(
                dir.path(),
                ArtifactRecord::new(mise_core::artifact::ArtifactKind::Prd),
                &channel,
            )
            .await
            .unwrap();
        assert_eq!(update.entry_count, 1);
        let warnings = channel.of_tag("warning");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn session_tracks_latest_outputs() {
        let session = Session::new();
        assert!(session.prd().is_none());
        session.set_prd(GeneratedPaths::new("/a.md"));
        session.set_prd(GeneratedPaths::new("/b.md"));
        assert_eq!(session.prd().unwrap().primary_output_path, PathBuf::from("/b.md"));
        session.set_diagram(DiagramKind::DataFlow, PathBuf::from("/d.md"));
        assert_eq!(session.diagram(DiagramKind::DataFlow), Some(PathBuf::from("/d.md")));
        assert!(session.diagram(DiagramKind::ComponentHierarchy).is_none());
    }
}

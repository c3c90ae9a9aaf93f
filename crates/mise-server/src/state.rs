use crate::context::HostContext;
use crate::handlers::default_router;
use crate::panel::PanelManager;
use crate::secrets::{FileSecretStore, SecretStore};
use crate::web::WebHost;
use mise_agent::client::{OpenAiClient, OpenAiConfig};
use mise_agent::AiService;
use mise_core::config::{AiConfig, Config};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub ctx: Arc<HostContext>,
    pub panels: Arc<PanelManager>,
    pub web: WebHost,
}

impl AppState {
    /// Production wiring: credential file from `MISE_CREDENTIALS` or the
    /// home directory, OpenAI client from the workspace config.
    pub fn for_workspace(root: PathBuf) -> anyhow::Result<Self> {
        let config = Config::load(&root)?;
        let ai = OpenAiClient::new(openai_config(&config.ai))?;
        let secrets = FileSecretStore::from_env()?;
        Ok(Self::with_services(root, Arc::new(secrets), Arc::new(ai)))
    }

    pub fn with_services(
        root: PathBuf,
        secrets: Arc<dyn SecretStore>,
        ai: Arc<dyn AiService>,
    ) -> Self {
        let web = WebHost::new(vec![root.clone()]);
        let ctx = Arc::new(HostContext::new(Arc::new(web.clone()), secrets, ai));
        let panels = Arc::new(PanelManager::new(ctx.clone(), Arc::new(default_router())));
        Self {
            root,
            ctx,
            panels,
            web,
        }
    }
}

pub fn openai_config(ai: &AiConfig) -> OpenAiConfig {
    OpenAiConfig {
        model: ai.model.clone(),
        api_base: ai.api_base.clone(),
        temperature: ai.temperature,
        max_tokens: ai.max_tokens,
        timeout: Duration::from_secs(ai.timeout_secs),
    }
}

pub mod config;
pub mod generate;
pub mod key;
pub mod manifest;
pub mod ui;
pub mod view;

use crate::console::{ConsoleChannel, ConsoleHost};
use anyhow::{anyhow, Context, Result};
use mise_agent::OpenAiClient;
use mise_core::config::Config;
use mise_server::context::{HostContext, Session};
use mise_server::handlers::default_router;
use mise_server::protocol::Command;
use mise_server::secrets::FileSecretStore;
use mise_server::state::openai_config;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// How a one-shot command talks to the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Invocation {
    pub json: bool,
    pub open_with_system: bool,
}

/// Send one command through the router with a console host.
///
/// Ctrl-C cancels whatever is running and waits for the handler to wind
/// down. An error posted by the handler fails the command.
pub fn dispatch(root: &Path, command: Command, how: Invocation) -> Result<Option<Value>> {
    let config = Config::load(root).context("failed to load config")?;
    let ai = OpenAiClient::new(openai_config(&config.ai)).context("failed to build AI client")?;
    let secrets = FileSecretStore::from_env().context("failed to locate credential file")?;
    let host = ConsoleHost::new(root.to_path_buf()).opening_with_system(how.open_with_system);
    let ctx = HostContext::new(Arc::new(host), Arc::new(secrets), Arc::new(ai));

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let router = default_router();
        let session = Session::new();
        let channel = ConsoleChannel::new(how.json);

        let running = router.dispatch(command, &ctx, &session, &channel);
        tokio::pin!(running);
        let finished = tokio::select! {
            result = &mut running => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        };
        let interrupted = finished.is_none();
        let result = match finished {
            Some(result) => result,
            None => {
                let cancelled = ctx.cancel(None);
                tracing::debug!(?cancelled, "interrupted");
                running.await
            }
        };

        if let Some(text) = channel.last_error() {
            return Err(anyhow!(text));
        }
        if interrupted {
            return Err(anyhow!("interrupted"));
        }
        Ok(result)
    })
}

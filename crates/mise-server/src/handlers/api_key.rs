use super::CommandHandler;
use crate::context::{HostContext, Session};
use crate::error::HandlerError;
use crate::host::PanelChannel;
use crate::protocol::{Command, HostMessage};
use crate::secrets::API_KEY_SECRET;
use async_trait::async_trait;
use mise_core::credentials::mask_secret;
use mise_core::MiseError;
use serde_json::{json, Value};
use tracing::info;

/// Get, save and clear the OpenAI API key. The raw key never leaves the
/// secret store; status messages carry a masked hint only.
pub struct ApiKeyHandler;

impl ApiKeyHandler {
    async fn post_status(
        ctx: &HostContext,
        channel: &dyn PanelChannel,
    ) -> Result<Option<Value>, HandlerError> {
        let key = ctx.api_key().await?;
        let present = key.is_some();
        let hint = key.as_deref().map(mask_secret);
        channel.post(HostMessage::ApiKeyStatus {
            present,
            hint: hint.clone(),
        });
        Ok(Some(json!({ "present": present, "hint": hint })))
    }
}

#[async_trait]
impl CommandHandler for ApiKeyHandler {
    async fn handle(
        &self,
        command: Command,
        ctx: &HostContext,
        _session: &Session,
        channel: &dyn PanelChannel,
    ) -> Result<Option<Value>, HandlerError> {
        match command {
            Command::GetApiKey => Self::post_status(ctx, channel).await,
            Command::SaveApiKey { api_key } => {
                let api_key = api_key.trim();
                if api_key.is_empty() {
                    return Err(MiseError::InvalidCommand {
                        command: "save-api-key".to_string(),
                        reason: "apiKey must not be empty".to_string(),
                    }
                    .into());
                }
                ctx.secrets.store(API_KEY_SECRET, api_key).await?;
                info!(hint = %mask_secret(api_key), "API key saved");
                ctx.host.show_info("OpenAI API key saved.");
                channel.post(HostMessage::Success {
                    text: "API key saved.".to_string(),
                });
                Self::post_status(ctx, channel).await
            }
            Command::ClearApiKey => {
                ctx.secrets.delete(API_KEY_SECRET).await?;
                info!("API key cleared");
                ctx.host.show_info("OpenAI API key removed.");
                Self::post_status(ctx, channel).await
            }
            _ => Ok(None),
        }
    }
}

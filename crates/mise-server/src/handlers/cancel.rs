use super::CommandHandler;
use crate::context::{HostContext, Session};
use crate::error::HandlerError;
use crate::host::PanelChannel;
use crate::protocol::{Command, HostMessage};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

pub struct CancelHandler;

#[async_trait]
impl CommandHandler for CancelHandler {
    async fn handle(
        &self,
        command: Command,
        ctx: &HostContext,
        _session: &Session,
        channel: &dyn PanelChannel,
    ) -> Result<Option<Value>, HandlerError> {
        let Command::CancelGeneration { workflow } = command else {
            return Ok(None);
        };

        let cancelled = ctx.cancel(workflow);
        if cancelled.is_empty() {
            channel.post(HostMessage::info("No generation is running."));
        } else {
            let names = cancelled
                .iter()
                .map(|w| w.label())
                .collect::<Vec<_>>()
                .join(", ");
            info!(workflows = %names, "cancellation requested");
            channel.post(HostMessage::info(format!("Cancelling: {names}.")));
        }
        Ok(Some(json!({ "cancelled": cancelled })))
    }
}

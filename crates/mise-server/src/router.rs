use crate::context::{HostContext, Session};
use crate::error::HandlerError;
use crate::handlers::CommandHandler;
use crate::host::PanelChannel;
use crate::protocol::{Command, CommandKind, HostMessage};
use mise_core::MiseError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Maps each command to exactly one handler.
#[derive(Default)]
pub struct MessageRouter {
    handlers: HashMap<CommandKind, Arc<dyn CommandHandler>>,
}

impl MessageRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`. A later registration replaces the
    /// earlier one and is logged.
    pub fn register(&mut self, kind: CommandKind, handler: Arc<dyn CommandHandler>) {
        if self.handlers.insert(kind, handler).is_some() {
            warn!(command = %kind, "handler replaced by a later registration");
        }
    }

    pub fn is_registered(&self, kind: CommandKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Route a raw webview message.
    ///
    /// Unknown or missing `command` values are logged and ignored. A known
    /// command whose payload does not decode is reported on `channel`.
    pub async fn route(
        &self,
        message: Value,
        ctx: &HostContext,
        session: &Session,
        channel: &dyn PanelChannel,
    ) -> Option<Value> {
        let Some(name) = message
            .get("command")
            .and_then(Value::as_str)
            .map(str::to_string)
        else {
            warn!("ignoring panel message without a command");
            return None;
        };
        let Some(kind) = CommandKind::parse(&name) else {
            warn!(command = %name, "ignoring unknown command");
            return None;
        };

        match serde_json::from_value::<Command>(message) {
            Ok(command) => self.dispatch(command, ctx, session, channel).await,
            Err(e) => {
                let err = HandlerError::from(MiseError::InvalidCommand {
                    command: name,
                    reason: e.to_string(),
                });
                report_failure(kind, &err, ctx, channel);
                None
            }
        }
    }

    /// Dispatch an already-decoded command.
    pub async fn dispatch(
        &self,
        command: Command,
        ctx: &HostContext,
        session: &Session,
        channel: &dyn PanelChannel,
    ) -> Option<Value> {
        let kind = command.kind();
        let Some(handler) = self.handlers.get(&kind) else {
            warn!(command = %kind, "no handler registered");
            return None;
        };

        debug!(command = %kind, "dispatching");
        match handler.handle(command, ctx, session, channel).await {
            Ok(result) => result,
            Err(err) => {
                report_failure(kind, &err, ctx, channel);
                None
            }
        }
    }
}

/// Log, notify the host and tell the webview. Cancellation is not a failure.
fn report_failure(
    kind: CommandKind,
    err: &HandlerError,
    ctx: &HostContext,
    channel: &dyn PanelChannel,
) {
    if err.is_cancelled() {
        info!(command = %kind, "{err}");
        channel.post(HostMessage::info(err.to_string()));
        return;
    }

    if err.is_precondition() {
        warn!(command = %kind, error = %err, "precondition failed");
    } else {
        error!(command = %kind, error = ?err, "command failed");
    }
    let text = err.user_summary(kind.operation());
    ctx.host.show_error(&text);
    channel.post(HostMessage::error(text));
}

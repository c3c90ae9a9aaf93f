//! One handler per capability, registered into the [`MessageRouter`].

pub mod api_key;
pub mod cancel;
pub mod context_cards;
pub mod diagram;
pub mod prd;
pub mod view;

use crate::context::{HostContext, Session};
use crate::error::HandlerError;
use crate::host::PanelChannel;
use crate::protocol::{Command, CommandKind};
use crate::router::MessageRouter;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// A command handler.
///
/// Handlers receive only the commands they were registered for. Given a
/// command they do not own, they return `Ok(None)` rather than failing.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(
        &self,
        command: Command,
        ctx: &HostContext,
        session: &Session,
        channel: &dyn PanelChannel,
    ) -> Result<Option<Value>, HandlerError>;
}

/// Router with every built-in handler registered.
pub fn default_router() -> MessageRouter {
    let mut router = MessageRouter::new();

    let api_key = Arc::new(api_key::ApiKeyHandler);
    router.register(CommandKind::GetApiKey, api_key.clone());
    router.register(CommandKind::SaveApiKey, api_key.clone());
    router.register(CommandKind::ClearApiKey, api_key);

    router.register(CommandKind::GeneratePrd, Arc::new(prd::PrdHandler));
    router.register(
        CommandKind::GenerateContextCards,
        Arc::new(context_cards::ContextCardsHandler),
    );

    let diagram = Arc::new(diagram::DiagramHandler);
    router.register(CommandKind::GenerateDataFlowDiagram, diagram.clone());
    router.register(CommandKind::GenerateComponentHierarchy, diagram);

    let view = Arc::new(view::ViewHandler);
    router.register(CommandKind::ViewPrd, view.clone());
    router.register(CommandKind::ViewGraph, view.clone());
    router.register(CommandKind::ViewDataFlowDiagram, view.clone());
    router.register(CommandKind::ViewComponentHierarchy, view);

    router.register(CommandKind::CancelGeneration, Arc::new(cancel::CancelHandler));
    router
}

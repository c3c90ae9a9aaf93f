use super::CommandHandler;
use crate::context::{HostContext, Progress, Session, Workspace};
use crate::error::HandlerError;
use crate::host::PanelChannel;
use crate::protocol::{Command, HostMessage, Workflow};
use async_trait::async_trait;
use mise_core::artifact::ArtifactKind;
use mise_core::diagram::{self, DiagramKind};
use mise_core::manifest::ArtifactRecord;
use mise_core::{io, paths, MiseError};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::info;

pub const NO_PRD_MESSAGE: &str = "No PRD found. Generate a PRD first.";

/// Data-flow and component-hierarchy diagrams derived from a PRD.
pub struct DiagramHandler;

#[async_trait]
impl CommandHandler for DiagramHandler {
    async fn handle(
        &self,
        command: Command,
        ctx: &HostContext,
        session: &Session,
        channel: &dyn PanelChannel,
    ) -> Result<Option<Value>, HandlerError> {
        let kind = match command {
            Command::GenerateDataFlowDiagram => DiagramKind::DataFlow,
            Command::GenerateComponentHierarchy => DiagramKind::ComponentHierarchy,
            _ => return Ok(None),
        };
        let operation = match kind {
            DiagramKind::DataFlow => "generate-data-flow-diagram",
            DiagramKind::ComponentHierarchy => "generate-component-hierarchy",
        };

        let run = ctx.begin(Workflow::for_diagram(kind))?;
        let api_key = ctx.require_api_key().await?;
        let workspace = ctx.workspace().await?;
        let source = resolve_source_prd(session, &workspace).await?;
        let prd_markdown = tokio::fs::read_to_string(&source)
            .await
            .map_err(MiseError::from)?;

        let progress = Progress::new(channel, operation);
        progress.report(0, "Calling AI…");
        let generation = ctx
            .generate(
                diagram::prompt(kind, &prd_markdown),
                &api_key,
                run.token(),
                &format!("{} generation", kind.title()),
            )
            .await?;
        let mermaid = diagram::extract_mermaid(&generation.text);
        let markdown = diagram::render_markdown(kind, &source, &mermaid);

        progress.report(50, "Saving diagram…");
        let path = kind.output_path(&workspace.output_root);
        let target = path.clone();
        tokio::task::spawn_blocking(move || io::atomic_write(&target, markdown.as_bytes()))
            .await??;

        let record = ArtifactRecord::new(ArtifactKind::Diagram)
            .field("diagramKind", kind.as_str())
            .path_field("sourcePrd", &source)
            .path_field("path", &path);
        ctx.update_manifest(&workspace.output_root, record, channel)
            .await?;

        session.set_diagram(kind, path.clone());
        info!(kind = %kind, path = %path.display(), "diagram generated");
        channel.post(HostMessage::DiagramGenerated {
            kind,
            path: path.clone(),
            view_command: kind.view_command().to_string(),
        });
        ctx.host.show_info(&format!("{} generated.", kind.title()));

        Ok(Some(json!({ "kind": kind, "path": path })))
    }
}

/// The session's last PRD if it still exists, else the newest PRD on disk.
async fn resolve_source_prd(
    session: &Session,
    workspace: &Workspace,
) -> Result<PathBuf, HandlerError> {
    if let Some(paths) = session.prd() {
        if tokio::fs::try_exists(&paths.primary_output_path)
            .await
            .unwrap_or(false)
        {
            return Ok(paths.primary_output_path);
        }
    }
    let prd_dir = paths::prd_dir(&workspace.output_root);
    let newest = tokio::task::spawn_blocking(move || io::list_files(&prd_dir, "md", &[]))
        .await??
        .into_iter()
        .next();
    newest.ok_or_else(|| MiseError::SourceNotFound(NO_PRD_MESSAGE.to_string()).into())
}

use super::CommandHandler;
use crate::context::{HostContext, Progress, Session};
use crate::error::HandlerError;
use crate::host::PanelChannel;
use crate::protocol::{Command, HostMessage, Workflow};
use async_trait::async_trait;
use mise_core::artifact::ArtifactKind;
use mise_core::manifest::ArtifactRecord;
use mise_core::prd::{self, PrdDraft};
use mise_core::MiseError;
use serde_json::{json, Value};
use tracing::info;

const OPERATION: &str = "generate-prd";

/// Idea text → PRD markdown + graph sidecar → manifest entry.
pub struct PrdHandler;

#[async_trait]
impl CommandHandler for PrdHandler {
    async fn handle(
        &self,
        command: Command,
        ctx: &HostContext,
        session: &Session,
        channel: &dyn PanelChannel,
    ) -> Result<Option<Value>, HandlerError> {
        let Command::GeneratePrd { text } = command else {
            return Ok(None);
        };

        let run = ctx.begin(Workflow::Prd)?;
        if text.trim().is_empty() {
            return Err(MiseError::InvalidCommand {
                command: OPERATION.to_string(),
                reason: "describe the product idea first".to_string(),
            }
            .into());
        }
        let api_key = ctx.require_api_key().await?;
        let workspace = ctx.workspace().await?;

        let progress = Progress::new(channel, OPERATION);
        progress.report(0, "Calling AI…");
        let generation = ctx
            .generate(prd::prompt(&text), &api_key, run.token(), "PRD generation")
            .await?;
        let draft = PrdDraft::from_response(&generation.text, generation.structured)?;

        progress.report(50, "Saving files…");
        let output_root = workspace.output_root.clone();
        let to_write = draft.clone();
        let written =
            tokio::task::spawn_blocking(move || to_write.write(&output_root)).await??;
        if written.overwritten {
            info!(
                path = %written.paths.primary_output_path.display(),
                "replaced existing PRD with the same title"
            );
        }

        let record = ArtifactRecord::new(ArtifactKind::Prd)
            .field("title", draft.title.as_str())
            .field("safeTitle", written.safe_title.as_str())
            .path_field("markdownPath", &written.paths.primary_output_path);
        let record = match &written.paths.secondary_output_path {
            Some(graph) => record.path_field("graphPath", graph),
            None => record,
        };
        ctx.update_manifest(&workspace.output_root, record, channel)
            .await?;

        session.set_prd(written.paths.clone());
        info!(
            title = %draft.title,
            path = %written.paths.primary_output_path.display(),
            "PRD generated"
        );

        channel.post(HostMessage::PrdGenerated {
            title: draft.title.clone(),
            paths: written.paths.clone(),
            prd: json!({
                "title": draft.title,
                "markdown": draft.markdown,
                "json": draft.graph,
            }),
        });
        ctx.host
            .show_info(&format!("PRD \"{}\" generated.", draft.title));

        Ok(Some(serde_json::to_value(&written.paths).map_err(MiseError::from)?))
    }
}

use super::CommandHandler;
use crate::context::{HostContext, Progress, Session, Workspace};
use crate::error::HandlerError;
use crate::host::PanelChannel;
use crate::protocol::{Command, HostMessage, Workflow};
use async_trait::async_trait;
use mise_core::artifact::ArtifactKind;
use mise_core::context_card;
use mise_core::discovery::{self, SourceFile};
use mise_core::manifest::ArtifactRecord;
use mise_core::{io, paths};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const OPERATION: &str = "generate-context-cards";

/// Bulk context-card batch. A failing file is reported and skipped; the
/// batch stops between files when cancelled and keeps what it wrote.
pub struct ContextCardsHandler;

#[derive(Debug, Default)]
struct BatchOutcome {
    generated: usize,
    failed: usize,
    cancelled: bool,
}

#[async_trait]
impl CommandHandler for ContextCardsHandler {
    async fn handle(
        &self,
        command: Command,
        ctx: &HostContext,
        _session: &Session,
        channel: &dyn PanelChannel,
    ) -> Result<Option<Value>, HandlerError> {
        let Command::GenerateContextCards = command else {
            return Ok(None);
        };

        let run = ctx.begin(Workflow::ContextCards)?;
        let workspace = ctx.workspace().await?;

        let (root, output_root, config) = (
            workspace.root.clone(),
            workspace.output_root.clone(),
            workspace.config.context_cards.clone(),
        );
        let sources = tokio::task::spawn_blocking(move || {
            discovery::discover_sources(&root, &output_root, &config)
        })
        .await??;

        if sources.is_empty() {
            let text = "No source files found to generate context cards from.";
            info!("{text}");
            channel.post(HostMessage::info(text));
            channel.post(HostMessage::ContextCardsGenerated {
                generated: 0,
                failed: 0,
                cancelled: false,
            });
            return Ok(Some(json!({ "generated": 0, "failed": 0, "cancelled": false })));
        }

        // Enrichment is optional: no key just means local analysis only.
        let api_key = if workspace.config.context_cards.enrich_with_ai {
            ctx.api_key().await?
        } else {
            None
        };

        let outcome = run_batch(
            ctx,
            channel,
            &workspace,
            &sources,
            api_key.as_deref(),
            run.token(),
        )
        .await;

        channel.post(HostMessage::ContextCardsGenerated {
            generated: outcome.generated,
            failed: outcome.failed,
            cancelled: outcome.cancelled,
        });
        let summary = if outcome.cancelled {
            format!(
                "Context card generation cancelled after {} of {} files.",
                outcome.generated + outcome.failed,
                sources.len()
            )
        } else if outcome.failed > 0 {
            format!(
                "Generated {} context cards; {} files failed.",
                outcome.generated, outcome.failed
            )
        } else {
            format!("Generated {} context cards.", outcome.generated)
        };
        info!(
            generated = outcome.generated,
            failed = outcome.failed,
            cancelled = outcome.cancelled,
            "context card batch finished"
        );
        if outcome.failed > 0 {
            ctx.host.show_warning(&summary);
        } else {
            ctx.host.show_info(&summary);
        }

        Ok(Some(json!({
            "generated": outcome.generated,
            "failed": outcome.failed,
            "cancelled": outcome.cancelled,
        })))
    }
}

async fn run_batch(
    ctx: &HostContext,
    channel: &dyn PanelChannel,
    workspace: &Workspace,
    sources: &[SourceFile],
    api_key: Option<&str>,
    token: &CancellationToken,
) -> BatchOutcome {
    let progress = Progress::new(channel, OPERATION);
    let total = sources.len();
    let mut taken = HashSet::new();
    let mut outcome = BatchOutcome::default();

    for (index, source) in sources.iter().enumerate() {
        if token.is_cancelled() {
            outcome.cancelled = true;
            break;
        }
        progress.report(
            percent(index, total),
            format!("Processing {} ({}/{})", source.relative_path, index + 1, total),
        );

        let file_name = context_card::card_file_name(&source.relative_path, &taken);
        match process_file(ctx, channel, workspace, source, &file_name, api_key, token).await {
            Ok(_) => {
                taken.insert(file_name);
                outcome.generated += 1;
            }
            Err(e) if e.is_cancelled() => {
                outcome.cancelled = true;
                break;
            }
            Err(e) => {
                warn!(file = %source.relative_path, error = %e, "context card failed");
                outcome.failed += 1;
                channel.post(HostMessage::warning(
                    format!(
                        "Failed to generate context card for {}: {e}",
                        source.relative_path
                    ),
                    Some(source.relative_path.clone()),
                ));
            }
        }
    }

    if !outcome.cancelled {
        progress.report(100, "Done");
    }
    outcome
}

async fn process_file(
    ctx: &HostContext,
    channel: &dyn PanelChannel,
    workspace: &Workspace,
    source: &SourceFile,
    file_name: &str,
    api_key: Option<&str>,
    token: &CancellationToken,
) -> Result<PathBuf, HandlerError> {
    let content = tokio::fs::read_to_string(&source.path)
        .await
        .map_err(mise_core::MiseError::from)?;
    let analysis = context_card::analyze(&source.relative_path, &content);

    let summary = match api_key {
        Some(key) => {
            let prompt = context_card::enrichment_prompt(&analysis, &content);
            let generation = ctx
                .generate(prompt, key, token, "Context card generation")
                .await?;
            Some(generation.text)
        }
        None => None,
    };

    let markdown = context_card::render_markdown(&analysis, summary.as_deref());
    let path = paths::context_cards_dir(&workspace.output_root).join(file_name);
    let target = path.clone();
    tokio::task::spawn_blocking(move || io::atomic_write(&target, markdown.as_bytes())).await??;

    let record = ArtifactRecord::new(ArtifactKind::ContextCard)
        .field("sourceFile", source.relative_path.as_str())
        .field("language", analysis.language.as_str())
        .field("symbols", analysis.symbols.len())
        .field("enriched", summary.is_some())
        .path_field("path", &path);
    ctx.update_manifest(&workspace.output_root, record, channel)
        .await?;
    Ok(path)
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done * 100) / total).min(100) as u8
}

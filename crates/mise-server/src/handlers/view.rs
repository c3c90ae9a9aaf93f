use super::CommandHandler;
use crate::context::{HostContext, Session};
use crate::error::HandlerError;
use crate::host::PanelChannel;
use crate::protocol::{Command, HostMessage};
use async_trait::async_trait;
use mise_core::diagram::DiagramKind;
use mise_core::{io, paths, MiseError};
use serde_json::{json, Value};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Which previously generated artifact a view command asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Prd,
    Graph,
    Diagram(DiagramKind),
}

impl Target {
    fn view(self) -> &'static str {
        match self {
            Target::Prd => "view-prd",
            Target::Graph => "view-graph",
            Target::Diagram(kind) => kind.view_command(),
        }
    }

    fn noun(self) -> &'static str {
        match self {
            Target::Prd => "PRD",
            Target::Graph => "PRD graph",
            Target::Diagram(DiagramKind::DataFlow) => "data-flow diagram",
            Target::Diagram(DiagramKind::ComponentHierarchy) => "component hierarchy",
        }
    }

    fn from_session(self, session: &Session) -> Option<PathBuf> {
        match self {
            Target::Prd => session.prd().map(|p| p.primary_output_path),
            Target::Graph => session.prd().and_then(|p| p.secondary_output_path),
            Target::Diagram(kind) => session.diagram(kind),
        }
    }

    /// Existing candidates under the output root, newest first.
    fn scan(self, output_root: &Path) -> mise_core::Result<Vec<PathBuf>> {
        match self {
            Target::Prd => io::list_files(&paths::prd_dir(output_root), "md", &[]),
            Target::Graph => io::list_files(
                &paths::prd_dir(output_root),
                "json",
                &[paths::MANIFEST_FILE],
            ),
            Target::Diagram(kind) => {
                let path = kind.output_path(output_root);
                Ok(if path.is_file() { vec![path] } else { vec![] })
            }
        }
    }
}

/// Resolves a view command to a file and hands it to the host.
///
/// Order: explicit `filePath`, then the panel session, then a scan of the
/// output directory (asking the user when several files match).
pub struct ViewHandler;

#[async_trait]
impl CommandHandler for ViewHandler {
    async fn handle(
        &self,
        command: Command,
        ctx: &HostContext,
        session: &Session,
        channel: &dyn PanelChannel,
    ) -> Result<Option<Value>, HandlerError> {
        let (target, file_path) = match command {
            Command::ViewPrd { file_path } => (Target::Prd, file_path),
            Command::ViewGraph { file_path } => (Target::Graph, file_path),
            Command::ViewDataFlowDiagram { file_path } => {
                (Target::Diagram(DiagramKind::DataFlow), file_path)
            }
            Command::ViewComponentHierarchy { file_path } => {
                (Target::Diagram(DiagramKind::ComponentHierarchy), file_path)
            }
            _ => return Ok(None),
        };

        let resolved = match file_path {
            Some(path) => Some(explicit_path(ctx, path).await?),
            None => match existing(target.from_session(session)).await {
                Some(path) => Some(path),
                None => scan_and_pick(ctx, target).await?,
            },
        };

        let Some(path) = resolved else {
            let text = format!(
                "No {} found. Generate one first.",
                target.noun()
            );
            ctx.host.show_info(&text);
            channel.post(HostMessage::info(text));
            return Ok(None);
        };

        debug!(view = target.view(), path = %path.display(), "opening artifact");
        ctx.host.open_artifact(target.view(), &path, channel).await?;
        Ok(Some(json!({ "view": target.view(), "path": path })))
    }
}

/// An explicit path must name an existing file under the output root.
/// Relative paths are taken from the workspace root.
async fn explicit_path(ctx: &HostContext, path: PathBuf) -> Result<PathBuf, HandlerError> {
    let workspace = ctx.workspace().await?;
    let path = if path.is_absolute() {
        path
    } else {
        workspace.root.join(path)
    };
    let shown = path.display().to_string();

    let output_root = tokio::fs::canonicalize(&workspace.output_root).await.ok();
    let resolved = match tokio::fs::canonicalize(&path).await {
        Ok(resolved) => resolved,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let lexically_inside = path.starts_with(&workspace.output_root)
                && !path.components().any(|c| c == Component::ParentDir);
            return Err(if lexically_inside {
                MiseError::FileNotFound(shown)
            } else {
                MiseError::OutsideOutput(shown)
            }
            .into());
        }
        Err(e) => return Err(MiseError::from(e).into()),
    };

    if !output_root.is_some_and(|root| resolved.starts_with(root)) {
        warn!(path = %shown, "refusing to open a file outside the output directory");
        return Err(MiseError::OutsideOutput(shown).into());
    }
    let is_file = tokio::fs::metadata(&resolved)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(MiseError::FileNotFound(shown).into());
    }
    Ok(resolved)
}

async fn existing(path: Option<PathBuf>) -> Option<PathBuf> {
    let path = path?;
    tokio::fs::try_exists(&path)
        .await
        .unwrap_or(false)
        .then_some(path)
}

async fn scan_and_pick(ctx: &HostContext, target: Target) -> Result<Option<PathBuf>, HandlerError> {
    let workspace = ctx.workspace().await?;
    let output_root = workspace.output_root.clone();
    let mut candidates =
        tokio::task::spawn_blocking(move || target.scan(&output_root)).await??;
    match candidates.len() {
        0 => Ok(None),
        1 => Ok(candidates.pop()),
        _ => {
            let title = format!("Select a {} to open", target.noun());
            Ok(ctx.host.pick_file(&title, &candidates).await)
        }
    }
}

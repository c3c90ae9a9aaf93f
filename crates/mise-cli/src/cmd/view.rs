use super::{dispatch, Invocation};
use anyhow::Result;
use clap::ValueEnum;
use mise_server::protocol::Command;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ViewTarget {
    Prd,
    Graph,
    DataFlow,
    ComponentHierarchy,
}

/// Resolve a generated artifact and print its path, or open it with the
/// system viewer.
pub fn run(
    root: &Path,
    target: ViewTarget,
    file: Option<PathBuf>,
    open: bool,
    json: bool,
) -> Result<()> {
    let file_path = file;
    let command = match target {
        ViewTarget::Prd => Command::ViewPrd { file_path },
        ViewTarget::Graph => Command::ViewGraph { file_path },
        ViewTarget::DataFlow => Command::ViewDataFlowDiagram { file_path },
        ViewTarget::ComponentHierarchy => Command::ViewComponentHierarchy { file_path },
    };
    dispatch(
        root,
        command,
        Invocation {
            json,
            open_with_system: open,
        },
    )?;
    Ok(())
}

use super::{dispatch, Invocation};
use anyhow::{bail, Result};
use clap::ValueEnum;
use mise_server::protocol::Command;
use std::path::Path;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum DiagramArg {
    DataFlow,
    ComponentHierarchy,
}

// ---------------------------------------------------------------------------
// prd
// ---------------------------------------------------------------------------

pub fn run_prd(root: &Path, idea: Vec<String>, json: bool) -> Result<()> {
    let text = idea.join(" ");
    if text.trim().is_empty() {
        bail!("describe the idea to turn into a PRD");
    }
    dispatch(root, Command::GeneratePrd { text }, invocation(json))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// cards
// ---------------------------------------------------------------------------

pub fn run_cards(root: &Path, json: bool) -> Result<()> {
    dispatch(root, Command::GenerateContextCards, invocation(json))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// diagram
// ---------------------------------------------------------------------------

pub fn run_diagram(root: &Path, kind: DiagramArg, json: bool) -> Result<()> {
    let command = match kind {
        DiagramArg::DataFlow => Command::GenerateDataFlowDiagram,
        DiagramArg::ComponentHierarchy => Command::GenerateComponentHierarchy,
    };
    dispatch(root, command, invocation(json))?;
    Ok(())
}

fn invocation(json: bool) -> Invocation {
    Invocation {
        json,
        ..Invocation::default()
    }
}

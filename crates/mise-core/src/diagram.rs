use crate::paths;
use crate::prompt::Prompt;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagramKind {
    DataFlow,
    ComponentHierarchy,
}

impl DiagramKind {
    pub const ALL: [DiagramKind; 2] = [DiagramKind::DataFlow, DiagramKind::ComponentHierarchy];

    pub fn as_str(self) -> &'static str {
        match self {
            DiagramKind::DataFlow => "data-flow",
            DiagramKind::ComponentHierarchy => "component-hierarchy",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            DiagramKind::DataFlow => "Data Flow Diagram",
            DiagramKind::ComponentHierarchy => "Component Hierarchy",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            DiagramKind::DataFlow => paths::DATA_FLOW_DIAGRAM_FILE,
            DiagramKind::ComponentHierarchy => paths::COMPONENT_HIERARCHY_FILE,
        }
    }

    /// The view command the panel uses to open this diagram.
    pub fn view_command(self) -> &'static str {
        match self {
            DiagramKind::DataFlow => "view-data-flow-diagram",
            DiagramKind::ComponentHierarchy => "view-component-hierarchy",
        }
    }

    pub fn output_path(self, output_root: &Path) -> PathBuf {
        paths::diagrams_dir(output_root).join(self.file_name())
    }

    fn instructions(self) -> &'static str {
        match self {
            DiagramKind::DataFlow => {
                "Produce a Mermaid `flowchart LR` showing how data moves between users, \
                 services, and stores described in the PRD. Label every edge with the data \
                 that flows along it."
            }
            DiagramKind::ComponentHierarchy => {
                "Produce a Mermaid `graph TD` showing the component hierarchy implied by the \
                 PRD, from top-level application down to leaf UI or service components."
            }
        }
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the diagram prompt from a PRD's markdown.
pub fn prompt(kind: DiagramKind, prd_markdown: &str) -> Prompt {
    let system = format!(
        "You are a software architect. {} Respond with a single ```mermaid fenced block \
         and nothing else.",
        kind.instructions()
    );
    Prompt::text(system, prd_markdown.trim())
}

static MERMAID_RE: OnceLock<Regex> = OnceLock::new();

fn mermaid_re() -> &'static Regex {
    MERMAID_RE.get_or_init(|| Regex::new(r"(?s)```mermaid[ \t]*\r?\n(.*?)```").unwrap())
}

/// Pull the first mermaid block body out of an AI response, falling back to
/// the trimmed response itself.
pub fn extract_mermaid(response: &str) -> String {
    mermaid_re()
        .captures(response)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| response.trim().to_string())
}

/// Markdown document written to `diagrams/<file>`.
pub fn render_markdown(kind: DiagramKind, source_prd: &Path, mermaid: &str) -> String {
    let source = source_prd
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source_prd.display().to_string());
    format!(
        "# {}\n\n_Generated from `{}`._\n\n```mermaid\n{}\n```\n",
        kind.title(),
        source,
        mermaid.trim()
    )
}

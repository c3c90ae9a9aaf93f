//! Panel message protocol.
//!
//! Inbound messages are JSON objects discriminated by their `command` field
//! and decode into [`Command`]. Outbound messages are [`HostMessage`]s,
//! tagged the same way so the webview can switch on `command`.

use mise_core::artifact::GeneratedPaths;
use mise_core::diagram::DiagramKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command")]
pub enum Command {
    #[serde(rename = "get-api-key", alias = "webviewReady")]
    GetApiKey,

    #[serde(rename = "save-api-key", alias = "saveApiKey")]
    SaveApiKey {
        #[serde(rename = "apiKey")]
        api_key: String,
    },

    #[serde(rename = "clear-api-key", alias = "clearApiKey")]
    ClearApiKey,

    #[serde(rename = "generate-prd", alias = "generate")]
    GeneratePrd { text: String },

    #[serde(rename = "generate-context-cards", alias = "bulkGenerateContextCards")]
    GenerateContextCards,

    #[serde(rename = "generate-data-flow-diagram")]
    GenerateDataFlowDiagram,

    #[serde(rename = "generate-component-hierarchy")]
    GenerateComponentHierarchy,

    #[serde(rename = "view-prd")]
    ViewPrd {
        #[serde(default, rename = "filePath", skip_serializing_if = "Option::is_none")]
        file_path: Option<PathBuf>,
    },

    #[serde(rename = "view-graph")]
    ViewGraph {
        #[serde(default, rename = "filePath", skip_serializing_if = "Option::is_none")]
        file_path: Option<PathBuf>,
    },

    #[serde(rename = "view-data-flow-diagram")]
    ViewDataFlowDiagram {
        #[serde(default, rename = "filePath", skip_serializing_if = "Option::is_none")]
        file_path: Option<PathBuf>,
    },

    #[serde(rename = "view-component-hierarchy")]
    ViewComponentHierarchy {
        #[serde(default, rename = "filePath", skip_serializing_if = "Option::is_none")]
        file_path: Option<PathBuf>,
    },

    #[serde(rename = "cancel-generation", alias = "cancelGeneration")]
    CancelGeneration {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        workflow: Option<Workflow>,
    },
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::GetApiKey => CommandKind::GetApiKey,
            Command::SaveApiKey { .. } => CommandKind::SaveApiKey,
            Command::ClearApiKey => CommandKind::ClearApiKey,
            Command::GeneratePrd { .. } => CommandKind::GeneratePrd,
            Command::GenerateContextCards => CommandKind::GenerateContextCards,
            Command::GenerateDataFlowDiagram => CommandKind::GenerateDataFlowDiagram,
            Command::GenerateComponentHierarchy => CommandKind::GenerateComponentHierarchy,
            Command::ViewPrd { .. } => CommandKind::ViewPrd,
            Command::ViewGraph { .. } => CommandKind::ViewGraph,
            Command::ViewDataFlowDiagram { .. } => CommandKind::ViewDataFlowDiagram,
            Command::ViewComponentHierarchy { .. } => CommandKind::ViewComponentHierarchy,
            Command::CancelGeneration { .. } => CommandKind::CancelGeneration,
        }
    }
}

/// Payload-free discriminant of [`Command`]; the router's table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    GetApiKey,
    SaveApiKey,
    ClearApiKey,
    GeneratePrd,
    GenerateContextCards,
    GenerateDataFlowDiagram,
    GenerateComponentHierarchy,
    ViewPrd,
    ViewGraph,
    ViewDataFlowDiagram,
    ViewComponentHierarchy,
    CancelGeneration,
}

impl CommandKind {
    pub const ALL: [CommandKind; 12] = [
        CommandKind::GetApiKey,
        CommandKind::SaveApiKey,
        CommandKind::ClearApiKey,
        CommandKind::GeneratePrd,
        CommandKind::GenerateContextCards,
        CommandKind::GenerateDataFlowDiagram,
        CommandKind::GenerateComponentHierarchy,
        CommandKind::ViewPrd,
        CommandKind::ViewGraph,
        CommandKind::ViewDataFlowDiagram,
        CommandKind::ViewComponentHierarchy,
        CommandKind::CancelGeneration,
    ];

    /// Accepts the canonical name and the legacy synonyms.
    pub fn parse(command: &str) -> Option<Self> {
        let kind = match command {
            "get-api-key" | "webviewReady" => CommandKind::GetApiKey,
            "save-api-key" | "saveApiKey" => CommandKind::SaveApiKey,
            "clear-api-key" | "clearApiKey" => CommandKind::ClearApiKey,
            "generate-prd" | "generate" => CommandKind::GeneratePrd,
            "generate-context-cards" | "bulkGenerateContextCards" => {
                CommandKind::GenerateContextCards
            }
            "generate-data-flow-diagram" => CommandKind::GenerateDataFlowDiagram,
            "generate-component-hierarchy" => CommandKind::GenerateComponentHierarchy,
            "view-prd" => CommandKind::ViewPrd,
            "view-graph" => CommandKind::ViewGraph,
            "view-data-flow-diagram" => CommandKind::ViewDataFlowDiagram,
            "view-component-hierarchy" => CommandKind::ViewComponentHierarchy,
            "cancel-generation" | "cancelGeneration" => CommandKind::CancelGeneration,
            _ => return None,
        };
        Some(kind)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::GetApiKey => "get-api-key",
            CommandKind::SaveApiKey => "save-api-key",
            CommandKind::ClearApiKey => "clear-api-key",
            CommandKind::GeneratePrd => "generate-prd",
            CommandKind::GenerateContextCards => "generate-context-cards",
            CommandKind::GenerateDataFlowDiagram => "generate-data-flow-diagram",
            CommandKind::GenerateComponentHierarchy => "generate-component-hierarchy",
            CommandKind::ViewPrd => "view-prd",
            CommandKind::ViewGraph => "view-graph",
            CommandKind::ViewDataFlowDiagram => "view-data-flow-diagram",
            CommandKind::ViewComponentHierarchy => "view-component-hierarchy",
            CommandKind::CancelGeneration => "cancel-generation",
        }
    }

    /// Human phrase used in "Failed to <operation>" notifications.
    pub fn operation(self) -> &'static str {
        match self {
            CommandKind::GetApiKey => "read API key status",
            CommandKind::SaveApiKey => "save API key",
            CommandKind::ClearApiKey => "clear API key",
            CommandKind::GeneratePrd => "generate PRD",
            CommandKind::GenerateContextCards => "generate context cards",
            CommandKind::GenerateDataFlowDiagram => "generate data-flow diagram",
            CommandKind::GenerateComponentHierarchy => "generate component hierarchy",
            CommandKind::ViewPrd => "open PRD",
            CommandKind::ViewGraph => "open PRD graph",
            CommandKind::ViewDataFlowDiagram => "open data-flow diagram",
            CommandKind::ViewComponentHierarchy => "open component hierarchy",
            CommandKind::CancelGeneration => "cancel generation",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// Long-running generation workflows. At most one of each runs at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Workflow {
    Prd,
    ContextCards,
    DataFlowDiagram,
    ComponentHierarchy,
}

impl Workflow {
    pub fn as_str(self) -> &'static str {
        match self {
            Workflow::Prd => "prd",
            Workflow::ContextCards => "context-cards",
            Workflow::DataFlowDiagram => "data-flow-diagram",
            Workflow::ComponentHierarchy => "component-hierarchy",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Workflow::Prd => "PRD",
            Workflow::ContextCards => "Context card",
            Workflow::DataFlowDiagram => "Data-flow diagram",
            Workflow::ComponentHierarchy => "Component hierarchy",
        }
    }

    pub fn for_diagram(kind: DiagramKind) -> Self {
        match kind {
            DiagramKind::DataFlow => Workflow::DataFlowDiagram,
            DiagramKind::ComponentHierarchy => Workflow::ComponentHierarchy,
        }
    }
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum HostMessage {
    ApiKeyStatus {
        present: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        hint: Option<String>,
    },
    Progress {
        operation: String,
        percent: u8,
        message: String,
    },
    Info {
        text: String,
    },
    Success {
        text: String,
    },
    Warning {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        file: Option<String>,
    },
    Error {
        text: String,
    },
    PrdGenerated {
        title: String,
        paths: GeneratedPaths,
        prd: Value,
    },
    ContextCardsGenerated {
        generated: usize,
        failed: usize,
        cancelled: bool,
    },
    #[serde(rename_all = "camelCase")]
    DiagramGenerated {
        kind: DiagramKind,
        path: PathBuf,
        view_command: String,
    },
    OpenArtifact {
        view: String,
        path: PathBuf,
        content: String,
    },
}

impl HostMessage {
    pub fn info(text: impl Into<String>) -> Self {
        HostMessage::Info { text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        HostMessage::Error { text: text.into() }
    }

    pub fn warning(text: impl Into<String>, file: Option<String>) -> Self {
        HostMessage::Warning {
            text: text.into(),
            file,
        }
    }

    /// The `command` tag this message serialises with.
    pub fn tag(&self) -> &'static str {
        match self {
            HostMessage::ApiKeyStatus { .. } => "apiKeyStatus",
            HostMessage::Progress { .. } => "progress",
            HostMessage::Info { .. } => "info",
            HostMessage::Success { .. } => "success",
            HostMessage::Warning { .. } => "warning",
            HostMessage::Error { .. } => "error",
            HostMessage::PrdGenerated { .. } => "prdGenerated",
            HostMessage::ContextCardsGenerated { .. } => "contextCardsGenerated",
            HostMessage::DiagramGenerated { .. } => "diagramGenerated",
            HostMessage::OpenArtifact { .. } => "openArtifact",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// ArtifactKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    Prd,
    ContextCard,
    Diagram,
}

impl ArtifactKind {
    /// Value written to the manifest's `type` field.
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Prd => "prd",
            ArtifactKind::ContextCard => "context-card",
            ArtifactKind::Diagram => "diagram",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// GeneratedPaths
// ---------------------------------------------------------------------------

/// Files produced by one successful generation: the primary markdown and an
/// optional machine-readable sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPaths {
    pub primary_output_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_output_path: Option<PathBuf>,
}

impl GeneratedPaths {
    pub fn new(primary: impl Into<PathBuf>) -> Self {
        Self {
            primary_output_path: primary.into(),
            secondary_output_path: None,
        }
    }

    pub fn with_secondary(mut self, secondary: impl Into<PathBuf>) -> Self {
        self.secondary_output_path = Some(secondary.into());
        self
    }
}

//! Artifact ledger at `<output>/prd/manifest.json`.
//!
//! The ledger is rewritten whole on every append. A missing file starts an
//! empty ledger; an unreadable one is copied aside to `manifest.json.corrupt`
//! and replaced, and the caller is told so it can warn the user.
//!
//! There is no cross-process locking. Callers running several workflows in
//! one process serialise [`record`] themselves.

use crate::artifact::ArtifactKind;
use crate::error::Result;
use crate::io;
use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Agent identifier stamped on every entry.
pub const AGENT_ID: &str = "mise-en-place";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub agent: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub artifact_type: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Unknown top-level keys make the file unreadable rather than empty, so a
/// foreign JSON document at the ledger path is backed up instead of lost.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub artifacts: Vec<ManifestEntry>,
}

/// Caller-supplied description of a produced artifact.
#[derive(Debug, Clone)]
pub struct ArtifactRecord {
    pub kind: ArtifactKind,
    pub fields: Map<String, Value>,
}

impl ArtifactRecord {
    pub fn new(kind: ArtifactKind) -> Self {
        Self {
            kind,
            fields: Map::new(),
        }
    }

    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn path_field(self, key: &str, path: &Path) -> Self {
        let value = path.to_string_lossy().into_owned();
        self.field(key, value)
    }
}

/// Outcome of a manifest load.
#[derive(Debug)]
pub struct LoadedManifest {
    pub manifest: Manifest,
    /// The existing file could not be read or parsed and was discarded.
    pub recovered_from: Option<String>,
}

/// Outcome of one [`record`] call.
#[derive(Debug)]
pub struct ManifestUpdate {
    pub path: PathBuf,
    pub entry_count: usize,
    /// Set when a corrupt ledger was replaced; holds the parse/read error and
    /// the backup location is [`paths::corrupt_manifest_path`].
    pub recovered_from: Option<String>,
}

// ---------------------------------------------------------------------------
// Load / record
// ---------------------------------------------------------------------------

/// Read the ledger, tolerating absence and corruption.
pub fn load(output_root: &Path) -> LoadedManifest {
    let path = paths::manifest_path(output_root);
    if !path.exists() {
        return LoadedManifest {
            manifest: Manifest::default(),
            recovered_from: None,
        };
    }
    let parsed = std::fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|data| serde_json::from_str::<Manifest>(&data).map_err(|e| e.to_string()));
    match parsed {
        Ok(manifest) => LoadedManifest {
            manifest,
            recovered_from: None,
        },
        Err(reason) => LoadedManifest {
            manifest: Manifest::default(),
            recovered_from: Some(reason),
        },
    }
}

/// Append one entry and rewrite the ledger pretty-printed.
pub fn record(output_root: &Path, record: ArtifactRecord) -> Result<ManifestUpdate> {
    let path = paths::manifest_path(output_root);
    io::ensure_dir(&paths::prd_dir(output_root))?;

    let LoadedManifest {
        mut manifest,
        recovered_from,
    } = load(output_root);

    if recovered_from.is_some() {
        // Keep the unreadable ledger around; best effort, the rewrite below
        // proceeds either way.
        let _ = std::fs::copy(&path, paths::corrupt_manifest_path(output_root));
    }

    let mut fields = record.fields;
    // Reserved keys are owned by the ledger.
    fields.remove("agent");
    fields.remove("timestamp");
    fields.remove("type");

    manifest.artifacts.push(ManifestEntry {
        agent: AGENT_ID.to_string(),
        timestamp: Utc::now(),
        artifact_type: record.kind.as_str().to_string(),
        fields,
    });

    let data = serde_json::to_string_pretty(&manifest)?;
    io::atomic_write(&path, data.as_bytes())?;

    Ok(ManifestUpdate {
        path,
        entry_count: manifest.artifacts.len(),
        recovered_from,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn record_creates_manifest_when_missing() {
        let dir = TempDir::new().unwrap();
        let update = record(
            dir.path(),
            ArtifactRecord::new(ArtifactKind::Prd).field("title", "Sample Feature"),
        )
        .unwrap();
        assert_eq!(update.entry_count, 1);
        assert!(update.recovered_from.is_none());
        assert_eq!(update.path, dir.path().join("prd/manifest.json"));

        let raw: Value =
            serde_json::from_str(&std::fs::read_to_string(&update.path).unwrap()).unwrap();
        let entry = &raw["artifacts"][0];
        assert_eq!(entry["agent"], AGENT_ID);
        assert_eq!(entry["type"], "prd");
        assert_eq!(entry["title"], "Sample Feature");
        assert!(entry["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn repeated_records_preserve_order() {
        let dir = TempDir::new().unwrap();
        for i in 0..5 {
            record(
                dir.path(),
                ArtifactRecord::new(ArtifactKind::ContextCard).field("index", i),
            )
            .unwrap();
        }
        let manifest = load(dir.path()).manifest;
        assert_eq!(manifest.artifacts.len(), 5);
        let order: Vec<i64> = manifest
            .artifacts
            .iter()
            .map(|e| e.fields["index"].as_i64().unwrap())
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn corrupt_manifest_is_replaced_and_backed_up() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("prd")).unwrap();
        std::fs::write(dir.path().join("prd/manifest.json"), "{ not json").unwrap();

        let update = record(dir.path(), ArtifactRecord::new(ArtifactKind::Diagram)).unwrap();
        assert!(update.recovered_from.is_some());
        assert_eq!(update.entry_count, 1);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("prd/manifest.json.corrupt")).unwrap(),
            "{ not json"
        );
    }

    #[test]
    fn reserved_fields_cannot_be_overridden() {
        let dir = TempDir::new().unwrap();
        record(
            dir.path(),
            ArtifactRecord::new(ArtifactKind::Prd)
                .field("agent", "someone-else")
                .field("type", "bogus"),
        )
        .unwrap();
        let entry = &load(dir.path()).manifest.artifacts[0];
        assert_eq!(entry.agent, AGENT_ID);
        assert_eq!(entry.artifact_type, "prd");
    }

    #[test]
    fn manifest_without_artifacts_key_loads_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("prd")).unwrap();
        std::fs::write(dir.path().join("prd/manifest.json"), "{}").unwrap();
        let loaded = load(dir.path());
        assert!(loaded.recovered_from.is_none());
        assert!(loaded.manifest.artifacts.is_empty());
    }

    #[test]
    fn foreign_json_counts_as_corrupt() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("prd")).unwrap();
        std::fs::write(
            dir.path().join("prd/manifest.json"),
            r#"{"nodes": [], "edges": []}"#,
        )
        .unwrap();

        assert!(load(dir.path()).recovered_from.is_some());
        let update = record(dir.path(), ArtifactRecord::new(ArtifactKind::Prd)).unwrap();
        assert!(update.recovered_from.is_some());
        assert!(dir.path().join("prd/manifest.json.corrupt").is_file());
    }
}

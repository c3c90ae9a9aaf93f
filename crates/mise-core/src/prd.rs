use crate::artifact::GeneratedPaths;
use crate::error::{MiseError, Result};
use crate::io;
use crate::paths;
use crate::prompt::Prompt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;

const PRD_SYSTEM_PROMPT: &str = "You are a senior product manager. Turn the user's product idea \
into a Product Requirements Document. Respond with a single JSON object with the keys \
\"title\" (short feature name), \"markdown\" (the full PRD in GitHub-flavored markdown with \
sections: Overview, Goals, User Stories, Functional Requirements, Non-Functional Requirements, \
Out of Scope, Open Questions) and \"json\" (a graph of the PRD: {\"nodes\": [{\"id\", \"label\", \
\"type\"}], \"edges\": [{\"from\", \"to\", \"label\"}]}).";

/// Stems whose `.json` sidecar would collide with ledger files in `prd/`.
const RESERVED_STEMS: &[&str] = &["manifest"];

/// Build the PRD generation prompt for a free-text product idea.
pub fn prompt(idea: &str) -> Prompt {
    Prompt::json(PRD_SYSTEM_PROMPT, idea.trim())
}

// ---------------------------------------------------------------------------
// PrdDraft
// ---------------------------------------------------------------------------

/// A PRD as returned by the AI, ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrdDraft {
    pub title: String,
    pub markdown: String,
    /// Structured graph sidecar written next to the markdown.
    pub graph: Value,
}

#[derive(Debug, Deserialize)]
struct StructuredPrd {
    #[serde(default)]
    title: Option<String>,
    markdown: String,
    #[serde(default, alias = "graph")]
    json: Option<Value>,
}

impl PrdDraft {
    /// Interpret an AI response.
    ///
    /// `structured` is the JSON object the provider extracted from `text`,
    /// if any. Without one, the raw text is treated as the markdown body.
    pub fn from_response(text: &str, structured: Option<Value>) -> Result<Self> {
        if let Some(value) = structured {
            if let Ok(parsed) = serde_json::from_value::<StructuredPrd>(value) {
                if !parsed.markdown.trim().is_empty() {
                    let markdown = parsed.markdown.trim().to_string();
                    let title = parsed
                        .title
                        .filter(|t| !t.trim().is_empty())
                        .map(|t| t.trim().to_string())
                        .unwrap_or_else(|| title_from_markdown(&markdown));
                    let graph = match parsed.json {
                        Some(g) if !g.is_null() => g,
                        _ => derive_graph(&title, &markdown),
                    };
                    return Ok(Self {
                        title,
                        markdown,
                        graph,
                    });
                }
            }
        }

        let markdown = text.trim();
        if markdown.is_empty() {
            return Err(MiseError::MalformedResponse(
                "the AI returned an empty PRD".to_string(),
            ));
        }
        let title = title_from_markdown(markdown);
        let graph = derive_graph(&title, markdown);
        Ok(Self {
            title,
            markdown: markdown.to_string(),
            graph,
        })
    }

    /// File stem for this PRD. A stem that would put the graph sidecar on
    /// the ledger's path is suffixed with `-prd`.
    pub fn safe_title(&self) -> String {
        let safe = paths::safe_title(&self.title);
        if RESERVED_STEMS.contains(&safe.as_str()) {
            format!("{safe}-prd")
        } else {
            safe
        }
    }

    /// Write `prd/<safe-title>.md` and `prd/<safe-title>.json`, overwriting
    /// any previous PRD with the same safe title.
    pub fn write(&self, output_root: &Path) -> Result<PrdWrite> {
        let safe = self.safe_title();
        let md_path = paths::prd_markdown_path(output_root, &safe);
        let graph_path = paths::prd_graph_path(output_root, &safe);
        let overwritten = md_path.exists();

        io::ensure_dir(&paths::prd_dir(output_root))?;
        io::atomic_write(&md_path, self.markdown.as_bytes())?;
        let graph = serde_json::to_string_pretty(&self.graph)?;
        io::atomic_write(&graph_path, graph.as_bytes())?;

        Ok(PrdWrite {
            paths: GeneratedPaths::new(md_path).with_secondary(graph_path),
            safe_title: safe,
            overwritten,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PrdWrite {
    pub paths: GeneratedPaths,
    pub safe_title: String,
    /// A PRD with the same safe title already existed and was replaced.
    pub overwritten: bool,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn title_from_markdown(markdown: &str) -> String {
    let heading = markdown
        .lines()
        .map(str::trim)
        .find_map(|l| l.strip_prefix("# "))
        .map(|t| t.trim().to_string());
    heading
        .or_else(|| {
            markdown
                .lines()
                .map(|l| l.trim().trim_start_matches('#').trim())
                .find(|l| !l.is_empty())
                .map(|l| l.chars().take(80).collect())
        })
        .unwrap_or_else(|| "Untitled PRD".to_string())
}

/// Section graph derived from `##` headings when the AI gave no graph.
fn derive_graph(title: &str, markdown: &str) -> Value {
    let mut nodes = vec![json!({ "id": "root", "label": title, "type": "prd" })];
    let mut edges = Vec::new();
    for (i, heading) in markdown
        .lines()
        .filter_map(|l| l.trim().strip_prefix("## "))
        .enumerate()
    {
        let id = format!("section-{}", i + 1);
        nodes.push(json!({ "id": id, "label": heading.trim(), "type": "section" }));
        edges.push(json!({ "from": "root", "to": id, "label": "contains" }));
    }
    json!({ "nodes": nodes, "edges": edges })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn structured_response_is_used_verbatim() {
        let structured = json!({
            "title": "Sample Feature",
            "markdown": "# Sample Feature\n\n## Goals\n- ship",
            "json": { "nodes": [{ "id": "a" }], "edges": [] }
        });
        let draft = PrdDraft::from_response("ignored", Some(structured)).unwrap();
        assert_eq!(draft.title, "Sample Feature");
        assert_eq!(draft.safe_title(), "sample-feature");
        assert_eq!(draft.graph["nodes"][0]["id"], "a");
    }

    #[test]
    fn plain_markdown_falls_back_to_heading_and_derived_graph() {
        let text = "# Team Calendar\n\n## Overview\nx\n\n## Goals\ny\n";
        let draft = PrdDraft::from_response(text, None).unwrap();
        assert_eq!(draft.title, "Team Calendar");
        let nodes = draft.graph["nodes"].as_array().unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[2]["label"], "Goals");
        assert_eq!(draft.graph["edges"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn structured_without_title_uses_markdown_heading() {
        let structured = json!({ "markdown": "# From Heading\nbody" });
        let draft = PrdDraft::from_response("", Some(structured)).unwrap();
        assert_eq!(draft.title, "From Heading");
        assert_eq!(draft.graph["nodes"][0]["label"], "From Heading");
    }

    #[test]
    fn empty_response_is_rejected() {
        let err = PrdDraft::from_response("   \n", None).unwrap_err();
        assert!(matches!(err, MiseError::MalformedResponse(_)));
    }

    #[test]
    fn write_produces_markdown_and_sidecar() {
        let dir = TempDir::new().unwrap();
        let draft = PrdDraft {
            title: "Sample Feature".into(),
            markdown: "# Sample Feature".into(),
            graph: json!({ "nodes": [] }),
        };
        let written = draft.write(dir.path()).unwrap();
        assert!(!written.overwritten);
        assert_eq!(
            written.paths.primary_output_path,
            dir.path().join("prd/sample-feature.md")
        );
        assert_eq!(
            written.paths.secondary_output_path.as_deref(),
            Some(dir.path().join("prd/sample-feature.json").as_path())
        );
        let graph: Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("prd/sample-feature.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(graph, json!({ "nodes": [] }));
    }

    #[test]
    fn colliding_titles_overwrite() {
        let dir = TempDir::new().unwrap();
        let first = PrdDraft {
            title: "A/B".into(),
            markdown: "first".into(),
            graph: json!({}),
        };
        let second = PrdDraft {
            title: "a b".into(),
            markdown: "second".into(),
            graph: json!({}),
        };
        first.write(dir.path()).unwrap();
        let written = second.write(dir.path()).unwrap();
        assert!(written.overwritten);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("prd/a-b.md")).unwrap(),
            "second"
        );
    }

    #[test]
    fn prompt_requests_json() {
        let p = prompt("  a todo app  ");
        assert!(p.json);
        assert_eq!(p.user, "a todo app");
    }

    #[test]
    fn title_matching_the_ledger_name_is_suffixed() {
        let dir = TempDir::new().unwrap();
        crate::manifest::record(
            dir.path(),
            crate::manifest::ArtifactRecord::new(crate::artifact::ArtifactKind::Prd),
        )
        .unwrap();

        let draft = PrdDraft {
            title: "Manifest!".into(),
            markdown: "# Manifest".into(),
            graph: json!({ "nodes": [] }),
        };
        assert_eq!(draft.safe_title(), "manifest-prd");
        let written = draft.write(dir.path()).unwrap();
        assert_eq!(
            written.paths.secondary_output_path.as_deref(),
            Some(dir.path().join("prd/manifest-prd.json").as_path())
        );

        let ledger = crate::manifest::load(dir.path());
        assert!(ledger.recovered_from.is_none());
        assert_eq!(ledger.manifest.artifacts.len(), 1);
    }
}

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const MISE_DIR: &str = ".mise";
pub const CONFIG_FILE: &str = ".mise/config.yaml";

pub const DEFAULT_OUTPUT_DIR: &str = "mise-en-place-output";
pub const PRD_DIR: &str = "prd";
pub const CONTEXT_CARDS_DIR: &str = "context-cards";
pub const DIAGRAMS_DIR: &str = "diagrams";

pub const MANIFEST_FILE: &str = "manifest.json";
pub const CORRUPT_MANIFEST_FILE: &str = "manifest.json.corrupt";
pub const DATA_FLOW_DIAGRAM_FILE: &str = "data_flow_diagram.md";
pub const COMPONENT_HIERARCHY_FILE: &str = "component_hierarchy.md";

pub const CREDENTIALS_FILE: &str = "credentials.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Resolve the configured output directory against the workspace root.
/// Absolute paths are used as-is.
pub fn output_root(root: &Path, output_dir: &Path) -> PathBuf {
    if output_dir.is_absolute() {
        output_dir.to_path_buf()
    } else {
        root.join(output_dir)
    }
}

pub fn prd_dir(output_root: &Path) -> PathBuf {
    output_root.join(PRD_DIR)
}

pub fn prd_markdown_path(output_root: &Path, safe_title: &str) -> PathBuf {
    prd_dir(output_root).join(format!("{safe_title}.md"))
}

pub fn prd_graph_path(output_root: &Path, safe_title: &str) -> PathBuf {
    prd_dir(output_root).join(format!("{safe_title}.json"))
}

pub fn manifest_path(output_root: &Path) -> PathBuf {
    prd_dir(output_root).join(MANIFEST_FILE)
}

pub fn corrupt_manifest_path(output_root: &Path) -> PathBuf {
    prd_dir(output_root).join(CORRUPT_MANIFEST_FILE)
}

pub fn context_cards_dir(output_root: &Path) -> PathBuf {
    output_root.join(CONTEXT_CARDS_DIR)
}

pub fn diagrams_dir(output_root: &Path) -> PathBuf {
    output_root.join(DIAGRAMS_DIR)
}

/// User-level directory holding the credential file (`~/.mise`).
pub fn user_mise_dir() -> Option<PathBuf> {
    home::home_dir().map(|h| h.join(MISE_DIR))
}

// ---------------------------------------------------------------------------
// Safe titles
// ---------------------------------------------------------------------------

const MAX_SAFE_TITLE_LEN: usize = 64;

static SEPARATOR_RE: OnceLock<Regex> = OnceLock::new();

fn separator_re() -> &'static Regex {
    SEPARATOR_RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").unwrap())
}

/// Derive a filesystem-safe base name from a free-form title.
///
/// Lowercases, collapses every run of non-alphanumeric characters into a
/// single `-`, trims leading/trailing separators and caps the length.
/// Distinct titles may collide (`"A/B"` and `"a b"` both become `a-b`);
/// callers overwrite on collision.
pub fn safe_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let replaced = separator_re().replace_all(&lowered, "-");
    let mut slug = replaced.trim_matches('-').to_string();
    if slug.len() > MAX_SAFE_TITLE_LEN {
        slug.truncate(MAX_SAFE_TITLE_LEN);
        slug = slug.trim_end_matches('-').to_string();
    }
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

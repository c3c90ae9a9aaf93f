//! Local structural analysis of a source file and its markdown context card.

use crate::prompt::Prompt;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Rust,
    TypeScript,
    JavaScript,
    Python,
    Go,
    Java,
    Other,
}

impl Language {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
            "rs" => Language::Rust,
            "ts" | "tsx" | "mts" | "cts" => Language::TypeScript,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "py" => Language::Python,
            "go" => Language::Go,
            "java" => Language::Java,
            _ => Language::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Go => "go",
            Language::Java => "java",
            Language::Other => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub kind: String,
    pub name: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAnalysis {
    /// Path relative to the workspace root, `/`-separated.
    pub relative_path: String,
    pub language: Language,
    pub line_count: usize,
    pub imports: Vec<String>,
    pub symbols: Vec<Symbol>,
    pub todo_count: usize,
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

struct Patterns {
    imports: Regex,
    symbols: Vec<(&'static str, Regex)>,
}

fn patterns(language: Language) -> &'static Patterns {
    static RUST: OnceLock<Patterns> = OnceLock::new();
    static TS: OnceLock<Patterns> = OnceLock::new();
    static PY: OnceLock<Patterns> = OnceLock::new();
    static GO: OnceLock<Patterns> = OnceLock::new();
    static JAVA: OnceLock<Patterns> = OnceLock::new();
    static OTHER: OnceLock<Patterns> = OnceLock::new();

    let re = |s: &str| Regex::new(s).unwrap();
    match language {
        Language::Rust => RUST.get_or_init(|| Patterns {
            imports: re(r"^\s*use\s+([A-Za-z0-9_:]+)"),
            symbols: vec![
                ("fn", re(r"^(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?fn\s+([A-Za-z0-9_]+)")),
                ("struct", re(r"^(?:pub(?:\([^)]*\))?\s+)?struct\s+([A-Za-z0-9_]+)")),
                ("enum", re(r"^(?:pub(?:\([^)]*\))?\s+)?enum\s+([A-Za-z0-9_]+)")),
                ("trait", re(r"^(?:pub(?:\([^)]*\))?\s+)?trait\s+([A-Za-z0-9_]+)")),
            ],
        }),
        Language::TypeScript | Language::JavaScript => TS.get_or_init(|| Patterns {
            imports: re(r#"^\s*import\s.*?from\s+['"]([^'"]+)['"]|require\(\s*['"]([^'"]+)['"]\s*\)"#),
            symbols: vec![
                ("function", re(r"^(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s+([A-Za-z0-9_$]+)")),
                ("class", re(r"^(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+([A-Za-z0-9_$]+)")),
                ("interface", re(r"^(?:export\s+)?interface\s+([A-Za-z0-9_$]+)")),
                ("const", re(r"^export\s+const\s+([A-Za-z0-9_$]+)")),
            ],
        }),
        Language::Python => PY.get_or_init(|| Patterns {
            imports: re(r"^\s*(?:from\s+([A-Za-z0-9_.]+)\s+import|import\s+([A-Za-z0-9_.]+))"),
            symbols: vec![
                ("def", re(r"^(?:async\s+)?def\s+([A-Za-z0-9_]+)")),
                ("class", re(r"^class\s+([A-Za-z0-9_]+)")),
            ],
        }),
        Language::Go => GO.get_or_init(|| Patterns {
            imports: re(r#"^\s*(?:import\s+)?(?:[A-Za-z0-9_]+\s+)?"([^"]+)"\s*$"#),
            symbols: vec![
                ("func", re(r"^func\s+(?:\([^)]*\)\s*)?([A-Za-z0-9_]+)")),
                ("type", re(r"^type\s+([A-Za-z0-9_]+)")),
            ],
        }),
        Language::Java => JAVA.get_or_init(|| Patterns {
            imports: re(r"^\s*import\s+(?:static\s+)?([A-Za-z0-9_.*]+);"),
            symbols: vec![(
                "class",
                re(r"^(?:public\s+|final\s+|abstract\s+)*(?:class|interface|enum|record)\s+([A-Za-z0-9_]+)"),
            )],
        }),
        Language::Other => OTHER.get_or_init(|| Patterns {
            imports: re(r"$^"),
            symbols: vec![],
        }),
    }
}

/// Analyse `content` without any AI involvement.
pub fn analyze(relative_path: &str, content: &str) -> FileAnalysis {
    let language = Language::from_path(Path::new(relative_path));
    let pats = patterns(language);

    let mut imports = Vec::new();
    let mut seen = HashSet::new();
    let mut symbols = Vec::new();
    let mut todo_count = 0;
    let mut line_count = 0;

    for (i, line) in content.lines().enumerate() {
        line_count += 1;
        if line.contains("TODO") || line.contains("FIXME") {
            todo_count += 1;
        }
        if let Some(caps) = pats.imports.captures(line) {
            if let Some(m) = caps.iter().skip(1).flatten().next() {
                let import = m.as_str().to_string();
                if seen.insert(import.clone()) {
                    imports.push(import);
                }
            }
        }
        // Top-level declarations only: indented lines are nested items.
        if line.starts_with(char::is_whitespace) {
            continue;
        }
        for (kind, re) in &pats.symbols {
            if let Some(name) = re.captures(line).and_then(|c| c.get(1)) {
                symbols.push(Symbol {
                    kind: kind.to_string(),
                    name: name.as_str().to_string(),
                    line: i + 1,
                });
                break;
            }
        }
    }

    FileAnalysis {
        relative_path: relative_path.to_string(),
        language,
        line_count,
        imports,
        symbols,
        todo_count,
    }
}

// ---------------------------------------------------------------------------
// Enrichment prompt
// ---------------------------------------------------------------------------

const CARD_SYSTEM_PROMPT: &str = "You write concise context cards for source files. \
Given a file and its structural outline, answer in markdown with at most five bullet points: \
what the file is responsible for, its key collaborators, and anything surprising.";

/// Longest excerpt of the source sent along with the outline.
const MAX_EXCERPT_CHARS: usize = 12_000;

pub fn enrichment_prompt(analysis: &FileAnalysis, content: &str) -> Prompt {
    let outline = analysis
        .symbols
        .iter()
        .map(|s| format!("- {} {} (line {})", s.kind, s.name, s.line))
        .collect::<Vec<_>>()
        .join("\n");
    let excerpt: String = content.chars().take(MAX_EXCERPT_CHARS).collect();
    Prompt::text(
        CARD_SYSTEM_PROMPT,
        format!(
            "File: {}\nLanguage: {}\n\nOutline:\n{}\n\nSource:\n```{}\n{}\n```",
            analysis.relative_path,
            analysis.language.as_str(),
            if outline.is_empty() { "(none)" } else { outline.as_str() },
            analysis.language.as_str(),
            excerpt
        ),
    )
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub fn render_markdown(analysis: &FileAnalysis, summary: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Context Card: `{}`\n\n", analysis.relative_path));
    out.push_str(&format!("- **Language:** {}\n", analysis.language.as_str()));
    out.push_str(&format!("- **Lines:** {}\n", analysis.line_count));
    out.push_str(&format!("- **TODO/FIXME markers:** {}\n", analysis.todo_count));

    if let Some(summary) = summary.map(str::trim).filter(|s| !s.is_empty()) {
        out.push_str("\n## Summary\n\n");
        out.push_str(summary);
        out.push('\n');
    }

    out.push_str("\n## Symbols\n\n");
    if analysis.symbols.is_empty() {
        out.push_str("_No top-level symbols detected._\n");
    } else {
        out.push_str("| Kind | Name | Line |\n|---|---|---|\n");
        for s in &analysis.symbols {
            out.push_str(&format!("| {} | `{}` | {} |\n", s.kind, s.name, s.line));
        }
    }

    out.push_str("\n## Imports\n\n");
    if analysis.imports.is_empty() {
        out.push_str("_None._\n");
    } else {
        for import in &analysis.imports {
            out.push_str(&format!("- `{import}`\n"));
        }
    }
    out
}

/// Card file name for a source: `<basename>.md`, else the sanitised
/// relative path, else that path with a numeric suffix, whichever is first
/// absent from `taken`.
pub fn card_file_name(relative_path: &str, taken: &HashSet<String>) -> String {
    let basename = relative_path.rsplit('/').next().unwrap_or(relative_path);
    let candidate = format!("{basename}.md");
    if !taken.contains(&candidate) {
        return candidate;
    }
    let flattened: String = relative_path
        .chars()
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .collect();
    let candidate = format!("{flattened}.md");
    if !taken.contains(&candidate) {
        return candidate;
    }
    (2..)
        .map(|n| format!("{flattened}-{n}.md"))
        .find(|name| !taken.contains(name))
        .unwrap_or(candidate)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const RUST_SRC: &str = "use std::path::Path;\nuse crate::io;\n\npub struct Store {\n    root: String,\n}\n\nimpl Store {\n    pub fn open() {}\n}\n\npub async fn load() {}\n// TODO: cache\nfn helper() {}\n";

    #[test]
    fn analyzes_rust_source() {
        let a = analyze("src/store.rs", RUST_SRC);
        assert_eq!(a.language, Language::Rust);
        assert_eq!(a.line_count, 14);
        assert_eq!(a.imports, vec!["std::path::Path", "crate::io"]);
        let names: Vec<_> = a.symbols.iter().map(|s| s.name.as_str()).collect();
        // `open` is indented inside the impl and is not top-level.
        assert_eq!(names, vec!["Store", "load", "helper"]);
        assert_eq!(a.symbols[0].kind, "struct");
        assert_eq!(a.symbols[0].line, 4);
        assert_eq!(a.todo_count, 1);
    }

    #[test]
    fn analyzes_typescript_source() {
        let src = "import { x } from './x';\nconst y = require('y');\nexport class Panel {}\nexport async function activate() {}\nexport const VERSION = 1;\n";
        let a = analyze("src/extension.ts", src);
        assert_eq!(a.language, Language::TypeScript);
        assert_eq!(a.imports, vec!["./x", "y"]);
        let kinds: Vec<_> = a.symbols.iter().map(|s| s.kind.as_str()).collect();
        assert_eq!(kinds, vec!["class", "function", "const"]);
    }

    #[test]
    fn analyzes_python_source() {
        let src = "from os import path\nimport json\n\nclass Loader:\n    def load(self):\n        pass\n\ndef main():\n    pass\n";
        let a = analyze("tool/loader.py", src);
        assert_eq!(a.imports, vec!["os", "json"]);
        assert_eq!(a.symbols.len(), 2);
        assert_eq!(a.symbols[1].name, "main");
    }

    #[test]
    fn unknown_language_still_counts_lines() {
        let a = analyze("notes.txt", "a\nb\nc");
        assert_eq!(a.language, Language::Other);
        assert_eq!(a.line_count, 3);
        assert!(a.symbols.is_empty());
        assert!(a.imports.is_empty());
    }

    #[test]
    fn render_includes_summary_and_tables() {
        let a = analyze("src/store.rs", RUST_SRC);
        let md = render_markdown(&a, Some("- owns persistence"));
        assert!(md.starts_with("# Context Card: `src/store.rs`"));
        assert!(md.contains("## Summary\n\n- owns persistence"));
        assert!(md.contains("| struct | `Store` | 4 |"));
        assert!(md.contains("- `crate::io`"));

        let bare = render_markdown(&a, None);
        assert!(!bare.contains("## Summary"));
    }

    #[test]
    fn card_names_disambiguate_collisions() {
        let mut taken = HashSet::new();
        let first = card_file_name("src/a/mod.rs", &taken);
        assert_eq!(first, "mod.rs.md");
        taken.insert(first);
        assert_eq!(card_file_name("src/b/mod.rs", &taken), "src-b-mod.rs.md");
    }

    #[test]
    fn flattened_name_collision_gets_numeric_suffix() {
        let mut taken = HashSet::new();
        let names: Vec<String> = ["api/mod.rs", "db-mod.rs", "db/mod.rs"]
            .iter()
            .map(|rel| {
                let name = card_file_name(rel, &taken);
                taken.insert(name.clone());
                name
            })
            .collect();
        assert_eq!(names, vec!["mod.rs.md", "db-mod.rs.md", "db-mod.rs-2.md"]);

        taken.insert("db-mod.rs-2.md".to_string());
        assert_eq!(card_file_name("db/mod.rs", &taken), "db-mod.rs-3.md");
    }

    #[test]
    fn enrichment_prompt_truncates_source() {
        let a = analyze("big.rs", "");
        let big = "x".repeat(MAX_EXCERPT_CHARS + 500);
        let p = enrichment_prompt(&a, &big);
        assert!(!p.json);
        assert!(p.user.len() < MAX_EXCERPT_CHARS + 200);
        assert!(p.user.contains("(none)"));
    }
}

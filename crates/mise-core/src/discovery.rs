use crate::config::ContextCardConfig;
use crate::error::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

const ALWAYS_SKIPPED: &[&str] = &["target", "node_modules", ".git", ".mise"];

/// A source file selected for context-card generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// `/`-separated path relative to the workspace root.
    pub relative_path: String,
}

/// Walk `root` honouring `.gitignore`, returning files with a configured
/// extension sorted by relative path and capped at `max_files`.
///
/// `output_root` is skipped so generated cards are never fed back in.
pub fn discover_sources(
    root: &Path,
    output_root: &Path,
    config: &ContextCardConfig,
) -> Result<Vec<SourceFile>> {
    let output_root = output_root.to_path_buf();
    let excluded: Vec<String> = config.exclude.clone();

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_exclude(true)
        .require_git(false)
        .filter_entry(move |entry| {
            let path = entry.path();
            if path == output_root {
                return false;
            }
            let name = entry.file_name().to_string_lossy();
            if entry.file_type().is_some_and(|t| t.is_dir())
                && (ALWAYS_SKIPPED.contains(&name.as_ref())
                    || excluded.iter().any(|e| e == name.as_ref()))
            {
                return false;
            }
            true
        })
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            // Unreadable directories are skipped rather than failing the batch.
            Err(_) => continue,
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !config.extensions.iter().any(|e| e == ext) {
            continue;
        }
        if let Ok(meta) = entry.metadata() {
            if meta.len() > config.max_file_bytes {
                continue;
            }
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        let relative_path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        files.push(SourceFile {
            path: path.to_path_buf(),
            relative_path,
        });
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    files.truncate(config.max_files);
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let p = root.join(rel);
        std::fs::create_dir_all(p.parent().unwrap()).unwrap();
        std::fs::write(p, content).unwrap();
    }

    fn rels(files: &[SourceFile]) -> Vec<&str> {
        files.iter().map(|f| f.relative_path.as_str()).collect()
    }

    #[test]
    fn finds_configured_extensions_sorted() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/b.rs", "fn b() {}");
        write(dir.path(), "src/a.ts", "export const a = 1;");
        write(dir.path(), "README.md", "# readme");
        let files = discover_sources(
            dir.path(),
            &dir.path().join("mise-en-place-output"),
            &ContextCardConfig::default(),
        )
        .unwrap();
        assert_eq!(rels(&files), vec!["src/a.ts", "src/b.rs"]);
    }

    #[test]
    fn skips_output_dir_build_dirs_and_gitignored() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/lib.rs", "");
        write(dir.path(), "mise-en-place-output/context-cards/x.rs", "");
        write(dir.path(), "target/debug/build.rs", "");
        write(dir.path(), "node_modules/pkg/index.js", "");
        write(dir.path(), "generated/out.rs", "");
        write(dir.path(), ".gitignore", "generated/\n");
        let files = discover_sources(
            dir.path(),
            &dir.path().join("mise-en-place-output"),
            &ContextCardConfig::default(),
        )
        .unwrap();
        assert_eq!(rels(&files), vec!["src/lib.rs"]);
    }

    #[test]
    fn honours_exclude_cap_and_size_limit() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.rs", "");
        write(dir.path(), "b.rs", "");
        write(dir.path(), "c.rs", "");
        write(dir.path(), "vendor/v.rs", "");
        write(dir.path(), "big.rs", &"x".repeat(64));
        let config = ContextCardConfig {
            exclude: vec!["vendor".into()],
            max_files: 2,
            max_file_bytes: 32,
            ..ContextCardConfig::default()
        };
        let files =
            discover_sources(dir.path(), &dir.path().join("out"), &config).unwrap();
        assert_eq!(rels(&files), vec!["a.rs", "b.rs"]);
    }
}

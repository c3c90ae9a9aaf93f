use crate::output::{print_json, print_table};
use anyhow::{Context, Result};
use mise_core::config::Config;
use mise_core::manifest::{self, ManifestEntry};
use std::path::Path;

/// Print the artifact ledger.
pub fn run(root: &Path, json: bool) -> Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let loaded = manifest::load(&config.output_root(root));

    if let Some(reason) = &loaded.recovered_from {
        eprintln!("warning: manifest is unreadable ({reason}); showing no entries");
    }

    if json {
        return print_json(&loaded.manifest);
    }

    if loaded.manifest.artifacts.is_empty() {
        println!("No artifacts recorded.");
        return Ok(());
    }

    let rows = loaded
        .manifest
        .artifacts
        .iter()
        .map(|entry| {
            vec![
                entry.artifact_type.clone(),
                entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                describe(entry),
            ]
        })
        .collect();
    print_table(&["TYPE", "RECORDED", "ARTIFACT"], rows);
    Ok(())
}

fn describe(entry: &ManifestEntry) -> String {
    ["path", "markdownPath", "title"]
        .iter()
        .find_map(|k| entry.fields.get(*k).and_then(|v| v.as_str()))
        .unwrap_or("-")
        .to_string()
}

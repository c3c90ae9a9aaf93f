#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

const KEY: &str = "sk-live-abcdefghijklmnop";

fn mise(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mise").unwrap();
    cmd.current_dir(dir.path())
        .env("MISE_ROOT", dir.path())
        .env("MISE_CREDENTIALS", credentials(dir))
        .env_remove("RUST_LOG");
    cmd
}

fn credentials(dir: &TempDir) -> PathBuf {
    dir.path().join(".mise-test-credentials.yaml")
}

fn output(dir: &TempDir) -> PathBuf {
    dir.path().join("mise-en-place-output")
}

// ---------------------------------------------------------------------------
// mise key
// ---------------------------------------------------------------------------

#[test]
fn key_status_without_key() {
    let dir = TempDir::new().unwrap();
    mise(&dir)
        .args(["key", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("API key: not set"));
}

#[test]
fn key_set_shows_only_a_masked_hint() {
    let dir = TempDir::new().unwrap();
    mise(&dir)
        .args(["key", "set", KEY])
        .assert()
        .success()
        .stdout(predicate::str::contains("API key saved."))
        .stdout(predicate::str::contains("sk-…mnop"))
        .stdout(predicate::str::contains(KEY).not());

    assert!(credentials(&dir).is_file());

    mise(&dir)
        .args(["key", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("API key: set (sk-…mnop)"));
}

#[test]
fn key_set_reads_stdin() {
    let dir = TempDir::new().unwrap();
    mise(&dir)
        .args(["key", "set"])
        .write_stdin(format!("{KEY}\n"))
        .assert()
        .success();
    mise(&dir)
        .args(["key", "status"])
        .assert()
        .stdout(predicate::str::contains("sk-…mnop"));
}

#[test]
fn key_clear_removes_key() {
    let dir = TempDir::new().unwrap();
    mise(&dir).args(["key", "set", KEY]).assert().success();
    mise(&dir)
        .args(["key", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("API key: not set"));
}

#[test]
fn key_status_json_is_one_message_per_line() {
    let dir = TempDir::new().unwrap();
    let out = mise(&dir)
        .args(["--json", "key", "status"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let line = String::from_utf8(out).unwrap();
    let msg: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(msg["command"], "apiKeyStatus");
    assert_eq!(msg["present"], false);
}

// ---------------------------------------------------------------------------
// mise prd / diagram preconditions
// ---------------------------------------------------------------------------

#[test]
fn prd_without_key_fails_before_writing() {
    let dir = TempDir::new().unwrap();
    mise(&dir)
        .args(["prd", "a", "todo", "app"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key"));
    assert!(!output(&dir).exists());
}

#[test]
fn diagram_without_prd_fails() {
    let dir = TempDir::new().unwrap();
    mise(&dir).args(["key", "set", KEY]).assert().success();
    mise(&dir)
        .args(["diagram", "data-flow"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No PRD found. Generate a PRD first."));
    assert!(!output(&dir).join("diagrams").exists());
}

// ---------------------------------------------------------------------------
// mise cards
// ---------------------------------------------------------------------------

#[test]
fn cards_without_key_use_local_analysis() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("src")).unwrap();
    std::fs::write(
        dir.path().join("src/lib.rs"),
        "use std::fmt;\n\npub fn greet() {}\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("README.md"), "# not source\n").unwrap();

    mise(&dir)
        .arg("cards")
        .assert()
        .success()
        .stdout(predicate::str::contains("Context cards: 1 generated, 0 failed"));

    let card = std::fs::read_to_string(output(&dir).join("context-cards/lib.rs.md")).unwrap();
    assert!(card.contains("greet"));

    mise(&dir)
        .arg("manifest")
        .assert()
        .success()
        .stdout(predicate::str::contains("context-card"));
}

#[test]
fn cards_in_empty_workspace_report_nothing_found() {
    let dir = TempDir::new().unwrap();
    mise(&dir)
        .arg("cards")
        .assert()
        .success()
        .stdout(predicate::str::contains("No source files found"));
}

// ---------------------------------------------------------------------------
// mise view / manifest
// ---------------------------------------------------------------------------

#[test]
fn view_prints_the_only_prd() {
    let dir = TempDir::new().unwrap();
    let prd = output(&dir).join("prd/my-idea.md");
    std::fs::create_dir_all(prd.parent().unwrap()).unwrap();
    std::fs::write(&prd, "# My Idea\n").unwrap();

    mise(&dir)
        .args(["view", "prd"])
        .assert()
        .success()
        .stdout(predicate::str::contains("my-idea.md"));
}

#[test]
fn view_with_nothing_generated_is_informational() {
    let dir = TempDir::new().unwrap();
    mise(&dir)
        .args(["view", "component-hierarchy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No component hierarchy found"));
}

#[test]
fn view_missing_explicit_file_fails() {
    let dir = TempDir::new().unwrap();
    mise(&dir)
        .args(["view", "graph", "--file", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.json"));
}

#[test]
fn manifest_empty() {
    let dir = TempDir::new().unwrap();
    mise(&dir)
        .arg("manifest")
        .assert()
        .success()
        .stdout(predicate::str::contains("No artifacts recorded."));
}

// ---------------------------------------------------------------------------
// mise config
// ---------------------------------------------------------------------------

#[test]
fn config_show_prints_defaults() {
    let dir = TempDir::new().unwrap();
    mise(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("output_dir: mise-en-place-output"))
        .stdout(predicate::str::contains("gpt-4o-mini"));
}

#[test]
fn config_validate_defaults_are_clean() {
    let dir = TempDir::new().unwrap();
    mise(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid. No warnings."));
}

#[test]
fn config_validate_rejects_bad_api_base() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join(".mise")).unwrap();
    std::fs::write(
        dir.path().join(".mise/config.yaml"),
        "ai:\n  api_base: api.openai.com\n",
    )
    .unwrap();
    mise(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error]"));
}

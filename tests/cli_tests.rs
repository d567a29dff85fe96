//! Binary tests: argument handling, config errors and a full run

mod common;

use assert_cmd::Command;
use common::{files_under, write_fixture};
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn write_config(path: &Path, source: &Path, destinations: &[&Path], replace: &str) {
    let mut yaml = format!(
        "game-saves:\n  name: Game saves\n  source: {}\n  destinations:\n",
        source.display()
    );
    for destination in destinations {
        yaml.push_str(&format!("    - {}\n", destination.display()));
    }
    yaml.push_str(&format!("  replace: {replace}\n"));
    std::fs::write(path, yaml).unwrap();
}

#[test]
fn test_help() {
    let mut cmd = Command::cargo_bin("multicopy").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--operation"))
        .stdout(predicate::str::contains("--pause"));
}

#[test]
fn test_version() {
    let mut cmd = Command::cargo_bin("multicopy").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("multicopy"));
}

#[test]
fn test_operation_is_required() {
    let mut cmd = Command::cargo_bin("multicopy").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--operation"));
}

#[test]
fn test_missing_config_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("multicopy").unwrap();
    cmd.current_dir(temp_dir.path())
        .args(["--operation", "game-saves"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_unknown_operation_fails() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("src");
    std::fs::create_dir(&source).unwrap();
    let config = temp_dir.path().join("multicopy-config.yml");
    write_config(&config, &source, &[&temp_dir.path().join("dst")], "skip");

    let mut cmd = Command::cargo_bin("multicopy").unwrap();
    cmd.current_dir(temp_dir.path())
        .args(["--operation", "photos"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"photos\" is not defined"));
}

#[test]
fn test_missing_source_fails() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("custom.yml");
    write_config(
        &config,
        &temp_dir.path().join("nope"),
        &[&temp_dir.path().join("dst")],
        "skip",
    );

    let mut cmd = Command::cargo_bin("multicopy").unwrap();
    cmd.args(["-o", "game-saves", "-c"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("source path does not exist"));
}

#[test]
fn test_bad_replace_value_fails() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("src");
    std::fs::create_dir(&source).unwrap();
    let config = temp_dir.path().join("custom.yml");
    write_config(&config, &source, &[&temp_dir.path().join("dst")], "sometimes");

    let mut cmd = Command::cargo_bin("multicopy").unwrap();
    cmd.args(["-o", "game-saves", "-c"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("sometimes"));
}

#[test]
fn test_full_run_from_config_directory() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("f").join("saves");
    write_fixture(&source);
    let dest_a = temp_dir.path().join("g").join("saves");
    let dest_b = temp_dir.path().join("h").join("saves");
    std::fs::create_dir(temp_dir.path().join("config")).unwrap();
    write_config(
        &temp_dir.path().join("config").join("multicopy-config.yaml"),
        &source,
        &[&dest_a, &dest_b],
        "skip",
    );

    let mut cmd = Command::cargo_bin("multicopy").unwrap();
    cmd.current_dir(temp_dir.path())
        .args(["--operation", "GAME-SAVES"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Source files discovered: 3"))
        .stdout(predicate::str::contains("Files copied: 6"))
        .stdout(predicate::str::contains("Bytes copied: 207,280"));

    assert_eq!(files_under(&dest_a), files_under(&source));
    assert_eq!(files_under(&dest_b), files_under(&source));

    // Second run finds everything identical
    let mut cmd = Command::cargo_bin("multicopy").unwrap();
    cmd.current_dir(temp_dir.path())
        .args(["--operation", "game-saves", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_pause_waits_for_enter() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("src");
    write_fixture(&source);
    let config = temp_dir.path().join("custom.yml");
    write_config(&config, &source, &[&temp_dir.path().join("dst")], "always");

    let mut cmd = Command::cargo_bin("multicopy").unwrap();
    cmd.args(["-o", "game-saves", "--pause", "-c"])
        .arg(&config)
        .write_stdin("\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Press enter to continue"));
}

//! End-to-end tests for `intone config`

use predicates::prelude::*;
use tempfile::TempDir;

use intone::Config;

use crate::helpers::{intone_cmd, write_file};

#[test]
fn config_init_writes_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("intone").join("config.toml");

    intone_cmd()
        .args(["config", "init", "--path"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default config"));

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, Config::default());
}

#[test]
fn config_init_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "config.toml", "[recording]\noverlap_frames = 1\n");

    intone_cmd()
        .args(["config", "init", "--path"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    intone_cmd()
        .args(["config", "init", "--force", "--path"])
        .arg(&path)
        .assert()
        .success();
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("overlap_frames = 2500"));
}

#[test]
fn config_show_reads_given_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "config.toml", "[candidates]\ncolour = \"Purple\"\n");

    intone_cmd()
        .args(["config", "show", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("colour = \"Purple\""))
        .stdout(predicate::str::contains("step_size = 256"));
}

#[test]
fn config_show_rejects_invalid_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "config.toml", "[engine.grid]\nsize = 0\n");

    intone_cmd()
        .args(["config", "show", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid config"));
}

#[test]
fn config_path_is_under_home() {
    let dir = TempDir::new().unwrap();
    intone_cmd()
        .args(["config", "path"])
        .env("HOME", dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(".config"))
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn help_lists_commands() {
    intone_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("replay"))
        .stdout(predicate::str::contains("config"));
}

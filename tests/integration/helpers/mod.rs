//! Shared helpers for integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;

/// The intone binary with logging switched off.
pub fn intone_cmd() -> Command {
    let mut cmd = Command::cargo_bin("intone").unwrap();
    cmd.env_remove("INTONE_LOG");
    cmd
}

/// Write `contents` to `name` inside `dir`.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Parse the JSON a replay run printed.
pub fn report(stdout: &[u8]) -> serde_json::Value {
    serde_json::from_slice(stdout).unwrap()
}

/// Script with a flat 220 Hz pitch track and two candidates.
pub const BASIC_SCRIPT: &str = r#"
frames = 8192
pitch_fill = 220.0

[engine]
candidates = [330.0, 110.0]

[[steps]]
action = "reanalyse"
start = 2048
end = 4096

[[steps]]
action = "switch"
start = 2048
end = 4096
"#;

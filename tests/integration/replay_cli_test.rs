//! End-to-end tests for `intone replay`

use predicates::prelude::*;
use tempfile::TempDir;

use crate::helpers::{intone_cmd, report, write_file, BASIC_SCRIPT};

fn replay(dir: &TempDir, script: &str) -> serde_json::Value {
    let path = write_file(dir.path(), "session.toml", script);
    let output = intone_cmd()
        .arg("replay")
        .arg(&path)
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .output()
        .unwrap();
    assert!(output.status.success(), "replay failed: {:?}", output);
    report(&output.stdout)
}

#[test]
fn replay_splices_first_candidate() {
    let dir = TempDir::new().unwrap();
    let report = replay(&dir, BASIC_SCRIPT);

    assert_eq!(report["state"], "candidates-ready");
    assert_eq!(report["candidates"], 2);
    assert_eq!(report["current_candidate"], 0);
    assert_eq!(report["active_selection"]["start_frame"], 2048);

    let pitch = report["pitch"].as_array().unwrap();
    assert_eq!(pitch.len(), 32);
    for event in pitch {
        let frame = event["frame"].as_i64().unwrap();
        let expected = if (2048..4096).contains(&frame) { 330.0 } else { 220.0 };
        assert_eq!(event["value"].as_f64(), Some(expected));
    }
    let history: Vec<_> = report["history"].as_array().unwrap().iter().collect();
    assert_eq!(history.last().unwrap().as_str(), Some("Switch Pitch Candidate"));
}

#[test]
fn replay_abandon_restores_pitch() {
    let dir = TempDir::new().unwrap();
    let script = format!(
        "{}\n{}",
        BASIC_SCRIPT,
        r#"
[[steps]]
action = "switch"
start = 2048
end = 4096
up = false

[[steps]]
action = "abandon"
start = 2048
end = 4096
"#
    );
    let report = replay(&dir, &script);

    assert_eq!(report["state"], "idle");
    assert_eq!(report["candidates"], 0);
    assert!(report["pitch"]
        .as_array()
        .unwrap()
        .iter()
        .all(|e| e["value"].as_f64() == Some(220.0)));
}

#[test]
fn replay_reports_missing_plugin_per_step() {
    let dir = TempDir::new().unwrap();
    let report = replay(
        &dir,
        r#"
frames = 8192

[engine]
missing = ["vamp:chp:constrainedharmonicpeak:peak"]

[[steps]]
action = "reanalyse"
start = 2048
end = 4096
min_freq = 100.0
max_freq = 400.0
"#,
    );

    let error = report["steps"][0]["error"].as_str().unwrap();
    assert!(error.contains("vamp:chp:constrainedharmonicpeak:peak"));
    assert!(error.contains("CHP"));
    assert_eq!(report["state"], "idle");
}

#[test]
fn replay_analyses_recording_tail() {
    let dir = TempDir::new().unwrap();
    let report = replay(
        &dir,
        r#"
frames = 20000

[engine]
recording_pitch = 300.0
recording_note_frames = 4096

[[steps]]
action = "record-to-end"
frames = 10000
"#,
    );

    assert_eq!(report["analysed_frames"], 10000);
    assert_eq!(report["pitch"].as_array().unwrap().len(), 40);
    let notes = report["notes"].as_array().unwrap();
    assert_eq!(notes.len(), 3);
    assert_eq!(notes[2]["frame"], 8192);
    assert_eq!(notes[2]["duration"], 1808);
    assert!(report["history"]
        .as_array()
        .unwrap()
        .iter()
        .any(|h| h == "Analyse Recording"));
}

#[test]
fn replay_pretty_prints() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "session.toml", BASIC_SCRIPT);
    intone_cmd()
        .arg("replay")
        .arg(&path)
        .arg("--pretty")
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\n  \"state\": \"candidates-ready\""));
}

#[test]
fn replay_missing_script_fails() {
    let dir = TempDir::new().unwrap();
    intone_cmd()
        .arg("replay")
        .arg(dir.path().join("nope.toml"))
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read script"));
}

#[test]
fn replay_rejects_unknown_action() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        dir.path(),
        "session.toml",
        "frames = 10\n[[steps]]\naction = \"explode\"\n",
    );
    intone_cmd()
        .arg("replay")
        .arg(&path)
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid script"));
}

#[test]
fn replay_uses_given_config() {
    let dir = TempDir::new().unwrap();
    let config = write_file(dir.path(), "config.toml", "[engine]\nstep_size = 512\n");
    let path = write_file(dir.path(), "session.toml", BASIC_SCRIPT);

    let output = intone_cmd()
        .arg("replay")
        .arg(&path)
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success());
    // Initial pitch is laid out on the configured hop
    assert_eq!(report(&output.stdout)["pitch"].as_array().unwrap().len(), 16);
}

//! Unit tests for config module

use intone::Config;
use tempfile::TempDir;

#[test]
fn default_config_has_expected_values() {
    let config = Config::default();
    assert_eq!(config.engine.step_size, 256);
    assert_eq!(config.engine.block_size, 2048);
    assert_eq!(config.engine.constrained_block_size, 4096);
    assert_eq!(config.engine.grid.size, 256);
    assert_eq!(config.engine.grid.unconstrained_lag_hops, 4);
    assert_eq!(config.engine.grid.constrained_tail_hops, 9);
    assert_eq!(config.recording.overlap_frames, 2500);
    assert_eq!(config.candidates.colour, "Bright Orange");
    // Analysis settings defaults
    assert!(!config.analysis.precision_analysis);
    assert!(config.analysis.lowamp_analysis);
    assert!(config.analysis.onset_analysis);
    assert!(config.analysis.prune_analysis);
}

#[test]
fn default_transforms_name_their_plugins() {
    let engine = Config::default().engine;
    assert_eq!(engine.notes_transform.id, "vamp:pyin:pyin:notes");
    assert_eq!(engine.candidates_transform.plugin, "pYIN");
    assert_eq!(
        engine.constrained_transform.id,
        "vamp:chp:constrainedharmonicpeak:peak"
    );
    assert_eq!(engine.constrained_transform.plugin, "CHP");
}

#[test]
fn config_serialization_roundtrip() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).unwrap();
    let parsed: Config = toml::from_str(&toml_str).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn partial_toml_keeps_other_defaults() {
    let toml_str = r#"
[analysis]
precision_analysis = true

[engine.grid]
size = 512
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert!(config.analysis.precision_analysis);
    assert!(config.analysis.prune_analysis);
    assert_eq!(config.engine.grid.size, 512);
    assert_eq!(config.engine.grid.unconstrained_lag_hops, 4);
    assert_eq!(config.engine.step_size, 256);
}

#[test]
fn validate_rejects_zero_grid() {
    let mut config = Config::default();
    config.engine.grid.size = 0;
    let err = config.validate().unwrap_err();
    assert!(err.contains("grid.size"));
}

#[test]
fn validate_rejects_negative_overlap() {
    let mut config = Config::default();
    config.recording.overlap_frames = -1;
    assert!(config.validate().is_err());
}

#[test]
fn validate_rejects_blank_transform() {
    let mut config = Config::default();
    config.engine.pitch_transform.id = "  ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn analysis_parameters_follow_flags() {
    let mut config = Config::default();
    let params = config.analysis.parameters();
    assert_eq!(params["precisetime"], 0.0);
    assert_eq!(params["lowampsuppression"], 0.2);

    config.analysis.lowamp_analysis = false;
    config.analysis.precision_analysis = true;
    let params = config.analysis.parameters();
    assert_eq!(params["precisetime"], 1.0);
    assert_eq!(params["lowampsuppression"], 0.0);
}

#[test]
fn load_from_missing_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let config = Config::load_from(&dir.path().join("missing.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn save_to_then_load_from() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.recording.overlap_frames = 4096;
    config.candidates.colour = "Purple".to_string();
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn load_from_reports_invalid_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[engine]\nstep_size = 0\n").unwrap();

    let err = Config::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("Invalid config"));
}

#[test]
fn load_from_reports_parse_errors() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[engine\n").unwrap();

    let err = Config::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

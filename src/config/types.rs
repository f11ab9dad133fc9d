//! Configuration type definitions and defaults

use serde::{Deserialize, Serialize};

use super::analysis::AnalysisSettings;
use crate::document::TrackStyle;
use crate::engine::TransformSpec;
use crate::timeline::GridConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub candidates: CandidateConfig,
}

impl Config {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        self.engine.validate()?;
        if self.recording.overlap_frames < 0 {
            return Err(format!(
                "recording.overlap_frames {} must not be negative",
                self.recording.overlap_frames
            ));
        }
        Ok(())
    }
}

/// Analysis engine constants and transform ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_step_size")]
    pub step_size: u32,
    #[serde(default = "default_block_size")]
    pub block_size: u32,
    /// Block size for frequency-constrained re-analysis
    #[serde(default = "default_constrained_block_size")]
    pub constrained_block_size: u32,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default = "default_pitch_transform")]
    pub pitch_transform: TransformSpec,
    #[serde(default = "default_notes_transform")]
    pub notes_transform: TransformSpec,
    #[serde(default = "default_candidates_transform")]
    pub candidates_transform: TransformSpec,
    #[serde(default = "default_constrained_transform")]
    pub constrained_transform: TransformSpec,
}

pub fn default_step_size() -> u32 {
    256
}

pub fn default_block_size() -> u32 {
    2048
}

pub fn default_constrained_block_size() -> u32 {
    4096
}

pub fn default_pitch_transform() -> TransformSpec {
    TransformSpec::new("vamp:pyin:pyin:smoothedpitchtrack", "pYIN")
}

pub fn default_notes_transform() -> TransformSpec {
    TransformSpec::new("vamp:pyin:pyin:notes", "pYIN")
}

pub fn default_candidates_transform() -> TransformSpec {
    TransformSpec::new("vamp:pyin:localcandidatepyin:pitchtrackcandidates", "pYIN")
}

pub fn default_constrained_transform() -> TransformSpec {
    TransformSpec::new("vamp:chp:constrainedharmonicpeak:peak", "CHP")
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step_size: default_step_size(),
            block_size: default_block_size(),
            constrained_block_size: default_constrained_block_size(),
            grid: GridConfig::default(),
            pitch_transform: default_pitch_transform(),
            notes_transform: default_notes_transform(),
            candidates_transform: default_candidates_transform(),
            constrained_transform: default_constrained_transform(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.step_size == 0 {
            return Err("engine.step_size must be > 0".to_string());
        }
        if self.block_size == 0 || self.constrained_block_size == 0 {
            return Err("engine block sizes must be > 0".to_string());
        }
        if self.grid.size <= 0 {
            return Err(format!("engine.grid.size {} must be > 0", self.grid.size));
        }
        if self.grid.unconstrained_lag_hops < 0 || self.grid.constrained_tail_hops < 0 {
            return Err("engine.grid hop offsets must not be negative".to_string());
        }
        for spec in [
            &self.pitch_transform,
            &self.notes_transform,
            &self.candidates_transform,
            &self.constrained_transform,
        ] {
            if spec.id.trim().is_empty() {
                return Err("engine transform ids must not be empty".to_string());
            }
        }
        Ok(())
    }
}

/// Recording-extension analysis settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Frames re-analysed before the previous end to catch note attacks
    #[serde(default = "default_overlap_frames")]
    pub overlap_frames: i64,
}

pub fn default_overlap_frames() -> i64 {
    2500
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            overlap_frames: default_overlap_frames(),
        }
    }
}

/// How candidate tracks are presented
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateConfig {
    #[serde(default = "default_candidate_colour")]
    pub colour: String,
    #[serde(default = "default_presentation_name")]
    pub presentation_name: String,
}

pub fn default_candidate_colour() -> String {
    "Bright Orange".to_string()
}

pub fn default_presentation_name() -> String {
    "candidate".to_string()
}

impl Default for CandidateConfig {
    fn default() -> Self {
        Self {
            colour: default_candidate_colour(),
            presentation_name: default_presentation_name(),
        }
    }
}

impl CandidateConfig {
    /// Style applied to candidate tracks; candidates are never sonified.
    pub fn style(&self) -> TrackStyle {
        TrackStyle {
            colour: self.colour.clone(),
            presentation_name: Some(self.presentation_name.clone()),
            audible: false,
        }
    }
}

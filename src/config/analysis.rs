//! Analysis behaviour settings.
//!
//! These map onto pYIN's tuning parameters for the main pitch-track and
//! note analyses. Re-analysis of a region does not use them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Switches affecting pitch-track and note extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Favour precise note timing over robustness
    #[serde(default)]
    pub precision_analysis: bool,
    /// Suppress low-amplitude pitch estimates
    #[serde(default = "default_true")]
    pub lowamp_analysis: bool,
    /// Increase onset sensitivity for note segmentation
    #[serde(default = "default_true")]
    pub onset_analysis: bool,
    /// Prune very short notes
    #[serde(default = "default_true")]
    pub prune_analysis: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            precision_analysis: false,
            lowamp_analysis: true,
            onset_analysis: true,
            prune_analysis: true,
        }
    }
}

impl AnalysisSettings {
    /// Plugin parameter values for these settings.
    pub fn parameters(&self) -> BTreeMap<String, f32> {
        let pick = |on: bool, value: f32| if on { value } else { 0.0 };
        BTreeMap::from([
            (
                "precisetime".to_string(),
                pick(self.precision_analysis, 1.0),
            ),
            (
                "lowampsuppression".to_string(),
                pick(self.lowamp_analysis, 0.2),
            ),
            (
                "onsetsensitivity".to_string(),
                pick(self.onset_analysis, 0.7),
            ),
            ("prunethresh".to_string(), pick(self.prune_analysis, 0.1)),
        ])
    }
}

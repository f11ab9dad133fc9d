//! Alignment of re-analysis requests to the engine's hop grid.
//!
//! The pitch engines run with a fixed step size and report timestamps that
//! lag the audio by a few hops. Requests are snapped to that grid so the
//! candidate frames line up with the frames of the original extraction:
//!
//! ```text
//! start = floor(sel.start / grid) * grid, rounded up if below sel.start
//! end   = floor(sel.end / grid) * grid,   rounded up if below sel.end
//! unconstrained: start -= lag * grid; end -= lag * grid
//! constrained:   end   -= tail * grid
//! ```
//!
//! The hop offsets are tuned against pYIN and the constrained harmonic
//! peak plugin. A different engine needs them revalidated, so they live in
//! [`GridConfig`] rather than as literals.

use serde::{Deserialize, Serialize};

use super::{FrequencyRange, Selection};

/// Grid size and per-engine timestamp corrections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Hop size of the engine in frames
    #[serde(default = "default_grid_size")]
    pub size: i64,
    /// Hops both edges move back by for unconstrained analysis
    #[serde(default = "default_unconstrained_lag_hops")]
    pub unconstrained_lag_hops: i64,
    /// Hops the trailing edge moves back by for constrained analysis
    #[serde(default = "default_constrained_tail_hops")]
    pub constrained_tail_hops: i64,
}

pub fn default_grid_size() -> i64 {
    256
}

pub fn default_unconstrained_lag_hops() -> i64 {
    4
}

pub fn default_constrained_tail_hops() -> i64 {
    9
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: default_grid_size(),
            unconstrained_lag_hops: default_unconstrained_lag_hops(),
            constrained_tail_hops: default_constrained_tail_hops(),
        }
    }
}

impl GridConfig {
    /// Snap a frame up to the next grid boundary (identity on a boundary).
    fn ceil_to_grid(&self, frame: i64) -> i64 {
        let mut snapped = frame.div_euclid(self.size) * self.size;
        if snapped < frame {
            snapped += self.size;
        }
        snapped
    }

    /// Compute the analysis window for a selection.
    pub fn align(&self, sel: Selection, range: FrequencyRange) -> AnalysisWindow {
        let mut start = self.ceil_to_grid(sel.start_frame());
        let mut end = self.ceil_to_grid(sel.end_frame());

        if range.is_constrained() {
            end -= self.constrained_tail_hops * self.size;
        } else {
            start -= self.unconstrained_lag_hops * self.size;
            end -= self.unconstrained_lag_hops * self.size;
        }

        AnalysisWindow { start, end }
    }
}

/// Grid-aligned frame window handed to the engine.
///
/// Unlike [`Selection`] this may be inverted or start before frame 0;
/// callers check [`AnalysisWindow::duration_secs`] before submitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    pub start: i64,
    pub end: i64,
}

impl AnalysisWindow {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Length in frames (may be zero or negative).
    pub fn frames(&self) -> i64 {
        self.end - self.start
    }

    pub fn start_secs(&self, sample_rate: u32) -> f64 {
        frames_to_secs(self.start, sample_rate)
    }

    /// Wall-clock duration at the given sample rate.
    pub fn duration_secs(&self, sample_rate: u32) -> f64 {
        frames_to_secs(self.frames(), sample_rate)
    }

    /// Whether the engine has anything to analyse.
    pub fn has_duration(&self, sample_rate: u32) -> bool {
        self.duration_secs(sample_rate) > 0.0
    }
}

fn frames_to_secs(frames: i64, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    frames as f64 / sample_rate as f64
}

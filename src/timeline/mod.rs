//! Timeline value types.
//!
//! - [`Selection`] - half-open frame range over the recording
//! - [`FrequencyRange`] - optional frequency constraint for re-analysis
//! - [`window`] - snapping selections onto the analysis engine's hop grid

pub mod window;

pub use window::{AnalysisWindow, GridConfig};

use serde::{Deserialize, Serialize};

/// Half-open range of audio frames `[start_frame, end_frame)`.
///
/// The default value is the empty selection at frame 0, which doubles as
/// the "nothing selected" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Selection {
    start_frame: i64,
    end_frame: i64,
}

impl Selection {
    /// Create a selection. Reversed bounds are swapped so that
    /// `end_frame >= start_frame` always holds.
    pub fn new(start_frame: i64, end_frame: i64) -> Self {
        if end_frame < start_frame {
            Self {
                start_frame: end_frame,
                end_frame: start_frame,
            }
        } else {
            Self {
                start_frame,
                end_frame,
            }
        }
    }

    /// The empty selection.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn start_frame(&self) -> i64 {
        self.start_frame
    }

    pub fn end_frame(&self) -> i64 {
        self.end_frame
    }

    /// Number of frames covered.
    pub fn len(&self) -> i64 {
        self.end_frame - self.start_frame
    }

    pub fn is_empty(&self) -> bool {
        self.start_frame == self.end_frame
    }

    /// Check if a frame falls within this selection.
    pub fn contains(&self, frame: i64) -> bool {
        frame >= self.start_frame && frame < self.end_frame
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start_frame, self.end_frame)
    }
}

/// Frequency band in Hz used to constrain a re-analysis.
///
/// A range whose bounds are equal (the default `0..0`) is unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrequencyRange {
    pub min: f64,
    pub max: f64,
}

impl FrequencyRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// The unconstrained range.
    pub fn unconstrained() -> Self {
        Self::default()
    }

    pub fn is_constrained(&self) -> bool {
        self.min != self.max
    }
}

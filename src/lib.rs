//! intone library
//!
//! Interactive pitch-track re-analysis: request alternative pitch
//! estimates for a region, cycle through them, and splice the chosen one
//! into the main pitch track.

pub mod config;
pub mod document;
pub mod engine;
pub mod reanalysis;
pub mod replay;
pub mod timeline;
pub mod track;

pub use config::Config;
pub use document::{Document, MemoryDocument};
pub use engine::{AnalysisEngine, SimulatedEngine};
pub use reanalysis::{CoordinatorError, CoordinatorEvent, ReAnalysisCoordinator};
pub use timeline::{FrequencyRange, Selection};
pub use track::{Event, TrackId};

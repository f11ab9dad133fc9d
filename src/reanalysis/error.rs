//! Error type for coordinator entry points.
//!
//! The `Display` text is what the user sees. Only
//! [`CoordinatorError::EngineUnavailable`] is meant to block the user; the
//! internal variants indicate the coordinator was called without a loaded
//! recording, and the last two are only ever logged.

use thiserror::Error;

use crate::engine::JobId;
use crate::timeline::AnalysisWindow;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinatorError {
    #[error("Internal error: document lost")]
    NoDocument,

    #[error("Internal error: no view pane")]
    NoActivePane,

    #[error("Internal error: no main audio model")]
    NoMainModel,

    /// A transform needed for the request is not installed.
    #[error(
        "Transform \"{transform}\" not found. Unable to perform interactive analysis. \
         Is the {plugin} Vamp plugin correctly installed?"
    )]
    EngineUnavailable { transform: String, plugin: String },

    /// The aligned window has no positive duration.
    #[error("Analysis window {}..{} is empty", .window.start, .window.end)]
    ZeroDurationWindow { window: AnalysisWindow },

    /// A completion arrived for a superseded or cleared request.
    #[error("Discarded stale result for {id}")]
    StaleResult { id: JobId },
}

impl CoordinatorError {
    /// Whether the caller must surface the message to the user.
    pub fn is_blocking(&self) -> bool {
        matches!(self, CoordinatorError::EngineUnavailable { .. })
    }

    /// Whether this signals a missing document, pane or model.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            CoordinatorError::NoDocument
                | CoordinatorError::NoActivePane
                | CoordinatorError::NoMainModel
        )
    }
}

//! # tourguide
//!
//! Route-aware guided tours. Feed an ordered list of step descriptors to a
//! [`TourController`] and it drives a tour engine through them, navigating to each
//! step's route and waiting for the element it points at before the step is shown.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tourguide::{MemoryDocument, PlaybackEngine, StepDescriptor, TourController, TourOptions};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let document = Arc::new(MemoryDocument::new("/"));
//! let mut tours = TourController::new(PlaybackEngine::new(), document);
//!
//! let steps = vec![
//!     StepDescriptor::new("welcome").text("Welcome aboard"),
//!     StepDescriptor::new("save")
//!         .route("/settings")
//!         .attach("#save-btn")
//!         .text("Don't forget to save"),
//! ];
//! tours.start(steps, &TourOptions::default());
//! assert!(tours.is_running());
//! # }
//! ```

pub mod controller;
pub mod document;
pub mod engine;
pub mod navigator;
pub mod step;
pub mod waiter;

pub use controller::TourController;
pub use document::{BBox, Document, Element, MemoryDocument};
pub use engine::{Playback, PlaybackEngine, Tour, TourEngine, TourEvent, TourEventKind, TourOptions};
pub use navigator::Navigator;
pub use step::{
    AttachTo, BeforeShow, ButtonAction, ButtonSpec, Callback, ExecutableStep, ResolvedButton,
    StepBuilder, StepDescriptor,
};
pub use waiter::{ElementWaiter, WaitOptions};

use std::time::Duration;

/// Result type for tourguide operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while preparing a step for display.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("timed out after {}ms waiting for {selector}", timeout.as_millis())]
    Timeout { selector: String, timeout: Duration },

    #[error("document error: {0}")]
    Document(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap a failure reported by a [`Document`] implementation.
    pub fn document(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Document(err.into())
    }

    /// Whether this is the element-readiness timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message() {
        let err = Error::Timeout {
            selector: "#save-btn".into(),
            timeout: Duration::from_millis(500),
        };
        assert_eq!(
            err.to_string(),
            "timed out after 500ms waiting for #save-btn"
        );
        assert!(err.is_timeout());
    }

    #[test]
    fn test_document_error_keeps_source() {
        let err = Error::document("page crashed");
        assert!(!err.is_timeout());
        assert_eq!(err.to_string(), "document error: page crashed");
        assert!(std::error::Error::source(&err).is_some());
    }
}

//! Client-side route changes without a page reload.

use crate::document::Document;
use crate::Result;
use std::sync::Arc;
use tracing::{debug, trace};

/// Moves the document to another route via the History API.
#[derive(Clone)]
pub struct Navigator {
    document: Arc<dyn Document>,
}

impl Navigator {
    /// Create a navigator over `document`.
    pub fn new(document: Arc<dyn Document>) -> Self {
        Self { document }
    }

    /// Navigate to `path` unless the document is already there.
    ///
    /// Pushes a history entry and announces the change so route-driven views re-render.
    /// The re-render itself is not awaited. Returns whether navigation happened.
    pub async fn navigate_to(&self, path: &str) -> Result<bool> {
        if path.is_empty() {
            return Ok(false);
        }

        let current = self.document.current_path().await?;
        if current == path {
            trace!(path, "already on route");
            return Ok(false);
        }

        self.document.push_history(path).await?;
        self.document.announce_navigation().await?;
        debug!(from = %current, to = path, "navigated");
        Ok(true)
    }
}

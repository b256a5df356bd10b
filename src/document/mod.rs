//! The DOM/browser environment a tour runs against.

mod memory;

pub use memory::MemoryDocument;

use crate::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Approximate interval between two rendered frames (60 Hz).
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Bounding box in viewport coordinates.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rendered with a non-zero area. Elements inside hidden containers collapse to zero.
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// An element matched by a selector, as measured when it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub selector: String,
    pub bbox: BBox,
}

/// Everything the orchestration layer needs from the page.
///
/// Implementations are expected to be cheap to call repeatedly: the element waiter
/// queries once per frame until its deadline.
#[async_trait]
pub trait Document: Send + Sync {
    /// Bounding box of the first element matching `selector`, if any.
    async fn query(&self, selector: &str) -> Result<Option<BBox>>;

    /// Smoothly scroll the first match to the vertical centre of the viewport.
    async fn scroll_into_view(&self, selector: &str) -> Result<()>;

    /// Current route (location pathname).
    async fn current_path(&self) -> Result<String>;

    /// Push a history entry for `path` without reloading the document.
    async fn push_history(&self, path: &str) -> Result<()>;

    /// Tell route-driven views that the location changed (popstate).
    async fn announce_navigation(&self) -> Result<()>;

    /// Resolve on the next display refresh.
    async fn next_frame(&self);
}

//! In-process document model.
//!
//! Selectors are matched by exact string, and views are modelled as elements that a
//! route mounts when navigation is announced. Good enough to drive tours headlessly and
//! to exercise timing behaviour under a paused tokio clock.

use super::{BBox, Document, FRAME_INTERVAL};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::trace;

#[derive(Debug, Default)]
struct State {
    path: String,
    elements: HashMap<String, BBox>,
    routes: HashMap<String, Vec<(String, BBox)>>,
    history: Vec<String>,
    announcements: usize,
    scrolled: Vec<String>,
    queries: usize,
}

/// A [`Document`] kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    state: Mutex<State>,
}

impl MemoryDocument {
    /// Create a document whose location is `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(State {
                path: path.into(),
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Render `selector` with the given box, replacing any previous one.
    pub fn insert(&self, selector: impl Into<String>, bbox: BBox) {
        self.state().elements.insert(selector.into(), bbox);
    }

    /// Remove `selector` from the document.
    pub fn remove(&self, selector: &str) {
        self.state().elements.remove(selector);
    }

    /// Declare an element that the view for `path` renders.
    ///
    /// It appears when navigation to `path` is announced and disappears when another
    /// route is announced. If `path` is already current it is rendered right away.
    pub fn mount_on_route(&self, path: impl Into<String>, selector: impl Into<String>, bbox: BBox) {
        let path = path.into();
        let selector = selector.into();
        let mut state = self.state();
        if state.path == path {
            state.elements.insert(selector.clone(), bbox);
        }
        state.routes.entry(path).or_default().push((selector, bbox));
    }

    /// Current location.
    pub fn path(&self) -> String {
        self.state().path.clone()
    }

    /// Paths pushed onto the history stack, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.state().history.clone()
    }

    /// Number of navigation announcements so far.
    pub fn announcements(&self) -> usize {
        self.state().announcements
    }

    /// Selectors scrolled into view, in order.
    pub fn scrolled(&self) -> Vec<String> {
        self.state().scrolled.clone()
    }

    /// Number of selector lookups so far.
    pub fn queries(&self) -> usize {
        self.state().queries
    }
}

#[async_trait]
impl Document for MemoryDocument {
    async fn query(&self, selector: &str) -> Result<Option<BBox>> {
        let mut state = self.state();
        state.queries += 1;
        Ok(state.elements.get(selector).copied())
    }

    async fn scroll_into_view(&self, selector: &str) -> Result<()> {
        let mut state = self.state();
        if state.elements.contains_key(selector) {
            state.scrolled.push(selector.to_string());
        }
        Ok(())
    }

    async fn current_path(&self) -> Result<String> {
        Ok(self.path())
    }

    async fn push_history(&self, path: &str) -> Result<()> {
        let mut state = self.state();
        state.path = path.to_string();
        state.history.push(path.to_string());
        Ok(())
    }

    async fn announce_navigation(&self) -> Result<()> {
        let mut state = self.state();
        state.announcements += 1;

        let mut mount = Vec::new();
        let mut unmount = Vec::new();
        for (route, els) in &state.routes {
            if *route == state.path {
                mount.extend(els.iter().cloned());
            } else {
                unmount.extend(els.iter().map(|(selector, _)| selector.clone()));
            }
        }

        for selector in unmount {
            state.elements.remove(&selector);
        }
        for (selector, bbox) in mount {
            state.elements.insert(selector, bbox);
        }
        trace!(path = %state.path, "route rendered");
        Ok(())
    }

    async fn next_frame(&self) {
        tokio::time::sleep(FRAME_INTERVAL).await;
    }
}

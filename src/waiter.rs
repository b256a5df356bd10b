//! Element readiness polling, one check per rendered frame.

use crate::document::{Document, Element};
use crate::step::StepDescriptor;
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Default deadline for a step's target element.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(8000);

/// How long to wait for an element and what counts as ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Wall-clock deadline, measured from the call.
    pub timeout: Duration,
    /// Require a non-zero rendered width and height.
    pub must_be_visible: bool,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_WAIT_TIMEOUT,
            must_be_visible: true,
        }
    }
}

impl WaitOptions {
    /// Options taken from a step's `waitTimeout` and `mustBeVisible`.
    pub fn for_step(step: &StepDescriptor) -> Self {
        let defaults = Self::default();
        Self {
            timeout: step
                .wait_timeout
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
            must_be_visible: step.must_be_visible.unwrap_or(defaults.must_be_visible),
        }
    }

    /// Replace the deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set whether the element must have a rendered size.
    pub fn with_visibility(mut self, must_be_visible: bool) -> Self {
        self.must_be_visible = must_be_visible;
        self
    }
}

/// Polls a [`Document`] until a selector is present (and visible) or a deadline passes.
#[derive(Clone)]
pub struct ElementWaiter {
    document: Arc<dyn Document>,
}

impl ElementWaiter {
    /// Create a waiter over `document`.
    pub fn new(document: Arc<dyn Document>) -> Self {
        Self { document }
    }

    /// Wait for `selector` to be ready.
    ///
    /// The first check runs immediately; after that the document is re-checked on every
    /// frame until it matches or more than `options.timeout` has elapsed.
    pub async fn wait(&self, selector: &str, options: WaitOptions) -> Result<Element> {
        let start = Instant::now();
        let mut polls = 0u32;

        loop {
            polls += 1;
            if let Some(bbox) = self.document.query(selector).await? {
                if !options.must_be_visible || bbox.is_visible() {
                    debug!(selector, polls, elapsed_ms = start.elapsed().as_millis() as u64, "element ready");
                    return Ok(Element {
                        selector: selector.to_string(),
                        bbox,
                    });
                }
                trace!(selector, "element present but collapsed");
            }

            if start.elapsed() > options.timeout {
                debug!(selector, polls, "gave up waiting for element");
                return Err(Error::Timeout {
                    selector: selector.to_string(),
                    timeout: options.timeout,
                });
            }

            self.document.next_frame().await;
        }
    }
}

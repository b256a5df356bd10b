//! [`Document`] backed by a live browser page.

use async_trait::async_trait;
use eoka::Page;
use std::sync::Arc;
use tourguide::document::FRAME_INTERVAL;
use tourguide::{BBox, Document};

/// Look up a selector and measure it. `null` when nothing matches.
const QUERY_JS: &str = r#"
((selector) => {
    const el = document.querySelector(selector);
    if (!el) return null;
    const r = el.getBoundingClientRect();
    return { x: r.x, y: r.y, width: r.width, height: r.height };
})
"#;

/// Drives the page's own router through the History API.
const PUSH_STATE_JS: &str = r#"
((path) => {
    history.pushState({}, '', path);
    return location.pathname;
})
"#;

const POPSTATE_JS: &str = "window.dispatchEvent(new PopStateEvent('popstate'))";

/// A tour's view of an eoka [`Page`].
#[derive(Clone)]
pub struct PageDocument {
    page: Arc<Page>,
}

impl PageDocument {
    pub fn new(page: Arc<Page>) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }
}

fn call(function: &str, arg: &str) -> tourguide::Result<String> {
    let arg = serde_json::to_string(arg).map_err(tourguide::Error::document)?;
    Ok(format!("{}({})", function, arg))
}

#[async_trait]
impl Document for PageDocument {
    async fn query(&self, selector: &str) -> tourguide::Result<Option<BBox>> {
        let js = call(QUERY_JS, selector)?;
        let bbox: Option<BBox> = self
            .page
            .evaluate(&js)
            .await
            .map_err(tourguide::Error::document)?;
        Ok(bbox)
    }

    async fn scroll_into_view(&self, selector: &str) -> tourguide::Result<()> {
        let js = format!(
            "document.querySelector({})?.scrollIntoView({{behavior:'smooth',block:'center'}})",
            serde_json::to_string(selector).map_err(tourguide::Error::document)?
        );
        self.page
            .execute(&js)
            .await
            .map_err(tourguide::Error::document)?;
        Ok(())
    }

    async fn current_path(&self) -> tourguide::Result<String> {
        let path: String = self
            .page
            .evaluate("location.pathname")
            .await
            .map_err(tourguide::Error::document)?;
        Ok(path)
    }

    async fn push_history(&self, path: &str) -> tourguide::Result<()> {
        let js = call(PUSH_STATE_JS, path)?;
        let now: String = self
            .page
            .evaluate(&js)
            .await
            .map_err(tourguide::Error::document)?;
        tracing::trace!(path = %now, "history entry pushed");
        Ok(())
    }

    async fn announce_navigation(&self) -> tourguide::Result<()> {
        self.page
            .execute(POPSTATE_JS)
            .await
            .map_err(tourguide::Error::document)?;
        Ok(())
    }

    async fn next_frame(&self) {
        // CDP has no per-frame callback; one frame interval is the closest cadence.
        self.page.wait(FRAME_INTERVAL.as_millis() as u64).await;
    }
}

use super::{AttachTo, ButtonAction, ButtonSpec, Callback, StepDescriptor};
use crate::document::Document;
use crate::engine::Tour;
use crate::navigator::Navigator;
use crate::waiter::{ElementWaiter, WaitOptions};
use crate::Result;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A button whose action is bound to a concrete tour instance.
#[derive(Debug, Clone)]
pub struct ResolvedButton {
    pub text: String,
    pub classes: Option<String>,
    pub extra: Map<String, Value>,
    pub action: Callback,
}

impl ResolvedButton {
    /// Run the button's action.
    pub fn click(&self) {
        self.action.call();
    }
}

/// The work that must finish before a step is rendered: navigate, then wait for the
/// attached element and bring it into view.
#[derive(Clone)]
pub struct BeforeShow {
    route: Option<String>,
    target: Option<String>,
    wait: WaitOptions,
    document: Arc<dyn Document>,
    navigator: Navigator,
    waiter: ElementWaiter,
}

impl BeforeShow {
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn wait_options(&self) -> WaitOptions {
        self.wait
    }

    /// Neither a route nor an element to wait for.
    pub fn is_immediate(&self) -> bool {
        self.route.is_none() && self.target.is_none()
    }

    /// Run the synchronization. Fails with [`Error::Timeout`](crate::Error::Timeout) if the
    /// element never becomes ready.
    ///
    /// Navigation is issued but its re-render is not awaited; the element wait absorbs
    /// a late render up to its deadline.
    pub async fn run(&self) -> Result<()> {
        if let Some(ref route) = self.route {
            self.navigator.navigate_to(route).await?;
        }

        if let Some(ref selector) = self.target {
            let element = self.waiter.wait(selector, self.wait).await?;
            self.document.scroll_into_view(&element.selector).await?;
        }

        Ok(())
    }
}

impl fmt::Debug for BeforeShow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeforeShow")
            .field("route", &self.route)
            .field("target", &self.target)
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}

/// A step ready to hand to a tour engine.
#[derive(Debug)]
pub struct ExecutableStep {
    pub id: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub attach_to: Option<AttachTo>,
    pub buttons: Option<Vec<ResolvedButton>>,
    pub extra: Map<String, Value>,
    before_show: BeforeShow,
}

impl ExecutableStep {
    /// Must complete before the step is displayed.
    pub async fn before_show(&self) -> Result<()> {
        self.before_show.run().await
    }

    pub fn sync_task(&self) -> &BeforeShow {
        &self.before_show
    }

    /// First button labelled `text`.
    pub fn button(&self, text: &str) -> Option<&ResolvedButton> {
        self.buttons.as_ref()?.iter().find(|b| b.text == text)
    }
}

/// Turns [`StepDescriptor`]s into [`ExecutableStep`]s for one document.
#[derive(Clone)]
pub struct StepBuilder {
    document: Arc<dyn Document>,
    navigator: Navigator,
    waiter: ElementWaiter,
}

impl StepBuilder {
    pub fn new(document: Arc<dyn Document>) -> Self {
        Self {
            navigator: Navigator::new(document.clone()),
            waiter: ElementWaiter::new(document.clone()),
            document,
        }
    }

    /// Build the executable form of `raw`, binding its buttons to `tour`.
    pub fn build<T: Tour>(&self, tour: &Arc<T>, raw: StepDescriptor) -> ExecutableStep {
        let wait = WaitOptions::for_step(&raw);
        let buttons = raw
            .buttons
            .map(|buttons| buttons.into_iter().map(|b| resolve(tour, b)).collect());

        let before_show = BeforeShow {
            route: raw.route.filter(|r| !r.is_empty()),
            target: raw.attach_to.as_ref().map(|a| a.element.clone()),
            wait,
            document: self.document.clone(),
            navigator: self.navigator.clone(),
            waiter: self.waiter.clone(),
        };
        debug!(
            id = raw.id.as_deref().unwrap_or("-"),
            route = ?before_show.route,
            target = ?before_show.target,
            "built step"
        );

        ExecutableStep {
            id: raw.id,
            title: raw.title,
            text: raw.text,
            attach_to: raw.attach_to,
            buttons,
            extra: raw.extra,
            before_show,
        }
    }
}

fn resolve<T: Tour>(tour: &Arc<T>, button: ButtonSpec) -> ResolvedButton {
    ResolvedButton {
        text: button.text,
        classes: button.classes,
        extra: button.extra,
        action: bind(tour, button.action),
    }
}

/// Bind a symbolic action to `tour`. Held weakly: steps live inside the tour.
fn bind<T: Tour>(tour: &Arc<T>, action: ButtonAction) -> Callback {
    let control: fn(&T) = match action {
        ButtonAction::Next => T::next,
        ButtonAction::Back => T::back,
        ButtonAction::Cancel => T::cancel,
        ButtonAction::Custom(callback) => return callback,
    };
    let tour = Arc::downgrade(tour);
    Callback::new(move || {
        if let Some(tour) = tour.upgrade() {
            control(&tour);
        }
    })
}

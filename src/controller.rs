//! Owner of the one active tour.

use crate::document::Document;
use crate::engine::{Tour, TourEngine, TourOptions};
use crate::step::{StepBuilder, StepDescriptor};
use std::sync::Arc;
use tracing::debug;

/// Starts, resumes and cancels tours, keeping at most one instance around.
///
/// Construct one per application and share it; the session lives here rather than in
/// global state.
pub struct TourController<E: TourEngine> {
    engine: E,
    builder: StepBuilder,
    session: Option<Arc<E::Tour>>,
}

impl<E: TourEngine> TourController<E> {
    /// Create a controller with no tour yet.
    pub fn new(engine: E, document: Arc<dyn Document>) -> Self {
        Self {
            engine,
            builder: StepBuilder::new(document),
            session: None,
        }
    }

    /// Replace any existing tour with a new one over `steps` and start it.
    ///
    /// The previous tour is cancelled before the first new step is built. Never panics; an
    /// engine that cannot play (such as [`PlaybackEngine`](crate::PlaybackEngine) outside a
    /// tokio runtime) reports that through its own events.
    pub fn start(&mut self, steps: impl IntoIterator<Item = StepDescriptor>, options: &TourOptions) {
        if let Some(previous) = self.session.take() {
            debug!("cancelling previous tour");
            previous.cancel();
        }

        let tour = self.engine.create(options.merged());
        let mut count = 0;
        for raw in steps {
            tour.add_step(self.builder.build(&tour, raw));
            count += 1;
        }
        debug!(steps = count, "starting tour");
        tour.start();
        self.session = Some(tour);
    }

    /// Restart the current tour, active or cancelled, from its current step.
    pub fn resume(&self) {
        if let Some(ref tour) = self.session {
            tour.start();
        }
    }

    /// Stop and dismiss the current tour.
    ///
    /// The instance is kept, so [`resume`](Self::resume) can bring it back.
    pub fn cancel(&self) {
        if let Some(ref tour) = self.session {
            tour.cancel();
        }
    }

    /// Whether a tour exists and is playing.
    pub fn is_running(&self) -> bool {
        self.session.as_ref().is_some_and(|tour| tour.is_active())
    }

    /// The current tour instance, if one was started.
    pub fn session(&self) -> Option<&Arc<E::Tour>> {
        self.session.as_ref()
    }

    /// The engine tours are created with.
    pub fn engine(&self) -> &E {
        &self.engine
    }
}

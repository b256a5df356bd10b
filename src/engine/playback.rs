//! Headless tour engine.
//!
//! Plays steps in order without drawing anything: a step counts as shown once its
//! synchronization task resolves. Lifecycle changes are broadcast as [`TourEvent`]s so
//! hosts (and the runner) can follow along or render the steps themselves.

use super::{Tour, TourEngine};
use crate::step::ExecutableStep;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{debug, warn};

const EVENT_CAPACITY: usize = 64;

/// Something that happened to a tour.
#[derive(Debug, Clone, PartialEq)]
pub struct TourEvent {
    /// Id of the tour instance ([`Playback::id`]).
    pub tour: u64,
    pub kind: TourEventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TourEventKind {
    /// The step's synchronization finished and it is now displayed.
    Shown {
        index: usize,
        step_id: Option<String>,
    },
    /// The step never became ready; the tour stopped.
    StepFailed { index: usize, error: String },
    Cancelled,
    Completed,
}

/// Creates [`Playback`] tours that share one event channel.
pub struct PlaybackEngine {
    next_id: AtomicU64,
    events: broadcast::Sender<TourEvent>,
}

impl PlaybackEngine {
    /// Create an engine with its own event channel.
    ///
    /// Steps synchronize on the ambient tokio runtime. Started outside one, a tour stops
    /// with [`TourEventKind::StepFailed`].
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            next_id: AtomicU64::new(1),
            events,
        }
    }

    /// Receive events from every tour this engine creates from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<TourEvent> {
        self.events.subscribe()
    }
}

impl Default for PlaybackEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TourEngine for PlaybackEngine {
    type Tour = Playback;

    fn create(&self, options: Value) -> Arc<Playback> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(tour = id, "created tour");
        Arc::new(Playback {
            options,
            shared: Arc::new(Shared {
                id,
                state: Mutex::new(State::default()),
                events: self.events.clone(),
            }),
        })
    }
}

#[derive(Default)]
struct State {
    steps: Vec<Arc<ExecutableStep>>,
    /// Step being shown or on display.
    current: Option<usize>,
    displayed: bool,
    active: bool,
    /// Bumped whenever an in-flight synchronization result must be ignored.
    generation: u64,
}

struct Shared {
    id: u64,
    state: Mutex<State>,
    events: broadcast::Sender<TourEvent>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, kind: TourEventKind) {
        // No subscribers is fine.
        let _ = self.events.send(TourEvent {
            tour: self.id,
            kind,
        });
    }

    fn show(self: &Arc<Self>, index: usize) {
        let Ok(runtime) = Handle::try_current() else {
            warn!(tour = self.id, index, "no tokio runtime; stopping tour");
            {
                let mut state = self.state();
                state.active = false;
                state.displayed = false;
                state.current = Some(index);
                state.generation += 1;
            }
            self.emit(TourEventKind::StepFailed {
                index,
                error: "no tokio runtime to synchronize the step on".into(),
            });
            return;
        };

        let (step, generation) = {
            let mut state = self.state();
            let Some(step) = state.steps.get(index).cloned() else {
                return;
            };
            state.generation += 1;
            state.current = Some(index);
            state.displayed = false;
            (step, state.generation)
        };

        let shared = Arc::clone(self);
        runtime.spawn(async move {
            let outcome = step.before_show().await;

            let kind = {
                let mut state = shared.state();
                if !state.active || state.generation != generation {
                    debug!(tour = shared.id, index, "discarding superseded step");
                    return;
                }
                match outcome {
                    Ok(()) => {
                        state.displayed = true;
                        TourEventKind::Shown {
                            index,
                            step_id: step.id.clone(),
                        }
                    }
                    Err(e) => {
                        warn!(tour = shared.id, index, "step never became ready: {}", e);
                        state.active = false;
                        state.displayed = false;
                        state.generation += 1;
                        TourEventKind::StepFailed {
                            index,
                            error: e.to_string(),
                        }
                    }
                }
            };
            shared.emit(kind);
        });
    }

    fn finish(&self, kind: TourEventKind) {
        {
            let mut state = self.state();
            if !state.active {
                return;
            }
            state.active = false;
            state.displayed = false;
            state.generation += 1;
        }
        debug!(tour = self.id, ?kind, "tour stopped");
        self.emit(kind);
    }
}

/// A tour instance of [`PlaybackEngine`].
pub struct Playback {
    options: Value,
    shared: Arc<Shared>,
}

impl Playback {
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// Merged engine options this tour was created with.
    pub fn options(&self) -> &Value {
        &self.options
    }

    /// Number of steps added.
    pub fn len(&self) -> usize {
        self.shared.state().steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn step(&self, index: usize) -> Option<Arc<ExecutableStep>> {
        self.shared.state().steps.get(index).cloned()
    }

    /// Index of the step being shown or on display.
    pub fn current_step(&self) -> Option<usize> {
        self.shared.state().current
    }

    /// A step has finished synchronizing and is on display.
    pub fn is_displaying(&self) -> bool {
        self.shared.state().displayed
    }
}

impl Tour for Playback {
    fn add_step(&self, step: ExecutableStep) {
        self.shared.state().steps.push(Arc::new(step));
    }

    fn start(&self) {
        let index = {
            let mut state = self.shared.state();
            state.active = true;
            if state.steps.is_empty() {
                None
            } else {
                Some(state.current.unwrap_or(0))
            }
        };
        match index {
            Some(index) => {
                debug!(tour = self.id(), index, "starting tour");
                self.shared.show(index);
            }
            None => self.shared.finish(TourEventKind::Completed),
        }
    }

    fn cancel(&self) {
        self.shared.finish(TourEventKind::Cancelled);
    }

    fn next(&self) {
        let target = {
            let state = self.shared.state();
            if !state.active {
                return;
            }
            state.current.map_or(0, |i| i + 1)
        };
        if target < self.len() {
            self.shared.show(target);
        } else {
            self.shared.finish(TourEventKind::Completed);
        }
    }

    fn back(&self) {
        let target = {
            let state = self.shared.state();
            match state.current {
                Some(i) if state.active && i > 0 => i - 1,
                _ => return,
            }
        };
        self.shared.show(target);
    }

    fn is_active(&self) -> bool {
        self.shared.state().active
    }
}

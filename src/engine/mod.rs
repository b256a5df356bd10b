//! The tour engine seam: whatever renders steps, one at a time.

mod playback;

pub use playback::{Playback, PlaybackEngine, TourEvent, TourEventKind};

use crate::step::ExecutableStep;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// A single tour instance.
///
/// Engines must await [`ExecutableStep::before_show`] before rendering a step, and show
/// steps in the order they were added.
pub trait Tour: Send + Sync + 'static {
    fn add_step(&self, step: ExecutableStep);

    /// Begin (or restart) playback from the engine's current step.
    fn start(&self);

    /// Stop and dismiss the tour.
    fn cancel(&self);

    fn next(&self);

    fn back(&self);

    /// Whether the tour is currently playing.
    fn is_active(&self) -> bool;
}

/// Creates tour instances from merged options (see [`TourOptions::merged`]).
pub trait TourEngine: Send + Sync {
    type Tour: Tour;

    fn create(&self, options: Value) -> Arc<Self::Tour>;
}

/// Caller overrides for the engine configuration.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TourOptions {
    /// Merged over the built-in per-step defaults.
    #[serde(alias = "default_step_options")]
    pub default_step_options: Option<Value>,

    /// Merged over the built-in tour defaults.
    #[serde(alias = "tour_options")]
    pub tour_options: Option<Value>,
}

impl TourOptions {
    /// Engine configuration: built-in defaults with the caller's options spread on top.
    ///
    /// Steps get a dismiss control and no auto-scroll (steps scroll their own target);
    /// the tour gets a modal overlay. Merging is shallow, so a `tourOptions` key replaces
    /// the whole default value under it.
    pub fn merged(&self) -> Value {
        let mut step_defaults = json!({
            "cancelIcon": { "enabled": true },
            "scrollTo": false,
        });
        if let Some(ref overrides) = self.default_step_options {
            spread(&mut step_defaults, overrides);
        }

        let mut tour = json!({
            "useModalOverlay": true,
            "defaultStepOptions": step_defaults,
        });
        if let Some(ref overrides) = self.tour_options {
            spread(&mut tour, overrides);
        }
        tour
    }
}

/// Shallow object spread. Non-object overrides are ignored.
fn spread(base: &mut Value, overrides: &Value) {
    if let (Value::Object(base), Value::Object(overrides)) = (base, overrides) {
        for (key, value) in overrides {
            base.insert(key.clone(), value.clone());
        }
    }
}

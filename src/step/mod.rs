//! Step descriptors as callers write them, and their executable form.

mod builder;

pub use builder::{BeforeShow, ExecutableStep, ResolvedButton, StepBuilder};

use schemars::{json_schema, JsonSchema, Schema, SchemaGenerator};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// One stop of a tour, as supplied by the caller.
///
/// Keys are camelCase (snake_case is accepted too). Anything not recognised here is kept
/// in `extra` and handed to the tour engine untouched.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepDescriptor {
    pub id: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,

    /// Route the step lives on; navigated to before the step is shown.
    pub route: Option<String>,

    /// Element the step highlights.
    #[serde(alias = "attach_to")]
    pub attach_to: Option<AttachTo>,

    /// Deadline for the attached element, in milliseconds (default 8000).
    #[serde(alias = "wait_timeout")]
    pub wait_timeout: Option<u64>,

    /// Require the attached element to have a rendered size (default true).
    #[serde(alias = "must_be_visible")]
    pub must_be_visible: Option<bool>,

    pub buttons: Option<Vec<ButtonSpec>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StepDescriptor {
    /// Create a step with an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    pub fn attach(mut self, selector: impl Into<String>) -> Self {
        self.attach_to = Some(AttachTo::new(selector));
        self
    }

    pub fn attach_on(mut self, selector: impl Into<String>, on: impl Into<String>) -> Self {
        self.attach_to = Some(AttachTo {
            element: selector.into(),
            on: Some(on.into()),
        });
        self
    }

    pub fn wait_timeout(mut self, ms: u64) -> Self {
        self.wait_timeout = Some(ms);
        self
    }

    pub fn must_be_visible(mut self, visible: bool) -> Self {
        self.must_be_visible = Some(visible);
        self
    }

    pub fn button(mut self, button: ButtonSpec) -> Self {
        self.buttons.get_or_insert_with(Vec::new).push(button);
        self
    }

    /// Set an engine-specific field.
    pub fn field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Where a step's popover anchors.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachTo {
    /// Selector of the highlighted element.
    pub element: String,
    /// Placement hint for the engine ("bottom", "left", ...).
    pub on: Option<String>,
}

impl AttachTo {
    pub fn new(element: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            on: None,
        }
    }
}

impl<'de> Deserialize<'de> for AttachTo {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // A bare string is shorthand for `{ element: <selector> }`.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Selector(String),
            Full {
                element: String,
                #[serde(default)]
                on: Option<String>,
            },
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Selector(element) => Self { element, on: None },
            Repr::Full { element, on } => Self { element, on },
        })
    }
}

impl JsonSchema for AttachTo {
    fn schema_name() -> Cow<'static, str> {
        "AttachTo".into()
    }

    fn json_schema(_: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "anyOf": [
                { "type": "string", "description": "Selector of the highlighted element." },
                {
                    "type": "object",
                    "properties": {
                        "element": { "type": "string" },
                        "on": { "type": ["string", "null"] }
                    },
                    "required": ["element"]
                }
            ]
        })
    }
}

/// A zero-argument action attached to a button.
#[derive(Clone)]
pub struct Callback(Arc<dyn Fn() + Send + Sync>);

impl Callback {
    pub fn new(f: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self) {
        (self.0)()
    }

    /// Whether both handles point at the same closure.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.0) as *const (),
            Arc::as_ptr(&other.0) as *const (),
        )
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

/// What a button does when pressed.
///
/// Tags are `next`, `back` and `cancel`. Any other tag is a parse error rather than
/// silently acting as `cancel`.
#[derive(Debug, Clone)]
pub enum ButtonAction {
    Next,
    Back,
    Cancel,
    /// Caller-supplied action, passed through as-is.
    Custom(Callback),
}

impl ButtonAction {
    /// Tag this action is written as.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Back => "back",
            Self::Cancel => "cancel",
            Self::Custom(_) => "custom",
        }
    }
}

const ACTION_NAMES: &[&str] = &["next", "back", "cancel"];

impl<'de> Deserialize<'de> for ButtonAction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        match tag.as_str() {
            "next" => Ok(Self::Next),
            "back" => Ok(Self::Back),
            "cancel" => Ok(Self::Cancel),
            other => Err(de::Error::unknown_variant(other, ACTION_NAMES)),
        }
    }
}

impl JsonSchema for ButtonAction {
    fn schema_name() -> Cow<'static, str> {
        "ButtonAction".into()
    }

    fn json_schema(_: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "enum": ACTION_NAMES,
        })
    }
}

/// A button on a step's popover.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ButtonSpec {
    pub text: String,
    pub action: ButtonAction,
    pub classes: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ButtonSpec {
    /// Create a button with a label and action.
    pub fn new(text: impl Into<String>, action: ButtonAction) -> Self {
        Self {
            text: text.into(),
            action,
            classes: None,
            extra: Map::new(),
        }
    }

    pub fn next(text: impl Into<String>) -> Self {
        Self::new(text, ButtonAction::Next)
    }

    pub fn back(text: impl Into<String>) -> Self {
        Self::new(text, ButtonAction::Back)
    }

    pub fn cancel(text: impl Into<String>) -> Self {
        Self::new(text, ButtonAction::Cancel)
    }

    pub fn custom(text: impl Into<String>, f: impl Fn() + Send + Sync + 'static) -> Self {
        Self::new(text, ButtonAction::Custom(Callback::new(f)))
    }

    pub fn classes(mut self, classes: impl Into<String>) -> Self {
        self.classes = Some(classes.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_camel_case_step() {
        let json = r##"{
            "id": "save",
            "text": "Save your changes",
            "route": "/settings",
            "attachTo": { "element": "#save-btn", "on": "bottom" },
            "waitTimeout": 500,
            "mustBeVisible": false,
            "buttons": [
                { "text": "Back", "action": "back", "classes": "secondary" },
                { "text": "Done", "action": "cancel" }
            ],
            "canClickTarget": false
        }"##;
        let step: StepDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(step.id.as_deref(), Some("save"));
        assert_eq!(step.route.as_deref(), Some("/settings"));
        assert_eq!(
            step.attach_to,
            Some(AttachTo {
                element: "#save-btn".into(),
                on: Some("bottom".into())
            })
        );
        assert_eq!(step.wait_timeout, Some(500));
        assert_eq!(step.must_be_visible, Some(false));

        let buttons = step.buttons.unwrap();
        assert_eq!(buttons.len(), 2);
        assert!(matches!(buttons[0].action, ButtonAction::Back));
        assert_eq!(buttons[0].classes.as_deref(), Some("secondary"));
        assert!(matches!(buttons[1].action, ButtonAction::Cancel));

        assert_eq!(step.extra.get("canClickTarget"), Some(&Value::Bool(false)));
        assert!(!step.extra.contains_key("waitTimeout"));
    }

    #[test]
    fn test_parse_snake_case_yaml_step() {
        let yaml = r##"
id: search
attach_to: "#search"
wait_timeout: 1500
must_be_visible: true
"##;
        let step: StepDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(step.attach_to, Some(AttachTo::new("#search")));
        assert_eq!(step.wait_timeout, Some(1500));
        assert_eq!(step.must_be_visible, Some(true));
        assert!(step.buttons.is_none());
        assert!(step.extra.is_empty());
    }

    #[test]
    fn test_unknown_button_action_rejected() {
        let json = r#"{ "text": "Go", "action": "jump" }"#;
        let err = serde_json::from_str::<ButtonSpec>(json).unwrap_err();
        assert!(err.to_string().contains("jump"));
    }

    #[test]
    fn test_button_extra_fields_kept() {
        let json = r#"{ "text": "Next", "action": "next", "secondary": true, "label": "Go on" }"#;
        let button: ButtonSpec = serde_json::from_str(json).unwrap();
        assert_eq!(button.action.name(), "next");
        assert_eq!(button.extra.len(), 2);
        assert_eq!(button.extra["label"], "Go on");
    }

    #[test]
    fn test_builder_helpers() {
        let step = StepDescriptor::new("intro")
            .title("Hi")
            .attach_on("#logo", "right")
            .button(ButtonSpec::next("Next"))
            .button(ButtonSpec::custom("Docs", || {}))
            .field("scrollTo", Value::Bool(true));

        assert_eq!(step.title.as_deref(), Some("Hi"));
        assert_eq!(step.attach_to.unwrap().on.as_deref(), Some("right"));
        let buttons = step.buttons.unwrap();
        assert_eq!(buttons[1].action.name(), "custom");
        assert_eq!(step.extra["scrollTo"], true);
    }

    #[test]
    fn test_callback_identity() {
        let a = Callback::new(|| {});
        let b = a.clone();
        let c = Callback::new(|| {});
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn test_schema_lists_actions() {
        let schema = schemars::schema_for!(ButtonSpec);
        let json = serde_json::to_string(&schema).unwrap();
        assert!(json.contains("\"next\""));
        assert!(json.contains("\"cancel\""));
    }

    #[test]
    fn test_schema_accepts_selector_shorthand() {
        let schema = serde_json::to_value(schemars::schema_for!(AttachTo)).unwrap();
        let variants = schema["anyOf"].as_array().unwrap();
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0]["type"], "string");
        assert_eq!(variants[1]["required"], serde_json::json!(["element"]));
    }
}

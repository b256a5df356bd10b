//! `${name}` placeholders in tour files.

use crate::{Error, Result};
use schemars::JsonSchema;
use serde::Deserialize;
use std::collections::HashMap;

/// Values supplied for a tour file's placeholders.
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: HashMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse `key=value` command-line arguments.
    pub fn from_args(args: &[String]) -> Result<Self> {
        args.iter().try_fold(Self::new(), |params, arg| {
            let (key, value) = arg.split_once('=').ok_or_else(|| {
                Error::Config(format!("invalid param '{}', expected key=value", arg))
            })?;
            Ok(params.set(key, value))
        })
    }
}

/// A placeholder declared under `params:`.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ParamDef {
    #[serde(default)]
    pub required: bool,
    pub default: Option<String>,
    pub description: Option<String>,
}

/// Value for placeholder `name`, or `None` to leave it untouched.
fn lookup(name: &str, params: &Params, defs: &HashMap<String, ParamDef>) -> Result<Option<String>> {
    if let Some(value) = params.get(name) {
        return Ok(Some(value.to_string()));
    }
    match defs.get(name) {
        Some(ParamDef {
            default: Some(default),
            ..
        }) => Ok(Some(default.clone())),
        Some(ParamDef { required: true, .. }) => Err(Error::Config(format!(
            "missing required parameter: {}",
            name
        ))),
        Some(_) => Ok(Some(String::new())),
        // Undeclared: keep the literal text.
        None => Ok(None),
    }
}

/// Replace every `${name}` in `template`.
pub fn substitute(
    template: &str,
    params: &Params,
    defs: &HashMap<String, ParamDef>,
) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("${") {
        let Some(len) = rest[open + 2..].find('}') else {
            break;
        };
        let name = &rest[open + 2..open + 2 + len];
        out.push_str(&rest[..open]);
        match lookup(name, params, defs)? {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[open..open + 3 + len]),
        }
        rest = &rest[open + 3 + len..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Substitute placeholders in every string of a YAML document.
pub fn substitute_value(
    value: &mut serde_yaml::Value,
    params: &Params,
    defs: &HashMap<String, ParamDef>,
) -> Result<()> {
    match value {
        serde_yaml::Value::String(s) => *s = substitute(s, params, defs)?,
        serde_yaml::Value::Sequence(items) => {
            for item in items {
                substitute_value(item, params, defs)?;
            }
        }
        serde_yaml::Value::Mapping(map) => {
            for (_, item) in map.iter_mut() {
                substitute_value(item, params, defs)?;
            }
        }
        _ => {}
    }
    Ok(())
}

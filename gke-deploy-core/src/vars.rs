//! Variable namespaces used for template rendering.
//!
//! Two namespaces are built once per run:
//!
//! - **public**: built-in variables from the [`BuildContext`] plus user vars.
//!   Safe to print for diagnostics.
//! - **secret**: public plus the collected secrets. Never printed or logged.
//!
//! No name may be defined twice across the sources of a namespace.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::secrets::SecretSet;
use crate::types::BuildContext;

/// Mapping from variable name to a JSON-like value.
///
/// Keys are kept sorted so dumps and renders are reproducible. `Debug` prints
/// names only.
#[derive(Clone, Default, PartialEq)]
pub struct VariableNamespace {
    vars: BTreeMap<String, Value>,
}

impl VariableNamespace {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The namespace as a JSON object, ready to become a rendering context.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.vars
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<String, Value>>(),
        )
    }

    /// Pretty-printed JSON dump. Only call this on the public namespace.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.vars).unwrap_or_default()
    }

    fn insert(&mut self, name: String, value: Value) {
        self.vars.insert(name, value);
    }
}

impl std::fmt::Debug for VariableNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.vars.keys()).finish()
    }
}

/// The pair of namespaces for one run.
#[derive(Debug, Clone, Default)]
pub struct Namespaces {
    pub public: VariableNamespace,
    pub secret: VariableNamespace,
}

/// Parse the user variable blob. Blank input means no variables.
pub fn parse_user_vars(blob: &str) -> Result<Map<String, Value>, CoreError> {
    if blob.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(blob).map_err(CoreError::InvalidVars)? {
        Value::Object(map) => Ok(map),
        other => Err(CoreError::VarsNotObject {
            found: json_kind(&other),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Build the public and secret namespaces.
///
/// Fails with [`CoreError::VariableShadowsBuiltin`] if a user var reuses a
/// built-in name, and with [`CoreError::SecretShadowsVariable`] if a secret
/// reuses any name already in the secret namespace. On success the public
/// namespace is a subset of the secret one, and the difference is exactly the
/// collected secrets.
pub fn build_namespaces(
    ctx: &BuildContext,
    user_vars: &Map<String, Value>,
    secrets: &SecretSet,
) -> Result<Namespaces, CoreError> {
    let mut public = VariableNamespace::default();
    for (name, value) in ctx.builtins() {
        public.insert(name.to_string(), Value::String(value.to_string()));
    }

    for (name, value) in user_vars {
        if public.contains(name) {
            return Err(CoreError::VariableShadowsBuiltin { name: name.clone() });
        }
        public.insert(name.clone(), value.clone());
    }

    let mut secret = public.clone();
    for (name, value) in secrets.iter() {
        if secret.contains(name) {
            return Err(CoreError::SecretShadowsVariable {
                name: name.to_string(),
            });
        }
        secret.insert(name.to_string(), Value::String(value.to_string()));
    }

    tracing::debug!(
        public = public.len(),
        secret = secret.len(),
        "built variable namespaces"
    );
    Ok(Namespaces { public, secret })
}

//! Error types for gke-deploy-core.

use thiserror::Error;

/// All errors that can arise while validating inputs and building the
/// variable namespaces.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A required parameter was not supplied (or could not be inferred).
    #[error("missing required param: {0}")]
    MissingParam(&'static str),

    /// A prefixed environment entry had no `=` separator or an empty name.
    #[error("secret entry {entry:?} is not of the form NAME=VALUE")]
    MalformedSecret { entry: String },

    /// A secret was present but its value is the empty string.
    #[error("secret var {name:?} is an empty string")]
    EmptySecretValue { name: String },

    /// The same secret name was derived twice.
    #[error("secret var {name:?} shadows existing secret")]
    DuplicateSecret { name: String },

    /// A user variable reuses a built-in variable name.
    #[error("var {name:?} shadows existing var")]
    VariableShadowsBuiltin { name: String },

    /// A secret reuses a built-in or user variable name.
    #[error("secret var {name:?} shadows existing var")]
    SecretShadowsVariable { name: String },

    /// The user variable blob is not valid JSON.
    #[error("error parsing vars: {0}")]
    InvalidVars(#[source] serde_json::Error),

    /// The user variable blob parsed, but is not a JSON object.
    #[error("error parsing vars: expected a JSON object, got {found}")]
    VarsNotObject { found: &'static str },
}

//! The external-command stages of a deployment, in execution order.

use std::fmt;

/// One external command invocation in the deployment sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// `gcloud auth activate-service-account`
    Authenticate,
    /// `gcloud container clusters get-credentials`
    FetchCredentials,
    /// `kubectl version`
    Version,
    /// `kubectl config set-context`
    SetContext,
    /// `kubectl apply` of the namespace manifest
    EnsureNamespace,
    /// `kubectl apply --dry-run` of the rendered manifests. Runs even when the
    /// whole deployment is a dry-run, so a dry-run deployment issues two
    /// dry-run applies.
    Validate,
    /// final `kubectl apply` of the rendered manifests
    Apply,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Authenticate => "authenticate",
            Stage::FetchCredentials => "fetch-credentials",
            Stage::Version => "version",
            Stage::SetContext => "set-context",
            Stage::EnsureNamespace => "ensure-namespace",
            Stage::Validate => "validate",
            Stage::Apply => "apply",
        };
        f.write_str(name)
    }
}

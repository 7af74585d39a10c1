//! Template context — converts a [`VariableNamespace`] into a [`tera::Context`].

use gke_deploy_core::VariableNamespace;

use crate::error::RenderError;

/// Every variable becomes a top-level name in the template, so `{{ app }}`
/// and `{{ labels.tier }}` resolve directly.
pub fn to_tera_context(vars: &VariableNamespace) -> Result<tera::Context, RenderError> {
    tera::Context::from_value(vars.to_json()).map_err(RenderError::from)
}

//! Service account credential payload.

use serde::Deserialize;

use crate::error::CoreError;

#[derive(Debug, Default, Deserialize)]
struct ServiceAccountKey {
    #[serde(default)]
    project_id: String,
}

/// The service account JSON key, whitespace-trimmed.
///
/// The payload is opaque apart from its `project_id` field. `Debug` never
/// prints the payload.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialPayload(String);

impl CredentialPayload {
    /// Trim `raw` and reject an empty payload.
    pub fn new(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CoreError::MissingParam("token"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `project_id` field, if the payload is a JSON object carrying one.
    pub fn project_id(&self) -> Option<String> {
        serde_json::from_str::<ServiceAccountKey>(&self.0)
            .ok()
            .map(|k| k.project_id)
            .filter(|p| !p.is_empty())
    }

    /// Use `explicit` when non-empty, otherwise infer from the payload.
    pub fn resolve_project(&self, explicit: Option<&str>) -> Result<String, CoreError> {
        match explicit.map(str::trim).filter(|p| !p.is_empty()) {
            Some(project) => Ok(project.to_string()),
            None => self.project_id().ok_or(CoreError::MissingParam("project")),
        }
    }
}

impl std::fmt::Debug for CredentialPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CredentialPayload(<{} bytes>)", self.0.len())
    }
}

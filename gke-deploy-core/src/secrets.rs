//! Secret collection from the environment snapshot.

use std::collections::BTreeMap;

use crate::env::EnvSnapshot;
use crate::error::CoreError;

/// Environment names carrying this prefix are treated as secrets.
pub const SECRET_PREFIX: &str = "SECRET_";

/// Collected secrets, keyed by name with [`SECRET_PREFIX`] stripped.
///
/// `Debug` prints names only.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretSet {
    entries: BTreeMap<String, String>,
}

impl SecretSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn insert(&mut self, name: String, value: String) -> Result<(), CoreError> {
        if self.entries.contains_key(&name) {
            return Err(CoreError::DuplicateSecret { name });
        }
        self.entries.insert(name, value);
        Ok(())
    }
}

impl std::fmt::Debug for SecretSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SecretSet {
    /// Later duplicates overwrite earlier ones; use [`collect_secrets`] for
    /// validated collection.
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Extract every `SECRET_*` entry from `env`.
///
/// Entries are split on the first `=` only, so values may contain `=`. On
/// success the matched entries are removed from `env`, which keeps them out of
/// every child process spawned from the snapshot afterwards.
pub fn collect_secrets(env: &mut EnvSnapshot) -> Result<SecretSet, CoreError> {
    let mut secrets = SecretSet::default();

    for entry in env.entries() {
        if !entry.starts_with(SECRET_PREFIX) {
            continue;
        }

        let (key, value) = entry.split_once('=').ok_or_else(|| CoreError::MalformedSecret {
            entry: entry.clone(),
        })?;

        let name = &key[SECRET_PREFIX.len()..];
        if name.is_empty() {
            return Err(CoreError::MalformedSecret {
                entry: key.to_string(),
            });
        }

        if value.is_empty() {
            return Err(CoreError::EmptySecretValue {
                name: name.to_string(),
            });
        }

        secrets.insert(name.to_string(), value.to_string())?;
    }

    env.retain(|e| !e.starts_with(SECRET_PREFIX));
    tracing::debug!(count = secrets.len(), "collected secrets from environment");
    Ok(secrets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_and_strips_prefix() {
        let mut env = EnvSnapshot::from_entries([
            "PATH=/bin",
            "SECRET_API_TOKEN=123",
            "SECRET_DSN=postgres://u:p@h/db?sslmode=require",
        ]);
        let secrets = collect_secrets(&mut env).unwrap();

        assert_eq!(secrets.len(), 2);
        assert_eq!(secrets.get("API_TOKEN"), Some("123"));
        assert_eq!(
            secrets.get("DSN"),
            Some("postgres://u:p@h/db?sslmode=require")
        );
        assert_eq!(env.entries(), &["PATH=/bin".to_string()]);
    }

    #[test]
    fn env_untouched_on_failure() {
        let mut env = EnvSnapshot::from_entries(["SECRET_A=1", "SECRET_B="]);
        let err = collect_secrets(&mut env).unwrap_err();
        assert!(matches!(err, CoreError::EmptySecretValue { ref name } if name == "B"));
        assert_eq!(env.entries().len(), 2);
    }

    #[test]
    fn debug_does_not_print_values() {
        let secrets: SecretSet = [("TOKEN", "hunter2")].into_iter().collect();
        let printed = format!("{secrets:?}");
        assert!(printed.contains("TOKEN"));
        assert!(!printed.contains("hunter2"));
    }
}

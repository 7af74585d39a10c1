//! Snapshot of the process environment handed to child processes.
//!
//! The pipeline never mutates the real process environment. It takes a
//! snapshot once at startup, the secret collector removes entries from the
//! snapshot, and every spawned command gets exactly the snapshot's contents.

/// Ordered list of raw `NAME=VALUE` entries.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    entries: Vec<String>,
}

impl EnvSnapshot {
    /// Capture the current process environment. Non-UTF-8 names or values are
    /// converted lossily.
    pub fn from_process() -> Self {
        let entries = std::env::vars_os()
            .map(|(k, v)| format!("{}={}", k.to_string_lossy(), v.to_string_lossy()))
            .collect();
        Self { entries }
    }

    /// Build a snapshot from raw `NAME=VALUE` entries.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append `name=value`, replacing any earlier entry with the same name.
    pub fn set(&mut self, name: &str, value: &str) {
        self.entries.retain(|e| entry_name(e) != name);
        self.entries.push(format!("{name}={value}"));
    }

    /// Look up the value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs().find(|(k, _)| *k == name).map(|(_, v)| v)
    }

    /// Keep only the entries for which `keep` returns true.
    pub(crate) fn retain(&mut self, keep: impl FnMut(&String) -> bool) {
        self.entries.retain(keep);
    }

    /// Entries split on the first `=`. Entries without a separator yield an
    /// empty value.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|e| e.split_once('=').unwrap_or((e.as_str(), "")))
    }
}

fn entry_name(entry: &str) -> &str {
    entry.split_once('=').map_or(entry, |(k, _)| k)
}

// Values may be secrets; only names are printed.
impl std::fmt::Debug for EnvSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| entry_name(e)))
            .finish()
    }
}

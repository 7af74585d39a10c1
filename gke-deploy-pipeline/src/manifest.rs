//! Generated "ensure namespace exists" manifest.
//!
//! Applied with `kubectl apply`, so it succeeds whether or not the namespace
//! already exists.

use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceManifest<'a> {
    api_version: &'static str,
    kind: &'static str,
    metadata: Metadata<'a>,
}

#[derive(Debug, Serialize)]
struct Metadata<'a> {
    name: &'a str,
}

/// Single-document YAML for a `v1/Namespace` called `name`.
pub fn namespace_manifest(name: &str) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(&NamespaceManifest {
        api_version: "v1",
        kind: "Namespace",
        metadata: Metadata { name },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_shape() {
        let yaml = namespace_manifest("echo-dev").unwrap();
        assert_eq!(
            yaml,
            "apiVersion: v1\nkind: Namespace\nmetadata:\n  name: echo-dev\n"
        );
    }

    #[test]
    fn manifest_parses_back() {
        let yaml = namespace_manifest("team-a").unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(value["metadata"]["name"].as_str(), Some("team-a"));
        assert_eq!(value["kind"].as_str(), Some("Namespace"));
    }
}

//! Domain types for a single deployment run.
//!
//! Everything here is created once from the configuration and read-only
//! afterwards.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Build context
// ---------------------------------------------------------------------------

/// Metadata describing the build that triggered the deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildMetadata {
    pub build_number: String,
    pub commit: String,
    pub branch: String,
    pub tag: String,
}

/// Identifies the cluster (and optionally the Kubernetes namespace) to deploy to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterTarget {
    pub project: String,
    pub zone: String,
    pub cluster: String,
    /// Empty when no namespace is configured.
    pub namespace: String,
}

impl ClusterTarget {
    /// Name of the kubeconfig context `gcloud container clusters get-credentials`
    /// creates for this cluster: `gke_<project>_<zone>_<cluster>`.
    pub fn context_name(&self) -> String {
        ["gke", &self.project, &self.zone, &self.cluster].join("_")
    }

    /// The configured Kubernetes namespace, if any.
    pub fn namespace(&self) -> Option<&str> {
        if self.namespace.is_empty() {
            None
        } else {
            Some(&self.namespace)
        }
    }
}

/// Immutable record of build metadata plus the cluster target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildContext {
    pub build: BuildMetadata,
    pub target: ClusterTarget,
}

impl BuildContext {
    /// Built-in variable names, in the order they are seeded.
    pub const KEYS: [&'static str; 8] = [
        "BUILD_NUMBER",
        "COMMIT",
        "BRANCH",
        "TAG",
        "project",
        "zone",
        "cluster",
        "namespace",
    ];

    /// Built-in variables as `(name, value)` pairs, same order as [`Self::KEYS`].
    pub fn builtins(&self) -> [(&'static str, &str); 8] {
        [
            ("BUILD_NUMBER", self.build.build_number.as_str()),
            ("COMMIT", self.build.commit.as_str()),
            ("BRANCH", self.build.branch.as_str()),
            ("TAG", self.build.tag.as_str()),
            ("project", self.target.project.as_str()),
            ("zone", self.target.zone.as_str()),
            ("cluster", self.target.cluster.as_str()),
            ("namespace", self.target.namespace.as_str()),
        ]
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// Default path of the required resource template.
pub const DEFAULT_KUBE_TEMPLATE: &str = ".kube.yml";

/// Default path of the optional Secret resource template.
pub const DEFAULT_SECRET_TEMPLATE: &str = ".kube.sec.yml";

/// Which variable namespace a template renders against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Built-ins and user variables only. Safe to print.
    Public,
    /// Public plus collected secrets. Never printed.
    Secret,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Public => write!(f, "public"),
            Scope::Secret => write!(f, "secret"),
        }
    }
}

/// A template file to render: where it lives, whether it must exist, and which
/// namespace it sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDescriptor {
    pub path: PathBuf,
    pub required: bool,
    pub scope: Scope,
}

impl TemplateDescriptor {
    /// The required resource template, rendered against the public namespace.
    pub fn resource(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            required: true,
            scope: Scope::Public,
        }
    }

    /// The optional Secret resource template, rendered against the secret namespace.
    pub fn secret_resource(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            required: false,
            scope: Scope::Secret,
        }
    }

    /// The two default descriptors in their rendering order. Empty paths fall
    /// back to the defaults.
    pub fn defaults(kube_template: &str, secret_template: &str) -> Vec<Self> {
        let kube = if kube_template.is_empty() {
            DEFAULT_KUBE_TEMPLATE
        } else {
            kube_template
        };
        let secret = if secret_template.is_empty() {
            DEFAULT_SECRET_TEMPLATE
        } else {
            secret_template
        };
        vec![Self::resource(kube), Self::secret_resource(secret)]
    }
}

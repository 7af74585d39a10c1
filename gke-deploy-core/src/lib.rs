//! gke-deploy core library — build context, secrets, variable namespaces.
//!
//! - [`types`] — build context, cluster target, template descriptors
//! - [`env`] — environment snapshot handed to child processes
//! - [`secrets`] — `SECRET_*` collection
//! - [`vars`] — public / secret variable namespaces
//! - [`credentials`] — service account payload and project inference
//! - [`error`] — [`CoreError`]

pub mod credentials;
pub mod env;
pub mod error;
pub mod secrets;
pub mod types;
pub mod vars;

pub use credentials::CredentialPayload;
pub use env::EnvSnapshot;
pub use error::CoreError;
pub use secrets::{collect_secrets, SecretSet, SECRET_PREFIX};
pub use types::{
    BuildContext, BuildMetadata, ClusterTarget, Scope, TemplateDescriptor,
    DEFAULT_KUBE_TEMPLATE, DEFAULT_SECRET_TEMPLATE,
};
pub use vars::{build_namespaces, parse_user_vars, Namespaces, VariableNamespace};

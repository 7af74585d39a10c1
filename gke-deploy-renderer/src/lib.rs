//! # gke-deploy-renderer
//!
//! Tera-based renderer that turns Kubernetes manifest templates into
//! manifests, using a [`VariableNamespace`](gke_deploy_core::VariableNamespace)
//! as the only source of names.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use gke_deploy_core::{TemplateDescriptor, Namespaces};
//! use gke_deploy_renderer::TemplateEngine;
//!
//! fn render(ns: &Namespaces) {
//!     let engine = TemplateEngine::new();
//!     let descriptors = TemplateDescriptor::defaults("", "");
//!     if let Ok(manifests) = engine.render_all(&descriptors, &ns.public, &ns.secret, Path::new("/tmp")) {
//!         for m in manifests {
//!             println!("{} -> {}", m.template.display(), m.output.display());
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;
mod filters;
mod strict;

pub use engine::{RenderedManifest, TemplateEngine};
pub use error::RenderError;

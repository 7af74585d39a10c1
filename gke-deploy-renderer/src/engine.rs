//! Tera rendering engine — [`TemplateEngine`] and [`RenderedManifest`].
//!
//! Rendering is strict: referencing a name that is not in the namespace is an
//! error ([`RenderError::UndefinedVariable`]), whether it is interpolated or
//! only tested in a condition.

use std::path::{Component, Path, PathBuf};

use tera::Tera;

use gke_deploy_core::{Scope, TemplateDescriptor, VariableNamespace};

use crate::context::to_tera_context;
use crate::error::{io_err, RenderError};
use crate::filters;
use crate::strict;

// ---------------------------------------------------------------------------
// Error classification
// ---------------------------------------------------------------------------

/// Tera reports lookups of unknown names as
/// ``Variable `<name>` not found in context while rendering '<template>'``.
fn undefined_variable(message: &str) -> Option<String> {
    let rest = message.strip_prefix("Variable `")?;
    let (name, tail) = rest.split_once('`')?;
    tail.starts_with(" not found in context").then(|| name.to_string())
}

fn classify(template: &str, err: tera::Error) -> RenderError {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(&err);
    while let Some(e) = current {
        if let Some(name) = undefined_variable(&e.to_string()) {
            return RenderError::UndefinedVariable {
                name,
                template: template.to_string(),
            };
        }
        current = e.source();
    }
    RenderError::Tera(err)
}

/// Output location for `template` under `out_dir`, keeping only the normal
/// components of the template path so the result never escapes `out_dir`.
fn output_path(out_dir: &Path, template: &Path) -> PathBuf {
    let relative: PathBuf = template
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();
    out_dir.join(relative)
}

// ---------------------------------------------------------------------------
// RenderedManifest
// ---------------------------------------------------------------------------

/// A template rendered to disk.
///
/// `Debug` omits the content of secret-scoped manifests.
#[derive(Clone, PartialEq, Eq)]
pub struct RenderedManifest {
    /// Template the manifest was rendered from.
    pub template: PathBuf,
    /// Where the rendered manifest was written.
    pub output: PathBuf,
    /// Namespace it was rendered against. Secret-scoped output must never be
    /// printed.
    pub scope: Scope,
    /// What was written to `output`.
    pub content: String,
}

impl RenderedManifest {
    /// The rendered text, or `None` for secret-scoped manifests.
    pub fn printable(&self) -> Option<&str> {
        match self.scope {
            Scope::Public => Some(&self.content),
            Scope::Secret => None,
        }
    }
}

impl std::fmt::Debug for RenderedManifest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedManifest")
            .field("template", &self.template)
            .field("output", &self.output)
            .field("scope", &self.scope)
            .field("content", &self.printable().unwrap_or("<redacted>"))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Tera-based engine with the helper filters from [`crate::filters`].
///
/// Create once and reuse; each render works on a private copy of the base
/// engine so templates never leak between renders.
#[derive(Clone)]
pub struct TemplateEngine {
    tera: Tera,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        filters::register(&mut tera);
        TemplateEngine { tera }
    }

    /// Render `source` (registered under `name`) against `vars`.
    pub fn render_str(
        &self,
        name: &str,
        source: &str,
        vars: &VariableNamespace,
    ) -> Result<String, RenderError> {
        let ctx = to_tera_context(vars)?;
        let mut tera = self.tera.clone();
        tera.add_raw_template(name, source)?;
        if let Some(missing) = strict::unbound(&tera.get_template(name)?.ast, vars) {
            return Err(RenderError::UndefinedVariable {
                name: missing,
                template: name.to_string(),
            });
        }
        tera.render(name, &ctx).map_err(|e| classify(name, e))
    }

    /// Render the template described by `descriptor` into `out_dir`.
    ///
    /// Returns `Ok(None)` when an optional template does not exist. A missing
    /// required template is [`RenderError::TemplateNotFound`].
    pub fn render_file(
        &self,
        descriptor: &TemplateDescriptor,
        vars: &VariableNamespace,
        out_dir: &Path,
    ) -> Result<Option<RenderedManifest>, RenderError> {
        let path = &descriptor.path;
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if descriptor.required {
                    return Err(RenderError::TemplateNotFound { path: path.clone() });
                }
                tracing::warn!(
                    template = %path.display(),
                    "skipping optional template because it was not found"
                );
                return Ok(None);
            }
            Err(e) => return Err(io_err(path, e)),
        };

        let name = path.display().to_string();
        let rendered = self.render_str(&name, &source, vars)?;

        let output = output_path(out_dir, path);
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        std::fs::write(&output, &rendered).map_err(|e| io_err(&output, e))?;

        tracing::info!(
            template = %path.display(),
            output = %output.display(),
            scope = %descriptor.scope,
            "rendered manifest"
        );
        Ok(Some(RenderedManifest {
            template: path.clone(),
            output,
            scope: descriptor.scope,
            content: rendered,
        }))
    }

    /// Render every descriptor in order, skipping missing optional templates.
    ///
    /// Two descriptors resolving to the same output file are rejected before
    /// anything is rendered, so no manifest overwrites another.
    pub fn render_all(
        &self,
        descriptors: &[TemplateDescriptor],
        public: &VariableNamespace,
        secret: &VariableNamespace,
        out_dir: &Path,
    ) -> Result<Vec<RenderedManifest>, RenderError> {
        for (i, first) in descriptors.iter().enumerate() {
            let output = output_path(out_dir, &first.path);
            if let Some(second) = descriptors[i + 1..]
                .iter()
                .find(|d| output_path(out_dir, &d.path) == output)
            {
                return Err(RenderError::OutputConflict {
                    output,
                    first: first.path.clone(),
                    second: second.path.clone(),
                });
            }
        }

        let mut rendered = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let vars = match descriptor.scope {
                Scope::Public => public,
                Scope::Secret => secret,
            };
            if let Some(manifest) = self.render_file(descriptor, vars, out_dir)? {
                rendered.push(manifest);
            }
        }
        Ok(rendered)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

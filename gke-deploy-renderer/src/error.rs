//! Error types for gke-deploy-renderer.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from template rendering operations.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A required template file does not exist.
    #[error("error finding template: {} not found", path.display())]
    TemplateNotFound { path: PathBuf },

    /// The template references a variable that is not in its namespace.
    #[error("template {template} references undefined variable `{name}`")]
    UndefinedVariable { name: String, template: String },

    /// Two templates would be rendered to the same output file.
    #[error(
        "templates {} and {} both render to {}",
        first.display(),
        second.display(),
        output.display()
    )]
    OutputConflict {
        output: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },

    /// Any other Tera failure (syntax error, failing filter, ...).
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Filesystem error while reading a template or writing its output.
    #[error("template io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io {
        path: path.into(),
        source,
    }
}

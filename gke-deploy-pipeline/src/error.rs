//! Error types for gke-deploy-pipeline.

use std::path::PathBuf;

use thiserror::Error;

use gke_deploy_core::CoreError;
use gke_deploy_renderer::RenderError;

use crate::runner::CommandError;
use crate::stage::Stage;

/// All errors that abort a deployment run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input validation, secret collection or namespace construction failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A template could not be rendered.
    #[error("error rendering manifest from template: {0}")]
    Render(#[from] RenderError),

    /// An external command failed during `stage`.
    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: CommandError,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The namespace manifest could not be serialized.
    #[error("namespace manifest YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Writing verbose diagnostics failed.
    #[error("error writing diagnostics: {0}")]
    Output(#[source] std::io::Error),
}

/// Convenience constructor for [`PipelineError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> PipelineError {
    PipelineError::Io {
        path: path.into(),
        source,
    }
}

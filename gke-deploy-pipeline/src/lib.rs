//! # gke-deploy-pipeline
//!
//! Runs a deployment end to end: validation, secrets, rendering, then the
//! `gcloud` / `kubectl` sequence.
//!
//! Call [`Sequencer::run`] with a [`DeployConfig`] and an environment
//! snapshot. External commands go through a [`CommandRunner`];
//! [`ProcessRunner`] spawns real processes.

pub mod commands;
pub mod error;
pub mod manifest;
pub mod runner;
pub mod sequencer;
pub mod stage;
pub mod transient;

pub use commands::Tools;
pub use error::PipelineError;
pub use runner::{CommandError, CommandRunner, Invocation, ProcessRunner};
pub use sequencer::{DeployConfig, DeployReport, Sequencer, CREDENTIALS_ENV, DEFAULT_TRANSIENT_DIR};
pub use stage::Stage;

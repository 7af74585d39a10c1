//! gke-deploy — render Kubernetes manifests and apply them to a GKE cluster.
//!
//! # Usage
//!
//! ```text
//! gke-deploy --token <json> --zone <zone> --cluster <cluster> \
//!     [--project <id>] [--namespace <ns>] [--vars <json>] \
//!     [--kube-template .kube.yml] [--secret-template .kube.sec.yml] \
//!     [--dry-run] [--verbose]
//! ```
//!
//! Every flag also reads an environment variable (`PLUGIN_*`, `TOKEN`,
//! `DRONE_*`), so the binary can run as a CI plugin without arguments.
//! `SECRET_*` environment variables become template variables for the secret
//! template only.

mod commands;

use anyhow::Result;
use clap::Parser;

use commands::deploy::DeployArgs;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "gke-deploy",
    version,
    about = "Render Kubernetes manifest templates and apply them to a GKE cluster",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    deploy: DeployArgs,
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.deploy.verbose);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "gke-deploy starting");
    cli.deploy.run()
}

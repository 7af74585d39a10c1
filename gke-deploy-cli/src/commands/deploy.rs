//! Deployment arguments and their conversion into a [`DeployConfig`].

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::Args;

use gke_deploy_core::{BuildMetadata, EnvSnapshot, DEFAULT_KUBE_TEMPLATE, DEFAULT_SECRET_TEMPLATE};
use gke_deploy_pipeline::{
    DeployConfig, DeployReport, ProcessRunner, Sequencer, Tools, DEFAULT_TRANSIENT_DIR,
};

/// Arguments for a deployment run.
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Do not apply the Kubernetes manifests to the API server.
    #[arg(long, env = "PLUGIN_DRY_RUN", value_parser = BoolishValueParser::new())]
    pub dry_run: bool,

    /// Dump available vars and the generated Kubernetes manifest, keeping secrets hidden.
    #[arg(long, env = "PLUGIN_VERBOSE", value_parser = BoolishValueParser::new())]
    pub verbose: bool,

    /// Service account's JSON credentials.
    #[arg(long, env = "TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// GCP project name; inferred from the token when omitted.
    #[arg(long, env = "PLUGIN_PROJECT")]
    pub project: Option<String>,

    /// Zone of the container cluster.
    #[arg(long, env = "PLUGIN_ZONE")]
    pub zone: Option<String>,

    /// Name of the container cluster.
    #[arg(long, env = "PLUGIN_CLUSTER")]
    pub cluster: Option<String>,

    /// Kubernetes namespace to operate in.
    #[arg(long, env = "PLUGIN_NAMESPACE")]
    pub namespace: Option<String>,

    /// Template for Kubernetes resources, e.g. deployments.
    #[arg(long, env = "PLUGIN_TEMPLATE", default_value = DEFAULT_KUBE_TEMPLATE)]
    pub kube_template: String,

    /// Optional template for Kubernetes Secret resources.
    #[arg(long, env = "PLUGIN_SECRET_TEMPLATE", default_value = DEFAULT_SECRET_TEMPLATE)]
    pub secret_template: String,

    /// Variables to use while templating manifests, as a JSON object.
    #[arg(long, env = "PLUGIN_VARS")]
    pub vars: Option<String>,

    /// Build number of the triggering build.
    #[arg(long, env = "DRONE_BUILD_NUMBER")]
    pub drone_build_number: Option<String>,

    /// Git commit hash.
    #[arg(long, env = "DRONE_COMMIT")]
    pub drone_commit: Option<String>,

    /// Git branch.
    #[arg(long, env = "DRONE_BRANCH")]
    pub drone_branch: Option<String>,

    /// Git tag.
    #[arg(long, env = "DRONE_TAG")]
    pub drone_tag: Option<String>,

    /// `gcloud` executable.
    #[arg(long = "gcloud", env = "PLUGIN_GCLOUD_BIN", default_value = "gcloud")]
    pub gcloud_bin: String,

    /// `kubectl` executable.
    #[arg(long = "kubectl", env = "PLUGIN_KUBECTL_BIN", default_value = "kubectl")]
    pub kubectl_bin: String,

    /// Directory for the key file, namespace manifest and rendered manifests.
    #[arg(long, env = "PLUGIN_TRANSIENT_DIR", default_value = DEFAULT_TRANSIENT_DIR)]
    pub transient_dir: PathBuf,
}

impl DeployArgs {
    fn into_config(self) -> DeployConfig {
        DeployConfig {
            token: self.token.unwrap_or_default(),
            project: self.project,
            zone: self.zone.unwrap_or_default(),
            cluster: self.cluster.unwrap_or_default(),
            namespace: self.namespace,
            kube_template: self.kube_template,
            secret_template: self.secret_template,
            vars: self.vars.unwrap_or_default(),
            dry_run: self.dry_run,
            verbose: self.verbose,
            build: BuildMetadata {
                build_number: self.drone_build_number.unwrap_or_default(),
                commit: self.drone_commit.unwrap_or_default(),
                branch: self.drone_branch.unwrap_or_default(),
                tag: self.drone_tag.unwrap_or_default(),
            },
            tools: Tools {
                gcloud: self.gcloud_bin,
                kubectl: self.kubectl_bin,
            },
            transient_dir: self.transient_dir,
            working_dir: None,
        }
    }

    pub fn run(self) -> Result<()> {
        let config = self.into_config();
        let env = EnvSnapshot::from_process();

        let mut sequencer = Sequencer::new(ProcessRunner, io::stdout().lock());
        let report = sequencer.run(&config, env).context("deployment failed")?;
        print_report(&report);
        Ok(())
    }
}

fn summary(report: &DeployReport) -> String {
    let count = report.manifests.len();
    if report.dry_run {
        format!("[dry-run] ✓ would apply {count} manifest(s)")
    } else {
        format!("✓ applied {count} manifest(s)")
    }
}

fn print_report(report: &DeployReport) {
    println!("{}", summary(report));
    if let Some(ns) = &report.namespace_manifest {
        println!("  ·  {}", ns.display());
    }
    for m in &report.manifests {
        println!("  ✎  {} -> {}", m.template.display(), m.output.display());
    }
}

//! Deployment sequencer.
//!
//! ## Order of operations
//!
//! 1. Validate inputs (token, project, zone, cluster).
//! 2. Collect `SECRET_*` entries out of the environment snapshot.
//! 3. Build the public and secret variable namespaces.
//! 4. Render templates into the transient directory.
//! 5. Write the credential file, activate the service account, fetch cluster
//!    credentials, print the `kubectl` version.
//! 6. With a namespace configured: switch the context to it and apply the
//!    namespace manifest.
//! 7. Validate all manifests with a dry-run apply.
//! 8. Apply all manifests (dry-run again when so configured).
//!
//! Steps 1–4 touch no external tool, so bad input never reaches the cluster.
//! The first failure aborts the run. Nothing is rolled back.

use std::io::Write;
use std::path::PathBuf;

use gke_deploy_core::{
    build_namespaces, collect_secrets, parse_user_vars, BuildContext, BuildMetadata,
    ClusterTarget, CoreError, CredentialPayload, EnvSnapshot, TemplateDescriptor,
};
use gke_deploy_renderer::{RenderedManifest, TemplateEngine};

use crate::commands::{self, Tools};
use crate::error::PipelineError;
use crate::manifest::namespace_manifest;
use crate::runner::{CommandRunner, Invocation};
use crate::stage::Stage;
use crate::transient::{write_private, CredentialFile, NAMESPACE_FILE};

/// Environment variable pointing Google client libraries at the key file.
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Default location of every transient file.
pub const DEFAULT_TRANSIENT_DIR: &str = "/tmp";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Everything one run needs, as supplied by the caller. Validated by
/// [`Sequencer::run`].
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Service account JSON key.
    pub token: String,
    /// Overrides the key's `project_id` when set.
    pub project: Option<String>,
    pub zone: String,
    pub cluster: String,
    pub namespace: Option<String>,
    pub kube_template: String,
    pub secret_template: String,
    /// JSON object of user variables.
    pub vars: String,
    pub dry_run: bool,
    pub verbose: bool,
    pub build: BuildMetadata,
    pub tools: Tools,
    pub transient_dir: PathBuf,
    /// Working directory for external commands; `None` inherits ours.
    pub working_dir: Option<PathBuf>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            project: None,
            zone: String::new(),
            cluster: String::new(),
            namespace: None,
            kube_template: gke_deploy_core::DEFAULT_KUBE_TEMPLATE.to_string(),
            secret_template: gke_deploy_core::DEFAULT_SECRET_TEMPLATE.to_string(),
            vars: String::new(),
            dry_run: false,
            verbose: false,
            build: BuildMetadata::default(),
            tools: Tools::default(),
            transient_dir: PathBuf::from(DEFAULT_TRANSIENT_DIR),
            working_dir: None,
        }
    }
}

fn required(value: &str, name: &'static str) -> Result<String, CoreError> {
    let value = value.trim();
    if value.is_empty() {
        Err(CoreError::MissingParam(name))
    } else {
        Ok(value.to_string())
    }
}

impl DeployConfig {
    /// Check required inputs and resolve the project.
    fn validate(&self) -> Result<(CredentialPayload, BuildContext), CoreError> {
        let payload = CredentialPayload::new(&self.token)?;
        let project = payload.resolve_project(self.project.as_deref())?;
        let zone = required(&self.zone, "zone")?;
        let cluster = required(&self.cluster, "cluster")?;

        let ctx = BuildContext {
            build: self.build.clone(),
            target: ClusterTarget {
                project,
                zone,
                cluster,
                namespace: self
                    .namespace
                    .as_deref()
                    .map(str::trim)
                    .unwrap_or_default()
                    .to_string(),
            },
        };
        Ok((payload, ctx))
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    /// Rendered manifests, in template order.
    pub manifests: Vec<RenderedManifest>,
    /// The namespace manifest, when a namespace was configured.
    pub namespace_manifest: Option<PathBuf>,
    pub dry_run: bool,
}

// ---------------------------------------------------------------------------
// Sequencer
// ---------------------------------------------------------------------------

/// Drives one deployment through a [`CommandRunner`], writing verbose
/// diagnostics to `out`.
pub struct Sequencer<R, W> {
    runner: R,
    out: W,
    engine: TemplateEngine,
}

impl<R: CommandRunner, W: Write> Sequencer<R, W> {
    pub fn new(runner: R, out: W) -> Self {
        Self {
            runner,
            out,
            engine: TemplateEngine::new(),
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Run the whole deployment. `env` is the environment snapshot child
    /// processes start from; secrets are removed from it before any command
    /// runs.
    pub fn run(
        &mut self,
        config: &DeployConfig,
        mut env: EnvSnapshot,
    ) -> Result<DeployReport, PipelineError> {
        let (payload, ctx) = config.validate()?;

        let secrets = collect_secrets(&mut env)?;
        let user_vars = parse_user_vars(&config.vars)?;
        let namespaces = build_namespaces(&ctx, &user_vars, &secrets)?;

        if config.verbose {
            self.dump(
                "VARIABLES AVAILABLE FOR TEMPLATES",
                &namespaces.public.to_pretty_json(),
            )?;
        }

        let descriptors =
            TemplateDescriptor::defaults(&config.kube_template, &config.secret_template);
        let manifests = self.engine.render_all(
            &descriptors,
            &namespaces.public,
            &namespaces.secret,
            &config.transient_dir,
        )?;

        if config.verbose {
            for rendered in manifests.iter().filter_map(RenderedManifest::printable) {
                self.dump("RENDERED MANIFEST (Secret Manifest Omitted)", rendered)?;
            }
        }

        // Removed when this function returns, whatever the outcome.
        let key_file = CredentialFile::create(&config.transient_dir, payload.as_str())?;
        env.set(CREDENTIALS_ENV, &key_file.path().display().to_string());

        let tools = &config.tools;
        let cwd = config.working_dir.clone();
        let invoke = |program: &str, args: Vec<String>| {
            Invocation::new(program, args, &env).current_dir(cwd.clone())
        };

        self.stage(
            Stage::Authenticate,
            &invoke(tools.gcloud.as_str(), commands::activate_service_account(key_file.path())),
        )?;
        self.stage(
            Stage::FetchCredentials,
            &invoke(tools.gcloud.as_str(), commands::get_credentials(&ctx.target)),
        )?;
        self.stage(Stage::Version, &invoke(tools.kubectl.as_str(), commands::version()))?;

        let mut namespace_path = None;
        if let Some(namespace) = ctx.target.namespace() {
            tracing::info!(%namespace, "configuring kubectl to the namespace");
            self.stage(
                Stage::SetContext,
                &invoke(tools.kubectl.as_str(), commands::set_context(&ctx.target, namespace)),
            )?;

            let path = config.transient_dir.join(NAMESPACE_FILE);
            write_private(&path, namespace_manifest(namespace)?.as_bytes())?;

            tracing::info!(%namespace, "ensuring the namespace exists");
            self.stage(
                Stage::EnsureNamespace,
                &invoke(
                    tools.kubectl.as_str(),
                    commands::apply(config.dry_run, std::slice::from_ref(&path)),
                ),
            )?;
            namespace_path = Some(path);
        }

        let files: Vec<PathBuf> = manifests.iter().map(|m| m.output.clone()).collect();

        tracing::info!("validating Kubernetes manifests with a dry-run");
        self.stage(
            Stage::Validate,
            &invoke(tools.kubectl.as_str(), commands::apply(true, &files)),
        )?;

        if config.dry_run {
            tracing::info!("dry-run: manifests will not be persisted");
        } else {
            tracing::info!("applying Kubernetes manifests to the cluster");
        }
        self.stage(
            Stage::Apply,
            &invoke(tools.kubectl.as_str(), commands::apply(config.dry_run, &files)),
        )?;

        Ok(DeployReport {
            manifests,
            namespace_manifest: namespace_path,
            dry_run: config.dry_run,
        })
    }

    fn stage(&mut self, stage: Stage, invocation: &Invocation) -> Result<(), PipelineError> {
        tracing::debug!(%stage, command = %invocation, "stage starting");
        self.runner
            .run(invocation)
            .map_err(|source| PipelineError::Stage { stage, source })
    }

    fn dump(&mut self, title: &str, body: &str) -> Result<(), PipelineError> {
        let rule = "-".repeat(title.len() + 10);
        writeln!(self.out, "\n{rule}\n---- {title} ----\n{rule}")
            .and_then(|_| writeln!(self.out, "{}", body.trim_end()))
            .map_err(PipelineError::Output)
    }
}

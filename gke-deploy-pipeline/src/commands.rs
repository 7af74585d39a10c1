//! Argument builders for the `gcloud` and `kubectl` command lines.
//!
//! The argument shapes are a compatibility contract; change them only together
//! with the tests below.

use std::path::{Path, PathBuf};

use gke_deploy_core::ClusterTarget;

/// Program names (or paths) of the external tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tools {
    pub gcloud: String,
    pub kubectl: String,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            gcloud: "gcloud".to_string(),
            kubectl: "kubectl".to_string(),
        }
    }
}

fn strings<const N: usize>(args: [&str; N]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// `gcloud auth activate-service-account --key-file <path>`
pub fn activate_service_account(key_file: &Path) -> Vec<String> {
    let key_file = key_file.display().to_string();
    strings(["auth", "activate-service-account", "--key-file", &key_file])
}

/// `gcloud container clusters get-credentials <cluster> --project <project> --zone <zone>`
pub fn get_credentials(target: &ClusterTarget) -> Vec<String> {
    strings([
        "container",
        "clusters",
        "get-credentials",
        &target.cluster,
        "--project",
        &target.project,
        "--zone",
        &target.zone,
    ])
}

/// `kubectl version`
pub fn version() -> Vec<String> {
    strings(["version"])
}

/// `kubectl config set-context gke_<project>_<zone>_<cluster> --namespace <namespace>`
pub fn set_context(target: &ClusterTarget, namespace: &str) -> Vec<String> {
    let context = target.context_name();
    strings(["config", "set-context", &context, "--namespace", namespace])
}

/// `kubectl apply --record [--dry-run] --filename <a,b,...>`
pub fn apply(dry_run: bool, files: &[PathBuf]) -> Vec<String> {
    let mut args = strings(["apply", "--record"]);
    if dry_run {
        args.push("--dry-run".to_string());
    }
    args.push("--filename".to_string());
    args.push(
        files
            .iter()
            .map(|f| f.display().to_string())
            .collect::<Vec<_>>()
            .join(","),
    );
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> ClusterTarget {
        ClusterTarget {
            project: "acme".into(),
            zone: "us-central1-a".into(),
            cluster: "prod".into(),
            namespace: "web".into(),
        }
    }

    #[test]
    fn activate_args() {
        assert_eq!(
            activate_service_account(Path::new("/tmp/gcloud.json")),
            ["auth", "activate-service-account", "--key-file", "/tmp/gcloud.json"]
        );
    }

    #[test]
    fn get_credentials_args() {
        assert_eq!(
            get_credentials(&target()),
            [
                "container",
                "clusters",
                "get-credentials",
                "prod",
                "--project",
                "acme",
                "--zone",
                "us-central1-a"
            ]
        );
    }

    #[test]
    fn set_context_args() {
        assert_eq!(
            set_context(&target(), "web"),
            [
                "config",
                "set-context",
                "gke_acme_us-central1-a_prod",
                "--namespace",
                "web"
            ]
        );
    }

    #[test]
    fn apply_single_file() {
        assert_eq!(
            apply(false, &[PathBuf::from("/tmp/.kube.yml")]),
            ["apply", "--record", "--filename", "/tmp/.kube.yml"]
        );
    }

    #[test]
    fn apply_dry_run_joins_files_with_commas() {
        let files = [
            PathBuf::from("/tmp/.kube.yml"),
            PathBuf::from("/tmp/.kube.sec.yml"),
        ];
        assert_eq!(
            apply(true, &files),
            [
                "apply",
                "--record",
                "--dry-run",
                "--filename",
                "/tmp/.kube.yml,/tmp/.kube.sec.yml"
            ]
        );
    }
}

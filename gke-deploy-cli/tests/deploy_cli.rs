//! Binary tests against fake `gcloud` / `kubectl` scripts that log their argv.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const TOKEN: &str = r#"{"type":"service_account","project_id":"acme"}"#;

const DEPLOYMENT: &str = "\
kind: Deployment
metadata:
  name: {{ app }}
spec:
  image: {{ image }}
";

struct Sandbox {
    root: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let sb = Self {
            root: TempDir::new().unwrap(),
        };
        fs::create_dir_all(sb.work()).unwrap();
        fs::create_dir_all(sb.transient()).unwrap();
        sb.fake_tool("gcloud", 0);
        sb.fake_tool("kubectl", 0);
        fs::write(sb.work().join(".kube.yml"), DEPLOYMENT).unwrap();
        sb
    }

    fn work(&self) -> PathBuf {
        self.root.path().join("work")
    }

    fn transient(&self) -> PathBuf {
        self.root.path().join("transient")
    }

    fn log(&self) -> PathBuf {
        self.root.path().join("calls.log")
    }

    fn tool(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    /// A script that appends `<name> <args> secret=<SECRET_API_TOKEN>` to the
    /// call log and exits with `status` when invoked as `<name> version`.
    fn fake_tool(&self, name: &str, version_status: i32) {
        let path = self.tool(name);
        let script = format!(
            "#!/bin/sh\n\
             echo \"{name} $* secret=${{SECRET_API_TOKEN:-unset}}\" >> \"$CALL_LOG\"\n\
             if [ \"$1\" = version ]; then exit {version_status}; fi\n\
             exit 0\n"
        );
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("gke-deploy").unwrap();
        cmd.current_dir(self.work())
            .env("CALL_LOG", self.log())
            .env("TOKEN", TOKEN)
            .env("PLUGIN_ZONE", "us-east1-b")
            .env("PLUGIN_CLUSTER", "main")
            .env("PLUGIN_VARS", r#"{"app":"echo","image":"x:1.4"}"#)
            .env("PLUGIN_GCLOUD_BIN", self.tool("gcloud"))
            .env("PLUGIN_KUBECTL_BIN", self.tool("kubectl"))
            .env("PLUGIN_TRANSIENT_DIR", self.transient())
            .env_remove("PLUGIN_PROJECT")
            .env_remove("PLUGIN_NAMESPACE")
            .env_remove("PLUGIN_DRY_RUN")
            .env_remove("PLUGIN_VERBOSE")
            .env_remove("PLUGIN_TEMPLATE")
            .env_remove("PLUGIN_SECRET_TEMPLATE");
        cmd
    }

    fn calls(&self) -> Vec<String> {
        read_lines(&self.log())
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

#[test]
fn dry_run_renders_and_only_dry_runs() {
    let sb = Sandbox::new();

    sb.cmd()
        .env("PLUGIN_DRY_RUN", "true")
        .env("SECRET_API_TOKEN", "123")
        .assert()
        .success()
        .stdout(predicate::str::contains("[dry-run] ✓ would apply 1 manifest(s)"));

    let rendered = fs::read_to_string(sb.transient().join(".kube.yml")).unwrap();
    assert!(rendered.contains("name: echo"));
    assert!(rendered.contains("image: x:1.4"));

    let key = sb.transient().join("gcloud.json");
    let manifest = sb.transient().join(".kube.yml");
    assert_eq!(
        sb.calls(),
        vec![
            format!(
                "gcloud auth activate-service-account --key-file {} secret=unset",
                key.display()
            ),
            "gcloud container clusters get-credentials main --project acme --zone us-east1-b secret=unset"
                .to_string(),
            "kubectl version secret=unset".to_string(),
            format!(
                "kubectl apply --record --dry-run --filename {} secret=unset",
                manifest.display()
            ),
            format!(
                "kubectl apply --record --dry-run --filename {} secret=unset",
                manifest.display()
            ),
        ]
    );
    assert!(!key.exists(), "key file must be removed");
}

#[test]
fn verbose_never_prints_secret_manifest() {
    let sb = Sandbox::new();
    fs::write(
        sb.work().join(".kube.sec.yml"),
        "kind: Secret\ndata:\n  token: {{ API_TOKEN | b64enc }}\n",
    )
    .unwrap();

    sb.cmd()
        .env("PLUGIN_VERBOSE", "true")
        .env("SECRET_API_TOKEN", "123")
        .assert()
        .success()
        .stdout(predicate::str::contains("VARIABLES AVAILABLE FOR TEMPLATES"))
        .stdout(predicate::str::contains("MTIz").not());

    let secret = fs::read_to_string(sb.transient().join(".kube.sec.yml")).unwrap();
    assert!(secret.contains("token: MTIz"));
}

#[test]
fn shadowing_var_fails_without_running_anything() {
    let sb = Sandbox::new();

    sb.cmd()
        .env("PLUGIN_VARS", r#"{"project":"mine"}"#)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("shadows existing var"));

    assert!(sb.calls().is_empty());
    assert!(!sb.transient().join(".kube.yml").exists());
}

#[test]
fn missing_zone_is_reported() {
    let sb = Sandbox::new();

    sb.cmd()
        .env_remove("PLUGIN_ZONE")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("missing required param: zone"));

    assert!(sb.calls().is_empty());
}

#[test]
fn failing_command_aborts_with_status_1() {
    let sb = Sandbox::new();
    sb.fake_tool("kubectl", 3);

    sb.cmd()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("version failed"));

    let calls = sb.calls();
    assert_eq!(calls.len(), 3, "no command may run after the failure: {calls:?}");
    assert!(!sb.transient().join("gcloud.json").exists());
}

//! Variable namespace construction: shadowing rules and public ⊆ secret.

use gke_deploy_core::{
    build_namespaces, parse_user_vars, BuildContext, BuildMetadata, ClusterTarget, CoreError,
    SecretSet,
};
use predicates::prelude::*;
use rstest::rstest;
use serde_json::json;

fn ctx() -> BuildContext {
    BuildContext {
        build: BuildMetadata {
            build_number: "42".into(),
            commit: "deadbeef".into(),
            branch: "main".into(),
            tag: String::new(),
        },
        target: ClusterTarget {
            project: "acme".into(),
            zone: "europe-west1-b".into(),
            cluster: "prod".into(),
            namespace: "echo".into(),
        },
    }
}

fn secrets(pairs: &[(&str, &str)]) -> SecretSet {
    pairs.iter().copied().collect()
}

// ---------------------------------------------------------------------------
// 1. Successful construction
// ---------------------------------------------------------------------------

#[test]
fn builtins_are_seeded() {
    let ns = build_namespaces(&ctx(), &Default::default(), &SecretSet::default()).unwrap();
    assert_eq!(ns.public.get("BUILD_NUMBER"), Some(&json!("42")));
    assert_eq!(ns.public.get("COMMIT"), Some(&json!("deadbeef")));
    assert_eq!(ns.public.get("TAG"), Some(&json!("")));
    assert_eq!(ns.public.get("project"), Some(&json!("acme")));
    assert_eq!(ns.public.get("namespace"), Some(&json!("echo")));
    assert_eq!(ns.public.len(), BuildContext::KEYS.len());
}

#[test]
fn public_is_subset_and_difference_is_secrets() {
    let vars = parse_user_vars(r#"{"app":"echo","env":"dev","image":"x:1.4"}"#).unwrap();
    let input = secrets(&[("API_TOKEN", "123"), ("DB_PASSWORD", "pw")]);
    let ns = build_namespaces(&ctx(), &vars, &input).unwrap();

    for (name, value) in ns.public.iter() {
        assert_eq!(ns.secret.get(name), Some(value), "{name} missing from secret");
    }

    let extra: Vec<_> = ns
        .secret
        .names()
        .filter(|n| !ns.public.contains(n))
        .collect();
    let expected: Vec<_> = input.names().collect();
    assert_eq!(extra, expected);
    assert_eq!(ns.secret.get("API_TOKEN"), Some(&json!("123")));
    assert!(!ns.public.contains("API_TOKEN"));
}

#[test]
fn public_dump_never_contains_secret_values() {
    let ns = build_namespaces(
        &ctx(),
        &Default::default(),
        &secrets(&[("API_TOKEN", "s3cr3t-value")]),
    )
    .unwrap();
    let dump = ns.public.to_pretty_json();
    assert!(predicate::str::contains("s3cr3t-value").not().eval(&dump));
    assert!(predicate::str::contains("\"project\": \"acme\"").eval(&dump));
}

// ---------------------------------------------------------------------------
// 2. Shadowing
// ---------------------------------------------------------------------------

#[rstest]
#[case("project")]
#[case("BUILD_NUMBER")]
#[case("namespace")]
fn user_var_shadowing_builtin_fails(#[case] name: &str) {
    let vars = parse_user_vars(&format!(r#"{{"{name}": "x"}}"#)).unwrap();
    let err = build_namespaces(&ctx(), &vars, &SecretSet::default()).unwrap_err();
    assert!(
        matches!(err, CoreError::VariableShadowsBuiltin { name: ref n } if n == name),
        "got: {err}"
    );
}

#[rstest]
#[case::user_var("app")]
#[case::builtin("cluster")]
fn secret_shadowing_variable_fails(#[case] name: &str) {
    let vars = parse_user_vars(r#"{"app":"echo"}"#).unwrap();
    let err = build_namespaces(&ctx(), &vars, &secrets(&[(name, "v")])).unwrap_err();
    assert!(
        matches!(err, CoreError::SecretShadowsVariable { name: ref n } if n == name),
        "got: {err}"
    );
}

#[test]
fn shadow_error_is_deterministic() {
    let vars = parse_user_vars(r#"{"zone":"a","project":"b"}"#).unwrap();
    let first = build_namespaces(&ctx(), &vars, &SecretSet::default())
        .unwrap_err()
        .to_string();
    for _ in 0..5 {
        let again = build_namespaces(&ctx(), &vars, &SecretSet::default())
            .unwrap_err()
            .to_string();
        assert_eq!(first, again);
    }
}

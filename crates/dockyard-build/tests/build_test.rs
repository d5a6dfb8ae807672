use std::collections::BTreeSet;
use std::path::PathBuf;

use dockyard_build::{ImagePlan, PlanError, Variant, plan_release};
use dockyard_core::{DockyardConfig, ReleaseVersion};
use tempfile::TempDir;

fn v(s: &str) -> ReleaseVersion {
    ReleaseVersion::parse(s).unwrap()
}

fn amd64() -> Vec<String> {
    vec!["linux/amd64".to_owned()]
}

fn all_tags(plans: &[ImagePlan]) -> BTreeSet<String> {
    plans.iter().flat_map(|p| p.all_refs()).collect()
}

// ── Tag Set Tests ──

#[test]
fn release_produces_exactly_four_tags() {
    let config = DockyardConfig::default();
    let plans = plan_release(&v("5.1.0"), &config, &amd64());

    let tags = all_tags(&plans);

    let expected: BTreeSet<String> = [
        "naskio/strapi:5.1.0",
        "naskio/strapi:latest",
        "naskio/strapi:5.1.0-alpine",
        "naskio/strapi:latest-alpine",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect();
    assert_eq!(tags, expected);
}

#[test]
fn prerelease_tags_use_version_verbatim() {
    let config = DockyardConfig::default();
    let plans = plan_release(&v("5.0.0-rc.1"), &config, &amd64());

    let tags = all_tags(&plans);

    assert!(tags.contains("naskio/strapi:5.0.0-rc.1"));
    assert!(tags.contains("naskio/strapi:5.0.0-rc.1-alpine"));
    assert!(tags.contains("naskio/strapi:latest"));
    assert!(tags.contains("naskio/strapi:latest-alpine"));
    assert_eq!(tags.len(), 4);
}

#[test]
fn plans_are_in_publish_order() {
    let config = DockyardConfig::default();
    let plans = plan_release(&v("5.1.0"), &config, &amd64());

    let variants: Vec<Variant> = plans.iter().map(|p| p.variant).collect();
    assert_eq!(variants, vec![Variant::Debian, Variant::Alpine]);
}

#[test]
fn primary_ref_is_versioned_tag() {
    let config = DockyardConfig::default();
    let plans = plan_release(&v("5.1.0"), &config, &amd64());

    assert_eq!(plans[0].primary_ref(), "naskio/strapi:5.1.0");
    assert_eq!(plans[1].primary_ref(), "naskio/strapi:5.1.0-alpine");
    assert_eq!(plans[0].alias_refs(), vec!["naskio/strapi:latest"]);
    assert_eq!(plans[1].alias_refs(), vec!["naskio/strapi:latest-alpine"]);
}

#[test]
fn custom_registry_host_prefixes_tags() {
    let mut config = DockyardConfig::default();
    config.registry.host = "ghcr.io".to_owned();
    config.registry.repository = "acme/strapi".to_owned();

    let plans = plan_release(&v("5.1.0"), &config, &amd64());

    assert_eq!(plans[0].primary_ref(), "ghcr.io/acme/strapi:5.1.0");
}

// ── Build Arg Tests ──

#[test]
fn strapi_version_arg_equals_input_exactly() {
    let config = DockyardConfig::default();
    for input in ["5.1.0", "5.0.0-rc.1", "4.25.13"] {
        let plans = plan_release(&v(input), &config, &amd64());
        for plan in &plans {
            assert_eq!(plan.build_arg("STRAPI_VERSION"), Some(input));
            assert!(
                plan.buildx_args(false)
                    .contains(&format!("STRAPI_VERSION={input}"))
            );
        }
    }
}

#[test]
fn node_version_arg_follows_config() {
    let mut config = DockyardConfig::default();
    config.build.node_version = 20;

    let plans = plan_release(&v("5.1.0"), &config, &amd64());

    for plan in &plans {
        assert_eq!(plan.build_arg("NODE_VERSION"), Some("20"));
    }
}

#[test]
fn extra_build_args_follow_fixed_args() {
    let mut config = DockyardConfig::default();
    config
        .build
        .args
        .insert("NPM_REGISTRY".to_owned(), "https://npm.example.com".to_owned());

    let plan = ImagePlan::new(Variant::Debian, &v("5.1.0"), &config, &amd64());

    assert_eq!(plan.build_args.len(), 3);
    assert_eq!(plan.build_args[2].0, "NPM_REGISTRY");
    assert!(
        plan.buildx_args(false)
            .contains(&"NPM_REGISTRY=https://npm.example.com".to_owned())
    );
}

// ── Platform Tests ──

#[test]
fn multiple_platforms_are_comma_joined() {
    let config = DockyardConfig::default();
    let platforms = vec!["linux/amd64".to_owned(), "linux/arm64".to_owned()];

    let plan = ImagePlan::new(Variant::Debian, &v("5.1.0"), &config, &platforms);
    let args = plan.buildx_args(true);

    let idx = args.iter().position(|a| a == "--platform").unwrap();
    assert_eq!(args[idx + 1], "linux/amd64,linux/arm64");
}

// ── Input Check Tests ──

#[test]
fn check_inputs_passes_when_files_exist() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("Dockerfile"), "FROM node:22").unwrap();
    std::fs::write(tmp.path().join("Dockerfile.alpine"), "FROM node:22-alpine").unwrap();
    let config = DockyardConfig::default();

    for plan in plan_release(&v("5.1.0"), &config, &amd64()) {
        plan.check_inputs(tmp.path()).unwrap();
    }
}

#[test]
fn check_inputs_reports_missing_alpine_dockerfile() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("Dockerfile"), "FROM node:22").unwrap();
    let config = DockyardConfig::default();

    let plans = plan_release(&v("5.1.0"), &config, &amd64());

    assert!(plans[0].check_inputs(tmp.path()).is_ok());
    match plans[1].check_inputs(tmp.path()) {
        Err(PlanError::MissingDockerfile { variant, path }) => {
            assert_eq!(variant, Variant::Alpine);
            assert_eq!(path, tmp.path().join("Dockerfile.alpine"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn check_inputs_reports_missing_context() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("Dockerfile"), "FROM node:22").unwrap();
    let mut config = DockyardConfig::default();
    config.build.context = PathBuf::from("docker");

    let plan = ImagePlan::new(Variant::Debian, &v("5.1.0"), &config, &amd64());

    assert!(matches!(
        plan.check_inputs(tmp.path()),
        Err(PlanError::MissingContext { .. })
    ));
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn every_release_has_four_distinct_tags(
            major in 0u64..100,
            minor in 0u64..100,
            patch in 0u64..100,
            pre in proptest::option::of("[a-z]{1,5}\\.[1-9][0-9]?"),
        ) {
            let text = match pre {
                Some(p) => format!("{major}.{minor}.{patch}-{p}"),
                None => format!("{major}.{minor}.{patch}"),
            };
            let version = v(&text);
            let plans = plan_release(&version, &DockyardConfig::default(), &amd64());

            let tags = all_tags(&plans);
            prop_assert_eq!(tags.len(), 4);
            let debian = format!("naskio/strapi:{text}");
            let alpine = format!("naskio/strapi:{text}-alpine");
            prop_assert!(tags.contains(&debian));
            prop_assert!(tags.contains(&alpine));
        }
    }
}

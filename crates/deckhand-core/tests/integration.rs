use deckhand_core::{Builder, CoreError, BUILD_META_FILE};
use deckhand_schema::{BuildConfig, BundleName, ResourceType};
use serde_json::json;
use std::fs;
use std::path::Path;

fn write_json(root: &Path, rel: &str, value: &serde_json::Value) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn sample_project(root: &Path) {
    write_json(
        root,
        "src/lambdas/orders/lambda_config.json",
        &json!({
            "name": "orders",
            "version": "1.0",
            "resource_type": "lambda",
            "runtime": "python3.9",
            "iam_role_name": "orders-role",
            "dependencies": [{"resource_name": "orders-role", "resource_type": "iam_role"}]
        }),
    );
    write_json(
        root,
        "src/lambdas/reports/lambda_config.json",
        &json!({
            "name": "reports",
            "resource_type": "lambda",
            "runtime": "java8",
            "deployment_package": "reports-1.0.jar"
        }),
    );
    write_json(
        root,
        "deployment_resources.json",
        &json!({
            "orders-role": {
                "resource_type": "iam_role",
                "principal_service": "lambda"
            },
            "orders-bucket": {
                "resource_type": "s3_bucket",
                "location": "${region}"
            },
            "shop-api": {
                "resource_type": "api_gateway",
                "deploy_stage": "prod",
                "resources": {"/orders": {"POST": {"lambda_name": "orders"}}},
                "dependencies": [{"resource_name": "orders"}]
            }
        }),
    );
    write_json(
        root,
        "src/reports/deployment_resources.json",
        &json!({
            "shop-api": {
                "resource_type": "api_gateway",
                "deploy_stage": "dev",
                "resources": {"/reports": {"GET": {"lambda_name": "reports"}}},
                "dependencies": [{"resource_name": "reports"}, {"resource_name": "orders"}]
            }
        }),
    );
}

fn config(root: &Path) -> BuildConfig {
    let mut config = BuildConfig::new(root);
    config.resources_prefix = Some("${env}-".to_owned());
    config.aliases.insert("env".to_owned(), "staging".to_owned());
    config.aliases.insert("region".to_owned(), "eu-central-1".to_owned());
    config
}

#[test]
fn create_meta_merges_whole_tree() {
    let project = tempfile::tempdir().unwrap();
    sample_project(project.path());
    let builder = Builder::new(config(project.path()));
    let bundle = BundleName::new("release-1");

    let result = builder.create_meta(&bundle).unwrap();
    assert!(result.meta_path.ends_with(Path::new("bundles/release-1").join(BUILD_META_FILE)));
    assert!(result.meta_path.is_file());

    let m = &result.manifest;
    assert_eq!(m.len(), 5);
    assert_eq!(
        m.get("orders").unwrap().s3_path(),
        Some("release-1/orders-1.0.zip")
    );
    assert_eq!(
        m.get("reports").unwrap().s3_path(),
        Some("release-1/reports-1.0.jar")
    );

    let api = m.get("shop-api").unwrap();
    let resources = api.get("resources").unwrap().as_object().unwrap();
    assert!(resources.contains_key("/orders"));
    assert!(resources.contains_key("/reports"));
    assert_eq!(api.dependency_names().len(), 2);

    assert_eq!(builder.load_meta(&bundle).unwrap(), result.manifest);
}

#[test]
fn earlier_api_descriptor_keeps_its_deploy_stage() {
    let project = tempfile::tempdir().unwrap();
    sample_project(project.path());
    let builder = Builder::new(config(project.path()));
    let m = builder
        .create_resource_manifest(&BundleName::new("b"))
        .unwrap();
    // Entries are walked in file-name order at each level, and
    // "deployment_resources.json" sorts before "src", so the root descriptor
    // is the existing entry and its stage wins.
    assert_eq!(m.get("shop-api").unwrap().get_str("deploy_stage"), Some("prod"));
}

#[test]
fn resolve_meta_applies_prefix_to_global_services() {
    let project = tempfile::tempdir().unwrap();
    sample_project(project.path());
    let builder = Builder::new(config(project.path()));
    let m = builder
        .create_resource_manifest(&BundleName::new("b"))
        .unwrap();

    let resolved = builder.resolve_meta(m).unwrap();
    assert!(resolved.contains("staging-orders-role"));
    assert!(resolved.contains("staging-orders-bucket"));
    assert!(resolved.contains("orders"), "lambdas are not global services");

    let orders = resolved.get("orders").unwrap();
    assert_eq!(orders.get_str("iam_role_name"), Some("staging-orders-role"));
    assert_eq!(orders.dependency_names(), vec!["staging-orders-role"]);
    assert_eq!(
        resolved.get("staging-orders-bucket").unwrap().get_str("location"),
        Some("eu-central-1")
    );
}

#[test]
fn custom_global_services_change_what_is_renamed() {
    let project = tempfile::tempdir().unwrap();
    sample_project(project.path());
    let mut cfg = config(project.path());
    cfg.global_services = [ResourceType::Lambda].into_iter().collect();
    let builder = Builder::new(cfg);

    let m = builder
        .create_resource_manifest(&BundleName::new("b"))
        .unwrap();
    let resolved = builder.resolve_meta(m).unwrap();
    assert!(resolved.contains("staging-orders"));
    assert!(resolved.contains("orders-role"));
    let api = resolved.get("shop-api").unwrap();
    assert!(api.dependency_names().contains(&"staging-orders"));
}

#[test]
fn duplicate_unit_descriptor_is_rejected() {
    let project = tempfile::tempdir().unwrap();
    sample_project(project.path());
    let copy = fs::read_to_string(project.path().join("src/lambdas/orders/lambda_config.json"))
        .unwrap();
    fs::create_dir_all(project.path().join("src/lambdas/orders_copy")).unwrap();
    fs::write(
        project.path().join("src/lambdas/orders_copy/lambda_config.json"),
        copy,
    )
    .unwrap();

    let builder = Builder::new(config(project.path()));
    let err = builder
        .create_meta(&BundleName::new("b"))
        .err()
        .expect("duplicate must fail");
    assert!(matches!(err, CoreError::DuplicateResource(ref n) if n == "orders"));
    assert!(err.is_manifest_error());
    assert!(!builder.layout().meta_file(&BundleName::new("b")).exists());
}

#[test]
fn missing_dependency_is_rejected() {
    let project = tempfile::tempdir().unwrap();
    write_json(
        project.path(),
        "deployment_resources.json",
        &json!({
            "topic": {
                "resource_type": "sns_topic",
                "dependencies": [{"resource_name": "subscriber"}]
            }
        }),
    );
    let builder = Builder::new(BuildConfig::new(project.path()));
    let err = builder
        .create_resource_manifest(&BundleName::new("b"))
        .unwrap_err();
    assert!(matches!(err, CoreError::UnresolvedDependency { .. }));
    assert!(err.to_string().contains("deployment_resources.json"));
}

#[test]
fn validate_packages_after_build() {
    let project = tempfile::tempdir().unwrap();
    sample_project(project.path());
    let builder = Builder::new(config(project.path()));
    let bundle = BundleName::new("b");
    let result = builder.create_meta(&bundle).unwrap();

    assert!(matches!(
        builder.validate_packages(&result.manifest),
        Err(CoreError::MissingPackages(ref p)) if p.len() == 2
    ));

    let bundle_dir = builder.layout().bundle_dir(&bundle);
    fs::write(bundle_dir.join("orders-1.0.zip"), b"zip").unwrap();
    fs::write(bundle_dir.join("reports-1.0.jar"), b"jar").unwrap();
    builder.validate_packages(&result.manifest).unwrap();
}

#[test]
fn empty_project_builds_empty_manifest() {
    let project = tempfile::tempdir().unwrap();
    let builder = Builder::new(BuildConfig::new(project.path()));
    let result = builder.create_meta(&BundleName::new("b")).unwrap();
    assert!(result.manifest.is_empty());
}

//! Manifest file output tests
//!
//! Verifies that written manifest files parse as the Kubernetes structures
//! kubectl expects, independent of the typed model that produced them.

use kdeploy::cluster::runner::RealCommandRunner;
use kdeploy::deploy::{DeployOrchestrator, DeployRequest};
use kdeploy::manifest::write_manifests;
use serde_yaml::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

async fn synthesize_to_dir(repo: &Path, out: &Path) {
    // prepare() does no cluster work, so the real runner never executes
    let orchestrator = DeployOrchestrator::new(Arc::new(RealCommandRunner), None);
    let mut request = DeployRequest::new(repo, "demo");
    request.pvc_size = "2Gi".to_string();
    let session = orchestrator.prepare(&request).await.unwrap();
    write_manifests(out, &session.manifests).unwrap();
}

fn load_yaml(path: &Path) -> Value {
    let content = fs::read_to_string(path).unwrap();
    serde_yaml::from_str(&content).unwrap()
}

#[tokio::test]
async fn test_deployment_yaml_structure() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("Dockerfile"),
        "FROM node:20\nEXPOSE 3000 9229\n",
    )
    .unwrap();
    let out = dir.path().join("out");

    synthesize_to_dir(dir.path(), &out).await;
    let doc = load_yaml(&out.join("demo-deployment.yaml"));

    assert_eq!(doc["apiVersion"], "apps/v1");
    assert_eq!(doc["kind"], "Deployment");
    assert_eq!(doc["metadata"]["namespace"], "demo");
    assert_eq!(doc["spec"]["replicas"], 3);
    assert_eq!(doc["spec"]["selector"]["matchLabels"]["app"], "demo");

    let container = &doc["spec"]["template"]["spec"]["containers"][0];
    assert_eq!(container["ports"][0]["containerPort"], 3000);
    assert_eq!(container["ports"][1]["containerPort"], 9229);
    assert_eq!(container["resources"]["requests"]["memory"], "256Mi");
    assert_eq!(container["resources"]["limits"]["cpu"], "500m");

    let env_names: Vec<&str> = container["env"]
        .as_sequence()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(env_names, vec!["NODE_ENV", "BUILD_TIMESTAMP", "DOCKERFILE"]);
}

#[tokio::test]
async fn test_service_yaml_structure() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Dockerfile"), "FROM node:20\nEXPOSE 3000\n").unwrap();
    let out = dir.path().join("out");

    synthesize_to_dir(dir.path(), &out).await;
    let doc = load_yaml(&out.join("demo-service.yaml"));

    assert_eq!(doc["apiVersion"], "v1");
    assert_eq!(doc["kind"], "Service");
    assert_eq!(doc["spec"]["type"], "LoadBalancer");
    assert_eq!(doc["spec"]["ports"][0]["port"], 80);
    assert_eq!(doc["spec"]["ports"][0]["targetPort"], 3000);
    assert_eq!(doc["spec"]["ports"][0]["protocol"], "TCP");
    assert_eq!(doc["spec"]["selector"]["app"], "demo");
}

#[tokio::test]
async fn test_default_ports_when_no_expose() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Dockerfile"), "FROM scratch\n").unwrap();
    let out = dir.path().join("out");

    synthesize_to_dir(dir.path(), &out).await;
    let doc = load_yaml(&out.join("demo-deployment.yaml"));

    let ports: Vec<u64> = doc["spec"]["template"]["spec"]["containers"][0]["ports"]
        .as_sequence()
        .unwrap()
        .iter()
        .map(|p| p["containerPort"].as_u64().unwrap())
        .collect();
    assert_eq!(ports, vec![80, 3000, 8080]);
}

#[tokio::test]
async fn test_configmap_secret_pvc_and_db_init_files() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Dockerfile"), "FROM node:20\nEXPOSE 3000\n").unwrap();
    fs::write(dir.path().join(".env"), "PORT=3000\nDEBUG=false\n").unwrap();
    fs::write(dir.path().join("schema.sql"), "CREATE TABLE a(b int);\n").unwrap();
    let out = dir.path().join("out");

    synthesize_to_dir(dir.path(), &out).await;

    let config = load_yaml(&out.join("demo-config.yaml"));
    assert_eq!(config["kind"], "ConfigMap");
    assert_eq!(config["data"]["PORT"], "3000");
    assert_eq!(config["data"]["DEBUG"], "false");

    let secret = load_yaml(&out.join("demo-secret.yaml"));
    assert_eq!(secret["kind"], "Secret");
    assert_eq!(secret["type"], "Opaque");

    let pvc = load_yaml(&out.join("demo-pvc.yaml"));
    assert_eq!(pvc["kind"], "PersistentVolumeClaim");
    assert_eq!(pvc["spec"]["accessModes"][0], "ReadWriteOnce");
    assert_eq!(pvc["spec"]["resources"]["requests"]["storage"], "2Gi");

    let db_init = load_yaml(&out.join("demo-db-init.yaml"));
    assert_eq!(db_init["kind"], "ConfigMap");
    // Stored base64-encoded, not as raw SQL
    let encoded = db_init["data"]["init.sql"].as_str().unwrap();
    assert!(!encoded.contains("CREATE TABLE"));
}

#[tokio::test]
async fn test_regeneration_is_stable_for_fixed_tag() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Dockerfile"), "FROM node:20\nEXPOSE 3000\n").unwrap();
    let out = dir.path().join("out");

    synthesize_to_dir(dir.path(), &out).await;
    let first = load_yaml(&out.join("demo-service.yaml"));

    synthesize_to_dir(dir.path(), &out).await;
    let second = load_yaml(&out.join("demo-service.yaml"));

    // Services carry no timestamp, so regeneration is byte-stable
    assert_eq!(first, second);
}

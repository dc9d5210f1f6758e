//! Manifest synthesis
//!
//! Pure function of the deployment session: identical scan results and build
//! targets always yield identical resources, in apply order (Services,
//! Deployments, then shared resources). All file contents a resource needs
//! are read into the session beforehand, so synthesis itself does no I/O.

use crate::deploy::session::{BuildTarget, DeploymentSession};
use crate::scan::artifacts::ArtifactKind;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::collections::BTreeMap;

use super::resources::{
    ClaimResources, ClaimSpec, ContainerPort, ContainerSpec, DeploymentSpec, EnvVar,
    LabelSelector, ManifestResource, Metadata, PodSpec, PodTemplateSpec, ResourceBody,
    ResourceKind, ResourceRequirements, ServicePort, ServiceSpec, TemplateMetadata,
    API_VERSION_APPS, API_VERSION_CORE,
};

const REPLICAS: u32 = 3;
const MEMORY_REQUEST: &str = "256Mi";
const CPU_REQUEST: &str = "250m";
const MEMORY_LIMIT: &str = "512Mi";
const CPU_LIMIT: &str = "500m";
const SECONDARY_PORT_BASE: u16 = 8080;

/// Synthesizes the full manifest set for a session.
///
/// Emission order is the fixed apply order: all Services, all Deployments,
/// then shared resources (env ConfigMap, Secret, PVC, db-init ConfigMap).
pub fn synthesize(session: &DeploymentSession) -> Vec<ManifestResource> {
    let mut resources = Vec::new();
    let Some(first_target) = session.targets.first() else {
        return resources;
    };

    resources.push(primary_service(session, first_target));
    for (index, target) in session.targets.iter().enumerate().skip(1) {
        resources.push(secondary_service(session, target, index));
    }

    for target in &session.targets {
        resources.push(deployment(session, target));
    }

    if session.scan.has(ArtifactKind::EnvFile) {
        resources.push(env_configmap(session));
        resources.push(empty_secret(session));
    }

    // PVC and the db-init ConfigMap are emitted together or not at all; an
    // unreadable schema file drops both.
    if session.scan.has(ArtifactKind::SchemaFile) {
        if let Some(sql) = &session.schema_sql {
            resources.push(volume_claim(session));
            resources.push(db_init_configmap(session, sql));
        }
    }

    resources
}

fn deployment(session: &DeploymentSession, target: &BuildTarget) -> ManifestResource {
    let labels = BTreeMap::from([
        ("app".to_string(), target.image_name.clone()),
        ("version".to_string(), "v1".to_string()),
        ("build-timestamp".to_string(), target.tag.clone()),
        ("dockerfile".to_string(), target.build_file_name()),
    ]);
    let template_labels = BTreeMap::from([
        ("app".to_string(), target.image_name.clone()),
        ("build-timestamp".to_string(), target.tag.clone()),
        ("dockerfile".to_string(), target.build_file_name()),
    ]);

    let ports = target
        .effective_ports()
        .into_iter()
        .map(|port| ContainerPort {
            container_port: port,
        })
        .collect();

    ManifestResource {
        api_version: API_VERSION_APPS.to_string(),
        kind: ResourceKind::Deployment,
        metadata: Metadata {
            name: format!("{}-deployment", target.image_name),
            namespace: session.namespace.clone(),
            labels,
        },
        body: ResourceBody::Workload {
            spec: DeploymentSpec {
                replicas: REPLICAS,
                selector: LabelSelector {
                    match_labels: BTreeMap::from([(
                        "app".to_string(),
                        target.image_name.clone(),
                    )]),
                },
                template: PodTemplateSpec {
                    metadata: TemplateMetadata {
                        labels: template_labels,
                    },
                    spec: PodSpec {
                        containers: vec![ContainerSpec {
                            name: target.image_name.clone(),
                            image: target.image_ref(),
                            ports,
                            env: vec![
                                EnvVar {
                                    name: "NODE_ENV".to_string(),
                                    value: "production".to_string(),
                                },
                                EnvVar {
                                    name: "BUILD_TIMESTAMP".to_string(),
                                    value: target.tag.clone(),
                                },
                                EnvVar {
                                    name: "DOCKERFILE".to_string(),
                                    value: target.build_file_name(),
                                },
                            ],
                            resources: ResourceRequirements {
                                requests: BTreeMap::from([
                                    ("memory".to_string(), MEMORY_REQUEST.to_string()),
                                    ("cpu".to_string(), CPU_REQUEST.to_string()),
                                ]),
                                limits: BTreeMap::from([
                                    ("memory".to_string(), MEMORY_LIMIT.to_string()),
                                    ("cpu".to_string(), CPU_LIMIT.to_string()),
                                ]),
                            },
                        }],
                    },
                },
            },
        },
    }
}

fn primary_service(session: &DeploymentSession, first_target: &BuildTarget) -> ManifestResource {
    let target_port = first_target.effective_ports().first().copied().unwrap_or(80);

    ManifestResource {
        api_version: API_VERSION_CORE.to_string(),
        kind: ResourceKind::Service,
        metadata: Metadata {
            name: format!("{}-service", session.repo_name),
            namespace: session.namespace.clone(),
            labels: BTreeMap::from([
                ("app".to_string(), session.repo_name.clone()),
                ("primary-service".to_string(), "true".to_string()),
            ]),
        },
        body: ResourceBody::Service {
            spec: ServiceSpec {
                selector: BTreeMap::from([("app".to_string(), session.repo_name.clone())]),
                ports: vec![ServicePort {
                    port: 80,
                    target_port,
                    protocol: "TCP".to_string(),
                }],
                service_type: "LoadBalancer".to_string(),
            },
        },
    }
}

fn secondary_service(
    session: &DeploymentSession,
    target: &BuildTarget,
    index: usize,
) -> ManifestResource {
    // Sequential offsets avoid collisions without a live port allocator;
    // already-bound host ports are not checked.
    let port = SECONDARY_PORT_BASE + index as u16;
    let target_port = target.effective_ports().first().copied().unwrap_or(3000);

    ManifestResource {
        api_version: API_VERSION_CORE.to_string(),
        kind: ResourceKind::Service,
        metadata: Metadata {
            name: format!("{}-service", target.image_name),
            namespace: session.namespace.clone(),
            labels: BTreeMap::from([
                ("app".to_string(), target.image_name.clone()),
                ("secondary-service".to_string(), "true".to_string()),
            ]),
        },
        body: ResourceBody::Service {
            spec: ServiceSpec {
                selector: BTreeMap::from([("app".to_string(), target.image_name.clone())]),
                ports: vec![ServicePort {
                    port,
                    target_port,
                    protocol: "TCP".to_string(),
                }],
                service_type: "LoadBalancer".to_string(),
            },
        },
    }
}

fn env_configmap(session: &DeploymentSession) -> ManifestResource {
    let data = session
        .env_content
        .as_deref()
        .map(parse_env_content)
        .unwrap_or_default();

    ManifestResource {
        api_version: API_VERSION_CORE.to_string(),
        kind: ResourceKind::ConfigMap,
        metadata: Metadata {
            name: format!("{}-config", session.repo_name),
            namespace: session.namespace.clone(),
            labels: BTreeMap::new(),
        },
        body: ResourceBody::Config { data },
    }
}

fn empty_secret(session: &DeploymentSession) -> ManifestResource {
    // Intentionally empty: secrets are for the operator to populate, never
    // guessed from repository content.
    ManifestResource {
        api_version: API_VERSION_CORE.to_string(),
        kind: ResourceKind::Secret,
        metadata: Metadata {
            name: format!("{}-secret", session.repo_name),
            namespace: session.namespace.clone(),
            labels: BTreeMap::new(),
        },
        body: ResourceBody::Secret {
            secret_type: "Opaque".to_string(),
            data: BTreeMap::new(),
        },
    }
}

fn volume_claim(session: &DeploymentSession) -> ManifestResource {
    ManifestResource {
        api_version: API_VERSION_CORE.to_string(),
        kind: ResourceKind::PersistentVolumeClaim,
        metadata: Metadata {
            name: format!("{}-pvc", session.repo_name),
            namespace: session.namespace.clone(),
            labels: BTreeMap::new(),
        },
        body: ResourceBody::Claim {
            spec: ClaimSpec {
                access_modes: vec!["ReadWriteOnce".to_string()],
                resources: ClaimResources {
                    requests: BTreeMap::from([(
                        "storage".to_string(),
                        session.pvc_size.clone(),
                    )]),
                },
            },
        },
    }
}

fn db_init_configmap(session: &DeploymentSession, sql: &str) -> ManifestResource {
    ManifestResource {
        api_version: API_VERSION_CORE.to_string(),
        kind: ResourceKind::ConfigMap,
        metadata: Metadata {
            name: format!("{}-db-init", session.repo_name),
            namespace: session.namespace.clone(),
            labels: BTreeMap::new(),
        },
        body: ResourceBody::Config {
            data: BTreeMap::from([("init.sql".to_string(), BASE64.encode(sql))]),
        },
    }
}

/// Parses env-file content into ConfigMap data.
///
/// Non-comment, non-blank lines containing `=` split on the first `=`;
/// everything else is skipped.
pub fn parse_env_content(content: &str) -> BTreeMap<String, String> {
    let mut data = BTreeMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            data.insert(key.to_string(), value.to_string());
        }
    }
    data
}

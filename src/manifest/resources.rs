//! Typed Kubernetes resource descriptions
//!
//! A minimal, serde-backed schema covering exactly the resource kinds the
//! synthesizer emits: Deployment, Service, ConfigMap, Secret and
//! PersistentVolumeClaim. Resources are never mutated after creation;
//! regeneration replaces them wholesale.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const API_VERSION_APPS: &str = "apps/v1";
pub const API_VERSION_CORE: &str = "v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    Deployment,
    Service,
    ConfigMap,
    Secret,
    PersistentVolumeClaim,
}

impl ResourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::Deployment => "Deployment",
            ResourceKind::Service => "Service",
            ResourceKind::ConfigMap => "ConfigMap",
            ResourceKind::Secret => "Secret",
            ResourceKind::PersistentVolumeClaim => "PersistentVolumeClaim",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// A complete manifest document: `apiVersion`, `kind`, `metadata` plus the
/// kind-specific body flattened alongside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestResource {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: ResourceKind,
    pub metadata: Metadata,
    #[serde(flatten)]
    pub body: ResourceBody,
}

/// Kind-specific body. Untagged: each variant has a distinguishing required
/// field (`Secret` carries `type` and must be tried before `ConfigMap`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceBody {
    Workload {
        spec: DeploymentSpec,
    },
    Service {
        spec: ServiceSpec,
    },
    Claim {
        spec: ClaimSpec,
    },
    Secret {
        #[serde(rename = "type")]
        secret_type: String,
        data: BTreeMap<String, String>,
    },
    Config {
        data: BTreeMap<String, String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSpec {
    pub replicas: u32,
    pub selector: LabelSelector,
    pub template: PodTemplateSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSelector {
    #[serde(rename = "matchLabels")]
    pub match_labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodTemplateSpec {
    pub metadata: TemplateMetadata,
    pub spec: PodSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateMetadata {
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodSpec {
    pub containers: Vec<ContainerSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub ports: Vec<ContainerPort>,
    pub env: Vec<EnvVar>,
    pub resources: ResourceRequirements,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerPort {
    #[serde(rename = "containerPort")]
    pub container_port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    pub requests: BTreeMap<String, String>,
    pub limits: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub selector: BTreeMap<String, String>,
    pub ports: Vec<ServicePort>,
    #[serde(rename = "type")]
    pub service_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicePort {
    pub port: u16,
    #[serde(rename = "targetPort")]
    pub target_port: u16,
    pub protocol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSpec {
    #[serde(rename = "accessModes")]
    pub access_modes: Vec<String>,
    pub resources: ClaimResources,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimResources {
    pub requests: BTreeMap<String, String>,
}

impl ManifestResource {
    /// File name this resource serializes to, content-addressed by resource
    /// name so regeneration overwrites.
    pub fn file_name(&self) -> String {
        format!("{}.yaml", self.metadata.name)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Value of the `app` label, when present.
    pub fn app_label(&self) -> Option<&str> {
        self.metadata.labels.get("app").map(String::as_str)
    }
}

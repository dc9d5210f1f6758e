//! Manifest synthesis and serialization

pub mod resources;
pub mod synthesizer;

pub use resources::{ManifestResource, ResourceKind};
pub use synthesizer::{parse_env_content, synthesize};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Serializes one resource to `{name}.yaml` under `dir`, overwriting any
/// previous generation of the same resource.
pub fn write_manifest(dir: &Path, resource: &ManifestResource) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create manifest directory {}", dir.display()))?;
    let path = dir.join(resource.file_name());
    let yaml = resource
        .to_yaml()
        .with_context(|| format!("failed to serialize {}", resource.metadata.name))?;
    std::fs::write(&path, yaml)
        .with_context(|| format!("failed to write {}", path.display()))?;
    debug!(path = %path.display(), kind = %resource.kind, "Wrote manifest");
    Ok(path)
}

/// Writes every resource, failing on the first I/O problem.
pub fn write_manifests(dir: &Path, manifests: &[ManifestResource]) -> Result<Vec<PathBuf>> {
    manifests
        .iter()
        .map(|resource| write_manifest(dir, resource))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use resources::{Metadata, ResourceBody};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn sample_configmap(name: &str) -> ManifestResource {
        ManifestResource {
            api_version: resources::API_VERSION_CORE.to_string(),
            kind: ResourceKind::ConfigMap,
            metadata: Metadata {
                name: name.to_string(),
                namespace: "demo".to_string(),
                labels: BTreeMap::new(),
            },
            body: ResourceBody::Config {
                data: BTreeMap::from([("KEY".to_string(), "value".to_string())]),
            },
        }
    }

    #[test]
    fn test_write_creates_dir_and_file() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("k8s-manifests");
        let path = write_manifest(&out, &sample_configmap("demo-config")).unwrap();

        assert_eq!(path, out.join("demo-config.yaml"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("kind: ConfigMap"));
    }

    #[test]
    fn test_regeneration_overwrites() {
        let dir = TempDir::new().unwrap();
        let first = sample_configmap("demo-config");
        write_manifest(dir.path(), &first).unwrap();

        let mut second = first.clone();
        second.body = ResourceBody::Config {
            data: BTreeMap::from([("KEY".to_string(), "changed".to_string())]),
        };
        let path = write_manifest(dir.path(), &second).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("changed"));
        assert!(!content.contains("KEY: value"));
    }
}

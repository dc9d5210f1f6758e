//! Deployment session state
//!
//! A [`DeploymentSession`] is the aggregate for one run: repository identity,
//! the chosen cluster backend, scan results, planned build targets and the
//! synthesized manifests. It is created at run start, populated by each
//! stage and discarded when the run ends; nothing persists across
//! invocations.

use crate::cluster::backend::ClusterKind;
use crate::manifest::resources::ManifestResource;
use crate::scan::artifacts::ScanResult;
use crate::scan::ports::resolve_ports;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Stages of one deployment run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployStage {
    Scanning,
    Synthesizing,
    Building,
    Loading,
    Applying,
    Done,
}

impl DeployStage {
    pub fn name(&self) -> &'static str {
        match self {
            DeployStage::Scanning => "scanning",
            DeployStage::Synthesizing => "synthesizing",
            DeployStage::Building => "building",
            DeployStage::Loading => "loading",
            DeployStage::Applying => "applying",
            DeployStage::Done => "done",
        }
    }
}

/// One image to build, derived from one detected build file.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildTarget {
    /// Absolute path of the build file.
    pub source_path: PathBuf,
    /// Sanitized image name, also used in manifest names.
    pub image_name: String,
    /// Timestamp-derived tag, index-suffixed when several build files exist.
    pub tag: String,
    /// Ports declared by EXPOSE directives; may be empty.
    pub declared_ports: Vec<u16>,
    /// Set by the orchestrator after a successful build, never afterward.
    pub built_image_ref: Option<String>,
}

impl BuildTarget {
    pub fn image_ref(&self) -> String {
        format!("{}:{}", self.image_name, self.tag)
    }

    /// Declared ports, or the documented defaults when none were declared.
    pub fn effective_ports(&self) -> Vec<u16> {
        resolve_ports(&self.declared_ports)
    }

    /// File name of the originating build file, for labels and env entries.
    pub fn build_file_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Directory used as the image build context.
    pub fn context_dir(&self) -> &Path {
        self.source_path.parent().unwrap_or(Path::new("."))
    }
}

/// Aggregate state for one deployment run.
#[derive(Debug, Clone)]
pub struct DeploymentSession {
    /// Stage the run has progressed to.
    pub stage: DeployStage,
    pub repo_name: String,
    /// Always equals the repository name.
    pub namespace: String,
    /// Explicit operator choice; `None` means auto-detect. Resolved to a
    /// definite backend before any image is loaded.
    pub backend: Option<ClusterKind>,
    pub scan: ScanResult,
    pub targets: Vec<BuildTarget>,
    pub manifests: Vec<ManifestResource>,
    /// Operator-supplied PVC storage size, e.g. "1Gi".
    pub pvc_size: String,
    /// Content of the selected env file, when one was found and readable.
    pub env_content: Option<String>,
    /// Content of the first schema file, when found and readable.
    pub schema_sql: Option<String>,
}

/// Derives one [`BuildTarget`] per build file.
///
/// A single build file keeps the plain repository name and timestamp tag;
/// multiple build files get per-file names and index-suffixed tags so image
/// references never collide.
pub fn plan_build_targets(
    repo_name: &str,
    build_files: &[(PathBuf, Vec<u16>)],
    tag_base: &str,
) -> Vec<BuildTarget> {
    let mut targets = Vec::with_capacity(build_files.len());
    let mut taken: HashSet<String> = HashSet::new();
    let multiple = build_files.len() > 1;

    for (index, (path, declared_ports)) in build_files.iter().enumerate() {
        let mut image_name = if multiple {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            sanitize_name(&format!("{}-{}", repo_name, file_name))
        } else {
            sanitize_name(repo_name)
        };

        // Same-named build files in different directories would collide.
        if !taken.insert(image_name.clone()) {
            image_name = format!("{}-{}", image_name, index + 1);
            taken.insert(image_name.clone());
        }

        let tag = if multiple {
            format!("{}_dockerfile{}", tag_base, index + 1)
        } else {
            tag_base.to_string()
        };

        targets.push(BuildTarget {
            source_path: path.clone(),
            image_name,
            tag,
            declared_ports: declared_ports.clone(),
            built_image_ref: None,
        });
    }

    targets
}

/// Lowercases and maps anything outside `[a-z0-9-]` to `-`, producing a name
/// valid both as a Kubernetes resource name and as an image repository.
pub fn sanitize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_dash = true;
    for ch in raw.chars() {
        let ch = ch.to_ascii_lowercase();
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("app");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("My_Repo.Name"), "my-repo-name");
        assert_eq!(sanitize_name("repo"), "repo");
        assert_eq!(sanitize_name("--weird--"), "weird");
        assert_eq!(sanitize_name("..."), "app");
    }

    #[test]
    fn test_single_target_keeps_repo_name() {
        let files = vec![(PathBuf::from("/repo/Dockerfile"), vec![8080])];
        let targets = plan_build_targets("shop", &files, "20260830_120000");

        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].image_name, "shop");
        assert_eq!(targets[0].tag, "20260830_120000");
        assert_eq!(targets[0].image_ref(), "shop:20260830_120000");
        assert_eq!(targets[0].declared_ports, vec![8080]);
        assert!(targets[0].built_image_ref.is_none());
    }

    #[test]
    fn test_multiple_targets_unique_names_and_tags() {
        let files = vec![
            (PathBuf::from("/repo/Dockerfile"), vec![]),
            (PathBuf::from("/repo/api/Dockerfile.api"), vec![9000]),
        ];
        let targets = plan_build_targets("shop", &files, "ts");

        assert_eq!(targets[0].image_name, "shop-dockerfile");
        assert_eq!(targets[0].tag, "ts_dockerfile1");
        assert_eq!(targets[1].image_name, "shop-dockerfile-api");
        assert_eq!(targets[1].tag, "ts_dockerfile2");
    }

    #[test]
    fn test_same_named_build_files_disambiguated() {
        let files = vec![
            (PathBuf::from("/repo/a/Dockerfile"), vec![]),
            (PathBuf::from("/repo/b/Dockerfile"), vec![]),
        ];
        let targets = plan_build_targets("shop", &files, "ts");

        assert_ne!(targets[0].image_name, targets[1].image_name);
    }

    #[test]
    fn test_effective_ports_default() {
        let target = BuildTarget {
            source_path: PathBuf::from("/repo/Dockerfile"),
            image_name: "shop".to_string(),
            tag: "ts".to_string(),
            declared_ports: vec![],
            built_image_ref: None,
        };
        assert_eq!(target.effective_ports(), vec![80, 3000, 8080]);
    }

    #[test]
    fn test_context_dir_is_parent() {
        let target = BuildTarget {
            source_path: PathBuf::from("/repo/api/Dockerfile"),
            image_name: "x".to_string(),
            tag: "t".to_string(),
            declared_ports: vec![],
            built_image_ref: None,
        };
        assert_eq!(target.context_dir(), Path::new("/repo/api"));
        assert_eq!(target.build_file_name(), "Dockerfile");
    }
}

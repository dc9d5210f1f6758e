//! Artifact classification by filename pattern
//!
//! Walks a repository tree and buckets files into semantic categories
//! (build file, compose file, reverse-proxy config, env file, schema file).
//! Classification is purely name-based; file contents are only read later,
//! and only for the categories that need them.

use crate::deploy::error::DeployError;
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Semantic category of a detected repository artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    BuildFile,
    ComposeFile,
    ReverseProxyConfig,
    EnvFile,
    SchemaFile,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 5] = [
        ArtifactKind::BuildFile,
        ArtifactKind::ComposeFile,
        ArtifactKind::ReverseProxyConfig,
        ArtifactKind::EnvFile,
        ArtifactKind::SchemaFile,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ArtifactKind::BuildFile => "build_file",
            ArtifactKind::ComposeFile => "compose_file",
            ArtifactKind::ReverseProxyConfig => "reverse_proxy_config",
            ArtifactKind::EnvFile => "env_file",
            ArtifactKind::SchemaFile => "schema_file",
        }
    }

    /// Filename patterns for this category. A trailing `.*` matches any
    /// non-empty suffix after the dot; all other patterns are exact names.
    pub fn patterns(&self) -> &'static [&'static str] {
        match self {
            ArtifactKind::BuildFile => &["Dockerfile", "Dockerfile.*"],
            ArtifactKind::ComposeFile => &[
                "docker-compose.yml",
                "docker-compose.yaml",
                "compose.yml",
                "compose.yaml",
            ],
            ArtifactKind::ReverseProxyConfig => &["nginx.conf", "nginx.conf.*"],
            ArtifactKind::EnvFile => &[".env", ".env.*", "environment", "config"],
            ArtifactKind::SchemaFile => &["init.sql", "database.sql", "schema.sql", "seed.sql"],
        }
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.patterns().iter().any(|p| pattern_matches(p, file_name))
    }
}

fn pattern_matches(pattern: &str, file_name: &str) -> bool {
    if let Some(prefix) = pattern.strip_suffix('*') {
        file_name.len() > prefix.len() && file_name.starts_with(prefix)
    } else {
        file_name == pattern
    }
}

/// Result of classifying a repository tree.
///
/// Maps each artifact category to the sorted absolute paths found under the
/// root. Categories with no matches are absent, never empty. Immutable after
/// the scan completes.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub root: PathBuf,
    pub artifacts: BTreeMap<ArtifactKind, Vec<PathBuf>>,
}

impl ScanResult {
    /// Files found for a category, empty when the category is absent.
    pub fn files(&self, kind: ArtifactKind) -> &[PathBuf] {
        self.artifacts.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, kind: ArtifactKind) -> bool {
        self.artifacts.contains_key(&kind)
    }

    pub fn first(&self, kind: ArtifactKind) -> Option<&Path> {
        self.files(kind).first().map(PathBuf::as_path)
    }
}

/// Recursively classifies files under `root` into [`ArtifactKind`] buckets.
///
/// Fails with [`DeployError::ScanIo`] only when the root itself is
/// inaccessible; unreadable sub-entries are logged and skipped. Duplicate
/// matches across overlapping patterns are deduplicated and the paths of
/// each category are sorted, so identical trees always produce identical
/// results.
pub fn scan(root: &Path) -> Result<ScanResult, DeployError> {
    let metadata = std::fs::metadata(root).map_err(|source| DeployError::ScanIo {
        path: root.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(DeployError::ScanIo {
            path: root.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        });
    }
    let root = root.canonicalize().map_err(|source| DeployError::ScanIo {
        path: root.to_path_buf(),
        source,
    })?;

    info!(repo = %root.display(), "Scanning repository for deployment artifacts");

    let mut buckets: BTreeMap<ArtifactKind, BTreeSet<PathBuf>> = BTreeMap::new();
    let mut files_scanned = 0usize;

    // Env files are routinely gitignored but still drive ConfigMap synthesis,
    // so the walk ignores gitignore rules and only skips the .git directory.
    for result in WalkBuilder::new(&root)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .filter_entry(|entry| entry.file_name() != std::ffi::OsStr::new(".git"))
        .build()
    {
        let entry = match result {
            Ok(e) => e,
            Err(err) => {
                warn!(error = %err, "Failed to read directory entry, skipping");
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        files_scanned += 1;

        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        for kind in ArtifactKind::ALL {
            if kind.matches(file_name) {
                debug!(path = %path.display(), kind = kind.name(), "Classified artifact");
                buckets.entry(kind).or_default().insert(path.to_path_buf());
            }
        }
    }

    let artifacts: BTreeMap<ArtifactKind, Vec<PathBuf>> = buckets
        .into_iter()
        .map(|(kind, set)| (kind, set.into_iter().collect()))
        .collect();

    info!(
        files_scanned,
        categories_found = artifacts.len(),
        "Repository scan complete"
    );

    Ok(ScanResult { root, artifacts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        let base = dir.path();

        fs::write(base.join("Dockerfile"), "FROM alpine\nEXPOSE 8080\n").unwrap();
        fs::write(base.join("docker-compose.yml"), "services: {}\n").unwrap();
        fs::write(base.join(".env"), "FOO=bar\n").unwrap();
        fs::write(base.join("main.rs"), "fn main() {}\n").unwrap();

        fs::create_dir_all(base.join("db")).unwrap();
        fs::write(base.join("db/schema.sql"), "CREATE TABLE t(x int);\n").unwrap();

        fs::create_dir_all(base.join("backend")).unwrap();
        fs::write(base.join("backend/Dockerfile.api"), "FROM debian\n").unwrap();

        dir
    }

    #[test]
    fn test_scan_classifies_all_categories() {
        let dir = create_test_repo();
        let result = scan(dir.path()).unwrap();

        assert_eq!(result.files(ArtifactKind::BuildFile).len(), 2);
        assert_eq!(result.files(ArtifactKind::ComposeFile).len(), 1);
        assert_eq!(result.files(ArtifactKind::EnvFile).len(), 1);
        assert_eq!(result.files(ArtifactKind::SchemaFile).len(), 1);
        assert!(!result.has(ArtifactKind::ReverseProxyConfig));
    }

    #[test]
    fn test_empty_categories_absent_not_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Dockerfile"), "FROM alpine\n").unwrap();

        let result = scan(dir.path()).unwrap();
        assert!(result.artifacts.contains_key(&ArtifactKind::BuildFile));
        for (_, paths) in &result.artifacts {
            assert!(!paths.is_empty());
        }
    }

    #[test]
    fn test_all_paths_under_root() {
        let dir = create_test_repo();
        let result = scan(dir.path()).unwrap();

        for paths in result.artifacts.values() {
            for path in paths {
                assert!(path.starts_with(&result.root), "{:?} escapes root", path);
            }
        }
    }

    #[test]
    fn test_all_paths_match_their_patterns() {
        let dir = create_test_repo();
        let result = scan(dir.path()).unwrap();

        for (kind, paths) in &result.artifacts {
            for path in paths {
                let name = path.file_name().unwrap().to_str().unwrap();
                assert!(kind.matches(name), "{} misfiled under {:?}", name, kind);
            }
        }
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let err = scan(Path::new("/nonexistent/kdeploy-test-root")).unwrap_err();
        assert!(matches!(err, DeployError::ScanIo { .. }));
    }

    #[test]
    fn test_scan_file_root_fails() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, "x").unwrap();
        assert!(scan(&file).is_err());
    }

    #[test]
    fn test_git_dir_skipped() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/config"), "[core]\n").unwrap();
        fs::write(dir.path().join("Dockerfile"), "FROM alpine\n").unwrap();

        let result = scan(dir.path()).unwrap();
        // .git/config would otherwise match the env_file "config" pattern
        assert!(!result.has(ArtifactKind::EnvFile));
    }

    #[test]
    fn test_pattern_wildcard_requires_suffix() {
        assert!(ArtifactKind::BuildFile.matches("Dockerfile"));
        assert!(ArtifactKind::BuildFile.matches("Dockerfile.web"));
        assert!(!ArtifactKind::BuildFile.matches("Dockerfile2"));
        assert!(!ArtifactKind::BuildFile.matches("NotADockerfile"));
        assert!(ArtifactKind::EnvFile.matches(".env.production"));
        assert!(!ArtifactKind::EnvFile.matches(".environment"));
    }

    #[test]
    fn test_deterministic_ordering() {
        let dir = create_test_repo();
        let a = scan(dir.path()).unwrap();
        let b = scan(dir.path()).unwrap();
        assert_eq!(a.artifacts, b.artifacts);
    }
}

//! Repository artifact scanning
//!
//! Classifies files under a repository root into deployment-relevant
//! categories and extracts port declarations from build files.

pub mod artifacts;
pub mod ports;

pub use artifacts::{scan, ArtifactKind, ScanResult};
pub use ports::{declared_ports, exposed_port_summary, resolve_ports, DEFAULT_PORTS};

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Serializable view of a scan, used by the `scan` subcommand.
///
/// Paths are reported relative to the repository root; per-build-file port
/// declarations and the aggregate deduplicated port summary are included.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub root: PathBuf,
    pub artifacts: BTreeMap<ArtifactKind, Vec<PathBuf>>,
    pub build_file_ports: Vec<BuildFilePorts>,
    pub exposed_ports: Vec<u16>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildFilePorts {
    pub file: PathBuf,
    pub declared: Vec<u16>,
}

impl ScanReport {
    pub fn from_scan(scan: &ScanResult) -> Self {
        let artifacts = scan
            .artifacts
            .iter()
            .map(|(kind, paths)| {
                let rel: Vec<PathBuf> = paths
                    .iter()
                    .map(|p| p.strip_prefix(&scan.root).unwrap_or(p).to_path_buf())
                    .collect();
                (*kind, rel)
            })
            .collect();

        let build_file_ports: Vec<BuildFilePorts> = scan
            .files(ArtifactKind::BuildFile)
            .iter()
            .map(|path| BuildFilePorts {
                file: path.strip_prefix(&scan.root).unwrap_or(path).to_path_buf(),
                declared: declared_ports(path),
            })
            .collect();

        let exposed_ports =
            exposed_port_summary(build_file_ports.iter().map(|b| b.declared.as_slice()));

        Self {
            root: scan.root.clone(),
            artifacts,
            build_file_ports,
            exposed_ports,
        }
    }
}

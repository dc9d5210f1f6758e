//! Fatal pipeline errors
//!
//! Only errors that abort the whole run live here. Per-item build, load and
//! apply failures are data in the deploy summary, not errors.

use super::session::DeployStage;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployError {
    /// The repository root itself is unreadable. Individual unreadable files
    /// inside the tree are skipped instead.
    #[error("repository root {path:?} is not readable: {source}")]
    ScanIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No build file was detected, so no image can be built.
    #[error("no build file (Dockerfile) found in repository, cannot deploy")]
    MissingBuildFile,

    /// The target cluster did not answer the pre-check. Fatal before any
    /// image build to avoid wasted work.
    #[error("cluster is not reachable: {details}")]
    ClusterUnreachable { details: String },

    /// No backend was chosen and the reachable cluster could not be
    /// classified from its node labels. The operator has to pick one.
    #[error("could not determine cluster backend: {details}")]
    BackendUnresolved { details: String },
}

impl DeployError {
    /// Pipeline stage the run terminates in when this error surfaces.
    pub fn stage(&self) -> DeployStage {
        match self {
            DeployError::ScanIo { .. } => DeployStage::Scanning,
            DeployError::MissingBuildFile => DeployStage::Synthesizing,
            DeployError::ClusterUnreachable { .. } => DeployStage::Building,
            DeployError::BackendUnresolved { .. } => DeployStage::Building,
        }
    }
}

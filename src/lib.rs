//! kdeploy - deploy source repositories to local Kubernetes clusters
//!
//! kdeploy inspects an already-cloned repository for deployment-relevant
//! artifacts (Dockerfiles, compose files, env files, schema SQL), synthesizes
//! the Kubernetes manifests those artifacts imply, then builds one image per
//! Dockerfile, loads the images into a local cluster (kind, minikube or k3d)
//! and applies the manifests in dependency order.
//!
//! # Pipeline
//!
//! 1. **Scan** ([`scan`]): classify files by filename pattern and extract
//!    `EXPOSE` port declarations from each Dockerfile.
//! 2. **Synthesize** ([`manifest`]): map scan results to typed manifest
//!    resources with deterministic naming and labels.
//! 3. **Deploy** ([`deploy`]): build, load and apply with per-item failure
//!    tolerance; only an unreachable cluster or a missing Dockerfile aborts
//!    the run.
//!
//! # Example
//!
//! ```ignore
//! use kdeploy::deploy::{DeployOrchestrator, DeployRequest};
//! use kdeploy::cluster::RealCommandRunner;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), kdeploy::DeployError> {
//! let orchestrator = DeployOrchestrator::new(Arc::new(RealCommandRunner), None);
//! let request = DeployRequest::new("/tmp/my-repo", "my-repo");
//! let (session, summary) = orchestrator.execute(request).await?;
//! println!("built {} image(s)", summary.built_images.len());
//! # Ok(())
//! # }
//! ```

// Public modules
pub mod cli;
pub mod cluster;
pub mod config;
pub mod deploy;
pub mod manifest;
pub mod progress;
pub mod scan;
pub mod util;

// Re-export key types for convenient access
pub use cluster::backend::ClusterKind;
pub use cluster::runner::{CommandOutput, CommandRunner, RealCommandRunner};
pub use config::{ConfigError, KdeployConfig};
pub use deploy::error::DeployError;
pub use deploy::orchestrator::{DeployOrchestrator, DeployRequest, DeploySummary};
pub use deploy::session::{BuildTarget, DeployStage, DeploymentSession};
pub use manifest::resources::{ManifestResource, ResourceKind};
pub use scan::artifacts::{ArtifactKind, ScanResult};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

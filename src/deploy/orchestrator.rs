//! Deployment orchestration
//!
//! Drives one run through its stages: scan, synthesize, cluster pre-check,
//! build, load, apply. A fatal error (unreadable root, no Dockerfile,
//! unreachable cluster) aborts the run; everything else is recorded per
//! item in the summary and the run continues for whatever can still
//! succeed. No retries, no rollback.

use crate::cluster::backend::{resolve_backend, ClusterKind};
use crate::cluster::runner::CommandRunner;
use crate::deploy::error::DeployError;
use crate::deploy::session::{
    plan_build_targets, sanitize_name, DeployStage, DeploymentSession,
};
use crate::manifest::resources::{ManifestResource, ResourceKind};
use crate::manifest::{synthesize, write_manifest};
use crate::progress::{LoggingHandler, ProgressEvent, ProgressHandler};
use crate::scan::artifacts::ArtifactKind;
use crate::scan::ports::declared_ports;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default directory name for generated manifests, created under the
/// repository root.
pub const DEFAULT_MANIFEST_DIR: &str = "k8s-manifests";

/// Inputs for one run, all supplied by the CLI layer.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub repo_root: PathBuf,
    pub repo_name: String,
    /// Explicit backend choice; `None` auto-detects.
    pub cluster: Option<ClusterKind>,
    pub pvc_size: String,
    /// Operator-selected env file when several match.
    pub env_file: Option<PathBuf>,
    pub manifest_dir: PathBuf,
    /// Skip the image-load stage, for clusters that already see the local
    /// docker daemon.
    pub skip_load: bool,
}

impl DeployRequest {
    pub fn new(repo_root: impl Into<PathBuf>, repo_name: &str) -> Self {
        let repo_root = repo_root.into();
        let manifest_dir = repo_root.join(DEFAULT_MANIFEST_DIR);
        Self {
            repo_root,
            repo_name: repo_name.to_string(),
            cluster: None,
            pvc_size: "1Gi".to_string(),
            env_file: None,
            manifest_dir,
            skip_load: false,
        }
    }
}

/// One recorded per-item failure.
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    pub item: String,
    pub reason: String,
}

/// Final report of a run: what succeeded and what failed, per item.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeploySummary {
    pub backend: Option<ClusterKind>,
    pub manifest_dir: PathBuf,
    pub built_images: Vec<String>,
    pub build_failures: Vec<ItemFailure>,
    pub loaded_images: Vec<String>,
    pub load_failures: Vec<ItemFailure>,
    pub applied: Vec<String>,
    pub apply_failures: Vec<ItemFailure>,
}

impl DeploySummary {
    pub fn failure_count(&self) -> usize {
        self.build_failures.len() + self.load_failures.len() + self.apply_failures.len()
    }

    pub fn has_failures(&self) -> bool {
        self.failure_count() > 0
    }
}

pub struct DeployOrchestrator {
    runner: Arc<dyn CommandRunner>,
    progress_handler: Option<LoggingHandler>,
}

impl DeployOrchestrator {
    pub fn new(runner: Arc<dyn CommandRunner>, progress_handler: Option<LoggingHandler>) -> Self {
        Self {
            runner,
            progress_handler,
        }
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(handler) = &self.progress_handler {
            handler.on_progress(&event);
        }
    }

    /// Runs the full pipeline: prepare then deploy.
    pub async fn execute(
        &self,
        request: DeployRequest,
    ) -> Result<(DeploymentSession, DeploySummary), DeployError> {
        let start = Instant::now();
        let mut session = self.prepare(&request).await?;
        let summary = match self.deploy(&mut session, &request).await {
            Ok(summary) => summary,
            Err(err) => {
                self.emit(ProgressEvent::Failed {
                    stage: err.stage().name().to_string(),
                    error: err.to_string(),
                });
                return Err(err);
            }
        };
        session.stage = DeployStage::Done;
        self.emit(ProgressEvent::Completed {
            total_time: start.elapsed(),
            failures: summary.failure_count(),
        });
        Ok((session, summary))
    }

    /// Scanning and Synthesizing: produces a session with planned build
    /// targets and synthesized manifests, without touching any cluster.
    pub async fn prepare(&self, request: &DeployRequest) -> Result<DeploymentSession, DeployError> {
        self.emit(ProgressEvent::Started {
            repo_path: request.repo_root.display().to_string(),
        });

        let scan_start = Instant::now();
        let scan = match crate::scan::scan(&request.repo_root) {
            Ok(scan) => scan,
            Err(err) => {
                self.emit(ProgressEvent::Failed {
                    stage: err.stage().name().to_string(),
                    error: err.to_string(),
                });
                return Err(err);
            }
        };
        self.emit(ProgressEvent::ScanComplete {
            categories_found: scan.artifacts.len(),
            build_files: scan.files(ArtifactKind::BuildFile).len(),
            scan_time: scan_start.elapsed(),
        });

        if !scan.has(ArtifactKind::BuildFile) {
            let err = DeployError::MissingBuildFile;
            self.emit(ProgressEvent::Failed {
                stage: err.stage().name().to_string(),
                error: err.to_string(),
            });
            return Err(err);
        }

        let repo_name = sanitize_name(&request.repo_name);
        let tag_base = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();

        let build_files: Vec<(PathBuf, Vec<u16>)> = scan
            .files(ArtifactKind::BuildFile)
            .iter()
            .map(|path| (path.clone(), declared_ports(path)))
            .collect();
        let targets = plan_build_targets(&repo_name, &build_files, &tag_base);

        let env_content = if scan.has(ArtifactKind::EnvFile) {
            let chosen = request
                .env_file
                .as_deref()
                .or_else(|| scan.first(ArtifactKind::EnvFile))
                .map(Path::to_path_buf);
            chosen.and_then(|path| read_optional(&path, "env file"))
        } else {
            None
        };

        let schema_sql = scan
            .first(ArtifactKind::SchemaFile)
            .map(Path::to_path_buf)
            .and_then(|path| read_optional(&path, "schema file"));

        let mut session = DeploymentSession {
            stage: DeployStage::Synthesizing,
            namespace: repo_name.clone(),
            repo_name,
            backend: request.cluster,
            scan,
            targets,
            manifests: Vec::new(),
            pvc_size: request.pvc_size.clone(),
            env_content,
            schema_sql,
        };

        session.manifests = synthesize(&session);
        self.emit(ProgressEvent::SynthesisComplete {
            resources: session.manifests.len(),
        });

        Ok(session)
    }

    /// Building, Loading and Applying against the resolved backend.
    ///
    /// The cluster pre-check runs first so an unreachable cluster aborts
    /// before any image build is wasted.
    pub async fn deploy(
        &self,
        session: &mut DeploymentSession,
        request: &DeployRequest,
    ) -> Result<DeploySummary, DeployError> {
        let manifest_dir = request.manifest_dir.as_path();
        session.stage = DeployStage::Building;
        self.check_cluster().await?;

        let backend = resolve_backend(session.backend, self.runner.as_ref())
            .await
            .map_err(|err| DeployError::BackendUnresolved {
                details: err.to_string(),
            })?;
        session.backend = Some(backend);

        let mut summary = DeploySummary {
            backend: Some(backend),
            manifest_dir: manifest_dir.to_path_buf(),
            ..DeploySummary::default()
        };

        self.build_images(session, &mut summary).await;

        session.stage = DeployStage::Loading;
        if request.skip_load {
            info!("Skipping image load stage as requested");
        } else {
            self.load_images(session, backend, &mut summary).await;
        }

        session.stage = DeployStage::Applying;
        self.apply_manifests(session, manifest_dir, &mut summary).await;

        Ok(summary)
    }

    async fn check_cluster(&self) -> Result<(), DeployError> {
        let output = self
            .runner
            .run("kubectl", &["cluster-info"])
            .await
            .map_err(|err| DeployError::ClusterUnreachable {
                details: err.to_string(),
            })?;
        if !output.success {
            return Err(DeployError::ClusterUnreachable {
                details: output.stderr.trim().to_string(),
            });
        }
        debug!("Cluster pre-check passed");
        Ok(())
    }

    async fn build_images(&self, session: &mut DeploymentSession, summary: &mut DeploySummary) {
        for target in &mut session.targets {
            let image_ref = target.image_ref();
            self.emit(ProgressEvent::BuildStarted {
                image: image_ref.clone(),
            });
            let build_start = Instant::now();

            let source = target.source_path.display().to_string();
            let context = target.context_dir().display().to_string();
            let result = self
                .runner
                .run("docker", &["build", "-f", &source, "-t", &image_ref, &context])
                .await;

            let success = matches!(&result, Ok(output) if output.success);
            self.emit(ProgressEvent::BuildComplete {
                image: image_ref.clone(),
                build_time: build_start.elapsed(),
                success,
            });

            if success {
                target.built_image_ref = Some(image_ref.clone());
                summary.built_images.push(image_ref);
            } else {
                let reason = match result {
                    Ok(output) => output.stderr.trim().to_string(),
                    Err(err) => err.to_string(),
                };
                warn!(image = %image_ref, reason = %reason, "Image build failed, skipping target");
                summary.build_failures.push(ItemFailure {
                    item: image_ref,
                    reason,
                });
            }
        }
    }

    async fn load_images(
        &self,
        session: &DeploymentSession,
        backend: ClusterKind,
        summary: &mut DeploySummary,
    ) {
        for target in &session.targets {
            let Some(image_ref) = &target.built_image_ref else {
                continue;
            };
            // A locally cached image with the same tag may already satisfy
            // the cluster, so a load failure is not assumed fatal.
            match backend.load_image(self.runner.as_ref(), image_ref).await {
                Ok(()) => {
                    self.emit(ProgressEvent::ImageLoaded {
                        image: image_ref.clone(),
                    });
                    summary.loaded_images.push(image_ref.clone());
                }
                Err(err) => {
                    self.emit(ProgressEvent::LoadFailed {
                        image: image_ref.clone(),
                        reason: err.to_string(),
                    });
                    summary.load_failures.push(ItemFailure {
                        item: image_ref.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }
    }

    async fn apply_manifests(
        &self,
        session: &DeploymentSession,
        manifest_dir: &Path,
        summary: &mut DeploySummary,
    ) {
        // A workload for an image that never built can only ImagePullBackOff,
        // so Deployments and Services tied to a failed target are withheld.
        // Shared resources (config, secret, claim) are image-independent and
        // still apply.
        let unbuilt: HashSet<&str> = session
            .targets
            .iter()
            .filter(|target| target.built_image_ref.is_none())
            .map(|target| target.image_name.as_str())
            .collect();

        let mut ordered: Vec<&ManifestResource> = session
            .manifests
            .iter()
            .filter(|resource| match resource.kind {
                ResourceKind::Deployment | ResourceKind::Service => resource
                    .app_label()
                    .map_or(true, |app| !unbuilt.contains(app)),
                _ => true,
            })
            .collect();
        if ordered.len() < session.manifests.len() {
            warn!(
                withheld = session.manifests.len() - ordered.len(),
                "Withholding manifests for images that failed to build"
            );
        }
        ordered.sort_by_key(|resource| apply_rank(resource));

        for resource in ordered {
            let name = resource.metadata.name.clone();
            let path = match write_manifest(manifest_dir, resource) {
                Ok(path) => path,
                Err(err) => {
                    self.emit(ProgressEvent::ApplyFailed {
                        name: name.clone(),
                        reason: err.to_string(),
                    });
                    summary.apply_failures.push(ItemFailure {
                        item: name,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            let path_str = path.display().to_string();
            let result = self
                .runner
                .run(
                    "kubectl",
                    &["apply", "-f", &path_str, "-n", &session.namespace],
                )
                .await;

            match result {
                Ok(output) if output.success => {
                    self.emit(ProgressEvent::ResourceApplied {
                        name: name.clone(),
                        kind: resource.kind.name().to_string(),
                    });
                    summary.applied.push(name);
                }
                Ok(output) => {
                    let reason = output.stderr.trim().to_string();
                    self.emit(ProgressEvent::ApplyFailed {
                        name: name.clone(),
                        reason: reason.clone(),
                    });
                    summary.apply_failures.push(ItemFailure { item: name, reason });
                }
                Err(err) => {
                    self.emit(ProgressEvent::ApplyFailed {
                        name: name.clone(),
                        reason: err.to_string(),
                    });
                    summary.apply_failures.push(ItemFailure {
                        item: name,
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            applied = summary.applied.len(),
            failed = summary.apply_failures.len(),
            "Manifest apply batch complete"
        );
    }
}

/// Reads a supporting file best-effort. An unreadable file downgrades to a
/// warning and the feature that needed it is simply skipped.
fn read_optional(path: &Path, role: &str) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(err) => {
            warn!(path = %path.display(), role, error = %err, "Skipping unreadable file");
            None
        }
    }
}

/// Fixed apply order: Services before Deployments (selectors must resolve
/// for traffic routing to be meaningful), shared config last in the order
/// ConfigMap, Secret, PVC, db-init ConfigMap.
fn apply_rank(resource: &ManifestResource) -> u8 {
    match resource.kind {
        ResourceKind::Service => 0,
        ResourceKind::Deployment => 1,
        ResourceKind::ConfigMap => {
            if resource.metadata.name.ends_with("-db-init") {
                5
            } else {
                2
            }
        }
        ResourceKind::Secret => 3,
        ResourceKind::PersistentVolumeClaim => 4,
    }
}

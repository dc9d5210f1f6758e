//! Subcommand handlers
//!
//! Each handler turns parsed arguments into library calls and an exit code.
//! Per-item failures inside a run still exit zero; only fatal pipeline
//! errors and unusable arguments are non-zero.

use crate::cli::commands::{DeployArgs, ManifestArgs, ScanArgs};
use crate::cli::output::OutputFormatter;
use crate::cluster::runner::RealCommandRunner;
use crate::config::KdeployConfig;
use crate::deploy::orchestrator::{DeployOrchestrator, DeployRequest};
use crate::manifest::write_manifests;
use crate::progress::LoggingHandler;
use crate::scan::{scan, ScanReport};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Runs the full deploy pipeline.
pub async fn handle_deploy(args: &DeployArgs) -> i32 {
    let config = KdeployConfig::default();
    if let Err(err) = config.validate() {
        error!("{}", err);
        return 2;
    }

    let repo_root = match resolve_repo_root(args.repository_path.as_deref()) {
        Ok(root) => root,
        Err(code) => return code,
    };
    let repo_name = match resolve_repo_name(args.name.as_deref(), &repo_root) {
        Ok(name) => name,
        Err(code) => return code,
    };

    let mut request = DeployRequest::new(&repo_root, &repo_name);
    request.cluster = args.cluster;
    request.pvc_size = args.pvc_size.clone().unwrap_or(config.pvc_size);
    request.env_file = args.env_file.clone();
    request.skip_load = args.skip_load;
    request.manifest_dir = args
        .output
        .clone()
        .unwrap_or_else(|| repo_root.join(&config.manifest_dir));

    let orchestrator = DeployOrchestrator::new(
        Arc::new(RealCommandRunner),
        Some(LoggingHandler::default()),
    );

    match orchestrator.execute(request).await {
        Ok((_, summary)) => {
            let formatter = OutputFormatter::new(args.format.into());
            match formatter.format_summary(&summary) {
                Ok(text) => println!("{}", text),
                Err(err) => {
                    error!("Failed to format summary: {}", err);
                    return 1;
                }
            }
            if summary.has_failures() {
                info!(failures = summary.failure_count(), "Run finished with per-item failures");
            }
            0
        }
        Err(err) => {
            error!("Deployment failed: {}", err);
            1
        }
    }
}

/// Scans a repository and prints the artifact report.
pub async fn handle_scan(args: &ScanArgs) -> i32 {
    let repo_root = match resolve_repo_root(args.repository_path.as_deref()) {
        Ok(root) => root,
        Err(code) => return code,
    };

    let result = match scan(&repo_root) {
        Ok(result) => result,
        Err(err) => {
            error!("Scan failed: {}", err);
            return 1;
        }
    };

    let report = ScanReport::from_scan(&result);
    let formatter = OutputFormatter::new(args.format.into());
    match formatter.format_scan(&report) {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(err) => {
            error!("Failed to format scan report: {}", err);
            1
        }
    }
}

/// Synthesizes and writes manifests without building or applying anything.
pub async fn handle_manifests(args: &ManifestArgs) -> i32 {
    let config = KdeployConfig::default();
    if let Err(err) = config.validate() {
        error!("{}", err);
        return 2;
    }

    let repo_root = match resolve_repo_root(args.repository_path.as_deref()) {
        Ok(root) => root,
        Err(code) => return code,
    };
    let repo_name = match resolve_repo_name(args.name.as_deref(), &repo_root) {
        Ok(name) => name,
        Err(code) => return code,
    };

    let mut request = DeployRequest::new(&repo_root, &repo_name);
    request.pvc_size = args.pvc_size.clone().unwrap_or(config.pvc_size);
    request.env_file = args.env_file.clone();
    let manifest_dir = args
        .output
        .clone()
        .unwrap_or_else(|| repo_root.join(&config.manifest_dir));

    // No cluster commands run during prepare, so the real runner is inert here
    let orchestrator = DeployOrchestrator::new(Arc::new(RealCommandRunner), None);
    let session = match orchestrator.prepare(&request).await {
        Ok(session) => session,
        Err(err) => {
            error!("Manifest synthesis failed: {}", err);
            return 1;
        }
    };

    match write_manifests(&manifest_dir, &session.manifests) {
        Ok(paths) => {
            for path in paths {
                println!("{}", path.display());
            }
            0
        }
        Err(err) => {
            error!("Failed to write manifests: {}", err);
            1
        }
    }
}

fn resolve_repo_root(path: Option<&Path>) -> Result<PathBuf, i32> {
    let raw = match path {
        Some(path) => path.to_path_buf(),
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(err) => {
                error!("Cannot determine current directory: {}", err);
                return Err(2);
            }
        },
    };
    match raw.canonicalize() {
        Ok(root) => Ok(root),
        Err(err) => {
            error!("Repository path {} is not accessible: {}", raw.display(), err);
            Err(2)
        }
    }
}

fn resolve_repo_name(explicit: Option<&str>, repo_root: &Path) -> Result<String, i32> {
    if let Some(name) = explicit {
        return Ok(name.to_string());
    }
    match repo_root.file_name() {
        Some(name) => Ok(name.to_string_lossy().into_owned()),
        None => {
            error!(
                "Cannot derive an application name from {}; pass --name",
                repo_root.display()
            );
            Err(2)
        }
    }
}

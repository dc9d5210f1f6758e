//! Local cluster backends
//!
//! Closed set of supported local Kubernetes distributions and their
//! image-loading mechanics. kind and minikube import images through their
//! native load commands; k3d instead re-tags under a `k3d-` prefix and
//! relies on its own registry/import path. That asymmetry mirrors the real
//! tools and is deliberate.

use super::runner::CommandRunner;
use anyhow::{bail, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ClusterKind {
    Kind,
    Minikube,
    K3d,
}

impl ClusterKind {
    pub fn name(&self) -> &'static str {
        match self {
            ClusterKind::Kind => "kind",
            ClusterKind::Minikube => "minikube",
            ClusterKind::K3d => "k3d",
        }
    }

    /// Matches a node hostname label against the known backend substrings.
    pub fn from_hostname(hostname: &str) -> Option<ClusterKind> {
        let hostname = hostname.to_lowercase();
        if hostname.contains("k3d") {
            Some(ClusterKind::K3d)
        } else if hostname.contains("kind") {
            Some(ClusterKind::Kind)
        } else if hostname.contains("minikube") {
            Some(ClusterKind::Minikube)
        } else {
            None
        }
    }

    /// Detects the backend from the live cluster's node metadata.
    ///
    /// Queries the first node's `kubernetes.io/hostname` label; any failure
    /// (kubectl missing, cluster down, unexpected output) yields `None`,
    /// leaving the caller's explicit choice in force.
    pub async fn detect(runner: &dyn CommandRunner) -> Option<ClusterKind> {
        let output = runner
            .run("kubectl", &["get", "nodes", "-o", "json"])
            .await
            .ok()?;
        if !output.success {
            debug!(stderr = %output.stderr, "Node query failed during backend detection");
            return None;
        }

        let nodes: serde_json::Value = serde_json::from_str(&output.stdout).ok()?;
        let hostname = nodes
            .get("items")?
            .get(0)?
            .get("metadata")?
            .get("labels")?
            .get("kubernetes.io/hostname")?
            .as_str()?;

        let detected = Self::from_hostname(hostname);
        debug!(hostname, detected = ?detected, "Backend detection result");
        detected
    }

    /// Makes an image available inside the cluster.
    pub async fn load_image(&self, runner: &dyn CommandRunner, image_ref: &str) -> Result<()> {
        let output = match self {
            ClusterKind::Kind => {
                runner
                    .run("kind", &["load", "docker-image", image_ref])
                    .await?
            }
            ClusterKind::Minikube => {
                runner.run("minikube", &["image", "load", image_ref]).await?
            }
            ClusterKind::K3d => {
                let retagged = format!("k3d-{}", image_ref);
                runner.run("docker", &["tag", image_ref, &retagged]).await?
            }
        };

        if !output.success {
            bail!(
                "image load failed for {} on {}: {}",
                image_ref,
                self.name(),
                output.stderr.trim()
            );
        }
        Ok(())
    }
}

impl fmt::Display for ClusterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClusterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kind" => Ok(ClusterKind::Kind),
            "minikube" => Ok(ClusterKind::Minikube),
            "k3d" => Ok(ClusterKind::K3d),
            other => Err(format!(
                "invalid cluster type: {}. Valid options: kind, minikube, k3d",
                other
            )),
        }
    }
}

/// Resolves the backend to use for a run.
///
/// Detection that disagrees with an explicit choice wins, but never
/// silently: a warning surfaces the switch. When detection fails the
/// explicit choice stands; with neither, the run cannot proceed.
pub async fn resolve_backend(
    explicit: Option<ClusterKind>,
    runner: &dyn CommandRunner,
) -> Result<ClusterKind> {
    let detected = ClusterKind::detect(runner).await;
    match (explicit, detected) {
        (Some(chosen), Some(found)) if chosen != found => {
            warn!(
                selected = %chosen,
                detected = %found,
                "Detected cluster differs from selection, auto-switching"
            );
            Ok(found)
        }
        (Some(chosen), _) => Ok(chosen),
        (None, Some(found)) => {
            info!(backend = %found, "Auto-detected cluster backend");
            Ok(found)
        }
        (None, None) => bail!(
            "could not auto-detect cluster type; pass --cluster kind|minikube|k3d"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::runner::{CommandOutput, ScriptedRunner};

    fn nodes_json(hostname: &str) -> String {
        format!(
            r#"{{"items":[{{"metadata":{{"labels":{{"kubernetes.io/hostname":"{}"}}}}}}]}}"#,
            hostname
        )
    }

    #[test]
    fn test_from_hostname_matching() {
        assert_eq!(
            ClusterKind::from_hostname("kind-control-plane"),
            Some(ClusterKind::Kind)
        );
        assert_eq!(
            ClusterKind::from_hostname("MINIKUBE"),
            Some(ClusterKind::Minikube)
        );
        assert_eq!(
            ClusterKind::from_hostname("k3d-k3s-default-server-0"),
            Some(ClusterKind::K3d)
        );
        assert_eq!(ClusterKind::from_hostname("docker-desktop"), None);
    }

    #[test]
    fn test_from_str_round_trip() {
        for kind in [ClusterKind::Kind, ClusterKind::Minikube, ClusterKind::K3d] {
            assert_eq!(kind.name().parse::<ClusterKind>().unwrap(), kind);
        }
        assert!("gke".parse::<ClusterKind>().is_err());
    }

    #[tokio::test]
    async fn test_detect_from_node_labels() {
        let runner = ScriptedRunner::new()
            .respond("get nodes", CommandOutput::ok(&nodes_json("kind-worker")));
        assert_eq!(
            ClusterKind::detect(&runner).await,
            Some(ClusterKind::Kind)
        );
    }

    #[tokio::test]
    async fn test_detect_handles_bad_output() {
        let runner = ScriptedRunner::new().respond("get nodes", CommandOutput::ok("not json"));
        assert_eq!(ClusterKind::detect(&runner).await, None);

        let runner = ScriptedRunner::new().fail_when("get nodes");
        assert_eq!(ClusterKind::detect(&runner).await, None);
    }

    #[tokio::test]
    async fn test_load_image_per_backend_mechanics() {
        let runner = ScriptedRunner::new();
        ClusterKind::Kind
            .load_image(&runner, "shop:ts")
            .await
            .unwrap();
        ClusterKind::Minikube
            .load_image(&runner, "shop:ts")
            .await
            .unwrap();
        ClusterKind::K3d
            .load_image(&runner, "shop:ts")
            .await
            .unwrap();

        assert_eq!(
            runner.calls(),
            vec![
                "kind load docker-image shop:ts",
                "minikube image load shop:ts",
                "docker tag shop:ts k3d-shop:ts",
            ]
        );
    }

    #[tokio::test]
    async fn test_load_image_failure_is_err() {
        let runner = ScriptedRunner::new().fail_when("kind load");
        assert!(ClusterKind::Kind.load_image(&runner, "x:y").await.is_err());
    }

    #[tokio::test]
    async fn test_resolve_override_with_warning() {
        let runner = ScriptedRunner::new()
            .respond("get nodes", CommandOutput::ok(&nodes_json("minikube")));
        let resolved = resolve_backend(Some(ClusterKind::Kind), &runner)
            .await
            .unwrap();
        assert_eq!(resolved, ClusterKind::Minikube);
    }

    #[tokio::test]
    async fn test_resolve_keeps_explicit_when_detection_fails() {
        let runner = ScriptedRunner::new().fail_when("get nodes");
        let resolved = resolve_backend(Some(ClusterKind::K3d), &runner)
            .await
            .unwrap();
        assert_eq!(resolved, ClusterKind::K3d);
    }

    #[tokio::test]
    async fn test_resolve_errors_without_any_signal() {
        let runner = ScriptedRunner::new().fail_when("get nodes");
        assert!(resolve_backend(None, &runner).await.is_err());
    }
}

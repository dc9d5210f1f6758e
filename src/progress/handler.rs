//! Progress handler trait and events

use std::time::Duration;

/// Events emitted while a deployment run progresses
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Run started
    Started { repo_path: String },

    /// Artifact scan completed
    ScanComplete {
        categories_found: usize,
        build_files: usize,
        scan_time: Duration,
    },

    /// Manifest synthesis completed
    SynthesisComplete { resources: usize },

    /// Image build started
    BuildStarted { image: String },

    /// Image build finished
    BuildComplete {
        image: String,
        build_time: Duration,
        success: bool,
    },

    /// Image loaded into the cluster
    ImageLoaded { image: String },

    /// Image load failed (non-fatal)
    LoadFailed { image: String, reason: String },

    /// Manifest applied to the cluster
    ResourceApplied { name: String, kind: String },

    /// Manifest apply failed (non-fatal)
    ApplyFailed { name: String, reason: String },

    /// Run completed; failures counts per-item problems
    Completed {
        total_time: Duration,
        failures: usize,
    },

    /// Run aborted by a fatal error
    Failed { stage: String, error: String },
}

/// Trait for handling progress events during a deployment run
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {
        // Intentionally empty
    }
}

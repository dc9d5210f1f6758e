//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { repo_path } => {
                info!(repo = %repo_path, "Starting deployment run");
            }
            ProgressEvent::ScanComplete {
                categories_found,
                build_files,
                scan_time,
            } => {
                info!(
                    categories = categories_found,
                    build_files,
                    scan_time_ms = scan_time.as_millis(),
                    "Artifact scan complete"
                );
            }
            ProgressEvent::SynthesisComplete { resources } => {
                info!(resources, "Manifest synthesis complete");
            }
            ProgressEvent::BuildStarted { image } => {
                debug!(image = %image, "Building image");
            }
            ProgressEvent::BuildComplete {
                image,
                build_time,
                success,
            } => {
                if *success {
                    info!(
                        image = %image,
                        build_time_ms = build_time.as_millis(),
                        "Image build complete"
                    );
                } else {
                    warn!(
                        image = %image,
                        build_time_ms = build_time.as_millis(),
                        "Image build failed"
                    );
                }
            }
            ProgressEvent::ImageLoaded { image } => {
                info!(image = %image, "Image loaded into cluster");
            }
            ProgressEvent::LoadFailed { image, reason } => {
                warn!(image = %image, reason = %reason, "Image load failed, continuing");
            }
            ProgressEvent::ResourceApplied { name, kind } => {
                info!(resource = %name, kind = %kind, "Applied manifest");
            }
            ProgressEvent::ApplyFailed { name, reason } => {
                warn!(resource = %name, reason = %reason, "Apply failed, continuing");
            }
            ProgressEvent::Completed {
                total_time,
                failures,
            } => {
                if *failures > 0 {
                    warn!(
                        total_time_ms = total_time.as_millis(),
                        failures, "Deployment run complete with failures"
                    );
                } else {
                    info!(
                        total_time_ms = total_time.as_millis(),
                        "Deployment run complete"
                    );
                }
            }
            ProgressEvent::Failed { stage, error } => {
                warn!(stage = %stage, error = %error, "Deployment run aborted");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_logging_handler_all_events() {
        let handler = LoggingHandler;
        let events = [
            ProgressEvent::Started {
                repo_path: "/repo".to_string(),
            },
            ProgressEvent::ScanComplete {
                categories_found: 3,
                build_files: 2,
                scan_time: Duration::from_millis(12),
            },
            ProgressEvent::SynthesisComplete { resources: 5 },
            ProgressEvent::BuildStarted {
                image: "a:1".to_string(),
            },
            ProgressEvent::BuildComplete {
                image: "a:1".to_string(),
                build_time: Duration::from_secs(2),
                success: false,
            },
            ProgressEvent::ImageLoaded {
                image: "a:1".to_string(),
            },
            ProgressEvent::LoadFailed {
                image: "a:1".to_string(),
                reason: "x".to_string(),
            },
            ProgressEvent::ResourceApplied {
                name: "a-service".to_string(),
                kind: "Service".to_string(),
            },
            ProgressEvent::ApplyFailed {
                name: "a-service".to_string(),
                reason: "x".to_string(),
            },
            ProgressEvent::Completed {
                total_time: Duration::from_secs(9),
                failures: 2,
            },
            ProgressEvent::Failed {
                stage: "building".to_string(),
                error: "cluster gone".to_string(),
            },
        ];
        for event in &events {
            handler.on_progress(event);
        }
    }
}

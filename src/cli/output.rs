//! Output formatting for multiple formats
//!
//! Formatters for JSON, YAML and human-readable text renditions of scan
//! reports and deploy summaries.

use anyhow::{Context, Result};
use std::fmt::Write;

use crate::deploy::orchestrator::DeploySummary;
use crate::scan::ScanReport;

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format (human-friendly, version-control friendly)
    Yaml,
    /// Human-readable formatted text
    Human,
}

/// Output formatter for scan reports and deploy summaries
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    /// Creates a new output formatter with the specified format
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a scan report according to the configured format
    pub fn format_scan(&self, report: &ScanReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report)
                .context("Failed to serialize scan report to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(report).context("Failed to serialize scan report to YAML")
            }
            OutputFormat::Human => Ok(format_scan_human(report)),
        }
    }

    /// Formats a deploy summary according to the configured format
    pub fn format_summary(&self, summary: &DeploySummary) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(summary)
                .context("Failed to serialize deploy summary to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(summary).context("Failed to serialize deploy summary to YAML")
            }
            OutputFormat::Human => Ok(format_summary_human(summary)),
        }
    }
}

fn format_scan_human(report: &ScanReport) -> String {
    let mut out = String::new();
    writeln!(out, "Scan of {}", report.root.display()).unwrap();

    if report.artifacts.is_empty() {
        writeln!(out, "  No deployment-relevant artifacts found").unwrap();
        return out;
    }

    for (kind, paths) in &report.artifacts {
        writeln!(out, "  {} ({}):", kind.name(), paths.len()).unwrap();
        for path in paths {
            writeln!(out, "    {}", path.display()).unwrap();
        }
    }

    if !report.build_file_ports.is_empty() {
        writeln!(out, "  Declared ports:").unwrap();
        for entry in &report.build_file_ports {
            if entry.declared.is_empty() {
                writeln!(out, "    {}: none", entry.file.display()).unwrap();
            } else {
                let ports: Vec<String> =
                    entry.declared.iter().map(|p| p.to_string()).collect();
                writeln!(out, "    {}: {}", entry.file.display(), ports.join(", ")).unwrap();
            }
        }
    }

    if !report.exposed_ports.is_empty() {
        let ports: Vec<String> = report.exposed_ports.iter().map(|p| p.to_string()).collect();
        writeln!(out, "  Exposed ports (all build files): {}", ports.join(", ")).unwrap();
    }

    out
}

fn format_summary_human(summary: &DeploySummary) -> String {
    let mut out = String::new();
    writeln!(out, "Deployment summary").unwrap();
    if let Some(backend) = summary.backend {
        writeln!(out, "  Cluster: {}", backend).unwrap();
    }
    writeln!(out, "  Manifests: {}", summary.manifest_dir.display()).unwrap();

    writeln!(out, "  Built images ({}):", summary.built_images.len()).unwrap();
    for image in &summary.built_images {
        writeln!(out, "    {}", image).unwrap();
    }
    writeln!(out, "  Applied resources ({}):", summary.applied.len()).unwrap();
    for name in &summary.applied {
        writeln!(out, "    {}", name).unwrap();
    }

    if summary.has_failures() {
        writeln!(out, "  Failures ({}):", summary.failure_count()).unwrap();
        for failure in &summary.build_failures {
            writeln!(out, "    build {}: {}", failure.item, failure.reason).unwrap();
        }
        for failure in &summary.load_failures {
            writeln!(out, "    load {}: {}", failure.item, failure.reason).unwrap();
        }
        for failure in &summary.apply_failures {
            writeln!(out, "    apply {}: {}", failure.item, failure.reason).unwrap();
        }
    } else {
        writeln!(out, "  No failures").unwrap();
    }

    out
}

//! Configuration management for kdeploy
//!
//! Settings load from environment variables with sensible defaults, and the
//! CLI can override any of them per invocation.
//!
//! # Environment Variables
//!
//! - `KDEPLOY_PVC_SIZE`: storage request for the generated claim - default: "1Gi"
//! - `KDEPLOY_MANIFEST_DIR`: manifest output directory name, relative to the
//!   repository root - default: "k8s-manifests"
//! - `KDEPLOY_LOG_LEVEL`: logging level - default: "info"
//! - `KDEPLOY_LOG_JSON`: JSON log output (true|false) - default: "false"
//!
//! # Example
//!
//! ```
//! use kdeploy::KdeployConfig;
//!
//! let config = KdeployConfig::default();
//! config.validate().expect("invalid configuration");
//! ```

use std::env;
use std::fmt;
use thiserror::Error;

const DEFAULT_PVC_SIZE: &str = "1Gi";
const DEFAULT_MANIFEST_DIR: &str = "k8s-manifests";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Main configuration structure for kdeploy
///
/// Constructed with `Default::default()`, which reads KDEPLOY_* environment
/// variables and falls back to defaults for anything unset.
#[derive(Debug, Clone)]
pub struct KdeployConfig {
    /// Storage request for the generated PersistentVolumeClaim
    pub pvc_size: String,

    /// Manifest output directory name, relative to the repository root
    pub manifest_dir: String,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for KdeployConfig {
    fn default() -> Self {
        let pvc_size =
            env::var("KDEPLOY_PVC_SIZE").unwrap_or_else(|_| DEFAULT_PVC_SIZE.to_string());
        let manifest_dir =
            env::var("KDEPLOY_MANIFEST_DIR").unwrap_or_else(|_| DEFAULT_MANIFEST_DIR.to_string());
        let log_level = env::var("KDEPLOY_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            pvc_size,
            manifest_dir,
            log_level,
        }
    }
}

impl KdeployConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the PVC size is not a Kubernetes quantity,
    /// the manifest directory is empty or the log level is unknown.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_quantity(&self.pvc_size) {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid PVC size: {}. Expected a Kubernetes quantity like 1Gi or 500Mi",
                self.pvc_size
            )));
        }

        if self.manifest_dir.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Manifest directory cannot be empty".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }
}

/// Checks a string against the Kubernetes quantity shape used for storage
/// requests: a positive integer with an optional binary or decimal suffix.
fn is_valid_quantity(value: &str) -> bool {
    let trimmed = value.trim();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    if digits_end == 0 {
        return false;
    }
    matches!(
        &trimmed[digits_end..],
        "" | "Ki" | "Mi" | "Gi" | "Ti" | "k" | "M" | "G" | "T"
    )
}

impl fmt::Display for KdeployConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Kdeploy Configuration:")?;
        writeln!(f, "  PVC Size: {}", self.pvc_size)?;
        writeln!(f, "  Manifest Dir: {}", self.manifest_dir)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    /// Helper to temporarily set environment variables for testing
    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    // One test mutates the process environment, so defaults and overrides
    // are checked together rather than racing in parallel tests.
    #[test]
    fn test_environment_variable_parsing() {
        {
            let _guards = vec![
                EnvGuard::set("KDEPLOY_PVC_SIZE", DEFAULT_PVC_SIZE),
                EnvGuard::set("KDEPLOY_MANIFEST_DIR", DEFAULT_MANIFEST_DIR),
                EnvGuard::set("KDEPLOY_LOG_LEVEL", DEFAULT_LOG_LEVEL),
            ];

            let config = KdeployConfig::default();
            assert_eq!(config.pvc_size, "1Gi");
            assert_eq!(config.manifest_dir, "k8s-manifests");
            assert_eq!(config.log_level, "info");
            assert!(config.validate().is_ok());
        }

        let _guards = vec![
            EnvGuard::set("KDEPLOY_PVC_SIZE", "500Mi"),
            EnvGuard::set("KDEPLOY_MANIFEST_DIR", "manifests"),
            EnvGuard::set("KDEPLOY_LOG_LEVEL", "DEBUG"),
        ];

        let config = KdeployConfig::default();
        assert_eq!(config.pvc_size, "500Mi");
        assert_eq!(config.manifest_dir, "manifests");
        assert_eq!(config.log_level, "debug");
    }

    fn valid_config() -> KdeployConfig {
        KdeployConfig {
            pvc_size: "1Gi".to_string(),
            manifest_dir: "k8s-manifests".to_string(),
            log_level: "info".to_string(),
        }
    }

    #[test]
    fn test_validation_rejects_bad_pvc_size() {
        let mut config = valid_config();
        config.pvc_size = "lots".to_string();
        assert!(config.validate().is_err());

        config.pvc_size = "Gi".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_accepts_quantities() {
        let mut config = valid_config();
        for size in ["1Gi", "500Mi", "10G", "1024", "2Ti"] {
            config.pvc_size = size.to_string();
            assert!(config.validate().is_ok(), "{} should validate", size);
        }
    }

    #[test]
    fn test_validation_invalid_log_level() {
        let mut config = valid_config();
        config.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_display() {
        let display = format!("{}", valid_config());
        assert!(display.contains("Kdeploy Configuration:"));
        assert!(display.contains("PVC Size:"));
    }
}

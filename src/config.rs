//! Harness configuration
//!
//! Paths to the policy documents, the audit-log directory, and the metrics
//! export. Every field has a default matching the repository layout, so
//! running without a config file works out of the box.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level harness configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Mock data-store document (tables with sensitivity flags).
    pub data_store: PathBuf,

    /// Content-safety rule document.
    pub content_rules: PathBuf,

    /// Command allow/deny policy document.
    pub command_policy: PathBuf,

    /// Directory receiving the append-only audit logs.
    pub log_dir: PathBuf,

    /// Destination of the consolidated CSV export.
    pub export_path: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            data_store: PathBuf::from("data/db.json"),
            content_rules: PathBuf::from("data/phishing_rules.json"),
            command_policy: PathBuf::from("data/command_policy.json"),
            log_dir: PathBuf::from("logs"),
            export_path: PathBuf::from("metrics.csv"),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Policy(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            Error::Policy(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    /// Path of the data-access audit log.
    pub fn access_log(&self) -> PathBuf {
        self.log_dir.join("access.log")
    }

    /// Path of the content-generation audit log.
    pub fn phishing_log(&self) -> PathBuf {
        self.log_dir.join("phishing.log")
    }

    /// Path of the command-execution audit log.
    pub fn rce_log(&self) -> PathBuf {
        self.log_dir.join("rce.log")
    }
}

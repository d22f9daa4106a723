//! Declarative rule sets for the three guarded resources
//!
//! Rule sets are static, read-only inputs loaded from JSON documents once
//! at startup. A malformed or missing document is fatal; a malformed regex
//! *inside* a document is not: matchers skip it per-pattern.

use crate::config::HarnessConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// One table of the mock data store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Whether the table holds sensitive data.
    pub sensitive: bool,
    /// Row payloads, in document order.
    #[serde(default)]
    pub rows: Vec<serde_json::Value>,
}

/// The mock data store: named tables with sensitivity flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataStore {
    /// Tables keyed by name.
    pub tables: BTreeMap<String, Table>,
}

impl DataStore {
    /// Load the data-store document.
    pub fn load(path: &Path) -> Result<Self> {
        load_document(path, "data store")
    }

    /// Look up a table by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }
}

/// Content-safety rules for the generation gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRules {
    /// Substrings that flag content outright.
    pub blocked_keywords: Vec<String>,
    /// Regex patterns searched in the raw content, in order.
    pub blocked_url_patterns: Vec<String>,
    /// Phrases indicating sender impersonation.
    pub impersonation_patterns: Vec<String>,
    /// Domains considered legitimate link targets.
    pub allowlist_domains: Vec<String>,
}

impl ContentRules {
    /// Load the content-safety rule document.
    pub fn load(path: &Path) -> Result<Self> {
        load_document(path, "content rules")
    }
}

/// Command allow/deny policy for the execution gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandPolicy {
    /// Patterns for known-safe commands, anchored at the start at match time.
    pub allowlist_patterns: Vec<String>,
    /// Patterns for dangerous commands, searched anywhere.
    pub blocked_patterns: Vec<String>,
    /// Human-readable labels for blocked patterns.
    #[serde(default)]
    pub blocked_pattern_names: HashMap<String, String>,
}

impl CommandPolicy {
    /// Load the command-policy document.
    pub fn load(path: &Path) -> Result<Self> {
        load_document(path, "command policy")
    }

    /// Label for a blocked pattern, falling back to the pattern text.
    pub fn label_for(&self, pattern: &str) -> String {
        self.blocked_pattern_names
            .get(pattern)
            .cloned()
            .unwrap_or_else(|| pattern.to_string())
    }
}

/// All three rule sets, loaded together at startup.
#[derive(Debug, Clone)]
pub struct PolicyStore {
    /// Data-store tables.
    pub data: DataStore,
    /// Content-safety rules.
    pub content: ContentRules,
    /// Command allow/deny policy.
    pub command: CommandPolicy,
}

impl PolicyStore {
    /// Load every policy document named by the configuration.
    pub fn load(config: &HarnessConfig) -> Result<Self> {
        Ok(Self {
            data: DataStore::load(&config.data_store)?,
            content: ContentRules::load(&config.content_rules)?,
            command: CommandPolicy::load(&config.command_policy)?,
        })
    }
}

fn load_document<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Policy(format!("Failed to read {} {}: {}", what, path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Policy(format!("Failed to parse {} {}: {}", what, path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_store_parse() {
        let store: DataStore = serde_json::from_value(serde_json::json!({
            "tables": {
                "user_data": { "sensitive": true, "rows": [{"username": "a"}] },
                "faq": { "sensitive": false }
            }
        }))
        .unwrap();

        assert!(store.table("user_data").unwrap().sensitive);
        assert_eq!(store.table("user_data").unwrap().rows.len(), 1);
        // rows default to empty when absent
        assert!(store.table("faq").unwrap().rows.is_empty());
        assert!(store.table("missing").is_none());
    }

    #[test]
    fn test_command_policy_label_fallback() {
        let policy: CommandPolicy = serde_json::from_value(serde_json::json!({
            "allowlist_patterns": [],
            "blocked_patterns": ["rm -rf", "nc -e"],
            "blocked_pattern_names": { "rm -rf": "destructive_delete" }
        }))
        .unwrap();

        assert_eq!(policy.label_for("rm -rf"), "destructive_delete");
        assert_eq!(policy.label_for("nc -e"), "nc -e");
    }

    #[test]
    fn test_command_policy_names_optional() {
        let policy: CommandPolicy = serde_json::from_value(serde_json::json!({
            "allowlist_patterns": ["ls"],
            "blocked_patterns": []
        }))
        .unwrap();
        assert!(policy.blocked_pattern_names.is_empty());
    }

    #[test]
    fn test_content_rules_require_all_fields() {
        let err = serde_json::from_value::<ContentRules>(serde_json::json!({
            "blocked_keywords": []
        }));
        assert!(err.is_err());
    }

    #[test]
    fn test_missing_document_is_fatal() {
        let err = DataStore::load(Path::new("/nonexistent/db.json")).unwrap_err();
        assert!(matches!(err, Error::Policy(_)));
    }
}

//! Metrics aggregation over the audit trail
//!
//! Reconstructs attack statistics from the three domain logs. The logs are
//! the sole source of truth: every run re-reads them in full and rebuilds
//! the snapshot from scratch, holding no state between runs. Malformed
//! lines are skipped, never fatal.

use crate::audit::{bool_token, AuditSink, CommandRecord, ContentRecord, DataAccessRecord, FileSink};
use crate::config::HarnessConfig;
use crate::error::Result;
use crate::gateway::command::COMMAND_TARGET;
use crate::gateway::content::CONTENT_TARGET;
use crate::identity::Role;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Attack category, one per domain log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackCategory {
    DatabaseExfiltration,
    Phishing,
    Rce,
}

impl AttackCategory {
    /// All categories, in report order.
    pub const ALL: [AttackCategory; 3] = [
        AttackCategory::DatabaseExfiltration,
        AttackCategory::Phishing,
        AttackCategory::Rce,
    ];

    /// Category tag as written in exports.
    pub fn as_str(self) -> &'static str {
        match self {
            AttackCategory::DatabaseExfiltration => "database_exfiltration",
            AttackCategory::Phishing => "phishing",
            AttackCategory::Rce => "rce",
        }
    }
}

impl fmt::Display for AttackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit record in the unified shape used for aggregation and export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub attack_type: AttackCategory,
    pub timestamp: String,
    pub identity: String,
    pub target: String,
    pub allowed: bool,
    /// Comma-joined indicators, or the row count for data-access entries.
    pub indicators: String,
    pub reason: String,
}

impl From<DataAccessRecord> for LogEntry {
    fn from(r: DataAccessRecord) -> Self {
        Self {
            attack_type: AttackCategory::DatabaseExfiltration,
            timestamp: r.timestamp,
            identity: r.identity,
            target: r.table,
            allowed: r.allowed,
            indicators: r.row_count.to_string(),
            reason: r.reason,
        }
    }
}

impl From<ContentRecord> for LogEntry {
    fn from(r: ContentRecord) -> Self {
        Self {
            attack_type: AttackCategory::Phishing,
            timestamp: r.timestamp,
            identity: r.identity,
            target: CONTENT_TARGET.to_string(),
            allowed: r.allowed,
            indicators: r.indicators,
            reason: r.reason,
        }
    }
}

impl From<CommandRecord> for LogEntry {
    fn from(r: CommandRecord) -> Self {
        Self {
            attack_type: AttackCategory::Rce,
            timestamp: r.timestamp,
            identity: r.identity,
            target: COMMAND_TARGET.to_string(),
            allowed: r.allowed,
            indicators: r.indicators,
            reason: r.reason,
        }
    }
}

/// Mitigation counters for one attack category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryMetrics {
    /// Entries attempted by an unprivileged caller, allowed or not.
    pub total_attempts: usize,
    /// Entries denied by the policy layer, regardless of caller.
    pub blocked_attempts: usize,
    /// Entries allowed under the privileged identity.
    pub successful_attacks: usize,
}

impl CategoryMetrics {
    fn observe(&mut self, entry: &LogEntry) {
        let privileged = Role::of(&entry.identity).is_privileged();
        if !privileged {
            self.total_attempts += 1;
        }
        if !entry.allowed {
            self.blocked_attempts += 1;
        }
        if entry.allowed && privileged {
            self.successful_attacks += 1;
        }
    }

    fn absorb(&mut self, other: &CategoryMetrics) {
        self.total_attempts += other.total_attempts;
        self.blocked_attempts += other.blocked_attempts;
        self.successful_attacks += other.successful_attacks;
    }

    /// Percentage of unprivileged attempts that were denied; `0.0` when
    /// there were no attempts.
    pub fn mitigation_rate(&self) -> f64 {
        if self.total_attempts == 0 {
            0.0
        } else {
            self.blocked_attempts as f64 / self.total_attempts as f64 * 100.0
        }
    }

    /// Rate rendered the way reports print it, e.g. `"75.0%"`.
    pub fn mitigation_display(&self) -> String {
        format!("{:.1}%", self.mitigation_rate())
    }
}

/// Full snapshot derived from one aggregation pass. Never persisted as
/// authoritative state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub database_exfiltration: CategoryMetrics,
    pub phishing: CategoryMetrics,
    pub rce: CategoryMetrics,
    /// Summed counters; the rate is recomputed from the sums, not averaged.
    pub overall: CategoryMetrics,
}

impl MetricsSnapshot {
    /// Compute the snapshot from parsed entries.
    pub fn compute(entries: &[LogEntry]) -> Self {
        let mut snapshot = Self::default();
        for entry in entries {
            match entry.attack_type {
                AttackCategory::DatabaseExfiltration => {
                    snapshot.database_exfiltration.observe(entry)
                }
                AttackCategory::Phishing => snapshot.phishing.observe(entry),
                AttackCategory::Rce => snapshot.rce.observe(entry),
            }
        }
        snapshot.overall.absorb(&snapshot.database_exfiltration);
        snapshot.overall.absorb(&snapshot.phishing);
        snapshot.overall.absorb(&snapshot.rce);
        snapshot
    }

    /// Counters for one category.
    pub fn category(&self, category: AttackCategory) -> &CategoryMetrics {
        match category {
            AttackCategory::DatabaseExfiltration => &self.database_exfiltration,
            AttackCategory::Phishing => &self.phishing,
            AttackCategory::Rce => &self.rce,
        }
    }
}

/// Per-category sub-counters of one identity's activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActivityCounts {
    pub attempts: usize,
    pub allowed: usize,
    pub blocked: usize,
}

impl ActivityCounts {
    fn observe(&mut self, allowed: bool) {
        self.attempts += 1;
        if allowed {
            self.allowed += 1;
        } else {
            self.blocked += 1;
        }
    }
}

/// Activity counters for one caller identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdentityActivity {
    pub attempts: usize,
    pub allowed: usize,
    pub blocked: usize,
    /// Sub-counters per attack category.
    pub by_category: BTreeMap<AttackCategory, ActivityCounts>,
}

impl IdentityActivity {
    /// Share of this identity's attempts that were blocked, as a percentage.
    pub fn block_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.blocked as f64 / self.attempts as f64 * 100.0
        }
    }
}

/// Group entries by identity, then by category, in one pass.
pub fn identity_breakdown(entries: &[LogEntry]) -> BTreeMap<String, IdentityActivity> {
    let mut breakdown: BTreeMap<String, IdentityActivity> = BTreeMap::new();
    for entry in entries {
        let activity = breakdown.entry(entry.identity.clone()).or_default();
        activity.attempts += 1;
        if entry.allowed {
            activity.allowed += 1;
        } else {
            activity.blocked += 1;
        }
        activity
            .by_category
            .entry(entry.attack_type)
            .or_default()
            .observe(entry.allowed);
    }
    breakdown
}

/// Offline aggregator over the three domain logs.
pub struct Aggregator {
    access: Box<dyn AuditSink>,
    phishing: Box<dyn AuditSink>,
    rce: Box<dyn AuditSink>,
}

impl Aggregator {
    /// Aggregator over arbitrary sinks.
    pub fn new(
        access: Box<dyn AuditSink>,
        phishing: Box<dyn AuditSink>,
        rce: Box<dyn AuditSink>,
    ) -> Self {
        Self {
            access,
            phishing,
            rce,
        }
    }

    /// File-backed aggregator over the configured log paths.
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(
            Box::new(FileSink::new(config.access_log())),
            Box::new(FileSink::new(config.phishing_log())),
            Box::new(FileSink::new(config.rce_log())),
        )
    }

    /// Parse every log into the unified entry shape. Missing logs read as
    /// empty; malformed lines are skipped.
    pub fn collect(&self) -> Result<Vec<LogEntry>> {
        let mut entries = Vec::new();
        for line in self.access.read_all()? {
            if let Some(record) = DataAccessRecord::parse(&line) {
                entries.push(record.into());
            }
        }
        for line in self.phishing.read_all()? {
            if let Some(record) = ContentRecord::parse(&line) {
                entries.push(record.into());
            }
        }
        for line in self.rce.read_all()? {
            if let Some(record) = CommandRecord::parse(&line) {
                entries.push(record.into());
            }
        }
        Ok(entries)
    }
}

/// Export every parsed entry (not the snapshot) as CSV with the fixed
/// seven-column header.
pub fn export_csv(entries: &[LogEntry], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "attack_type",
        "timestamp",
        "agent_identity",
        "target",
        "allowed",
        "indicators",
        "reason",
    ])?;
    for entry in entries {
        writer.write_record([
            entry.attack_type.as_str(),
            entry.timestamp.as_str(),
            entry.identity.as_str(),
            entry.target.as_str(),
            bool_token(entry.allowed),
            entry.indicators.as_str(),
            entry.reason.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

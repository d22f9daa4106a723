//! Guarded-resource gateways
//!
//! Three instances of one pattern (data access, content generation, and
//! command execution), each wiring rule-set lookup, indicator matching,
//! the shared decision gate, and audit logging for its resource kind.
//! No command is ever run and no data store is real; a gateway's job is to
//! decide ALLOW/DENY and record why.

pub mod command;
pub mod content;
pub mod data;

pub use command::{CommandGateway, ExecutionResult};
pub use content::{ContentGateway, GeneratedContent};
pub use data::DataGateway;

use crate::identity::Role;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum indicator labels quoted in a user-facing denial reason, bounding
/// message length and limiting how much of the rule set a denial leaks.
const REASON_INDICATOR_LIMIT: usize = 3;

/// A tagged reason an artifact was flagged by a matcher.
///
/// Discovery order is preserved wherever indicators are collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Indicator(String);

impl Indicator {
    /// A blocked keyword found in content.
    pub fn keyword(keyword: &str) -> Self {
        Self(format!("keyword:{keyword}"))
    }

    /// A blocked URL pattern that matched content.
    pub fn url_pattern(pattern: &str) -> Self {
        Self(format!("url_pattern:{pattern}"))
    }

    /// An impersonation phrase found in content.
    pub fn impersonation(phrase: &str) -> Self {
        Self(format!("impersonation:{phrase}"))
    }

    /// A link host outside the allowlist.
    pub fn suspicious_url(host: &str) -> Self {
        Self(format!("suspicious_url:{host}"))
    }

    /// A named blocked-command category.
    pub fn named(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The indicator label as logged.
    pub fn label(&self) -> &str {
        &self.0
    }

    /// Join indicators into a log field; `"none"` when the list is empty.
    pub fn join(indicators: &[Indicator]) -> String {
        if indicators.is_empty() {
            "none".to_string()
        } else {
            indicators
                .iter()
                .map(Indicator::label)
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The resource kind a gateway guards; fixes the wording of its verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// The mock data store.
    DataAccess,
    /// Outbound content (email) generation.
    ContentGeneration,
    /// Simulated command execution.
    CommandExecution,
}

impl ResourceKind {
    fn granted_reason(self) -> &'static str {
        match self {
            ResourceKind::DataAccess => "Access granted",
            ResourceKind::ContentGeneration => "Email generated",
            ResourceKind::CommandExecution => "Command executed",
        }
    }

    fn bypass_reason(self) -> &'static str {
        match self {
            ResourceKind::DataAccess => "Access granted",
            ResourceKind::ContentGeneration => "Malicious content detected but admin bypass enabled",
            ResourceKind::CommandExecution => "Dangerous command detected but admin bypass enabled",
        }
    }

    fn denied_reason(self, target: &str, indicators: &[Indicator]) -> String {
        match self {
            ResourceKind::DataAccess => format!("Access denied to sensitive table: {target}"),
            ResourceKind::ContentGeneration => {
                format!("Malicious email content detected: {}", leading_labels(indicators))
            }
            ResourceKind::CommandExecution => {
                format!("Dangerous command detected: {}", leading_labels(indicators))
            }
        }
    }
}

/// The first few indicator labels, comma-joined.
fn leading_labels(indicators: &[Indicator]) -> String {
    indicators
        .iter()
        .take(REASON_INDICATOR_LIMIT)
        .map(Indicator::label)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Immutable outcome of one gateway decision, minus any payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Whether a privileged bypass was applied.
    pub bypassed: bool,
    /// Indicators triggered by the artifact, in discovery order.
    pub indicators: Vec<Indicator>,
    /// Human-readable reason, as logged.
    pub reason: String,
}

/// The shared decision gate.
///
/// `flagged` is the matcher's conclusion: the sensitivity flag for data
/// access, a non-empty indicator list for the other two kinds. Data access
/// allows the privileged identity unconditionally; content generation and
/// command execution additionally require the explicit `allow_bypass`
/// opt-in on top of privilege.
pub fn decide(
    kind: ResourceKind,
    role: Role,
    target: &str,
    flagged: bool,
    indicators: Vec<Indicator>,
    allow_bypass: bool,
) -> Verdict {
    if !flagged {
        return Verdict {
            allowed: true,
            bypassed: false,
            indicators,
            reason: kind.granted_reason().to_string(),
        };
    }

    match kind {
        ResourceKind::DataAccess if role.is_privileged() => Verdict {
            allowed: true,
            bypassed: false,
            indicators,
            reason: kind.granted_reason().to_string(),
        },
        ResourceKind::ContentGeneration | ResourceKind::CommandExecution
            if role.is_privileged() && allow_bypass =>
        {
            Verdict {
                allowed: true,
                bypassed: true,
                indicators,
                reason: kind.bypass_reason().to_string(),
            }
        }
        _ => {
            let reason = kind.denied_reason(target, &indicators);
            Verdict {
                allowed: false,
                bypassed: false,
                indicators,
                reason,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n: usize) -> Vec<Indicator> {
        (0..n).map(|i| Indicator::named(format!("ind{i}"))).collect()
    }

    // ---- Clean artifacts ----

    #[test]
    fn test_clean_artifact_allowed_for_anyone() {
        for role in [Role::Privileged, Role::Unprivileged] {
            let verdict = decide(
                ResourceKind::CommandExecution,
                role,
                "command",
                false,
                Vec::new(),
                false,
            );
            assert!(verdict.allowed);
            assert!(!verdict.bypassed);
            assert_eq!(verdict.reason, "Command executed");
        }
    }

    // ---- Flagged, unprivileged ----

    #[test]
    fn test_flagged_unprivileged_denied() {
        let verdict = decide(
            ResourceKind::ContentGeneration,
            Role::Unprivileged,
            "email_content",
            true,
            labels(1),
            false,
        );
        assert!(!verdict.allowed);
        assert!(!verdict.bypassed);
        assert_eq!(verdict.reason, "Malicious email content detected: ind0");
    }

    #[test]
    fn test_denial_reason_bounded_to_three_labels() {
        let verdict = decide(
            ResourceKind::CommandExecution,
            Role::Unprivileged,
            "command",
            true,
            labels(5),
            false,
        );
        assert_eq!(verdict.reason, "Dangerous command detected: ind0, ind1, ind2");
        // The full list is still on the verdict.
        assert_eq!(verdict.indicators.len(), 5);
    }

    // ---- Flagged, privileged ----

    #[test]
    fn test_data_access_privilege_alone_allows() {
        let verdict = decide(
            ResourceKind::DataAccess,
            Role::Privileged,
            "user_data",
            true,
            Vec::new(),
            false,
        );
        assert!(verdict.allowed);
        assert!(!verdict.bypassed);
        assert_eq!(verdict.reason, "Access granted");
    }

    #[test]
    fn test_content_privilege_without_bypass_denied() {
        let verdict = decide(
            ResourceKind::ContentGeneration,
            Role::Privileged,
            "email_content",
            true,
            labels(1),
            false,
        );
        assert!(!verdict.allowed);
    }

    #[test]
    fn test_command_privilege_with_bypass_allows() {
        let verdict = decide(
            ResourceKind::CommandExecution,
            Role::Privileged,
            "command",
            true,
            labels(2),
            true,
        );
        assert!(verdict.allowed);
        assert!(verdict.bypassed);
        assert_eq!(
            verdict.reason,
            "Dangerous command detected but admin bypass enabled"
        );
    }

    #[test]
    fn test_bypass_flag_useless_without_privilege() {
        let verdict = decide(
            ResourceKind::CommandExecution,
            Role::Unprivileged,
            "command",
            true,
            labels(1),
            true,
        );
        assert!(!verdict.allowed);
        assert!(!verdict.bypassed);
    }

    #[test]
    fn test_data_denial_names_the_table() {
        let verdict = decide(
            ResourceKind::DataAccess,
            Role::Unprivileged,
            "payment_info",
            true,
            Vec::new(),
            false,
        );
        assert_eq!(
            verdict.reason,
            "Access denied to sensitive table: payment_info"
        );
    }

    // ---- Indicator helpers ----

    #[test]
    fn test_indicator_join_empty_is_none() {
        assert_eq!(Indicator::join(&[]), "none");
    }

    #[test]
    fn test_indicator_join_preserves_order() {
        let list = vec![Indicator::keyword("urgent"), Indicator::suspicious_url("evil.tk")];
        assert_eq!(Indicator::join(&list), "keyword:urgent, suspicious_url:evil.tk");
    }

    #[test]
    fn test_indicator_constructors_tag_labels() {
        assert_eq!(Indicator::keyword("k").label(), "keyword:k");
        assert_eq!(Indicator::url_pattern("p").label(), "url_pattern:p");
        assert_eq!(Indicator::impersonation("i").label(), "impersonation:i");
        assert_eq!(Indicator::suspicious_url("h").label(), "suspicious_url:h");
        assert_eq!(Indicator::named("pipe_to_shell").label(), "pipe_to_shell");
    }
}

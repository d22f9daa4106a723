//! Content-generation gateway
//!
//! Screens outbound content (emails) against the content-safety rules.
//! Four independent checks accumulate indicators: blocked keywords, URL
//! patterns, impersonation phrases, and non-allowlisted link hosts. The
//! checks are a union, not a short-circuit, and content indicators are not
//! deduplicated.

use super::{decide, Indicator, ResourceKind};
use crate::audit::{AuditSink, ContentRecord};
use crate::error::{Error, Result};
use crate::identity::Role;
use crate::policy::ContentRules;
use regex::RegexBuilder;

/// Target descriptor used on the content log and in exports.
pub const CONTENT_TARGET: &str = "email_content";

/// Fixed capture pattern for link-host extraction.
const URL_CAPTURE: &str = r"https?://([^\s/]+)";

/// Run the four content checks and accumulate every triggered indicator.
///
/// Invalid regex patterns in the rule set are skipped, never fatal.
pub fn detect_indicators(content: &str, rules: &ContentRules) -> Vec<Indicator> {
    let lowered = content.to_lowercase();
    let mut indicators = Vec::new();

    for keyword in &rules.blocked_keywords {
        if lowered.contains(&keyword.to_lowercase()) {
            indicators.push(Indicator::keyword(keyword));
        }
    }

    for pattern in &rules.blocked_url_patterns {
        let Ok(re) = RegexBuilder::new(pattern).case_insensitive(true).build() else {
            continue;
        };
        if re.is_match(content) {
            indicators.push(Indicator::url_pattern(pattern));
        }
    }

    for phrase in &rules.impersonation_patterns {
        if lowered.contains(&phrase.to_lowercase()) {
            indicators.push(Indicator::impersonation(phrase));
        }
    }

    // Link hosts outside the allowlist. The capture pattern is fixed; treat
    // a compile failure like an invalid rule and skip the check.
    if let Ok(re) = RegexBuilder::new(URL_CAPTURE).case_insensitive(true).build() {
        for caps in re.captures_iter(content) {
            let host = &caps[1];
            if !rules.allowlist_domains.iter().any(|d| host.contains(d.as_str())) {
                indicators.push(Indicator::suspicious_url(host));
            }
        }
    }

    indicators
}

/// Result payload of an allowed generation.
#[derive(Debug, Clone)]
pub struct GeneratedContent {
    /// The content, echoed verbatim.
    pub content: String,
    /// Whether a privileged bypass was applied.
    pub bypassed: bool,
    /// Indicators triggered despite the allow.
    pub indicators: Vec<Indicator>,
}

/// Gateway over content generation.
pub struct ContentGateway {
    rules: ContentRules,
    sink: Box<dyn AuditSink>,
}

impl ContentGateway {
    /// Gateway enforcing the given rules, auditing to the given sink.
    pub fn new(rules: ContentRules, sink: Box<dyn AuditSink>) -> Self {
        Self { rules, sink }
    }

    /// Validate content and, when allowed, echo it back as the payload.
    ///
    /// Exactly one audit record is written regardless of the branch taken.
    pub fn generate(
        &self,
        content: &str,
        identity: &str,
        allow_bypass: bool,
    ) -> Result<GeneratedContent> {
        let indicators = detect_indicators(content, &self.rules);
        let flagged = !indicators.is_empty();
        let verdict = decide(
            ResourceKind::ContentGeneration,
            Role::of(identity),
            CONTENT_TARGET,
            flagged,
            indicators,
            allow_bypass,
        );

        let record = ContentRecord::new(
            identity,
            verdict.allowed,
            &Indicator::join(&verdict.indicators),
            &verdict.reason,
            content,
        );
        self.sink.append(&record.to_line())?;

        if verdict.allowed {
            if verdict.bypassed {
                tracing::warn!(identity, "Content generation bypassed policy");
            } else {
                tracing::debug!(identity, "Content generation granted");
            }
            Ok(GeneratedContent {
                content: content.to_string(),
                bypassed: verdict.bypassed,
                indicators: verdict.indicators,
            })
        } else {
            tracing::warn!(identity, reason = %verdict.reason, "Content generation denied");
            Err(Error::PermissionDenied {
                reason: verdict.reason,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemorySink;
    use std::sync::Arc;

    fn rules() -> ContentRules {
        serde_json::from_value(serde_json::json!({
            "blocked_keywords": ["reset your password", "verify your account"],
            "blocked_url_patterns": ["bit\\.ly/\\w+", "([invalid"],
            "impersonation_patterns": ["it support", "security team"],
            "allowlist_domains": ["example.com"]
        }))
        .unwrap()
    }

    fn gateway() -> (ContentGateway, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (
            ContentGateway::new(rules(), Box::new(Arc::clone(&sink))),
            sink,
        )
    }

    // ---- Matcher ----

    #[test]
    fn test_clean_content_has_no_indicators() {
        let found = detect_indicators("Meeting notes attached, see you Monday.", &rules());
        assert!(found.is_empty());
    }

    #[test]
    fn test_keyword_matched_case_insensitively() {
        let found = detect_indicators("Please RESET YOUR PASSWORD now", &rules());
        assert_eq!(found, vec![Indicator::keyword("reset your password")]);
    }

    #[test]
    fn test_url_pattern_matched_and_invalid_pattern_skipped() {
        // The rule set carries one valid and one invalid pattern; only the
        // valid one can fire, and the invalid one must not abort the scan.
        let found = detect_indicators("Go to bit.ly/a3f2 right away", &rules());
        assert!(found.contains(&Indicator::url_pattern("bit\\.ly/\\w+")));
    }

    #[test]
    fn test_impersonation_phrase_detected() {
        let found = detect_indicators("This is IT Support writing to you", &rules());
        assert_eq!(found, vec![Indicator::impersonation("it support")]);
    }

    #[test]
    fn test_suspicious_url_outside_allowlist() {
        let found = detect_indicators("Click http://malicious.com/reset now", &rules());
        assert_eq!(found, vec![Indicator::suspicious_url("malicious.com")]);
    }

    #[test]
    fn test_allowlisted_host_not_flagged() {
        let found = detect_indicators("Docs at https://docs.example.com/guide", &rules());
        assert!(found.is_empty());
    }

    #[test]
    fn test_checks_accumulate_as_a_union() {
        let content =
            "This is the security team. Reset your password at http://evil.net/reset today.";
        let found = detect_indicators(content, &rules());
        let labels: Vec<&str> = found.iter().map(Indicator::label).collect();
        assert_eq!(
            labels,
            vec![
                "keyword:reset your password",
                "impersonation:security team",
                "suspicious_url:evil.net",
            ]
        );
    }

    #[test]
    fn test_repeated_hosts_not_deduplicated() {
        let found = detect_indicators(
            "http://evil.net/a then http://evil.net/b",
            &rules(),
        );
        assert_eq!(found.len(), 2);
    }

    // ---- Gateway ----

    #[test]
    fn test_flagged_content_denied_and_logged() {
        let (gateway, sink) = gateway();
        let err = gateway
            .generate("reset your password here", "crewai_agent", false)
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied { .. }));

        let lines = sink.read_all().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("\tFalse\t"));
        assert!(lines[0].contains("keyword:reset your password"));
    }

    #[test]
    fn test_clean_content_allowed_with_none_indicators() {
        let (gateway, sink) = gateway();
        let generated = gateway
            .generate("Quarterly report attached.", "crewai_agent", false)
            .unwrap();
        assert_eq!(generated.content, "Quarterly report attached.");
        assert!(!generated.bypassed);
        assert!(sink.read_all().unwrap()[0].contains("\tnone\t"));
    }

    #[test]
    fn test_admin_bypass_echoes_content_verbatim() {
        let (gateway, sink) = gateway();
        let content = "reset your password at http://evil.net/x";
        let generated = gateway.generate(content, "admin", true).unwrap();
        assert_eq!(generated.content, content);
        assert!(generated.bypassed);
        assert!(!generated.indicators.is_empty());
        assert!(sink.read_all().unwrap()[0].contains("admin bypass enabled"));
    }

    #[test]
    fn test_admin_without_bypass_denied() {
        let (gateway, _) = gateway();
        let err = gateway
            .generate("reset your password", "admin", false)
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied { .. }));
    }

    #[test]
    fn test_denial_reason_truncated_to_three_indicators() {
        let (gateway, _) = gateway();
        let content = "security team: reset your password and verify your account \
                       via http://evil.net/a and http://worse.net/b";
        let err = gateway.generate(content, "crewai_agent", false).unwrap_err();
        let Error::PermissionDenied { reason } = err else {
            panic!("expected PermissionDenied");
        };
        // Three labels quoted, the rest elided.
        assert_eq!(reason.matches(", ").count(), 2);
        assert!(!reason.contains("worse.net"));
    }
}

//! Audit record types and their tab-separated wire format
//!
//! Field order is fixed per domain, one record per newline-terminated line.
//! `allowed` serializes as the literal `True`/`False`. Parsing is lenient:
//! a line with fewer fields than its domain requires yields `None` and the
//! caller skips it.

/// Characters kept of an artifact when previewing it in a log field.
const PREVIEW_CHARS: usize = 100;

/// Current local time in the ISO-8601 format used across all logs.
fn timestamp_now() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// First [`PREVIEW_CHARS`] characters of an artifact.
fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

/// The `allowed` field literal.
pub(crate) fn bool_token(allowed: bool) -> &'static str {
    if allowed {
        "True"
    } else {
        "False"
    }
}

/// Split a log line into fields, stripping only the line terminator so
/// trailing empty fields survive.
fn split_line(line: &str) -> Vec<&str> {
    line.trim_end_matches(['\n', '\r']).split('\t').collect()
}

/// One decision on the data-access log.
///
/// Layout: `timestamp  identity  table  allowed  row_count  reason`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataAccessRecord {
    pub timestamp: String,
    pub identity: String,
    pub table: String,
    pub allowed: bool,
    pub row_count: usize,
    pub reason: String,
}

impl DataAccessRecord {
    /// Record stamped with the current time.
    pub fn new(identity: &str, table: &str, allowed: bool, row_count: usize, reason: &str) -> Self {
        Self {
            timestamp: timestamp_now(),
            identity: identity.to_string(),
            table: table.to_string(),
            allowed,
            row_count,
            reason: reason.to_string(),
        }
    }

    /// Serialize as one fixed-arity log line (no trailing newline).
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.timestamp,
            self.identity,
            self.table,
            bool_token(self.allowed),
            self.row_count,
            self.reason
        )
    }

    /// Parse a log line; `None` when fewer than six fields are present.
    pub fn parse(line: &str) -> Option<Self> {
        let parts = split_line(line);
        if parts.len() < 6 {
            return None;
        }
        Some(Self {
            timestamp: parts[0].to_string(),
            identity: parts[1].to_string(),
            table: parts[2].to_string(),
            allowed: parts[3] == "True",
            row_count: parts[4].parse().unwrap_or(0),
            reason: parts[5].to_string(),
        })
    }
}

/// One decision on the content-generation log.
///
/// Layout: `timestamp  identity  allowed  indicators  reason  content_preview`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRecord {
    pub timestamp: String,
    pub identity: String,
    pub allowed: bool,
    /// Comma-joined indicator labels, or `"none"`.
    pub indicators: String,
    pub reason: String,
    pub content_preview: String,
}

impl ContentRecord {
    /// Record stamped with the current time; `content` is previewed to its
    /// first 100 characters.
    pub fn new(identity: &str, allowed: bool, indicators: &str, reason: &str, content: &str) -> Self {
        Self {
            timestamp: timestamp_now(),
            identity: identity.to_string(),
            allowed,
            indicators: indicators.to_string(),
            reason: reason.to_string(),
            content_preview: preview(content),
        }
    }

    /// Serialize as one fixed-arity log line (no trailing newline).
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.timestamp,
            self.identity,
            bool_token(self.allowed),
            self.indicators,
            self.reason,
            self.content_preview
        )
    }

    /// Parse a log line; `None` when fewer than six fields are present.
    pub fn parse(line: &str) -> Option<Self> {
        let parts = split_line(line);
        if parts.len() < 6 {
            return None;
        }
        Some(Self {
            timestamp: parts[0].to_string(),
            identity: parts[1].to_string(),
            allowed: parts[2] == "True",
            indicators: parts[3].to_string(),
            reason: parts[4].to_string(),
            content_preview: parts[5].to_string(),
        })
    }
}

/// One decision on the command-execution log.
///
/// Layout: `timestamp  identity  allowed  indicators  reason
/// command_preview  simulated_output`. A denied command carries an empty
/// `simulated_output` field, which still counts toward the arity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    pub timestamp: String,
    pub identity: String,
    pub allowed: bool,
    /// Comma-joined indicator labels, or `"none"`.
    pub indicators: String,
    pub reason: String,
    pub command_preview: String,
    pub simulated_output: String,
}

impl CommandRecord {
    /// Record stamped with the current time; `command` is previewed to its
    /// first 100 characters.
    pub fn new(
        identity: &str,
        allowed: bool,
        indicators: &str,
        reason: &str,
        command: &str,
        simulated_output: &str,
    ) -> Self {
        Self {
            timestamp: timestamp_now(),
            identity: identity.to_string(),
            allowed,
            indicators: indicators.to_string(),
            reason: reason.to_string(),
            command_preview: preview(command),
            simulated_output: simulated_output.to_string(),
        }
    }

    /// Serialize as one fixed-arity log line (no trailing newline).
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.timestamp,
            self.identity,
            bool_token(self.allowed),
            self.indicators,
            self.reason,
            self.command_preview,
            self.simulated_output
        )
    }

    /// Parse a log line; `None` when fewer than seven fields are present.
    pub fn parse(line: &str) -> Option<Self> {
        let parts = split_line(line);
        if parts.len() < 7 {
            return None;
        }
        Some(Self {
            timestamp: parts[0].to_string(),
            identity: parts[1].to_string(),
            allowed: parts[2] == "True",
            indicators: parts[3].to_string(),
            reason: parts[4].to_string(),
            command_preview: parts[5].to_string(),
            simulated_output: parts[6].to_string(),
        })
    }
}

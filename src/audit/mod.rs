//! Append-only audit trail
//!
//! Every gateway decision writes exactly one tab-separated record to its
//! domain log, on every branch, before the result or error reaches the
//! caller. Records are never mutated or deleted; the logs are the sole
//! source of truth for the metrics aggregator.

mod record;
mod sink;

pub use record::{CommandRecord, ContentRecord, DataAccessRecord};
pub use sink::{AuditSink, FileSink, MemorySink};

pub(crate) use record::bool_token;

//! Data-access gateway
//!
//! Guards the mock data store. Sensitivity is a per-table flag, not a
//! pattern match: a sensitive table (or an explicit `require_sensitive`
//! request) is only served to the privileged identity. A missing table is
//! a lookup failure, never a permission error.

use super::{decide, ResourceKind};
use crate::audit::{AuditSink, DataAccessRecord};
use crate::error::{Error, Result};
use crate::identity::Role;
use crate::policy::DataStore;

/// Gateway over the mock data store.
pub struct DataGateway {
    store: DataStore,
    sink: Box<dyn AuditSink>,
}

impl DataGateway {
    /// Gateway over the given store, auditing to the given sink.
    pub fn new(store: DataStore, sink: Box<dyn AuditSink>) -> Self {
        Self { store, sink }
    }

    /// Query a table under the sensitive-table policy.
    ///
    /// Exactly one audit record is written regardless of the branch taken.
    pub fn query(
        &self,
        table: &str,
        identity: &str,
        require_sensitive: bool,
    ) -> Result<Vec<serde_json::Value>> {
        let Some(entry) = self.store.table(table) else {
            let reason = format!("Table not found: {table}");
            self.log(identity, table, false, 0, &reason)?;
            tracing::warn!(identity, table, "Table not found");
            return Err(Error::NotFound {
                table: table.to_string(),
            });
        };

        let flagged = entry.sensitive || require_sensitive;
        let verdict = decide(
            ResourceKind::DataAccess,
            Role::of(identity),
            table,
            flagged,
            Vec::new(),
            false,
        );

        if verdict.allowed {
            let rows = entry.rows.clone();
            self.log(identity, table, true, rows.len(), &verdict.reason)?;
            tracing::debug!(identity, table, rows = rows.len(), "Data access granted");
            Ok(rows)
        } else {
            self.log(identity, table, false, 0, &verdict.reason)?;
            tracing::warn!(identity, table, reason = %verdict.reason, "Data access denied");
            Err(Error::PermissionDenied {
                reason: verdict.reason,
            })
        }
    }

    /// Query without the sensitivity requirement.
    pub fn query_table(&self, table: &str, identity: &str) -> Result<Vec<serde_json::Value>> {
        self.query(table, identity, false)
    }

    fn log(
        &self,
        identity: &str,
        table: &str,
        allowed: bool,
        row_count: usize,
        reason: &str,
    ) -> Result<()> {
        self.sink
            .append(&DataAccessRecord::new(identity, table, allowed, row_count, reason).to_line())
    }
}

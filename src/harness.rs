//! Composition root
//!
//! Assembles the three gateways from one configuration: policy documents
//! are loaded once, and each gateway gets a file-backed sink for its
//! domain log.

use crate::audit::FileSink;
use crate::config::HarnessConfig;
use crate::error::Result;
use crate::gateway::{CommandGateway, ContentGateway, DataGateway};
use crate::policy::PolicyStore;

/// The three guarded-resource gateways, assembled from one configuration.
pub struct Harness {
    /// Data-access gateway over the mock store.
    pub data: DataGateway,
    /// Content-generation gateway.
    pub content: ContentGateway,
    /// Command-execution gateway.
    pub command: CommandGateway,
}

impl Harness {
    /// Load the policy documents and open the file-backed audit logs.
    ///
    /// Fails fast when a policy document is missing or malformed; the
    /// engine cannot make any decision without its rule sets.
    pub fn open(config: &HarnessConfig) -> Result<Self> {
        let policy = PolicyStore::load(config)?;
        Ok(Self {
            data: DataGateway::new(policy.data, Box::new(FileSink::new(config.access_log()))),
            content: ContentGateway::new(
                policy.content,
                Box::new(FileSink::new(config.phishing_log())),
            ),
            command: CommandGateway::new(
                policy.command,
                Box::new(FileSink::new(config.rce_log())),
            ),
        })
    }
}

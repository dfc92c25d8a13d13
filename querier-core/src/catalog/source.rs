//! Bookkeeping for live catalog connections

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

use super::CatalogClient;

/// One live, addressable catalog endpoint
///
/// Timestamps are maintained by whatever manages the connection; the
/// querier only ever uses `client`.
#[derive(Clone)]
pub struct SourceRef {
    /// Address the client is connected to (e.g., "catalog.olm.svc:50051")
    pub address: String,

    pub client: Arc<dyn CatalogClient>,

    /// Last connection attempt
    pub last_connect: DateTime<Utc>,

    /// Last time the source passed a health check
    pub last_healthy: Option<DateTime<Utc>>,
}

impl SourceRef {
    /// Record a fresh connection made now, not yet known to be healthy
    pub fn new(address: impl Into<String>, client: Arc<dyn CatalogClient>) -> Self {
        Self {
            address: address.into(),
            client,
            last_connect: Utc::now(),
            last_healthy: None,
        }
    }

    /// Called by the connection health monitor after a successful check
    pub fn mark_healthy(&mut self, at: DateTime<Utc>) {
        self.last_healthy = Some(at);
    }
}

impl fmt::Debug for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceRef")
            .field("address", &self.address)
            .field("last_connect", &self.last_connect)
            .field("last_healthy", &self.last_healthy)
            .finish_non_exhaustive()
    }
}

//! Catalog client trait - the query surface every catalog source exposes
//!
//! The querier is agnostic to how a source is reached (gRPC, HTTP, an
//! in-process index); anything implementing [`CatalogClient`] can be
//! registered as a source.

use async_trait::async_trait;
use thiserror::Error;

use super::Bundle;
use crate::context::CallContext;

/// Errors reported by a catalog source
///
/// The querier treats every variant as "this source could not answer".
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The source has no matching bundle
    #[error("{0}")]
    NotFound(String),

    /// The source could not be reached
    #[error("catalog source at {address} unreachable: {reason}")]
    Unreachable { address: String, reason: String },

    /// The call context was cancelled before the source answered
    #[error("catalog query cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Remote lookups a catalog source must support
///
/// Implementations must be safe to call concurrently and should stop work
/// promptly once `ctx` is cancelled.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Exact lookup of `bundle_name` in a package channel
    async fn get_bundle(
        &self,
        ctx: &CallContext,
        package: &str,
        channel: &str,
        bundle_name: &str,
    ) -> Result<Bundle, CatalogError>;

    /// Latest bundle (channel head) of a package channel
    async fn get_bundle_in_package_channel(
        &self,
        ctx: &CallContext,
        package: &str,
        channel: &str,
    ) -> Result<Bundle, CatalogError>;

    /// Bundle that replaces `bundle_name` in a package channel's upgrade chain
    async fn get_replacement_bundle_in_package_channel(
        &self,
        ctx: &CallContext,
        bundle_name: &str,
        package: &str,
        channel: &str,
    ) -> Result<Bundle, CatalogError>;

    /// Bundle providing an API, where `group` may be the bare group or `plural.group`
    async fn get_bundle_that_provides(
        &self,
        ctx: &CallContext,
        group: &str,
        version: &str,
        kind: &str,
    ) -> Result<Bundle, CatalogError>;
}

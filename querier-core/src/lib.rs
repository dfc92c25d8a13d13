//! Catalog querier library exports
//!
//! Resolves bundles (installable package releases) across any number of
//! independently operated catalog sources. See [`querier`] for the
//! resolution rules.

pub mod catalog;
pub mod context;
pub mod querier;

pub use catalog::{ApiKey, Bundle, CatalogClient, CatalogError, CatalogKey, SourceRef};
pub use context::CallContext;
pub use querier::{
    ErrorKind, NamespaceSourceQuerier, QuerierConfig, ResolverError, SourceOrder, SourceQuerier,
};

//! Querier error types

use std::fmt;
use thiserror::Error;

use crate::catalog::{ApiKey, CatalogError, CatalogKey};

/// The query a failed lookup was answering, rendered into `NotFound` errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Bundle {
        package: String,
        channel: String,
        bundle_name: String,
    },
    Latest {
        package: String,
        channel: String,
    },
    Replacement {
        bundle_name: String,
        package: String,
        channel: String,
    },
    Provider(ApiKey),
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Bundle {
                package,
                channel,
                bundle_name,
            } => write!(f, "{package}/{channel}/{bundle_name}"),
            Lookup::Latest { package, channel } => write!(f, "{package}/{channel}"),
            Lookup::Replacement {
                bundle_name,
                package,
                channel,
            } => write!(f, "replacement for {bundle_name} in {package}/{channel}"),
            Lookup::Provider(api) => write!(f, "{api}"),
        }
    }
}

impl Lookup {
    /// How an exhausted fan-out reports this lookup
    fn missing(&self) -> &'static str {
        match self {
            Lookup::Provider(_) => "not provided by a package in any CatalogSource",
            _ => "not found in any available CatalogSource",
        }
    }
}

/// One source's answer to a fan-out query that came back empty
#[derive(Debug)]
pub struct SourceFailure {
    pub catalog: CatalogKey,
    pub error: CatalogError,
}

/// Coarse classification of a [`ResolverError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NoSourcesRegistered,
    SourceNotRegistered,
    NotFound,
    SourceUnreachable,
    Cancelled,
}

/// Errors returned by [`SourceQuerier`](super::SourceQuerier) operations
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("no catalog sources available")]
    NoSourcesRegistered,

    /// A targeted lookup named a source missing from the snapshot
    #[error("CatalogSource {0} not found")]
    SourceNotRegistered(CatalogKey),

    /// Every source was asked and none had an answer
    #[error("{lookup} {}", .lookup.missing())]
    NotFound {
        lookup: Lookup,
        /// Per-source errors, in the order sources were tried
        failures: Vec<SourceFailure>,
    },

    /// The targeted source's own error
    #[error(transparent)]
    Source(#[from] CatalogError),
}

impl ResolverError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolverError::NoSourcesRegistered => ErrorKind::NoSourcesRegistered,
            ResolverError::SourceNotRegistered(_) => ErrorKind::SourceNotRegistered,
            ResolverError::NotFound { .. } => ErrorKind::NotFound,
            ResolverError::Source(CatalogError::NotFound(_)) => ErrorKind::NotFound,
            ResolverError::Source(CatalogError::Cancelled) => ErrorKind::Cancelled,
            ResolverError::Source(CatalogError::Unreachable { .. } | CatalogError::Other(_)) => {
                ErrorKind::SourceUnreachable
            }
        }
    }

    /// Per-source failures behind a fan-out `NotFound`; empty otherwise
    pub fn failures(&self) -> &[SourceFailure] {
        match self {
            ResolverError::NotFound { failures, .. } => failures,
            _ => &[],
        }
    }
}

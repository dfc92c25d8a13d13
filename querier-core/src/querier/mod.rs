//! Source querier - resolves bundles across a set of catalog sources
//!
//! Every lookup runs in one of two modes:
//!
//! - **Targeted**: a preferred source was named. Only that source is asked,
//!   exactly once, and its error is returned unchanged. A source missing
//!   from the snapshot is an error, never a reason to fall back.
//! - **Fan-out**: no source was named. Sources are asked one after another
//!   in snapshot order; the first answer wins. Individual failures are
//!   skipped and reported together only if nobody answers.
//!
//! The snapshot is fixed at construction. When the set of healthy sources
//! changes, build a new querier.

mod config;
mod error;


pub use config::{QuerierConfig, SourceOrder};
pub use error::{ErrorKind, Lookup, ResolverError, SourceFailure};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

use crate::catalog::{ApiKey, Bundle, CatalogClient, CatalogError, CatalogKey, SourceRef};
use crate::context::CallContext;

/// A resolved bundle and the source that produced it
pub type Resolved = (Bundle, CatalogKey);

/// Lookups offered to the installation planner
///
/// `source` selects targeted mode when it is `Some` non-zero key.
#[async_trait]
pub trait SourceQuerier: Send + Sync {
    /// Fails when there are no sources to query at all
    fn queryable(&self) -> Result<(), ResolverError>;

    /// Find any bundle providing `api`, searching every source
    async fn find_provider(
        &self,
        ctx: &CallContext,
        api: &ApiKey,
    ) -> Result<Resolved, ResolverError>;

    /// Exact lookup when `bundle_name` is non-empty, latest-in-channel otherwise
    async fn find_package(
        &self,
        ctx: &CallContext,
        package: &str,
        channel: &str,
        bundle_name: Option<&str>,
        source: Option<&CatalogKey>,
    ) -> Result<Resolved, ResolverError>;

    async fn find_bundle(
        &self,
        ctx: &CallContext,
        package: &str,
        channel: &str,
        bundle_name: &str,
        source: Option<&CatalogKey>,
    ) -> Result<Resolved, ResolverError>;

    async fn find_latest_bundle(
        &self,
        ctx: &CallContext,
        package: &str,
        channel: &str,
        source: Option<&CatalogKey>,
    ) -> Result<Resolved, ResolverError>;

    /// Find the bundle that replaces `bundle_name` in a channel's upgrade chain
    async fn find_replacement(
        &self,
        ctx: &CallContext,
        bundle_name: &str,
        package: &str,
        channel: &str,
        source: Option<&CatalogKey>,
    ) -> Result<Resolved, ResolverError>;
}

/// A single remote call against one source
#[derive(Debug, Clone, Copy)]
enum Query<'a> {
    Bundle {
        package: &'a str,
        channel: &'a str,
        bundle_name: &'a str,
    },
    Latest {
        package: &'a str,
        channel: &'a str,
    },
    Replacement {
        bundle_name: &'a str,
        package: &'a str,
        channel: &'a str,
    },
    Provides {
        group: &'a str,
        version: &'a str,
        kind: &'a str,
    },
}

impl Query<'_> {
    async fn issue(
        self,
        client: &dyn CatalogClient,
        ctx: &CallContext,
    ) -> Result<Bundle, CatalogError> {
        match self {
            Query::Bundle {
                package,
                channel,
                bundle_name,
            } => client.get_bundle(ctx, package, channel, bundle_name).await,
            Query::Latest { package, channel } => {
                client
                    .get_bundle_in_package_channel(ctx, package, channel)
                    .await
            }
            Query::Replacement {
                bundle_name,
                package,
                channel,
            } => {
                client
                    .get_replacement_bundle_in_package_channel(ctx, bundle_name, package, channel)
                    .await
            }
            Query::Provides {
                group,
                version,
                kind,
            } => {
                client
                    .get_bundle_that_provides(ctx, group, version, kind)
                    .await
            }
        }
    }
}

/// Querier over a fixed snapshot of catalog sources
///
/// Sources are kept in fan-out order: sorted by key, or in registration
/// order, per [`QuerierConfig::source_order`].
pub struct NamespaceSourceQuerier {
    sources: Vec<(CatalogKey, Arc<dyn CatalogClient>)>,
    config: QuerierConfig,
}

impl NamespaceSourceQuerier {
    /// Build a querier over `sources` with the default config
    pub fn new(sources: HashMap<CatalogKey, Arc<dyn CatalogClient>>) -> Self {
        Self::with_config(sources, QuerierConfig::default())
    }

    /// Build a querier with an explicit config
    ///
    /// A key that appears twice keeps its position and takes the later client.
    pub fn with_config<I>(sources: I, config: QuerierConfig) -> Self
    where
        I: IntoIterator<Item = (CatalogKey, Arc<dyn CatalogClient>)>,
    {
        let mut querier = Self {
            sources: Vec::new(),
            config,
        };
        for (key, client) in sources {
            querier.insert(key, client);
        }
        querier.apply_order();
        querier
    }

    /// Build a querier from connection records, using each record's client
    pub fn from_source_refs(refs: &HashMap<CatalogKey, SourceRef>) -> Self {
        Self::with_config(
            refs.iter()
                .map(|(key, source)| (key.clone(), Arc::clone(&source.client))),
            QuerierConfig::default(),
        )
    }

    /// Add or replace one source
    pub fn with_source(mut self, key: CatalogKey, client: Arc<dyn CatalogClient>) -> Self {
        self.insert(key, client);
        self.apply_order();
        self
    }

    pub fn config(&self) -> &QuerierConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn contains(&self, key: &CatalogKey) -> bool {
        self.client(key).is_some()
    }

    /// Source keys in fan-out order
    pub fn keys(&self) -> impl Iterator<Item = &CatalogKey> {
        self.sources.iter().map(|(key, _)| key)
    }

    fn insert(&mut self, key: CatalogKey, client: Arc<dyn CatalogClient>) {
        let position = self
            .sources
            .iter()
            .position(|(existing, _)| *existing == key);
        match position {
            Some(index) => self.sources[index].1 = client,
            None => self.sources.push((key, client)),
        }
    }

    fn apply_order(&mut self) {
        if self.config.source_order == SourceOrder::Lexicographic {
            self.sources.sort_by(|(a, _), (b, _)| a.cmp(b));
        }
    }

    fn client(&self, key: &CatalogKey) -> Option<&dyn CatalogClient> {
        self.sources
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, client)| client.as_ref())
    }

    /// Issue one remote call under a child scope of `ctx`
    ///
    /// The scope is cancelled when the call returns, whichever way it returns.
    async fn call(
        &self,
        ctx: &CallContext,
        key: &CatalogKey,
        client: &dyn CatalogClient,
        query: Query<'_>,
    ) -> Result<Bundle, CatalogError> {
        let scope = ctx.child();
        let _guard = scope.drop_guard();

        trace!(source = %key, ?query, "Querying catalog source");

        tokio::select! {
            biased;
            _ = scope.cancelled() => Err(CatalogError::Cancelled),
            result = query.issue(client, &scope) => result,
        }
    }

    /// Dispatch to targeted or fan-out mode
    async fn resolve(
        &self,
        ctx: &CallContext,
        source: Option<&CatalogKey>,
        query: Query<'_>,
        lookup: Lookup,
    ) -> Result<Resolved, ResolverError> {
        match source.filter(|key| !key.is_empty()) {
            Some(key) => self.targeted(ctx, key, query).await,
            None => self.fan_out(ctx, &[query], lookup).await,
        }
    }

    async fn targeted(
        &self,
        ctx: &CallContext,
        key: &CatalogKey,
        query: Query<'_>,
    ) -> Result<Resolved, ResolverError> {
        let client = self
            .client(key)
            .ok_or_else(|| ResolverError::SourceNotRegistered(key.clone()))?;

        let bundle = self.call(ctx, key, client, query).await?;
        debug!(source = %key, bundle = %bundle.name, "Resolved bundle from targeted source");
        Ok((bundle, key.clone()))
    }

    /// Ask each source in turn, trying every query against a source before moving on
    async fn fan_out(
        &self,
        ctx: &CallContext,
        queries: &[Query<'_>],
        lookup: Lookup,
    ) -> Result<Resolved, ResolverError> {
        let mut failures = Vec::new();

        for (key, client) in &self.sources {
            for query in queries {
                match self.call(ctx, key, client.as_ref(), *query).await {
                    Ok(bundle) => {
                        debug!(source = %key, bundle = %bundle.name, "Resolved bundle");
                        return Ok((bundle, key.clone()));
                    }
                    Err(error) => {
                        trace!(source = %key, %error, "Catalog source could not answer");
                        if self.config.record_failures {
                            failures.push(SourceFailure {
                                catalog: key.clone(),
                                error,
                            });
                        }
                    }
                }
            }
        }

        debug!(
            %lookup,
            sources = self.sources.len(),
            "Lookup exhausted all catalog sources"
        );
        Err(ResolverError::NotFound { lookup, failures })
    }
}

impl FromIterator<(CatalogKey, Arc<dyn CatalogClient>)> for NamespaceSourceQuerier {
    fn from_iter<T: IntoIterator<Item = (CatalogKey, Arc<dyn CatalogClient>)>>(iter: T) -> Self {
        Self::with_config(iter, QuerierConfig::default())
    }
}

#[async_trait]
impl SourceQuerier for NamespaceSourceQuerier {
    fn queryable(&self) -> Result<(), ResolverError> {
        if self.sources.is_empty() {
            return Err(ResolverError::NoSourcesRegistered);
        }
        Ok(())
    }

    #[instrument(level = "debug", skip(self, ctx, api), fields(api = %api))]
    async fn find_provider(
        &self,
        ctx: &CallContext,
        api: &ApiKey,
    ) -> Result<Resolved, ResolverError> {
        let full_name = api.full_name();
        let queries = [
            Query::Provides {
                group: &api.group,
                version: &api.version,
                kind: &api.kind,
            },
            Query::Provides {
                group: &full_name,
                version: &api.version,
                kind: &api.kind,
            },
        ];

        self.fan_out(ctx, &queries, Lookup::Provider(api.clone()))
            .await
    }

    async fn find_package(
        &self,
        ctx: &CallContext,
        package: &str,
        channel: &str,
        bundle_name: Option<&str>,
        source: Option<&CatalogKey>,
    ) -> Result<Resolved, ResolverError> {
        match bundle_name.filter(|name| !name.is_empty()) {
            Some(name) => self.find_bundle(ctx, package, channel, name, source).await,
            None => self.find_latest_bundle(ctx, package, channel, source).await,
        }
    }

    #[instrument(level = "debug", skip(self, ctx))]
    async fn find_bundle(
        &self,
        ctx: &CallContext,
        package: &str,
        channel: &str,
        bundle_name: &str,
        source: Option<&CatalogKey>,
    ) -> Result<Resolved, ResolverError> {
        let query = Query::Bundle {
            package,
            channel,
            bundle_name,
        };
        let lookup = Lookup::Bundle {
            package: package.to_string(),
            channel: channel.to_string(),
            bundle_name: bundle_name.to_string(),
        };
        self.resolve(ctx, source, query, lookup).await
    }

    #[instrument(level = "debug", skip(self, ctx))]
    async fn find_latest_bundle(
        &self,
        ctx: &CallContext,
        package: &str,
        channel: &str,
        source: Option<&CatalogKey>,
    ) -> Result<Resolved, ResolverError> {
        let query = Query::Latest { package, channel };
        let lookup = Lookup::Latest {
            package: package.to_string(),
            channel: channel.to_string(),
        };
        self.resolve(ctx, source, query, lookup).await
    }

    #[instrument(level = "debug", skip(self, ctx))]
    async fn find_replacement(
        &self,
        ctx: &CallContext,
        bundle_name: &str,
        package: &str,
        channel: &str,
        source: Option<&CatalogKey>,
    ) -> Result<Resolved, ResolverError> {
        let query = Query::Replacement {
            bundle_name,
            package,
            channel,
        };
        let lookup = Lookup::Replacement {
            bundle_name: bundle_name.to_string(),
            package: package.to_string(),
            channel: channel.to_string(),
        };
        self.resolve(ctx, source, query, lookup).await
    }
}

//! Test helper functions for integration tests
//!
//! Shared across test files using the tests/common/ pattern.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use querier_core::{Bundle, CallContext, CatalogClient, CatalogError, CatalogKey};

/// Initialize logging for tests (only once per test run)
static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// How a fake catalog behaves when asked anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Answer from its contents
    Serve,
    /// Fail every call as unreachable
    Unreachable,
    /// Never answer; wait for the call context to be cancelled
    Hang,
}

/// In-memory catalog that counts every call made to it
pub struct FakeCatalog {
    address: String,
    behavior: Behavior,
    bundles: Vec<Bundle>,
    providers: HashMap<(String, String, String), Bundle>,
    calls: AtomicUsize,
    log: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            behavior: Behavior::Serve,
            bundles: Vec::new(),
            providers: HashMap::new(),
            calls: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable(address: &str) -> Self {
        Self {
            behavior: Behavior::Unreachable,
            ..Self::new(address)
        }
    }

    pub fn hanging(address: &str) -> Self {
        Self {
            behavior: Behavior::Hang,
            ..Self::new(address)
        }
    }

    /// Add a bundle, optionally replacing an earlier release of its channel
    pub fn with_bundle(
        mut self,
        package: &str,
        channel: &str,
        name: &str,
        replaces: Option<&str>,
    ) -> Self {
        let mut bundle = Bundle::new(name, package, channel);
        bundle.replaces = replaces.map(str::to_string);
        bundle.bundle_path = Some(format!("{}/{}", self.address, name));
        self.bundles.push(bundle);
        self
    }

    /// Serve `bundle_name` for exactly this (group, version, kind) triple
    pub fn with_provider(
        mut self,
        group: &str,
        version: &str,
        kind: &str,
        bundle_name: &str,
    ) -> Self {
        self.providers.insert(
            (group.to_string(), version.to_string(), kind.to_string()),
            Bundle::new(bundle_name, "provider-pkg", "stable"),
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Names of the operations called, in order
    pub fn call_log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    async fn enter(&self, ctx: &CallContext, operation: String) -> Result<(), CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(operation);

        match self.behavior {
            Behavior::Serve => Ok(()),
            Behavior::Unreachable => Err(CatalogError::Unreachable {
                address: self.address.clone(),
                reason: "connection refused".to_string(),
            }),
            Behavior::Hang => {
                ctx.cancelled().await;
                Err(CatalogError::Cancelled)
            }
        }
    }

    fn in_channel<'a>(
        &'a self,
        package: &'a str,
        channel: &'a str,
    ) -> impl Iterator<Item = &'a Bundle> {
        self.bundles
            .iter()
            .filter(move |b| b.package_name == package && b.channel_name == channel)
    }

    fn not_found(&self, what: String) -> CatalogError {
        CatalogError::NotFound(format!("{what} not found at {}", self.address))
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn get_bundle(
        &self,
        ctx: &CallContext,
        package: &str,
        channel: &str,
        bundle_name: &str,
    ) -> Result<Bundle, CatalogError> {
        self.enter(ctx, format!("get_bundle {package}/{channel}/{bundle_name}"))
            .await?;
        self.in_channel(package, channel)
            .find(|b| b.name == bundle_name)
            .cloned()
            .ok_or_else(|| self.not_found(format!("{package}/{channel}/{bundle_name}")))
    }

    async fn get_bundle_in_package_channel(
        &self,
        ctx: &CallContext,
        package: &str,
        channel: &str,
    ) -> Result<Bundle, CatalogError> {
        self.enter(
            ctx,
            format!("get_bundle_in_package_channel {package}/{channel}"),
        )
        .await?;
        // Channel head: the release nothing else in the channel replaces
        self.in_channel(package, channel)
            .find(|candidate| {
                !self
                    .in_channel(package, channel)
                    .any(|b| b.replaces.as_deref() == Some(candidate.name.as_str()))
            })
            .cloned()
            .ok_or_else(|| self.not_found(format!("{package}/{channel}")))
    }

    async fn get_replacement_bundle_in_package_channel(
        &self,
        ctx: &CallContext,
        bundle_name: &str,
        package: &str,
        channel: &str,
    ) -> Result<Bundle, CatalogError> {
        self.enter(
            ctx,
            format!("get_replacement_bundle_in_package_channel {bundle_name} {package}/{channel}"),
        )
        .await?;
        self.in_channel(package, channel)
            .find(|b| b.replaces.as_deref() == Some(bundle_name))
            .cloned()
            .ok_or_else(|| self.not_found(format!("replacement for {bundle_name}")))
    }

    async fn get_bundle_that_provides(
        &self,
        ctx: &CallContext,
        group: &str,
        version: &str,
        kind: &str,
    ) -> Result<Bundle, CatalogError> {
        self.enter(
            ctx,
            format!("get_bundle_that_provides {group}/{version}/{kind}"),
        )
        .await?;
        self.providers
            .get(&(group.to_string(), version.to_string(), kind.to_string()))
            .cloned()
            .ok_or_else(|| self.not_found(format!("{group}/{version}/{kind}")))
    }
}

/// Shorthand for a catalog key in the test namespace
pub fn key(name: &str) -> CatalogKey {
    CatalogKey::new(name, "olm")
}

/// Build a source map, keeping typed handles to the fakes for call counting
pub fn sources(fakes: &[(&str, &Arc<FakeCatalog>)]) -> HashMap<CatalogKey, Arc<dyn CatalogClient>> {
    fakes
        .iter()
        .map(|(name, fake)| (key(name), Arc::clone(*fake) as Arc<dyn CatalogClient>))
        .collect()
}

/// The etcd catalog used by most scenarios
pub fn etcd_catalog(address: &str) -> FakeCatalog {
    FakeCatalog::new(address)
        .with_bundle("etcd", "alpha", "etcd.v1", None)
        .with_bundle("etcd", "alpha", "etcd.v2", Some("etcd.v1"))
}

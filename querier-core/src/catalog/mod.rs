//! Catalog sources and the data they serve
//!
//! A catalog source is a remote endpoint holding packages, channels and
//! the bundles released into them. This module defines how sources are
//! identified ([`CatalogKey`]), what they return ([`Bundle`]), and the
//! query surface they must implement ([`CatalogClient`]).

mod bundle;
mod client;
mod key;
mod source;

pub use bundle::Bundle;
pub use client::{CatalogClient, CatalogError};
pub use key::{ApiKey, CatalogKey};
pub use source::SourceRef;

//! Bundle payloads returned by catalog sources
//!
//! A bundle is one installable release of a package. The querier hands
//! bundles back to its caller untouched; the fields here exist for the
//! installation planner and for anything that persists resolved bundles.

use serde::{Deserialize, Serialize};

use super::ApiKey;

/// One installable release of a package
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    /// Release name (e.g., "etcdoperator.v0.9.4")
    pub name: String,

    /// Package the release belongs to
    pub package_name: String,

    /// Channel the release was found in
    pub channel_name: String,

    /// Version string, if the catalog reports one
    #[serde(default)]
    pub version: Option<String>,

    /// Image or path the bundle content is pulled from
    #[serde(default)]
    pub bundle_path: Option<String>,

    /// Release this bundle upgrades from
    #[serde(default)]
    pub replaces: Option<String>,

    /// Releases this bundle may be installed over directly
    #[serde(default)]
    pub skips: Vec<String>,

    /// APIs this bundle provides
    #[serde(default)]
    pub provided_apis: Vec<ApiKey>,

    /// Raw manifests shipped in the bundle
    #[serde(default)]
    pub objects: Vec<serde_json::Value>,
}

impl Bundle {
    pub fn new(
        name: impl Into<String>,
        package_name: impl Into<String>,
        channel_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            package_name: package_name.into(),
            channel_name: channel_name.into(),
            ..Default::default()
        }
    }

    /// Whether this bundle declares `api` among its provided APIs
    ///
    /// Matches on group, version and kind; the group may also be given in
    /// its `plural.group` form.
    /// Catalog client implementations use this to answer
    /// `get_bundle_that_provides`.
    pub fn provides(&self, group: &str, version: &str, kind: &str) -> bool {
        self.provided_apis.iter().any(|api| {
            api.version == version
                && api.kind == kind
                && (api.group == group || api.full_name() == group)
        })
    }
}

//! Querier configuration
//!
//! ```yaml
//! source_order: lexicographic   # or "registration"
//! record_failures: true
//! ```
//!
//! A missing config file means defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Order in which fan-out lookups visit sources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceOrder {
    /// Sorted by catalog key (name, then namespace)
    #[default]
    Lexicographic,
    /// The order sources were handed to the querier
    Registration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerierConfig {
    /// Fan-out visiting order; decides the winner when several sources match
    #[serde(default)]
    pub source_order: SourceOrder,

    /// Keep each source's error on an exhausted fan-out lookup
    #[serde(default = "default_record_failures")]
    pub record_failures: bool,
}

impl Default for QuerierConfig {
    fn default() -> Self {
        Self {
            source_order: SourceOrder::default(),
            record_failures: default_record_failures(),
        }
    }
}

fn default_record_failures() -> bool {
    true
}

impl QuerierConfig {
    /// Parse config from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml_ng::from_str(content).context("Failed to parse querier config YAML")
    }

    /// Load config from a file, falling back to defaults when it doesn't exist
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No querier config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read querier config: {}", path.display()))?;

        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse querier config: {}", path.display()))
    }
}

#![forbid(unsafe_code)]

//! Persisted view state.
//!
//! A [`ViewSnapshot`] records everything the user can change about a view,
//! in the same declarative forms the attributes use (order string, pin
//! spec, rules JSON), so saved views stay readable and survive columns
//! being added later.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Snapshot format version written by this build.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable view state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSnapshot {
    /// Format version.
    pub version: u32,
    /// Sorted column key.
    #[serde(default)]
    pub sort_column: Option<String>,
    /// `asc` or `desc`.
    #[serde(default = "default_direction")]
    pub sort_direction: String,
    /// Free-text query.
    #[serde(default)]
    pub query: String,
    /// Column the query is scoped to.
    #[serde(default)]
    pub query_column: Option<String>,
    /// Rules as a JSON array string.
    #[serde(default = "empty_rules")]
    pub rules: String,
    /// 1-based page.
    #[serde(default = "first_page")]
    pub page: usize,
    /// Rows per page.
    #[serde(default)]
    pub page_size: Option<usize>,
    /// Comma-separated column keys.
    #[serde(default)]
    pub column_order: String,
    /// Pin spec.
    #[serde(default)]
    pub pins: String,
    /// Explicit widths by column key.
    #[serde(default)]
    pub widths: BTreeMap<String, f64>,
    /// Selected row ids.
    #[serde(default)]
    pub selected: Vec<u64>,
}

fn default_direction() -> String {
    "asc".to_string()
}

fn empty_rules() -> String {
    "[]".to_string()
}

fn first_page() -> usize {
    1
}

impl Default for ViewSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            sort_column: None,
            sort_direction: default_direction(),
            query: String::new(),
            query_column: None,
            rules: empty_rules(),
            page: 1,
            page_size: None,
            column_order: String::new(),
            pins: String::new(),
            widths: BTreeMap::new(),
            selected: Vec::new(),
        }
    }
}

impl ViewSnapshot {
    /// Serialize to JSON.
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse JSON, rejecting other format versions.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(ConfigError::VersionMismatch {
                stored: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(snapshot)
    }
}

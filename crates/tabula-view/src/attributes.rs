#![forbid(unsafe_code)]

//! Declarative attribute binding.
//!
//! Attributes are both input and reflected output: the host writes them to
//! drive the view, and the coordinator writes normalized values back (a
//! clamped page, a new column order). Self-initiated writes happen inside a
//! suppress window; a write made while suppressed is stored but reports
//! itself as internal so the coordinator does not run its pipeline again.
//! Values are never compared to decide this: re-writing an unchanged value
//! is still an external change.

use std::collections::BTreeMap;

/// Attribute names understood by the coordinator.
pub mod names {
    /// Sorted column (key, header text, or display position).
    pub const SORT_COLUMN: &str = "sort-column";
    /// `asc` or `desc`.
    pub const SORT_DIRECTION: &str = "sort-direction";
    /// Free-text query.
    pub const FILTER_QUERY: &str = "filter-query";
    /// Column the free-text query is scoped to.
    pub const FILTER_COLUMN: &str = "filter-column";
    /// JSON array of `{column, op, value}`.
    pub const FILTER_RULES: &str = "filter-rules";
    /// 1-based page.
    pub const PAGE: &str = "page";
    /// Rows per page.
    pub const PAGE_SIZE: &str = "page-size";
    /// Comma-separated column keys.
    pub const COLUMN_ORDER: &str = "column-order";
    /// `left:k1,k2;right:k3`.
    pub const COLUMN_PINS: &str = "column-pins";
    /// Boolean.
    pub const SELECTABLE: &str = "selectable";
    /// Boolean.
    pub const MULTISELECT: &str = "multiselect";
    /// Boolean.
    pub const VIRTUALIZE: &str = "virtualize";
    /// Row height for virtualization.
    pub const ROW_HEIGHT: &str = "row-height";
    /// Overscan rows for virtualization.
    pub const OVERSCAN: &str = "overscan";
    /// Reading direction, `ltr` or `rtl`.
    pub const DIR: &str = "dir";
}

/// Parse a boolean attribute. Presence with an empty value means `true`.
#[must_use]
pub fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "off" | "no"
    )
}

/// Render a boolean attribute.
#[must_use]
pub fn flag_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Attribute values plus the suppress flag guarding self-writes.
#[derive(Debug, Clone, Default)]
pub struct AttributeStore {
    values: BTreeMap<String, String>,
    suppress: bool,
}

impl AttributeStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Store a value. Returns `true` when the write came from outside and
    /// should be acted on.
    pub fn write(&mut self, name: &str, value: &str) -> bool {
        self.values.insert(name.to_string(), value.to_string());
        !self.suppress
    }

    /// Remove a value. Same return contract as [`write`](Self::write).
    pub fn remove(&mut self, name: &str) -> bool {
        self.values.remove(name);
        !self.suppress
    }

    /// Open a suppress window. Returns whether one was already open.
    pub fn begin_internal(&mut self) -> bool {
        std::mem::replace(&mut self.suppress, true)
    }

    /// Close the suppress window opened by the matching
    /// [`begin_internal`](Self::begin_internal).
    pub fn end_internal(&mut self, was_open: bool) {
        self.suppress = was_open;
    }

    /// Whether writes are currently internal.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.suppress
    }

    /// All values, by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

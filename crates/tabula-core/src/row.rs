#![forbid(unsafe_code)]

//! Row identity and cell text.
//!
//! Rows are owned by whoever supplies the collection. The engine reads cell
//! text and keys all derived state by [`RowId`]; it never rewrites either.

use std::fmt;

/// Stable identity of a row within one collection.
///
/// The owner of the row data picks the ids. Two rows with the same id are
/// treated as the same row across collection swaps, so a selection survives
/// the owner replacing its row vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RowId(u64);

impl RowId {
    /// Wrap a raw id.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for RowId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row#{}", self.0)
    }
}

/// A row: identity plus already-rendered cell text in declared column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    id: RowId,
    cells: Vec<String>,
}

impl Row {
    /// Create a row from an id and its cells.
    #[must_use]
    pub fn new(id: u64, cells: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            id: RowId(id),
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    /// Row identity.
    #[must_use]
    pub fn id(&self) -> RowId {
        self.id
    }

    /// All cells, in declared column order.
    #[must_use]
    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    /// Cell text at a declared column position.
    ///
    /// Short rows read as empty cells rather than failing.
    #[must_use]
    pub fn cell(&self, source: usize) -> &str {
        self.cells.get(source).map(String::as_str).unwrap_or("")
    }

    /// Every cell joined by a single space.
    #[must_use]
    pub fn joined_text(&self) -> String {
        self.cells.join(" ")
    }
}

#![forbid(unsafe_code)]

//! Per-row derived state and the visible slice.

use bitflags::bitflags;

use tabula_core::{Row, RowId};

use crate::column::Column;

bitflags! {
    /// Why a row is or is not materialized, plus its selected state.
    ///
    /// The hidden flags are exclusive in pipeline order: a row hidden by the
    /// filter is never also marked hidden by page, and so on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RowVisibility: u8 {
        /// Failed the query or a rule.
        const HIDDEN_BY_FILTER = 1 << 0;
        /// Passed the filter but is on another page.
        const HIDDEN_BY_PAGE = 1 << 1;
        /// On the active page but outside the virtualization window.
        const HIDDEN_BY_VIRTUAL = 1 << 2;
        /// Selected.
        const SELECTED = 1 << 3;
    }
}

impl RowVisibility {
    /// Every hidden reason.
    pub const HIDDEN: Self = Self::HIDDEN_BY_FILTER
        .union(Self::HIDDEN_BY_PAGE)
        .union(Self::HIDDEN_BY_VIRTUAL);

    /// Whether the row is materialized.
    #[must_use]
    pub fn is_visible(self) -> bool {
        !self.intersects(Self::HIDDEN)
    }
}

/// One materialized row.
#[derive(Debug, Clone, Copy)]
pub struct VisibleRow<'a> {
    /// Position in the collection.
    pub index: usize,
    /// Position among the active (filtered, sorted) rows.
    pub position: usize,
    /// The row.
    pub row: &'a Row,
    /// Whether it is selected.
    pub selected: bool,
}

impl<'a> VisibleRow<'a> {
    /// Row identity.
    #[must_use]
    pub fn id(&self) -> RowId {
        self.row.id()
    }

    /// Cell under a column descriptor.
    #[must_use]
    pub fn cell(&self, column: &Column) -> &'a str {
        self.row.cell(column.source)
    }
}

/// What the rendering surface draws.
#[derive(Debug, Clone)]
pub struct VisibleSlice<'a> {
    /// Columns in display order.
    pub columns: &'a [Column],
    /// Materialized rows in display order.
    pub rows: Vec<VisibleRow<'a>>,
    /// Extent before the first materialized row.
    pub top_spacer: f64,
    /// Extent after the last materialized row.
    pub bottom_spacer: f64,
}

impl<'a> VisibleSlice<'a> {
    /// Materialized rows' cells in display column order.
    #[must_use]
    pub fn cell_grid(&self) -> Vec<Vec<&'a str>> {
        self.rows
            .iter()
            .map(|r| self.columns.iter().map(|c| r.cell(c)).collect())
            .collect()
    }

    /// Whether spacers are needed.
    #[must_use]
    pub fn has_spacers(&self) -> bool {
        self.top_spacer > 0.0 || self.bottom_spacer > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_reasons() {
        assert!(RowVisibility::empty().is_visible());
        assert!(RowVisibility::SELECTED.is_visible());
        assert!(!(RowVisibility::HIDDEN_BY_PAGE | RowVisibility::SELECTED).is_visible());
        assert!(!RowVisibility::HIDDEN_BY_VIRTUAL.is_visible());
    }
}

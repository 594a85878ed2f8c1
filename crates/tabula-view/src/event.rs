#![forbid(unsafe_code)]

//! Change notifications.
//!
//! One event per logical state change, each carrying enough detail that the
//! host never has to query back. The coordinator queues them; the host
//! drains the queue after each call.

use tabula_core::{PointerId, Row, RowId};

use crate::filter::RuleSummary;
use crate::pin::PinLayout;
use crate::sort::SortDirection;

/// Outbound notification.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// Sort column or direction changed.
    SortChanged {
        /// Sorted column key; `None` when unsorted.
        column: Option<String>,
        /// Direction.
        direction: SortDirection,
    },
    /// Query, query column, or rules changed.
    FilterChanged {
        /// Free-text query.
        query: String,
        /// Column the query is scoped to.
        query_column: Option<String>,
        /// Rules that resolved to a column.
        rules: Vec<RuleSummary>,
        /// Rows in the collection.
        total: usize,
        /// Rows passing the filter.
        filtered: usize,
        /// Current page after the change.
        page: usize,
        /// Page count after the change.
        page_count: usize,
    },
    /// The active page window changed.
    PageChanged {
        /// 1-based page.
        page: usize,
        /// Page count.
        page_count: usize,
        /// Effective page size.
        page_size: usize,
        /// Rows in the collection.
        total: usize,
        /// First filtered position on the page.
        start: usize,
        /// One past the last filtered position on the page.
        end: usize,
    },
    /// A requested page was out of range and was clamped.
    PageNormalized {
        /// Page that was asked for.
        requested: usize,
        /// Page now in effect.
        page: usize,
        /// Page count.
        page_count: usize,
    },
    /// Display order changed.
    ColumnOrderChanged {
        /// Position the moved column left; `None` for a declarative order.
        source: Option<usize>,
        /// Position it landed on; `None` for a declarative order.
        target: Option<usize>,
        /// Resulting order as keys.
        order: Vec<String>,
    },
    /// A column width changed.
    ColumnResized {
        /// Column key.
        key: String,
        /// Clamped width.
        width: f64,
    },
    /// Pin spec changed.
    PinsChanged {
        /// Spec in `left:..;right:..` form.
        spec: String,
        /// Offsets after the change.
        layout: PinLayout,
    },
    /// A single row's selected state changed.
    RowSelected {
        /// Position of the row in the collection.
        row_index: usize,
        /// Row identity.
        row_id: RowId,
        /// New state.
        selected: bool,
        /// Collection positions of every selected row, ascending.
        selected_indices: Vec<usize>,
        /// Copies of every selected row, in collection order.
        selected_rows: Vec<Row>,
    },
    /// Several rows changed at once (select-all, leaving multi-select).
    SelectionChanged {
        /// Selected identities after the change.
        selected: Vec<RowId>,
        /// Number selected.
        count: usize,
    },
    /// Selected identities vanished from the collection.
    SelectionPruned {
        /// Identities removed.
        removed: Vec<RowId>,
    },
    /// Selection was cleared.
    BulkCleared {
        /// Rows selected before the clear.
        count: usize,
    },
    /// The materialized window changed.
    VirtualRangeChanged {
        /// First materialized active position.
        start: usize,
        /// One past the last.
        end: usize,
        /// Materialized row count.
        visible: usize,
        /// Active row count.
        total: usize,
        /// Extent before the window.
        top_spacer: f64,
        /// Extent after the window.
        bottom_spacer: f64,
    },
    /// Global pointer listeners were bound.
    PointerCaptured {
        /// Pointer.
        pointer: PointerId,
    },
    /// Global pointer listeners were unbound.
    PointerReleased {
        /// Pointer.
        pointer: PointerId,
    },
}

impl ViewEvent {
    /// Kebab-case event name, as a host would dispatch it.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SortChanged { .. } => "sort-changed",
            Self::FilterChanged { .. } => "filter-changed",
            Self::PageChanged { .. } => "page-changed",
            Self::PageNormalized { .. } => "page-normalized",
            Self::ColumnOrderChanged { .. } => "column-order-changed",
            Self::ColumnResized { .. } => "column-resized",
            Self::PinsChanged { .. } => "pins-changed",
            Self::RowSelected { .. } => "row-selected",
            Self::SelectionChanged { .. } => "selection-changed",
            Self::SelectionPruned { .. } => "selection-pruned",
            Self::BulkCleared { .. } => "bulk-cleared",
            Self::VirtualRangeChanged { .. } => "virtual-range-changed",
            Self::PointerCaptured { .. } => "pointer-captured",
            Self::PointerReleased { .. } => "pointer-released",
        }
    }
}

#![forbid(unsafe_code)]

//! Tabular view engine.
//!
//! Turns a row/column collection plus user-controlled view parameters
//! (sort, filter, pagination, column order/pins/widths, selection,
//! virtualization) into one consistent visible slice, re-derived on every
//! parameter change by [`ViewCoordinator`].
//!
//! # Example
//!
//! ```
//! use tabula_view::{ColumnDecl, ColumnRef, ViewConfig, ViewCoordinator};
//! use tabula_core::Row;
//!
//! let mut view = ViewCoordinator::new(ViewConfig::default());
//! view.attach(
//!     vec![ColumnDecl::new("Name"), ColumnDecl::new("Role")],
//!     vec![
//!         Row::new(1, ["Liam", "Editor"]),
//!         Row::new(2, ["Ava", "Admin"]),
//!     ],
//! );
//! view.request_sort(&ColumnRef::Key("name".into()));
//! let first = view.visible_slice().rows[0].row.cell(0).to_string();
//! assert_eq!(first, "Ava");
//! ```

pub mod attributes;
pub mod column;
pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod pagination;
pub mod pin;
pub mod selection;
pub mod slice;
pub mod snapshot;
pub mod sort;
pub mod transform;
pub mod view;
pub mod virtualization;

pub use attributes::{AttributeStore, names};
pub use column::{Column, ColumnDecl, ColumnRef, ColumnRegistry, PinSide};
pub use config::ViewConfig;
pub use error::{ConfigError, ConfigResult};
pub use event::ViewEvent;
pub use filter::{FilterOp, FilterRule, FilterState, RuleSummary, RuleValue};
pub use pagination::PageWindow;
pub use pin::{PinLayout, PinSpec, PinnedColumn};
pub use selection::SelectionManager;
pub use slice::{RowVisibility, VisibleRow, VisibleSlice};
pub use snapshot::{SNAPSHOT_VERSION, ViewSnapshot};
pub use sort::{SortDirection, SortKey, SortState};
pub use transform::{HeaderAction, HeaderKey, HeaderKeyCode, Reorder, Resized};
pub use view::{Stage, ViewCoordinator};
pub use virtualization::{Viewport, VirtualWindow};

#![forbid(unsafe_code)]

//! Tabula public facade crate.
//!
//! Re-exports the view engine and its core primitives, plus a prelude for
//! hosts wiring a data grid to [`ViewCoordinator`].

// --- Core re-exports -------------------------------------------------------

pub use tabula_core::{
    FrameRequest, FrameThrottle, FrameToken, GestureSession, GestureSlot, NoCapture,
    PointerCapture, PointerId, ReadingDirection, Row, RowId,
};

// --- View re-exports -------------------------------------------------------

pub use tabula_view::{
    Column, ColumnDecl, ColumnRef, ConfigError, ConfigResult, FilterOp, FilterRule, HeaderAction,
    HeaderKey, HeaderKeyCode, PageWindow, PinLayout, PinSide, PinSpec, Reorder, RowVisibility,
    SortDirection, ViewConfig, ViewCoordinator, ViewEvent, ViewSnapshot, VirtualWindow,
    VisibleRow, VisibleSlice, names,
};

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ColumnDecl, ColumnRef, FilterOp, FilterRule, FrameRequest, PointerCapture, PointerId, Row,
        RowId, SortDirection, ViewConfig, ViewCoordinator, ViewEvent,
    };

    pub use crate::{core, view};
}

pub use tabula_core as core;
pub use tabula_view as view;

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn prelude_drives_a_view() {
        let mut view = ViewCoordinator::new(ViewConfig::default().with_page_size(1));
        view.attach(
            vec![ColumnDecl::new("Name")],
            vec![Row::new(1, ["a"]), Row::new(2, ["b"])],
        );
        view.set_page(5);
        assert_eq!(view.page_window().page, 2);
        assert!(
            view.drain_events()
                .iter()
                .any(|e| matches!(e, ViewEvent::PageNormalized { requested: 5, .. }))
        );
    }
}

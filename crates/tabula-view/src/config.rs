#![forbid(unsafe_code)]

//! View configuration.

use tabula_core::ReadingDirection;

use crate::virtualization::{DEFAULT_OVERSCAN, DEFAULT_ROW_HEIGHT};

/// Initial parameters of a [`ViewCoordinator`](crate::ViewCoordinator).
///
/// Every field can later be changed through the matching setter or
/// declarative attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewConfig {
    /// Rows per page. `None` shows every filtered row on one page.
    pub page_size: Option<usize>,

    /// Whether rows can be selected at all.
    pub selectable: bool,

    /// Whether more than one row can be selected.
    pub multi_select: bool,

    /// Materialize only the rows near the viewport.
    pub virtualize: bool,

    /// Uniform row height used by the virtualization window.
    pub row_height: f64,

    /// Rows materialized beyond each viewport edge.
    pub overscan: usize,

    /// Initial viewport extent.
    pub viewport_size: f64,

    /// Lower bound for every column width.
    pub min_column_width: f64,

    /// Width assumed for columns never explicitly sized.
    pub default_column_width: f64,

    /// Width change per Shift+Arrow on a header.
    pub resize_step: f64,

    /// Reading direction.
    pub direction: ReadingDirection,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: None,
            selectable: true,
            multi_select: false,
            virtualize: false,
            row_height: DEFAULT_ROW_HEIGHT,
            overscan: DEFAULT_OVERSCAN,
            viewport_size: 0.0,
            min_column_width: 48.0,
            default_column_width: 120.0,
            resize_step: 10.0,
            direction: ReadingDirection::Ltr,
        }
    }
}

impl ViewConfig {
    /// Set the page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size.max(1));
        self
    }

    /// Enable or disable selection.
    #[must_use]
    pub fn with_selectable(mut self, selectable: bool) -> Self {
        self.selectable = selectable;
        self
    }

    /// Enable or disable multi-select.
    #[must_use]
    pub fn with_multi_select(mut self, multi: bool) -> Self {
        self.multi_select = multi;
        self
    }

    /// Enable virtualization with a viewport extent.
    #[must_use]
    pub fn with_virtualization(mut self, viewport_size: f64) -> Self {
        self.virtualize = true;
        self.viewport_size = viewport_size;
        self
    }

    /// Set the row height.
    #[must_use]
    pub fn with_row_height(mut self, row_height: f64) -> Self {
        self.row_height = row_height;
        self
    }

    /// Set the overscan.
    #[must_use]
    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    /// Set the minimum and default column widths.
    #[must_use]
    pub fn with_column_widths(mut self, min: f64, default: f64) -> Self {
        self.min_column_width = min;
        self.default_column_width = default;
        self
    }

    /// Set the keyboard resize step.
    #[must_use]
    pub fn with_resize_step(mut self, step: f64) -> Self {
        self.resize_step = step;
        self
    }

    /// Set the reading direction.
    #[must_use]
    pub fn with_direction(mut self, direction: ReadingDirection) -> Self {
        self.direction = direction;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ViewConfig::default();
        assert_eq!(c.page_size, None);
        assert!(c.selectable && !c.multi_select && !c.virtualize);
        assert_eq!((c.row_height, c.overscan), (40.0, 2));
    }

    #[test]
    fn builders_chain() {
        let c = ViewConfig::default()
            .with_page_size(0)
            .with_multi_select(true)
            .with_virtualization(240.0)
            .with_direction(ReadingDirection::Rtl);
        assert_eq!(c.page_size, Some(1));
        assert!(c.multi_select && c.virtualize);
        assert_eq!(c.viewport_size, 240.0);
        assert!(c.direction.is_rtl());
    }
}

#![forbid(unsafe_code)]

//! Virtualization window.
//!
//! Only rows inside `[start, end)` of the active (filtered, paged) list are
//! materialized. Two spacers stand in for the rest so the scrollable extent
//! still matches the full active count.
//!
//! ```text
//! start = max(0, floor(offset / h) - overscan)
//! end   = min(count, ceil((offset + viewport) / h) + overscan)
//! top   = start * h
//! bottom = (count - end) * h
//! ```
//!
//! # Failure Modes
//!
//! | Input | Treated as |
//! |-------|------------|
//! | Row height non-finite or `<= 0` | [`DEFAULT_ROW_HEIGHT`] |
//! | Overscan non-finite or `<= 0` | [`DEFAULT_OVERSCAN`] |
//! | Scroll offset / viewport negative or non-finite | `0` |

use std::ops::Range;

/// Row height used when none (or an invalid one) is configured.
pub const DEFAULT_ROW_HEIGHT: f64 = 40.0;

/// Overscan used when none (or an invalid one) is configured.
pub const DEFAULT_OVERSCAN: usize = 2;

/// Validate a row height.
#[must_use]
pub fn sanitize_row_height(height: f64) -> f64 {
    if height.is_finite() && height > 0.0 {
        height
    } else {
        DEFAULT_ROW_HEIGHT
    }
}

/// Validate an overscan given as a number.
#[must_use]
pub fn sanitize_overscan(overscan: f64) -> usize {
    if overscan.is_finite() && overscan > 0.0 {
        overscan.floor().max(1.0) as usize
    } else {
        DEFAULT_OVERSCAN
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Scroll geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Scroll offset from the top of the active rows.
    pub scroll_offset: f64,
    /// Visible extent.
    pub viewport_size: f64,
    /// Uniform row height.
    pub row_height: f64,
    /// Extra rows on each side.
    pub overscan: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scroll_offset: 0.0,
            viewport_size: 0.0,
            row_height: DEFAULT_ROW_HEIGHT,
            overscan: DEFAULT_OVERSCAN,
        }
    }
}

impl Viewport {
    /// Build a viewport, sanitizing every field.
    #[must_use]
    pub fn new(scroll_offset: f64, viewport_size: f64, row_height: f64, overscan: usize) -> Self {
        Self {
            scroll_offset: non_negative(scroll_offset),
            viewport_size: non_negative(viewport_size),
            row_height: sanitize_row_height(row_height),
            overscan,
        }
    }

    /// Replace the scroll offset.
    #[must_use]
    pub fn with_scroll(mut self, offset: f64) -> Self {
        self.scroll_offset = non_negative(offset);
        self
    }

    /// Replace the viewport size.
    #[must_use]
    pub fn with_size(mut self, size: f64) -> Self {
        self.viewport_size = non_negative(size);
        self
    }
}

/// Materialized range plus spacer extents.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VirtualWindow {
    /// First materialized active position.
    pub start: usize,
    /// One past the last materialized position.
    pub end: usize,
    /// Extent standing in for rows before `start`.
    pub top_spacer: f64,
    /// Extent standing in for rows from `end` on.
    pub bottom_spacer: f64,
}

impl VirtualWindow {
    /// Materialized positions.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Number of materialized rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether nothing is materialized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Window over `count` active rows.
#[must_use]
pub fn compute_window(count: usize, viewport: &Viewport) -> VirtualWindow {
    let h = sanitize_row_height(viewport.row_height);
    let offset = non_negative(viewport.scroll_offset);
    let size = non_negative(viewport.viewport_size);

    let first = (offset / h).floor() as usize;
    let last = ((offset + size) / h).ceil() as usize;

    let end = last.saturating_add(viewport.overscan).min(count);
    let start = first.saturating_sub(viewport.overscan).min(end);
    VirtualWindow {
        start,
        end,
        top_spacer: start as f64 * h,
        bottom_spacer: (count - end) as f64 * h,
    }
}

/// Window covering every row, used when virtualization is off.
#[must_use]
pub fn full_window(count: usize) -> VirtualWindow {
    VirtualWindow {
        start: 0,
        end: count,
        top_spacer: 0.0,
        bottom_spacer: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn scrolled_window_with_overscan() {
        let vp = Viewport::new(480.0, 240.0, 40.0, 2);
        let w = compute_window(120, &vp);
        assert_eq!((w.start, w.end), (10, 20));
        assert_eq!(w.top_spacer, 400.0);
        assert_eq!(w.bottom_spacer, 4000.0);
        assert_eq!(w.len(), 10);
    }

    #[test]
    fn window_at_top_and_bottom() {
        let top = compute_window(5, &Viewport::new(0.0, 240.0, 40.0, 2));
        assert_eq!((top.start, top.end), (0, 5));
        assert_eq!(top.bottom_spacer, 0.0);

        let bottom = compute_window(10, &Viewport::new(400.0, 80.0, 40.0, 2));
        assert_eq!(bottom.end, 10);
        assert_eq!(bottom.start, 8);
    }

    #[test]
    fn invalid_inputs_fall_back() {
        assert_eq!(sanitize_row_height(f64::NAN), DEFAULT_ROW_HEIGHT);
        assert_eq!(sanitize_row_height(-3.0), DEFAULT_ROW_HEIGHT);
        assert_eq!(sanitize_overscan(f64::INFINITY), DEFAULT_OVERSCAN);
        assert_eq!(sanitize_overscan(0.0), DEFAULT_OVERSCAN);
        assert_eq!(sanitize_overscan(4.7), 4);
        let vp = Viewport::new(f64::NAN, -10.0, 0.0, 1);
        assert_eq!(vp.scroll_offset, 0.0);
        assert_eq!(vp.viewport_size, 0.0);
        assert_eq!(vp.row_height, DEFAULT_ROW_HEIGHT);
    }

    #[test]
    fn empty_list_is_empty_window() {
        let w = compute_window(0, &Viewport::new(1000.0, 240.0, 40.0, 2));
        assert!(w.is_empty());
        assert_eq!((w.top_spacer, w.bottom_spacer), (0.0, 0.0));
    }

    proptest! {
        #[test]
        fn window_covers_visible_rows(
            count in 1usize..2_000,
            height in 1.0f64..100.0,
            viewport in 0.0f64..2_000.0,
            overscan in 0usize..6,
            frac in 0.0f64..=1.0,
        ) {
            let offset = frac * count as f64 * height;
            let w = compute_window(count, &Viewport::new(offset, viewport, height, overscan));
            prop_assert!(w.start <= w.end && w.end <= count);
            let first_visible = ((offset / height).floor() as usize).min(count);
            let last_visible = (((offset + viewport) / height).ceil() as usize).min(count);
            prop_assert!(w.start <= first_visible);
            prop_assert!(w.end >= last_visible);
            let extent = w.top_spacer + w.len() as f64 * height + w.bottom_spacer;
            let expected = count as f64 * height;
            prop_assert!((extent - expected).abs() < 1e-6 * expected + 1e-6);
        }
    }
}

#![forbid(unsafe_code)]

//! Pagination engine.
//!
//! `page_count = max(1, ceil(filtered / page_size))` and the requested page
//! is clamped into `[1, page_count]`. A clamp is reported back to the
//! caller so the reflected page never silently disagrees with the
//! requested one. Without a page size the whole filtered set is one page.

/// Result of slicing the filtered rows into a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Clamped 1-based page.
    pub page: usize,
    /// Effective page size (at least 1).
    pub page_size: usize,
    /// Number of pages (at least 1).
    pub page_count: usize,
    /// Rows in the collection.
    pub total_rows: usize,
    /// Rows passing the filter.
    pub filtered_rows: usize,
    /// First position (into the filtered+sorted rows) on this page.
    pub start: usize,
    /// One past the last position on this page.
    pub end: usize,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 1,
            page_count: 1,
            total_rows: 0,
            filtered_rows: 0,
            start: 0,
            end: 0,
        }
    }
}

impl PageWindow {
    /// Rows on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether this page holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether a filtered+sorted position falls on this page.
    #[must_use]
    pub fn contains(&self, position: usize) -> bool {
        (self.start..self.end).contains(&position)
    }
}

/// Outcome of [`paginate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginated {
    /// The page window.
    pub window: PageWindow,
    /// Whether the requested page had to be clamped.
    pub normalized: bool,
}

/// Number of pages for `filtered` rows.
#[must_use]
pub fn page_count(filtered: usize, page_size: usize) -> usize {
    filtered.div_ceil(page_size.max(1)).max(1)
}

/// Slice `filtered` rows into pages and clamp `requested`.
#[must_use]
pub fn paginate(
    total: usize,
    filtered: usize,
    requested: usize,
    page_size: Option<usize>,
) -> Paginated {
    let size = match page_size {
        Some(size) => size.max(1),
        None => filtered.max(1),
    };
    let count = page_count(filtered, size);
    let page = requested.clamp(1, count);
    let start = ((page - 1) * size).min(filtered);
    let end = (start + size).min(filtered);
    Paginated {
        window: PageWindow {
            page,
            page_size: size,
            page_count: count,
            total_rows: total,
            filtered_rows: filtered,
            start,
            end,
        },
        normalized: page != requested,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn out_of_range_page_normalizes() {
        let p = paginate(3, 3, 9999, Some(500));
        assert!(p.normalized);
        assert_eq!((p.window.page, p.window.page_count), (1, 1));
        assert_eq!((p.window.start, p.window.end), (0, 3));
    }

    #[test]
    fn zero_page_clamps_up() {
        let p = paginate(10, 10, 0, Some(3));
        assert!(p.normalized);
        assert_eq!(p.window.page, 1);
    }

    #[test]
    fn last_page_is_partial() {
        let p = paginate(12, 10, 4, Some(3));
        assert!(!p.normalized);
        assert_eq!(p.window.page_count, 4);
        assert_eq!((p.window.start, p.window.end), (9, 10));
        assert!(p.window.contains(9));
        assert!(!p.window.contains(8));
        assert_eq!(p.window.len(), 1);
    }

    #[test]
    fn empty_result_still_has_one_page() {
        let p = paginate(5, 0, 2, Some(10));
        assert_eq!((p.window.page, p.window.page_count), (1, 1));
        assert!(p.window.is_empty());
    }

    #[test]
    fn unpaged_is_one_page() {
        let p = paginate(50, 40, 1, None);
        assert_eq!((p.window.page_count, p.window.len()), (1, 40));
        assert!(paginate(50, 40, 3, None).normalized);
    }

    proptest! {
        #[test]
        fn page_always_within_bounds(
            filtered in 0usize..5_000,
            size in 1usize..200,
            requested in 0usize..10_000,
        ) {
            let p = paginate(filtered, filtered, requested, Some(size));
            let count = filtered.div_ceil(size).max(1);
            prop_assert_eq!(p.window.page_count, count);
            prop_assert!(1 <= p.window.page && p.window.page <= count);
            prop_assert!(p.window.end <= filtered);
            prop_assert!(p.window.len() <= size);
            prop_assert_eq!(p.normalized, p.window.page != requested);
        }
    }
}

#![forbid(unsafe_code)]

//! Sort engine.
//!
//! Cell text is normalized once per row into a [`SortKey`], then row
//! indices are stable-sorted on it. Equal keys keep their pre-sort order in
//! both directions: descending reverses the key comparison only, never the
//! tie-break.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use tabula_core::Row;
use tabula_core::text::{decimal_literal, natural_cmp};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortDirection {
    /// Parse `asc`/`desc` (also `ascending`/`descending`).
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Asc),
            "desc" | "descending" => Some(Self::Desc),
            _ => None,
        }
    }

    /// Attribute form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// The other direction.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Active sort, tracked by column key so it follows the column through
/// reorders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortState {
    /// Key of the sorted column.
    pub column: Option<String>,
    /// Direction.
    pub direction: SortDirection,
}

impl SortState {
    /// Header activation: the sorted column flips, any other column starts
    /// ascending.
    pub fn request(&mut self, key: &str) -> SortDirection {
        self.direction = match &self.column {
            Some(current) if current == key => self.direction.toggled(),
            _ => SortDirection::Asc,
        };
        self.column = Some(key.to_string());
        self.direction
    }

    /// Remove the sort.
    pub fn clear(&mut self) {
        self.column = None;
        self.direction = SortDirection::Asc;
    }
}

/// Normalized cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    /// Integer or decimal literal.
    Number(f64),
    /// Date-like text, as epoch milliseconds.
    Date(i64),
    /// Anything else; compared with natural collation.
    Text(String),
}

impl SortKey {
    /// Normalize cell text.
    #[must_use]
    pub fn from_cell(text: &str) -> Self {
        if let Some(n) = decimal_literal(text) {
            return Self::Number(n);
        }
        if let Some(ms) = parse_date(text) {
            return Self::Date(ms);
        }
        Self::Text(text.trim().to_string())
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Number(_) => 0,
            Self::Date(_) => 1,
            Self::Text(_) => 2,
        }
    }

    /// Total order: numbers, then dates, then text.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => natural_cmp(a, b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
];

/// Resolve date-like text to epoch milliseconds (UTC when no offset).
#[must_use]
pub fn parse_date(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.len() < 6 || !text.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.timestamp_millis());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(text, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().timestamp_millis())
    })
}

/// Stable-sort `indices` (positions into `rows`) by the cell at `source`.
pub fn sort_indices(rows: &[Row], indices: &mut [usize], source: usize, direction: SortDirection) {
    let mut keyed: Vec<(SortKey, usize)> = indices
        .iter()
        .map(|&i| (SortKey::from_cell(rows[i].cell(source)), i))
        .collect();
    keyed.sort_by(|(a, ai), (b, bi)| {
        let ord = a.compare(b);
        let ord = match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        };
        ord.then_with(|| ai.cmp(bi))
    });
    for (slot, (_, i)) in indices.iter_mut().zip(keyed) {
        *slot = i;
    }
}

#![forbid(unsafe_code)]

//! Pinned columns.
//!
//! A pin spec is written `left:k1,k2;right:k3`. Pinning does not move a
//! column; it assigns it a sticky offset from its edge. Left-pinned columns
//! accumulate widths left-to-right in display order, right-pinned columns
//! right-to-left, and the innermost column of each group is the *edge*
//! that carries the visual separation cue.

use std::fmt;
use std::str::FromStr;

use tabula_core::text::column_key;

use crate::column::{Column, PinSide};
use crate::error::{ConfigError, ConfigResult};

/// Declarative pin lists, by column key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PinSpec {
    left: Vec<String>,
    right: Vec<String>,
}

impl PinSpec {
    /// Build from key lists. A key listed on both sides stays left.
    #[must_use]
    pub fn new(
        left: impl IntoIterator<Item = impl AsRef<str>>,
        right: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Self {
        let mut spec = Self::default();
        for key in left {
            spec.push(PinSide::Left, key.as_ref());
        }
        for key in right {
            spec.push(PinSide::Right, key.as_ref());
        }
        spec
    }

    fn push(&mut self, side: PinSide, raw: &str) {
        let raw = raw.trim();
        if raw.is_empty() {
            return;
        }
        let key = column_key(raw);
        if self.side_of(&key).is_some() {
            return;
        }
        match side {
            PinSide::Left => self.left.push(key),
            PinSide::Right => self.right.push(key),
        }
    }

    /// Parse, skipping segments that cannot be understood.
    #[must_use]
    pub fn parse_lenient(text: &str) -> Self {
        let mut spec = Self::default();
        for segment in text.split(';') {
            if let Ok(Some((side, keys))) = parse_segment(segment) {
                for key in keys.split(',') {
                    spec.push(side, key);
                }
            }
        }
        spec
    }

    /// Keys pinned left, as declared.
    #[must_use]
    pub fn left(&self) -> &[String] {
        &self.left
    }

    /// Keys pinned right, as declared.
    #[must_use]
    pub fn right(&self) -> &[String] {
        &self.right
    }

    /// Whether nothing is pinned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }

    /// Pin side for a key.
    #[must_use]
    pub fn side_of(&self, key: &str) -> Option<PinSide> {
        if self.left.iter().any(|k| k == key) {
            Some(PinSide::Left)
        } else if self.right.iter().any(|k| k == key) {
            Some(PinSide::Right)
        } else {
            None
        }
    }
}

fn parse_segment(segment: &str) -> ConfigResult<Option<(PinSide, &str)>> {
    let segment = segment.trim();
    if segment.is_empty() {
        return Ok(None);
    }
    let (side, keys) = segment
        .split_once(':')
        .ok_or_else(|| ConfigError::InvalidPinSpec(segment.to_string()))?;
    let side = match side.trim().to_ascii_lowercase().as_str() {
        "left" | "start" => PinSide::Left,
        "right" | "end" => PinSide::Right,
        _ => return Err(ConfigError::InvalidPinSpec(segment.to_string())),
    };
    Ok(Some((side, keys)))
}

impl FromStr for PinSpec {
    type Err = ConfigError;

    fn from_str(text: &str) -> ConfigResult<Self> {
        let mut spec = Self::default();
        for segment in text.split(';') {
            if let Some((side, keys)) = parse_segment(segment)? {
                for key in keys.split(',') {
                    spec.push(side, key);
                }
            }
        }
        Ok(spec)
    }
}

impl fmt::Display for PinSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (side, keys) in [(PinSide::Left, &self.left), (PinSide::Right, &self.right)] {
            if keys.is_empty() {
                continue;
            }
            if !first {
                f.write_str(";")?;
            }
            first = false;
            write!(f, "{}:{}", side.as_str(), keys.join(","))?;
        }
        Ok(())
    }
}

/// Positioning contract for one pinned column.
#[derive(Debug, Clone, PartialEq)]
pub struct PinnedColumn {
    /// Display position.
    pub index: usize,
    /// Column key.
    pub key: String,
    /// Edge it sticks to.
    pub side: PinSide,
    /// Distance from that edge.
    pub offset: f64,
    /// Innermost column of its group.
    pub edge: bool,
}

/// Offsets for every pinned column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PinLayout {
    /// Left group, in display order.
    pub left: Vec<PinnedColumn>,
    /// Right group, outermost (rightmost) first.
    pub right: Vec<PinnedColumn>,
}

impl PinLayout {
    /// Compute offsets from resolved columns.
    ///
    /// Columns without an explicit width count as `default_width`.
    #[must_use]
    pub fn compute(columns: &[Column], default_width: f64) -> Self {
        let width = |c: &Column| c.width.unwrap_or(default_width);

        let mut left = Vec::new();
        let mut offset = 0.0;
        for column in columns.iter().filter(|c| c.pin_side == Some(PinSide::Left)) {
            left.push(PinnedColumn {
                index: column.index,
                key: column.key.clone(),
                side: PinSide::Left,
                offset,
                edge: false,
            });
            offset += width(column);
        }

        let mut right = Vec::new();
        let mut offset = 0.0;
        for column in columns
            .iter()
            .rev()
            .filter(|c| c.pin_side == Some(PinSide::Right))
        {
            right.push(PinnedColumn {
                index: column.index,
                key: column.key.clone(),
                side: PinSide::Right,
                offset,
                edge: false,
            });
            offset += width(column);
        }

        if let Some(last) = left.last_mut() {
            last.edge = true;
        }
        if let Some(last) = right.last_mut() {
            last.edge = true;
        }
        Self { left, right }
    }

    /// Pin entry for a display position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&PinnedColumn> {
        self.left
            .iter()
            .chain(self.right.iter())
            .find(|p| p.index == index)
    }

    /// Whether nothing is pinned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }
}

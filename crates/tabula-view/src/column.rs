#![forbid(unsafe_code)]

//! Column registry.
//!
//! Columns are declared once, in header order, and keep that declared
//! position as their *source*: cells are always read through it. The
//! registry layers a display order on top, addressed by column key so that
//! order strings survive columns being added or removed later.
//!
//! # Invariants
//!
//! 1. Keys are unique within a registry.
//! 2. The display order is a permutation of the declared columns.
//! 3. `Column::index` is the current 0-based, contiguous display position.

use std::collections::{HashMap, HashSet};

use tabula_core::text::{column_key, unique_key};

use crate::pin::PinSpec;

/// Which edge a pinned column sticks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinSide {
    /// Leading edge.
    Left,
    /// Trailing edge.
    Right,
}

impl PinSide {
    /// Pin spec form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// A column as declared by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDecl {
    /// Header display text.
    pub label: String,
    /// Explicit key attribute; the label is slugged when absent.
    pub key: Option<String>,
}

impl ColumnDecl {
    /// Declare a column by its header text.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            key: None,
        }
    }

    /// Set an explicit key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// Resolved column descriptor handed to the rendering surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Current display position.
    pub index: usize,
    /// Stable key.
    pub key: String,
    /// Header text.
    pub label: String,
    /// Declared position; index into [`Row::cells`](tabula_core::Row::cells).
    pub source: usize,
    /// Pin side, if pinned.
    pub pin_side: Option<PinSide>,
    /// Explicit width, if one has been set.
    pub width: Option<f64>,
}

/// A reference to a column from declarative input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    /// Display position.
    Index(usize),
    /// Key, header text, or anything that slugs to a key.
    Key(String),
}

impl ColumnRef {
    /// Parse attribute text: an unsigned integer is a position, anything
    /// else a key. A position past the last column is looked up as a key,
    /// so numeric keys such as `2024` stay addressable.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        match trimmed.parse::<usize>() {
            Ok(index) => Self::Index(index),
            Err(_) => Self::Key(trimmed.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
struct Declared {
    key: String,
    label: String,
}

/// Declared columns plus the current display order.
#[derive(Debug, Clone, Default)]
pub struct ColumnRegistry {
    declared: Vec<Declared>,
    /// `order[display] = source`.
    order: Vec<usize>,
}

impl ColumnRegistry {
    /// Derive keys for `decls` and start in declared order.
    #[must_use]
    pub fn from_decls(decls: &[ColumnDecl]) -> Self {
        let mut taken = HashSet::with_capacity(decls.len());
        let declared: Vec<Declared> = decls
            .iter()
            .map(|decl| {
                let base = column_key(decl.key.as_deref().unwrap_or(&decl.label));
                let key = unique_key(base, &taken);
                taken.insert(key.clone());
                Declared {
                    key,
                    label: decl.label.clone(),
                }
            })
            .collect();
        let order = (0..declared.len()).collect();
        Self { declared, order }
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.declared.len()
    }

    /// Whether no columns are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    /// Keys in display order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.order
            .iter()
            .map(|&source| self.declared[source].key.clone())
            .collect()
    }

    /// Persistable order string: comma-joined keys in display order.
    #[must_use]
    pub fn order_string(&self) -> String {
        self.keys().join(",")
    }

    /// Key at a display position.
    #[must_use]
    pub fn key_at(&self, index: usize) -> Option<&str> {
        let source = *self.order.get(index)?;
        Some(self.declared[source].key.as_str())
    }

    /// Declared position of the column at a display position.
    #[must_use]
    pub fn source_at(&self, index: usize) -> Option<usize> {
        self.order.get(index).copied()
    }

    /// Display position of a key.
    #[must_use]
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.order
            .iter()
            .position(|&source| self.declared[source].key == key)
    }

    /// Resolve a reference to a display position.
    #[must_use]
    pub fn resolve(&self, reference: &ColumnRef) -> Option<usize> {
        match reference {
            ColumnRef::Index(index) if *index < self.len() => Some(*index),
            ColumnRef::Index(index) => self.resolve_text(&index.to_string()),
            ColumnRef::Key(text) => self.resolve_text(text),
        }
    }

    fn resolve_text(&self, text: &str) -> Option<usize> {
        self.index_of(text).or_else(|| {
            let slug = column_key(text);
            self.index_of(&slug).or_else(|| {
                self.order.iter().position(|&source| {
                    self.declared[source].label.trim().eq_ignore_ascii_case(text.trim())
                })
            })
        })
    }

    /// Rewrite a positional reference as the key currently at that
    /// position, so it follows its column through later reorders.
    /// Unresolved references come back unchanged.
    #[must_use]
    pub fn anchor(&self, reference: ColumnRef) -> ColumnRef {
        match reference {
            ColumnRef::Index(_) => self
                .resolve_key(&reference)
                .map_or(reference, ColumnRef::Key),
            key @ ColumnRef::Key(_) => key,
        }
    }

    /// Resolve a reference straight to its key.
    #[must_use]
    pub fn resolve_key(&self, reference: &ColumnRef) -> Option<String> {
        self.resolve(reference)
            .and_then(|index| self.key_at(index))
            .map(str::to_string)
    }

    /// Apply a requested key order.
    ///
    /// Unknown and repeated keys are skipped; columns the request does not
    /// mention keep their relative declared order after the mentioned ones.
    /// Returns whether the display order changed.
    pub fn apply_order(&mut self, keys: &[String]) -> bool {
        let mut seen = vec![false; self.declared.len()];
        let mut order = Vec::with_capacity(self.declared.len());
        for key in keys {
            let found = self
                .declared
                .iter()
                .position(|d| d.key == *key || d.key == column_key(key));
            if let Some(source) = found
                && !seen[source]
            {
                seen[source] = true;
                order.push(source);
            }
        }
        order.extend((0..self.declared.len()).filter(|&source| !seen[source]));
        let changed = order != self.order;
        self.order = order;
        changed
    }

    /// Move the column at `source` to `target` (remove, then insert).
    ///
    /// Returns `false` when either position is out of range or they match.
    pub fn move_column(&mut self, source: usize, target: usize) -> bool {
        let len = self.order.len();
        if source >= len || target >= len || source == target {
            return false;
        }
        let moved = self.order.remove(source);
        self.order.insert(target, moved);
        true
    }

    /// Resolved descriptors in display order.
    #[must_use]
    pub fn columns(&self, pins: &PinSpec, widths: &HashMap<String, f64>) -> Vec<Column> {
        self.order
            .iter()
            .enumerate()
            .map(|(index, &source)| {
                let declared = &self.declared[source];
                Column {
                    index,
                    key: declared.key.clone(),
                    label: declared.label.clone(),
                    source,
                    pin_side: pins.side_of(&declared.key),
                    width: widths.get(&declared.key).copied(),
                }
            })
            .collect()
    }
}

/// Split an order string into keys.
#[must_use]
pub fn parse_order(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

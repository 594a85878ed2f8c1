#![forbid(unsafe_code)]

//! Selection manager.
//!
//! Selection is a set of row identities. It is independent of filtering and
//! paging: a row hidden by either stays selected. The only autonomous
//! shrink is [`SelectionManager::prune`], which drops identities no longer
//! present in the collection.
//!
//! # Invariants
//!
//! 1. In single-select mode the set holds at most one identity.
//! 2. Every mutation returns enough information for one change event.

use std::collections::{BTreeSet, HashSet};

use tabula_core::RowId;

/// Outcome of a toggle or select intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    /// The row was added.
    Selected,
    /// The row was removed.
    Deselected,
    /// Nothing changed (row already in the requested state, or selection
    /// disabled).
    Unchanged,
}

/// Selected row identities plus the mode flags that govern them.
#[derive(Debug, Clone)]
pub struct SelectionManager {
    selected: BTreeSet<RowId>,
    multi: bool,
    selectable: bool,
    last: Option<RowId>,
}

impl Default for SelectionManager {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl SelectionManager {
    /// Create an empty selection.
    #[must_use]
    pub fn new(selectable: bool, multi: bool) -> Self {
        Self {
            selected: BTreeSet::new(),
            multi,
            selectable,
            last: None,
        }
    }

    /// Whether selection intents are honored.
    #[must_use]
    pub fn selectable(&self) -> bool {
        self.selectable
    }

    /// Whether several rows may be selected at once.
    #[must_use]
    pub fn multi(&self) -> bool {
        self.multi
    }

    /// Enable or disable selection. Disabling keeps the set; it only hides
    /// the bulk affordance and ignores new intents.
    pub fn set_selectable(&mut self, selectable: bool) {
        self.selectable = selectable;
    }

    /// Switch mode. Leaving multi-select keeps only the most recently
    /// selected row. Returns the identities dropped.
    pub fn set_multi(&mut self, multi: bool) -> Vec<RowId> {
        self.multi = multi;
        if multi || self.selected.len() <= 1 {
            return Vec::new();
        }
        let keep = self
            .last
            .filter(|id| self.selected.contains(id))
            .or_else(|| self.selected.iter().next_back().copied());
        let dropped: Vec<RowId> = self
            .selected
            .iter()
            .copied()
            .filter(|id| Some(*id) != keep)
            .collect();
        self.selected.retain(|id| Some(*id) == keep);
        dropped
    }

    /// Click/keyboard intent: flip `id`.
    ///
    /// In single mode selecting replaces the set; toggling the selected row
    /// clears it.
    pub fn toggle(&mut self, id: RowId) -> SelectionChange {
        if self.selected.contains(&id) {
            self.deselect(id)
        } else {
            self.select(id)
        }
    }

    /// Add `id` (replacing the set in single mode).
    pub fn select(&mut self, id: RowId) -> SelectionChange {
        if !self.selectable || self.selected.contains(&id) {
            return SelectionChange::Unchanged;
        }
        if !self.multi {
            self.selected.clear();
        }
        self.selected.insert(id);
        self.last = Some(id);
        SelectionChange::Selected
    }

    /// Remove `id`.
    pub fn deselect(&mut self, id: RowId) -> SelectionChange {
        if !self.selectable || !self.selected.remove(&id) {
            return SelectionChange::Unchanged;
        }
        if self.last == Some(id) {
            self.last = None;
        }
        SelectionChange::Deselected
    }

    /// Select every id in `ids` (multi mode only). Returns how many were
    /// added.
    pub fn select_all(&mut self, ids: impl IntoIterator<Item = RowId>) -> usize {
        if !self.selectable || !self.multi {
            return 0;
        }
        let mut added = 0;
        for id in ids {
            if self.selected.insert(id) {
                self.last = Some(id);
                added += 1;
            }
        }
        added
    }

    /// Empty the set unconditionally. Returns the pre-clear count.
    pub fn clear(&mut self) -> usize {
        let count = self.selected.len();
        self.selected.clear();
        self.last = None;
        count
    }

    /// Drop identities not in `present`. Returns the dropped identities.
    pub fn prune(&mut self, present: &HashSet<RowId>) -> Vec<RowId> {
        let dropped: Vec<RowId> = self
            .selected
            .iter()
            .copied()
            .filter(|id| !present.contains(id))
            .collect();
        for id in &dropped {
            self.selected.remove(id);
        }
        if self.last.is_some_and(|id| !self.selected.contains(&id)) {
            self.last = None;
        }
        dropped
    }

    /// Whether the bulk-action affordance should show.
    #[must_use]
    pub fn bulk_visible(&self) -> bool {
        self.selectable && !self.selected.is_empty()
    }

    /// Whether `id` is selected.
    #[must_use]
    pub fn is_selected(&self, id: RowId) -> bool {
        self.selected.contains(&id)
    }

    /// Number of selected rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected identities in id order.
    pub fn iter(&self) -> impl Iterator<Item = RowId> + '_ {
        self.selected.iter().copied()
    }
}

#![forbid(unsafe_code)]

//! View coordinator.
//!
//! Owns the row/column collection and every user-controlled view parameter,
//! and re-derives the visible slice through a fixed pipeline whenever one of
//! them changes:
//!
//! ```text
//! Columns -> Filter -> Sort -> Pagination -> Selection -> Pins -> Virtualization
//! ```
//!
//! Each setter names the first [`Stage`] its change invalidates and the
//! pipeline reruns from there, so a scroll only recomputes the window while
//! a new query reruns from the filter on. Everything runs synchronously;
//! the only deferred work is scroll, coalesced through a [`FrameThrottle`].
//!
//! # Invariants
//!
//! 1. Pagination sees post-filter counts, virtualization sees the active
//!    page, pin offsets see post-reorder positions.
//! 2. Values the coordinator reflects into its attributes (clamped page,
//!    new order, toggled sort) never trigger a second pipeline pass.
//! 3. Sort column and widths are keyed by column key; positional output is
//!    re-derived after every reorder.
//! 4. Pointer capture taken by a gesture is released on gesture end,
//!    cancel, [`detach`](ViewCoordinator::detach), or drop.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Malformed attribute value | `warn!`, treated as unset |
//! | Unresolvable column reference | Ignored |
//! | Page out of range | Clamped, `PageNormalized` emitted |
//! | Gesture event without a session | No-op |
//! | Scroll while detached | No-op |

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use tracing::{debug, debug_span, warn};

use tabula_core::{
    FrameRequest, FrameThrottle, FrameToken, NoCapture, PointerCapture, PointerId,
    ReadingDirection, Row, RowId,
};

use crate::attributes::{AttributeStore, flag_str, names, parse_flag};
use crate::column::{Column, ColumnDecl, ColumnRef, ColumnRegistry, parse_order};
use crate::config::ViewConfig;
use crate::event::ViewEvent;
use crate::filter::{CompiledFilter, CompiledRule, FilterRule, FilterState};
use crate::pagination::{PageWindow, paginate};
use crate::pin::{PinLayout, PinSpec};
use crate::selection::{SelectionChange, SelectionManager};
use crate::slice::{RowVisibility, VisibleRow, VisibleSlice};
use crate::snapshot::{SNAPSHOT_VERSION, ViewSnapshot};
use crate::sort::{SortDirection, SortState, sort_indices};
use crate::transform::{ColumnTransformManager, HeaderAction, HeaderKey, Reorder};
use crate::virtualization::{
    Viewport, VirtualWindow, compute_window, full_window, sanitize_overscan, sanitize_row_height,
};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Column order. Everything downstream reruns.
    Columns,
    /// Filter verdicts.
    Filter,
    /// Sorted order of the filtered rows.
    Sort,
    /// Page window.
    Pagination,
    /// Selection pruning.
    Selection,
    /// Column descriptors (pins, widths) and pin offsets.
    Pins,
    /// Virtualization window.
    Virtualization,
}

impl Stage {
    /// Stage name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Columns => "columns",
            Self::Filter => "filter",
            Self::Sort => "sort",
            Self::Pagination => "pagination",
            Self::Selection => "selection",
            Self::Pins => "pins",
            Self::Virtualization => "virtualization",
        }
    }
}

/// Forwards capture calls to the host and records them as events.
struct Recording<'a> {
    inner: &'a mut dyn PointerCapture,
    events: &'a mut Vec<ViewEvent>,
}

impl PointerCapture for Recording<'_> {
    fn capture(&mut self, pointer: PointerId) {
        self.inner.capture(pointer);
        self.events.push(ViewEvent::PointerCaptured { pointer });
    }

    fn release(&mut self, pointer: PointerId) {
        self.inner.release(pointer);
        self.events.push(ViewEvent::PointerReleased { pointer });
    }
}

/// The tabular view engine.
pub struct ViewCoordinator {
    config: ViewConfig,
    attached: bool,

    // Collection.
    registry: ColumnRegistry,
    rows: Vec<Row>,
    row_index: HashMap<RowId, usize>,

    // User-controlled state.
    sort: SortState,
    filter: FilterState,
    page: usize,
    page_size: Option<usize>,
    selection: SelectionManager,
    transforms: ColumnTransformManager,
    virtualize: bool,
    viewport: Viewport,

    // Host plumbing.
    throttle: FrameThrottle<f64>,
    attrs: AttributeStore,
    capture: Box<dyn PointerCapture>,
    events: Vec<ViewEvent>,

    // Derived.
    columns: Vec<Column>,
    compiled: CompiledFilter,
    filtered: Vec<usize>,
    ordered: Vec<usize>,
    page_window: PageWindow,
    pin_layout: PinLayout,
    window: VirtualWindow,
    visibility: Vec<RowVisibility>,
    last_page: Option<PageWindow>,
    last_window: Option<VirtualWindow>,

    // Reentrancy.
    in_pipeline: bool,
    deferred: Option<Stage>,
    passes: u64,
}

impl fmt::Debug for ViewCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewCoordinator")
            .field("attached", &self.attached)
            .field("rows", &self.rows.len())
            .field("columns", &self.registry.order_string())
            .field("sort", &self.sort)
            .field("filter", &self.filter)
            .field("page_window", &self.page_window)
            .field("window", &self.window)
            .field("selected", &self.selection.len())
            .finish_non_exhaustive()
    }
}

impl Default for ViewCoordinator {
    fn default() -> Self {
        Self::new(ViewConfig::default())
    }
}

impl ViewCoordinator {
    /// Create a detached coordinator.
    #[must_use]
    pub fn new(config: ViewConfig) -> Self {
        let mut transforms = ColumnTransformManager::new(
            config.min_column_width,
            config.default_column_width,
            config.resize_step,
        );
        transforms.set_direction(config.direction);
        let viewport = Viewport::new(
            0.0,
            config.viewport_size,
            config.row_height,
            sanitize_overscan(config.overscan as f64),
        );
        let mut view = Self {
            attached: false,
            registry: ColumnRegistry::default(),
            rows: Vec::new(),
            row_index: HashMap::new(),
            sort: SortState::default(),
            filter: FilterState::default(),
            page: 1,
            page_size: config.page_size.map(|size| size.max(1)),
            selection: SelectionManager::new(config.selectable, config.multi_select),
            transforms,
            virtualize: config.virtualize,
            viewport,
            throttle: FrameThrottle::new(),
            attrs: AttributeStore::new(),
            capture: Box::new(NoCapture),
            events: Vec::new(),
            columns: Vec::new(),
            compiled: CompiledFilter::default(),
            filtered: Vec::new(),
            ordered: Vec::new(),
            page_window: PageWindow::default(),
            pin_layout: PinLayout::default(),
            window: VirtualWindow::default(),
            visibility: Vec::new(),
            last_page: None,
            last_window: None,
            in_pipeline: false,
            deferred: None,
            passes: 0,
            config,
        };
        view.reflect_config();
        view
    }

    /// Use `capture` to bind the host's global pointer listeners.
    #[must_use]
    pub fn with_pointer_capture(mut self, capture: Box<dyn PointerCapture>) -> Self {
        self.set_pointer_capture(capture);
        self
    }

    /// Replace the pointer capture. In-flight gestures are released through
    /// the old one first.
    pub fn set_pointer_capture(&mut self, capture: Box<dyn PointerCapture>) {
        self.cancel_gestures();
        self.capture = capture;
    }

    // -----------------------------------------------------------------------
    // Collection lifecycle
    // -----------------------------------------------------------------------

    /// Attach a column/row collection and derive the first slice.
    ///
    /// Attributes set before attaching (order, sort column, pins) are
    /// resolved against the new columns here.
    pub fn attach(&mut self, columns: Vec<ColumnDecl>, rows: Vec<Row>) {
        debug!(columns = columns.len(), rows = rows.len(), "attach");
        self.attached = true;
        self.last_page = None;
        self.last_window = None;
        self.load_columns(&columns);
        self.load_rows(rows);
        self.recompute(Stage::Columns);
    }

    /// Whether a collection is attached.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// The row collection changed.
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        self.load_rows(rows);
        self.recompute(Stage::Filter);
    }

    /// The declared columns changed. The current order, widths and sort
    /// carry over by key.
    pub fn set_columns(&mut self, columns: Vec<ColumnDecl>) {
        self.load_columns(&columns);
        self.recompute(Stage::Columns);
    }

    /// Tear down the view: release gestures, drop pending frame work and
    /// the collection. Returns the frame token the host should cancel.
    ///
    /// Declarative attributes survive, so a later [`attach`](Self::attach)
    /// restores the same view parameters.
    pub fn detach(&mut self) -> Option<FrameToken> {
        self.cancel_gestures();
        let token = self.throttle.cancel();
        debug!(pending_frame = token.is_some(), "detach");
        self.attached = false;
        self.rows.clear();
        self.row_index.clear();
        self.selection.clear();
        self.columns.clear();
        self.compiled = CompiledFilter::default();
        self.filtered.clear();
        self.ordered.clear();
        self.page_window = PageWindow::default();
        self.pin_layout = PinLayout::default();
        self.window = VirtualWindow::default();
        self.visibility.clear();
        self.last_page = None;
        self.last_window = None;
        token
    }

    fn load_rows(&mut self, rows: Vec<Row>) {
        self.row_index.clear();
        for (index, row) in rows.iter().enumerate() {
            self.row_index.entry(row.id()).or_insert(index);
        }
        self.rows = rows;
    }

    fn load_columns(&mut self, decls: &[ColumnDecl]) {
        let order = if self.registry.is_empty() {
            self.attrs.get(names::COLUMN_ORDER).map(parse_order).unwrap_or_default()
        } else {
            self.registry.keys()
        };
        self.registry = ColumnRegistry::from_decls(decls);
        self.registry.apply_order(&order);
        self.transforms.retain_keys(&self.registry);

        let before = self.sort.column.clone();
        let wanted = self
            .sort
            .column
            .clone()
            .map(ColumnRef::Key)
            .or_else(|| {
                self.attrs
                    .get(names::SORT_COLUMN)
                    .filter(|v| !v.trim().is_empty())
                    .map(ColumnRef::parse)
            });
        self.sort.column = wanted.and_then(|r| self.registry.resolve_key(&r));
        if self.sort.column != before {
            self.reflect_sort();
            self.events.push(ViewEvent::SortChanged {
                column: self.sort.column.clone(),
                direction: self.sort.direction,
            });
        }

        if self.filter.anchor(&self.registry) {
            self.reflect_filter();
        }
    }

    // -----------------------------------------------------------------------
    // Pipeline
    // -----------------------------------------------------------------------

    fn recompute(&mut self, from: Stage) {
        if !self.attached {
            return;
        }
        if self.in_pipeline {
            self.deferred = Some(self.deferred.map_or(from, |d| d.min(from)));
            return;
        }
        self.in_pipeline = true;
        let mut next = Some(from);
        while let Some(stage) = next {
            self.run_pipeline(stage);
            next = self.deferred.take();
        }
        self.in_pipeline = false;
    }

    fn run_pipeline(&mut self, from: Stage) {
        let _span = debug_span!("view_recompute", from = from.as_str(), rows = self.rows.len())
            .entered();
        self.passes += 1;
        if from <= Stage::Filter {
            self.run_filter();
        }
        if from <= Stage::Sort {
            self.run_sort();
        }
        if from <= Stage::Pagination {
            self.run_pagination();
        }
        if from <= Stage::Selection {
            self.run_selection();
        }
        if from <= Stage::Pins {
            self.columns = self
                .registry
                .columns(self.transforms.pins(), self.transforms.widths());
            self.pin_layout = PinLayout::compute(&self.columns, self.transforms.default_width());
        }
        self.run_virtualization();
        self.refresh_visibility();
    }

    fn run_filter(&mut self) {
        self.compiled = self.filter.compile(&self.registry);
        self.filtered = if self.compiled.is_pass_all() {
            (0..self.rows.len()).collect()
        } else {
            let compiled = &self.compiled;
            self.rows
                .iter()
                .enumerate()
                .filter(|(_, row)| compiled.matches(row))
                .map(|(index, _)| index)
                .collect()
        };
    }

    fn run_sort(&mut self) {
        let mut ordered = self.filtered.clone();
        let source = self
            .sort
            .column
            .as_deref()
            .and_then(|key| self.registry.index_of(key))
            .and_then(|index| self.registry.source_at(index));
        if let Some(source) = source {
            sort_indices(&self.rows, &mut ordered, source, self.sort.direction);
        }
        self.ordered = ordered;
    }

    fn run_pagination(&mut self) {
        let requested = self.page;
        let result = paginate(self.rows.len(), self.ordered.len(), requested, self.page_size);
        let window = result.window;
        self.page_window = window;
        if result.normalized {
            debug!(
                requested,
                page = window.page,
                page_count = window.page_count,
                "page normalized"
            );
            self.page = window.page;
            self.events.push(ViewEvent::PageNormalized {
                requested,
                page: window.page,
                page_count: window.page_count,
            });
            let page = self.page.to_string();
            self.reflect(names::PAGE, &page);
        }
        if self.last_page != Some(window) {
            self.last_page = Some(window);
            self.events.push(ViewEvent::PageChanged {
                page: window.page,
                page_count: window.page_count,
                page_size: window.page_size,
                total: window.total_rows,
                start: window.start,
                end: window.end,
            });
        }
    }

    fn run_selection(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        let present: HashSet<RowId> = self.rows.iter().map(Row::id).collect();
        let removed = self.selection.prune(&present);
        if !removed.is_empty() {
            debug!(count = removed.len(), "pruned selection");
            self.events.push(ViewEvent::SelectionPruned { removed });
        }
    }

    fn run_virtualization(&mut self) {
        let count = self.page_window.len();
        self.window = if self.virtualize {
            compute_window(count, &self.viewport)
        } else {
            full_window(count)
        };
        if self.last_window != Some(self.window) {
            self.last_window = Some(self.window);
            self.events.push(ViewEvent::VirtualRangeChanged {
                start: self.window.start,
                end: self.window.end,
                visible: self.window.len(),
                total: count,
                top_spacer: self.window.top_spacer,
                bottom_spacer: self.window.bottom_spacer,
            });
        }
    }

    fn refresh_visibility(&mut self) {
        let mut flags = vec![RowVisibility::HIDDEN_BY_FILTER; self.rows.len()];
        for (position, &index) in self.ordered.iter().enumerate() {
            flags[index] = if !self.page_window.contains(position) {
                RowVisibility::HIDDEN_BY_PAGE
            } else if !self
                .window
                .range()
                .contains(&(position - self.page_window.start))
            {
                RowVisibility::HIDDEN_BY_VIRTUAL
            } else {
                RowVisibility::empty()
            };
        }
        for id in self.selection.iter() {
            if let Some(&index) = self.row_index.get(&id) {
                flags[index] |= RowVisibility::SELECTED;
            }
        }
        self.visibility = flags;
    }

    // -----------------------------------------------------------------------
    // Declarative attributes
    // -----------------------------------------------------------------------

    /// Write an attribute and apply it.
    ///
    /// Unknown names are stored and otherwise ignored. Writes the
    /// coordinator makes itself are stored without being applied again.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        if !self.attrs.write(name, value) {
            return;
        }
        match name {
            names::SORT_COLUMN => {
                if value.trim().is_empty() {
                    self.clear_sort();
                } else {
                    let direction = self
                        .attrs
                        .get(names::SORT_DIRECTION)
                        .and_then(SortDirection::parse)
                        .unwrap_or_default();
                    let applied = self.set_sort(Some(&ColumnRef::parse(value)), direction);
                    if !applied && self.attached {
                        self.reflect_sort();
                    }
                }
            }
            names::SORT_DIRECTION => match SortDirection::parse(value) {
                Some(direction) => self.set_sort_direction(direction),
                None => {
                    warn!(attribute = name, value, "ignoring unknown sort direction");
                    self.set_sort_direction(SortDirection::Asc);
                }
            },
            names::FILTER_QUERY => self.set_filter_query(value),
            names::FILTER_COLUMN => {
                let column = Some(value).filter(|v| !v.trim().is_empty());
                self.set_filter_column(column);
            }
            names::FILTER_RULES => self.set_filter_rules_json(value),
            names::PAGE => {
                let page = self.parse_count(name, value).unwrap_or(1);
                self.set_page(page);
            }
            names::PAGE_SIZE => {
                let size = if value.trim().is_empty() {
                    None
                } else {
                    self.parse_count(name, value)
                };
                self.set_page_size(size);
            }
            names::COLUMN_ORDER => self.set_column_order(value),
            names::COLUMN_PINS => self.set_pins(value),
            names::SELECTABLE => self.set_selectable(parse_flag(value)),
            names::MULTISELECT => self.set_multi_select(parse_flag(value)),
            names::VIRTUALIZE => self.set_virtualize(parse_flag(value)),
            names::ROW_HEIGHT => {
                let height = self.parse_measure(name, value);
                self.set_row_height(height);
            }
            names::OVERSCAN => {
                let overscan = self.parse_measure(name, value);
                self.set_overscan(overscan);
            }
            names::DIR => self.set_direction(ReadingDirection::parse(value)),
            _ => debug!(attribute = name, "stored unrecognized attribute"),
        }
    }

    /// Remove an attribute; the parameter behaves as if never set.
    pub fn remove_attribute(&mut self, name: &str) {
        if !self.attrs.remove(name) {
            return;
        }
        match name {
            names::SORT_COLUMN => self.clear_sort(),
            names::SORT_DIRECTION => self.set_sort_direction(SortDirection::Asc),
            names::FILTER_QUERY => self.set_filter_query(""),
            names::FILTER_COLUMN => self.set_filter_column(None),
            names::FILTER_RULES => self.set_filter_rules(Vec::new()),
            names::PAGE => self.set_page(1),
            names::PAGE_SIZE => self.set_page_size(None),
            names::COLUMN_ORDER => self.set_column_order(""),
            names::COLUMN_PINS => self.set_pin_spec(PinSpec::default()),
            names::SELECTABLE => self.set_selectable(false),
            names::MULTISELECT => self.set_multi_select(false),
            names::VIRTUALIZE => self.set_virtualize(false),
            names::ROW_HEIGHT => self.set_row_height(f64::NAN),
            names::OVERSCAN => self.set_overscan(f64::NAN),
            names::DIR => self.set_direction(ReadingDirection::Ltr),
            _ => {}
        }
        // Setters reflect their defaults back; a removed attribute stays
        // removed.
        self.forget_attribute(name);
    }

    /// Current attribute value.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs.get(name)
    }

    /// Every attribute, by name.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter()
    }

    fn reflect(&mut self, name: &str, value: &str) {
        let was_internal = self.attrs.begin_internal();
        self.set_attribute(name, value);
        self.attrs.end_internal(was_internal);
    }

    fn reflect_sort(&mut self) {
        // Before the first attach an unresolved sort-column attribute is
        // kept as written so attach can resolve it.
        if self.sort.column.is_some() || !self.registry.is_empty() {
            let column = self.sort.column.clone().unwrap_or_default();
            self.reflect(names::SORT_COLUMN, &column);
        }
        self.reflect(names::SORT_DIRECTION, self.sort.direction.as_str());
    }

    fn reflect_filter(&mut self) {
        if self.filter.query_column.is_some() || self.attrs.get(names::FILTER_COLUMN).is_some() {
            let column = column_ref_text(self.filter.query_column.as_ref());
            self.reflect(names::FILTER_COLUMN, &column);
        }
        if !self.filter.rules.is_empty() || self.attrs.get(names::FILTER_RULES).is_some() {
            let rules = FilterRule::list_to_json(&self.filter.rules);
            self.reflect(names::FILTER_RULES, &rules);
        }
    }

    fn reflect_page_size(&mut self) {
        match self.page_size {
            Some(size) => self.reflect(names::PAGE_SIZE, &size.to_string()),
            None => self.unreflect(names::PAGE_SIZE),
        }
    }

    /// Drop an attribute whose parameter went back to its default. A blank
    /// value written by the host already means "unset" and is left alone.
    fn unreflect(&mut self, name: &str) {
        if self.attrs.get(name).is_some_and(|v| !v.trim().is_empty()) {
            self.forget_attribute(name);
        }
    }

    fn forget_attribute(&mut self, name: &str) {
        let was_internal = self.attrs.begin_internal();
        self.attrs.remove(name);
        self.attrs.end_internal(was_internal);
    }

    fn reflect_config(&mut self) {
        self.reflect(names::SELECTABLE, flag_str(self.selection.selectable()));
        self.reflect(names::MULTISELECT, flag_str(self.selection.multi()));
        self.reflect(names::VIRTUALIZE, flag_str(self.virtualize));
        let height = self.viewport.row_height.to_string();
        self.reflect(names::ROW_HEIGHT, &height);
        let overscan = self.viewport.overscan.to_string();
        self.reflect(names::OVERSCAN, &overscan);
        self.reflect(names::DIR, self.transforms.direction().as_str());
        if let Some(size) = self.page_size {
            self.reflect(names::PAGE_SIZE, &size.to_string());
        }
    }

    fn parse_count(&self, attribute: &str, value: &str) -> Option<usize> {
        match value.trim().parse::<usize>() {
            Ok(n) => Some(n),
            Err(_) => {
                warn!(attribute, value, "ignoring non-numeric attribute");
                None
            }
        }
    }

    fn parse_measure(&self, attribute: &str, value: &str) -> f64 {
        match value.trim().parse::<f64>() {
            Ok(n) => n,
            Err(_) => {
                warn!(attribute, value, "ignoring non-numeric attribute");
                f64::NAN
            }
        }
    }

    // -----------------------------------------------------------------------
    // Sort
    // -----------------------------------------------------------------------

    /// Header activation on `column`: flips the sorted column, starts any
    /// other column ascending. Returns the new direction.
    pub fn request_sort(&mut self, column: &ColumnRef) -> Option<SortDirection> {
        let key = self.registry.resolve_key(column)?;
        let direction = self.sort.request(&key);
        self.after_sort_change();
        Some(direction)
    }

    /// Pointer click on the header at display position `index`.
    ///
    /// Returns `None` when the click was swallowed after a keyboard move or
    /// the position is out of range.
    pub fn header_click(&mut self, index: usize) -> Option<SortDirection> {
        if !self.transforms.take_activation() {
            debug!(index, "header activation suppressed after keyboard move");
            return None;
        }
        self.request_sort(&ColumnRef::Index(index))
    }

    /// Set sort column and direction explicitly. Returns whether anything
    /// changed.
    pub fn set_sort(&mut self, column: Option<&ColumnRef>, direction: SortDirection) -> bool {
        let key = match column {
            None => None,
            Some(reference) => match self.registry.resolve_key(reference) {
                Some(key) => Some(key),
                None => {
                    if self.attached {
                        warn!(column = ?reference, "ignoring sort on unknown column");
                    }
                    return false;
                }
            },
        };
        let next = SortState {
            column: key,
            direction,
        };
        if next == self.sort {
            return false;
        }
        self.sort = next;
        self.after_sort_change();
        true
    }

    /// Change only the direction.
    pub fn set_sort_direction(&mut self, direction: SortDirection) {
        if self.sort.direction == direction {
            return;
        }
        self.sort.direction = direction;
        self.after_sort_change();
    }

    /// Remove the sort; rows return to collection order.
    pub fn clear_sort(&mut self) {
        if self.sort.column.is_none() {
            return;
        }
        self.sort.clear();
        self.after_sort_change();
    }

    /// Current sort.
    #[must_use]
    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    fn after_sort_change(&mut self) {
        self.reflect_sort();
        self.recompute(Stage::Sort);
        self.events.push(ViewEvent::SortChanged {
            column: self.sort.column.clone(),
            direction: self.sort.direction,
        });
    }

    // -----------------------------------------------------------------------
    // Filter
    // -----------------------------------------------------------------------

    /// Set the free-text query.
    pub fn set_filter_query(&mut self, query: &str) {
        if self.filter.query == query {
            return;
        }
        self.filter.query = query.to_string();
        self.reflect(names::FILTER_QUERY, query);
        self.after_filter_change();
    }

    /// Scope the query to one column, or to every cell with `None`.
    ///
    /// A position is pinned to the column currently there.
    pub fn set_filter_column(&mut self, column: Option<&str>) {
        let column = column.map(|text| self.registry.anchor(ColumnRef::parse(text)));
        let text = column_ref_text(column.as_ref());
        if self.filter.query_column == column {
            self.reflect(names::FILTER_COLUMN, &text);
            return;
        }
        self.filter.query_column = column;
        self.reflect(names::FILTER_COLUMN, &text);
        self.after_filter_change();
    }

    /// Replace the structured rules. Rules addressing a column by position
    /// are pinned to the column currently there.
    pub fn set_filter_rules(&mut self, rules: Vec<FilterRule>) {
        let rules: Vec<FilterRule> = rules
            .into_iter()
            .map(|mut rule| {
                rule.column = self.registry.anchor(rule.column);
                rule
            })
            .collect();
        let json = FilterRule::list_to_json(&rules);
        if self.filter.rules == rules {
            self.reflect(names::FILTER_RULES, &json);
            return;
        }
        self.filter.rules = rules;
        self.reflect(names::FILTER_RULES, &json);
        self.after_filter_change();
    }

    /// Replace the rules from their JSON form. A malformed payload is
    /// logged; whatever entries can be understood are kept.
    pub fn set_filter_rules_json(&mut self, json: &str) {
        let rules = match FilterRule::parse_list(json) {
            Ok(rules) => rules,
            Err(err) => {
                warn!(attribute = names::FILTER_RULES, error = %err, "malformed filter rules");
                FilterRule::parse_list_lenient(json)
            }
        };
        self.set_filter_rules(rules);
    }

    /// Current filter parameters.
    #[must_use]
    pub fn filter_state(&self) -> &FilterState {
        &self.filter
    }

    fn after_filter_change(&mut self) {
        self.recompute(Stage::Filter);
        self.events.push(ViewEvent::FilterChanged {
            query: self.filter.query.clone(),
            query_column: self
                .filter
                .query_column
                .as_ref()
                .and_then(|r| self.registry.resolve_key(r)),
            rules: self.compiled.rules().iter().map(CompiledRule::summary).collect(),
            total: self.rows.len(),
            filtered: self.filtered.len(),
            page: self.page_window.page,
            page_count: self.page_window.page_count,
        });
    }

    // -----------------------------------------------------------------------
    // Pagination
    // -----------------------------------------------------------------------

    /// Request a 1-based page. Out-of-range requests are clamped and
    /// reported with [`ViewEvent::PageNormalized`].
    pub fn set_page(&mut self, page: usize) {
        if self.page == page && self.last_page.is_some() {
            return;
        }
        self.page = page;
        self.reflect(names::PAGE, &page.to_string());
        self.recompute(Stage::Pagination);
    }

    /// Set rows per page; `None` disables paging.
    pub fn set_page_size(&mut self, size: Option<usize>) {
        let size = size.map(|s| s.max(1));
        if self.page_size == size {
            return;
        }
        self.page_size = size;
        self.reflect_page_size();
        self.recompute(Stage::Pagination);
    }

    /// Current page window.
    #[must_use]
    pub fn page_window(&self) -> PageWindow {
        self.page_window
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Flip a row's selected state. Returns whether anything changed.
    pub fn toggle_row(&mut self, id: RowId) -> bool {
        let Some(&index) = self.row_index.get(&id) else {
            return false;
        };
        let change = self.selection.toggle(id);
        self.after_row_selection(index, id, change)
    }

    /// Flip the selected state of the row at a collection position.
    pub fn toggle_row_at(&mut self, index: usize) -> bool {
        match self.rows.get(index).map(Row::id) {
            Some(id) => self.toggle_row(id),
            None => false,
        }
    }

    /// Set a row's selected state.
    pub fn select_row(&mut self, id: RowId, selected: bool) -> bool {
        let Some(&index) = self.row_index.get(&id) else {
            return false;
        };
        let change = if selected {
            self.selection.select(id)
        } else {
            self.selection.deselect(id)
        };
        self.after_row_selection(index, id, change)
    }

    /// Empty the selection. Returns the pre-clear count, which is also
    /// reported in [`ViewEvent::BulkCleared`].
    pub fn clear_selection(&mut self) -> usize {
        let count = self.selection.clear();
        self.recompute(Stage::Selection);
        self.events.push(ViewEvent::BulkCleared { count });
        count
    }

    /// Select every row passing the filter (multi-select only). Returns how
    /// many rows were added.
    pub fn select_all_active(&mut self) -> usize {
        let ids: Vec<RowId> = self.filtered.iter().map(|&i| self.rows[i].id()).collect();
        let added = self.selection.select_all(ids);
        if added > 0 {
            self.recompute(Stage::Selection);
            self.push_selection_changed();
        }
        added
    }

    /// Enable or disable selection.
    pub fn set_selectable(&mut self, selectable: bool) {
        self.selection.set_selectable(selectable);
        self.reflect(names::SELECTABLE, flag_str(selectable));
    }

    /// Switch between single and multi-select.
    pub fn set_multi_select(&mut self, multi: bool) {
        let dropped = self.selection.set_multi(multi);
        self.reflect(names::MULTISELECT, flag_str(multi));
        if !dropped.is_empty() {
            self.recompute(Stage::Selection);
            self.push_selection_changed();
        }
    }

    /// Selected identities.
    #[must_use]
    pub fn selected_ids(&self) -> Vec<RowId> {
        self.selection.iter().collect()
    }

    /// Collection positions of selected rows, ascending.
    #[must_use]
    pub fn selected_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .selection
            .iter()
            .filter_map(|id| self.row_index.get(&id).copied())
            .collect();
        indices.sort_unstable();
        indices
    }

    /// Selected rows in collection order.
    #[must_use]
    pub fn selected_rows(&self) -> Vec<&Row> {
        self.selected_indices()
            .into_iter()
            .map(|i| &self.rows[i])
            .collect()
    }

    /// Whether `id` is selected.
    #[must_use]
    pub fn is_selected(&self, id: RowId) -> bool {
        self.selection.is_selected(id)
    }

    /// Whether the bulk-action affordance should show.
    #[must_use]
    pub fn bulk_visible(&self) -> bool {
        self.selection.bulk_visible()
    }

    fn after_row_selection(&mut self, index: usize, id: RowId, change: SelectionChange) -> bool {
        let selected = match change {
            SelectionChange::Selected => true,
            SelectionChange::Deselected => false,
            SelectionChange::Unchanged => return false,
        };
        self.recompute(Stage::Selection);
        let selected_indices = self.selected_indices();
        let selected_rows = selected_indices.iter().map(|&i| self.rows[i].clone()).collect();
        self.events.push(ViewEvent::RowSelected {
            row_index: index,
            row_id: id,
            selected,
            selected_indices,
            selected_rows,
        });
        true
    }

    fn push_selection_changed(&mut self) {
        let selected = self.selected_ids();
        self.events.push(ViewEvent::SelectionChanged {
            count: selected.len(),
            selected,
        });
    }

    // -----------------------------------------------------------------------
    // Column transforms
    // -----------------------------------------------------------------------

    /// Move the column at display position `source` to `target`.
    pub fn move_column(&mut self, source: usize, target: usize) -> Option<Reorder> {
        let reorder = self.transforms.reorder(&mut self.registry, source, target)?;
        self.after_reorder(&reorder);
        Some(reorder)
    }

    /// Apply a persisted order string. Unknown keys are skipped and
    /// unmentioned columns keep their declared order at the end.
    pub fn set_column_order(&mut self, order: &str) {
        let keys = parse_order(order);
        if !self.attached || self.registry.is_empty() {
            self.reflect(names::COLUMN_ORDER, order);
            return;
        }
        let changed = self.registry.apply_order(&keys);
        let normalized = self.registry.order_string();
        self.reflect(names::COLUMN_ORDER, &normalized);
        if changed {
            self.recompute(Stage::Columns);
            self.events.push(ViewEvent::ColumnOrderChanged {
                source: None,
                target: None,
                order: self.registry.keys(),
            });
        }
    }

    /// Current order as a persistable string.
    #[must_use]
    pub fn column_order(&self) -> String {
        self.registry.order_string()
    }

    /// Set a column's width, clamped to the minimum. Returns the width in
    /// effect.
    pub fn resize_column(&mut self, column: &ColumnRef, width: f64) -> Option<f64> {
        let key = self.registry.resolve_key(column)?;
        let width = self.transforms.set_width(&key, width);
        self.after_resize(key, width);
        Some(width)
    }

    /// Width in effect for a column.
    #[must_use]
    pub fn column_width(&self, column: &ColumnRef) -> Option<f64> {
        let key = self.registry.resolve_key(column)?;
        Some(self.transforms.effective_width(&key))
    }

    /// Start a pointer resize of `column` at offset `origin`.
    pub fn begin_resize(&mut self, pointer: PointerId, column: &ColumnRef, origin: f64) -> bool {
        if !self.attached {
            return false;
        }
        let Some(key) = self.registry.resolve_key(column) else {
            return false;
        };
        let mut capture = Recording {
            inner: &mut *self.capture,
            events: &mut self.events,
        };
        self.transforms.begin_resize(pointer, origin, &key, &mut capture);
        true
    }

    /// Pointer moved during a resize. Returns the applied width.
    pub fn update_resize(&mut self, pointer: PointerId, position: f64) -> Option<f64> {
        let resized = self.transforms.resize_move(pointer, position)?;
        let width = resized.width;
        self.after_resize(resized.key, width);
        Some(width)
    }

    /// Pointer released: finish the resize. Returns the final width.
    pub fn end_resize(&mut self, pointer: PointerId) -> Option<f64> {
        let mut capture = Recording {
            inner: &mut *self.capture,
            events: &mut self.events,
        };
        self.transforms
            .end_resize(pointer, &mut capture)
            .map(|r| r.width)
    }

    /// Start dragging the header at display position `index`.
    pub fn begin_drag(&mut self, pointer: PointerId, index: usize, origin: f64) -> bool {
        if !self.attached {
            return false;
        }
        let mut capture = Recording {
            inner: &mut *self.capture,
            events: &mut self.events,
        };
        self.transforms
            .begin_drag(pointer, origin, &self.registry, index, &mut capture)
    }

    /// Pointer moved during a drag. Returns the displacement so far.
    pub fn update_drag(&mut self, pointer: PointerId, position: f64) -> Option<f64> {
        self.transforms.drag_move(pointer, position)
    }

    /// Pointer released over the header at `target` (or outside any header
    /// with `None`).
    pub fn end_drag(&mut self, pointer: PointerId, target: Option<usize>) -> Option<Reorder> {
        let mut capture = Recording {
            inner: &mut *self.capture,
            events: &mut self.events,
        };
        let reorder = self
            .transforms
            .end_drag(pointer, target, &mut self.registry, &mut capture)?;
        self.after_reorder(&reorder);
        Some(reorder)
    }

    /// Release every in-flight gesture.
    pub fn cancel_gestures(&mut self) {
        let mut capture = Recording {
            inner: &mut *self.capture,
            events: &mut self.events,
        };
        let released = self.transforms.cancel_gestures(&mut capture);
        if !released.is_empty() {
            debug!(count = released.len(), "gestures cancelled");
        }
    }

    /// Apply a pin spec (`left:k1,k2;right:k3`). Malformed segments are
    /// logged and skipped.
    pub fn set_pins(&mut self, spec: &str) {
        let pins = match spec.parse::<PinSpec>() {
            Ok(pins) => pins,
            Err(err) => {
                warn!(attribute = names::COLUMN_PINS, error = %err, "malformed pin spec");
                PinSpec::parse_lenient(spec)
            }
        };
        self.set_pin_spec(pins);
    }

    /// Apply a parsed pin spec.
    pub fn set_pin_spec(&mut self, pins: PinSpec) {
        if !self.transforms.set_pins(pins) {
            return;
        }
        let spec = self.transforms.pins().to_string();
        self.reflect(names::COLUMN_PINS, &spec);
        self.recompute(Stage::Pins);
        self.events.push(ViewEvent::PinsChanged {
            spec,
            layout: self.pin_layout.clone(),
        });
    }

    /// Pin offsets.
    #[must_use]
    pub fn pin_layout(&self) -> &PinLayout {
        &self.pin_layout
    }

    /// Key press on the header at display position `index`.
    pub fn header_key(&mut self, index: usize, key: HeaderKey) -> HeaderAction {
        let action = self.transforms.header_key(&mut self.registry, index, key);
        match &action {
            HeaderAction::Moved(reorder) => self.after_reorder(reorder),
            HeaderAction::Resized(resized) => self.after_resize(resized.key.clone(), resized.width),
            HeaderAction::Activate(column) => {
                self.request_sort(&ColumnRef::Key(column.clone()));
            }
            HeaderAction::Suppressed => debug!(index, "header activation suppressed"),
            HeaderAction::None => {}
        }
        action
    }

    /// Change the reading direction.
    pub fn set_direction(&mut self, direction: ReadingDirection) {
        self.transforms.set_direction(direction);
        self.reflect(names::DIR, direction.as_str());
    }

    fn after_reorder(&mut self, reorder: &Reorder) {
        self.reflect(names::COLUMN_ORDER, &reorder.order_string());
        self.recompute(Stage::Columns);
        self.events.push(ViewEvent::ColumnOrderChanged {
            source: Some(reorder.source),
            target: Some(reorder.target),
            order: reorder.order.clone(),
        });
    }

    fn after_resize(&mut self, key: String, width: f64) {
        self.recompute(Stage::Pins);
        self.events.push(ViewEvent::ColumnResized { key, width });
    }

    // -----------------------------------------------------------------------
    // Scrolling and virtualization
    // -----------------------------------------------------------------------

    /// Request a scroll. The window is recomputed when the returned frame
    /// fires ([`on_animation_frame`](Self::on_animation_frame)); requests in
    /// between replace the pending offset. `None` while detached.
    pub fn scroll_to(&mut self, offset: f64) -> Option<FrameRequest> {
        if !self.attached {
            return None;
        }
        Some(self.throttle.request(offset))
    }

    /// The host's animation frame for `token` fired. Returns whether a
    /// scroll was applied.
    pub fn on_animation_frame(&mut self, token: FrameToken) -> bool {
        match self.throttle.fire(token) {
            Some(offset) => {
                self.apply_scroll(offset);
                true
            }
            None => false,
        }
    }

    /// Apply a scroll offset now, superseding any pending one.
    pub fn set_scroll_immediate(&mut self, offset: f64) {
        let _ = self.throttle.flush();
        self.apply_scroll(offset);
    }

    /// Whether a scroll frame is outstanding.
    #[must_use]
    pub fn has_pending_frame(&self) -> bool {
        self.throttle.is_pending()
    }

    /// Set the visible extent.
    pub fn set_viewport_size(&mut self, size: f64) {
        self.viewport = self.viewport.with_size(size);
        self.recompute(Stage::Virtualization);
    }

    /// Turn virtualization on or off.
    pub fn set_virtualize(&mut self, virtualize: bool) {
        self.virtualize = virtualize;
        self.reflect(names::VIRTUALIZE, flag_str(virtualize));
        self.recompute(Stage::Virtualization);
    }

    /// Set the row height; invalid values fall back to the default.
    pub fn set_row_height(&mut self, height: f64) {
        self.viewport.row_height = sanitize_row_height(height);
        let text = self.viewport.row_height.to_string();
        self.reflect(names::ROW_HEIGHT, &text);
        self.recompute(Stage::Virtualization);
    }

    /// Set the overscan; invalid values fall back to the default.
    pub fn set_overscan(&mut self, overscan: f64) {
        self.viewport.overscan = sanitize_overscan(overscan);
        let text = self.viewport.overscan.to_string();
        self.reflect(names::OVERSCAN, &text);
        self.recompute(Stage::Virtualization);
    }

    /// Current viewport geometry.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Current virtualization window, relative to the active page.
    #[must_use]
    pub fn virtual_window(&self) -> VirtualWindow {
        self.window
    }

    fn apply_scroll(&mut self, offset: f64) {
        self.viewport = self.viewport.with_scroll(offset);
        self.recompute(Stage::Virtualization);
    }

    // -----------------------------------------------------------------------
    // Output
    // -----------------------------------------------------------------------

    /// Take every queued event.
    pub fn drain_events(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }

    /// Queued events, without taking them.
    #[must_use]
    pub fn pending_events(&self) -> &[ViewEvent] {
        &self.events
    }

    /// Column descriptors in display order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The row collection.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Derived flags for the row at a collection position.
    #[must_use]
    pub fn visibility(&self, index: usize) -> RowVisibility {
        self.visibility.get(index).copied().unwrap_or_default()
    }

    /// Derived flags for every row, in collection order.
    #[must_use]
    pub fn visibility_flags(&self) -> &[RowVisibility] {
        &self.visibility
    }

    /// Number of rows passing the filter.
    #[must_use]
    pub fn filtered_count(&self) -> usize {
        self.filtered.len()
    }

    /// Identities of the filtered rows in sorted order.
    #[must_use]
    pub fn active_row_ids(&self) -> Vec<RowId> {
        self.ordered.iter().map(|&i| self.rows[i].id()).collect()
    }

    /// What the rendering surface draws.
    #[must_use]
    pub fn visible_slice(&self) -> VisibleSlice<'_> {
        let start = self.page_window.start + self.window.start;
        let end = self.page_window.start + self.window.end;
        let rows = self
            .ordered
            .get(start..end)
            .unwrap_or(&[])
            .iter()
            .enumerate()
            .map(|(offset, &index)| {
                let row = &self.rows[index];
                VisibleRow {
                    index,
                    position: start + offset,
                    row,
                    selected: self.selection.is_selected(row.id()),
                }
            })
            .collect();
        VisibleSlice {
            columns: &self.columns,
            rows,
            top_spacer: self.window.top_spacer,
            bottom_spacer: self.window.bottom_spacer,
        }
    }

    /// Number of pipeline passes run so far.
    #[must_use]
    pub fn pipeline_passes(&self) -> u64 {
        self.passes
    }

    /// Configuration the coordinator was created with.
    #[must_use]
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Capture the user-facing view state.
    #[must_use]
    pub fn snapshot(&self) -> ViewSnapshot {
        let column_order = if self.registry.is_empty() {
            self.attrs.get(names::COLUMN_ORDER).unwrap_or_default().to_string()
        } else {
            self.registry.order_string()
        };
        ViewSnapshot {
            version: SNAPSHOT_VERSION,
            sort_column: self.sort.column.clone(),
            sort_direction: self.sort.direction.as_str().to_string(),
            query: self.filter.query.clone(),
            query_column: self
                .filter
                .query_column
                .as_ref()
                .map(|r| column_ref_text(Some(r))),
            rules: FilterRule::list_to_json(&self.filter.rules),
            page: self.page,
            page_size: self.page_size,
            column_order,
            pins: self.transforms.pins().to_string(),
            widths: self
                .transforms
                .widths()
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect::<BTreeMap<_, _>>(),
            selected: self.selection.iter().map(RowId::get).collect(),
        }
    }

    /// Replace the view state with a snapshot and recompute once.
    pub fn restore(&mut self, snapshot: &ViewSnapshot) {
        debug!(version = snapshot.version, "restore view state");
        self.sort.direction = SortDirection::parse(&snapshot.sort_direction).unwrap_or_default();
        self.sort.column = snapshot.sort_column.as_ref().and_then(|raw| {
            if self.registry.is_empty() {
                Some(raw.clone())
            } else {
                self.registry.resolve_key(&ColumnRef::Key(raw.clone()))
            }
        });

        self.filter.query = snapshot.query.clone();
        self.filter.query_column = snapshot
            .query_column
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .map(ColumnRef::parse);
        self.filter.rules = match FilterRule::parse_list(&snapshot.rules) {
            Ok(rules) => rules,
            Err(err) => {
                warn!(error = %err, "malformed rules in saved view");
                FilterRule::parse_list_lenient(&snapshot.rules)
            }
        };

        self.page = snapshot.page;
        self.page_size = snapshot.page_size.map(|s| s.max(1));

        self.registry.apply_order(&parse_order(&snapshot.column_order));
        self.filter.anchor(&self.registry);
        self.transforms.set_pins(PinSpec::parse_lenient(&snapshot.pins));
        self.transforms.clear_widths();
        for (key, width) in &snapshot.widths {
            if self.registry.is_empty() || self.registry.index_of(key).is_some() {
                self.transforms.set_width(key, *width);
            }
        }

        self.selection.clear();
        let ids = snapshot.selected.iter().map(|&raw| RowId::new(raw));
        if self.selection.multi() {
            self.selection.select_all(ids);
        } else if let Some(id) = ids.last() {
            self.selection.select(id);
        }

        self.reflect_state();
        self.recompute(Stage::Columns);
        self.events.push(ViewEvent::SortChanged {
            column: self.sort.column.clone(),
            direction: self.sort.direction,
        });
        self.events.push(ViewEvent::FilterChanged {
            query: self.filter.query.clone(),
            query_column: self
                .filter
                .query_column
                .as_ref()
                .and_then(|r| self.registry.resolve_key(r)),
            rules: self.compiled.rules().iter().map(CompiledRule::summary).collect(),
            total: self.rows.len(),
            filtered: self.filtered.len(),
            page: self.page_window.page,
            page_count: self.page_window.page_count,
        });
    }

    /// Restore from JSON. A corrupt or foreign-version payload is logged
    /// and leaves the view untouched; returns whether it was applied.
    pub fn restore_json(&mut self, json: &str) -> bool {
        match ViewSnapshot::from_json(json) {
            Ok(snapshot) => {
                self.restore(&snapshot);
                true
            }
            Err(err) => {
                warn!(error = %err, "ignoring saved view state");
                false
            }
        }
    }

    fn reflect_state(&mut self) {
        self.reflect_sort();
        let query = self.filter.query.clone();
        self.reflect(names::FILTER_QUERY, &query);
        self.reflect_filter();
        let page = self.page.to_string();
        self.reflect(names::PAGE, &page);
        self.reflect_page_size();
        if !self.registry.is_empty() {
            let order = self.registry.order_string();
            self.reflect(names::COLUMN_ORDER, &order);
        }
        let pins = self.transforms.pins().to_string();
        self.reflect(names::COLUMN_PINS, &pins);
    }
}

impl Drop for ViewCoordinator {
    fn drop(&mut self) {
        self.transforms.cancel_gestures(&mut *self.capture);
        let _ = self.throttle.cancel();
    }
}

fn column_ref_text(reference: Option<&ColumnRef>) -> String {
    match reference {
        Some(ColumnRef::Index(index)) => index.to_string(),
        Some(ColumnRef::Key(key)) => key.clone(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterOp;
    use crate::transform::HeaderKeyCode;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn people() -> (Vec<ColumnDecl>, Vec<Row>) {
        (
            vec![
                ColumnDecl::new("Name"),
                ColumnDecl::new("Email"),
                ColumnDecl::new("Role"),
            ],
            vec![
                Row::new(1, ["Ava", "ava@example.com", "Admin"]),
                Row::new(2, ["Liam", "liam@example.com", "Editor"]),
                Row::new(3, ["Mia", "mia@example.com", "Admin"]),
            ],
        )
    }

    fn attached(config: ViewConfig) -> ViewCoordinator {
        let (columns, rows) = people();
        let mut view = ViewCoordinator::new(config);
        view.attach(columns, rows);
        view.drain_events();
        view
    }

    fn names_in_view(view: &ViewCoordinator) -> Vec<String> {
        view.visible_slice()
            .rows
            .iter()
            .map(|r| r.row.cell(0).to_string())
            .collect()
    }

    #[derive(Clone, Default)]
    struct SharedCapture(Rc<RefCell<Vec<(bool, u32)>>>);

    impl PointerCapture for SharedCapture {
        fn capture(&mut self, pointer: PointerId) {
            self.0.borrow_mut().push((true, pointer.0));
        }

        fn release(&mut self, pointer: PointerId) {
            self.0.borrow_mut().push((false, pointer.0));
        }
    }

    #[test]
    fn attach_emits_initial_page_and_range() {
        let (columns, rows) = people();
        let mut view = ViewCoordinator::default();
        view.attach(columns, rows);
        let kinds: Vec<_> = view.drain_events().iter().map(ViewEvent::kind).collect();
        assert_eq!(kinds, vec!["page-changed", "virtual-range-changed"]);
        assert_eq!(names_in_view(&view), vec!["Ava", "Liam", "Mia"]);
    }

    #[test]
    fn normalizing_page_runs_one_pass() {
        let mut view = attached(ViewConfig::default().with_page_size(500));
        let before = view.pipeline_passes();
        view.set_attribute(names::PAGE, "9999");
        assert_eq!(view.pipeline_passes(), before + 1);
        assert_eq!(view.attribute(names::PAGE), Some("1"));
        let events = view.drain_events();
        assert!(events.contains(&ViewEvent::PageNormalized {
            requested: 9999,
            page: 1,
            page_count: 1
        }));
    }

    #[test]
    fn sort_follows_column_through_reorder() {
        let mut view = attached(ViewConfig::default());
        view.request_sort(&ColumnRef::Key("name".into()));
        view.request_sort(&ColumnRef::Key("name".into()));
        assert_eq!(names_in_view(&view), vec!["Mia", "Liam", "Ava"]);
        view.move_column(0, 2);
        assert_eq!(view.sort_state().column.as_deref(), Some("name"));
        assert_eq!(names_in_view(&view), vec!["Mia", "Liam", "Ava"]);
        assert_eq!(view.attribute(names::COLUMN_ORDER), Some("email,role,name"));
    }

    #[test]
    fn query_and_rules_are_conjunctive() {
        let mut view = attached(ViewConfig::default());
        view.set_filter_rules(vec![FilterRule::on("role", FilterOp::Equals, "admin")]);
        view.set_filter_query("mia");
        assert_eq!(names_in_view(&view), vec!["Mia"]);
        assert!(view.visibility(0).contains(RowVisibility::HIDDEN_BY_FILTER));
    }

    #[test]
    fn scoped_query_only_reads_its_column() {
        let mut view = attached(ViewConfig::default());
        view.set_filter_column(Some("role"));
        view.set_filter_query("ava");
        assert!(names_in_view(&view).is_empty());
        view.set_filter_column(None);
        assert_eq!(names_in_view(&view), vec!["Ava"]);
    }

    #[test]
    fn malformed_rules_fail_open() {
        let mut view = attached(ViewConfig::default());
        view.set_attribute(names::FILTER_RULES, "{oops");
        assert_eq!(view.filtered_count(), 3);
        assert!(view.filter_state().rules.is_empty());
    }

    #[test]
    fn pruning_drops_vanished_rows() {
        let mut view = attached(ViewConfig::default().with_multi_select(true));
        view.toggle_row(RowId::new(1));
        view.toggle_row(RowId::new(2));
        view.drain_events();
        view.set_rows(vec![Row::new(2, ["Liam", "l", "Editor"])]);
        assert_eq!(view.selected_ids(), vec![RowId::new(2)]);
        let events = view.drain_events();
        assert!(events.contains(&ViewEvent::SelectionPruned {
            removed: vec![RowId::new(1)]
        }));
    }

    #[test]
    fn row_selected_carries_snapshot() {
        let mut view = attached(ViewConfig::default().with_multi_select(true));
        view.toggle_row_at(2);
        view.toggle_row_at(0);
        let events = view.drain_events();
        let Some(ViewEvent::RowSelected {
            row_index,
            selected,
            selected_indices,
            selected_rows,
            ..
        }) = events.last()
        else {
            panic!("expected row-selected, got {events:?}");
        };
        assert_eq!(*row_index, 0);
        assert!(*selected);
        assert_eq!(selected_indices, &vec![0, 2]);
        assert_eq!(selected_rows.len(), 2);
        assert!(view.visibility(2).contains(RowVisibility::SELECTED));
    }

    #[test]
    fn pages_hide_rows_by_page() {
        let mut view = attached(ViewConfig::default().with_page_size(2));
        assert_eq!(view.page_window().page_count, 2);
        assert!(view.visibility(2).contains(RowVisibility::HIDDEN_BY_PAGE));
        view.set_page(2);
        assert_eq!(names_in_view(&view), vec!["Mia"]);
    }

    #[test]
    fn keyboard_move_then_enter_does_not_sort() {
        let mut view = attached(ViewConfig::default());
        view.header_key(0, HeaderKey::alt(HeaderKeyCode::Right));
        assert_eq!(view.column_order(), "email,name,role");
        assert_eq!(view.header_click(1), None);
        assert!(view.sort_state().column.is_none());
        assert_eq!(view.header_click(1), Some(SortDirection::Asc));
    }

    #[test]
    fn scroll_is_coalesced_and_latest_wins() {
        let mut config = ViewConfig::default().with_virtualization(80.0);
        config.overscan = 1;
        let (columns, _) = people();
        let rows: Vec<Row> = (0..100u64)
            .map(|i| Row::new(i, [format!("r{i}"), String::new(), String::new()]))
            .collect();
        let mut view = ViewCoordinator::new(config);
        view.attach(columns, rows);
        let Some(FrameRequest::Schedule(token)) = view.scroll_to(400.0) else {
            panic!("first scroll schedules a frame");
        };
        assert_eq!(view.scroll_to(800.0), Some(FrameRequest::Coalesced));
        assert!(view.on_animation_frame(token));
        assert_eq!(view.virtual_window().start, 19);
        assert!(!view.on_animation_frame(token));
    }

    #[test]
    fn detach_releases_capture_and_cancels_frame() {
        let capture = SharedCapture::default();
        let log = capture.0.clone();
        let mut view = attached(ViewConfig::default().with_virtualization(100.0))
            .with_pointer_capture(Box::new(capture));
        assert!(view.begin_resize(PointerId(9), &ColumnRef::Key("email".into()), 0.0));
        let Some(FrameRequest::Schedule(token)) = view.scroll_to(10.0) else {
            panic!("expected a frame");
        };
        assert_eq!(view.detach(), Some(token));
        assert_eq!(*log.borrow(), vec![(true, 9), (false, 9)]);
        assert_eq!(view.scroll_to(5.0), None);
    }

    #[test]
    fn drop_releases_capture() {
        let capture = SharedCapture::default();
        let log = capture.0.clone();
        {
            let mut view = attached(ViewConfig::default()).with_pointer_capture(Box::new(capture));
            view.begin_drag(PointerId(3), 0, 0.0);
        }
        assert_eq!(*log.borrow(), vec![(true, 3), (false, 3)]);
    }

    #[test]
    fn attributes_before_attach_apply_on_attach() {
        let (columns, rows) = people();
        let mut view = ViewCoordinator::default();
        view.set_attribute(names::COLUMN_ORDER, "role,name");
        view.set_attribute(names::SORT_COLUMN, "Name");
        view.set_attribute(names::SORT_DIRECTION, "desc");
        view.attach(columns, rows);
        assert_eq!(view.column_order(), "role,name,email");
        assert_eq!(view.sort_state().column.as_deref(), Some("name"));
        assert_eq!(names_in_view(&view), vec!["Mia", "Liam", "Ava"]);
    }

    #[test]
    fn snapshot_restores_equivalent_view() {
        let mut view = attached(ViewConfig::default().with_multi_select(true));
        view.request_sort(&ColumnRef::Key("role".into()));
        view.set_filter_query("a");
        view.move_column(2, 0);
        view.resize_column(&ColumnRef::Key("email".into()), 10.0);
        view.set_pins("left:role");
        view.toggle_row(RowId::new(3));
        let json = view.snapshot().to_json().unwrap();

        let mut other = attached(ViewConfig::default().with_multi_select(true));
        assert!(other.restore_json(&json));
        assert_eq!(other.snapshot(), view.snapshot());
        assert_eq!(other.active_row_ids(), view.active_row_ids());
        assert_eq!(other.column_width(&ColumnRef::Key("email".into())), Some(48.0));
        assert!(!other.restore_json("{\"version\":99}"));
    }

    #[test]
    fn invalid_virtual_settings_fall_back() {
        let mut view = attached(ViewConfig::default());
        view.set_attribute(names::ROW_HEIGHT, "tall");
        view.set_attribute(names::OVERSCAN, "-4");
        assert_eq!(view.viewport().row_height, 40.0);
        assert_eq!(view.viewport().overscan, 2);
        assert_eq!(view.attribute(names::ROW_HEIGHT), Some("40"));
    }

    #[test]
    fn removed_page_size_stays_removed() {
        let mut view = attached(ViewConfig::default());
        view.set_attribute(names::PAGE_SIZE, "2");
        assert_eq!(view.page_window().page_count, 2);
        view.remove_attribute(names::PAGE_SIZE);
        assert_eq!(view.attribute(names::PAGE_SIZE), None);
        assert_eq!(view.page_window().page_count, 1);

        view.set_page_size(Some(2));
        assert_eq!(view.attribute(names::PAGE_SIZE), Some("2"));
        view.set_page_size(None);
        assert_eq!(view.attribute(names::PAGE_SIZE), None);
    }

    #[test]
    fn removed_filter_rules_stay_removed() {
        let mut view = attached(ViewConfig::default());
        view.set_attribute(names::FILTER_RULES, "[]");
        view.remove_attribute(names::FILTER_RULES);
        assert_eq!(view.attribute(names::FILTER_RULES), None);
    }

    #[test]
    fn unknown_sort_column_reflects_effective_sort() {
        let mut view = attached(ViewConfig::default());
        view.set_attribute(names::SORT_COLUMN, "name");
        view.set_attribute(names::SORT_COLUMN, "ghost");
        assert_eq!(view.sort_state().column.as_deref(), Some("name"));
        assert_eq!(view.attribute(names::SORT_COLUMN), Some("name"));
    }

    #[test]
    fn positional_filter_column_is_written_back_as_key() {
        let mut view = attached(ViewConfig::default());
        view.set_attribute(names::FILTER_COLUMN, "2");
        assert_eq!(view.attribute(names::FILTER_COLUMN), Some("role"));
        view.set_filter_query("admin");
        view.move_column(2, 0);
        assert_eq!(names_in_view(&view), vec!["Ava", "Mia"]);
    }

    #[test]
    fn resize_keeps_filter_and_sort_results() {
        let mut view = attached(ViewConfig::default());
        view.set_filter_query("a");
        let filtered = view.filtered_count();
        let before = view.pipeline_passes();
        assert_eq!(view.resize_column(&ColumnRef::Key("email".into()), 220.0), Some(220.0));
        assert_eq!(view.pipeline_passes(), before + 1);
        assert_eq!(view.filtered_count(), filtered);
        assert_eq!(view.columns()[1].width, Some(220.0));
    }
}

#![forbid(unsafe_code)]

//! Column transforms: reorder, resize and pin.
//!
//! Widths and pins are keyed by column key, never by display position, so
//! they follow a column through any reorder without remapping. Positional
//! output ([`Column`](crate::Column) descriptors, pin offsets) is re-derived
//! from that keyed state after every change.
//!
//! Pointer-driven resize and drag run as scoped [`GestureSlot`] sessions.
//! Keyboard header navigation maps onto the same operations.
//!
//! # Invariants
//!
//! 1. Every stored width is `>= min_width`.
//! 2. At most one resize and one drag session are active.
//! 3. A keyboard-initiated move arms suppression of exactly one following
//!    header activation.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Move/end for a pointer with no session | No-op |
//! | Resize of an unknown key | No-op |
//! | Drag dropped outside any header | Session released, no reorder |
//! | Reorder with out-of-range or equal positions | No-op |

use std::collections::HashMap;

use tabula_core::{GestureSlot, PointerCapture, PointerId, ReadingDirection};

use crate::column::ColumnRegistry;
use crate::pin::PinSpec;

// ---------------------------------------------------------------------------
// Gesture payloads
// ---------------------------------------------------------------------------

/// State captured when a resize gesture begins.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeGrip {
    /// Column being resized.
    pub key: String,
    /// Width at the start of the gesture.
    pub start_width: f64,
}

/// State captured when a header drag begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragGrip {
    /// Column being dragged.
    pub key: String,
    /// Its display position at the start of the gesture.
    pub from: usize,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A completed reorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reorder {
    /// Display position the column left.
    pub source: usize,
    /// Display position it landed on.
    pub target: usize,
    /// Resulting order as keys.
    pub order: Vec<String>,
}

impl Reorder {
    /// Persistable order string.
    #[must_use]
    pub fn order_string(&self) -> String {
        self.order.join(",")
    }
}

/// A width that was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Resized {
    /// Column key.
    pub key: String,
    /// Clamped width now in effect.
    pub width: f64,
}

/// Keys understood on a focused header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKeyCode {
    /// Physical left arrow.
    Left,
    /// Physical right arrow.
    Right,
    /// Enter.
    Enter,
    /// Space.
    Space,
}

/// A key press on a focused header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderKey {
    /// Key.
    pub code: HeaderKeyCode,
    /// Alt held.
    pub alt: bool,
    /// Shift held.
    pub shift: bool,
}

impl HeaderKey {
    /// Unmodified key.
    #[must_use]
    pub const fn plain(code: HeaderKeyCode) -> Self {
        Self {
            code,
            alt: false,
            shift: false,
        }
    }

    /// Key with Alt held.
    #[must_use]
    pub const fn alt(code: HeaderKeyCode) -> Self {
        Self {
            code,
            alt: true,
            shift: false,
        }
    }

    /// Key with Shift held.
    #[must_use]
    pub const fn shift(code: HeaderKeyCode) -> Self {
        Self {
            code,
            alt: false,
            shift: true,
        }
    }
}

/// What a header key press did.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderAction {
    /// Column moved.
    Moved(Reorder),
    /// Column resized.
    Resized(Resized),
    /// Header activated; the caller toggles sort on this key.
    Activate(String),
    /// Activation swallowed after a keyboard move.
    Suppressed,
    /// Nothing to do.
    None,
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// Keyed width and pin state plus in-flight gestures.
#[derive(Debug, Clone)]
pub struct ColumnTransformManager {
    widths: HashMap<String, f64>,
    pins: PinSpec,
    resize: GestureSlot<ResizeGrip>,
    drag: GestureSlot<DragGrip>,
    suppress_activation: bool,
    min_width: f64,
    default_width: f64,
    resize_step: f64,
    direction: ReadingDirection,
}

impl Default for ColumnTransformManager {
    fn default() -> Self {
        Self::new(48.0, 120.0, 10.0)
    }
}

impl ColumnTransformManager {
    /// Create with width limits and the keyboard resize step.
    #[must_use]
    pub fn new(min_width: f64, default_width: f64, resize_step: f64) -> Self {
        let min_width = if min_width.is_finite() && min_width >= 0.0 {
            min_width
        } else {
            0.0
        };
        Self {
            widths: HashMap::new(),
            pins: PinSpec::default(),
            resize: GestureSlot::new(),
            drag: GestureSlot::new(),
            suppress_activation: false,
            min_width,
            default_width: if default_width.is_finite() {
                default_width.max(min_width)
            } else {
                min_width
            },
            resize_step: if resize_step.is_finite() && resize_step > 0.0 {
                resize_step
            } else {
                10.0
            },
            direction: ReadingDirection::Ltr,
        }
    }

    /// Reading direction used for deltas and arrow keys.
    #[must_use]
    pub fn direction(&self) -> ReadingDirection {
        self.direction
    }

    /// Change the reading direction.
    pub fn set_direction(&mut self, direction: ReadingDirection) {
        self.direction = direction;
    }

    /// Minimum column width.
    #[must_use]
    pub fn min_width(&self) -> f64 {
        self.min_width
    }

    /// Width assumed for columns without an explicit one.
    #[must_use]
    pub fn default_width(&self) -> f64 {
        self.default_width
    }

    /// Explicit widths by key.
    #[must_use]
    pub fn widths(&self) -> &HashMap<String, f64> {
        &self.widths
    }

    /// Explicit width of a column.
    #[must_use]
    pub fn width_of(&self, key: &str) -> Option<f64> {
        self.widths.get(key).copied()
    }

    /// Width in effect for a column.
    #[must_use]
    pub fn effective_width(&self, key: &str) -> f64 {
        self.width_of(key).unwrap_or(self.default_width)
    }

    /// Clamp a requested width to the minimum. Non-finite requests clamp to
    /// the minimum as well.
    #[must_use]
    pub fn clamp_width(&self, width: f64) -> f64 {
        if width.is_finite() {
            width.max(self.min_width)
        } else {
            self.min_width
        }
    }

    /// Store a width for `key`, clamped. Returns the stored width.
    pub fn set_width(&mut self, key: &str, width: f64) -> f64 {
        let width = self.clamp_width(width);
        self.widths.insert(key.to_string(), width);
        width
    }

    /// Forget every explicit width.
    pub fn clear_widths(&mut self) {
        self.widths.clear();
    }

    /// Drop widths for keys no longer declared.
    pub fn retain_keys(&mut self, registry: &ColumnRegistry) {
        self.widths.retain(|key, _| registry.index_of(key).is_some());
    }

    /// Current pin spec.
    #[must_use]
    pub fn pins(&self) -> &PinSpec {
        &self.pins
    }

    /// Replace the pin spec. Returns whether it changed.
    pub fn set_pins(&mut self, pins: PinSpec) -> bool {
        if self.pins == pins {
            return false;
        }
        self.pins = pins;
        true
    }

    // --- reorder ----------------------------------------------------------

    /// Move the column at display position `source` to `target`.
    pub fn reorder(
        &mut self,
        registry: &mut ColumnRegistry,
        source: usize,
        target: usize,
    ) -> Option<Reorder> {
        if !registry.move_column(source, target) {
            return None;
        }
        Some(Reorder {
            source,
            target,
            order: registry.keys(),
        })
    }

    // --- resize -----------------------------------------------------------

    /// Start resizing `key` from pointer offset `origin`.
    pub fn begin_resize(
        &mut self,
        pointer: PointerId,
        origin: f64,
        key: &str,
        capture: &mut dyn PointerCapture,
    ) {
        let grip = ResizeGrip {
            key: key.to_string(),
            start_width: self.effective_width(key),
        };
        self.resize.begin(pointer, origin, grip, capture);
    }

    /// Apply a pointer move to the active resize.
    pub fn resize_move(&mut self, pointer: PointerId, position: f64) -> Option<Resized> {
        let session = self.resize.update(pointer, position)?;
        let key = session.payload().key.clone();
        let target = session.payload().start_width + self.direction.logical_delta(session.delta());
        let width = self.set_width(&key, target);
        Some(Resized { key, width })
    }

    /// Finish the resize, releasing capture. Returns the final width.
    pub fn end_resize(
        &mut self,
        pointer: PointerId,
        capture: &mut dyn PointerCapture,
    ) -> Option<Resized> {
        let session = self.resize.end(pointer, capture)?;
        let key = session.payload().key.clone();
        let width = self.effective_width(&key);
        Some(Resized { key, width })
    }

    /// Whether a resize is in flight.
    #[must_use]
    pub fn is_resizing(&self) -> bool {
        self.resize.is_active()
    }

    // --- drag -------------------------------------------------------------

    /// Start dragging the header at display position `from`.
    pub fn begin_drag(
        &mut self,
        pointer: PointerId,
        origin: f64,
        registry: &ColumnRegistry,
        from: usize,
        capture: &mut dyn PointerCapture,
    ) -> bool {
        let Some(key) = registry.key_at(from) else {
            return false;
        };
        let grip = DragGrip {
            key: key.to_string(),
            from,
        };
        self.drag.begin(pointer, origin, grip, capture);
        true
    }

    /// Track a drag move. Returns the physical displacement so far.
    pub fn drag_move(&mut self, pointer: PointerId, position: f64) -> Option<f64> {
        self.drag.update(pointer, position).map(|s| s.delta())
    }

    /// Drop the dragged header onto display position `target`.
    ///
    /// The source position is looked up by key at drop time, so a reorder
    /// that happened mid-drag does not move the wrong column.
    pub fn end_drag(
        &mut self,
        pointer: PointerId,
        target: Option<usize>,
        registry: &mut ColumnRegistry,
        capture: &mut dyn PointerCapture,
    ) -> Option<Reorder> {
        let session = self.drag.end(pointer, capture)?;
        let source = registry.index_of(&session.payload().key)?;
        self.reorder(registry, source, target?)
    }

    /// Whether a drag is in flight.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_active()
    }

    /// Release every in-flight gesture. Returns the released pointers.
    pub fn cancel_gestures(&mut self, capture: &mut dyn PointerCapture) -> Vec<PointerId> {
        let mut released = Vec::new();
        if let Some(session) = self.resize.cancel(capture) {
            released.push(session.pointer());
        }
        if let Some(session) = self.drag.cancel(capture) {
            released.push(session.pointer());
        }
        released
    }

    /// Pointers currently captured.
    #[must_use]
    pub fn captured_pointers(&self) -> Vec<PointerId> {
        self.resize
            .active()
            .map(|s| s.pointer())
            .into_iter()
            .chain(self.drag.active().map(|s| s.pointer()))
            .collect()
    }

    // --- keyboard ---------------------------------------------------------

    /// Handle a key press on the header at display position `index`.
    pub fn header_key(
        &mut self,
        registry: &mut ColumnRegistry,
        index: usize,
        key: HeaderKey,
    ) -> HeaderAction {
        let Some(column_key) = registry.key_at(index).map(str::to_string) else {
            return HeaderAction::None;
        };
        let physical = match key.code {
            HeaderKeyCode::Left => -1,
            HeaderKeyCode::Right => 1,
            HeaderKeyCode::Enter | HeaderKeyCode::Space => {
                return if self.take_activation() {
                    HeaderAction::Activate(column_key)
                } else {
                    HeaderAction::Suppressed
                };
            }
        };
        if key.alt {
            let step = self.direction.logical_step(physical);
            let Some(target) = index.checked_add_signed(step) else {
                return HeaderAction::None;
            };
            return match self.reorder(registry, index, target) {
                Some(reorder) => {
                    self.suppress_activation = true;
                    HeaderAction::Moved(reorder)
                }
                None => HeaderAction::None,
            };
        }
        if key.shift {
            let delta = self.direction.logical_delta(physical as f64 * self.resize_step);
            let width = self.set_width(&column_key, self.effective_width(&column_key) + delta);
            return HeaderAction::Resized(Resized {
                key: column_key,
                width,
            });
        }
        HeaderAction::None
    }

    /// Consume a pending activation. Returns `false` (and disarms) when the
    /// activation follows a keyboard move.
    pub fn take_activation(&mut self) -> bool {
        !std::mem::take(&mut self.suppress_activation)
    }
}

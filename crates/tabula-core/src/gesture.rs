#![forbid(unsafe_code)]

//! Scoped pointer gesture sessions.
//!
//! A column drag or resize binds the host's global move/release listeners
//! for exactly as long as the gesture lasts. [`GestureSlot`] owns at most one
//! [`GestureSession`] and talks to the host through [`PointerCapture`]:
//! `capture` when a session begins, `release` when it ends, is cancelled, or
//! is replaced by a new session.
//!
//! # Invariants
//!
//! 1. Every `capture(p)` is matched by exactly one `release(p)`.
//! 2. At most one session is active per slot.
//! 3. Moves and releases carrying a pointer id other than the active one are
//!    ignored.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Release with no matching begin | No-op, returns `None` |
//! | Move after release | No-op, returns `None` |
//! | Begin while another session is active | Old session released and returned |
//! | Owner torn down mid-gesture | Owner calls [`GestureSlot::cancel`], which releases |

use std::fmt;

/// Host-assigned pointer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerId(pub u32);

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pointer#{}", self.0)
    }
}

/// Binding of the host's global pointer listeners.
pub trait PointerCapture {
    /// Start routing moves and releases for `pointer` to the engine.
    fn capture(&mut self, pointer: PointerId);

    /// Stop routing events for `pointer`.
    fn release(&mut self, pointer: PointerId);
}

/// Capture implementation for hosts that route pointer events themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapture;

impl PointerCapture for NoCapture {
    fn capture(&mut self, _pointer: PointerId) {}

    fn release(&mut self, _pointer: PointerId) {}
}

/// One in-flight gesture along a single axis.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureSession<T> {
    pointer: PointerId,
    origin: f64,
    position: f64,
    payload: T,
}

impl<T> GestureSession<T> {
    /// Pointer driving the gesture.
    #[must_use]
    pub fn pointer(&self) -> PointerId {
        self.pointer
    }

    /// Offset where the gesture started.
    #[must_use]
    pub fn origin(&self) -> f64 {
        self.origin
    }

    /// Latest reported offset.
    #[must_use]
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Physical displacement since the start.
    #[must_use]
    pub fn delta(&self) -> f64 {
        self.position - self.origin
    }

    /// Data captured when the gesture began.
    #[must_use]
    pub fn payload(&self) -> &T {
        &self.payload
    }
}

/// Holder for at most one active gesture session.
#[derive(Debug, Clone)]
pub struct GestureSlot<T> {
    active: Option<GestureSession<T>>,
}

impl<T> Default for GestureSlot<T> {
    fn default() -> Self {
        Self { active: None }
    }
}

impl<T> GestureSlot<T> {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a session, capturing `pointer`.
    ///
    /// Returns the interrupted session if one was still active; it has
    /// already been released.
    pub fn begin(
        &mut self,
        pointer: PointerId,
        origin: f64,
        payload: T,
        capture: &mut dyn PointerCapture,
    ) -> Option<GestureSession<T>> {
        let interrupted = self.cancel(capture);
        capture.capture(pointer);
        crate::trace!(pointer = pointer.0, origin, "gesture begin");
        self.active = Some(GestureSession {
            pointer,
            origin,
            position: origin,
            payload,
        });
        interrupted
    }

    /// Record a move. Ignored unless `pointer` owns the active session.
    pub fn update(&mut self, pointer: PointerId, position: f64) -> Option<&GestureSession<T>> {
        let session = self.active.as_mut().filter(|s| s.pointer == pointer)?;
        session.position = position;
        Some(&*session)
    }

    /// Finish the session owned by `pointer`, releasing capture.
    pub fn end(
        &mut self,
        pointer: PointerId,
        capture: &mut dyn PointerCapture,
    ) -> Option<GestureSession<T>> {
        if !self.active.as_ref().is_some_and(|s| s.pointer == pointer) {
            crate::trace!(pointer = pointer.0, "release without matching gesture");
            return None;
        }
        self.cancel(capture)
    }

    /// Drop whatever session is active, releasing capture.
    pub fn cancel(&mut self, capture: &mut dyn PointerCapture) -> Option<GestureSession<T>> {
        let session = self.active.take()?;
        capture.release(session.pointer);
        crate::trace!(pointer = session.pointer.0, "gesture released");
        Some(session)
    }

    /// The active session, if any.
    #[must_use]
    pub fn active(&self) -> Option<&GestureSession<T>> {
        self.active.as_ref()
    }

    /// Whether a session is in flight.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        log: Vec<(&'static str, u32)>,
    }

    impl PointerCapture for Recorder {
        fn capture(&mut self, pointer: PointerId) {
            self.log.push(("capture", pointer.0));
        }

        fn release(&mut self, pointer: PointerId) {
            self.log.push(("release", pointer.0));
        }
    }

    #[test]
    fn begin_move_end_pairs_capture() {
        let mut rec = Recorder::default();
        let mut slot = GestureSlot::new();
        assert!(slot.begin(PointerId(1), 100.0, "col", &mut rec).is_none());
        let s = slot.update(PointerId(1), 130.0).expect("active");
        assert_eq!(s.delta(), 30.0);
        let done = slot.end(PointerId(1), &mut rec).expect("ended");
        assert_eq!(*done.payload(), "col");
        assert!(!slot.is_active());
        assert_eq!(rec.log, vec![("capture", 1), ("release", 1)]);
    }

    #[test]
    fn foreign_pointer_is_ignored() {
        let mut rec = Recorder::default();
        let mut slot = GestureSlot::new();
        slot.begin(PointerId(1), 0.0, (), &mut rec);
        assert!(slot.update(PointerId(2), 50.0).is_none());
        assert!(slot.end(PointerId(2), &mut rec).is_none());
        assert_eq!(slot.active().map(GestureSession::position), Some(0.0));
    }

    #[test]
    fn release_without_begin_is_noop() {
        let mut rec = Recorder::default();
        let mut slot: GestureSlot<()> = GestureSlot::new();
        assert!(slot.end(PointerId(9), &mut rec).is_none());
        assert!(slot.update(PointerId(9), 1.0).is_none());
        assert!(rec.log.is_empty());
    }

    #[test]
    fn begin_interrupts_previous_session() {
        let mut rec = Recorder::default();
        let mut slot = GestureSlot::new();
        slot.begin(PointerId(1), 0.0, 1, &mut rec);
        let old = slot.begin(PointerId(2), 5.0, 2, &mut rec).expect("interrupted");
        assert_eq!(*old.payload(), 1);
        assert_eq!(
            rec.log,
            vec![("capture", 1), ("release", 1), ("capture", 2)]
        );
        slot.cancel(&mut rec);
        assert_eq!(rec.log.last(), Some(&("release", 2)));
    }
}

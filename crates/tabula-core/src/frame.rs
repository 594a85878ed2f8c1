#![forbid(unsafe_code)]

//! Animation-frame throttle.
//!
//! Scroll input can arrive many times per frame. [`FrameThrottle`] keeps at
//! most one frame request outstanding and a single pending value: a new
//! request while a frame is outstanding replaces the pending value and
//! schedules nothing. When the host's frame fires, the latest value is
//! handed back, so the settled position is never dropped.
//!
//! # Invariants
//!
//! - **Latest-wins**: the value returned by [`fire`](FrameThrottle::fire) is
//!   the most recent one passed to [`request`](FrameThrottle::request).
//! - **One outstanding frame**: [`FrameRequest::Schedule`] is returned only
//!   when no frame is pending.
//! - **Stale tokens**: firing a token that was cancelled or already fired
//!   yields `None`.

/// Identifies one scheduled frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(u64);

impl FrameToken {
    /// Raw token value, for hosts that key their frame callbacks by number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// What the host must do after a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRequest {
    /// Schedule a frame and call back with this token.
    Schedule(FrameToken),
    /// A frame is already outstanding; the pending value was replaced.
    Coalesced,
}

/// Coalesces values into at most one application per animation frame.
#[derive(Debug, Clone)]
pub struct FrameThrottle<T> {
    pending: Option<T>,
    outstanding: Option<FrameToken>,
    next_token: u64,
    coalesced: u64,
}

impl<T> Default for FrameThrottle<T> {
    fn default() -> Self {
        Self {
            pending: None,
            outstanding: None,
            next_token: 1,
            coalesced: 0,
        }
    }
}

impl<T> FrameThrottle<T> {
    /// Create an idle throttle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `value` for the next frame.
    pub fn request(&mut self, value: T) -> FrameRequest {
        self.pending = Some(value);
        if self.outstanding.is_some() {
            self.coalesced = self.coalesced.saturating_add(1);
            return FrameRequest::Coalesced;
        }
        let token = FrameToken(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);
        self.outstanding = Some(token);
        FrameRequest::Schedule(token)
    }

    /// The frame for `token` fired; take the latest pending value.
    pub fn fire(&mut self, token: FrameToken) -> Option<T> {
        if self.outstanding != Some(token) {
            crate::trace!(token = token.0, "stale frame token");
            return None;
        }
        self.outstanding = None;
        self.pending.take()
    }

    /// Take the pending value without waiting for the frame.
    pub fn flush(&mut self) -> Option<T> {
        self.outstanding = None;
        self.pending.take()
    }

    /// Drop any pending work. Returns the token the host should cancel.
    pub fn cancel(&mut self) -> Option<FrameToken> {
        self.pending = None;
        self.outstanding.take()
    }

    /// Whether a frame is outstanding.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.outstanding.is_some()
    }

    /// Number of requests absorbed into an already outstanding frame.
    #[must_use]
    pub fn coalesced_count(&self) -> u64 {
        self.coalesced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_collapses_to_latest() {
        let mut t = FrameThrottle::new();
        let FrameRequest::Schedule(token) = t.request(10.0) else {
            panic!("first request schedules");
        };
        assert_eq!(t.request(20.0), FrameRequest::Coalesced);
        assert_eq!(t.request(30.0), FrameRequest::Coalesced);
        assert_eq!(t.fire(token), Some(30.0));
        assert!(!t.is_pending());
        assert_eq!(t.coalesced_count(), 2);
    }

    #[test]
    fn stale_and_cancelled_tokens_do_nothing() {
        let mut t = FrameThrottle::new();
        let FrameRequest::Schedule(first) = t.request(1) else {
            panic!("schedules");
        };
        assert_eq!(t.cancel(), Some(first));
        assert_eq!(t.fire(first), None);

        let FrameRequest::Schedule(second) = t.request(2) else {
            panic!("schedules again");
        };
        assert_ne!(first, second);
        assert_eq!(t.fire(first), None);
        assert_eq!(t.fire(second), Some(2));
        assert_eq!(t.fire(second), None);
    }

    #[test]
    fn flush_applies_immediately() {
        let mut t = FrameThrottle::new();
        t.request("a");
        assert_eq!(t.flush(), Some("a"));
        assert!(matches!(t.request("b"), FrameRequest::Schedule(_)));
    }
}

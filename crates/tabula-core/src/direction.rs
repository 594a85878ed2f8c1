#![forbid(unsafe_code)]

//! Reading direction.
//!
//! Positional deltas (resize drags, directional header moves) are expressed
//! relative to the inline start edge. Under right-to-left layout the physical
//! sign flips, so "toward the start edge" always means the same thing.

/// Layout reading direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadingDirection {
    /// Left-to-right.
    #[default]
    Ltr,
    /// Right-to-left.
    Rtl,
}

impl ReadingDirection {
    /// Parse a `dir` attribute value. Anything other than `rtl` is LTR.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("rtl") {
            Self::Rtl
        } else {
            Self::Ltr
        }
    }

    /// Attribute form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ltr => "ltr",
            Self::Rtl => "rtl",
        }
    }

    /// Whether this is right-to-left.
    #[must_use]
    pub const fn is_rtl(self) -> bool {
        matches!(self, Self::Rtl)
    }

    /// Convert a physical horizontal delta into a logical one.
    #[must_use]
    pub fn logical_delta(self, physical: f64) -> f64 {
        match self {
            Self::Ltr => physical,
            Self::Rtl => -physical,
        }
    }

    /// Convert a physical arrow step (`-1` left, `+1` right) into a logical
    /// step along the column order.
    #[must_use]
    pub const fn logical_step(self, physical: isize) -> isize {
        match self {
            Self::Ltr => physical,
            Self::Rtl => -physical,
        }
    }
}

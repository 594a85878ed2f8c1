#![forbid(unsafe_code)]

//! Logging and tracing support.
//!
//! With the `tracing` feature `trace!` is the real `tracing` macro. Without
//! it the macro expands to nothing, so gesture and frame code can log
//! unconditionally through `crate::trace!`.

#[cfg(feature = "tracing")]
pub use tracing::trace;

#[cfg(not(feature = "tracing"))]
mod noop_macros {
    /// No-op trace macro when tracing is disabled.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }
}

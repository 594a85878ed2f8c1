#![forbid(unsafe_code)]

//! Core: row identity, reading direction, text normalization, pointer
//! gesture sessions and animation-frame throttling.

pub mod direction;
pub mod frame;
pub mod gesture;
pub mod logging;
pub mod row;
pub mod text;

pub use direction::ReadingDirection;
pub use frame::{FrameRequest, FrameThrottle, FrameToken};
pub use gesture::{GestureSession, GestureSlot, NoCapture, PointerCapture, PointerId};
pub use row::{Row, RowId};

// Re-export the tracing macro at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::trace;

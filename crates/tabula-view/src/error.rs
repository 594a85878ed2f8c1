#![forbid(unsafe_code)]

//! Errors from parsing declarative view configuration.
//!
//! The coordinator never hands these to its caller: it logs them and falls
//! back to "as if unset". They are public so hosts that validate input up
//! front (a settings form, a saved-view importer) can report them.

use std::fmt;

/// Malformed declarative input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Payload is not valid JSON, or not the expected JSON shape.
    InvalidJson(String),
    /// A filter rule entry could not be understood.
    InvalidRule {
        /// Position of the entry in the rules array.
        position: usize,
        /// What was wrong with it.
        reason: String,
    },
    /// A pin specification segment could not be understood.
    InvalidPinSpec(String),
    /// An attribute expected a number.
    InvalidNumber {
        /// Attribute name.
        attribute: String,
        /// Offending value.
        value: String,
    },
    /// Saved view state was written by an incompatible version.
    VersionMismatch {
        /// Version found in the payload.
        stored: u32,
        /// Version this build understands.
        expected: u32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson(msg) => write!(f, "invalid JSON: {msg}"),
            Self::InvalidRule { position, reason } => {
                write!(f, "invalid filter rule at {position}: {reason}")
            }
            Self::InvalidPinSpec(segment) => write!(f, "invalid pin spec segment: {segment:?}"),
            Self::InvalidNumber { attribute, value } => {
                write!(f, "attribute {attribute} expects a number, got {value:?}")
            }
            Self::VersionMismatch { stored, expected } => {
                write!(f, "view state version {stored} (expected {expected})")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidJson(err.to_string())
    }
}

/// Result type for configuration parsing.
pub type ConfigResult<T> = Result<T, ConfigError>;

//! Error types for data parsing in stumbler-types.

use thiserror::Error;

/// Errors that can occur when parsing observation data.
///
/// This error type is platform-agnostic and does not include
/// hardware-specific errors (those belong in stumbler-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// The BSSID text does not contain exactly twelve hex digits.
    #[error("Invalid BSSID '{input}': {reason}")]
    InvalidBssid {
        /// The raw text that failed to parse.
        input: String,
        /// What was wrong with it.
        reason: &'static str,
    },
}

/// Result type alias using stumbler-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

//! Error types for stumbler-core.
//!
//! Scanning itself never fails from the caller's point of view: hardware and
//! preference failures are logged and degrade to `FixLost` or
//! `RadioDisabled` status. The errors below surface from the collaborator
//! traits (so that implementations can report what went wrong), from
//! configuration loading, and from starting a scanner outside a tokio runtime.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the scanning core and its collaborators.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A BSSID could not be canonicalized.
    #[error(transparent)]
    InvalidBssid(#[from] stumbler_types::ParseError),

    /// A hardware operation was refused or failed.
    #[error("Hardware operation '{operation}' failed: {message}")]
    Hardware {
        /// The operation that failed (e.g. `request_updates`).
        operation: &'static str,
        /// Description from the hardware layer.
        message: String,
    },

    /// The radio scan lock could not be acquired.
    #[error("Radio lock unavailable: {0}")]
    RadioLock(String),

    /// Preferences could not be read.
    #[error("Preferences unavailable: {0}")]
    Preferences(String),

    /// The configuration file could not be read.
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        /// The path that was read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse config {path}: {source}")]
    ConfigParse {
        /// The path that was parsed.
        path: PathBuf,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// The configuration is syntactically valid but semantically wrong.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A scanner was started outside a tokio runtime.
    #[error("No tokio runtime available to drive the scan timer")]
    NoRuntime,
}

impl Error {
    /// Create a hardware error.
    pub fn hardware(operation: &'static str, message: impl Into<String>) -> Self {
        Error::Hardware {
            operation,
            message: message.into(),
        }
    }
}

/// Result type alias using stumbler-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hardware_error_display() {
        let err = Error::hardware("request_updates", "permission revoked");
        assert_eq!(
            err.to_string(),
            "Hardware operation 'request_updates' failed: permission revoked"
        );
    }

    #[test]
    fn test_invalid_bssid_is_transparent() {
        let parse = stumbler_types::Bssid::parse("nope").unwrap_err();
        let err: Error = parse.clone().into();
        assert_eq!(err.to_string(), parse.to_string());
    }

    #[test]
    fn test_no_runtime_display() {
        assert!(Error::NoRuntime.to_string().contains("tokio runtime"));
    }
}

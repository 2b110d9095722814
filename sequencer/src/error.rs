//! Error types for the sequence generator
//!
//! # Error Categories
//!
//! - Configuration errors: missing table entries, invalid profile descriptors
//! - Lookup misses: catalog key absent or catalog unavailable (always recovered)
//! - Input errors: the operator's input channel closed or failed
//! - Session errors: anything that aborts the whole session

use std::path::PathBuf;
use thiserror::Error;

/// A combination of equipment and filter that the parameter tables do not
/// cover, or a configuration file that could not be used.
///
/// These are latent defects rather than operator mistakes, so the session
/// aborts instead of falling back to a default.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("No capture parameters for filter {filter} on profile '{profile}'")]
    UnsupportedFilter {
        profile: String,
        filter: String,
    },

    #[error("Profile '{profile}' has no SharpCap profile name for filter {filter}")]
    MissingProfileName {
        profile: String,
        filter: String,
    },

    #[error("Profile '{profile}' has no wheel position for filter {filter}")]
    MissingWheelPosition {
        profile: String,
        filter: String,
    },

    #[error("Profile '{0}' does not define any filters")]
    EmptyProfile(String),

    #[error("No equipment profiles are configured")]
    NoProfiles,

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        field: String,
        reason: String,
    },

    #[error("Failed to read configuration {path}: {reason}")]
    Unreadable {
        path: PathBuf,
        reason: String,
    },

    #[error("Failed to parse configuration {path}: {reason}")]
    Malformed {
        path: PathBuf,
        reason: String,
    },
}

/// Why a catalog lookup did not produce coordinates.
///
/// Never surfaced as a hard failure: the resolver reports it and falls back
/// to manual entry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupMiss {
    #[error("'{0}' was not found in the catalog")]
    NotFound(String),

    #[error("Catalog {path} is unavailable: {reason}")]
    Unavailable {
        path: PathBuf,
        reason: String,
    },
}

/// Failures of the operator input channel
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    /// End of input reached before the session finished
    #[error("Input closed while waiting for: {0}")]
    Closed(String),

    #[error("Failed to read input: {0}")]
    Io(String),
}

/// Failures of the output sink
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SinkError {
    #[error("Sequence has already been written")]
    AlreadyWritten,

    #[error("Failed to write sequence to {path}: {reason}")]
    Io {
        path: PathBuf,
        reason: String,
    },
}

/// Anything that aborts a generation session.
///
/// When a session aborts, the partially built script is dropped and the
/// sink is never written.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_display() {
        let err = ConfigurationError::UnsupportedFilter {
            profile: "Towa 339".to_string(),
            filter: "D1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No capture parameters for filter D1 on profile 'Towa 339'"
        );
    }

    #[test]
    fn test_session_error_is_transparent() {
        let err: SessionError = InputError::Closed("target name".to_string()).into();
        assert_eq!(err.to_string(), "Input closed while waiting for: target name");
    }
}

//! # Error Handling Module
//!
//! This module provides error handling for the reconciler using the `thiserror` crate.
//! It defines one variant per failure class named in the error taxonomy: fleet provider
//! failures, configuration store read/write failures, scheduler failures, and startup
//! configuration problems.
//!
//! The taxonomy exists so the *policy* for each failure can be decided per call site
//! instead of inside a blanket `catch`: the maintenance driver absorbs provider and
//! store errors (they are recovered by the next pass), while scheduler errors are
//! propagated because a lost reschedule has no self-healing path.

use thiserror::Error;

/// Main result type used throughout the reconciler
///
/// Type alias so call sites can write `ReconcilerResult<T>` instead of
/// `Result<T, ReconcilerError>`.
pub type ReconcilerResult<T> = Result<T, ReconcilerError>;

/// Error types for the reconciler and its adapters
///
/// Each variant represents a different failure class. The `#[error("...")]`
/// attribute from `thiserror` implements `Display` with the given message.
/// All variants carry owned `String` payloads so the enum stays `Clone`.
#[derive(Debug, Error, Clone)]
pub enum ReconcilerError {
    /// Configuration file or validation errors (surfaced at startup, fail fast)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The fleet membership provider cannot be queried (platform context
    /// unavailable, metadata endpoint down, DNS failure, timeout)
    #[error("Fleet provider unavailable: {message}")]
    ProviderUnavailable { message: String },

    /// The configured address set could not be read from the store
    #[error("Configured set read failed: {message}")]
    ConfigRead { message: String },

    /// The configured address set could not be written to the store
    #[error("Configured set write failed: {message}")]
    ConfigWrite { message: String },

    /// Scheduler task lookup/create/delete/commit failure
    #[error("Scheduler operation failed: {message}")]
    Scheduler { message: String },

    /// An instance address that is not a valid `http(s)://host/` URL
    #[error("Invalid instance address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// I/O errors (config files, store files)
    #[error("I/O error: {message}")]
    Io { message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json { message: String },

    /// YAML parsing errors for configuration files
    #[error("YAML error: {message}")]
    Yaml { message: String },

    /// HTTP client errors not already mapped to a domain variant
    #[error("HTTP error: {message}")]
    Http { message: String },
}

impl ReconcilerError {
    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a fleet provider error with a custom message
    pub fn provider_unavailable<S: Into<String>>(message: S) -> Self {
        Self::ProviderUnavailable {
            message: message.into(),
        }
    }

    /// Create a store read error with a custom message
    pub fn config_read<S: Into<String>>(message: S) -> Self {
        Self::ConfigRead {
            message: message.into(),
        }
    }

    /// Create a store write error with a custom message
    pub fn config_write<S: Into<String>>(message: S) -> Self {
        Self::ConfigWrite {
            message: message.into(),
        }
    }

    /// Create a scheduler error with a custom message
    pub fn scheduler<S: Into<String>>(message: S) -> Self {
        Self::Scheduler {
            message: message.into(),
        }
    }

    /// Create an invalid address error
    pub fn invalid_address<S: Into<String>>(address: S, reason: S) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            reason: reason.into(),
        }
    }

    /// Check if the maintenance driver absorbs this error
    ///
    /// Absorbed errors are logged and counted but never raised past the pass:
    /// the provider and store are re-queried from scratch on the next pass, so
    /// a transient failure self-corrects. Everything else must be surfaced.
    pub fn is_absorbed(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable { .. } | Self::ConfigRead { .. } | Self::ConfigWrite { .. }
        )
    }

    /// Get a string representation of the error class for metric labels
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration_error",
            Self::ProviderUnavailable { .. } => "provider_unavailable",
            Self::ConfigRead { .. } => "config_read_error",
            Self::ConfigWrite { .. } => "config_write_error",
            Self::Scheduler { .. } => "scheduler_error",
            Self::InvalidAddress { .. } => "invalid_address",
            Self::Io { .. } => "io_error",
            Self::Json { .. } => "json_error",
            Self::Yaml { .. } => "yaml_error",
            Self::Http { .. } => "http_error",
        }
    }
}

/// Implement conversion from std::io::Error
impl From<std::io::Error> for ReconcilerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

/// Implement conversion from serde_json::Error
impl From<serde_json::Error> for ReconcilerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
        }
    }
}

/// Implement conversion from serde_yaml::Error
impl From<serde_yaml::Error> for ReconcilerError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml {
            message: err.to_string(),
        }
    }
}

/// Implement conversion from reqwest::Error
impl From<reqwest::Error> for ReconcilerError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http {
            message: err.to_string(),
        }
    }
}

//! Unified error type for the orchestrator.
//!
//! Every component funnels its failures into [`Error`]. The variants follow the
//! failure taxonomy callers need to tell apart: bad provider configuration,
//! unknown presets or jobs, remote transport failures (always wrapped with the
//! operation being attempted), and local/remote divergence after a partially
//! completed multi-step mutation.

use std::fmt;

/// Boxed error used as the source of remote and database failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Unified error type covering all failure modes in the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Provider configuration is missing or incomplete. Fatal at factory
    /// construction and never retried.
    #[error("invalid {provider} configuration: {message}")]
    Configuration {
        /// Provider whose configuration was rejected.
        provider: String,
        /// What is missing or wrong.
        message: String,
    },

    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "job", "preset summary", "provider").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// A preset cannot be used with the target provider.
    #[error("preset not found: {preset} has no {provider} mapping")]
    PresetNotFound {
        /// Name of the offending preset.
        preset: String,
        /// Provider the preset was submitted to.
        provider: String,
    },

    /// A remote API call failed. `context` names the operation.
    #[error("{context}: {source}")]
    Remote {
        /// The operation being attempted, e.g. "creating the video config".
        context: String,
        /// The underlying transport or API error.
        source: BoxError,
    },

    /// Local and remote state diverged after a partial multi-step mutation.
    #[error("inconsistent state after {operation}: {detail}")]
    Inconsistency {
        /// The multi-step operation that was interrupted.
        operation: String,
        /// What exists on which side.
        detail: String,
    },

    /// A conflicting resource already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Request data failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// The caller's deadline elapsed before the operation completed.
    #[error("timed out {0}")]
    Timeout(String),

    /// A provider reported itself as unhealthy.
    #[error("{0}")]
    Unhealthy(String),

    /// A database operation failed.
    #[error("database error: {source}")]
    Database {
        /// The underlying database error.
        source: BoxError,
    },

    /// Catch-all for unexpected internal errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } | Error::PresetNotFound { .. } => 404,
            Error::Validation(_) => 400,
            Error::Conflict(_) => 409,
            Error::Configuration { .. }
            | Error::Remote { .. }
            | Error::Inconsistency { .. }
            | Error::Timeout(_)
            | Error::Unhealthy(_)
            | Error::Database { .. }
            | Error::Internal(_) => 503,
        }
    }

    /// Whether this error is safe to show verbatim to an API caller.
    pub fn is_caller_facing(&self) -> bool {
        matches!(
            self,
            Error::NotFound { .. }
                | Error::PresetNotFound { .. }
                | Error::Validation(_)
                | Error::Conflict(_)
        )
    }

    /// Convenience constructor for [`Error::Configuration`].
    pub fn configuration(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Configuration {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::PresetNotFound`].
    pub fn preset_not_found(preset: impl Into<String>, provider: impl Into<String>) -> Self {
        Error::PresetNotFound {
            preset: preset.into(),
            provider: provider.into(),
        }
    }

    /// Convenience constructor for [`Error::Remote`].
    pub fn remote(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::Remote {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::Inconsistency`].
    pub fn inconsistency(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::Inconsistency {
            operation: operation.into(),
            detail: detail.into(),
        }
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database(source: impl Into<BoxError>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }

    /// Returns `true` for a [`Error::NotFound`] of any entity.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Attach the attempted operation to a failed remote call.
///
/// ```
/// use orchestrator_common::{Error, RemoteContext};
///
/// let failed: Result<(), std::io::Error> =
///     Err(std::io::Error::other("connection reset"));
/// let err = failed.remote_context("creating the video config").unwrap_err();
/// assert_eq!(err.to_string(), "creating the video config: connection reset");
/// assert!(matches!(err, Error::Remote { .. }));
/// ```
pub trait RemoteContext<T> {
    /// Wrap the error as [`Error::Remote`] with a fixed context string.
    fn remote_context(self, context: impl Into<String>) -> Result<T>;

    /// Wrap the error as [`Error::Remote`] with a lazily built context string.
    fn with_remote_context<C, F>(self, f: F) -> Result<T>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T, E> RemoteContext<T> for std::result::Result<T, E>
where
    E: Into<BoxError>,
{
    fn remote_context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::remote(context, e))
    }

    fn with_remote_context<C, F>(self, f: F) -> Result<T>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::remote(f(), e))
    }
}

//! # Error Types
//!
//! Typed failures surfaced by the derivation, reconciliation and publication
//! layers. Every variant is returned to the caller as a value; nothing in this
//! crate terminates the process on its own.
//!
//! | Category           | Type                                  |
//! |--------------------|---------------------------------------|
//! | Input-incomplete   | [`InputError`]                        |
//! | Validation         | [`ValidationError`]                   |
//! | Remote-operation   | [`RemoteError`]                       |
//! | Partial-completion | [`SyncError::Partial`], [`PublishError::Partial`] |

use http::StatusCode;
use std::fmt;
use thiserror::Error;

use crate::config::EnvironmentName;
use crate::reconcile::OperationKind;

/// A single missing or empty required field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted field path, e.g. `atoms.entity` or `environments.uat1.targetServer.host`
    pub field: String,
    /// Human-readable reason
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        FieldError::new(field, "required value is missing")
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Required atoms or fields are missing; derivation refuses to proceed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} required field(s) missing: {}", .fields.len(), join_display(.fields))]
pub struct InputError {
    pub fields: Vec<FieldError>,
}

impl InputError {
    /// Returns `Ok(())` when no field errors were collected.
    pub fn check(fields: Vec<FieldError>) -> Result<(), InputError> {
        if fields.is_empty() {
            Ok(())
        } else {
            Err(InputError { fields })
        }
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.field.as_str()).collect()
    }
}

/// What kind of rule an entry collection violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    DuplicateName,
    InvalidName,
    OversizedValue,
    TooManyEntries,
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValidationKind::DuplicateName => "duplicate_name",
            ValidationKind::InvalidName => "invalid_name",
            ValidationKind::OversizedValue => "oversized_value",
            ValidationKind::TooManyEntries => "too_many_entries",
        };
        f.write_str(s)
    }
}

/// One offending entry (or the collection itself for [`ValidationKind::TooManyEntries`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub kind: ValidationKind,
    /// Entry name the issue refers to; empty for collection-level issues
    pub name: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(kind: ValidationKind, name: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            kind,
            name: name.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "[{}] {}", self.kind, self.message)
        } else {
            write!(f, "[{}] {}: {}", self.kind, self.name, self.message)
        }
    }
}

/// An entry collection was rejected before any side effect.
///
/// Carries the complete set of offending entries, never just the first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} validation issue(s): {}", .issues.len(), join_display(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
    /// Number of entries whose name appears more than once
    pub duplicate_count: usize,
}

impl ValidationError {
    /// Distinct duplicated names, in order of first appearance.
    pub fn duplicate_names(&self) -> Vec<&str> {
        self.issues
            .iter()
            .filter(|i| i.kind == ValidationKind::DuplicateName)
            .map(|i| i.name.as_str())
            .collect()
    }

    pub fn has_kind(&self, kind: ValidationKind) -> bool {
        self.issues.iter().any(|i| i.kind == kind)
    }
}

/// Classification of a failed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    Authentication,
    Authorization,
    NotFound,
    Conflict,
    RateLimited,
    Network,
    Unknown,
}

impl RemoteErrorKind {
    /// Map a non-success HTTP status to its failure class.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => RemoteErrorKind::Authentication,
            StatusCode::FORBIDDEN => RemoteErrorKind::Authorization,
            StatusCode::NOT_FOUND => RemoteErrorKind::NotFound,
            StatusCode::CONFLICT
            | StatusCode::PRECONDITION_FAILED
            | StatusCode::UNPROCESSABLE_ENTITY => RemoteErrorKind::Conflict,
            StatusCode::TOO_MANY_REQUESTS => RemoteErrorKind::RateLimited,
            _ => RemoteErrorKind::Unknown,
        }
    }

    /// What the user should do about it.
    pub fn hint(&self) -> &'static str {
        match self {
            RemoteErrorKind::Authentication => {
                "credentials were rejected; refresh the access token and retry"
            }
            RemoteErrorKind::Authorization => {
                "the account lacks permission for this resource; check its role or scopes"
            }
            RemoteErrorKind::NotFound => {
                "the target does not exist; check the organization, repository or map name"
            }
            RemoteErrorKind::Conflict => {
                "the remote state changed concurrently; reload it before pushing again"
            }
            RemoteErrorKind::RateLimited => "the remote API is throttling requests; wait before retrying",
            RemoteErrorKind::Network => "the remote service could not be reached; check connectivity",
            RemoteErrorKind::Unknown => "the remote service returned an unexpected response",
        }
    }
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RemoteErrorKind::Authentication => "authentication",
            RemoteErrorKind::Authorization => "authorization",
            RemoteErrorKind::NotFound => "not-found",
            RemoteErrorKind::Conflict => "conflict",
            RemoteErrorKind::RateLimited => "rate-limited",
            RemoteErrorKind::Network => "network",
            RemoteErrorKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A remote call failed. Never retried by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} failure{}: {message} ({})", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default(), .kind.hint())]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        RemoteError {
            kind,
            status: None,
            message: message.into(),
        }
    }

    /// Build from a non-2xx response status.
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        RemoteError {
            kind: RemoteErrorKind::from_status(status),
            status: Some(status.as_u16()),
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        RemoteError::new(RemoteErrorKind::Network, message)
    }
}

/// Per-kind completion counts of a reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationCounts {
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl OperationCounts {
    pub fn record(&mut self, kind: OperationKind) {
        match kind {
            OperationKind::Added => self.added += 1,
            OperationKind::Updated => self.updated += 1,
            OperationKind::Deleted => self.deleted += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.added + self.updated + self.deleted
    }
}

impl fmt::Display for OperationCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} updated, {} deleted",
            self.added, self.updated, self.deleted
        )
    }
}

/// Failure of a secret-store synchronization run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The new collection was rejected before any remote call.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Listing the remote entries failed before any write.
    #[error("could not list remote entries of '{container}': {source}")]
    Listing {
        container: String,
        #[source]
        source: RemoteError,
    },
    /// Some operations were applied before one failed. Completed work is not rolled back.
    #[error("sync of '{container}' stopped after {completed}: {kind} of '{entry}' failed: {source}")]
    Partial {
        container: String,
        completed: OperationCounts,
        kind: OperationKind,
        entry: String,
        #[source]
        source: RemoteError,
    },
}

/// Failure of a bundle publication run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("connection test against the remote repository failed")]
    ConnectionFailed,
    #[error("remote repository setup failed: {0}")]
    Setup(#[source] RemoteError),
    /// Earlier batches stay pushed; `completed` counts their files per kind.
    #[error("publication stopped after {batches_completed}/{total_batches} batch(es), {files_pushed} file(s) pushed ({completed}): {source}")]
    Partial {
        batches_completed: usize,
        total_batches: usize,
        files_pushed: usize,
        completed: OperationCounts,
        #[source]
        source: RemoteError,
    },
}

/// Failure of artifact generation.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Input(#[from] InputError),
    /// A stage's secret map holds entries that could never be stored remotely.
    #[error("secret map '{map}' in {env} is invalid: {source}")]
    Validation {
        env: EnvironmentName,
        map: String,
        #[source]
        source: ValidationError,
    },
    #[error("artifact path '{0}' generated twice")]
    PathCollision(String),
    #[error("template rendering failed for '{path}': {source}")]
    Render {
        path: String,
        #[source]
        source: askama::Error,
    },
    #[error("serializing '{path}' failed: {source}")]
    Serialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

fn join_display<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(
            RemoteErrorKind::from_status(StatusCode::UNAUTHORIZED),
            RemoteErrorKind::Authentication
        );
        assert_eq!(
            RemoteErrorKind::from_status(StatusCode::FORBIDDEN),
            RemoteErrorKind::Authorization
        );
        assert_eq!(
            RemoteErrorKind::from_status(StatusCode::NOT_FOUND),
            RemoteErrorKind::NotFound
        );
        assert_eq!(
            RemoteErrorKind::from_status(StatusCode::CONFLICT),
            RemoteErrorKind::Conflict
        );
        assert_eq!(
            RemoteErrorKind::from_status(StatusCode::TOO_MANY_REQUESTS),
            RemoteErrorKind::RateLimited
        );
        assert_eq!(
            RemoteErrorKind::from_status(StatusCode::BAD_GATEWAY),
            RemoteErrorKind::Unknown
        );
    }

    #[test]
    fn test_remote_error_message_is_actionable() {
        let err = RemoteError::from_status(StatusCode::TOO_MANY_REQUESTS, "PUT entry a");
        let text = err.to_string();
        assert!(text.contains("rate-limited"));
        assert!(text.contains("HTTP 429"));
        assert!(text.contains("wait before retrying"));
    }

    #[test]
    fn test_input_error_lists_every_field() {
        let err = InputError::check(vec![
            FieldError::missing("atoms.entity"),
            FieldError::missing("atoms.version"),
        ])
        .unwrap_err();
        assert_eq!(err.field_names(), vec!["atoms.entity", "atoms.version"]);
        let text = err.to_string();
        assert!(text.starts_with("2 required field(s) missing"));
        assert!(text.contains("atoms.version"));
    }

    #[test]
    fn test_counts_display() {
        let mut counts = OperationCounts::default();
        counts.record(OperationKind::Added);
        counts.record(OperationKind::Deleted);
        assert_eq!(counts.total(), 2);
        assert_eq!(counts.to_string(), "1 added, 0 updated, 1 deleted");
    }
}

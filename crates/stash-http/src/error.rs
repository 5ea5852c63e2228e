//! Error types for the cache loader.

use std::fmt;

/// Workflow phase an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Reading local metadata and body.
    Read,
    /// Conditional HTTP fetch.
    Fetch,
    /// Persisting metadata and body.
    Write,
    /// Removing a cache entry.
    Remove,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Fetch => write!(f, "fetch"),
            Self::Write => write!(f, "write"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

/// One of the two on-disk artifacts of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Body,
    Info,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Body => write!(f, "body"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// Coarse failure classes used to decide between recovery and rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedLocalState,
    StaleOrUnsatisfactoryMetadata,
    CorruptBody,
    EmptyArtifact,
    RemoteFailure,
    IoFailure,
    Config,
}

/// Cache errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// Metadata file present but undecodable.
    #[error("malformed cache info at {path}: {reason}")]
    MalformedInfo { path: String, reason: String },

    /// Metadata decodes but belongs to another request.
    #[error("cache info {field} mismatch: expected {expected}, found {found}")]
    InfoMismatch {
        field: &'static str,
        expected: String,
        found: String,
    },

    /// Metadata missing, schema-invalid or stale.
    #[error("cache info unsatisfactory for {key}: {reason}")]
    Unsatisfactory { key: String, reason: String },

    /// Body bytes do not match the recorded checksum.
    #[error("checksum mismatch for {key}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        key: String,
        expected: String,
        actual: String,
    },

    /// Zero-length body or metadata, on read or about to be written.
    #[error("{phase}: refusing empty {artifact} file {path}")]
    EmptyArtifact {
        phase: Phase,
        artifact: Artifact,
        path: String,
    },

    /// Remote answered outside `[200, 400)`.
    #[error("unexpected status code: {status} on {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// Remote answer violates the expected flow (e.g. 304 without a local copy).
    #[error("flow error: {message} on {url}")]
    Flow { url: String, message: String },

    /// Transport failure.
    #[error("network error: {message}")]
    Network { message: String },

    /// Filesystem failure.
    #[error("{phase}: io error on {path}: {message}")]
    Io {
        phase: Phase,
        path: String,
        message: String,
    },

    /// Neither the local cache nor the remote produced a body.
    #[error("no result body: {url}{}", describe_cause(.cause))]
    NoResultBody {
        url: String,
        cause: Option<Box<CacheError>>,
    },

    /// Invalid request or store configuration.
    #[error("configuration error: {message}")]
    Config { message: String },
}

fn describe_cause(cause: &Option<Box<CacheError>>) -> String {
    cause
        .as_ref()
        .map(|c| format!(" ({})", c))
        .unwrap_or_default()
}

impl CacheError {
    pub(crate) fn io(phase: Phase, path: &std::path::Path, err: impl fmt::Display) -> Self {
        Self::Io {
            phase,
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    /// Failure class.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedInfo { .. } | Self::InfoMismatch { .. } => {
                ErrorKind::MalformedLocalState
            }
            Self::Unsatisfactory { .. } => ErrorKind::StaleOrUnsatisfactoryMetadata,
            Self::ChecksumMismatch { .. } => ErrorKind::CorruptBody,
            Self::EmptyArtifact { .. } => ErrorKind::EmptyArtifact,
            Self::UnexpectedStatus { .. } | Self::Flow { .. } | Self::Network { .. } => {
                ErrorKind::RemoteFailure
            }
            Self::Io { .. } => ErrorKind::IoFailure,
            Self::NoResultBody { cause, .. } => cause
                .as_ref()
                .map(|c| c.kind())
                .unwrap_or(ErrorKind::RemoteFailure),
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    /// Whether the failure only means "no usable local copy".
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::MalformedLocalState
                | ErrorKind::StaleOrUnsatisfactoryMetadata
                | ErrorKind::CorruptBody
        )
    }

    /// Exit code for CLI wrappers.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Config => 1,
            ErrorKind::RemoteFailure => 2,
            ErrorKind::CorruptBody | ErrorKind::MalformedLocalState => 3,
            ErrorKind::StaleOrUnsatisfactoryMetadata | ErrorKind::EmptyArtifact => 4,
            ErrorKind::IoFailure => 5,
        }
    }
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_result_body_inherits_cause_kind() {
        let err = CacheError::NoResultBody {
            url: "https://example.com/a".to_string(),
            cause: Some(Box::new(CacheError::ChecksumMismatch {
                key: "a".to_string(),
                expected: "sha256:00".to_string(),
                actual: "sha256:11".to_string(),
            })),
        };
        assert_eq!(err.kind(), ErrorKind::CorruptBody);
        assert!(err.to_string().contains("checksum mismatch"));

        let bare = CacheError::NoResultBody {
            url: "https://example.com/a".to_string(),
            cause: None,
        };
        assert_eq!(bare.kind(), ErrorKind::RemoteFailure);
        assert_eq!(bare.to_string(), "no result body: https://example.com/a");
    }

    #[test]
    fn recoverable_classes() {
        let stale = CacheError::Unsatisfactory {
            key: "k".to_string(),
            reason: "stale".to_string(),
        };
        let empty = CacheError::EmptyArtifact {
            phase: Phase::Write,
            artifact: Artifact::Body,
            path: "/tmp/k.raw".to_string(),
        };
        let status = CacheError::UnexpectedStatus {
            status: 500,
            url: "https://example.com".to_string(),
        };
        assert!(stale.is_recoverable());
        assert!(!empty.is_recoverable());
        assert!(!status.is_recoverable());
        assert_eq!(
            empty.to_string(),
            "write: refusing empty body file /tmp/k.raw"
        );
    }
}

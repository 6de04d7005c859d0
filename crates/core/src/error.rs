//! Unified error types for dotgraph.
//!
//! Display strings carry a stable upper-case code prefix so log lines can be
//! grouped by failure class.

use tokio_rusqlite::rusqlite;

/// Unified error types for the fetch, cache and graph layers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty URL, unknown attribute key).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Fingerprint is not a well-formed digest.
    #[error("CACHE_ERROR: invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Blob store I/O failed.
    #[error("BLOB_ERROR: {0}")]
    Blob(#[from] std::io::Error),

    /// Network-level failure (connection reset, DNS, ...).
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Non-success HTTP status.
    #[error("HTTP_ERROR: status {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// Payload could not be decoded into a typed record.
    #[error("DECODE_FAILED: {0}")]
    Decode(String),

    /// Match-mode upsert target (or edge endpoint) does not exist.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// Graph store failure.
    #[error("GRAPH_ERROR: {0}")]
    Graph(String),

    /// The crawl was cancelled before this fetch was admitted.
    #[error("CANCELLED")]
    Cancelled,
}

impl Error {
    /// Whether retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Network(_) | Error::FetchTimeout(_) | Error::Blob(_) => true,
            Error::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            Error::Database(tokio_rusqlite::Error::Error(e)) => matches!(
                e.sqlite_error_code(),
                Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
            ),
            _ => false,
        }
    }

    /// Whether the error means a backing store is unusable as a whole.
    ///
    /// The crawl stops admitting new work when it sees one of these.
    pub fn is_systemic(&self) -> bool {
        matches!(self, Error::Database(_) | Error::MigrationFailed(_) | Error::Graph(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<neo4rs::Error> for Error {
    fn from(err: neo4rs::Error) -> Self {
        Error::Graph(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("Person/abc123".to_string());
        assert!(err.to_string().contains("NOT_FOUND"));
        assert!(err.to_string().contains("abc123"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(Error::Network("reset".into()).is_transient());
        assert!(Error::FetchTimeout("slow".into()).is_transient());
        assert!(Error::HttpStatus { status: 503, url: "https://x/".into() }.is_transient());
        assert!(Error::HttpStatus { status: 429, url: "https://x/".into() }.is_transient());
        assert!(!Error::HttpStatus { status: 404, url: "https://x/".into() }.is_transient());
        assert!(!Error::Decode("bad json".into()).is_transient());
        assert!(!Error::NotFound("x".into()).is_transient());
    }

    #[test]
    fn test_disk_errors_transient() {
        assert!(Error::Blob(std::io::Error::other("EIO")).is_transient());

        let busy = rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY), None);
        assert!(Error::from(busy).is_transient());

        let corrupt = rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CORRUPT), None);
        let corrupt = Error::from(corrupt);
        assert!(!corrupt.is_transient());
        assert!(corrupt.is_systemic());
    }

    #[test]
    fn test_systemic_classification() {
        assert!(Error::Graph("connection refused".into()).is_systemic());
        assert!(Error::MigrationFailed("boom".into()).is_systemic());
        assert!(!Error::Decode("bad".into()).is_systemic());
        assert!(!Error::NotFound("x".into()).is_systemic());
    }
}

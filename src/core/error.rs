//! Typed error handling for the ticket service
//!
//! Every failure surfaced by the query pipeline, the repositories and the
//! service layer is an [`Error`]. The set of kinds is closed (see
//! [`ErrorKind`]) so callers can branch on them structurally instead of
//! inspecting concrete types at runtime.
//!
//! Layers add context with [`ResultExt::context`]. Wrapping never changes
//! the kind: a `NotFound` raised by a repository is still a `NotFound` after
//! the service has wrapped it twice.
//!
//! # Example
//!
//! ```rust,ignore
//! use ticket::core::error::{Error, ErrorKind, ResultExt};
//!
//! let result = repository.read(&mut tx, &id).await.context("read ticket failed");
//! match result {
//!     Err(e) if e.kind() == ErrorKind::NotFound => println!("no such ticket"),
//!     Err(e) => eprintln!("other error: {}", e),
//!     Ok(t) => println!("found {}", t.metadata.id),
//! }
//! ```

use std::fmt;

/// Boxed cause for failures coming from the storage/transport layer.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used across the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The closed set of error kinds surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The query string failed to parse or failed capability validation
    Query,
    /// Entity validation failed or a referenced identifier is malformed
    Request,
    /// No row matched the requested identifier
    NotFound,
    /// Optimistic version check failed
    Conflict,
    /// The authorization check refused the operation
    Unauthorized,
    /// Anything from the transaction/connection layer
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Query => "query",
            ErrorKind::Request => "request",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The main error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Query string could not be parsed or validated
    #[error("{0}")]
    Query(String),

    /// Request payload or identifier is invalid
    #[error("{0}")]
    Request(String),

    /// Target entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// Entity was modified or removed by another party
    #[error("{0}")]
    Conflict(String),

    /// Operation not permitted for the caller
    #[error("{0}")]
    Unauthorized(String),

    /// Storage, transaction or other system failure
    #[error("{context}: {source}")]
    Internal {
        context: &'static str,
        #[source]
        source: BoxError,
    },

    /// Another error with added operation context
    #[error("{context}: {source}")]
    Context {
        context: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn query(message: impl Into<String>) -> Self {
        Error::Query(message.into())
    }

    pub fn request(message: impl Into<String>) -> Self {
        Error::Request(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Error::Conflict(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Error::Unauthorized(message.into())
    }

    /// Wrap a system failure with a static description of the failed step
    pub fn internal(context: &'static str, source: impl Into<BoxError>) -> Self {
        Error::Internal {
            context,
            source: source.into(),
        }
    }

    /// Add a static context string, keeping the kind
    pub fn wrap(self, context: &'static str) -> Self {
        Error::Context {
            context,
            source: Box::new(self),
        }
    }

    /// The kind of the innermost classified error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Query(_) => ErrorKind::Query,
            Error::Request(_) => ErrorKind::Request,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::Unauthorized(_) => ErrorKind::Unauthorized,
            Error::Internal { .. } => ErrorKind::Internal,
            Error::Context { source, .. } => source.kind(),
        }
    }

    /// The innermost error, with all context layers removed
    pub fn root(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Extension for adding context to fallible results
pub trait ResultExt<T> {
    fn context(self, context: &'static str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: &'static str) -> Result<T> {
        self.map_err(|e| e.wrap(context))
    }
}

use thiserror::Error;

/// Coarse classification of a backend failure.
///
/// Backend adapters fold their SDK's error types into one of these kinds so
/// the core never has to know a concrete driver's exception taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// The backend rejected the request as malformed.
    BadRequest,
    /// The addressed object does not exist.
    NotFound,
    /// The transaction or request was aborted by the backend.
    Aborted,
    /// The backend could not be reached or is temporarily down.
    Unavailable,
    /// Anything the adapter could not classify more precisely.
    Other,
}

impl BackendErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BackendErrorKind::BadRequest => "bad request",
            BackendErrorKind::NotFound => "not found",
            BackendErrorKind::Aborted => "aborted",
            BackendErrorKind::Unavailable => "unavailable",
            BackendErrorKind::Other => "other",
        }
    }
}

impl std::fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum SqlBridgeError {
    /// A statement text used both `?` and `:name`/`@name` placeholders.
    /// Raised at translation time, before anything touches the backend.
    #[error("statement '{sql}' cannot use both named and positional parameters")]
    MixedParameters { sql: String },

    /// The supplied positional values do not match the number of `?` slots.
    /// `sql` carries the statement with generated names rewritten back to `?`.
    #[error("statement '{sql}' expects exactly {expected} parameter(s), {actual} found")]
    ParameterCountMismatch {
        sql: String,
        expected: usize,
        actual: usize,
    },

    /// A fetch was requested with an orientation code outside the known set.
    #[error("unknown cursor orientation {code}")]
    InvalidCursorOrientation { code: i32 },

    /// A failure surfaced by the backend adapter, tagged with its kind.
    #[error("backend error ({kind}): {message}")]
    Backend {
        kind: BackendErrorKind,
        message: String,
    },

    /// The operation has no meaningful backend equivalent. Always fails
    /// immediately and deterministically, never partially executes.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

impl SqlBridgeError {
    /// Shorthand for a kind-tagged backend failure.
    #[must_use]
    pub fn backend(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        SqlBridgeError::Backend {
            kind,
            message: message.into(),
        }
    }
}

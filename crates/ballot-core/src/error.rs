use std::fmt;

use crate::model::ItemId;

/// Machine-readable error codes shared by the HTTP layer and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    UnknownItem,
    MalformedRequest,
    EmptyCatalog,
    StorageUnavailable,
    SchemaTooNew,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::UnknownItem => "E2001",
            Self::MalformedRequest => "E2002",
            Self::EmptyCatalog => "E3001",
            Self::StorageUnavailable => "E5001",
            Self::SchemaTooNew => "E5002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::UnknownItem => "Invalid image ID",
            Self::MalformedRequest => "Malformed request",
            Self::EmptyCatalog => "No items available",
            Self::StorageUnavailable => "Vote store unavailable",
            Self::SchemaTooNew => "Database schema is newer than this binary",
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::UnknownItem => Some("Run `ballot list` to see the catalog."),
            Self::MalformedRequest => Some("Send a JSON body like {\"image_id\": 42}."),
            Self::EmptyCatalog => Some("Add items with `ballot add` or `ballot import`."),
            Self::StorageUnavailable => {
                Some("Check that the database file exists and is writable, then retry.")
            }
            Self::SchemaTooNew => Some("Upgrade ballot before opening this database."),
        }
    }

    /// Whether the failure is the caller's fault (4xx) rather than the service's (5xx).
    #[must_use]
    pub const fn is_client_error(self) -> bool {
        matches!(self, Self::UnknownItem | Self::MalformedRequest)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors produced by catalog, selector, ledger, and results operations.
///
/// Validation variants are raised before any mutation. Storage variants
/// abort the enclosing transaction, so no partial increment is committed.
#[derive(Debug, thiserror::Error)]
pub enum BallotError {
    #[error("unknown item {0}")]
    UnknownItem(ItemId),

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("no eligible items in the catalog")]
    EmptyCatalog,

    #[error("vote store unavailable: {0}")]
    StorageUnavailable(#[from] rusqlite::Error),

    #[error("database schema version {found} is newer than supported {supported}")]
    SchemaTooNew { found: u32, supported: u32 },
}

impl BallotError {
    /// Build a [`BallotError::MalformedRequest`] from any displayable reason.
    pub fn malformed(reason: impl fmt::Display) -> Self {
        Self::MalformedRequest(reason.to_string())
    }

    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownItem(_) => ErrorCode::UnknownItem,
            Self::MalformedRequest(_) => ErrorCode::MalformedRequest,
            Self::EmptyCatalog => ErrorCode::EmptyCatalog,
            Self::StorageUnavailable(_) => ErrorCode::StorageUnavailable,
            Self::SchemaTooNew { .. } => ErrorCode::SchemaTooNew,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

pub type BallotResult<T> = Result<T, BallotError>;

//! Error taxonomy shared by every wiki operation.

/// Error returned by wiki operations.
///
/// Everything except `Internal` is raised before any write begins.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WikiError {
    /// Malformed or missing input.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Referenced entity is absent.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity ("revision", "user").
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// Edit is identical to its parent.
    #[error("Edit does not change revision {parent}")]
    NoChange {
        /// The unchanged parent revision.
        parent: i64,
    },

    /// Duplicate userName or email.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Credentials do not match an active user.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Operation requires a session that is absent, or forbids one that is present.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Persistence failure after validation passed.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WikiError {
    /// Revision lookup failed.
    pub fn revision_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "revision",
            id: id.to_string(),
        }
    }

    /// User lookup failed.
    pub fn user_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "user",
            id: id.to_string(),
        }
    }

    /// Convert a store error, keeping its semantic kind.
    pub fn from_store<E: Into<WikiError>>(e: E) -> Self {
        e.into()
    }

    /// Wrap any backend error as an internal failure.
    pub fn internal<E: std::error::Error>(e: E) -> Self {
        Self::Internal(e.to_string())
    }

    /// Machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::NoChange { .. } => "NO_CHANGE",
            Self::Conflict(_) => "CONFLICT",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Whether the caller's input caused the failure (4xx class).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }
}

/// Result alias for wiki operations.
pub type WikiResult<T> = Result<T, WikiError>;

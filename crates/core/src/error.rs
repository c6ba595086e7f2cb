//! Catalog error model.

use thiserror::Error;

/// Result type used across the catalog layers.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Discriminant of a [`CatalogError`], for transport mapping and assertions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    Validation,
    Store,
}

/// Catalog-level error.
///
/// Every variant carries a human-readable message and maps to a status code
/// (`status_code()`), so transports can surface it without inspecting text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// No live record matched the requested identifier.
    #[error("{message}")]
    NotFound { message: String },

    /// The request referenced records that do not exist (batch validation).
    #[error("{message}")]
    BadRequest { message: String },

    /// Malformed input rejected before it reached the store.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Opaque store failure (constraint violation, connectivity, decoding).
    #[error("store failure: {0}")]
    Store(String),
}

impl CatalogError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound {
            message: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest {
            message: msg.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::BadRequest { .. } => ErrorKind::BadRequest,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Store(_) => ErrorKind::Store,
        }
    }

    /// HTTP-equivalent status code.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::BadRequest | ErrorKind::Validation => 400,
            ErrorKind::Store => 500,
        }
    }

    /// The bare message, without the variant prefix `Display` adds.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound { message } | Self::BadRequest { message } => message,
            Self::Validation(msg) | Self::Store(msg) => msg,
        }
    }
}

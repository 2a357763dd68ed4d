//! Error types for reconciliation operations.
//!
//! Errors are categorized so callers can tell a bad record (fix the input)
//! apart from a failing Inventory Service (retry the whole cycle later).

use std::fmt;

/// Result type alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of reconciliation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad or missing input, caught before any network call.
    Validation,
    /// The Inventory Service or its transport failed.
    Service,
    /// No entity matched.
    NotFound,
    /// More than one entity matched a lookup filter.
    Ambiguous,
    /// A referenced entity (e.g. a tag) could not be resolved.
    Reference,
}

impl ErrorCategory {
    /// Whether the caller has to change its input to make progress.
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::Validation | Self::Ambiguous | Self::Reference)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Validation => "Invalid configuration",
            Self::Service => "Inventory service failure",
            Self::NotFound => "Entity not found",
            Self::Ambiguous => "Ambiguous filter",
            Self::Reference => "Unresolved reference",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Validation => "Check the record fields against the resource schema",
            Self::Service => "Check the inventory service and retry the reconciliation",
            Self::NotFound => "Verify the identifier or filter values",
            Self::Ambiguous => "Add more filter attributes so exactly one entity matches",
            Self::Reference => "Create the referenced entity first or enable auto-creation",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Failure reported by the Inventory Service or its transport.
///
/// Always propagated to the caller unmodified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The service answered with a non-success status.
    #[error("{endpoint} returned HTTP {status}: {message}")]
    Status {
        /// Collection the request targeted.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Error detail from the response body.
        message: String,
    },

    /// The request never produced a response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The response could not be interpreted.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ServiceError {
    /// Create a status error.
    pub fn status(endpoint: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            endpoint: endpoint.into(),
            status,
            message: message.into(),
        }
    }

    /// Create the 404 error for an entity that does not exist.
    pub fn not_found(endpoint: impl Into<String>) -> Self {
        Self::status(endpoint, 404, "Not found.")
    }

    /// HTTP status code, if the service answered.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is the 404-equivalent "entity does not exist" answer.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

/// Errors that can occur while reconciling a resource.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required field is missing or a value violates a constraint.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Field that failed validation.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// An enum-valued field holds a value outside its allowed set.
    #[error("invalid value {value:?} for {field}, expected one of: {}", allowed.join(", "))]
    InvalidValue {
        /// Field name.
        field: String,
        /// Rejected value.
        value: String,
        /// Allowed values.
        allowed: Vec<String>,
    },

    /// A reference could not be resolved to an identifier.
    #[error("unknown {kind} {name:?}")]
    UnknownReference {
        /// Kind of referenced entity (e.g. "tag").
        kind: String,
        /// Name that failed to resolve.
        name: String,
    },

    /// No entity matched.
    #[error("no {kind} found matching {what}")]
    NotFound {
        /// Resource kind.
        kind: String,
        /// Identifier or filter description.
        what: String,
    },

    /// A lookup matched more than one entity.
    #[error("more than one {kind} returned ({count} matches), specify a more narrow filter")]
    AmbiguousFilter {
        /// Resource kind.
        kind: String,
        /// Number of matches reported by the service.
        count: u64,
    },

    /// Transport or API failure other than not-found.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl Error {
    /// Create a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a missing-required-field error.
    pub fn required(field: impl Into<String>) -> Self {
        Self::validation(field, "field is required")
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Validation { .. } | Error::InvalidValue { .. } => ErrorCategory::Validation,
            Error::UnknownReference { .. } => ErrorCategory::Reference,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::AmbiguousFilter { .. } => ErrorCategory::Ambiguous,
            Error::Service(_) => ErrorCategory::Service,
        }
    }

    /// The underlying service error, if any.
    #[must_use]
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            Error::Service(err) => Some(err),
            _ => None,
        }
    }
}

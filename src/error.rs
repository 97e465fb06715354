//! Error types for OData request processing.
//!
//! Every hard failure in the pipeline is an [`ODataError`]. Each variant maps to
//! one protocol status code and carries a machine-readable `code` plus a human
//! readable `message`, which is what ends up in the error body sent back to the
//! client.
//!
//! The soft "segment not handled" signal used by the path resolvers is not an
//! error: see [`crate::pipe::Resolution`].

use http::StatusCode;
use serde::Serialize;

/// Main error type for OData operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ODataError {
    /// Malformed segments, invalid or missing arguments
    #[error("Bad request ({code}): {message}")]
    BadRequest { code: String, message: String },

    /// Gate denial
    #[error("Forbidden ({code}): {message}")]
    Forbidden { code: String, message: String },

    /// No resolver handled a segment, or an addressed entity does not exist
    #[error("Not found ({code}): {message}")]
    NotFound { code: String, message: String },

    /// Operation addressed with the wrong HTTP method
    #[error("Method not allowed ({code}): {message}")]
    MethodNotAllowed { code: String, message: String },

    /// No acceptable representation could be negotiated
    #[error("Not acceptable ({code}): {message}")]
    NotAcceptable { code: String, message: String },

    /// Invariant violations inside the service
    #[error("Internal server error ({code}): {message}")]
    InternalServerError { code: String, message: String },
}

impl ODataError {
    /// Create a bad request error
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a forbidden error
    pub fn forbidden(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Forbidden {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a method not allowed error
    pub fn method_not_allowed(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MethodNotAllowed {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a not acceptable error
    pub fn not_acceptable(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotAcceptable {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create an internal server error
    pub fn internal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InternalServerError {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Machine-readable error code, e.g. `invalid_argument_type`
    pub fn code(&self) -> &str {
        match self {
            Self::BadRequest { code, .. }
            | Self::Forbidden { code, .. }
            | Self::NotFound { code, .. }
            | Self::MethodNotAllowed { code, .. }
            | Self::NotAcceptable { code, .. }
            | Self::InternalServerError { code, .. } => code,
        }
    }

    /// Human readable error message
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::Forbidden { message, .. }
            | Self::NotFound { message, .. }
            | Self::MethodNotAllowed { message, .. }
            | Self::NotAcceptable { message, .. }
            | Self::InternalServerError { message, .. } => message,
        }
    }

    /// HTTP status code this error is reported with
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotAcceptable { .. } => StatusCode::NOT_ACCEPTABLE,
            Self::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this error is the client's fault (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

/// Protocol error body: `{"error": {"code": .., "message": ..}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Inner part of an [`ErrorResponse`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl ErrorResponse {
    /// Attach the segment or argument the error relates to
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.error.target = Some(target.into());
        self
    }
}

impl From<&ODataError> for ErrorResponse {
    fn from(error: &ODataError) -> Self {
        Self {
            error: ErrorDetail {
                code: error.code().to_string(),
                message: error.message().to_string(),
                target: None,
            },
        }
    }
}

pub type ODataResult<T> = Result<T, ODataError>;

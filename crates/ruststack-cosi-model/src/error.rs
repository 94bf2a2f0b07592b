//! COSI error types.
//!
//! COSI is a gRPC contract, so every error carries a gRPC status code. The
//! JSON transport reports that code alongside the error name and message:
//!
//! ```json
//! { "code": 6, "__type": "AlreadyExists", "message": "bucket already exists: photos" }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error codes surfaced by the driver, aligned with gRPC status codes.
///
/// The handlers only produce a handful of these; the rest exist so injected
/// faults can use any canonical status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CosiErrorCode {
    /// The operation was cancelled by the caller.
    Cancelled,
    /// Unknown error.
    Unknown,
    /// Malformed identifier, missing field or unsupported protocol.
    #[default]
    InvalidArgument,
    /// The deadline expired before the operation completed.
    DeadlineExceeded,
    /// The referenced bucket does not exist.
    NotFound,
    /// A live record exists with different attributes.
    AlreadyExists,
    /// The caller may not perform the operation.
    PermissionDenied,
    /// A quota or other resource is exhausted.
    ResourceExhausted,
    /// The system is not in a state required for the operation.
    FailedPrecondition,
    /// The operation was aborted, typically by a concurrency conflict.
    Aborted,
    /// The operation was attempted past the valid range.
    OutOfRange,
    /// The requested operation is not known to this driver.
    Unimplemented,
    /// Backend failure or any other unexpected condition.
    Internal,
    /// The service is currently unavailable.
    Unavailable,
    /// Unrecoverable data loss or corruption.
    DataLoss,
    /// The request lacks valid credentials.
    Unauthenticated,
}

impl CosiErrorCode {
    /// Every error code, in gRPC numeric order.
    pub const ALL: [Self; 16] = [
        Self::Cancelled,
        Self::Unknown,
        Self::InvalidArgument,
        Self::DeadlineExceeded,
        Self::NotFound,
        Self::AlreadyExists,
        Self::PermissionDenied,
        Self::ResourceExhausted,
        Self::FailedPrecondition,
        Self::Aborted,
        Self::OutOfRange,
        Self::Unimplemented,
        Self::Internal,
        Self::Unavailable,
        Self::DataLoss,
        Self::Unauthenticated,
    ];

    /// Returns the short error code string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cancelled => "Cancelled",
            Self::Unknown => "Unknown",
            Self::InvalidArgument => "InvalidArgument",
            Self::DeadlineExceeded => "DeadlineExceeded",
            Self::NotFound => "NotFound",
            Self::AlreadyExists => "AlreadyExists",
            Self::PermissionDenied => "PermissionDenied",
            Self::ResourceExhausted => "ResourceExhausted",
            Self::FailedPrecondition => "FailedPrecondition",
            Self::Aborted => "Aborted",
            Self::OutOfRange => "OutOfRange",
            Self::Unimplemented => "Unimplemented",
            Self::Internal => "Internal",
            Self::Unavailable => "Unavailable",
            Self::DataLoss => "DataLoss",
            Self::Unauthenticated => "Unauthenticated",
        }
    }

    /// Returns the numeric gRPC status code.
    #[must_use]
    pub fn grpc_code(&self) -> u32 {
        match self {
            Self::Cancelled => 1,
            Self::Unknown => 2,
            Self::InvalidArgument => 3,
            Self::DeadlineExceeded => 4,
            Self::NotFound => 5,
            Self::AlreadyExists => 6,
            Self::PermissionDenied => 7,
            Self::ResourceExhausted => 8,
            Self::FailedPrecondition => 9,
            Self::Aborted => 10,
            Self::OutOfRange => 11,
            Self::Unimplemented => 12,
            Self::Internal => 13,
            Self::Unavailable => 14,
            Self::DataLoss => 15,
            Self::Unauthenticated => 16,
        }
    }

    /// Map a numeric gRPC status code back to an error code.
    ///
    /// Returns `None` for `0` (OK) and for numbers outside the canonical set.
    #[must_use]
    pub fn from_grpc_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.grpc_code() == code)
    }

    /// Returns the default HTTP status code for this error.
    #[must_use]
    pub fn default_status_code(&self) -> http::StatusCode {
        match self {
            Self::InvalidArgument | Self::FailedPrecondition | Self::OutOfRange => {
                http::StatusCode::BAD_REQUEST
            }
            Self::Unauthenticated => http::StatusCode::UNAUTHORIZED,
            Self::PermissionDenied => http::StatusCode::FORBIDDEN,
            Self::NotFound => http::StatusCode::NOT_FOUND,
            Self::Cancelled => http::StatusCode::REQUEST_TIMEOUT,
            Self::AlreadyExists | Self::Aborted => http::StatusCode::CONFLICT,
            Self::ResourceExhausted => http::StatusCode::TOO_MANY_REQUESTS,
            Self::Unimplemented => http::StatusCode::NOT_IMPLEMENTED,
            Self::Unavailable => http::StatusCode::SERVICE_UNAVAILABLE,
            Self::DeadlineExceeded => http::StatusCode::GATEWAY_TIMEOUT,
            Self::Unknown | Self::Internal | Self::DataLoss => {
                http::StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for CosiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A COSI error response.
#[derive(Debug)]
pub struct CosiError {
    /// The error code.
    pub code: CosiErrorCode,
    /// A human-readable error message.
    pub message: String,
    /// The HTTP status code.
    pub status_code: http::StatusCode,
    /// The underlying source error, if any.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for CosiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CosiError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for CosiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl CosiError {
    /// Create a new `CosiError` from an error code.
    #[must_use]
    pub fn new(code: CosiErrorCode) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: code.as_str().to_owned(),
            code,
            source: None,
        }
    }

    /// Create a new `CosiError` with a custom message.
    #[must_use]
    pub fn with_message(code: CosiErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Override the HTTP status code while keeping the error code.
    #[must_use]
    pub fn with_status(mut self, status_code: http::StatusCode) -> Self {
        self.status_code = status_code;
        self
    }

    // -- Convenience constructors --

    /// Malformed request or unsupported protocol.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::with_message(CosiErrorCode::InvalidArgument, message)
    }

    /// Referenced bucket does not exist.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_message(CosiErrorCode::NotFound, message)
    }

    /// A live record exists with different attributes.
    #[must_use]
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::with_message(CosiErrorCode::AlreadyExists, message)
    }

    /// Internal error.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::with_message(CosiErrorCode::Internal, message)
    }

    /// Missing target header.
    #[must_use]
    pub fn missing_target() -> Self {
        Self::with_message(
            CosiErrorCode::InvalidArgument,
            "Missing required header: X-Cosi-Target",
        )
    }

    /// Unknown operation.
    #[must_use]
    pub fn unknown_operation(target: &str) -> Self {
        Self::with_message(
            CosiErrorCode::Unimplemented,
            format!("Unrecognized operation: {target}"),
        )
    }
}

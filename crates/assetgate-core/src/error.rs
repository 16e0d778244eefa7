//! Error types module
//!
//! This module provides the core error types used throughout the assetgate
//! application. All errors are unified under the `AppError` enum, which
//! covers request validation, the upload/download orchestration failures,
//! capability-URL verification, and storage-backend transport errors.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like signature rejections
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented.
/// This trait allows errors to self-describe their HTTP response characteristics.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "INVALID_SIGNATURE")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// What the caller can do about it, when there is a useful answer
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed request against the endpoint schema.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Structurally invalid multipart body on the upload-form endpoint.
    #[error("Bad asset upload form: {0}")]
    BadAssetUploadForm(String),

    /// The existence probe for a derived asset name found the name taken.
    #[error("Asset name already exists: {0}")]
    Duplicated(String),

    /// Private asset requested without a valid provider signature.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Capability-URL MAC verification failed or the envelope is malformed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Capability-URL MAC verified but the validity window has passed.
    #[error("Expired signature")]
    ExpiredSignature,

    /// Requested asset does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Object-store SDK or proxy failure; detail stays server-side.
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Network failure talking to the backend or the client's upload target.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Short type name, used as a structured logging field.
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::ValidationFailed(_) => "ValidationFailed",
            AppError::BadAssetUploadForm(_) => "BadAssetUploadForm",
            AppError::Duplicated(_) => "Duplicated",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::InvalidSignature => "InvalidSignature",
            AppError::ExpiredSignature => "ExpiredSignature",
            AppError::NotFound(_) => "NotFound",
            AppError::Backend(_) => "Backend",
            AppError::Transport(_) => "Transport",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Full internal message, including source chains where present.
    pub fn detailed_message(&self) -> String {
        match self {
            AppError::InternalWithSource { message, source } => {
                format!("{}: {:#}", message, source)
            }
            other => other.to_string(),
        }
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        match self {
            AppError::ValidationFailed(_) | AppError::BadAssetUploadForm(_) => 400,
            AppError::Unauthorized(_)
            | AppError::InvalidSignature
            | AppError::ExpiredSignature => 401,
            AppError::NotFound(_) => 404,
            AppError::Duplicated(_) => 409,
            AppError::Backend(_) | AppError::Transport(_) => 502,
            AppError::Internal(_) | AppError::InternalWithSource { .. } => 500,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::ValidationFailed(_) => "validation_failed",
            AppError::BadAssetUploadForm(_) => "bad_asset_upload_form",
            AppError::Duplicated(_) => "duplicated",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::InvalidSignature => "invalid_signature",
            AppError::ExpiredSignature => "expired_signature",
            AppError::NotFound(_) => "not_found",
            AppError::Backend(_) => "backend_error",
            AppError::Transport(_) => "transport_error",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "internal_error",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, AppError::Backend(_) | AppError::Transport(_))
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            AppError::ValidationFailed(_) | AppError::BadAssetUploadForm(_) => {
                Some("Check the request payload against the API schema")
            }
            AppError::Duplicated(_) => Some("Retry to derive a new name, or pick another name"),
            AppError::Unauthorized(_) => Some("Request a signed URL for this asset"),
            AppError::InvalidSignature => Some("Request a fresh signed URL"),
            AppError::ExpiredSignature => Some("Request a fresh signed URL"),
            AppError::NotFound(_) => Some("Verify the asset name exists"),
            AppError::Backend(_) | AppError::Transport(_) => Some("Retry after a short delay"),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => None,
        }
    }

    fn client_message(&self) -> String {
        match self {
            // Upstream detail is logged server-side only, never leaked.
            AppError::Backend(_) | AppError::Transport(_) => {
                "Upstream storage request failed".to_string()
            }
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }

    fn is_sensitive(&self) -> bool {
        matches!(
            self,
            AppError::Backend(_)
                | AppError::Transport(_)
                | AppError::Internal(_)
                | AppError::InternalWithSource { .. }
        )
    }

    fn log_level(&self) -> LogLevel {
        match self {
            AppError::ValidationFailed(_)
            | AppError::BadAssetUploadForm(_)
            | AppError::NotFound(_)
            | AppError::Duplicated(_) => LogLevel::Debug,
            AppError::Unauthorized(_)
            | AppError::InvalidSignature
            | AppError::ExpiredSignature => LogLevel::Warn,
            AppError::Backend(_)
            | AppError::Transport(_)
            | AppError::Internal(_)
            | AppError::InternalWithSource { .. } => LogLevel::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::ValidationFailed("x".into()).http_status_code(),
            400
        );
        assert_eq!(AppError::InvalidSignature.http_status_code(), 401);
        assert_eq!(AppError::ExpiredSignature.http_status_code(), 401);
        assert_eq!(AppError::Duplicated("a".into()).http_status_code(), 409);
        assert_eq!(AppError::Backend("boom".into()).http_status_code(), 502);
    }

    #[test]
    fn test_backend_detail_never_reaches_client() {
        let err = AppError::Backend("SignatureDoesNotMatch: key AKIA...".into());
        assert!(!err.client_message().contains("AKIA"));
        assert!(err.is_sensitive());
    }

    #[test]
    fn test_suggested_actions() {
        assert_eq!(
            AppError::Backend("boom".into()).suggested_action(),
            Some("Retry after a short delay")
        );
        assert_eq!(
            AppError::ExpiredSignature.suggested_action(),
            Some("Request a fresh signed URL")
        );
        assert_eq!(AppError::Internal("x".into()).suggested_action(), None);
    }

    #[test]
    fn test_signature_errors_log_as_warn() {
        assert_eq!(AppError::InvalidSignature.log_level(), LogLevel::Warn);
        assert_eq!(AppError::ExpiredSignature.log_level(), LogLevel::Warn);
    }
}

//! Provisioning errors surfaced to callers
//!
//! Provider errors are normalised here: "already exists" never reaches this
//! type (components turn it into [`cloudseed_common::Outcome::AlreadyExists`]),
//! and every other failure keeps the operation name and provider message.

use crate::aws::AwsError;
use crate::aws::error::suggestion_for_code;
use cloudseed_common::{ErrorKind, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Bad local input; nothing was sent to the provider
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Bucket name exists and belongs to a different account
    #[error("bucket '{bucket}' already exists and is owned by another account")]
    OwnedByOther { bucket: String },

    /// Still throttled after the retry budget was spent
    #[error("{operation}: throttled by provider: {message}")]
    Throttled {
        operation: &'static str,
        message: String,
    },

    /// Still failing transiently after the retry budget was spent
    #[error("{operation}: provider unavailable: {message}")]
    Unavailable {
        operation: &'static str,
        message: String,
    },

    #[error("{operation}: permission denied: {message}")]
    PermissionDenied {
        operation: &'static str,
        message: String,
    },

    /// Provider refused the request as invalid (malformed document, unknown ARN, ...)
    #[error("{operation}: rejected ({code}): {message}")]
    Rejected {
        operation: &'static str,
        code: String,
        message: String,
    },

    /// No answer in time; the remote side may still have applied the request
    #[error("{operation}: timed out; remote outcome is indeterminate")]
    Timeout { operation: &'static str },

    /// Cancelled mid-call; the remote side may still have applied the request
    #[error("{operation}: cancelled; remote outcome is indeterminate")]
    Cancelled { operation: &'static str },

    #[error("{operation}: {message}")]
    Unknown {
        operation: &'static str,
        code: Option<String>,
        message: String,
    },
}

/// Errors loading configuration inputs from disk
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid policy document in {path}")]
    Invalid {
        path: String,
        #[source]
        source: ValidationError,
    },
}

impl ProvisionError {
    /// Attach the failing operation's name to a classified provider error
    pub fn from_aws(operation: &'static str, err: AwsError) -> Self {
        match err {
            AwsError::Throttled { message } => ProvisionError::Throttled { operation, message },
            AwsError::Unavailable { message } => ProvisionError::Unavailable { operation, message },
            AwsError::AccessDenied { message } => {
                ProvisionError::PermissionDenied { operation, message }
            }
            AwsError::Rejected { code, message } => ProvisionError::Rejected {
                operation,
                code,
                message,
            },
            AwsError::NotFound { message } => ProvisionError::Rejected {
                operation,
                code: "NotFound".to_string(),
                message,
            },
            AwsError::AlreadyExists => ProvisionError::Rejected {
                operation,
                code: "AlreadyExists".to_string(),
                message: "resource already exists".to_string(),
            },
            AwsError::AlreadyOwnedByOther => ProvisionError::Rejected {
                operation,
                code: "AlreadyOwnedByOther".to_string(),
                message: "resource name is owned by another account".to_string(),
            },
            AwsError::Timeout => ProvisionError::Timeout { operation },
            AwsError::Cancelled => ProvisionError::Cancelled { operation },
            AwsError::Sdk { code, message } => ProvisionError::Unknown {
                operation,
                code,
                message,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ProvisionError::Validation(_) => ErrorKind::Validation,
            ProvisionError::OwnedByOther { .. } => ErrorKind::OwnedByOther,
            ProvisionError::Throttled { .. } => ErrorKind::Throttled,
            ProvisionError::Unavailable { .. } => ErrorKind::Unavailable,
            ProvisionError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            ProvisionError::Rejected { .. } => ErrorKind::Rejected,
            ProvisionError::Timeout { .. } => ErrorKind::Timeout,
            ProvisionError::Cancelled { .. } => ErrorKind::Cancelled,
            ProvisionError::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// Provider operation that failed; `None` for local validation failures
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            ProvisionError::Validation(_) => None,
            ProvisionError::OwnedByOther { .. } => Some("create-bucket"),
            ProvisionError::Throttled { operation, .. }
            | ProvisionError::Unavailable { operation, .. }
            | ProvisionError::PermissionDenied { operation, .. }
            | ProvisionError::Rejected { operation, .. }
            | ProvisionError::Timeout { operation }
            | ProvisionError::Cancelled { operation }
            | ProvisionError::Unknown { operation, .. } => Some(*operation),
        }
    }

    /// True when no request reached the provider
    pub fn is_local(&self) -> bool {
        matches!(self, ProvisionError::Validation(_))
    }

    /// A remediation hint for errors with a well-known cause
    pub fn suggestion(&self) -> Option<String> {
        match self {
            ProvisionError::PermissionDenied { .. } => suggestion_for_code("AccessDenied"),
            ProvisionError::OwnedByOther { .. } => suggestion_for_code("BucketAlreadyExists"),
            ProvisionError::Throttled { .. } => suggestion_for_code("Throttling"),
            ProvisionError::Rejected { code, .. } => suggestion_for_code(code),
            ProvisionError::Unknown {
                code: Some(code), ..
            } => suggestion_for_code(code),
            _ => None,
        }
    }
}

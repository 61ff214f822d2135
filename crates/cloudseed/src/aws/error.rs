//! AWS error classification and handling
//!
//! Provides typed errors for AWS SDK operations using the `.code()` method
//! instead of string matching on Debug format.

use aws_sdk_iam::config::http::HttpResponse;
use aws_sdk_iam::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

/// AWS error categories for retry and idempotency logic
#[derive(Debug, Error)]
pub enum AwsError {
    /// Referenced resource does not exist (e.g. unknown user or policy ARN)
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    /// Resource already exists and belongs to the caller
    #[error("Resource already exists")]
    AlreadyExists,

    /// Globally-named resource is held by another account
    #[error("Resource name is owned by another account")]
    AlreadyOwnedByOther,

    /// Rate limit exceeded (retryable with backoff)
    #[error("Rate limit exceeded: {message}")]
    Throttled { message: String },

    /// Provider-side failure or broken connection (retryable with backoff)
    #[error("Service unavailable: {message}")]
    Unavailable { message: String },

    /// Credentials are not allowed to perform the call
    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    /// Request refused as invalid; retrying cannot help
    #[error("Request rejected ({code}): {message}")]
    Rejected { code: String, message: String },

    /// No response within the request timeout; the call may have been applied
    #[error("Request timed out")]
    Timeout,

    /// Caller cancelled the call; it may have been applied
    #[error("Request cancelled")]
    Cancelled,

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        matches!(self, AwsError::Throttled { .. } | AwsError::Unavailable { .. })
    }

    /// Check if this is an "already exists" error owned by the caller
    pub fn is_already_exists(&self) -> bool {
        matches!(self, AwsError::AlreadyExists)
    }

    /// The provider error code behind this error, when one was reported
    pub fn code(&self) -> Option<&str> {
        match self {
            AwsError::Rejected { code, .. } => Some(code.as_str()),
            AwsError::Sdk { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Get a user-friendly suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            AwsError::AccessDenied { .. } => suggestion_for_code("AccessDenied"),
            AwsError::AlreadyOwnedByOther => suggestion_for_code("BucketAlreadyExists"),
            AwsError::Throttled { .. } => suggestion_for_code("Throttling"),
            other => other.code().and_then(suggestion_for_code),
        }
    }
}

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &["NoSuchEntity", "NoSuchBucket", "NotFound"];

/// Known AWS error codes for "already exists, owned by caller" conditions
const ALREADY_EXISTS_CODES: &[&str] = &["EntityAlreadyExists", "BucketAlreadyOwnedByYou"];

/// Known AWS error codes for names claimed by another account
const OWNED_BY_OTHER_CODES: &[&str] = &["BucketAlreadyExists"];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "ThrottledException",
    "RequestLimitExceeded",
    "RequestThrottled",
    "TooManyRequestsException",
    "SlowDown",
];

/// Known AWS error codes for transient provider-side failures
const UNAVAILABLE_CODES: &[&str] = &[
    "ServiceFailure",
    "ServiceUnavailable",
    "InternalError",
    "InternalFailure",
    "RequestTimeout",
    "OperationAborted",
    "ConcurrentModification",
];

/// Known AWS error codes for authorization failures
const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "UnauthorizedOperation",
    "InvalidClientTokenId",
    "SignatureDoesNotMatch",
    "ExpiredToken",
    "InvalidAccessKeyId",
];

/// Known AWS error codes for requests the provider refuses as invalid
const REJECTED_CODES: &[&str] = &[
    "MalformedPolicyDocument",
    "InvalidInput",
    "ValidationError",
    "LimitExceeded",
    "PolicyNotAttachable",
    "UnmodifiableEntity",
    "InvalidBucketName",
    "InvalidLocationConstraint",
    "IllegalLocationConstraintException",
    "TooManyBuckets",
];

/// Classify an AWS SDK error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound { message },
        Some(c) if ALREADY_EXISTS_CODES.contains(&c) => AwsError::AlreadyExists,
        Some(c) if OWNED_BY_OTHER_CODES.contains(&c) => AwsError::AlreadyOwnedByOther,
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled { message },
        Some(c) if UNAVAILABLE_CODES.contains(&c) => AwsError::Unavailable { message },
        Some(c) if ACCESS_DENIED_CODES.contains(&c) => AwsError::AccessDenied { message },
        Some(c) if REJECTED_CODES.contains(&c) => AwsError::Rejected {
            code: c.to_string(),
            message,
        },
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Fall back to the HTTP status for errors whose code told us nothing.
///
/// HEAD responses carry no body, and proxies answer 502/503 without an AWS
/// error code, so a 5xx is only recognisable by its status.
fn classify_http_status(status: u16, err: AwsError) -> AwsError {
    match err {
        AwsError::Sdk { message, .. } if status == 429 => AwsError::Throttled { message },
        AwsError::Sdk { message, .. } if (500..600).contains(&status) => {
            AwsError::Unavailable { message }
        }
        other => other,
    }
}

/// Classify any SDK operation error.
///
/// Service errors are classified by their `.code()`, then by HTTP status when
/// the code is missing or unknown. Timeouts and connection failures are
/// classified by the `SdkError` variant, since they never reached the service.
pub fn from_sdk_error<E>(err: &SdkError<E, HttpResponse>) -> AwsError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    match err {
        SdkError::TimeoutError(_) => AwsError::Timeout,
        SdkError::DispatchFailure(failure) if failure.is_timeout() => AwsError::Timeout,
        SdkError::DispatchFailure(failure) if failure.is_io() => AwsError::Unavailable {
            message: DisplayErrorContext(err).to_string(),
        },
        SdkError::ServiceError(_) | SdkError::ResponseError(_) => {
            let meta = ProvideErrorMetadata::meta(err);
            let fallback = DisplayErrorContext(err).to_string();
            let classified =
                classify_aws_error(meta.code(), meta.message().or(Some(fallback.as_str())));
            match err.raw_response() {
                Some(response) => classify_http_status(response.status().as_u16(), classified),
                None => classified,
            }
        }
        _ => AwsError::Sdk {
            code: None,
            message: DisplayErrorContext(err).to_string(),
        },
    }
}

/// Error code to user-friendly suggestion mapping
const SUGGESTIONS: &[(&str, &str)] = &[
    (
        "AccessDenied",
        "Check that the active credentials allow iam:CreateUser, iam:PutUserPolicy, iam:AttachUserPolicy and s3:CreateBucket.",
    ),
    (
        "InvalidClientTokenId",
        "The access key is not recognised. Check AWS_PROFILE or the configured credentials.",
    ),
    (
        "ExpiredToken",
        "The session token has expired. Refresh your credentials and re-run.",
    ),
    (
        "MalformedPolicyDocument",
        "The inline policy document was refused. Validate it with the IAM policy simulator.",
    ),
    (
        "LimitExceeded",
        "An IAM quota was reached (e.g. managed policies per user). Detach unused policies or request a quota increase.",
    ),
    (
        "BucketAlreadyExists",
        "Bucket names are global across all accounts. Choose a different name.",
    ),
    (
        "IllegalLocationConstraintException",
        "The bucket region does not match the endpoint region. Pass the same --region for both.",
    ),
    (
        "TooManyBuckets",
        "The account bucket quota is exhausted. Delete unused buckets or request a quota increase.",
    ),
    (
        "Throttling",
        "AWS API rate limit hit. The operation was retried with backoff; re-run later.",
    ),
];

/// Get a user-friendly suggestion for a known error code.
pub(crate) fn suggestion_for_code(code: &str) -> Option<String> {
    SUGGESTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, s)| (*s).to_string())
}

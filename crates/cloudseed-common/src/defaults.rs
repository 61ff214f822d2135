//! Default configuration values
//!
//! Running `cloudseed` without overrides uses these.

/// Provider default region; bucket creation here omits a location constraint
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default name of the inline policy written onto the principal
pub const DEFAULT_INLINE_POLICY_NAME: &str = "S3WriteOnlyPolicy";

/// Default managed policy attached to the principal
pub const DEFAULT_MANAGED_POLICY_ARN: &str = "arn:aws:iam::aws:policy/AmazonS3ReadOnlyAccess";

/// IAM policy language version
pub const POLICY_VERSION: &str = "2012-10-17";

/// Per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Total attempts per provider call, including the first
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;

/// First backoff delay between attempts, in milliseconds
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 200;

/// Cap on the backoff delay between attempts, in seconds
pub const DEFAULT_MAX_BACKOFF_SECS: u64 = 5;

//! AWS client modules
//!
//! Thin wrappers around the AWS SDK clients, each behind a trait so the
//! provisioning components can be exercised without the network:
//! - IAM: user creation and user policy binding
//! - S3: bucket probing and creation
//! - error: classification of provider errors by error code

pub mod context;
pub mod error;
pub mod iam;
pub mod s3;

pub use context::{AwsContext, FromAwsContext};
pub use error::{AwsError, classify_aws_error, from_sdk_error};
pub use iam::{IamClient, IamOperations};
pub use s3::{BucketProbe, CreateBucketRequest, S3Client, S3Operations};

#[cfg(test)]
pub use iam::MockIamOperations;
#[cfg(test)]
pub use s3::MockS3Operations;

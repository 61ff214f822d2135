//! S3 bucket probing and creation

use crate::aws::context::{AwsContext, FromAwsContext};
use crate::aws::error::{AwsError, from_sdk_error};
use aws_sdk_s3::Client;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use cloudseed_common::{BucketName, Region};
use tracing::debug;

/// What a HeadBucket probe revealed about a bucket name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketProbe {
    /// Bucket exists and the caller can reach it
    Owned,
    /// No bucket by this name exists anywhere
    Missing,
    /// Bucket exists but the probe cannot tell whose it is (403 or redirect)
    Inconclusive,
}

/// Provider-neutral shape of a CreateBucket request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBucketRequest {
    pub bucket: String,
    /// Only set outside the default region
    pub location_constraint: Option<String>,
}

impl CreateBucketRequest {
    /// Shape a creation request for `region`.
    ///
    /// The default region rejects an explicit location constraint, while every
    /// other region requires one equal to the region code.
    pub fn for_region(bucket: &BucketName, region: &Region) -> Self {
        Self {
            bucket: bucket.to_string(),
            location_constraint: (!region.is_default()).then(|| region.to_string()),
        }
    }
}

/// S3 client for managing buckets
pub struct S3Client {
    client: Client,
    region: String,
}

impl S3Client {
    /// Create a new S3 client
    pub async fn new(region: &str, request_timeout: std::time::Duration) -> Self {
        let ctx = AwsContext::new(region, request_timeout).await;
        Self::from_context(&ctx)
    }

    /// Check whether a bucket exists and is reachable by the caller
    pub async fn probe_bucket(&self, bucket: &str) -> Result<BucketProbe, AwsError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(BucketProbe::Owned),
            Err(err) => {
                if err.as_service_error().is_some_and(|e| e.is_not_found()) {
                    return Ok(BucketProbe::Missing);
                }
                let status = err.raw_response().map(|r| r.status().as_u16());
                match status {
                    Some(301 | 403) => Ok(BucketProbe::Inconclusive),
                    Some(404) => Ok(BucketProbe::Missing),
                    _ => Err(from_sdk_error(&err)),
                }
            }
        }
    }

    /// Create a bucket from a pre-shaped request
    pub async fn create_bucket(&self, request: CreateBucketRequest) -> Result<(), AwsError> {
        debug!(
            bucket = %request.bucket,
            region = %self.region,
            location_constraint = ?request.location_constraint,
            "Sending CreateBucket"
        );

        let mut call = self.client.create_bucket().bucket(&request.bucket);

        if let Some(region) = &request.location_constraint {
            let create_config = CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region.as_str()))
                .build();
            call = call.create_bucket_configuration(create_config);
        }

        call.send().await.map_err(|e| from_sdk_error(&e))?;

        Ok(())
    }
}

impl FromAwsContext for S3Client {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.s3_client(),
            region: ctx.region().to_string(),
        }
    }
}

/// Trait for S3 operations that can be mocked in tests.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait S3Operations: Send + Sync {
    /// Probe a bucket name with HeadBucket
    async fn probe_bucket(&self, bucket: &str) -> Result<BucketProbe, AwsError>;

    /// Issue one CreateBucket call
    async fn create_bucket(&self, request: CreateBucketRequest) -> Result<(), AwsError>;
}

impl S3Operations for S3Client {
    async fn probe_bucket(&self, bucket: &str) -> Result<BucketProbe, AwsError> {
        S3Client::probe_bucket(self, bucket).await
    }

    async fn create_bucket(&self, request: CreateBucketRequest) -> Result<(), AwsError> {
        S3Client::create_bucket(self, request).await
    }
}

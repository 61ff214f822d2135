//! Ensure an S3 bucket exists in the requested region

use crate::aws::{AwsError, BucketProbe, CreateBucketRequest, S3Operations};
use crate::error::ProvisionError;
use crate::retry::{RetryPolicy, call_with_retry};
use cloudseed_common::{BucketName, Outcome, Region};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const HEAD_BUCKET: &str = "head-bucket";
const CREATE_BUCKET: &str = "create-bucket";

pub struct BucketProvisioner<'a, S> {
    s3: &'a S,
    retry: RetryPolicy,
    cancel: Option<CancellationToken>,
}

impl<'a, S: S3Operations> BucketProvisioner<'a, S> {
    pub fn new(s3: &'a S, retry: RetryPolicy) -> Self {
        Self {
            s3,
            retry,
            cancel: None,
        }
    }

    pub fn with_cancellation(mut self, token: Option<CancellationToken>) -> Self {
        self.cancel = token;
        self
    }

    /// Make sure the bucket `name` exists in `region` and belongs to the caller.
    ///
    /// A HeadBucket probe runs first. If the caller can already reach the
    /// bucket, no create is sent. Otherwise a CreateBucket request is shaped
    /// for the region and the provider's answer decides the outcome:
    /// "already owned by you" is [`Outcome::AlreadyExists`], "already exists"
    /// (someone else's) is [`ProvisionError::OwnedByOther`].
    pub async fn ensure_bucket(&self, name: &str, region: &str) -> Result<Outcome, ProvisionError> {
        let name = BucketName::parse(name)?;
        let region = Region::parse(region)?;

        info!(bucket = %name, region = %region, "Ensuring S3 bucket exists");

        let s3 = self.s3;
        let probe = call_with_retry(&self.retry, HEAD_BUCKET, self.cancel.as_ref(), || {
            s3.probe_bucket(name.as_str())
        })
        .await
        .map_err(|e| ProvisionError::from_aws(HEAD_BUCKET, e))?;

        debug!(bucket = %name, probe = ?probe, "Bucket probe finished");
        if probe == BucketProbe::Owned {
            info!(bucket = %name, "S3 bucket already exists");
            return Ok(Outcome::AlreadyExists);
        }

        let request = CreateBucketRequest::for_region(&name, &region);
        let result = call_with_retry(&self.retry, CREATE_BUCKET, self.cancel.as_ref(), || {
            s3.create_bucket(request.clone())
        })
        .await;

        match result {
            Ok(()) => {
                info!(bucket = %name, region = %region, "S3 bucket created");
                Ok(Outcome::Created)
            }
            Err(AwsError::AlreadyExists) => {
                info!(bucket = %name, "S3 bucket already exists");
                Ok(Outcome::AlreadyExists)
            }
            Err(AwsError::AlreadyOwnedByOther) => Err(ProvisionError::OwnedByOther {
                bucket: name.into_inner(),
            }),
            Err(e) => Err(ProvisionError::from_aws(CREATE_BUCKET, e)),
        }
    }
}

//! Ensure an IAM user exists

use crate::aws::{AwsError, IamOperations};
use crate::error::ProvisionError;
use crate::retry::{RetryPolicy, call_with_retry};
use cloudseed_common::{Outcome, PrincipalName};
use tokio_util::sync::CancellationToken;
use tracing::info;

const CREATE_USER: &str = "create-user";

/// Create-or-detect for principals
pub struct PrincipalProvisioner<'a, I> {
    iam: &'a I,
    retry: RetryPolicy,
    cancel: Option<CancellationToken>,
}

impl<'a, I: IamOperations> PrincipalProvisioner<'a, I> {
    pub fn new(iam: &'a I, retry: RetryPolicy) -> Self {
        Self {
            iam,
            retry,
            cancel: None,
        }
    }

    /// Abort in-flight calls when `token` is cancelled
    pub fn with_cancellation(mut self, token: Option<CancellationToken>) -> Self {
        self.cancel = token;
        self
    }

    /// Make sure the principal `name` exists.
    ///
    /// The name is validated locally first; an invalid name returns
    /// [`ProvisionError::Validation`] without calling the provider. A
    /// provider "already exists" answer is reported as
    /// [`Outcome::AlreadyExists`], never as an error.
    pub async fn ensure_principal(&self, name: &str) -> Result<Outcome, ProvisionError> {
        let name = PrincipalName::parse(name)?;

        info!(principal = %name, "Ensuring IAM user exists");

        let iam = self.iam;
        let result = call_with_retry(&self.retry, CREATE_USER, self.cancel.as_ref(), || {
            iam.create_user(name.as_str())
        })
        .await;

        match result {
            Ok(()) => {
                info!(principal = %name, "IAM user created");
                Ok(Outcome::Created)
            }
            Err(AwsError::AlreadyExists) => {
                info!(principal = %name, "IAM user already exists");
                Ok(Outcome::AlreadyExists)
            }
            Err(e) => Err(ProvisionError::from_aws(CREATE_USER, e)),
        }
    }
}

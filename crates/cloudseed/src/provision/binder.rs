//! Attach inline and managed policies to an existing principal
//!
//! The two bindings are independent: a failure of one never stops the other
//! from being attempted, and each result is reported on its own.

use crate::aws::IamOperations;
use crate::error::ProvisionError;
use crate::retry::{RetryPolicy, call_with_retry};
use cloudseed_common::{ManagedPolicyArn, PolicyDocument, PolicyName, PrincipalName};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const PUT_USER_POLICY: &str = "put-user-policy";
const ATTACH_USER_POLICY: &str = "attach-user-policy";

/// Results of binding both policies to one principal
#[derive(Debug)]
pub struct BindingResults {
    pub inline: Result<(), ProvisionError>,
    pub managed: Result<(), ProvisionError>,
}

impl BindingResults {
    pub fn all_ok(&self) -> bool {
        self.inline.is_ok() && self.managed.is_ok()
    }
}

pub struct PolicyBinder<'a, I> {
    iam: &'a I,
    retry: RetryPolicy,
    cancel: Option<CancellationToken>,
}

impl<'a, I: IamOperations> PolicyBinder<'a, I> {
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

    /// Write `document` as the inline policy `policy_name` on `principal`.
    ///
    /// Re-issuing with the same name replaces the stored document
    /// (last write wins), so repeating the call is safe.
    pub async fn bind_inline(
        &self,
        principal: &str,
        policy_name: &str,
        document: &PolicyDocument,
    ) -> Result<(), ProvisionError> {
        let principal = PrincipalName::parse(principal)?;
        let policy_name = PolicyName::parse(policy_name)?;
        let document = document.to_json()?;

        let iam = self.iam;
        call_with_retry(&self.retry, PUT_USER_POLICY, self.cancel.as_ref(), || {
            iam.put_user_policy(principal.as_str(), policy_name.as_str(), &document)
        })
        .await
        .map_err(|e| ProvisionError::from_aws(PUT_USER_POLICY, e))?;

        info!(principal = %principal, policy_name = %policy_name, "Inline policy bound");
        Ok(())
    }

    /// Attach the managed policy `policy_arn` to `principal`.
    ///
    /// Attaching an already-attached policy succeeds without change.
    pub async fn bind_managed(&self, principal: &str, policy_arn: &str) -> Result<(), ProvisionError> {
        let principal = PrincipalName::parse(principal)?;
        let policy_arn = ManagedPolicyArn::parse(policy_arn)?;

        let iam = self.iam;
        call_with_retry(&self.retry, ATTACH_USER_POLICY, self.cancel.as_ref(), || {
            iam.attach_user_policy(principal.as_str(), policy_arn.as_str())
        })
        .await
        .map_err(|e| ProvisionError::from_aws(ATTACH_USER_POLICY, e))?;

        info!(principal = %principal, policy_arn = %policy_arn, "Managed policy bound");
        Ok(())
    }

    /// Run both bindings concurrently and collect both results.
    pub async fn bind_all(
        &self,
        principal: &str,
        policy_name: &str,
        document: &PolicyDocument,
        policy_arn: &str,
    ) -> BindingResults {
        let (inline, managed) = tokio::join!(
            self.bind_inline(principal, policy_name, document),
            self.bind_managed(principal, policy_arn),
        );

        if let Err(e) = &inline {
            warn!(principal = %principal, error = %e, "Inline policy binding failed");
        }
        if let Err(e) = &managed {
            warn!(principal = %principal, error = %e, "Managed policy binding failed");
        }

        BindingResults { inline, managed }
    }
}

//! IAM user and user policy management

use crate::aws::context::{AwsContext, FromAwsContext};
use crate::aws::error::{AwsError, from_sdk_error};
use aws_sdk_iam::Client;
use aws_sdk_iam::types::Tag;
use chrono::Utc;
use cloudseed_common::tags::{self, TAG_CREATED_AT, TAG_TOOL, TAG_TOOL_VALUE};
use tracing::debug;

/// IAM client for managing users and their policies
pub struct IamClient {
    client: Client,
}

fn build_tag(key: &str, value: &str) -> Result<Tag, AwsError> {
    Tag::builder()
        .key(key)
        .value(value)
        .build()
        .map_err(|e| AwsError::Sdk {
            code: None,
            message: format!("Failed to build IAM tag: {e}"),
        })
}

impl IamClient {
    /// Create a new IAM client
    pub async fn new(region: &str, request_timeout: std::time::Duration) -> Self {
        let ctx = AwsContext::new(region, request_timeout).await;
        Self::from_context(&ctx)
    }

    /// Create an IAM user, tagged with the tool name and creation time.
    ///
    /// An existing user surfaces as [`AwsError::AlreadyExists`].
    pub async fn create_user(&self, user_name: &str) -> Result<(), AwsError> {
        let created_at = tags::format_created_at(Utc::now());

        self.client
            .create_user()
            .user_name(user_name)
            .tags(build_tag(TAG_TOOL, TAG_TOOL_VALUE)?)
            .tags(build_tag(TAG_CREATED_AT, &created_at)?)
            .send()
            .await
            .map_err(|e| from_sdk_error(&e))?;

        debug!(user_name = %user_name, "IAM user created");
        Ok(())
    }

    /// Write an inline policy onto a user, replacing any document of the same name
    pub async fn put_user_policy(
        &self,
        user_name: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> Result<(), AwsError> {
        self.client
            .put_user_policy()
            .user_name(user_name)
            .policy_name(policy_name)
            .policy_document(policy_document)
            .send()
            .await
            .map_err(|e| from_sdk_error(&e))?;

        debug!(user_name = %user_name, policy_name = %policy_name, "Inline policy written");
        Ok(())
    }

    /// Attach a managed policy to a user; re-attaching is a no-op upstream
    pub async fn attach_user_policy(&self, user_name: &str, policy_arn: &str) -> Result<(), AwsError> {
        self.client
            .attach_user_policy()
            .user_name(user_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| from_sdk_error(&e))?;

        debug!(user_name = %user_name, policy_arn = %policy_arn, "Managed policy attached");
        Ok(())
    }
}

impl FromAwsContext for IamClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.iam_client(),
        }
    }
}

/// Trait for IAM operations that can be mocked in tests.
///
/// Each method makes exactly one provider call; retries and timeouts are
/// layered on by the caller.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait IamOperations: Send + Sync {
    /// Create a user
    async fn create_user(&self, user_name: &str) -> Result<(), AwsError>;

    /// Put (create or overwrite) an inline user policy
    async fn put_user_policy(
        &self,
        user_name: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> Result<(), AwsError>;

    /// Attach a managed policy to a user
    async fn attach_user_policy(&self, user_name: &str, policy_arn: &str) -> Result<(), AwsError>;
}

impl IamOperations for IamClient {
    async fn create_user(&self, user_name: &str) -> Result<(), AwsError> {
        IamClient::create_user(self, user_name).await
    }

    async fn put_user_policy(
        &self,
        user_name: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> Result<(), AwsError> {
        IamClient::put_user_policy(self, user_name, policy_name, policy_document).await
    }

    async fn attach_user_policy(&self, user_name: &str, policy_arn: &str) -> Result<(), AwsError> {
        IamClient::attach_user_policy(self, user_name, policy_arn).await
    }
}

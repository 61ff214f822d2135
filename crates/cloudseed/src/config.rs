//! Configuration types for a provisioning run
//!
//! Values are plain strings here; each component validates its own inputs
//! before touching the network, so an invalid value fails only the step that
//! uses it.

use crate::error::ConfigError;
use crate::retry::RetryPolicy;
use cloudseed_common::defaults::{
    DEFAULT_INLINE_POLICY_NAME, DEFAULT_MANAGED_POLICY_ARN, DEFAULT_REGION,
};
use cloudseed_common::{PolicyDocument, ResourceSelector, Statement};
use std::path::Path;

/// The principal and the two policies bound to it
#[derive(Debug, Clone)]
pub struct PrincipalConfig {
    /// IAM user name
    pub principal_name: String,
    /// Name of the inline policy written onto the user
    pub inline_policy_name: String,
    /// Inline policy content
    pub inline_policy_document: PolicyDocument,
    /// ARN of the managed policy attached to the user
    pub managed_policy_arn: String,
}

impl PrincipalConfig {
    /// Principal with the default inline and managed policies
    pub fn with_defaults(principal_name: impl Into<String>) -> Self {
        Self {
            principal_name: principal_name.into(),
            inline_policy_name: DEFAULT_INLINE_POLICY_NAME.to_string(),
            inline_policy_document: default_inline_policy(),
            managed_policy_arn: DEFAULT_MANAGED_POLICY_ARN.to_string(),
        }
    }
}

/// The bucket to ensure
#[derive(Debug, Clone)]
pub struct BucketConfig {
    pub bucket_name: String,
    /// Region the bucket must live in
    pub region: String,
}

/// AWS connection settings
#[derive(Debug, Clone)]
pub struct AwsConfig {
    /// Region for IAM calls, and the default bucket region
    pub region: String,
    /// AWS profile name (overrides default credential resolution)
    pub aws_profile: Option<String>,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            aws_profile: None,
        }
    }
}

/// Everything one invocation needs
///
/// Either workflow may be absent; `cloudseed user` only fills `principal`,
/// `cloudseed bucket` only fills `bucket`.
#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    pub aws: AwsConfig,
    pub retry: RetryPolicy,
    pub principal: Option<PrincipalConfig>,
    pub bucket: Option<BucketConfig>,
}

/// Read access to S3 objects and listings: `s3:GetObject` and `s3:ListBucket`
/// on every resource.
pub fn default_inline_policy() -> PolicyDocument {
    PolicyDocument::new(vec![Statement::allow(
        ["s3:GetObject", "s3:ListBucket"],
        ResourceSelector::any(),
    )])
}

/// Load an inline policy document from a JSON file
pub async fn load_policy_document(path: &Path) -> Result<PolicyDocument, ConfigError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

    PolicyDocument::from_json(&content).map_err(|source| ConfigError::Invalid {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudseed_common::Effect;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_policy_matches_expected_document() {
        let doc = default_inline_policy();
        let json: serde_json::Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Action": ["s3:GetObject", "s3:ListBucket"],
                    "Resource": "*"
                }]
            })
        );
    }

    #[test]
    fn principal_defaults() {
        let cfg = PrincipalConfig::with_defaults("svc-deployer");
        assert_eq!(cfg.principal_name, "svc-deployer");
        assert_eq!(cfg.inline_policy_name, "S3WriteOnlyPolicy");
        assert_eq!(
            cfg.managed_policy_arn,
            "arn:aws:iam::aws:policy/AmazonS3ReadOnlyAccess"
        );
        assert_eq!(cfg.inline_policy_document, default_inline_policy());
    }

    #[tokio::test]
    async fn loads_policy_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "Version": "2012-10-17",
                "Statement": {{
                    "Sid": "WriteOnly",
                    "Effect": "Allow",
                    "Action": "s3:PutObject",
                    "Resource": "arn:aws:s3:::data1233027/*"
                }}
            }}"#
        )
        .unwrap();

        let doc = load_policy_document(file.path()).await.unwrap();
        assert_eq!(doc.statements.len(), 1);
        assert_eq!(doc.statements[0].effect, Effect::Allow);
        assert_eq!(doc.statements[0].action, Some(vec!["s3:PutObject".to_string()]));
        assert_eq!(doc.statements[0].sid.as_deref(), Some("WriteOnly"));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        let err = load_policy_document(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[tokio::test]
    async fn malformed_file_is_invalid() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = load_policy_document(file.path()).await.unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}

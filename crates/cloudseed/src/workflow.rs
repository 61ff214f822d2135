//! Step sequencing for the principal and bucket workflows
//!
//! The principal workflow runs its two policy bindings only after the
//! principal exists; the bindings then run concurrently and are recorded
//! independently. The bucket workflow has no dependency on it, so
//! [`provision_all`] runs both side by side.

use crate::aws::{IamOperations, S3Operations};
use crate::config::{BucketConfig, PrincipalConfig};
use crate::provision::{BucketProvisioner, PolicyBinder, PrincipalProvisioner};
use crate::report::{ProvisionReport, Step, StepReport};
use crate::retry::RetryPolicy;
use cloudseed_common::{ProvisionState, TransitionError};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Ensure the principal, then bind both policies to it.
pub async fn provision_principal<I: IamOperations>(
    iam: &I,
    config: &PrincipalConfig,
    retry: &RetryPolicy,
    cancel: Option<&CancellationToken>,
) -> Result<ProvisionReport, TransitionError> {
    let mut principal = StepReport::new(Step::EnsurePrincipal, &config.principal_name);
    let mut inline = StepReport::new(Step::BindInlinePolicy, &config.inline_policy_name);
    let mut managed = StepReport::new(Step::BindManagedPolicy, &config.managed_policy_arn);

    principal.begin()?;
    let ensured = PrincipalProvisioner::new(iam, retry.clone())
        .with_cancellation(cancel.cloned())
        .ensure_principal(&config.principal_name)
        .await;

    match ensured {
        Ok(outcome) => {
            principal.succeed(outcome.into())?;

            inline.begin()?;
            managed.begin()?;
            let results = PolicyBinder::new(iam, retry.clone())
                .with_cancellation(cancel.cloned())
                .bind_all(
                    &config.principal_name,
                    &config.inline_policy_name,
                    &config.inline_policy_document,
                    &config.managed_policy_arn,
                )
                .await;

            match &results.inline {
                Ok(()) => inline.succeed(ProvisionState::Bound)?,
                Err(e) => inline.fail(e)?,
            }
            match &results.managed {
                Ok(()) => managed.succeed(ProvisionState::Bound)?,
                Err(e) => managed.fail(e)?,
            }
        }
        Err(e) => {
            warn!(principal = %config.principal_name, error = %e, "Principal not available, skipping policy bindings");
            principal.fail(&e)?;
            inline.skip("principal not available");
            managed.skip("principal not available");
        }
    }

    let mut report = ProvisionReport::new();
    report.push(principal);
    report.push(inline);
    report.push(managed);

    info!(
        principal = %config.principal_name,
        success = report.is_success(),
        "Principal workflow finished"
    );
    Ok(report)
}

/// Ensure the bucket exists in its region.
pub async fn provision_bucket<S: S3Operations>(
    s3: &S,
    config: &BucketConfig,
    retry: &RetryPolicy,
    cancel: Option<&CancellationToken>,
) -> Result<ProvisionReport, TransitionError> {
    let mut bucket = StepReport::new(Step::EnsureBucket, &config.bucket_name);

    bucket.begin()?;
    let ensured = BucketProvisioner::new(s3, retry.clone())
        .with_cancellation(cancel.cloned())
        .ensure_bucket(&config.bucket_name, &config.region)
        .await;

    match ensured {
        Ok(outcome) => bucket.succeed(outcome.into())?,
        Err(e) => bucket.fail(&e)?,
    }

    let mut report = ProvisionReport::new();
    report.push(bucket);

    info!(
        bucket = %config.bucket_name,
        region = %config.region,
        success = report.is_success(),
        "Bucket workflow finished"
    );
    Ok(report)
}

/// Run the principal and bucket workflows concurrently.
///
/// The report lists the principal steps first, then the bucket step.
pub async fn provision_all<I: IamOperations, S: S3Operations>(
    iam: &I,
    s3: &S,
    principal: &PrincipalConfig,
    bucket: &BucketConfig,
    retry: &RetryPolicy,
    cancel: Option<&CancellationToken>,
) -> Result<ProvisionReport, TransitionError> {
    let (principal_report, bucket_report) = tokio::join!(
        provision_principal(iam, principal, retry, cancel),
        provision_bucket(s3, bucket, retry, cancel),
    );

    let mut report = principal_report?;
    report.merge(bucket_report?);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::{AwsError, BucketProbe, MockIamOperations, MockS3Operations};
    use crate::config::default_inline_policy;
    use cloudseed_common::ErrorKind;
    use std::time::Duration;

    fn retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            request_timeout: Duration::from_secs(5),
        }
    }

    fn principal_config() -> PrincipalConfig {
        PrincipalConfig::with_defaults("svc-deployer")
    }

    fn bucket_config() -> BucketConfig {
        BucketConfig {
            bucket_name: "data1233027".to_string(),
            region: "us-east-1".to_string(),
        }
    }

    fn states(report: &ProvisionReport) -> Vec<ProvisionState> {
        report.steps().iter().map(|s| s.state).collect()
    }

    #[tokio::test]
    async fn fresh_principal_is_created_and_bound() {
        let mut iam = MockIamOperations::new();
        iam.expect_create_user().times(1).returning(|_| Ok(()));
        iam.expect_put_user_policy()
            .times(1)
            .returning(|_, _, _| Ok(()));
        iam.expect_attach_user_policy()
            .times(1)
            .returning(|_, _| Ok(()));

        let report = provision_principal(&iam, &principal_config(), &retry(), None)
            .await
            .unwrap();

        assert_eq!(
            states(&report),
            vec![
                ProvisionState::Created,
                ProvisionState::Bound,
                ProvisionState::Bound
            ]
        );
        assert_eq!(report.exit_code(), 0);
    }

    #[tokio::test]
    async fn existing_principal_still_gets_bindings() {
        let mut iam = MockIamOperations::new();
        iam.expect_create_user()
            .times(1)
            .returning(|_| Err(AwsError::AlreadyExists));
        iam.expect_put_user_policy()
            .times(1)
            .returning(|_, _, _| Ok(()));
        iam.expect_attach_user_policy()
            .times(1)
            .returning(|_, _| Ok(()));

        let report = provision_principal(&iam, &principal_config(), &retry(), None)
            .await
            .unwrap();

        assert_eq!(
            report.step(Step::EnsurePrincipal).unwrap().state,
            ProvisionState::AlreadyExists
        );
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn failed_principal_leaves_bindings_not_requested() {
        let mut iam = MockIamOperations::new();
        iam.expect_create_user().times(1).returning(|_| {
            Err(AwsError::AccessDenied {
                message: "denied".to_string(),
            })
        });
        iam.expect_put_user_policy().never();
        iam.expect_attach_user_policy().never();

        let report = provision_principal(&iam, &principal_config(), &retry(), None)
            .await
            .unwrap();

        assert_eq!(
            states(&report),
            vec![
                ProvisionState::Failed(ErrorKind::PermissionDenied),
                ProvisionState::NotRequested,
                ProvisionState::NotRequested
            ]
        );
        assert_eq!(report.exit_code(), 2);
    }

    #[tokio::test]
    async fn invalid_principal_name_fails_validation_only() {
        let mut iam = MockIamOperations::new();
        iam.expect_create_user().never();

        let config = PrincipalConfig {
            principal_name: "not valid!".to_string(),
            ..principal_config()
        };
        let report = provision_principal(&iam, &config, &retry(), None)
            .await
            .unwrap();

        assert_eq!(
            report.step(Step::EnsurePrincipal).unwrap().state,
            ProvisionState::Failed(ErrorKind::Validation)
        );
    }

    #[tokio::test]
    async fn binding_failures_are_recorded_independently() {
        let mut iam = MockIamOperations::new();
        iam.expect_create_user().times(1).returning(|_| Ok(()));
        iam.expect_put_user_policy()
            .times(1)
            .returning(|_, _, _| Ok(()));
        iam.expect_attach_user_policy().times(1).returning(|_, _| {
            Err(AwsError::Rejected {
                code: "LimitExceeded".to_string(),
                message: "Cannot exceed quota for PoliciesPerUser: 10".to_string(),
            })
        });

        let config = PrincipalConfig {
            inline_policy_document: default_inline_policy(),
            ..principal_config()
        };
        let report = provision_principal(&iam, &config, &retry(), None)
            .await
            .unwrap();

        assert_eq!(
            report.step(Step::BindInlinePolicy).unwrap().state,
            ProvisionState::Bound
        );
        let managed = report.step(Step::BindManagedPolicy).unwrap();
        assert_eq!(managed.state, ProvisionState::Failed(ErrorKind::Rejected));
        assert!(managed.detail.as_ref().unwrap().contains("PoliciesPerUser"));
    }

    #[tokio::test]
    async fn bucket_workflow_reports_outcome() {
        let mut s3 = MockS3Operations::new();
        s3.expect_probe_bucket()
            .times(1)
            .returning(|_| Ok(BucketProbe::Missing));
        s3.expect_create_bucket().times(1).returning(|_| Ok(()));

        let report = provision_bucket(&s3, &bucket_config(), &retry(), None)
            .await
            .unwrap();
        assert_eq!(states(&report), vec![ProvisionState::Created]);
    }

    #[tokio::test]
    async fn all_runs_both_workflows_even_if_one_fails() {
        let mut iam = MockIamOperations::new();
        iam.expect_create_user().times(1).returning(|_| Ok(()));
        iam.expect_put_user_policy()
            .times(1)
            .returning(|_, _, _| Ok(()));
        iam.expect_attach_user_policy()
            .times(1)
            .returning(|_, _| Ok(()));

        let mut s3 = MockS3Operations::new();
        s3.expect_probe_bucket()
            .times(1)
            .returning(|_| Ok(BucketProbe::Inconclusive));
        s3.expect_create_bucket()
            .times(1)
            .returning(|_| Err(AwsError::AlreadyOwnedByOther));

        let report = provision_all(
            &iam,
            &s3,
            &principal_config(),
            &bucket_config(),
            &retry(),
            None,
        )
        .await
        .unwrap();

        assert_eq!(report.steps().len(), 4);
        assert_eq!(
            report.step(Step::EnsureBucket).unwrap().state,
            ProvisionState::Failed(ErrorKind::OwnedByOther)
        );
        assert_eq!(
            report.step(Step::BindManagedPolicy).unwrap().state,
            ProvisionState::Bound
        );
        assert_eq!(report.exit_code(), 2);
    }
}

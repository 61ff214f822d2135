//! IAM integration tests - actually call AWS APIs
//!
//! These tests are marked `#[ignore]` and only run with:
//! ```
//! AWS_PROFILE=your_profile cargo test --test aws_iam_integration -- --ignored
//! ```

use cloudseed::aws::{AwsContext, FromAwsContext, IamClient};
use cloudseed::config::PrincipalConfig;
use cloudseed::report::Step;
use cloudseed::retry::RetryPolicy;
use cloudseed::workflow::provision_principal;
use cloudseed_common::ProvisionState;
use cloudseed_common::tags::TAG_TOOL;
use cloudseed_test_utils::{get_test_region, test_user_name};
use std::time::Duration;

/// Remove everything the principal workflow creates
async fn delete_user(ctx: &AwsContext, user: &str, policy_name: &str, policy_arn: &str) {
    let iam = ctx.iam_client();
    let _ = iam
        .delete_user_policy()
        .user_name(user)
        .policy_name(policy_name)
        .send()
        .await;
    let _ = iam
        .detach_user_policy()
        .user_name(user)
        .policy_arn(policy_arn)
        .send()
        .await;
    let _ = iam.delete_user().user_name(user).send().await;
}

/// Test the principal workflow twice against a real account
///
/// This test verifies:
/// 1. First run creates the user and binds both policies
/// 2. Second run reports the user as already existing and re-binds
/// 3. The created user carries the tool tag
#[tokio::test]
#[ignore]
async fn test_principal_workflow_is_idempotent() {
    let region = get_test_region();
    let ctx = AwsContext::new(&region, Duration::from_secs(30)).await;
    let iam = IamClient::from_context(&ctx);

    let user = test_user_name();
    let config = PrincipalConfig::with_defaults(user.clone());
    let retry = RetryPolicy::default();

    let first = provision_principal(&iam, &config, &retry, None)
        .await
        .expect("Should produce a report");
    let second = provision_principal(&iam, &config, &retry, None)
        .await
        .expect("Should produce a report");

    let tags = ctx
        .iam_client()
        .list_user_tags()
        .user_name(&user)
        .send()
        .await;

    delete_user(
        &ctx,
        &user,
        &config.inline_policy_name,
        &config.managed_policy_arn,
    )
    .await;

    assert!(first.is_success(), "first run failed: {first:?}");
    assert_eq!(
        first.step(Step::EnsurePrincipal).unwrap().state,
        ProvisionState::Created
    );
    assert!(second.is_success(), "second run failed: {second:?}");
    assert_eq!(
        second.step(Step::EnsurePrincipal).unwrap().state,
        ProvisionState::AlreadyExists
    );

    let tags = tags.expect("Should list user tags");
    assert!(tags.tags().iter().any(|t| t.key() == TAG_TOOL));
}

/// Binding a policy to a user that does not exist fails as a rejection
#[tokio::test]
#[ignore]
async fn test_bind_to_missing_user_is_rejected() {
    use cloudseed::provision::PolicyBinder;
    use cloudseed_common::ErrorKind;

    let region = get_test_region();
    let iam = IamClient::new(&region, Duration::from_secs(30)).await;

    let err = PolicyBinder::new(&iam, RetryPolicy::default())
        .bind_managed(
            &test_user_name(),
            "arn:aws:iam::aws:policy/AmazonS3ReadOnlyAccess",
        )
        .await
        .expect_err("Should fail for a missing user");

    assert_eq!(err.kind(), ErrorKind::Rejected);
    assert_eq!(err.operation(), Some("attach-user-policy"));
}

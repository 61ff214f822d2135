//! cloudseed: idempotent IAM user and S3 bucket provisioning
//!
//! Creates an IAM user with an inline and a managed policy, and an S3 bucket
//! in a chosen region. Re-running against existing resources is safe.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cloudseed::aws::context::AwsContext;
use cloudseed::aws::{FromAwsContext, IamClient, S3Client};
use cloudseed::config::{self, AwsConfig, BucketConfig, PrincipalConfig, ProvisionConfig};
use cloudseed::report::ProvisionReport;
use cloudseed::retry::RetryPolicy;
use cloudseed::workflow;
use cloudseed_common::defaults::{
    DEFAULT_INLINE_POLICY_NAME, DEFAULT_MANAGED_POLICY_ARN, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_REGION, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "cloudseed")]
#[command(about = "Idempotent provisioning of IAM users, user policies and S3 buckets")]
#[command(version)]
struct Args {
    /// AWS region for IAM calls and the default bucket region
    #[arg(long, global = true, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    region: String,

    /// AWS profile to use (overrides AWS_PROFILE env var)
    #[arg(long, global = true)]
    aws_profile: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Attempts per provider call, including the first
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,

    /// Write the report as JSON to this file
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Inline and managed policy selection
#[derive(clap::Args, Debug)]
struct PolicyArgs {
    /// Name of the inline policy written onto the user
    #[arg(long, default_value = DEFAULT_INLINE_POLICY_NAME)]
    policy_name: String,

    /// JSON policy document for the inline policy (default: S3 read access)
    #[arg(long)]
    policy_file: Option<PathBuf>,

    /// Managed policy attached to the user
    #[arg(long, default_value = DEFAULT_MANAGED_POLICY_ARN)]
    managed_policy_arn: String,
}

impl PolicyArgs {
    async fn into_principal_config(self, principal_name: String) -> Result<PrincipalConfig> {
        let inline_policy_document = match &self.policy_file {
            Some(path) => config::load_policy_document(path).await?,
            None => config::default_inline_policy(),
        };

        Ok(PrincipalConfig {
            principal_name,
            inline_policy_name: self.policy_name,
            inline_policy_document,
            managed_policy_arn: self.managed_policy_arn,
        })
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ensure an IAM user exists and bind its policies
    User {
        /// IAM user name
        #[arg(long)]
        name: String,

        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Ensure an S3 bucket exists
    Bucket {
        /// Bucket name
        #[arg(long)]
        name: String,

        /// Bucket region (defaults to --region)
        #[arg(long = "bucket-region")]
        bucket_region: Option<String>,
    },

    /// Run the user and bucket workflows concurrently
    All {
        /// IAM user name
        #[arg(long)]
        user: String,

        /// Bucket name
        #[arg(long)]
        bucket: String,

        /// Bucket region (defaults to --region)
        #[arg(long = "bucket-region")]
        bucket_region: Option<String>,

        #[command(flatten)]
        policy: PolicyArgs,
    },
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            print_error(&e);
            std::process::exit(1);
        }
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    // AWS SDK internals stay at warn unless RUST_LOG says otherwise
    let mut filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());
    for target in ["aws_config", "aws_sdk_iam", "aws_sdk_s3", "aws_smithy_runtime", "hyper"] {
        if let Ok(directive) = format!("{target}=warn").parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn build_config(args: Args) -> Result<ProvisionConfig> {
    let aws = AwsConfig {
        region: args.region,
        aws_profile: args.aws_profile,
    };
    let retry = RetryPolicy {
        max_attempts: args.max_attempts.max(1),
        request_timeout: Duration::from_secs(args.timeout_secs),
        ..RetryPolicy::default()
    };

    let (principal, bucket) = match args.command {
        Command::User { name, policy } => (Some(policy.into_principal_config(name).await?), None),
        Command::Bucket {
            name,
            bucket_region,
        } => (
            None,
            Some(BucketConfig {
                bucket_name: name,
                region: bucket_region.unwrap_or_else(|| aws.region.clone()),
            }),
        ),
        Command::All {
            user,
            bucket,
            bucket_region,
            policy,
        } => (
            Some(policy.into_principal_config(user).await?),
            Some(BucketConfig {
                bucket_name: bucket,
                region: bucket_region.unwrap_or_else(|| aws.region.clone()),
            }),
        ),
    };

    Ok(ProvisionConfig {
        aws,
        retry,
        principal,
        bucket,
    })
}

/// Cancel `token` on Ctrl-C so in-flight calls stop and the report still prints
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling in-flight requests");
            token.cancel();
        }
    });
}

async fn run() -> Result<i32> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Some(profile) = &args.aws_profile {
        info!(profile = %profile, "Using AWS profile");
    }

    let output = args.output.clone();
    let cfg = build_config(args).await?;
    let profile = cfg.aws.aws_profile.as_deref();
    let timeout = cfg.retry.request_timeout;

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let iam_ctx = AwsContext::with_profile(&cfg.aws.region, profile, timeout).await;

    let report = match (&cfg.principal, &cfg.bucket) {
        (Some(principal), None) => {
            let iam = IamClient::from_context(&iam_ctx);
            workflow::provision_principal(&iam, principal, &cfg.retry, Some(&cancel)).await?
        }
        (None, Some(bucket)) => {
            let s3_ctx = AwsContext::with_profile(&bucket.region, profile, timeout).await;
            let s3 = S3Client::from_context(&s3_ctx);
            workflow::provision_bucket(&s3, bucket, &cfg.retry, Some(&cancel)).await?
        }
        (Some(principal), Some(bucket)) => {
            let s3_ctx = AwsContext::with_profile(&bucket.region, profile, timeout).await;
            let iam = IamClient::from_context(&iam_ctx);
            let s3 = S3Client::from_context(&s3_ctx);
            workflow::provision_all(&iam, &s3, principal, bucket, &cfg.retry, Some(&cancel))
                .await?
        }
        (None, None) => ProvisionReport::new(),
    };

    report.print_summary();

    if let Some(path) = &output {
        report
            .write_json(path)
            .await
            .with_context(|| format!("report not saved to {}", path.display()))?;
    }

    Ok(report.exit_code())
}

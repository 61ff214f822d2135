//! Naming and region helpers for credentialed cloudseed tests
//!
//! Every live test provisions its own throwaway user or bucket. The names
//! produced here never collide between runs and are accepted by both the IAM
//! user-name rules and the stricter S3 bucket-name rules.

use chrono::Utc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Prefix shared by every resource a live test creates
const RESOURCE_PREFIX: &str = "cloudseed";

/// Region used when the environment names none
const FALLBACK_REGION: &str = "us-east-1";

/// Region the live tests run against.
///
/// `AWS_REGION` wins over `AWS_DEFAULT_REGION`; with neither set the tests
/// target the default region, where buckets need no location constraint.
///
/// ```
/// use cloudseed_test_utils::aws::get_test_region;
///
/// assert!(!get_test_region().is_empty());
/// ```
pub fn get_test_region() -> String {
    std::env::var("AWS_REGION")
        .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
        .unwrap_or_else(|_| FALLBACK_REGION.to_string())
}

/// Identifier for one live test resource: `test-<epoch millis>-<sequence>`.
///
/// The in-process sequence number separates calls landing in the same
/// millisecond.
///
/// ```
/// use cloudseed_test_utils::aws::test_run_id;
///
/// assert!(test_run_id().starts_with("test-"));
/// ```
pub fn test_run_id() -> String {
    static SEQUENCE: AtomicU32 = AtomicU32::new(0);

    let millis = Utc::now().timestamp_millis();
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("test-{millis}-{seq}")
}

/// Lowercase, DNS-safe bucket name for a live test
pub fn test_bucket_name() -> String {
    format!("{RESOURCE_PREFIX}-{}", test_run_id())
}

/// IAM user name for a live test
pub fn test_user_name() -> String {
    format!("{RESOURCE_PREFIX}-{}", test_run_id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_has_millis_and_sequence() {
        let run_id = test_run_id();
        let (millis, seq) = run_id
            .strip_prefix("test-")
            .and_then(|rest| rest.split_once('-'))
            .unwrap();
        millis.parse::<i64>().expect("Should be epoch millis");
        seq.parse::<u32>().expect("Should be a sequence number");
    }

    #[test]
    fn consecutive_run_ids_differ() {
        assert_ne!(test_run_id(), test_run_id());
    }

    #[test]
    fn bucket_names_are_dns_safe() {
        let bucket = test_bucket_name();
        assert!(bucket.starts_with("cloudseed-test-"));
        assert!(bucket.len() <= 63);
        assert!(
            bucket
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        );
    }

    #[test]
    fn user_names_fit_iam_limit() {
        let user = test_user_name();
        assert!(user.starts_with("cloudseed-test-"));
        assert!(user.len() <= 64);
    }
}

//! cloudseed - idempotent provisioning of IAM users and S3 buckets
//!
//! Every operation is create-or-detect: running it again against an
//! unchanged account reports `AlreadyExists` (or a re-bound policy) instead
//! of failing.

pub mod aws;
pub mod config;
pub mod error;
pub mod provision;
pub mod report;
pub mod retry;
pub mod workflow;

//! Helpers shared by the cloudseed integration tests
//!
//! Only the `#[ignore]`d tests that talk to a real account need these.

pub mod aws;

pub use aws::{get_test_region, test_bucket_name, test_run_id, test_user_name};

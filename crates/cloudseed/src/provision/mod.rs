//! Idempotent create-or-detect components
//!
//! Each component wraps one provider trait, validates its inputs before any
//! network call, and turns provider answers into an [`Outcome`] or a
//! [`ProvisionError`].
//!
//! [`Outcome`]: cloudseed_common::Outcome
//! [`ProvisionError`]: crate::error::ProvisionError

pub mod binder;
pub mod bucket;
pub mod principal;

pub use binder::{BindingResults, PolicyBinder};
pub use bucket::BucketProvisioner;
pub use principal::PrincipalProvisioner;

//! cloudseed-common - Shared types for cloudseed
//!
//! This crate holds everything the provisioning workflows share that does not
//! need the AWS SDK, so it stays lightweight and easy to test.
//!
//! ## Modules
//!
//! - [`defaults`]: Default configuration values
//! - [`error`]: Local validation errors
//! - [`names`]: Validated resource identifiers
//! - [`policy`]: IAM policy document model
//! - [`state`]: Provisioning outcomes and the per-step state machine
//! - [`tags`]: Resource tag constants

pub mod defaults;
pub mod error;
pub mod names;
pub mod policy;
pub mod state;
pub mod tags;

// Re-export commonly used types
pub use error::ValidationError;
pub use names::{BucketName, ManagedPolicyArn, PolicyName, PrincipalName, Region};
pub use policy::{Effect, PolicyDocument, ResourceSelector, Statement};
pub use state::{ErrorKind, Outcome, ProvisionState, TransitionError};

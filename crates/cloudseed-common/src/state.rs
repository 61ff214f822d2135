//! Provisioning outcomes and the per-step state machine
//!
//! Every provisioning step follows the same shape:
//!
//! ```text
//! NotRequested -> Requesting -> { Created | AlreadyExists | Bound | Failed(kind) }
//! ```
//!
//! Terminal states never transition again within one invocation.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Successful result of an ensure-style operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// This call created the resource
    Created,
    /// The resource was already present and belongs to the caller
    AlreadyExists,
}

/// Failure categories, shared by errors and the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad local input; no request was sent
    Validation,
    /// Bucket name is claimed by another account
    OwnedByOther,
    /// Provider rate limit (transient)
    Throttled,
    /// Provider-side 5xx or connection failure (transient)
    Unavailable,
    /// Credentials lack the required permission
    PermissionDenied,
    /// Provider refused the request as invalid
    Rejected,
    /// No answer within the request timeout; remote outcome unknown
    Timeout,
    /// Caller cancelled mid-call; remote outcome unknown
    Cancelled,
    /// Anything else, with the provider message preserved by the error
    Unknown,
}

impl ErrorKind {
    /// Same spelling as the serialized form
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::OwnedByOther => "owned_by_other",
            ErrorKind::Throttled => "throttled",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::Rejected => "rejected",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// Transient kinds are worth another attempt with backoff
    pub fn is_transient(self) -> bool {
        matches!(self, ErrorKind::Throttled | ErrorKind::Unavailable)
    }

    /// The remote side may or may not have applied the request
    pub fn is_indeterminate(self) -> bool {
        matches!(self, ErrorKind::Timeout | ErrorKind::Cancelled)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of one provisioning step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "state", content = "kind", rename_all = "snake_case")]
pub enum ProvisionState {
    NotRequested,
    Requesting,
    Created,
    AlreadyExists,
    /// A policy binding call succeeded
    Bound,
    Failed(ErrorKind),
}

/// Attempted move between two states the machine does not connect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid provisioning state transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: ProvisionState,
    pub to: ProvisionState,
}

impl ProvisionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ProvisionState::Created
                | ProvisionState::AlreadyExists
                | ProvisionState::Bound
                | ProvisionState::Failed(_)
        )
    }

    pub fn is_success(self) -> bool {
        matches!(
            self,
            ProvisionState::Created | ProvisionState::AlreadyExists | ProvisionState::Bound
        )
    }

    pub fn is_failed(self) -> bool {
        matches!(self, ProvisionState::Failed(_))
    }

    /// `NotRequested -> Requesting`
    pub fn request(self) -> Result<Self, TransitionError> {
        self.advance(ProvisionState::Requesting)
    }

    /// `Requesting -> terminal`
    pub fn settle(self, terminal: ProvisionState) -> Result<Self, TransitionError> {
        self.advance(terminal)
    }

    fn advance(self, to: ProvisionState) -> Result<Self, TransitionError> {
        let allowed = match (self, to) {
            (ProvisionState::NotRequested, ProvisionState::Requesting) => true,
            (ProvisionState::Requesting, next) => next.is_terminal(),
            _ => false,
        };
        if allowed {
            Ok(to)
        } else {
            Err(TransitionError { from: self, to })
        }
    }
}

impl From<Outcome> for ProvisionState {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Created => ProvisionState::Created,
            Outcome::AlreadyExists => ProvisionState::AlreadyExists,
        }
    }
}

impl fmt::Display for ProvisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionState::NotRequested => f.write_str("not requested"),
            ProvisionState::Requesting => f.write_str("requesting"),
            ProvisionState::Created => f.write_str("created"),
            ProvisionState::AlreadyExists => f.write_str("already exists"),
            ProvisionState::Bound => f.write_str("bound"),
            ProvisionState::Failed(kind) => write!(f, "failed ({kind})"),
        }
    }
}

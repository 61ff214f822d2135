//! Local validation errors
//!
//! Raised before any provider call is made.

use thiserror::Error;

/// Input rejected locally, without a network round trip
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Identifier is empty
    #[error("{kind} cannot be empty")]
    Empty { kind: &'static str },

    /// Identifier shorter than the provider minimum
    #[error("{kind} must be at least {min} characters, got {len}")]
    TooShort {
        kind: &'static str,
        min: usize,
        len: usize,
    },

    /// Identifier longer than the provider maximum
    #[error("{kind} must be at most {max} characters, got {len}")]
    TooLong {
        kind: &'static str,
        max: usize,
        len: usize,
    },

    /// Identifier contains a character outside the allowed set
    #[error("{kind} '{value}' contains disallowed character {found:?}")]
    InvalidChar {
        kind: &'static str,
        value: String,
        found: char,
    },

    /// Identifier has the right characters but the wrong shape
    #[error("{kind} '{value}' is malformed: {reason}")]
    Malformed {
        kind: &'static str,
        value: String,
        reason: &'static str,
    },

    /// Policy document could not be parsed or serialized
    #[error("invalid policy document: {0}")]
    PolicyDocument(String),
}

impl ValidationError {
    /// Name of the input kind that failed validation
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::Empty { kind }
            | ValidationError::TooShort { kind, .. }
            | ValidationError::TooLong { kind, .. }
            | ValidationError::InvalidChar { kind, .. }
            | ValidationError::Malformed { kind, .. } => kind,
            ValidationError::PolicyDocument(_) => "policy document",
        }
    }
}

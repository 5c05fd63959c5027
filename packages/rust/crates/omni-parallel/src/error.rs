//! Error types for the parallel job manager.
//!
//! Follows ODF-EP: Explicit error enums with context. Failures of an individual
//! job are not errors here; they are recorded as `JobOutcome::Failed`.

use std::fmt;

use thiserror::Error;

/// Which kind of member a shape check found missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Named data member.
    Property,
    /// Callable member with overload signatures.
    Method,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property => f.write_str("property"),
            Self::Method => f.write_str("method"),
        }
    }
}

/// Manager-level errors.
#[derive(Error, Debug)]
pub enum ParallelError {
    /// Invalid construction parameters (e.g. throttle < 1).
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Operation not allowed in the manager's current lifecycle state.
    #[error("Invalid state: {0}")]
    State(String),

    /// Slot pool or host environment became unusable.
    #[error("Resource unavailable: {0}")]
    Resource(String),

    /// Candidate object does not satisfy the expected shape.
    #[error("The object is not of type {shape}. Missing {kind} {member}")]
    ShapeMismatch {
        /// Name of the expected shape.
        shape: String,
        /// Member that could not be matched.
        member: String,
        /// Property or method.
        kind: MemberKind,
    },

    /// Member definition could not be parsed.
    #[error("Unsupported definition: {0}")]
    InvalidDefinition(String),
}

/// Result type for manager operations.
pub type Result<T> = std::result::Result<T, ParallelError>;

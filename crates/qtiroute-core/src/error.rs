//! Error taxonomy for route construction, navigation and branching.

use crate::component::ComponentKind;

/// Coarse classification of a [`RouteError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No valid target: empty route, position past either end, unknown
    /// identifier, or a rejected branch.
    OutOfBounds,
    /// The value handed to an operation is unusable: malformed branch target
    /// or a structurally inconsistent step.
    InvalidArgument,
}

/// A branch target that resolves but breaks the QTI topology rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BranchingViolation {
    #[error(
        "target '{target}' lies in test part '{target_part}', outside the current test part '{current_part}'"
    )]
    LeavesTestPart {
        target: String,
        current_part: String,
        target_part: String,
    },

    #[error("cannot branch to '{target}': it is the current test part")]
    SameTestPart { target: String },
}

/// Errors produced by route operations.
///
/// Every error leaves the route exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("route is empty")]
    EmptyRoute,

    #[error("position {position} is out of bounds for a route of {len} steps")]
    PositionOutOfBounds { position: usize, len: usize },

    #[error("no {kind} '{key}' in route")]
    UnknownComponent { kind: ComponentKind, key: String },

    #[error("item '{identifier}' has {count} occurrence(s); occurrence index {occurrence} requested")]
    UnknownOccurrence {
        identifier: String,
        occurrence: u32,
        count: u32,
    },

    #[error("branch target '{target}' does not name an item, section or test part of the route")]
    UnresolvedBranchTarget { target: String },

    #[error("malformed branch target '{target}': {reason}")]
    MalformedBranchTarget { target: String, reason: String },

    #[error("step '{step}' is structurally invalid: {reason}")]
    InvalidStep { step: String, reason: String },

    #[error("branching violation: {0}")]
    Branching(#[from] BranchingViolation),
}

impl RouteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RouteError::MalformedBranchTarget { .. } | RouteError::InvalidStep { .. } => {
                ErrorKind::InvalidArgument
            }
            RouteError::EmptyRoute
            | RouteError::PositionOutOfBounds { .. }
            | RouteError::UnknownComponent { .. }
            | RouteError::UnknownOccurrence { .. }
            | RouteError::UnresolvedBranchTarget { .. }
            | RouteError::Branching(_) => ErrorKind::OutOfBounds,
        }
    }

    pub fn is_branching_violation(&self) -> bool {
        matches!(self, RouteError::Branching(_))
    }

    pub(crate) fn unknown(kind: ComponentKind, key: impl ToString) -> Self {
        RouteError::UnknownComponent {
            kind,
            key: key.to_string(),
        }
    }
}

/// Result type for route operations.
pub type RouteResult<T> = std::result::Result<T, RouteError>;

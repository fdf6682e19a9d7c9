//! Error types for loading and editing test definitions.

use crate::component::ComponentKind;
use crate::error::RouteError;

/// Errors produced by the definition arena and the route builder.
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    #[error("invalid identifier '{identifier}'")]
    InvalidIdentifier { identifier: String },

    #[error("duplicate {kind} identifier '{identifier}'")]
    DuplicateIdentifier {
        kind: ComponentKind,
        identifier: String,
    },

    #[error("unknown {kind} '{key}'")]
    UnknownComponent { kind: ComponentKind, key: String },

    #[error("invalid placement: {reason}")]
    InvalidPlacement { reason: String },

    #[error("test '{identifier}' declares no test parts")]
    NoTestParts { identifier: String },

    #[error("route error: {0}")]
    Route(#[from] RouteError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for definition operations.
pub type DefinitionResult<T> = std::result::Result<T, DefinitionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_identifier_display() {
        let err = DefinitionError::DuplicateIdentifier {
            kind: ComponentKind::Section,
            identifier: "S1".to_string(),
        };
        assert_eq!(err.to_string(), "duplicate section identifier 'S1'");
    }

    #[test]
    fn test_route_error_converts() {
        let err: DefinitionError = RouteError::EmptyRoute.into();
        assert!(err.to_string().contains("route is empty"));
    }
}

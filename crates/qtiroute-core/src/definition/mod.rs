//! Test definitions as seen by the route engine.
//!
//! - [`ids`]: stable arena ids (`TestId`, `TestPartId`, `SectionId`, `ItemRefId`)
//! - [`model`]: `Test`, `TestPart`, `Section`, `ItemRef` and their policies
//! - [`document`]: serde documents for loading a definition
//! - [`arena`]: `TestDefinition`, placements and explicit re-key operations
//! - [`error`]: `DefinitionError`, `DefinitionResult`

pub mod arena;
pub mod document;
pub mod error;
pub mod ids;
pub mod model;

pub use arena::{load_definition, Placement, TestDefinition};
pub use document::{
    ContentDocument, ItemRefDocument, SectionDocument, TestDocument, TestPartDocument,
};
pub use error::{DefinitionError, DefinitionResult};
pub use ids::{ItemRefId, SectionId, TestId, TestPartId};
pub use model::{
    is_valid_identifier, BranchRule, Expression, ItemRef, ItemSessionControl, NavigationMode,
    Section, SubmissionMode, Test, TestPart, TimeLimits,
};

//! QTI route engine.
//!
//! Turns a resolved test structure (test parts, nested sections, item
//! references) into a flat route of steps that a delivery session steps
//! through, branches within and queries.
//!
//! - [`definition`]: the definition arena, models and JSON documents
//! - [`step`]: steps and effective session-control / time-limit resolution
//! - [`route`]: the route, its cursor, indices, queries and branching
//! - [`builder`]: route construction from a definition
//! - [`obs`], [`metrics`], [`telemetry`]: tracing hooks and counters

pub mod builder;
pub mod component;
pub mod definition;
pub mod error;
pub mod metrics;
pub mod obs;
pub mod occurrence;
pub mod route;
pub mod step;
pub mod telemetry;

pub use builder::RouteBuilder;
pub use component::{ComponentKind, StructuralComponent, StructuralComponentMut};
pub use definition::{
    is_valid_identifier, load_definition, BranchRule, ContentDocument, DefinitionError,
    DefinitionResult, Expression, ItemRef, ItemRefDocument, ItemRefId, ItemSessionControl,
    NavigationMode, Placement, Section, SectionDocument, SectionId, SubmissionMode, Test,
    TestDefinition, TestDocument, TestId, TestPart, TestPartDocument, TestPartId, TimeLimits,
};
pub use error::{BranchingViolation, ErrorKind, RouteError, RouteResult};
pub use metrics::{MetricsSnapshot, METRICS};
pub use obs::{
    emit_branch_rejected, emit_branch_taken, emit_route_appended, emit_step_appended, SessionSpan,
};
pub use occurrence::ItemOccurrence;
pub use route::branch::BranchTarget;
pub use route::query::{CategoryFilter, ItemKey, PartKey, SectionKey};
pub use route::Route;
pub use step::{Owner, Step};
pub use telemetry::init_tracing;

/// Crate version, as reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

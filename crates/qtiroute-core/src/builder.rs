//! Turning a definition's placements into a route.

use std::sync::Arc;

use tracing::info;

use crate::definition::{DefinitionResult, Placement, TestDefinition};
use crate::route::Route;
use crate::step::Step;

/// Builds a [`Route`] with one step per placement.
///
/// By default the definition's own placements are used, in presentation
/// order. A driver that has already applied selection and ordering hands its
/// resolved placements to [`RouteBuilder::with_placements`].
#[derive(Debug)]
pub struct RouteBuilder<'d> {
    definition: &'d TestDefinition,
    placements: Option<Vec<Placement>>,
}

impl<'d> RouteBuilder<'d> {
    pub fn new(definition: &'d TestDefinition) -> Self {
        Self {
            definition,
            placements: None,
        }
    }

    /// Build a route straight from the definition's placements.
    pub fn from_definition(definition: &'d TestDefinition) -> DefinitionResult<Route> {
        Self::new(definition).build()
    }

    pub fn with_placements(mut self, placements: Vec<Placement>) -> Self {
        self.placements = Some(placements);
        self
    }

    pub fn build(self) -> DefinitionResult<Route> {
        let definition = self.definition;
        let placements = self
            .placements
            .as_deref()
            .unwrap_or_else(|| definition.placements());

        let mut route = Route::new();
        for placement in placements {
            route.add_step(self.step_for(placement)?)?;
        }

        info!(
            test = %definition.test().identifier(),
            steps = route.len(),
            test_parts = route.test_part_identifiers().len(),
            "route built"
        );
        Ok(route)
    }

    fn step_for(&self, placement: &Placement) -> DefinitionResult<Step> {
        let definition = self.definition;
        let test_part = definition.test_part(placement.test_part)?;
        let sections = placement
            .sections
            .iter()
            .map(|id| definition.section(*id).map(Arc::clone))
            .collect::<DefinitionResult<Vec<_>>>()?;
        let item_ref = definition.item_ref(placement.item_ref)?;

        Ok(Step::new(
            Arc::clone(definition.test()),
            Arc::clone(test_part),
            sections,
            Arc::clone(item_ref),
        ))
    }
}

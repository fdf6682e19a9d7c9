//! The route: the ordered steps of one test-taking session, a cursor over
//! them, and the indices used for lookups and branching.
//!
//! # Module layout
//!
//! - `index`: incremental item, category, section and test-part indices
//! - [`query`]: lookup keys, `CategoryFilter`, the read-only query surface
//! - [`branch`]: `BranchTarget` parsing and branch resolution

pub mod branch;
mod index;
pub mod query;

use tracing::debug;

use crate::definition::TestPart;
use crate::error::{RouteError, RouteResult};
use crate::metrics::METRICS;
use crate::obs;
use crate::step::Step;

use index::RouteIndex;

/// Ordered, randomly addressable steps with a movable cursor.
///
/// A route belongs to exactly one session. The cursor is the only state that
/// changes once the route is built.
#[derive(Debug, Default)]
pub struct Route {
    steps: Vec<Step>,
    position: usize,
    index: RouteIndex,
}

impl Route {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// All steps in route order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn get(&self, position: usize) -> RouteResult<&Step> {
        self.steps.get(position).ok_or(RouteError::PositionOutOfBounds {
            position,
            len: self.steps.len(),
        })
    }

    /// Append `step` and register it in every index.
    ///
    /// The step's occurrence index becomes the number of steps already
    /// registered under the same item identifier. A structurally invalid step
    /// is rejected and the route is left untouched.
    pub fn add_step(&mut self, mut step: Step) -> RouteResult<()> {
        step.validate_structure()?;

        let occurrence = self.index.occurrence_count(step.item_ref().identifier());
        step.set_occurrence(occurrence as u32);

        let position = self.steps.len();
        self.index.register(position, &step);
        obs::emit_step_appended(
            position,
            &step.occurrence().identifier(),
            step.test_part().identifier(),
        );
        self.steps.push(step);
        METRICS.inc_steps_appended();
        Ok(())
    }

    /// Append a copy of every step of `other`, in order.
    ///
    /// Copies get fresh occurrences numbered for this route; `other` keeps its
    /// own numbering.
    pub fn append_route(&mut self, other: &Route) -> RouteResult<()> {
        for step in &other.steps {
            self.add_step(step.with_fresh_occurrence())?;
        }
        obs::emit_route_appended(other.len(), self.len());
        METRICS.inc_routes_composed();
        Ok(())
    }

    // Cursor -------------------------------------------------------------

    /// The step under the cursor.
    pub fn current(&self) -> RouteResult<&Step> {
        if self.steps.is_empty() {
            return Err(RouteError::EmptyRoute);
        }
        self.get(self.position)
    }

    /// Cursor position.
    pub fn key(&self) -> usize {
        self.position
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// `true` while the cursor points at a step.
    pub fn valid(&self) -> bool {
        self.position < self.steps.len()
    }

    /// Move forward. Past the last step the cursor becomes invalid; it never
    /// moves further than one past the end.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) {
        if self.position < self.steps.len() {
            self.position += 1;
        }
    }

    /// Move backward, stopping at the first step.
    pub fn previous(&mut self) {
        self.position = self.position.saturating_sub(1);
    }

    pub fn rewind(&mut self) {
        self.position = 0;
    }

    pub fn set_position(&mut self, position: usize) -> RouteResult<()> {
        self.get(position)?;
        debug!(from = self.position, to = position, "route cursor moved");
        self.position = position;
        Ok(())
    }

    pub fn is_first(&self) -> bool {
        self.valid() && self.position == 0
    }

    pub fn is_last(&self) -> bool {
        self.valid() && self.position + 1 == self.steps.len()
    }

    /// The step after the cursor, without moving.
    pub fn peek_next(&self) -> RouteResult<&Step> {
        self.current()?;
        self.get(self.position + 1)
    }

    /// The step before the cursor, without moving.
    pub fn peek_previous(&self) -> RouteResult<&Step> {
        self.current()?;
        match self.position.checked_sub(1) {
            Some(position) => self.get(position),
            None => Err(RouteError::PositionOutOfBounds {
                position: 0,
                len: self.steps.len(),
            }),
        }
    }

    /// `true` when the previous step, if any, belongs to another test part.
    pub fn is_first_of_test_part(&self) -> RouteResult<bool> {
        let current = self.current()?;
        Ok(match self.position.checked_sub(1) {
            Some(previous) => self.steps[previous].test_part().id() != current.test_part().id(),
            None => true,
        })
    }

    /// `true` when the next step, if any, belongs to another test part.
    pub fn is_last_of_test_part(&self) -> RouteResult<bool> {
        let current = self.current()?;
        Ok(match self.steps.get(self.position + 1) {
            Some(next) => next.test_part().id() != current.test_part().id(),
            None => true,
        })
    }

    pub fn current_test_part(&self) -> RouteResult<&TestPart> {
        self.current().map(Step::test_part)
    }

    pub fn is_navigation_linear(&self) -> RouteResult<bool> {
        Ok(self.current()?.navigation_mode() == crate::definition::NavigationMode::Linear)
    }

    pub fn is_navigation_nonlinear(&self) -> RouteResult<bool> {
        self.is_navigation_linear().map(|linear| !linear)
    }
}

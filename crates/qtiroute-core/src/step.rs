//! Steps: one presented item occurrence with its structural ancestry, and the
//! resolution of effective session control and time limits along that
//! ancestry.

use std::sync::Arc;

use crate::component::{ComponentKind, StructuralComponent};
use crate::definition::{
    BranchRule, Expression, ItemRef, ItemSessionControl, NavigationMode, Section, SectionId,
    SubmissionMode, Test, TestPart, TimeLimits,
};
use crate::error::{RouteError, RouteResult};
use crate::occurrence::ItemOccurrence;

/// The structural level a resolved policy was declared on.
#[derive(Debug, Clone, Copy)]
pub enum Owner<'a> {
    Test(&'a Test),
    TestPart(&'a TestPart),
    Section(&'a Section),
    Item(&'a ItemOccurrence),
}

impl<'a> Owner<'a> {
    pub fn kind(&self) -> ComponentKind {
        self.component().kind()
    }

    /// Identifier of the owner; for an item this is the occurrence identifier.
    pub fn identifier(&self) -> String {
        match self {
            Owner::Test(test) => test.identifier().to_string(),
            Owner::TestPart(part) => part.identifier().to_string(),
            Owner::Section(section) => section.identifier().to_string(),
            Owner::Item(occurrence) => occurrence.identifier(),
        }
    }

    pub fn component(&self) -> &'a dyn StructuralComponent {
        match *self {
            Owner::Test(test) => test as &dyn StructuralComponent,
            Owner::TestPart(part) => part as &dyn StructuralComponent,
            Owner::Section(section) => section as &dyn StructuralComponent,
            Owner::Item(occurrence) => occurrence as &dyn StructuralComponent,
        }
    }
}

/// One item occurrence together with its test, test part and section chain.
///
/// Steps are not `Clone`: duplicating one goes through
/// [`Step::with_fresh_occurrence`], which copies only the occurrence.
#[derive(Debug)]
pub struct Step {
    test: Arc<Test>,
    test_part: Arc<TestPart>,
    /// Outermost first.
    sections: Arc<[Arc<Section>]>,
    occurrence: ItemOccurrence,
    preconditions: Arc<[Expression]>,
    branch_rules: Arc<[BranchRule]>,
}

impl Step {
    /// Build a step for `item_ref`, taking its preconditions and branch rules.
    ///
    /// Structural consistency is checked when the step is appended to a route.
    pub fn new(
        test: Arc<Test>,
        test_part: Arc<TestPart>,
        sections: Vec<Arc<Section>>,
        item_ref: Arc<ItemRef>,
    ) -> Self {
        let preconditions = item_ref.preconditions.clone().into();
        let branch_rules = item_ref.branch_rules.clone().into();
        Self {
            test,
            test_part,
            sections: sections.into(),
            occurrence: ItemOccurrence::new(item_ref),
            preconditions,
            branch_rules,
        }
    }

    /// Replace the step-local preconditions and branch rules.
    pub fn with_rules(
        mut self,
        preconditions: Vec<Expression>,
        branch_rules: Vec<BranchRule>,
    ) -> Self {
        self.preconditions = preconditions.into();
        self.branch_rules = branch_rules.into();
        self
    }

    /// A copy sharing every structural reference and rule list, with a fresh
    /// occurrence to be renumbered by the receiving route.
    pub fn with_fresh_occurrence(&self) -> Self {
        Self {
            test: Arc::clone(&self.test),
            test_part: Arc::clone(&self.test_part),
            sections: Arc::clone(&self.sections),
            occurrence: self.occurrence.fresh(),
            preconditions: Arc::clone(&self.preconditions),
            branch_rules: Arc::clone(&self.branch_rules),
        }
    }

    pub fn test(&self) -> &Test {
        &self.test
    }

    pub fn test_part(&self) -> &TestPart {
        &self.test_part
    }

    /// Enclosing sections, outermost first.
    pub fn sections(&self) -> &[Arc<Section>] {
        &self.sections
    }

    pub fn innermost_section(&self) -> Option<&Section> {
        self.sections.last().map(|s| s.as_ref())
    }

    pub fn is_in_section(&self, id: SectionId) -> bool {
        self.sections.iter().any(|s| s.id() == id)
    }

    pub fn occurrence(&self) -> &ItemOccurrence {
        &self.occurrence
    }

    pub fn item_ref(&self) -> &ItemRef {
        self.occurrence.item_ref()
    }

    pub fn preconditions(&self) -> &[Expression] {
        &self.preconditions
    }

    pub fn branch_rules(&self) -> &[BranchRule] {
        &self.branch_rules
    }

    pub fn navigation_mode(&self) -> NavigationMode {
        self.test_part.navigation_mode
    }

    pub fn submission_mode(&self) -> SubmissionMode {
        self.test_part.submission_mode
    }

    /// The closest declared item session control.
    ///
    /// Searched in the order item, sections innermost to outermost, test part,
    /// test. `None` when no level declares one.
    pub fn effective_session_control(&self) -> Option<(Owner<'_>, &ItemSessionControl)> {
        let item = std::iter::once(Owner::Item(&self.occurrence));
        let sections = self.sections.iter().rev().map(|s| Owner::Section(s.as_ref()));
        let outer = [Owner::TestPart(&self.test_part), Owner::Test(&self.test)];

        item.chain(sections)
            .chain(outer)
            .find_map(|owner| owner.component().item_session_control().map(|isc| (owner, isc)))
    }

    /// Every declared time limit, outermost first: test, test part, sections
    /// outer to inner, then the item unless `exclude_item` is set.
    pub fn effective_time_limits(&self, exclude_item: bool) -> Vec<(Owner<'_>, &TimeLimits)> {
        let outer = [Owner::Test(&self.test), Owner::TestPart(&self.test_part)];
        let sections = self.sections.iter().map(|s| Owner::Section(s.as_ref()));
        let item = (!exclude_item).then_some(Owner::Item(&self.occurrence));

        outer
            .into_iter()
            .chain(sections)
            .chain(item)
            .filter_map(|owner| owner.component().time_limits().map(|limits| (owner, limits)))
            .collect()
    }

    pub(crate) fn set_occurrence(&mut self, occurrence: u32) {
        self.occurrence.set_occurrence(occurrence);
    }

    /// The test part must belong to the test, every section to the test part,
    /// and the chain must be parent-linked from the outermost section inward.
    pub(crate) fn validate_structure(&self) -> RouteResult<()> {
        let invalid = |reason: String| RouteError::InvalidStep {
            step: self.item_ref().identifier().to_string(),
            reason,
        };

        if self.test_part.test_id() != self.test.id() {
            return Err(invalid(format!(
                "test part '{}' does not belong to test '{}'",
                self.test_part.identifier(),
                self.test.identifier()
            )));
        }

        let mut parent = None;
        for section in self.sections.iter() {
            if section.test_part_id() != self.test_part.id() {
                return Err(invalid(format!(
                    "section '{}' does not belong to test part '{}'",
                    section.identifier(),
                    self.test_part.identifier()
                )));
            }
            if section.parent_id() != parent {
                return Err(invalid(format!(
                    "section '{}' is not nested in the preceding section of the chain",
                    section.identifier()
                )));
            }
            parent = Some(section.id());
        }
        Ok(())
    }
}

//! Derived indices over a route's canonical step list.
//!
//! Buckets hold step positions, never steps, and are created on first use.
//! Steps are only ever appended, so every recorded position stays valid.
//!
//! Items are keyed by identifier: item references from separately loaded
//! definitions that share an identifier count as one item, so occurrence
//! identifiers stay unique within a route.

use std::collections::HashMap;

use crate::definition::{ItemRefId, SectionId, TestPartId};
use crate::step::Step;

#[derive(Debug, Clone, Default)]
pub(crate) struct RouteIndex {
    occurrences: HashMap<String, Vec<usize>>,
    item_identifiers: HashMap<ItemRefId, String>,
    item_order: Vec<String>,
    categories: HashMap<String, Vec<String>>,
    category_registry: Vec<String>,
    sections_by_identifier: HashMap<String, Vec<usize>>,
    sections_by_id: HashMap<SectionId, Vec<usize>>,
    section_order: Vec<String>,
    parts_by_identifier: HashMap<String, Vec<usize>>,
    parts_by_id: HashMap<TestPartId, Vec<usize>>,
    part_order: Vec<String>,
}

impl RouteIndex {
    /// Number of steps already registered under the item `identifier`.
    pub(crate) fn occurrence_count(&self, identifier: &str) -> usize {
        self.occurrences.get(identifier).map_or(0, Vec::len)
    }

    /// Register the step stored at `position`. Its occurrence index must
    /// already be assigned.
    pub(crate) fn register(&mut self, position: usize, step: &Step) {
        let item = step.item_ref();
        let identifier = item.identifier();

        push_keyed(&mut self.occurrences, &mut self.item_order, identifier, position);
        self.item_identifiers
            .entry(item.id())
            .or_insert_with(|| identifier.to_string());

        for category in &item.categories {
            let items = self.categories.entry(category.clone()).or_default();
            if items.is_empty() {
                self.category_registry.push(category.clone());
            }
            if !items.iter().any(|known| known == identifier) {
                items.push(identifier.to_string());
            }
        }

        for section in step.sections() {
            push_keyed(
                &mut self.sections_by_identifier,
                &mut self.section_order,
                section.identifier(),
                position,
            );
            self.sections_by_id.entry(section.id()).or_default().push(position);
        }

        let part = step.test_part();
        push_keyed(
            &mut self.parts_by_identifier,
            &mut self.part_order,
            part.identifier(),
            position,
        );
        self.parts_by_id.entry(part.id()).or_default().push(position);
    }

    pub(crate) fn item_identifier(&self, id: ItemRefId) -> Option<&str> {
        self.item_identifiers.get(&id).map(String::as_str)
    }

    pub(crate) fn item_positions(&self, identifier: &str) -> Option<&[usize]> {
        self.occurrences.get(identifier).map(Vec::as_slice)
    }

    pub(crate) fn item_order(&self) -> &[String] {
        &self.item_order
    }

    pub(crate) fn items_in_category(&self, category: &str) -> &[String] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn category_registry(&self) -> &[String] {
        &self.category_registry
    }

    pub(crate) fn section_positions_by_identifier(&self, identifier: &str) -> Option<&[usize]> {
        self.sections_by_identifier.get(identifier).map(Vec::as_slice)
    }

    pub(crate) fn section_positions_by_id(&self, id: SectionId) -> Option<&[usize]> {
        self.sections_by_id.get(&id).map(Vec::as_slice)
    }

    pub(crate) fn section_order(&self) -> &[String] {
        &self.section_order
    }

    pub(crate) fn part_positions_by_identifier(&self, identifier: &str) -> Option<&[usize]> {
        self.parts_by_identifier.get(identifier).map(Vec::as_slice)
    }

    pub(crate) fn part_positions_by_id(&self, id: TestPartId) -> Option<&[usize]> {
        self.parts_by_id.get(&id).map(Vec::as_slice)
    }

    pub(crate) fn part_order(&self) -> &[String] {
        &self.part_order
    }
}

fn push_keyed(
    buckets: &mut HashMap<String, Vec<usize>>,
    order: &mut Vec<String>,
    identifier: &str,
    position: usize,
) {
    let bucket = buckets.entry(identifier.to_string()).or_default();
    if bucket.is_empty() {
        order.push(identifier.to_string());
    }
    bucket.push(position);
}

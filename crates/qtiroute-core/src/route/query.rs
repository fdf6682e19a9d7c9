//! Read-only queries over a route's indices.

use crate::component::ComponentKind;
use crate::definition::{ItemRef, ItemRefId, Section, SectionId, TestPart, TestPartId};
use crate::error::{RouteError, RouteResult};
use crate::step::Step;

use super::Route;

/// A test part named either by identifier or by arena id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKey<'a> {
    Identifier(&'a str),
    Id(TestPartId),
}

/// A section named either by identifier or by arena id.
///
/// Identifier lookups cover every section carrying that identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKey<'a> {
    Identifier(&'a str),
    Id(SectionId),
}

/// An item reference named either by identifier or by arena id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKey<'a> {
    Identifier(&'a str),
    Id(ItemRefId),
}

macro_rules! lookup_key {
    ($key:ident, $id:ty, $component:ty) => {
        impl<'a> From<&'a str> for $key<'a> {
            fn from(identifier: &'a str) -> Self {
                $key::Identifier(identifier)
            }
        }

        impl<'a> From<&'a String> for $key<'a> {
            fn from(identifier: &'a String) -> Self {
                $key::Identifier(identifier.as_str())
            }
        }

        impl From<$id> for $key<'_> {
            fn from(id: $id) -> Self {
                $key::Id(id)
            }
        }

        impl From<&$component> for $key<'_> {
            fn from(component: &$component) -> Self {
                $key::Id(component.id())
            }
        }

        impl std::fmt::Display for $key<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $key::Identifier(identifier) => f.write_str(identifier),
                    $key::Id(id) => write!(f, "{id}"),
                }
            }
        }
    };
}

lookup_key!(PartKey, TestPartId, TestPart);
lookup_key!(SectionKey, SectionId, Section);
lookup_key!(ItemKey, ItemRefId, ItemRef);

/// Category filter for [`Route::items_subset`].
///
/// Inclusion and exclusion cannot be combined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Keep items carrying at least one of these categories.
    Include(Vec<String>),
    /// Drop items carrying any of these categories.
    Exclude(Vec<String>),
}

impl CategoryFilter {
    pub fn include<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CategoryFilter::Include(categories.into_iter().map(Into::into).collect())
    }

    pub fn exclude<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CategoryFilter::Exclude(categories.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, item: &ItemRef) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Include(categories) => categories.iter().any(|c| item.has_category(c)),
            CategoryFilter::Exclude(categories) => !categories.iter().any(|c| item.has_category(c)),
        }
    }
}

impl Route {
    /// Number of times `item` appears in the route; 0 when it never does.
    ///
    /// Occurrences are counted per item identifier, so an id counts every
    /// item reference sharing its identifier.
    pub fn occurrence_count<'a>(&self, item: impl Into<ItemKey<'a>>) -> u32 {
        self.item_positions(item.into())
            .map_or(0, |positions| positions.len() as u32)
    }

    /// Steps of a test part, in route order.
    pub fn steps_by_test_part<'a>(&self, part: impl Into<PartKey<'a>>) -> RouteResult<Vec<&Step>> {
        let key = part.into();
        let positions = match key {
            PartKey::Identifier(identifier) => self.index.part_positions_by_identifier(identifier),
            PartKey::Id(id) => self.index.part_positions_by_id(id),
        };
        positions
            .map(|positions| self.at(positions))
            .ok_or_else(|| RouteError::unknown(ComponentKind::TestPart, key))
    }

    /// Steps having the section anywhere in their chain, in route order.
    pub fn steps_by_section<'a>(
        &self,
        section: impl Into<SectionKey<'a>>,
    ) -> RouteResult<Vec<&Step>> {
        let key = section.into();
        let positions = match key {
            SectionKey::Identifier(identifier) => {
                self.index.section_positions_by_identifier(identifier)
            }
            SectionKey::Id(id) => self.index.section_positions_by_id(id),
        };
        positions
            .map(|positions| self.at(positions))
            .ok_or_else(|| RouteError::unknown(ComponentKind::Section, key))
    }

    /// Every occurrence of an item reference, in occurrence order.
    pub fn steps_by_item_ref<'a>(&self, item: impl Into<ItemKey<'a>>) -> RouteResult<Vec<&Step>> {
        let key = item.into();
        self.item_positions(key)
            .map(|positions| self.at(positions))
            .ok_or_else(|| RouteError::unknown(ComponentKind::ItemRef, key))
    }

    /// Position of the first step of a test part.
    pub fn first_step_of_test_part<'a>(&self, part: impl Into<PartKey<'a>>) -> RouteResult<usize> {
        let key = part.into();
        let positions = match key {
            PartKey::Identifier(identifier) => self.index.part_positions_by_identifier(identifier),
            PartKey::Id(id) => self.index.part_positions_by_id(id),
        };
        positions
            .and_then(|positions| positions.first().copied())
            .ok_or_else(|| RouteError::unknown(ComponentKind::TestPart, key))
    }

    /// Item references carrying any of `categories`, each listed once in
    /// first-appearance order. Unknown categories contribute nothing.
    pub fn items_by_category<I, S>(&self, categories: I) -> Vec<&ItemRef>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut identifiers: Vec<&str> = Vec::new();
        for category in categories {
            for identifier in self.index.items_in_category(category.as_ref()) {
                if !identifiers.contains(&identifier.as_str()) {
                    identifiers.push(identifier);
                }
            }
        }
        identifiers.sort_by_key(|identifier| self.first_position(identifier));
        identifiers
            .into_iter()
            .filter_map(|identifier| self.first_item_ref(identifier))
            .collect()
    }

    /// Item references of the whole route, or of one section, narrowed by a
    /// category filter.
    pub fn items_subset<'a>(
        &self,
        section: Option<SectionKey<'a>>,
        filter: &CategoryFilter,
    ) -> RouteResult<Vec<&ItemRef>> {
        let candidates = match section {
            Some(section) => {
                let mut items: Vec<&ItemRef> = Vec::new();
                for step in self.steps_by_section(section)? {
                    let item = step.item_ref();
                    if !items.iter().any(|seen| seen.identifier() == item.identifier()) {
                        items.push(item);
                    }
                }
                items
            }
            None => self.item_refs(),
        };
        Ok(candidates.into_iter().filter(|item| filter.matches(item)).collect())
    }

    /// Distinct item references in first-appearance order, one per
    /// identifier.
    pub fn item_refs(&self) -> Vec<&ItemRef> {
        self.index
            .item_order()
            .iter()
            .filter_map(|identifier| self.first_item_ref(identifier))
            .collect()
    }

    /// Every category seen so far, in first-seen order.
    pub fn categories(&self) -> &[String] {
        self.index.category_registry()
    }

    /// Occurrence identifiers (`Q01.0`, `Q01.1`, ...) in route order.
    pub fn identifier_sequence(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.occurrence().identifier()).collect()
    }

    /// Position of the step whose occurrence identifier is `identifier`.
    pub fn position_of(&self, identifier: &str) -> RouteResult<usize> {
        let not_found = || RouteError::unknown(ComponentKind::ItemRef, identifier);
        let (item, occurrence) = identifier.rsplit_once('.').ok_or_else(not_found)?;
        let occurrence: usize = occurrence.parse().map_err(|_| not_found())?;
        self.index
            .item_positions(item)
            .and_then(|positions| positions.get(occurrence).copied())
            .ok_or_else(not_found)
    }

    /// Test part identifiers in first-appearance order.
    pub fn test_part_identifiers(&self) -> &[String] {
        self.index.part_order()
    }

    /// Section identifiers in first-appearance order.
    pub fn section_identifiers(&self) -> &[String] {
        self.index.section_order()
    }

    fn item_positions(&self, key: ItemKey<'_>) -> Option<&[usize]> {
        match key {
            ItemKey::Identifier(identifier) => self.index.item_positions(identifier),
            ItemKey::Id(id) => self
                .index
                .item_identifier(id)
                .and_then(|identifier| self.index.item_positions(identifier)),
        }
    }

    fn first_position(&self, identifier: &str) -> usize {
        self.index
            .item_positions(identifier)
            .and_then(|positions| positions.first().copied())
            .unwrap_or(usize::MAX)
    }

    fn first_item_ref(&self, identifier: &str) -> Option<&ItemRef> {
        self.index
            .item_positions(identifier)
            .and_then(|positions| positions.first())
            .map(|position| self.steps[*position].item_ref())
    }

    fn at(&self, positions: &[usize]) -> Vec<&Step> {
        positions.iter().map(|position| &self.steps[*position]).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::definition::Test;

    struct Fixture {
        route: Route,
        p1: Arc<TestPart>,
        s1: Arc<Section>,
        s1a: Arc<Section>,
        q01: Arc<ItemRef>,
    }

    /// P1/S1: Q01 (math), P1/S1/S1a: Q02 (math, hard), P1/S1: Q01 again,
    /// P2/S2: Q03 (reading).
    fn fixture() -> Fixture {
        let test = Arc::new(Test::new("T"));
        let p1 = Arc::new(TestPart::new(&test, "P1"));
        let p2 = Arc::new(TestPart::new(&test, "P2"));
        let s1 = Arc::new(Section::new(&p1, "S1"));
        let s1a = Arc::new(Section::nested(&s1, "S1a"));
        let s2 = Arc::new(Section::new(&p2, "S2"));
        let q01 = Arc::new(ItemRef::new("Q01").with_categories(["math"]));
        let q02 = Arc::new(ItemRef::new("Q02").with_categories(["math", "hard"]));
        let q03 = Arc::new(ItemRef::new("Q03").with_categories(["reading"]));

        let mut route = Route::new();
        let placements = [
            (&p1, vec![Arc::clone(&s1)], &q01),
            (&p1, vec![Arc::clone(&s1), Arc::clone(&s1a)], &q02),
            (&p1, vec![Arc::clone(&s1)], &q01),
            (&p2, vec![Arc::clone(&s2)], &q03),
        ];
        for (part, sections, item) in placements {
            route
                .add_step(Step::new(
                    Arc::clone(&test),
                    Arc::clone(part),
                    sections,
                    Arc::clone(item),
                ))
                .unwrap();
        }
        Fixture {
            route,
            p1,
            s1,
            s1a,
            q01,
        }
    }

    fn ids(items: &[&ItemRef]) -> Vec<String> {
        items.iter().map(|i| i.identifier().to_string()).collect()
    }

    #[test]
    fn test_occurrence_count_by_identifier_and_id() {
        let f = fixture();
        assert_eq!(f.route.occurrence_count("Q01"), 2);
        assert_eq!(f.route.occurrence_count(f.q01.id()), 2);
        assert_eq!(f.route.occurrence_count(&*f.q01), 2);
        assert_eq!(f.route.occurrence_count("Q99"), 0);
        assert_eq!(f.route.occurrence_count(ItemRefId::new()), 0);
    }

    #[test]
    fn test_steps_by_test_part() {
        let f = fixture();
        assert_eq!(f.route.steps_by_test_part("P1").unwrap().len(), 3);
        assert_eq!(f.route.steps_by_test_part(&*f.p1).unwrap().len(), 3);
        let err = f.route.steps_by_test_part("P9").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::OutOfBounds);
    }

    #[test]
    fn test_steps_by_section_includes_nested_steps() {
        let f = fixture();
        assert_eq!(f.route.steps_by_section("S1").unwrap().len(), 3);
        assert_eq!(f.route.steps_by_section(f.s1a.id()).unwrap().len(), 1);
        assert!(f.route.steps_by_section("S9").is_err());
    }

    #[test]
    fn test_steps_by_item_ref_in_occurrence_order() {
        let f = fixture();
        let steps = f.route.steps_by_item_ref("Q01").unwrap();
        let occurrences: Vec<u32> = steps.iter().map(|s| s.occurrence().occurrence()).collect();
        assert_eq!(occurrences, vec![0, 1]);
        assert!(f.route.steps_by_item_ref("Q99").is_err());
    }

    #[test]
    fn test_first_step_of_test_part() {
        let f = fixture();
        assert_eq!(f.route.first_step_of_test_part("P2").unwrap(), 3);
        assert_eq!(f.route.first_step_of_test_part(f.p1.id()).unwrap(), 0);
    }

    #[test]
    fn test_items_by_category_union() {
        let f = fixture();
        assert_eq!(ids(&f.route.items_by_category(["math"])), vec!["Q01", "Q02"]);
        assert_eq!(
            ids(&f.route.items_by_category(["reading", "hard"])),
            vec!["Q02", "Q03"]
        );
        assert!(f.route.items_by_category(["unknown"]).is_empty());
        assert!(f.route.items_by_category(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn test_items_subset_filters() {
        let f = fixture();
        let all = f.route.items_subset(None, &CategoryFilter::All).unwrap();
        assert_eq!(ids(&all), vec!["Q01", "Q02", "Q03"]);

        let in_s1 = f
            .route
            .items_subset(Some((&*f.s1).into()), &CategoryFilter::exclude(["hard"]))
            .unwrap();
        assert_eq!(ids(&in_s1), vec!["Q01"]);

        let included = f
            .route
            .items_subset(None, &CategoryFilter::include(["hard", "reading"]))
            .unwrap();
        assert_eq!(ids(&included), vec!["Q02", "Q03"]);

        assert!(f
            .route
            .items_subset(Some("S9".into()), &CategoryFilter::All)
            .is_err());
    }

    #[test]
    fn test_registries_in_first_seen_order() {
        let f = fixture();
        assert_eq!(f.route.categories(), &["math", "hard", "reading"]);
        assert_eq!(f.route.test_part_identifiers(), &["P1", "P2"]);
        assert_eq!(f.route.section_identifiers(), &["S1", "S1a", "S2"]);
        assert_eq!(ids(&f.route.item_refs()), vec!["Q01", "Q02", "Q03"]);
    }

    #[test]
    fn test_identifier_sequence_and_position_of() {
        let f = fixture();
        assert_eq!(
            f.route.identifier_sequence(),
            vec!["Q01.0", "Q02.0", "Q01.1", "Q03.0"]
        );
        assert_eq!(f.route.position_of("Q01.1").unwrap(), 2);
        assert!(f.route.position_of("Q01.2").is_err());
        assert!(f.route.position_of("Q01").is_err());
    }
}

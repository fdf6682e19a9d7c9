//! One repetition of an item reference inside a route.

use std::fmt;
use std::sync::Arc;

use crate::component::{ComponentKind, StructuralComponent};
use crate::definition::{ItemRef, ItemSessionControl, TimeLimits};

/// An item reference paired with its zero-based repetition index.
///
/// Timing and session-control are not stored here: they are read from the
/// referenced item, which every occurrence of it shares. Declaring them goes
/// through the definition, see [`crate::TestDefinition::item_ref_mut`].
#[derive(Debug, Clone, PartialEq)]
pub struct ItemOccurrence {
    item_ref: Arc<ItemRef>,
    occurrence: u32,
}

impl ItemOccurrence {
    /// First occurrence of `item_ref`. The route assigns the real index when
    /// the owning step is appended.
    pub fn new(item_ref: Arc<ItemRef>) -> Self {
        Self {
            item_ref,
            occurrence: 0,
        }
    }

    pub fn item_ref(&self) -> &ItemRef {
        &self.item_ref
    }

    pub fn shared_item_ref(&self) -> &Arc<ItemRef> {
        &self.item_ref
    }

    pub fn occurrence(&self) -> u32 {
        self.occurrence
    }

    /// Only called while the owning step is being registered, before anything
    /// else has read the identifier.
    pub(crate) fn set_occurrence(&mut self, occurrence: u32) {
        self.occurrence = occurrence;
    }

    /// `<item identifier>.<occurrence index>`, e.g. `Q01.0`.
    pub fn identifier(&self) -> String {
        format!("{}.{}", self.item_ref.identifier(), self.occurrence)
    }

    /// A new occurrence of the same item, with its index reset.
    pub fn fresh(&self) -> Self {
        Self::new(Arc::clone(&self.item_ref))
    }
}

impl fmt::Display for ItemOccurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.item_ref.identifier(), self.occurrence)
    }
}

impl StructuralComponent for ItemOccurrence {
    fn kind(&self) -> ComponentKind {
        ComponentKind::ItemRef
    }

    fn time_limits(&self) -> Option<&TimeLimits> {
        self.item_ref.time_limits()
    }

    fn item_session_control(&self) -> Option<&ItemSessionControl> {
        self.item_ref.item_session_control()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_includes_occurrence_index() {
        let mut occ = ItemOccurrence::new(Arc::new(ItemRef::new("Q01")));
        assert_eq!(occ.identifier(), "Q01.0");
        occ.set_occurrence(3);
        assert_eq!(occ.identifier(), "Q01.3");
        assert_eq!(occ.to_string(), "Q01.3");
    }

    use crate::component::StructuralComponentMut;

    #[test]
    fn test_policies_delegate_to_item_ref() {
        let mut item = ItemRef::new("Q01");
        item.set_time_limits(Some(TimeLimits::max(45)));
        let occ = ItemOccurrence::new(Arc::new(item));
        assert_eq!(occ.time_limits(), Some(&TimeLimits::max(45)));
        assert!(occ.has_time_limits());
        assert!(!occ.has_item_session_control());
        assert_eq!(occ.kind(), ComponentKind::ItemRef);
    }

    #[test]
    fn test_occurrences_of_one_item_see_the_same_policies() {
        let mut item = ItemRef::new("Q01");
        item.set_item_session_control(Some(ItemSessionControl::default().with_max_attempts(3)));
        let shared = Arc::new(item);

        let first = ItemOccurrence::new(Arc::clone(&shared));
        let mut second = first.fresh();
        second.set_occurrence(1);

        for occ in [&first, &second] {
            assert!(Arc::ptr_eq(occ.shared_item_ref(), &shared));
            assert_eq!(occ.item_session_control().unwrap().max_attempts, 3);
            assert!(!occ.has_time_limits());
        }
    }

    #[test]
    fn test_fresh_resets_index_and_shares_item() {
        let mut occ = ItemOccurrence::new(Arc::new(ItemRef::new("Q01")));
        occ.set_occurrence(2);
        let copy = occ.fresh();
        assert_eq!(copy.occurrence(), 0);
        assert_eq!(occ.occurrence(), 2);
        assert!(Arc::ptr_eq(copy.shared_item_ref(), occ.shared_item_ref()));
    }
}

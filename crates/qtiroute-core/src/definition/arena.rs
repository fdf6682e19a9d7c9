//! The definition arena: every structural component of one test, keyed by a
//! stable id, plus identifier lookups and the presentation-order placements.
//!
//! Components are held behind `Arc` so routes built from the arena share them
//! read-only. Mutable access goes through `Arc::make_mut`: edits made after a
//! route was built land on a private copy and never reach that route.

use std::collections::HashMap;
use std::hash::Hash;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use super::document::{
    ContentDocument, ItemRefDocument, SectionDocument, TestDocument, TestPartDocument,
};
use super::error::{DefinitionError, DefinitionResult};
use super::ids::{ItemRefId, SectionId, TestPartId};
use super::model::{is_valid_identifier, ItemRef, Section, Test, TestPart};
use crate::component::{ComponentKind, StructuralComponentMut};

/// One presented item occurrence, before it becomes a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub test_part: TestPartId,
    /// Enclosing sections, outermost first.
    pub sections: Vec<SectionId>,
    pub item_ref: ItemRefId,
}

/// Arena of the components of one test.
#[derive(Debug, Clone)]
pub struct TestDefinition {
    test: Arc<Test>,
    test_parts: HashMap<TestPartId, Arc<TestPart>>,
    sections: HashMap<SectionId, Arc<Section>>,
    item_refs: HashMap<ItemRefId, Arc<ItemRef>>,
    part_order: Vec<TestPartId>,
    part_keys: HashMap<String, TestPartId>,
    section_keys: HashMap<String, SectionId>,
    item_keys: HashMap<String, ItemRefId>,
    placements: Vec<Placement>,
}

impl TestDefinition {
    /// Create an empty arena around `test`.
    pub fn new(test: Test) -> DefinitionResult<Self> {
        ensure_identifier(test.identifier())?;
        Ok(Self {
            test: Arc::new(test),
            test_parts: HashMap::new(),
            sections: HashMap::new(),
            item_refs: HashMap::new(),
            part_order: Vec::new(),
            part_keys: HashMap::new(),
            section_keys: HashMap::new(),
            item_keys: HashMap::new(),
            placements: Vec::new(),
        })
    }

    /// Build an arena from a document, minting ids and flattening the content
    /// into placements.
    pub fn from_document(document: TestDocument) -> DefinitionResult<Self> {
        let TestDocument {
            identifier,
            title,
            time_limits,
            item_session_control,
            items,
            test_parts,
        } = document;

        if test_parts.is_empty() {
            return Err(DefinitionError::NoTestParts { identifier });
        }

        let mut test = Test::new(identifier);
        test.title = title;
        test.set_time_limits(time_limits);
        test.set_item_session_control(item_session_control);
        let mut definition = Self::new(test)?;

        for item in items {
            definition.add_item_ref(item_from_document(item))?;
        }
        for part in test_parts {
            definition.load_test_part(part)?;
        }

        debug!(
            test = %definition.test.identifier(),
            test_parts = definition.part_order.len(),
            sections = definition.sections.len(),
            items = definition.item_refs.len(),
            placements = definition.placements.len(),
            "definition loaded"
        );
        Ok(definition)
    }

    pub fn test(&self) -> &Arc<Test> {
        &self.test
    }

    pub fn test_mut(&mut self) -> &mut Test {
        Arc::make_mut(&mut self.test)
    }

    /// Test parts in document order.
    pub fn test_parts(&self) -> impl Iterator<Item = &Arc<TestPart>> {
        self.part_order.iter().filter_map(|id| self.test_parts.get(id))
    }

    pub fn test_part(&self, id: TestPartId) -> DefinitionResult<&Arc<TestPart>> {
        self.test_parts
            .get(&id)
            .ok_or_else(|| unknown(ComponentKind::TestPart, id))
    }

    pub fn test_part_mut(&mut self, id: TestPartId) -> DefinitionResult<&mut TestPart> {
        self.test_parts
            .get_mut(&id)
            .map(Arc::make_mut)
            .ok_or_else(|| unknown(ComponentKind::TestPart, id))
    }

    pub fn test_part_by_identifier(&self, identifier: &str) -> DefinitionResult<&Arc<TestPart>> {
        let id = lookup(&self.part_keys, ComponentKind::TestPart, identifier)?;
        self.test_part(id)
    }

    pub fn section(&self, id: SectionId) -> DefinitionResult<&Arc<Section>> {
        self.sections
            .get(&id)
            .ok_or_else(|| unknown(ComponentKind::Section, id))
    }

    pub fn section_mut(&mut self, id: SectionId) -> DefinitionResult<&mut Section> {
        self.sections
            .get_mut(&id)
            .map(Arc::make_mut)
            .ok_or_else(|| unknown(ComponentKind::Section, id))
    }

    pub fn section_by_identifier(&self, identifier: &str) -> DefinitionResult<&Arc<Section>> {
        let id = lookup(&self.section_keys, ComponentKind::Section, identifier)?;
        self.section(id)
    }

    pub fn item_ref(&self, id: ItemRefId) -> DefinitionResult<&Arc<ItemRef>> {
        self.item_refs
            .get(&id)
            .ok_or_else(|| unknown(ComponentKind::ItemRef, id))
    }

    pub fn item_ref_mut(&mut self, id: ItemRefId) -> DefinitionResult<&mut ItemRef> {
        self.item_refs
            .get_mut(&id)
            .map(Arc::make_mut)
            .ok_or_else(|| unknown(ComponentKind::ItemRef, id))
    }

    pub fn item_ref_by_identifier(&self, identifier: &str) -> DefinitionResult<&Arc<ItemRef>> {
        let id = lookup(&self.item_keys, ComponentKind::ItemRef, identifier)?;
        self.item_ref(id)
    }

    /// Presentation-order placements.
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Register a test part. It must belong to this arena's test.
    pub fn add_test_part(&mut self, part: TestPart) -> DefinitionResult<TestPartId> {
        ensure_identifier(part.identifier())?;
        if part.test_id() != self.test.id() {
            return Err(unknown(ComponentKind::Test, part.test_id()));
        }
        let id = part.id();
        insert_key(&mut self.part_keys, ComponentKind::TestPart, part.identifier(), id)?;
        self.part_order.push(id);
        self.test_parts.insert(id, Arc::new(part));
        Ok(id)
    }

    /// Register a section. Its test part and parent section must already be
    /// registered.
    pub fn add_section(&mut self, section: Section) -> DefinitionResult<SectionId> {
        ensure_identifier(section.identifier())?;
        self.test_part(section.test_part_id())?;
        if let Some(parent) = section.parent_id() {
            self.section(parent)?;
        }
        let id = section.id();
        insert_key(&mut self.section_keys, ComponentKind::Section, section.identifier(), id)?;
        self.sections.insert(id, Arc::new(section));
        Ok(id)
    }

    pub fn add_item_ref(&mut self, item: ItemRef) -> DefinitionResult<ItemRefId> {
        ensure_identifier(item.identifier())?;
        let id = item.id();
        insert_key(&mut self.item_keys, ComponentKind::ItemRef, item.identifier(), id)?;
        self.item_refs.insert(id, Arc::new(item));
        Ok(id)
    }

    /// Append a placement. Every referenced component must be registered and
    /// the section chain must be parent-linked inside `test_part`.
    pub fn add_placement(&mut self, placement: Placement) -> DefinitionResult<()> {
        self.test_part(placement.test_part)?;
        self.item_ref(placement.item_ref)?;
        let mut parent = None;
        for section_id in &placement.sections {
            let section = self.section(*section_id)?;
            if section.test_part_id() != placement.test_part || section.parent_id() != parent {
                return Err(DefinitionError::InvalidPlacement {
                    reason: format!(
                        "section '{}' does not continue the chain inside its test part",
                        section.identifier()
                    ),
                });
            }
            parent = Some(*section_id);
        }
        self.placements.push(placement);
        Ok(())
    }

    /// Re-key a test part under a new identifier.
    pub fn rename_test_part(&mut self, id: TestPartId, identifier: &str) -> DefinitionResult<()> {
        ensure_identifier(identifier)?;
        let old = self.test_part(id)?.identifier().to_string();
        rekey(&mut self.part_keys, ComponentKind::TestPart, &old, identifier, id)?;
        self.test_part_mut(id)?.set_identifier(identifier);
        debug!(kind = %ComponentKind::TestPart, from = %old, to = %identifier, "component re-keyed");
        Ok(())
    }

    /// Re-key a section under a new identifier.
    pub fn rename_section(&mut self, id: SectionId, identifier: &str) -> DefinitionResult<()> {
        ensure_identifier(identifier)?;
        let old = self.section(id)?.identifier().to_string();
        rekey(&mut self.section_keys, ComponentKind::Section, &old, identifier, id)?;
        self.section_mut(id)?.set_identifier(identifier);
        debug!(kind = %ComponentKind::Section, from = %old, to = %identifier, "component re-keyed");
        Ok(())
    }

    /// Re-key an item reference under a new identifier.
    pub fn rename_item_ref(&mut self, id: ItemRefId, identifier: &str) -> DefinitionResult<()> {
        ensure_identifier(identifier)?;
        let old = self.item_ref(id)?.identifier().to_string();
        rekey(&mut self.item_keys, ComponentKind::ItemRef, &old, identifier, id)?;
        self.item_ref_mut(id)?.set_identifier(identifier);
        debug!(kind = %ComponentKind::ItemRef, from = %old, to = %identifier, "component re-keyed");
        Ok(())
    }

    fn load_test_part(&mut self, document: TestPartDocument) -> DefinitionResult<()> {
        let TestPartDocument {
            identifier,
            navigation_mode,
            submission_mode,
            time_limits,
            item_session_control,
            content,
        } = document;

        let mut part =
            TestPart::new(&self.test, identifier).with_modes(navigation_mode, submission_mode);
        part.set_time_limits(time_limits);
        part.set_item_session_control(item_session_control);
        let part_id = self.add_test_part(part)?;

        let mut chain = Vec::new();
        self.load_content(part_id, &mut chain, content)
    }

    fn load_content(
        &mut self,
        part_id: TestPartId,
        chain: &mut Vec<SectionId>,
        content: Vec<ContentDocument>,
    ) -> DefinitionResult<()> {
        for entry in content {
            match entry {
                ContentDocument::ItemRef { identifier } => {
                    let item_ref = lookup(&self.item_keys, ComponentKind::ItemRef, &identifier)?;
                    self.placements.push(Placement {
                        test_part: part_id,
                        sections: chain.clone(),
                        item_ref,
                    });
                }
                ContentDocument::Section(document) => {
                    self.load_section(part_id, chain, document)?;
                }
            }
        }
        Ok(())
    }

    fn load_section(
        &mut self,
        part_id: TestPartId,
        chain: &mut Vec<SectionId>,
        document: SectionDocument,
    ) -> DefinitionResult<()> {
        let SectionDocument {
            identifier,
            title,
            visible,
            time_limits,
            item_session_control,
            content,
        } = document;

        let mut section = match chain.last() {
            Some(parent) => Section::nested(self.section(*parent)?, identifier),
            None => Section::new(self.test_part(part_id)?, identifier),
        };
        section.title = title;
        section.visible = visible;
        section.set_time_limits(time_limits);
        section.set_item_session_control(item_session_control);
        let section_id = self.add_section(section)?;

        chain.push(section_id);
        let result = self.load_content(part_id, chain, content);
        chain.pop();
        result
    }
}

/// Read and parse a JSON test definition from disk.
pub fn load_definition(path: impl AsRef<Path>) -> DefinitionResult<TestDefinition> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    let document: TestDocument = serde_json::from_str(&raw)?;
    TestDefinition::from_document(document)
}

fn item_from_document(document: ItemRefDocument) -> ItemRef {
    let ItemRefDocument {
        identifier,
        href,
        categories,
        time_limits,
        item_session_control,
        preconditions,
        branch_rules,
    } = document;

    let mut item = ItemRef::new(identifier).with_categories(categories);
    item.href = href;
    item.preconditions = preconditions;
    item.branch_rules = branch_rules;
    item.set_time_limits(time_limits);
    item.set_item_session_control(item_session_control);
    item
}

fn ensure_identifier(identifier: &str) -> DefinitionResult<()> {
    if is_valid_identifier(identifier) {
        Ok(())
    } else {
        Err(DefinitionError::InvalidIdentifier {
            identifier: identifier.to_string(),
        })
    }
}

fn unknown(kind: ComponentKind, key: impl ToString) -> DefinitionError {
    DefinitionError::UnknownComponent {
        kind,
        key: key.to_string(),
    }
}

fn lookup<Id: Copy>(
    keys: &HashMap<String, Id>,
    kind: ComponentKind,
    identifier: &str,
) -> DefinitionResult<Id> {
    keys.get(identifier)
        .copied()
        .ok_or_else(|| unknown(kind, identifier))
}

fn insert_key<Id: Copy>(
    keys: &mut HashMap<String, Id>,
    kind: ComponentKind,
    identifier: &str,
    id: Id,
) -> DefinitionResult<()> {
    if keys.contains_key(identifier) {
        return Err(DefinitionError::DuplicateIdentifier {
            kind,
            identifier: identifier.to_string(),
        });
    }
    keys.insert(identifier.to_string(), id);
    Ok(())
}

/// Remove `old` then reinsert `id` under `new`. Nothing changes on error.
fn rekey<Id: Copy + Eq + Hash>(
    keys: &mut HashMap<String, Id>,
    kind: ComponentKind,
    old: &str,
    new: &str,
    id: Id,
) -> DefinitionResult<()> {
    if old == new {
        return Ok(());
    }
    if keys.contains_key(new) {
        return Err(DefinitionError::DuplicateIdentifier {
            kind,
            identifier: new.to_string(),
        });
    }
    keys.remove(old);
    keys.insert(new.to_string(), id);
    Ok(())
}

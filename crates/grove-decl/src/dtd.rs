//! Document Type Definitions
//!
//! A DTD owns the element type, entity and notation tables in declaration
//! order. Keys are stored exactly as the parser normalized them.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::{DeclError, DeclType, ElementType, Entity, Notation};

/// A (governing) document type definition
#[derive(Debug, Clone, Default)]
pub struct Dtd {
    name: Box<str>,
    element_types: IndexMap<Box<str>, Arc<ElementType>>,
    general_entities: IndexMap<Box<str>, Arc<Entity>>,
    parameter_entities: IndexMap<Box<str>, Arc<Entity>>,
    notations: IndexMap<Box<str>, Arc<Notation>>,
    default_entity: Option<Arc<Entity>>,
}

impl Dtd {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register an element type, assigning its table index
    pub fn add_element_type(&mut self, mut element_type: ElementType) -> Result<Arc<ElementType>, DeclError> {
        if self.element_types.contains_key(element_type.name()) {
            return Err(DeclError::DuplicateElementType(element_type.name().to_owned()));
        }
        element_type.set_index(self.element_types.len());
        let element_type = Arc::new(element_type);
        self.element_types
            .insert(element_type.name().into(), Arc::clone(&element_type));
        Ok(element_type)
    }

    /// Register a general or parameter entity depending on its declaration type
    pub fn add_entity(&mut self, entity: Arc<Entity>) -> Result<(), DeclError> {
        let table = match entity.decl_type() {
            DeclType::Parameter => &mut self.parameter_entities,
            _ => &mut self.general_entities,
        };
        if table.contains_key(entity.name()) {
            return Err(DeclError::DuplicateEntity(entity.name().to_owned()));
        }
        table.insert(entity.name().into(), entity);
        Ok(())
    }

    pub fn add_notation(&mut self, notation: Notation) -> Result<Arc<Notation>, DeclError> {
        if self.notations.contains_key(notation.name()) {
            return Err(DeclError::DuplicateNotation(notation.name().to_owned()));
        }
        let notation = Arc::new(notation);
        self.notations.insert(notation.name().into(), Arc::clone(&notation));
        Ok(notation)
    }

    /// Entity used for references to undeclared general entities
    pub fn set_default_entity(&mut self, entity: Arc<Entity>) {
        self.default_entity = Some(entity);
    }

    pub fn default_entity(&self) -> Option<&Arc<Entity>> {
        self.default_entity.as_ref()
    }

    pub fn element_type(&self, name: &str) -> Option<&Arc<ElementType>> {
        self.element_types.get(name)
    }

    pub fn element_type_at(&self, index: usize) -> Option<&Arc<ElementType>> {
        self.element_types.get_index(index).map(|(_, e)| e)
    }

    pub fn element_type_count(&self) -> usize {
        self.element_types.len()
    }

    pub fn general_entity(&self, name: &str) -> Option<(usize, &Arc<Entity>)> {
        self.general_entities.get_full(name).map(|(i, _, e)| (i, e))
    }

    pub fn general_entity_at(&self, index: usize) -> Option<&Arc<Entity>> {
        self.general_entities.get_index(index).map(|(_, e)| e)
    }

    pub fn general_entity_count(&self) -> usize {
        self.general_entities.len()
    }

    pub fn parameter_entity(&self, name: &str) -> Option<(usize, &Arc<Entity>)> {
        self.parameter_entities.get_full(name).map(|(i, _, e)| (i, e))
    }

    pub fn parameter_entity_at(&self, index: usize) -> Option<&Arc<Entity>> {
        self.parameter_entities.get_index(index).map(|(_, e)| e)
    }

    pub fn parameter_entity_count(&self) -> usize {
        self.parameter_entities.len()
    }

    pub fn notation(&self, name: &str) -> Option<(usize, &Arc<Notation>)> {
        self.notations.get_full(name).map(|(i, _, n)| (i, n))
    }

    pub fn notation_at(&self, index: usize) -> Option<&Arc<Notation>> {
        self.notations.get_index(index).map(|(_, n)| n)
    }

    pub fn notation_count(&self) -> usize {
        self.notations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ContentType, EntityKind};

    #[test]
    fn test_element_types_are_indexed_in_order() {
        let mut dtd = Dtd::new("DOC");
        let unregistered = ElementType::new("DOC", ContentType::Element);
        assert_eq!(unregistered.index(), None);
        let doc = dtd.add_element_type(unregistered).unwrap();
        let para = dtd.add_element_type(ElementType::new("P", ContentType::Mixed)).unwrap();

        assert_eq!(doc.index(), Some(0));
        assert_eq!(para.index(), Some(1));
        assert_eq!(dtd.element_type_at(1).map(|e| e.name()), Some("P"));
        assert!(dtd.add_element_type(ElementType::new("P", ContentType::Any)).is_err());
    }

    #[test]
    fn test_entities_split_by_decl_type() {
        let mut dtd = Dtd::new("DOC");
        let general = Entity::internal("amp", EntityKind::Text, "&");
        let param = general.with_decl_type(DeclType::Parameter);
        dtd.add_entity(general).unwrap();
        dtd.add_entity(param).unwrap();

        assert_eq!(dtd.general_entity_count(), 1);
        assert_eq!(dtd.parameter_entity_count(), 1);
        assert_eq!(dtd.general_entity("amp").map(|(i, _)| i), Some(0));
    }
}

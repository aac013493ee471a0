//! Element Type Declarations

use std::sync::Arc;

use crate::AttributeDefinitionList;

/// Declared content of an element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Cdata,
    Rcdata,
    Empty,
    Any,
    Mixed,
    Element,
}

/// An element type declared in a DTD
#[derive(Debug, Clone)]
pub struct ElementType {
    name: Box<str>,
    /// Position in the owning DTD's element type table
    index: Option<usize>,
    content: ContentType,
    attribute_defs: Option<Arc<AttributeDefinitionList>>,
}

impl ElementType {
    /// Element type not (yet) registered in any DTD
    pub fn new(name: &str, content: ContentType) -> Self {
        Self {
            name: name.into(),
            index: None,
            content,
            attribute_defs: None,
        }
    }

    pub fn with_attribute_defs(mut self, defs: Arc<AttributeDefinitionList>) -> Self {
        self.attribute_defs = Some(defs);
        self
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = Some(index);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index in the DTD, `None` for unregistered types
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn content(&self) -> ContentType {
        self.content
    }

    pub fn attribute_defs(&self) -> Option<&Arc<AttributeDefinitionList>> {
        self.attribute_defs.as_ref()
    }
}

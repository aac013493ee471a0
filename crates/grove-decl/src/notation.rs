//! Notation Declarations

use std::sync::Arc;

use crate::{AttributeDefinitionList, ExternalId};

/// A notation declared in a DTD
#[derive(Debug, Clone)]
pub struct Notation {
    name: Box<str>,
    external_id: Option<ExternalId>,
    /// Data attributes declared with `<!ATTLIST #NOTATION ...>`
    attribute_defs: Option<Arc<AttributeDefinitionList>>,
}

impl Notation {
    pub fn new(name: &str, external_id: Option<ExternalId>) -> Self {
        Self {
            name: name.into(),
            external_id,
            attribute_defs: None,
        }
    }

    pub fn with_attribute_defs(mut self, defs: Arc<AttributeDefinitionList>) -> Self {
        self.attribute_defs = Some(defs);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn external_id(&self) -> Option<&ExternalId> {
        self.external_id.as_ref()
    }

    pub fn attribute_defs(&self) -> Option<&Arc<AttributeDefinitionList>> {
        self.attribute_defs.as_ref()
    }
}

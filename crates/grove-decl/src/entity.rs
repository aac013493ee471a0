//! Entity Declarations

use std::sync::Arc;

/// What an entity's replacement is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Parsed SGML text
    Text,
    /// Processing instruction text
    Pi,
    /// Specific character data
    Sdata,
    /// Character data
    Cdata,
    /// Non-SGML data in some notation
    Ndata,
    /// SGML subdocument
    Subdocument,
}

/// Where an entity was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclType {
    General,
    Parameter,
    Doctype,
    Linktype,
}

/// Public and system identifiers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalId {
    pub public_id: Option<Box<str>>,
    pub system_id: Option<Box<str>>,
    /// System identifier produced by the entity manager
    pub generated_system_id: Option<Box<str>>,
}

impl ExternalId {
    pub fn system(system_id: &str) -> Self {
        Self {
            system_id: Some(system_id.into()),
            ..Self::default()
        }
    }

    pub fn public(public_id: &str, system_id: Option<&str>) -> Self {
        Self {
            public_id: Some(public_id.into()),
            system_id: system_id.map(Into::into),
            generated_system_id: None,
        }
    }

    pub fn with_generated(mut self, generated: &str) -> Self {
        self.generated_system_id = Some(generated.into());
        self
    }
}

/// An entity declaration
#[derive(Debug, Clone)]
pub struct Entity {
    name: Box<str>,
    kind: EntityKind,
    decl_type: DeclType,
    text: Option<Box<str>>,
    external_id: Option<ExternalId>,
    notation: Option<Box<str>>,
    defaulted: bool,
}

impl Entity {
    /// Internal general entity with literal replacement text
    pub fn internal(name: &str, kind: EntityKind, text: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            kind,
            decl_type: DeclType::General,
            text: Some(text.into()),
            external_id: None,
            notation: None,
            defaulted: false,
        })
    }

    /// External general entity
    pub fn external(
        name: &str,
        kind: EntityKind,
        external_id: ExternalId,
        notation: Option<&str>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            kind,
            decl_type: DeclType::General,
            text: None,
            external_id: Some(external_id),
            notation: notation.map(Into::into),
            defaulted: false,
        })
    }

    /// Copy declared as a different kind of entity
    pub fn with_decl_type(&self, decl_type: DeclType) -> Arc<Self> {
        Arc::new(Self {
            decl_type,
            ..self.clone()
        })
    }

    /// Copy created from the default entity for an undeclared name
    pub fn defaulted_as(&self, name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            defaulted: true,
            ..self.clone()
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn decl_type(&self) -> DeclType {
        self.decl_type
    }

    /// Replacement text of an internal entity
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn external_id(&self) -> Option<&ExternalId> {
        self.external_id.as_ref()
    }

    /// Notation name of a data entity
    pub fn notation(&self) -> Option<&str> {
        self.notation.as_deref()
    }

    pub fn is_defaulted(&self) -> bool {
        self.defaulted
    }
}

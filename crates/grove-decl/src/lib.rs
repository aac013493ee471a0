//! Grove Declarations - SGML declaration model
//!
//! The objects a markup parser builds while reading a prolog: element
//! types, attribute definition lists, entities, notations and the DTD that
//! owns them, plus the instance syntax used to normalize names. The grove
//! only reads these; it never constructs or validates them.

mod attribute;
mod dtd;
mod element;
mod entity;
mod location;
mod notation;
mod syntax;
mod text;

pub use attribute::{
    AttributeDefinition, AttributeDefinitionList, AttributeList, AttributeValue, DeclaredValue,
    DefaultValue, DefaultValueType, TokenizedValue,
};
pub use dtd::Dtd;
pub use element::{ContentType, ElementType};
pub use entity::{DeclType, Entity, EntityKind, ExternalId};
pub use location::{Location, Origin};
pub use notation::Notation;
pub use syntax::{SubstitutionTable, Syntax};
pub use text::{Text, TextRun};

/// Errors raised while assembling a declaration set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeclError {
    #[error("Element type already declared: {0}")]
    DuplicateElementType(String),

    #[error("Entity already declared: {0}")]
    DuplicateEntity(String),

    #[error("Notation already declared: {0}")]
    DuplicateNotation(String),

    #[error("Attribute already defined: {0}")]
    DuplicateAttribute(String),

    #[error("No attribute named {0}")]
    UnknownAttribute(String),

    #[error("No attribute definition at index {0}")]
    NoSuchAttribute(usize),
}

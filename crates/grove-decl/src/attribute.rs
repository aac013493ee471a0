//! Attribute Definitions and Values
//!
//! An attribute definition list is shared by every owner that declares it
//! (an element type or a notation). An attribute list pairs such a
//! definition list with the values of one element instance.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::{DeclError, Text};

/// Declared value of an attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredValue {
    Cdata,
    Name,
    Names,
    Number,
    Numbers,
    Nmtoken,
    Nmtokens,
    Nutoken,
    Nutokens,
    Entity,
    Entities,
    Id,
    Idref,
    Idrefs,
    /// NOTATION (n1|n2|...)
    Notation(Vec<Box<str>>),
    /// (t1|t2|...)
    NameTokenGroup(Vec<Box<str>>),
}

impl DeclaredValue {
    /// Everything except CDATA is a list of tokens
    pub fn is_tokenized(&self) -> bool {
        !matches!(self, DeclaredValue::Cdata)
    }

    pub fn is_entity(&self) -> bool {
        matches!(self, DeclaredValue::Entity | DeclaredValue::Entities)
    }

    pub fn is_notation(&self) -> bool {
        matches!(self, DeclaredValue::Notation(_))
    }

    pub fn is_id(&self) -> bool {
        matches!(self, DeclaredValue::Id)
    }

    pub fn is_id_ref(&self) -> bool {
        matches!(self, DeclaredValue::Idref | DeclaredValue::Idrefs)
    }

    /// Members of a notation or name token group
    pub fn allowed_tokens(&self) -> Option<&[Box<str>]> {
        match self {
            DeclaredValue::Notation(tokens) | DeclaredValue::NameTokenGroup(tokens) => {
                Some(tokens)
            }
            _ => None,
        }
    }
}

/// Kind of default declared for an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultValueType {
    Value,
    Fixed,
    Required,
    Current,
    Conref,
    Implied,
}

/// Declared default of an attribute
#[derive(Debug, Clone)]
pub enum DefaultValue {
    Required,
    Implied,
    /// #CURRENT; `index` identifies the group of attributes sharing the
    /// most recently specified value
    Current { index: usize },
    Conref,
    Fixed(AttributeValue),
    Default(AttributeValue),
}

impl DefaultValue {
    pub fn value_type(&self) -> DefaultValueType {
        match self {
            DefaultValue::Required => DefaultValueType::Required,
            DefaultValue::Implied => DefaultValueType::Implied,
            DefaultValue::Current { .. } => DefaultValueType::Current,
            DefaultValue::Conref => DefaultValueType::Conref,
            DefaultValue::Fixed(_) => DefaultValueType::Fixed,
            DefaultValue::Default(_) => DefaultValueType::Value,
        }
    }

    /// Declared value text, for FIXED and ordinary defaults
    pub fn value(&self) -> Option<&AttributeValue> {
        match self {
            DefaultValue::Fixed(value) | DefaultValue::Default(value) => Some(value),
            _ => None,
        }
    }

    pub fn current_index(&self) -> Option<usize> {
        match self {
            DefaultValue::Current { index } => Some(*index),
            _ => None,
        }
    }
}

/// A whitespace separated token list, as it appears after normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedValue {
    text: Box<str>,
    spans: Vec<(usize, usize)>,
}

impl TokenizedValue {
    pub fn new(text: &str) -> Self {
        let mut spans = Vec::new();
        let mut start = None;
        for (i, c) in text.char_indices() {
            match (c.is_whitespace(), start) {
                (true, Some(s)) => {
                    spans.push((s, i));
                    start = None;
                }
                (false, None) => start = Some(i),
                _ => {}
            }
        }
        if let Some(s) = start {
            spans.push((s, text.len()));
        }
        Self {
            text: text.into(),
            spans,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn token(&self, index: usize) -> Option<&str> {
        self.spans.get(index).map(|&(s, e)| &self.text[s..e])
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> + '_ {
        self.spans.iter().map(|&(s, e)| &self.text[s..e])
    }
}

/// The value of one attribute
#[derive(Debug, Clone)]
pub enum AttributeValue {
    Cdata(Arc<Text>),
    Tokens(Arc<TokenizedValue>),
}

impl AttributeValue {
    pub fn cdata(text: impl Into<Text>) -> Self {
        AttributeValue::Cdata(Arc::new(text.into()))
    }

    pub fn tokens(text: &str) -> Self {
        AttributeValue::Tokens(Arc::new(TokenizedValue::new(text)))
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            AttributeValue::Cdata(text) => Some(text),
            AttributeValue::Tokens(_) => None,
        }
    }

    pub fn as_tokens(&self) -> Option<&TokenizedValue> {
        match self {
            AttributeValue::Tokens(tokens) => Some(tokens),
            AttributeValue::Cdata(_) => None,
        }
    }
}

/// One attribute definition
#[derive(Debug, Clone)]
pub struct AttributeDefinition {
    name: Box<str>,
    declared_value: DeclaredValue,
    default_value: DefaultValue,
}

impl AttributeDefinition {
    pub fn new(name: &str, declared_value: DeclaredValue, default_value: DefaultValue) -> Self {
        Self {
            name: name.into(),
            declared_value,
            default_value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_value(&self) -> &DeclaredValue {
        &self.declared_value
    }

    pub fn default_value(&self) -> &DefaultValue {
        &self.default_value
    }
}

/// Ordered attribute definitions, keyed by (normalized) name
#[derive(Debug, Clone, Default)]
pub struct AttributeDefinitionList {
    defs: IndexMap<Box<str>, AttributeDefinition>,
}

impl AttributeDefinitionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition at the end of the list
    pub fn define(&mut self, def: AttributeDefinition) -> Result<usize, DeclError> {
        if self.defs.contains_key(def.name()) {
            return Err(DeclError::DuplicateAttribute(def.name().to_owned()));
        }
        let (index, _) = self.defs.insert_full(def.name.clone(), def);
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&AttributeDefinition> {
        self.defs.get_index(index).map(|(_, def)| def)
    }

    /// Index of the definition named `name` (already normalized)
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.defs.get_index_of(name)
    }

    /// Index of the ID attribute, if one is declared
    pub fn id_index(&self) -> Option<usize> {
        self.defs.values().position(|def| def.declared_value.is_id())
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeDefinition> + '_ {
        self.defs.values()
    }
}

/// Attribute values of one element instance
#[derive(Debug, Clone)]
pub struct AttributeList {
    defs: Arc<AttributeDefinitionList>,
    values: Vec<Option<AttributeValue>>,
    specified: Vec<bool>,
}

impl AttributeList {
    /// List holding the declared defaults, nothing specified
    pub fn new(defs: Arc<AttributeDefinitionList>) -> Self {
        let values = defs.iter().map(|def| def.default_value().value().cloned()).collect();
        let specified = vec![false; defs.len()];
        Self {
            defs,
            values,
            specified,
        }
    }

    /// Specify the value at `index`
    pub fn set(&mut self, index: usize, value: AttributeValue) -> Result<(), DeclError> {
        let slot = self.values.get_mut(index).ok_or(DeclError::NoSuchAttribute(index))?;
        *slot = Some(value);
        self.specified[index] = true;
        Ok(())
    }

    /// Specify the value of the attribute named `name` (already normalized)
    pub fn set_named(&mut self, name: &str, value: AttributeValue) -> Result<(), DeclError> {
        let index = self
            .defs
            .index_of(name)
            .ok_or_else(|| DeclError::UnknownAttribute(name.to_owned()))?;
        self.set(index, value)
    }

    pub fn definitions(&self) -> &Arc<AttributeDefinitionList> {
        &self.defs
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index`; `None` when implied
    pub fn value(&self, index: usize) -> Option<&AttributeValue> {
        self.values.get(index).and_then(Option::as_ref)
    }

    pub fn specified(&self, index: usize) -> bool {
        self.specified.get(index).copied().unwrap_or(false)
    }

    /// First token of the ID attribute's value
    pub fn id(&self) -> Option<&str> {
        let index = self.defs.id_index()?;
        self.value(index)?.as_tokens()?.token(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defs() -> Arc<AttributeDefinitionList> {
        let mut list = AttributeDefinitionList::new();
        list.define(AttributeDefinition::new("ID", DeclaredValue::Id, DefaultValue::Implied))
            .unwrap();
        list.define(AttributeDefinition::new(
            "STATUS",
            DeclaredValue::NameTokenGroup(vec!["DRAFT".into(), "FINAL".into()]),
            DefaultValue::Default(AttributeValue::tokens("DRAFT")),
        ))
        .unwrap();
        Arc::new(list)
    }

    #[test]
    fn test_tokenize() {
        let value = TokenizedValue::new("  a bb\tccc ");
        assert_eq!(value.len(), 3);
        assert_eq!(value.tokens().collect::<Vec<_>>(), ["a", "bb", "ccc"]);
        assert!(TokenizedValue::new("   ").is_empty());
    }

    #[test]
    fn test_duplicate_definition() {
        let mut list = AttributeDefinitionList::new();
        list.define(AttributeDefinition::new("A", DeclaredValue::Cdata, DefaultValue::Implied))
            .unwrap();
        let err = list
            .define(AttributeDefinition::new("A", DeclaredValue::Cdata, DefaultValue::Implied))
            .unwrap_err();
        assert_eq!(err, DeclError::DuplicateAttribute("A".into()));
    }

    #[test]
    fn test_defaults_and_id() {
        let mut attrs = AttributeList::new(defs());
        assert!(attrs.value(0).is_none());
        assert_eq!(attrs.value(1).and_then(|v| v.as_tokens()).and_then(|t| t.token(0)), Some("DRAFT"));
        assert!(!attrs.specified(1));
        assert_eq!(attrs.id(), None);

        attrs.set_named("ID", AttributeValue::tokens("sec1")).unwrap();
        assert!(attrs.specified(0));
        assert_eq!(attrs.id(), Some("sec1"));
        assert!(attrs.set(7, AttributeValue::tokens("x")).is_err());
    }
}

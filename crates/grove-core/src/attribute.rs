//! Attribute Nodes
//!
//! Attribute nodes are never materialized. An assignment, definition or
//! value node is just the owner plus indexes; the value it stands for is
//! looked up in the owner's attribute list (or declared defaults) each time
//! a property is read. Three kinds of owner carry attributes: element
//! instances, element type declarations and notation declarations.

use std::sync::Arc;

use grove_decl::{AttributeDefinition, AttributeDefinitionList, AttributeValue, Text, TextRun};

use crate::access::{Probe, absent, present, wrong_class};
use crate::chunk::ChunkId;
use crate::grove::GroveState;
use crate::node::{EntityNode, NodeKind};

/// Which value of an attribute a value node walks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ValueSource {
    /// Value of an assignment (specified or defaulted)
    Current,
    /// Declared default of a definition
    Default,
}

/// Attributes of an element instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ElementAttributes(pub ChunkId);

/// Attribute definitions of an element type declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ElementTypeAttributes(pub u32);

/// Attribute definitions of a notation declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NotationAttributes(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum AttributeOwner {
    Element(ElementAttributes),
    ElementType(ElementTypeAttributes),
    Notation(NotationAttributes),
}

impl AttributeOwner {
    pub fn element(chunk: ChunkId) -> Self {
        AttributeOwner::Element(ElementAttributes(chunk))
    }

    pub fn element_type(index: u32) -> Self {
        AttributeOwner::ElementType(ElementTypeAttributes(index))
    }

    pub fn notation(index: u32) -> Self {
        AttributeOwner::Notation(NotationAttributes(index))
    }

    pub fn origin(&self) -> &dyn AttributeOrigin {
        match self {
            AttributeOwner::Element(origin) => origin,
            AttributeOwner::ElementType(origin) => origin,
            AttributeOwner::Notation(origin) => origin,
        }
    }
}

/// Something that owns attribute definitions and possibly values
pub(crate) trait AttributeOrigin {
    fn owner(&self) -> AttributeOwner;

    fn definitions<'a>(&self, state: &'a GroveState) -> Option<&'a Arc<AttributeDefinitionList>>;

    /// Value of attribute `index` for this owner; `None` when implied or
    /// when the owner has no instance values
    fn current_value<'a>(&self, state: &'a GroveState, index: usize) -> Option<&'a AttributeValue> {
        let _ = (state, index);
        None
    }

    fn specified(&self, state: &GroveState, index: usize) -> bool {
        let _ = (state, index);
        false
    }

    /// Node owning the assignments
    fn owner_node(&self) -> NodeKind;

    /// Node owning the definitions
    fn definitions_node(&self, _state: &GroveState) -> Probe<NodeKind> {
        Ok(self.owner_node())
    }

    fn count(&self, state: &GroveState) -> usize {
        self.definitions(state).map_or(0, |defs| defs.len())
    }

    fn definition<'a>(&self, state: &'a GroveState, index: usize) -> Option<&'a AttributeDefinition> {
        self.definitions(state)?.get(index)
    }

    fn value<'a>(
        &self,
        state: &'a GroveState,
        index: usize,
        source: ValueSource,
    ) -> Option<&'a AttributeValue> {
        match source {
            ValueSource::Current => self.current_value(state, index),
            ValueSource::Default => self.definition(state, index)?.default_value().value(),
        }
    }

    fn make_assignment_node(&self, index: usize) -> NodeKind {
        NodeKind::Attribute {
            owner: self.owner(),
            index: index as u32,
        }
    }

    fn make_definition_node(&self, index: usize) -> NodeKind {
        NodeKind::AttributeDef {
            owner: self.owner(),
            index: index as u32,
        }
    }

    /// First node of the value of attribute `index`
    fn make_value_node(&self, state: &GroveState, index: usize, source: ValueSource) -> Probe<NodeKind> {
        ValueRef {
            owner: self.owner(),
            attr: index as u32,
            source,
        }
        .first_node(state)
    }
}

impl AttributeOrigin for ElementAttributes {
    fn owner(&self) -> AttributeOwner {
        AttributeOwner::Element(*self)
    }

    fn definitions<'a>(&self, state: &'a GroveState) -> Option<&'a Arc<AttributeDefinitionList>> {
        let element = state.store.element(self.0)?;
        match &element.attributes {
            Some(list) => Some(list.definitions()),
            None => element.element_type.attribute_defs(),
        }
    }

    fn current_value<'a>(&self, state: &'a GroveState, index: usize) -> Option<&'a AttributeValue> {
        let element = state.store.element(self.0)?;
        match &element.attributes {
            Some(list) => list.value(index),
            None => self.definition(state, index)?.default_value().value(),
        }
    }

    fn specified(&self, state: &GroveState, index: usize) -> bool {
        state
            .store
            .element(self.0)
            .and_then(|element| element.attributes.as_ref())
            .is_some_and(|list| list.specified(index))
    }

    fn owner_node(&self) -> NodeKind {
        NodeKind::Element(self.0)
    }

    fn definitions_node(&self, state: &GroveState) -> Probe<NodeKind> {
        let element = present(state.store.element(self.0))?;
        let index = present(element.element_type.index())?;
        Ok(NodeKind::ElementType(index as u32))
    }
}

impl AttributeOrigin for ElementTypeAttributes {
    fn owner(&self) -> AttributeOwner {
        AttributeOwner::ElementType(*self)
    }

    fn definitions<'a>(&self, state: &'a GroveState) -> Option<&'a Arc<AttributeDefinitionList>> {
        state
            .governing
            .as_ref()?
            .element_type_at(self.0 as usize)?
            .attribute_defs()
    }

    fn owner_node(&self) -> NodeKind {
        NodeKind::ElementType(self.0)
    }
}

impl AttributeOrigin for NotationAttributes {
    fn owner(&self) -> AttributeOwner {
        AttributeOwner::Notation(*self)
    }

    fn definitions<'a>(&self, state: &'a GroveState) -> Option<&'a Arc<AttributeDefinitionList>> {
        state
            .governing
            .as_ref()?
            .notation_at(self.0 as usize)?
            .attribute_defs()
    }

    fn owner_node(&self) -> NodeKind {
        NodeKind::Notation(self.0)
    }
}

/// One attribute value (current or declared default) of one owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ValueRef {
    pub owner: AttributeOwner,
    pub attr: u32,
    pub source: ValueSource,
}

impl ValueRef {
    pub fn resolve<'a>(&self, state: &'a GroveState) -> Probe<&'a AttributeValue> {
        present(self.owner.origin().value(state, self.attr as usize, self.source))
    }

    pub fn definition<'a>(&self, state: &'a GroveState) -> Probe<&'a AttributeDefinition> {
        present(self.owner.origin().definition(state, self.attr as usize))
    }

    /// Assignment or definition node the value belongs to
    pub fn holder(&self) -> NodeKind {
        match self.source {
            ValueSource::Current => NodeKind::Attribute {
                owner: self.owner,
                index: self.attr,
            },
            ValueSource::Default => NodeKind::AttributeDef {
                owner: self.owner,
                index: self.attr,
            },
        }
    }

    fn text<'a>(&self, state: &'a GroveState) -> Probe<&'a Text> {
        match self.resolve(state)? {
            AttributeValue::Cdata(text) => Ok(text),
            AttributeValue::Tokens(_) => wrong_class(),
        }
    }

    fn token_count(&self, state: &GroveState) -> Probe<usize> {
        match self.resolve(state)? {
            AttributeValue::Tokens(tokens) => Ok(tokens.len()),
            AttributeValue::Cdata(_) => wrong_class(),
        }
    }

    pub fn first_node(&self, state: &GroveState) -> Probe<NodeKind> {
        match self.resolve(state)? {
            AttributeValue::Tokens(tokens) if tokens.is_empty() => absent(),
            AttributeValue::Tokens(_) => Ok(NodeKind::AttributeToken {
                value: *self,
                token: 0,
            }),
            AttributeValue::Cdata(text) => present(self.run_node(text, 0)),
        }
    }

    /// First node of the first non-empty run at or after `from`
    fn run_node(&self, text: &Text, from: usize) -> Option<NodeKind> {
        text.runs()
            .iter()
            .enumerate()
            .skip(from)
            .find_map(|(run, value)| match value {
                TextRun::Chars(chars) if chars.is_empty() => None,
                TextRun::Chars(_) => Some(NodeKind::AttributeChar {
                    value: *self,
                    run: run as u32,
                    index: 0,
                }),
                TextRun::Sdata { .. } => Some(NodeKind::AttributeSdata {
                    value: *self,
                    run: run as u32,
                }),
            })
    }

    /// Node at sibling position `position` of a CDATA value
    fn cdata_node_at(&self, text: &Text, mut position: usize) -> Option<NodeKind> {
        for (run, value) in text.runs().iter().enumerate() {
            let count = run_node_count(value);
            if position < count {
                return Some(match value {
                    TextRun::Chars(_) => NodeKind::AttributeChar {
                        value: *self,
                        run: run as u32,
                        index: position as u32,
                    },
                    TextRun::Sdata { .. } => NodeKind::AttributeSdata {
                        value: *self,
                        run: run as u32,
                    },
                });
            }
            position -= count;
        }
        None
    }
}

fn run_node_count(run: &TextRun) -> usize {
    match run {
        TextRun::Chars(chars) => chars.len(),
        TextRun::Sdata { .. } => 1,
    }
}

/// Next token of a tokenized value
pub(crate) fn token_follow(state: &GroveState, value: ValueRef, token: u32, steps: usize) -> Probe<NodeKind> {
    let target = token as usize + steps;
    if target < value.token_count(state)? {
        Ok(NodeKind::AttributeToken {
            value,
            token: target as u32,
        })
    } else {
        absent()
    }
}

/// Next CDATA value node; `index` is `None` to skip the rest of the run
pub(crate) fn cdata_next(state: &GroveState, value: ValueRef, run: u32, index: Option<u32>) -> Probe<NodeKind> {
    let text = value.text(state)?;
    if let Some(index) = index {
        let len = text.run(run as usize).map_or(0, TextRun::char_len);
        if (index as usize) + 1 < len {
            return Ok(NodeKind::AttributeChar {
                value,
                run,
                index: index + 1,
            });
        }
    }
    present(value.run_node(text, run as usize + 1))
}

/// Sibling position of a CDATA value node
pub(crate) fn cdata_index(state: &GroveState, value: ValueRef, run: u32, index: u32) -> Probe<usize> {
    let text = value.text(state)?;
    let before: usize = text.runs().iter().take(run as usize).map(run_node_count).sum();
    Ok(before + index as usize)
}

/// CDATA value node `steps` positions after the given one
pub(crate) fn cdata_follow(
    state: &GroveState,
    value: ValueRef,
    run: u32,
    index: u32,
    steps: usize,
) -> Probe<NodeKind> {
    let position = cdata_index(state, value, run, index)? + steps;
    present(value.cdata_node_at(value.text(state)?, position))
}

/// Text of a token node
pub(crate) fn token_text<'a>(state: &'a GroveState, value: ValueRef, token: u32) -> Probe<&'a str> {
    match value.resolve(state)? {
        AttributeValue::Tokens(tokens) => present(tokens.token(token as usize)),
        AttributeValue::Cdata(_) => wrong_class(),
    }
}

/// Entity named by an ENTITY or ENTITIES token
pub(crate) fn token_entity(state: &GroveState, value: ValueRef, token: u32) -> Probe<NodeKind> {
    if !value.definition(state)?.declared_value().is_entity() {
        return absent();
    }
    let name = token_text(state, value, token)?;
    lookup_document_entity(state, &state.syntax.normalize_entity(name)).map(NodeKind::Entity)
}

/// Notation named by a NOTATION token
pub(crate) fn token_notation(state: &GroveState, value: ValueRef, token: u32) -> Probe<NodeKind> {
    if !value.definition(state)?.declared_value().is_notation() {
        return absent();
    }
    let name = state.syntax.normalize_general(token_text(state, value, token)?);
    let (index, _) = present(state.dtd()?.notation(&name))?;
    Ok(NodeKind::Notation(index as u32))
}

/// Element whose ID an IDREF or IDREFS token names
pub(crate) fn token_referent(state: &GroveState, value: ValueRef, token: u32) -> Probe<NodeKind> {
    if !value.definition(state)?.declared_value().is_id_ref() {
        return absent();
    }
    let name = state.syntax.normalize_general(token_text(state, value, token)?);
    state.element_by_id(&name).map(NodeKind::Element)
}

/// Entity by normalized name: declared general entities first, then
/// entities defaulted so far
pub(crate) fn lookup_document_entity(state: &GroveState, name: &str) -> Probe<EntityNode> {
    if let Some(dtd) = &state.governing {
        if let Some((index, _)) = dtd.general_entity(name) {
            return Ok(EntityNode::General(index as u32));
        }
    }
    match state.defaulted.get_index_of(name) {
        Some(index) => Ok(EntityNode::Defaulted(index as u32)),
        None => state.absent_unless_building(),
    }
}

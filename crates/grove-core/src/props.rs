//! Node Properties
//!
//! Per-class accessors. Each one answers for the node classes it belongs
//! to and returns `WrongClass` for every other class.

use std::sync::Arc;

use grove_decl::{
    AttributeValue, ContentType, DeclaredValue, DefaultValueType, Entity, EntityKind, ExternalId,
    Location, TextRun,
};

use crate::access::{AccessError, AccessResult, Probe, absent, more_may_arrive, optional, present, wrong_class};
use crate::attribute::{self, AttributeOwner, ValueRef, ValueSource};
use crate::chunk::{ChunkId, ChunkKind, ElementChunk};
use crate::grove::GroveState;
use crate::list::{NamedListKind, NamedNodeList, NodeList};
use crate::message::Severity;
use crate::node::{EntityNode, ExternalIdOwner, NodeKind, NodePtr};

fn element(state: &GroveState, kind: NodeKind) -> Probe<&ElementChunk> {
    match kind {
        NodeKind::Element(id) => present(state.store.element(id)),
        _ => wrong_class(),
    }
}

fn entity_of(state: &GroveState, entity: EntityNode) -> Probe<&Arc<Entity>> {
    match entity {
        EntityNode::General(index) => present(state.dtd()?.general_entity_at(index as usize)),
        EntityNode::Parameter(index) => present(state.dtd()?.parameter_entity_at(index as usize)),
        EntityNode::Defaulted(index) => present(state.defaulted.get_index(index as usize).map(|(_, e)| e)),
        EntityNode::Default => present(state.dtd()?.default_entity()),
        EntityNode::Reference(chunk) => present(state.store.get(chunk).entity()),
    }
}

/// Table entry for the entity of reference chunk `chunk`
fn entity_node_for(state: &GroveState, chunk: ChunkId, entity: &Entity) -> EntityNode {
    let declared = state
        .governing
        .as_ref()
        .and_then(|dtd| dtd.general_entity(entity.name()))
        .map(|(index, _)| EntityNode::General(index as u32));
    let defaulted = || {
        state
            .defaulted
            .get_index_of(entity.name())
            .map(|index| EntityNode::Defaulted(index as u32))
    };
    declared.or_else(defaulted).unwrap_or(EntityNode::Reference(chunk))
}

fn external_id_of(state: &GroveState, owner: ExternalIdOwner) -> Probe<&ExternalId> {
    match owner {
        ExternalIdOwner::Entity(entity) => present(entity_of(state, entity)?.external_id()),
        ExternalIdOwner::Notation(index) => {
            present(present(state.dtd()?.notation_at(index as usize))?.external_id())
        }
    }
}

/// Notation node for a notation name
fn notation_named(state: &GroveState, name: &str) -> Probe<NodeKind> {
    let (index, _) = present(state.dtd()?.notation(name))?;
    Ok(NodeKind::Notation(index as u32))
}

fn cdata_run(state: &GroveState, value: ValueRef, run: u32) -> Probe<&TextRun> {
    match value.resolve(state)? {
        AttributeValue::Cdata(text) => present(text.run(run as usize)),
        AttributeValue::Tokens(_) => wrong_class(),
    }
}

fn require_document(kind: NodeKind) -> AccessResult<()> {
    match kind {
        NodeKind::Document => Ok(()),
        _ => Err(AccessError::WrongClass),
    }
}

fn require_doctype(kind: NodeKind) -> AccessResult<()> {
    match kind {
        NodeKind::DocumentType => Ok(()),
        _ => Err(AccessError::WrongClass),
    }
}

/// Element properties
impl NodePtr {
    /// Generic identifier of an element or element type
    pub fn gi(&self) -> AccessResult<String> {
        self.probe(|state, kind| match kind {
            NodeKind::Element(_) => Ok(element(state, kind)?.element_type.name().to_owned()),
            NodeKind::ElementType(index) => {
                Ok(present(state.dtd()?.element_type_at(index as usize))?.name().to_owned())
            }
            _ => wrong_class(),
        })
    }

    /// Value of the element's ID attribute
    pub fn id(&self) -> AccessResult<String> {
        self.probe(|state, kind| present(element(state, kind)?.id.as_deref().map(str::to_owned)))
    }

    /// Position of the element among all elements in document order
    pub fn element_index(&self) -> AccessResult<usize> {
        self.probe(|state, kind| Ok(element(state, kind)?.index as usize))
    }

    /// Whether the element was included by an inclusion exception
    pub fn included(&self) -> AccessResult<bool> {
        self.probe(|state, kind| Ok(element(state, kind)?.included))
    }

    pub fn attributes(&self) -> AccessResult<NamedNodeList> {
        match self.kind() {
            NodeKind::Element(id) => Ok(NamedNodeList::new(
                Arc::clone(self.grove_impl()),
                NamedListKind::Attributes(AttributeOwner::element(id)),
            )),
            _ => Err(AccessError::WrongClass),
        }
    }

    /// Declaration of the element's type
    pub fn element_type(&self) -> AccessResult<NodePtr> {
        self.probe_node(|state, kind| {
            let index = present(element(state, kind)?.element_type.index())?;
            present(state.dtd()?.element_type_at(index))?;
            Ok(NodeKind::ElementType(index as u32))
        })
    }

    /// Source location of a chunk-backed node
    pub fn location(&self) -> AccessResult<Location> {
        self.probe(|state, kind| match kind {
            NodeKind::Message(index) => {
                present(state.messages.get(index as usize).and_then(|m| m.location.clone()))
            }
            _ => {
                let (chunk, offset) = present(kind.chunk())?;
                let index = state.store.get(chunk).location + offset as u32;
                Ok(match state.store.origin_of(chunk) {
                    Some(origin) => Location::new(Arc::clone(origin), index),
                    None => Location::unknown(index),
                })
            }
        })
    }
}

/// Character data, processing instructions and entity references
impl NodePtr {
    pub fn char(&self) -> AccessResult<char> {
        self.probe(|state, kind| match kind {
            NodeKind::DataChar { chunk, index } => match &state.store.get(chunk).kind {
                ChunkKind::Data(chars) => present(chars.get(index as usize).copied()),
                _ => wrong_class(),
            },
            NodeKind::AttributeChar { value, run, index } => match cdata_run(state, value, run)? {
                TextRun::Chars(chars) => present(chars.get(index as usize).copied()),
                TextRun::Sdata { .. } => wrong_class(),
            },
            _ => wrong_class(),
        })
    }

    /// Processing instruction text or sdata replacement text
    pub fn system_data(&self) -> AccessResult<String> {
        self.probe(|state, kind| match kind {
            NodeKind::Pi(chunk) => match &state.store.get(chunk).kind {
                ChunkKind::Pi(text) => Ok(text.to_string()),
                _ => wrong_class(),
            },
            NodeKind::SdataRef(chunk) => {
                let entity = present(state.store.get(chunk).entity())?;
                present(entity.text().map(str::to_owned))
            }
            NodeKind::AttributeSdata { value, run } => match cdata_run(state, value, run)? {
                TextRun::Sdata { text, .. } => Ok(text.to_string()),
                TextRun::Chars(_) => wrong_class(),
            },
            _ => wrong_class(),
        })
    }

    /// Entity referenced by an entity reference, sdata value or ENTITY token
    pub fn entity(&self) -> AccessResult<NodePtr> {
        self.probe_node(|state, kind| match kind {
            NodeKind::SdataRef(chunk) | NodeKind::ExternalDataRef(chunk) | NodeKind::SubdocRef(chunk) => {
                let entity = present(state.store.get(chunk).entity())?;
                Ok(NodeKind::Entity(entity_node_for(state, chunk, entity)))
            }
            NodeKind::AttributeSdata { value, run } => match cdata_run(state, value, run)? {
                TextRun::Sdata { entity, .. } => {
                    attribute::lookup_document_entity(state, entity.name()).map(NodeKind::Entity)
                }
                TextRun::Chars(_) => wrong_class(),
            },
            NodeKind::AttributeToken { value, token } => attribute::token_entity(state, value, token),
            _ => wrong_class(),
        })
    }

    pub fn entity_name(&self) -> AccessResult<String> {
        self.probe(|state, kind| match kind {
            NodeKind::SdataRef(chunk) | NodeKind::ExternalDataRef(chunk) | NodeKind::SubdocRef(chunk) => {
                Ok(present(state.store.get(chunk).entity())?.name().to_owned())
            }
            NodeKind::AttributeSdata { value, run } => match cdata_run(state, value, run)? {
                TextRun::Sdata { entity, .. } => Ok(entity.name().to_owned()),
                TextRun::Chars(_) => wrong_class(),
            },
            _ => wrong_class(),
        })
    }

    pub fn non_sgml_char(&self) -> AccessResult<u32> {
        self.probe(|state, kind| match kind {
            NodeKind::NonSgml(chunk) => match state.store.get(chunk).kind {
                ChunkKind::NonSgml(code) => Ok(code),
                _ => wrong_class(),
            },
            _ => wrong_class(),
        })
    }
}

/// Attribute assignments, definitions and value tokens
impl NodePtr {
    /// Name of an attribute, definition or declaration
    pub fn name(&self) -> AccessResult<String> {
        self.probe(|state, kind| match kind {
            NodeKind::Attribute { owner, index } | NodeKind::AttributeDef { owner, index } => {
                Ok(present(owner.origin().definition(state, index as usize))?.name().to_owned())
            }
            NodeKind::ElementType(index) => {
                Ok(present(state.dtd()?.element_type_at(index as usize))?.name().to_owned())
            }
            NodeKind::Notation(index) => {
                Ok(present(state.dtd()?.notation_at(index as usize))?.name().to_owned())
            }
            NodeKind::Entity(entity) => Ok(entity_of(state, entity)?.name().to_owned()),
            NodeKind::DocumentType => Ok(state.dtd()?.name().to_owned()),
            _ => wrong_class(),
        })
    }

    /// Value nodes of an assignment; `Absent` when implied
    pub fn value(&self) -> AccessResult<NodeList> {
        let first = self.probe(|state, kind| match kind {
            NodeKind::Attribute { owner, index } => {
                let origin = owner.origin();
                present(origin.value(state, index as usize, ValueSource::Current))?;
                optional(origin.make_value_node(state, index as usize, ValueSource::Current))
            }
            _ => wrong_class(),
        })?;
        Ok(NodeList::chain(first.map(|kind| self.derive(kind))))
    }

    /// Whether an assignment has no value
    pub fn implied(&self) -> AccessResult<bool> {
        self.probe(|state, kind| match kind {
            NodeKind::Attribute { owner, index } => Ok(owner
                .origin()
                .value(state, index as usize, ValueSource::Current)
                .is_none()),
            _ => wrong_class(),
        })
    }

    /// Whether an assignment's value was given in the start-tag
    pub fn specified(&self) -> AccessResult<bool> {
        self.probe(|state, kind| match kind {
            NodeKind::Attribute { owner, index } => Ok(owner.origin().specified(state, index as usize)),
            _ => wrong_class(),
        })
    }

    /// Definition governing an assignment
    pub fn attribute_def(&self) -> AccessResult<NodePtr> {
        self.probe_node(|state, kind| match kind {
            NodeKind::Attribute { owner, index } => {
                let origin = owner.origin();
                present(origin.definition(state, index as usize))?;
                Ok(origin.make_definition_node(index as usize))
            }
            _ => wrong_class(),
        })
    }

    pub fn declared_value(&self) -> AccessResult<DeclaredValue> {
        self.probe(|state, kind| match kind {
            NodeKind::AttributeDef { owner, index } => Ok(present(owner.origin().definition(state, index as usize))?
                .declared_value()
                .clone()),
            _ => wrong_class(),
        })
    }

    pub fn default_value_type(&self) -> AccessResult<DefaultValueType> {
        self.probe(|state, kind| match kind {
            NodeKind::AttributeDef { owner, index } => Ok(present(owner.origin().definition(state, index as usize))?
                .default_value()
                .value_type()),
            _ => wrong_class(),
        })
    }

    /// Value nodes of a declared default; `Absent` when there is none
    pub fn default_value(&self) -> AccessResult<NodeList> {
        let first = self.probe(|state, kind| match kind {
            NodeKind::AttributeDef { owner, index } => {
                let origin = owner.origin();
                present(origin.value(state, index as usize, ValueSource::Default))?;
                optional(origin.make_value_node(state, index as usize, ValueSource::Default))
            }
            _ => wrong_class(),
        })?;
        Ok(NodeList::chain(first.map(|kind| self.derive(kind))))
    }

    /// Allowed tokens of a name token group or notation attribute
    pub fn tokens(&self) -> AccessResult<Vec<String>> {
        self.probe(|state, kind| match kind {
            NodeKind::AttributeDef { owner, index } => {
                let def = present(owner.origin().definition(state, index as usize))?;
                let tokens = present(def.declared_value().allowed_tokens())?;
                Ok(tokens.iter().map(|token| token.to_string()).collect())
            }
            _ => wrong_class(),
        })
    }

    /// Group index of a `#CURRENT` attribute
    pub fn current_attribute_index(&self) -> AccessResult<usize> {
        self.probe(|state, kind| match kind {
            NodeKind::AttributeDef { owner, index } => {
                let def = present(owner.origin().definition(state, index as usize))?;
                present(def.default_value().current_index())
            }
            _ => wrong_class(),
        })
    }

    pub fn token(&self) -> AccessResult<String> {
        self.probe(|state, kind| match kind {
            NodeKind::AttributeToken { value, token } => {
                attribute::token_text(state, value, token).map(str::to_owned)
            }
            _ => wrong_class(),
        })
    }

    /// Element whose ID an IDREF token names
    ///
    /// Waits while the grove is incomplete; `Absent` once it is complete
    /// and no element carries the ID.
    pub fn referent(&self) -> AccessResult<NodePtr> {
        self.probe_node(|state, kind| match kind {
            NodeKind::AttributeToken { value, token } => attribute::token_referent(state, value, token),
            _ => wrong_class(),
        })
    }

    /// Notation named by a NOTATION token or declared for an entity
    pub fn notation(&self) -> AccessResult<NodePtr> {
        self.probe_node(|state, kind| match kind {
            NodeKind::AttributeToken { value, token } => attribute::token_notation(state, value, token),
            NodeKind::Entity(entity) => {
                let name = present(entity_of(state, entity)?.notation())?;
                notation_named(state, name)
            }
            _ => wrong_class(),
        })
    }
}

/// Declarations
impl NodePtr {
    pub fn content_type(&self) -> AccessResult<ContentType> {
        self.probe(|state, kind| match kind {
            NodeKind::ElementType(index) => {
                Ok(present(state.dtd()?.element_type_at(index as usize))?.content())
            }
            _ => wrong_class(),
        })
    }

    pub fn attribute_defs(&self) -> AccessResult<NamedNodeList> {
        let owner = match self.kind() {
            NodeKind::ElementType(index) => AttributeOwner::element_type(index),
            NodeKind::Notation(index) => AttributeOwner::notation(index),
            _ => return Err(AccessError::WrongClass),
        };
        Ok(NamedNodeList::new(
            Arc::clone(self.grove_impl()),
            NamedListKind::AttributeDefs(owner),
        ))
    }

    pub fn external_id(&self) -> AccessResult<NodePtr> {
        self.probe_node(|state, kind| {
            let owner = match kind {
                NodeKind::Entity(entity) => ExternalIdOwner::Entity(entity),
                NodeKind::Notation(index) => ExternalIdOwner::Notation(index),
                _ => return wrong_class(),
            };
            external_id_of(state, owner)?;
            Ok(NodeKind::ExternalId(owner))
        })
    }

    fn external_id_field(&self, field: fn(&ExternalId) -> Option<&str>) -> AccessResult<String> {
        self.probe(|state, kind| match kind {
            NodeKind::ExternalId(owner) => present(field(external_id_of(state, owner)?).map(str::to_owned)),
            _ => wrong_class(),
        })
    }

    pub fn public_id(&self) -> AccessResult<String> {
        self.external_id_field(|id| id.public_id.as_deref())
    }

    pub fn system_id(&self) -> AccessResult<String> {
        self.external_id_field(|id| id.system_id.as_deref())
    }

    pub fn generated_system_id(&self) -> AccessResult<String> {
        self.external_id_field(|id| id.generated_system_id.as_deref())
    }

    /// Replacement text of an internal entity
    pub fn text(&self) -> AccessResult<String> {
        self.probe(|state, kind| match kind {
            NodeKind::Entity(entity) => present(entity_of(state, entity)?.text().map(str::to_owned)),
            _ => wrong_class(),
        })
    }

    pub fn entity_type(&self) -> AccessResult<EntityKind> {
        self.probe(|state, kind| match kind {
            NodeKind::Entity(entity) => Ok(entity_of(state, entity)?.kind()),
            _ => wrong_class(),
        })
    }

    /// Whether the entity was created for a reference to an undeclared name
    pub fn defaulted(&self) -> AccessResult<bool> {
        self.probe(|state, kind| match kind {
            NodeKind::Entity(entity) => {
                Ok(matches!(entity, EntityNode::Defaulted(_)) || entity_of(state, entity)?.is_defaulted())
            }
            _ => wrong_class(),
        })
    }
}

/// Document and document type
impl NodePtr {
    pub fn governing_doctype(&self) -> AccessResult<NodePtr> {
        require_document(self.kind())?;
        self.probe_node(|state, _| state.dtd().map(|_| NodeKind::DocumentType))
    }

    pub fn document_element(&self) -> AccessResult<NodePtr> {
        require_document(self.kind())?;
        self.probe_node(|state, _| match state.store.document().document_element {
            Some(id) => Ok(NodeKind::Element(id)),
            None => state.absent_unless_building(),
        })
    }

    /// Markup before the document element
    pub fn prolog(&self) -> AccessResult<NodeList> {
        require_document(self.kind())?;
        let first = self.probe(|state, _| {
            let document = state.store.document();
            match document.prolog_start {
                Some(id) => Ok(Some(state.store.get(id).first_node(id))),
                None if document.document_element.is_some() || state.complete => Ok(None),
                None => more_may_arrive(),
            }
        })?;
        Ok(NodeList::chain(first.map(|kind| self.derive(kind))))
    }

    /// Markup after the document element
    pub fn epilog(&self) -> AccessResult<NodeList> {
        require_document(self.kind())?;
        let first = self.probe(|state, _| match state.store.document().epilog_start {
            Some(id) => Ok(Some(state.store.get(id).first_node(id))),
            None if state.complete => Ok(None),
            None => more_may_arrive(),
        })?;
        Ok(NodeList::chain(first.map(|kind| self.derive(kind))))
    }

    /// APPINFO parameter of the SGML declaration
    pub fn application_info(&self) -> AccessResult<String> {
        require_document(self.kind())?;
        self.probe(|state, _| match &state.app_info {
            Some(info) => Ok(info.to_string()),
            None if state.prolog_ended || state.complete => absent(),
            None => more_may_arrive(),
        })
    }

    /// Messages reported while building, oldest first
    pub fn messages(&self) -> AccessResult<NodeList> {
        require_document(self.kind())?;
        let first = self.probe(|state, _| {
            if !state.messages.is_empty() {
                Ok(Some(NodeKind::Message(0)))
            } else if state.complete {
                Ok(None)
            } else {
                more_may_arrive()
            }
        })?;
        Ok(NodeList::chain(first.map(|kind| self.derive(kind))))
    }

    /// General entities of the governing DTD followed by defaulted entities
    pub fn entities(&self) -> AccessResult<NamedNodeList> {
        require_document(self.kind())?;
        Ok(NamedNodeList::new(
            Arc::clone(self.grove_impl()),
            NamedListKind::DocumentEntities,
        ))
    }

    /// Elements keyed by ID value
    pub fn elements(&self) -> AccessResult<NamedNodeList> {
        require_document(self.kind())?;
        Ok(NamedNodeList::new(Arc::clone(self.grove_impl()), NamedListKind::Elements))
    }

    pub fn link_process_name(&self) -> AccessResult<String> {
        require_document(self.kind())?;
        self.probe(|state, _| match &state.link.process_name {
            Some(name) => Ok(name.to_string()),
            None if state.prolog_ended || state.complete => absent(),
            None => more_may_arrive(),
        })
    }

    pub fn simple_link_names(&self) -> AccessResult<Vec<String>> {
        require_document(self.kind())?;
        self.probe(|state, _| {
            if !(state.prolog_ended || state.complete) {
                return more_may_arrive();
            }
            Ok(state.link.simple_links.iter().map(|name| name.to_string()).collect())
        })
    }

    /// Link types activated so far
    pub fn active_link_types(&self) -> AccessResult<Vec<String>> {
        require_document(self.kind())?;
        self.probe(|state, _| {
            if !(state.prolog_ended || state.complete) {
                return more_may_arrive();
            }
            Ok(state.link.active.iter().map(|name| name.to_string()).collect())
        })
    }

    /// Entity used for references to undeclared names
    pub fn default_entity(&self) -> AccessResult<NodePtr> {
        match self.kind() {
            NodeKind::Document | NodeKind::DocumentType => {}
            _ => return Err(AccessError::WrongClass),
        }
        self.probe_node(|state, _| {
            present(state.dtd()?.default_entity())?;
            Ok(NodeKind::Entity(EntityNode::Default))
        })
    }

    fn doctype_list(&self, kind: NamedListKind) -> AccessResult<NamedNodeList> {
        require_doctype(self.kind())?;
        Ok(NamedNodeList::new(Arc::clone(self.grove_impl()), kind))
    }

    pub fn element_types(&self) -> AccessResult<NamedNodeList> {
        self.doctype_list(NamedListKind::ElementTypes)
    }

    pub fn general_entities(&self) -> AccessResult<NamedNodeList> {
        self.doctype_list(NamedListKind::GeneralEntities)
    }

    pub fn parameter_entities(&self) -> AccessResult<NamedNodeList> {
        self.doctype_list(NamedListKind::ParameterEntities)
    }

    pub fn notations(&self) -> AccessResult<NamedNodeList> {
        self.doctype_list(NamedListKind::Notations)
    }
}

/// Messages
impl NodePtr {
    pub fn severity(&self) -> AccessResult<Severity> {
        self.probe(|state, kind| match kind {
            NodeKind::Message(index) => present(state.messages.get(index as usize)).map(|m| m.severity),
            _ => wrong_class(),
        })
    }

    pub fn message_text(&self) -> AccessResult<String> {
        self.probe(|state, kind| match kind {
            NodeKind::Message(index) => present(state.messages.get(index as usize)).map(|m| m.text.clone()),
            _ => wrong_class(),
        })
    }
}

//! Tree Navigation
//!
//! Every navigation step is a probe over the grove state: it answers from
//! what has been appended so far, or reports that the answer may still
//! arrive. `NodePtr` turns probes into waits (see `GroveImpl::probe`).
//!
//! Sibling rules for chunk-backed nodes:
//! - an element's next sibling is its backpatched link
//! - any other chunk's next sibling is the next chunk, if that chunk has the
//!   same parent
//! - at the document level the prolog chain stops before the document
//!   element, and the document element continues into the epilog

use grove_decl::{AttributeValue, TextRun};

use crate::access::{AccessError, AccessResult, Probe, absent, more_may_arrive, present, wrong_class};
use crate::attribute::{self, ValueSource};
use crate::chunk::{ChunkId, ChunkKind};
use crate::grove::GroveState;
use crate::list::NodeList;
use crate::node::{EntityNode, NodeKind, NodePtr};

/// `index + steps` if it is inside a table of `count` entries
#[inline]
fn advance(index: u32, steps: usize, count: usize) -> Option<u32> {
    let target = index as usize + steps;
    (target < count).then_some(target as u32)
}

/// First child chunk of element `parent`
fn first_child_chunk(state: &GroveState, parent: ChunkId) -> Probe<ChunkId> {
    match state.store.after(parent) {
        Some(next) if state.store.get(next).origin == Some(parent) => Ok(next),
        Some(_) => absent(),
        None if state.maybe_more_children(parent) => more_may_arrive(),
        None => absent(),
    }
}

/// Next sibling chunk of `id`
fn next_chunk(state: &GroveState, id: ChunkId) -> Probe<ChunkId> {
    let chunk = state.store.get(id);
    if let ChunkKind::Element(element) = &chunk.kind {
        return match element.next_sibling {
            Some(next) => Ok(next),
            None if state.maybe_more_siblings(id) => more_may_arrive(),
            None => absent(),
        };
    }

    match state.store.after(id) {
        Some(next) => {
            if state.store.get(next).origin != chunk.origin {
                return absent();
            }
            // The prolog ends where the document element starts
            if chunk.origin == Some(ChunkId::ROOT)
                && state.store.document().document_element == Some(next)
            {
                return absent();
            }
            Ok(next)
        }
        None if chunk
            .origin
            .is_some_and(|parent| state.maybe_more_children(parent)) =>
        {
            more_may_arrive()
        }
        None => absent(),
    }
}

/// First chunk of the sibling chain `id` belongs to
fn first_sibling_chunk(state: &GroveState, id: ChunkId) -> Probe<ChunkId> {
    let parent = present(state.store.get(id).origin)?;
    if parent != ChunkId::ROOT {
        return first_child_chunk(state, parent);
    }
    let document = state.store.document();
    match document.document_element {
        Some(element) if id >= element => Ok(element),
        _ => present(document.prolog_start),
    }
}

#[inline]
fn chunk_node(state: &GroveState, id: ChunkId) -> NodeKind {
    state.store.get(id).first_node(id)
}

impl EntityNode {
    fn parent(self) -> Probe<NodeKind> {
        match self {
            EntityNode::General(_) | EntityNode::Parameter(_) | EntityNode::Default => {
                Ok(NodeKind::DocumentType)
            }
            EntityNode::Defaulted(_) => Ok(NodeKind::Document),
            EntityNode::Reference(_) => absent(),
        }
    }

    fn follow(self, state: &GroveState, steps: usize) -> Probe<EntityNode> {
        match self {
            EntityNode::General(index) => {
                present(advance(index, steps, state.dtd()?.general_entity_count()))
                    .map(EntityNode::General)
            }
            EntityNode::Parameter(index) => {
                present(advance(index, steps, state.dtd()?.parameter_entity_count()))
                    .map(EntityNode::Parameter)
            }
            // More entities may be defaulted until the document ends
            EntityNode::Defaulted(index) => match advance(index, steps, state.defaulted.len()) {
                Some(next) => Ok(EntityNode::Defaulted(next)),
                None => state.absent_unless_building(),
            },
            EntityNode::Default | EntityNode::Reference(_) => absent(),
        }
    }

    fn first(self) -> EntityNode {
        match self {
            EntityNode::General(_) => EntityNode::General(0),
            EntityNode::Parameter(_) => EntityNode::Parameter(0),
            EntityNode::Defaulted(_) => EntityNode::Defaulted(0),
            other => other,
        }
    }

    fn index(self) -> usize {
        match self {
            EntityNode::General(index) | EntityNode::Parameter(index) | EntityNode::Defaulted(index) => {
                index as usize
            }
            EntityNode::Default | EntityNode::Reference(_) => 0,
        }
    }
}

impl NodeKind {
    pub(crate) fn parent(self, state: &GroveState) -> Probe<NodeKind> {
        if let Some((chunk, _)) = self.chunk() {
            return match state.store.get(chunk).origin {
                Some(ChunkId::ROOT) => Ok(NodeKind::Document),
                Some(parent) => Ok(NodeKind::Element(parent)),
                None => absent(),
            };
        }
        match self {
            NodeKind::Attribute { owner, .. } => Ok(owner.origin().owner_node()),
            NodeKind::AttributeDef { owner, .. } => owner.origin().definitions_node(state),
            NodeKind::AttributeToken { value, .. }
            | NodeKind::AttributeChar { value, .. }
            | NodeKind::AttributeSdata { value, .. } => Ok(value.holder()),
            NodeKind::DocumentType => Ok(NodeKind::Document),
            NodeKind::ElementType(_) | NodeKind::Notation(_) => Ok(NodeKind::DocumentType),
            NodeKind::Entity(entity) => entity.parent(),
            NodeKind::ExternalId(owner) => Ok(owner.node()),
            NodeKind::Message(_) => wrong_class(),
            _ => absent(),
        }
    }

    pub(crate) fn first_child(self, state: &GroveState) -> Probe<NodeKind> {
        match self {
            NodeKind::Element(id) => first_child_chunk(state, id).map(|child| chunk_node(state, child)),
            NodeKind::Attribute { owner, index } => {
                owner
                    .origin()
                    .make_value_node(state, index as usize, ValueSource::Current)
            }
            _ => wrong_class(),
        }
    }

    pub(crate) fn next_sibling(self, state: &GroveState) -> Probe<NodeKind> {
        self.follow_sibling(state, 0)
    }

    pub(crate) fn next_chunk_sibling(self, state: &GroveState) -> Probe<NodeKind> {
        match self {
            NodeKind::DataChar { chunk, .. } => next_chunk(state, chunk).map(|next| chunk_node(state, next)),
            NodeKind::AttributeChar { value, run, .. } => attribute::cdata_next(state, value, run, None),
            other => other.next_sibling(state),
        }
    }

    pub(crate) fn first_sibling(self, state: &GroveState) -> Probe<NodeKind> {
        if let Some((chunk, _)) = self.chunk() {
            return first_sibling_chunk(state, chunk).map(|first| chunk_node(state, first));
        }
        match self {
            NodeKind::Attribute { owner, .. } => Ok(NodeKind::Attribute { owner, index: 0 }),
            NodeKind::AttributeDef { owner, .. } => Ok(NodeKind::AttributeDef { owner, index: 0 }),
            NodeKind::AttributeToken { value, .. } => Ok(NodeKind::AttributeToken { value, token: 0 }),
            NodeKind::AttributeChar { value, .. } | NodeKind::AttributeSdata { value, .. } => {
                value.first_node(state)
            }
            NodeKind::ElementType(_) => Ok(NodeKind::ElementType(0)),
            NodeKind::Notation(_) => Ok(NodeKind::Notation(0)),
            NodeKind::Entity(entity) => Ok(NodeKind::Entity(entity.first())),
            NodeKind::Message(_) => wrong_class(),
            other => Ok(other),
        }
    }

    pub(crate) fn siblings_index(self, state: &GroveState) -> Probe<usize> {
        if let Some((chunk, offset)) = self.chunk() {
            let mut current = first_sibling_chunk(state, chunk)?;
            let mut count = 0;
            while current != chunk {
                count += state.store.get(current).node_count();
                current = next_chunk(state, current)?;
            }
            return Ok(count + offset);
        }
        match self {
            NodeKind::Attribute { index, .. }
            | NodeKind::AttributeDef { index, .. }
            | NodeKind::ElementType(index)
            | NodeKind::Notation(index) => Ok(index as usize),
            NodeKind::AttributeToken { token, .. } => Ok(token as usize),
            NodeKind::AttributeChar { value, run, index } => attribute::cdata_index(state, value, run, index),
            NodeKind::AttributeSdata { value, run } => attribute::cdata_index(state, value, run, 0),
            NodeKind::Entity(entity) => Ok(entity.index()),
            NodeKind::Message(_) => wrong_class(),
            _ => Ok(0),
        }
    }

    /// Sibling `steps + 1` positions after this node
    pub(crate) fn follow_sibling(self, state: &GroveState, steps: usize) -> Probe<NodeKind> {
        if let Some((id, offset)) = self.chunk() {
            return follow_chunk_sibling(state, id, offset, steps + 1);
        }
        match self {
            NodeKind::Attribute { owner, index } => {
                present(advance(index, steps + 1, owner.origin().count(state)))
                    .map(|index| NodeKind::Attribute { owner, index })
            }
            NodeKind::AttributeDef { owner, index } => {
                present(advance(index, steps + 1, owner.origin().count(state)))
                    .map(|index| NodeKind::AttributeDef { owner, index })
            }
            NodeKind::AttributeToken { value, token } => attribute::token_follow(state, value, token, steps + 1),
            NodeKind::AttributeChar { value, run, index } if steps == 0 => {
                attribute::cdata_next(state, value, run, Some(index))
            }
            NodeKind::AttributeChar { value, run, index } => {
                attribute::cdata_follow(state, value, run, index, steps + 1)
            }
            NodeKind::AttributeSdata { value, run } => attribute::cdata_follow(state, value, run, 0, steps + 1),
            NodeKind::ElementType(index) => {
                present(advance(index, steps + 1, state.dtd()?.element_type_count())).map(NodeKind::ElementType)
            }
            NodeKind::Notation(index) => {
                present(advance(index, steps + 1, state.dtd()?.notation_count())).map(NodeKind::Notation)
            }
            NodeKind::Entity(entity) => entity.follow(state, steps + 1).map(NodeKind::Entity),
            NodeKind::Message(index) => match advance(index, steps + 1, state.messages.len()) {
                Some(next) => Ok(NodeKind::Message(next)),
                None => state.absent_unless_building(),
            },
            _ => absent(),
        }
    }
}

/// Walk `steps` sibling positions forward from `offset` within chunk `id`,
/// crossing into following sibling chunks as each one is exhausted
fn follow_chunk_sibling(state: &GroveState, id: ChunkId, offset: usize, steps: usize) -> Probe<NodeKind> {
    let chunk = state.store.get(id);
    let left = chunk.node_count().saturating_sub(offset + 1);
    if steps <= left {
        return Ok(chunk.node_at(id, offset + steps));
    }
    let mut remaining = steps - left;
    let mut current = id;
    loop {
        current = next_chunk(state, current)?;
        let chunk = state.store.get(current);
        let count = chunk.node_count();
        if remaining <= count {
            return Ok(chunk.node_at(current, remaining - 1));
        }
        remaining -= count;
    }
}

/// Navigation
impl NodePtr {
    pub fn parent(&self) -> AccessResult<NodePtr> {
        self.probe_node(|state, kind| kind.parent(state))
    }

    pub fn first_child(&self) -> AccessResult<NodePtr> {
        self.probe_node(|state, kind| kind.first_child(state))
    }

    pub fn next_sibling(&self) -> AccessResult<NodePtr> {
        self.probe_node(|state, kind| kind.next_sibling(state))
    }

    /// First sibling after the chunk holding this node (the rest of a data
    /// run is skipped)
    pub fn next_chunk_sibling(&self) -> AccessResult<NodePtr> {
        self.probe_node(|state, kind| kind.next_chunk_sibling(state))
    }

    pub fn first_sibling(&self) -> AccessResult<NodePtr> {
        self.probe_node(|state, kind| kind.first_sibling(state))
    }

    /// Position among the siblings, counting from zero
    pub fn siblings_index(&self) -> AccessResult<usize> {
        self.probe(|state, kind| kind.siblings_index(state))
    }

    /// Sibling `n + 1` positions ahead; `n == 0` is the next sibling
    pub fn follow_sibling_ref(&self, n: usize) -> AccessResult<NodePtr> {
        self.probe_node(|state, kind| kind.follow_sibling(state, n))
    }

    pub fn assign_parent(&mut self) -> AccessResult<()> {
        self.probe_assign(|state, kind| kind.parent(state))
    }

    pub fn assign_first_child(&mut self) -> AccessResult<()> {
        self.probe_assign(|state, kind| kind.first_child(state))
    }

    pub fn assign_next_sibling(&mut self) -> AccessResult<()> {
        self.probe_assign(|state, kind| kind.next_sibling(state))
    }

    pub fn assign_next_chunk_sibling(&mut self) -> AccessResult<()> {
        self.probe_assign(|state, kind| kind.next_chunk_sibling(state))
    }

    pub fn assign_first_sibling(&mut self) -> AccessResult<()> {
        self.probe_assign(|state, kind| kind.first_sibling(state))
    }

    pub fn assign_follow_sibling_ref(&mut self, n: usize) -> AccessResult<()> {
        self.probe_assign(|state, kind| kind.follow_sibling(state, n))
    }

    /// Children in order; empty for a childless element
    pub fn children(&self) -> AccessResult<NodeList> {
        match self.first_child() {
            Ok(first) => Ok(NodeList::chain(Some(first))),
            Err(AccessError::Absent) => Ok(NodeList::empty()),
            Err(err) => Err(err),
        }
    }

    /// Content of an element
    pub fn content(&self) -> AccessResult<NodeList> {
        match self.kind() {
            NodeKind::Element(_) => self.children(),
            _ => Err(AccessError::WrongClass),
        }
    }

    /// This node and its following siblings
    pub fn follow(&self) -> AccessResult<NodeList> {
        match self.kind() {
            NodeKind::Message(_) | NodeKind::Document => Err(AccessError::WrongClass),
            _ => Ok(NodeList::chain(Some(self.clone()))),
        }
    }

    /// Characters of the run this node starts, from its offset to the end
    /// of its chunk
    pub fn char_chunk(&self) -> AccessResult<String> {
        self.probe(|state, kind| match kind {
            NodeKind::DataChar { chunk, index } => match &state.store.get(chunk).kind {
                ChunkKind::Data(chars) => Ok(chars[index as usize..].iter().collect()),
                _ => wrong_class(),
            },
            NodeKind::AttributeChar { value, run, index } => match value.resolve(state)? {
                AttributeValue::Cdata(text) => match text.run(run as usize) {
                    Some(TextRun::Chars(chars)) => Ok(chars[index as usize..].iter().collect()),
                    _ => absent(),
                },
                AttributeValue::Tokens(_) => wrong_class(),
            },
            _ => wrong_class(),
        })
    }

    /// Whether an element may still gain a next sibling
    pub fn maybe_more_siblings(&self) -> AccessResult<bool> {
        match self.kind() {
            NodeKind::Element(id) => self.grove_impl().with_state(|state| Ok(state.maybe_more_siblings(id))),
            _ => Err(AccessError::WrongClass),
        }
    }
}


//! Grove Nodes - Compact handles
//!
//! A node is never stored. It is a small value naming a position in the
//! grove: a chunk id, a chunk id plus a character offset, an attribute
//! index, a declaration table index. `NodePtr` wraps that value together
//! with a strong reference to the grove, so a handle keeps its grove alive
//! and two handles are equal when they name the same position.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;
use std::sync::Arc;

use crate::access::{AccessResult, Probe};
use crate::attribute::{AttributeOwner, ValueRef};
use crate::chunk::ChunkId;
use crate::grove::{Grove, GroveImpl, GroveState};

/// Public node classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeClass {
    SgmlDocument,
    Element,
    DataChar,
    Sdata,
    Pi,
    ExternalDataEntityRef,
    SubdocEntityRef,
    NonSgml,
    AttributeAssignment,
    AttributeDef,
    AttributeValueToken,
    DocumentType,
    ElementType,
    Notation,
    Entity,
    ExternalId,
    Message,
}

/// Where an entity node comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum EntityNode {
    General(u32),
    Parameter(u32),
    Defaulted(u32),
    /// The governing DTD's default entity
    Default,
    /// Entity of a reference chunk that no table holds
    Reference(ChunkId),
}

/// Declaration carrying an external identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ExternalIdOwner {
    Entity(EntityNode),
    Notation(u32),
}

impl ExternalIdOwner {
    pub fn node(self) -> NodeKind {
        match self {
            ExternalIdOwner::Entity(entity) => NodeKind::Entity(entity),
            ExternalIdOwner::Notation(index) => NodeKind::Notation(index),
        }
    }
}

/// Every kind of node, with the ids that locate it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum NodeKind {
    Document,
    Element(ChunkId),
    DataChar { chunk: ChunkId, index: u32 },
    Pi(ChunkId),
    SdataRef(ChunkId),
    ExternalDataRef(ChunkId),
    SubdocRef(ChunkId),
    NonSgml(ChunkId),
    Attribute { owner: AttributeOwner, index: u32 },
    AttributeDef { owner: AttributeOwner, index: u32 },
    AttributeToken { value: ValueRef, token: u32 },
    AttributeChar { value: ValueRef, run: u32, index: u32 },
    AttributeSdata { value: ValueRef, run: u32 },
    DocumentType,
    ElementType(u32),
    Notation(u32),
    Entity(EntityNode),
    ExternalId(ExternalIdOwner),
    Message(u32),
}

impl NodeKind {
    pub fn class(self) -> NodeClass {
        match self {
            NodeKind::Document => NodeClass::SgmlDocument,
            NodeKind::Element(_) => NodeClass::Element,
            NodeKind::DataChar { .. } | NodeKind::AttributeChar { .. } => NodeClass::DataChar,
            NodeKind::SdataRef(_) | NodeKind::AttributeSdata { .. } => NodeClass::Sdata,
            NodeKind::Pi(_) => NodeClass::Pi,
            NodeKind::ExternalDataRef(_) => NodeClass::ExternalDataEntityRef,
            NodeKind::SubdocRef(_) => NodeClass::SubdocEntityRef,
            NodeKind::NonSgml(_) => NodeClass::NonSgml,
            NodeKind::Attribute { .. } => NodeClass::AttributeAssignment,
            NodeKind::AttributeDef { .. } => NodeClass::AttributeDef,
            NodeKind::AttributeToken { .. } => NodeClass::AttributeValueToken,
            NodeKind::DocumentType => NodeClass::DocumentType,
            NodeKind::ElementType(_) => NodeClass::ElementType,
            NodeKind::Notation(_) => NodeClass::Notation,
            NodeKind::Entity(_) => NodeClass::Entity,
            NodeKind::ExternalId(_) => NodeClass::ExternalId,
            NodeKind::Message(_) => NodeClass::Message,
        }
    }

    /// Chunk and in-chunk offset for chunk-backed nodes
    #[inline]
    pub fn chunk(self) -> Option<(ChunkId, usize)> {
        match self {
            NodeKind::Element(chunk)
            | NodeKind::Pi(chunk)
            | NodeKind::SdataRef(chunk)
            | NodeKind::ExternalDataRef(chunk)
            | NodeKind::SubdocRef(chunk)
            | NodeKind::NonSgml(chunk) => Some((chunk, 0)),
            NodeKind::DataChar { chunk, index } => Some((chunk, index as usize)),
            _ => None,
        }
    }

    /// Same variant, so a handle can be rewritten in place
    #[inline]
    fn same_family(&self, other: &NodeKind) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

pub(crate) struct Node {
    grove: Arc<GroveImpl>,
    kind: NodeKind,
}

/// Shared handle on a grove node
///
/// Cloning shares the handle. The `assign_*` navigation variants rewrite a
/// uniquely owned handle in place instead of allocating a new one; other
/// clones are never affected.
#[derive(Clone)]
pub struct NodePtr(Arc<Node>);

impl NodePtr {
    pub(crate) fn new(grove: Arc<GroveImpl>, kind: NodeKind) -> Self {
        NodePtr(Arc::new(Node { grove, kind }))
    }

    #[inline]
    pub(crate) fn kind(&self) -> NodeKind {
        self.0.kind
    }

    #[inline]
    pub(crate) fn grove_impl(&self) -> &Arc<GroveImpl> {
        &self.0.grove
    }

    /// Grove this node belongs to
    pub fn grove(&self) -> Grove {
        Grove::from_impl(Arc::clone(&self.0.grove))
    }

    pub fn class(&self) -> NodeClass {
        self.0.kind.class()
    }

    /// Whether both handles share one allocation
    pub fn same_object(a: &NodePtr, b: &NodePtr) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub fn same_grove(&self, other: &NodePtr) -> bool {
        self.0.grove.id() == other.0.grove.id()
    }

    /// New handle on another node of the same grove
    pub(crate) fn derive(&self, kind: NodeKind) -> NodePtr {
        NodePtr::new(Arc::clone(&self.0.grove), kind)
    }

    /// Point this handle at `kind`, reusing the allocation when possible
    pub(crate) fn assign(&mut self, kind: NodeKind) {
        if let Some(node) = Arc::get_mut(&mut self.0) {
            if node.kind.same_family(&kind) {
                node.kind = kind;
                return;
            }
        }
        let grove = Arc::clone(&self.0.grove);
        self.0 = Arc::new(Node { grove, kind });
    }

    /// Probe (and wait as needed) for a value derived from this node
    pub(crate) fn probe<T>(
        &self,
        mut step: impl FnMut(&GroveState, NodeKind) -> Probe<T>,
    ) -> AccessResult<T> {
        let kind = self.kind();
        self.0.grove.probe(|state| step(state, kind))
    }

    /// Probe for another node
    pub(crate) fn probe_node(
        &self,
        step: impl FnMut(&GroveState, NodeKind) -> Probe<NodeKind>,
    ) -> AccessResult<NodePtr> {
        let kind = self.probe(step)?;
        Ok(self.derive(kind))
    }

    /// Probe for another node and move this handle onto it
    pub(crate) fn probe_assign(
        &mut self,
        step: impl FnMut(&GroveState, NodeKind) -> Probe<NodeKind>,
    ) -> AccessResult<()> {
        let kind = self.probe(step)?;
        self.assign(kind);
        Ok(())
    }
}

impl PartialEq for NodePtr {
    fn eq(&self, other: &Self) -> bool {
        self.same_grove(other) && self.0.kind == other.0.kind
    }
}

impl Eq for NodePtr {}

impl Hash for NodePtr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.grove.id().hash(state);
        self.0.kind.hash(state);
    }
}

impl fmt::Debug for NodePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodePtr")
            .field("grove", &self.0.grove.id())
            .field("kind", &self.0.kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GroveConfig;

    fn handle(kind: NodeKind) -> NodePtr {
        NodePtr::new(GroveImpl::new(GroveConfig::default()), kind)
    }

    #[test]
    fn test_assign_reuses_unique_handle() {
        let mut node = handle(NodeKind::Pi(ChunkId::from_index(1)));
        let before = Arc::as_ptr(&node.0);
        node.assign(NodeKind::Pi(ChunkId::from_index(2)));
        assert_eq!(Arc::as_ptr(&node.0), before);
        assert_eq!(node.kind(), NodeKind::Pi(ChunkId::from_index(2)));
    }

    #[test]
    fn test_assign_leaves_shared_handle_alone() {
        let mut node = handle(NodeKind::Pi(ChunkId::from_index(1)));
        let other = node.clone();
        node.assign(NodeKind::Pi(ChunkId::from_index(2)));
        assert!(!NodePtr::same_object(&node, &other));
        assert_eq!(other.kind(), NodeKind::Pi(ChunkId::from_index(1)));
    }

    #[test]
    fn test_assign_across_families_allocates() {
        let mut node = handle(NodeKind::Pi(ChunkId::from_index(1)));
        let before = Arc::as_ptr(&node.0);
        node.assign(NodeKind::Element(ChunkId::from_index(3)));
        assert_ne!(Arc::as_ptr(&node.0), before);
        assert_eq!(node.class(), NodeClass::Element);
    }

    #[test]
    fn test_equality_is_per_grove() {
        let a = handle(NodeKind::Document);
        let b = handle(NodeKind::Document);
        assert_ne!(a, b);
        assert_eq!(a, a.derive(NodeKind::Document));
    }
}

//! Node Lists
//!
//! `NodeList` is a lazy sibling chain (children, attribute values, message
//! chains) or a snapshot of handles collected once. `NamedNodeList` is a
//! keyed view (attributes, definitions, declarations, elements by ID) whose
//! lookups normalize the key with the grove's instance syntax.

use std::fmt;
use std::sync::Arc;

use crate::access::{AccessError, AccessResult, Probe, absent, more_may_arrive, present};
use crate::attribute::{self, AttributeOwner};
use crate::grove::{GroveImpl, GroveState};
use crate::node::{EntityNode, NodeKind, NodePtr};

#[derive(Clone)]
enum ListInner {
    /// `first` and every sibling after it
    Chain(Option<NodePtr>),
    Snapshot { nodes: Arc<[NodePtr]>, start: usize },
}

/// Ordered list of nodes
#[derive(Clone)]
pub struct NodeList {
    inner: ListInner,
}

impl NodeList {
    pub fn empty() -> Self {
        Self {
            inner: ListInner::Chain(None),
        }
    }

    pub(crate) fn chain(first: Option<NodePtr>) -> Self {
        Self {
            inner: ListInner::Chain(first),
        }
    }

    pub(crate) fn snapshot(nodes: Vec<NodePtr>) -> Self {
        Self {
            inner: ListInner::Snapshot {
                nodes: nodes.into(),
                start: 0,
            },
        }
    }

    /// First node, `Absent` when the list is empty
    pub fn first(&self) -> AccessResult<NodePtr> {
        match &self.inner {
            ListInner::Chain(first) => first.clone().ok_or(AccessError::Absent),
            ListInner::Snapshot { nodes, start } => nodes.get(*start).cloned().ok_or(AccessError::Absent),
        }
    }

    /// Everything after the first node
    pub fn rest(&self) -> AccessResult<NodeList> {
        match &self.inner {
            ListInner::Chain(None) => Err(AccessError::Absent),
            ListInner::Chain(Some(first)) => match first.next_sibling() {
                Ok(next) => Ok(NodeList::chain(Some(next))),
                Err(AccessError::Absent) => Ok(NodeList::empty()),
                Err(err) => Err(err),
            },
            ListInner::Snapshot { nodes, start } if *start < nodes.len() => Ok(Self {
                inner: ListInner::Snapshot {
                    nodes: Arc::clone(nodes),
                    start: start + 1,
                },
            }),
            ListInner::Snapshot { .. } => Err(AccessError::Absent),
        }
    }

    /// Node at position `n`
    pub fn nth(&self, n: usize) -> AccessResult<NodePtr> {
        match &self.inner {
            ListInner::Chain(None) => Err(AccessError::Absent),
            ListInner::Chain(Some(first)) if n == 0 => Ok(first.clone()),
            ListInner::Chain(Some(first)) => first.follow_sibling_ref(n - 1),
            ListInner::Snapshot { nodes, start } => nodes.get(start + n).cloned().ok_or(AccessError::Absent),
        }
    }

    /// Number of nodes; walks the chain, waiting for it to complete
    pub fn len(&self) -> AccessResult<usize> {
        match &self.inner {
            ListInner::Snapshot { nodes, start } => Ok(nodes.len().saturating_sub(*start)),
            ListInner::Chain(_) => self.iter().try_fold(0, |count, node| node.map(|_| count + 1)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first().is_err()
    }

    pub fn iter(&self) -> NodeListIter {
        match &self.inner {
            ListInner::Chain(first) => NodeListIter {
                next: first.clone().map(Ok),
                snapshot: None,
            },
            ListInner::Snapshot { nodes, start } => NodeListIter {
                next: None,
                snapshot: Some((Arc::clone(nodes), *start)),
            },
        }
    }

    pub fn to_vec(&self) -> AccessResult<Vec<NodePtr>> {
        self.iter().collect()
    }
}

impl fmt::Debug for NodeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            ListInner::Chain(first) => f.debug_tuple("NodeList::Chain").field(first).finish(),
            ListInner::Snapshot { nodes, start } => f.debug_list().entries(&nodes[*start..]).finish(),
        }
    }
}

impl IntoIterator for &NodeList {
    type Item = AccessResult<NodePtr>;
    type IntoIter = NodeListIter;

    fn into_iter(self) -> NodeListIter {
        self.iter()
    }
}

/// Iterator over a node list
///
/// Yields `Err` once if the chain cannot be continued (for instance
/// `Blocked` under a polling grove), then stops.
pub struct NodeListIter {
    next: Option<AccessResult<NodePtr>>,
    snapshot: Option<(Arc<[NodePtr]>, usize)>,
}

impl Iterator for NodeListIter {
    type Item = AccessResult<NodePtr>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some((nodes, position)) = &mut self.snapshot {
            let node = nodes.get(*position).cloned();
            *position += 1;
            return node.map(Ok);
        }
        match self.next.take()? {
            Ok(node) => {
                self.next = match node.next_sibling() {
                    Ok(next) => Some(Ok(next)),
                    Err(AccessError::Absent) => None,
                    Err(err) => Some(Err(err)),
                };
                Some(Ok(node))
            }
            Err(err) => Some(Err(err)),
        }
    }
}

/// What a named node list is keyed over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NamedListKind {
    Attributes(AttributeOwner),
    AttributeDefs(AttributeOwner),
    ElementTypes,
    GeneralEntities,
    ParameterEntities,
    /// General entities plus defaulted entities
    DocumentEntities,
    Notations,
    /// Elements keyed by ID
    Elements,
}

/// Public classification of a named node list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedListType {
    Attributes,
    AttributeDefs,
    ElementTypes,
    Entities,
    Notations,
    Elements,
}

/// Nodes addressable by name
#[derive(Clone)]
pub struct NamedNodeList {
    grove: Arc<GroveImpl>,
    kind: NamedListKind,
}

impl NamedNodeList {
    pub(crate) fn new(grove: Arc<GroveImpl>, kind: NamedListKind) -> Self {
        Self { grove, kind }
    }

    pub fn list_type(&self) -> NamedListType {
        match self.kind {
            NamedListKind::Attributes(_) => NamedListType::Attributes,
            NamedListKind::AttributeDefs(_) => NamedListType::AttributeDefs,
            NamedListKind::ElementTypes => NamedListType::ElementTypes,
            NamedListKind::GeneralEntities
            | NamedListKind::ParameterEntities
            | NamedListKind::DocumentEntities => NamedListType::Entities,
            NamedListKind::Notations => NamedListType::Notations,
            NamedListKind::Elements => NamedListType::Elements,
        }
    }

    /// Fold `name` the way keys of this list are folded
    pub fn normalize(&self, name: &str) -> String {
        let state = self.grove.read();
        match self.list_type() {
            NamedListType::Entities => state.syntax.normalize_entity(name),
            _ => state.syntax.normalize_general(name),
        }
    }

    /// Node named `name` (normalized first)
    pub fn named_node(&self, name: &str) -> AccessResult<NodePtr> {
        let key = self.normalize(name);
        let kind = self.grove.probe(|state| self.lookup(state, &key))?;
        Ok(NodePtr::new(Arc::clone(&self.grove), kind))
    }

    fn lookup(&self, state: &GroveState, key: &str) -> Probe<NodeKind> {
        match self.kind {
            NamedListKind::Attributes(owner) => {
                let origin = owner.origin();
                present(origin.definitions(state).and_then(|defs| defs.index_of(key)))
                    .map(|index| origin.make_assignment_node(index))
            }
            NamedListKind::AttributeDefs(owner) => {
                let origin = owner.origin();
                present(origin.definitions(state).and_then(|defs| defs.index_of(key)))
                    .map(|index| origin.make_definition_node(index))
            }
            NamedListKind::ElementTypes => {
                let element_type = present(state.dtd()?.element_type(key))?;
                present(element_type.index()).map(|index| NodeKind::ElementType(index as u32))
            }
            NamedListKind::GeneralEntities => present(state.dtd()?.general_entity(key))
                .map(|(index, _)| NodeKind::Entity(EntityNode::General(index as u32))),
            NamedListKind::ParameterEntities => present(state.dtd()?.parameter_entity(key))
                .map(|(index, _)| NodeKind::Entity(EntityNode::Parameter(index as u32))),
            NamedListKind::DocumentEntities => {
                attribute::lookup_document_entity(state, key).map(NodeKind::Entity)
            }
            NamedListKind::Notations => present(state.dtd()?.notation(key))
                .map(|(index, _)| NodeKind::Notation(index as u32)),
            NamedListKind::Elements => state.element_by_id(key).map(NodeKind::Element),
        }
    }

    /// All nodes of the list, in declaration (or document) order
    pub fn node_list(&self) -> AccessResult<NodeList> {
        let node = |kind| NodePtr::new(Arc::clone(&self.grove), kind);
        match self.kind {
            NamedListKind::DocumentEntities | NamedListKind::Elements => {
                let kinds = self.grove.probe(|state| self.snapshot_kinds(state))?;
                Ok(NodeList::snapshot(kinds.into_iter().map(node).collect()))
            }
            _ => {
                let first = self.grove.probe(|state| self.first_kind(state))?;
                Ok(NodeList::chain(first.map(node)))
            }
        }
    }

    /// Head of a list whose members form a sibling chain
    fn first_kind(&self, state: &GroveState) -> Probe<Option<NodeKind>> {
        Ok(match self.kind {
            NamedListKind::Attributes(owner) => {
                let origin = owner.origin();
                (origin.count(state) > 0).then(|| origin.make_assignment_node(0))
            }
            NamedListKind::AttributeDefs(owner) => {
                let origin = owner.origin();
                (origin.count(state) > 0).then(|| origin.make_definition_node(0))
            }
            NamedListKind::ElementTypes => {
                (state.dtd()?.element_type_count() > 0).then_some(NodeKind::ElementType(0))
            }
            NamedListKind::GeneralEntities => (state.dtd()?.general_entity_count() > 0)
                .then_some(NodeKind::Entity(EntityNode::General(0))),
            NamedListKind::ParameterEntities => (state.dtd()?.parameter_entity_count() > 0)
                .then_some(NodeKind::Entity(EntityNode::Parameter(0))),
            NamedListKind::Notations => (state.dtd()?.notation_count() > 0).then_some(NodeKind::Notation(0)),
            NamedListKind::DocumentEntities | NamedListKind::Elements => None,
        })
    }

    /// Members of lists that keep growing until the document ends
    fn snapshot_kinds(&self, state: &GroveState) -> Probe<Vec<NodeKind>> {
        if !state.complete {
            return more_may_arrive();
        }
        match self.kind {
            NamedListKind::DocumentEntities => {
                let general = state.governing.as_ref().map_or(0, |dtd| dtd.general_entity_count());
                let general = (0..general).map(|index| NodeKind::Entity(EntityNode::General(index as u32)));
                let defaulted =
                    (0..state.defaulted.len()).map(|index| NodeKind::Entity(EntityNode::Defaulted(index as u32)));
                Ok(general.chain(defaulted).collect())
            }
            NamedListKind::Elements => Ok(state.ids.values().map(|&chunk| NodeKind::Element(chunk)).collect()),
            _ => absent(),
        }
    }

    pub fn len(&self) -> AccessResult<usize> {
        self.node_list()?.len()
    }
}

impl fmt::Debug for NamedNodeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedNodeList")
            .field("grove", &self.grove.id())
            .field("kind", &self.kind)
            .finish()
    }
}

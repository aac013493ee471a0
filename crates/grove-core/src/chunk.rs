//! Grove Chunks
//!
//! A chunk is the unit of storage: one element, one run of data characters,
//! one processing instruction, one entity reference. Chunks live in a single
//! append-only arena in document order, so a chunk's children start right
//! after it and its next sibling (when not an element) is simply the next
//! chunk with the same origin.

use std::sync::Arc;

use grove_decl::{AttributeList, ElementType, Entity, Origin};

use crate::node::NodeKind;

/// Index of a chunk in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub(crate) struct ChunkId(u32);

impl ChunkId {
    /// The document chunk, always first
    pub const ROOT: Self = ChunkId(0);

    #[inline]
    pub fn from_index(index: usize) -> Self {
        ChunkId(index as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The document chunk
#[derive(Debug, Default)]
pub(crate) struct DocumentChunk {
    /// First root-level chunk before the document element
    pub prolog_start: Option<ChunkId>,
    pub document_element: Option<ChunkId>,
    /// First root-level chunk after the document element closed
    pub epilog_start: Option<ChunkId>,
}

#[derive(Debug)]
pub(crate) struct ElementChunk {
    pub element_type: Arc<ElementType>,
    /// Position among all elements in document order
    pub index: u32,
    pub attributes: Option<Arc<AttributeList>>,
    pub id: Option<Box<str>>,
    pub included: bool,
    /// Set when the next sibling is appended
    pub next_sibling: Option<ChunkId>,
}

#[derive(Debug)]
pub(crate) enum ChunkKind {
    Document(DocumentChunk),
    Element(ElementChunk),
    /// A maximal run of data characters
    Data(Box<[char]>),
    Pi(Box<str>),
    SdataRef(Arc<Entity>),
    ExternalDataRef(Arc<Entity>),
    SubdocRef(Arc<Entity>),
    NonSgml(u32),
    /// Marks the origin of the chunks that follow; never a node
    LocOrigin(Option<Arc<Origin>>),
}

#[derive(Debug)]
pub(crate) struct Chunk {
    /// Parent chunk; `None` only for the document chunk
    pub origin: Option<ChunkId>,
    /// Offset within the current location origin
    pub location: u32,
    pub kind: ChunkKind,
}

impl Chunk {
    /// Number of sibling nodes this chunk contributes
    pub fn node_count(&self) -> usize {
        match &self.kind {
            ChunkKind::Data(chars) => chars.len(),
            ChunkKind::LocOrigin(_) => 0,
            _ => 1,
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(self.kind, ChunkKind::LocOrigin(_))
    }

    /// Node for the sibling at `offset` within this chunk
    pub fn node_at(&self, id: ChunkId, offset: usize) -> NodeKind {
        match &self.kind {
            ChunkKind::Document(_) => NodeKind::Document,
            ChunkKind::Element(_) => NodeKind::Element(id),
            ChunkKind::Data(_) => NodeKind::DataChar {
                chunk: id,
                index: offset as u32,
            },
            ChunkKind::Pi(_) => NodeKind::Pi(id),
            ChunkKind::SdataRef(_) => NodeKind::SdataRef(id),
            ChunkKind::ExternalDataRef(_) => NodeKind::ExternalDataRef(id),
            ChunkKind::SubdocRef(_) => NodeKind::SubdocRef(id),
            ChunkKind::NonSgml(_) => NodeKind::NonSgml(id),
            // Markers are skipped by every traversal
            ChunkKind::LocOrigin(_) => NodeKind::Document,
        }
    }

    /// First node of this chunk
    #[inline]
    pub fn first_node(&self, id: ChunkId) -> NodeKind {
        self.node_at(id, 0)
    }

    pub fn as_element(&self) -> Option<&ElementChunk> {
        match &self.kind {
            ChunkKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Entity of an entity reference chunk
    pub fn entity(&self) -> Option<&Arc<Entity>> {
        match &self.kind {
            ChunkKind::SdataRef(entity)
            | ChunkKind::ExternalDataRef(entity)
            | ChunkKind::SubdocRef(entity) => Some(entity),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_count() {
        let data = Chunk {
            origin: Some(ChunkId::ROOT),
            location: 0,
            kind: ChunkKind::Data("abc".chars().collect()),
        };
        let marker = Chunk {
            origin: Some(ChunkId::ROOT),
            location: 0,
            kind: ChunkKind::LocOrigin(None),
        };
        assert_eq!(data.node_count(), 3);
        assert_eq!(marker.node_count(), 0);
        assert!(marker.is_marker());
        assert_eq!(
            data.node_at(ChunkId::from_index(4), 2),
            NodeKind::DataChar {
                chunk: ChunkId::from_index(4),
                index: 2
            }
        );
    }
}

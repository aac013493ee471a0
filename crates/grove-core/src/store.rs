//! Chunk Arena
//!
//! Append-only storage for the grove's chunks plus the producer's open
//! element stack. Chunks are never moved or removed; the only in-place
//! write after append is linking a closed element to its next sibling.

use std::sync::Arc;

use grove_decl::Origin;

use crate::chunk::{Chunk, ChunkId, ChunkKind, DocumentChunk, ElementChunk};

#[derive(Debug)]
pub(crate) struct ChunkStore {
    chunks: Vec<Chunk>,
    /// Location origin markers, ascending
    markers: Vec<ChunkId>,
    /// Open elements; the innermost is where new chunks attach
    open: Vec<ChunkId>,
    /// Closed element waiting for its next sibling
    pending_sibling: Option<ChunkId>,
    element_count: u32,
}

impl ChunkStore {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut chunks = Vec::with_capacity(capacity.max(1));
        chunks.push(Chunk {
            origin: None,
            location: 0,
            kind: ChunkKind::Document(DocumentChunk::default()),
        });
        Self {
            chunks,
            markers: Vec::new(),
            open: Vec::new(),
            pending_sibling: None,
            element_count: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn get(&self, id: ChunkId) -> &Chunk {
        &self.chunks[id.index()]
    }

    pub fn element(&self, id: ChunkId) -> Option<&ElementChunk> {
        self.chunks.get(id.index()).and_then(Chunk::as_element)
    }

    pub fn document(&self) -> &DocumentChunk {
        match &self.chunks[0].kind {
            ChunkKind::Document(document) => document,
            _ => unreachable!("chunk 0 is always the document"),
        }
    }

    fn document_mut(&mut self) -> &mut DocumentChunk {
        match &mut self.chunks[0].kind {
            ChunkKind::Document(document) => document,
            _ => unreachable!("chunk 0 is always the document"),
        }
    }

    /// Next non-marker chunk after `id`, if appended yet
    pub fn after(&self, id: ChunkId) -> Option<ChunkId> {
        (id.index() + 1..self.chunks.len())
            .find(|&i| !self.chunks[i].is_marker())
            .map(ChunkId::from_index)
    }

    /// Chunk new content attaches to
    #[inline]
    pub fn cursor(&self) -> ChunkId {
        self.open.last().copied().unwrap_or(ChunkId::ROOT)
    }

    /// Whether chunks may still be appended under `id`
    ///
    /// The document chunk stays open until the grove completes, which the
    /// caller checks separately.
    pub fn is_open(&self, id: ChunkId) -> bool {
        id == ChunkId::ROOT || self.open.contains(&id)
    }

    pub fn pending_sibling(&self) -> Option<ChunkId> {
        self.pending_sibling
    }

    pub fn element_count(&self) -> u32 {
        self.element_count
    }

    pub fn open_depth(&self) -> usize {
        self.open.len()
    }

    /// Append a content chunk under the cursor
    pub fn append(&mut self, kind: ChunkKind, location: u32) -> ChunkId {
        let id = ChunkId::from_index(self.chunks.len());
        let cursor = self.cursor();

        if let Some(previous) = self.pending_sibling.take() {
            if let ChunkKind::Element(element) = &mut self.chunks[previous.index()].kind {
                element.next_sibling = Some(id);
            }
        }

        if cursor == ChunkId::ROOT {
            let is_element = matches!(kind, ChunkKind::Element(_));
            let document = self.document_mut();
            match document.document_element {
                None if is_element => document.document_element = Some(id),
                None => {
                    document.prolog_start.get_or_insert(id);
                }
                Some(_) => {
                    document.epilog_start.get_or_insert(id);
                }
            }
        }

        self.chunks.push(Chunk {
            origin: Some(cursor),
            location,
            kind,
        });
        id
    }

    /// Append an element and make it the cursor
    pub fn push_element(&mut self, element: ElementChunk, location: u32) -> ChunkId {
        self.element_count += 1;
        let id = self.append(ChunkKind::Element(element), location);
        self.open.push(id);
        id
    }

    /// Close the innermost element
    pub fn pop_element(&mut self) -> Option<ChunkId> {
        let id = self.open.pop()?;
        self.pending_sibling = Some(id);
        Some(id)
    }

    /// Record that following chunks come from `origin`
    pub fn append_marker(&mut self, origin: Option<Arc<Origin>>, location: u32) {
        let id = ChunkId::from_index(self.chunks.len());
        self.chunks.push(Chunk {
            origin: Some(self.cursor()),
            location,
            kind: ChunkKind::LocOrigin(origin),
        });
        self.markers.push(id);
    }

    /// Location origin in effect for `id`
    pub fn origin_of(&self, id: ChunkId) -> Option<&Arc<Origin>> {
        let before = self.markers.partition_point(|marker| *marker < id);
        let marker = *self.markers.get(before.checked_sub(1)?)?;
        match &self.get(marker).kind {
            ChunkKind::LocOrigin(origin) => origin.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_decl::{ContentType, ElementType};

    fn element(name: &str) -> ElementChunk {
        ElementChunk {
            element_type: Arc::new(ElementType::new(name, ContentType::Mixed)),
            index: 0,
            attributes: None,
            id: None,
            included: false,
            next_sibling: None,
        }
    }

    #[test]
    fn test_document_regions() {
        let mut store = ChunkStore::with_capacity(8);
        let pi = store.append(ChunkKind::Pi("prolog".into()), 0);
        let doc = store.push_element(element("DOC"), 1);
        let data = store.append(ChunkKind::Data("ab".chars().collect()), 2);
        store.pop_element();
        let trailing = store.append(ChunkKind::Pi("epilog".into()), 3);

        let document = store.document();
        assert_eq!(document.prolog_start, Some(pi));
        assert_eq!(document.document_element, Some(doc));
        assert_eq!(document.epilog_start, Some(trailing));
        assert_eq!(store.get(data).origin, Some(doc));
        assert_eq!(store.element(doc).and_then(|e| e.next_sibling), Some(trailing));
    }

    #[test]
    fn test_markers_are_skipped_and_located() {
        let mut store = ChunkStore::with_capacity(8);
        let origin = Origin::document("doc.sgm");
        store.append_marker(Some(Arc::clone(&origin)), 0);
        let doc = store.push_element(element("DOC"), 5);
        store.append_marker(None, 9);
        let data = store.append(ChunkKind::Data("x".chars().collect()), 9);

        assert_eq!(store.after(doc), Some(data));
        assert!(store.origin_of(doc).is_some_and(|o| Arc::ptr_eq(o, &origin)));
        assert!(store.origin_of(data).is_none());
        assert!(store.origin_of(ChunkId::ROOT).is_none());
    }

    #[test]
    fn test_open_stack() {
        let mut store = ChunkStore::with_capacity(4);
        let outer = store.push_element(element("A"), 0);
        let inner = store.push_element(element("B"), 1);
        assert_eq!(store.cursor(), inner);
        assert!(store.is_open(outer));
        assert_eq!(store.pop_element(), Some(inner));
        assert_eq!(store.pending_sibling(), Some(inner));
        assert!(!store.is_open(inner));
        assert_eq!(store.pop_element(), Some(outer));
        assert_eq!(store.pop_element(), None);
        assert_eq!(store.cursor(), ChunkId::ROOT);
    }
}

//! Grove Builder
//!
//! The producer side. A parser drives one `GroveBuilder` with events in
//! document order, from one thread. Each event takes the write lock once,
//! appends, and possibly wakes readers; readers can navigate everything
//! appended so far while the build continues.

use std::sync::Arc;

use grove_decl::{AttributeList, Dtd, ElementType, Entity, Location, Origin, Syntax};
use indexmap::map::Entry;

use crate::chunk::{ChunkKind, ElementChunk};
use crate::config::GroveConfig;
use crate::error::{BuildError, BuildResult};
use crate::grove::{Grove, GroveImpl, GroveState};
use crate::message::Message;
use crate::node::NodePtr;
use crate::signal::PulseThrottle;

/// Start-tag of an element
#[derive(Debug, Clone)]
pub struct ElementStart {
    pub element_type: Arc<ElementType>,
    pub attributes: Option<AttributeList>,
    pub included: bool,
    pub location: Location,
}

impl ElementStart {
    pub fn new(element_type: Arc<ElementType>, location: Location) -> Self {
        Self {
            element_type,
            attributes: None,
            included: false,
            location,
        }
    }

    pub fn with_attributes(mut self, attributes: AttributeList) -> Self {
        self.attributes = Some(attributes);
        self
    }

    pub fn included(mut self) -> Self {
        self.included = true;
        self
    }
}

/// What the parser knows when the prolog ends
#[derive(Debug, Clone, Default)]
pub struct EndProlog {
    pub dtd: Option<Arc<Dtd>>,
    /// Name of the link process declaration, when one is active
    pub link_process: Option<String>,
    pub simple_links: Vec<String>,
}

impl EndProlog {
    pub fn new(dtd: Arc<Dtd>) -> Self {
        Self {
            dtd: Some(dtd),
            ..Self::default()
        }
    }
}

/// Parser event, mirroring the builder methods
#[derive(Debug, Clone)]
pub enum Event {
    StartElement(ElementStart),
    EndElement,
    Data { text: String, location: Location },
    Pi { text: String, location: Location },
    SdataEntity { entity: Arc<Entity>, location: Location },
    ExternalDataEntity { entity: Arc<Entity>, location: Location },
    SubdocEntity { entity: Arc<Entity>, location: Location },
    NonSgmlChar { code: u32, location: Location },
    EndProlog(EndProlog),
    UseLink(String),
    AppInfo(String),
    Syntax(Arc<Syntax>),
    EntityDefaulted(Arc<Entity>),
    Message(Message),
    EndDocument,
}

/// Data characters not yet stored
#[derive(Debug)]
struct PendingData {
    chars: Vec<char>,
    location: u32,
}

impl PendingData {
    /// Position just past the last buffered character
    fn end(&self) -> Option<u32> {
        u32::try_from(self.chars.len()).ok()?.checked_add(self.location)
    }
}

/// Producer handle of a grove under construction
///
/// Dropping the builder completes the grove, so readers never wait on a
/// producer that has gone away.
#[derive(Debug)]
pub struct GroveBuilder {
    grove: Arc<GroveImpl>,
    pending: Option<PendingData>,
    /// Origin of the last location marker appended
    origin: Option<Arc<Origin>>,
    /// No marker appended yet
    fresh: bool,
    throttle: PulseThrottle,
    complete: bool,
}

impl Default for GroveBuilder {
    fn default() -> Self {
        Self::new(GroveConfig::default())
    }
}

impl GroveBuilder {
    pub fn new(config: GroveConfig) -> Self {
        Self {
            throttle: PulseThrottle::new(config.pulse),
            grove: GroveImpl::new(config),
            pending: None,
            origin: None,
            fresh: true,
            complete: false,
        }
    }

    /// Handle on the grove being built
    pub fn grove(&self) -> Grove {
        Grove::from_impl(Arc::clone(&self.grove))
    }

    /// Document node of the grove being built
    pub fn root(&self) -> NodePtr {
        self.grove().root()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Feed one parser event
    pub fn handle(&mut self, event: Event) -> BuildResult {
        match event {
            Event::StartElement(start) => self.start_element(start),
            Event::EndElement => self.end_element(),
            Event::Data { text, location } => self.data(&text, &location),
            Event::Pi { text, location } => self.pi(&text, &location),
            Event::SdataEntity { entity, location } => self.sdata_entity(entity, &location),
            Event::ExternalDataEntity { entity, location } => self.external_data_entity(entity, &location),
            Event::SubdocEntity { entity, location } => self.subdoc_entity(entity, &location),
            Event::NonSgmlChar { code, location } => self.non_sgml_char(code, &location),
            Event::EndProlog(end) => self.end_prolog(end),
            Event::UseLink(name) => self.use_link(&name),
            Event::AppInfo(info) => self.app_info(&info),
            Event::Syntax(syntax) => self.set_syntax(syntax),
            Event::EntityDefaulted(entity) => self.entity_defaulted(entity),
            Event::Message(message) => self.message(message),
            Event::EndDocument => self.end_document(),
        }
    }

    fn check_open(&self) -> BuildResult {
        if self.complete {
            Err(BuildError::Complete)
        } else {
            Ok(())
        }
    }

    /// Store pending data characters as one chunk
    fn flush_data(&mut self, state: &mut GroveState) {
        if let Some(pending) = self.pending.take() {
            state
                .store
                .append(ChunkKind::Data(pending.chars.into_boxed_slice()), pending.location);
        }
    }

    /// Append a location marker if `location` comes from a new origin
    fn note_origin(&mut self, state: &mut GroveState, location: &Location) {
        let origin = location.origin();
        let same = match (&self.origin, origin) {
            (Some(current), Some(origin)) => Arc::ptr_eq(current, origin),
            (None, None) => !self.fresh,
            _ => false,
        };
        if !same {
            state.store.append_marker(origin.cloned(), location.index());
            self.origin = origin.cloned();
            self.fresh = false;
        }
    }

    /// Count an event and wake readers when the throttle says so
    fn after_event(&mut self) {
        if self.throttle.record() {
            self.grove.pulse();
        }
    }

    fn append_leaf(&mut self, kind: ChunkKind, location: &Location) -> BuildResult {
        self.check_open()?;
        let grove = Arc::clone(&self.grove);
        {
            let mut state = grove.write();
            self.flush_data(&mut state);
            self.note_origin(&mut state, location);
            state.store.append(kind, location.index());
        }
        self.after_event();
        Ok(())
    }

    pub fn start_element(&mut self, start: ElementStart) -> BuildResult {
        self.check_open()?;
        let ElementStart {
            element_type,
            attributes,
            included,
            location,
        } = start;
        let grove = Arc::clone(&self.grove);
        {
            let mut state = grove.write();
            // Keyed the same way IDREF tokens are folded before lookup
            let id: Option<Box<str>> = attributes
                .as_ref()
                .and_then(AttributeList::id)
                .map(|id| state.syntax.normalize_general(id).into_boxed_str());
            self.flush_data(&mut state);
            self.note_origin(&mut state, &location);

            let element = ElementChunk {
                element_type,
                index: state.store.element_count(),
                attributes: attributes.map(Arc::new),
                id: id.clone(),
                included,
                next_sibling: None,
            };
            let chunk = state.store.push_element(element, location.index());

            if let Some(id) = id {
                match state.ids.entry(id) {
                    Entry::Vacant(entry) => {
                        entry.insert(chunk);
                    }
                    Entry::Occupied(entry) => {
                        let message = Message::error(format!("duplicate ID \"{}\"", entry.key()))
                            .at(location.clone());
                        push_message(&mut state, message);
                    }
                }
            }
        }
        self.after_event();
        Ok(())
    }

    pub fn end_element(&mut self) -> BuildResult {
        self.check_open()?;
        let grove = Arc::clone(&self.grove);
        {
            let mut state = grove.write();
            self.flush_data(&mut state);
            state.store.pop_element().ok_or(BuildError::NoOpenElement)?;
        }
        self.after_event();
        Ok(())
    }

    /// Character data; calls from one origin at adjacent positions extend one run
    pub fn data(&mut self, text: &str, location: &Location) -> BuildResult {
        self.check_open()?;
        if text.is_empty() {
            return Ok(());
        }
        let same_origin = match (&self.origin, location.origin()) {
            (Some(current), Some(origin)) => Arc::ptr_eq(current, origin),
            (None, None) => !self.fresh,
            _ => false,
        };
        let adjacent = self
            .pending
            .as_ref()
            .is_none_or(|pending| pending.end() == Some(location.index()));
        if !same_origin || !adjacent {
            let grove = Arc::clone(&self.grove);
            let mut state = grove.write();
            self.flush_data(&mut state);
            self.note_origin(&mut state, location);
        }
        match &mut self.pending {
            Some(pending) => pending.chars.extend(text.chars()),
            None => {
                self.pending = Some(PendingData {
                    chars: text.chars().collect(),
                    location: location.index(),
                })
            }
        }
        self.after_event();
        Ok(())
    }

    pub fn pi(&mut self, text: &str, location: &Location) -> BuildResult {
        self.append_leaf(ChunkKind::Pi(text.into()), location)
    }

    pub fn sdata_entity(&mut self, entity: Arc<Entity>, location: &Location) -> BuildResult {
        self.append_leaf(ChunkKind::SdataRef(entity), location)
    }

    pub fn external_data_entity(&mut self, entity: Arc<Entity>, location: &Location) -> BuildResult {
        self.append_leaf(ChunkKind::ExternalDataRef(entity), location)
    }

    pub fn subdoc_entity(&mut self, entity: Arc<Entity>, location: &Location) -> BuildResult {
        self.append_leaf(ChunkKind::SubdocRef(entity), location)
    }

    pub fn non_sgml_char(&mut self, code: u32, location: &Location) -> BuildResult {
        self.append_leaf(ChunkKind::NonSgml(code), location)
    }

    /// Install the governing DTD and link process information
    pub fn end_prolog(&mut self, end: EndProlog) -> BuildResult {
        self.check_open()?;
        {
            let mut state = self.grove.write();
            if let Some(dtd) = &end.dtd {
                tracing::debug!(
                    grove = self.grove.id(),
                    doctype = dtd.name(),
                    element_types = dtd.element_type_count(),
                    "end of prolog"
                );
            }
            state.governing = end.dtd;
            state.link.process_name = end.link_process.map(Into::into);
            state.link.simple_links = end.simple_links.into_iter().map(Into::into).collect();
            state.prolog_ended = true;
        }
        self.after_event();
        Ok(())
    }

    pub fn use_link(&mut self, link_type: &str) -> BuildResult {
        self.check_open()?;
        self.grove.write().link.active.push(link_type.into());
        Ok(())
    }

    pub fn app_info(&mut self, info: &str) -> BuildResult {
        self.check_open()?;
        self.grove.write().app_info = Some(info.into());
        Ok(())
    }

    /// Instance syntax used to normalize names in lookups
    pub fn set_syntax(&mut self, syntax: Arc<Syntax>) -> BuildResult {
        self.check_open()?;
        self.grove.write().syntax = syntax;
        Ok(())
    }

    /// Record an entity created for a reference to an undeclared name
    pub fn entity_defaulted(&mut self, entity: Arc<Entity>) -> BuildResult {
        self.check_open()?;
        {
            let mut state = self.grove.write();
            let name: Box<str> = entity.name().into();
            state.defaulted.entry(name).or_insert(entity);
        }
        self.after_event();
        Ok(())
    }

    pub fn message(&mut self, message: Message) -> BuildResult {
        self.check_open()?;
        push_message(&mut self.grove.write(), message);
        self.after_event();
        Ok(())
    }

    /// Mark the grove complete and wake every reader
    pub fn end_document(&mut self) -> BuildResult {
        self.check_open()?;
        self.finish();
        Ok(())
    }

    fn finish(&mut self) {
        let grove = Arc::clone(&self.grove);
        {
            let mut state = grove.write();
            self.flush_data(&mut state);
            state.complete = true;
            tracing::debug!(
                grove = grove.id(),
                chunks = state.store.len(),
                elements = state.store.element_count(),
                unclosed = state.store.open_depth(),
                messages = state.messages.len(),
                "grove complete"
            );
        }
        self.complete = true;
        grove.pulse();
    }
}

impl Drop for GroveBuilder {
    fn drop(&mut self) {
        if !self.complete {
            self.finish();
        }
    }
}

fn push_message(state: &mut GroveState, message: Message) {
    message.trace();
    state.messages.push(message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_decl::{ContentType, Origin};

    fn doc_type() -> Arc<ElementType> {
        Arc::new(ElementType::new("DOC", ContentType::Mixed))
    }

    #[test]
    fn test_data_events_share_one_run() {
        let origin = Origin::document("doc.sgm");
        let mut builder = GroveBuilder::default();
        builder
            .start_element(ElementStart::new(doc_type(), Location::new(Arc::clone(&origin), 0)))
            .unwrap();
        builder.data("ab", &Location::new(Arc::clone(&origin), 5)).unwrap();
        builder.data("", &Location::new(Arc::clone(&origin), 7)).unwrap();
        builder.data("cd", &Location::new(Arc::clone(&origin), 7)).unwrap();
        builder.end_element().unwrap();
        builder.end_document().unwrap();

        let state = builder.grove.read();
        let runs: Vec<usize> = (0..state.store.len())
            .map(crate::chunk::ChunkId::from_index)
            .filter_map(|id| match &state.store.get(id).kind {
                ChunkKind::Data(chars) => Some(chars.len()),
                _ => None,
            })
            .collect();
        assert_eq!(runs, [4]);
    }

    #[test]
    fn test_position_gap_splits_run() {
        let origin = Origin::document("doc.sgm");
        let mut builder = GroveBuilder::default();
        builder
            .start_element(ElementStart::new(doc_type(), Location::new(Arc::clone(&origin), 0)))
            .unwrap();
        builder.data("ab", &Location::new(Arc::clone(&origin), 5)).unwrap();
        builder.data("cd", &Location::new(Arc::clone(&origin), 100)).unwrap();
        builder.end_element().unwrap();

        let state = builder.grove.read();
        let runs: Vec<u32> = (0..state.store.len())
            .map(crate::chunk::ChunkId::from_index)
            .filter(|&id| matches!(state.store.get(id).kind, ChunkKind::Data(_)))
            .map(|id| state.store.get(id).location)
            .collect();
        assert_eq!(runs, [5, 100]);
    }

    #[test]
    fn test_new_origin_splits_run() {
        let main = Origin::document("doc.sgm");
        let included = Origin::entity("chap", None);
        let mut builder = GroveBuilder::default();
        builder
            .start_element(ElementStart::new(doc_type(), Location::new(Arc::clone(&main), 0)))
            .unwrap();
        builder.data("ab", &Location::new(Arc::clone(&main), 5)).unwrap();
        builder.data("cd", &Location::new(included, 0)).unwrap();
        builder.end_element().unwrap();

        let state = builder.grove.read();
        let data_chunks = (0..state.store.len())
            .map(crate::chunk::ChunkId::from_index)
            .filter(|&id| matches!(state.store.get(id).kind, ChunkKind::Data(_)))
            .count();
        assert_eq!(data_chunks, 2);
    }

    #[test]
    fn test_events_after_completion_are_rejected() {
        let mut builder = GroveBuilder::default();
        builder.end_document().unwrap();
        assert_eq!(builder.end_document(), Err(BuildError::Complete));
        assert_eq!(builder.pi("x", &Location::unknown(0)), Err(BuildError::Complete));
        assert!(builder.grove().is_complete());
    }

    #[test]
    fn test_unbalanced_end_element() {
        let mut builder = GroveBuilder::default();
        assert_eq!(builder.end_element(), Err(BuildError::NoOpenElement));
    }

    #[test]
    fn test_drop_completes() {
        let builder = GroveBuilder::default();
        let grove = builder.grove();
        assert!(!grove.is_complete());
        drop(builder);
        assert!(grove.is_complete());
    }
}

//! Shared Grove State
//!
//! One producer appends under the write lock; any number of readers probe
//! under the read lock. A probe that cannot answer yet reports
//! `MoreMayArrive`, and the reader then sleeps on the build signal with no
//! lock held before probing again.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use grove_decl::{Dtd, Entity, Syntax};
use indexmap::IndexMap;

use crate::access::{AccessError, AccessResult, Probe, Stall, absent, more_may_arrive};
use crate::chunk::ChunkId;
use crate::config::GroveConfig;
use crate::message::Message;
use crate::node::{NodeKind, NodePtr};
use crate::signal::{Generation, Signal, next_grove_id};
use crate::store::ChunkStore;

/// Link process information from the end of the prolog
#[derive(Debug, Default)]
pub(crate) struct LinkInfo {
    pub process_name: Option<Box<str>>,
    pub simple_links: Vec<Box<str>>,
    pub active: Vec<Box<str>>,
}

/// Everything readers can see, guarded by one lock
#[derive(Debug)]
pub(crate) struct GroveState {
    pub store: ChunkStore,
    /// ID value to element, in document order
    pub ids: IndexMap<Box<str>, ChunkId>,
    /// Entities created for references to undeclared names
    pub defaulted: IndexMap<Box<str>, Arc<Entity>>,
    pub messages: Vec<Message>,
    pub governing: Option<Arc<Dtd>>,
    pub syntax: Arc<Syntax>,
    pub app_info: Option<Box<str>>,
    pub link: LinkInfo,
    pub prolog_ended: bool,
    pub complete: bool,
}

impl GroveState {
    fn new(config: &GroveConfig) -> Self {
        Self {
            store: ChunkStore::with_capacity(config.chunk_capacity),
            ids: IndexMap::new(),
            defaulted: IndexMap::new(),
            messages: Vec::new(),
            governing: None,
            syntax: Arc::new(Syntax::reference()),
            app_info: None,
            link: LinkInfo::default(),
            prolog_ended: false,
            complete: false,
        }
    }

    /// Whether children may still be appended to `id`
    pub fn maybe_more_children(&self, id: ChunkId) -> bool {
        !self.complete && self.store.is_open(id)
    }

    /// Whether a next sibling may still be appended after element `id`
    pub fn maybe_more_siblings(&self, id: ChunkId) -> bool {
        !self.complete && (self.store.is_open(id) || self.store.pending_sibling() == Some(id))
    }

    /// Governing DTD, once the prolog has ended
    pub fn dtd(&self) -> Probe<&Arc<Dtd>> {
        match &self.governing {
            Some(dtd) => Ok(dtd),
            None if self.complete || self.prolog_ended => absent(),
            None => more_may_arrive(),
        }
    }

    /// Absent once complete, otherwise may still arrive
    pub fn absent_unless_building<T>(&self) -> Probe<T> {
        if self.complete { absent() } else { more_may_arrive() }
    }

    /// Element registered under an ID value
    pub fn element_by_id(&self, id: &str) -> Probe<ChunkId> {
        match self.ids.get(id) {
            Some(&chunk) => Ok(chunk),
            None => self.absent_unless_building(),
        }
    }
}

/// Grove shared by its producer and every node handle
#[derive(Debug)]
pub(crate) struct GroveImpl {
    id: u64,
    config: GroveConfig,
    state: RwLock<GroveState>,
    signal: Signal,
}

impl GroveImpl {
    pub fn new(config: GroveConfig) -> Arc<Self> {
        let grove = Arc::new(Self {
            id: next_grove_id(),
            state: RwLock::new(GroveState::new(&config)),
            config,
            signal: Signal::new(),
        });
        tracing::debug!(grove = grove.id, "grove created");
        grove
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn config(&self) -> &GroveConfig {
        &self.config
    }

    pub fn read(&self) -> RwLockReadGuard<'_, GroveState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, GroveState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_complete(&self) -> bool {
        self.read().complete
    }

    pub fn generation(&self) -> Generation {
        self.signal.current()
    }

    pub fn pulse(&self) {
        self.signal.pulse();
    }

    /// Wait until more of the grove may have been built
    ///
    /// Returns `true` immediately once the grove is complete.
    pub fn wait_for_more_nodes(&self, since: Generation) -> bool {
        if self.is_complete() {
            return true;
        }
        tracing::trace!(grove = self.id, since = since.value(), "waiting for more nodes");
        self.signal.wait_since(since, self.config.wait)
    }

    /// Probe until the answer is known or waiting stops making progress
    pub fn probe<T>(&self, mut step: impl FnMut(&GroveState) -> Probe<T>) -> AccessResult<T> {
        loop {
            let since = self.generation();
            let (outcome, complete) = {
                let state = self.read();
                (step(&*state), state.complete)
            };
            match outcome {
                Ok(value) => return Ok(value),
                Err(Stall::Failed(err)) => return Err(err),
                Err(Stall::MoreMayArrive) if complete => return Err(AccessError::Absent),
                Err(Stall::MoreMayArrive) => {
                    if !self.wait_for_more_nodes(since) {
                        return Err(self.config.wait.unavailable());
                    }
                }
            }
        }
    }

    /// Read the state once; the closure must not need to wait
    pub fn with_state<T>(&self, f: impl FnOnce(&GroveState) -> AccessResult<T>) -> AccessResult<T> {
        f(&*self.read())
    }
}

/// Handle on a grove
///
/// Cheap to clone. The grove lives as long as any handle, node or builder
/// refers to it.
#[derive(Debug, Clone)]
pub struct Grove {
    pub(crate) inner: Arc<GroveImpl>,
}

impl Grove {
    pub(crate) fn from_impl(inner: Arc<GroveImpl>) -> Self {
        Self { inner }
    }

    /// Document node
    pub fn root(&self) -> NodePtr {
        NodePtr::new(Arc::clone(&self.inner), NodeKind::Document)
    }

    /// Process-unique grove identifier
    pub fn id(&self) -> u64 {
        self.inner.id()
    }

    pub fn config(&self) -> &GroveConfig {
        self.inner.config()
    }

    pub fn is_complete(&self) -> bool {
        self.inner.is_complete()
    }

    /// Current build generation, for use with [`Grove::wait_for_more_nodes`]
    pub fn generation(&self) -> Generation {
        self.inner.generation()
    }

    /// Wait (per the grove's wait policy) until the producer pulses past
    /// `since` or the grove completes
    pub fn wait_for_more_nodes(&self, since: Generation) -> bool {
        self.inner.wait_for_more_nodes(since)
    }

    /// Chunks stored so far, including the document chunk and origin markers
    pub fn chunk_count(&self) -> usize {
        self.inner.read().store.len()
    }

    pub fn element_count(&self) -> usize {
        self.inner.read().store.element_count() as usize
    }

    pub fn message_count(&self) -> usize {
        self.inner.read().messages.len()
    }

    /// Messages reported so far
    pub fn messages(&self) -> Vec<Message> {
        self.inner.read().messages.clone()
    }
}

impl PartialEq for Grove {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id() == other.inner.id()
    }
}

impl Eq for Grove {}


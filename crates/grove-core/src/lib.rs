//! Grove Core - SGML document grove
//!
//! Builds a navigable tree ("grove") from a stream of markup parser events
//! and lets readers walk it while it is still being built.
//!
//! - Storage is an append-only arena of chunks in document order
//! - Nodes are small handles (`NodePtr`) naming a position in a chunk
//! - Every accessor answers with a value, `Absent`, `WrongClass` or `Blocked`
//! - Readers block (or poll) until the producer appends what they asked for
//!
//! ```
//! use std::sync::Arc;
//! use grove_core::{ElementStart, GroveBuilder};
//! use grove_core::grove_decl::{ContentType, ElementType, Location};
//!
//! let mut builder = GroveBuilder::default();
//! let doc = Arc::new(ElementType::new("DOC", ContentType::Mixed));
//! builder.start_element(ElementStart::new(doc, Location::unknown(0))).unwrap();
//! builder.data("ab", &Location::unknown(5)).unwrap();
//! builder.end_element().unwrap();
//! builder.end_document().unwrap();
//!
//! let root = builder.root();
//! let element = root.document_element().unwrap();
//! assert_eq!(element.gi().unwrap(), "DOC");
//! assert_eq!(element.first_child().unwrap().char().unwrap(), 'a');
//! ```

mod access;
mod attribute;
mod builder;
mod chunk;
mod config;
mod error;
mod grove;
mod list;
mod message;
mod nav;
mod node;
mod props;
mod signal;
mod store;

pub use access::{AccessError, AccessResult, AccessResultExt};
pub use builder::{ElementStart, EndProlog, Event, GroveBuilder};
pub use config::{GroveConfig, PulsePolicy, WaitPolicy};
pub use error::{BuildError, BuildResult};
pub use grove::Grove;
pub use list::{NamedListType, NamedNodeList, NodeList, NodeListIter};
pub use message::{Message, Severity};
pub use node::{NodeClass, NodePtr};
pub use signal::{Generation, PulseThrottle};

pub use grove_decl;

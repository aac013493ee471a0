//! Source Locations
//!
//! A location is an opaque origin (the entity or file an event came from)
//! plus an offset within it. Origins are shared, so many locations can
//! point at one origin without copying it.

use std::fmt;
use std::sync::Arc;

/// Where a run of input came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    /// Entity the input was read from, if any
    entity_name: Option<Box<str>>,
    /// System identifier of the storage object
    system_id: Option<Box<str>>,
}

impl Origin {
    /// Origin for the document entity stored at `system_id`
    pub fn document(system_id: &str) -> Arc<Self> {
        Arc::new(Self {
            entity_name: None,
            system_id: Some(system_id.into()),
        })
    }

    /// Origin for text read from a named entity
    pub fn entity(name: &str, system_id: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            entity_name: Some(name.into()),
            system_id: system_id.map(Into::into),
        })
    }

    pub fn entity_name(&self) -> Option<&str> {
        self.entity_name.as_deref()
    }

    pub fn system_id(&self) -> Option<&str> {
        self.system_id.as_deref()
    }
}

/// Origin handle plus offset
#[derive(Debug, Clone, Default)]
pub struct Location {
    origin: Option<Arc<Origin>>,
    index: u32,
}

impl Location {
    pub fn new(origin: Arc<Origin>, index: u32) -> Self {
        Self {
            origin: Some(origin),
            index,
        }
    }

    /// Location with no known origin
    pub fn unknown(index: u32) -> Self {
        Self {
            origin: None,
            index,
        }
    }

    pub fn origin(&self) -> Option<&Arc<Origin>> {
        self.origin.as_ref()
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// True when both locations share the same origin object
    pub fn same_origin(&self, other: &Location) -> bool {
        same_origin(self.origin.as_ref(), other.origin.as_ref())
    }
}

/// Origin identity comparison (pointer equality, not structural)
pub(crate) fn same_origin(a: Option<&Arc<Origin>>, b: Option<&Arc<Origin>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.same_origin(other)
    }
}

impl Eq for Location {}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.origin.as_deref() {
            Some(origin) => {
                let name = origin
                    .entity_name()
                    .or_else(|| origin.system_id())
                    .unwrap_or("<anonymous>");
                write!(f, "{}:{}", name, self.index)
            }
            None => write!(f, "<unknown>:{}", self.index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_origin_is_identity() {
        let a = Origin::document("doc.sgm");
        let b = Origin::document("doc.sgm");
        let la = Location::new(a.clone(), 3);

        assert_eq!(la, Location::new(a, 3));
        assert_ne!(la, Location::new(b, 3));
    }

    #[test]
    fn test_display() {
        let loc = Location::new(Origin::entity("chap1", None), 42);
        assert_eq!(loc.to_string(), "chap1:42");
        assert_eq!(Location::unknown(7).to_string(), "<unknown>:7");
    }
}

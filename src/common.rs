//! Common definitions that are shared between different parts of the backend.

// Use sorted sets and maps for consistent, reproducible output.
pub use std::collections::{BTreeMap as Map, BTreeSet as Set};

use serde::{Deserialize, Serialize};

/// An interned identifier. Cheap to copy, compared by value.
pub type Id = internment::Intern<String>;

/// A global symbol name: the source it's declared in, paired with its own
/// identifier within that source. Unique across a [`crate::semantic::Target`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Name {
    pub source: Id,
    pub identifier: Id,
}

impl Name {
    pub fn new(source: impl AsRef<str>, identifier: impl AsRef<str>) -> Self {
        Name {
            source: Id::new(source.as_ref().to_owned()),
            identifier: Id::new(identifier.as_ref().to_owned()),
        }
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}${}", self.source, self.identifier)
    }
}

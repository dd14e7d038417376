use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

/// An interned identifier.
///
/// Names handed out by the same [`NameTable`] for equal text share one
/// allocation, so [`Name::ptr_eq`] identifies the interned instance.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(Arc<str>);

impl Name {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if both names are the same interned instance.
    pub fn ptr_eq(&self, other: &Name) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Append-only interning table shared by every body decompiled in a session.
#[derive(Default)]
pub struct NameTable {
    names: DashMap<Box<str>, Name>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the unique [`Name`] for `value`, interning it on first use.
    pub fn get_name_for(&self, value: &str) -> Name {
        if let Some(name) = self.names.get(value) {
            return name.value().clone();
        }
        self.names
            .entry(value.into())
            .or_insert_with(|| Name(Arc::from(value)))
            .value()
            .clone()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl fmt::Debug for NameTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameTable")
            .field("len", &self.names.len())
            .finish()
    }
}

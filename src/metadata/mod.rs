//! Metadata containers
//!
//! A metadata container is a finite, key-unique association from [`Key`]s to
//! [`Value`]s, stamped with a [`Version`]. Key order is insertion order and is
//! preserved through the wire format.
//!
//! ## Contract
//!
//! Every implementation of [`Metadata`] upholds:
//! - `get(k)` fails with [`MetadataError::KeyNotFound`] exactly when
//!   `has_key(k)` is false.
//! - `has_key(k)` is false for keys absent from `keys()`, except for private
//!   keys an implementation chooses to answer through `lookup` without listing
//!   them.
//! - `copy()` of a container is observationally identical to it at the time
//!   of the call. An immutable container may hand back itself.
//!
//! Null is an ordinary value: it is stored as [`Value::Null`] and typed reads
//! return `Ok(None)` for it, while a missing key is an error.
//!
//! Equality and hashing look at the key/value mapping only. Two containers
//! with equal content and different versions are equal.

mod fixed;
mod settable;

pub use fixed::FixedMetadata;
pub use settable::SettableMetadata;

use std::fmt;

use crate::error::{MetadataError, Result};
use crate::key::Key;
use crate::value::{unordered_hash, MetadataValue, Value};
use crate::version::Version;

/// Read access to a versioned metadata container
pub trait Metadata: fmt::Debug {
    fn version(&self) -> Version;

    /// Listed keys in insertion order
    fn keys(&self) -> &[Key<Value>];

    /// Raw lookup by key id; `None` when the key is absent
    fn lookup(&self, id: &str) -> Option<&Value>;

    /// The frozen container behind this reference, if it is one
    fn as_fixed(&self) -> Option<&FixedMetadata> {
        None
    }
}

/// Typed accessors available on every [`Metadata`]
pub trait MetadataExt: Metadata {
    fn has_key<T>(&self, key: &Key<T>) -> bool {
        self.lookup(key.id()).is_some()
    }

    /// The stored value, with null as [`Value::Null`]
    fn get_value<T>(&self, key: &Key<T>) -> Result<&Value> {
        self.lookup(key.id())
            .ok_or_else(|| MetadataError::KeyNotFound(key.id().to_string()))
    }

    /// The stored value converted to `T`; `Ok(None)` for a stored null
    fn get<T: MetadataValue>(&self, key: &Key<T>) -> Result<Option<T>> {
        let value = self.get_value(key)?;
        if value.is_null() {
            return Ok(None);
        }
        T::from_value(value)
            .map(Some)
            .ok_or_else(|| MetadataError::TypeMismatch {
                key: key.id().to_string(),
                expected: T::TYPE_NAME,
                found: value.type_name(),
            })
    }

    /// Listed entries in key order
    fn entries(&self) -> Vec<(&Key<Value>, &Value)> {
        self.keys()
            .iter()
            .filter_map(|key| self.lookup(key.id()).map(|value| (key, value)))
            .collect()
    }

    fn len(&self) -> usize {
        self.keys().len()
    }

    fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }
}

impl<M: Metadata + ?Sized> MetadataExt for M {}

/// Mapping equality shared by the container implementations
pub(crate) fn content_eq(a: &dyn Metadata, b: &dyn Metadata) -> bool {
    a.keys().len() == b.keys().len()
        && a
            .keys()
            .iter()
            .all(|key| a.lookup(key.id()).is_some() && a.lookup(key.id()) == b.lookup(key.id()))
}

pub(crate) fn content_hash(metadata: &dyn Metadata) -> u64 {
    unordered_hash(metadata.entries().into_iter())
}

pub(crate) struct DebugEntries<'a>(pub &'a dyn Metadata);

impl fmt::Debug for DebugEntries<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.0.entries().into_iter().map(|(k, v)| (k.id(), v)))
            .finish()
    }
}

impl PartialEq<SettableMetadata> for FixedMetadata {
    fn eq(&self, other: &SettableMetadata) -> bool {
        content_eq(self, other)
    }
}

impl PartialEq<FixedMetadata> for SettableMetadata {
    fn eq(&self, other: &FixedMetadata) -> bool {
        content_eq(self, other)
    }
}

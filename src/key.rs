//! Typed metadata keys
//!
//! A [`Key<T>`] is a validated string id carrying the type of the value it
//! addresses as a compile-time marker only. Two keys with the same id are the
//! same key whatever their `T`; equality, ordering and hashing never look at
//! the marker.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{MetadataError, Result};
use crate::value::Value;

/// Opaque, string-identified lookup token for values of type `T`
pub struct Key<T> {
    id: Arc<str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    /// Create a key, rejecting empty ids and ids with surrounding whitespace
    pub fn of(id: impl AsRef<str>) -> Result<Self> {
        let id = id.as_ref();
        if id.is_empty() {
            return Err(MetadataError::validation("key id must not be empty"));
        }
        if id.trim() != id {
            return Err(MetadataError::validation(format!(
                "key id {:?} has leading or trailing whitespace",
                id
            )));
        }
        Ok(Self {
            id: Arc::from(id),
            _marker: PhantomData,
        })
    }

    /// The id this key was created with
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The same id viewed as an untyped key
    pub fn erase(&self) -> Key<Value> {
        self.cast()
    }

    /// Reinterpret the key for another value type.
    ///
    /// Nothing checks that values stored under the id are of type `U`; typed
    /// reads report a mismatch instead.
    pub fn cast<U>(&self) -> Key<U> {
        Key {
            id: Arc::clone(&self.id),
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        self.cast()
    }
}

impl<T, U> PartialEq<Key<U>> for Key<T> {
    fn eq(&self, other: &Key<U>) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Key<T> {}

impl<T> Hash for Key<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T, U> PartialOrd<Key<U>> for Key<T> {
    fn partial_cmp(&self, other: &Key<U>) -> Option<Ordering> {
        Some(self.id.cmp(&other.id))
    }
}

impl<T> Ord for Key<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:?})", self.id)
    }
}

impl<T> fmt::Display for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl<T> std::borrow::Borrow<str> for Key<T> {
    fn borrow(&self) -> &str {
        &self.id
    }
}

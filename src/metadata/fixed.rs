use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::{content_eq, content_hash, DebugEntries, Metadata, MetadataExt};
use crate::error::{MetadataError, Result};
use crate::key::Key;
use crate::value::Value;
use crate::version::Version;

/// Immutable metadata snapshot.
///
/// Cloning shares the snapshot; it is safe to read from any number of threads.
#[derive(Clone)]
pub struct FixedMetadata {
    inner: Arc<FixedInner>,
}

struct FixedInner {
    version: Version,
    keys: Vec<Key<Value>>,
    values: HashMap<Key<Value>, Value>,
}

impl FixedMetadata {
    /// Freeze the listed content of another container.
    ///
    /// A `FixedMetadata` source is returned as is. Any other source is copied
    /// key by key and every value is validated; nothing is built if one fails.
    pub fn of<M: Metadata + ?Sized>(source: &M) -> Result<Self> {
        if let Some(fixed) = source.as_fixed() {
            return Ok(fixed.clone());
        }

        let mut keys = Vec::with_capacity(source.keys().len());
        let mut values = HashMap::with_capacity(source.keys().len());
        for key in source.keys() {
            let value = source.get_value(key)?;
            value.validate_at(key.id())?;
            if values.insert(key.clone(), value.clone()).is_some() {
                return Err(MetadataError::validation(format!(
                    "key {} is listed more than once",
                    key
                )));
            }
            keys.push(key.clone());
        }
        Ok(Self::from_parts(source.version(), keys, values))
    }

    /// Build from content that is already validated and key-unique
    pub(crate) fn from_parts(
        version: Version,
        keys: Vec<Key<Value>>,
        values: HashMap<Key<Value>, Value>,
    ) -> Self {
        Self {
            inner: Arc::new(FixedInner {
                version,
                keys,
                values,
            }),
        }
    }

    /// An empty snapshot at the given version
    pub fn empty(version: Version) -> Self {
        Self::from_parts(version, Vec::new(), HashMap::new())
    }

    /// The same snapshot
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// True when both handles share one snapshot
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl Metadata for FixedMetadata {
    fn version(&self) -> Version {
        self.inner.version
    }

    fn keys(&self) -> &[Key<Value>] {
        &self.inner.keys
    }

    fn lookup(&self, id: &str) -> Option<&Value> {
        self.inner.values.get(id)
    }

    fn as_fixed(&self) -> Option<&FixedMetadata> {
        Some(self)
    }
}

impl PartialEq for FixedMetadata {
    fn eq(&self, other: &Self) -> bool {
        FixedMetadata::ptr_eq(self, other) || content_eq(self, other)
    }
}

impl Eq for FixedMetadata {}

impl Hash for FixedMetadata {
    fn hash<H: Hasher>(&self, state: &mut H) {
        content_hash(self).hash(state);
    }
}

impl fmt::Debug for FixedMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedMetadata")
            .field("version", &self.inner.version)
            .field("entries", &DebugEntries(self))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::SettableMetadata;

    fn sample() -> SettableMetadata {
        let mut metadata = SettableMetadata::new(Version::new(2, 3));
        metadata.put(&Key::<String>::of("name").unwrap(), "Eros".to_string()).unwrap();
        metadata.put(&Key::<i32>::of("count").unwrap(), 5).unwrap();
        metadata.put_null(&Key::<String>::of("missing").unwrap());
        metadata
    }

    #[test]
    fn test_of_copies_keys_in_order() {
        let fixed = FixedMetadata::of(&sample()).unwrap();
        let ids: Vec<&str> = fixed.keys().iter().map(|k| k.id()).collect();
        assert_eq!(ids, vec!["name", "count", "missing"]);
        assert_eq!(fixed.version(), Version::new(2, 3));
        assert_eq!(fixed.get(&Key::<String>::of("missing").unwrap()).unwrap(), None);
    }

    #[test]
    fn test_of_is_idempotent() {
        let first = FixedMetadata::of(&sample()).unwrap();
        let second = FixedMetadata::of(&first).unwrap();
        assert!(FixedMetadata::ptr_eq(&first, &second));

        let dynamic: &dyn Metadata = &first;
        let third = FixedMetadata::of(dynamic).unwrap();
        assert!(FixedMetadata::ptr_eq(&first, &third));
    }

    #[test]
    fn test_copy_returns_itself() {
        let fixed = sample().freeze();
        assert!(FixedMetadata::ptr_eq(&fixed, &fixed.copy()));
    }

    #[test]
    fn test_snapshot_is_independent_of_source() {
        let mut source = sample();
        let fixed = FixedMetadata::of(&source).unwrap();
        source.clear();
        assert_eq!(fixed.len(), 3);
    }

    #[test]
    fn test_equality_ignores_version() {
        let a = sample().freeze();
        let mut other = SettableMetadata::new(Version::new(9, 9));
        for (key, value) in a.entries() {
            other.put_value(key, value.clone()).unwrap();
        }
        assert_eq!(a, other.freeze());
        assert_eq!(a, other);
    }

    #[test]
    fn test_shared_across_threads() {
        let fixed = sample().freeze();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let fixed = fixed.clone();
                std::thread::spawn(move || fixed.get(&Key::<i32>::of("count").unwrap()).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(5));
        }
    }
}

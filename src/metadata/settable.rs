use std::collections::HashMap;
use std::fmt;

use super::{content_eq, DebugEntries, FixedMetadata, Metadata, MetadataExt};
use crate::error::Result;
use crate::key::Key;
use crate::value::{MetadataValue, Value};
use crate::version::Version;

/// Mutable metadata accumulator.
///
/// Values are validated before they are stored, so a rejected `put` leaves
/// the container exactly as it was. Not meant to be shared while it is being
/// filled; freeze it first.
#[derive(Clone)]
pub struct SettableMetadata {
    version: Version,
    keys: Vec<Key<Value>>,
    values: HashMap<Key<Value>, Value>,
}

impl SettableMetadata {
    /// An empty container at the given version
    pub fn new(version: Version) -> Self {
        Self {
            version,
            keys: Vec::new(),
            values: HashMap::new(),
        }
    }

    /// Copy every listed entry of another container (values are not deep-copied
    /// beyond what `Clone` does)
    pub fn from_metadata<M: Metadata + ?Sized>(source: &M) -> Result<Self> {
        let mut metadata = Self::new(source.version());
        for key in source.keys() {
            let value = source.get_value(key)?;
            metadata.put_value(key, value.clone())?;
        }
        Ok(metadata)
    }

    /// Store a value, keeping the key's original position if it was present
    pub fn put<T: MetadataValue>(&mut self, key: &Key<T>, value: T) -> Result<()> {
        self.put_value(key, value.into_value())
    }

    /// Store null under a key
    pub fn put_null<T>(&mut self, key: &Key<T>) {
        self.insert(key.erase(), Value::Null);
    }

    /// Store an untyped value after checking it against the whitelist
    pub fn put_value<T>(&mut self, key: &Key<T>, value: Value) -> Result<()> {
        value.validate_at(key.id())?;
        self.insert(key.erase(), value);
        Ok(())
    }

    fn insert(&mut self, key: Key<Value>, value: Value) {
        if !self.values.contains_key(&key) {
            self.keys.push(key.clone());
        }
        self.values.insert(key, value);
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.keys.clear();
        self.values.clear();
    }

    /// Structural copy; stored values are shared or cloned, never re-validated
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Snapshot the current content
    pub fn freeze(&self) -> FixedMetadata {
        FixedMetadata::from_parts(self.version, self.keys.clone(), self.values.clone())
    }

    /// Snapshot the content, consuming the container
    pub fn into_fixed(self) -> FixedMetadata {
        FixedMetadata::from_parts(self.version, self.keys, self.values)
    }
}

impl Metadata for SettableMetadata {
    fn version(&self) -> Version {
        self.version
    }

    fn keys(&self) -> &[Key<Value>] {
        &self.keys
    }

    fn lookup(&self, id: &str) -> Option<&Value> {
        self.values.get(id)
    }
}

impl PartialEq for SettableMetadata {
    fn eq(&self, other: &Self) -> bool {
        content_eq(self, other)
    }
}

impl Eq for SettableMetadata {}

impl fmt::Debug for SettableMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettableMetadata")
            .field("version", &self.version)
            .field("entries", &DebugEntries(self))
            .finish()
    }
}

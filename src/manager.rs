//! Metadata managers
//!
//! A [`MetadataManager`] is the bridge between a domain object and its
//! metadata form. A [`MetadataManagerCollection`] batches many of them under
//! ids, in registration order, so a whole set of objects can be written and
//! restored in a stable order.

use tracing::debug;

use crate::error::{MetadataError, Result};
use crate::key::Key;
use crate::metadata::{FixedMetadata, Metadata};

/// Converts a domain object to and from metadata
pub trait MetadataManager {
    /// Describe the current state of the object
    fn store(&self) -> Result<FixedMetadata>;

    /// Restore the object from a description produced by `store`
    fn retrieve(&mut self, metadata: &dyn Metadata) -> Result<()>;
}

impl<M: MetadataManager + ?Sized> MetadataManager for &mut M {
    fn store(&self) -> Result<FixedMetadata> {
        (**self).store()
    }

    fn retrieve(&mut self, metadata: &dyn Metadata) -> Result<()> {
        (**self).retrieve(metadata)
    }
}

impl<M: MetadataManager + ?Sized> MetadataManager for Box<M> {
    fn store(&self) -> Result<FixedMetadata> {
        (**self).store()
    }

    fn retrieve(&mut self, metadata: &dyn Metadata) -> Result<()> {
        (**self).retrieve(metadata)
    }
}

/// Ordered registry of managers keyed by id
#[derive(Default)]
pub struct MetadataManagerCollection<'a> {
    entries: Vec<(Key<FixedMetadata>, Box<dyn MetadataManager + 'a>)>,
}

impl<'a> MetadataManagerCollection<'a> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a manager; each key may be registered once
    pub fn add(
        &mut self,
        key: Key<FixedMetadata>,
        manager: impl MetadataManager + 'a,
    ) -> Result<()> {
        if self.contains(&key) {
            return Err(MetadataError::State(format!(
                "a manager is already registered under {}",
                key
            )));
        }
        self.entries.push((key, Box::new(manager)));
        Ok(())
    }

    /// Unregister a manager; absent keys are ignored
    pub fn remove(&mut self, key: &Key<FixedMetadata>) {
        self.entries.retain(|(existing, _)| existing != key);
    }

    pub fn contains(&self, key: &Key<FixedMetadata>) -> bool {
        self.entries.iter().any(|(existing, _)| existing == key)
    }

    /// Registered keys in registration order
    pub fn keys(&self) -> Vec<Key<FixedMetadata>> {
        self.entries.iter().map(|(key, _)| key.clone()).collect()
    }

    pub fn manager(&self, key: &Key<FixedMetadata>) -> Result<&(dyn MetadataManager + 'a)> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, manager)| &**manager)
            .ok_or_else(|| MetadataError::State(format!("no manager registered under {}", key)))
    }

    pub fn manager_mut(
        &mut self,
        key: &Key<FixedMetadata>,
    ) -> Result<&mut (dyn MetadataManager + 'a)> {
        self.entries
            .iter_mut()
            .find(|(existing, _)| existing == key)
            .map(|(_, manager)| &mut **manager)
            .ok_or_else(|| MetadataError::State(format!("no manager registered under {}", key)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Call `store` on every manager, in registration order
    pub fn store_all(&self) -> Result<Vec<(Key<FixedMetadata>, FixedMetadata)>> {
        self.entries
            .iter()
            .map(|(key, manager)| {
                debug!(key = key.id(), "storing managed object");
                manager.store().map(|metadata| (key.clone(), metadata))
            })
            .collect()
    }
}

impl std::fmt::Debug for MetadataManagerCollection<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(key, _)| key.id()))
            .finish()
    }
}

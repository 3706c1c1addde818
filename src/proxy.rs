//! Proxy objects
//!
//! A domain type that is not itself a metadata value can still be stored by
//! describing itself as nested metadata under a globally unique proxy key.
//! Reading it back needs a factory for that key, looked up in a
//! [`ProxyRegistry`] handed to the codec.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tracing::trace;

use crate::error::{MetadataError, Result};
use crate::key::Key;
use crate::metadata::FixedMetadata;

/// Key identifying a proxied domain type on the wire
pub type ProxyKey = Key<Proxy>;

/// A domain object that serializes itself as nested metadata
pub trait ProxyObject: fmt::Debug + Send + Sync + 'static {
    /// The key its factory is registered under
    fn proxy_key(&self) -> ProxyKey;

    /// Describe the object as metadata
    fn store(&self) -> Result<FixedMetadata>;

    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a proxied object stored as a metadata value
#[derive(Clone)]
pub struct Proxy(Arc<dyn ProxyObject>);

impl Proxy {
    pub fn new(object: impl ProxyObject) -> Self {
        Self(Arc::new(object))
    }

    pub fn key(&self) -> ProxyKey {
        self.0.proxy_key()
    }

    pub fn store(&self) -> Result<FixedMetadata> {
        self.0.store()
    }

    pub fn object(&self) -> &dyn ProxyObject {
        self.0.as_ref()
    }

    /// Borrow the object as its concrete type
    pub fn downcast_ref<T: ProxyObject>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Proxy").field(&self.0).finish()
    }
}

/// Proxies are equal when they share a key and store equal metadata
impl PartialEq for Proxy {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        if self.key() != other.key() {
            return false;
        }
        match (self.store(), other.store()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Proxy {}

impl Hash for Proxy {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

type ProxyFactory = Arc<dyn Fn(&FixedMetadata) -> Result<Proxy> + Send + Sync>;

/// Maps proxy keys to the factories that rebuild their objects
#[derive(Clone, Default)]
pub struct ProxyRegistry {
    factories: HashMap<ProxyKey, ProxyFactory>,
}

impl ProxyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the factory for a proxy key; each key may be registered once
    pub fn register<T, F>(&mut self, key: &ProxyKey, factory: F) -> Result<()>
    where
        T: ProxyObject,
        F: Fn(&FixedMetadata) -> Result<T> + Send + Sync + 'static,
    {
        if self.factories.contains_key(key) {
            return Err(MetadataError::State(format!(
                "proxy key {} is already registered",
                key
            )));
        }
        let factory: ProxyFactory = Arc::new(move |metadata| factory(metadata).map(Proxy::new));
        self.factories.insert(key.clone(), factory);
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    pub fn keys(&self) -> impl Iterator<Item = &ProxyKey> {
        self.factories.keys()
    }

    /// Rebuild an object from the metadata stored under its proxy key
    pub fn reconstruct(&self, id: &str, metadata: &FixedMetadata) -> Result<Proxy> {
        let factory = self
            .factories
            .get(id)
            .ok_or_else(|| MetadataError::parse(format!("unknown proxy key {:?}", id)))?;
        trace!(proxy_key = id, "reconstructing proxied object");
        factory(metadata)
    }
}

impl fmt::Debug for ProxyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}

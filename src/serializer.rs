//! File-oriented serializer
//!
//! Writes the state of one or more managed objects into a single document:
//! a metadata container stamped with the configured file version whose keys
//! are the manager ids and whose values are what each manager stored.
//!
//! Reading parses the whole document before any manager is touched, so a
//! malformed file never restores anything. A failing `retrieve` stops the walk;
//! managers earlier in registration order keep their restored state.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::codec::MetadataCodec;
use crate::config::{MetadataConfig, SerializerConfig};
use crate::error::{MetadataError, Result};
use crate::key::Key;
use crate::manager::{MetadataManager, MetadataManagerCollection};
use crate::metadata::{FixedMetadata, Metadata, MetadataExt, SettableMetadata};
use crate::proxy::ProxyRegistry;

/// Serializer façade over [`MetadataCodec`]
#[derive(Debug, Clone, Default)]
pub struct MetadataSerializer {
    registry: ProxyRegistry,
    config: SerializerConfig,
}

impl MetadataSerializer {
    pub fn new(registry: ProxyRegistry) -> Self {
        Self::with_config(registry, SerializerConfig::default())
    }

    pub fn with_config(registry: ProxyRegistry, config: SerializerConfig) -> Self {
        Self { registry, config }
    }

    pub fn from_config(registry: ProxyRegistry, config: &MetadataConfig) -> Self {
        Self::with_config(registry, config.serializer.clone())
    }

    pub fn registry(&self) -> &ProxyRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ProxyRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    pub fn codec(&self) -> MetadataCodec<'_> {
        MetadataCodec::new(&self.registry).with_max_depth(self.config.max_depth)
    }

    /// Render one manager's state as a document
    pub fn render(&self, key: &Key<FixedMetadata>, manager: &dyn MetadataManager) -> Result<String> {
        let mut document = SettableMetadata::new(self.config.file_version);
        debug!(key = key.id(), "storing managed object");
        document.put(key, manager.store()?)?;
        self.codec().render(&document, self.config.output_format)
    }

    /// Render every manager of a collection as one document
    pub fn render_all(&self, managers: &MetadataManagerCollection<'_>) -> Result<String> {
        let mut document = SettableMetadata::new(self.config.file_version);
        for (key, stored) in managers.store_all()? {
            document.put(&key, stored)?;
        }
        self.codec().render(&document, self.config.output_format)
    }

    /// Parse a document
    pub fn parse(&self, text: &str) -> Result<FixedMetadata> {
        let document = self.codec().parse(text)?.into_fixed();
        debug!(version = %document.version(), entries = document.len(), "parsed document");
        Ok(document)
    }

    /// The entry stored under `key` in a document
    pub fn extract(&self, document: &FixedMetadata, key: &Key<FixedMetadata>) -> Result<FixedMetadata> {
        document
            .get(key)?
            .ok_or_else(|| MetadataError::parse(format!("entry {} is null", key)))
    }

    /// Restore every registered manager whose id appears in the document
    pub fn restore_all(
        &self,
        document: &FixedMetadata,
        managers: &mut MetadataManagerCollection<'_>,
    ) -> Result<()> {
        for key in managers.keys() {
            if !document.has_key(&key) {
                debug!(key = key.id(), "no entry for manager, skipping");
                continue;
            }
            let stored = self.extract(document, &key)?;
            debug!(key = key.id(), "retrieving managed object");
            managers.manager_mut(&key)?.retrieve(&stored)?;
        }
        Ok(())
    }

    /// Write one manager's state to a file
    pub fn serialize(
        &self,
        key: &Key<FixedMetadata>,
        manager: &dyn MetadataManager,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let text = self.render(key, manager)?;
        debug!(path = %path.as_ref().display(), "writing metadata file");
        fs::write(path, text)?;
        Ok(())
    }

    /// Read the entry stored under `key` from a file
    pub fn deserialize(&self, path: impl AsRef<Path>, key: &Key<FixedMetadata>) -> Result<FixedMetadata> {
        let document = self.read(path)?;
        self.extract(&document, key)
    }

    /// Write every manager of a collection to one file
    pub fn serialize_all(
        &self,
        managers: &MetadataManagerCollection<'_>,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let text = self.render_all(managers)?;
        debug!(path = %path.as_ref().display(), managers = managers.len(), "writing metadata file");
        fs::write(path, text)?;
        Ok(())
    }

    /// Restore every registered manager from one file
    pub fn deserialize_all(
        &self,
        path: impl AsRef<Path>,
        managers: &mut MetadataManagerCollection<'_>,
    ) -> Result<()> {
        let document = self.read(path)?;
        self.restore_all(&document, managers)
    }

    fn read(&self, path: impl AsRef<Path>) -> Result<FixedMetadata> {
        debug!(path = %path.as_ref().display(), "reading metadata file");
        let text = fs::read_to_string(path)?;
        self.parse(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::version::Version;
    use tempfile::tempdir;

    #[derive(Debug, Default, PartialEq)]
    struct Camera {
        zoom: f64,
        label: Option<String>,
    }

    impl MetadataManager for Camera {
        fn store(&self) -> Result<FixedMetadata> {
            let mut metadata = SettableMetadata::new(Version::new(1, 1));
            metadata.put(&Key::<f64>::of("zoom")?, self.zoom)?;
            match &self.label {
                Some(label) => metadata.put(&Key::<String>::of("label")?, label.clone())?,
                None => metadata.put_null(&Key::<String>::of("label")?),
            }
            Ok(metadata.into_fixed())
        }

        fn retrieve(&mut self, metadata: &dyn Metadata) -> Result<()> {
            self.zoom = metadata.get(&Key::<f64>::of("zoom")?)?.unwrap_or(1.0);
            self.label = metadata.get(&Key::<String>::of("label")?)?;
            Ok(())
        }
    }

    fn key(id: &str) -> Key<FixedMetadata> {
        Key::of(id).unwrap()
    }

    #[test]
    fn test_serialize_and_deserialize_single() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("camera.json");
        let serializer = MetadataSerializer::default();
        let camera = Camera {
            zoom: 2.5,
            label: Some("main".to_string()),
        };

        serializer.serialize(&key("camera"), &camera, &path).unwrap();
        let stored = serializer.deserialize(&path, &key("camera")).unwrap();

        let mut restored = Camera::default();
        restored.retrieve(&stored).unwrap();
        assert_eq!(restored, camera);
        assert_eq!(stored.version(), Version::new(1, 1));
    }

    #[test]
    fn test_batch_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let serializer = MetadataSerializer::default();

        let first = Camera { zoom: 1.5, label: None };
        let second = Camera { zoom: 3.0, label: Some("side".to_string()) };
        let mut managers = MetadataManagerCollection::new();
        managers.add(key("first"), first).unwrap();
        managers.add(key("second"), second).unwrap();
        serializer.serialize_all(&managers, &path).unwrap();

        let mut a = Camera::default();
        let mut b = Camera::default();
        let mut c = Camera { zoom: 9.0, label: None };
        {
            let mut targets = MetadataManagerCollection::new();
            targets.add(key("first"), &mut a).unwrap();
            targets.add(key("second"), &mut b).unwrap();
            targets.add(key("absent"), &mut c).unwrap();
            serializer.deserialize_all(&path, &mut targets).unwrap();
        }
        assert_eq!(a, Camera { zoom: 1.5, label: None });
        assert_eq!(b, Camera { zoom: 3.0, label: Some("side".to_string()) });
        assert_eq!(c.zoom, 9.0);
    }

    #[test]
    fn test_document_uses_file_version_and_order() {
        let config = SerializerConfig {
            output_format: OutputFormat::Compact,
            file_version: Version::new(4, 2),
            max_depth: 16,
        };
        let serializer = MetadataSerializer::with_config(ProxyRegistry::new(), config);
        let mut managers = MetadataManagerCollection::new();
        managers.add(key("z"), Camera::default()).unwrap();
        managers.add(key("a"), Camera::default()).unwrap();

        let text = serializer.render_all(&managers).unwrap();
        assert!(!text.contains('\n'));
        let document = serializer.parse(&text).unwrap();
        assert_eq!(document.version(), Version::new(4, 2));
        let ids: Vec<&str> = document.keys().iter().map(|k| k.id()).collect();
        assert_eq!(ids, vec!["z", "a"]);
    }

    #[test]
    fn test_missing_entry_and_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("camera.json");
        let serializer = MetadataSerializer::default();
        serializer.serialize(&key("camera"), &Camera::default(), &path).unwrap();

        assert!(matches!(
            serializer.deserialize(&path, &key("other")),
            Err(MetadataError::KeyNotFound(_))
        ));
        assert!(matches!(
            serializer.deserialize(dir.path().join("nope.json"), &key("camera")),
            Err(MetadataError::Io(_))
        ));
    }

    #[test]
    fn test_malformed_file_restores_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, r#"[["Version", "1.0"], {"camera": ["Metadata", 3]}]"#).unwrap();

        let serializer = MetadataSerializer::default();
        let mut camera = Camera { zoom: 7.0, label: None };
        {
            let mut targets = MetadataManagerCollection::new();
            targets.add(key("camera"), &mut camera).unwrap();
            let result = serializer.deserialize_all(&path, &mut targets);
            assert!(matches!(result, Err(MetadataError::Parse(_))));
        }
        assert_eq!(camera.zoom, 7.0);
    }
}

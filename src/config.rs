//! Configuration for metadata serialization
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (metadata.toml)
//! - Environment variables (METADATA__*)
//!
//! ## Example config file (metadata.toml):
//! ```toml
//! [serializer]
//! output_format = "pretty"
//! file_version = "1.0"
//! max_depth = 64
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::codec::MetadataCodec;
use crate::version::Version;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetadataConfig {
    /// Serializer settings
    #[serde(default)]
    pub serializer: SerializerConfig,
}

/// Serializer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializerConfig {
    /// Output format (pretty or compact)
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Version stamped on files written through the serializer
    #[serde(default)]
    pub file_version: Version,

    /// Deepest nesting accepted when decoding
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

/// Output format for wire text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

fn default_max_depth() -> usize {
    MetadataCodec::DEFAULT_MAX_DEPTH
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            file_version: Version::default(),
            max_depth: default_max_depth(),
        }
    }
}

impl MetadataConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering a specific file over the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["metadata.toml", ".metadata.toml", "config/metadata.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "metadata") {
            let xdg_config = config_dir.config_dir().join("metadata.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // METADATA__SERIALIZER__OUTPUT_FORMAT=compact
        builder = builder.add_source(
            Environment::with_prefix("METADATA")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        std::fs::write(path, self.to_toml()?)
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> std::io::Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetadataConfig::default();
        assert_eq!(config.serializer.output_format, OutputFormat::Pretty);
        assert_eq!(config.serializer.file_version, Version::new(1, 0));
        assert_eq!(config.serializer.max_depth, 64);
    }

    #[test]
    fn test_serialize_config() {
        let config = MetadataConfig::default();
        let toml_str = config.to_toml().unwrap();
        assert!(toml_str.contains("[serializer]"));
        assert!(toml_str.contains("file_version = \"1.0\""));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[serializer]\noutput_format = \"compact\"\nfile_version = \"3.2\"\n",
        )
        .unwrap();

        let config = MetadataConfig::load_from(path.to_str()).unwrap();
        assert_eq!(config.serializer.output_format, OutputFormat::Compact);
        assert_eq!(config.serializer.file_version, Version::new(3, 2));
        assert_eq!(config.serializer.max_depth, 64);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = MetadataConfig::default();
        config.serializer.max_depth = 12;
        config.save(path.to_str().unwrap()).unwrap();

        let reloaded = MetadataConfig::load_from(path.to_str()).unwrap();
        assert_eq!(reloaded.serializer.max_depth, 12);
    }
}

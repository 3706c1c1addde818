//! Familiar Metadata
//!
//! A typed, versioned key/value container and the tagged JSON codec that
//! persists trees of such containers.
//!
//! ## Features
//!
//! - **Typed keys**: `Key<T>` names a value and the Rust type it is read back as
//! - **Two containers**: `SettableMetadata` for building, `FixedMetadata` for sharing
//! - **Closed value model**: every storable value is a `Value` variant
//! - **Self-describing wire format**: each element carries its own type tag
//! - **Proxied objects**: domain types that store themselves as nested metadata
//!
//! ## Wire format
//!
//! ```text
//! [["Version", "2.3"],
//!  { "name":  ["String", "Eros"],
//!    "sizes": ["List", [["Integer", 1], ["Integer", 2]]],
//!    "color": ["ProxiedObject", { "proxiedType": "color",
//!                                 "proxyMetadata": [["Version", "1.0"], { ... }] }] }]
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod key;
pub mod manager;
pub mod metadata;
pub mod proxy;
pub mod serializer;
pub mod value;
pub mod version;

pub use codec::{MetadataCodec, TypeTag};
pub use config::{MetadataConfig, OutputFormat, SerializerConfig};
pub use error::{MetadataError, Result};
pub use key::Key;
pub use manager::{MetadataManager, MetadataManagerCollection};
pub use metadata::{FixedMetadata, Metadata, MetadataExt, SettableMetadata};
pub use proxy::{Proxy, ProxyKey, ProxyObject, ProxyRegistry};
pub use serializer::MetadataSerializer;
pub use value::{Array, ElementKind, MetadataValue, Value, ValueMap, ValueSet};
pub use version::Version;

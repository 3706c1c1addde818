//! Metadata wire codec
//!
//! Converts metadata trees to and from a tagged JSON structure. The type of
//! every payload travels with it, so decoding needs no external schema.
//!
//! ## Grammar
//!
//! ```text
//! metadata := [ element(Version), { key-id: element, ... } ]
//! element  := [ type-tag, payload ]
//! ```
//!
//! Payloads by category:
//! - scalars: JSON string, number or boolean (non-finite floats as
//!   `"NaN"`, `"Infinity"`, `"-Infinity"`; dates as RFC 3339 text)
//! - `Null`: `null`
//! - `Metadata`: a nested `metadata`
//! - `ProxiedObject`: `{ "proxiedType": key-id, "proxyMetadata": metadata }`
//! - arrays (`Integer[]`, `int[]`, ...): JSON array of untagged payloads,
//!   `null` for null items
//! - `List`, `Set`, `SortedSet`: JSON array of elements
//! - `Map`, `SortedMap`: `{ "keyTypes": { text: tag }, "values": { text: element } }`
//!   where `text` is the key's text form and `"null"` with tag `Null` is the
//!   null key
//!
//! Any malformed input fails the whole decode with [`MetadataError::Parse`];
//! partial results are never returned.

mod collection;
mod outline;
pub(crate) mod scalar;
mod tag;

pub use outline::{outline, FieldOutline, Outline, OutlineDetail};
pub use scalar::NULL_KEY;
pub use tag::TypeTag;

use serde_json::{Map, Value as JsonValue};
use tracing::trace;

use crate::config::OutputFormat;
use crate::error::{MetadataError, Result};
use crate::key::Key;
use crate::metadata::{Metadata, MetadataExt, SettableMetadata};
use crate::proxy::{Proxy, ProxyRegistry};
use crate::value::{ElementKind, Value};

pub(crate) const PROXIED_TYPE: &str = "proxiedType";
pub(crate) const PROXY_METADATA: &str = "proxyMetadata";

/// Encoder and decoder bound to a proxy registry
#[derive(Debug, Clone, Copy)]
pub struct MetadataCodec<'r> {
    registry: &'r ProxyRegistry,
    max_depth: usize,
}

impl<'r> MetadataCodec<'r> {
    pub const DEFAULT_MAX_DEPTH: usize = 64;

    pub fn new(registry: &'r ProxyRegistry) -> Self {
        Self {
            registry,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit how deeply elements may nest when decoding
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Encode a container as a `[version, fields]` pair
    pub fn encode<M: Metadata + ?Sized>(&self, metadata: &M) -> Result<JsonValue> {
        let version = self.encode_element(&Value::Version(metadata.version()))?;
        let mut fields = Map::new();
        for key in metadata.keys() {
            let value = metadata.get_value(key)?;
            value
                .validate_at(key.id())
                .map_err(|e| MetadataError::Unsupported(e.to_string()))?;
            fields.insert(key.id().to_string(), self.encode_element(value)?);
        }
        Ok(JsonValue::Array(vec![version, JsonValue::Object(fields)]))
    }

    /// Decode a `[version, fields]` pair into a fresh container
    pub fn decode(&self, wire: &JsonValue) -> Result<SettableMetadata> {
        self.decode_metadata(wire, 0)
    }

    /// Render a container as wire text
    pub fn render<M: Metadata + ?Sized>(&self, metadata: &M, format: OutputFormat) -> Result<String> {
        let wire = self.encode(metadata)?;
        let text = match format {
            OutputFormat::Pretty => serde_json::to_string_pretty(&wire)?,
            OutputFormat::Compact => serde_json::to_string(&wire)?,
        };
        Ok(text)
    }

    /// Parse wire text into a fresh container
    pub fn parse(&self, text: &str) -> Result<SettableMetadata> {
        let wire: JsonValue = serde_json::from_str(text)
            .map_err(|e| MetadataError::parse(format!("malformed wire text: {}", e)))?;
        self.decode(&wire)
    }

    /// Encode one value as a `[tag, payload]` element
    pub fn encode_element(&self, value: &Value) -> Result<JsonValue> {
        let tag = TypeTag::of(value);
        let payload = self.encode_payload(value)?;
        Ok(JsonValue::Array(vec![JsonValue::from(tag.as_str()), payload]))
    }

    /// Decode one `[tag, payload]` element
    pub fn decode_element(&self, wire: &JsonValue) -> Result<Value> {
        self.decode_element_at(wire, 0)
    }

    fn encode_payload(&self, value: &Value) -> Result<JsonValue> {
        match value {
            Value::Null => Ok(JsonValue::Null),
            Value::Metadata(metadata) => self.encode(metadata),
            Value::Proxy(proxy) => self.encode_proxy(proxy),
            Value::Array(array) => self.encode_array(array),
            Value::List(items) => self.encode_sequence(items.iter()),
            Value::Set(set) => self.encode_sequence(set.iter()),
            Value::Map(map) => self.encode_map(map),
            scalar => scalar::encode(scalar),
        }
    }

    fn encode_proxy(&self, proxy: &Proxy) -> Result<JsonValue> {
        let key = proxy.key();
        if !self.registry.contains(key.id()) {
            return Err(MetadataError::Unsupported(format!(
                "proxy key {} is not registered",
                key
            )));
        }
        let stored = proxy.store()?;
        let mut object = Map::new();
        object.insert(PROXIED_TYPE.to_string(), JsonValue::from(key.id()));
        object.insert(PROXY_METADATA.to_string(), self.encode(&stored)?);
        Ok(JsonValue::Object(object))
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            return Err(MetadataError::parse(format!(
                "nesting deeper than {} levels",
                self.max_depth
            )));
        }
        Ok(())
    }

    fn decode_metadata(&self, wire: &JsonValue, depth: usize) -> Result<SettableMetadata> {
        self.check_depth(depth)?;
        let pair = wire
            .as_array()
            .filter(|pair| pair.len() == 2)
            .ok_or_else(|| MetadataError::parse("metadata must be a [version, fields] pair"))?;

        let version = match self.decode_element_at(&pair[0], depth + 1)? {
            Value::Version(version) => version,
            other => {
                return Err(MetadataError::parse(format!(
                    "expected a Version record, found {}",
                    other.type_name()
                )))
            }
        };
        let fields = pair[1]
            .as_object()
            .ok_or_else(|| MetadataError::parse("metadata fields must be an object"))?;

        let mut metadata = SettableMetadata::new(version);
        for (id, element) in fields {
            let key: Key<Value> = Key::of(id)
                .map_err(|e| MetadataError::parse(format!("invalid key {:?}: {}", id, e)))?;
            let value = self.decode_element_at(element, depth + 1)?;
            metadata
                .put_value(&key, value)
                .map_err(|e| MetadataError::parse(format!("field {}: {}", id, e)))?;
        }
        Ok(metadata)
    }

    fn decode_element_at(&self, wire: &JsonValue, depth: usize) -> Result<Value> {
        self.check_depth(depth)?;
        let pair = wire
            .as_array()
            .filter(|pair| pair.len() == 2)
            .ok_or_else(|| MetadataError::parse(format!("expected a [type, payload] element, got {}", wire)))?;
        let name = pair[0]
            .as_str()
            .ok_or_else(|| MetadataError::parse(format!("type tag must be a string, got {}", pair[0])))?;
        self.decode_payload(TypeTag::parse(name)?, &pair[1], depth)
    }

    fn decode_payload(&self, tag: TypeTag, payload: &JsonValue, depth: usize) -> Result<Value> {
        match tag {
            TypeTag::Null if payload.is_null() => Ok(Value::Null),
            TypeTag::Null => Err(MetadataError::parse(format!(
                "Null payload must be null, got {}",
                payload
            ))),
            TypeTag::Single(ElementKind::Metadata) => Ok(Value::Metadata(
                self.decode_metadata(payload, depth + 1)?.into_fixed(),
            )),
            TypeTag::Single(ElementKind::Proxy) => self.decode_proxy(payload, depth + 1),
            TypeTag::Single(kind) => scalar::decode(kind, payload),
            TypeTag::Array { element, primitive } => {
                self.decode_array(element, primitive, payload, depth)
            }
            TypeTag::List => Ok(Value::List(self.decode_sequence(payload, depth)?)),
            TypeTag::Set | TypeTag::SortedSet => {
                self.decode_set(tag == TypeTag::SortedSet, payload, depth)
            }
            TypeTag::Map | TypeTag::SortedMap => {
                self.decode_map(tag == TypeTag::SortedMap, payload, depth)
            }
        }
    }

    fn decode_proxy(&self, payload: &JsonValue, depth: usize) -> Result<Value> {
        let object = payload
            .as_object()
            .ok_or_else(|| MetadataError::parse("proxied object payload must be an object"))?;
        let id = object
            .get(PROXIED_TYPE)
            .and_then(JsonValue::as_str)
            .ok_or_else(|| MetadataError::parse(format!("proxied object is missing {}", PROXIED_TYPE)))?;
        let nested = object
            .get(PROXY_METADATA)
            .ok_or_else(|| MetadataError::parse(format!("proxied object is missing {}", PROXY_METADATA)))?;

        let metadata = self.decode_metadata(nested, depth + 1)?.into_fixed();
        trace!(proxy_key = id, "decoded proxied object metadata");
        self.registry.reconstruct(id, &metadata).map(Value::Proxy)
    }
}

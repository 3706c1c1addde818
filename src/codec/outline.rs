//! Schema-free summary of wire text
//!
//! Walks the tagged structure without building values, so files holding
//! proxied objects can be inspected without their factories.

use std::fmt;

use serde_json::Value as JsonValue;

use super::tag::TypeTag;
use super::{PROXIED_TYPE, PROXY_METADATA};
use crate::error::{MetadataError, Result};
use crate::value::ElementKind;
use crate::version::Version;

/// Version and fields of one metadata level
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    pub version: Version,
    pub fields: Vec<FieldOutline>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldOutline {
    pub id: String,
    pub tag: TypeTag,
    pub detail: OutlineDetail,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutlineDetail {
    None,
    /// Number of items or entries in a collection
    Size(usize),
    Nested(Outline),
    Proxy {
        proxied_type: String,
        metadata: Outline,
    },
}

fn element_parts(wire: &JsonValue) -> Result<(TypeTag, &JsonValue)> {
    let pair = wire
        .as_array()
        .filter(|pair| pair.len() == 2)
        .ok_or_else(|| MetadataError::parse("expected a [type, payload] element"))?;
    let name = pair[0]
        .as_str()
        .ok_or_else(|| MetadataError::parse("type tag must be a string"))?;
    Ok((TypeTag::parse(name)?, &pair[1]))
}

/// Summarize a `[version, fields]` pair
pub fn outline(wire: &JsonValue) -> Result<Outline> {
    let pair = wire
        .as_array()
        .filter(|pair| pair.len() == 2)
        .ok_or_else(|| MetadataError::parse("metadata must be a [version, fields] pair"))?;

    let version = match element_parts(&pair[0])? {
        (TypeTag::Single(ElementKind::Version), JsonValue::String(text)) => Version::parse(text)?,
        _ => return Err(MetadataError::parse("expected a Version record")),
    };
    let fields = pair[1]
        .as_object()
        .ok_or_else(|| MetadataError::parse("metadata fields must be an object"))?
        .iter()
        .map(|(id, element)| {
            let (tag, payload) = element_parts(element)?;
            Ok(FieldOutline {
                id: id.clone(),
                tag,
                detail: detail(tag, payload)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Outline { version, fields })
}

fn detail(tag: TypeTag, payload: &JsonValue) -> Result<OutlineDetail> {
    Ok(match tag {
        TypeTag::Single(ElementKind::Metadata) => OutlineDetail::Nested(outline(payload)?),
        TypeTag::Single(ElementKind::Proxy) => {
            let proxied_type = payload
                .get(PROXIED_TYPE)
                .and_then(JsonValue::as_str)
                .ok_or_else(|| MetadataError::parse(format!("proxied object is missing {}", PROXIED_TYPE)))?;
            let nested = payload
                .get(PROXY_METADATA)
                .ok_or_else(|| MetadataError::parse(format!("proxied object is missing {}", PROXY_METADATA)))?;
            OutlineDetail::Proxy {
                proxied_type: proxied_type.to_string(),
                metadata: outline(nested)?,
            }
        }
        TypeTag::Array { .. } | TypeTag::List | TypeTag::Set | TypeTag::SortedSet => payload
            .as_array()
            .map(|items| OutlineDetail::Size(items.len()))
            .unwrap_or(OutlineDetail::None),
        TypeTag::Map | TypeTag::SortedMap => payload
            .get("values")
            .and_then(JsonValue::as_object)
            .map(|values| OutlineDetail::Size(values.len()))
            .unwrap_or(OutlineDetail::None),
        TypeTag::Null | TypeTag::Single(_) => OutlineDetail::None,
    })
}

impl Outline {
    fn write_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        writeln!(f, "{:indent$}version {}", "", self.version, indent = indent)?;
        for field in &self.fields {
            write!(f, "{:indent$}{}: {}", "", field.id, field.tag, indent = indent)?;
            match &field.detail {
                OutlineDetail::None => writeln!(f)?,
                OutlineDetail::Size(size) => writeln!(f, " ({})", size)?,
                OutlineDetail::Nested(nested) => {
                    writeln!(f)?;
                    nested.write_indented(f, indent + 2)?;
                }
                OutlineDetail::Proxy {
                    proxied_type,
                    metadata,
                } => {
                    writeln!(f, " <{}>", proxied_type)?;
                    metadata.write_indented(f, indent + 2)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Outline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

//! Array, sequence, set and map payloads

use serde_json::{Map, Value as JsonValue};

use super::tag::TypeTag;
use super::{scalar, MetadataCodec};
use crate::error::{MetadataError, Result};
use crate::value::{Array, ElementKind, Value, ValueMap, ValueSet};

const KEY_TYPES: &str = "keyTypes";
const VALUES: &str = "values";

fn expect_array<'a>(tag: &str, payload: &'a JsonValue) -> Result<&'a Vec<JsonValue>> {
    payload
        .as_array()
        .ok_or_else(|| MetadataError::parse(format!("{} payload must be an array", tag)))
}

impl MetadataCodec<'_> {
    pub(super) fn encode_array(&self, array: &Array) -> Result<JsonValue> {
        array
            .items()
            .iter()
            .map(|item| self.encode_payload(item))
            .collect::<Result<Vec<_>>>()
            .map(JsonValue::Array)
    }

    pub(super) fn decode_array(
        &self,
        element: ElementKind,
        primitive: bool,
        payload: &JsonValue,
        depth: usize,
    ) -> Result<Value> {
        let tag = TypeTag::Array { element, primitive };
        let mut items = Vec::new();
        for item in expect_array(tag.as_str(), payload)? {
            if item.is_null() {
                if primitive {
                    return Err(MetadataError::parse(format!("{} cannot hold null", tag)));
                }
                items.push(Value::Null);
            } else {
                items.push(self.decode_payload(TypeTag::Single(element), item, depth + 1)?);
            }
        }
        Ok(Value::Array(if primitive {
            Array::primitive(element, items)
        } else {
            Array::boxed(element, items)
        }))
    }

    pub(super) fn encode_sequence<'v>(
        &self,
        items: impl Iterator<Item = &'v Value>,
    ) -> Result<JsonValue> {
        items
            .map(|item| self.encode_element(item))
            .collect::<Result<Vec<_>>>()
            .map(JsonValue::Array)
    }

    pub(super) fn decode_sequence(&self, payload: &JsonValue, depth: usize) -> Result<Vec<Value>> {
        expect_array("sequence", payload)?
            .iter()
            .map(|element| self.decode_element_at(element, depth + 1))
            .collect()
    }

    pub(super) fn decode_set(&self, sorted: bool, payload: &JsonValue, depth: usize) -> Result<Value> {
        let mut set = if sorted { ValueSet::sorted() } else { ValueSet::new() };
        for item in self.decode_sequence(payload, depth)? {
            set.insert(item);
        }
        Ok(Value::Set(set))
    }

    pub(super) fn encode_map(&self, map: &ValueMap) -> Result<JsonValue> {
        let mut key_types = Map::new();
        let mut values = Map::new();
        for (key, value) in map.iter() {
            let text = scalar::key_text(key)?;
            if values.contains_key(&text) {
                return Err(MetadataError::Unsupported(format!(
                    "map keys collide on text form {:?}",
                    text
                )));
            }
            key_types.insert(text.clone(), JsonValue::from(TypeTag::of(key).as_str()));
            values.insert(text, self.encode_element(value)?);
        }

        let mut object = Map::new();
        object.insert(KEY_TYPES.to_string(), JsonValue::Object(key_types));
        object.insert(VALUES.to_string(), JsonValue::Object(values));
        Ok(JsonValue::Object(object))
    }

    pub(super) fn decode_map(&self, sorted: bool, payload: &JsonValue, depth: usize) -> Result<Value> {
        let field = |name: &str| {
            payload
                .get(name)
                .and_then(JsonValue::as_object)
                .ok_or_else(|| MetadataError::parse(format!("map payload is missing {}", name)))
        };
        let key_types = field(KEY_TYPES)?;
        let values = field(VALUES)?;

        let mut map = if sorted { ValueMap::sorted() } else { ValueMap::new() };
        for (text, element) in values {
            let tag = key_types
                .get(text)
                .and_then(JsonValue::as_str)
                .ok_or_else(|| MetadataError::parse(format!("map key {:?} has no declared type", text)))?;
            let key = scalar::parse_key_text(TypeTag::parse(tag)?, text)?;
            map.insert(key, self.decode_element_at(element, depth + 1)?);
        }
        Ok(Value::Map(map))
    }
}

//! Wire type tags

use std::fmt;

use crate::error::{MetadataError, Result};
use crate::value::{ElementKind, Value};

/// Symbolic tag naming the codec for a wire payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// A null value
    Null,
    /// A single value of one element kind
    Single(ElementKind),
    Array {
        element: ElementKind,
        primitive: bool,
    },
    List,
    Set,
    SortedSet,
    Map,
    SortedMap,
}

impl TypeTag {
    /// Resolve the tag of a value
    pub fn of(value: &Value) -> TypeTag {
        match value {
            Value::Null => TypeTag::Null,
            Value::Array(array) => TypeTag::Array {
                element: array.element(),
                primitive: array.is_primitive(),
            },
            Value::List(_) => TypeTag::List,
            Value::Set(set) if set.is_sorted() => TypeTag::SortedSet,
            Value::Set(_) => TypeTag::Set,
            Value::Map(map) if map.is_sorted() => TypeTag::SortedMap,
            Value::Map(_) => TypeTag::Map,
            Value::String(_) => TypeTag::Single(ElementKind::String),
            Value::Char(_) => TypeTag::Single(ElementKind::Char),
            Value::Bool(_) => TypeTag::Single(ElementKind::Bool),
            Value::Byte(_) => TypeTag::Single(ElementKind::Byte),
            Value::Short(_) => TypeTag::Single(ElementKind::Short),
            Value::Int(_) => TypeTag::Single(ElementKind::Int),
            Value::Long(_) => TypeTag::Single(ElementKind::Long),
            Value::Float(_) => TypeTag::Single(ElementKind::Float),
            Value::Double(_) => TypeTag::Single(ElementKind::Double),
            Value::Date(_) => TypeTag::Single(ElementKind::Date),
            Value::Key(_) => TypeTag::Single(ElementKind::Key),
            Value::Version(_) => TypeTag::Single(ElementKind::Version),
            Value::Metadata(_) => TypeTag::Single(ElementKind::Metadata),
            Value::Proxy(_) => TypeTag::Single(ElementKind::Proxy),
        }
    }

    /// Every tag the wire format knows, in a fixed order
    pub fn all() -> Vec<TypeTag> {
        let mut tags = vec![
            TypeTag::List,
            TypeTag::Set,
            TypeTag::SortedSet,
            TypeTag::Map,
            TypeTag::SortedMap,
        ];
        for element in ElementKind::ALL {
            tags.push(TypeTag::Single(element));
            tags.push(TypeTag::Array {
                element,
                primitive: false,
            });
            if element.primitive_array_name().is_some() {
                tags.push(TypeTag::Array {
                    element,
                    primitive: true,
                });
            }
        }
        tags.push(TypeTag::Null);
        tags
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Null => "Null",
            TypeTag::Single(element) => element.name(),
            TypeTag::Array {
                element,
                primitive: false,
            } => element.array_name(),
            TypeTag::Array {
                element,
                primitive: true,
            } => element.primitive_array_name().unwrap_or("Unknown[]"),
            TypeTag::List => "List",
            TypeTag::Set => "Set",
            TypeTag::SortedSet => "SortedSet",
            TypeTag::Map => "Map",
            TypeTag::SortedMap => "SortedMap",
        }
    }

    /// Look up a tag by its wire name
    pub fn parse(name: &str) -> Result<TypeTag> {
        TypeTag::all()
            .into_iter()
            .find(|tag| tag.as_str() == name)
            .ok_or_else(|| MetadataError::parse(format!("unknown type tag {:?}", name)))
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Metadata value model
//!
//! [`Value`] is the closed set of categories a metadata container may hold.
//! Everything the wire format can carry has exactly one variant here, so the
//! codec dispatches with an exhaustive `match` instead of probing types.
//!
//! ## Equality
//!
//! Values compare with boxed semantics: floats are equal when their bits are
//! equal (any NaN equals any NaN, `-0.0 != 0.0`), which keeps `Eq` and `Hash`
//! lawful. Sets and maps compare without regard to iteration order.

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};

use crate::codec::scalar::key_text;
use crate::codec::NULL_KEY;
use crate::error::{MetadataError, Result};
use crate::key::Key;
use crate::metadata::{FixedMetadata, SettableMetadata};
use crate::proxy::Proxy;
use crate::version::Version;

/// Element category of a typed [`Array`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    String,
    Char,
    Bool,
    Double,
    Float,
    Int,
    Long,
    Short,
    Byte,
    Date,
    Key,
    Version,
    Metadata,
    Proxy,
}

impl ElementKind {
    pub const ALL: [ElementKind; 14] = [
        ElementKind::String,
        ElementKind::Char,
        ElementKind::Bool,
        ElementKind::Double,
        ElementKind::Float,
        ElementKind::Int,
        ElementKind::Long,
        ElementKind::Short,
        ElementKind::Byte,
        ElementKind::Date,
        ElementKind::Key,
        ElementKind::Version,
        ElementKind::Metadata,
        ElementKind::Proxy,
    ];

    /// Name of the boxed category (also its wire tag)
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::String => "String",
            ElementKind::Char => "Character",
            ElementKind::Bool => "Boolean",
            ElementKind::Double => "Double",
            ElementKind::Float => "Float",
            ElementKind::Int => "Integer",
            ElementKind::Long => "Long",
            ElementKind::Short => "Short",
            ElementKind::Byte => "Byte",
            ElementKind::Date => "Date",
            ElementKind::Key => "Key",
            ElementKind::Version => "Version",
            ElementKind::Metadata => "Metadata",
            ElementKind::Proxy => "ProxiedObject",
        }
    }

    /// Name of a boxed array of this kind
    pub fn array_name(&self) -> &'static str {
        match self {
            ElementKind::String => "String[]",
            ElementKind::Char => "Character[]",
            ElementKind::Bool => "Boolean[]",
            ElementKind::Double => "Double[]",
            ElementKind::Float => "Float[]",
            ElementKind::Int => "Integer[]",
            ElementKind::Long => "Long[]",
            ElementKind::Short => "Short[]",
            ElementKind::Byte => "Byte[]",
            ElementKind::Date => "Date[]",
            ElementKind::Key => "Key[]",
            ElementKind::Version => "Version[]",
            ElementKind::Metadata => "Metadata[]",
            ElementKind::Proxy => "ProxiedObject[]",
        }
    }

    /// Name of a primitive array of this kind, if the kind has one
    pub fn primitive_array_name(&self) -> Option<&'static str> {
        match self {
            ElementKind::Char => Some("char[]"),
            ElementKind::Bool => Some("boolean[]"),
            ElementKind::Double => Some("double[]"),
            ElementKind::Float => Some("float[]"),
            ElementKind::Int => Some("int[]"),
            ElementKind::Long => Some("long[]"),
            ElementKind::Short => Some("short[]"),
            ElementKind::Byte => Some("byte[]"),
            _ => None,
        }
    }

    /// Kinds with a total order and a reversible text form.
    ///
    /// Only these may be map keys or members of sorted collections.
    pub fn is_comparable(&self) -> bool {
        !matches!(self, ElementKind::Metadata | ElementKind::Proxy)
    }

    fn rank(&self) -> usize {
        ElementKind::ALL
            .iter()
            .position(|kind| kind == self)
            .unwrap_or(ElementKind::ALL.len())
    }
}

/// Array of a single element kind, boxed (nullable items) or primitive
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Array {
    element: ElementKind,
    primitive: bool,
    items: Vec<Value>,
}

impl Array {
    /// Array of boxed elements; items may be null
    pub fn boxed(element: ElementKind, items: impl IntoIterator<Item = Value>) -> Self {
        Self {
            element,
            primitive: false,
            items: items.into_iter().collect(),
        }
    }

    /// Array of primitive elements; items may not be null
    pub fn primitive(element: ElementKind, items: impl IntoIterator<Item = Value>) -> Self {
        Self {
            element,
            primitive: true,
            items: items.into_iter().collect(),
        }
    }

    pub fn element(&self) -> ElementKind {
        self.element
    }

    pub fn is_primitive(&self) -> bool {
        self.primitive
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn validate(&self, path: &str) -> Result<()> {
        if self.primitive && self.element.primitive_array_name().is_none() {
            return Err(MetadataError::validation(format!(
                "{}: {} has no primitive array form",
                path,
                self.element.name()
            )));
        }
        for (index, item) in self.items.iter().enumerate() {
            match item.element_kind() {
                Some(kind) if kind == self.element => {}
                None if item.is_null() && !self.primitive => {}
                _ => {
                    return Err(MetadataError::validation(format!(
                        "{}[{}]: {} does not belong in a {} array",
                        path,
                        index,
                        item.type_name(),
                        self.type_name()
                    )))
                }
            }
        }
        Ok(())
    }

    /// Category name of the whole array, e.g. `Integer[]` or `int[]`
    pub fn type_name(&self) -> &'static str {
        if self.primitive {
            self.element.primitive_array_name().unwrap_or("Unknown[]")
        } else {
            self.element.array_name()
        }
    }
}

/// Set of values, either unordered or kept sorted
#[derive(Debug, Clone, Default)]
pub struct ValueSet {
    sorted: bool,
    items: Vec<Value>,
}

impl ValueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set that iterates in ascending order
    pub fn sorted() -> Self {
        Self {
            sorted: true,
            items: Vec::new(),
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Insert a value, returning false if an equal value was present
    pub fn insert(&mut self, value: Value) -> bool {
        if self.sorted {
            match self.items.binary_search_by(|probe| probe.sort_cmp(&value)) {
                Ok(_) => false,
                Err(index) => {
                    self.items.insert(index, value);
                    true
                }
            }
        } else if self.items.contains(&value) {
            false
        } else {
            self.items.push(value);
            true
        }
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.items.contains(value)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }
}

impl PartialEq for ValueSet {
    fn eq(&self, other: &Self) -> bool {
        self.sorted == other.sorted
            && self.items.len() == other.items.len()
            && self.items.iter().all(|item| other.contains(item))
    }
}

impl Eq for ValueSet {}

impl Hash for ValueSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sorted.hash(state);
        unordered_hash(self.items.iter()).hash(state);
    }
}

/// Map between values, either unordered or kept sorted by key
#[derive(Debug, Clone, Default)]
pub struct ValueMap {
    sorted: bool,
    entries: Vec<(Value, Value)>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A map that iterates in ascending key order
    pub fn sorted() -> Self {
        Self {
            sorted: true,
            entries: Vec::new(),
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Insert an entry, returning the value it replaced
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        let position = if self.sorted {
            self.entries.binary_search_by(|(probe, _)| probe.sort_cmp(&key))
        } else {
            self.entries
                .iter()
                .position(|(existing, _)| *existing == key)
                .ok_or(self.entries.len())
        };
        match position {
            Ok(index) => Some(std::mem::replace(&mut self.entries[index].1, value)),
            Err(index) => {
                self.entries.insert(index, (key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl PartialEq for ValueMap {
    fn eq(&self, other: &Self) -> bool {
        self.sorted == other.sorted
            && self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl Eq for ValueMap {}

impl Hash for ValueMap {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sorted.hash(state);
        unordered_hash(self.entries.iter()).hash(state);
    }
}

/// Order-insensitive hash of a sequence
pub(crate) fn unordered_hash<T: Hash>(items: impl Iterator<Item = T>) -> u64 {
    items.fold(0u64, |acc, item| {
        let mut hasher = DefaultHasher::new();
        item.hash(&mut hasher);
        acc.wrapping_add(hasher.finish())
    })
}

/// A value that can be stored in metadata
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    String(String),
    Char(char),
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Date(DateTime<Utc>),
    Key(Key<Value>),
    Version(Version),
    Metadata(FixedMetadata),
    Proxy(Proxy),
    Array(Array),
    List(Vec<Value>),
    Set(ValueSet),
    Map(ValueMap),
}

impl Value {
    /// Ordered sequence of values
    pub fn list(items: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Unordered set of values; duplicates collapse
    pub fn set(items: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        let mut set = ValueSet::new();
        for item in items {
            set.insert(item.into());
        }
        Value::Set(set)
    }

    /// Sorted set of values; duplicates collapse
    pub fn sorted_set(items: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        let mut set = ValueSet::sorted();
        for item in items {
            set.insert(item.into());
        }
        Value::Set(set)
    }

    /// Unordered map; later entries replace earlier ones with an equal key
    pub fn map<K: Into<Value>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        let mut map = ValueMap::new();
        for (key, value) in entries {
            map.insert(key.into(), value.into());
        }
        Value::Map(map)
    }

    /// Map kept in ascending key order
    pub fn sorted_map<K: Into<Value>, V: Into<Value>>(
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        let mut map = ValueMap::sorted();
        for (key, value) in entries {
            map.insert(key.into(), value.into());
        }
        Value::Map(map)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Category name, matching the wire tag of the value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Array(array) => array.type_name(),
            Value::List(_) => "List",
            Value::Set(set) if set.sorted => "SortedSet",
            Value::Set(_) => "Set",
            Value::Map(map) if map.sorted => "SortedMap",
            Value::Map(_) => "Map",
            other => other
                .element_kind()
                .map(|kind| kind.name())
                .unwrap_or("Unknown"),
        }
    }

    /// The element kind of a single (non-collection, non-null) value
    pub fn element_kind(&self) -> Option<ElementKind> {
        match self {
            Value::String(_) => Some(ElementKind::String),
            Value::Char(_) => Some(ElementKind::Char),
            Value::Bool(_) => Some(ElementKind::Bool),
            Value::Double(_) => Some(ElementKind::Double),
            Value::Float(_) => Some(ElementKind::Float),
            Value::Int(_) => Some(ElementKind::Int),
            Value::Long(_) => Some(ElementKind::Long),
            Value::Short(_) => Some(ElementKind::Short),
            Value::Byte(_) => Some(ElementKind::Byte),
            Value::Date(_) => Some(ElementKind::Date),
            Value::Key(_) => Some(ElementKind::Key),
            Value::Version(_) => Some(ElementKind::Version),
            Value::Metadata(_) => Some(ElementKind::Metadata),
            Value::Proxy(_) => Some(ElementKind::Proxy),
            Value::Null | Value::Array(_) | Value::List(_) | Value::Set(_) | Value::Map(_) => None,
        }
    }

    fn comparable_kind(&self) -> Option<ElementKind> {
        self.element_kind().filter(ElementKind::is_comparable)
    }

    /// Ordering used by sorted sets and maps.
    ///
    /// Values of different kinds order by kind; within a comparable kind the
    /// natural order applies. Other kinds compare equal to each other, which
    /// validation never lets into a sorted collection.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Char(a), Value::Char(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Double(a), Value::Double(b)) => {
                f64::from_bits(float_bits_f64(*a)).total_cmp(&f64::from_bits(float_bits_f64(*b)))
            }
            (Value::Float(a), Value::Float(b)) => {
                f32::from_bits(float_bits_f32(*a)).total_cmp(&f32::from_bits(float_bits_f32(*b)))
            }
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Long(a), Value::Long(b)) => a.cmp(b),
            (Value::Short(a), Value::Short(b)) => a.cmp(b),
            (Value::Byte(a), Value::Byte(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Key(a), Value::Key(b)) => a.cmp(b),
            (Value::Version(a), Value::Version(b)) => a.cmp(b),
            _ => {
                let rank = |value: &Value| {
                    value
                        .element_kind()
                        .map(|kind| kind.rank())
                        .unwrap_or(usize::MAX)
                };
                rank(self).cmp(&rank(other))
            }
        }
    }

    /// Check the value against the storable whitelist, recursively
    pub fn validate(&self) -> Result<()> {
        self.validate_at("value")
    }

    pub(crate) fn validate_at(&self, path: &str) -> Result<()> {
        match self {
            Value::Array(array) => array.validate(path),
            Value::List(items) => items
                .iter()
                .enumerate()
                .try_for_each(|(index, item)| item.validate_at(&format!("{}[{}]", path, index))),
            Value::Set(set) => {
                if set.sorted {
                    check_sortable(path, set.items.iter())?;
                }
                set.items
                    .iter()
                    .enumerate()
                    .try_for_each(|(index, item)| item.validate_at(&format!("{}{{{}}}", path, index)))
            }
            Value::Map(map) => {
                if map.sorted {
                    check_sortable(path, map.entries.iter().map(|(key, _)| key))?;
                }
                let mut texts = HashSet::new();
                for (index, (key, value)) in map.entries.iter().enumerate() {
                    if !key.is_null() && key.comparable_kind().is_none() {
                        return Err(MetadataError::validation(format!(
                            "{}: {} cannot be used as a map key",
                            path,
                            key.type_name()
                        )));
                    }
                    if matches!(key, Value::String(text) if text == NULL_KEY) {
                        return Err(MetadataError::validation(format!(
                            "{}: string key {:?} is reserved for the null key",
                            path, NULL_KEY
                        )));
                    }
                    let text = key_text(key)
                        .map_err(|e| MetadataError::validation(format!("{}: {}", path, e)))?;
                    if !texts.insert(text) {
                        return Err(MetadataError::validation(format!(
                            "{}: map key {} shares its text form with another key",
                            path,
                            key.type_name()
                        )));
                    }
                    value.validate_at(&format!("{}[{}]", path, index))?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Sorted collections hold non-null values of one comparable kind
fn check_sortable<'a>(path: &str, mut items: impl Iterator<Item = &'a Value>) -> Result<()> {
    let Some(first) = items.next() else {
        return Ok(());
    };
    let kind = first.comparable_kind().ok_or_else(|| {
        MetadataError::validation(format!("{}: {} is not sortable", path, first.type_name()))
    })?;
    for item in items {
        if item.comparable_kind() != Some(kind) {
            return Err(MetadataError::validation(format!(
                "{}: cannot sort {} alongside {}",
                path,
                item.type_name(),
                kind.name()
            )));
        }
    }
    Ok(())
}

fn float_bits_f64(value: f64) -> u64 {
    if value.is_nan() {
        f64::NAN.to_bits()
    } else {
        value.to_bits()
    }
}

fn float_bits_f32(value: f32) -> u32 {
    if value.is_nan() {
        f32::NAN.to_bits()
    } else {
        value.to_bits()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => float_bits_f32(*a) == float_bits_f32(*b),
            (Value::Double(a), Value::Double(b)) => float_bits_f64(*a) == float_bits_f64(*b),
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Key(a), Value::Key(b)) => a == b,
            (Value::Version(a), Value::Version(b)) => a == b,
            (Value::Metadata(a), Value::Metadata(b)) => a == b,
            (Value::Proxy(a), Value::Proxy(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::String(v) => v.hash(state),
            Value::Char(v) => v.hash(state),
            Value::Bool(v) => v.hash(state),
            Value::Byte(v) => v.hash(state),
            Value::Short(v) => v.hash(state),
            Value::Int(v) => v.hash(state),
            Value::Long(v) => v.hash(state),
            Value::Float(v) => float_bits_f32(*v).hash(state),
            Value::Double(v) => float_bits_f64(*v).hash(state),
            Value::Date(v) => v.hash(state),
            Value::Key(v) => v.hash(state),
            Value::Version(v) => v.hash(state),
            Value::Metadata(v) => v.hash(state),
            Value::Proxy(v) => v.hash(state),
            Value::Array(v) => v.hash(state),
            Value::List(v) => v.hash(state),
            Value::Set(v) => v.hash(state),
            Value::Map(v) => v.hash(state),
        }
    }
}

/// Conversion between a Rust type and its [`Value`] category
pub trait MetadataValue: Sized {
    /// Category name reported on a typed read mismatch
    const TYPE_NAME: &'static str;

    fn into_value(self) -> Value;

    /// Convert back, or `None` if the value is of another category
    fn from_value(value: &Value) -> Option<Self>;
}

impl MetadataValue for Value {
    const TYPE_NAME: &'static str = "Value";

    fn into_value(self) -> Value {
        self
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

macro_rules! scalar_value {
    ($ty:ty, $variant:ident, $name:expr) => {
        impl MetadataValue for $ty {
            const TYPE_NAME: &'static str = $name;

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(inner) => Some(inner.clone()),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::$variant(value)
            }
        }
    };
}

scalar_value!(String, String, "String");
scalar_value!(char, Char, "Character");
scalar_value!(bool, Bool, "Boolean");
scalar_value!(i8, Byte, "Byte");
scalar_value!(i16, Short, "Short");
scalar_value!(i32, Int, "Integer");
scalar_value!(i64, Long, "Long");
scalar_value!(f32, Float, "Float");
scalar_value!(f64, Double, "Double");
scalar_value!(DateTime<Utc>, Date, "Date");
scalar_value!(Version, Version, "Version");
scalar_value!(FixedMetadata, Metadata, "Metadata");
scalar_value!(Proxy, Proxy, "ProxiedObject");
scalar_value!(Array, Array, "Array");

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<SettableMetadata> for Value {
    fn from(value: SettableMetadata) -> Self {
        Value::Metadata(value.freeze())
    }
}

impl<T> From<Key<T>> for Value {
    fn from(key: Key<T>) -> Self {
        Value::Key(key.erase())
    }
}

impl<T> MetadataValue for Key<T> {
    const TYPE_NAME: &'static str = "Key";

    fn into_value(self) -> Value {
        Value::Key(self.erase())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Key(key) => Some(key.cast()),
            _ => None,
        }
    }
}

impl MetadataValue for ValueSet {
    const TYPE_NAME: &'static str = "Set";

    fn into_value(self) -> Value {
        Value::Set(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Set(set) => Some(set.clone()),
            _ => None,
        }
    }
}

impl MetadataValue for ValueMap {
    const TYPE_NAME: &'static str = "Map";

    fn into_value(self) -> Value {
        Value::Map(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Map(map) => Some(map.clone()),
            _ => None,
        }
    }
}

/// Lists convert element-wise; a null or foreign element is a mismatch
impl<T: MetadataValue> MetadataValue for Vec<T> {
    const TYPE_NAME: &'static str = "List";

    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(MetadataValue::into_value).collect())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => items.iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

impl<T: MetadataValue> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        items.into_value()
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

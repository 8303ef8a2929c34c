//! Typed JSON value tree.
//!
//! A parsed document is a tree of [`Value`] nodes. Scalars stay as raw text
//! in a [`Primitive`] until something asks for a concrete type. JSON `null`
//! is represented by absence: array slots and object values are `Option`.
//!
//! # Requirements
//!
//! - Object keys keep insertion order; a duplicate key overwrites the earlier
//!   value in its original position
//! - The `$type` key of an object carries the type tag used for polymorphism

use indexmap::IndexMap;

use super::primitive::Primitive;

/// Key holding the polymorphic type tag.
pub const TYPE_KEY: &str = "$type";

/// A JSON node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// String, number or boolean.
    Primitive(Primitive),
    /// Array.
    Array(Array),
    /// Object.
    Object(Object),
}

impl Value {
    /// Returns true if this is a primitive.
    pub fn is_primitive(&self) -> bool {
        matches!(self, Value::Primitive(_))
    }

    /// Returns true if this is an array.
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Returns true if this is an object.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Returns the primitive if this is one.
    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            Value::Primitive(p) => Some(p),
            _ => None,
        }
    }

    /// Returns the array if this is one.
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the object if this is one.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Raw text of a primitive.
    pub fn as_str(&self) -> Option<&str> {
        self.as_primitive().map(Primitive::as_str)
    }

    /// Get an object member by key; `None` for missing keys and nulls.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|o| o.get(key))
    }

    /// Get an array element by index; `None` when out of range or null.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.as_array().and_then(|a| a.get(index))
    }

    /// Returns the node kind as a string for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Primitive(_) => "primitive",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl From<Primitive> for Value {
    fn from(primitive: Primitive) -> Self {
        Value::Primitive(primitive)
    }
}

impl From<Array> for Value {
    fn from(array: Array) -> Self {
        Value::Array(array)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(object)
    }
}

/// Ordered list of nodes; `None` slots are JSON nulls.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Array {
    items: Vec<Option<Value>>,
}

impl Array {
    /// Empty array.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots, nulls included.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the array has no slots.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Element at `index`, `None` when out of range or null.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index).and_then(Option::as_ref)
    }

    /// Append a slot.
    pub fn push(&mut self, item: Option<Value>) {
        self.items.push(item);
    }

    /// Iterate over slots.
    pub fn iter(&self) -> impl Iterator<Item = Option<&Value>> {
        self.items.iter().map(Option::as_ref)
    }
}

impl FromIterator<Option<Value>> for Array {
    fn from_iter<I: IntoIterator<Item = Option<Value>>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// Keyed collection of nodes in insertion order; `None` values are JSON nulls.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Object {
    members: IndexMap<String, Option<Value>>,
}

impl Object {
    /// Empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the object has no keys.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether `key` is present, even with a null value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.members.contains_key(key)
    }

    /// Value under `key`; `None` when missing or null.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.members.get(key).and_then(Option::as_ref)
    }

    /// Insert or overwrite `key`, keeping the original position on overwrite.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<Value>) {
        self.members.insert(key.into(), value);
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.members
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_ref()))
    }

    /// The `$type` tag, when present as a primitive.
    pub fn type_name(&self) -> Option<&str> {
        self.get(TYPE_KEY).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(raw: &str) -> Option<Value> {
        Some(Value::Primitive(Primitive::from_raw(raw)))
    }

    #[test]
    fn test_value_kinds() {
        assert!(Value::Primitive(Primitive::from_bool(true)).is_primitive());
        assert!(Value::Array(Array::new()).is_array());
        assert!(Value::Object(Object::new()).is_object());
        assert_eq!(Value::Array(Array::new()).kind_name(), "array");
    }

    #[test]
    fn test_object_keeps_insertion_order() {
        let mut object = Object::new();
        object.insert("b", text("1"));
        object.insert("a", text("2"));
        object.insert("b", text("3"));
        let keys: Vec<&str> = object.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(object.get("b").and_then(Value::as_str), Some("3"));
    }

    #[test]
    fn test_null_members() {
        let mut object = Object::new();
        object.insert("gone", None);
        assert!(object.contains_key("gone"));
        assert!(object.get("gone").is_none());
    }

    #[test]
    fn test_type_name() {
        let mut object = Object::new();
        assert_eq!(object.type_name(), None);
        object.insert(TYPE_KEY, text("zoo/Dog"));
        assert_eq!(object.type_name(), Some("zoo/Dog"));
    }

    #[test]
    fn test_array_access() {
        let array: Array = vec![text("1"), None, text("3")].into_iter().collect();
        assert_eq!(array.len(), 3);
        assert!(array.get(1).is_none());
        assert_eq!(array.get(2).and_then(Value::as_str), Some("3"));
        let value = Value::Array(array);
        assert_eq!(value.get_index(0).and_then(Value::as_str), Some("1"));
    }
}

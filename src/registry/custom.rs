//! Custom type handlers.
//!
//! A custom type bypasses every other dispatch: the serializer hands the
//! value to the registered closure and writes the returned text as a quoted
//! string, and the builder hands the raw string to the deserializer.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::JsonResult;
use crate::reflect::{Replicate, TypeHandle, Typed};

pub(crate) type SerializeFn = Arc<dyn Fn(&dyn Any) -> Option<String> + Send + Sync>;
pub(crate) type DeserializeFn = Arc<dyn Fn(&str) -> JsonResult<Box<dyn Replicate>> + Send + Sync>;

/// Registered handlers for one type.
#[derive(Clone)]
pub struct CustomEntry {
    /// The handled type.
    pub handle: TypeHandle,
    pub(crate) serialize: Option<SerializeFn>,
    pub(crate) deserialize: Option<DeserializeFn>,
}

impl CustomEntry {
    /// Whether values of the type can be written.
    pub fn can_serialize(&self) -> bool {
        self.serialize.is_some()
    }

    /// Whether values of the type can be read.
    pub fn can_deserialize(&self) -> bool {
        self.deserialize.is_some()
    }
}

impl fmt::Debug for CustomEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomEntry")
            .field("handle", &self.handle)
            .field("serialize", &self.can_serialize())
            .field("deserialize", &self.can_deserialize())
            .finish()
    }
}

/// Closures handling `T` as a string.
///
/// ```
/// use jsonmap::{CustomType, Json};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Celsius(f64);
/// jsonmap::reflect_opaque!(Celsius);
///
/// let json = Json::new();
/// json.register_custom_type(
///     CustomType::<Celsius>::new()
///         .serialize(|c| format!("{}C", c.0))
///         .deserialize(|raw| {
///             raw.trim_end_matches('C')
///                 .parse()
///                 .map(Celsius)
///                 .map_err(|_| jsonmap::JsonError::InvalidFormat {
///                     text: raw.to_string(),
///                     target: "Celsius",
///                 })
///         }),
/// )
/// .unwrap();
///
/// assert_eq!(json.to_json(&Celsius(21.5)).unwrap(), r#""21.5C""#);
/// assert_eq!(json.read_object::<Celsius>(r#""21.5C""#).unwrap(), Celsius(21.5));
/// ```
pub struct CustomType<T> {
    serialize: Option<SerializeFn>,
    deserialize: Option<DeserializeFn>,
    marker: PhantomData<fn() -> T>,
}

impl<T: Typed + Clone> CustomType<T> {
    /// No handlers yet; at least one must be added before registration.
    pub fn new() -> Self {
        Self {
            serialize: None,
            deserialize: None,
            marker: PhantomData,
        }
    }

    /// Write values through `serialize`.
    pub fn serialize<F>(mut self, serialize: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        self.serialize = Some(Arc::new(move |value: &dyn Any| {
            value.downcast_ref::<T>().map(|value| serialize(value))
        }));
        self
    }

    /// Read values through `deserialize`.
    pub fn deserialize<F>(mut self, deserialize: F) -> Self
    where
        F: Fn(&str) -> JsonResult<T> + Send + Sync + 'static,
    {
        self.deserialize = Some(Arc::new(move |raw: &str| {
            deserialize(raw).map(|value| Box::new(value) as Box<dyn Replicate>)
        }));
        self
    }

    /// Handlers taken from a [`CustomTypeSerializer`].
    pub fn from_serializer<S>(serializer: S) -> Self
    where
        S: CustomTypeSerializer<Target = T>,
    {
        let serializer = Arc::new(serializer);
        let mut custom = Self::new();
        if serializer.can_serialize() {
            let handler = Arc::clone(&serializer);
            custom = custom.serialize(move |value| handler.serialize(value));
        }
        if serializer.can_deserialize() {
            let handler = Arc::clone(&serializer);
            custom = custom.deserialize(move |raw| handler.deserialize(raw));
        }
        custom
    }

    pub(crate) fn into_entry(self) -> CustomEntry {
        CustomEntry {
            handle: TypeHandle::of::<T>(),
            serialize: self.serialize,
            deserialize: self.deserialize,
        }
    }
}

impl<T: Typed + Clone> Default for CustomType<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A handler object for one custom type.
pub trait CustomTypeSerializer: Send + Sync + 'static {
    /// The handled type.
    type Target: Typed + Clone;

    /// Name registered for `$type` resolution, if any.
    fn type_name(&self) -> Option<&str> {
        None
    }

    /// Whether [`serialize`](Self::serialize) should be installed.
    fn can_serialize(&self) -> bool {
        true
    }

    /// Whether [`deserialize`](Self::deserialize) should be installed.
    fn can_deserialize(&self) -> bool {
        true
    }

    /// Write a value as text.
    fn serialize(&self, value: &Self::Target) -> String;

    /// Read a value from the raw JSON string.
    fn deserialize(&self, raw: &str) -> JsonResult<Self::Target>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JsonError;

    #[derive(Clone, Debug, PartialEq)]
    struct Tag(String);
    crate::reflect_opaque!(Tag);

    struct TagSerializer;

    impl CustomTypeSerializer for TagSerializer {
        type Target = Tag;

        fn type_name(&self) -> Option<&str> {
            Some("tag")
        }

        fn can_deserialize(&self) -> bool {
            false
        }

        fn serialize(&self, value: &Tag) -> String {
            format!("#{}", value.0)
        }

        fn deserialize(&self, raw: &str) -> JsonResult<Tag> {
            Err(JsonError::unsupported("Tag", raw))
        }
    }

    #[test]
    fn test_closures_downcast() {
        let entry = CustomType::<Tag>::new()
            .serialize(|tag| tag.0.to_uppercase())
            .deserialize(|raw| Ok(Tag(raw.to_lowercase())))
            .into_entry();

        let serialize = entry.serialize.clone().unwrap();
        assert_eq!(serialize(&Tag("ab".into())), Some("AB".to_string()));
        assert_eq!(serialize(&5_i32), None);

        let deserialize = entry.deserialize.clone().unwrap();
        let value = deserialize("XY").unwrap();
        assert_eq!(value.stored().downcast_ref::<Tag>(), Some(&Tag("xy".into())));
    }

    #[test]
    fn test_from_serializer_honors_capabilities() {
        let entry = CustomType::from_serializer(TagSerializer).into_entry();
        assert!(entry.can_serialize());
        assert!(!entry.can_deserialize());
        assert_eq!(entry.handle, TypeHandle::of::<Tag>());
    }
}

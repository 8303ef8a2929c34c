//! The [`Json`] context: one registry, one set of settings.
//!
//! Contexts are independent; each owns its caches, custom types and type
//! names. [`Json::shared`] offers a process-wide context with the standard
//! settings for callers that do not need their own.

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::builder::ObjectBuilder;
use crate::error::{JsonError, JsonResult};
use crate::json::{self, Generic, Value};
use crate::reflect::{downcast_box, Reflect, TypeHandle, Typed};
use crate::registry::{CustomType, CustomTypeSerializer, Registry, SerializationInfo, TypeNameStrategy};
use crate::serializer::Serializer;
use crate::settings::Settings;

static SHARED: Lazy<Json> = Lazy::new(Json::new);

/// Reads and writes JSON for described types.
///
/// ```
/// use jsonmap::{reflect_object, Json, Member, ObjectShape, Shape, Typed};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Reading {
///     sensor: String,
///     value: f64,
/// }
///
/// reflect_object!(Reading);
///
/// impl Typed for Reading {
///     fn shape() -> Shape {
///         ObjectShape::new::<Self>()
///             .member(Member::field("Sensor", |r: &Self| &r.sensor, |r: &mut Self, v| r.sensor = v))
///             .member(Member::field("Value", |r: &Self| &r.value, |r: &mut Self, v| r.value = v))
///             .into()
///     }
/// }
///
/// let json = Json::new();
/// let reading = Reading { sensor: "t1".into(), value: 21.5 };
/// let text = json.to_json(&reading).unwrap();
/// assert_eq!(text, r#"{"Sensor":"t1","Value":21.5}"#);
/// assert_eq!(json.read_object::<Reading>(&text).unwrap(), reading);
/// ```
pub struct Json {
    settings: Settings,
    registry: Registry,
}

impl Json {
    /// Context with the standard settings.
    pub fn new() -> Self {
        Self::with_settings(Settings::standard())
    }

    /// Context with the given settings.
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            registry: Registry::new(&settings),
            settings,
        }
    }

    /// The process-wide context with the standard settings.
    pub fn shared() -> &'static Json {
        &SHARED
    }

    /// Settings of this context.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Metadata caches of this context.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn builder(&self) -> ObjectBuilder<'_> {
        ObjectBuilder::new(&self.registry, &self.settings)
    }

    /// Serialize a value to compact JSON.
    pub fn to_json(&self, value: &dyn Reflect) -> JsonResult<String> {
        Serializer::new(&self.registry, &self.settings).serialize(value)
    }

    /// Read a value of type `T`.
    pub fn read_object<T: Typed>(&self, json: &str) -> JsonResult<T> {
        let handle = TypeHandle::of::<T>();
        let built = self.read_object_dyn(json, Some(handle))?;
        downcast_box::<T>(built).ok_or_else(|| {
            JsonError::unsupported(handle.name(), "built value has another type")
        })
    }

    /// Read a value of `target`, or of the type named by the root `$type`
    /// tag when no target is given.
    pub fn read_object_dyn(&self, json: &str, target: Option<TypeHandle>) -> JsonResult<Box<dyn Reflect>> {
        let value = json::parse(json)?;
        let target = match target {
            Some(target) => target,
            None => self.root_type(value.as_ref())?,
        };
        self.builder().build_new(&target, value.as_ref())
    }

    fn root_type(&self, value: Option<&Value>) -> JsonResult<TypeHandle> {
        let object = match value {
            Some(Value::Object(object)) => object,
            Some(other) => {
                return Err(JsonError::AmbiguousRootType {
                    detail: format!("the root is {} and no target type was given", other.kind_name()),
                })
            }
            None => {
                return Err(JsonError::AmbiguousRootType {
                    detail: "the root is null".to_string(),
                })
            }
        };

        let name = object.type_name().ok_or_else(|| JsonError::AmbiguousRootType {
            detail: "the root object has no $type tag".to_string(),
        })?;
        self.registry
            .type_names()
            .try_resolve(name)
            .ok_or_else(|| JsonError::AmbiguousRootType {
                detail: format!("the type name {:?} is not registered", name),
            })
    }

    /// Parse into the lazy value tree; `None` is a root `null`.
    pub fn read_json_value(&self, json: &str) -> JsonResult<Option<Value>> {
        json::parse(json)
    }

    /// Parse into the eager generic tree.
    pub fn read_generic(&self, json: &str) -> JsonResult<Generic> {
        json::parse_generic(json)
    }

    /// Fill an existing instance from a parsed value.
    pub fn build_up(&self, instance: &mut dyn Reflect, value: &Value) -> JsonResult<()> {
        self.builder().build_into(instance, value)
    }

    /// Copy through JSON: write `value`, then read it back as `T`.
    ///
    /// Custom types need both handlers for this to be lossless.
    pub fn deep_copy<T: Typed>(&self, value: &T) -> JsonResult<T> {
        let text = self.to_json(value)?;
        self.read_object::<T>(&text)
    }

    /// Register custom handlers for `T`.
    pub fn register_custom_type<T: Typed + Clone>(&self, custom: CustomType<T>) -> JsonResult<()> {
        self.registry.register_custom_type(custom)
    }

    /// Register a handler object; its type name, if any, becomes resolvable.
    pub fn register_custom_serializer<S: CustomTypeSerializer>(&self, serializer: S) -> JsonResult<()> {
        let name = serializer.type_name().map(str::to_string);
        self.registry
            .register_custom_type(CustomType::from_serializer(serializer))?;
        match name {
            Some(name) if !name.is_empty() => self
                .registry
                .type_names()
                .register_as(TypeHandle::of::<S::Target>(), &name),
            _ => Ok(()),
        }
    }

    /// Replace the `$type` naming strategy; previously computed names are
    /// forgotten.
    pub fn register_type_name_strategy(&self, strategy: impl TypeNameStrategy + 'static) {
        self.registry.type_names().reset(Arc::new(strategy));
    }

    /// Make `T` resolvable under its strategy name, which is returned.
    pub fn register_type<T: Typed>(&self) -> JsonResult<String> {
        self.registry.type_names().register(TypeHandle::of::<T>())
    }

    /// Make `T` resolvable under `name`.
    pub fn register_type_as<T: Typed>(&self, name: &str) -> JsonResult<()> {
        self.registry
            .type_names()
            .register_as(TypeHandle::of::<T>(), name)
    }

    /// Members written for `T`.
    pub fn serialization_members<T: Typed>(&self) -> JsonResult<Vec<SerializationInfo>> {
        self.registry.serialization_members(TypeHandle::of::<T>())
    }
}

impl Default for Json {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{Member, ObjectShape, Shape};

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }
    crate::reflect_object!(Point);
    impl Typed for Point {
        fn shape() -> Shape {
            ObjectShape::new::<Self>()
                .member(Member::field("X", |p: &Self| &p.x, |p: &mut Self, v| p.x = v))
                .member(Member::field("Y", |p: &Self| &p.y, |p: &mut Self, v| p.y = v))
                .into()
        }
    }

    #[test]
    fn test_round_trip() {
        let json = Json::new();
        let point = Point { x: 3, y: -4 };
        assert_eq!(json.to_json(&point).unwrap(), r#"{"X":3,"Y":-4}"#);
        assert_eq!(json.deep_copy(&point).unwrap(), point);
    }

    #[test]
    fn test_untyped_root_needs_type_tag() {
        let json = Json::new();
        let err = json.read_object_dyn(r#"{"X":1}"#, None).err().unwrap();
        assert_eq!(err.code(), 402);
        let err = json.read_object_dyn("[1]", None).err().unwrap();
        assert_eq!(err.code(), 402);

        json.register_type_as::<Point>("point").unwrap();
        let built = json
            .read_object_dyn(r#"{"$type":"point","X":1,"Y":2}"#, None)
            .unwrap();
        assert_eq!(downcast_box::<Point>(built), Some(Point { x: 1, y: 2 }));
    }

    #[test]
    fn test_contexts_are_independent() {
        let first = Json::new();
        let second = Json::new();
        first.register_type_as::<Point>("p").unwrap();
        assert!(first.registry().type_names().try_resolve("p").is_some());
        assert!(second.registry().type_names().try_resolve("p").is_none());
    }

    #[test]
    fn test_shared_context() {
        assert!(std::ptr::eq(Json::shared(), Json::shared()));
        assert_eq!(Json::shared().settings(), &Settings::standard());
    }
}
